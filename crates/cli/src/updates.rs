//! `pelsync apply-updates` — resolve operator-authored level corrections
//! against raw export files and rewrite the matched rows in place.
//!
//! Each target file is held under an exclusive lock for its whole
//! read/match/write-back; a dry run computes every count identically and
//! skips only the write.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use pelsync_engine::updates::{
    apply_to_table, parse_directives, route_directives, Directive, DirectiveFilter,
};
use pelsync_engine::{EngineError, RawTable, UpdateReport};

use crate::exit_codes::{
    EXIT_ERROR, EXIT_UPDATES_COLUMNS, EXIT_UPDATES_INPUT, EXIT_UPDATES_NONE_ACTIVE,
    EXIT_UPDATES_TARGET,
};
use crate::files::{csv_files, file_name, read_file_as_utf8, LockedFile};
use crate::CliError;

#[allow(clippy::too_many_arguments)]
pub fn cmd_apply_updates(
    config_path: &Path,
    updates_override: Option<&Path>,
    folder_override: Option<&Path>,
    all: bool,
    dry_run: bool,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let (config, base) = crate::read_config(config_path)?;

    let updates_path = updates_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| base.join(&config.updates.file));
    if !updates_path.is_file() {
        return Err(input_err(format!(
            "missing updates file: {}",
            updates_path.display()
        )));
    }

    let folder = match folder_override {
        Some(folder) => folder.to_path_buf(),
        None => match &config.updates.folder {
            Some(folder) => base.join(folder),
            None => {
                return Err(CliError {
                    code: EXIT_UPDATES_INPUT,
                    message: "no target folder configured".into(),
                    hint: Some("set [updates].folder in the config or pass --folder".into()),
                })
            }
        },
    };
    if !folder.is_dir() {
        return Err(input_err(format!(
            "target folder not found: {}",
            folder.display()
        )));
    }

    let updates_name = file_name(&updates_path);
    let text = read_file_as_utf8(&updates_path).map_err(input_err)?;
    let table = RawTable::from_csv_str(&updates_name, &text)
        .map_err(|e| input_err(e.to_string()))?;

    let filter = DirectiveFilter {
        active_only: !all,
        active_column: config.updates.active_column.clone(),
        active_value: config.updates.active_value.clone(),
    };
    let directives = parse_directives(&table, &updates_name, &filter).map_err(|e| match e {
        EngineError::MissingDirectiveColumns { .. } | EngineError::MissingColumn { .. } => {
            CliError {
                code: EXIT_UPDATES_COLUMNS,
                message: e.to_string(),
                hint: None,
            }
        }
        EngineError::NoEligibleDirectives => CliError {
            code: EXIT_UPDATES_NONE_ACTIVE,
            message: e.to_string(),
            hint: Some("re-run with --all to ignore the active flag".into()),
        },
        other => CliError {
            code: EXIT_ERROR,
            message: other.to_string(),
            hint: None,
        },
    })?;

    // Target files keyed by lower-cased stem, the directives' routing key.
    let mut targets: BTreeMap<String, std::path::PathBuf> = BTreeMap::new();
    for path in csv_files(&folder).map_err(input_err)? {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            targets.insert(stem.trim().to_lowercase(), path);
        }
    }
    let stems: BTreeSet<String> = targets.keys().cloned().collect();

    let mut report = UpdateReport {
        directives_applied: directives.len(),
        ..UpdateReport::default()
    };
    let routed = route_directives(directives, &stems);
    report.missing_files = routed.missing_files;

    for (stem, group) in &routed.by_file {
        let path = &targets[stem];
        let name = file_name(path);
        if let Err(err) = apply_one_file(path, &name, group, dry_run, &mut report) {
            // Abort, but hand the operator everything accumulated so far.
            emit_report(&report, dry_run, json, quiet)?;
            return Err(err);
        }
    }

    emit_report(&report, dry_run, json, quiet)?;
    Ok(())
}

fn apply_one_file(
    path: &Path,
    name: &str,
    directives: &[Directive],
    dry_run: bool,
    report: &mut UpdateReport,
) -> Result<(), CliError> {
    let mut locked = LockedFile::acquire(path).map_err(input_err)?;
    let text = locked.read_to_string().map_err(input_err)?;
    let mut table = RawTable::from_csv_str(name, &text).map_err(target_err)?;

    let outcome = apply_to_table(&mut table, name, directives).map_err(target_err)?;
    report.rows_updated += outcome.rows_updated;
    report.missing_rows.extend(outcome.missing_rows);
    report.multi_matches.extend(outcome.multi_matches);

    if outcome.changed {
        report.files_changed.push(name.to_string());
        if !dry_run {
            let csv = table.to_csv_string().map_err(|e| CliError {
                code: EXIT_ERROR,
                message: e.to_string(),
                hint: None,
            })?;
            locked.replace_contents(&csv).map_err(|e| CliError {
                code: EXIT_ERROR,
                message: e,
                hint: None,
            })?;
        }
    }
    Ok(())
}

fn emit_report(
    report: &UpdateReport,
    dry_run: bool,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    if json {
        let out = serde_json::to_string_pretty(report).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: e.to_string(),
            hint: None,
        })?;
        println!("{out}");
        return Ok(());
    }

    if dry_run && !quiet {
        eprintln!("note: dry run; no files were written");
    }
    println!("Directives applied: {}", report.directives_applied);
    println!("Updated rows: {}", report.rows_updated);
    println!("Files changed: {}", report.files_changed.len());
    if !report.missing_files.is_empty() {
        println!("Missing files:");
        for entry in &report.missing_files {
            println!("- {} ({} directive(s))", entry.file, entry.directives);
        }
    }
    if !report.missing_rows.is_empty() {
        println!("Rows not found:");
        for entry in &report.missing_rows {
            println!("- {}: {} [{}]", entry.file, entry.name, entry.subject);
        }
    }
    if !report.multi_matches.is_empty() {
        println!("Multiple matches (updated all):");
        for entry in &report.multi_matches {
            println!(
                "- {}: {} [{}] matched {} rows",
                entry.file, entry.name, entry.subject, entry.count
            );
        }
    }
    Ok(())
}

fn input_err(message: impl Into<String>) -> CliError {
    CliError {
        code: EXIT_UPDATES_INPUT,
        message: message.into(),
        hint: None,
    }
}

fn target_err(e: EngineError) -> CliError {
    CliError {
        code: EXIT_UPDATES_TARGET,
        message: e.to_string(),
        hint: None,
    }
}
