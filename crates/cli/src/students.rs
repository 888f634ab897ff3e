//! `pelsync students` — aggregate the student roster across every export
//! file and upsert it into the store by (full name, email).

use std::path::Path;

use pelsync_engine::model::{LoadWarning, RosterReport};
use pelsync_engine::roster::build_roster;
use pelsync_engine::RawTable;
use pelsync_store::ProgressStore;

use crate::exit_codes::{EXIT_ERROR, EXIT_LOAD_INPUT, EXIT_LOAD_STORE};
use crate::files::{csv_files, file_name, read_file_as_utf8};
use crate::CliError;

pub fn cmd_students(
    config_path: &Path,
    store_override: Option<&Path>,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let (config, base) = crate::read_config(config_path)?;

    let mut inputs: Vec<(String, RawTable, String)> = Vec::new();
    let mut warnings: Vec<LoadWarning> = Vec::new();

    for source in &config.sources {
        let folder = base.join(&source.folder);
        if !folder.is_dir() {
            return Err(CliError {
                code: EXIT_LOAD_INPUT,
                message: format!("source folder not found: {}", folder.display()),
                hint: None,
            });
        }
        for path in csv_files(&folder).map_err(|e| CliError {
            code: EXIT_LOAD_INPUT,
            message: e,
            hint: None,
        })? {
            let name = file_name(&path);
            let text = match read_file_as_utf8(&path) {
                Ok(text) => text,
                Err(reason) => {
                    warnings.push(LoadWarning { file: name, reason });
                    continue;
                }
            };
            match RawTable::from_csv_str(&name, &text) {
                Ok(table) => inputs.push((name, table, source.center.clone())),
                Err(e) => warnings.push(LoadWarning {
                    file: name,
                    reason: e.to_string(),
                }),
            }
        }
    }

    let mut batch = build_roster(inputs);
    warnings.append(&mut batch.warnings);

    let store_path = crate::resolve_store(&config, &base, store_override);
    let mut store = ProgressStore::open(&store_path).map_err(|e| CliError {
        code: EXIT_LOAD_STORE,
        message: e.to_string(),
        hint: None,
    })?;
    let (updated, inserted) = store.upsert_students(&batch.students).map_err(|e| CliError {
        code: EXIT_LOAD_STORE,
        message: e.to_string(),
        hint: None,
    })?;

    let report = RosterReport {
        processed: batch.students.len(),
        updated,
        inserted,
    };

    if !quiet {
        for warning in &warnings {
            eprintln!("note: {}: {}", warning.file, warning.reason);
        }
    }

    if json {
        let out = serde_json::to_string_pretty(&report).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: e.to_string(),
            hint: None,
        })?;
        println!("{out}");
    } else {
        println!("Student roster upsert complete.");
        println!("Students processed: {}", report.processed);
        println!("Updated records: {}", report.updated);
        println!("Inserted records: {}", report.inserted);
    }
    Ok(())
}
