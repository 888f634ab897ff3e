//! `pelsync load` — insert-only, idempotent load of every configured
//! center's export folder into the store.

use std::path::Path;

use pelsync_engine::builder::process_file;
use pelsync_engine::dedup::dedupe;
use pelsync_engine::loader::{diff_against_store, load_report};
use pelsync_engine::model::{LoadWarning, ProgressRecord};
use pelsync_engine::RawTable;
use pelsync_store::{ProgressStore, StoreError};

use crate::exit_codes::{EXIT_ERROR, EXIT_LOAD_INPUT, EXIT_LOAD_STORE};
use crate::files::{csv_files, file_name, read_file_as_utf8};
use crate::CliError;

pub fn cmd_load(
    config_path: &Path,
    store_override: Option<&Path>,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let (config, base) = crate::read_config(config_path)?;

    let mut batch: Vec<ProgressRecord> = Vec::new();
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
            let table = match RawTable::from_csv_str(&name, &text) {
                Ok(table) => table,
                Err(e) => {
                    warnings.push(LoadWarning {
                        file: name,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let mut file_batch = process_file(table, &name, &source.center);
            warnings.append(&mut file_batch.warnings);
            batch.append(&mut file_batch.records);
        }
    }

    let deduped = dedupe(batch);
    let stats = deduped.stats;

    let store_path = crate::resolve_store(&config, &base, store_override);
    let mut store = ProgressStore::open(&store_path).map_err(store_err)?;
    let existing = store.progress_keys().map_err(store_err)?;
    let diff = diff_against_store(deduped.records, &existing);
    store.append_progress(&diff.to_insert).map_err(store_err)?;

    let report = load_report(stats.input_count, stats.distinct_count, &diff);

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
        println!("Progress insert-only load complete ({}).", config.name);
        println!("Records processed: {}", report.processed);
        println!("After key dedupe: {}", report.after_dedup);
        println!("Inserted records: {}", report.inserted);
        println!("Skipped existing records: {}", report.skipped_existing);
    }
    Ok(())
}

fn store_err(e: StoreError) -> CliError {
    CliError {
        code: EXIT_LOAD_STORE,
        message: e.to_string(),
        hint: None,
    }
}
