//! `pelsync highest` — report the highest level each student has reached
//! per subject, from the persisted store.

use std::path::Path;

use pelsync_engine::highest::highest_levels;
use pelsync_store::ProgressStore;

use crate::exit_codes::{EXIT_ERROR, EXIT_LOAD_STORE};
use crate::CliError;

pub fn cmd_highest(
    config_path: &Path,
    output: &Path,
    store_override: Option<&Path>,
) -> Result<(), CliError> {
    let (config, base) = crate::read_config(config_path)?;

    let store_path = crate::resolve_store(&config, &base, store_override);
    let store = ProgressStore::open(&store_path).map_err(|e| CliError {
        code: EXIT_LOAD_STORE,
        message: e.to_string(),
        hint: None,
    })?;
    let records = store.progress_records().map_err(|e| CliError {
        code: EXIT_LOAD_STORE,
        message: e.to_string(),
        hint: None,
    })?;

    let rows = highest_levels(&records);

    let io_err = |e: csv::Error| CliError {
        code: EXIT_ERROR,
        message: format!("{}: {e}", output.display()),
        hint: None,
    };
    let mut writer = csv::Writer::from_path(output).map_err(io_err)?;
    writer
        .write_record(["First Name", "Last Name", "Subject (M/E)", "PEL Wks. Level"])
        .map_err(io_err)?;
    for row in &rows {
        let subject = row.subject.code().to_string();
        writer
            .write_record([
                row.first_name.as_str(),
                row.last_name.as_str(),
                subject.as_str(),
                row.level_code.as_str(),
            ])
            .map_err(io_err)?;
    }
    writer.flush().map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("{}: {e}", output.display()),
        hint: None,
    })?;

    println!("Wrote {} rows to {}", rows.len(), output.display());
    Ok(())
}
