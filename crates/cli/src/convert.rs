//! `pelsync convert` — spreadsheet-to-delimited-text conversion plus the
//! cleaning pass the monthly workbooks need: junk rows above the header
//! dropped, blank-header columns removed, unusable level/worksheet
//! headers renamed by position, trailing padding rows cut.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use pelsync_engine::headers::{canonicalize_headers, LEVEL_COLUMN, WORKSHEET_COLUMN};

use crate::exit_codes::{EXIT_CONVERT_INPUT, EXIT_ERROR};
use crate::files::file_name;
use crate::CliError;

pub fn cmd_convert(
    input: &Path,
    output: &Path,
    sheet: &str,
    skip_rows: usize,
    blank_cutoff: usize,
    quiet: bool,
) -> Result<(), CliError> {
    let inputs: Vec<PathBuf> = if input.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(input)
            .map_err(|e| input_err(format!("{}: {e}", input.display())))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
            })
            .collect();
        files.sort();
        files
    } else {
        vec![input.to_path_buf()]
    };
    if inputs.is_empty() {
        return Err(input_err(format!(
            "no .xlsx files in {}",
            input.display()
        )));
    }

    std::fs::create_dir_all(output).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("{}: {e}", output.display()),
        hint: None,
    })?;

    for path in &inputs {
        let rows = convert_one(path, output, sheet, skip_rows, blank_cutoff)?;
        if !quiet {
            eprintln!("note: {}: {} data row(s)", file_name(path), rows);
        }
    }
    Ok(())
}

fn convert_one(
    path: &Path,
    out_dir: &Path,
    sheet: &str,
    skip_rows: usize,
    blank_cutoff: usize,
) -> Result<usize, CliError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| input_err(format!("{}: {e}", path.display())))?;
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| input_err(format!("{}: sheet '{sheet}': {e}", path.display())))?;

    let mut rows: Vec<Vec<String>> = range
        .rows()
        .skip(skip_rows)
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    if rows.is_empty() {
        return Err(input_err(format!(
            "{}: sheet '{sheet}' has no rows below the skipped header block",
            path.display()
        )));
    }

    // Drop columns whose header cell is blank; the workbooks pad to the
    // right with empty formatting-only columns.
    let keep: Vec<usize> = rows[0]
        .iter()
        .enumerate()
        .filter(|(_, header)| !header.trim().is_empty())
        .map(|(idx, _)| idx)
        .collect();
    let mut table: Vec<Vec<String>> = rows
        .drain(..)
        .map(|row| {
            keep.iter()
                .map(|&idx| row.get(idx).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    // Canonicalize what can be named; when no level column survives under
    // any recognizable header, fall back to the fixed workbook layout
    // (level and worksheet number in the 11th and 12th columns).
    let scan = canonicalize_headers(&table[0]);
    table[0] = scan.headers;
    if scan.level_candidates.is_empty() && table[0].len() > 11 {
        table[0][10] = LEVEL_COLUMN.to_string();
        table[0][11] = WORKSHEET_COLUMN.to_string();
    }

    // Trailing padding: the first data row with more blanks than the
    // cutoff ends the table.
    let mut end = table.len();
    for (idx, row) in table.iter().enumerate().skip(1) {
        let blanks = row.iter().filter(|v| v.trim().is_empty()).count();
        if blanks > blank_cutoff {
            end = idx;
            break;
        }
    }
    table.truncate(end);

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "converted".into());
    let out_path = out_dir.join(format!("{stem}.csv"));

    let io_err = |e: csv::Error| CliError {
        code: EXIT_ERROR,
        message: format!("{}: {e}", out_path.display()),
        hint: None,
    };
    let mut writer = csv::Writer::from_path(&out_path).map_err(io_err)?;
    for row in &table {
        writer.write_record(row).map_err(io_err)?;
    }
    writer.flush().map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("{}: {e}", out_path.display()),
        hint: None,
    })?;

    Ok(table.len().saturating_sub(1))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%m/%d/%y").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

fn input_err(message: String) -> CliError {
    CliError {
        code: EXIT_CONVERT_INPUT,
        message,
        hint: None,
    }
}
