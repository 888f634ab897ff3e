//! Canonical record building: one normalized export table in, typed
//! progress records out. The month each observation belongs to comes from
//! the source filename, the subject from the subject column or the level
//! code's leading character, and the level score from the fixed tables.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::headers::{
    canonicalize_headers, EMAIL_COLUMN, FIRST_NAME_COLUMN, LAST_NAME_COLUMN, LEVEL_COLUMN,
    NOTES_COLUMN, SUBJECT_COLUMN, WORKSHEET_COLUMN,
};
use crate::levels::level_score;
use crate::merge::merge_columns;
use crate::model::{LoadWarning, ProgressRecord, Subject};
use crate::table::RawTable;

/// Records built from one file, plus whatever was skipped along the way.
#[derive(Debug, Default)]
pub struct FileBatch {
    pub records: Vec<ProgressRecord>,
    pub warnings: Vec<LoadWarning>,
}

const MONTH_TOKENS: &[(&str, u32)] = &[
    ("JAN", 1),
    ("FEB", 2),
    ("MAR", 3),
    ("APR", 4),
    ("MAY", 5),
    ("JUN", 6),
    ("JUL", 7),
    ("AUG", 8),
    ("SEP", 9),
    ("OCT", 10),
    ("NOV", 11),
    ("DEC", 12),
];

static YEAR_SUFFIX: OnceLock<Regex> = OnceLock::new();

/// Derive the month an export file covers from its name: a 3-letter month
/// token anywhere in the stem plus a trailing numeric suffix whose last
/// two digits are the 2-digit year. "PAS Milpitas JAN 0124.csv" is
/// January 2024. Returns None when either piece is missing.
pub fn file_month(file_name: &str) -> Option<NaiveDate> {
    let mut stem = file_name.trim().to_ascii_uppercase();
    if stem.ends_with(".CSV") {
        stem.truncate(stem.len() - 4);
    }
    let stem = stem.trim();

    let month = MONTH_TOKENS
        .iter()
        .find(|(token, _)| stem.contains(token))
        .map(|(_, m)| *m)?;

    let year_re = YEAR_SUFFIX.get_or_init(|| Regex::new(r"(\d{2})$").expect("year suffix pattern"));
    let caps = year_re.captures(stem)?;
    let year = 2000 + caps[1].parse::<i32>().ok()?;

    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Canonicalize headers in place and collapse the drift-prone candidate
/// columns into their canonical ones.
pub fn normalize_table(table: &mut RawTable) {
    let scan = canonicalize_headers(&table.headers);
    table.headers = scan.headers;
    merge_columns(table, &scan.level_candidates, LEVEL_COLUMN);
    merge_columns(table, &scan.worksheet_candidates, WORKSHEET_COLUMN);
    merge_columns(table, &scan.subject_candidates, SUBJECT_COLUMN);
}

/// Normalize one raw export table and build its canonical records.
pub fn process_file(mut table: RawTable, file_name: &str, center: &str) -> FileBatch {
    normalize_table(&mut table);
    build_records(&table, file_name, center)
}

/// Build canonical records from an already-normalized table. A file with
/// no recognizable date or a missing required column is skipped whole; a
/// row whose subject cannot be resolved is skipped alone. Neither aborts
/// the batch.
pub fn build_records(table: &RawTable, file_name: &str, center: &str) -> FileBatch {
    let mut batch = FileBatch::default();

    let Some(progress_date) = file_month(file_name) else {
        batch.warnings.push(LoadWarning {
            file: file_name.into(),
            reason: "no recognizable month/year in filename; file skipped".into(),
        });
        return batch;
    };

    let required = [
        FIRST_NAME_COLUMN,
        LAST_NAME_COLUMN,
        EMAIL_COLUMN,
        LEVEL_COLUMN,
        WORKSHEET_COLUMN,
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|name| table.column_ci(name).is_none())
        .copied()
        .collect();
    if !missing.is_empty() {
        batch.warnings.push(LoadWarning {
            file: file_name.into(),
            reason: format!("missing columns: {}; file skipped", missing.join(", ")),
        });
        return batch;
    }

    let first_col = table.column_ci(FIRST_NAME_COLUMN).unwrap();
    let last_col = table.column_ci(LAST_NAME_COLUMN).unwrap();
    let email_col = table.column_ci(EMAIL_COLUMN).unwrap();
    let level_col = table.column_ci(LEVEL_COLUMN).unwrap();
    let wks_col = table.column_ci(WORKSHEET_COLUMN).unwrap();
    let subject_col = table
        .column_ci(SUBJECT_COLUMN)
        .or_else(|| table.column_with_prefix("subject"));
    let notes_col = table.column_ci(NOTES_COLUMN);

    for row in 0..table.rows.len() {
        let first_name = table.value(row, first_col).trim().to_string();
        let last_name = table.value(row, last_col).trim().to_string();
        let email = table.value(row, email_col).trim();
        let level_code = table.value(row, level_col).trim().to_ascii_uppercase();

        // Trailing padding rows with nothing in them are not data.
        if first_name.is_empty() && last_name.is_empty() && email.is_empty() && level_code.is_empty()
        {
            continue;
        }

        let subject = subject_col
            .and_then(|col| Subject::from_label(table.value(row, col)))
            .or_else(|| Subject::from_level_code(&level_code));
        let Some(subject) = subject else {
            batch.warnings.push(LoadWarning {
                file: file_name.into(),
                reason: format!("row {}: unresolvable subject; row skipped", row + 2),
            });
            continue;
        };

        // Unrecognized codes keep a null score; that is data quality to
        // report downstream, not a load failure.
        let score = level_score(subject, &level_code);

        let full_name = format!("{}, {}", last_name, first_name);
        batch.records.push(ProgressRecord {
            first_name,
            last_name,
            full_name,
            email: opt(email),
            subject,
            level_code,
            level_score: score,
            worksheet_no: opt(table.value(row, wks_col)),
            progress_date,
            center: center.to_string(),
            notes: notes_col.and_then(|col| opt(table.value(row, col))),
        });
    }

    batch
}

fn opt(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
