//! Student roster aggregation: one identity per email address across all
//! export files, keeping the first non-blank value seen for each field.
//! Progress rows repeat a student every month; the roster is the
//! de-repeated view the store upserts from.

use crate::headers::{
    canonicalize_headers, ADDRESS_COLUMN, DOB_COLUMN, DOE_COLUMN, EMAIL_COLUMN, FIRST_NAME_COLUMN,
    LAST_NAME_COLUMN, SOURCE_COLUMN, TEL_COLUMN,
};
use crate::model::{LoadWarning, StudentRecord};
use crate::table::RawTable;

#[derive(Debug, Default)]
pub struct RosterBatch {
    pub students: Vec<StudentRecord>,
    pub warnings: Vec<LoadWarning>,
}

const REQUIRED: &[&str] = &[
    FIRST_NAME_COLUMN,
    LAST_NAME_COLUMN,
    DOB_COLUMN,
    ADDRESS_COLUMN,
    EMAIL_COLUMN,
    DOE_COLUMN,
];

/// Aggregate a roster from raw export tables. Files missing required
/// columns are skipped with a warning; rows without an email cannot be
/// keyed and are counted per file.
pub fn build_roster<I>(files: I) -> RosterBatch
where
    I: IntoIterator<Item = (String, RawTable, String)>,
{
    let mut batch = RosterBatch::default();
    let mut students: Vec<StudentRecord> = Vec::new();

    for (file_name, mut table, center) in files {
        table.headers = canonicalize_headers(&table.headers).headers;

        let missing: Vec<&str> = REQUIRED
            .iter()
            .filter(|name| table.column_ci(name).is_none())
            .copied()
            .collect();
        if !missing.is_empty() {
            batch.warnings.push(LoadWarning {
                file: file_name.clone(),
                reason: format!("missing columns: {}; file skipped", missing.join(", ")),
            });
            continue;
        }

        let first_col = table.column_ci(FIRST_NAME_COLUMN).unwrap();
        let last_col = table.column_ci(LAST_NAME_COLUMN).unwrap();
        let email_col = table.column_ci(EMAIL_COLUMN).unwrap();
        let dob_col = table.column_ci(DOB_COLUMN).unwrap();
        let address_col = table.column_ci(ADDRESS_COLUMN).unwrap();
        let doe_col = table.column_ci(DOE_COLUMN).unwrap();
        let tel_col = table.column_ci(TEL_COLUMN);
        let source_col = table.column_ci(SOURCE_COLUMN);

        let mut unkeyed = 0usize;
        for row in 0..table.rows.len() {
            let email = table.value(row, email_col).trim().to_lowercase();
            if email.is_empty() {
                if !row_is_blank(&table, row) {
                    unkeyed += 1;
                }
                continue;
            }

            let idx = match students.iter().position(|s| s.email == email) {
                Some(idx) => idx,
                None => {
                    students.push(StudentRecord {
                        first_name: String::new(),
                        last_name: String::new(),
                        full_name: String::new(),
                        dob: None,
                        address: None,
                        tel: None,
                        source: None,
                        email,
                        enrollment_date: None,
                        center: center.clone(),
                    });
                    students.len() - 1
                }
            };
            let entry = &mut students[idx];

            fill_str(&mut entry.first_name, table.value(row, first_col));
            fill_str(&mut entry.last_name, table.value(row, last_col));
            fill_opt(&mut entry.dob, table.value(row, dob_col));
            fill_opt(&mut entry.address, table.value(row, address_col));
            fill_opt(&mut entry.enrollment_date, table.value(row, doe_col));
            if let Some(col) = tel_col {
                fill_opt(&mut entry.tel, table.value(row, col));
            }
            if let Some(col) = source_col {
                fill_opt(&mut entry.source, table.value(row, col));
            }
        }

        if unkeyed > 0 {
            batch.warnings.push(LoadWarning {
                file: file_name,
                reason: format!("{unkeyed} row(s) without email skipped"),
            });
        }
    }

    for student in &mut students {
        student.full_name = format!("{}, {}", student.last_name, student.first_name);
    }
    batch.students = students;
    batch
}

fn row_is_blank(table: &RawTable, row: usize) -> bool {
    table.rows[row].iter().all(|v| v.trim().is_empty())
}

fn fill_str(slot: &mut String, value: &str) {
    if slot.is_empty() && !value.trim().is_empty() {
        *slot = value.trim().to_string();
    }
}

fn fill_opt(slot: &mut Option<String>, value: &str) {
    if slot.is_none() && !value.trim().is_empty() {
        *slot = Some(value.trim().to_string());
    }
}
