//! Corrective-update engine. Operators author a directives table (subject,
//! free-text name, replacement level code, target file) and the engine
//! resolves each directive against the raw export rows and rewrites the
//! level field in place. Matching is deliberately loose; historical
//! correction sheets use bare first or last names, and a directive that
//! hits several rows updates all of them and is surfaced for audit rather
//! than rejected.

use std::collections::BTreeSet;

use crate::error::EngineError;
use crate::headers::LEVEL_COLUMN;
use crate::model::{MissingFileEntry, MissingRowEntry, MultiMatchEntry};
use crate::table::RawTable;

pub const DEFAULT_ACTIVE_COLUMN: &str = "Active changes";
pub const DEFAULT_ACTIVE_VALUE: &str = "Active";

const REQUIRED_DIRECTIVE_COLUMNS: &[&str] = &["subject", "name", "change to", "file name"];

/// One operator-authored correction, read from the directives table.
#[derive(Debug, Clone)]
pub struct Directive {
    pub subject: String,
    pub name: String,
    pub change_to: String,
    pub target_file: String,
}

#[derive(Debug, Clone)]
pub struct DirectiveFilter {
    pub active_only: bool,
    pub active_column: String,
    pub active_value: String,
}

impl Default for DirectiveFilter {
    fn default() -> Self {
        Self {
            active_only: true,
            active_column: DEFAULT_ACTIVE_COLUMN.into(),
            active_value: DEFAULT_ACTIVE_VALUE.into(),
        }
    }
}

/// Collapse runs of whitespace and case-fold. All name comparisons go
/// through this.
pub fn normalize_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Single-letter subject code: first character of the normalized text,
/// uppercased. Empty input stays empty and matches any subject.
pub fn subject_code(value: &str) -> String {
    normalize_text(value)
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}

/// Comparison key for a directive's free-text name. Correction sheets
/// write names both ways; "Smith, John" reorders to the row's
/// "first last" shape before normalization.
fn directive_name_key(name: &str) -> String {
    match name.split_once(',') {
        Some((last, first)) => normalize_text(&format!("{first} {last}")),
        None => normalize_text(name),
    }
}

/// Routing key for a directive's target file: trailing ".csv" stripped,
/// trimmed, lower-cased. None for a blank target.
pub fn file_key(target_file: &str) -> Option<String> {
    let trimmed = target_file.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    let stem = lower.strip_suffix(".csv").unwrap_or(&lower);
    Some(stem.trim().to_string())
}

/// Read and validate directives. Fails fast on missing required columns,
/// a missing active-flag column, or zero eligible directives; those are
/// operator errors, not data to recover from.
pub fn parse_directives(
    table: &RawTable,
    file: &str,
    filter: &DirectiveFilter,
) -> Result<Vec<Directive>, EngineError> {
    let missing: Vec<String> = REQUIRED_DIRECTIVE_COLUMNS
        .iter()
        .filter(|name| table.column_ci(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::MissingDirectiveColumns {
            file: file.into(),
            columns: missing,
        });
    }

    let subject_col = table.column_ci("subject").unwrap();
    let name_col = table.column_ci("name").unwrap();
    let change_col = table.column_ci("change to").unwrap();
    let file_col = table.column_ci("file name").unwrap();

    let active_col = if filter.active_only {
        Some(table.column_ci(&filter.active_column).ok_or_else(|| {
            EngineError::MissingColumn {
                file: file.into(),
                column: filter.active_column.clone(),
            }
        })?)
    } else {
        None
    };
    let active_value = normalize_text(&filter.active_value);

    let mut directives = Vec::new();
    for row in 0..table.rows.len() {
        if let Some(col) = active_col {
            if normalize_text(table.value(row, col)) != active_value {
                continue;
            }
        }
        directives.push(Directive {
            subject: table.value(row, subject_col).trim().to_string(),
            name: table.value(row, name_col).trim().to_string(),
            change_to: table.value(row, change_col).trim().to_string(),
            target_file: table.value(row, file_col).trim().to_string(),
        });
    }

    if directives.is_empty() {
        return Err(EngineError::NoEligibleDirectives);
    }
    Ok(directives)
}

/// Directives grouped per resolvable target file, in first-appearance
/// order, plus the unroutable remainder.
#[derive(Debug, Default)]
pub struct RoutedDirectives {
    pub by_file: Vec<(String, Vec<Directive>)>,
    pub missing_files: Vec<MissingFileEntry>,
}

pub fn route_directives(
    directives: Vec<Directive>,
    available_stems: &BTreeSet<String>,
) -> RoutedDirectives {
    let mut routed = RoutedDirectives::default();
    let mut blank = 0usize;

    for directive in directives {
        let Some(key) = file_key(&directive.target_file) else {
            blank += 1;
            continue;
        };
        if !available_stems.contains(&key) {
            match routed.missing_files.iter().position(|e| e.file == key) {
                Some(idx) => routed.missing_files[idx].directives += 1,
                None => routed.missing_files.push(MissingFileEntry {
                    file: key,
                    directives: 1,
                }),
            }
            continue;
        }
        match routed.by_file.iter().position(|(stem, _)| *stem == key) {
            Some(idx) => routed.by_file[idx].1.push(directive),
            None => routed.by_file.push((key, vec![directive])),
        }
    }

    if blank > 0 {
        routed.missing_files.push(MissingFileEntry {
            file: "(blank)".into(),
            directives: blank,
        });
    }
    routed
}

/// Outcome of applying one file's directives to its table.
#[derive(Debug, Default)]
pub struct FileUpdateOutcome {
    pub rows_updated: usize,
    pub changed: bool,
    pub missing_rows: Vec<MissingRowEntry>,
    pub multi_matches: Vec<MultiMatchEntry>,
}

/// Match and apply directives against one export table, in memory. The
/// caller decides whether the mutated table is written back; counts are
/// identical either way.
pub fn apply_to_table(
    table: &mut RawTable,
    file_name: &str,
    directives: &[Directive],
) -> Result<FileUpdateOutcome, EngineError> {
    let level_col = table
        .column_ci(LEVEL_COLUMN)
        .ok_or_else(|| EngineError::MissingColumn {
            file: file_name.into(),
            column: LEVEL_COLUMN.into(),
        })?;
    let subject_col =
        table
            .column_with_prefix("subject")
            .ok_or_else(|| EngineError::MissingColumn {
                file: file_name.into(),
                column: "Subject".into(),
            })?;
    let first_col = table.column_ci("first name");
    let last_col = table.column_ci("last name");
    let name_col = table.column_ci("name");

    let mut outcome = FileUpdateOutcome::default();

    for directive in directives {
        let matches = match_rows(table, subject_col, first_col, last_col, name_col, directive);

        if matches.is_empty() {
            outcome.missing_rows.push(MissingRowEntry {
                file: file_name.into(),
                name: directive.name.clone(),
                subject: directive.subject.clone(),
            });
            continue;
        }
        if matches.len() > 1 {
            outcome.multi_matches.push(MultiMatchEntry {
                file: file_name.into(),
                name: directive.name.clone(),
                subject: directive.subject.clone(),
                count: matches.len(),
            });
        }

        for row in matches {
            if table.rows[row][level_col] != directive.change_to {
                table.rows[row][level_col] = directive.change_to.clone();
                outcome.rows_updated += 1;
                outcome.changed = true;
            }
        }
    }

    Ok(outcome)
}

/// Row indices a directive resolves to. A row matches when its subject
/// code agrees (or the directive has none) and one of the name rules
/// hits: full "first last", bare first name, bare last name (single-word
/// directives only), or a dedicated name column.
fn match_rows(
    table: &RawTable,
    subject_col: usize,
    first_col: Option<usize>,
    last_col: Option<usize>,
    name_col: Option<usize>,
    directive: &Directive,
) -> Vec<usize> {
    let want_subject = subject_code(&directive.subject);
    let want_name = directive_name_key(&directive.name);
    let single_word = !want_name.contains(' ');

    let mut matches = Vec::new();
    for row in 0..table.rows.len() {
        if !want_subject.is_empty() && subject_code(table.value(row, subject_col)) != want_subject {
            continue;
        }

        if let (Some(first), Some(last)) = (first_col, last_col) {
            let full = normalize_text(&format!(
                "{} {}",
                table.value(row, first),
                table.value(row, last)
            ));
            if full == want_name {
                matches.push(row);
                continue;
            }
            if single_word
                && (normalize_text(table.value(row, first)) == want_name
                    || normalize_text(table.value(row, last)) == want_name)
            {
                matches.push(row);
                continue;
            }
        }

        if let Some(name) = name_col {
            if normalize_text(table.value(row, name)) == want_name {
                matches.push(row);
            }
        }
    }
    matches
}
