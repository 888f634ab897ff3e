//! Highest-level report: the maximum curriculum level each student has
//! reached per subject, mapped back to its level code.

use serde::Serialize;

use crate::levels::score_code;
use crate::model::{ProgressRecord, Subject};

#[derive(Debug, Clone, Serialize)]
pub struct HighestLevel {
    pub first_name: String,
    pub last_name: String,
    pub subject: Subject,
    pub level_code: String,
}

/// One row per (first name, last name, subject) holding the record-high
/// level. Records whose code never mapped to a score cannot rank and are
/// ignored. Output is sorted for stable reports.
pub fn highest_levels(records: &[ProgressRecord]) -> Vec<HighestLevel> {
    let mut best: Vec<(String, String, Subject, i32)> = Vec::new();

    for record in records {
        let Some(score) = record.level_score else {
            continue;
        };
        let pos = best.iter().position(|(f, l, s, _)| {
            *f == record.first_name && *l == record.last_name && *s == record.subject
        });
        match pos {
            Some(idx) => best[idx].3 = best[idx].3.max(score),
            None => best.push((
                record.first_name.clone(),
                record.last_name.clone(),
                record.subject,
                score,
            )),
        }
    }

    best.sort_by(|a, b| (&a.0, &a.1, a.2).cmp(&(&b.0, &b.1, b.2)));
    best.into_iter()
        .filter_map(|(first_name, last_name, subject, score)| {
            score_code(subject, score).map(|code| HighestLevel {
                first_name,
                last_name,
                subject,
                level_code: code.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(first: &str, subject: Subject, code: &str, score: Option<i32>) -> ProgressRecord {
        ProgressRecord {
            first_name: first.into(),
            last_name: "Smith".into(),
            full_name: format!("Smith, {first}"),
            email: None,
            subject,
            level_code: code.into(),
            level_score: score,
            worksheet_no: None,
            progress_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            center: "Fremont".into(),
            notes: None,
        }
    }

    #[test]
    fn max_score_maps_back_to_code() {
        let rows = highest_levels(&[
            record("John", Subject::English, "EG2", Some(4)),
            record("John", Subject::English, "EG6", Some(8)),
            record("John", Subject::Math, "MG1", Some(1)),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].subject, Subject::English);
        assert_eq!(rows[0].level_code, "EG6");
        assert_eq!(rows[1].level_code, "MG1");
    }

    #[test]
    fn unscored_records_are_ignored() {
        let rows = highest_levels(&[record("John", Subject::English, "E??", None)]);
        assert!(rows.is_empty());
    }
}
