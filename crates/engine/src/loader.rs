//! Idempotent load diffing: anti-join a deduplicated batch against the
//! keys already persisted. Only genuinely new keys are inserted; an
//! unchanged batch re-run inserts nothing. Existing rows are never
//! touched here; the corrective path is the only mutation route.

use crate::model::{LoadReport, NaturalKey, ProgressRecord};

#[derive(Debug)]
pub struct LoadDiff {
    pub to_insert: Vec<ProgressRecord>,
    pub skipped_existing: usize,
}

/// Split a deduplicated batch into records to insert and records whose
/// natural key the store already holds, using the same null-tolerant
/// predicate the deduplicator groups with.
pub fn diff_against_store(batch: Vec<ProgressRecord>, existing: &[NaturalKey]) -> LoadDiff {
    let mut to_insert = Vec::new();
    let mut skipped_existing = 0usize;

    for record in batch {
        let key = record.natural_key();
        if existing.iter().any(|k| k.matches(&key)) {
            skipped_existing += 1;
        } else {
            to_insert.push(record);
        }
    }

    LoadDiff {
        to_insert,
        skipped_existing,
    }
}

pub fn load_report(processed: usize, after_dedup: usize, diff: &LoadDiff) -> LoadReport {
    LoadReport {
        processed,
        after_dedup,
        inserted: diff.to_insert.len(),
        skipped_existing: diff.skipped_existing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::dedupe;
    use crate::model::Subject;
    use chrono::NaiveDate;

    fn record(full_name: &str, email: Option<&str>) -> ProgressRecord {
        ProgressRecord {
            first_name: String::new(),
            last_name: String::new(),
            full_name: full_name.into(),
            email: email.map(str::to_string),
            subject: Subject::Math,
            level_code: "MG1".into(),
            level_score: Some(1),
            worksheet_no: None,
            progress_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            center: "Milpitas".into(),
            notes: None,
        }
    }

    #[test]
    fn rerun_of_same_batch_inserts_nothing() {
        let batch = vec![record("Lee, Ana", Some("a@x.com")), record("Kim, Bo", None)];
        let deduped = dedupe(batch.clone()).records;

        let first = diff_against_store(deduped.clone(), &[]);
        assert_eq!(first.to_insert.len(), 2);
        assert_eq!(first.skipped_existing, 0);

        let persisted: Vec<_> = first.to_insert.iter().map(|r| r.natural_key()).collect();
        let second = diff_against_store(deduped, &persisted);
        assert_eq!(second.to_insert.len(), 0);
        assert_eq!(second.skipped_existing, 2);
    }

    #[test]
    fn new_keys_insert_alongside_existing() {
        let existing = vec![record("Lee, Ana", None).natural_key()];
        let diff = diff_against_store(
            vec![record("Lee, Ana", None), record("Kim, Bo", None)],
            &existing,
        );
        assert_eq!(diff.to_insert.len(), 1);
        assert_eq!(diff.to_insert[0].full_name, "Kim, Bo");
        assert_eq!(diff.skipped_existing, 1);
    }

    #[test]
    fn absent_email_matches_stored_absent_email_only() {
        let existing = vec![record("Lee, Ana", None).natural_key()];
        let diff = diff_against_store(vec![record("Lee, Ana", Some("a@x.com"))], &existing);
        assert_eq!(diff.to_insert.len(), 1);
    }
}
