//! Batch deduplication: one record per natural key, chosen by a
//! deterministic tie-break. Grouping uses the explicit null-tolerant key
//! predicate; a month re-exported by two centers' files must collapse to
//! the same row it did last run.

use std::cmp::Ordering;

use crate::model::{DedupStats, NaturalKey, ProgressRecord};

#[derive(Debug)]
pub struct DedupOutcome {
    pub records: Vec<ProgressRecord>,
    pub stats: DedupStats,
}

/// Collapse a load batch to one record per distinct natural key. Within a
/// group the record maximizing (level_score, worksheet_no), both
/// descending with absent values last, survives; residual ties keep the
/// first-seen record. Group order follows first appearance.
pub fn dedupe(batch: Vec<ProgressRecord>) -> DedupOutcome {
    let input_count = batch.len();
    let mut keys: Vec<NaturalKey> = Vec::new();
    let mut winners: Vec<ProgressRecord> = Vec::new();

    for record in batch {
        let key = record.natural_key();
        match keys.iter().position(|k| k.matches(&key)) {
            Some(idx) => {
                if rank(&record, &winners[idx]) == Ordering::Greater {
                    winners[idx] = record;
                }
            }
            None => {
                keys.push(key);
                winners.push(record);
            }
        }
    }

    let stats = DedupStats {
        input_count,
        distinct_count: winners.len(),
    };
    DedupOutcome {
        records: winners,
        stats,
    }
}

/// Greater means `a` is preferred over `b`.
fn rank(a: &ProgressRecord, b: &ProgressRecord) -> Ordering {
    present_desc(&a.level_score, &b.level_score)
        .then_with(|| present_desc(&a.worksheet_no, &b.worksheet_no))
}

/// Compare optional values with any present value beating an absent one.
/// Worksheet numbers compare as the raw text the store keeps them as.
fn present_desc<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
