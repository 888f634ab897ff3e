//! Ordered-candidate column merge: collapse every header variant of one
//! canonical field into a single column, taking the first non-blank value
//! per row. Candidate order is significant and deterministic; the
//! canonical column itself, when present, always wins first.

use crate::table::{is_blank, RawTable};

/// Merge `candidates` into one column named `canonical`. No-op when the
/// candidate list is empty. Non-candidate columns are never touched.
pub fn merge_columns(table: &mut RawTable, candidates: &[String], canonical: &str) {
    // Search order: canonical column first if present, then candidates in
    // their given order. Indices, deduplicated.
    let mut search: Vec<usize> = Vec::new();
    if let Some(idx) = table.column(canonical) {
        search.push(idx);
    }
    for name in candidates {
        if let Some(idx) = table.column(name) {
            if !search.contains(&idx) {
                search.push(idx);
            }
        }
    }
    if search.is_empty() {
        return;
    }

    // The merged value lands in the first search column, renamed canonical.
    let target = search[0];
    table.headers[target] = canonical.to_string();

    for row in &mut table.rows {
        let value = search
            .iter()
            .map(|&idx| row[idx].as_str())
            .find(|v| !is_blank(v))
            .unwrap_or("")
            .to_string();
        row[target] = value;
    }

    // Drop the losing candidate columns.
    let drop: Vec<usize> = search[1..].to_vec();
    if drop.is_empty() {
        return;
    }
    let keep = |idx: &usize| !drop.contains(idx);
    table.headers = table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| keep(i))
        .map(|(_, h)| h.clone())
        .collect();
    for row in &mut table.rows {
        *row = row
            .iter()
            .enumerate()
            .filter(|(i, _)| keep(i))
            .map(|(_, v)| v.clone())
            .collect();
    }
}
