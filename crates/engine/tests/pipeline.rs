// End-to-end engine tests: raw multi-center export text in, deduplicated
// canonical batch and corrective outcomes out.

use std::collections::BTreeSet;

use pelsync_engine::builder::process_file;
use pelsync_engine::dedup::dedupe;
use pelsync_engine::loader::diff_against_store;
use pelsync_engine::model::{ProgressRecord, Subject};
use pelsync_engine::table::RawTable;
use pelsync_engine::updates::{
    apply_to_table, parse_directives, route_directives, DirectiveFilter,
};

// Fremont's export: tidy canonical headers plus a typo'd duplicate level
// column that only some rows fill.
const FREMONT_JAN: &str = "\
First Name,Last Name,Email,Subject (M/E),PEL Wks. Level,PEL Wks Level 24,PEL Wks. No.
John,Smith,j.smith@example.com,E,EG4,,120
Ana,Lee,,M,,MM2,30
";

// Milpitas drifted: no subject column, renamed level/worksheet headers,
// padded DOE header, a repeat of John with a higher level.
const MILPITAS_JAN: &str = "\
First Name,Last Name,Email,PEL Wk Lv,PEL Wks #,DOE            (Date of Enrollment MM/DD/YY)
John,Smith,j.smith@example.com,EG5,121,01/02/23
Raj,Patel,r.patel@example.com,MG7,88,03/04/23
";

fn batch() -> Vec<ProgressRecord> {
    let fremont = RawTable::from_csv_str("PAS Fremont JAN 0124.csv", FREMONT_JAN).unwrap();
    let milpitas = RawTable::from_csv_str("PAS Milpitas JAN 0124.csv", MILPITAS_JAN).unwrap();

    let mut records = Vec::new();
    let fb = process_file(fremont, "PAS Fremont JAN 0124.csv", "Fremont");
    assert!(fb.warnings.is_empty(), "{:?}", fb.warnings);
    records.extend(fb.records);
    let mb = process_file(milpitas, "PAS Milpitas JAN 0124.csv", "Milpitas");
    assert!(mb.warnings.is_empty(), "{:?}", mb.warnings);
    records.extend(mb.records);
    records
}

#[test]
fn drifted_headers_build_identical_shapes() {
    let records = batch();
    assert_eq!(records.len(), 4);

    // Fremont's duplicate level column merged first-non-blank.
    assert_eq!(records[0].level_code, "EG4");
    assert_eq!(records[1].level_code, "MM2");
    assert_eq!(records[1].subject, Subject::Math);

    // Milpitas subject inferred from the level code prefix.
    let raj = records.iter().find(|r| r.last_name == "Patel").unwrap();
    assert_eq!(raj.subject, Subject::Math);
    assert_eq!(raj.level_score, Some(7));
    assert_eq!(raj.worksheet_no.as_deref(), Some("88"));

    // Same month for both centers, from the filenames.
    assert!(records
        .iter()
        .all(|r| r.progress_date.to_string() == "2024-01-01"));
}

#[test]
fn same_student_across_centers_stays_distinct() {
    // John appears in both files with the same email and month, but the
    // centers differ, so the keys differ and both survive dedup.
    let out = dedupe(batch());
    assert_eq!(out.stats.input_count, 4);
    assert_eq!(out.stats.distinct_count, 4);
}

#[test]
fn duplicate_export_collapses_and_reload_inserts_nothing() {
    // The same file ingested under both centers' folders for the same
    // month: one key per (student, center), higher level survives.
    let mut records = batch();
    records.extend(batch());
    let out = dedupe(records);
    assert_eq!(out.stats.input_count, 8);
    assert_eq!(out.stats.distinct_count, 4);

    let first = diff_against_store(out.records.clone(), &[]);
    assert_eq!(first.to_insert.len(), 4);

    let stored: Vec<_> = first.to_insert.iter().map(|r| r.natural_key()).collect();
    let second = diff_against_store(out.records, &stored);
    assert_eq!(second.to_insert.len(), 0);
    assert_eq!(second.skipped_existing, 4);
}

#[test]
fn directives_route_and_apply_per_file() {
    let updates = RawTable::from_csv_str(
        "LevelUpdates.csv",
        "\
Subject,Name,Change To,File Name,Active changes
English,\"Smith, John\",EG6,PAS Fremont JAN 0124.csv,Active
Math,Patel,MG8,PAS Milpitas JAN 0124.CSV,Active
Math,Ghost,MG1,PAS Nowhere JAN 0124.csv,Active
English,Draft Row,EG1,PAS Fremont JAN 0124.csv,
",
    )
    .unwrap();

    let directives =
        parse_directives(&updates, "LevelUpdates.csv", &DirectiveFilter::default()).unwrap();
    assert_eq!(directives.len(), 3);

    let stems: BTreeSet<String> = ["pas fremont jan 0124", "pas milpitas jan 0124"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let routed = route_directives(directives, &stems);
    assert_eq!(routed.by_file.len(), 2);
    assert_eq!(routed.missing_files.len(), 1);
    assert_eq!(routed.missing_files[0].file, "pas nowhere jan 0124");

    let mut fremont = RawTable::from_csv_str("PAS Fremont JAN 0124.csv", FREMONT_JAN).unwrap();
    let outcome = apply_to_table(
        &mut fremont,
        "PAS Fremont JAN 0124.csv",
        &routed.by_file[0].1,
    )
    .unwrap();
    assert_eq!(outcome.rows_updated, 1);
    assert!(outcome.missing_rows.is_empty());

    let level_col = fremont.column("PEL Wks. Level").unwrap();
    assert_eq!(fremont.rows[0][level_col], "EG6");

    // The corrected file re-parses and the new code flows through.
    let rebuilt = process_file(fremont, "PAS Fremont JAN 0124.csv", "Fremont");
    assert_eq!(rebuilt.records[0].level_code, "EG6");
    assert_eq!(rebuilt.records[0].level_score, Some(8));
}
