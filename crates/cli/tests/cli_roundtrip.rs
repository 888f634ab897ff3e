// Integration tests driving the pelsync binary end to end against a
// temporary tree: config, center folders, directives, store.
// Run with: cargo test -p pelsync-cli --test cli_roundtrip

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn pelsync(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pelsync"))
        .current_dir(dir)
        .env_remove("PELSYNC_STORE")
        .args(args)
        .output()
        .expect("spawn pelsync")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("JSON report on stdout")
}

const CONFIG: &str = r#"
name = "pas-monthly"
store = "progress.db"

[[sources]]
center = "Fremont"
folder = "Fremont CSV"

[[sources]]
center = "Milpitas"
folder = "Milpitas CSV"

[updates]
file = "LevelUpdates.csv"
folder = "Milpitas CSV"
"#;

const FREMONT_JAN: &str = "\
First Name,Last Name,Email,Subject (M/E),PEL Wks. Level,PEL Wks. No.\n\
John,Smith,j@example.com,E,EG4,120\n\
Jane,Smith,,E,EG2,40\n";

const MILPITAS_JAN: &str = "\
First Name,Last Name,Email,Subject (M/E),PEL Wks. Level,PEL Wks. No.\n\
Raj,Patel,r@example.com,M,MG7,88\n";

const UPDATES: &str = "\
Subject,Name,Change To,File Name,Active changes\n\
Math,\"Patel, Raj\",MG9,PAS Milpitas JAN 0124.csv,Active\n\
English,Nobody,EG1,PAS Milpitas JAN 0124.csv,Active\n";

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    std::fs::create_dir(root.join("Fremont CSV")).unwrap();
    std::fs::create_dir(root.join("Milpitas CSV")).unwrap();
    std::fs::write(root.join("pas.toml"), CONFIG).unwrap();
    std::fs::write(
        root.join("Fremont CSV/PAS Fremont JAN 0124.csv"),
        FREMONT_JAN,
    )
    .unwrap();
    // The Milpitas exports carry a UTF-8 BOM, like the spreadsheet tool
    // that produced them.
    std::fs::write(
        root.join("Milpitas CSV/PAS Milpitas JAN 0124.csv"),
        format!("\u{feff}{MILPITAS_JAN}"),
    )
    .unwrap();
    std::fs::write(root.join("LevelUpdates.csv"), UPDATES).unwrap();
    (dir, root)
}

#[test]
fn load_is_idempotent_across_reruns() {
    let (_dir, root) = setup();

    let first = stdout_json(&pelsync(&root, &["load", "pas.toml", "--json", "-q"]));
    assert_eq!(first["processed"], 3);
    assert_eq!(first["after_dedup"], 3);
    assert_eq!(first["inserted"], 3);
    assert_eq!(first["skipped_existing"], 0);

    let second = stdout_json(&pelsync(&root, &["load", "pas.toml", "--json", "-q"]));
    assert_eq!(second["inserted"], 0);
    assert_eq!(second["skipped_existing"], 3);
}

#[test]
fn dry_run_counts_match_live_and_only_live_writes() {
    let (_dir, root) = setup();
    let target = root.join("Milpitas CSV/PAS Milpitas JAN 0124.csv");
    let before = std::fs::read(&target).unwrap();

    let dry = stdout_json(&pelsync(
        &root,
        &["apply-updates", "pas.toml", "--dry-run", "--json", "-q"],
    ));
    assert_eq!(dry["directives_applied"], 2);
    assert_eq!(dry["rows_updated"], 1);
    assert_eq!(dry["files_changed"].as_array().unwrap().len(), 1);
    assert_eq!(dry["missing_rows"].as_array().unwrap().len(), 1);
    assert_eq!(std::fs::read(&target).unwrap(), before, "dry run wrote a file");

    let live = stdout_json(&pelsync(
        &root,
        &["apply-updates", "pas.toml", "--json", "-q"],
    ));
    assert_eq!(live["rows_updated"], 1);
    assert_eq!(live["files_changed"], serde_json::json!(["PAS Milpitas JAN 0124.csv"]));

    let after = std::fs::read(&target).unwrap();
    assert!(after.starts_with("\u{feff}".as_bytes()), "BOM dropped on write-back");
    let text = String::from_utf8(after).unwrap();
    assert!(text.contains("MG9"));
    assert!(!text.contains("MG7"));

    // Nothing left to change; a re-run is a no-op.
    let again = stdout_json(&pelsync(
        &root,
        &["apply-updates", "pas.toml", "--json", "-q"],
    ));
    assert_eq!(again["rows_updated"], 0);
    assert!(again["files_changed"].as_array().unwrap().is_empty());
}

#[test]
fn zero_active_directives_fails_fast() {
    let (_dir, root) = setup();
    std::fs::write(
        root.join("LevelUpdates.csv"),
        "Subject,Name,Change To,File Name,Active changes\n\
         Math,Someone,MG1,PAS Milpitas JAN 0124.csv,draft\n",
    )
    .unwrap();

    let output = pelsync(&root, &["apply-updates", "pas.toml", "--json"]);
    assert_eq!(output.status.code(), Some(12));
}

#[test]
fn missing_directive_columns_fail_fast() {
    let (_dir, root) = setup();
    std::fs::write(root.join("LevelUpdates.csv"), "Subject,Name\nMath,Someone\n").unwrap();

    let output = pelsync(&root, &["apply-updates", "pas.toml"]);
    assert_eq!(output.status.code(), Some(11));
}

#[test]
fn roster_upserts_then_updates() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    std::fs::create_dir(root.join("Fremont CSV")).unwrap();
    std::fs::create_dir(root.join("Milpitas CSV")).unwrap();
    std::fs::write(root.join("pas.toml"), CONFIG).unwrap();

    let header = "First Name,Last Name,DOB (MM/DD/YY),Address,Email,\
                  DOE (Date of Enrollment MM/DD/YY)";
    std::fs::write(
        root.join("Fremont CSV/PAS Fremont JAN 0124.csv"),
        format!("{header}\nJohn,Smith,01/02/10,12 Oak St,J@example.com,05/06/23\n"),
    )
    .unwrap();
    std::fs::write(
        root.join("Milpitas CSV/PAS Milpitas JAN 0124.csv"),
        format!("{header}\nRaj,Patel,,9 Elm Ave,r@example.com,\n"),
    )
    .unwrap();

    let first = stdout_json(&pelsync(&root, &["students", "pas.toml", "--json", "-q"]));
    assert_eq!(first["processed"], 2);
    assert_eq!(first["inserted"], 2);
    assert_eq!(first["updated"], 0);

    let second = stdout_json(&pelsync(&root, &["students", "pas.toml", "--json", "-q"]));
    assert_eq!(second["inserted"], 0);
    assert_eq!(second["updated"], 2);
}

#[test]
fn highest_report_reflects_store_maximum() {
    let (_dir, root) = setup();
    // Add a later month where John regressed; the report keeps the max.
    std::fs::write(
        root.join("Fremont CSV/PAS Fremont FEB 0224.csv"),
        "First Name,Last Name,Email,Subject (M/E),PEL Wks. Level,PEL Wks. No.\n\
         John,Smith,j@example.com,E,EG3,10\n",
    )
    .unwrap();

    let load = pelsync(&root, &["load", "pas.toml", "-q"]);
    assert!(load.status.success());

    let output = pelsync(&root, &["highest", "pas.toml", "-o", "highest.csv"]);
    assert!(output.status.success());

    let report = std::fs::read_to_string(root.join("highest.csv")).unwrap();
    let mut lines = report.lines();
    assert_eq!(
        lines.next(),
        Some("First Name,Last Name,Subject (M/E),PEL Wks. Level")
    );
    let rows: Vec<&str> = lines.collect();
    assert!(rows.contains(&"John,Smith,E,EG4"));
    assert!(rows.contains(&"Jane,Smith,E,EG2"));
    assert!(rows.contains(&"Raj,Patel,M,MG7"));
    assert_eq!(rows.len(), 3);
}
