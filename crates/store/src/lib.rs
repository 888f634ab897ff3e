//! `pelsync-store` — SQLite-backed persistent store for canonical
//! progress records and the student roster.
//!
//! The store is append-mostly: loads only ever insert, and the two
//! mutation paths are narrow by contract (the corrective flow edits raw
//! files, not this store; the worksheet-number repair touches exactly one
//! identified row).

use std::fmt;
use std::path::Path;

use rusqlite::{params, Connection};

use pelsync_engine::model::{NaturalKey, ProgressRecord, StudentRecord, Subject};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS progress (
    id INTEGER PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    full_name TEXT,
    email TEXT,
    subject TEXT,
    pel_wks_level TEXT,
    lvs INTEGER,
    pel_wks_no TEXT,
    progress_date TEXT,
    center TEXT,
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_progress_key
    ON progress (full_name, email, subject, progress_date, center);

CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    full_name TEXT,
    dob_raw TEXT,
    address TEXT,
    tel TEXT,
    source TEXT,
    email TEXT,
    enrollment_date_raw TEXT,
    center TEXT
);
"#;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    Sqlite(String),
    /// A targeted single-row update resolved to zero or several rows.
    UpdateNotUnique { matched: usize },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(msg) => write!(f, "store error: {msg}"),
            Self::UpdateNotUnique { matched } => {
                write!(f, "targeted update matched {matched} rows, expected exactly 1")
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct ProgressStore {
    conn: Connection,
}

impl ProgressStore {
    /// Open (creating and provisioning if needed) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Bulk-append canonical records inside one transaction. The caller is
    /// responsible for having anti-joined the batch first; the store does
    /// not re-check.
    pub fn append_progress(&mut self, records: &[ProgressRecord]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO progress (first_name, last_name, full_name, email, subject, \
                 pel_wks_level, lvs, pel_wks_no, progress_date, center, notes) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.first_name,
                    record.last_name,
                    record.full_name,
                    record.email,
                    record.subject.to_string(),
                    record.level_code,
                    record.level_score,
                    record.worksheet_no,
                    record.progress_date.format("%Y-%m-%d").to_string(),
                    record.center,
                    record.notes,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Every persisted natural key, for the loader's anti-join.
    pub fn progress_keys(&self) -> Result<Vec<NaturalKey>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT full_name, email, subject, progress_date, center FROM progress",
        )?;
        let keys = stmt
            .query_map([], |row| {
                let subject: Option<String> = row.get(2)?;
                let date: Option<String> = row.get(3)?;
                Ok(NaturalKey {
                    full_name: row.get(0)?,
                    email: row.get(1)?,
                    subject: subject.as_deref().and_then(Subject::from_label),
                    progress_date: date
                        .as_deref()
                        .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
                    center: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    pub fn progress_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM progress", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// All persisted progress records, in insertion order. Rows whose
    /// subject or date no longer parse (hand-edited stores) are dropped
    /// rather than invented.
    pub fn progress_records(&self) -> Result<Vec<ProgressRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT first_name, last_name, full_name, email, subject, pel_wks_level, \
             lvs, pel_wks_no, progress_date, center, notes FROM progress ORDER BY id",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    row.get::<_, Option<i32>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?.unwrap_or_default(),
                    row.get::<_, Option<String>>(9)?.unwrap_or_default(),
                    row.get::<_, Option<String>>(10)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let records = raw
            .into_iter()
            .filter_map(
                |(first, last, full, email, subject, level, lvs, wks, date, center, notes)| {
                    let subject = Subject::from_label(&subject)?;
                    let progress_date =
                        chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()?;
                    Some(ProgressRecord {
                        first_name: first,
                        last_name: last,
                        full_name: full,
                        email,
                        subject,
                        level_code: level,
                        level_score: lvs,
                        worksheet_no: wks,
                        progress_date,
                        center,
                        notes,
                    })
                },
            )
            .collect();
        Ok(records)
    }

    /// Repair the worksheet number of one exactly-identified record.
    /// SQLite's `IS` gives the null-tolerant key comparison; zero or
    /// multiple matches refuse the update.
    pub fn update_worksheet_no(
        &mut self,
        key: &NaturalKey,
        worksheet_no: Option<&str>,
    ) -> Result<(), StoreError> {
        let subject = key.subject.map(|s| s.to_string());
        let date = key.progress_date.map(|d| d.format("%Y-%m-%d").to_string());

        let matched: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM progress WHERE full_name IS ?1 AND email IS ?2 \
             AND subject IS ?3 AND progress_date IS ?4 AND center IS ?5",
            params![key.full_name, key.email, subject, date, key.center],
            |row| row.get(0),
        )?;
        if matched != 1 {
            return Err(StoreError::UpdateNotUnique {
                matched: matched as usize,
            });
        }

        self.conn.execute(
            "UPDATE progress SET pel_wks_no = ?1 WHERE full_name IS ?2 AND email IS ?3 \
             AND subject IS ?4 AND progress_date IS ?5 AND center IS ?6",
            params![worksheet_no, key.full_name, key.email, subject, date, key.center],
        )?;
        Ok(())
    }

    /// Upsert the roster by (full_name, email): update matching students,
    /// insert the rest. Returns (updated, inserted).
    pub fn upsert_students(
        &mut self,
        students: &[StudentRecord],
    ) -> Result<(usize, usize), StoreError> {
        let tx = self.conn.transaction()?;
        let mut updated = 0usize;
        let mut inserted = 0usize;
        {
            let mut update = tx.prepare(
                "UPDATE students SET first_name = ?1, last_name = ?2, dob_raw = ?3, \
                 address = ?4, tel = ?5, source = ?6, enrollment_date_raw = ?7, center = ?8 \
                 WHERE full_name = ?9 AND email = ?10",
            )?;
            let mut insert = tx.prepare(
                "INSERT INTO students (first_name, last_name, full_name, dob_raw, address, \
                 tel, source, email, enrollment_date_raw, center) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for student in students {
                let changed = update.execute(params![
                    student.first_name,
                    student.last_name,
                    student.dob,
                    student.address,
                    student.tel,
                    student.source,
                    student.enrollment_date,
                    student.center,
                    student.full_name,
                    student.email,
                ])?;
                if changed > 0 {
                    updated += changed;
                } else {
                    insert.execute(params![
                        student.first_name,
                        student.last_name,
                        student.full_name,
                        student.dob,
                        student.address,
                        student.tel,
                        student.source,
                        student.email,
                        student.enrollment_date,
                        student.center,
                    ])?;
                    inserted += 1;
                }
            }
        }
        tx.commit()?;
        Ok((updated, inserted))
    }
}


#[cfg(test)]
mod dbg_tests {
    use super::*;
    use chrono::NaiveDate;
    fn record(full_name: &str, email: Option<&str>) -> ProgressRecord {
        ProgressRecord {
            first_name: "John".into(), last_name: "Smith".into(),
            full_name: full_name.into(), email: email.map(str::to_string),
            subject: Subject::English, level_code: "EG4".into(),
            level_score: Some(6), worksheet_no: Some("120".into()),
            progress_date: NaiveDate::from_ymd_opt(2024,1,1).unwrap(),
            center: "Fremont".into(), notes: None,
        }
    }
    #[test]
    fn dbg_print() {
        let mut store = ProgressStore::open_in_memory().unwrap();
        store.append_progress(&[record("Smith, John", None), record("Lee, Ana", Some("a@x.com"))]).unwrap();
        let keys = store.progress_keys().unwrap();
        for (i,k) in keys.iter().enumerate() { eprintln!("KEY[{}]: {:?}", i, k); }
        eprintln!("m0={} m1={}", keys[0].matches(&record("Smith, John", None).natural_key()), keys[1].matches(&record("Lee, Ana", Some("a@x.com")).natural_key()));
    }
}
