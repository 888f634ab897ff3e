use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// The two curriculum tracks. Every canonical record resolves to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Subject {
    English,
    Math,
}

impl Subject {
    /// Resolve a free-text subject field: accepts the single-letter export
    /// codes and the full labels, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "E" | "ENGLISH" => Some(Self::English),
            "M" | "MATH" => Some(Self::Math),
            _ => None,
        }
    }

    /// Infer the subject from a level code's leading character.
    pub fn from_level_code(code: &str) -> Option<Self> {
        match code.trim().chars().next()?.to_ascii_uppercase() {
            'E' => Some(Self::English),
            'M' => Some(Self::Math),
            _ => None,
        }
    }

    /// Single-letter export code ("E" / "M").
    pub fn code(&self) -> char {
        match self {
            Self::English => 'E',
            Self::Math => 'M',
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::English => write!(f, "English"),
            Self::Math => write!(f, "Math"),
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical record + natural key
// ---------------------------------------------------------------------------

/// One student's one-subject progress observation for one month, fully typed.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressRecord {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: Option<String>,
    pub subject: Subject,
    pub level_code: String,
    pub level_score: Option<i32>,
    pub worksheet_no: Option<String>,
    pub progress_date: NaiveDate,
    pub center: String,
    pub notes: Option<String>,
}

impl ProgressRecord {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            full_name: none_if_blank(&self.full_name),
            email: self.email.clone(),
            subject: Some(self.subject),
            progress_date: Some(self.progress_date),
            center: none_if_blank(&self.center),
        }
    }
}

fn none_if_blank(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// The field tuple determining real-world row identity.
///
/// Every field is optional because the store permits absent values; a key
/// read back from the store may carry NULLs that must still compare equal
/// to a freshly built key with the same gaps.
#[derive(Debug, Clone, Serialize)]
pub struct NaturalKey {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<Subject>,
    pub progress_date: Option<NaiveDate>,
    pub center: Option<String>,
}

impl NaturalKey {
    /// Null-tolerant key equality: two keys match when every field is
    /// either equal or absent on both sides. One absent / one present is a
    /// mismatch. This predicate, not derived equality, is what dedup and
    /// the idempotent loader use.
    pub fn matches(&self, other: &NaturalKey) -> bool {
        field_matches(&self.full_name, &other.full_name)
            && field_matches(&self.email, &other.email)
            && field_matches(&self.subject, &other.subject)
            && field_matches(&self.progress_date, &other.progress_date)
            && field_matches(&self.center, &other.center)
    }
}

fn field_matches<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Load pipeline reports
// ---------------------------------------------------------------------------

/// A skipped file or row, surfaced to the operator but never fatal.
#[derive(Debug, Clone, Serialize)]
pub struct LoadWarning {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DedupStats {
    pub input_count: usize,
    pub distinct_count: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LoadReport {
    pub processed: usize,
    pub after_dedup: usize,
    pub inserted: usize,
    pub skipped_existing: usize,
}

// ---------------------------------------------------------------------------
// Corrective-update reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MissingFileEntry {
    pub file: String,
    pub directives: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingRowEntry {
    pub file: String,
    pub name: String,
    pub subject: String,
}

/// A directive that matched more than one row. All matched rows were
/// updated; the entry exists so an operator can audit the outcome.
#[derive(Debug, Clone, Serialize)]
pub struct MultiMatchEntry {
    pub file: String,
    pub name: String,
    pub subject: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateReport {
    pub directives_applied: usize,
    pub rows_updated: usize,
    pub files_changed: Vec<String>,
    pub missing_files: Vec<MissingFileEntry>,
    pub missing_rows: Vec<MissingRowEntry>,
    pub multi_matches: Vec<MultiMatchEntry>,
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// One student identity aggregated across export files.
#[derive(Debug, Clone, Serialize)]
pub struct StudentRecord {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub dob: Option<String>,
    pub address: Option<String>,
    pub tel: Option<String>,
    pub source: Option<String>,
    pub email: String,
    pub enrollment_date: Option<String>,
    pub center: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RosterReport {
    pub processed: usize,
    pub updated: usize,
    pub inserted: usize,
}
