//! Header canonicalization. Export headers drift month to month: renamed
//! enrollment-date columns, duplicated level columns with typo'd names,
//! inconsistent worksheet-number labels. This module trims and aliases
//! headers into the fixed vocabulary, then classifies candidate columns
//! for the level, worksheet-number and subject fields so the merger can
//! collapse them.

// Canonical vocabulary. Everything downstream addresses columns by these.
pub const LEVEL_COLUMN: &str = "PEL Wks. Level";
pub const WORKSHEET_COLUMN: &str = "PEL Wks. No.";
pub const SUBJECT_COLUMN: &str = "Subject (M/E)";
pub const FIRST_NAME_COLUMN: &str = "First Name";
pub const LAST_NAME_COLUMN: &str = "Last Name";
pub const FULL_NAME_COLUMN: &str = "Full Name";
pub const EMAIL_COLUMN: &str = "Email";
pub const DOB_COLUMN: &str = "DOB (MM/DD/YY)";
pub const ADDRESS_COLUMN: &str = "Address";
pub const TEL_COLUMN: &str = "Tel";
pub const SOURCE_COLUMN: &str = "Source";
pub const DOE_COLUMN: &str = "DOE (Date of Enrollment MM/DD/YY)";
pub const CENTER_COLUMN: &str = "Center";
pub const NOTES_COLUMN: &str = "Notes";

/// Known renamed headers, compared after trimming and whitespace collapse.
/// The DOE entry covers the run of exports where the label carried a block
/// of padding spaces; the Tel entries cover the roster sheets.
const HEADER_ALIASES: &[(&str, &str)] = &[
    ("DOE (Date of Enrollment MM/DD/YY)", DOE_COLUMN),
    ("Tel:", TEL_COLUMN),
    ("Tel", TEL_COLUMN),
    ("Telephone", TEL_COLUMN),
    ("Phone", TEL_COLUMN),
    ("Phone Number", TEL_COLUMN),
    ("E-mail", EMAIL_COLUMN),
];

/// Canonicalized headers plus the candidate columns spotted for each of
/// the three drift-prone fields. Candidate lists keep file order and may
/// legitimately hold several entries (duplicate or typo'd columns).
#[derive(Debug, Clone)]
pub struct HeaderScan {
    pub headers: Vec<String>,
    pub level_candidates: Vec<String>,
    pub worksheet_candidates: Vec<String>,
    pub subject_candidates: Vec<String>,
}

pub fn canonicalize_headers(raw: &[String]) -> HeaderScan {
    let headers: Vec<String> = raw.iter().map(|h| rename(h)).collect();

    let mut level_candidates = Vec::new();
    let mut worksheet_candidates = Vec::new();
    let mut subject_candidates = Vec::new();

    for header in &headers {
        let tokens = tokens_upper(header);
        let has_wks = tokens.iter().any(|t| t == "WK" || t == "WKS");
        if has_wks && tokens.iter().any(|t| t == "LEVEL" || t == "LV") {
            level_candidates.push(header.clone());
        }
        if has_wks && (tokens.iter().any(|t| t == "NO") || header.contains('#')) {
            worksheet_candidates.push(header.clone());
        }
        if header.trim().to_ascii_lowercase().starts_with("subject") {
            subject_candidates.push(header.clone());
        }
    }

    HeaderScan {
        headers,
        level_candidates,
        worksheet_candidates,
        subject_candidates,
    }
}

fn rename(raw: &str) -> String {
    let trimmed = raw.trim();
    let collapsed = collapse_whitespace(trimmed);
    for (alias, canonical) in HEADER_ALIASES {
        if collapse_whitespace(alias) == collapsed {
            return (*canonical).to_string();
        }
    }
    trimmed.to_string()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Alphanumeric tokens of a header, uppercased. "PEL Wks. Level" yields
/// ["PEL", "WKS", "LEVEL"].
fn tokens_upper(header: &str) -> Vec<String> {
    header
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(headers: &[&str]) -> HeaderScan {
        canonicalize_headers(&headers.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn trims_and_aliases() {
        let scan = scan(&[
            "  First Name ",
            "DOE            (Date of Enrollment MM/DD/YY)",
            "Tel:",
        ]);
        assert_eq!(scan.headers, vec![FIRST_NAME_COLUMN, DOE_COLUMN, TEL_COLUMN]);
    }

    #[test]
    fn classifies_level_candidates() {
        let scan = scan(&["PEL Wks. Level", "PEL WK LV", "Pel Wks Level 2024", "Level"]);
        assert_eq!(
            scan.level_candidates,
            vec!["PEL Wks. Level", "PEL WK LV", "Pel Wks Level 2024"]
        );
    }

    #[test]
    fn classifies_worksheet_candidates() {
        let scan = scan(&["PEL Wks. No.", "PEL Wks #", "No.", "PEL Wks. Level"]);
        assert_eq!(scan.worksheet_candidates, vec!["PEL Wks. No.", "PEL Wks #"]);
    }

    #[test]
    fn classifies_subject_candidates() {
        let scan = scan(&["Subject (M/E)", " subject ", "Email"]);
        assert_eq!(scan.subject_candidates, vec!["Subject (M/E)", "subject"]);
    }

    #[test]
    fn tolerates_duplicate_candidates() {
        let scan = scan(&["PEL Wks. Level", "PEL Wks. Level 24"]);
        assert_eq!(scan.level_candidates.len(), 2);
    }
}
