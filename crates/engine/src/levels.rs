//! Fixed level vocabulary: curriculum level codes mapped to signed scores.
//!
//! Scores increase strictly with curriculum progression within each subject,
//! so "highest level" reduces to an integer max. The tables are compile-time
//! constants; nothing mutates them at runtime.

use crate::model::Subject;

pub const ENGLISH_LEVELS: &[(&str, i32)] = &[
    ("EK1", -4),
    ("EK2", -3),
    ("EK3", -2),
    ("EK4", -1),
    ("EK5", 0),
    ("EG1B", 1),
    ("EG2B", 2),
    ("EG1", 3),
    ("EG2", 4),
    ("EG3", 5),
    ("EG4", 6),
    ("EG5", 7),
    ("EG6", 8),
    ("EG7", 9),
    ("EG8", 10),
    ("EG9", 11),
    ("EG10", 12),
    ("EM1", 13),
    ("EM2", 14),
    ("EM3", 15),
    ("EM4", 16),
    ("EH1", 17),
    ("EH2", 18),
    ("EH3", 19),
    ("EH4", 20),
    ("EH5", 21),
];

pub const MATH_LEVELS: &[(&str, i32)] = &[
    ("MK1", -3),
    ("MK2", -2),
    ("MK3", -1),
    ("MK4", 0),
    ("MG1", 1),
    ("MG2", 2),
    ("MG3", 3),
    ("MG4", 4),
    ("MG5", 5),
    ("MG6", 6),
    ("MG7", 7),
    ("MG8", 8),
    ("MG9", 9),
    ("MG10", 10),
    ("MM1", 11),
    ("MM2", 12),
    ("MM3", 13),
    ("MM4", 14),
    ("MM5", 15),
    ("MH1", 16),
    ("MH2", 17),
    ("MH3", 18),
    ("MH4", 19),
    ("MH5", 20),
    ("MH6", 21),
    ("MHG", 22),
    ("MHT", 23),
];

/// Misprints that appear in historical exports, normalized before lookup.
/// Aliases never participate in the reverse (score → code) direction.
const CODE_ALIASES: &[(&str, &str)] = &[("EH!", "EH1")];

fn table(subject: Subject) -> &'static [(&'static str, i32)] {
    match subject {
        Subject::English => ENGLISH_LEVELS,
        Subject::Math => MATH_LEVELS,
    }
}

/// Look up a level code's score. Expects the code already trimmed and
/// uppercased. Returns None for unrecognized codes; an unknown code is a
/// data-quality condition, not an error.
pub fn level_score(subject: Subject, code: &str) -> Option<i32> {
    let code = CODE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == code)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(code);
    table(subject)
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, score)| *score)
}

/// Reverse lookup: canonical code for a score.
pub fn score_code(subject: Subject, score: i32) -> Option<&'static str> {
    table(subject)
        .iter()
        .find(|(_, s)| *s == score)
        .map(|(c, _)| *c)
}
