use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (no sources, duplicate center, etc.).
    ConfigValidation(String),
    /// Missing required column in an input file.
    MissingColumn { file: String, column: String },
    /// The directives file is missing one or more of its required columns.
    MissingDirectiveColumns { file: String, columns: Vec<String> },
    /// After active-flag filtering, no directives are left to apply.
    NoEligibleDirectives,
    /// CSV parse error.
    Csv { file: String, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { file, column } => {
                write!(f, "'{file}': missing column '{column}'")
            }
            Self::MissingDirectiveColumns { file, columns } => {
                write!(f, "'{file}': missing columns: {}", columns.join(", "))
            }
            Self::NoEligibleDirectives => write!(f, "no eligible directives after filtering"),
            Self::Csv { file, message } => write!(f, "'{file}': CSV error: {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
