//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes. Exit codes are part of
//! the shell contract; the monthly cron wrappers branch on them.
//!
//! | Range   | Domain        | Description                                |
//! |---------|---------------|--------------------------------------------|
//! | 0       | Universal     | Success                                    |
//! | 1       | Universal     | General error (unspecified)                |
//! | 2       | Universal     | CLI usage error (bad args, missing file)   |
//! | 3-9     | load          | Load pipeline preconditions               |
//! | 10-19   | apply-updates | Corrective-update preconditions           |
//! | 20-29   | convert       | Spreadsheet conversion                     |
//!
//! Skipped rows, skipped files and ambiguous directive matches are
//! reported, not exit-coded: runs that recover locally still exit 0.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Load (3-9)
// =============================================================================

/// Run config unreadable or invalid.
pub const EXIT_LOAD_CONFIG: u8 = 3;

/// A configured source folder does not exist.
pub const EXIT_LOAD_INPUT: u8 = 4;

/// Store open/append failure.
pub const EXIT_LOAD_STORE: u8 = 5;

// =============================================================================
// Apply-updates (10-19)
// =============================================================================

/// Directives file or target folder missing/unreadable.
pub const EXIT_UPDATES_INPUT: u8 = 10;

/// Directives file is missing required columns (incl. the active flag).
pub const EXIT_UPDATES_COLUMNS: u8 = 11;

/// Zero eligible directives after active-flag filtering.
pub const EXIT_UPDATES_NONE_ACTIVE: u8 = 12;

/// A target export file is missing its level or subject column.
pub const EXIT_UPDATES_TARGET: u8 = 13;

// =============================================================================
// Convert (20-29)
// =============================================================================

/// Workbook unreadable or requested sheet absent.
pub const EXIT_CONVERT_INPUT: u8 = 20;
