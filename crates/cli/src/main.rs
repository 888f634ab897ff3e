// pelsync CLI - monthly progress-export loading and correction

mod convert;
mod exit_codes;
mod files;
mod highest;
mod load;
mod students;
mod updates;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pelsync_engine::SyncConfig;

/// A CLI failure carrying its exit code and an optional operator hint.
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

/// Read and validate the run config. Paths inside it resolve relative to
/// the config file's directory, so a checked-out tree works from anywhere.
pub(crate) fn read_config(path: &Path) -> Result<(SyncConfig, PathBuf), CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError {
        code: exit_codes::EXIT_LOAD_CONFIG,
        message: format!("cannot read config {}: {e}", path.display()),
        hint: None,
    })?;
    let config = SyncConfig::from_toml(&text).map_err(|e| CliError {
        code: exit_codes::EXIT_LOAD_CONFIG,
        message: e.to_string(),
        hint: None,
    })?;
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Ok((config, base))
}

pub(crate) fn resolve_store(config: &SyncConfig, base: &Path, over: Option<&Path>) -> PathBuf {
    over.map(Path::to_path_buf)
        .unwrap_or_else(|| base.join(&config.store))
}

#[derive(Parser)]
#[command(name = "pelsync")]
#[command(about = "Load monthly student-progress exports and apply level corrections")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load export files from every configured center into the store
    #[command(after_help = "\
Examples:
  pelsync load pas.toml
  pelsync load pas.toml --json
  pelsync load pas.toml --store /tmp/scratch.db")]
    Load {
        /// Path to the sync TOML config
        config: PathBuf,

        /// Store path override
        #[arg(long, env = "PELSYNC_STORE")]
        store: Option<PathBuf>,

        /// Output the report as JSON instead of a human summary
        #[arg(long)]
        json: bool,

        /// Suppress stderr notes (skipped files/rows)
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Apply operator-authored level corrections to raw export files
    #[command(after_help = "\
Examples:
  pelsync apply-updates pas.toml --dry-run
  pelsync apply-updates pas.toml
  pelsync apply-updates pas.toml --all --folder 'PAS Milpitas CSV'")]
    ApplyUpdates {
        /// Path to the sync TOML config
        config: PathBuf,

        /// Directives CSV override
        #[arg(long)]
        updates: Option<PathBuf>,

        /// Target folder override
        #[arg(long)]
        folder: Option<PathBuf>,

        /// Apply every directive, ignoring the active flag
        #[arg(long)]
        all: bool,

        /// Match and count without writing any file
        #[arg(long)]
        dry_run: bool,

        /// Output the report as JSON instead of a human summary
        #[arg(long)]
        json: bool,

        /// Suppress stderr notes
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Aggregate the student roster from export files and upsert the store
    Students {
        /// Path to the sync TOML config
        config: PathBuf,

        /// Store path override
        #[arg(long, env = "PELSYNC_STORE")]
        store: Option<PathBuf>,

        /// Output the report as JSON instead of a human summary
        #[arg(long)]
        json: bool,

        /// Suppress stderr notes
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Write the highest level reached per student and subject
    Highest {
        /// Path to the sync TOML config
        config: PathBuf,

        /// Output CSV path
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Store path override
        #[arg(long, env = "PELSYNC_STORE")]
        store: Option<PathBuf>,
    },

    /// Convert spreadsheet exports to delimited text
    #[command(after_help = "\
Examples:
  pelsync convert 'PAS Fremont' -o 'PAS Fremont CSV'
  pelsync convert 'PAS Fremont/PAS Fremont JAN 0124.xlsx' -o out --sheet S")]
    Convert {
        /// An .xlsx file or a folder of them
        input: PathBuf,

        /// Output folder for the converted CSVs
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Worksheet to read
        #[arg(long, default_value = "S")]
        sheet: String,

        /// Rows above the header to drop
        #[arg(long, default_value_t = 3)]
        skip_rows: usize,

        /// Cut the table at the first row with more than this many blank fields
        #[arg(long, default_value_t = 10)]
        blank_cutoff: usize,

        /// Suppress stderr notes
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                exit_codes::EXIT_USAGE
            } else {
                exit_codes::EXIT_SUCCESS
            };
            return ExitCode::from(code);
        }
    };

    let result = match cli.command {
        Commands::Load {
            config,
            store,
            json,
            quiet,
        } => load::cmd_load(&config, store.as_deref(), json, quiet),
        Commands::ApplyUpdates {
            config,
            updates,
            folder,
            all,
            dry_run,
            json,
            quiet,
        } => updates::cmd_apply_updates(
            &config,
            updates.as_deref(),
            folder.as_deref(),
            all,
            dry_run,
            json,
            quiet,
        ),
        Commands::Students {
            config,
            store,
            json,
            quiet,
        } => students::cmd_students(&config, store.as_deref(), json, quiet),
        Commands::Highest {
            config,
            output,
            store,
        } => highest::cmd_highest(&config, &output, store.as_deref()),
        Commands::Convert {
            input,
            output,
            sheet,
            skip_rows,
            blank_cutoff,
            quiet,
        } => convert::cmd_convert(&input, &output, &sheet, skip_rows, blank_cutoff, quiet),
    };

    match result {
        Ok(()) => ExitCode::from(exit_codes::EXIT_SUCCESS),
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(err.code)
        }
    }
}
