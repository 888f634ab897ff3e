//! `pelsync-engine` — progress-export normalization, dedup and
//! corrective-update engine.
//!
//! Pure engine crate: receives CSV text and returns typed records,
//! diffs and reports. No file-system walking, locking or store access;
//! the CLI owns those.

pub mod builder;
pub mod config;
pub mod dedup;
pub mod error;
pub mod headers;
pub mod highest;
pub mod levels;
pub mod loader;
pub mod merge;
pub mod model;
pub mod roster;
pub mod table;
pub mod updates;

pub use config::SyncConfig;
pub use error::EngineError;
pub use model::{LoadReport, NaturalKey, ProgressRecord, Subject, UpdateReport};
pub use table::RawTable;
