//! Run configuration: which center folders feed a load, where the store
//! lives, and how the corrective-update flow finds its directives.

use serde::Deserialize;

use crate::error::EngineError;
use crate::updates::{DEFAULT_ACTIVE_COLUMN, DEFAULT_ACTIVE_VALUE};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SyncConfig {
    pub name: String,
    /// Store path; the CLI may override it from the environment.
    pub store: String,
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub updates: UpdatesConfig,
}

/// One physical center's export folder.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub center: String,
    pub folder: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatesConfig {
    #[serde(default = "default_updates_file")]
    pub file: String,
    /// Folder holding the files the directives target. Required for
    /// apply-updates; load runs never read it.
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default = "default_active_column")]
    pub active_column: String,
    #[serde(default = "default_active_value")]
    pub active_value: String,
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self {
            file: default_updates_file(),
            folder: None,
            active_column: default_active_column(),
            active_value: default_active_value(),
        }
    }
}

fn default_updates_file() -> String {
    "LevelUpdates.csv".into()
}

fn default_active_column() -> String {
    DEFAULT_ACTIVE_COLUMN.into()
}

fn default_active_value() -> String {
    DEFAULT_ACTIVE_VALUE.into()
}

impl SyncConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, EngineError> {
        let config: SyncConfig =
            toml::from_str(toml_str).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.sources.is_empty() {
            return Err(EngineError::ConfigValidation(
                "at least one [[sources]] entry is required".into(),
            ));
        }
        for source in &self.sources {
            if source.center.trim().is_empty() {
                return Err(EngineError::ConfigValidation(format!(
                    "source folder '{}' has an empty center label",
                    source.folder
                )));
            }
        }
        let mut centers: Vec<&str> = self.sources.iter().map(|s| s.center.as_str()).collect();
        centers.sort_unstable();
        centers.dedup();
        if centers.len() != self.sources.len() {
            return Err(EngineError::ConfigValidation(
                "duplicate center label across sources".into(),
            ));
        }
        if self.store.trim().is_empty() {
            return Err(EngineError::ConfigValidation("empty store path".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_defaults() {
        let config = SyncConfig::from_toml(
            r#"
name = "pas-monthly"
store = "progress.db"

[[sources]]
center = "Fremont"
folder = "PAS Fremont CSV"

[[sources]]
center = "Milpitas"
folder = "PAS Milpitas CSV"
"#,
        )
        .unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.updates.file, "LevelUpdates.csv");
        assert_eq!(config.updates.active_column, "Active changes");
        assert_eq!(config.updates.active_value, "Active");
        assert!(config.updates.folder.is_none());
    }

    #[test]
    fn rejects_duplicate_centers() {
        let err = SyncConfig::from_toml(
            r#"
name = "x"
store = "p.db"
[[sources]]
center = "Fremont"
folder = "a"
[[sources]]
center = "Fremont"
folder = "b"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::ConfigValidation(_)));
    }

    #[test]
    fn rejects_no_sources() {
        let err = SyncConfig::from_toml("name = \"x\"\nstore = \"p.db\"\nsources = []\n")
            .unwrap_err();
        assert!(matches!(err, EngineError::ConfigValidation(_)));
    }
}
