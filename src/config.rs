//! Ledger configuration, read from a TOML file.

use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config '{path}': {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config '{path}': {message}")]
    ConfigParse { path: String, message: String },

    #[error("Cannot write config '{path}': {source}")]
    ConfigWrite {
        path: String,
        source: std::io::Error,
    },
}

/// Settings shared by every ledger operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Glob pattern naming the task sheet
    pub sheet_name: String,
    /// Sheet receiving archived rows; created on first archival
    pub archive_sheet_name: String,
    /// Destination of reminders and summaries
    pub recipient: String,
    /// How many leading rows may hold the header
    pub header_scan_rows: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Form_Responses".to_string(),
            archive_sheet_name: "Archive".to_string(),
            recipient: String::new(),
            header_scan_rows: 10,
        }
    }
}

impl LedgerConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigRead {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::ConfigWrite {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let directory = tempfile::tempdir().unwrap();
        let config = LedgerConfig::load(&directory.path().join("ledger.toml")).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.header_scan_rows, 10);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("ledger.toml");
        std::fs::write(&path, "sheet_name = \"Tasks*\"\nrecipient = \"me@example.com\"\n").unwrap();

        let config = LedgerConfig::load(&path).unwrap();
        assert_eq!(config.sheet_name, "Tasks*");
        assert_eq!(config.recipient, "me@example.com");
        assert_eq!(config.archive_sheet_name, "Archive");
    }

    #[test]
    fn save_then_load() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("ledger.toml");
        let config = LedgerConfig {
            header_scan_rows: 5,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(LedgerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn invalid_file_is_reported() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("ledger.toml");
        std::fs::write(&path, "header_scan_rows = \"ten\"").unwrap();
        assert!(matches!(LedgerConfig::load(&path), Err(ConfigError::ConfigParse { .. })));
    }
}
