//!
//! Configuration loaded from `interlink.toml`.
//!
//! ```toml
//! [database]
//! target = "app.db"
//! create_if_missing = true
//! busy_timeout_ms = 5000
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every field has a default, so an empty file (or no file) is valid.
//! `discover` walks up from a directory looking for the file, the same way
//! a project root is located.
//!

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::driver::SqliteDriver;
use crate::driver::sqlite::MEMORY_TARGET;
use crate::error::{InterlinkError, Result};

pub const CONFIG_FILE_NAME: &str = "interlink.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterlinkConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub target: String,
    pub create_if_missing: bool,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            target: MEMORY_TARGET.to_string(),
            create_if_missing: false,
            busy_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl InterlinkConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::parse(content, Path::new("<inline>"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| InterlinkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Nearest `interlink.toml` in `start` or any of its ancestors.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        let mut current = start;
        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            current = current.parent()?;
        }
    }

    pub fn sqlite_driver(&self) -> SqliteDriver {
        SqliteDriver::new()
            .create_if_missing(self.database.create_if_missing)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| InterlinkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
