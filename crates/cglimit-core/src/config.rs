use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cglimit/config.toml";

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace", "off"];

/// Main configuration for cglimit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where system data is read from
    pub paths: PathsConfig,

    /// Logging configuration
    pub logging: LogConfig,
}

/// Locations of the system files the resolver reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the proc filesystem (default: /proc)
    pub proc_root: PathBuf,

    /// Mount table in /proc/mounts format (default: /proc/mounts)
    pub mount_table: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default log level when RUST_LOG is not set (default: warn)
    pub level: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            mount_table: PathBuf::from("/proc/mounts"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use cglimit_core::config::Config;
    ///
    /// let config = Config::load_from_file("/etc/cglimit/config.toml").unwrap();
    /// println!("Mount table: {}", config.paths.mount_table.display());
    /// ```
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.paths.proc_root.is_absolute() {
            return Err(Error::Config(format!(
                "proc_root must be absolute, got: {}",
                self.paths.proc_root.display()
            )));
        }

        if !self.paths.mount_table.is_absolute() {
            return Err(Error::Config(format!(
                "mount_table must be absolute, got: {}",
                self.paths.mount_table.display()
            )));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(Error::Config(format!(
                "unknown log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }
}
