//! Configuration system for yamlwalk.
//!
//! Settings are read from `~/.config/yamlwalk/config.toml` (or a path given
//! on the command line). Every field has a default, so a missing file or a
//! file setting only some keys is valid. Command-line flags override the
//! loaded values.
//!
//! # Example
//!
//! ```
//! use yamlwalk::config::Config;
//!
//! let config: Config = toml::from_str("retain_merge_key_order = true").unwrap();
//! assert!(config.retain_merge_key_order);
//! assert!(!config.skip_document_check);
//! assert_eq!(config.log_level, "warn");
//! ```

use crate::transform::MergeOptions;
use crate::visitor::VisitorOptions;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the yamlwalk command.
///
/// # Fields
///
/// * `skip_document_check` - Accept non-document top-level nodes (default: false)
/// * `retain_merge_key_order` - Keep merge sources in document order (default: false)
/// * `log_level` - Default log filter when `RUST_LOG` is unset (default: "warn")
/// * `create_backup` - Create `.bak` files before overwriting output (default: false)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub skip_document_check: bool,

    #[serde(default)]
    pub retain_merge_key_order: bool,

    /// Log filter directive, e.g. "info" or "yamlwalk=debug"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub create_backup: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skip_document_check: false,
            retain_merge_key_order: false,
            log_level: default_log_level(),
            create_backup: false,
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/yamlwalk/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("yamlwalk");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        let config_path = match Self::config_path() {
            Some(path) => path,
            None => return Self::default(),
        };

        if !config_path.exists() {
            return Self::default();
        }

        Self::load_from(&config_path).unwrap_or_default()
    }

    /// Loads configuration from an explicit path.
    ///
    /// Unlike [`Config::load`], a missing or malformed file is an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(config_path)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    pub fn visitor_options(&self) -> VisitorOptions {
        VisitorOptions {
            skip_document_check: self.skip_document_check,
        }
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            retain_merge_key_order: self.retain_merge_key_order,
        }
    }
}
