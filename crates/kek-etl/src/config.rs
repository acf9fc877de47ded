use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::resolve::ResolvePolicy;

/// Configuration for kek-archive.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (KEK_* prefix)
/// 3. Config file (~/.config/kek-archive/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: KEK_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/kek-archive/kek.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Git repository holding the archived data history.
    #[serde(default = "default_repository_path")]
    pub repository_path: PathBuf,

    /// Data directory inside the repository (contains `media/` and
    /// `shareholders/`).
    #[serde(default = "default_data_subdir")]
    pub data_subdir: PathBuf,

    /// What to do when a lookup value is new and the source gave no squuid.
    #[serde(default)]
    pub identity_policy: ResolvePolicy,

    /// Log a progress line every this many imported rows.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            repository_path: default_repository_path(),
            data_subdir: default_data_subdir(),
            identity_policy: ResolvePolicy::default(),
            progress_interval: default_progress_interval(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/kek-archive/config.toml
    /// Reads environment variables with KEK_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("kek");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }

    /// Absolute-or-relative path of the data directory in the working tree.
    #[must_use]
    pub fn working_data_dir(&self) -> PathBuf {
        self.repository_path.join(&self.data_subdir)
    }
}

/// Returns: ~/.local/share/kek-archive/kek.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kek-archive")
        .join("kek.db")
}

fn default_repository_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_data_subdir() -> PathBuf {
    PathBuf::from("docs").join("data")
}

const fn default_progress_interval() -> usize {
    100
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/kek-archive/config.toml
/// - macOS: ~/Library/Application Support/kek-archive/config.toml
/// - Windows: %APPDATA%\kek-archive\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kek-archive")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# kek-archive Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (KEK_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the SQLite database
#
# Can also be set via:
# - CLI: kek-archive --db /custom/path.db history
# - Environment: KEK_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/kek.db"

# Git repository whose history holds the archived data
#repository_path = "/path/to/kek-online-archive"

# Data directory inside the repository
#data_subdir = "docs/data"

# Lookup values (categories, statuses, ...) are matched by name. When a
# name is new and the data carries no squuid:
# - "strict": fail the revision
# - "permissive": mint a fresh squuid
#identity_policy = "strict"

# Progress line every N imported rows
#progress_interval = 100
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.database_path.as_os_str().is_empty());
        assert_eq!(config.identity_policy, ResolvePolicy::Strict);
        assert_eq!(config.progress_interval, 100);
        assert_eq!(config.working_data_dir(), PathBuf::from("./docs/data"));
    }

    #[test]
    fn test_config_load() {
        // Should not fail even if config file doesn't exist
        let result = Config::load();
        assert!(result.is_ok());
    }

    #[test]
    fn test_config_with_custom_db_path() {
        let custom_path = PathBuf::from("/tmp/test.db");
        let config = Config::load_with_db_path(custom_path.clone());
        assert!(config.is_ok());
        assert_eq!(config.unwrap().database_path, custom_path);
    }

    #[test]
    fn test_policy_parses_from_toml_style_strings() {
        let config: Config =
            serde_json::from_value(serde_json::json!({"identity_policy": "permissive"})).unwrap();
        assert_eq!(config.identity_policy, ResolvePolicy::Permissive);
        assert_eq!(config.data_subdir, PathBuf::from("docs/data"));
    }
}
