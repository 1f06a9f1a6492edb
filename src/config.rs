//! Configuration management for snapvault.
//!
//! Loads configuration from a TOML file; every field has a sensible default
//! so a partial file (or none at all) still yields a working setup. The
//! loaded value is constructed once at startup and handed by reference to
//! each service — nothing reads ambient process-wide state.

use crate::utils::errors::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory where archives and their metadata live
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Site content tree to snapshot
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Auxiliary configuration files backed up alongside the content tree.
    /// Optional overlays: missing entries are skipped, not errors.
    #[serde(default = "default_config_files")]
    pub config_files: Vec<PathBuf>,

    /// Maximum number of retained archives
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,

    /// Interval between scheduled backups, in hours
    #[serde(default = "default_backup_interval_hours")]
    pub backup_interval_hours: u64,

    /// Write compressed archives (false = directory tree copies)
    #[serde(default = "default_compress")]
    pub compress: bool,

    /// Exclusion tokens: a path containing any of these substrings is
    /// skipped during the walk
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_config_files() -> Vec<PathBuf> {
    vec![PathBuf::from("config.yaml"), PathBuf::from("netlify.toml")]
}

fn default_max_backups() -> usize {
    30
}

fn default_backup_interval_hours() -> u64 {
    24
}

fn default_compress() -> bool {
    true
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        ".git".to_string(),
        "node_modules".to_string(),
        ".cache".to_string(),
        ".pyc".to_string(),
        ".log".to_string(),
        "backups".to_string(),
    ]
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| VaultError::Config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Exclusion tokens for the walk: the configured patterns plus the
    /// backup root's own name, so a backup root nested under the content
    /// tree can never snapshot itself recursively.
    pub fn exclusion_tokens(&self) -> Vec<String> {
        let mut tokens = self.exclude_patterns.clone();
        if let Some(name) = self.backup_dir.file_name() {
            let name = name.to_string_lossy().to_string();
            if !tokens.contains(&name) {
                tokens.push(name);
            }
        }
        tokens
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backup_dir: default_backup_dir(),
            content_dir: default_content_dir(),
            config_files: default_config_files(),
            max_backups: default_max_backups(),
            backup_interval_hours: default_backup_interval_hours(),
            compress: default_compress(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}
