//! Archive representations and on-disk naming conventions.
//!
//! Every snapshot exists in one of two forms inside the backup root:
//!
//! - compressed: `<name>.zip` + `<name>_metadata.json` sidecar
//! - directory:  `<name>/` holding `content/`, `config/` and `metadata.json`
//!
//! The metadata record is written after the payload, never before, so a
//! failed payload write can never leave an orphaned record behind.

pub mod writer;

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File extension of compressed archives
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Sidecar suffix for compressed archives: `<name>_metadata.json`
pub const METADATA_SUFFIX: &str = "_metadata.json";

/// Fixed-name metadata file inside directory-form archives
pub const DIR_METADATA_FILE: &str = "metadata.json";

/// In-archive prefix for the content tree
pub const CONTENT_PREFIX: &str = "content";

/// In-archive prefix for auxiliary configuration files
pub const CONFIG_PREFIX: &str = "config";

/// Name prefix of regular snapshots
pub const BACKUP_PREFIX: &str = "backup_";

/// Name prefix of pre-restore safety snapshots
pub const PRE_RESTORE_PREFIX: &str = "pre_restore_backup_";

/// Name prefix of restore staging directories (never listed as archives)
pub const STAGING_PREFIX: &str = "temp_restore_";

/// Storage representation of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Compressed,
    Directory,
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveKind::Compressed => write!(f, "compressed"),
            ArchiveKind::Directory => write!(f, "directory"),
        }
    }
}

/// Persisted per-snapshot metadata. Immutable once written; corrections
/// are delete + recreate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// Timestamp-derived identifier, unique within the backup root
    pub name: String,

    /// Creation instant, epoch seconds
    pub timestamp: i64,

    /// Creation instant, human-readable
    pub datetime: String,

    pub description: String,

    /// Number of files captured in the payload
    pub file_count: u64,

    /// Summed uncompressed byte size of the captured files
    pub content_size: u64,
}

impl ArchiveRecord {
    pub fn new(name: &str, created: DateTime<Local>, description: &str) -> Self {
        Self {
            name: name.to_string(),
            timestamp: created.timestamp(),
            datetime: created.format("%Y-%m-%dT%H:%M:%S").to_string(),
            description: description.to_string(),
            file_count: 0,
            content_size: 0,
        }
    }
}

/// Sidecar path for a compressed archive with the given name.
pub fn sidecar_path(backup_dir: &Path, name: &str) -> PathBuf {
    backup_dir.join(format!("{name}{METADATA_SUFFIX}"))
}

/// Payload path for a compressed archive with the given name.
pub fn payload_path(backup_dir: &Path, name: &str) -> PathBuf {
    backup_dir.join(format!("{name}.{ARCHIVE_EXTENSION}"))
}

fn occupied(backup_dir: &Path, name: &str) -> bool {
    payload_path(backup_dir, name).exists()
        || sidecar_path(backup_dir, name).exists()
        || backup_dir.join(name).exists()
}

/// Pick the next free timestamp-derived name under `backup_dir`.
///
/// Names are `<prefix>%Y%m%d_%H%M%S` at second resolution; when the current
/// second is already taken the candidate instant advances until a free slot
/// is found, keeping identifiers unique and monotonic with creation order.
/// The returned instant is the (possibly adjusted) one the name encodes.
pub fn next_archive_name(backup_dir: &Path, prefix: &str) -> (String, DateTime<Local>) {
    let mut candidate = Local::now();
    loop {
        let name = format!("{prefix}{}", candidate.format("%Y%m%d_%H%M%S"));
        if !occupied(backup_dir, &name) {
            return (name, candidate);
        }
        candidate += Duration::seconds(1);
    }
}
