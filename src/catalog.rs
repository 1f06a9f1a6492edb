//! Archive catalog derived by scanning the backup root.
//!
//! There is no independent index: every `list()` call rebuilds the catalog
//! from the directory contents, so the filesystem is always the source of
//! truth. A payload without a readable metadata record (or the reverse) is
//! excluded from the listing with a typed skip reason — one bad entry never
//! aborts enumeration of the rest.

use crate::archive::{
    sidecar_path, ArchiveKind, ArchiveRecord, ARCHIVE_EXTENSION, DIR_METADATA_FILE,
    METADATA_SUFFIX, STAGING_PREFIX,
};
use crate::utils::errors::{Result, VaultError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// One listed archive: its record plus what the scan observed on disk.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub record: ArchiveRecord,
    pub kind: ArchiveKind,
    pub path: PathBuf,
    /// Computed at scan time, never stored
    pub size_on_disk: u64,
}

/// Why a directory entry was left out of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Payload present, metadata record absent
    MissingMetadata,
    /// Metadata record unreadable or unparsable
    CorruptMetadata(String),
    /// Metadata record present, payload absent
    OrphanedMetadata,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingMetadata => write!(f, "missing metadata record"),
            SkipReason::CorruptMetadata(e) => write!(f, "corrupt metadata record: {e}"),
            SkipReason::OrphanedMetadata => write!(f, "orphaned metadata record"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Result of one catalog scan: listable entries newest first, plus every
/// entry that was skipped and why.
#[derive(Debug, Default)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
    pub skipped: Vec<SkippedEntry>,
}

pub struct CatalogStore {
    backup_dir: PathBuf,
}

impl CatalogStore {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    /// Scan the backup root. A missing root is an empty catalog, not an
    /// error.
    pub fn list(&self) -> Result<Catalog> {
        let mut catalog = Catalog::default();
        if !self.backup_dir.is_dir() {
            return Ok(catalog);
        }

        for dir_entry in fs::read_dir(&self.backup_dir)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            let file_name = dir_entry.file_name().to_string_lossy().to_string();

            if path.is_dir() {
                // Restore staging areas live in the backup root but are
                // transient, not archives
                if file_name.starts_with(STAGING_PREFIX) {
                    continue;
                }
                self.scan_directory_archive(&path, &mut catalog);
            } else if file_name.ends_with(&format!(".{ARCHIVE_EXTENSION}")) {
                self.scan_compressed_archive(&path, &mut catalog);
            } else if let Some(base) = file_name.strip_suffix(METADATA_SUFFIX) {
                if !crate::archive::payload_path(&self.backup_dir, base).exists() {
                    warn!(path = %path.display(), "Skipping catalog entry: orphaned metadata record");
                    catalog.skipped.push(SkippedEntry {
                        path,
                        reason: SkipReason::OrphanedMetadata,
                    });
                }
                // otherwise paired with its payload when the payload is seen
            }
            // anything else in the backup root is not ours to interpret
        }

        // Newest first; ties fall back to name so ordering does not depend
        // on the directory read order
        catalog.entries.sort_by(|a, b| {
            b.record
                .timestamp
                .cmp(&a.record.timestamp)
                .then_with(|| b.record.name.cmp(&a.record.name))
        });
        Ok(catalog)
    }

    /// Convenience lookup over `list()`.
    pub fn find(&self, id: &str) -> Result<Option<CatalogEntry>> {
        Ok(self
            .list()?
            .entries
            .into_iter()
            .find(|entry| entry.record.name == id))
    }

    fn scan_compressed_archive(&self, path: &Path, catalog: &mut Catalog) {
        let Some(base) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            return;
        };
        let metadata_path = sidecar_path(&self.backup_dir, &base);
        if !metadata_path.exists() {
            warn!(path = %path.display(), "Skipping catalog entry: missing metadata record");
            catalog.skipped.push(SkippedEntry {
                path: path.to_path_buf(),
                reason: SkipReason::MissingMetadata,
            });
            return;
        }
        match read_record(&metadata_path) {
            Ok(record) => {
                let size_on_disk = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                catalog.entries.push(CatalogEntry {
                    record,
                    kind: ArchiveKind::Compressed,
                    path: path.to_path_buf(),
                    size_on_disk,
                });
            }
            Err(e) => {
                warn!(path = %metadata_path.display(), error = %e, "Skipping catalog entry");
                catalog.skipped.push(SkippedEntry {
                    path: path.to_path_buf(),
                    reason: SkipReason::CorruptMetadata(e.to_string()),
                });
            }
        }
    }

    fn scan_directory_archive(&self, path: &Path, catalog: &mut Catalog) {
        let metadata_path = path.join(DIR_METADATA_FILE);
        if !metadata_path.exists() {
            warn!(path = %path.display(), "Skipping catalog entry: missing metadata record");
            catalog.skipped.push(SkippedEntry {
                path: path.to_path_buf(),
                reason: SkipReason::MissingMetadata,
            });
            return;
        }
        match read_record(&metadata_path) {
            Ok(record) => {
                catalog.entries.push(CatalogEntry {
                    record,
                    kind: ArchiveKind::Directory,
                    path: path.to_path_buf(),
                    size_on_disk: tree_size(path),
                });
            }
            Err(e) => {
                warn!(path = %metadata_path.display(), error = %e, "Skipping catalog entry");
                catalog.skipped.push(SkippedEntry {
                    path: path.to_path_buf(),
                    reason: SkipReason::CorruptMetadata(e.to_string()),
                });
            }
        }
    }
}

fn read_record(path: &Path) -> Result<ArchiveRecord> {
    let text = fs::read_to_string(path)
        .map_err(|e| VaultError::CorruptMetadata(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| VaultError::CorruptMetadata(format!("{}: {e}", path.display())))
}

/// Recursive sum of file sizes under `path`.
pub(crate) fn tree_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::payload_path;
    use tempfile::TempDir;

    fn write_compressed_fixture(backup_dir: &Path, name: &str, timestamp: i64) {
        fs::write(payload_path(backup_dir, name), b"not a real zip").unwrap();
        let record = serde_json::json!({
            "name": name,
            "timestamp": timestamp,
            "datetime": "2026-01-01T00:00:00",
            "description": "fixture",
            "file_count": 1,
            "content_size": 14,
        });
        fs::write(
            sidecar_path(backup_dir, name),
            serde_json::to_string_pretty(&record).unwrap(),
        )
        .unwrap();
    }

    fn write_directory_fixture(backup_dir: &Path, name: &str, timestamp: i64) {
        let dir = backup_dir.join(name);
        fs::create_dir_all(dir.join("content")).unwrap();
        fs::write(dir.join("content/page.md"), b"hello").unwrap();
        let record = serde_json::json!({
            "name": name,
            "timestamp": timestamp,
            "datetime": "2026-01-01T00:00:00",
            "description": "fixture",
            "file_count": 1,
            "content_size": 5,
        });
        fs::write(
            dir.join(DIR_METADATA_FILE),
            serde_json::to_string_pretty(&record).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_missing_backup_dir_is_empty_catalog() {
        let temp = TempDir::new().unwrap();
        let store = CatalogStore::new(temp.path().join("nope"));
        let catalog = store.list().unwrap();
        assert!(catalog.entries.is_empty());
        assert!(catalog.skipped.is_empty());
    }

    #[test]
    fn test_list_sorts_newest_first_across_kinds() {
        let temp = TempDir::new().unwrap();
        write_compressed_fixture(temp.path(), "backup_a", 100);
        write_directory_fixture(temp.path(), "backup_b", 300);
        write_compressed_fixture(temp.path(), "backup_c", 200);

        let store = CatalogStore::new(temp.path());
        let catalog = store.list().unwrap();
        let names: Vec<&str> = catalog
            .entries
            .iter()
            .map(|e| e.record.name.as_str())
            .collect();
        assert_eq!(names, vec!["backup_b", "backup_c", "backup_a"]);
        assert_eq!(catalog.entries[0].kind, ArchiveKind::Directory);
        assert!(catalog.entries[0].size_on_disk > 0);
    }

    #[test]
    fn test_equal_timestamps_order_by_name() {
        let temp = TempDir::new().unwrap();
        // Deliberately inserted out of lexical order; read_dir order is
        // platform-dependent, so the tie-break must not rely on it.
        write_compressed_fixture(temp.path(), "backup_m", 100);
        write_directory_fixture(temp.path(), "backup_z", 100);
        write_compressed_fixture(temp.path(), "backup_a", 100);

        let catalog = CatalogStore::new(temp.path()).list().unwrap();
        let names: Vec<&str> = catalog
            .entries
            .iter()
            .map(|e| e.record.name.as_str())
            .collect();
        assert_eq!(names, vec!["backup_z", "backup_m", "backup_a"]);
    }

    #[test]
    fn test_payload_without_sidecar_is_skipped_not_error() {
        let temp = TempDir::new().unwrap();
        write_compressed_fixture(temp.path(), "backup_ok", 100);
        fs::write(payload_path(temp.path(), "backup_bare"), b"zip").unwrap();

        let catalog = CatalogStore::new(temp.path()).list().unwrap();
        assert_eq!(catalog.entries.len(), 1);
        assert_eq!(catalog.skipped.len(), 1);
        assert_eq!(catalog.skipped[0].reason, SkipReason::MissingMetadata);
    }

    #[test]
    fn test_corrupt_sidecar_is_skipped_not_error() {
        let temp = TempDir::new().unwrap();
        write_compressed_fixture(temp.path(), "backup_ok", 100);
        fs::write(payload_path(temp.path(), "backup_bad"), b"zip").unwrap();
        fs::write(sidecar_path(temp.path(), "backup_bad"), b"{ nope").unwrap();

        let catalog = CatalogStore::new(temp.path()).list().unwrap();
        assert_eq!(catalog.entries.len(), 1);
        assert_eq!(catalog.skipped.len(), 1);
        assert!(matches!(
            catalog.skipped[0].reason,
            SkipReason::CorruptMetadata(_)
        ));
    }

    #[test]
    fn test_orphaned_sidecar_is_reported() {
        let temp = TempDir::new().unwrap();
        fs::write(sidecar_path(temp.path(), "backup_gone"), b"{}").unwrap();

        let catalog = CatalogStore::new(temp.path()).list().unwrap();
        assert!(catalog.entries.is_empty());
        assert_eq!(catalog.skipped.len(), 1);
        assert_eq!(catalog.skipped[0].reason, SkipReason::OrphanedMetadata);
    }

    #[test]
    fn test_staging_directories_are_invisible() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("temp_restore_1700000000")).unwrap();

        let catalog = CatalogStore::new(temp.path()).list().unwrap();
        assert!(catalog.entries.is_empty());
        assert!(catalog.skipped.is_empty());
    }

    #[test]
    fn test_find_by_id() {
        let temp = TempDir::new().unwrap();
        write_compressed_fixture(temp.path(), "backup_x", 100);

        let store = CatalogStore::new(temp.path());
        assert!(store.find("backup_x").unwrap().is_some());
        assert!(store.find("backup_missing").unwrap().is_none());
    }
}
