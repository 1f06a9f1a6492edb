//! Bounded-history retention.
//!
//! The catalog is kept at or below a configured maximum by deleting the
//! oldest entries first. Selection is pure (a slice of the newest-first
//! listing); deletion removes both the payload and its metadata record, and
//! a failure on one entry never stops the others.

use crate::archive::{sidecar_path, ArchiveKind};
use crate::catalog::CatalogEntry;
use crate::utils::errors::Result;
use std::fs;
use tracing::{error, info};

#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    max_archives: usize,
}

impl RetentionPolicy {
    pub fn new(max_archives: usize) -> Self {
        Self { max_archives }
    }

    /// Given the catalog sorted newest first, the trailing entries beyond
    /// the bound — empty when the catalog already fits.
    pub fn select_for_removal<'a>(&self, entries: &'a [CatalogEntry]) -> &'a [CatalogEntry] {
        if entries.len() <= self.max_archives {
            &[]
        } else {
            &entries[self.max_archives..]
        }
    }
}

/// Delete one archive: payload plus metadata record.
pub fn delete_entry(entry: &CatalogEntry) -> Result<()> {
    match entry.kind {
        ArchiveKind::Compressed => {
            fs::remove_file(&entry.path)?;
            if let (Some(dir), Some(stem)) = (entry.path.parent(), entry.path.file_stem()) {
                let sidecar = sidecar_path(dir, &stem.to_string_lossy());
                if sidecar.exists() {
                    fs::remove_file(sidecar)?;
                }
            }
        }
        ArchiveKind::Directory => {
            fs::remove_dir_all(&entry.path)?;
        }
    }
    Ok(())
}

/// Delete every selected entry, isolating per-entry failures. Returns how
/// many were actually removed.
pub fn delete_all(selected: &[CatalogEntry]) -> usize {
    let mut deleted = 0;
    for entry in selected {
        match delete_entry(entry) {
            Ok(()) => {
                info!(name = %entry.record.name, "Deleted old backup");
                deleted += 1;
            }
            Err(e) => {
                error!(name = %entry.record.name, error = %e, "Failed to delete old backup");
            }
        }
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveRecord;
    use chrono::Local;
    use std::path::PathBuf;

    fn entry(name: &str, timestamp: i64) -> CatalogEntry {
        let mut record = ArchiveRecord::new(name, Local::now(), "fixture");
        record.timestamp = timestamp;
        CatalogEntry {
            record,
            kind: ArchiveKind::Compressed,
            path: PathBuf::from(format!("/backups/{name}.zip")),
            size_on_disk: 0,
        }
    }

    #[test]
    fn test_within_bound_selects_nothing() {
        let entries = vec![entry("backup_b", 200), entry("backup_a", 100)];
        let policy = RetentionPolicy::new(2);
        assert!(policy.select_for_removal(&entries).is_empty());
    }

    #[test]
    fn test_selects_oldest_excess() {
        // newest first, as the catalog delivers them
        let entries = vec![
            entry("backup_d", 400),
            entry("backup_c", 300),
            entry("backup_b", 200),
            entry("backup_a", 100),
        ];
        let policy = RetentionPolicy::new(2);
        let selected = policy.select_for_removal(&entries);
        let names: Vec<&str> = selected.iter().map(|e| e.record.name.as_str()).collect();
        assert_eq!(names, vec!["backup_b", "backup_a"]);
    }

    #[test]
    fn test_zero_bound_selects_everything() {
        let entries = vec![entry("backup_b", 200), entry("backup_a", 100)];
        let policy = RetentionPolicy::new(0);
        assert_eq!(policy.select_for_removal(&entries).len(), 2);
    }

    #[test]
    fn test_equal_instants_keep_listing_order() {
        // the catalog breaks timestamp ties by name, newest-looking first;
        // the policy must trim from the tail without reordering
        let entries = vec![
            entry("backup_late", 100),
            entry("backup_early", 100),
        ];
        let policy = RetentionPolicy::new(1);
        let selected = policy.select_for_removal(&entries);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].record.name, "backup_early");
    }

    #[test]
    fn test_delete_all_survives_missing_payload() {
        // both entries point at nonexistent paths; deletion fails for each
        // but the loop still visits them all
        let entries = vec![entry("backup_b", 200), entry("backup_a", 100)];
        assert_eq!(delete_all(&entries), 0);
    }
}
