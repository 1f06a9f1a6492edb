//! Snapshot creation and catalog trimming.
//!
//! Owns the backup root: `create` walks the configured sources into a new
//! archive and then trims the catalog to the retention bound. Trimming
//! failures are logged but never fail the create call — the fresh backup
//! stands on its own.

use crate::archive::writer::{ArchiveWriter, Source, WrittenArchive};
use crate::archive::{
    next_archive_name, ArchiveKind, ArchiveRecord, BACKUP_PREFIX, CONFIG_PREFIX, CONTENT_PREFIX,
    PRE_RESTORE_PREFIX,
};
use crate::catalog::{tree_size, CatalogStore};
use crate::config::Config;
use crate::filter::PathFilter;
use crate::retention::{delete_all, RetentionPolicy};
use crate::utils::errors::Result;
use crate::utils::format_size;
use std::fs;
use tracing::{error, info};

pub struct BackupService<'a> {
    config: &'a Config,
}

impl<'a> BackupService<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Snapshot the configured sources into a new archive, then trim.
    pub fn create(&self, description: &str) -> Result<ArchiveRecord> {
        fs::create_dir_all(&self.config.backup_dir)?;

        let (name, created) = next_archive_name(&self.config.backup_dir, BACKUP_PREFIX);
        info!(name = %name, "Creating backup");

        let kind = if self.config.compress {
            ArchiveKind::Compressed
        } else {
            ArchiveKind::Directory
        };
        let filter = PathFilter::new(self.config.exclusion_tokens());
        let written = ArchiveWriter::new(&filter).write(
            &self.config.backup_dir,
            kind,
            &name,
            description,
            created,
            &self.sources(),
        )?;
        self.report(&written, kind);

        if let Err(e) = self.cleanup() {
            error!(error = %e, "Cleanup after backup failed");
        }

        Ok(written.record)
    }

    /// Trim the catalog to the retention bound. Idempotent; a no-op when
    /// the catalog already fits. Returns the number of archives removed.
    pub fn cleanup(&self) -> Result<usize> {
        let catalog = CatalogStore::new(&self.config.backup_dir).list()?;
        let policy = RetentionPolicy::new(self.config.max_backups);
        let selected = policy.select_for_removal(&catalog.entries);
        if selected.is_empty() {
            return Ok(0);
        }

        info!(count = selected.len(), "Trimming old backups");
        Ok(delete_all(selected))
    }

    /// Snapshot the current content tree as a directory-form archive named
    /// for the restore that is about to overwrite it. Follows the normal
    /// layout conventions, so it shows up in listings like any other
    /// archive. Returns `None` when there is no content to protect.
    pub fn snapshot_before_restore(&self) -> Result<Option<WrittenArchive>> {
        if !self.config.content_dir.is_dir() {
            return Ok(None);
        }

        let (name, created) = next_archive_name(&self.config.backup_dir, PRE_RESTORE_PREFIX);
        let filter = PathFilter::new(self.config.exclusion_tokens());
        let written = ArchiveWriter::new(&filter).write(
            &self.config.backup_dir,
            ArchiveKind::Directory,
            &name,
            "Automatic snapshot taken before restore",
            created,
            &[Source::Tree {
                root: self.config.content_dir.clone(),
                prefix: CONTENT_PREFIX.to_string(),
            }],
        )?;
        info!(name = %name, "Created pre-restore snapshot");
        Ok(Some(written))
    }

    fn sources(&self) -> Vec<Source> {
        let mut sources = vec![Source::Tree {
            root: self.config.content_dir.clone(),
            prefix: CONTENT_PREFIX.to_string(),
        }];
        for path in &self.config.config_files {
            let Some(file_name) = path.file_name() else {
                continue;
            };
            sources.push(Source::File {
                path: path.clone(),
                target: format!("{CONFIG_PREFIX}/{}", file_name.to_string_lossy()),
            });
        }
        sources
    }

    fn report(&self, written: &WrittenArchive, kind: ArchiveKind) {
        let size_on_disk = match kind {
            ArchiveKind::Compressed => fs::metadata(&written.path).map(|m| m.len()).unwrap_or(0),
            ArchiveKind::Directory => tree_size(&written.path),
        };
        info!(
            name = %written.record.name,
            description = %written.record.description,
            files = written.record.file_count,
            content_size = %format_size(written.record.content_size),
            backup_size = %format_size(size_on_disk),
            elapsed_secs = written.elapsed.as_secs_f64(),
            "Backup complete"
        );
    }
}
