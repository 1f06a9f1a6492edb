//! Restore state machine.
//!
//! lookup → confirm → stage → safety snapshot → swap → cleanup. The
//! confirmation decision is a caller-supplied predicate, so the same routine
//! serves interactive and automated callers. The safety snapshot must
//! complete before the destructive swap begins; if anything after the swap
//! still fails, that snapshot is the recovery path. Staging cleanup runs on
//! every exit path and never masks the failure that got us there.

use crate::archive::{ArchiveKind, CONFIG_PREFIX, CONTENT_PREFIX, STAGING_PREFIX};
use crate::backup::BackupService;
use crate::catalog::{CatalogEntry, CatalogStore};
use crate::config::Config;
use crate::utils::errors::{Result, VaultError};
use chrono::Local;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

pub struct RestoreService<'a> {
    config: &'a Config,
}

impl<'a> RestoreService<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Restore the archive with the given id. Returns `Ok(false)` when the
    /// confirmation predicate declines; nothing has been touched at that
    /// point.
    pub fn restore<F>(&self, id: &str, confirm: F) -> Result<bool>
    where
        F: FnOnce(&CatalogEntry) -> bool,
    {
        let store = CatalogStore::new(&self.config.backup_dir);
        let entry = store
            .find(id)?
            .ok_or_else(|| VaultError::NotFound(id.to_string()))?;

        if !confirm(&entry) {
            info!(name = %id, "Restore declined by caller");
            return Ok(false);
        }

        let start = Instant::now();
        info!(name = %id, kind = %entry.kind, "Starting restore");

        let staging = self
            .config
            .backup_dir
            .join(format!("{STAGING_PREFIX}{}", Local::now().timestamp()));

        let outcome = self.run_staged(&entry, &staging);

        if staging.exists() {
            if let Err(e) = fs::remove_dir_all(&staging) {
                warn!(path = %staging.display(), error = %e, "Failed to remove staging directory");
            }
        }

        outcome?;
        info!(
            name = %id,
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Restore complete"
        );
        Ok(true)
    }

    /// Steps 3–5: stage, snapshot, swap. The caller removes `staging`
    /// whether this succeeds or not.
    fn run_staged(&self, entry: &CatalogEntry, staging: &Path) -> Result<()> {
        fs::create_dir_all(staging)?;

        match entry.kind {
            ArchiveKind::Compressed => {
                let file = fs::File::open(&entry.path)?;
                let mut archive = ZipArchive::new(file)?;
                archive.extract(staging)?;
            }
            ArchiveKind::Directory => {
                copy_tree(&entry.path, staging)?;
            }
        }

        // Nothing destructive may happen until the current content is safe
        if let Some(snapshot) = BackupService::new(self.config).snapshot_before_restore()? {
            info!(name = %snapshot.record.name, "Current content snapshotted");
        }

        let staged_content = staging.join(CONTENT_PREFIX);
        if staged_content.is_dir() {
            if self.config.content_dir.exists() {
                fs::remove_dir_all(&self.config.content_dir)?;
            }
            if fs::rename(&staged_content, &self.config.content_dir).is_err() {
                // staging and content on different filesystems; copy instead
                copy_tree(&staged_content, &self.config.content_dir)?;
            }
        }

        let staged_config = staging.join(CONFIG_PREFIX);
        if staged_config.is_dir() {
            for config_file in &self.config.config_files {
                let Some(file_name) = config_file.file_name() else {
                    continue;
                };
                let staged = staged_config.join(file_name);
                if staged.is_file() {
                    if let Some(parent) = config_file.parent() {
                        if !parent.as_os_str().is_empty() {
                            fs::create_dir_all(parent)?;
                        }
                    }
                    fs::copy(&staged, config_file)?;
                }
            }
        }

        Ok(())
    }
}

fn copy_tree(src: &Path, dest: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
