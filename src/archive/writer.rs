//! Snapshot payload writer.
//!
//! Walks an ordered list of sources (tree roots and single files) and
//! materializes one archive in either representation. Missing sources are
//! optional overlays and are skipped silently; any other failure aborts the
//! write, removing the partial payload so no metadata can outlive it.

use crate::archive::{
    payload_path, sidecar_path, ArchiveKind, ArchiveRecord, DIR_METADATA_FILE,
};
use crate::filter::PathFilter;
use crate::utils::errors::Result;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

/// One unit of input to a snapshot, archived in order.
#[derive(Debug, Clone)]
pub enum Source {
    /// A tree walked recursively; included files land under `prefix/`
    Tree { root: PathBuf, prefix: String },

    /// A single file stored at `target` inside the archive
    File { path: PathBuf, target: String },
}

/// A successfully written snapshot. `elapsed` is reporting-only and is not
/// part of the persisted metadata.
#[derive(Debug)]
pub struct WrittenArchive {
    pub record: ArchiveRecord,
    pub path: PathBuf,
    pub elapsed: Duration,
}

pub struct ArchiveWriter<'a> {
    filter: &'a PathFilter,
}

impl<'a> ArchiveWriter<'a> {
    pub fn new(filter: &'a PathFilter) -> Self {
        Self { filter }
    }

    /// Write one snapshot into `backup_dir`. The payload is written first,
    /// the metadata record second, so a mid-write failure leaves no record.
    pub fn write(
        &self,
        backup_dir: &Path,
        kind: ArchiveKind,
        name: &str,
        description: &str,
        created: DateTime<Local>,
        sources: &[Source],
    ) -> Result<WrittenArchive> {
        let start = Instant::now();
        let mut record = ArchiveRecord::new(name, created, description);

        let path = match kind {
            ArchiveKind::Compressed => payload_path(backup_dir, name),
            ArchiveKind::Directory => backup_dir.join(name),
        };

        let written = match kind {
            ArchiveKind::Compressed => self.write_compressed(&path, sources, &mut record),
            ArchiveKind::Directory => self.write_directory(&path, sources, &mut record),
        };
        if let Err(e) = written {
            match kind {
                ArchiveKind::Compressed => {
                    let _ = fs::remove_file(&path);
                }
                ArchiveKind::Directory => {
                    let _ = fs::remove_dir_all(&path);
                }
            }
            return Err(e);
        }

        let metadata_path = match kind {
            ArchiveKind::Compressed => sidecar_path(backup_dir, name),
            ArchiveKind::Directory => path.join(DIR_METADATA_FILE),
        };
        fs::write(&metadata_path, serde_json::to_string_pretty(&record)?)?;

        Ok(WrittenArchive {
            record,
            path,
            elapsed: start.elapsed(),
        })
    }

    fn write_compressed(
        &self,
        path: &Path,
        sources: &[Source],
        record: &mut ArchiveRecord,
    ) -> Result<()> {
        let file = fs::File::create(path)?;
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for source in sources {
            match source {
                Source::Tree { root, prefix } => {
                    if !root.is_dir() {
                        debug!(root = %root.display(), "Source tree missing, skipping");
                        continue;
                    }
                    for entry in self.walk(root) {
                        let entry = entry.map_err(std::io::Error::from)?;
                        if !entry.file_type().is_file() {
                            continue;
                        }
                        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
                        zip.start_file(
                            format!("{prefix}/{}", rel.to_string_lossy()),
                            options.clone(),
                        )?;
                        let mut src = fs::File::open(entry.path())?;
                        let size = std::io::copy(&mut src, &mut zip)?;
                        record.file_count += 1;
                        record.content_size += size;
                    }
                }
                Source::File { path: src_path, target } => {
                    if !src_path.is_file() {
                        debug!(path = %src_path.display(), "Source file missing, skipping");
                        continue;
                    }
                    if self.filter.excluded(src_path) {
                        continue;
                    }
                    zip.start_file(target.clone(), options.clone())?;
                    let mut src = fs::File::open(src_path)?;
                    let size = std::io::copy(&mut src, &mut zip)?;
                    record.file_count += 1;
                    record.content_size += size;
                }
            }
        }

        zip.finish()?;
        Ok(())
    }

    fn write_directory(
        &self,
        dest: &Path,
        sources: &[Source],
        record: &mut ArchiveRecord,
    ) -> Result<()> {
        fs::create_dir_all(dest)?;

        for source in sources {
            match source {
                Source::Tree { root, prefix } => {
                    if !root.is_dir() {
                        debug!(root = %root.display(), "Source tree missing, skipping");
                        continue;
                    }
                    for entry in self.walk(root) {
                        let entry = entry.map_err(std::io::Error::from)?;
                        if !entry.file_type().is_file() {
                            continue;
                        }
                        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
                        let target = dest.join(prefix).join(rel);
                        if let Some(parent) = target.parent() {
                            fs::create_dir_all(parent)?;
                        }
                        let size = fs::copy(entry.path(), &target)?;
                        record.file_count += 1;
                        record.content_size += size;
                    }
                }
                Source::File { path: src_path, target } => {
                    if !src_path.is_file() {
                        debug!(path = %src_path.display(), "Source file missing, skipping");
                        continue;
                    }
                    if self.filter.excluded(src_path) {
                        continue;
                    }
                    let target = dest.join(target);
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    let size = fs::copy(src_path, &target)?;
                    record.file_count += 1;
                    record.content_size += size;
                }
            }
        }

        Ok(())
    }

    fn walk(&self, root: &Path) -> impl Iterator<Item = walkdir::Result<walkdir::DirEntry>> {
        let filter = self.filter.clone();
        WalkDir::new(root)
            .into_iter()
            .filter_entry(move |e| !filter.excluded(e.path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{CONFIG_PREFIX, CONTENT_PREFIX};
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn seed_site(root: &Path) {
        let content = root.join("content");
        fs::create_dir_all(content.join("posts")).unwrap();
        fs::create_dir_all(content.join(".git")).unwrap();
        fs::write(content.join("index.md"), b"# home").unwrap();
        fs::write(content.join("posts/one.md"), b"chapter one").unwrap();
        fs::write(content.join(".git/HEAD"), b"ref: main").unwrap();
        fs::write(content.join("server.log"), b"noise").unwrap();
        fs::write(root.join("config.yaml"), b"title: site").unwrap();
    }

    fn sources(root: &Path) -> Vec<Source> {
        vec![
            Source::Tree {
                root: root.join("content"),
                prefix: CONTENT_PREFIX.to_string(),
            },
            Source::File {
                path: root.join("config.yaml"),
                target: format!("{CONFIG_PREFIX}/config.yaml"),
            },
            Source::File {
                path: root.join("netlify.toml"),
                target: format!("{CONFIG_PREFIX}/netlify.toml"),
            },
        ]
    }

    fn filter() -> PathFilter {
        PathFilter::new(vec![".git".to_string(), ".log".to_string()])
    }

    #[test]
    fn test_compressed_write_counts_and_layout() {
        let temp = TempDir::new().unwrap();
        seed_site(temp.path());
        let backup_dir = temp.path().join("backups");
        fs::create_dir_all(&backup_dir).unwrap();

        let filter = filter();
        let writer = ArchiveWriter::new(&filter);
        let written = writer
            .write(
                &backup_dir,
                ArchiveKind::Compressed,
                "backup_20260101_120000",
                "test",
                Local::now(),
                &sources(temp.path()),
            )
            .unwrap();

        // index.md + posts/one.md + config.yaml; .git and .log excluded,
        // missing netlify.toml skipped silently
        assert_eq!(written.record.file_count, 3);
        assert_eq!(
            written.record.content_size,
            (b"# home".len() + b"chapter one".len() + b"title: site".len()) as u64
        );
        assert!(written.path.exists());
        assert!(sidecar_path(&backup_dir, "backup_20260101_120000").exists());

        let mut archive = ZipArchive::new(fs::File::open(&written.path).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"content/index.md".to_string()));
        assert!(names.contains(&"content/posts/one.md".to_string()));
        assert!(names.contains(&"config/config.yaml".to_string()));
        assert!(!names.iter().any(|n| n.contains(".git")));

        let mut body = String::new();
        archive
            .by_name("content/posts/one.md")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "chapter one");
    }

    #[test]
    fn test_directory_write_layout() {
        let temp = TempDir::new().unwrap();
        seed_site(temp.path());
        let backup_dir = temp.path().join("backups");
        fs::create_dir_all(&backup_dir).unwrap();

        let filter = filter();
        let writer = ArchiveWriter::new(&filter);
        let written = writer
            .write(
                &backup_dir,
                ArchiveKind::Directory,
                "backup_20260101_120000",
                "test",
                Local::now(),
                &sources(temp.path()),
            )
            .unwrap();

        assert_eq!(written.record.file_count, 3);
        assert!(written.path.join("content/index.md").exists());
        assert!(written.path.join("content/posts/one.md").exists());
        assert!(written.path.join("config/config.yaml").exists());
        assert!(written.path.join(DIR_METADATA_FILE).exists());
        assert!(!written.path.join("content/.git").exists());
    }

    #[test]
    fn test_all_sources_missing_yields_empty_archive() {
        let temp = TempDir::new().unwrap();
        let backup_dir = temp.path().join("backups");
        fs::create_dir_all(&backup_dir).unwrap();

        let filter = PathFilter::new(vec![]);
        let writer = ArchiveWriter::new(&filter);
        let written = writer
            .write(
                &backup_dir,
                ArchiveKind::Compressed,
                "backup_20260101_120000",
                "empty",
                Local::now(),
                &[Source::Tree {
                    root: temp.path().join("nope"),
                    prefix: CONTENT_PREFIX.to_string(),
                }],
            )
            .unwrap();

        assert_eq!(written.record.file_count, 0);
        assert_eq!(written.record.content_size, 0);
        assert!(written.path.exists());
    }
}
