//! Local filesystem snapshot store.
//!
//! All content writes go through write-then-rename; the rotation itself
//! commits by atomically replacing `meta.json`. A crash between the content
//! writes and the meta rename leaves the old state fully intact plus at most
//! an orphaned snapshot file, which the next successful commit reuses or
//! cleans up.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::store::{ArchiveHandle, DomainMeta, SnapshotStore};

/// Snapshot store rooted at a local directory, one subdirectory per domain.
#[derive(Debug, Clone)]
pub struct LocalSnapshotStore {
    root_dir: PathBuf,
}

impl LocalSnapshotStore {
    /// Create a store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn domain_dir(&self, domain: &str) -> PathBuf {
        self.root_dir.join(domain)
    }

    fn meta_path(&self, domain: &str) -> PathBuf {
        self.domain_dir(domain).join("meta.json")
    }

    fn snapshot_name(date: NaiveDate) -> String {
        format!("snap-{date}.xml")
    }

    fn archive_name(date: NaiveDate) -> String {
        format!("archive-{date}.xml")
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_atomic(&self, path: &PathBuf, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read a file, returning None if it doesn't exist.
    async fn read_optional(&self, path: &PathBuf) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_meta(&self, domain: &str) -> Result<Option<DomainMeta>> {
        match self.read_optional(&self.meta_path(domain)).await? {
            Some(content) => Ok(Some(serde_json::from_str(&content)?)),
            None => Ok(None),
        }
    }

    async fn load_named(&self, domain: &str, name: &str) -> Result<Option<String>> {
        self.read_optional(&self.domain_dir(domain).join(name)).await
    }

    /// Rotation body with an explicit commit date, so the same-day policy is
    /// testable without a clock.
    async fn commit_on(
        &self,
        domain: &str,
        content: &str,
        today: NaiveDate,
    ) -> Result<ArchiveHandle> {
        let meta = self.read_meta(domain).await?;

        if let Some(meta) = &meta {
            if meta.last_update == today {
                return Err(AppError::AlreadyUpdated {
                    domain: domain.to_string(),
                });
            }
        }

        let dir = self.domain_dir(domain);
        let snapshot_name = Self::snapshot_name(today);
        let archive_path = dir.join(Self::archive_name(today));

        self.write_atomic(&dir.join(&snapshot_name), content.as_bytes())
            .await?;
        self.write_atomic(&archive_path, content.as_bytes()).await?;

        let new_meta = DomainMeta {
            last_update: today,
            current: snapshot_name,
            previous: meta.as_ref().map(|m| m.current.clone()),
        };

        // Commit point: everything before this rename is invisible.
        let meta_bytes = serde_json::to_vec_pretty(&new_meta)?;
        self.write_atomic(&self.meta_path(domain), &meta_bytes)
            .await?;

        // The snapshot that just fell out of the previous slot is no longer
        // reachable; best-effort cleanup.
        if let Some(stale) = meta.and_then(|m| m.previous) {
            if stale != new_meta.current {
                let _ = tokio::fs::remove_file(dir.join(stale)).await;
            }
        }

        Ok(ArchiveHandle {
            domain: domain.to_string(),
            date: today,
            path: archive_path,
        })
    }
}

#[async_trait]
impl SnapshotStore for LocalSnapshotStore {
    async fn load_current(&self, domain: &str) -> Result<Option<String>> {
        match self.read_meta(domain).await? {
            Some(meta) => self.load_named(domain, &meta.current).await,
            None => Ok(None),
        }
    }

    async fn load_previous(&self, domain: &str) -> Result<Option<String>> {
        match self.read_meta(domain).await? {
            Some(DomainMeta {
                previous: Some(name),
                ..
            }) => self.load_named(domain, &name).await,
            _ => Ok(None),
        }
    }

    async fn has_updated_today(&self, domain: &str) -> Result<bool> {
        let today = Utc::now().date_naive();
        Ok(self
            .read_meta(domain)
            .await?
            .is_some_and(|meta| meta.last_update == today))
    }

    async fn commit(&self, domain: &str, content: &str) -> Result<ArchiveHandle> {
        self.commit_on(domain, content, Utc::now().date_naive())
            .await
    }

    async fn discard_archive(&self, handle: &ArchiveHandle) -> Result<()> {
        match tokio::fs::remove_file(&handle.path).await {
            Ok(()) => Ok(()),
            // Already gone; deletion is idempotent.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
