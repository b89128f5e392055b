// src/store/mod.rs

//! Per-domain snapshot persistence.
//!
//! Each watched domain keeps the raw text of its two most recent sitemap
//! observations (current and previous), a last-update date enforcing the
//! at-most-once-per-day rotation policy, and a dated archive copy that is
//! retained until downstream delivery succeeds.
//!
//! ## Directory layout
//!
//! ```text
//! {root}/
//! └── example.com/
//!     ├── meta.json               # pointer: last-update date + snapshot files
//!     ├── snap-2026-08-29.xml     # snapshot content, referenced by meta.json
//!     ├── snap-2026-08-28.xml
//!     └── archive-2026-08-29.xml  # deliverable copy, removed after delivery
//! ```

pub mod local;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use local::LocalSnapshotStore;

/// Handle to a dated archive copy produced by a snapshot commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle {
    /// Domain the archive belongs to
    pub domain: String,
    /// Calendar day (UTC) of the commit
    pub date: NaiveDate,
    /// Location of the archive file on disk
    pub path: std::path::PathBuf,
}

/// Per-domain metadata pointer. Replacing this file atomically is the commit
/// point of a snapshot rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainMeta {
    /// Date of the last successful rotation
    pub last_update: NaiveDate,
    /// File name of the current snapshot
    pub current: String,
    /// File name of the previous snapshot, if any
    pub previous: Option<String>,
}

/// Trait for snapshot storage backends, keyed by domain.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the current snapshot content, if the domain has one.
    async fn load_current(&self, domain: &str) -> Result<Option<String>>;

    /// Load the snapshot that was current before the last rotation.
    async fn load_previous(&self, domain: &str) -> Result<Option<String>>;

    /// Whether a successful rotation already happened today (UTC).
    async fn has_updated_today(&self, domain: &str) -> Result<bool>;

    /// Rotate snapshots: current becomes previous, `content` becomes
    /// current, and a dated archive copy is written.
    ///
    /// Fails with [`crate::error::AppError::AlreadyUpdated`] when the domain
    /// was already rotated today. The rotation is atomic with respect to a
    /// crash; a partial rotation is never observable.
    async fn commit(&self, domain: &str, content: &str) -> Result<ArchiveHandle>;

    /// Delete a dated archive copy after successful downstream delivery.
    async fn discard_archive(&self, handle: &ArchiveHandle) -> Result<()>;
}
