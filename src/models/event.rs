//! Notification event and feed-check outcome types.

use crate::store::ArchiveHandle;

/// A notification event produced by one monitor invocation and consumed by
/// the fan-out layer.
#[derive(Debug, Clone)]
pub struct UpdateEvent {
    /// The watched sitemap URL this event originated from
    pub feed_url: String,

    /// Newly appeared URLs, in document order. Empty means "no update".
    pub new_urls: Vec<String>,

    /// Dated archive copy of today's snapshot, when one was committed
    pub archive: Option<ArchiveHandle>,

    /// Explicit destination override for channels that support one
    pub target: Option<String>,
}

impl UpdateEvent {
    pub fn new(feed_url: impl Into<String>, new_urls: Vec<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
            new_urls,
            archive: None,
            target: None,
        }
    }

    pub fn with_archive(mut self, archive: ArchiveHandle) -> Self {
        self.archive = Some(archive);
        self
    }
}

/// Outcome of checking one feed.
#[derive(Debug, Clone)]
pub enum CheckStatus {
    /// A fresh snapshot was committed; `new_urls` is the diff against the
    /// previously committed state.
    Committed {
        new_urls: Vec<String>,
        archive: ArchiveHandle,
    },

    /// The domain already rotated snapshots today. Informational, not an
    /// error; `new_urls` is today's batch re-derived from the stored
    /// previous/current snapshots.
    AlreadyUpdated { new_urls: Vec<String> },
}

/// Report returned to the caller of a feed check.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub feed_url: String,
    pub domain: String,
    pub status: CheckStatus,
}

impl CheckReport {
    /// Human-readable outcome line for logs and command replies.
    pub fn message(&self) -> String {
        match &self.status {
            CheckStatus::Committed { new_urls, .. } if new_urls.is_empty() => {
                format!("{}: no new URLs today", self.domain)
            }
            CheckStatus::Committed { new_urls, .. } => {
                format!("{}: {} new URLs found", self.domain, new_urls.len())
            }
            CheckStatus::AlreadyUpdated { .. } => {
                format!("{}: already updated today", self.domain)
            }
        }
    }

    /// Today's new-URL batch regardless of outcome variant.
    pub fn new_urls(&self) -> &[String] {
        match &self.status {
            CheckStatus::Committed { new_urls, .. } => new_urls,
            CheckStatus::AlreadyUpdated { new_urls } => new_urls,
        }
    }
}
