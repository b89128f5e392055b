// src/monitor.rs

//! Feed check orchestration.
//!
//! One invocation walks a single feed through
//! fetch → parse → policy check → diff → commit and reports the outcome.
//! The comparison baseline is always the stored current snapshot, i.e.
//! "what changed since the last commit" — including when re-deriving the
//! batch for a feed that already rotated today.

use std::sync::Arc;

use log::{debug, info};

use crate::diff;
use crate::error::Result;
use crate::fetch::SitemapFetcher;
use crate::models::{CheckReport, CheckStatus};
use crate::sitemap;
use crate::store::SnapshotStore;
use crate::utils::url::domain_of;

/// Orchestrates fetcher, snapshot store, extractor and diff engine into a
/// single "check one feed" operation.
pub struct SitemapMonitor {
    fetcher: Arc<dyn SitemapFetcher>,
    store: Arc<dyn SnapshotStore>,
}

impl SitemapMonitor {
    pub fn new(fetcher: Arc<dyn SitemapFetcher>, store: Arc<dyn SnapshotStore>) -> Self {
        Self { fetcher, store }
    }

    /// Check one feed for newly published URLs.
    ///
    /// Fetch and parse failures surface as errors without mutating any
    /// stored state. When the domain already rotated today the report
    /// carries the already-updated signal with today's batch re-derived
    /// from the stored snapshots (no refetch, no second commit).
    pub async fn check_feed(&self, feed_url: &str) -> Result<CheckReport> {
        let domain = domain_of(feed_url).ok_or_else(|| {
            crate::error::AppError::parse(feed_url, "feed URL has no host component")
        })?;

        debug!("Fetching sitemap for {domain} from {feed_url}");
        let document = self.fetcher.fetch(feed_url).await?;
        let current_urls = sitemap::extract(&document)?;
        debug!("{domain}: {} URLs in fetched sitemap", current_urls.len());

        if self.store.has_updated_today(&domain).await? {
            let new_urls = self.todays_batch(&domain).await?;
            info!("{domain}: already updated today ({} in batch)", new_urls.len());
            return Ok(CheckReport {
                feed_url: feed_url.to_string(),
                domain,
                status: CheckStatus::AlreadyUpdated { new_urls },
            });
        }

        let baseline = match self.store.load_current(&domain).await? {
            Some(content) => sitemap::extract(&content).unwrap_or_default(),
            None => Vec::new(),
        };

        let new_urls = diff::new_urls(&baseline, &current_urls);
        let archive = self.store.commit(&domain, &document).await?;

        info!(
            "{domain}: committed snapshot for {}, {} new URLs",
            archive.date,
            new_urls.len()
        );

        Ok(CheckReport {
            feed_url: feed_url.to_string(),
            domain,
            status: CheckStatus::Committed { new_urls, archive },
        })
    }

    /// Re-derive today's new-URL batch from the stored previous/current
    /// snapshots, using the same baseline rule as a fresh commit.
    pub async fn todays_batch(&self, domain: &str) -> Result<Vec<String>> {
        let current = match self.store.load_current(domain).await? {
            Some(content) => sitemap::extract(&content).unwrap_or_default(),
            None => return Ok(Vec::new()),
        };

        let previous = match self.store.load_previous(domain).await? {
            Some(content) => sitemap::extract(&content).unwrap_or_default(),
            None => Vec::new(),
        };

        Ok(diff::new_urls(&previous, &current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::error::AppError;
    use crate::store::LocalSnapshotStore;

    /// Fetcher serving canned documents from memory.
    struct StubFetcher {
        documents: HashMap<String, String>,
    }

    impl StubFetcher {
        fn serving(url: &str, document: &str) -> Self {
            let mut documents = HashMap::new();
            documents.insert(url.to_string(), document.to_string());
            Self { documents }
        }
    }

    #[async_trait]
    impl SitemapFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.documents.get(url).cloned().ok_or(AppError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
        }
    }

    fn sitemap_doc(urls: &[&str]) -> String {
        let entries: String = urls
            .iter()
            .map(|u| format!("<url><loc>{u}</loc></url>"))
            .collect();
        format!(
            r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#
        )
    }

    fn monitor_with(fetcher: StubFetcher, root: &std::path::Path) -> SitemapMonitor {
        SitemapMonitor::new(
            Arc::new(fetcher),
            Arc::new(LocalSnapshotStore::new(root)),
        )
    }

    const FEED: &str = "https://example.com/sitemap.xml";

    #[tokio::test]
    async fn test_first_observation_reports_all_urls() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sitemap_doc(&[
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/a",
        ]);
        let monitor = monitor_with(StubFetcher::serving(FEED, &doc), dir.path());

        let report = monitor.check_feed(FEED).await.unwrap();

        assert_eq!(report.domain, "example.com");
        assert_eq!(
            report.new_urls(),
            ["https://example.com/a", "https://example.com/b"]
        );
        assert!(matches!(report.status, CheckStatus::Committed { .. }));
    }

    #[tokio::test]
    async fn test_second_check_same_day_is_already_updated() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sitemap_doc(&["https://example.com/a"]);
        let monitor = monitor_with(StubFetcher::serving(FEED, &doc), dir.path());

        let first = monitor.check_feed(FEED).await.unwrap();
        assert!(matches!(first.status, CheckStatus::Committed { .. }));

        let second = monitor.check_feed(FEED).await.unwrap();
        match second.status {
            // Batch is re-derived: previous is absent, so the whole current
            // set is still today's batch.
            CheckStatus::AlreadyUpdated { new_urls } => {
                assert_eq!(new_urls, ["https://example.com/a"]);
            }
            other => panic!("expected AlreadyUpdated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor_with(
            StubFetcher {
                documents: HashMap::new(),
            },
            dir.path(),
        );

        let err = monitor.check_feed(FEED).await.unwrap_err();
        assert!(err.is_transient());

        let store = LocalSnapshotStore::new(dir.path());
        assert!(store.load_current("example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_parse_failure_does_not_commit() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor_with(
            StubFetcher::serving(FEED, "<urlset><url><loc>broken</url></urlset>"),
            dir.path(),
        );

        let err = monitor.check_feed(FEED).await.unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));

        let store = LocalSnapshotStore::new(dir.path());
        assert!(!store.has_updated_today("example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_feed_url_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor_with(
            StubFetcher {
                documents: HashMap::new(),
            },
            dir.path(),
        );

        assert!(monitor.check_feed("not a url").await.is_err());
    }
}
