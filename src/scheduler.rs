// src/scheduler.rs

//! Periodic monitoring loop.
//!
//! One pass walks every registered feed sequentially, so at most one
//! outbound request is in flight per sitemap host and snapshot rotations
//! never race across feeds. Per-feed failures are contained to the feed;
//! a pass where every feed failed triggers a short backoff instead of the
//! full inter-pass sleep, so a persistent fault recovers quickly without a
//! tight failure loop.
//!
//! Ordering invariant: the keyword summary is computed and sent only after
//! all per-feed notifications of the pass have been issued, since it is
//! derived from the same accumulated batches.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::watch;

use crate::error::{AppError, Result};
use crate::models::{CheckStatus, SchedulerConfig, UpdateEvent};
use crate::monitor::SitemapMonitor;
use crate::notify::{BroadcastOutcome, NotifierRegistry};
use crate::registry::FeedRegistry;
use crate::store::{ArchiveHandle, SnapshotStore};
use crate::summary;

/// Broadcast an update event and, when every channel delivered, discard the
/// archive copy. A partial delivery keeps the archive on disk for
/// inspection and later retry.
pub async fn deliver_update(
    notifiers: &NotifierRegistry,
    store: &dyn SnapshotStore,
    event: &UpdateEvent,
    archive: &ArchiveHandle,
) -> BroadcastOutcome {
    let outcome = notifiers.broadcast_update(event).await;

    if outcome.all_delivered() {
        if let Err(e) = store.discard_archive(archive).await {
            warn!("Failed to discard archive for {}: {e}", archive.domain);
        }
    } else if !notifiers.is_empty() {
        warn!(
            "Keeping archive for {}: channels failed: {:?}",
            archive.domain,
            outcome.failed_channels()
        );
    }

    outcome
}

/// Drives periodic feed checks, notification fan-out and the daily keyword
/// summary.
pub struct Scheduler {
    registry: Arc<FeedRegistry>,
    monitor: SitemapMonitor,
    notifiers: Arc<NotifierRegistry>,
    store: Arc<dyn SnapshotStore>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        registry: Arc<FeedRegistry>,
        monitor: SitemapMonitor,
        notifiers: Arc<NotifierRegistry>,
        store: Arc<dyn SnapshotStore>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            monitor,
            notifiers,
            store,
            config,
        }
    }

    /// Run passes until `shutdown` flips to true. Cancellation happens at
    /// pass boundaries and between feeds, never mid-feed.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Scheduler started: interval {}s, backoff {}s",
            self.config.interval_secs, self.config.error_backoff_secs
        );

        loop {
            let sleep_secs = match self.run_pass(&mut shutdown).await {
                Ok(()) => self.config.interval_secs,
                Err(e) => {
                    error!("Pass failed: {e}. Backing off.");
                    self.config.error_backoff_secs
                }
            };

            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(sleep_secs)) => {}
                _ = shutdown.changed() => {}
            }

            if *shutdown.borrow() {
                break;
            }
        }

        info!("Scheduler stopped");
    }

    /// One full pass: check every feed, fan out per-feed notifications,
    /// then aggregate and send the keyword summary.
    pub async fn run_pass(&self, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
        let feeds = self.registry.list();
        info!("Checking {} feeds", feeds.len());

        let mut all_new_urls: Vec<String> = Vec::new();
        let mut failures = 0usize;

        for feed_url in &feeds {
            if *shutdown.borrow() {
                info!("Shutdown requested, stopping pass early");
                return Ok(());
            }

            match self.check_and_notify(feed_url).await {
                Ok(mut new_urls) => all_new_urls.append(&mut new_urls),
                Err(e) => {
                    warn!("Feed {feed_url} failed this pass: {e}");
                    failures += 1;
                }
            }
        }

        if !feeds.is_empty() && failures == feeds.len() {
            return Err(AppError::storage(format!(
                "all {} feeds failed this pass",
                feeds.len()
            )));
        }

        // Let in-flight per-feed notifications drain before the summary.
        if !all_new_urls.is_empty() {
            tokio::time::sleep(Duration::from_secs(self.config.summary_delay_secs)).await;
            self.send_summary(&all_new_urls).await;
        }

        info!("Pass complete: {} new URLs across all feeds", all_new_urls.len());
        Ok(())
    }

    /// Check one feed and, when a snapshot was committed, broadcast the
    /// update event. Returns the feed's new-URL batch for summary
    /// accumulation.
    async fn check_and_notify(&self, feed_url: &str) -> Result<Vec<String>> {
        let report = self.monitor.check_feed(feed_url).await?;

        match report.status {
            CheckStatus::Committed { new_urls, archive } => {
                let event =
                    UpdateEvent::new(feed_url, new_urls.clone()).with_archive(archive.clone());
                deliver_update(&self.notifiers, self.store.as_ref(), &event, &archive).await;
                Ok(new_urls)
            }
            CheckStatus::AlreadyUpdated { .. } => {
                info!("{}", report.message());
                // Already notified when today's rotation happened; nothing
                // new to accumulate.
                Ok(Vec::new())
            }
        }
    }

    /// Aggregate a batch of URLs into the domain-keyword digest and
    /// broadcast it. An empty digest sends nothing.
    pub async fn send_summary(&self, new_urls: &[String]) {
        let keywords = summary::summarize(new_urls);
        let Some(message) = summary::render_summary(&keywords) else {
            info!("No usable keywords in batch, skipping summary");
            return;
        };

        let outcome = self.notifiers.broadcast_message(&message, None).await;
        if outcome.all_delivered() {
            info!("Keyword summary sent for {} domains", keywords.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::fetch::SitemapFetcher;
    use crate::notify::Notifier;
    use crate::store::LocalSnapshotStore;

    struct StubFetcher {
        documents: HashMap<String, String>,
    }

    #[async_trait]
    impl SitemapFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.documents.get(url).cloned().ok_or(AppError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::BAD_GATEWAY,
            })
        }
    }

    #[derive(Default, Clone)]
    struct RecordingNotifier {
        updates: Arc<Mutex<Vec<UpdateEvent>>>,
        messages: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify_update(&self, event: &UpdateEvent) -> Result<()> {
            self.updates.lock().unwrap().push(event.clone());
            Ok(())
        }

        async fn notify_message(&self, text: &str, _target: Option<&str>) -> Result<()> {
            self.messages.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn sitemap_doc(urls: &[&str]) -> String {
        let entries: String = urls
            .iter()
            .map(|u| format!("<url><loc>{u}</loc></url>"))
            .collect();
        format!(r#"<?xml version="1.0"?><urlset>{entries}</urlset>"#)
    }

    struct Setup {
        _dir: tempfile::TempDir,
        scheduler: Scheduler,
        recorder: RecordingNotifier,
    }

    fn setup(documents: HashMap<String, String>, feeds: &[&str]) -> Setup {
        let dir = tempfile::tempdir().unwrap();

        let registry = Arc::new(FeedRegistry::load(dir.path().join("feeds.json")).unwrap());
        for feed in feeds {
            registry.add(feed).unwrap();
        }

        let store: Arc<dyn SnapshotStore> =
            Arc::new(LocalSnapshotStore::new(dir.path().join("sitemaps")));
        let monitor = SitemapMonitor::new(Arc::new(StubFetcher { documents }), Arc::clone(&store));

        let recorder = RecordingNotifier::default();
        let mut notifiers = NotifierRegistry::new();
        notifiers.register("recording", Box::new(recorder.clone()));

        let config = SchedulerConfig {
            interval_secs: 3600,
            error_backoff_secs: 1,
            summary_delay_secs: 0,
            message_pacing_ms: 0,
        };

        let scheduler = Scheduler::new(
            registry,
            monitor,
            Arc::new(notifiers),
            store,
            config,
        );

        Setup {
            _dir: dir,
            scheduler,
            recorder,
        }
    }

    fn no_shutdown() -> watch::Receiver<bool> {
        let (tx, rx) = watch::channel(false);
        // Keep the sender alive for the duration of the test.
        std::mem::forget(tx);
        rx
    }

    #[tokio::test]
    async fn test_pass_notifies_and_summarizes() {
        let mut documents = HashMap::new();
        documents.insert(
            "https://a.com/sitemap.xml".to_string(),
            sitemap_doc(&["https://a.com/foo", "https://a.com/bar"]),
        );
        documents.insert(
            "https://b.com/sitemap.xml".to_string(),
            sitemap_doc(&["https://b.com/foo"]),
        );

        let setup = setup(
            documents,
            &["https://a.com/sitemap.xml", "https://b.com/sitemap.xml"],
        );

        setup.scheduler.run_pass(&mut no_shutdown()).await.unwrap();

        let updates = setup.recorder.updates.lock().unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].new_urls.len(), 2);

        let messages = setup.recorder.messages.lock().unwrap();
        assert_eq!(messages.len(), 1, "exactly one summary after the pass");
        assert!(messages[0].contains("a.com:"));
        assert!(messages[0].contains("b.com:"));
    }

    #[tokio::test]
    async fn test_archive_discarded_after_full_delivery() {
        let mut documents = HashMap::new();
        documents.insert(
            "https://a.com/sitemap.xml".to_string(),
            sitemap_doc(&["https://a.com/foo"]),
        );
        let setup = setup(documents, &["https://a.com/sitemap.xml"]);

        setup.scheduler.run_pass(&mut no_shutdown()).await.unwrap();

        let updates = setup.recorder.updates.lock().unwrap();
        let archive = updates[0].archive.as_ref().unwrap();
        assert!(
            !archive.path.exists(),
            "archive should be discarded after every channel delivered"
        );
    }

    #[tokio::test]
    async fn test_one_failing_feed_does_not_abort_the_pass() {
        let mut documents = HashMap::new();
        documents.insert(
            "https://b.com/sitemap.xml".to_string(),
            sitemap_doc(&["https://b.com/foo"]),
        );

        // a.com is not served and will fail with a transient error.
        let setup = setup(
            documents,
            &["https://a.com/sitemap.xml", "https://b.com/sitemap.xml"],
        );

        setup.scheduler.run_pass(&mut no_shutdown()).await.unwrap();

        let updates = setup.recorder.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].feed_url, "https://b.com/sitemap.xml");
    }

    #[tokio::test]
    async fn test_all_feeds_failing_fails_the_pass() {
        let setup = setup(HashMap::new(), &["https://a.com/sitemap.xml"]);
        assert!(setup.scheduler.run_pass(&mut no_shutdown()).await.is_err());
    }

    #[tokio::test]
    async fn test_second_pass_same_day_sends_nothing_new() {
        let mut documents = HashMap::new();
        documents.insert(
            "https://a.com/sitemap.xml".to_string(),
            sitemap_doc(&["https://a.com/foo"]),
        );
        let setup = setup(documents, &["https://a.com/sitemap.xml"]);

        setup.scheduler.run_pass(&mut no_shutdown()).await.unwrap();
        setup.scheduler.run_pass(&mut no_shutdown()).await.unwrap();

        // Only the first pass committed and notified.
        assert_eq!(setup.recorder.updates.lock().unwrap().len(), 1);
        assert_eq!(setup.recorder.messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_feed_list_is_a_quiet_pass() {
        let setup = setup(HashMap::new(), &[]);
        setup.scheduler.run_pass(&mut no_shutdown()).await.unwrap();
        assert!(setup.recorder.updates.lock().unwrap().is_empty());
        assert!(setup.recorder.messages.lock().unwrap().is_empty());
    }
}
