// src/commands.rs

//! Command surface: list / add / remove / force-summary.
//!
//! These handlers map user commands onto the registry, monitor and
//! aggregator. Each returns the reply text; the caller decides where the
//! reply goes (stdout, a chat channel, both). Transport parsing lives
//! outside this module.

use std::sync::Arc;

use log::info;

use crate::error::AppError;
use crate::models::{CheckStatus, UpdateEvent};
use crate::monitor::SitemapMonitor;
use crate::notify::NotifierRegistry;
use crate::registry::FeedRegistry;
use crate::scheduler::deliver_update;
use crate::store::SnapshotStore;
use crate::summary;
use crate::utils::url::domain_of;

/// Shared handles the command surface operates on, independent of the
/// scheduler loop.
pub struct CommandContext {
    pub registry: Arc<FeedRegistry>,
    pub monitor: SitemapMonitor,
    pub notifiers: Arc<NotifierRegistry>,
    pub store: Arc<dyn SnapshotStore>,
}

impl CommandContext {
    /// Render the current watch list.
    pub fn handle_list(&self) -> String {
        let feeds = self.registry.list();
        if feeds.is_empty() {
            return "No sitemaps are being watched.".to_string();
        }

        let mut reply = format!("Watched sitemaps ({}):\n", feeds.len());
        for feed in feeds {
            reply.push_str(&format!("- {feed}\n"));
        }
        reply
    }

    /// Add a feed and immediately check it, notifying channels of the
    /// result. Adding an already-watched feed degrades to a refresh.
    pub async fn handle_add(&self, url: &str) -> String {
        if !url.to_lowercase().contains("sitemap") {
            return format!("Rejected {url}: a feed URL must contain \"sitemap\"");
        }
        if domain_of(url).is_none() {
            return format!("Rejected {url}: not a valid absolute URL");
        }

        let added = match self.registry.add(url) {
            Ok(added) => added,
            Err(e) => return format!("Failed to add {url}: {e}"),
        };

        let ack = if added {
            format!("Now watching {url}")
        } else {
            format!("{url} is already being watched; refreshing")
        };
        info!("{ack}");

        match self.monitor.check_feed(url).await {
            Ok(report) => match report.status {
                CheckStatus::Committed { new_urls, archive } => {
                    let event =
                        UpdateEvent::new(url, new_urls.clone()).with_archive(archive.clone());
                    deliver_update(&self.notifiers, self.store.as_ref(), &event, &archive).await;
                    format!("{ack}\n{}", report_line(&report.domain, new_urls.len()))
                }
                // Re-serve today's already-computed batch instead of erroring.
                CheckStatus::AlreadyUpdated { new_urls } => {
                    let event = UpdateEvent::new(url, new_urls.clone());
                    self.notifiers.broadcast_update(&event).await;
                    format!(
                        "{ack}\n{} was already updated today ({} URLs in today's batch)",
                        report.domain,
                        new_urls.len()
                    )
                }
            },
            Err(e) => format!("{ack}\nInitial check failed: {e}"),
        }
    }

    /// Remove a feed from the watch list.
    pub fn handle_remove(&self, url: &str) -> String {
        match self.registry.remove(url) {
            Ok(()) => format!("Stopped watching {url}"),
            Err(AppError::NotFound(_)) => format!("{url} is not being watched"),
            Err(e) => format!("Failed to remove {url}: {e}"),
        }
    }

    /// Force a keyword summary from the stored snapshots of every feed,
    /// using the same previous-vs-current baseline as the scheduler.
    pub async fn handle_summary(&self) -> String {
        let feeds = self.registry.list();
        if feeds.is_empty() {
            return "No sitemaps are being watched; nothing to summarize.".to_string();
        }

        let mut all_new_urls = Vec::new();
        for feed_url in &feeds {
            let Some(domain) = domain_of(feed_url) else {
                continue;
            };
            match self.monitor.todays_batch(&domain).await {
                Ok(mut batch) => all_new_urls.append(&mut batch),
                Err(e) => info!("Skipping {domain} in forced summary: {e}"),
            }
        }

        let keywords = summary::summarize(&all_new_urls);
        match summary::render_summary(&keywords) {
            Some(message) => {
                self.notifiers.broadcast_message(&message, None).await;
                format!(
                    "Summary sent: {} URLs across {} domains",
                    all_new_urls.len(),
                    keywords.len()
                )
            }
            None => "No new content in any stored snapshot; no summary sent.".to_string(),
        }
    }
}

fn report_line(domain: &str, new_count: usize) -> String {
    if new_count > 0 {
        format!("{domain}: {new_count} new URLs found")
    } else {
        format!("{domain}: no new URLs today")
    }
}
