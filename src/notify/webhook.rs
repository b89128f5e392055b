//! Generic JSON webhook notification channel.
//!
//! Posts `{"content": "..."}` payloads, which Discord-style webhook
//! endpoints accept directly. The update event is rendered as a single
//! text block; archives are referenced by name, not attached.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{UpdateEvent, WebhookConfig};
use crate::notify::Notifier;
use crate::utils::url::domain_of;

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    pacing: Duration,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig, pacing_ms: u64) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(AppError::config("webhook url is empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
            pacing: Duration::from_millis(pacing_ms),
        })
    }

    async fn post(&self, target: Option<&str>, content: &str) -> Result<()> {
        let url = target.unwrap_or(&self.url);
        let response = self
            .client
            .post(url)
            .json(&json!({ "content": content }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(())
    }
}

/// Render an update event as one webhook message body.
fn render_update(event: &UpdateEvent) -> String {
    let domain = domain_of(&event.feed_url).unwrap_or_else(|| event.feed_url.clone());

    let mut body = if event.new_urls.is_empty() {
        format!("{domain}: no sitemap update today\nSource: {}", event.feed_url)
    } else {
        let mut body = format!(
            "{domain}: {} new URLs\nSource: {}\n",
            event.new_urls.len(),
            event.feed_url
        );
        for url in &event.new_urls {
            body.push_str(&format!("- {url}\n"));
        }
        body
    };

    if let Some(archive) = &event.archive {
        body.push_str(&format!("\nArchived snapshot: {}", archive.date));
    }
    body
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_update(&self, event: &UpdateEvent) -> Result<()> {
        // One paced post per event; the batch travels in a single body to
        // keep webhook rate limits out of the picture.
        tokio::time::sleep(self.pacing).await;
        self.post(event.target.as_deref(), &render_update(event)).await
    }

    async fn notify_message(&self, text: &str, target: Option<&str>) -> Result<()> {
        self.post(target, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    use crate::store::ArchiveHandle;

    #[test]
    fn test_render_lists_new_urls() {
        let event = UpdateEvent::new(
            "https://a.com/sitemap.xml",
            vec!["https://a.com/x".to_string(), "https://a.com/y".to_string()],
        );
        let body = render_update(&event);
        assert!(body.contains("2 new URLs"));
        assert!(body.contains("- https://a.com/x"));
        assert!(body.contains("- https://a.com/y"));
    }

    #[test]
    fn test_render_empty_batch() {
        let event = UpdateEvent::new("https://a.com/sitemap.xml", vec![]);
        assert!(render_update(&event).contains("no sitemap update today"));
    }

    #[test]
    fn test_render_mentions_archive_date() {
        let date: NaiveDate = "2026-08-29".parse().unwrap();
        let event = UpdateEvent::new("https://a.com/sitemap.xml", vec![]).with_archive(
            ArchiveHandle {
                domain: "a.com".to_string(),
                date,
                path: "archive-2026-08-29.xml".into(),
            },
        );
        assert!(render_update(&event).contains("2026-08-29"));
    }

    #[test]
    fn test_new_rejects_empty_url() {
        let config = WebhookConfig { url: "".into() };
        assert!(WebhookNotifier::new(&config, 0).is_err());
    }
}
