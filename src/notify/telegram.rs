//! Telegram Bot API notification channel.
//!
//! Mirrors the message flow of the chat bot this channel serves: a header
//! (with the dated sitemap attached when available), one message per new
//! URL with pacing between sends, then a completion footer.

use std::time::Duration;

use async_trait::async_trait;
use log::info;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{TelegramConfig, UpdateEvent};
use crate::notify::Notifier;
use crate::utils::url::domain_of;

const API_BASE: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
    pacing: Duration,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, pacing_ms: u64) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(AppError::config("telegram token is empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_base: API_BASE.to_string(),
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
            pacing: Duration::from_millis(pacing_ms),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    fn destination<'a>(&'a self, target: Option<&'a str>) -> Result<&'a str> {
        let chat_id = target.unwrap_or(&self.chat_id);
        if chat_id.is_empty() {
            return Err(AppError::config(
                "no telegram destination configured (channels.telegram.chat_id)",
            ));
        }
        Ok(chat_id)
    }

    async fn check_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            let url = response.url().path().to_string();
            return Err(AppError::Status { url, status });
        }
        Ok(())
    }

    async fn send_text(&self, chat_id: &str, text: &str, link_preview: bool) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "disable_web_page_preview": !link_preview,
            }))
            .send()
            .await?;
        self.check_response(response).await
    }

    async fn send_document(&self, chat_id: &str, path: &std::path::Path, caption: &str) -> Result<()> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sitemap.xml".to_string());

        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part(
                "document",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        self.check_response(response).await
    }
}

/// Header line for an update notification.
fn update_header(domain: &str, feed_url: &str, new_count: usize) -> String {
    if new_count > 0 {
        format!(
            "{domain}\n------------------------------------\n\
             {new_count} new URLs found\nSource: {feed_url}"
        )
    } else {
        format!(
            "{domain}\n------------------------------------\n\
             No sitemap update today\nSource: {feed_url}"
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify_update(&self, event: &UpdateEvent) -> Result<()> {
        let chat_id = self.destination(event.target.as_deref())?;
        let domain = domain_of(&event.feed_url).unwrap_or_else(|| event.feed_url.clone());
        let header = update_header(&domain, &event.feed_url, event.new_urls.len());

        match &event.archive {
            Some(archive) if archive.path.exists() => {
                self.send_document(chat_id, &archive.path, &header).await?;
                info!("Sent sitemap archive {} for {domain}", archive.path.display());
            }
            _ => self.send_text(chat_id, &header, false).await?,
        }

        if !event.new_urls.is_empty() {
            for url in &event.new_urls {
                tokio::time::sleep(self.pacing).await;
                self.send_text(chat_id, url, true).await?;
            }

            tokio::time::sleep(self.pacing).await;
            self.send_text(chat_id, &format!("{domain} update push complete"), false)
                .await?;
            info!("Pushed {} new URLs for {domain}", event.new_urls.len());
        }

        Ok(())
    }

    async fn notify_message(&self, text: &str, target: Option<&str>) -> Result<()> {
        let chat_id = self.destination(target)?;
        self.send_text(chat_id, text, false).await
    }
}
