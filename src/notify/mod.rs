// src/notify/mod.rs

//! Notification channels and fan-out.
//!
//! Channels implement the [`Notifier`] contract and are registered by name
//! in a [`NotifierRegistry`]. Broadcasting invokes every channel and
//! isolates failures: one unreachable or misconfigured channel never blocks
//! delivery on the others. The registry does not retry; retry, if any, is
//! each channel's own concern.

pub mod telegram;
pub mod webhook;

use std::collections::BTreeMap;

use async_trait::async_trait;
use log::{error, info};

use crate::error::Result;
use crate::models::UpdateEvent;

pub use telegram::TelegramNotifier;
pub use webhook::WebhookNotifier;

/// Contract every delivery channel implements.
///
/// A channel owns its transport, credentials and destination resolution; it
/// only receives an optional destination override from the core.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a sitemap update event (possibly with an empty batch).
    async fn notify_update(&self, event: &UpdateEvent) -> Result<()>;

    /// Deliver a plain text message.
    async fn notify_message(&self, text: &str, target: Option<&str>) -> Result<()>;
}

/// Delivery result for one channel in a broadcast.
#[derive(Debug)]
pub struct Delivery {
    pub channel: String,
    pub result: Result<()>,
}

/// Aggregate view over one broadcast.
#[derive(Debug, Default)]
pub struct BroadcastOutcome {
    pub deliveries: Vec<Delivery>,
}

impl BroadcastOutcome {
    /// True when at least one channel exists and none failed.
    pub fn all_delivered(&self) -> bool {
        !self.deliveries.is_empty() && self.deliveries.iter().all(|d| d.result.is_ok())
    }

    pub fn failed_channels(&self) -> Vec<&str> {
        self.deliveries
            .iter()
            .filter(|d| d.result.is_err())
            .map(|d| d.channel.as_str())
            .collect()
    }
}

/// Registry mapping channel name → channel implementation.
#[derive(Default)]
pub struct NotifierRegistry {
    channels: BTreeMap<String, Box<dyn Notifier>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel under a name, replacing any previous channel with
    /// that name.
    pub fn register(&mut self, name: impl Into<String>, notifier: Box<dyn Notifier>) {
        let name = name.into();
        info!("Registered notification channel: {name}");
        self.channels.insert(name, notifier);
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.keys().map(|n| n.as_str()).collect()
    }

    /// Broadcast an update event to every channel.
    pub async fn broadcast_update(&self, event: &UpdateEvent) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        for (name, channel) in &self.channels {
            let result = channel.notify_update(event).await;
            if let Err(e) = &result {
                error!("Channel '{name}' failed to deliver update for {}: {e}", event.feed_url);
            }
            outcome.deliveries.push(Delivery {
                channel: name.clone(),
                result,
            });
        }
        outcome
    }

    /// Broadcast a plain message to every channel.
    pub async fn broadcast_message(&self, text: &str, target: Option<&str>) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        for (name, channel) in &self.channels {
            let result = channel.notify_message(text, target).await;
            if let Err(e) = &result {
                error!("Channel '{name}' failed to deliver message: {e}");
            }
            outcome.deliveries.push(Delivery {
                channel: name.clone(),
                result,
            });
        }
        outcome
    }
}
