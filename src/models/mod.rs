// src/models/mod.rs

//! Domain models for the sitemap monitor.

mod config;
mod event;

pub use config::{
    ChannelsConfig, Config, FetchConfig, SchedulerConfig, StorageConfig, TelegramConfig,
    WebhookConfig,
};
pub use event::{CheckReport, CheckStatus, UpdateEvent};
