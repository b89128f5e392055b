//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable that overrides the configured Telegram bot token.
pub const TELEGRAM_TOKEN_ENV: &str = "SITEWATCH_TELEGRAM_TOKEN";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scheduler pass timing
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// HTTP fetch behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Persistent storage locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification channel settings
    #[serde(default)]
    pub channels: ChannelsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            let mut config = Self::default();
            config.apply_env_overrides();
            config
        })
    }

    /// Pull secrets from the environment when set.
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(TELEGRAM_TOKEN_ENV) {
            if !token.trim().is_empty() {
                let telegram = self.channels.telegram.get_or_insert_with(Default::default);
                telegram.token = token;
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::config("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::config("fetch.timeout_secs must be > 0"));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(AppError::config("scheduler.interval_secs must be > 0"));
        }
        if self.scheduler.error_backoff_secs >= self.scheduler.interval_secs {
            return Err(AppError::config(
                "scheduler.error_backoff_secs must be shorter than interval_secs",
            ));
        }
        if let Some(telegram) = &self.channels.telegram {
            if telegram.token.trim().is_empty() {
                return Err(AppError::config(format!(
                    "channels.telegram.token is empty (set it or export {TELEGRAM_TOKEN_ENV})"
                )));
            }
            if telegram.chat_id.trim().is_empty() {
                return Err(AppError::config("channels.telegram.chat_id is empty"));
            }
        }
        if let Some(webhook) = &self.channels.webhook {
            if webhook.url.trim().is_empty() {
                return Err(AppError::config("channels.webhook.url is empty"));
            }
        }
        Ok(())
    }
}

/// Scheduler pass timing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between full passes over the feed list
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Backoff after a failed pass, substantially shorter than the interval
    #[serde(default = "defaults::error_backoff")]
    pub error_backoff_secs: u64,

    /// Delay between the last per-feed notification and the keyword summary
    #[serde(default = "defaults::summary_delay")]
    pub summary_delay_secs: u64,

    /// Minimum delay between successive outbound messages to one channel
    #[serde(default = "defaults::message_pacing")]
    pub message_pacing_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            error_backoff_secs: defaults::error_backoff(),
            summary_delay_secs: defaults::summary_delay(),
            message_pacing_ms: defaults::message_pacing(),
        }
    }
}

/// HTTP fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Persistent storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for per-domain snapshot state
    #[serde(default = "defaults::sitemap_dir")]
    pub sitemap_dir: PathBuf,

    /// Path of the persisted feed list
    #[serde(default = "defaults::feeds_file")]
    pub feeds_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sitemap_dir: defaults::sitemap_dir(),
            feeds_file: defaults::feeds_file(),
        }
    }
}

/// Notification channel settings. Absent sections leave the channel
/// unregistered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,

    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

/// Telegram Bot API channel settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token; prefer the environment override for real deployments
    #[serde(default)]
    pub token: String,

    /// Default destination chat
    #[serde(default)]
    pub chat_id: String,
}

/// Generic JSON webhook channel settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Endpoint that accepts `{"content": "..."}` POSTs
    #[serde(default)]
    pub url: String,
}

mod defaults {
    use std::path::PathBuf;

    pub fn interval() -> u64 {
        3600
    }

    pub fn error_backoff() -> u64 {
        60
    }

    pub fn summary_delay() -> u64 {
        10
    }

    pub fn message_pacing() -> u64 {
        1000
    }

    pub fn user_agent() -> String {
        format!("sitewatch/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn sitemap_dir() -> PathBuf {
        PathBuf::from("storage/sitemaps")
    }

    pub fn feeds_file() -> PathBuf {
        PathBuf::from("storage/feeds.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler.interval_secs, 3600);
        assert_eq!(config.scheduler.error_backoff_secs, 60);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scheduler]
            interval_secs = 600

            [channels.webhook]
            url = "https://hooks.example.com/notify"
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.interval_secs, 600);
        assert_eq!(config.scheduler.summary_delay_secs, 10);
        assert_eq!(
            config.channels.webhook.as_ref().unwrap().url,
            "https://hooks.example.com/notify"
        );
        assert!(config.channels.telegram.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_telegram_token_rejected() {
        let config: Config = toml::from_str(
            r#"
            [channels.telegram]
            token = ""
            chat_id = "@watchers"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_must_undercut_interval() {
        let config: Config = toml::from_str(
            r#"
            [scheduler]
            interval_secs = 30
            error_backoff_secs = 60
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
