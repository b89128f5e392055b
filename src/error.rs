// src/error.rs

//! Unified error handling for the sitemap monitor.

use std::fmt;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request completed with a non-success status
    #[error("HTTP status {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Sitemap document could not be parsed
    #[error("Parse error for {context}: {message}")]
    Parse { context: String, message: String },

    /// A snapshot commit was already recorded for this domain today
    #[error("sitemap for {domain} already updated today")]
    AlreadyUpdated { domain: String },

    /// Requested entry does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot store or registry persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Notification channel delivery failure
    #[error("Channel '{name}' delivery failed: {message}")]
    Channel { name: String, message: String },
}

impl AppError {
    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a channel delivery error.
    pub fn channel(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Channel {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is a transient fetch failure worth retrying on the
    /// next scheduled pass.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}
