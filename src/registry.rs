// src/registry.rs

//! Persisted registry of watched sitemap feeds.
//!
//! The watch list is an ordered, deduplicated list of URLs, flushed to disk
//! on every mutation so a crash right after a command returns cannot lose
//! the change. Reads are concurrent (scheduler passes), writes are
//! serialized behind the lock (user commands are rare).

use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{AppError, Result};

/// Ordered set of watched sitemap URLs, persisted as a JSON array.
#[derive(Debug)]
pub struct FeedRegistry {
    path: PathBuf,
    feeds: RwLock<Vec<String>>,
}

impl FeedRegistry {
    /// Load the registry from disk, starting empty when the file is absent.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let feeds = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(AppError::Io(e)),
        };

        Ok(Self {
            path,
            feeds: RwLock::new(feeds),
        })
    }

    /// Add a feed URL. Returns `Ok(false)` without touching disk when the
    /// URL is already watched.
    pub fn add(&self, url: &str) -> Result<bool> {
        let mut feeds = self.lock_write()?;
        if feeds.iter().any(|f| f == url) {
            return Ok(false);
        }

        feeds.push(url.to_string());
        self.persist(&feeds)?;
        Ok(true)
    }

    /// Remove a feed URL. Fails with `NotFound` when it is not watched.
    pub fn remove(&self, url: &str) -> Result<()> {
        let mut feeds = self.lock_write()?;
        let before = feeds.len();
        feeds.retain(|f| f != url);

        if feeds.len() == before {
            return Err(AppError::NotFound(url.to_string()));
        }

        self.persist(&feeds)
    }

    /// Snapshot of the watch list in insertion order.
    pub fn list(&self) -> Vec<String> {
        self.feeds
            .read()
            .map(|feeds| feeds.clone())
            .unwrap_or_default()
    }

    /// Whether the given URL is currently watched.
    pub fn contains(&self, url: &str) -> bool {
        self.feeds
            .read()
            .map(|feeds| feeds.iter().any(|f| f == url))
            .unwrap_or(false)
    }

    fn lock_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<String>>> {
        self.feeds
            .write()
            .map_err(|_| AppError::storage("feed registry lock poisoned"))
    }

    /// Flush the list to disk via write-then-rename.
    fn persist(&self, feeds: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(feeds)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    #[cfg(test)]
    fn path(&self) -> &std::path::Path {
        &self.path
    }
}
