//! Persisted list of configured feed sources.

use std::sync::Arc;

use tracing::{debug, info, warn};

use sanstha_shared::{Feed, Result};

use crate::KeyValueStore;

/// Store key holding the JSON array of feed URLs.
pub const FEEDS_KEY: &str = "blogFeeds";

/// Ordered, duplicate-free list of feeds, persisted whole on every change.
pub struct FeedRegistry {
    store: Arc<dyn KeyValueStore>,
    defaults: Vec<Feed>,
}

impl FeedRegistry {
    /// Create a registry. `defaults` is served until the list is first written;
    /// malformed default URLs are skipped.
    pub fn new(store: Arc<dyn KeyValueStore>, defaults: &[String]) -> Self {
        let defaults = defaults
            .iter()
            .filter_map(|url| Feed::parse(url))
            .fold(Vec::new(), |mut acc: Vec<Feed>, feed| {
                if !acc.contains(&feed) {
                    acc.push(feed);
                }
                acc
            });
        Self { store, defaults }
    }

    /// Current feeds in insertion order. Read failures degrade to the defaults.
    pub async fn list(&self) -> Vec<Feed> {
        match self.load().await {
            Ok(feeds) => feeds,
            Err(e) => {
                warn!(error = %e, "failed to read feed registry, using defaults");
                self.defaults.clone()
            }
        }
    }

    /// Append a feed. Returns `false` when `url` is malformed or already present.
    pub async fn add(&self, url: &str) -> Result<bool> {
        let Some(feed) = Feed::parse(url) else {
            debug!(url, "rejected malformed feed url");
            return Ok(false);
        };

        let mut feeds = self.load().await?;
        if feeds.contains(&feed) {
            debug!(url = %feed, "feed already registered");
            return Ok(false);
        }

        feeds.push(feed);
        self.save(&feeds).await?;
        info!(url = url.trim(), total = feeds.len(), "feed added");
        Ok(true)
    }

    /// Remove a feed if present. Absent URLs are not an error.
    pub async fn remove(&self, url: &str) -> Result<()> {
        let target = url.trim();
        let mut feeds = self.load().await?;
        let before = feeds.len();
        feeds.retain(|f| f.url != target);

        self.save(&feeds).await?;
        if feeds.len() < before {
            info!(url = target, total = feeds.len(), "feed removed");
        }
        Ok(())
    }

    async fn load(&self) -> Result<Vec<Feed>> {
        let Some(raw) = self.store.get(FEEDS_KEY).await? else {
            return Ok(self.defaults.clone());
        };

        match serde_json::from_str::<Vec<Feed>>(&raw) {
            Ok(feeds) => Ok(feeds),
            Err(e) => {
                warn!(error = %e, "feed registry document is corrupt, using defaults");
                Ok(self.defaults.clone())
            }
        }
    }

    async fn save(&self, feeds: &[Feed]) -> Result<()> {
        let doc = serde_json::to_string(feeds)?;
        self.store.put(FEEDS_KEY, &doc).await
    }
}
