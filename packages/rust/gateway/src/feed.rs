//! Feed-to-JSON gateway client.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use sanstha_shared::{AppConfig, FeedDocument, FeedItem, Result, SansthaError};

use crate::build_client;

/// A feed successfully fetched through the gateway.
#[derive(Debug, Clone, Default)]
pub struct FetchedFeed {
    /// The feed URL that was requested.
    pub url: String,
    /// Display name reported by the feed.
    pub title: String,
    pub items: Vec<FeedItem>,
}

/// Turns a feed URL into structured items.
///
/// Every failure mode (transport, HTTP status, gateway status, missing item
/// list) is reported as [`SansthaError::SourceUnavailable`].
#[async_trait]
pub trait FeedGateway: Send + Sync {
    async fn fetch(&self, feed_url: &str) -> Result<FetchedFeed>;
}

/// Client for an rss2json-compatible gateway (`GET {base}?rss_url=...`).
#[derive(Debug, Clone)]
pub struct Rss2JsonGateway {
    client: Client,
    base_url: String,
}

impl Rss2JsonGateway {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build from the `[gateway]` config section.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = build_client(config.gateway.timeout_secs)?;
        Ok(Self::new(client, config.gateway.url.clone()))
    }
}

#[async_trait]
impl FeedGateway for Rss2JsonGateway {
    #[instrument(skip_all, fields(feed = %feed_url))]
    async fn fetch(&self, feed_url: &str) -> Result<FetchedFeed> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("rss_url", feed_url)])
            .send()
            .await
            .map_err(|e| SansthaError::source_unavailable(feed_url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SansthaError::source_unavailable(
                feed_url,
                format!("HTTP {status}"),
            ));
        }

        let doc: FeedDocument = response.json().await.map_err(|e| {
            SansthaError::source_unavailable(feed_url, format!("invalid gateway payload: {e}"))
        })?;

        if !doc.is_ok() {
            let message = doc
                .message
                .unwrap_or_else(|| format!("gateway status {:?}", doc.status));
            return Err(SansthaError::source_unavailable(feed_url, message));
        }

        let items = doc
            .items
            .ok_or_else(|| SansthaError::source_unavailable(feed_url, "missing item list"))?;

        debug!(title = %doc.feed.title, items = items.len(), "feed fetched");

        Ok(FetchedFeed {
            url: feed_url.to_string(),
            title: doc.feed.title,
            items,
        })
    }
}
