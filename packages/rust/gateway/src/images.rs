//! Stock image search client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use sanstha_shared::{AppConfig, Result, SansthaError, images_access_key};

use crate::build_client;

/// Finds an image URL for a free-text query.
///
/// Callers treat every error as "use the default image".
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct RandomPhoto {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: Option<String>,
}

/// Client for the Unsplash random-photo endpoint.
#[derive(Debug, Clone)]
pub struct UnsplashClient {
    client: Client,
    base_url: String,
    access_key: Option<String>,
}

impl UnsplashClient {
    pub fn new(client: Client, base_url: impl Into<String>, access_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            access_key,
        }
    }

    /// Build from the `[images]` config section. A missing key is allowed.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = build_client(config.gateway.timeout_secs)?;
        Ok(Self::new(
            client,
            config.images.endpoint.clone(),
            images_access_key(config),
        ))
    }
}

#[async_trait]
impl ImageSearch for UnsplashClient {
    #[instrument(skip_all, fields(query = %query))]
    async fn search(&self, query: &str) -> Result<String> {
        let key = self
            .access_key
            .as_deref()
            .ok_or_else(|| SansthaError::ImageResolution("no access key configured".into()))?;

        let url = format!("{}/photos/random", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("query", query), ("orientation", "landscape")])
            .header(reqwest::header::AUTHORIZATION, format!("Client-ID {key}"))
            .send()
            .await
            .map_err(|e| SansthaError::ImageResolution(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SansthaError::ImageResolution(format!("HTTP {status}")));
        }

        let photo: RandomPhoto = response
            .json()
            .await
            .map_err(|e| SansthaError::ImageResolution(format!("invalid payload: {e}")))?;

        let regular = photo
            .urls
            .regular
            .filter(|u| !u.is_empty())
            .ok_or_else(|| SansthaError::ImageResolution("payload has no regular url".into()))?;

        debug!(url = %regular, "image found");
        Ok(regular)
    }
}
