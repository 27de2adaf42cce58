//! HTTP clients for the three external services the pipeline consumes.
//!
//! Each service sits behind an object-safe trait so the aggregator and the
//! generator can be driven by fakes in tests:
//! - [`FeedGateway`]: syndicated feed → structured items ([`Rss2JsonGateway`])
//! - [`TextGenerator`]: prompt → generated text ([`InferenceClient`])
//! - [`ImageSearch`]: query → image URL ([`UnsplashClient`])

mod feed;
mod generation;
mod images;

use std::time::Duration;

use reqwest::Client;

use sanstha_shared::{Result, SansthaError};

pub use feed::{FeedGateway, FetchedFeed, Rss2JsonGateway};
pub use generation::{GenerationParams, InferenceClient, TextGenerator};
pub use images::{ImageSearch, UnsplashClient};

/// Maximum number of redirects followed by any client.
const MAX_REDIRECTS: usize = 5;

/// User-Agent string for outbound requests.
const USER_AGENT: &str = concat!("Sanstha/", env!("CARGO_PKG_VERSION"));

/// Build a reqwest client with the shared user agent, redirect policy and timeout.
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SansthaError::Network(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_with_timeout() {
        assert!(build_client(5).is_ok());
    }
}
