//! Concurrent feed aggregation.
//!
//! One gateway request per registered feed runs concurrently. Each feed
//! resolves to its own outcome so a failing source never affects the rest.
//! Surviving items are filtered, normalized into posts, deduplicated and
//! ranked newest first.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use sanstha_gateway::{FeedGateway, FetchedFeed};
use sanstha_markup::{ContentFilter, DEFAULT_IMAGE, excerpt, resolve_image};
use sanstha_shared::{AppConfig, FeedItem, Post, display_date, fresh_id};
use sanstha_storage::FeedRegistry;

use crate::dates::parse_date;

/// Default number of posts returned by one aggregation round.
pub const DEFAULT_LIMIT: usize = 30;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// What happened to a single feed during one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    /// The feed contributed `kept` posts.
    Posts {
        url: String,
        title: String,
        kept: usize,
    },
    /// The feed answered but nothing survived filtering or image checks.
    NoRelevantItems { url: String, title: String },
    /// The gateway call failed.
    Unavailable { url: String, error: String },
}

impl FeedOutcome {
    pub fn url(&self) -> &str {
        match self {
            Self::Posts { url, .. }
            | Self::NoRelevantItems { url, .. }
            | Self::Unavailable { url, .. } => url,
        }
    }
}

/// Result of [`Aggregator::fetch_all`].
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    /// At most `limit` posts, newest first, unique ids.
    pub posts: Vec<Post>,
    /// One outcome per registered feed, in registry order.
    pub outcomes: Vec<FeedOutcome>,
    pub duration: Duration,
}

impl AggregationReport {
    /// Number of feeds whose gateway call failed.
    pub fn unavailable(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FeedOutcome::Unavailable { .. }))
            .count()
    }
}

/// Tunables for an [`Aggregator`].
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Maximum posts returned.
    pub limit: usize,
    /// Placeholder the image resolver falls back to.
    pub fallback_image: String,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            fallback_image: DEFAULT_IMAGE.to_string(),
        }
    }
}

impl From<&AppConfig> for AggregatorOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            limit: config.feeds.limit,
            fallback_image: config.feeds.fallback_image.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// A post plus the parsed timestamp used for ranking.
struct Ranked {
    post: Post,
    published_at: Option<DateTime<Utc>>,
}

/// Read path: registered feeds in, ranked posts out.
pub struct Aggregator {
    gateway: Arc<dyn FeedGateway>,
    registry: Arc<FeedRegistry>,
    filter: ContentFilter,
    options: AggregatorOptions,
}

impl Aggregator {
    pub fn new(
        gateway: Arc<dyn FeedGateway>,
        registry: Arc<FeedRegistry>,
        filter: ContentFilter,
        options: AggregatorOptions,
    ) -> Self {
        Self {
            gateway,
            registry,
            filter,
            options,
        }
    }

    /// Fetch every registered feed and merge the results.
    ///
    /// Never fails: unavailable feeds are reported in the outcomes and
    /// contribute nothing.
    #[instrument(skip_all)]
    pub async fn fetch_all(&self) -> AggregationReport {
        let start = Instant::now();
        let feeds = self.registry.list().await;
        info!(feeds = feeds.len(), "aggregating feeds");

        let results = join_all(feeds.iter().map(|feed| self.gateway.fetch(&feed.url))).await;

        let mut outcomes = Vec::with_capacity(feeds.len());
        let mut candidates = Vec::new();

        for (feed, result) in feeds.iter().zip(results) {
            match result {
                Ok(fetched) => {
                    let ranked = self.normalize(&fetched);
                    outcomes.push(if ranked.is_empty() {
                        debug!(url = %feed.url, "no relevant items");
                        FeedOutcome::NoRelevantItems {
                            url: feed.url.clone(),
                            title: fetched.title.clone(),
                        }
                    } else {
                        FeedOutcome::Posts {
                            url: feed.url.clone(),
                            title: fetched.title.clone(),
                            kept: ranked.len(),
                        }
                    });
                    candidates.extend(ranked);
                }
                Err(e) => {
                    warn!(url = %feed.url, error = %e, "feed unavailable");
                    outcomes.push(FeedOutcome::Unavailable {
                        url: feed.url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let posts = rank(candidates, self.options.limit);
        let duration = start.elapsed();
        info!(
            posts = posts.len(),
            feeds = feeds.len(),
            elapsed_ms = duration.as_millis() as u64,
            "aggregation complete"
        );

        AggregationReport {
            posts,
            outcomes,
            duration,
        }
    }

    /// Filter and map one feed's items. Items without a usable image are dropped.
    fn normalize(&self, fetched: &FetchedFeed) -> Vec<Ranked> {
        fetched
            .items
            .iter()
            .filter(|item| self.filter.is_relevant(&item.searchable_text()))
            .filter_map(|item| self.to_post(item, &fetched.title))
            .collect()
    }

    fn to_post(&self, item: &FeedItem, feed_title: &str) -> Option<Ranked> {
        let markup = if item.content.trim().is_empty() {
            &item.description
        } else {
            &item.content
        };

        let image = resolve_image(
            markup,
            item.thumbnail.as_deref(),
            &self.options.fallback_image,
        );
        if image.is_fallback() {
            debug!(title = %item.title, "dropping item without a valid image");
            return None;
        }

        let description = if item.description.trim().is_empty() {
            excerpt(&item.content)
        } else {
            excerpt(&item.description)
        };

        let published_at = parse_date(&item.pub_date);
        let published_date = published_at
            .as_ref()
            .map(display_date)
            .unwrap_or_else(|| item.pub_date.clone());

        let author = if item.author.trim().is_empty() {
            feed_title.to_string()
        } else {
            item.author.clone()
        };

        let link = item.link.trim();

        Some(Ranked {
            post: Post {
                id: item.stable_id().map(String::from).unwrap_or_else(fresh_id),
                title: item.title.trim().to_string(),
                content: item.content.clone(),
                description,
                published_date,
                author,
                image_url: image.url,
                source: feed_title.to_string(),
                created_at: Utc::now(),
                original_link: (!link.is_empty()).then(|| link.to_string()),
                labels: item.categories.clone(),
            },
            published_at,
        })
    }
}

/// Deduplicate by id (first seen wins), sort newest first, truncate.
///
/// Undated posts sort after every dated one; ties keep arrival order.
fn rank(candidates: Vec<Ranked>, limit: usize) -> Vec<Post> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Ranked> = candidates
        .into_iter()
        .filter(|r| seen.insert(r.post.id.clone()))
        .collect();

    unique.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    unique.truncate(limit);
    unique.into_iter().map(|r| r.post).collect()
}
