//! The `Sanstha` command surface.
//!
//! Wires the registry, post store, aggregator, generator and scheduler
//! together from injected collaborators. Nothing here is global: two
//! facades over two stores are fully independent.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument};

use sanstha_aggregator::{AggregationReport, Aggregator, AggregatorOptions};
use sanstha_gateway::{
    FeedGateway, ImageSearch, InferenceClient, Rss2JsonGateway, TextGenerator, UnsplashClient,
};
use sanstha_markup::ContentFilter;
use sanstha_shared::{AppConfig, AuthoredPost, Feed, Post, Result, SansthaError};
use sanstha_storage::{FeedRegistry, KeyValueStore, LibsqlStore, PostStore};

use crate::generator::{GeneratorOptions, PostGenerator};
use crate::scheduler::{self, SchedulerHandle};

/// External collaborators a [`Sanstha`] is built from.
pub struct Services {
    pub store: Arc<dyn KeyValueStore>,
    pub gateway: Arc<dyn FeedGateway>,
    pub text: Arc<dyn TextGenerator>,
    pub images: Arc<dyn ImageSearch>,
}

/// Stand-in generator used when no API key is configured.
///
/// Read-only commands keep working; generation reports the missing key.
struct UnconfiguredGenerator {
    reason: String,
}

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(SansthaError::config(self.reason.clone()))
    }
}

/// Library facade over the whole pipeline.
pub struct Sanstha {
    registry: Arc<FeedRegistry>,
    posts: Arc<PostStore>,
    aggregator: Aggregator,
    generator: Arc<PostGenerator>,
    period: Duration,
    scheduler_armed: Arc<AtomicBool>,
}

impl Sanstha {
    /// Build from explicit collaborators.
    pub fn new(config: &AppConfig, services: Services) -> Self {
        let registry = Arc::new(FeedRegistry::new(
            services.store.clone(),
            &config.feeds.defaults,
        ));
        let posts = Arc::new(PostStore::new(services.store, config.store.post_cap));

        let aggregator = Aggregator::new(
            services.gateway.clone(),
            registry.clone(),
            ContentFilter::new(&config.feeds.vocabulary),
            AggregatorOptions::from(config),
        );

        let generator = Arc::new(PostGenerator::new(
            services.text,
            services.images,
            services.gateway,
            registry.clone(),
            posts.clone(),
            GeneratorOptions::from(config),
        ));

        Self {
            registry,
            posts,
            aggregator,
            generator,
            period: Duration::from_secs(config.scheduler.period_hours.saturating_mul(3600)),
            scheduler_armed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Open the libSQL store and HTTP clients described by `config`.
    #[instrument(skip_all)]
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let db_path = config.store.resolved_db_path()?;
        let store = LibsqlStore::open(&db_path).await?;
        info!(path = %db_path.display(), "store opened");

        let text: Arc<dyn TextGenerator> = match InferenceClient::from_config(config) {
            Ok(client) => Arc::new(client),
            Err(SansthaError::Config { message }) => {
                Arc::new(UnconfiguredGenerator { reason: message })
            }
            Err(e) => return Err(e),
        };

        let services = Services {
            store: Arc::new(store),
            gateway: Arc::new(Rss2JsonGateway::from_config(config)?),
            text,
            images: Arc::new(UnsplashClient::from_config(config)?),
        };
        Ok(Self::new(config, services))
    }

    // -----------------------------------------------------------------------
    // Feeds
    // -----------------------------------------------------------------------

    pub async fn list_feeds(&self) -> Vec<Feed> {
        self.registry.list().await
    }

    /// Returns `false` for malformed or duplicate URLs.
    pub async fn add_feed(&self, url: &str) -> Result<bool> {
        self.registry.add(url).await
    }

    pub async fn remove_feed(&self, url: &str) -> Result<()> {
        self.registry.remove(url).await
    }

    // -----------------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------------

    /// Ranked posts from every registered feed. Never fails.
    pub async fn fetch_aggregated_posts(&self) -> Vec<Post> {
        self.aggregator.fetch_all().await.posts
    }

    /// Like [`Self::fetch_aggregated_posts`], with per-feed outcomes.
    pub async fn fetch_report(&self) -> AggregationReport {
        self.aggregator.fetch_all().await
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    pub async fn generate_post(&self, topic: &str) -> Result<Post> {
        self.generator.generate_from_topic(topic).await
    }

    pub async fn create_authored_post(&self, input: AuthoredPost) -> Result<Post> {
        self.generator.create_authored_post(input).await
    }

    pub async fn generate_from_feeds(&self) -> Result<Post> {
        self.generator.generate_from_feeds().await
    }

    // -----------------------------------------------------------------------
    // Stored posts
    // -----------------------------------------------------------------------

    pub async fn list_stored_posts(&self) -> Vec<Post> {
        self.posts.list().await
    }

    pub async fn get_stored_post(&self, id: &str) -> Option<Post> {
        self.posts.get(id).await
    }

    /// Returns whether a post was removed.
    pub async fn delete_stored_post(&self, id: &str) -> Result<bool> {
        self.posts.delete(id).await
    }

    // -----------------------------------------------------------------------
    // Scheduler
    // -----------------------------------------------------------------------

    /// Arm periodic generation. Fails if a schedule from this facade is still armed.
    pub fn arm_scheduler(&self) -> Result<SchedulerHandle> {
        if self
            .scheduler_armed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SansthaError::validation("scheduler is already armed"));
        }

        match scheduler::arm(self.generator.clone(), self.period) {
            Ok(handle) => Ok(handle.with_armed_flag(self.scheduler_armed.clone())),
            Err(e) => {
                self.scheduler_armed.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Interval between scheduled generations.
    pub fn scheduler_period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FEED_URL, FakeGateway, Fixture, item};
    use sanstha_storage::MemoryStore;

    fn facade(fx: &Fixture) -> Sanstha {
        let mut config = AppConfig::default();
        config.feeds.defaults = vec![FEED_URL.to_string()];
        Sanstha::new(
            &config,
            Services {
                store: fx.store.clone(),
                gateway: fx.gateway.clone(),
                text: fx.text.clone(),
                images: fx.images.clone(),
            },
        )
    }

    #[tokio::test]
    async fn feed_commands() {
        let fx = Fixture::new();
        let app = facade(&fx);

        assert_eq!(app.list_feeds().await.len(), 1);
        assert!(!app.add_feed("not a url").await.unwrap());
        assert!(app.add_feed("https://b.example/feed").await.unwrap());
        assert!(!app.add_feed("https://b.example/feed").await.unwrap());
        assert_eq!(app.list_feeds().await.len(), 2);

        app.remove_feed(FEED_URL).await.unwrap();
        let urls: Vec<String> = app.list_feeds().await.into_iter().map(|f| f.url).collect();
        assert_eq!(urls, vec!["https://b.example/feed"]);
    }

    #[tokio::test]
    async fn aggregation_never_fails() {
        let fx = Fixture::new();
        let app = facade(&fx);
        assert!(app.fetch_aggregated_posts().await.is_empty());

        fx.gateway.serve(
            FEED_URL,
            "Feed A",
            vec![item("g1", "Digital marketing trends", "2024-05-01")],
        );
        let posts = app.fetch_aggregated_posts().await;
        assert_eq!(posts.len(), 1);
        // Aggregated posts are not persisted.
        assert!(app.list_stored_posts().await.is_empty());
    }

    #[tokio::test]
    async fn stored_post_lifecycle() {
        let fx = Fixture::new();
        let app = facade(&fx);

        let post = app.generate_post("Content marketing").await.unwrap();
        assert_eq!(app.get_stored_post(&post.id).await, Some(post.clone()));

        assert!(!app.delete_stored_post("missing-id").await.unwrap());
        assert_eq!(app.list_stored_posts().await.len(), 1);

        assert!(app.delete_stored_post(&post.id).await.unwrap());
        assert!(app.list_stored_posts().await.is_empty());
    }

    #[tokio::test]
    async fn scheduler_cannot_be_double_armed() {
        let fx = Fixture::new();
        let app = facade(&fx);
        assert_eq!(app.scheduler_period(), scheduler::DEFAULT_PERIOD);

        let handle = app.arm_scheduler().unwrap();
        assert!(matches!(
            app.arm_scheduler().err(),
            Some(SansthaError::Validation { .. })
        ));

        handle.stop().await;
        let again = app.arm_scheduler().unwrap();
        assert!(again.is_armed());
        again.stop().await;
    }

    #[tokio::test]
    async fn facades_do_not_share_state() {
        let first = Fixture::new();
        let app_a = facade(&first);

        let other_store = Arc::new(MemoryStore::new());
        let app_b = Sanstha::new(
            &AppConfig::default(),
            Services {
                store: other_store,
                gateway: Arc::new(FakeGateway::default()),
                text: first.text.clone(),
                images: first.images.clone(),
            },
        );

        app_a.generate_post("SEO").await.unwrap();
        assert_eq!(app_a.list_stored_posts().await.len(), 1);
        assert!(app_b.list_stored_posts().await.is_empty());
        assert_eq!(app_b.list_feeds().await.len(), 9);
    }

    #[tokio::test]
    async fn unconfigured_generator_reports_missing_key() {
        let generator = UnconfiguredGenerator {
            reason: "generation API key not found".into(),
        };
        let err = generator.generate("x").await.unwrap_err();
        assert!(matches!(err, SansthaError::Config { .. }));
    }
}
