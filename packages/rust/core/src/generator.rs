//! AI-assisted post authoring: the write path of the pipeline.
//!
//! Every entry point funnels into one assembly routine: obtain a body
//! (generated or given), look up an image, derive the excerpt, persist.

use std::sync::Arc;

use chrono::Utc;
use rand::seq::IndexedRandom;
use tracing::{info, instrument, warn};

use sanstha_aggregator::parse_date;
use sanstha_gateway::{FeedGateway, ImageSearch, TextGenerator};
use sanstha_markup::{excerpt, to_paragraphs};
use sanstha_shared::{
    AI_AUTHOR, AI_SOURCE, AUTHORED_AUTHOR, AUTHORED_SOURCE, AppConfig, AuthoredPost,
    FEED_FALLBACK_AUTHOR, FeedItem, Post, Result, SansthaError, display_date, fresh_id,
};
use sanstha_storage::{FeedRegistry, PostStore};

/// Build the generation prompt for a topic.
pub fn build_prompt(topic: &str) -> String {
    format!(
        "Write a comprehensive blog post about {topic}. The post should be informative, \
         engaging, and well-structured. Include an introduction, main points, and a conclusion."
    )
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Image-lookup settings for generated posts.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Used whenever image search fails.
    pub default_image: String,
    /// One term is picked at random and appended to each search query.
    pub image_keywords: Vec<String>,
}

impl From<&AppConfig> for GeneratorOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_image: config.images.default_image.clone(),
            image_keywords: config.images.keywords.clone(),
        }
    }
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Attribution stamped onto an assembled post.
struct Byline {
    author: String,
    source: String,
    published_date: String,
    original_link: Option<String>,
    labels: Vec<String>,
}

impl Byline {
    fn today(author: &str, source: &str) -> Self {
        Self {
            author: author.to_string(),
            source: source.to_string(),
            published_date: display_date(&Utc::now()),
            original_link: None,
            labels: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Creates posts from topics, feed items or admin input, and persists them.
pub struct PostGenerator {
    text: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageSearch>,
    gateway: Arc<dyn FeedGateway>,
    registry: Arc<FeedRegistry>,
    posts: Arc<PostStore>,
    options: GeneratorOptions,
}

impl PostGenerator {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageSearch>,
        gateway: Arc<dyn FeedGateway>,
        registry: Arc<FeedRegistry>,
        posts: Arc<PostStore>,
        options: GeneratorOptions,
    ) -> Self {
        Self {
            text,
            images,
            gateway,
            registry,
            posts,
            options,
        }
    }

    /// Generate and store a post about `topic`.
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn generate_from_topic(&self, topic: &str) -> Result<Post> {
        let topic = require("topic", topic)?;
        self.assemble(topic, None, Byline::today(AI_AUTHOR, AI_SOURCE))
            .await
    }

    /// Generate and store a fresh article seeded by a feed item's title.
    #[instrument(skip_all, fields(title = %item.title, feed = %feed_title))]
    pub async fn generate_from_feed_item(&self, item: &FeedItem, feed_title: &str) -> Result<Post> {
        let topic = require("feed item title", &item.title)?;

        let published_date = parse_date(&item.pub_date)
            .map(|at| display_date(&at))
            .unwrap_or_else(|| display_date(&Utc::now()));
        let author = match item.author.trim() {
            "" => FEED_FALLBACK_AUTHOR,
            author => author,
        };
        let link = item.link.trim();

        let byline = Byline {
            author: author.to_string(),
            source: feed_title.to_string(),
            published_date,
            original_link: (!link.is_empty()).then(|| link.to_string()),
            labels: item.categories.clone(),
        };
        self.assemble(topic, None, byline).await
    }

    /// Store an admin-authored post. A blank body is generated from the title.
    #[instrument(skip_all, fields(title = %input.title))]
    pub async fn create_authored_post(&self, input: AuthoredPost) -> Result<Post> {
        let title = require("title", &input.title)?;
        let author = match input.author.trim() {
            "" => AUTHORED_AUTHOR,
            author => author,
        };
        let body = Some(input.content.trim()).filter(|c| !c.is_empty());

        self.assemble(title, body, Byline::today(author, AUTHORED_SOURCE))
            .await
    }

    /// Pick a random registered feed and a random item from it, then reseed.
    #[instrument(skip_all)]
    pub async fn generate_from_feeds(&self) -> Result<Post> {
        let feeds = self.registry.list().await;
        let feed = feeds
            .choose(&mut rand::rng())
            .cloned()
            .ok_or_else(|| SansthaError::validation("no feeds registered"))?;

        let fetched = self.gateway.fetch(&feed.url).await?;
        let item = fetched
            .items
            .choose(&mut rand::rng())
            .cloned()
            .ok_or_else(|| SansthaError::source_unavailable(&feed.url, "feed has no items"))?;

        info!(feed = %feed.url, item = %item.title, "reseeding from feed item");
        self.generate_from_feed_item(&item, &fetched.title).await
    }

    async fn assemble(&self, title: &str, body: Option<&str>, byline: Byline) -> Result<Post> {
        let content = match body {
            Some(markup) => markup.to_string(),
            None => self.write_body(title).await?,
        };
        let image_url = self.find_image(title).await;

        let post = Post {
            id: fresh_id(),
            title: title.to_string(),
            description: excerpt(&content),
            content,
            published_date: byline.published_date,
            author: byline.author,
            image_url,
            source: byline.source,
            created_at: Utc::now(),
            original_link: byline.original_link,
            labels: byline.labels,
        };

        self.posts.insert(post.clone()).await?;
        info!(id = %post.id, source = %post.source, "post created");
        Ok(post)
    }

    async fn write_body(&self, topic: &str) -> Result<String> {
        let raw = self.text.generate(&build_prompt(topic)).await?;
        let body = to_paragraphs(&raw);
        if body.is_empty() {
            return Err(SansthaError::Generation("generated text was blank".into()));
        }
        Ok(body)
    }

    /// Never fails: any search error yields the default image.
    async fn find_image(&self, topic: &str) -> String {
        let query = match self.options.image_keywords.choose(&mut rand::rng()) {
            Some(keyword) => format!("{topic} {keyword}"),
            None => topic.to_string(),
        };

        match self.images.search(&query).await {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, %query, "image search failed, using default image");
                self.options.default_image.clone()
            }
        }
    }
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    match value.trim() {
        "" => Err(SansthaError::validation(format!("{field} must not be blank"))),
        trimmed => Ok(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, item};

    #[tokio::test]
    async fn topic_post_is_formatted_and_stored() {
        let fx = Fixture::new();
        fx.text.respond("First paragraph.\n\nSecond paragraph.");
        fx.images.respond("https://images.example/seo.jpg");

        let post = fx.generator.generate_from_topic("SEO").await.unwrap();
        assert_eq!(post.title, "SEO");
        assert_eq!(
            post.content,
            "<p>First paragraph.</p>\n\n<p>Second paragraph.</p>"
        );
        assert_eq!(post.author, AI_AUTHOR);
        assert_eq!(post.source, AI_SOURCE);
        assert_eq!(post.image_url, "https://images.example/seo.jpg");
        assert!(post.description.starts_with("First paragraph."));
        assert!(post.original_link.is_none());

        let stored = fx.posts.list().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, post.id);

        let prompt = fx.text.last_prompt().unwrap();
        assert!(prompt.starts_with("Write a comprehensive blog post about SEO."));
        let query = fx.images.last_query().unwrap();
        assert!(query.starts_with("SEO "));
    }

    #[tokio::test]
    async fn generation_failure_persists_nothing() {
        let fx = Fixture::new();
        fx.text.fail("Model is currently loading");

        let err = fx.generator.generate_from_topic("SEO").await.unwrap_err();
        assert!(matches!(err, SansthaError::Generation(ref m) if m.contains("loading")));
        assert!(fx.posts.list().await.is_empty());
    }

    #[tokio::test]
    async fn image_failure_uses_default_image() {
        let fx = Fixture::new();
        fx.text.respond("Body");
        fx.images.fail();

        let post = fx.generator.generate_from_topic("Branding").await.unwrap();
        assert_eq!(post.image_url, GeneratorOptions::default().default_image);
        assert_eq!(fx.posts.list().await.len(), 1);
    }

    #[tokio::test]
    async fn blank_topic_is_rejected() {
        let fx = Fixture::new();
        let err = fx.generator.generate_from_topic("   ").await.unwrap_err();
        assert!(matches!(err, SansthaError::Validation { .. }));
        assert_eq!(fx.text.calls(), 0);
    }

    #[tokio::test]
    async fn authored_post_with_content_skips_generation() {
        let fx = Fixture::new();
        let post = fx
            .generator
            .create_authored_post(AuthoredPost {
                title: "Launch notes".into(),
                content: "<p>We shipped.</p>".into(),
                author: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(fx.text.calls(), 0);
        assert_eq!(post.content, "<p>We shipped.</p>");
        assert_eq!(post.description, "We shipped....");
        assert_eq!(post.author, AUTHORED_AUTHOR);
        assert_eq!(post.source, AUTHORED_SOURCE);
    }

    #[tokio::test]
    async fn authored_post_without_content_generates_from_title() {
        let fx = Fixture::new();
        fx.text.respond("Generated body");
        let post = fx
            .generator
            .create_authored_post(AuthoredPost {
                title: "Q3 plans".into(),
                content: "  ".into(),
                author: "Priya".into(),
            })
            .await
            .unwrap();

        assert_eq!(fx.text.calls(), 1);
        assert_eq!(post.content, "<p>Generated body</p>");
        assert_eq!(post.author, "Priya");
    }

    #[tokio::test]
    async fn feed_item_reseed_keeps_provenance() {
        let fx = Fixture::new();
        fx.text.respond("Body");
        let mut source = item("g1", "Local SEO in 2024", "2024-05-01 10:00:00");
        source.author = String::new();
        source.categories = vec!["SEO".into()];

        let post = fx
            .generator
            .generate_from_feed_item(&source, "Moz Blog")
            .await
            .unwrap();

        assert_eq!(post.title, "Local SEO in 2024");
        assert_eq!(post.author, FEED_FALLBACK_AUTHOR);
        assert_eq!(post.source, "Moz Blog");
        assert_eq!(post.published_date, "5/1/2024");
        assert_eq!(post.original_link.as_deref(), Some("https://blog.example/g1"));
        assert_eq!(post.labels, vec!["SEO"]);
        assert_ne!(post.id, "g1");
    }

    #[tokio::test]
    async fn generate_from_feeds_picks_a_registered_feed() {
        let fx = Fixture::new();
        fx.text.respond("Body");
        fx.gateway.serve(
            crate::testing::FEED_URL,
            "Feed A",
            vec![item("g1", "Email marketing", "2024-05-01")],
        );

        let post = fx.generator.generate_from_feeds().await.unwrap();
        assert_eq!(post.source, "Feed A");
        assert_eq!(post.title, "Email marketing");
    }

    #[tokio::test]
    async fn generate_from_empty_feed_is_source_unavailable() {
        let fx = Fixture::new();
        fx.gateway.serve(crate::testing::FEED_URL, "Feed A", vec![]);
        let err = fx.generator.generate_from_feeds().await.unwrap_err();
        assert!(matches!(err, SansthaError::SourceUnavailable { .. }));
        assert_eq!(fx.text.calls(), 0);
    }
}
