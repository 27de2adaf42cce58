//! In-process fakes for the external services.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sanstha_gateway::{FeedGateway, FetchedFeed, ImageSearch, TextGenerator};
use sanstha_shared::{FeedItem, Result, SansthaError};
use sanstha_storage::{FeedRegistry, MemoryStore, PostStore};

use crate::generator::{GeneratorOptions, PostGenerator};

pub const FEED_URL: &str = "https://a.example/feed";

pub fn item(guid: &str, title: &str, date: &str) -> FeedItem {
    FeedItem {
        title: title.into(),
        pub_date: date.into(),
        link: format!("https://blog.example/{guid}"),
        guid: guid.into(),
        author: "Jo".into(),
        thumbnail: Some(format!("https://img.example/{guid}.jpg")),
        description: format!("<p>{title}</p>"),
        content: format!("<p>{title}</p>"),
        ..Default::default()
    }
}

pub struct FakeText {
    response: Mutex<std::result::Result<String, String>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeText {
    pub fn respond(&self, text: &str) {
        *self.response.lock().unwrap() = Ok(text.to_string());
    }

    pub fn fail(&self, message: &str) {
        *self.response.lock().unwrap() = Err(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response
            .lock()
            .unwrap()
            .clone()
            .map_err(SansthaError::Generation)
    }
}

pub struct FakeImages {
    url: Mutex<Option<String>>,
    queries: Mutex<Vec<String>>,
}

impl FakeImages {
    pub fn respond(&self, url: &str) {
        *self.url.lock().unwrap() = Some(url.to_string());
    }

    pub fn fail(&self) {
        *self.url.lock().unwrap() = None;
    }

    pub fn last_query(&self) -> Option<String> {
        self.queries.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ImageSearch for FakeImages {
    async fn search(&self, query: &str) -> Result<String> {
        self.queries.lock().unwrap().push(query.to_string());
        self.url
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SansthaError::ImageResolution("HTTP 403".into()))
    }
}

#[derive(Default)]
pub struct FakeGateway {
    feeds: Mutex<HashMap<String, FetchedFeed>>,
    calls: AtomicUsize,
}

impl FakeGateway {
    pub fn serve(&self, url: &str, title: &str, items: Vec<FeedItem>) {
        self.feeds.lock().unwrap().insert(
            url.to_string(),
            FetchedFeed {
                url: url.to_string(),
                title: title.to_string(),
                items,
            },
        );
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedGateway for FakeGateway {
    async fn fetch(&self, feed_url: &str) -> Result<FetchedFeed> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.feeds
            .lock()
            .unwrap()
            .get(feed_url)
            .cloned()
            .ok_or_else(|| SansthaError::source_unavailable(feed_url, "HTTP 500"))
    }
}

/// A generator wired to fakes and an in-memory store holding [`FEED_URL`].
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub text: Arc<FakeText>,
    pub images: Arc<FakeImages>,
    pub gateway: Arc<FakeGateway>,
    pub registry: Arc<FeedRegistry>,
    pub posts: Arc<PostStore>,
    pub generator: Arc<PostGenerator>,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let text = Arc::new(FakeText {
            response: Mutex::new(Ok("Generated body".into())),
            prompts: Mutex::new(Vec::new()),
        });
        let images = Arc::new(FakeImages {
            url: Mutex::new(Some("https://images.example/photo.jpg".into())),
            queries: Mutex::new(Vec::new()),
        });
        let gateway = Arc::new(FakeGateway::default());
        let registry = Arc::new(FeedRegistry::new(store.clone(), &[FEED_URL.to_string()]));
        let posts = Arc::new(PostStore::new(store.clone(), 50));

        let generator = Arc::new(PostGenerator::new(
            text.clone(),
            images.clone(),
            gateway.clone(),
            registry.clone(),
            posts.clone(),
            GeneratorOptions::default(),
        ));

        Self {
            store,
            text,
            images,
            gateway,
            registry,
            posts,
            generator,
        }
    }
}
