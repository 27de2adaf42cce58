//! Capped, newest-first collection of persisted posts.
//!
//! The collection is one JSON document rewritten whole on each mutation.
//! Concurrent writers can lose updates; a single writer is assumed.

use std::sync::Arc;

use tracing::{debug, info, warn};

use sanstha_shared::{Post, Result};

use crate::KeyValueStore;

/// Store key holding the JSON array of posts.
pub const POSTS_KEY: &str = "aiBlogPosts";

/// Default maximum number of stored posts.
pub const DEFAULT_POST_CAP: usize = 50;

pub struct PostStore {
    store: Arc<dyn KeyValueStore>,
    cap: usize,
}

impl PostStore {
    pub fn new(store: Arc<dyn KeyValueStore>, cap: usize) -> Self {
        Self {
            store,
            cap: cap.max(1),
        }
    }

    /// Prepend `post`, evicting the oldest entries beyond the cap.
    ///
    /// An existing post with the same id is replaced.
    pub async fn insert(&self, post: Post) -> Result<()> {
        let mut posts = self.load().await?;
        posts.retain(|p| p.id != post.id);

        let id = post.id.clone();
        posts.insert(0, post);
        if posts.len() > self.cap {
            debug!(evicted = posts.len() - self.cap, "evicting oldest posts");
            posts.truncate(self.cap);
        }

        self.save(&posts).await?;
        info!(%id, total = posts.len(), "post stored");
        Ok(())
    }

    /// All stored posts, newest first. Unreadable state yields an empty list.
    pub async fn list(&self) -> Vec<Post> {
        match self.load().await {
            Ok(posts) => posts,
            Err(e) => {
                warn!(error = %e, "failed to read post store");
                Vec::new()
            }
        }
    }

    /// Look up a single post.
    pub async fn get(&self, id: &str) -> Option<Post> {
        self.list().await.into_iter().find(|p| p.id == id)
    }

    /// Remove a post. Returns whether anything was removed; absent ids cause no write.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut posts = self.load().await?;
        let before = posts.len();
        posts.retain(|p| p.id != id);

        if posts.len() == before {
            debug!(id, "post not found, nothing to delete");
            return Ok(false);
        }

        self.save(&posts).await?;
        info!(id, total = posts.len(), "post deleted");
        Ok(true)
    }

    async fn load(&self) -> Result<Vec<Post>> {
        let Some(raw) = self.store.get(POSTS_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Post>>(&raw) {
            Ok(posts) => Ok(posts),
            Err(e) => {
                warn!(error = %e, "post store document is corrupt, starting empty");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, posts: &[Post]) -> Result<()> {
        let doc = serde_json::to_string(posts)?;
        self.store.put(POSTS_KEY, &doc).await
    }
}
