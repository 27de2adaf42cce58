//! Persistence layer for Sanstha.
//!
//! Everything is stored as whole JSON documents behind the [`KeyValueStore`]
//! trait:
//! - [`LibsqlStore`]: a local libSQL database (`kv` table, migrated on open)
//! - [`MemoryStore`]: process-local, for tests
//!
//! [`FeedRegistry`] and [`PostStore`] are typed views over two keys.

mod kv;
mod migrations;
mod posts;
mod registry;

pub use kv::{KeyValueStore, LibsqlStore, MemoryStore};
pub use posts::{DEFAULT_POST_CAP, POSTS_KEY, PostStore};
pub use registry::{FEEDS_KEY, FeedRegistry};
