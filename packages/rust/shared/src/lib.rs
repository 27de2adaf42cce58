//! Shared types, error model, and configuration for Sanstha.
//!
//! This crate is the foundation depended on by all other Sanstha crates.
//! It provides:
//! - [`SansthaError`], the unified error type
//! - Domain types ([`Post`], [`Feed`], [`FeedItem`], [`AuthoredPost`])
//! - Configuration ([`AppConfig`] and config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FeedsConfig, GatewayConfig, GenerationConfig, ImagesConfig, SchedulerConfig,
    StoreConfig, config_dir, config_file_path, generation_api_key, images_access_key, init_config,
    load_config, load_config_from, render_config,
};
pub use error::{Result, SansthaError};
pub use types::{
    AI_AUTHOR, AI_SOURCE, AUTHORED_AUTHOR, AUTHORED_SOURCE, AuthoredPost, FEED_FALLBACK_AUTHOR,
    Feed, FeedDescriptor, FeedDocument, FeedItem, Post, display_date, fresh_id,
};
