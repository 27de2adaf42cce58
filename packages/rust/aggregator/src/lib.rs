//! Feed aggregation: the read path of the Sanstha pipeline.
//!
//! This crate provides:
//! - [`engine`]: the concurrent [`Aggregator`] and its per-feed report
//! - [`dates`]: lenient publish-date parsing shared with the generator

pub mod dates;
pub mod engine;

pub use dates::parse_date;
pub use engine::{
    AggregationReport, Aggregator, AggregatorOptions, DEFAULT_LIMIT, FeedOutcome,
};
