//! Pure markup utilities for the Sanstha pipeline.
//!
//! Nothing in this crate performs I/O:
//! - [`image`] picks the best image out of item markup
//! - [`filter`] decides topical relevance
//! - [`text`] derives excerpts and paragraph markup

pub mod filter;
pub mod image;
pub mod text;

pub use filter::ContentFilter;
pub use image::{DEFAULT_IMAGE, ImageOrigin, ResolvedImage, is_valid_image_url, resolve_image};
pub use text::{EXCERPT_CHARS, excerpt, strip_tags, to_paragraphs};
