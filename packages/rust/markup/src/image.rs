//! Image resolution for feed item markup.
//!
//! Resolution order, highest priority first:
//! 1. an `<img>` explicitly marked as featured (`featured` / `wp-post-image`)
//! 2. the item's thumbnail
//! 3. the first `<img>` in the markup
//! 4. the fallback placeholder
//!
//! Every candidate must pass [`is_valid_image_url`]. No I/O happens here.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

/// Placeholder used when nothing in the item is usable.
pub const DEFAULT_IMAGE: &str = "/default-blog-image.jpg";

/// Attribute fragments marking an `<img>` as the post's featured image.
const FEATURED_MARKERS: [&str; 2] = ["featured", "wp-post-image"];

static IMG_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("valid selector"));

static IMAGE_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|webp|avif|gif)$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Where a resolved image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Featured,
    Thumbnail,
    Inline,
    Fallback,
}

/// Outcome of [`resolve_image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: String,
    pub origin: ImageOrigin,
}

impl ResolvedImage {
    /// Whether the resolver had to fall back to the placeholder.
    pub fn is_fallback(&self) -> bool {
        self.origin == ImageOrigin::Fallback
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Extension-based image check (`.jpg|.jpeg|.png|.webp|.avif|.gif`).
pub fn is_valid_image_url(url: &str) -> bool {
    IMAGE_EXT_RE.is_match(url.trim())
}

/// Pick the best image for an item, using `fallback` when nothing qualifies.
pub fn resolve_image(markup: &str, thumbnail: Option<&str>, fallback: &str) -> ResolvedImage {
    let doc = Html::parse_fragment(markup);
    let images: Vec<ElementRef<'_>> = doc.select(&IMG_SEL).collect();

    if let Some(url) = images
        .iter()
        .filter(|img| is_featured(img))
        .filter_map(|img| img.value().attr("src"))
        .find(|src| is_valid_image_url(src))
    {
        return resolved(url, ImageOrigin::Featured);
    }

    if let Some(url) = thumbnail.filter(|t| is_valid_image_url(t)) {
        return resolved(url, ImageOrigin::Thumbnail);
    }

    // Only the first image is considered; later ones are incidental.
    if let Some(url) = images
        .first()
        .and_then(|img| img.value().attr("src"))
        .filter(|src| is_valid_image_url(src))
    {
        return resolved(url, ImageOrigin::Inline);
    }

    trace!("no usable image, using fallback");
    resolved(fallback, ImageOrigin::Fallback)
}

fn resolved(url: &str, origin: ImageOrigin) -> ResolvedImage {
    ResolvedImage {
        url: url.trim().to_string(),
        origin,
    }
}

fn is_featured(img: &ElementRef<'_>) -> bool {
    img.value().attrs().any(|(name, value)| {
        let name = name.to_ascii_lowercase();
        let value = value.to_ascii_lowercase();
        FEATURED_MARKERS
            .iter()
            .any(|m| name.contains(m) || value.contains(m))
    })
}
