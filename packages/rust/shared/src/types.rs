//! Core domain types for the Sanstha content pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Source label stamped on topic-driven generated posts.
pub const AI_SOURCE: &str = "Generated by AI";

/// Author label stamped on topic-driven generated posts.
pub const AI_AUTHOR: &str = "AI Writer";

/// Source label stamped on admin-authored posts.
pub const AUTHORED_SOURCE: &str = "Social Sanstha";

/// Author used when an admin leaves the author field blank.
pub const AUTHORED_AUTHOR: &str = "Admin";

/// Author used when a reseeded feed item carries no author.
pub const FEED_FALLBACK_AUTHOR: &str = "Marketing Expert";

/// Generate a fresh, time-sortable post identifier.
pub fn fresh_id() -> String {
    Uuid::now_v7().to_string()
}

/// Format a timestamp the way posts display it (`M/D/YYYY`).
pub fn display_date(at: &DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y").to_string()
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// The normalized content unit shown to readers.
///
/// Produced either by the aggregator (ephemeral) or the generator (persisted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique within the post store; stable for the post's lifetime.
    pub id: String,
    pub title: String,
    /// Presentational markup. Never escaped by the pipeline.
    pub content: String,
    /// Plain-text excerpt, at most 150 characters plus `...`.
    pub description: String,
    /// Display-formatted publish date.
    pub published_date: String,
    pub author: String,
    /// Always resolvable; falls back to a default asset.
    pub image_url: String,
    /// Feed display name, [`AI_SOURCE`], or [`AUTHORED_SOURCE`].
    pub source: String,
    /// Local creation time, used for store ordering.
    pub created_at: DateTime<Utc>,
    /// Present only for feed-derived posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Admin-entered post fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthoredPost {
    pub title: String,
    /// Optional body markup. Blank means "generate from the title".
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// A configured syndicated-content source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feed {
    pub url: String,
}

impl Feed {
    /// Parse a feed URL. Only absolute `http`/`https` locators are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let parsed = Url::parse(trimmed).ok()?;
        match parsed.scheme() {
            "http" | "https" if parsed.host_str().is_some() => Some(Self {
                url: trimmed.to_string(),
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

// ---------------------------------------------------------------------------
// Gateway payloads
// ---------------------------------------------------------------------------

/// Response document of the feed-to-JSON gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedDocument {
    /// `"ok"` on success.
    #[serde(default)]
    pub status: String,
    /// Gateway error message when `status` is not ok.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub feed: FeedDescriptor,
    /// `None` when the gateway omitted the list entirely.
    #[serde(default)]
    pub items: Option<Vec<FeedItem>>,
}

impl FeedDocument {
    /// Whether the gateway reported success.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Feed-level metadata returned alongside items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedDescriptor {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
}

/// A single raw entry from the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pub_date: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

impl FeedItem {
    /// Combined text the relevance filter looks at.
    pub fn searchable_text(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.content)
    }

    /// Feed-assigned identifier, falling back to the link.
    pub fn stable_id(&self) -> Option<&str> {
        [self.guid.as_str(), self.link.as_str()]
            .into_iter()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn feed_parse_accepts_http_urls_only() {
        assert!(Feed::parse("https://a.example/feed").is_some());
        assert!(Feed::parse("  http://a.example/rss.xml ").is_some());
        assert!(Feed::parse("not a url").is_none());
        assert!(Feed::parse("ftp://a.example/feed").is_none());
        assert!(Feed::parse("").is_none());
    }

    #[test]
    fn feed_serializes_as_plain_string() {
        let feeds = vec![Feed::parse("https://a.example/feed").unwrap()];
        let json = serde_json::to_string(&feeds).unwrap();
        assert_eq!(json, r#"["https://a.example/feed"]"#);
    }

    #[test]
    fn post_uses_camel_case_keys() {
        let post = Post {
            id: "p1".into(),
            title: "T".into(),
            content: "<p>x</p>".into(),
            description: "x...".into(),
            published_date: "5/1/2024".into(),
            author: "A".into(),
            image_url: "/default-blog-image.jpg".into(),
            source: AI_SOURCE.into(),
            created_at: Utc::now(),
            original_link: None,
            labels: vec![],
        };
        let json = serde_json::to_string(&post).unwrap();
        assert!(json.contains("\"imageUrl\""));
        assert!(json.contains("\"publishedDate\""));
        assert!(json.contains("\"createdAt\""));
        assert!(!json.contains("originalLink"));
        assert!(!json.contains("labels"));
    }

    #[test]
    fn gateway_document_tolerates_missing_fields() {
        let doc: FeedDocument = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert!(!doc.is_ok());
        assert!(doc.items.is_none());

        let doc: FeedDocument = serde_json::from_str(
            r#"{"status":"ok","feed":{"title":"Moz"},"items":[{"title":"SEO","pubDate":"2024-05-01 10:00:00","guid":"g1"}]}"#,
        )
        .unwrap();
        assert!(doc.is_ok());
        assert_eq!(doc.feed.title, "Moz");
        assert_eq!(doc.items.unwrap()[0].pub_date, "2024-05-01 10:00:00");
    }

    #[test]
    fn stable_id_prefers_guid() {
        let mut item = FeedItem {
            guid: "g1".into(),
            link: "https://a.example/p".into(),
            ..Default::default()
        };
        assert_eq!(item.stable_id(), Some("g1"));
        item.guid.clear();
        assert_eq!(item.stable_id(), Some("https://a.example/p"));
        item.link.clear();
        assert_eq!(item.stable_id(), None);
    }

    #[test]
    fn display_date_has_no_padding() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(display_date(&at), "5/1/2024");
    }
}
