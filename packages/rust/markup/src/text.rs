//! Plain-text helpers: tag stripping, excerpts and paragraph wrapping.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum excerpt length in characters, before the `...` marker.
pub const EXCERPT_CHARS: usize = 150;

const ELLIPSIS: &str = "...";

static HTML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

/// Remove markup tags and collapse runs of whitespace.
pub fn strip_tags(markup: &str) -> String {
    let text = HTML_TAG_RE.replace_all(markup, " ");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Plain-text excerpt: tags stripped, first [`EXCERPT_CHARS`] characters, then `...`.
pub fn excerpt(markup: &str) -> String {
    let plain = strip_tags(markup);
    let head: String = plain.chars().take(EXCERPT_CHARS).collect();
    format!("{}{ELLIPSIS}", head.trim_end())
}

/// Wrap each blank-line-separated paragraph of `text` in `<p>` tags.
///
/// Paragraphs are joined with a blank line; empty ones are dropped.
pub fn to_paragraphs(text: &str) -> String {
    PARAGRAPH_BREAK_RE
        .split(text.trim())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{p}</p>"))
        .collect::<Vec<_>>()
        .join("\n\n")
}
