//! Keyword relevance filter for feed items.

/// Decides whether an item belongs to the site's topic.
///
/// Matching is a case-insensitive substring test against a fixed vocabulary,
/// so short terms like `seo` also match inside longer words.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    vocabulary: Vec<String>,
}

impl ContentFilter {
    /// Build a filter from a vocabulary. Terms are lower-cased; blank ones are dropped.
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary = vocabulary
            .into_iter()
            .map(|term| term.as_ref().trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        Self { vocabulary }
    }

    /// True when any vocabulary term occurs in `text`.
    pub fn is_relevant(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.vocabulary.iter().any(|term| haystack.contains(term))
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanstha_shared::AppConfig;

    fn default_filter() -> ContentFilter {
        ContentFilter::new(&AppConfig::default().feeds.vocabulary)
    }

    #[test]
    fn matches_case_insensitively() {
        let filter = default_filter();
        assert!(filter.is_relevant("10 Content Marketing Tips"));
        assert!(filter.is_relevant("GOOGLE ADS budget guide"));
        assert!(!filter.is_relevant("My holiday in Lisbon"));
    }

    #[test]
    fn short_terms_match_as_substrings() {
        let filter = default_filter();
        assert!(filter.is_relevant("Why SEOs love structured data"));
    }

    #[test]
    fn custom_vocabulary_is_normalized() {
        let filter = ContentFilter::new(["  Rust ", "", "Tokio"]);
        assert_eq!(filter.vocabulary(), ["rust", "tokio"]);
        assert!(filter.is_relevant("async RUST in practice"));
    }

    #[test]
    fn empty_vocabulary_rejects_everything() {
        let filter = ContentFilter::new(Vec::<String>::new());
        assert!(!filter.is_relevant("digital marketing"));
    }
}
