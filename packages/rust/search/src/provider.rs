//! Search collaborator abstraction.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use newsbrief_shared::Result;

/// One result returned by a search provider, before merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Absolute http(s) URL of the article.
    pub url: String,
    /// Plain-text headline (markup already stripped).
    pub title: String,
    /// Publication time, when the provider reports a parseable one.
    pub published_at: Option<DateTime<FixedOffset>>,
}

/// A news search backend.
///
/// Implementations return hits in provider rank order (most relevant first)
/// and map service failures to `NewsBriefError::Upstream`.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one query, returning at most `limit` hits.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;

    /// Short provider name used in logs and errors.
    fn name(&self) -> &'static str;
}
