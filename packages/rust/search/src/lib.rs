//! Candidate discovery: turn a keyword set into a ranked, deduplicated list
//! of related articles.
//!
//! Queries are issued to a [`SearchProvider`] (one per keyword or a single
//! joined query), optionally filtered by publication date, merged, deduplicated
//! by normalized URL and title, and capped.

mod filter;
mod naver;
mod normalize;
mod provider;

use std::collections::HashSet;
use std::sync::Arc;

use newsbrief_shared::{Candidate, DateWindow, KeywordSet, QueryMode, Result};
use tracing::{debug, info, instrument};

pub use filter::apply_window;
pub use naver::{NAVER_MAX_DISPLAY, NaverCredentials, NaverSearch};
pub use normalize::{normalize_title, normalize_url, strip_markup};
pub use provider::{SearchHit, SearchProvider};

/// Extra hits requested per query when a date window may discard some.
const WINDOW_OVERFETCH: usize = 3;

// ---------------------------------------------------------------------------
// CandidateCollector
// ---------------------------------------------------------------------------

/// Collects related-article candidates for a keyword set.
///
/// Given the same keywords and the same provider responses the output is
/// identical: queries run sequentially in keyword order and the merge is a
/// pure function of the per-query rankings.
#[derive(Clone)]
pub struct CandidateCollector {
    provider: Arc<dyn SearchProvider>,
    mode: QueryMode,
    window: Option<DateWindow>,
}

impl CandidateCollector {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider,
            mode: QueryMode::default(),
            window: None,
        }
    }

    pub fn with_query_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_date_window(mut self, window: Option<DateWindow>) -> Self {
        self.window = window;
        self
    }

    /// Query the provider and return at most `max_results` candidates.
    ///
    /// An empty keyword set returns no candidates without contacting the
    /// provider. An empty search result is not an error.
    #[instrument(skip_all, fields(provider = self.provider.name(), keywords = keywords.len(), max_results))]
    pub async fn collect(&self, keywords: &KeywordSet, max_results: usize) -> Result<Vec<Candidate>> {
        if keywords.is_empty() || max_results == 0 {
            debug!("nothing to search for");
            return Ok(Vec::new());
        }

        let limit = match self.window {
            Some(_) => max_results.saturating_mul(WINDOW_OVERFETCH),
            None => max_results,
        };

        let queries: Vec<String> = match self.mode {
            QueryMode::PerKeyword => keywords.iter().map(str::to_string).collect(),
            QueryMode::Joined => vec![keywords.iter().collect::<Vec<_>>().join(" ")],
        };

        let mut ranked_lists = Vec::with_capacity(queries.len());
        for query in &queries {
            let hits = self.provider.search(query, limit).await?;
            let returned = hits.len();
            let hits = apply_window(hits, self.window.as_ref());
            debug!(%query, returned, in_window = hits.len(), "query complete");
            ranked_lists.push(hits);
        }

        let candidates = merge_ranked(ranked_lists, max_results);

        info!(
            queries = queries.len(),
            candidates = candidates.len(),
            "candidates collected"
        );

        Ok(candidates)
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Interleave per-query rankings (rank 0 of every list, then rank 1, ...),
/// drop repeated URLs and titles keeping the first occurrence, and cap.
///
/// The surviving hits are numbered 0.. in merged order.
pub fn merge_ranked(lists: Vec<Vec<SearchHit>>, max_results: usize) -> Vec<Candidate> {
    let depth = lists.iter().map(Vec::len).max().unwrap_or(0);

    let mut seen_urls = HashSet::new();
    let mut seen_titles = HashSet::new();
    let mut merged = Vec::new();

    'outer: for rank in 0..depth {
        for list in &lists {
            if merged.len() >= max_results {
                break 'outer;
            }
            let Some(hit) = list.get(rank) else {
                continue;
            };

            let Some(url_key) = normalize_url(&hit.url) else {
                continue;
            };
            if seen_urls.contains(&url_key) {
                continue;
            }

            let title_key = normalize_title(&hit.title);
            if !title_key.is_empty() && seen_titles.contains(&title_key) {
                continue;
            }

            seen_urls.insert(url_key);
            if !title_key.is_empty() {
                seen_titles.insert(title_key);
            }

            merged.push(Candidate {
                url: hit.url.clone(),
                title: hit.title.clone(),
                source_rank: merged.len(),
                published_at: hit.published_at,
            });
        }
    }

    merged
}
