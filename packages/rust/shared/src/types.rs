//! Core domain types flowing through the aggregation pipeline.
//!
//! Each structure is produced by exactly one stage and handed by value to the
//! next one; none of them expose interior mutability.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ErrorKind;

// ---------------------------------------------------------------------------
// Seed article
// ---------------------------------------------------------------------------

/// The single input article from which keywords and the report originate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedArticle {
    /// Where the seed came from.
    pub url: String,
    /// Raw markup as fetched or supplied.
    pub raw_markup: String,
    /// Headline extracted from the markup.
    pub title: String,
    /// Plain-text body produced by the content extractor.
    pub extracted_text: String,
}

impl SeedArticle {
    /// Lightweight reference used for attribution in the report.
    pub fn reference(&self) -> SeedRef {
        SeedRef {
            url: self.url.clone(),
            title: self.title.clone(),
        }
    }
}

/// URL + title of the seed, kept in the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRef {
    pub url: String,
    pub title: String,
}

// ---------------------------------------------------------------------------
// KeywordSet
// ---------------------------------------------------------------------------

/// Ordered, distinct, non-empty search keywords (insertion order = relevance).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordSet(Vec<String>);

impl KeywordSet {
    /// Build a keyword set from raw candidates.
    ///
    /// Entries are trimmed, empty ones dropped, duplicates (case-insensitive)
    /// removed keeping the first occurrence, and the result truncated to `max`.
    pub fn bounded<I, S>(raw: I, max: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();

        for kw in raw {
            if keywords.len() >= max {
                break;
            }
            let kw = kw.as_ref().trim();
            if kw.is_empty() {
                continue;
            }
            if seen.insert(kw.to_lowercase()) {
                keywords.push(kw.to_string());
            }
        }

        Self(keywords)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A search-discovered article considered for inclusion in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Article URL as returned by the search provider.
    pub url: String,
    /// Plain-text headline from the search provider.
    pub title: String,
    /// Position in the merged, deduplicated candidate list (0 = most relevant).
    pub source_rank: usize,
    /// Publication time reported by the provider, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<FixedOffset>>,
}

// ---------------------------------------------------------------------------
// FetchResult
// ---------------------------------------------------------------------------

/// Terminal outcome of fetching + extracting one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchResult {
    Success {
        candidate: Candidate,
        extracted_text: String,
        /// Headline found on the page itself, when one was present.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page_title: Option<String>,
    },
    Failure {
        candidate: Candidate,
        kind: ErrorKind,
        detail: String,
    },
}

impl FetchResult {
    pub fn candidate(&self) -> &Candidate {
        match self {
            Self::Success { candidate, .. } | Self::Failure { candidate, .. } => candidate,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

// ---------------------------------------------------------------------------
// AggregatedContent
// ---------------------------------------------------------------------------

/// One extracted body, tagged with the candidate it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedEntry {
    pub candidate: Candidate,
    pub text: String,
}

/// Extracted texts of every successful fetch, in candidate rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedContent {
    entries: Vec<AggregatedEntry>,
    /// Successes dropped because an earlier candidate had identical text.
    duplicates: usize,
}

impl AggregatedContent {
    /// Collect all successes from `results`, preserving their order.
    ///
    /// Bodies whose normalized text hashes equal to an earlier body are
    /// dropped (syndicated copies of the same wire story).
    pub fn from_results(results: &[FetchResult]) -> Self {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        let mut duplicates = 0;

        for result in results {
            let FetchResult::Success {
                candidate,
                extracted_text,
                ..
            } = result
            else {
                continue;
            };

            if !seen.insert(content_hash(extracted_text)) {
                duplicates += 1;
                continue;
            }

            entries.push(AggregatedEntry {
                candidate: candidate.clone(),
                text: extracted_text.clone(),
            });
        }

        Self {
            entries,
            duplicates,
        }
    }

    pub fn entries(&self) -> &[AggregatedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// SHA-256 over whitespace-normalized, case-folded text.
fn content_hash(text: &str) -> String {
    let normalized = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Fetch statistics
// ---------------------------------------------------------------------------

/// A candidate that did not produce usable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFetch {
    pub candidate: Candidate,
    pub kind: ErrorKind,
    pub detail: String,
}

/// "N of M candidates failed" bookkeeping for the display layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub duplicates: usize,
    pub failed: Vec<FailedFetch>,
}

impl FetchStats {
    pub fn from_results(results: &[FetchResult], aggregated: &AggregatedContent) -> Self {
        let failed: Vec<FailedFetch> = results
            .iter()
            .filter_map(|r| match r {
                FetchResult::Failure {
                    candidate,
                    kind,
                    detail,
                } => Some(FailedFetch {
                    candidate: candidate.clone(),
                    kind: *kind,
                    detail: detail.clone(),
                }),
                FetchResult::Success { .. } => None,
            })
            .collect();

        Self {
            attempted: results.len(),
            succeeded: results.len() - failed.len(),
            duplicates: aggregated.duplicates(),
            failed,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Terminal artifact handed to the document renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub seed: SeedRef,
    pub keywords: Vec<String>,
    pub summary_text: String,
    pub conclusion_text: String,
    /// Candidates whose text entered the summary, in rank order.
    pub sources: Vec<Candidate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(rank: usize) -> Candidate {
        Candidate {
            url: format!("https://news.example.com/{rank}"),
            title: format!("Story {rank}"),
            source_rank: rank,
            published_at: None,
        }
    }

    fn success(rank: usize, text: &str) -> FetchResult {
        FetchResult::Success {
            candidate: candidate(rank),
            extracted_text: text.into(),
            page_title: None,
        }
    }

    fn failure(rank: usize) -> FetchResult {
        FetchResult::Failure {
            candidate: candidate(rank),
            kind: ErrorKind::Network,
            detail: "connection refused".into(),
        }
    }

    #[test]
    fn keyword_set_dedupes_and_truncates() {
        let set = KeywordSet::bounded(["Rates", " rates ", "", "Inflation", "Fed", "Jobs"], 3);
        assert_eq!(set.as_slice(), ["Rates", "Inflation", "Fed"]);
    }

    #[test]
    fn keyword_set_zero_max_is_empty() {
        let set = KeywordSet::bounded(["a", "b"], 0);
        assert!(set.is_empty());
    }

    #[test]
    fn aggregated_keeps_successes_in_order() {
        let results = vec![success(0, "alpha"), failure(1), success(2, "gamma")];
        let agg = AggregatedContent::from_results(&results);
        let ranks: Vec<_> = agg.entries().iter().map(|e| e.candidate.source_rank).collect();
        assert_eq!(ranks, vec![0, 2]);
        assert_eq!(agg.duplicates(), 0);
    }

    #[test]
    fn aggregated_drops_duplicate_bodies() {
        let results = vec![
            success(0, "Same   wire story"),
            success(1, "same wire story"),
            success(2, "different"),
        ];
        let agg = AggregatedContent::from_results(&results);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.duplicates(), 1);
        assert_eq!(agg.entries()[0].candidate.source_rank, 0);
    }

    #[test]
    fn fetch_stats_counts_failures() {
        let results = vec![success(0, "a"), failure(1), success(2, "a")];
        let agg = AggregatedContent::from_results(&results);
        let stats = FetchStats::from_results(&results, &agg);
        assert_eq!(stats.attempted, 3);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed_count(), 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.failed[0].candidate.source_rank, 1);
    }

    #[test]
    fn fetch_result_serializes_tagged() {
        let json = serde_json::to_string(&failure(3)).expect("serialize");
        assert!(json.contains(r#""status":"failure""#));
        assert!(json.contains(r#""kind":"network""#));
    }
}
