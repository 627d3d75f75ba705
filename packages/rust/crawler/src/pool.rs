//! Bounded-parallel fetch + extract over a candidate list.
//!
//! Every candidate reaches exactly one terminal [`FetchResult`]; a failing
//! candidate never affects its siblings. Results come back in input order
//! regardless of completion order.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use newsbrief_shared::{
    Candidate, ErrorKind, FetchResult, NewsBriefError, PipelineConfig, Result,
};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::fetcher::PageFetcher;
use crate::retry::RetryPolicy;

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Receives one notification per terminal fetch result, in completion order.
pub trait FetchObserver: Send + Sync {
    /// `completed` counts results so far (1-based) out of `total`.
    fn on_result(&self, completed: usize, total: usize, result: &FetchResult);
}

/// Observer that ignores every notification.
pub struct NoopObserver;

impl FetchObserver for NoopObserver {
    fn on_result(&self, _completed: usize, _total: usize, _result: &FetchResult) {}
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Knobs for [`FetchPool`].
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Maximum in-flight fetches.
    pub concurrency: usize,
    /// Per-attempt timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Extracted text shorter than this (in chars) is an `EmptyContent` failure.
    pub min_content_chars: usize,
}

impl From<&PipelineConfig> for PoolOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            concurrency: config.fetch_concurrency,
            timeout: config.fetch_timeout,
            retry: RetryPolicy::from(config),
            min_content_chars: config.min_content_chars,
        }
    }
}

// ---------------------------------------------------------------------------
// FetchPool
// ---------------------------------------------------------------------------

/// Fetches and extracts every candidate with a fixed concurrency ceiling.
#[derive(Clone)]
pub struct FetchPool {
    fetcher: Arc<dyn PageFetcher>,
    options: PoolOptions,
}

impl FetchPool {
    pub fn new(fetcher: Arc<dyn PageFetcher>, options: PoolOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Fetch all candidates and return one result per candidate, in input order.
    ///
    /// Returns only after every candidate has a terminal result. Cancelling
    /// `cancel` turns pending and in-flight candidates into
    /// `Failure { kind: Cancelled }`.
    #[instrument(skip_all, fields(candidates = candidates.len(), concurrency = self.options.concurrency))]
    pub async fn run(
        &self,
        candidates: Vec<Candidate>,
        cancel: &CancellationToken,
        observer: &dyn FetchObserver,
    ) -> Vec<FetchResult> {
        let total = candidates.len();
        if total == 0 {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks = FuturesUnordered::new();

        for (index, candidate) in candidates.iter().cloned().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let options = self.options.clone();

            let handle = tokio::spawn(async move {
                fetch_candidate(fetcher.as_ref(), &semaphore, &cancel, &options, candidate).await
            });
            tasks.push(async move { (index, handle.await) });
        }

        let mut slots: Vec<Option<FetchResult>> = vec![None; total];
        let mut completed = 0;

        while let Some((index, joined)) = tasks.next().await {
            let result = joined.unwrap_or_else(|e| {
                warn!(url = %candidates[index].url, error = %e, "fetch task aborted");
                failure(
                    candidates[index].clone(),
                    ErrorKind::Network,
                    format!("fetch task aborted: {e}"),
                )
            });

            completed += 1;
            observer.on_result(completed, total, &result);
            slots[index] = Some(result);
        }

        let results: Vec<FetchResult> = slots
            .into_iter()
            .zip(candidates)
            .map(|(slot, candidate)| {
                slot.unwrap_or_else(|| {
                    failure(candidate, ErrorKind::Network, "fetch task lost".into())
                })
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        info!(
            total,
            succeeded,
            failed = total - succeeded,
            "fetch pool finished"
        );

        results
    }
}

// ---------------------------------------------------------------------------
// Per-candidate work
// ---------------------------------------------------------------------------

async fn fetch_candidate(
    fetcher: &dyn PageFetcher,
    semaphore: &Semaphore,
    cancel: &CancellationToken,
    options: &PoolOptions,
    candidate: Candidate,
) -> FetchResult {
    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return cancelled(candidate),
        permit = semaphore.acquire() => match permit {
            Ok(permit) => permit,
            Err(_) => return cancelled(candidate),
        },
    };

    let markup = match fetch_with_retry(fetcher, &candidate.url, options, cancel).await {
        Ok(markup) => markup,
        Err(e) => {
            debug!(url = %candidate.url, error = %e, "candidate failed");
            return failure(candidate, e.kind(), e.to_string());
        }
    };

    let article = newsbrief_extract::extract_article(&markup);
    let chars = article.text.chars().count();

    if chars < options.min_content_chars.max(1) {
        let e = NewsBriefError::EmptyContent {
            url: candidate.url.clone(),
            chars,
        };
        debug!(url = %candidate.url, chars, "extracted text below threshold");
        return failure(candidate, e.kind(), e.to_string());
    }

    debug!(url = %candidate.url, chars, "candidate fetched");

    FetchResult::Success {
        candidate,
        extracted_text: article.text,
        page_title: article.title,
    }
}

/// Fetch with retries on `Network` errors, observing cancellation during each
/// attempt and each backoff sleep.
async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    url: &str,
    options: &PoolOptions,
    cancel: &CancellationToken,
) -> Result<String> {
    let mut retry = 0;

    loop {
        let attempt = tokio::time::timeout(options.timeout, fetcher.fetch(url, options.timeout));
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(NewsBriefError::Cancelled),
            outcome = attempt => outcome.unwrap_or_else(|_| {
                Err(NewsBriefError::Network(format!(
                    "{url}: timed out after {}ms",
                    options.timeout.as_millis()
                )))
            }),
        };

        match outcome {
            Ok(markup) => return Ok(markup),
            Err(e) if e.kind() == ErrorKind::Network && retry < options.retry.retries => {
                let delay = options.retry.backoff(retry);
                retry += 1;
                warn!(
                    %url,
                    attempt = retry,
                    of = options.retry.attempts(),
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "fetch attempt failed, retrying"
                );

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(NewsBriefError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => return Err(e),
        }
    }
}

fn cancelled(candidate: Candidate) -> FetchResult {
    failure(
        candidate,
        ErrorKind::Cancelled,
        NewsBriefError::Cancelled.to_string(),
    )
}

fn failure(candidate: Candidate, kind: ErrorKind, detail: String) -> FetchResult {
    FetchResult::Failure {
        candidate,
        kind,
        detail,
    }
}
