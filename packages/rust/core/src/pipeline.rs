//! End-to-end briefing pipeline.
//!
//! `seed → keywords → candidates → concurrent fetch → summary → report`.
//! Stages run strictly in order; only the fetch stage fans out.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use newsbrief_crawler::{FetchPool, PageFetcher, PoolOptions};
use newsbrief_llm::{CompletionClient, KeywordExtractor, Summarizer};
use newsbrief_search::{CandidateCollector, SearchProvider};
use newsbrief_shared::{
    AggregatedContent, FetchStats, KeywordSet, NewsBriefError, PipelineConfig, Report, Result,
};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::progress::{FetchProgress, ProgressDetail, ProgressEvent, ProgressSink};
use crate::seed::{SeedInput, load_seed};
use crate::state::{Aborted, PipelineState};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// External services the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub completion: Arc<dyn CompletionClient>,
    pub search: Arc<dyn SearchProvider>,
    pub fetcher: Arc<dyn PageFetcher>,
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub run_id: Uuid,
    pub report: Report,
    pub keywords: KeywordSet,
    pub stats: FetchStats,
    pub elapsed_ms: u64,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct Pipeline {
    config: PipelineConfig,
    fetcher: Arc<dyn PageFetcher>,
    keywords: KeywordExtractor,
    collector: CandidateCollector,
    pool: FetchPool,
    summarizer: Summarizer,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            completion,
            search,
            fetcher,
        } = collaborators;

        let keywords = KeywordExtractor::new(Arc::clone(&completion), config.keyword_max_tokens)
            .with_fallback_prompt(config.keyword_fallback_prompt);
        let collector = CandidateCollector::new(search)
            .with_query_mode(config.query_mode)
            .with_date_window(config.date_window);
        let pool = FetchPool::new(Arc::clone(&fetcher), PoolOptions::from(config));
        let summarizer = Summarizer::new(
            completion,
            config.summary_input_budget,
            config.summary_max_chars,
            config.summary_max_tokens,
        );

        Self {
            config: config.clone(),
            fetcher,
            keywords,
            collector,
            pool,
            summarizer,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels every run of this pipeline, current and future.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the whole pipeline for one seed.
    ///
    /// Individual fetch failures never abort the run; they are reported in
    /// [`RunOutput::stats`]. Keyword, search and summarizer failures do, as
    /// does cancellation or the run deadline.
    #[instrument(skip_all, fields(seed = %seed.url()))]
    pub async fn run(
        &self,
        seed: SeedInput,
        sink: &dyn ProgressSink,
    ) -> std::result::Result<RunOutput, Aborted> {
        let run_id = Uuid::now_v7();
        let started = Instant::now();
        let cancel = self.cancel.child_token();
        let _deadline = Deadline::arm(self.config.run_timeout, &cancel);
        let mut run = Transitions::new(sink);

        info!(%run_id, "starting pipeline run");

        // 1. Seed + keywords
        run.advance(PipelineState::KeywordsPending);
        let seed = guarded(
            &cancel,
            load_seed(seed, self.fetcher.as_ref(), self.config.fetch_timeout),
        )
        .await
        .map_err(|e| run.abort(e, None))?;
        run.emit(ProgressDetail::SeedLoaded {
            title: seed.title.clone(),
            chars: seed.extracted_text.chars().count(),
        });

        let keywords = guarded(
            &cancel,
            self.keywords
                .derive(&seed.title, &seed.extracted_text, self.config.max_keywords),
        )
        .await
        .map_err(|e| run.abort(e, None))?;
        run.emit(ProgressDetail::KeywordsDerived {
            keywords: keywords.as_slice().to_vec(),
        });

        // 2. Candidates
        run.advance(PipelineState::CandidatesPending);
        let candidates = guarded(
            &cancel,
            self.collector.collect(&keywords, self.config.max_candidates),
        )
        .await
        .map_err(|e| run.abort(e, None))?;
        run.emit(ProgressDetail::CandidatesCollected {
            count: candidates.len(),
        });

        // 3. Fetch
        run.advance(PipelineState::FetchingPending);
        let results = self
            .pool
            .run(candidates, &cancel, &FetchProgress { sink })
            .await;
        let aggregated = AggregatedContent::from_results(&results);
        let stats = FetchStats::from_results(&results, &aggregated);
        info!(
            attempted = stats.attempted,
            succeeded = stats.succeeded,
            failed = stats.failed_count(),
            duplicates = stats.duplicates,
            "fetch stage complete"
        );
        run.emit(ProgressDetail::ContentAggregated {
            entries: aggregated.len(),
            duplicates: aggregated.duplicates(),
        });

        if cancel.is_cancelled() {
            return Err(run.abort(NewsBriefError::Cancelled, Some(aggregated)));
        }

        // 4. Summarize
        run.advance(PipelineState::SummarizingPending);
        let outcome = guarded(&cancel, self.summarizer.summarize(&aggregated)).await;
        let summary = match outcome {
            Ok(summary) => summary,
            Err(e) => return Err(run.abort(e, Some(aggregated))),
        };

        let report = Report {
            seed: seed.reference(),
            keywords: keywords.as_slice().to_vec(),
            summary_text: summary.summary_text,
            conclusion_text: summary.conclusion_text,
            sources: summary.sources,
        };

        run.advance(PipelineState::Done);
        run.emit(ProgressDetail::Finished {
            sources: report.sources.len(),
            failed: stats.failed_count(),
            attempted: stats.attempted,
        });

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(%run_id, sources = report.sources.len(), elapsed_ms, "pipeline run complete");

        Ok(RunOutput {
            run_id,
            report,
            keywords,
            stats,
            elapsed_ms,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Tracks the current state and mirrors every change into the sink.
struct Transitions<'a> {
    state: PipelineState,
    sink: &'a dyn ProgressSink,
}

impl<'a> Transitions<'a> {
    fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            state: PipelineState::Idle,
            sink,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        self.state = next;
        info!(stage = %next, "stage entered");
        self.emit(ProgressDetail::Entered);
    }

    fn emit(&self, detail: ProgressDetail) {
        self.sink.emit(ProgressEvent {
            stage: self.state,
            detail,
        });
    }

    fn abort(&mut self, source: NewsBriefError, retained: Option<AggregatedContent>) -> Aborted {
        let stage = self.state;
        let kind = source.kind();
        warn!(%stage, %kind, error = %source, "pipeline aborted");

        self.state = PipelineState::Aborted(kind);
        self.emit(ProgressDetail::Aborted {
            kind,
            reason: source.to_string(),
        });

        Aborted {
            stage,
            source,
            retained,
        }
    }
}

/// Race `work` against cancellation.
async fn guarded<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(NewsBriefError::Cancelled),
        result = work => result,
    }
}

/// Cancels a run's token once its deadline passes. Disarmed on drop.
struct Deadline(Option<JoinHandle<()>>);

impl Deadline {
    fn arm(limit: Option<Duration>, cancel: &CancellationToken) -> Self {
        let handle = limit.map(|limit| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                warn!(timeout_ms = limit.as_millis() as u64, "run deadline reached");
                cancel.cancel();
            })
        });
        if let Some(limit) = limit {
            debug!(timeout_ms = limit.as_millis() as u64, "run deadline armed");
        }
        Self(handle)
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}
