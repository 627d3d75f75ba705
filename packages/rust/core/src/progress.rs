//! Progress events emitted by the pipeline.
//!
//! The pipeline never renders anything itself. It pushes [`ProgressEvent`]s
//! into an injected [`ProgressSink`]; the display layer decides what to show.

use newsbrief_crawler::FetchObserver;
use newsbrief_shared::{ErrorKind, FetchResult};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::state::PipelineState;

/// One entry in the ordered progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub stage: PipelineState,
    pub detail: ProgressDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressDetail {
    /// The run moved into `stage`.
    Entered,
    SeedLoaded { title: String, chars: usize },
    KeywordsDerived { keywords: Vec<String> },
    CandidatesCollected { count: usize },
    /// One candidate reached a terminal fetch result.
    CandidateFetched {
        completed: usize,
        total: usize,
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        failure: Option<ErrorKind>,
    },
    ContentAggregated { entries: usize, duplicates: usize },
    Finished { sources: usize, failed: usize, attempted: usize },
    Aborted { kind: ErrorKind, reason: String },
}

/// Receiver of pipeline progress.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards every event.
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Forwards events into an unbounded channel.
///
/// Events sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

/// Adapts a [`ProgressSink`] to the fetch pool's observer hook.
pub(crate) struct FetchProgress<'a> {
    pub(crate) sink: &'a dyn ProgressSink,
}

impl FetchObserver for FetchProgress<'_> {
    fn on_result(&self, completed: usize, total: usize, result: &FetchResult) {
        let failure = match result {
            FetchResult::Success { .. } => None,
            FetchResult::Failure { kind, .. } => Some(*kind),
        };
        self.sink.emit(ProgressEvent {
            stage: PipelineState::FetchingPending,
            detail: ProgressDetail::CandidateFetched {
                completed,
                total,
                url: result.candidate().url.clone(),
                failure,
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsbrief_shared::Candidate;

    fn candidate() -> Candidate {
        Candidate {
            url: "https://a.com/1".into(),
            title: "A".into(),
            source_rank: 0,
            published_at: None,
        }
    }

    #[tokio::test]
    async fn channel_sink_preserves_order() {
        let (sink, mut rx) = ChannelProgress::new();
        sink.emit(ProgressEvent {
            stage: PipelineState::KeywordsPending,
            detail: ProgressDetail::Entered,
        });
        sink.emit(ProgressEvent {
            stage: PipelineState::CandidatesPending,
            detail: ProgressDetail::Entered,
        });
        drop(sink);

        assert_eq!(rx.recv().await.map(|e| e.stage), Some(PipelineState::KeywordsPending));
        assert_eq!(rx.recv().await.map(|e| e.stage), Some(PipelineState::CandidatesPending));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn channel_sink_tolerates_dropped_receiver() {
        let (sink, rx) = ChannelProgress::new();
        drop(rx);
        sink.emit(ProgressEvent {
            stage: PipelineState::Done,
            detail: ProgressDetail::Entered,
        });
    }

    #[tokio::test]
    async fn fetch_adapter_reports_failure_kind() {
        let (sink, mut rx) = ChannelProgress::new();
        let adapter = FetchProgress { sink: &sink };

        adapter.on_result(
            1,
            2,
            &FetchResult::Failure {
                candidate: candidate(),
                kind: ErrorKind::Network,
                detail: "timed out".into(),
            },
        );

        let event = rx.recv().await.expect("event");
        assert_eq!(event.stage, PipelineState::FetchingPending);
        assert_eq!(
            event.detail,
            ProgressDetail::CandidateFetched {
                completed: 1,
                total: 2,
                url: "https://a.com/1".into(),
                failure: Some(ErrorKind::Network),
            }
        );
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = ProgressEvent {
            stage: PipelineState::CandidatesPending,
            detail: ProgressDetail::CandidatesCollected { count: 4 },
        };
        let json = serde_json::to_value(&event).expect("json");
        assert_eq!(json["detail"]["event"], "candidates_collected");
        assert_eq!(json["detail"]["count"], 4);
        assert_eq!(json["stage"]["state"], "candidates_pending");
    }
}
