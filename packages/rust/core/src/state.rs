//! Pipeline state machine.

use std::fmt;

use newsbrief_shared::{AggregatedContent, ErrorKind, NewsBriefError};
use serde::Serialize;

/// Linear run state. `Done` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "kind", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    KeywordsPending,
    CandidatesPending,
    FetchingPending,
    SummarizingPending,
    Done,
    Aborted(ErrorKind),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted(_))
    }

    /// Whether `next` is a legal transition from `self`.
    ///
    /// Forward steps follow the fixed order; `Aborted` is reachable from
    /// every non-terminal state.
    pub fn can_advance_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (s, Aborted(_)) => !s.is_terminal(),
            (Idle, KeywordsPending)
            | (KeywordsPending, CandidatesPending)
            | (CandidatesPending, FetchingPending)
            | (FetchingPending, SummarizingPending)
            | (SummarizingPending, Done) => true,
            _ => false,
        }
    }

    /// Short human-readable description of the work in this state.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::KeywordsPending => "extracting keywords",
            Self::CandidatesPending => "searching related articles",
            Self::FetchingPending => "fetching articles",
            Self::SummarizingPending => "summarizing",
            Self::Done => "done",
            Self::Aborted(_) => "aborted",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted(kind) => write!(f, "aborted ({kind})"),
            other => f.write_str(other.label()),
        }
    }
}

/// A run that ended before producing a report.
#[derive(Debug, thiserror::Error)]
#[error("run aborted while {stage}: {source}")]
pub struct Aborted {
    /// State the run was in when it failed.
    pub stage: PipelineState,
    #[source]
    pub source: NewsBriefError,
    /// Article text collected before the failure, when fetching had finished.
    pub retained: Option<AggregatedContent>,
}

impl Aborted {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_are_linear() {
        use PipelineState::*;
        let order = [
            Idle,
            KeywordsPending,
            CandidatesPending,
            FetchingPending,
            SummarizingPending,
            Done,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
        assert!(!Idle.can_advance_to(FetchingPending));
        assert!(!SummarizingPending.can_advance_to(KeywordsPending));
        assert!(!Done.can_advance_to(Idle));
    }

    #[test]
    fn aborted_reachable_only_from_non_terminal() {
        use PipelineState::*;
        let abort = Aborted(ErrorKind::Upstream);
        assert!(KeywordsPending.can_advance_to(abort));
        assert!(SummarizingPending.can_advance_to(abort));
        assert!(!Done.can_advance_to(abort));
        assert!(!abort.can_advance_to(Aborted(ErrorKind::Parse)));
    }

    #[test]
    fn aborted_error_reports_stage_and_kind() {
        let err = super::Aborted {
            stage: PipelineState::SummarizingPending,
            source: NewsBriefError::EmptyInput,
            retained: None,
        };
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
        assert!(err.to_string().starts_with("run aborted while summarizing"));
    }

    #[test]
    fn state_serializes_with_kind() {
        let json = serde_json::to_string(&PipelineState::Aborted(ErrorKind::Parse)).expect("json");
        assert_eq!(json, r#"{"state":"aborted","kind":"parse"}"#);
    }
}
