//! Pipeline orchestration for NewsBrief.
//!
//! This crate wires the extractor, search collector, fetch pool and
//! summarizer into a single run ([`Pipeline::run`]) and reports its progress
//! through a [`ProgressSink`].

pub mod pipeline;
pub mod progress;
pub mod seed;
pub mod state;

pub use pipeline::{Collaborators, Pipeline, RunOutput};
pub use progress::{ChannelProgress, ProgressDetail, ProgressEvent, ProgressSink, SilentProgress};
pub use seed::{SeedInput, load_seed};
pub use state::{Aborted, PipelineState};
