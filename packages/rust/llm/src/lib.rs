//! Language-model stages: keyword derivation and summarization.
//!
//! Both stages talk to a [`CompletionClient`]; [`OpenAiClient`] is the
//! production implementation for OpenAI-compatible chat endpoints.

pub mod client;
pub mod keywords;
pub mod summarize;

pub use client::{CompletionClient, OpenAiClient, Prompt};
pub use keywords::{KeywordExtractor, parse_keywords};
pub use summarize::{Summarizer, Summary, SummaryInput, build_input, parse_summary};
