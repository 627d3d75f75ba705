//! Shared types, error model, and configuration for NewsBrief.
//!
//! This crate is the foundation depended on by all other NewsBrief crates.
//! It provides:
//! - [`NewsBriefError`] / [`ErrorKind`]: the unified error taxonomy
//! - Domain types ([`SeedArticle`], [`KeywordSet`], [`Candidate`], [`FetchResult`],
//!   [`AggregatedContent`], [`Report`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DateWindow, FetchSection, LlmSection, PipelineConfig, PipelineSection, QueryMode,
    SearchSection, config_dir, config_file_path, init_config, load_config, load_config_from,
    validate_config, validate_credentials,
};
pub use error::{ErrorKind, NewsBriefError, Result};
pub use types::{
    AggregatedContent, AggregatedEntry, Candidate, FailedFetch, FetchResult, FetchStats,
    KeywordSet, Report, SeedArticle, SeedRef,
};
