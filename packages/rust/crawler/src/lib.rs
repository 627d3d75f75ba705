//! Concurrent article fetching.
//!
//! This crate provides:
//! - [`PageFetcher`] / [`ReqwestFetcher`]: single-attempt HTTP fetch with a timeout
//! - [`RetryPolicy`]: exponential backoff with jitter
//! - [`FetchPool`]: bounded-parallel fetch + extract with per-candidate fault isolation

pub mod fetcher;
pub mod pool;
pub mod retry;

pub use fetcher::{PageFetcher, ReqwestFetcher};
pub use pool::{FetchObserver, FetchPool, NoopObserver, PoolOptions};
pub use retry::RetryPolicy;
