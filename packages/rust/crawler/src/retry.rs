//! Exponential backoff with jitter for fetch retries.

use std::time::Duration;

use newsbrief_shared::PipelineConfig;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    pub base: Duration,
    pub max: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, base: Duration, max: Duration) -> Self {
        Self { retries, base, max }
    }

    /// Total attempts including the first one.
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry` plus up
    /// to 50% random jitter, capped at `max`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = self.base.saturating_mul(2u32.saturating_pow(retry));
        let half_ms = (exp.as_millis() / 2).min(u64::MAX as u128) as u64;
        let jitter = if half_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=half_ms)
        };
        exp.saturating_add(Duration::from_millis(jitter)).min(self.max)
    }
}

impl From<&PipelineConfig> for RetryPolicy {
    fn from(config: &PipelineConfig) -> Self {
        Self::new(
            config.fetch_retry_count,
            config.backoff_base,
            config.backoff_max,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_stays_within_jitter_bounds() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(60));
        for retry in 0..3 {
            let floor = Duration::from_millis(100 * 2u64.pow(retry));
            let ceiling = floor + floor / 2;
            let delay = policy.backoff(retry);
            assert!(delay >= floor && delay <= ceiling, "retry {retry}: {delay:?}");
        }
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_millis(500), Duration::from_secs(2));
        assert_eq!(policy.backoff(8), Duration::from_secs(2));
        assert_eq!(policy.backoff(40), Duration::from_secs(2));
    }

    #[test]
    fn zero_base_means_no_delay() {
        let policy = RetryPolicy::new(2, Duration::ZERO, Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::ZERO);
        assert_eq!(policy.attempts(), 3);
    }

    #[test]
    fn built_from_pipeline_config() {
        let policy = RetryPolicy::from(&PipelineConfig::default());
        assert_eq!(policy.retries, 2);
        assert_eq!(policy.base, Duration::from_millis(500));
        assert_eq!(policy.max, Duration::from_millis(8000));
    }
}
