use std::time::Duration;

/// First retry delay of the stats fetcher
pub const BASE_DELAY_MS: u64 = 1000;
/// Upper bound on the exponential part of the delay
pub const MAX_DELAY_MS: u64 = 5000;
/// Jitter is drawn uniformly from `0..MAX_JITTER_MS`
pub const MAX_JITTER_MS: u64 = 250;

/// Exponential backoff with a cap and additive jitter.
///
/// The delay after attempt `n` (1-based) is
/// `min(base * 2^(n-1), max) + uniform(0..jitter)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Maximum delay before jitter is added
    pub max_delay: Duration,
    /// Exclusive upper bound on the random offset
    pub max_jitter: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(BASE_DELAY_MS),
            max_delay: Duration::from_millis(MAX_DELAY_MS),
            max_jitter: Duration::from_millis(MAX_JITTER_MS),
        }
    }
}

impl Backoff {
    /// Backoff without a random component
    pub fn without_jitter(mut self) -> Self {
        self.max_jitter = Duration::ZERO;
        self
    }

    /// Capped exponential delay for a given attempt, before jitter
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.max(1) - 1);
        std::cmp::min(self.base_delay.saturating_mul(factor), self.max_delay)
    }

    /// Delay to wait after `attempt` failed, jitter included
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(fastrand::u64(0..jitter_ms))
        };
        self.base_delay_for(attempt) + jitter
    }
}
