use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

/// Backoff policy for optimistic-lock conflicts
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    max_retries: u32,
    initial_interval: Duration,
    max_interval: Duration,
}

impl RetryStrategy {
    pub fn new(max_retries: u32) -> Self {
        Self::with_intervals(max_retries, Duration::from_millis(10), Duration::from_secs(1))
    }

    pub fn with_intervals(max_retries: u32, initial_interval: Duration, max_interval: Duration) -> Self {
        Self {
            max_retries,
            initial_interval,
            max_interval: max_interval.max(initial_interval),
        }
    }

    /// Jittered exponential backoff; the retry count, not elapsed time,
    /// bounds the attempts.
    pub fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_multiplier(2.0)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Whether another attempt is allowed after `retries_done` retries
    pub fn should_retry(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }
}
