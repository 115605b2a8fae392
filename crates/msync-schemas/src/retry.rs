use std::time::Duration;

/// What a single HTTP attempt ended with, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Response received with this status code.
    Status(u16),
    /// Connect/timeout/body failure; no usable status.
    Transport,
}

/// Retry schedule for read requests against remote indexes.
///
/// The submitter only consults the 429 arm; its writes are never resent
/// after a 5xx or a transport failure.
///
/// - 429 waits `base * 2^attempt`
/// - 5xx and transport failures wait `base * (attempt + 1)`
/// - other 4xx are not retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Same schedule without sleeping; for tests against local mocks.
    pub fn no_delay() -> Self {
        Self {
            base_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay before the next attempt, or `None` to give up.
    ///
    /// `attempt` is zero-based: the attempt that just failed.
    pub fn backoff(&self, attempt: u32, outcome: RetryOutcome) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }
        match outcome {
            RetryOutcome::Status(429) => Some(self.base_delay * 2u32.saturating_pow(attempt)),
            RetryOutcome::Status(code) if code >= 500 => Some(self.base_delay * (attempt + 1)),
            RetryOutcome::Status(_) => None,
            RetryOutcome::Transport => Some(self.base_delay * (attempt + 1)),
        }
    }
}
