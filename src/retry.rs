//! Retry/backoff policy shared by discovery, responsiveness probes, and the
//! per-item apply loop, instead of scattering sleep constants through each.

use std::time::Duration;

/// How often to retry a failing operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub exponential: bool,
}

impl RetryPolicy {
    /// Fixed delay between attempts.
    pub const fn fixed(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            exponential: false,
        }
    }

    /// Delay doubles after each failed attempt.
    pub const fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            exponential: true,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (0-based), or
    /// `None` once the budget is exhausted.
    pub fn backoff(&self, attempt: u32) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }
        if self.exponential {
            Some(self.base_delay * 2u32.saturating_pow(attempt))
        } else {
            Some(self.base_delay)
        }
    }
}
