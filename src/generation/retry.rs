//! Bounded exponential backoff for transient generation failures.

use crate::error::GenerationError;
use std::time::Duration;

/// Service error codes worth another attempt
const TRANSIENT_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per unit, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(8000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Single attempt, no backoff.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn is_transient(err: &GenerationError) -> bool {
        match err {
            GenerationError::RateLimited(_) => true,
            GenerationError::ServiceError { code, .. } => TRANSIENT_STATUS_CODES.contains(code),
            GenerationError::Timeout(_) | GenerationError::EmptyResponse => false,
        }
    }

    /// Whether the attempt numbered `attempt` (1-based) that failed with `err` gets a successor.
    pub fn should_retry(&self, attempt: u32, err: &GenerationError) -> bool {
        attempt < self.max_attempts && Self::is_transient(err)
    }

    /// Wait after failed attempt `attempt`: `min(base * 2^(attempt-1), max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}
