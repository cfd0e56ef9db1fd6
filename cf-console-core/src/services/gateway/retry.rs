//! Retry policy for gateway calls

use std::time::Duration;

use crate::config::GatewayConfig;
use crate::error::UpstreamError;

/// Maximum delay between two attempts
const MAX_BACKOFF_MS: u64 = 10_000;

/// When and how long to wait before another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retries
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            max_attempts: config.effective_attempts(),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether a failed `attempt` (0-based) may be followed by another.
    ///
    /// Only transport failures on non-mutating routes qualify; rejections are final.
    #[must_use]
    pub fn should_retry(&self, error: &UpstreamError, attempt: u32, mutating: bool) -> bool {
        !mutating && attempt + 1 < self.max_attempts && error.is_transport()
    }

    /// Exponential backoff: base, 2x base, 4x base, capped at 10 seconds.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let capped_attempt = attempt.min(20); // Prevent 2^attempt from overflowing
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(MAX_BACKOFF_MS);
        let delay_ms = base_ms.saturating_mul(1_u64 << capped_attempt);
        Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
