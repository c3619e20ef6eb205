//! Back-off strategies applied between attempts.

use std::time::Duration;

/// Default number of attempts, including the first one.
pub const MAX_RETRIES: u32 = 3;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Computes the pause after a failed attempt.
///
/// `attempt` is the 1-based number of the attempt that just failed.
pub trait Backoff: Send + Sync + std::fmt::Debug {
    /// Delay before the next attempt.
    fn delay(&self, attempt: u32) -> Duration;
}

/// The same delay after every failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    /// Creates a fixed back-off.
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY)
    }
}

impl Backoff for FixedBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

/// Doubling delay starting at `base`, capped at `max`. No jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
}

impl ExponentialBackoff {
    /// Creates an exponential back-off.
    ///
    /// A zero `max` means "no larger than `base`".
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: if max.is_zero() { base } else { max.max(base) },
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY, Duration::from_secs(30))
    }
}

impl Backoff for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let base_ms = u64::try_from(self.base.as_millis()).unwrap_or(u64::MAX);
        let delay_ms = base_ms.saturating_mul(1_u64 << exponent);
        let max_ms = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(delay_ms.min(max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_backoff_ignores_attempt_number() {
        let backoff = FixedBackoff::default();
        assert_eq!(backoff.delay(1), Duration::from_secs(1));
        assert_eq!(backoff.delay(7), Duration::from_secs(1));
    }

    #[test]
    fn exponential_backoff_doubles_until_capped() {
        let backoff =
            ExponentialBackoff::new(Duration::from_millis(250), Duration::from_millis(1500));
        assert_eq!(backoff.delay(1), Duration::from_millis(250));
        assert_eq!(backoff.delay(2), Duration::from_millis(500));
        assert_eq!(backoff.delay(3), Duration::from_millis(1000));
        assert_eq!(backoff.delay(4), Duration::from_millis(1500));
        assert_eq!(backoff.delay(40), Duration::from_millis(1500));
    }

    #[test]
    fn exponential_backoff_zero_max_means_base() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(100), Duration::ZERO);
        assert_eq!(backoff.delay(5), Duration::from_millis(100));
    }
}
