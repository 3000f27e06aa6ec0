//! Retry policy with exponential backoff and bounded jitter.

use std::time::Duration;

use rand::Rng;

/// Upper bound applied to any single computed delay.
pub const MAX_DELAY: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per endpoint before moving to the next one.
    pub max_retries: u32,
    /// Growth base: the deterministic delay after attempt `n` is
    /// `base_backoff` (in seconds) raised to the power `n`.
    pub base_backoff: Duration,
    /// Exclusive upper bound of the uniform random jitter.
    pub jitter_ceiling: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(1500),
            jitter_ceiling: Duration::from_millis(400),
        }
    }
}

impl RetryPolicy {
    /// Deterministic part of the delay after `attempt` (1-based).
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.base_backoff.as_secs_f64().powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_DELAY)
            .min(MAX_DELAY)
    }

    /// Full delay after `attempt`: `base_delay(attempt)` plus jitter
    /// drawn uniformly from `[0, jitter_ceiling)`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay(attempt) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let ceiling = self.jitter_ceiling.as_secs_f64();
        if ceiling <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(rand::rng().random_range(0.0..ceiling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_delay_grows_with_attempts() {
        let policy = RetryPolicy::default();
        let delays: Vec<Duration> = (1..=6).map(|a| policy.base_delay(a)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(policy.base_delay(1), Duration::from_millis(1500));
        assert_eq!(policy.base_delay(2), Duration::from_millis(2250));
    }

    #[test]
    fn jitter_stays_below_ceiling() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_backoff: Duration::from_secs(2),
            jitter_ceiling: Duration::from_millis(300),
        };
        for _ in 0..200 {
            let delay = policy.delay(1);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay < Duration::from_millis(2300));
        }
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let policy = RetryPolicy {
            max_retries: 1,
            base_backoff: Duration::from_secs(1),
            jitter_ceiling: Duration::ZERO,
        };
        assert_eq!(policy.delay(5), Duration::from_secs(1));
    }

    #[test]
    fn huge_attempt_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay(10_000), MAX_DELAY);
    }
}
