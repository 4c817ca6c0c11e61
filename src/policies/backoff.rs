//! # Backoff policy for retry delays.
//!
//! [`BackoffPolicy`] controls how delays grow between failed attempts:
//! - [`BackoffPolicy::first`] — the initial delay;
//! - [`BackoffPolicy::factor`] — the multiplicative growth factor;
//! - [`BackoffPolicy::max`] — the delay cap.
//!
//! The delay for retry `n` (0-indexed) is `first × factor^n`, clamped to
//! `max`, with jitter applied last. The base delay is derived purely from
//! the retry index, so jitter output never feeds back into subsequent
//! delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskfan::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(100));
//! assert_eq!(backoff.next(1), Duration::from_millis(200));
//! // 100ms × 2^10 exceeds the cap.
//! assert_eq!(backoff.next(10), Duration::from_secs(10));
//! ```

use std::time::Duration;

use crate::error::RunnerError;
use crate::policies::jitter::JitterPolicy;

/// Retry backoff policy: initial delay, growth factor, cap, jitter.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Initial delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter policy applied to the computed delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a constant-delay policy: `first = 100ms`, `max = 30s`,
    /// `factor = 1.0`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given retry index (0-indexed).
    ///
    /// The base delay is `first × factor^retry`, clamped to
    /// [`BackoffPolicy::max`]. Jitter is applied to the clamped base; the
    /// jittered result is never fed back into later calculations.
    pub fn next(&self, retry: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = retry.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs
        {
            self.max
        } else {
            Duration::from_secs_f64(unclamped_secs)
        };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }

    /// Validates the policy parameters.
    ///
    /// A non-finite or negative growth factor is a programming error and is
    /// rejected before any task is launched.
    pub fn validate(&self) -> Result<(), RunnerError> {
        if !self.factor.is_finite() || self.factor < 0.0 {
            return Err(RunnerError::InvalidBackoff {
                factor: self.factor,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn policy(first_ms: u64, max_s: u64, factor: f64, jitter: JitterPolicy) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_secs(max_s),
            factor,
            jitter,
        }
    }

    #[test]
    fn retry_zero_returns_first() {
        let p = policy(100, 30, 2.0, JitterPolicy::None);
        assert_eq!(p.next(0), Duration::from_millis(100));
    }

    #[test]
    fn exponential_growth_no_jitter() {
        let p = policy(100, 30, 2.0, JitterPolicy::None);
        assert_eq!(p.next(1), Duration::from_millis(200));
        assert_eq!(p.next(2), Duration::from_millis(400));
        assert_eq!(p.next(3), Duration::from_millis(800));
    }

    #[test]
    fn constant_factor_keeps_delay_flat() {
        let p = policy(500, 30, 1.0, JitterPolicy::None);
        for retry in 0..10 {
            assert_eq!(p.next(retry), Duration::from_millis(500));
        }
    }

    #[test]
    fn clamped_to_max() {
        let p = policy(100, 1, 2.0, JitterPolicy::None);
        assert_eq!(p.next(10), Duration::from_secs(1));
    }

    #[test]
    fn first_exceeding_max_is_clamped() {
        let p = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(p.next(0), Duration::from_secs(5));
    }

    #[test]
    fn huge_retry_index_clamps_to_max() {
        let p = policy(100, 60, 2.0, JitterPolicy::None);
        assert_eq!(p.next(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn full_jitter_stays_within_base() {
        let p = policy(1000, 30, 1.0, JitterPolicy::Full);
        for retry in 0..50 {
            assert!(p.next(retry) <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn equal_jitter_keeps_at_least_half() {
        let p = policy(1000, 30, 1.0, JitterPolicy::Equal);
        for retry in 0..50 {
            let d = p.next(retry);
            assert!(d >= Duration::from_millis(500));
            assert!(d <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn negative_factor_is_rejected() {
        let p = policy(100, 30, -1.0, JitterPolicy::None);
        assert_eq!(
            p.validate(),
            Err(RunnerError::InvalidBackoff { factor: -1.0 })
        );
    }

    #[test]
    fn nan_factor_is_rejected() {
        let p = policy(100, 30, f64::NAN, JitterPolicy::None);
        assert!(p.validate().is_err());
    }
}
