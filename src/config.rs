//! # Global runner configuration.
//!
//! Provides [`RunnerConfig`] — the runner-wide defaults that per-task
//! configuration falls back to at launch time.
//!
//! Config is used in two ways:
//! 1. **Runner creation**: `Runner::new(config)` / `Runner::builder(config)`
//! 2. **Per-task resolution**: `TaskConfig::resolve(&config)` merges unset
//!    per-task fields with these defaults.
//!
//! ## Sentinel values
//! - `timeout = 0s` → no timeout (treated as `None` by resolution)
//! - `bus_capacity` is clamped to a minimum of 1

use std::time::Duration;

use crate::policies::RetryPolicy;

/// Global configuration for a runner instance.
///
/// ## Field semantics
/// - `timeout`: default per-task timeout (`0s` = no timeout)
/// - `retry_enabled`: whether failed tasks retry by default
/// - `retry`: default retry policy (attempt cap + backoff)
/// - `heartbeat`: interval between progress events for in-flight tasks
/// - `bus_capacity`: bounded capacity of the internal event channel; full
///   channels apply backpressure to publishers, events are never dropped
/// - `verbose`: raise per-event logging from debug to info
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Default per-task timeout. `Duration::ZERO` means no timeout.
    pub timeout: Duration,

    /// Whether tasks retry on failure when they don't say otherwise.
    pub retry_enabled: bool,

    /// Default retry policy, used when a task enables retries without
    /// supplying its own policy.
    pub retry: RetryPolicy,

    /// Interval between heartbeat events for tasks that are still running.
    ///
    /// The first heartbeat of a task fires one full interval after launch.
    pub heartbeat: Duration,

    /// Capacity of the internal event channel (min 1, enforced).
    pub bus_capacity: usize,

    /// Log every lifecycle event at info level instead of debug.
    pub verbose: bool,
}

impl RunnerConfig {
    /// Returns the default per-task timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → timeout applied per attempt
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns the event channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for RunnerConfig {
    /// Default configuration:
    ///
    /// - `timeout = 0s` (no timeout)
    /// - `retry_enabled = false`
    /// - `retry = RetryPolicy::default()` (3 attempts, constant 100ms delay)
    /// - `heartbeat = 5s`
    /// - `bus_capacity = 256`
    /// - `verbose = false`
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            retry_enabled: false,
            retry: RetryPolicy::default(),
            heartbeat: Duration::from_secs(5),
            bus_capacity: 256,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_means_none() {
        let cfg = RunnerConfig::default();
        assert_eq!(cfg.default_timeout(), None);

        let cfg = RunnerConfig {
            timeout: Duration::from_secs(3),
            ..RunnerConfig::default()
        };
        assert_eq!(cfg.default_timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn bus_capacity_clamped_to_one() {
        let cfg = RunnerConfig {
            bus_capacity: 0,
            ..RunnerConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
