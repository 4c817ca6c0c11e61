//! # Per-task configuration and defaults resolution.
//!
//! [`TaskConfig`] overrides the runner-wide defaults for one task; any
//! unset field falls back to [`RunnerConfig`](crate::RunnerConfig) when the
//! task is about to launch. Resolution is a pure function producing an
//! [`EffectiveConfig`], and it is where misconfiguration (a malformed
//! retry or backoff policy) is rejected.
//!
//! ## Rules
//! - Resolution happens once per task, immediately before launch.
//! - `metadata` is carried through untouched; the runner itself never
//!   interprets it.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::policies::RetryPolicy;

/// Per-task override of timeout, retry behavior, and metadata.
///
/// All fields are optional; `None` means "use the runner default".
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use taskfan::{RetryPolicy, TaskConfig};
///
/// let cfg = TaskConfig::new()
///     .with_timeout(Duration::from_secs(3))
///     .with_retry_enabled(true)
///     .with_retry(RetryPolicy::new(5));
/// assert_eq!(cfg.timeout, Some(Duration::from_secs(3)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct TaskConfig {
    /// Per-task timeout; `None` falls back to the runner default.
    pub timeout: Option<Duration>,
    /// Whether this task retries on failure; `None` falls back.
    pub retry_enabled: Option<bool>,
    /// Retry policy used when retries are enabled; `None` falls back.
    pub retry: Option<RetryPolicy>,
    /// Arbitrary caller metadata, opaque to the runner.
    pub metadata: BTreeMap<String, Value>,
}

impl TaskConfig {
    /// Creates an empty config (every field falls back to runner defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new config with the given timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns a new config with retries switched on or off.
    pub fn with_retry_enabled(mut self, enabled: bool) -> Self {
        self.retry_enabled = Some(enabled);
        self
    }

    /// Returns a new config with the given retry policy.
    ///
    /// The policy only takes effect when retries are enabled (here or via
    /// the runner default).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Returns a new config with one metadata entry added.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Merges this config with runner-wide defaults into an
    /// [`EffectiveConfig`].
    ///
    /// Pure function; validates the effective retry policy and surfaces
    /// [`RunnerError`] for misconfiguration.
    pub fn resolve(&self, defaults: &RunnerConfig) -> Result<EffectiveConfig, RunnerError> {
        let retry = self.retry.unwrap_or(defaults.retry);
        retry.validate()?;

        Ok(EffectiveConfig {
            timeout: self.timeout.or_else(|| defaults.default_timeout()),
            retry_enabled: self.retry_enabled.unwrap_or(defaults.retry_enabled),
            retry,
            metadata: self.metadata.clone(),
        })
    }
}

/// A [`TaskConfig`] after runner defaults have been merged in.
///
/// Every field is concrete; this is what the supervision loop executes
/// against.
#[derive(Clone, Debug)]
pub struct EffectiveConfig {
    /// Timeout boundary for each attempt; `None` = unbounded.
    pub timeout: Option<Duration>,
    /// Whether failed attempts are retried.
    pub retry_enabled: bool,
    /// Retry policy in force when `retry_enabled` is true.
    pub retry: RetryPolicy,
    /// Caller metadata carried through from the task config.
    pub metadata: BTreeMap<String, Value>,
}

impl EffectiveConfig {
    /// Total attempt cap for the task: the policy's cap when retries are
    /// enabled, otherwise exactly one attempt.
    pub fn max_attempts(&self) -> u32 {
        if self.retry_enabled {
            self.retry.max_attempts
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_fields_fall_back_to_defaults() {
        let defaults = RunnerConfig {
            timeout: Duration::from_secs(7),
            retry_enabled: true,
            ..RunnerConfig::default()
        };
        let eff = TaskConfig::new().resolve(&defaults).unwrap();
        assert_eq!(eff.timeout, Some(Duration::from_secs(7)));
        assert!(eff.retry_enabled);
        assert_eq!(eff.retry.max_attempts, defaults.retry.max_attempts);
    }

    #[test]
    fn set_fields_override_defaults() {
        let defaults = RunnerConfig {
            timeout: Duration::from_secs(1),
            retry_enabled: false,
            ..RunnerConfig::default()
        };
        let eff = TaskConfig::new()
            .with_timeout(Duration::from_secs(3))
            .with_retry_enabled(true)
            .with_retry(RetryPolicy::new(5))
            .resolve(&defaults)
            .unwrap();
        assert_eq!(eff.timeout, Some(Duration::from_secs(3)));
        assert!(eff.retry_enabled);
        assert_eq!(eff.retry.max_attempts, 5);
        assert_eq!(eff.max_attempts(), 5);
    }

    #[test]
    fn zero_global_timeout_resolves_to_none() {
        let eff = TaskConfig::new().resolve(&RunnerConfig::default()).unwrap();
        assert_eq!(eff.timeout, None);
    }

    #[test]
    fn disabled_retries_cap_attempts_at_one() {
        let eff = TaskConfig::new()
            .with_retry(RetryPolicy::new(5))
            .resolve(&RunnerConfig::default())
            .unwrap();
        assert_eq!(eff.max_attempts(), 1);
    }

    #[test]
    fn malformed_retry_policy_is_rejected() {
        let err = TaskConfig::new()
            .with_retry(RetryPolicy::new(0))
            .resolve(&RunnerConfig::default())
            .unwrap_err();
        assert_eq!(err, RunnerError::InvalidRetryPolicy);
    }

    #[test]
    fn metadata_is_carried_through() {
        let eff = TaskConfig::new()
            .with_metadata("origin", json!("api"))
            .resolve(&RunnerConfig::default())
            .unwrap();
        assert_eq!(eff.metadata["origin"], json!("api"));
    }
}
