//! Error types used by the runner and by task executions.
//!
//! Two enums with different propagation rules:
//!
//! - [`RunnerError`] — misconfiguration of the runner itself. This is the
//!   only error class that escapes the public API: a malformed retry or
//!   backoff policy is a programming error, not a runtime task outcome.
//! - [`TaskError`] — failure of one task execution. Task errors never
//!   propagate to sibling tasks or to the aggregation caller; the
//!   supervision loop contains them and they surface only through the
//!   `errors` / `timed_out` fields of the shared state.
//!
//! Both types provide `as_label()` helpers for logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the runner configuration.
///
/// Returned from `run_as_completed` / `get_aggregated_results` when the
/// effective configuration of a registered task is invalid. Individual task
/// failures are never reported through this type.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunnerError {
    /// A retry policy allows zero attempts; at least one attempt is required.
    #[error("invalid retry policy: max_attempts must be at least 1")]
    InvalidRetryPolicy,

    /// A backoff growth factor is not a finite non-negative number.
    #[error("invalid backoff: factor must be finite and non-negative, got {factor}")]
    InvalidBackoff {
        /// The offending growth factor.
        factor: f64,
    },
}

impl RunnerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskfan::RunnerError;
    ///
    /// let err = RunnerError::InvalidRetryPolicy;
    /// assert_eq!(err.as_label(), "invalid_retry_policy");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunnerError::InvalidRetryPolicy => "invalid_retry_policy",
            RunnerError::InvalidBackoff { .. } => "invalid_backoff",
        }
    }
}

/// # Errors produced by task execution.
///
/// A [`TaskError::Failed`] attempt may be retried (subject to the task's
/// retry policy); a [`TaskError::Timeout`] is terminal and is never retried.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// Task execution exceeded its timeout boundary.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Task execution failed; may succeed if retried.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Task observed cancellation and exited early.
    #[error("cancelled")]
    Canceled,
}

impl TaskError {
    /// Convenience constructor for [`TaskError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        TaskError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use taskfan::TaskError;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Failed { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Indicates whether the error is safe to retry.
    ///
    /// Returns `true` only for [`TaskError::Failed`]: a timeout is itself the
    /// final outcome of a task, and a cancelled task must not be restarted.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Failed { .. })
    }
}
