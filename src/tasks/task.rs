//! # Task abstraction.
//!
//! Defines the [`Task`] trait (async, cancelable, value-producing) and the
//! shared handle type [`TaskRef`] (`Arc<dyn Task>`).
//!
//! A task receives a [`CancellationToken`] and should check it at its own
//! suspension points so that a timeout can cancel in-flight work
//! cooperatively.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// # Asynchronous, cancelable unit of work producing a JSON value.
///
/// A `Task` has a stable [`name`](Task::name) (used to derive its unique
/// registered name) and an async [`run`](Task::run) method. The token
/// passed to `run` is cancelled when the task's timeout boundary fires;
/// implementations doing long I/O should observe it and exit promptly.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use tokio_util::sync::CancellationToken;
/// use taskfan::{Task, TaskError};
///
/// struct Demo;
///
/// #[async_trait]
/// impl Task for Demo {
///     fn name(&self) -> &str { "demo" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<Value, TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         Ok(json!({"answer": 42}))
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    ///
    /// Used as the candidate for unique-name allocation at registration
    /// time; duplicates are disambiguated with numeric suffixes.
    fn name(&self) -> &str;

    /// Executes the task until completion, failure, or cancellation.
    ///
    /// Returning `Err` marks the attempt as failed; whether it is retried
    /// depends on the task's effective retry policy.
    async fn run(&self, ctx: CancellationToken) -> Result<Value, TaskError>;
}

/// Shared handle to a task, suitable for registration with a runner.
pub type TaskRef = Arc<dyn Task>;
