//! # Task specification for supervised execution.
//!
//! Defines [`TaskSpec`] — the registration bundle pairing a task with an
//! optional explicit name and its per-task [`TaskConfig`].
//!
//! A spec can be created:
//! - **Implicitly** from a [`TaskRef`] (default config, name derived from
//!   [`Task::name`](crate::Task::name))
//! - **Explicitly** with [`TaskSpec::new`] plus `with_*` builders
//!
//! ## Rules
//! - The spec is immutable once registered; the runner owns it for the
//!   duration of the run.

use std::sync::Arc;

use crate::tasks::config::TaskConfig;
use crate::tasks::task::{Task, TaskRef};

/// Specification for running a task: the task itself, an optional explicit
/// name, and per-task configuration.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use serde_json::json;
/// use tokio_util::sync::CancellationToken;
/// use taskfan::{TaskError, TaskFn, TaskRef, TaskSpec};
///
/// let ping: TaskRef = TaskFn::arc("ping", |_ctx: CancellationToken| async move {
///     Ok::<_, TaskError>(json!("pong"))
/// });
///
/// let spec = TaskSpec::new(ping)
///     .with_name("ping_primary")
///     .with_timeout(Duration::from_secs(2));
/// assert_eq!(spec.candidate_name(), "ping_primary");
/// ```
#[derive(Clone)]
pub struct TaskSpec {
    task: TaskRef,
    name: Option<String>,
    config: TaskConfig,
}

impl TaskSpec {
    /// Creates a spec with default config and no explicit name.
    pub fn new(task: TaskRef) -> Self {
        Self {
            task,
            name: None,
            config: TaskConfig::default(),
        }
    }

    /// Returns a new spec with an explicit name, overriding the name
    /// derived from the task.
    ///
    /// The final registered name may still gain a numeric suffix if the
    /// candidate collides with an earlier registration.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns a new spec with the given per-task config.
    pub fn with_config(mut self, config: TaskConfig) -> Self {
        self.config = config;
        self
    }

    /// Convenience: returns a new spec with a per-task timeout.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Convenience: returns a new spec with retries switched on or off.
    pub fn with_retry_enabled(mut self, enabled: bool) -> Self {
        self.config.retry_enabled = Some(enabled);
        self
    }

    /// Returns a reference to the task.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Returns the candidate name used for unique-name allocation: the
    /// explicit override if set, the task's own name otherwise.
    pub fn candidate_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.task.name())
    }

    /// Returns the per-task configuration.
    pub fn config(&self) -> &TaskConfig {
        &self.config
    }
}

impl From<TaskRef> for TaskSpec {
    fn from(task: TaskRef) -> Self {
        TaskSpec::new(task)
    }
}

impl<T: Task> From<Arc<T>> for TaskSpec {
    fn from(task: Arc<T>) -> Self {
        TaskSpec::new(task)
    }
}
