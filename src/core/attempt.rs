//! # Run a single attempt of a task execution.
//!
//! Executes one attempt of a [`Task`] with an optional timeout boundary and
//! panic containment. Event publishing stays in the actor, which owns the
//! task's lifecycle ordering.
//!
//! ## Rules
//! - Derives a **child token** per attempt; timeout cancels the child so
//!   in-flight I/O can stop cooperatively, without touching the parent.
//! - A panicking task body is caught and mapped to an ordinary
//!   [`TaskError::Failed`] — it never crosses the task boundary.
//! - A timeout is returned as [`TaskError::Timeout`]; the caller treats it
//!   as terminal.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::Task;

/// Executes one attempt of `task` under the given timeout boundary.
///
/// ### Flow
/// 1. Derive a child cancellation token from the parent.
/// 2. Run the task body, catching panics.
/// 3. If a timeout is configured and elapses first, cancel the child and
///    return [`TaskError::Timeout`].
pub(crate) async fn run_once(
    task: &dyn Task,
    parent: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<serde_json::Value, TaskError> {
    let child = parent.child_token();
    let body = AssertUnwindSafe(task.run(child.clone())).catch_unwind();

    let caught = if let Some(dur) = timeout.filter(|d| *d > Duration::ZERO) {
        match time::timeout(dur, body).await {
            Ok(r) => r,
            Err(_elapsed) => {
                child.cancel();
                return Err(TaskError::Timeout { timeout: dur });
            }
        }
    } else {
        body.await
    };

    match caught {
        Ok(outcome) => outcome,
        Err(panic) => Err(TaskError::Failed {
            error: panic_message(panic),
        }),
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "task panicked".to_string()
    }
}
