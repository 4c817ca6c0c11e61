//! # Per-event view handed to callback handlers.
//!
//! A [`CallbackContext`] is constructed fresh for every lifecycle event.
//! All fields except `state` are snapshots of that one event; `state` is
//! the same shared handle across the whole run and is where handlers
//! record outcomes.

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use serde_json::Value;

use crate::callbacks::state::{RunnerState, SharedState};
use crate::events::Event;

/// Context passed to a callback handler for one lifecycle event.
///
/// `result` and `error` are mutually exclusive on terminal events.
#[derive(Clone)]
pub struct CallbackContext {
    /// Registered name of the task the event belongs to.
    pub task: Arc<str>,
    /// Task result; present only on completion events.
    pub result: Option<Value>,
    /// Error message; present on failure, timeout, and retry events.
    pub error: Option<String>,
    /// Attempt number the event refers to (1-based).
    pub attempt: u32,
    /// Time elapsed since the task was launched.
    pub elapsed: Duration,
    /// Shared aggregation state for the whole run.
    pub state: SharedState,
}

impl CallbackContext {
    pub(crate) fn from_event(ev: &Event, state: SharedState) -> Self {
        Self {
            task: ev.task.clone(),
            result: ev.result.clone(),
            error: ev.error.clone(),
            attempt: ev.attempt,
            elapsed: ev.elapsed,
            state,
        }
    }

    /// Runs `f` with exclusive access to the shared state.
    ///
    /// The guard is released before this returns; do not call this while
    /// already inside another `with_state` closure.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut RunnerState) -> R) -> R {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
