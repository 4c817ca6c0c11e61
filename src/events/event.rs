//! # Lifecycle events emitted by task supervision.
//!
//! [`EventKind`] classifies the transitions a supervised task goes through;
//! [`Event`] carries the payload: task name, elapsed time since launch,
//! attempt number, and result/error data where applicable.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically at creation time. Within one task, events are emitted in
//! lifecycle order: `TaskStarted`, then any number of `Heartbeat` /
//! `RetryScheduled`, then exactly one terminal event. Across different
//! tasks, ordering reflects real completion time.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskfan::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskErrored, "demo")
//!     .with_attempt(3)
//!     .with_elapsed(Duration::from_millis(250))
//!     .with_error("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskErrored);
//! assert!(ev.is_terminal());
//! assert_eq!(ev.error.as_deref(), Some("boom"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde_json::Value;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of task lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Task was launched.
    ///
    /// Sets: `task`, `attempt = 1`, `elapsed = 0`.
    TaskStarted,

    /// Task is still in flight; periodic progress signal.
    ///
    /// Sets: `task`, `elapsed`. Never carries result or error.
    Heartbeat,

    /// A failed attempt will be retried after a backoff delay.
    ///
    /// Sets: `task`, `attempt` (the upcoming attempt, `>= 2`), `elapsed`,
    /// `error` (the failure that triggered the retry), `delay`.
    RetryScheduled,

    /// Task exceeded its timeout boundary.
    ///
    /// Sets: `task`, `attempt`, `elapsed`, `error`. Always followed by a
    /// terminal [`EventKind::TaskErrored`] for the same task.
    TimeoutHit,

    /// Terminal: task finished successfully.
    ///
    /// Sets: `task`, `attempt`, `elapsed`, `result`.
    TaskCompleted,

    /// Terminal: task failed, timed out, or exhausted its retries.
    ///
    /// Sets: `task`, `attempt`, `elapsed`, `error`.
    TaskErrored,
}

impl EventKind {
    /// Returns a short stable label (snake_case) for logs and wire formats.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::TaskStarted => "task_started",
            EventKind::Heartbeat => "heartbeat",
            EventKind::RetryScheduled => "retry",
            EventKind::TimeoutHit => "timeout",
            EventKind::TaskCompleted => "task_complete",
            EventKind::TaskErrored => "task_error",
        }
    }

    /// Returns true for the unique final transition of a task.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::TaskCompleted | EventKind::TaskErrored)
    }
}

/// Task lifecycle event with payload metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `elapsed`: time since the task was launched
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Allocated unique name of the task.
    pub task: Arc<str>,
    /// Time since the task was launched.
    pub elapsed: Duration,
    /// Attempt count (starting from 1).
    pub attempt: u32,
    /// Task result; set only on [`EventKind::TaskCompleted`].
    pub result: Option<Value>,
    /// Error message; set on failures, timeouts and retries.
    pub error: Option<String>,
    /// Backoff delay before the next attempt; set on retries.
    pub delay: Option<Duration>,
}

impl Event {
    /// Creates a new event of the given kind for the given task, stamped
    /// with the current time and the next sequence number.
    pub fn new(kind: EventKind, task: impl Into<Arc<str>>) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: task.into(),
            elapsed: Duration::ZERO,
            attempt: 1,
            result: None,
            error: None,
            delay: None,
        }
    }

    /// Attaches the elapsed time since launch.
    #[inline]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    /// Attaches a result value.
    #[inline]
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    /// Attaches an error message.
    #[inline]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a backoff delay.
    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns true if this is the task's final lifecycle transition.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_are_monotonic() {
        let a = Event::new(EventKind::TaskStarted, "t");
        let b = Event::new(EventKind::Heartbeat, "t");
        assert!(b.seq > a.seq);
    }

    #[test]
    fn only_completion_and_error_are_terminal() {
        assert!(Event::new(EventKind::TaskCompleted, "t").is_terminal());
        assert!(Event::new(EventKind::TaskErrored, "t").is_terminal());
        assert!(!Event::new(EventKind::TaskStarted, "t").is_terminal());
        assert!(!Event::new(EventKind::Heartbeat, "t").is_terminal());
        assert!(!Event::new(EventKind::RetryScheduled, "t").is_terminal());
        assert!(!Event::new(EventKind::TimeoutHit, "t").is_terminal());
    }

    #[test]
    fn builder_setters_populate_fields() {
        let ev = Event::new(EventKind::RetryScheduled, "t")
            .with_attempt(2)
            .with_error("boom")
            .with_delay(Duration::from_millis(100));
        assert_eq!(ev.attempt, 2);
        assert_eq!(ev.error.as_deref(), Some("boom"));
        assert_eq!(ev.delay, Some(Duration::from_millis(100)));
        assert_eq!(ev.kind.as_label(), "retry");
    }
}
