//! # TaskActor: single-task supervision.
//!
//! Supervises one registered task from launch to its unique terminal
//! event, applying the task's [`EffectiveConfig`]:
//! - per-attempt timeout boundary (terminal, never retried),
//! - retry loop with backoff for failed attempts,
//! - heartbeat events while the task is in flight.
//!
//! ## Event flow
//! ```text
//! TaskStarted → [attempt 1] ─ Ok ──────────────► TaskCompleted
//!                  │
//!                  ├─ Err(Timeout) ─► TimeoutHit ─► TaskErrored
//!                  │
//!                  └─ Err(other) ─► retries left?
//!                        ├─ yes ─► RetryScheduled ─► [sleep] ─► [attempt n+1]
//!                        └─ no ──► TaskErrored
//!
//! Heartbeat events interleave while no terminal event has been emitted.
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially** within one actor (never parallel).
//! - Exactly one terminal event per task: `TaskCompleted` or `TaskErrored`.
//! - Heartbeats span retry attempts and stop at the terminal event; they
//!   never carry result or error data.
//! - Within one actor every event is published from the same select loop,
//!   so a task's own events are strictly ordered.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::attempt::run_once;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{EffectiveConfig, TaskRef};

/// Terminal outcome of the attempt loop.
enum Outcome {
    Completed { value: serde_json::Value, attempt: u32 },
    Failed { error: TaskError, attempt: u32 },
    TimedOut { error: TaskError, attempt: u32 },
}

/// Supervises execution of a single task, publishing lifecycle events.
pub(crate) struct TaskActor {
    /// Allocated unique name of the task.
    pub name: Arc<str>,
    /// Task to execute.
    pub task: TaskRef,
    /// Resolved per-task configuration.
    pub cfg: EffectiveConfig,
    /// Interval between heartbeat events.
    pub heartbeat: Duration,
    /// Event channel shared with the dispatcher.
    pub bus: Bus,
}

impl TaskActor {
    /// Runs the actor until the task reaches its terminal event.
    ///
    /// ### Heartbeat semantics
    /// The first heartbeat fires one full interval after launch; ticks that
    /// pile up behind a busy executor are delayed, not bursted.
    pub(crate) async fn run(self, token: CancellationToken) {
        let started = Instant::now();
        self.bus
            .publish(Event::new(EventKind::TaskStarted, self.name.clone()).with_attempt(1))
            .await;

        let mut ticks = time::interval_at(started + self.heartbeat, self.heartbeat);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let attempts = self.drive_attempts(&token, started);
        tokio::pin!(attempts);

        let outcome = loop {
            tokio::select! {
                outcome = &mut attempts => break outcome,
                _ = ticks.tick() => {
                    self.bus
                        .publish(
                            Event::new(EventKind::Heartbeat, self.name.clone())
                                .with_elapsed(started.elapsed()),
                        )
                        .await;
                }
            }
        };

        let elapsed = started.elapsed();
        match outcome {
            Outcome::Completed { value, attempt } => {
                self.bus
                    .publish(
                        Event::new(EventKind::TaskCompleted, self.name.clone())
                            .with_attempt(attempt)
                            .with_elapsed(elapsed)
                            .with_result(value),
                    )
                    .await;
            }
            Outcome::TimedOut { error, attempt } => {
                self.bus
                    .publish(
                        Event::new(EventKind::TimeoutHit, self.name.clone())
                            .with_attempt(attempt)
                            .with_elapsed(elapsed)
                            .with_error(error.to_string()),
                    )
                    .await;
                self.bus
                    .publish(
                        Event::new(EventKind::TaskErrored, self.name.clone())
                            .with_attempt(attempt)
                            .with_elapsed(elapsed)
                            .with_error(error.to_string()),
                    )
                    .await;
            }
            Outcome::Failed { error, attempt } => {
                self.bus
                    .publish(
                        Event::new(EventKind::TaskErrored, self.name.clone())
                            .with_attempt(attempt)
                            .with_elapsed(elapsed)
                            .with_error(error.to_string()),
                    )
                    .await;
            }
        }
    }

    /// Runs attempts sequentially until success, timeout, retry
    /// exhaustion, or a non-retryable error.
    async fn drive_attempts(&self, token: &CancellationToken, started: Instant) -> Outcome {
        let max = self.cfg.max_attempts();
        let mut attempt: u32 = 1;

        loop {
            match run_once(self.task.as_ref(), token, self.cfg.timeout).await {
                Ok(value) => return Outcome::Completed { value, attempt },
                Err(error @ TaskError::Timeout { .. }) => {
                    return Outcome::TimedOut { error, attempt };
                }
                Err(error) => {
                    if !error.is_retryable() || attempt >= max {
                        return Outcome::Failed { error, attempt };
                    }

                    attempt += 1;
                    // retry index is 0-based: attempt 2 gets the first delay
                    let delay = self.cfg.retry.backoff.next(attempt - 2);
                    self.bus
                        .publish(
                            Event::new(EventKind::RetryScheduled, self.name.clone())
                                .with_attempt(attempt)
                                .with_elapsed(started.elapsed())
                                .with_error(error.to_string())
                                .with_delay(delay),
                        )
                        .await;
                    time::sleep(delay).await;
                }
            }
        }
    }
}
