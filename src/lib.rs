//! # taskfan
//!
//! **Taskfan** is a concurrent fan-out runner for async tasks.
//!
//! It registers an arbitrary set of independent async operations, launches
//! them all at once, supervises each with per-task timeout/retry policies
//! and progress heartbeats, and aggregates outcomes into one shared result
//! structure through pluggable lifecycle callbacks. The crate is designed
//! as an embedded building block: one runner per request or workflow.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskSpec   │   │   TaskSpec   │   │   TaskSpec   │
//!     │(user task #1)│   │(user task #2)│   │(user task #3)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner                                                           │
//! │  - NameAllocator (unique names at registration)                   │
//! │  - CallbackRegistry (one handler slot per lifecycle hook)         │
//! │  - SharedState (single mutable aggregation structure)             │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  TaskActor   │   │  TaskActor   │   │  TaskActor   │
//!     │(retry loop + │   │(retry loop + │   │(retry loop + │
//!     │ heartbeats)  │   │ heartbeats)  │   │ heartbeats)  │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ TaskStarted      │ TaskStarted      │ TaskStarted
//!      │ Heartbeat        │ RetryScheduled   │ TimeoutHit
//!      │ TaskCompleted    │ TaskErrored      │ TaskErrored
//!      ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    Bus (bounded mpsc, no loss)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                          ┌────────────────┐
//!                          │   dispatcher   │  handlers run strictly
//!                          │ (single point) │  sequentially here
//!                          └───┬────────┬───┘
//!                              ▼        ▼
//!                       SharedState   EventStream (caller)
//! ```
//!
//! ### Lifecycle
//! ```text
//! TaskSpec ──► Runner::add_task() ──► unique name
//!
//! run_as_completed():
//!   ├─► resolve EffectiveConfig per task (misconfiguration rejected)
//!   ├─► spawn all TaskActors (unbounded fan-out)
//!   └─► return live EventStream
//!
//! per actor:
//!   ├─► publish TaskStarted
//!   ├─► run_once(task, timeout)  ── Ok ──► TaskCompleted
//!   │       ├─ Err(Timeout) ──► TimeoutHit + TaskErrored (no retries)
//!   │       └─ Err(other)   ──► retries left?
//!   │             ├─ yes ──► RetryScheduled ─► sleep(backoff) ─► retry
//!   │             └─ no  ──► TaskErrored
//!   └─► Heartbeat every interval until the terminal event
//!
//! get_aggregated_results(): drain the stream, return final RunnerState
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types                                 |
//! |-------------------|--------------------------------------------------------------------|-------------------------------------------|
//! | **Tasks**         | Define tasks as trait impls or closures with captured arguments.   | [`Task`], [`TaskFn`], [`TaskRef`]         |
//! | **Registration**  | Unique names, per-task config, runner-wide defaults.               | [`TaskSpec`], [`TaskConfig`], [`NameAllocator`] |
//! | **Policies**      | Retry caps, backoff growth, jitter.                                | [`RetryPolicy`], [`BackoffPolicy`], [`JitterPolicy`] |
//! | **Callbacks**     | Per-hook handler table mutating the shared aggregation state.      | [`CallbackRegistry`], [`CallbackContext`] |
//! | **Streaming**     | Live, one-shot event stream of lifecycle transitions.              | [`EventStream`], [`Event`], [`EventKind`] |
//! | **Aggregation**   | Run everything, get the canonical result shape back.               | [`Runner`], [`RunnerState`]               |
//! | **Errors**        | Typed errors; task failures never escape the supervision loop.     | [`RunnerError`], [`TaskError`]            |
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//! use taskfan::{Runner, RunnerConfig, TaskError, TaskFn, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runner = Runner::new(RunnerConfig::default());
//!
//!     for target in ["test1", "test2"] {
//!         let target = target.to_string();
//!         let task: TaskRef = TaskFn::arc("simple_task", move |_ctx: CancellationToken| {
//!             let target = target.clone();
//!             async move { Ok::<_, TaskError>(json!(format!("Result: {target}"))) }
//!         });
//!         runner.add_task(task);
//!     }
//!
//!     let state = runner.get_aggregated_results().await?;
//!     assert_eq!(state.results["simple_task"], json!("Result: test1"));
//!     assert_eq!(state.results["simple_task_1"], json!("Result: test2"));
//!     Ok(())
//! }
//! ```

mod callbacks;
mod config;
mod core;
mod error;
mod events;
mod policies;
mod tasks;

// ---- Public re-exports ----

pub use crate::callbacks::{
    handler_fn, CallbackContext, CallbackKind, CallbackRegistry, Handler, RunnerState, SharedState,
};
pub use crate::config::RunnerConfig;
pub use crate::core::{Runner, RunnerBuilder};
pub use crate::error::{RunnerError, TaskError};
pub use crate::events::{Event, EventKind, EventStream};
pub use crate::policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
pub use crate::tasks::{
    EffectiveConfig, NameAllocator, Task, TaskConfig, TaskFn, TaskRef, TaskSpec,
};
