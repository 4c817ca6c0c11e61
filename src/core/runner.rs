//! # Runner: concurrent fan-out with serialized callback dispatch.
//!
//! The [`Runner`] owns the set of registered tasks, launches them all
//! together (unbounded fan-out), and drives callback invocation through a
//! single dispatcher so that the shared state is never mutated
//! concurrently.
//!
//! ## High-level architecture
//! ```text
//! Inputs:
//!   add_task(spec) × N  ──►  Runner { tasks, callbacks, state }
//!
//! run_as_completed():
//!   - resolve each task's EffectiveConfig (misconfiguration rejected here)
//!   - spawn one TaskActor per task, all at once
//!   - spawn the dispatcher
//!
//! Event flow:
//!   TaskActor ─┐
//!   TaskActor ─┼─ publish(Event) ─► Bus ─► dispatcher
//!   TaskActor ─┘                            ├─► callbacks.dispatch(kind, ctx)
//!                                           │      (strictly sequential,
//!                                           │       mutates SharedState)
//!                                           └─► EventStream (caller)
//!
//! get_aggregated_results():
//!   run_as_completed() ─► drain stream ─► snapshot of SharedState
//! ```
//!
//! ## Rules
//! - A runner instance covers exactly one batch: both run methods consume
//!   `self`, and the task set is fixed once a run starts.
//! - Handlers run one at a time; a task's own events are dispatched in
//!   lifecycle order. Events reach the stream only after their handler ran.
//! - Task failures never escape: the only error the public API returns is
//!   [`RunnerError`] for misconfiguration, before anything is launched.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::callbacks::{
    CallbackContext, CallbackKind, CallbackRegistry, Handler, RunnerState, SharedState,
};
use crate::config::RunnerConfig;
use crate::core::actor::TaskActor;
use crate::core::attempt::panic_message;
use crate::error::RunnerError;
use crate::events::{Bus, Event, EventStream};
use crate::tasks::{NameAllocator, TaskSpec};

/// A registered task together with its allocated unique name.
struct RegisteredTask {
    name: Arc<str>,
    spec: TaskSpec,
}

/// Concurrent task runner for one batch of registered tasks.
///
/// ## Example
/// ```rust
/// use serde_json::json;
/// use tokio_util::sync::CancellationToken;
/// use taskfan::{Runner, RunnerConfig, TaskError, TaskFn, TaskRef};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut runner = Runner::new(RunnerConfig::default());
///
/// let fetch: TaskRef = TaskFn::arc("fetch", |_ctx: CancellationToken| async move {
///     Ok::<_, TaskError>(json!("payload"))
/// });
/// let name = runner.add_task(fetch);
///
/// let state = runner.get_aggregated_results().await?;
/// assert_eq!(state.results[&name], json!("payload"));
/// assert_eq!(state.completed, vec![name]);
/// # Ok(())
/// # }
/// ```
pub struct Runner {
    cfg: RunnerConfig,
    callbacks: CallbackRegistry,
    state: SharedState,
    names: NameAllocator,
    tasks: Vec<RegisteredTask>,
}

impl Runner {
    /// Creates a runner with the built-in callbacks and a fresh state.
    pub fn new(cfg: RunnerConfig) -> Self {
        RunnerBuilder::new(cfg).build()
    }

    /// Returns a builder for customizing callbacks and seeding state.
    pub fn builder(cfg: RunnerConfig) -> RunnerBuilder {
        RunnerBuilder::new(cfg)
    }

    /// Registers a task and returns its allocated unique name.
    ///
    /// Accepts anything convertible into a [`TaskSpec`]; a bare
    /// [`TaskRef`](crate::TaskRef) registers with default config. The name
    /// is allocated immediately, so registration order alone determines
    /// suffixing of duplicates.
    pub fn add_task(&mut self, spec: impl Into<TaskSpec>) -> String {
        let spec = spec.into();
        let name = self.names.allocate(spec.candidate_name());
        self.tasks.push(RegisteredTask {
            name: Arc::from(name.as_str()),
            spec,
        });
        name
    }

    /// Returns the number of registered tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Returns a handle to the shared aggregation state.
    ///
    /// Useful for consumers of [`run_as_completed`](Self::run_as_completed)
    /// that want to inspect the state while the stream is still live.
    pub fn shared_state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Launches every registered task and returns the live event stream.
    ///
    /// Must be called within a Tokio runtime. All tasks are spawned
    /// together with no admission control; the stream terminates once
    /// every task has reached its terminal event.
    ///
    /// Errs only on misconfiguration (a malformed retry or backoff
    /// policy), before any task is launched.
    pub fn run_as_completed(self) -> Result<EventStream, RunnerError> {
        let Runner {
            cfg,
            callbacks,
            state,
            names: _,
            tasks,
        } = self;

        // Resolve every config up front so a bad policy launches nothing.
        let mut launches = Vec::with_capacity(tasks.len());
        for registered in tasks {
            let effective = registered.spec.config().resolve(&cfg)?;
            launches.push((registered, effective));
        }

        let capacity = cfg.bus_capacity_clamped();
        let (bus, bus_rx) = Bus::channel(capacity);
        let (out_tx, out_rx) = mpsc::channel(capacity);
        let root = CancellationToken::new();

        for (registered, effective) in launches {
            let actor = TaskActor {
                name: registered.name,
                task: registered.spec.task().clone(),
                cfg: effective,
                heartbeat: cfg.heartbeat,
                bus: bus.clone(),
            };
            tokio::spawn(actor.run(root.child_token()));
        }
        // Actors hold the remaining senders; the channel closes when the
        // last actor finishes.
        drop(bus);

        let dispatcher = Dispatcher {
            rx: bus_rx,
            callbacks,
            state,
            out: out_tx,
            verbose: cfg.verbose,
        };
        tokio::spawn(dispatcher.run());

        Ok(EventStream::new(out_rx))
    }

    /// Runs every task to completion and returns the final shared state.
    ///
    /// Consumes the event stream internally. With zero registered tasks
    /// this returns the canonical empty shape (plus any seeded fields),
    /// never an error. Individual task failures are reported only through
    /// the `errors` / `timed_out` fields.
    pub async fn get_aggregated_results(self) -> Result<RunnerState, RunnerError> {
        let state = Arc::clone(&self.state);
        let mut stream = self.run_as_completed()?;
        while stream.next().await.is_some() {}

        let snapshot = state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(snapshot)
    }
}

/// Builder for a [`Runner`] with custom callbacks or a pre-seeded state.
///
/// ## Example
/// ```rust
/// use serde_json::json;
/// use taskfan::{handler_fn, CallbackKind, Runner, RunnerConfig};
///
/// let runner = Runner::builder(RunnerConfig::default())
///     .use_default_callbacks(true)
///     .seed("request_id", json!("r-17"))
///     .with_callback(
///         CallbackKind::Heartbeat,
///         handler_fn(|ctx| async move {
///             println!("{} still running after {:?}", ctx.task, ctx.elapsed);
///         }),
///     )
///     .build();
/// # let _ = runner;
/// ```
pub struct RunnerBuilder {
    cfg: RunnerConfig,
    use_defaults: bool,
    overrides: Vec<(CallbackKind, Handler)>,
    seed: BTreeMap<String, Value>,
}

impl RunnerBuilder {
    fn new(cfg: RunnerConfig) -> Self {
        Self {
            cfg,
            use_defaults: true,
            overrides: Vec::new(),
            seed: BTreeMap::new(),
        }
    }

    /// Keeps or drops the built-in bookkeeping handlers (kept by default).
    ///
    /// With defaults dropped and no custom callbacks, the shared state
    /// stays exactly as constructed even though tasks run.
    pub fn use_default_callbacks(mut self, enabled: bool) -> Self {
        self.use_defaults = enabled;
        self
    }

    /// Replaces the handler for one callback kind.
    ///
    /// Unspecified kinds keep their default behavior (when defaults are
    /// enabled). A replacement fully displaces the built-in bookkeeping
    /// for its kind; call the canonical mutations yourself if you want
    /// them alongside custom behavior.
    pub fn with_callback(mut self, kind: CallbackKind, handler: Handler) -> Self {
        self.overrides.push((kind, handler));
        self
    }

    /// Seeds one custom field into the shared state's `extra` map.
    pub fn seed(mut self, key: impl Into<String>, value: Value) -> Self {
        self.seed.insert(key.into(), value);
        self
    }

    /// Replaces the whole pre-seeded `extra` map at once.
    pub fn with_seeded_state(mut self, extra: BTreeMap<String, Value>) -> Self {
        self.seed = extra;
        self
    }

    /// Builds the runner.
    pub fn build(self) -> Runner {
        let mut callbacks = if self.use_defaults {
            CallbackRegistry::with_defaults()
        } else {
            CallbackRegistry::empty()
        };
        for (kind, handler) in self.overrides {
            callbacks = callbacks.with_handler(kind, handler);
        }

        Runner {
            cfg: self.cfg,
            callbacks,
            state: Arc::new(Mutex::new(RunnerState::seeded(self.seed))),
            names: NameAllocator::new(),
            tasks: Vec::new(),
        }
    }
}

/// The single point where callbacks run and events reach the stream.
struct Dispatcher {
    rx: mpsc::Receiver<Event>,
    callbacks: CallbackRegistry,
    state: SharedState,
    out: mpsc::Sender<Event>,
    verbose: bool,
}

impl Dispatcher {
    /// Receives events until every actor has finished, invoking the
    /// handler for each before forwarding it to the stream.
    ///
    /// A dropped stream does not stop dispatch: callbacks keep running so
    /// the aggregation still settles.
    async fn run(mut self) {
        while let Some(ev) = self.rx.recv().await {
            self.log(&ev);

            let kind = CallbackKind::for_event(ev.kind);
            let ctx = CallbackContext::from_event(&ev, Arc::clone(&self.state));
            let handled = AssertUnwindSafe(self.callbacks.dispatch(kind, ctx))
                .catch_unwind()
                .await;
            if let Err(panic) = handled {
                tracing::error!(
                    hook = kind.as_label(),
                    task = %ev.task,
                    panic = %panic_message(panic),
                    "callback handler panicked"
                );
            }

            // A dropped stream consumer does not stop dispatch.
            let _ = self.out.send(ev).await;
        }
    }

    fn log(&self, ev: &Event) {
        if self.verbose {
            tracing::info!(
                seq = ev.seq,
                kind = ev.kind.as_label(),
                task = %ev.task,
                attempt = ev.attempt,
                elapsed_ms = ev.elapsed.as_millis() as u64,
                "event"
            );
        } else {
            tracing::debug!(
                seq = ev.seq,
                kind = ev.kind.as_label(),
                task = %ev.task,
                attempt = ev.attempt,
                elapsed_ms = ev.elapsed.as_millis() as u64,
                "event"
            );
        }
    }
}
