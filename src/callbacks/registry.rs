//! # Callback registry: one handler slot per lifecycle hook.
//!
//! [`CallbackRegistry`] maps each [`CallbackKind`] to at most one
//! [`Handler`]. The table is resolved once at runner construction; there
//! is no per-call capability probing.
//!
//! Construction options mirror the runner builder:
//! - [`CallbackRegistry::with_defaults`] — every kind gets a built-in
//!   handler populating the canonical
//!   [`RunnerState`](crate::RunnerState) shape;
//! - [`CallbackRegistry::empty`] — no handler runs automatically; the
//!   shared state stays exactly as constructed unless a caller-supplied
//!   handler acts;
//! - [`with_handler`](CallbackRegistry::with_handler) — replace one slot,
//!   leaving the others as they are.
//!
//! ## Default bookkeeping
//! | hook | effect on shared state |
//! |---|---|
//! | `on_task_start` | `started.push(name)` |
//! | `on_heartbeat` | none (trace log only) |
//! | `on_task_complete` | `completed.push(name)`, `results[name] = result` |
//! | `on_task_error` | `errors[name] = message` |
//! | `on_retry` | `retries.push("<name>_attempt_<n>")` |
//! | `on_timeout` | `timed_out.push(name)` |

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::callbacks::context::CallbackContext;
use crate::events::EventKind;

/// A lifecycle callback: takes the event context, returns a future that
/// the dispatcher awaits before touching the next event.
pub type Handler = Arc<dyn Fn(CallbackContext) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps a plain async closure into a [`Handler`].
///
/// ## Example
/// ```rust
/// use taskfan::{handler_fn, CallbackContext};
///
/// let h = handler_fn(|ctx: CallbackContext| async move {
///     ctx.with_state(|s| s.extra.insert("last".into(), ctx.task.as_ref().into()));
/// });
/// # let _ = h;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(CallbackContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// The lifecycle hooks a handler can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    /// Task was launched.
    TaskStart,
    /// Task is still in flight (periodic).
    Heartbeat,
    /// Task finished successfully (terminal).
    TaskComplete,
    /// Task failed, timed out, or exhausted retries (terminal).
    TaskError,
    /// A failed attempt is about to be retried.
    Retry,
    /// Task hit its timeout boundary.
    Timeout,
}

impl CallbackKind {
    /// Returns the stable hook label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            CallbackKind::TaskStart => "on_task_start",
            CallbackKind::Heartbeat => "on_heartbeat",
            CallbackKind::TaskComplete => "on_task_complete",
            CallbackKind::TaskError => "on_task_error",
            CallbackKind::Retry => "on_retry",
            CallbackKind::Timeout => "on_timeout",
        }
    }

    /// Maps an event to the hook it triggers.
    pub(crate) fn for_event(kind: EventKind) -> CallbackKind {
        match kind {
            EventKind::TaskStarted => CallbackKind::TaskStart,
            EventKind::Heartbeat => CallbackKind::Heartbeat,
            EventKind::RetryScheduled => CallbackKind::Retry,
            EventKind::TimeoutHit => CallbackKind::Timeout,
            EventKind::TaskCompleted => CallbackKind::TaskComplete,
            EventKind::TaskErrored => CallbackKind::TaskError,
        }
    }
}

/// Per-kind handler table, resolved once at runner construction.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    on_task_start: Option<Handler>,
    on_heartbeat: Option<Handler>,
    on_task_complete: Option<Handler>,
    on_task_error: Option<Handler>,
    on_retry: Option<Handler>,
    on_timeout: Option<Handler>,
}

impl CallbackRegistry {
    /// Creates a registry with the built-in bookkeeping handler in every
    /// slot.
    pub fn with_defaults() -> Self {
        Self::empty()
            .with_handler(CallbackKind::TaskStart, default_task_start())
            .with_handler(CallbackKind::Heartbeat, default_heartbeat())
            .with_handler(CallbackKind::TaskComplete, default_task_complete())
            .with_handler(CallbackKind::TaskError, default_task_error())
            .with_handler(CallbackKind::Retry, default_retry())
            .with_handler(CallbackKind::Timeout, default_timeout())
    }

    /// Creates a registry with no handlers at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a new registry with the given slot replaced.
    pub fn with_handler(mut self, kind: CallbackKind, handler: Handler) -> Self {
        match kind {
            CallbackKind::TaskStart => self.on_task_start = Some(handler),
            CallbackKind::Heartbeat => self.on_heartbeat = Some(handler),
            CallbackKind::TaskComplete => self.on_task_complete = Some(handler),
            CallbackKind::TaskError => self.on_task_error = Some(handler),
            CallbackKind::Retry => self.on_retry = Some(handler),
            CallbackKind::Timeout => self.on_timeout = Some(handler),
        }
        self
    }

    /// Returns the handler registered for the given kind, if any.
    pub fn handler(&self, kind: CallbackKind) -> Option<&Handler> {
        match kind {
            CallbackKind::TaskStart => self.on_task_start.as_ref(),
            CallbackKind::Heartbeat => self.on_heartbeat.as_ref(),
            CallbackKind::TaskComplete => self.on_task_complete.as_ref(),
            CallbackKind::TaskError => self.on_task_error.as_ref(),
            CallbackKind::Retry => self.on_retry.as_ref(),
            CallbackKind::Timeout => self.on_timeout.as_ref(),
        }
    }

    /// Invokes the handler for the given kind, if one is registered.
    pub(crate) async fn dispatch(&self, kind: CallbackKind, ctx: CallbackContext) {
        if let Some(handler) = self.handler(kind) {
            handler(ctx).await;
        }
    }
}

fn default_task_start() -> Handler {
    handler_fn(|ctx: CallbackContext| async move {
        let name = ctx.task.to_string();
        ctx.with_state(|s| s.started.push(name));
    })
}

fn default_heartbeat() -> Handler {
    handler_fn(|ctx: CallbackContext| async move {
        tracing::trace!(task = %ctx.task, elapsed_ms = ctx.elapsed.as_millis() as u64, "heartbeat");
    })
}

fn default_task_complete() -> Handler {
    handler_fn(|ctx: CallbackContext| async move {
        let name = ctx.task.to_string();
        let result = ctx.result.clone().unwrap_or(Value::Null);
        ctx.with_state(move |s| {
            s.results.insert(name.clone(), result);
            s.completed.push(name);
        });
    })
}

fn default_task_error() -> Handler {
    handler_fn(|ctx: CallbackContext| async move {
        let name = ctx.task.to_string();
        let message = ctx.error.clone().unwrap_or_default();
        ctx.with_state(move |s| {
            s.errors.insert(name, message);
        });
    })
}

fn default_retry() -> Handler {
    handler_fn(|ctx: CallbackContext| async move {
        let marker = format!("{}_attempt_{}", ctx.task, ctx.attempt);
        ctx.with_state(move |s| s.retries.push(marker));
    })
}

fn default_timeout() -> Handler {
    handler_fn(|ctx: CallbackContext| async move {
        let name = ctx.task.to_string();
        ctx.with_state(move |s| s.timed_out.push(name));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::state::RunnerState;
    use serde_json::json;
    use std::sync::{Arc as StdArc, Mutex};
    use std::time::Duration;

    fn ctx(kind_payload: (Option<Value>, Option<String>, u32)) -> (CallbackContext, crate::SharedState) {
        let (result, error, attempt) = kind_payload;
        let state: crate::SharedState = StdArc::new(Mutex::new(RunnerState::default()));
        let ctx = CallbackContext {
            task: StdArc::from("job"),
            result,
            error,
            attempt,
            elapsed: Duration::from_millis(5),
            state: StdArc::clone(&state),
        };
        (ctx, state)
    }

    fn snapshot(state: &crate::SharedState) -> RunnerState {
        state.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn defaults_record_start_and_completion() {
        let registry = CallbackRegistry::with_defaults();

        let (c, state) = ctx((None, None, 1));
        registry.dispatch(CallbackKind::TaskStart, c).await;

        let (mut c, _) = ctx((Some(json!("out")), None, 1));
        c.state = StdArc::clone(&state);
        registry.dispatch(CallbackKind::TaskComplete, c).await;

        let s = snapshot(&state);
        assert_eq!(s.started, vec!["job"]);
        assert_eq!(s.completed, vec!["job"]);
        assert_eq!(s.results["job"], json!("out"));
    }

    #[tokio::test]
    async fn defaults_record_errors_retries_and_timeouts() {
        let registry = CallbackRegistry::with_defaults();

        let (c, state) = ctx((None, Some("boom".into()), 2));
        registry.dispatch(CallbackKind::Retry, c).await;

        let (mut c, _) = ctx((None, Some("boom".into()), 3));
        c.state = StdArc::clone(&state);
        registry.dispatch(CallbackKind::TaskError, c).await;

        let (mut c, _) = ctx((None, Some("timed out".into()), 1));
        c.state = StdArc::clone(&state);
        registry.dispatch(CallbackKind::Timeout, c).await;

        let s = snapshot(&state);
        assert_eq!(s.retries, vec!["job_attempt_2"]);
        assert_eq!(s.errors["job"], "boom");
        assert_eq!(s.timed_out, vec!["job"]);
    }

    #[tokio::test]
    async fn empty_registry_leaves_state_untouched() {
        let registry = CallbackRegistry::empty();
        let (c, state) = ctx((Some(json!(1)), None, 1));
        registry.dispatch(CallbackKind::TaskComplete, c).await;
        assert_eq!(snapshot(&state), RunnerState::default());
    }

    #[tokio::test]
    async fn replacement_handler_displaces_default_for_its_kind_only() {
        let registry = CallbackRegistry::with_defaults().with_handler(
            CallbackKind::TaskComplete,
            handler_fn(|ctx: CallbackContext| async move {
                ctx.with_state(|s| s.extra.insert("seen".into(), json!(true)));
            }),
        );

        let (c, state) = ctx((None, None, 1));
        registry.dispatch(CallbackKind::TaskStart, c).await;

        let (mut c, _) = ctx((Some(json!("out")), None, 1));
        c.state = StdArc::clone(&state);
        registry.dispatch(CallbackKind::TaskComplete, c).await;

        let s = snapshot(&state);
        assert_eq!(s.started, vec!["job"]);
        assert!(s.completed.is_empty());
        assert_eq!(s.extra["seen"], json!(true));
    }

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(CallbackKind::TaskStart.as_label(), "on_task_start");
        assert_eq!(CallbackKind::Heartbeat.as_label(), "on_heartbeat");
        assert_eq!(CallbackKind::TaskComplete.as_label(), "on_task_complete");
        assert_eq!(CallbackKind::TaskError.as_label(), "on_task_error");
        assert_eq!(CallbackKind::Retry.as_label(), "on_retry");
        assert_eq!(CallbackKind::Timeout.as_label(), "on_timeout");
    }
}
