//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing
//! a fresh future per attempt. Arguments are carried by closure capture, so
//! the same function can be registered many times with different inputs.
//!
//! ## Concurrency semantics
//! - Each attempt calls the closure again and gets a **new** future owning
//!   its own state; nothing is shared between attempts implicitly.
//! - If shared state is needed across attempts, capture an `Arc<...>`
//!   explicitly inside the closure.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//! use taskfan::{TaskError, TaskFn, TaskRef};
//!
//! let target = "test1".to_string();
//! let t: TaskRef = TaskFn::arc("simple_task", move |_ctx: CancellationToken| {
//!     let target = target.clone();
//!     async move { Ok::<_, TaskError>(json!(format!("Result: {target}"))) }
//! });
//!
//! assert_eq!(t.name(), "simple_task");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::Task;

/// Function-backed task implementation.
///
/// Wraps a closure that *creates* a new future per attempt.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<Value, TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<Value, TaskError> {
        (self.f)(ctx).await
    }
}
