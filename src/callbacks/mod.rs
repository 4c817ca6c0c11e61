//! # Lifecycle callbacks and the shared aggregation state.
//!
//! This module provides the callback side of the runner:
//! - [`CallbackKind`] / [`Handler`] / [`CallbackRegistry`] — the per-hook
//!   handler table, resolved once at runner construction
//! - [`CallbackContext`] — the per-event view handed to handlers
//! - [`RunnerState`] / [`SharedState`] — the single mutable structure
//!   where outcomes are recorded
//! - [`handler_fn`] — adapter from plain async closures to [`Handler`]

mod context;
mod registry;
mod state;

pub use context::CallbackContext;
pub use registry::{handler_fn, CallbackKind, CallbackRegistry, Handler};
pub use state::{RunnerState, SharedState};
