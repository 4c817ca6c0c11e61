//! # Task abstractions, specifications, and registration plumbing.
//!
//! This module provides the task-side types:
//! - [`Task`] — trait for implementing async cancelable tasks
//! - [`TaskFn`] — function-backed task implementation
//! - [`TaskRef`] — shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskSpec`] — registration bundle (task + name + config)
//! - [`TaskConfig`] / [`EffectiveConfig`] — per-task overrides and their
//!   resolution against runner defaults
//! - [`NameAllocator`] — unique-name assignment at registration time

mod config;
mod names;
mod spec;
mod task;
mod task_fn;

pub use config::{EffectiveConfig, TaskConfig};
pub use names::NameAllocator;
pub use spec::TaskSpec;
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
