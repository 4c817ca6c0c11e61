//! # Shared aggregation state.
//!
//! [`RunnerState`] is the canonical shape of the single mutable structure
//! shared across one run. It is created when the runner is constructed,
//! mutated only from inside callback handlers (which the dispatcher
//! executes strictly sequentially), and returned by value as the final
//! result of an aggregation run.
//!
//! ## Rules
//! - Handlers are the only writers; the dispatcher serializes them, so no
//!   handler ever observes a torn write.
//! - `extra` holds caller-seeded custom fields; the built-in handlers
//!   never touch it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical aggregation result for one run.
///
/// A caller can classify every registered task from this shape alone:
/// - success → name in `completed` (result in `results`)
/// - timeout → name in `timed_out` **and** `errors`
/// - plain failure → name in `errors` but not in `timed_out`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnerState {
    /// Successful task results, keyed by registered name.
    pub results: BTreeMap<String, Value>,
    /// Terminal error messages, keyed by registered name.
    pub errors: BTreeMap<String, String>,
    /// Names of tasks that finished successfully, in completion order.
    pub completed: Vec<String>,
    /// Names of tasks that were launched, in launch order.
    pub started: Vec<String>,
    /// Retry markers (`<name>_attempt_<n>`, `n >= 2`), in emission order.
    pub retries: Vec<String>,
    /// Names of tasks that hit their timeout boundary.
    pub timed_out: Vec<String>,
    /// Caller-seeded custom fields, untouched by the built-in handlers.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RunnerState {
    /// Creates a state pre-seeded with custom fields.
    pub fn seeded(extra: BTreeMap<String, Value>) -> Self {
        Self {
            extra,
            ..Self::default()
        }
    }
}

/// Shared handle to the run's aggregation state.
///
/// The same handle is passed to every callback invocation of a run.
/// Handlers must not hold the guard across an `await`.
pub type SharedState = Arc<Mutex<RunnerState>>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_shape_is_empty() {
        let state = RunnerState::default();
        assert!(state.results.is_empty());
        assert!(state.errors.is_empty());
        assert!(state.completed.is_empty());
        assert!(state.started.is_empty());
        assert!(state.retries.is_empty());
        assert!(state.timed_out.is_empty());
    }

    #[test]
    fn seeded_fields_live_in_extra() {
        let mut extra = BTreeMap::new();
        extra.insert("request_id".to_string(), json!("r-17"));
        let state = RunnerState::seeded(extra);
        assert_eq!(state.extra["request_id"], json!("r-17"));
        assert!(state.results.is_empty());
    }

    #[test]
    fn extra_fields_flatten_into_serialized_form() {
        let mut extra = BTreeMap::new();
        extra.insert("request_id".to_string(), json!("r-17"));
        let state = RunnerState::seeded(extra);
        let v = serde_json::to_value(&state).unwrap();
        assert_eq!(v["request_id"], json!("r-17"));
        assert_eq!(v["completed"], json!([]));
    }
}
