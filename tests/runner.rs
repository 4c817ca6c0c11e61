//! End-to-end tests for the runner: fan-out, naming, timeout/retry
//! supervision, callback aggregation, and the live event stream.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use taskfan::{
    handler_fn, BackoffPolicy, CallbackKind, EventKind, RetryPolicy, Runner, RunnerConfig,
    TaskConfig, TaskError, TaskFn, TaskRef, TaskSpec,
};

fn echo_task(name: &'static str, payload: &str) -> TaskRef {
    let payload = payload.to_string();
    TaskFn::arc(name, move |_ctx: CancellationToken| {
        let payload = payload.clone();
        async move { Ok::<_, TaskError>(json!(format!("Result: {payload}"))) }
    })
}

fn failing_task(name: &'static str, message: &'static str) -> TaskRef {
    TaskFn::arc(name, move |_ctx: CancellationToken| async move {
        Err::<Value, _>(TaskError::failed(message))
    })
}

fn sleeping_task(name: &'static str, dur: Duration) -> TaskRef {
    TaskFn::arc(name, move |ctx: CancellationToken| async move {
        tokio::select! {
            _ = tokio::time::sleep(dur) => Ok::<_, TaskError>(json!("done")),
            _ = ctx.cancelled() => Err(TaskError::Canceled),
        }
    })
}

#[tokio::test]
async fn duplicate_names_get_numeric_suffixes_in_registration_order() {
    let mut runner = Runner::new(RunnerConfig::default());
    let names: Vec<String> = (0..4)
        .map(|i| runner.add_task(echo_task("job", &format!("v{i}"))))
        .collect();
    assert_eq!(names, vec!["job", "job_1", "job_2", "job_3"]);
    assert_eq!(runner.task_count(), 4);

    let state = runner.get_aggregated_results().await.unwrap();
    assert_eq!(state.completed.len(), 4);
    for name in &names {
        assert!(state.results.contains_key(name), "missing result for {name}");
    }
}

#[tokio::test]
async fn end_to_end_same_callable_different_args() {
    let mut runner = Runner::new(RunnerConfig::default());
    runner.add_task(echo_task("simple_task", "test1"));
    runner.add_task(echo_task("simple_task", "test2"));

    let state = runner.get_aggregated_results().await.unwrap();

    let mut expected = BTreeMap::new();
    expected.insert("simple_task".to_string(), json!("Result: test1"));
    expected.insert("simple_task_1".to_string(), json!("Result: test2"));
    assert_eq!(state.results, expected);
    assert!(state.completed.contains(&"simple_task".to_string()));
    assert!(state.completed.contains(&"simple_task_1".to_string()));
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn failure_without_retry_is_recorded_and_isolated() {
    let mut runner = Runner::new(RunnerConfig::default());
    let bad = runner.add_task(failing_task("bad", "connection refused"));
    let good = runner.add_task(echo_task("good", "ok"));

    let state = runner.get_aggregated_results().await.unwrap();
    assert_eq!(state.errors[&bad], "execution failed: connection refused");
    assert!(!state.completed.contains(&bad));
    assert!(state.timed_out.is_empty());
    assert!(state.completed.contains(&good));
}

#[tokio::test(start_paused = true)]
async fn retry_exhaustion_records_every_non_initial_attempt() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    let task: TaskRef = TaskFn::arc("flaky", move |_ctx: CancellationToken| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<Value, _>(TaskError::failed("still broken"))
        }
    });

    let backoff = BackoffPolicy {
        first: Duration::from_millis(10),
        ..BackoffPolicy::default()
    };
    let mut runner = Runner::new(RunnerConfig::default());
    let name = runner.add_task(
        TaskSpec::new(task).with_config(
            TaskConfig::new()
                .with_retry_enabled(true)
                .with_retry(RetryPolicy::new(3).with_backoff(backoff)),
        ),
    );

    let state = runner.get_aggregated_results().await.unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(
        state.retries,
        vec![format!("{name}_attempt_2"), format!("{name}_attempt_3")]
    );
    assert_eq!(state.errors[&name], "execution failed: still broken");
    assert!(!state.completed.contains(&name));
}

#[tokio::test(start_paused = true)]
async fn timeout_is_terminal_while_extended_timeout_completes() {
    let cfg = RunnerConfig {
        timeout: Duration::from_secs(1),
        ..RunnerConfig::default()
    };
    let mut runner = Runner::new(cfg);

    let slow = runner.add_task(sleeping_task("slow", Duration::from_secs(2)));
    let relaxed = runner.add_task(
        TaskSpec::new(sleeping_task("relaxed", Duration::from_millis(500)))
            .with_timeout(Duration::from_secs(3)),
    );

    let state = runner.get_aggregated_results().await.unwrap();

    assert_eq!(state.timed_out, vec![slow.clone()]);
    assert!(state.errors[&slow].contains("timed out"));
    assert!(!state.completed.contains(&slow));

    assert!(state.completed.contains(&relaxed));
    assert_eq!(state.results[&relaxed], json!("done"));
    assert!(!state.errors.contains_key(&relaxed));
}

#[tokio::test(start_paused = true)]
async fn timeout_suppresses_remaining_retries() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    let task: TaskRef = TaskFn::arc("hang", move |ctx: CancellationToken| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(60)) => Ok::<_, TaskError>(json!(null)),
                _ = ctx.cancelled() => Err(TaskError::Canceled),
            }
        }
    });

    let mut runner = Runner::new(RunnerConfig::default());
    let name = runner.add_task(
        TaskSpec::new(task).with_config(
            TaskConfig::new()
                .with_timeout(Duration::from_millis(100))
                .with_retry_enabled(true)
                .with_retry(RetryPolicy::new(5)),
        ),
    );

    let state = runner.get_aggregated_results().await.unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(state.retries.is_empty());
    assert_eq!(state.timed_out, vec![name.clone()]);
    assert!(state.errors[&name].contains("timed out"));
}

#[tokio::test]
async fn disabled_defaults_leave_state_exactly_as_constructed() {
    let mut runner = Runner::builder(RunnerConfig::default())
        .use_default_callbacks(false)
        .seed("request_id", json!("r-17"))
        .build();
    runner.add_task(echo_task("a", "1"));
    runner.add_task(failing_task("b", "boom"));

    let state = runner.get_aggregated_results().await.unwrap();
    assert!(state.results.is_empty());
    assert!(state.errors.is_empty());
    assert!(state.completed.is_empty());
    assert!(state.started.is_empty());
    assert!(state.retries.is_empty());
    assert!(state.timed_out.is_empty());
    assert_eq!(state.extra["request_id"], json!("r-17"));
}

#[tokio::test]
async fn zero_tasks_yield_the_canonical_empty_shape() {
    let runner = Runner::new(RunnerConfig::default());
    let state = runner.get_aggregated_results().await.unwrap();
    assert!(state.results.is_empty());
    assert!(state.errors.is_empty());
    assert!(state.completed.is_empty());
    assert!(state.started.is_empty());
    assert!(state.retries.is_empty());
    assert!(state.timed_out.is_empty());
}

#[tokio::test]
async fn misconfigured_retry_policy_is_the_only_public_error() {
    let mut runner = Runner::new(RunnerConfig::default());
    runner.add_task(
        TaskSpec::new(echo_task("a", "1")).with_config(
            TaskConfig::new()
                .with_retry_enabled(true)
                .with_retry(RetryPolicy::new(0)),
        ),
    );
    let err = runner.get_aggregated_results().await.unwrap_err();
    assert_eq!(err.as_label(), "invalid_retry_policy");
}

#[tokio::test(start_paused = true)]
async fn stream_interleaves_heartbeats_and_orders_each_task() {
    let cfg = RunnerConfig {
        heartbeat: Duration::from_millis(50),
        ..RunnerConfig::default()
    };
    let mut runner = Runner::new(cfg);
    let slow = runner.add_task(sleeping_task("slow", Duration::from_millis(120)));
    let quick = runner.add_task(echo_task("quick", "x"));

    let stream = runner.run_as_completed().unwrap();
    let events: Vec<_> = stream.collect().await;

    let for_task = |name: &str| {
        events
            .iter()
            .filter(|ev| ev.task.as_ref() == name)
            .collect::<Vec<_>>()
    };

    for name in [slow.as_str(), quick.as_str()] {
        let evs = for_task(name);
        assert_eq!(evs.first().map(|ev| ev.kind), Some(EventKind::TaskStarted));
        let terminals: Vec<_> = evs.iter().filter(|ev| ev.is_terminal()).collect();
        assert_eq!(terminals.len(), 1, "task {name} must have one terminal event");
        assert!(
            evs.last().map(|ev| ev.is_terminal()).unwrap_or(false),
            "nothing may follow the terminal event of {name}"
        );
    }

    let heartbeats = for_task(&slow)
        .iter()
        .filter(|ev| ev.kind == EventKind::Heartbeat)
        .count();
    assert!(heartbeats >= 1, "slow task must emit at least one heartbeat");

    // the quick task finishes before the slow one
    let terminal_seq = |name: &str| {
        events
            .iter()
            .find(|ev| ev.task.as_ref() == name && ev.is_terminal())
            .map(|ev| ev.seq)
            .unwrap()
    };
    assert!(terminal_seq(&quick) < terminal_seq(&slow));

    let done = events
        .iter()
        .find(|ev| ev.task.as_ref() == slow.as_str() && ev.kind == EventKind::TaskCompleted)
        .unwrap();
    assert_eq!(done.result, Some(json!("done")));
    assert!(done.elapsed >= Duration::from_millis(100));
}

#[tokio::test]
async fn panicking_task_is_contained_and_siblings_finish() {
    let mut runner = Runner::new(RunnerConfig::default());
    let explode = runner.add_task(TaskFn::arc(
        "explode",
        |_ctx: CancellationToken| async move {
            if true {
                panic!("kaboom");
            }
            Ok::<_, TaskError>(json!(null))
        },
    ));
    let calm = runner.add_task(echo_task("calm", "ok"));

    let state = runner.get_aggregated_results().await.unwrap();
    assert!(state.errors[&explode].contains("kaboom"));
    assert!(!state.completed.contains(&explode));
    assert!(state.completed.contains(&calm));
}

#[tokio::test]
async fn replacement_callback_displaces_only_its_own_hook() {
    let mut runner = Runner::builder(RunnerConfig::default())
        .with_callback(
            CallbackKind::TaskComplete,
            handler_fn(|ctx| async move {
                let name = ctx.task.to_string();
                ctx.with_state(move |s| {
                    s.extra.insert("custom_complete".into(), json!(name));
                });
            }),
        )
        .build();
    let name = runner.add_task(echo_task("job", "v"));

    let state = runner.get_aggregated_results().await.unwrap();
    // default on_task_start still ran
    assert_eq!(state.started, vec![name.clone()]);
    // default on_task_complete was displaced
    assert!(state.completed.is_empty());
    assert!(state.results.is_empty());
    assert_eq!(state.extra["custom_complete"], json!(name));
}

#[tokio::test]
async fn shared_state_reflects_terminal_events_already_seen_on_the_stream() {
    let mut runner = Runner::new(RunnerConfig::default());
    let name = runner.add_task(echo_task("job", "v"));
    let state = runner.shared_state();

    let mut stream = runner.run_as_completed().unwrap();
    while let Some(ev) = stream.next().await {
        if ev.is_terminal() {
            let snapshot = state.lock().unwrap().clone();
            assert!(snapshot.completed.contains(&name));
        }
    }
}
