//! Tests for the bounded-concurrency bulk dispatcher.
//!
//! These tests verify that:
//! 1. Output length and order always match the input
//! 2. A failing lookup only affects its own result
//! 3. No more than `concurrency` lookups are ever in flight
//! 4. Cancellation fills every unfinished slot with a cancelled error
//! 5. A panicking lookup is reported in its own slot and the batch continues

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tes_client::{
    BulkClient, Error, GetTaskRequest, Result, State, Task, TaskLookup, TaskView,
    DEFAULT_CONCURRENCY,
};
use tokio_util::sync::CancellationToken;

/// Lookup that records concurrency and sleeps per call.
struct Instrumented {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
    failing: HashSet<String>,
    seen: Mutex<Vec<(String, TaskView)>>,
}

impl Instrumented {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            failing: HashSet::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(mut self, ids: &[&str]) -> Self {
        self.failing = ids.iter().map(|s| s.to_string()).collect();
        self
    }
}

#[async_trait]
impl TaskLookup for Instrumented {
    async fn get_task(&self, id: &str, view: TaskView) -> Result<Task> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((id.to_string(), view));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.contains(id) {
            return Err(Error::Status {
                status: 500,
                body: format!("lookup of {id} failed"),
            });
        }
        Ok(Task {
            id: id.to_string(),
            state: State::Running,
            ..Task::default()
        })
    }
}

fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("task-{i}")).collect()
}

#[tokio::test(start_paused = true)]
async fn test_results_follow_request_order() {
    let lookup = Arc::new(Instrumented::new(Duration::from_millis(10)));
    let requests: Vec<GetTaskRequest> = ids(17)
        .into_iter()
        .enumerate()
        .map(|(i, id)| {
            let view = if i % 2 == 0 { TaskView::Full } else { TaskView::Basic };
            GetTaskRequest::new(id, view)
        })
        .collect();

    let results = BulkClient::new(lookup.clone())
        .with_concurrency(4)
        .dispatch(requests.clone())
        .await;

    assert_eq!(results.len(), requests.len());
    for (result, request) in results.iter().zip(&requests) {
        assert_eq!(result.request(), request);
        assert_eq!(result.task().map(|t| t.id.as_str()), Some(request.id.as_str()));
    }
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 17);

    // Each request is looked up exactly once, with its own view.
    let mut seen = lookup.seen.lock().unwrap().clone();
    seen.sort_by(|a, b| a.0.cmp(&b.0));
    let mut expected: Vec<(String, TaskView)> =
        requests.iter().map(|r| (r.id.clone(), r.view)).collect();
    expected.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(seen, expected);
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_isolated() {
    let lookup = Arc::new(Instrumented::new(Duration::from_millis(5)).failing(&["task-1"]));
    let results = BulkClient::new(lookup)
        .with_concurrency(2)
        .dispatch_by_id(ids(3), TaskView::Minimal)
        .await;

    assert!(results[0].is_ok());
    assert!(!results[1].is_ok());
    assert_eq!(results[1].error().and_then(Error::status), Some(500));
    assert!(results[1].task().is_none());
    assert!(results[2].is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_bound_is_respected() {
    let lookup = Arc::new(Instrumented::new(Duration::from_millis(50)));
    let results = BulkClient::new(lookup.clone())
        .with_concurrency(3)
        .dispatch_by_id(ids(20), TaskView::Minimal)
        .await;

    assert_eq!(results.len(), 20);
    assert!(results.iter().all(|r| r.is_ok()));
    let max = lookup.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 3, "saw {max} lookups in flight");
    assert!(max >= 2, "expected lookups to overlap, saw {max}");
}

#[tokio::test(start_paused = true)]
async fn test_zero_concurrency_uses_default() {
    let lookup = Arc::new(Instrumented::new(Duration::from_millis(50)));
    let results = BulkClient::new(lookup.clone())
        .with_concurrency(0)
        .dispatch_by_id(ids(12), TaskView::Minimal)
        .await;

    assert_eq!(results.len(), 12);
    assert_eq!(
        lookup.max_in_flight.load(Ordering::SeqCst),
        DEFAULT_CONCURRENCY
    );
}

#[tokio::test(start_paused = true)]
async fn test_fewer_requests_than_workers() {
    let lookup = Arc::new(Instrumented::new(Duration::from_millis(10)));
    let results = BulkClient::new(lookup.clone())
        .with_concurrency(8)
        .dispatch_by_id(ids(2), TaskView::Minimal)
        .await;

    assert_eq!(results.len(), 2);
    assert!(lookup.max_in_flight.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_empty_input_never_calls_lookup() {
    let lookup = Arc::new(Instrumented::new(Duration::ZERO));
    let results = BulkClient::new(lookup.clone())
        .dispatch_by_id(Vec::<String>::new(), TaskView::Full)
        .await;

    assert!(results.is_empty());
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_dispatch() {
    let lookup = Arc::new(Instrumented::new(Duration::from_millis(10)));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let results = BulkClient::new(lookup.clone())
        .dispatch_by_id_with_cancel(ids(6), TaskView::Minimal, cancel)
        .await;

    assert_eq!(results.len(), 6);
    for (result, id) in results.iter().zip(ids(6)) {
        assert_eq!(result.request().id, id);
        assert!(result.error().is_some_and(Error::is_cancelled));
    }
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_flight() {
    let lookup = Arc::new(Instrumented::new(Duration::from_secs(1)));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        // Lets the first wave (two lookups) finish, then cancels the second.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        trigger.cancel();
    });

    let results = BulkClient::new(lookup.clone())
        .with_concurrency(2)
        .dispatch_by_id_with_cancel(ids(6), TaskView::Minimal, cancel)
        .await;

    assert_eq!(results.len(), 6);
    let completed = results.iter().filter(|r| r.is_ok()).count();
    let cancelled = results
        .iter()
        .filter(|r| r.error().is_some_and(Error::is_cancelled))
        .count();
    assert_eq!(completed, 2);
    assert_eq!(cancelled, 4);
    assert!(results[0].is_ok() && results[1].is_ok());
    assert!(lookup.calls.load(Ordering::SeqCst) <= 4);
}

/// Lookup that panics for one id and counts every call.
struct Panicking {
    bad_id: &'static str,
    calls: AtomicUsize,
}

#[async_trait]
impl TaskLookup for Panicking {
    async fn get_task(&self, id: &str, _view: TaskView) -> Result<Task> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if id == self.bad_id {
            panic!("lookup of {id} blew up");
        }
        Ok(Task {
            id: id.to_string(),
            ..Task::default()
        })
    }
}

#[tokio::test]
async fn test_panicking_lookup_stays_in_its_slot() {
    let lookup = Arc::new(Panicking {
        bad_id: "boom",
        calls: AtomicUsize::new(0),
    });
    let results = BulkClient::new(lookup.clone())
        .with_concurrency(1)
        .dispatch_by_id(["a", "boom", "c"], TaskView::Minimal)
        .await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    match results[1].error() {
        Some(Error::LookupPanicked(message)) => assert!(message.contains("boom")),
        other => panic!("expected a panic error, got {other:?}"),
    }
    assert!(!results[1].error().is_some_and(Error::is_cancelled));
    assert_eq!(results[2].task().map(|t| t.id.as_str()), Some("c"));
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_dispatch_preserves_length_and_order(
            n in 0usize..40,
            concurrency in 0usize..10,
            fail_mask in proptest::collection::vec(any::<bool>(), 40),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .start_paused(true)
                .build()
                .unwrap();

            let requests = ids(n);
            let failing: Vec<&str> = requests
                .iter()
                .zip(&fail_mask)
                .filter(|(_, fail)| **fail)
                .map(|(id, _)| id.as_str())
                .collect();
            let lookup = Arc::new(Instrumented::new(Duration::from_millis(3)).failing(&failing));

            let results = runtime.block_on(
                BulkClient::new(lookup.clone())
                    .with_concurrency(concurrency)
                    .dispatch_by_id(requests.clone(), TaskView::Minimal),
            );

            prop_assert_eq!(results.len(), n);
            for (i, result) in results.iter().enumerate() {
                prop_assert_eq!(&result.request().id, &requests[i]);
                prop_assert_eq!(result.is_ok(), !fail_mask[i]);
            }
            let bound = if concurrency == 0 { DEFAULT_CONCURRENCY } else { concurrency };
            prop_assert!(lookup.max_in_flight.load(Ordering::SeqCst) <= bound);
            prop_assert_eq!(lookup.calls.load(Ordering::SeqCst), n);
        }
    }
}
