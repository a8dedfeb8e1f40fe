//! Bounded-concurrency bulk task retrieval.
//!
//! [`BulkClient::dispatch`] turns a list of [`GetTaskRequest`]s into a list
//! of [`GetResult`]s of the same length and order. Lookups run on at most
//! `concurrency` worker tasks:
//!
//! 1. Every request is wrapped in a slot carrying its position and pushed
//!    onto a closed work queue.
//! 2. Up to `min(concurrency, len)` workers are spawned on a
//!    [`TaskTracker`]. Each worker pulls a slot, performs one lookup, fills
//!    in the outcome and hands the slot back on a completion channel.
//! 3. The collector places each returned slot at its index, then waits for
//!    the tracker to drain, so no worker outlives the call.
//!
//! Each slot is owned by exactly one worker at a time and no result storage
//! is shared. A failed lookup only affects its own slot; a panicking lookup
//! is caught and reported as [`Error::LookupPanicked`] in its slot, and the
//! worker moves on to the next one.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::config::{effective_concurrency, DEFAULT_CONCURRENCY};
use super::TaskLookup;
use crate::error::{Error, Result};
use crate::types::{GetTaskRequest, Task, TaskView};

/// Outcome of one lookup in a bulk dispatch.
///
/// Carries the original request alongside either the fetched task or the
/// error that stopped it.
#[derive(Debug, Clone)]
pub struct GetResult {
    request: GetTaskRequest,
    outcome: Option<Result<Task>>,
}

impl GetResult {
    fn pending(request: GetTaskRequest) -> Self {
        Self {
            request,
            outcome: None,
        }
    }

    fn cancelled(request: GetTaskRequest) -> Self {
        Self {
            request,
            outcome: Some(Err(Error::Cancelled)),
        }
    }

    /// The request this result answers.
    pub fn request(&self) -> &GetTaskRequest {
        &self.request
    }

    /// The fetched task, if the lookup succeeded.
    pub fn task(&self) -> Option<&Task> {
        match &self.outcome {
            Some(Ok(task)) => Some(task),
            _ => None,
        }
    }

    /// The lookup error, if the lookup failed.
    pub fn error(&self) -> Option<&Error> {
        match &self.outcome {
            Some(Err(err)) => Some(err),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, Some(Ok(_)))
    }

    /// Consume the result, yielding the task or the error.
    pub fn into_result(self) -> Result<Task> {
        self.outcome.unwrap_or(Err(Error::Cancelled))
    }
}

struct Slot {
    index: usize,
    result: GetResult,
}

/// Fetches many tasks concurrently through a [`TaskLookup`].
#[derive(Clone)]
pub struct BulkClient {
    client: Arc<dyn TaskLookup>,
    concurrency: usize,
}

impl std::fmt::Debug for BulkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkClient")
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl BulkClient {
    /// Create a bulk client with [`DEFAULT_CONCURRENCY`] workers.
    pub fn new(client: Arc<dyn TaskLookup>) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set the worker count. `0` selects [`DEFAULT_CONCURRENCY`].
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = effective_concurrency(concurrency);
        self
    }

    /// Effective worker count (never zero).
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch every request, returning results in request order.
    ///
    /// Never fails as a whole: per-item errors are reported in the matching
    /// [`GetResult`]. An empty input returns an empty output without
    /// calling the lookup.
    pub async fn dispatch(&self, requests: Vec<GetTaskRequest>) -> Vec<GetResult> {
        self.dispatch_with_cancel(requests, CancellationToken::new())
            .await
    }

    /// Fetch tasks by id, all with the same view.
    pub async fn dispatch_by_id<I, S>(&self, ids: I, view: TaskView) -> Vec<GetResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dispatch(by_id(ids, view)).await
    }

    /// [`dispatch_by_id`](Self::dispatch_by_id) with a cancellation token.
    pub async fn dispatch_by_id_with_cancel<I, S>(
        &self,
        ids: I,
        view: TaskView,
        cancel: CancellationToken,
    ) -> Vec<GetResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dispatch_with_cancel(by_id(ids, view), cancel).await
    }

    /// Like [`dispatch`](Self::dispatch), but stops early once `cancel`
    /// fires.
    ///
    /// In-flight lookups are abandoned and every request without an outcome
    /// yet reports [`Error::Cancelled`]. The output still has one entry per
    /// request, in order.
    pub async fn dispatch_with_cancel(
        &self,
        requests: Vec<GetTaskRequest>,
        cancel: CancellationToken,
    ) -> Vec<GetResult> {
        if requests.is_empty() {
            return Vec::new();
        }

        let total = requests.len();
        let workers = self.concurrency.min(total);
        tracing::debug!(requests = total, workers, "dispatching bulk lookup");

        let (work_tx, work_rx) = mpsc::unbounded_channel();
        for (index, request) in requests.iter().cloned().enumerate() {
            // The receiver is held locally, so sending cannot fail here.
            let _ = work_tx.send(Slot {
                index,
                result: GetResult::pending(request),
            });
        }
        drop(work_tx);

        let queue = Arc::new(Mutex::new(work_rx));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let tracker = TaskTracker::new();
        for worker_id in 0..workers {
            tracker.spawn(worker(
                worker_id,
                Arc::clone(&self.client),
                Arc::clone(&queue),
                done_tx.clone(),
                cancel.clone(),
            ));
        }
        tracker.close();
        drop(done_tx);

        let mut slots: Vec<Option<GetResult>> = std::iter::repeat_with(|| None).take(total).collect();
        while let Some(slot) = done_rx.recv().await {
            slots[slot.index] = Some(slot.result);
        }
        tracker.wait().await;

        let results: Vec<GetResult> = slots
            .into_iter()
            .zip(requests)
            .map(|(slot, request)| slot.unwrap_or_else(|| GetResult::cancelled(request)))
            .collect();

        let failed = results.iter().filter(|r| !r.is_ok()).count();
        tracing::debug!(requests = total, failed, "bulk lookup finished");
        results
    }
}

fn by_id<I, S>(ids: I, view: TaskView) -> Vec<GetTaskRequest>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter()
        .map(|id| GetTaskRequest::new(id, view))
        .collect()
}

async fn worker(
    worker_id: usize,
    client: Arc<dyn TaskLookup>,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<Slot>>>,
    done: mpsc::UnboundedSender<Slot>,
    cancel: CancellationToken,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(mut slot) = next else {
            break;
        };

        let outcome = if cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            let request = &slot.result.request;
            let lookup = AssertUnwindSafe(client.get_task(&request.id, request.view)).catch_unwind();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::Cancelled),
                result = lookup => result.unwrap_or_else(|payload| {
                    Err(Error::LookupPanicked(panic_message(payload.as_ref())))
                }),
            }
        };

        match &outcome {
            Ok(_) => {
                tracing::trace!(worker = worker_id, task_id = %slot.result.request.id, "lookup ok")
            },
            Err(Error::Cancelled) => {},
            Err(err) => tracing::warn!(
                worker = worker_id,
                task_id = %slot.result.request.id,
                error = %err,
                "lookup failed"
            ),
        }

        slot.result.outcome = Some(outcome);
        if done.send(slot).is_err() {
            break;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
