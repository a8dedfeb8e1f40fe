//! Polling until a set of tasks completes.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::config::DEFAULT_POLL_INTERVAL_MS;
use super::TaskLookup;
use crate::error::{Error, Result};
use crate::types::{State, TaskView};

/// Polls tasks with the minimal view until all of them are `COMPLETE`.
///
/// Each cycle looks up every id once, in order. The wait succeeds when a
/// single cycle observes `COMPLETE` for every id. It fails as soon as a
/// lookup errors or a task reports `EXECUTOR_ERROR`, `SYSTEM_ERROR` or
/// `CANCELED`. Any other state, including `PAUSED` and `UNKNOWN`, counts as
/// pending.
///
/// The first cycle runs immediately; later cycles start one poll interval
/// after the previous one started (or when it finished, if it overran).
/// There is no overall deadline; use
/// [`wait_with_cancel`](Self::wait_with_cancel) to bound the wait.
#[derive(Clone)]
pub struct TaskWaiter {
    client: Arc<dyn TaskLookup>,
    poll_interval: Duration,
}

impl std::fmt::Debug for TaskWaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskWaiter")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl TaskWaiter {
    pub fn new(client: Arc<dyn TaskLookup>) -> Self {
        Self {
            client,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Set the time between cycles. Clamped to at least one millisecond.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait until every task in `ids` is `COMPLETE`.
    ///
    /// An empty `ids` returns `Ok(())` without any lookups.
    pub async fn wait<S: AsRef<str> + Sync>(&self, ids: &[S]) -> Result<()> {
        self.wait_with_cancel(ids, &CancellationToken::new()).await
    }

    /// Like [`wait`](Self::wait), returning [`Error::Cancelled`] once
    /// `cancel` fires. Cancellation is observed between cycles and between
    /// lookups.
    pub async fn wait_with_cancel<S: AsRef<str> + Sync>(
        &self,
        ids: &[S],
        cancel: &CancellationToken,
    ) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycle: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = ticker.tick() => {},
            }
            cycle += 1;

            if self.poll_cycle(ids, cancel).await? {
                tracing::info!(tasks = ids.len(), cycles = cycle, "all tasks complete");
                return Ok(());
            }
            tracing::trace!(cycle, "tasks still pending");
        }
    }

    /// One pass over `ids`. Returns `true` if every task was `COMPLETE`.
    async fn poll_cycle<S: AsRef<str> + Sync>(
        &self,
        ids: &[S],
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let mut all_complete = true;
        for id in ids {
            let id = id.as_ref();
            let task = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                result = self.client.get_task(id, TaskView::Minimal) => result?,
            };

            match task.state {
                State::Complete => {},
                state if state.is_failure() => {
                    tracing::warn!(task_id = id, %state, "task failed");
                    return Err(Error::TaskFailed {
                        task_id: id.to_string(),
                        state,
                    });
                },
                _ => all_complete = false,
            }
        }
        Ok(all_complete)
    }
}
