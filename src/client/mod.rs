//! Task service clients.
//!
//! - [`http::TaskClient`] performs one HTTP round trip per operation
//!   (get, list, create, cancel, service-info).
//! - [`bulk::BulkClient`] fetches many tasks with a bounded worker pool and
//!   returns results in request order.
//! - [`waiter::TaskWaiter`] polls a set of tasks until all are complete or
//!   one fails.
//!
//! The bulk client and the waiter only need single-task lookups, so they
//! depend on the [`TaskLookup`] trait rather than on the HTTP client. Tests
//! and alternative transports can plug in their own implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use tes_client::{TaskClient, TaskView};
//!
//! # async fn run() -> tes_client::Result<()> {
//! let client = TaskClient::new("localhost:8000")?;
//!
//! let results = client
//!     .bulk()
//!     .dispatch_by_id(["task-1", "task-2", "task-3"], TaskView::Minimal)
//!     .await;
//! for result in &results {
//!     match result.task() {
//!         Some(task) => println!("{} {}", task.id, task.state),
//!         None => println!("{} failed", result.request().id),
//!     }
//! }
//!
//! client.wait_for_tasks(&["task-1", "task-2"]).await?;
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod config;
pub mod http;
pub mod waiter;

pub use bulk::{BulkClient, GetResult};
pub use config::ClientConfig;
pub use http::TaskClient;
pub use waiter::TaskWaiter;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Task, TaskView};

/// Single-task lookup, the one operation the bulk client and the waiter
/// rely on.
///
/// Implementations perform exactly one remote call per invocation and do
/// not retry. They must be safe to call from several tasks at once.
#[async_trait]
pub trait TaskLookup: Send + Sync {
    /// Fetch task `id` with the given view.
    async fn get_task(&self, id: &str, view: TaskView) -> Result<Task>;
}
