//! Async client for GA4GH Task Execution Service (TES) servers.
//!
//! # Overview
//!
//! A TES server runs batch tasks (containers with inputs, outputs and
//! resource requests) and reports their lifecycle state. This crate talks
//! to the server's HTTP/JSON API and adds two helpers on top of single-task
//! lookups:
//!
//! - a **bulk client** that fetches many tasks with bounded concurrency and
//!   returns results in request order, one result per request;
//! - a **waiter** that polls a set of tasks until all are `COMPLETE`,
//!   failing fast when any of them fails.
//!
//! # Module Organization
//!
//! - [`client`] - HTTP client, bulk client, waiter and configuration
//! - [`types`] - Wire messages, task states, views and validation
//! - [`shared`] - Endpoint normalization and JSON encoding options
//! - [`error`] - Error taxonomy shared by every operation
//! - `logging` - Subscriber setup (requires the `logging` feature)
//!
//! # Example
//!
//! ```rust,no_run
//! use tes_client::{ClientConfig, TaskClient, TaskView};
//!
//! # async fn run() -> tes_client::Result<()> {
//! let config = ClientConfig::new("localhost:8000").with_concurrency(10);
//! let client = TaskClient::with_config(config)?;
//!
//! let results = client
//!     .bulk()
//!     .dispatch_by_id(vec!["a".to_string(), "b".to_string()], TaskView::Basic)
//!     .await;
//! for result in results {
//!     match result.into_result() {
//!         Ok(task) => println!("{}: {}", task.id, task.state),
//!         Err(err) => eprintln!("lookup failed: {err}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod shared;
pub mod types;

// Re-exports for ergonomic access
pub use client::bulk::{BulkClient, GetResult};
pub use client::config::{ClientConfig, DEFAULT_CONCURRENCY};
pub use client::http::TaskClient;
pub use client::waiter::TaskWaiter;
pub use client::TaskLookup;
pub use error::{Error, Result};
pub use shared::codec::{marshal_task, MarshalOptions};
pub use types::{
    CancelTaskResponse, CreateTaskResponse, Executor, ExecutorLog, FileType, GetTaskRequest,
    ListTasksRequest, ListTasksResponse, OutputFileLog, Resources, ServiceInfo, State, Task,
    TaskLog, TaskParameter, TaskView, ValidationError, MAX_LOG_ENTRIES,
};
