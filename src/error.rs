//! Error types for TES client operations.
//!
//! All fallible operations in this crate return [`Result`], whose error
//! type [`Error`] groups failures into four categories:
//!
//! - **transport**: the request never produced an HTTP response
//!   (connection refused, DNS failure, timeout).
//! - **protocol**: the server answered with a non-2xx status or a body that
//!   does not decode into the expected message.
//! - **task failure**: a polled task reached `EXECUTOR_ERROR`,
//!   `SYSTEM_ERROR` or `CANCELED` (only produced by
//!   [`TaskWaiter`](crate::client::waiter::TaskWaiter)).
//! - **validation**: a task submitted for creation is malformed. Raised
//!   before any network call is made.

use thiserror::Error;

use crate::types::state::State;
use crate::types::validate::ValidationError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a TES server.
///
/// # Examples
///
/// ```
/// use tes_client::Error;
///
/// let err = Error::Status {
///     status: 404,
///     body: "task not found".to_string(),
/// };
/// assert_eq!(err.status(), Some(404));
/// assert!(err.is_protocol());
/// assert_eq!(err.to_string(), "[STATUS CODE - 404]\ttask not found");
/// ```
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Connection-level failure (DNS resolution, TCP connect, timeout,
    /// body read).
    #[error("transport error: {message}")]
    Transport {
        /// Description of the underlying failure.
        message: String,
        /// Whether the request hit the configured timeout.
        timeout: bool,
    },

    /// The server answered with a non-success status code.
    #[error("[STATUS CODE - {status}]\t{body}")]
    Status {
        /// Numeric HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body could not be decoded into the expected message.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A message could not be encoded to JSON.
    #[error("failed to encode message: {0}")]
    Encode(String),

    /// A polled task reached a failure-terminal state.
    #[error("Task {task_id} exited with state {state}")]
    TaskFailed {
        /// Identifier of the failed task.
        task_id: String,
        /// The state that ended the wait.
        state: State,
    },

    /// A task submitted for creation failed validation.
    #[error("invalid task message: {0}")]
    Validation(#[from] ValidationError),

    /// The server address could not be turned into a usable endpoint.
    #[error("invalid protocol: '{scheme}'; expected: 'http://' or 'https://'")]
    InvalidEndpoint {
        /// The offending scheme prefix, e.g. `ftp://`.
        scheme: String,
    },

    /// Client configuration could not be loaded or applied.
    #[error("configuration error: {0}")]
    Config(String),

    /// A log accessor was asked to grow past the supported bound.
    #[error("log index {index} out of range (limit {limit})")]
    LogIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Exclusive upper bound on indices.
        limit: usize,
    },

    /// A lookup panicked. Only produced by the bulk client, which records it
    /// in the affected slot and keeps going.
    #[error("lookup panicked: {0}")]
    LookupPanicked(String),

    /// The operation was cancelled before it produced a result.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns the HTTP status code associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for connection-level failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns `true` for non-2xx responses and undecodable payloads.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Decode(_))
    }

    /// Returns `true` if a waited-on task ended in a failure state.
    pub fn is_task_failure(&self) -> bool {
        matches!(self, Self::TaskFailed { .. })
    }

    /// Returns `true` if the operation was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Classify a [`reqwest::Error`] into the matching variant.
    pub fn classify_reqwest(err: &reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            Self::Transport {
                message: err.to_string(),
                timeout: err.is_timeout(),
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::classify_reqwest(&err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("TOML parse error: {}", err))
    }
}
