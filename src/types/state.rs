//! Task lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::EnumRepr;

/// Lifecycle state of a task as reported by the server.
///
/// States are split into two disjoint groups:
///
/// - **active**: `QUEUED`, `INITIALIZING`, `RUNNING`
/// - **final**: `COMPLETE`, `EXECUTOR_ERROR`, `SYSTEM_ERROR`, `CANCELED`
///
/// `UNKNOWN` and `PAUSED` belong to neither group.
///
/// On the wire a state is its upper-case name; decoding also accepts the
/// numeric enum value.
///
/// # Examples
///
/// ```
/// use tes_client::State;
///
/// assert!(State::Running.is_active());
/// assert!(State::Complete.is_final());
/// assert!(!State::Paused.is_active() && !State::Paused.is_final());
/// assert_eq!(serde_json::to_value(State::SystemError).unwrap(), "SYSTEM_ERROR");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "EnumRepr", into = "&'static str")]
pub enum State {
    /// State not reported or not recognized.
    #[default]
    Unknown,
    /// Waiting for resources.
    Queued,
    /// Resources allocated, inputs being staged.
    Initializing,
    /// Executors are running.
    Running,
    /// Execution suspended by the server.
    Paused,
    /// All executors finished successfully (final).
    Complete,
    /// An executor exited with a non-zero code (final).
    ExecutorError,
    /// The service failed to run the task (final).
    SystemError,
    /// The task was cancelled (final).
    Canceled,
}

impl State {
    /// Every state, in wire-number order.
    pub const ALL: [State; 9] = [
        State::Unknown,
        State::Queued,
        State::Initializing,
        State::Running,
        State::Paused,
        State::Complete,
        State::ExecutorError,
        State::SystemError,
        State::Canceled,
    ];

    /// Returns `true` for `COMPLETE`, `EXECUTOR_ERROR`, `SYSTEM_ERROR` and
    /// `CANCELED`.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Complete | Self::ExecutorError | Self::SystemError | Self::Canceled
        )
    }

    /// Returns `true` for `QUEUED`, `INITIALIZING` and `RUNNING`.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Initializing | Self::Running)
    }

    /// Returns `true` for the final states that indicate the task did not
    /// succeed.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ExecutorError | Self::SystemError | Self::Canceled
        )
    }

    /// The upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Queued => "QUEUED",
            Self::Initializing => "INITIALIZING",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Complete => "COMPLETE",
            Self::ExecutorError => "EXECUTOR_ERROR",
            Self::SystemError => "SYSTEM_ERROR",
            Self::Canceled => "CANCELED",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    fn from_number(n: i64) -> Option<Self> {
        usize::try_from(n).ok().and_then(|i| Self::ALL.get(i).copied())
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<State> for &'static str {
    fn from(state: State) -> Self {
        state.as_str()
    }
}

impl TryFrom<EnumRepr> for State {
    type Error = String;

    fn try_from(repr: EnumRepr) -> Result<Self, Self::Error> {
        match repr {
            EnumRepr::Name(name) => {
                Self::from_name(&name).ok_or_else(|| format!("unknown task state: {name}"))
            },
            EnumRepr::Number(n) => {
                Self::from_number(n).ok_or_else(|| format!("unknown task state number: {n}"))
            },
        }
    }
}
