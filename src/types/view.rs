//! Task views and the projections that implement them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::task::Task;
use super::EnumRepr;

/// Selects how much of a task a lookup returns.
///
/// Each view is an explicit projection over [`Task`]:
///
/// | View | Retained fields |
/// |---|---|
/// | `MINIMAL` | `id`, `state` |
/// | `BASIC` | everything except input `content` and executor `stdout`/`stderr` |
/// | `FULL` | everything |
///
/// # Examples
///
/// ```
/// use tes_client::{State, Task, TaskView};
///
/// let task = Task {
///     id: "t1".to_string(),
///     state: State::Running,
///     name: "align".to_string(),
///     ..Task::default()
/// };
/// let minimal = TaskView::Minimal.project(&task);
/// assert_eq!(minimal.id, "t1");
/// assert!(minimal.name.is_empty());
/// assert_eq!(TaskView::Basic.to_string(), "BASIC");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "EnumRepr", into = "&'static str")]
pub enum TaskView {
    /// Identifier and state only.
    #[default]
    Minimal,
    /// All fields except bulky content and executor output.
    Basic,
    /// The complete task.
    Full,
}

impl TaskView {
    /// The upper-case wire name, also used in the `view` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "MINIMAL",
            Self::Basic => "BASIC",
            Self::Full => "FULL",
        }
    }

    /// Reduce `task` to the fields retained by this view.
    pub fn project(&self, task: &Task) -> Task {
        match self {
            Self::Minimal => Task {
                id: task.id.clone(),
                state: task.state,
                ..Task::default()
            },
            Self::Basic => {
                let mut view = task.clone();
                for input in &mut view.inputs {
                    input.content.clear();
                }
                for attempt in &mut view.logs {
                    for exec in &mut attempt.logs {
                        exec.stdout.clear();
                        exec.stderr.clear();
                    }
                }
                view
            },
            Self::Full => task.clone(),
        }
    }
}

impl fmt::Display for TaskView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TaskView> for &'static str {
    fn from(view: TaskView) -> Self {
        view.as_str()
    }
}

impl TryFrom<EnumRepr> for TaskView {
    type Error = String;

    fn try_from(repr: EnumRepr) -> Result<Self, Self::Error> {
        match repr {
            EnumRepr::Name(name) => match name.as_str() {
                "MINIMAL" => Ok(Self::Minimal),
                "BASIC" => Ok(Self::Basic),
                "FULL" => Ok(Self::Full),
                _ => Err(format!("unknown task view: {name}")),
            },
            EnumRepr::Number(0) => Ok(Self::Minimal),
            EnumRepr::Number(1) => Ok(Self::Basic),
            EnumRepr::Number(2) => Ok(Self::Full),
            EnumRepr::Number(n) => Err(format!("unknown task view number: {n}")),
        }
    }
}
