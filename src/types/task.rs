//! The task message and its nested types.
//!
//! Field names follow the protobuf JSON mapping used by TES servers
//! (lowerCamelCase). Every field is optional on the wire: absent fields
//! decode to their defaults and default-valued fields are omitted when
//! encoding, so a MINIMAL-view response decodes into a [`Task`] with only
//! `id` and `state` populated.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::state::State;
use super::EnumRepr;
use crate::error::{Error, Result};

/// Exclusive upper bound on the indices accepted by the growing log
/// accessors ([`Task::task_log_mut`], [`Task::executor_log_mut`]).
pub const MAX_LOG_ENTRIES: usize = 1024;

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// A unit of work tracked by the task service.
///
/// # Examples
///
/// ```
/// use tes_client::{State, Task};
///
/// let task: Task = serde_json::from_str(r#"{"id": "b8581", "state": "RUNNING"}"#).unwrap();
/// assert_eq!(task.id, "b8581");
/// assert_eq!(task.state, State::Running);
/// assert!(task.executors.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    /// Server-assigned identifier.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Current lifecycle state.
    #[serde(skip_serializing_if = "is_default")]
    pub state: State,

    /// User-provided name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// User-provided description.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Files staged into the task before execution.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<TaskParameter>,

    /// Files staged out of the task after execution.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<TaskParameter>,

    /// Requested compute resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,

    /// Commands to run, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub executors: Vec<Executor>,

    /// Absolute paths of shared working volumes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,

    /// Arbitrary key/value tags.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    /// One log record per execution attempt.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<TaskLog>,

    /// RFC 3339 creation timestamp, set by the server.
    #[serde(alias = "creation_time", skip_serializing_if = "String::is_empty")]
    pub creation_time: String,
}

/// Kind of filesystem object a [`TaskParameter`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "EnumRepr", into = "&'static str")]
pub enum FileType {
    /// A single file.
    #[default]
    File,
    /// A directory tree.
    Directory,
}

impl From<FileType> for &'static str {
    fn from(kind: FileType) -> Self {
        match kind {
            FileType::File => "FILE",
            FileType::Directory => "DIRECTORY",
        }
    }
}

impl TryFrom<EnumRepr> for FileType {
    type Error = String;

    fn try_from(repr: EnumRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            EnumRepr::Name(name) if name == "FILE" => Ok(Self::File),
            EnumRepr::Name(name) if name == "DIRECTORY" => Ok(Self::Directory),
            EnumRepr::Number(0) => Ok(Self::File),
            EnumRepr::Number(1) => Ok(Self::Directory),
            EnumRepr::Name(name) => Err(format!("unknown file type: {name}")),
            EnumRepr::Number(n) => Err(format!("unknown file type number: {n}")),
        }
    }
}

/// An input or output file of a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskParameter {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Storage URL the file is copied from (inputs) or to (outputs).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Absolute path inside the task's containers.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(rename = "type", skip_serializing_if = "is_default")]
    pub kind: FileType,
    /// Inline file content, used instead of `url` for small inputs.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
}

/// Compute resources requested for a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resources {
    #[serde(alias = "cpu_cores", skip_serializing_if = "is_default")]
    pub cpu_cores: u32,
    #[serde(skip_serializing_if = "is_default")]
    pub preemptible: bool,
    #[serde(alias = "ram_gb", skip_serializing_if = "is_default")]
    pub ram_gb: f64,
    #[serde(alias = "disk_gb", skip_serializing_if = "is_default")]
    pub disk_gb: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<String>,
}

/// A container command run as part of a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Executor {
    /// Container image, e.g. `ubuntu:22.04`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    /// Command and arguments.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workdir: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdin: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Log record for one execution attempt of a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskLog {
    /// One entry per executor.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<ExecutorLog>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(alias = "start_time", skip_serializing_if = "String::is_empty")]
    pub start_time: String,
    #[serde(alias = "end_time", skip_serializing_if = "String::is_empty")]
    pub end_time: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputFileLog>,
    #[serde(alias = "system_logs", skip_serializing_if = "Vec::is_empty")]
    pub system_logs: Vec<String>,
}

/// Log record for a single executor run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorLog {
    #[serde(alias = "start_time", skip_serializing_if = "String::is_empty")]
    pub start_time: String,
    #[serde(alias = "end_time", skip_serializing_if = "String::is_empty")]
    pub end_time: String,
    /// Captured standard output (tail), only present in the FULL view.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    /// Captured standard error (tail), only present in the FULL view.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    #[serde(alias = "exit_code", skip_serializing_if = "is_default")]
    pub exit_code: i32,
}

/// An output file produced by a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputFileLog {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    /// Size in bytes. Encoded as a string, per the int64 JSON mapping; a
    /// bare JSON number is also accepted.
    #[serde(
        alias = "size_bytes",
        deserialize_with = "int64_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub size_bytes: String,
}

/// Protobuf JSON writes 64-bit integers as strings but readers accept
/// numbers too.
fn int64_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64Repr {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Int64Repr::deserialize(deserializer)? {
        Int64Repr::Text(text) => text,
        Int64Repr::Signed(n) => n.to_string(),
        Int64Repr::Unsigned(n) => n.to_string(),
    })
}

fn check_log_index(index: usize) -> Result<()> {
    if index >= MAX_LOG_ENTRIES {
        return Err(Error::LogIndexOutOfRange {
            index,
            limit: MAX_LOG_ENTRIES,
        });
    }
    Ok(())
}

impl Task {
    /// Returns the log record for execution attempt `attempt`, appending
    /// empty records as needed to reach it.
    ///
    /// Fails with [`Error::LogIndexOutOfRange`] when `attempt` is at or above
    /// [`MAX_LOG_ENTRIES`].
    ///
    /// # Examples
    ///
    /// ```
    /// use tes_client::Task;
    ///
    /// let mut task = Task::default();
    /// task.task_log_mut(2).unwrap().start_time = "2024-01-01T00:00:00Z".into();
    /// assert_eq!(task.logs.len(), 3);
    /// assert!(task.task_log_mut(1_000_000).is_err());
    /// ```
    pub fn task_log_mut(&mut self, attempt: usize) -> Result<&mut TaskLog> {
        check_log_index(attempt)?;
        if self.logs.len() <= attempt {
            self.logs.resize_with(attempt + 1, TaskLog::default);
        }
        Ok(&mut self.logs[attempt])
    }

    /// Returns executor log `index` of attempt `attempt`, growing both
    /// sequences as needed. Same bound as [`task_log_mut`](Self::task_log_mut).
    pub fn executor_log_mut(&mut self, attempt: usize, index: usize) -> Result<&mut ExecutorLog> {
        check_log_index(index)?;
        let task_log = self.task_log_mut(attempt)?;
        if task_log.logs.len() <= index {
            task_log.logs.resize_with(index + 1, ExecutorLog::default);
        }
        Ok(&mut task_log.logs[index])
    }
}
