//! Request and response messages for the task endpoints.

use serde::{Deserialize, Serialize};

use super::task::Task;
use super::view::TaskView;

/// Parameters for `GET /v1/tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GetTaskRequest {
    /// Identifier of the task to fetch.
    pub id: String,
    /// How much of the task to return.
    #[serde(default)]
    pub view: TaskView,
}

impl GetTaskRequest {
    /// Create a request for `id` with the given view.
    pub fn new(id: impl Into<String>, view: TaskView) -> Self {
        Self {
            id: id.into(),
            view,
        }
    }
}

/// Parameters for `GET /v1/tasks`.
///
/// Empty strings and a zero page size are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListTasksRequest {
    /// Only return tasks whose name starts with this prefix.
    pub name_prefix: String,
    /// Maximum number of tasks per page; `0` lets the server decide.
    pub page_size: u32,
    /// Continuation token from a previous [`ListTasksResponse`].
    pub page_token: String,
    pub view: TaskView,
}

impl ListTasksRequest {
    /// Create a request for the first page with the given view.
    pub fn new(view: TaskView) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    /// Restrict results to names starting with `prefix`.
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Continue from a previous page.
    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = token.into();
        self
    }

    /// Query-string pairs in the order the server documents them.
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if !self.name_prefix.is_empty() {
            pairs.push(("name_prefix", self.name_prefix.clone()));
        }
        if self.page_size != 0 {
            pairs.push(("page_size", self.page_size.to_string()));
        }
        if !self.page_token.is_empty() {
            pairs.push(("page_token", self.page_token.clone()));
        }
        pairs.push(("view", self.view.as_str().to_string()));
        pairs
    }
}

/// One page of tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListTasksResponse {
    pub tasks: Vec<Task>,
    /// Token for the next page; empty on the last page.
    #[serde(alias = "next_page_token", skip_serializing_if = "String::is_empty")]
    pub next_page_token: String,
}

impl ListTasksResponse {
    /// Returns `true` if another page is available.
    pub fn has_next_page(&self) -> bool {
        !self.next_page_token.is_empty()
    }
}

/// Response to `POST /v1/tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateTaskResponse {
    /// Identifier assigned to the new task.
    pub id: String,
}

/// Response to `POST /v1/tasks/{id}:cancel`. The server returns an empty
/// object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelTaskResponse {}

/// Response to `GET /v1/tasks/service-info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    /// Service name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Free-form documentation for the service.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub doc: String,
    /// Storage locations (URL prefixes) the service can read and write.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub storage: Vec<String>,
}
