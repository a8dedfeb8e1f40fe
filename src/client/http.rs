//! HTTP transport for the task endpoints.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::bulk::BulkClient;
use super::config::ClientConfig;
use super::waiter::TaskWaiter;
use super::TaskLookup;
use crate::error::{Error, Result};
use crate::shared::codec::MarshalOptions;
use crate::shared::endpoint::normalize_endpoint;
use crate::types::{
    CancelTaskResponse, CreateTaskResponse, ListTasksRequest, ListTasksResponse, ServiceInfo,
    Task, TaskView,
};

const TASKS_PATH: &str = "/v1/tasks";

/// Client for a single TES server.
///
/// Every operation is one HTTP round trip: no retries, no caching. The
/// client is cheap to clone and all clones share one connection pool.
///
/// # Examples
///
/// ```rust,no_run
/// use tes_client::{TaskClient, TaskView};
///
/// # async fn run() -> tes_client::Result<()> {
/// let client = TaskClient::new("https://tes.example.org")?;
/// let task = client.get_task("task-1", TaskView::Basic).await?;
/// println!("{} is {}", task.id, task.state);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TaskClient {
    base: Url,
    http: reqwest::Client,
    config: ClientConfig,
    codec: MarshalOptions,
}

impl TaskClient {
    /// Create a client for `address` with default settings.
    ///
    /// The address is normalized to `scheme://authority`; a missing scheme
    /// becomes `http://`.
    pub fn new(address: &str) -> Result<Self> {
        Self::with_config(ClientConfig::new(address))
    }

    /// Create a client from a full configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = reqwest::Client::builder().timeout(config.timeout());
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;
        Self::with_http_client(config, http)
    }

    /// Create a client that sends requests through an existing
    /// [`reqwest::Client`]. The configured timeout and user agent are not
    /// applied to it.
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Result<Self> {
        let endpoint = normalize_endpoint(&config.address)?;
        let base = Url::parse(&endpoint)
            .map_err(|e| Error::Config(format!("invalid server address '{}': {}", endpoint, e)))?;
        tracing::debug!(endpoint = %base, "created TES client");
        Ok(Self {
            base,
            http,
            config,
            codec: MarshalOptions::compact(),
        })
    }

    /// Normalized server endpoint, e.g. `http://localhost:8000`.
    pub fn endpoint(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch a single task.
    pub async fn get_task(&self, id: &str, view: TaskView) -> Result<Task> {
        let mut url = self.task_url(id, "");
        url.query_pairs_mut().append_pair("view", view.as_str());
        tracing::debug!(task_id = id, %view, "GET task");
        self.execute(self.http.get(url)).await
    }

    /// Fetch one page of tasks.
    pub async fn list_tasks(&self, request: &ListTasksRequest) -> Result<ListTasksResponse> {
        let mut url = self.url(TASKS_PATH);
        url.query_pairs_mut()
            .extend_pairs(request.query_pairs().iter().map(|(k, v)| (*k, v.as_str())));
        tracing::debug!(view = %request.view, page_token = %request.page_token, "GET tasks");
        self.execute(self.http.get(url)).await
    }

    /// Fetch every page of tasks, starting from `request`'s page token.
    pub async fn list_all_tasks(&self, request: &ListTasksRequest) -> Result<Vec<Task>> {
        let mut request = request.clone();
        let mut tasks = Vec::new();
        loop {
            let page = self.list_tasks(&request).await?;
            tasks.extend(page.tasks);
            if page.next_page_token.is_empty() {
                break;
            }
            request.page_token = page.next_page_token;
        }
        Ok(tasks)
    }

    /// Submit a new task.
    ///
    /// The task is validated first; a malformed task returns
    /// [`Error::Validation`] without contacting the server.
    pub async fn create_task(&self, task: &Task) -> Result<CreateTaskResponse> {
        task.validate()?;
        let body = self.codec.encode_to_vec(task)?;
        tracing::debug!(name = %task.name, "POST task");
        let request = self
            .http
            .post(self.url(TASKS_PATH))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body);
        self.execute(request).await
    }

    /// Ask the server to cancel a task.
    pub async fn cancel_task(&self, id: &str) -> Result<CancelTaskResponse> {
        tracing::debug!(task_id = id, "POST cancel");
        let request = self
            .http
            .post(self.task_url(id, ":cancel"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.execute(request).await
    }

    /// Fetch server metadata.
    pub async fn service_info(&self) -> Result<ServiceInfo> {
        tracing::debug!("GET service-info");
        let url = self.url(&format!("{}/service-info", TASKS_PATH));
        self.execute(self.http.get(url)).await
    }

    /// Bulk client sharing this client's connection pool and configured
    /// concurrency.
    pub fn bulk(&self) -> BulkClient {
        BulkClient::new(Arc::new(self.clone())).with_concurrency(self.config.concurrency)
    }

    /// Waiter sharing this client's connection pool and configured poll
    /// interval.
    pub fn waiter(&self) -> TaskWaiter {
        TaskWaiter::new(Arc::new(self.clone())).with_poll_interval(self.config.poll_interval())
    }

    /// Block until every task in `ids` is `COMPLETE`.
    ///
    /// See [`TaskWaiter::wait`].
    pub async fn wait_for_tasks<S: AsRef<str> + Sync>(&self, ids: &[S]) -> Result<()> {
        self.waiter().wait(ids).await
    }

    /// Like [`wait_for_tasks`](Self::wait_for_tasks), stopping with
    /// [`Error::Cancelled`] once `cancel` fires.
    pub async fn wait_for_tasks_with_cancel<S: AsRef<str> + Sync>(
        &self,
        ids: &[S],
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.waiter().wait_with_cancel(ids, cancel).await
    }

    fn url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }

    fn task_url(&self, id: &str, suffix: &str) -> Url {
        self.url(&format!("{}/{}{}", TASKS_PATH, urlencoding::encode(id), suffix))
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| Error::classify_reqwest(&e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::classify_reqwest(&e))?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "server returned error status");
            return Err(Error::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        self.codec.decode(&body)
    }
}

#[async_trait]
impl TaskLookup for TaskClient {
    async fn get_task(&self, id: &str, view: TaskView) -> Result<Task> {
        TaskClient::get_task(self, id, view).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn endpoint_is_normalized() {
        let client = TaskClient::new("localhost:8000/some/page").unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8000");
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let err = TaskClient::new("ftp://localhost:8000").unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
    }

    #[test]
    fn task_urls_escape_ids() {
        let client = TaskClient::new("http://localhost:8000").unwrap();
        assert_eq!(
            client.task_url("abc", ":cancel").as_str(),
            "http://localhost:8000/v1/tasks/abc:cancel"
        );
        assert_eq!(
            client.task_url("a/b c", "").as_str(),
            "http://localhost:8000/v1/tasks/a%2Fb%20c"
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = ClientConfig::new("localhost:8000").with_timeout(Duration::ZERO);
        let err = TaskClient::with_config(config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn helpers_inherit_config() {
        let config = ClientConfig::new("localhost:8000").with_concurrency(9);
        let client = TaskClient::with_config(config).unwrap();
        assert_eq!(client.bulk().concurrency(), 9);
    }
}
