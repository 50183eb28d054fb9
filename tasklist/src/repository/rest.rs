//! REST repository for the hosted row store.
//!
//! Talks to a PostgREST-style resource at `<endpoint>/rest/v1/<table>`
//! using the four query shapes in [`tasklist_proto::query`]. Every request
//! carries the access key both as `apikey` and as a bearer token.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use url::Url;

use tasklist_proto::query::{
    APIKEY_HEADER, DEFAULT_TABLE, Order, PREFER_HEADER, PREFER_MINIMAL, PREFER_REPRESENTATION,
    REST_PREFIX, SELECT_COLUMNS, eq_filter,
};
use tasklist_proto::row::{DonePatch, NewTaskRow, decode_rows, decode_single_row};
use tasklist_proto::task::{Task, TaskId};

use super::{RepositoryError, RepositoryKind, TaskRepository};

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection parameters for the hosted store.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the store (e.g., `https://project.example.co`).
    pub endpoint: Url,
    /// Access key.
    pub api_key: String,
    /// Table name under `/rest/v1/`.
    pub table: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl RemoteConfig {
    /// Creates a `RemoteConfig` for the default table and timeout.
    #[must_use]
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            endpoint,
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Full URL of the table resource.
    ///
    /// Returns `None` if the endpoint cannot carry a path (e.g. `mailto:`).
    #[must_use]
    pub fn table_url(&self) -> Option<Url> {
        table_url(&self.endpoint, &self.table)
    }
}

/// Appends `/rest/v1/<table>` to `endpoint`, keeping any existing path.
pub(crate) fn table_url(endpoint: &Url, table: &str) -> Option<Url> {
    let mut url = endpoint.clone();
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop_if_empty();
        segments.extend(REST_PREFIX.split('/').filter(|s| !s.is_empty()));
        segments.push(table);
    }
    url.set_query(None);
    Some(url)
}

/// Error body shape returned by the store.
#[derive(serde::Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`TaskRepository`] backed by the hosted store's REST interface.
pub struct RestRepository {
    client: Client,
    table_url: Url,
    api_key: String,
}

impl RestRepository {
    /// Builds a repository from connection parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Unavailable`] if the endpoint cannot carry
    /// a path, or [`RepositoryError::Transport`] if the HTTP client cannot
    /// be built.
    pub fn new(config: &RemoteConfig) -> Result<Self, RepositoryError> {
        let table_url = config.table_url().ok_or_else(|| {
            RepositoryError::Unavailable(format!("invalid endpoint: {}", config.endpoint))
        })?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            table_url,
            api_key: config.api_key.clone(),
        })
    }

    /// URL of the table resource this repository talks to.
    #[must_use]
    pub const fn table_url(&self) -> &Url {
        &self.table_url
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, self.table_url.clone())
            .header(APIKEY_HEADER, &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Returns the body of a success response, or a `Status` error.
    async fn read_body(response: Response) -> Result<Vec<u8>, RepositoryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.bytes().await?.to_vec());
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);
        Err(RepositoryError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

impl TaskRepository for RestRepository {
    async fn fetch_all(&self) -> Result<Vec<Task>, RepositoryError> {
        let response = self
            .request(Method::GET)
            .query(&[
                ("select", SELECT_COLUMNS),
                ("order", Order::CreatedDesc.as_param()),
            ])
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        let tasks = decode_rows(&body)?;
        tracing::debug!(count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }

    async fn insert(&self, row: &NewTaskRow) -> Result<Task, RepositoryError> {
        let response = self
            .request(Method::POST)
            .header(PREFER_HEADER, PREFER_REPRESENTATION)
            .json(&[row])
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        let task = decode_single_row(&body)?;
        tracing::debug!(id = %task.id, "inserted task");
        Ok(task)
    }

    async fn update_done(&self, id: TaskId, done: bool) -> Result<(), RepositoryError> {
        let response = self
            .request(Method::PATCH)
            .query(&[("id", eq_filter(id))])
            .header(PREFER_HEADER, PREFER_MINIMAL)
            .json(&DonePatch { done })
            .send()
            .await?;
        Self::read_body(response).await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: TaskId) -> Result<(), RepositoryError> {
        let response = self
            .request(Method::DELETE)
            .query(&[("id", eq_filter(id))])
            .send()
            .await?;
        Self::read_body(response).await?;
        Ok(())
    }

    fn kind(&self) -> RepositoryKind {
        RepositoryKind::Remote
    }
}
