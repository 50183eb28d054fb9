//! HTTP surface of the development backend.
//!
//! Serves a PostgREST-compatible subset on `/rest/v1/{table}`:
//!
//! - `GET` with optional `order=created_at.desc|asc` returns all rows.
//! - `POST` with a row object or a one-or-more-row array inserts; with
//!   `Prefer: return=representation` the inserted rows are echoed back.
//! - `PATCH ?id=eq.<id>` with `{"done": bool}` updates one row.
//! - `DELETE ?id=eq.<id>` deletes one row.
//!
//! Every request must carry the configured key in the `apikey` header.
//! Writes that match no row succeed with no effect, as PostgREST does.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use tasklist_proto::query::{
    APIKEY_HEADER, DEFAULT_TABLE, Order, PREFER_HEADER, PREFER_REPRESENTATION, parse_eq_filter,
    table_path,
};
use tasklist_proto::row::{DonePatch, NewTaskRow, encode_rows};
use tasklist_proto::task::{Task, TaskId};

use crate::table::TaskTable;

/// Errors returned to HTTP clients as `{"message": ...}` bodies.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Missing or wrong `apikey` header.
    #[error("invalid or missing api key")]
    Unauthorized,
    /// The path names a table that does not exist.
    #[error("relation \"{0}\" does not exist")]
    UnknownTable(String),
    /// Malformed filter, order, or body.
    #[error("{0}")]
    BadRequest(String),
    /// Response encoding failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BackendError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UnknownTable(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Shared backend state: the table and the access rules around it.
pub struct BackendState {
    /// Row storage.
    pub table: TaskTable,
    table_name: String,
    api_key: String,
}

impl BackendState {
    /// Creates a state serving `tasks` behind `api_key`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_table(DEFAULT_TABLE, api_key)
    }

    /// Creates a state serving a custom table name.
    #[must_use]
    pub fn with_table(table_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            table: TaskTable::new(),
            table_name: table_name.into(),
            api_key: api_key.into(),
        }
    }

    fn authorize(&self, headers: &HeaderMap, table: &str) -> Result<(), BackendError> {
        let presented = headers
            .get(APIKEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if presented != self.api_key {
            return Err(BackendError::Unauthorized);
        }
        if table != self.table_name {
            return Err(BackendError::UnknownTable(table.to_string()));
        }
        Ok(())
    }
}

type Params = HashMap<String, String>;

/// Builds the router for the given state.
pub fn router(state: Arc<BackendState>) -> axum::Router {
    axum::Router::new()
        .route("/health", get(health))
        .route(
            &table_path("{table}"),
            get(select_rows)
                .post(insert_rows)
                .patch(update_rows)
                .delete(delete_rows),
        )
        .with_state(state)
}

/// Starts the backend on `addr` and returns the bound address and a join
/// handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    state: Arc<BackendState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "backend server error");
        }
    });

    Ok((bound_addr, handle))
}

async fn health() -> &'static str {
    "ok"
}

async fn select_rows(
    State(state): State<Arc<BackendState>>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
) -> Result<Response, BackendError> {
    state.authorize(&headers, &table)?;
    let order = match params.get("order") {
        Some(raw) => Order::parse(raw)
            .ok_or_else(|| BackendError::BadRequest(format!("unsupported order: {raw}")))?,
        None => Order::CreatedAsc,
    };
    let rows = state.table.select_all(order).await;
    tracing::debug!(table = %table, count = rows.len(), "select");
    rows_response(StatusCode::OK, &rows)
}

async fn insert_rows(
    State(state): State<Arc<BackendState>>,
    Path(table): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BackendError> {
    state.authorize(&headers, &table)?;
    let rows = parse_insert_body(&body)?;

    let mut inserted = Vec::with_capacity(rows.len());
    for row in rows {
        inserted.push(state.table.insert(row).await);
    }
    for task in &inserted {
        tracing::info!(id = %task.id, priority = %task.priority, "row inserted");
    }

    if wants_representation(&headers) {
        rows_response(StatusCode::CREATED, &inserted)
    } else {
        Ok(StatusCode::CREATED.into_response())
    }
}

async fn update_rows(
    State(state): State<Arc<BackendState>>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BackendError> {
    state.authorize(&headers, &table)?;
    let id = id_filter(&params)?;
    let patch: DonePatch = serde_json::from_slice(&body)
        .map_err(|e| BackendError::BadRequest(format!("invalid update body: {e}")))?;

    let updated = state.table.update_done(id, patch.done).await;
    tracing::info!(id = %id, done = patch.done, matched = updated.is_some(), "row updated");

    if wants_representation(&headers) {
        let rows: Vec<Task> = updated.into_iter().collect();
        rows_response(StatusCode::OK, &rows)
    } else {
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}

async fn delete_rows(
    State(state): State<Arc<BackendState>>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
) -> Result<Response, BackendError> {
    state.authorize(&headers, &table)?;
    let id = id_filter(&params)?;
    let matched = state.table.delete(id).await;
    tracing::info!(id = %id, matched = matched, "row deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Writes must target a single row through `id=eq.<id>`.
fn id_filter(params: &Params) -> Result<TaskId, BackendError> {
    let raw = params
        .get("id")
        .ok_or_else(|| BackendError::BadRequest("missing id filter".to_string()))?;
    parse_eq_filter(raw).ok_or_else(|| BackendError::BadRequest(format!("invalid id filter: {raw}")))
}

/// Accepts a single row object or an array of rows.
fn parse_insert_body(body: &[u8]) -> Result<Vec<NewTaskRow>, BackendError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| BackendError::BadRequest(format!("invalid insert body: {e}")))?;
    let rows = match value {
        serde_json::Value::Array(_) => serde_json::from_value::<Vec<NewTaskRow>>(value),
        other => serde_json::from_value::<NewTaskRow>(other).map(|row| vec![row]),
    }
    .map_err(|e| BackendError::BadRequest(format!("invalid row: {e}")))?;
    if rows.is_empty() {
        return Err(BackendError::BadRequest("no rows to insert".to_string()));
    }
    Ok(rows)
}

fn wants_representation(headers: &HeaderMap) -> bool {
    headers
        .get_all(PREFER_HEADER)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|pref| pref.trim() == PREFER_REPRESENTATION)
}

fn rows_response(status: StatusCode, rows: &[Task]) -> Result<Response, BackendError> {
    let body = encode_rows(rows).map_err(|e| BackendError::Internal(e.to_string()))?;
    Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
}
