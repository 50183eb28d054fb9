//! Wire rows exchanged with the remote task table, and the decode step that
//! turns them into validated [`Task`] values.
//!
//! The remote store answers with JSON arrays of rows. Nothing from the wire
//! reaches the in-memory list without passing through [`decode_rows`] or
//! [`decode_single_row`]: a row with a missing or mistyped column, an unknown
//! priority, or blank text is rejected as a whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Priority, Task, TaskError, TaskId, TaskText};

/// Errors that can occur while decoding rows from the store.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The body was not valid JSON or did not match the row shape.
    #[error("malformed row: {0}")]
    Json(#[from] serde_json::Error),
    /// A row matched the shape but failed validation.
    #[error("invalid row: {0}")]
    Invalid(#[from] TaskError),
    /// A single-row response carried the wrong number of rows.
    #[error("expected exactly one row, got {0}")]
    RowCount(usize),
}

/// One row of the task table as it appears on the wire.
///
/// `text` is kept as a raw string here so that blank text is reported as
/// [`DecodeError::Invalid`] rather than a generic JSON error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRow {
    /// Primary key.
    pub id: i64,
    /// Task text.
    pub text: String,
    /// Completion flag.
    pub done: bool,
    /// Priority name.
    pub priority: Priority,
    /// Insert timestamp. Columns without a time zone are read as UTC.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// `created_at` accepts RFC 3339 with an offset or a bare
/// `timestamp without time zone` as PostgREST renders it.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub(super) fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = TaskError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TaskId::new(row.id),
            text: TaskText::parse(&row.text)?,
            done: row.done,
            priority: row.priority,
            created_at: row.created_at,
        })
    }
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.get(),
            text: task.text.as_str().to_string(),
            done: task.done,
            priority: task.priority,
            created_at: task.created_at,
        }
    }
}

/// Insert payload: the columns the client writes when creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaskRow {
    /// Validated task text.
    pub text: TaskText,
    /// Initial completion flag (always `false` from the client).
    pub done: bool,
    /// Chosen priority.
    pub priority: Priority,
}

impl NewTaskRow {
    /// Payload for a fresh, not-done task.
    #[must_use]
    pub const fn new(text: TaskText, priority: Priority) -> Self {
        Self {
            text,
            done: false,
            priority,
        }
    }
}

/// Update payload for the `done` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonePatch {
    /// New completion flag.
    pub done: bool,
}

/// Decodes a JSON array of rows into validated tasks, preserving order.
///
/// # Errors
///
/// Returns [`DecodeError`] if the body is not an array of well-formed rows
/// or any row fails validation.
pub fn decode_rows(body: &[u8]) -> Result<Vec<Task>, DecodeError> {
    let rows: Vec<TaskRow> = serde_json::from_slice(body)?;
    rows.into_iter()
        .map(|row| Task::try_from(row).map_err(DecodeError::from))
        .collect()
}

/// Decodes the body of an insert returning its row.
///
/// Accepts either a bare object or a one-element array.
///
/// # Errors
///
/// Returns [`DecodeError::RowCount`] if an array does not hold exactly one
/// row, or any other [`DecodeError`] for malformed or invalid data.
pub fn decode_single_row(body: &[u8]) -> Result<Task, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    let row: TaskRow = match value {
        serde_json::Value::Array(mut items) => {
            if items.len() != 1 {
                return Err(DecodeError::RowCount(items.len()));
            }
            serde_json::from_value(items.remove(0))?
        }
        other => serde_json::from_value(other)?,
    };
    Ok(Task::try_from(row)?)
}

/// Encodes tasks as the JSON array the store would return.
///
/// # Errors
///
/// Returns [`DecodeError::Json`] if serialization fails.
pub fn encode_rows(tasks: &[Task]) -> Result<Vec<u8>, DecodeError> {
    let rows: Vec<TaskRow> = tasks.iter().map(TaskRow::from).collect();
    Ok(serde_json::to_vec(&rows)?)
}
