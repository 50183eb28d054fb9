//! In-memory task table.
//!
//! The [`TaskTable`] holds rows in insertion order and assigns a sequential
//! identity starting at 1. Reads sort on `created_at`, breaking ties on the
//! id so that "newest first" is stable for rows inserted within the same
//! clock tick.

use chrono::Utc;
use tokio::sync::RwLock;

use tasklist_proto::query::Order;
use tasklist_proto::row::NewTaskRow;
use tasklist_proto::task::{Task, TaskId};

struct TableInner {
    rows: Vec<Task>,
    next_id: i64,
}

/// Thread-safe task table shared by all request handlers.
pub struct TaskTable {
    inner: RwLock<TableInner>,
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(TableInner {
                rows: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Returns every row in the requested order.
    pub async fn select_all(&self, order: Order) -> Vec<Task> {
        let inner = self.inner.read().await;
        let mut rows = inner.rows.clone();
        drop(inner);
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if order == Order::CreatedDesc {
            rows.reverse();
        }
        rows
    }

    /// Inserts a row and returns it with its assigned id and timestamp.
    pub async fn insert(&self, row: NewTaskRow) -> Task {
        let mut inner = self.inner.write().await;
        let id = TaskId::new(inner.next_id);
        inner.next_id += 1;
        let task = Task {
            id,
            text: row.text,
            done: row.done,
            priority: row.priority,
            created_at: Utc::now(),
        };
        inner.rows.push(task.clone());
        drop(inner);
        task
    }

    /// Sets `done` on the row with `id`, returning the updated row.
    ///
    /// Returns `None` if no row matched.
    pub async fn update_done(&self, id: TaskId, done: bool) -> Option<Task> {
        let mut inner = self.inner.write().await;
        let row = inner.rows.iter_mut().find(|t| t.id == id)?;
        row.done = done;
        Some(row.clone())
    }

    /// Deletes the row with `id`, returning whether a row matched.
    pub async fn delete(&self, id: TaskId) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|t| t.id != id);
        inner.rows.len() != before
    }

    /// Number of rows currently stored.
    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    /// Whether the table holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.rows.is_empty()
    }
}
