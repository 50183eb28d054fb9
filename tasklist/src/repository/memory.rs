//! In-memory repository for local, offline use.
//!
//! Ids are derived from the wall clock in milliseconds and bumped past the
//! last issued id, so they increase monotonically within a session. They are
//! not globally unique.

use chrono::Utc;
use parking_lot::Mutex;

use tasklist_proto::row::NewTaskRow;
use tasklist_proto::task::{Task, TaskId};

use super::{RepositoryError, RepositoryKind, TaskRepository};

struct MemoryTable {
    rows: Vec<Task>,
    last_id: i64,
}

impl MemoryTable {
    fn next_id(&mut self) -> TaskId {
        let now = Utc::now().timestamp_millis();
        let id = now.max(self.last_id.saturating_add(1));
        self.last_id = id;
        TaskId::new(id)
    }
}

/// Process-lifetime task storage behind a [`Mutex`].
pub struct InMemoryRepository {
    table: Mutex<MemoryTable>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tasks(Vec::new())
    }

    /// Creates a repository pre-populated with `tasks`.
    ///
    /// Later ids are issued above the largest id in `tasks`.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let last_id = tasks.iter().map(|t| t.id.get()).max().unwrap_or(0);
        Self {
            table: Mutex::new(MemoryTable {
                rows: tasks,
                last_id,
            }),
        }
    }

    /// Number of stored tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.lock().rows.len()
    }

    /// Whether no tasks are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.lock().rows.is_empty()
    }
}

impl TaskRepository for InMemoryRepository {
    async fn fetch_all(&self) -> Result<Vec<Task>, RepositoryError> {
        let mut rows = self.table.lock().rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn insert(&self, row: &NewTaskRow) -> Result<Task, RepositoryError> {
        let mut table = self.table.lock();
        let task = Task {
            id: table.next_id(),
            text: row.text.clone(),
            done: row.done,
            priority: row.priority,
            created_at: Utc::now(),
        };
        table.rows.push(task.clone());
        drop(table);
        Ok(task)
    }

    async fn update_done(&self, id: TaskId, done: bool) -> Result<(), RepositoryError> {
        if let Some(row) = self.table.lock().rows.iter_mut().find(|t| t.id == id) {
            row.done = done;
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: TaskId) -> Result<(), RepositoryError> {
        self.table.lock().rows.retain(|t| t.id != id);
        Ok(())
    }

    fn kind(&self) -> RepositoryKind {
        RepositoryKind::Local
    }
}
