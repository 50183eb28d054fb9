//! Task list store: the authoritative in-memory list and its sync rules.
//!
//! [`TaskListStore`] owns the ordered list of tasks and mediates every
//! mutation through an injected [`TaskRepository`]. Mutations follow
//! persist-then-patch: the repository call runs first, and only a successful
//! result produces a new list value. A failed call leaves the list exactly as
//! it was.
//!
//! The list is held as an `Arc<[Task]>` and replaced wholesale on every
//! change, so a renderer holding an older [`snapshot`](TaskListStore::snapshot)
//! never sees it change underneath it.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tasklist_proto::row::NewTaskRow;
use tasklist_proto::task::{Filter, Priority, Task, TaskError, TaskId, TaskText};

use crate::repository::{RepositoryError, TaskRepository};

/// Store lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial fetch not yet succeeded; the list is not authoritative.
    Loading,
    /// The list reflects at least one successful fetch, or started empty.
    Ready,
}

/// Operation that touched the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Fetch all tasks.
    Load,
    /// Insert a task.
    Add,
    /// Flip a task's `done` flag.
    Toggle,
    /// Delete a task.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Add => write!(f, "add"),
            Self::Toggle => write!(f, "toggle"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Errors returned by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Input was rejected before any repository call.
    #[error(transparent)]
    Invalid(#[from] TaskError),

    /// The repository call failed; the list is unchanged.
    #[error("{op} failed: {source}")]
    Persistence {
        /// Which operation failed.
        op: Operation,
        /// Underlying repository error.
        #[source]
        source: RepositoryError,
    },
}

impl StoreError {
    const fn persistence(op: Operation, source: RepositoryError) -> Self {
        Self::Persistence { op, source }
    }
}

/// Per-filter task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// Every task.
    pub all: usize,
    /// Tasks not yet done.
    pub active: usize,
    /// Completed tasks.
    pub done: usize,
}

impl TaskCounts {
    /// Count for the given filter.
    #[must_use]
    pub const fn for_filter(&self, filter: Filter) -> usize {
        match filter {
            Filter::All => self.all,
            Filter::Active => self.active,
            Filter::Done => self.done,
        }
    }
}

/// Returns the tasks matching `filter`, preserving order.
#[must_use]
pub fn filter_tasks(tasks: &[Task], filter: Filter) -> Vec<&Task> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

/// Counts `tasks` per filter.
#[must_use]
pub fn count_tasks(tasks: &[Task]) -> TaskCounts {
    let done = tasks.iter().filter(|t| t.done).count();
    TaskCounts {
        all: tasks.len(),
        active: tasks.len() - done,
        done,
    }
}

/// Owns the task list and keeps it consistent with a [`TaskRepository`].
pub struct TaskListStore<R> {
    repo: R,
    tasks: Arc<[Task]>,
    phase: Phase,
}

impl<R: TaskRepository> TaskListStore<R> {
    /// Creates a store in [`Phase::Loading`] with an empty list.
    ///
    /// Call [`load`](Self::load) to populate it.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            tasks: Arc::from(Vec::new()),
            phase: Phase::Loading,
        }
    }

    /// Creates a store that starts [`Phase::Ready`] with an empty list.
    pub fn ready(repo: R) -> Self {
        Self {
            phase: Phase::Ready,
            ..Self::new(repo)
        }
    }

    /// Current lifecycle phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The current list value. Cheap to clone; never mutated in place.
    pub fn snapshot(&self) -> Arc<[Task]> {
        Arc::clone(&self.tasks)
    }

    /// The current list as a slice.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks up a task by id.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The injected repository.
    pub const fn repository(&self) -> &R {
        &self.repo
    }

    /// Fetches every task and replaces the list with the result.
    ///
    /// Moves the store to [`Phase::Ready`] on success. On failure the list
    /// and phase are unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] if the fetch fails.
    pub async fn load(&mut self) -> Result<(), StoreError> {
        let fetched = match self.repo.fetch_all().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "task fetch failed");
                return Err(StoreError::persistence(Operation::Load, e));
            }
        };

        let tasks = dedup_by_id(fetched);
        tracing::info!(count = tasks.len(), "task list loaded");
        self.tasks = Arc::from(tasks);
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Creates a task from `text` and prepends the persisted row.
    ///
    /// `priority` defaults to [`Priority::Medium`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if `text` is empty after trimming
    /// (no repository call is made), or [`StoreError::Persistence`] if the
    /// insert fails. The list is unchanged in both cases.
    pub async fn add(&mut self, text: &str, priority: Option<Priority>) -> Result<Task, StoreError> {
        let text = TaskText::parse(text)?;
        let row = NewTaskRow::new(text, priority.unwrap_or_default());

        let task = match self.repo.insert(&row).await {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!(error = %e, "task insert failed");
                return Err(StoreError::persistence(Operation::Add, e));
            }
        };

        let mut next = Vec::with_capacity(self.tasks.len() + 1);
        next.push(task.clone());
        next.extend(self.tasks.iter().filter(|t| t.id != task.id).cloned());
        if next.len() == self.tasks.len() {
            tracing::warn!(id = %task.id, "store returned an id already in the list; replacing");
        }
        self.tasks = Arc::from(next);

        tracing::info!(id = %task.id, priority = %task.priority, "task added");
        Ok(task)
    }

    /// Flips `done` on the task with `id`.
    ///
    /// The new flag is persisted first; the list is patched only after the
    /// repository accepts it. Unknown ids are a no-op and return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] if the update fails. The task
    /// keeps its previous flag.
    pub async fn toggle(&mut self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let Some(current) = self.get(id) else {
            tracing::debug!(id = %id, "toggle on unknown id ignored");
            return Ok(None);
        };
        let done = !current.done;

        if let Err(e) = self.repo.update_done(id, done).await {
            tracing::warn!(id = %id, error = %e, "task update failed");
            return Err(StoreError::persistence(Operation::Toggle, e));
        }

        let mut toggled = None;
        let next: Vec<Task> = self
            .tasks
            .iter()
            .map(|t| {
                if t.id == id {
                    let patched = Task { done, ..t.clone() };
                    toggled = Some(patched.clone());
                    patched
                } else {
                    t.clone()
                }
            })
            .collect();
        self.tasks = Arc::from(next);

        tracing::info!(id = %id, done = done, "task toggled");
        Ok(toggled)
    }

    /// Deletes the task with `id`.
    ///
    /// Returns `Ok(false)` without touching the repository if `id` is not in
    /// the list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] if the delete fails. The task
    /// stays in the list.
    pub async fn delete(&mut self, id: TaskId) -> Result<bool, StoreError> {
        if self.get(id).is_none() {
            tracing::debug!(id = %id, "delete on unknown id ignored");
            return Ok(false);
        }

        if let Err(e) = self.repo.delete_by_id(id).await {
            tracing::warn!(id = %id, error = %e, "task delete failed");
            return Err(StoreError::persistence(Operation::Delete, e));
        }

        let next: Vec<Task> = self.tasks.iter().filter(|t| t.id != id).cloned().collect();
        self.tasks = Arc::from(next);

        tracing::info!(id = %id, "task deleted");
        Ok(true)
    }

    /// Tasks matching `filter`, in list order. Computed on every call.
    pub fn list(&self, filter: Filter) -> Vec<&Task> {
        filter_tasks(&self.tasks, filter)
    }

    /// Per-filter counts of the current list.
    pub fn counts(&self) -> TaskCounts {
        count_tasks(&self.tasks)
    }
}

/// Keeps the first occurrence of each id.
fn dedup_by_id(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::with_capacity(tasks.len());
    let before = tasks.len();
    let unique: Vec<Task> = tasks.into_iter().filter(|t| seen.insert(t.id)).collect();
    if unique.len() != before {
        tracing::warn!(dropped = before - unique.len(), "duplicate ids in fetched rows");
    }
    unique
}
