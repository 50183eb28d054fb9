//! Persistence collaborator abstraction for the task store.
//!
//! Defines the [`TaskRepository`] trait the store depends on. Concrete
//! implementations include:
//! - [`rest::RestRepository`]: the hosted row store over its REST interface
//! - [`memory::InMemoryRepository`]: local, process-lifetime storage
//!
//! # Invariant
//!
//! A call that returns `Err` did not happen. Callers must never assume a
//! partial effect from a failed call.

pub mod memory;
pub mod rest;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tasklist_proto::row::{DecodeError, NewTaskRow};
use tasklist_proto::task::{Task, TaskId};

/// Describes which kind of repository backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryKind {
    /// Hosted row store reached over HTTP.
    Remote,
    /// In-process storage that lives as long as the process.
    Local,
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "Remote"),
            Self::Local => write!(f, "Local"),
        }
    }
}

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The request never produced a response (connect, timeout, I/O).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The store's response did not decode into valid tasks.
    #[error("failed to decode store response: {0}")]
    Decode(#[from] DecodeError),

    /// The store is not reachable for a reason other than transport.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Async row-level persistence for tasks.
///
/// Implementations own the identifier space: the id of a [`Task`] returned
/// by [`TaskRepository::insert`] is the one to use for later updates and
/// deletes.
pub trait TaskRepository: Send + Sync {
    /// Fetch every task, newest first by creation time.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Task>, RepositoryError>> + Send;

    /// Insert one task and return it as persisted, including its id.
    fn insert(
        &self,
        row: &NewTaskRow,
    ) -> impl Future<Output = Result<Task, RepositoryError>> + Send;

    /// Set the `done` flag of the task with `id`.
    fn update_done(
        &self,
        id: TaskId,
        done: bool,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete the task with `id`.
    fn delete_by_id(&self, id: TaskId) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Return the kind of this repository.
    fn kind(&self) -> RepositoryKind;
}

impl<R: TaskRepository> TaskRepository for Arc<R> {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Task>, RepositoryError>> + Send {
        (**self).fetch_all()
    }

    fn insert(
        &self,
        row: &NewTaskRow,
    ) -> impl Future<Output = Result<Task, RepositoryError>> + Send {
        (**self).insert(row)
    }

    fn update_done(
        &self,
        id: TaskId,
        done: bool,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        (**self).update_done(id, done)
    }

    fn delete_by_id(&self, id: TaskId) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        (**self).delete_by_id(id)
    }

    fn kind(&self) -> RepositoryKind {
        (**self).kind()
    }
}
