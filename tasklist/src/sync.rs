//! Background sync worker wiring the TUI to the async store.
//!
//! The TUI event loop is synchronous (crossterm poll-based) while every store
//! mutation awaits a repository round trip. [`spawn_sync`] moves the
//! [`TaskListStore`] into a tokio task and talks to it over two channels:
//!
//! ```text
//! TUI (main thread)  ←── SyncEvent ───  sync worker (owns the store)
//!                     ─── SyncCommand →
//! ```
//!
//! Commands are handled one at a time in arrival order, so at most one
//! repository call is outstanding. The UI keeps rendering while it runs and
//! drains [`SyncEvent`]s on each tick.

use std::sync::Arc;

use tokio::sync::mpsc;

use tasklist_proto::task::{Priority, Task, TaskId};

use crate::repository::TaskRepository;
use crate::store::{Operation, StoreError, TaskListStore};

/// Default capacity of the command and event channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Commands sent from the TUI main loop to the sync worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCommand {
    /// Create a task from raw input text.
    Add {
        /// Input as typed; trimmed and validated by the store.
        text: String,
        /// Chosen priority, or the default.
        priority: Option<Priority>,
    },
    /// Flip a task's completion flag.
    Toggle {
        /// Task to toggle.
        id: TaskId,
    },
    /// Delete a task.
    Delete {
        /// Task to delete.
        id: TaskId,
    },
    /// Re-fetch the whole list.
    Refresh,
    /// Stop the worker.
    Shutdown,
}

/// Events sent from the sync worker to the TUI main loop.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A fetch succeeded; the store is ready and holds this list.
    Loaded(Arc<[Task]>),
    /// A mutation succeeded and produced this list.
    ListChanged(Arc<[Task]>),
    /// A repository call failed; the list is unchanged.
    Failed {
        /// Which operation failed.
        op: Operation,
        /// Human-readable cause.
        message: String,
    },
}

/// Spawn the sync worker and return its channel handles.
///
/// The worker loads the list first, emitting [`SyncEvent::Loaded`] or
/// [`SyncEvent::Failed`], then serves commands until it receives
/// [`SyncCommand::Shutdown`], the command sender is dropped, or the event
/// receiver is dropped.
///
/// Must be called from within a tokio runtime.
pub fn spawn_sync<R>(
    store: TaskListStore<R>,
    capacity: usize,
) -> (mpsc::Sender<SyncCommand>, mpsc::Receiver<SyncEvent>)
where
    R: TaskRepository + 'static,
{
    let capacity = capacity.max(1);
    let (cmd_tx, cmd_rx) = mpsc::channel::<SyncCommand>(capacity);
    let (evt_tx, evt_rx) = mpsc::channel::<SyncEvent>(capacity);

    tokio::spawn(async move {
        command_handler(store, cmd_rx, evt_tx).await;
    });

    (cmd_tx, evt_rx)
}

/// Worker loop: owns the store for its whole lifetime.
async fn command_handler<R: TaskRepository>(
    mut store: TaskListStore<R>,
    mut cmd_rx: mpsc::Receiver<SyncCommand>,
    evt_tx: mpsc::Sender<SyncEvent>,
) {
    tracing::info!(backend = %store.repository().kind(), "sync worker started");

    let initial = refresh(&mut store).await;
    if evt_tx.send(initial).await.is_err() {
        return;
    }

    while let Some(cmd) = cmd_rx.recv().await {
        let event = match cmd {
            SyncCommand::Add { text, priority } => match store.add(&text, priority).await {
                Ok(_) => Some(SyncEvent::ListChanged(store.snapshot())),
                Err(e) => failure(e),
            },
            SyncCommand::Toggle { id } => match store.toggle(id).await {
                Ok(Some(_)) => Some(SyncEvent::ListChanged(store.snapshot())),
                Ok(None) => None,
                Err(e) => failure(e),
            },
            SyncCommand::Delete { id } => match store.delete(id).await {
                Ok(true) => Some(SyncEvent::ListChanged(store.snapshot())),
                Ok(false) => None,
                Err(e) => failure(e),
            },
            SyncCommand::Refresh => Some(refresh(&mut store).await),
            SyncCommand::Shutdown => {
                tracing::info!("sync worker shutting down");
                break;
            }
        };

        if let Some(evt) = event
            && evt_tx.send(evt).await.is_err()
        {
            // TUI dropped; discard and exit.
            tracing::debug!("event receiver closed; sync worker exiting");
            break;
        }
    }
}

async fn refresh<R: TaskRepository>(store: &mut TaskListStore<R>) -> SyncEvent {
    match store.load().await {
        Ok(()) => SyncEvent::Loaded(store.snapshot()),
        Err(StoreError::Persistence { op, source }) => SyncEvent::Failed {
            op,
            message: source.to_string(),
        },
        Err(e @ StoreError::Invalid(_)) => SyncEvent::Failed {
            op: Operation::Load,
            message: e.to_string(),
        },
    }
}

/// Validation refusals produce no event.
fn failure(err: StoreError) -> Option<SyncEvent> {
    match err {
        StoreError::Invalid(reason) => {
            tracing::debug!(reason = %reason, "input refused");
            None
        }
        StoreError::Persistence { op, source } => Some(SyncEvent::Failed {
            op,
            message: source.to_string(),
        }),
    }
}
