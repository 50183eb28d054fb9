//! Integration tests for the sync worker wiring the TUI to the store.
//!
//! Drives `spawn_sync` the way the TUI main loop does: commands in, events
//! out. Covers the initial load, ordered command handling, silent refusals,
//! failure events and shutdown, plus the `App` reacting to those events.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use url::Url;

use tasklist::app::App;
use tasklist::repository::memory::InMemoryRepository;
use tasklist::repository::rest::{RemoteConfig, RestRepository};
use tasklist::repository::{RepositoryKind, TaskRepository};
use tasklist::store::{Operation, Phase, TaskListStore};
use tasklist::sync::{SyncCommand, SyncEvent, spawn_sync};
use tasklist_backend::server::{self, BackendState};
use tasklist_proto::row::NewTaskRow;
use tasklist_proto::task::{Priority, Task, TaskId, TaskText};

/// Receive the next event or fail after a timeout.
async fn next_event(rx: &mut mpsc::Receiver<SyncEvent>) -> SyncEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event timed out")
        .expect("worker stopped")
}

/// Assert that no event arrives within a short window.
async fn assert_quiet(rx: &mut mpsc::Receiver<SyncEvent>) {
    let result = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(result.is_err(), "unexpected event: {result:?}");
}

fn add(text: &str) -> SyncCommand {
    SyncCommand::Add {
        text: text.to_string(),
        priority: None,
    }
}

fn list_of(event: SyncEvent) -> Arc<[Task]> {
    match event {
        SyncEvent::Loaded(list) | SyncEvent::ListChanged(list) => list,
        SyncEvent::Failed { op, message } => panic!("{op} failed: {message}"),
    }
}

// =============================================================================
// Worker behavior
// =============================================================================

#[tokio::test]
async fn commands_are_applied_in_order() {
    let (tx, mut rx) = spawn_sync(TaskListStore::new(InMemoryRepository::new()), 16);
    assert!(list_of(next_event(&mut rx).await).is_empty());

    tx.send(add("one")).await.unwrap();
    tx.send(SyncCommand::Add {
        text: "two".to_string(),
        priority: Some(Priority::High),
    })
    .await
    .unwrap();

    let after_one = list_of(next_event(&mut rx).await);
    assert_eq!(after_one.len(), 1);
    let after_two = list_of(next_event(&mut rx).await);
    assert_eq!(after_two.len(), 2);
    assert_eq!(after_two[0].text.as_str(), "two");
    assert_eq!(after_two[0].priority, Priority::High);

    let id = after_two[1].id;
    tx.send(SyncCommand::Toggle { id }).await.unwrap();
    let toggled = list_of(next_event(&mut rx).await);
    assert!(toggled.iter().find(|t| t.id == id).unwrap().done);

    tx.send(SyncCommand::Delete { id }).await.unwrap();
    let deleted = list_of(next_event(&mut rx).await);
    assert_eq!(deleted.len(), 1);

    // Earlier snapshots are untouched.
    assert_eq!(after_two.len(), 2);
    assert!(!after_two[1].done);
}

#[tokio::test]
async fn refusals_and_unknown_ids_are_silent() {
    let (tx, mut rx) = spawn_sync(TaskListStore::new(InMemoryRepository::new()), 16);
    next_event(&mut rx).await;

    tx.send(add("   ")).await.unwrap();
    tx.send(SyncCommand::Toggle { id: TaskId::new(7) }).await.unwrap();
    tx.send(SyncCommand::Delete { id: TaskId::new(7) }).await.unwrap();

    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn refresh_emits_loaded() {
    let repo = Arc::new(InMemoryRepository::new());
    let (tx, mut rx) = spawn_sync(TaskListStore::new(Arc::clone(&repo)), 16);
    next_event(&mut rx).await;

    // A write that bypasses the store shows up after a refresh.
    repo.insert(&NewTaskRow::new(
        TaskText::parse("external").unwrap(),
        Priority::Low,
    ))
    .await
    .unwrap();

    tx.send(SyncCommand::Refresh).await.unwrap();
    match next_event(&mut rx).await {
        SyncEvent::Loaded(list) => assert_eq!(list.len(), 1),
        other => panic!("expected Loaded, got {other:?}"),
    }
}

#[tokio::test]
async fn failing_store_emits_failed_events() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = RemoteConfig::new(Url::parse(&format!("http://{addr}")).unwrap(), "k");
    config.request_timeout = Duration::from_secs(2);
    let store = TaskListStore::new(RestRepository::new(&config).unwrap());
    let (tx, mut rx) = spawn_sync(store, 16);

    assert!(matches!(
        next_event(&mut rx).await,
        SyncEvent::Failed {
            op: Operation::Load,
            ..
        }
    ));

    tx.send(add("lost")).await.unwrap();
    assert!(matches!(
        next_event(&mut rx).await,
        SyncEvent::Failed {
            op: Operation::Add,
            ..
        }
    ));
}

#[tokio::test]
async fn worker_exits_when_commands_close() {
    let (tx, mut rx) = spawn_sync(TaskListStore::new(InMemoryRepository::new()), 4);
    next_event(&mut rx).await;
    drop(tx);
    let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap();
    assert!(closed.is_none());
}

#[tokio::test]
async fn quit_sequence_stops_a_busy_worker() {
    // Tiny channels: the worker blocks on a full event channel.
    let (tx, rx) = spawn_sync(TaskListStore::new(InMemoryRepository::new()), 1);
    for text in ["a", "b"] {
        tx.send(add(text)).await.unwrap();
    }

    drop(rx);
    let _ = tokio::time::timeout(Duration::from_secs(5), tx.send(SyncCommand::Shutdown))
        .await
        .expect("shutdown send hung");
    tokio::time::timeout(Duration::from_secs(5), tx.closed())
        .await
        .expect("worker did not exit");
}

// =============================================================================
// App wiring
// =============================================================================

/// Forward a command produced by the app and feed the resulting event back.
async fn round_trip(
    app: &mut App,
    tx: &mpsc::Sender<SyncCommand>,
    rx: &mut mpsc::Receiver<SyncEvent>,
    key: KeyEvent,
) {
    let cmd = app.handle_key_event(key).expect("key should produce a command");
    tx.send(cmd).await.unwrap();
    app.apply_event(next_event(rx).await);
}

#[tokio::test]
async fn app_drives_remote_store_end_to_end() {
    let state = Arc::new(BackendState::new("key"));
    let (addr, _handle) = server::start_server("127.0.0.1:0", Arc::clone(&state))
        .await
        .unwrap();
    let config = RemoteConfig::new(Url::parse(&format!("http://{addr}")).unwrap(), "key");
    let store = TaskListStore::new(RestRepository::new(&config).unwrap());

    let mut app = App::new(store.repository().kind());
    assert_eq!(app.backend, RepositoryKind::Remote);
    let (tx, mut rx) = spawn_sync(store, 16);
    app.apply_event(next_event(&mut rx).await);
    assert_eq!(app.phase, Phase::Ready);

    for c in "read a book".chars() {
        app.handle_key_event(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
    }
    round_trip(&mut app, &tx, &mut rx, KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)).await;
    assert_eq!(app.tasks.len(), 1);

    app.handle_key_event(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE));
    round_trip(
        &mut app,
        &tx,
        &mut rx,
        KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE),
    )
    .await;
    assert!(app.tasks[0].done);
    assert_eq!(app.counts().active, 0);
    assert_eq!(state.table.len().await, 1);

    round_trip(
        &mut app,
        &tx,
        &mut rx,
        KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE),
    )
    .await;
    assert!(app.tasks.is_empty());
    assert!(state.table.is_empty().await);
    assert!(app.status.is_none());
}
