//! Integration tests for the REST repository against the development backend.
//!
//! Starts `tasklist-backend` in-process on an ephemeral port and validates:
//! - the four query shapes round-trip through HTTP
//! - the store stays in sync with the remote table
//! - rejected and unreachable requests surface as errors without touching
//!   the in-memory list

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use tasklist::repository::rest::{RemoteConfig, RestRepository};
use tasklist::repository::{RepositoryError, RepositoryKind, TaskRepository};
use tasklist::store::{Operation, Phase, StoreError, TaskListStore};
use tasklist_backend::server::{self, BackendState};
use tasklist_proto::query::Order;
use tasklist_proto::row::NewTaskRow;
use tasklist_proto::task::{Filter, Priority, TaskId, TaskText};

const KEY: &str = "test-key";

/// Start the backend in-process and return its state and base URL.
async fn start_backend() -> (Arc<BackendState>, Url, tokio::task::JoinHandle<()>) {
    let state = Arc::new(BackendState::new(KEY));
    let (addr, handle) = server::start_server("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start backend");
    let url = Url::parse(&format!("http://{addr}")).unwrap();
    (state, url, handle)
}

fn repository(url: &Url, key: &str) -> RestRepository {
    let mut config = RemoteConfig::new(url.clone(), key);
    config.request_timeout = Duration::from_secs(5);
    RestRepository::new(&config).unwrap()
}

fn row(text: &str, priority: Priority) -> NewTaskRow {
    NewTaskRow::new(TaskText::parse(text).unwrap(), priority)
}

// =============================================================================
// Repository round trips
// =============================================================================

#[tokio::test]
async fn insert_returns_store_assigned_row() {
    let (state, url, _handle) = start_backend().await;
    let repo = repository(&url, KEY);

    let task = repo.insert(&row("Buy milk", Priority::High)).await.unwrap();

    assert_eq!(task.id, TaskId::new(1));
    assert_eq!(task.text.as_str(), "Buy milk");
    assert_eq!(task.priority, Priority::High);
    assert!(!task.done);
    assert_eq!(state.table.len().await, 1);
    assert_eq!(repo.kind(), RepositoryKind::Remote);
}

#[tokio::test]
async fn fetch_is_newest_first() {
    let (_state, url, _handle) = start_backend().await;
    let repo = repository(&url, KEY);

    let first = repo.insert(&row("first", Priority::Low)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = repo.insert(&row("second", Priority::Medium)).await.unwrap();

    let tasks = repo.fetch_all().await.unwrap();
    let ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn update_and_delete_by_id() {
    let (state, url, _handle) = start_backend().await;
    let repo = repository(&url, KEY);
    let task = repo.insert(&row("x", Priority::Low)).await.unwrap();

    repo.update_done(task.id, true).await.unwrap();
    let rows = state.table.select_all(Order::CreatedDesc).await;
    assert!(rows[0].done);

    repo.delete_by_id(task.id).await.unwrap();
    assert!(state.table.is_empty().await);
}

#[tokio::test]
async fn writes_to_missing_rows_succeed_without_effect() {
    let (state, url, _handle) = start_backend().await;
    let repo = repository(&url, KEY);
    repo.insert(&row("x", Priority::Low)).await.unwrap();

    repo.update_done(TaskId::new(999), true).await.unwrap();
    repo.delete_by_id(TaskId::new(999)).await.unwrap();

    assert_eq!(state.table.len().await, 1);
}

// =============================================================================
// Store over HTTP
// =============================================================================

#[tokio::test]
async fn store_stays_in_sync_with_remote_table() {
    let (state, url, _handle) = start_backend().await;
    let mut store = TaskListStore::new(repository(&url, KEY));
    store.load().await.unwrap();
    assert_eq!(store.phase(), Phase::Ready);

    let a = store.add("  water plants ", None).await.unwrap();
    let b = store.add("call mum", Some(Priority::High)).await.unwrap();
    store.toggle(a.id).await.unwrap();
    store.delete(b.id).await.unwrap();

    let remote = state.table.select_all(Order::CreatedDesc).await;
    assert_eq!(remote, store.tasks());
    assert_eq!(store.list(Filter::Done).len(), 1);
    assert_eq!(store.tasks()[0].text.as_str(), "water plants");
}

#[tokio::test]
async fn load_picks_up_existing_rows() {
    let (state, url, _handle) = start_backend().await;
    state.table.insert(row("seeded", Priority::Low)).await;

    let mut store = TaskListStore::new(repository(&url, KEY));
    store.load().await.unwrap();

    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].text.as_str(), "seeded");
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn wrong_key_is_status_error() {
    let (_state, url, _handle) = start_backend().await;
    let repo = repository(&url, "wrong-key");

    let err = repo.fetch_all().await.unwrap_err();

    match err {
        RepositoryError::Status { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("api key"), "unexpected message: {message}");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_table_is_status_error() {
    let (_state, url, _handle) = start_backend().await;
    let mut config = RemoteConfig::new(url, KEY);
    config.table = "missing".to_string();
    let repo = RestRepository::new(&config).unwrap();

    assert!(matches!(
        repo.fetch_all().await,
        Err(RepositoryError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn rejected_load_keeps_store_loading() {
    let (state, url, _handle) = start_backend().await;
    state.table.insert(row("hidden", Priority::Low)).await;
    let mut store = TaskListStore::new(repository(&url, "wrong-key"));

    let err = store.load().await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::Persistence {
            source: RepositoryError::Status { status: 401, .. },
            ..
        }
    ));
    assert_eq!(store.phase(), Phase::Loading);
    assert!(store.tasks().is_empty());
}

/// URL of a port with nothing listening behind it.
fn dead_endpoint() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}")).unwrap()
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let url = dead_endpoint();
    let mut store = TaskListStore::new(repository(&url, KEY));

    let err = store.load().await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persistence {
            source: RepositoryError::Transport(_),
            ..
        }
    ));
    assert_eq!(store.phase(), Phase::Loading);
}

#[tokio::test]
async fn unreachable_insert_leaves_list_untouched() {
    let url = dead_endpoint();
    let mut store = TaskListStore::ready(repository(&url, KEY));
    let before = store.snapshot();

    let err = store.add("never stored", Some(Priority::High)).await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::Persistence {
            op: Operation::Add,
            source: RepositoryError::Transport(_),
        }
    ));
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
    assert!(store.tasks().is_empty());
    assert_eq!(store.phase(), Phase::Ready);
}
