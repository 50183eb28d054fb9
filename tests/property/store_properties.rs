//! Property tests for the task list store.
//!
//! Runs random operation sequences against a store backed by the in-memory
//! repository and checks after every step:
//! 1. A valid add grows the list and the active count by one; blank input
//!    leaves the list unchanged.
//! 2. Toggling the same task twice restores the list.
//! 3. Deleting a present task shrinks the list by exactly one.
//! 4. `all` is the disjoint union of `active` and `done`, in list order.
//! 5. Ids stay unique and the list matches the repository.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use tasklist::repository::TaskRepository;
use tasklist::repository::memory::InMemoryRepository;
use tasklist::store::TaskListStore;
use tasklist_proto::task::{Filter, Priority, Task, TaskId};

#[derive(Debug, Clone)]
enum Op {
    Add(String, Option<Priority>),
    Toggle(usize),
    Delete(usize),
}

fn arb_priority() -> impl Strategy<Value = Option<Priority>> {
    prop_oneof![
        Just(None),
        Just(Some(Priority::Low)),
        Just(Some(Priority::Medium)),
        Just(Some(Priority::High)),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => ("[ \t]{0,2}[a-z ]{0,12}", arb_priority()).prop_map(|(t, p)| Op::Add(t, p)),
        2 => any::<usize>().prop_map(Op::Toggle),
        1 => any::<usize>().prop_map(Op::Delete),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Picks a present id by index, or an absent one when the list is empty.
fn pick(tasks: &[Task], index: usize) -> TaskId {
    tasks
        .get(index % tasks.len().max(1))
        .map_or(TaskId::new(-1), |t| t.id)
}

fn assert_partition(tasks: &[Task], all: &[&Task], active: &[&Task], done: &[&Task]) {
    assert_eq!(all.len(), tasks.len());
    assert_eq!(active.len() + done.len(), all.len());
    assert!(active.iter().all(|t| !t.done));
    assert!(done.iter().all(|t| t.done));

    // Each view is a subsequence of the list.
    for view in [active, done] {
        let positions = view
            .iter()
            .map(|v| tasks.iter().position(|t| t.id == v.id).unwrap());
        let mut last = None;
        for p in positions {
            assert!(last.is_none_or(|l| l < p));
            last = Some(p);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn operation_sequences_keep_invariants(ops in prop::collection::vec(arb_op(), 1..24)) {
        runtime().block_on(async {
            let mut store = TaskListStore::new(InMemoryRepository::new());
            store.load().await.unwrap();

            for op in ops {
                let before: Vec<Task> = store.tasks().to_vec();
                let before_counts = store.counts();

                match op {
                    Op::Add(text, priority) => {
                        let result = store.add(&text, priority).await;
                        if text.trim().is_empty() {
                            assert!(result.is_err());
                            assert_eq!(store.tasks(), before.as_slice());
                        } else {
                            let task = result.unwrap();
                            assert_eq!(store.tasks().len(), before.len() + 1);
                            assert_eq!(store.counts().active, before_counts.active + 1);
                            assert_eq!(store.tasks()[0].id, task.id);
                            assert_eq!(task.text.as_str(), text.trim());
                            assert_eq!(task.priority, priority.unwrap_or_default());
                        }
                    }
                    Op::Toggle(index) => {
                        let id = pick(&before, index);
                        store.toggle(id).await.unwrap();
                        store.toggle(id).await.unwrap();
                        assert_eq!(store.tasks(), before.as_slice());
                        store.toggle(id).await.unwrap();
                        assert_eq!(store.tasks().len(), before.len());
                    }
                    Op::Delete(index) => {
                        let id = pick(&before, index);
                        let removed = store.delete(id).await.unwrap();
                        assert_eq!(removed, !before.is_empty());
                        assert_eq!(store.tasks().len(), before.len() - usize::from(removed));
                        assert!(store.get(id).is_none());
                    }
                }

                let tasks = store.tasks();
                assert_partition(
                    tasks,
                    &store.list(Filter::All),
                    &store.list(Filter::Active),
                    &store.list(Filter::Done),
                );

                let mut ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
                ids.sort();
                ids.dedup();
                assert_eq!(ids.len(), tasks.len());

                let mut stored = store.repository().fetch_all().await.unwrap();
                let mut local = tasks.to_vec();
                stored.sort_by_key(|t| t.id);
                local.sort_by_key(|t| t.id);
                assert_eq!(stored, local);
            }
        });
    }
}
