//! Property-based tests for optimistic task sequences.
//!
//! Uses proptest to verify:
//! 1. After any sequence of successful add/edit/delete/toggle operations
//!    the local list equals the server's list and no temporary ids remain.
//! 2. With failures injected at random, the local list still equals the
//!    server's list after every single operation.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use proptest::prelude::*;
use taskdesk::api::{ApiError, InMemoryApi};
use taskdesk::notify::Notifier;
use taskdesk::session::{Session, SessionContext};
use taskdesk::tasks::{SyncOutcome, TaskDraft, TodoManager};
use taskdesk_proto::task::TaskId;

// --- Strategies ---

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Edit(usize, String),
    Delete(usize),
    Toggle(usize),
}

fn arb_text() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z ]{0,18}[A-Za-z]"
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_text().prop_map(Op::Add),
        2 => (any::<usize>(), arb_text()).prop_map(|(i, t)| Op::Edit(i, t)),
        1 => any::<usize>().prop_map(Op::Delete),
        2 => any::<usize>().prop_map(Op::Toggle),
    ]
}

// --- Helpers ---

fn make_manager() -> (Arc<InMemoryApi>, TodoManager<InMemoryApi>) {
    let api = Arc::new(InMemoryApi::new());
    let session = SessionContext::with_session(Session::new("tok", None));
    let manager = TodoManager::new(Arc::clone(&api), session, Notifier::silent());
    (api, manager)
}

fn pick(manager: &TodoManager<InMemoryApi>, index: usize) -> Option<TaskId> {
    let snapshot = manager.store().snapshot();
    if snapshot.is_empty() {
        return None;
    }
    Some(snapshot[index % snapshot.len()].id.clone())
}

/// Runs one operation. Returns `None` when there was nothing to act on.
async fn run(manager: &TodoManager<InMemoryApi>, op: Op) -> Option<SyncOutcome> {
    let result = match op {
        Op::Add(text) => manager.add(TaskDraft::new(text)).await,
        Op::Edit(i, text) => manager.edit(&pick(manager, i)?, TaskDraft::new(text)).await,
        Op::Delete(i) => manager.delete(&pick(manager, i)?).await,
        Op::Toggle(i) => manager.toggle(&pick(manager, i)?).await,
    };
    Some(result.unwrap())
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

// --- Properties ---

proptest! {
    #[test]
    fn successful_sequences_converge(ops in prop::collection::vec(arb_op(), 1..30)) {
        let (api, manager) = make_manager();
        block_on(async {
            for op in ops {
                if let Some(outcome) = run(&manager, op).await {
                    assert_eq!(outcome, SyncOutcome::Confirmed);
                }
            }
        });

        let local = manager.store().snapshot();
        let remote = api.records();
        prop_assert_eq!(local.as_slice(), remote.as_slice());
        prop_assert!(local.iter().all(|r| !r.id.is_temporary()));
    }

    #[test]
    fn failures_never_leave_the_list_diverged(
        steps in prop::collection::vec((arb_op(), any::<bool>()), 1..30)
    ) {
        let (api, manager) = make_manager();
        let diverged = block_on(async {
            for (op, fail) in steps {
                // Only queue a failure if a request will actually be made.
                let sends = matches!(op, Op::Add(_)) || !manager.store().is_empty();
                if fail && sends {
                    api.fail_next(ApiError::Network("connection reset".into()));
                }
                run(&manager, op).await;
                if manager.store().snapshot().as_slice() != api.records().as_slice() {
                    return true;
                }
            }
            false
        });
        prop_assert!(!diverged);
        prop_assert!(manager.store().snapshot().iter().all(|r| !r.id.is_temporary()));
    }
}
