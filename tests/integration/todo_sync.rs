//! Integration tests for optimistic task updates against the in-memory
//! backend: immediate local effect, reconciliation, rollback and session
//! expiry.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::redundant_clone)]

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use taskdesk::api::{ApiError, ErrorCategory, InMemoryApi, SESSION_EXPIRED, TodoApi};
use taskdesk::notify::{Level, Notice, Notifier};
use taskdesk::session::{Session, SessionContext};
use taskdesk::tasks::{RestoredInput, SyncOutcome, TaskDraft, TaskError, TodoManager};
use taskdesk_proto::task::{NewTask, TaskId, TaskStatus};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

struct Harness {
    api: Arc<InMemoryApi>,
    manager: TodoManager<InMemoryApi>,
    notices: mpsc::Receiver<Notice>,
}

fn make_harness() -> Harness {
    let api = Arc::new(InMemoryApi::new());
    let session = SessionContext::with_session(Session::new("tok", None));
    let (notifier, notices) = Notifier::channel(32);
    let manager = TodoManager::new(Arc::clone(&api), session, notifier);
    Harness {
        api,
        manager,
        notices,
    }
}

fn network_down() -> ApiError {
    ApiError::Network("connection refused".into())
}

/// Yields until the backend has seen `count` requests.
async fn wait_for_requests(api: &InMemoryApi, count: u64) {
    while api.request_count() < count {
        tokio::task::yield_now().await;
    }
}

type Pending = JoinHandle<Result<SyncOutcome, TaskError>>;

fn spawn_add(manager: &TodoManager<InMemoryApi>, text: &str) -> Pending {
    let manager = manager.clone();
    let draft = TaskDraft::new(text);
    tokio::spawn(async move { manager.add(draft).await })
}

fn spawn_refresh(manager: &TodoManager<InMemoryApi>) -> Pending {
    let manager = manager.clone();
    tokio::spawn(async move { manager.refresh().await })
}

fn spawn_delete(manager: &TodoManager<InMemoryApi>, id: &TaskId) -> Pending {
    let manager = manager.clone();
    let id = id.clone();
    tokio::spawn(async move { manager.delete(&id).await })
}

fn drain(notices: &mut mpsc::Receiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(n) = notices.try_recv() {
        out.push(n);
    }
    out
}

/// Adds a task with the given server id and clears the notices it produced.
async fn seed(h: &mut Harness, text: &str, id: &str) -> TaskId {
    h.api.assign_next_id(id);
    let outcome = h.manager.add(TaskDraft::new(text)).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Confirmed);
    drain(&mut h.notices);
    TaskId::server(id)
}

// ---------------------------------------------------------------------------
// Add
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_is_visible_before_the_server_answers() {
    let mut h = make_harness();
    h.api.assign_next_id("abc123");
    h.api.hold();

    let pending = spawn_add(&h.manager, "Buy milk");
    wait_for_requests(&h.api, 1).await;

    let snapshot = h.manager.store().snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].text, "Buy milk");
    assert_eq!(snapshot[0].status, TaskStatus::Pending);
    assert!(snapshot[0].id.is_temporary());

    h.api.release();
    assert_eq!(pending.await.unwrap().unwrap(), SyncOutcome::Confirmed);

    let snapshot = h.manager.store().snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, TaskId::server("abc123"));
    assert_eq!(drain(&mut h.notices), vec![Notice::success("Task added!")]);
}

#[tokio::test]
async fn failed_add_removes_placeholder_and_returns_input() {
    let mut h = make_harness();
    let kept = seed(&mut h, "Existing", "srv-kept").await;
    h.api.fail_next(network_down());

    let outcome = h.manager.add(TaskDraft::new("Buy milk")).await.unwrap();
    let SyncOutcome::RolledBack {
        category,
        restored_input,
        ..
    } = outcome
    else {
        panic!("expected rollback, got {outcome:?}");
    };
    assert_eq!(category, ErrorCategory::Transient);
    assert_eq!(restored_input, Some(RestoredInput::Add("Buy milk".into())));

    let ids: Vec<TaskId> = h.manager.store().snapshot().iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec![kept]);
    let notices = drain(&mut h.notices);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, Level::Error);
}

#[tokio::test]
async fn invalid_text_never_reaches_the_server() {
    let h = make_harness();
    let err = h.manager.add(TaskDraft::new("   ")).await.unwrap_err();
    assert!(matches!(err, TaskError::Validation(_)));
    assert_eq!(h.api.request_count(), 0);
    assert!(h.manager.store().is_empty());
}

// ---------------------------------------------------------------------------
// Edit, delete, toggle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_edit_reverts_text_exactly() {
    let mut h = make_harness();
    let id = seed(&mut h, "Original text", "srv-1").await;
    let before = h.manager.store().get(&id).unwrap();

    h.api.fail_next(ApiError::Server {
        status: 500,
        message: None,
    });
    let outcome = h
        .manager
        .edit(&id, TaskDraft::new("Changed text"))
        .await
        .unwrap();
    assert!(matches!(outcome, SyncOutcome::RolledBack { .. }));
    assert_eq!(h.manager.store().get(&id).unwrap(), before);
}

#[tokio::test]
async fn failed_delete_restores_identical_record() {
    let mut h = make_harness();
    seed(&mut h, "First", "srv-1").await;
    let id = seed(&mut h, "Buy milk", "abc123").await;
    let before = h.manager.store().snapshot();

    h.api.fail_next(network_down());
    let outcome = h.manager.delete(&id).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::RolledBack { .. }));
    assert_eq!(h.manager.store().snapshot(), before);

    let notices = drain(&mut h.notices);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, Level::Error);
    assert_eq!(notices[0].text, "Failed to delete task. Please try again.");
}

#[tokio::test]
async fn delete_of_vanished_task_rolls_back_with_not_found() {
    let mut h = make_harness();
    let id = seed(&mut h, "Gone soon", "srv-1").await;
    let before = h.manager.store().snapshot();
    h.api.fail_next(ApiError::NotFound { message: None });

    let outcome = h.manager.delete(&id).await.unwrap();
    assert!(matches!(
        outcome,
        SyncOutcome::RolledBack {
            category: ErrorCategory::NotFound,
            ..
        }
    ));
    assert_eq!(h.manager.store().snapshot(), before);

    let notices = drain(&mut h.notices);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, Level::Error);
    assert_eq!(notices[0].category, Some(ErrorCategory::NotFound));
    assert_eq!(notices[0].text, "Failed to delete task: task no longer exists");
}

#[tokio::test]
async fn toggle_then_401_expires_session() {
    let mut h = make_harness();
    let id = seed(&mut h, "Finish report", "srv-1").await;
    h.api.hold();
    h.api.fail_next(ApiError::Unauthenticated { message: None });

    let manager = h.manager.clone();
    let toggle_id = id.clone();
    let pending = tokio::spawn(async move { manager.toggle(&toggle_id).await });
    let seen = h.api.request_count();
    wait_for_requests(&h.api, seen + 1).await;

    assert_eq!(
        h.manager.store().get(&id).unwrap().status,
        TaskStatus::Completed
    );

    h.api.release();
    assert_eq!(pending.await.unwrap().unwrap(), SyncOutcome::SessionExpired);
    assert!(h.manager.store().is_empty());
    assert!(!h.manager.session().is_active());
    let notices = drain(&mut h.notices);
    assert_eq!(notices.last().unwrap().text, SESSION_EXPIRED);
}

#[tokio::test]
async fn editing_unsaved_task_is_refused() {
    let h = make_harness();
    h.api.hold();
    let pending = spawn_add(&h.manager, "Draft");
    wait_for_requests(&h.api, 1).await;

    let temp = h.manager.store().snapshot()[0].id.clone();
    let err = h.manager.edit(&temp, TaskDraft::new("Other")).await.unwrap_err();
    assert!(matches!(err, TaskError::PendingSync(_)));

    h.api.release();
    pending.await.unwrap().unwrap();
}

// ---------------------------------------------------------------------------
// Bulk operations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn complete_all_rolls_back_together() {
    let mut h = make_harness();
    let a = seed(&mut h, "Alpha", "srv-a").await;
    let b = seed(&mut h, "Beta", "srv-b").await;
    h.api.fail_next(network_down());

    let outcome = h.manager.complete_all().await.unwrap();
    assert!(matches!(outcome, SyncOutcome::RolledBack { .. }));
    for id in [&a, &b] {
        assert_eq!(h.manager.store().get(id).unwrap().status, TaskStatus::Pending);
    }
}

#[tokio::test]
async fn clear_completed_matches_server() {
    let mut h = make_harness();
    let done = seed(&mut h, "Done already", "srv-1").await;
    let open = seed(&mut h, "Still open", "srv-2").await;
    h.manager.toggle(&done).await.unwrap();

    let outcome = h.manager.clear_completed().await.unwrap();
    assert_eq!(outcome, SyncOutcome::Confirmed);
    assert_eq!(h.manager.store().snapshot().as_slice(), h.api.records().as_slice());
    assert!(h.manager.store().get(&open).is_some());
    assert!(h.manager.store().get(&done).is_none());
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn late_result_after_close_is_discarded() {
    let h = make_harness();
    h.api.hold();
    let pending = spawn_add(&h.manager, "Too late");
    wait_for_requests(&h.api, 1).await;

    h.manager.store().close();
    h.api.release();

    assert_eq!(pending.await.unwrap().unwrap(), SyncOutcome::Discarded);
    // The server kept it; the closed view was not reconciled.
    assert_eq!(h.api.records().len(), 1);
    let snapshot = h.manager.store().snapshot();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot[0].id.is_temporary());
}

#[tokio::test]
async fn refresh_replaces_local_list() {
    let api = Arc::new(InMemoryApi::new());
    api.assign_next_id("srv-x");
    let session = SessionContext::with_session(Session::new("tok", None));
    let manager = TodoManager::new(Arc::clone(&api), session, Notifier::silent());

    // Written behind the manager's back.
    api.create(&NewTask {
        text: "From elsewhere".into(),
        status: None,
        priority: None,
        due_date: None,
    })
    .await
    .unwrap();

    assert!(manager.store().is_empty());
    assert_eq!(manager.refresh().await.unwrap(), SyncOutcome::Confirmed);
    assert_eq!(manager.store().snapshot().as_slice(), api.records().as_slice());
}

#[tokio::test]
async fn refresh_overtaken_by_delete_is_dropped() {
    let mut h = make_harness();
    let id = seed(&mut h, "Walk dog", "a1").await;
    h.api.hold();

    let seen = h.api.request_count();
    let refresh = spawn_refresh(&h.manager);
    wait_for_requests(&h.api, seen + 1).await;
    let delete = spawn_delete(&h.manager, &id);
    wait_for_requests(&h.api, seen + 2).await;
    h.api.release();

    assert_eq!(refresh.await.unwrap().unwrap(), SyncOutcome::Discarded);
    assert_eq!(delete.await.unwrap().unwrap(), SyncOutcome::Confirmed);
    assert!(h.api.records().is_empty());
    assert!(h.manager.store().is_empty());
}

#[tokio::test]
async fn refresh_during_pending_delete_is_dropped() {
    let mut h = make_harness();
    let id = seed(&mut h, "Walk dog", "a1").await;
    h.api.hold();

    let seen = h.api.request_count();
    let delete = spawn_delete(&h.manager, &id);
    wait_for_requests(&h.api, seen + 1).await;
    let refresh = spawn_refresh(&h.manager);
    wait_for_requests(&h.api, seen + 2).await;
    h.api.release();

    assert_eq!(delete.await.unwrap().unwrap(), SyncOutcome::Confirmed);
    assert_eq!(refresh.await.unwrap().unwrap(), SyncOutcome::Discarded);
    assert_eq!(h.manager.store().snapshot().as_slice(), h.api.records().as_slice());

    // Nothing in flight any more, so the next refresh goes through.
    assert_eq!(h.manager.refresh().await.unwrap(), SyncOutcome::Confirmed);
    assert!(h.manager.store().is_empty());
}

#[tokio::test]
async fn logged_out_operations_fail_fast() {
    let api = Arc::new(InMemoryApi::new());
    let session = SessionContext::in_memory();
    let manager = TodoManager::new(Arc::clone(&api), session, Notifier::silent());
    assert_eq!(
        manager.add(TaskDraft::new("Buy milk")).await.unwrap_err(),
        TaskError::NotAuthenticated
    );
    assert_eq!(manager.refresh().await.unwrap_err(), TaskError::NotAuthenticated);
    assert_eq!(api.request_count(), 0);
}
