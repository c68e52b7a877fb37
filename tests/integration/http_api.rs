//! HTTP contract tests: every endpoint against an in-process axum stub.
//!
//! Checks request paths, the bearer header, and the mapping of response
//! statuses to `ApiError` variants and user-facing messages.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::redundant_clone)]

#[path = "support/stub_server.rs"]
mod stub_server;

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use taskdesk::admin::{self, AdminResource};
use taskdesk::api::{ApiError, ErrorCategory, HttpApi, TodoApi};
use taskdesk::auth::{self, AuthError, Landing};
use taskdesk::dashboard;
use taskdesk::feedback::{FeedbackForm, SUBMITTED, SubmitError};
use taskdesk::notify::Notifier;
use taskdesk::session::{Session, SessionContext};
use taskdesk::tasks::{SyncOutcome, TaskDraft, TodoManager};
use taskdesk_proto::task::{Priority, TaskId, TaskStatus, TaskUpdate};

use stub_server::{ADMIN_TOKEN, ALICE_PASSWORD, ALICE_TOKEN, FORBIDDEN_TOKEN};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn client(base: &str, session: &SessionContext) -> HttpApi {
    HttpApi::new(
        Url::parse(base).unwrap(),
        Duration::from_secs(5),
        session.clone(),
    )
    .unwrap()
}

fn logged_in(token: &str) -> SessionContext {
    SessionContext::with_session(Session::new(token, None))
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_normalises_email_and_sends_no_token() {
    let (base, stub) = stub_server::start().await;
    let session = SessionContext::in_memory();
    let api = client(&base, &session);

    let landing = auth::login(&api, &session, "  Alice@Example.com ", ALICE_PASSWORD)
        .await
        .unwrap();
    assert_eq!(landing, Landing::Dashboard);
    assert_eq!(session.token().as_deref(), Some(ALICE_TOKEN));
    assert_eq!(session.user().unwrap().name, "Alice");

    let seen = stub.last();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.target, "/user/login-user");
    assert_eq!(seen.token, None);
}

#[tokio::test]
async fn admin_login_lands_on_admin_panel() {
    let (base, _stub) = stub_server::start().await;
    let session = SessionContext::in_memory();
    let api = client(&base, &session);
    let landing = auth::login(&api, &session, "admin@example.com", ALICE_PASSWORD)
        .await
        .unwrap();
    assert_eq!(landing, Landing::Admin);
}

#[tokio::test]
async fn bad_credentials_show_server_message() {
    let (base, _stub) = stub_server::start().await;
    let session = SessionContext::in_memory();
    let api = client(&base, &session);

    let err = auth::login(&api, &session, "alice@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Api(ApiError::Unauthenticated { .. })));
    assert_eq!(err.user_message("Login failed"), "Invalid credentials");
    assert!(!session.is_active());
}

#[tokio::test]
async fn blank_login_is_rejected_locally() {
    let (base, stub) = stub_server::start().await;
    let session = SessionContext::in_memory();
    let api = client(&base, &session);
    let err = auth::login(&api, &session, " ", "pw").await.unwrap_err();
    assert_eq!(err.user_message("Login failed"), "All fields required");
    assert!(stub.seen().is_empty());
}

#[tokio::test]
async fn register_without_token_asks_to_log_in() {
    let (base, _stub) = stub_server::start().await;
    let session = SessionContext::in_memory();
    let api = client(&base, &session);

    let landing = auth::register(&api, &session, "Carol", "carol@example.com", "Str0ng!pw")
        .await
        .unwrap();
    assert_eq!(landing, None);
    assert!(!session.is_active());

    let err = auth::register(&api, &session, "Carol", "taken@example.com", "Str0ng!pw")
        .await
        .unwrap_err();
    assert_eq!(err.user_message("Registration failed"), "User already exists");
}

// ---------------------------------------------------------------------------
// Todos
// ---------------------------------------------------------------------------

#[tokio::test]
async fn todo_flow_through_manager() {
    let (base, stub) = stub_server::start().await;
    let session = logged_in(ALICE_TOKEN);
    let api = Arc::new(client(&base, &session));
    let manager = TodoManager::new(Arc::clone(&api), session, Notifier::silent());

    let draft = TaskDraft::parse_inline("Buy milk !high");
    assert_eq!(manager.add(draft).await.unwrap(), SyncOutcome::Confirmed);
    let id = TaskId::server("abc123");
    let record = manager.store().get(&id).unwrap();
    assert_eq!(record.priority, Some(Priority::High));

    assert_eq!(manager.toggle(&id).await.unwrap(), SyncOutcome::Confirmed);
    assert_eq!(stub.todos()[0]["status"], "completed");
    assert_eq!(
        manager.store().get(&id).unwrap().status,
        TaskStatus::Completed
    );

    assert_eq!(manager.clear_completed().await.unwrap(), SyncOutcome::Confirmed);
    assert!(stub.todos().is_empty());
    assert_eq!(stub.last().target, "/todo?status=completed");

    for seen in stub.seen() {
        assert_eq!(seen.token.as_deref(), Some(ALICE_TOKEN), "{seen:?}");
    }
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let (base, _stub) = stub_server::start().await;
    let session = logged_in(ALICE_TOKEN);
    let api = client(&base, &session);

    let err = api
        .update(&TaskId::server("missing"), &TaskUpdate::status(TaskStatus::Completed))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::NotFound {
            message: Some("Todo not found".into())
        }
    );

    let err = api.delete(&TaskId::server("boom")).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Transient);
    assert_eq!(err.user_message("Failed to delete task"), "Database unavailable");

    let forbidden = client(&base, &logged_in(FORBIDDEN_TOKEN));
    let err = forbidden.list().await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Forbidden);

    let stale = client(&base, &logged_in("tok-stale"));
    let err = stale.list().await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Authentication);
}

#[tokio::test]
async fn no_session_sends_nothing() {
    let (base, stub) = stub_server::start().await;
    let api = client(&base, &SessionContext::in_memory());
    assert_eq!(api.list().await.unwrap_err(), ApiError::NoSession);
    assert!(stub.seen().is_empty());
}

#[tokio::test]
async fn unreachable_backend_is_transient() {
    // Bind and drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(&format!("http://{addr}"), &logged_in(ALICE_TOKEN));
    let err = api.list().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "{err:?}");
    assert_eq!(err.category(), ErrorCategory::Transient);
}

#[tokio::test]
async fn expired_token_during_add_ends_session() {
    let (base, stub) = stub_server::start().await;
    let session = logged_in("tok-stale");
    let api = Arc::new(client(&base, &session));
    let manager = TodoManager::new(api, session.clone(), Notifier::silent());

    let outcome = manager.add(TaskDraft::new("Buy milk")).await.unwrap();
    assert_eq!(outcome, SyncOutcome::SessionExpired);
    assert!(!session.is_active());
    assert!(manager.store().is_empty());
    assert!(stub.todos().is_empty());
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dashboard_counts_and_failures() {
    let (base, _stub) = stub_server::start().await;
    let session = logged_in(ALICE_TOKEN);
    let api = client(&base, &session);
    api.create(&taskdesk_proto::task::NewTask {
        text: "One".into(),
        status: Some(TaskStatus::Completed),
        priority: None,
        due_date: None,
    })
    .await
    .unwrap();

    let board = dashboard::load(&api, &session).await;
    assert_eq!(board.error, None);
    assert_eq!(board.stats.total, 1);
    assert_eq!(board.stats.completed, 1);

    let forbidden = logged_in(FORBIDDEN_TOKEN);
    let board = dashboard::load(&client(&base, &forbidden), &forbidden).await;
    assert_eq!(board.error.as_deref(), Some("Access denied. Invalid token."));
    assert_eq!(board.stats.total, 0);
    assert!(forbidden.is_active());

    let stale = logged_in("tok-stale");
    let board = dashboard::load(&client(&base, &stale), &stale).await;
    assert_eq!(
        board.error.as_deref(),
        Some("Session expired. Please log in again.")
    );
    assert!(!stale.is_active());
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anonymous_feedback_sends_no_token() {
    let (base, stub) = stub_server::start().await;
    let session = SessionContext::in_memory();
    let api = client(&base, &session);

    let mut form = FeedbackForm::new(&session);
    form.set_name("Bob");
    form.set_email("bob@example.com");
    form.set_message("Nice app");
    form.set_rating(4);
    assert_eq!(form.submit(&api).await.unwrap(), SUBMITTED);
    assert_eq!(stub.last().target, "/feedback/add-feedback");
    assert_eq!(stub.last().token, None);
}

#[tokio::test]
async fn logged_in_feedback_uses_session_identity() {
    let (base, stub) = stub_server::start().await;
    let session = SessionContext::in_memory();
    let api = client(&base, &session);
    auth::login(&api, &session, "alice@example.com", ALICE_PASSWORD)
        .await
        .unwrap();

    let mut form = FeedbackForm::new(&session);
    assert!(!form.set_name("Mallory"));
    form.set_message("Love it");
    form.set_rating(5);
    form.submit(&api).await.unwrap();
    assert_eq!(stub.last().token.as_deref(), Some(ALICE_TOKEN));
}

#[tokio::test]
async fn incomplete_feedback_is_not_sent() {
    let (base, stub) = stub_server::start().await;
    let session = SessionContext::in_memory();
    let api = client(&base, &session);
    let form = FeedbackForm::new(&session);
    let err = form.submit(&api).await.unwrap_err();
    assert!(matches!(err, SubmitError::Invalid(_)));
    assert_eq!(err.user_message(), "All fields are required");
    assert!(stub.seen().is_empty());
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_panel_loads_and_deletes() {
    let (base, stub) = stub_server::start().await;
    let session = logged_in(ADMIN_TOKEN);
    let api = client(&base, &session);

    let data = admin::load(&api).await.unwrap();
    assert_eq!(data.stats.total_users, 2);
    assert_eq!(data.users.len(), 2);
    assert_eq!(data.feedback[0].name, "Bob");
    assert_eq!(data.recent_activity().len(), 5);
    assert_eq!(data.todos[0].user.as_ref().unwrap().name, "Alice");

    admin::delete_and_reload(&api, AdminResource::User, "u1")
        .await
        .unwrap();
    assert!(
        stub.seen()
            .iter()
            .any(|s| s.method == "DELETE" && s.target == "/admin/users/u1")
    );

    let err = admin::delete_and_reload(&api, AdminResource::Feedback, "nope")
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn admin_panel_requires_admin_token() {
    let (base, _stub) = stub_server::start().await;
    let session = logged_in(ALICE_TOKEN);
    let err = admin::load(&client(&base, &session)).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Forbidden);
}
