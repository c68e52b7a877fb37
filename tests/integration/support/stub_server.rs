//! In-process stand-in for the task backend, bound to `127.0.0.1:0`.
//!
//! Tokens are fixed strings: [`ALICE_TOKEN`] and [`ADMIN_TOKEN`] are
//! accepted, [`FORBIDDEN_TOKEN`] gets 403 and anything else gets 401.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use parking_lot::Mutex;
use serde_json::{Value, json};

pub const ALICE_TOKEN: &str = "tok-alice";
pub const ADMIN_TOKEN: &str = "tok-admin";
pub const FORBIDDEN_TOKEN: &str = "tok-forbidden";
pub const ALICE_PASSWORD: &str = "Secret1!";

type Reply = (StatusCode, Json<Value>);

/// A request as the stub saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub method: String,
    /// Path and query.
    pub target: String,
    pub token: Option<String>,
}

#[derive(Default)]
struct Inner {
    seen: Vec<Seen>,
    todos: Vec<Value>,
    next_id: u32,
}

/// Handle to the running stub.
#[derive(Clone, Default)]
pub struct Stub {
    inner: Arc<Mutex<Inner>>,
}

impl Stub {
    pub fn seen(&self) -> Vec<Seen> {
        self.inner.lock().seen.clone()
    }

    pub fn last(&self) -> Seen {
        self.inner.lock().seen.last().cloned().unwrap()
    }

    pub fn todos(&self) -> Vec<Value> {
        self.inner.lock().todos.clone()
    }
}

/// Starts the stub and returns its base URL.
pub async fn start() -> (String, Stub) {
    let stub = Stub::default();
    let app = Router::new()
        .route("/user/login-user", post(login))
        .route("/user/register-user", post(register))
        .route("/todo", get(list_todos).post(create_todo).delete(clear_todos))
        .route("/todo/{id}", put(update_todo).delete(delete_todo))
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/feedback/add-feedback", post(add_feedback))
        .route("/admin/stats", get(admin_stats))
        .route("/admin/users", get(admin_users))
        .route("/admin/todos", get(admin_todos))
        .route("/admin/feedback", get(admin_feedback))
        .route("/admin/{kind}/{id}", delete(admin_delete))
        .layer(middleware::from_fn_with_state(stub.clone(), record))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), stub)
}

// ---------------------------------------------------------------------------
// Plumbing
// ---------------------------------------------------------------------------

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

async fn record(State(stub): State<Stub>, request: Request, next: Next) -> Response {
    let seen = Seen {
        method: request.method().to_string(),
        target: request.uri().to_string(),
        token: bearer(request.headers()),
    };
    stub.inner.lock().seen.push(seen);
    next.run(request).await
}

fn reply(status: StatusCode, body: Value) -> Reply {
    (status, Json(body))
}

fn message(status: StatusCode, text: &str) -> Reply {
    reply(status, json!({ "message": text }))
}

fn authorize(headers: &HeaderMap) -> Result<String, Reply> {
    match bearer(headers).as_deref() {
        None => Err(message(StatusCode::UNAUTHORIZED, "No token provided")),
        Some(FORBIDDEN_TOKEN) => Err(message(StatusCode::FORBIDDEN, "Invalid token")),
        Some(t @ (ALICE_TOKEN | ADMIN_TOKEN)) => Ok(t.to_string()),
        Some(_) => Err(message(StatusCode::UNAUTHORIZED, "Token expired")),
    }
}

fn authorize_admin(headers: &HeaderMap) -> Result<(), Reply> {
    if authorize(headers)? == ADMIN_TOKEN {
        Ok(())
    } else {
        Err(message(StatusCode::FORBIDDEN, "Admin access required"))
    }
}

fn user(id: &str, name: &str, email: &str, role: &str) -> Value {
    json!({ "_id": id, "name": name, "email": email, "role": role })
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

async fn login(Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match (email, password) {
        ("alice@example.com", ALICE_PASSWORD) => reply(
            StatusCode::OK,
            json!({ "token": ALICE_TOKEN, "user": user("u1", "Alice", email, "user") }),
        ),
        ("admin@example.com", ALICE_PASSWORD) => reply(
            StatusCode::OK,
            json!({ "token": ADMIN_TOKEN, "user": user("u0", "Root", email, "admin") }),
        ),
        _ => message(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn register(Json(body): Json<Value>) -> Reply {
    if body["email"] == "taken@example.com" {
        return message(StatusCode::CONFLICT, "User already exists");
    }
    message(StatusCode::CREATED, "User registered successfully")
}

// ---------------------------------------------------------------------------
// Todos
// ---------------------------------------------------------------------------

async fn list_todos(State(stub): State<Stub>, headers: HeaderMap) -> Reply {
    if let Err(e) = authorize(&headers) {
        return e;
    }
    reply(StatusCode::OK, Value::Array(stub.todos()))
}

async fn create_todo(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(e) = authorize(&headers) {
        return e;
    }
    let mut inner = stub.inner.lock();
    let id = format!("abc{}", 123 + inner.next_id);
    inner.next_id += 1;
    let record = json!({
        "_id": id,
        "text": body["text"],
        "status": body.get("status").cloned().unwrap_or_else(|| json!("pending")),
        "priority": body.get("priority").cloned().unwrap_or(Value::Null),
        "dueDate": body.get("dueDate").cloned().unwrap_or(Value::Null),
        "createdAt": "2026-01-01T09:30:00.000Z",
    });
    inner.todos.insert(0, record.clone());
    reply(StatusCode::CREATED, record)
}

async fn update_todo(
    State(stub): State<Stub>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(e) = authorize(&headers) {
        return e;
    }
    let mut inner = stub.inner.lock();
    let Some(record) = inner.todos.iter_mut().find(|t| t["_id"] == id.as_str()) else {
        return message(StatusCode::NOT_FOUND, "Todo not found");
    };
    if let (Some(target), Some(changes)) = (record.as_object_mut(), body.as_object()) {
        for (k, v) in changes {
            target.insert(k.clone(), v.clone());
        }
    }
    reply(StatusCode::OK, record.clone())
}

async fn delete_todo(
    State(stub): State<Stub>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    if let Err(e) = authorize(&headers) {
        return e;
    }
    if id == "boom" {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    let mut inner = stub.inner.lock();
    let before = inner.todos.len();
    inner.todos.retain(|t| t["_id"] != id.as_str());
    if inner.todos.len() == before {
        return message(StatusCode::NOT_FOUND, "Todo not found");
    }
    message(StatusCode::OK, "Todo deleted")
}

async fn clear_todos(
    State(stub): State<Stub>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Reply {
    if let Err(e) = authorize(&headers) {
        return e;
    }
    if query.get("status").map(String::as_str) != Some("completed") {
        return message(StatusCode::BAD_REQUEST, "Only completed todos can be cleared");
    }
    stub.inner.lock().todos.retain(|t| t["status"] != "completed");
    message(StatusCode::OK, "Completed todos cleared")
}

async fn dashboard_stats(State(stub): State<Stub>, headers: HeaderMap) -> Reply {
    if let Err(e) = authorize(&headers) {
        return e;
    }
    let todos = stub.todos();
    let completed = todos.iter().filter(|t| t["status"] == "completed").count();
    reply(
        StatusCode::OK,
        json!({ "total": todos.len(), "pending": todos.len() - completed, "completed": completed }),
    )
}

// ---------------------------------------------------------------------------
// Feedback and admin
// ---------------------------------------------------------------------------

async fn add_feedback(Json(body): Json<Value>) -> Reply {
    let present = ["name", "email", "message"]
        .iter()
        .all(|k| body[k].as_str().is_some_and(|s| !s.is_empty()));
    if !present || body["rating"].as_u64().unwrap_or(0) == 0 {
        return message(StatusCode::BAD_REQUEST, "All fields are required");
    }
    message(StatusCode::CREATED, "Feedback submitted")
}

async fn admin_stats(headers: HeaderMap) -> Reply {
    if let Err(e) = authorize_admin(&headers) {
        return e;
    }
    reply(
        StatusCode::OK,
        json!({
            "totalUsers": 2, "totalTodos": 6, "totalFeedback": 1,
            "pendingTodos": 4, "completedTodos": 2
        }),
    )
}

async fn admin_users(headers: HeaderMap) -> Reply {
    if let Err(e) = authorize_admin(&headers) {
        return e;
    }
    reply(
        StatusCode::OK,
        json!([
            user("u0", "Root", "admin@example.com", "admin"),
            user("u1", "Alice", "alice@example.com", "user"),
        ]),
    )
}

async fn admin_todos(headers: HeaderMap) -> Reply {
    if let Err(e) = authorize_admin(&headers) {
        return e;
    }
    let todos: Vec<Value> = (1..=6)
        .map(|n| {
            json!({
                "_id": format!("t{n}"),
                "text": format!("Task {n}"),
                "status": if n % 3 == 0 { "completed" } else { "pending" },
                "createdAt": "2026-01-01T09:30:00.000Z",
                "user": { "name": "Alice" },
            })
        })
        .collect();
    reply(StatusCode::OK, Value::Array(todos))
}

async fn admin_feedback(headers: HeaderMap) -> Reply {
    if let Err(e) = authorize_admin(&headers) {
        return e;
    }
    reply(
        StatusCode::OK,
        json!([{
            "_id": "f1", "name": "Bob", "email": "bob@example.com",
            "rating": 4, "message": "Nice app", "createdAt": "2026-01-02T10:00:00.000Z"
        }]),
    )
}

async fn admin_delete(Path((_kind, id)): Path<(String, String)>, headers: HeaderMap) -> Reply {
    if let Err(e) = authorize_admin(&headers) {
        return e;
    }
    if id == "nope" {
        return message(StatusCode::NOT_FOUND, "Not found");
    }
    message(StatusCode::OK, "Deleted")
}
