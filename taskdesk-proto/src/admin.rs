//! Dashboard and admin panel payloads.

use serde::{Deserialize, Serialize};

use crate::task::TaskRecord;

/// Response of `GET /dashboard/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// All tasks of the current user.
    #[serde(default)]
    pub total: u64,
    /// Tasks still pending.
    #[serde(default)]
    pub pending: u64,
    /// Tasks completed.
    #[serde(default)]
    pub completed: u64,
}

/// Response of `GET /admin/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminStats {
    /// Registered accounts.
    pub total_users: u64,
    /// Tasks across all accounts.
    pub total_todos: u64,
    /// Feedback entries.
    pub total_feedback: u64,
    /// Pending tasks across all accounts.
    pub pending_todos: u64,
    /// Completed tasks across all accounts.
    pub completed_todos: u64,
}

/// Owner summary attached to admin task listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOwner {
    /// Owner display name.
    pub name: String,
}

/// A task as listed by `GET /admin/todos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminTodo {
    /// The task itself.
    #[serde(flatten)]
    pub task: TaskRecord,
    /// Owning account, when populated by the server.
    #[serde(default)]
    pub user: Option<TaskOwner>,
}
