//! Admin panel: platform stats, users, tasks and feedback.

use std::fmt;

use taskdesk_proto::admin::{AdminStats, AdminTodo};
use taskdesk_proto::feedback::FeedbackEntry;
use taskdesk_proto::user::User;

use crate::api::{ApiError, HttpApi};

/// Shown when any of the admin listings fails.
pub const LOAD_FAILED: &str = "Failed to load admin data";

/// Number of tasks shown as recent activity.
pub const RECENT_ACTIVITY: usize = 5;

/// Kind of entity an admin can delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminResource {
    /// A user account.
    User,
    /// A task.
    Todo,
    /// A feedback entry.
    Feedback,
}

impl AdminResource {
    /// Path segment under `/admin`.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Todo => "todos",
            Self::Feedback => "feedback",
        }
    }
}

impl fmt::Display for AdminResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Todo => write!(f, "Todo"),
            Self::Feedback => write!(f, "Feedback"),
        }
    }
}

/// Everything the admin panel shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminData {
    /// Platform-wide counts.
    pub stats: AdminStats,
    /// All accounts.
    pub users: Vec<User>,
    /// All tasks, newest first.
    pub todos: Vec<AdminTodo>,
    /// All feedback entries.
    pub feedback: Vec<FeedbackEntry>,
}

impl AdminData {
    /// The most recent tasks.
    #[must_use]
    pub fn recent_activity(&self) -> &[AdminTodo] {
        &self.todos[..self.todos.len().min(RECENT_ACTIVITY)]
    }
}

/// Loads the four admin listings concurrently.
///
/// # Errors
///
/// Returns the first [`ApiError`]; show [`LOAD_FAILED`] for it.
pub async fn load(api: &HttpApi) -> Result<AdminData, ApiError> {
    let (stats, users, todos, feedback) = tokio::try_join!(
        api.admin_stats(),
        api.admin_users(),
        api.admin_todos(),
        api.admin_feedback(),
    )
    .inspect_err(|e| tracing::warn!(error = %e, "admin load failed"))?;
    Ok(AdminData {
        stats,
        users,
        todos,
        feedback,
    })
}

/// Deletes an entity, then reloads the panel.
///
/// # Errors
///
/// Returns the [`ApiError`] of the delete or of the reload.
pub async fn delete_and_reload(
    api: &HttpApi,
    resource: AdminResource,
    id: &str,
) -> Result<AdminData, ApiError> {
    api.admin_delete(resource, id).await?;
    tracing::info!(%resource, id, "admin delete");
    load(api).await
}

/// Message after a successful delete.
#[must_use]
pub fn deleted_message(resource: AdminResource) -> String {
    format!("{resource} deleted successfully")
}

/// Message after a failed delete.
#[must_use]
pub fn delete_failed_message(resource: AdminResource) -> String {
    format!("Failed to delete {}", resource.to_string().to_lowercase())
}
