//! Dashboard statistics and the profile summary.

use taskdesk_proto::admin::DashboardStats;
use taskdesk_proto::task::TaskRecord;
use taskdesk_proto::user::User;

use crate::api::{ApiError, HttpApi, TodoApi};
use crate::session::SessionContext;
use crate::tasks::TaskStats;

/// What the dashboard shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dashboard {
    /// Name to greet, from the session.
    pub name: Option<String>,
    /// Task counts; zeroed when loading failed.
    pub stats: DashboardStats,
    /// Why loading failed, if it did.
    pub error: Option<String>,
}

/// Message for a failed stats request.
#[must_use]
pub fn error_message(err: &ApiError) -> &'static str {
    match err {
        ApiError::NoSession | ApiError::Unauthenticated { .. } => {
            "Session expired. Please log in again."
        }
        ApiError::Forbidden { .. } => "Access denied. Invalid token.",
        ApiError::NotFound { .. } => "Dashboard endpoint not found.",
        _ => "Failed to load dashboard statistics. Please try again.",
    }
}

/// Loads the dashboard. Never fails: errors end up in
/// [`Dashboard::error`] with zeroed stats.
///
/// A rejected session is expired.
pub async fn load(api: &HttpApi, session: &SessionContext) -> Dashboard {
    let name = session.user().map(|u| u.name);
    match api.dashboard_stats().await {
        Ok(stats) => Dashboard {
            name,
            stats,
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "dashboard stats failed");
            if matches!(e, ApiError::Unauthenticated { .. }) {
                session.expire();
            }
            Dashboard {
                name,
                stats: DashboardStats::default(),
                error: Some(error_message(&e).to_string()),
            }
        }
    }
}

/// The current account with its task counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Account, when the session carries one.
    pub user: Option<User>,
    /// Counts over the account's tasks.
    pub stats: TaskStats,
}

impl Profile {
    /// Summarises `records` for `user`.
    #[must_use]
    pub fn summarize(user: Option<User>, records: &[TaskRecord]) -> Self {
        Self {
            user,
            stats: TaskStats::from_records(records),
        }
    }
}

/// Loads the profile of the session user.
///
/// # Errors
///
/// Returns the [`ApiError`] of the task listing.
pub async fn profile<A: TodoApi>(api: &A, session: &SessionContext) -> Result<Profile, ApiError> {
    let records = api.list().await?;
    Ok(Profile::summarize(session.user(), &records))
}
