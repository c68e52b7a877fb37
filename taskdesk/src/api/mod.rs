//! Backend access.
//!
//! [`TodoApi`] is the seam the task manager talks through. [`HttpApi`]
//! speaks to the real REST backend; [`InMemoryApi`] keeps everything in
//! process for tests and offline use.

pub mod http;
pub mod memory;

use std::future::Future;

use taskdesk_proto::error::ErrorBody;
use taskdesk_proto::task::{NewTask, TaskId, TaskRecord, TaskUpdate};

pub use http::HttpApi;
pub use memory::InMemoryApi;

/// Broad class of a failure, used to pick a user-facing message and the
/// recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Input rejected, locally or by the server.
    Validation,
    /// Network trouble or a server-side fault; retrying may help.
    Transient,
    /// Missing, invalid or expired session.
    Authentication,
    /// Authenticated but not allowed.
    Forbidden,
    /// The target no longer exists.
    NotFound,
}

impl ErrorCategory {
    /// Short label used in logs and the status bar.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transient => "transient",
            Self::Authentication => "authentication",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not-found",
        }
    }
}

/// Errors returned by a backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No session is established, so no request was made.
    #[error("not logged in")]
    NoSession,
    /// HTTP 401.
    #[error("unauthenticated (401)")]
    Unauthenticated {
        /// Server-supplied reason.
        message: Option<String>,
    },
    /// HTTP 403.
    #[error("forbidden (403)")]
    Forbidden {
        /// Server-supplied reason.
        message: Option<String>,
    },
    /// HTTP 404.
    #[error("not found (404)")]
    NotFound {
        /// Server-supplied reason.
        message: Option<String>,
    },
    /// HTTP 400, 409 or 422: the server rejected the input.
    #[error("rejected by server ({status})")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Server-supplied reason.
        message: Option<String>,
    },
    /// Any other non-success status.
    #[error("server error ({status})")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-supplied reason.
        message: Option<String>,
    },
    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),
    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
    /// The request URL could not be built.
    #[error("invalid request URL: {0}")]
    Url(String),
}

impl ApiError {
    /// Builds the error for a non-success status and its body.
    #[must_use]
    pub fn from_status(status: u16, body: &ErrorBody) -> Self {
        let message = body.message().map(str::to_string);
        match status {
            401 => Self::Unauthenticated { message },
            403 => Self::Forbidden { message },
            404 => Self::NotFound { message },
            400 | 409 | 422 => Self::Rejected { status, message },
            _ => Self::Server { status, message },
        }
    }

    /// Classifies the error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NoSession | Self::Unauthenticated { .. } => ErrorCategory::Authentication,
            Self::Forbidden { .. } => ErrorCategory::Forbidden,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Rejected { .. } => ErrorCategory::Validation,
            Self::Server { .. } | Self::Network(_) | Self::Decode(_) | Self::Url(_) => {
                ErrorCategory::Transient
            }
        }
    }

    /// The reason the server gave, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthenticated { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Rejected { message, .. }
            | Self::Server { message, .. } => message.as_deref(),
            Self::NoSession | Self::Network(_) | Self::Decode(_) | Self::Url(_) => None,
        }
    }

    /// Message to show the user, preferring the server's own wording.
    ///
    /// `fallback` describes the failed operation, e.g. `"Failed to add task"`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        if let Some(message) = self.server_message() {
            return message.to_string();
        }
        match self {
            Self::NoSession => "Authentication required. Please login.".to_string(),
            Self::Unauthenticated { .. } => SESSION_EXPIRED.to_string(),
            Self::Forbidden { .. } => format!("{fallback}: access denied"),
            Self::NotFound { .. } => format!("{fallback}: task no longer exists"),
            Self::Rejected { .. } => format!("{fallback}: invalid input"),
            Self::Server { .. } | Self::Decode(_) | Self::Url(_) | Self::Network(_) => {
                format!("{fallback}. Please try again.")
            }
        }
    }
}

/// Shown when the backend stops accepting the session.
pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::from_status(status.as_u16(), &ErrorBody::default())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// The task endpoints of the backend.
///
/// Every call carries the current session's bearer token. Implementations
/// return [`ApiError::NoSession`] without touching the network when there is
/// none.
pub trait TodoApi: Send + Sync {
    /// `GET /todo`: all tasks of the current user, newest first.
    fn list(&self) -> impl Future<Output = Result<Vec<TaskRecord>, ApiError>> + Send;

    /// `POST /todo`: creates a task and returns the stored record.
    fn create(&self, task: &NewTask) -> impl Future<Output = Result<TaskRecord, ApiError>> + Send;

    /// `PUT /todo/{id}`: updates a task and returns the stored record.
    fn update(
        &self,
        id: &TaskId,
        update: &TaskUpdate,
    ) -> impl Future<Output = Result<TaskRecord, ApiError>> + Send;

    /// `DELETE /todo/{id}`.
    fn delete(&self, id: &TaskId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `DELETE /todo?status=completed`: removes every completed task.
    fn clear_completed(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}
