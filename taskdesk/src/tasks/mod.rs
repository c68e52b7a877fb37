//! Task list management with optimistic updates.
//!
//! Every change to the list is applied locally first and then sent to the
//! backend; see [`TodoManager`] for the user-facing operations and
//! [`mutations`] for how each change is applied, reverted and reconciled.

pub mod filter;
pub mod manager;
pub mod mutations;

pub use filter::{DateField, StatusFilter, TaskFilter, TaskStats};
pub use manager::TodoManager;

use chrono::NaiveDate;
use taskdesk_proto::task::{Priority, TaskId, TaskRecord, ValidationError, parse_date};
use thiserror::Error;

use crate::api::ErrorCategory;
use crate::optimistic::{Record, StoreError};

impl Record for TaskRecord {
    type Key = TaskId;

    fn key(&self) -> &TaskId {
        &self.id
    }
}

/// Errors that stop a task operation before anything is sent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    /// Task text failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No session is established.
    #[error("Authentication required. Please login.")]
    NotAuthenticated,
    /// Task with the given ID is not in the local list.
    #[error("task not found: {0}")]
    TaskNotFound(String),
    /// The task was just created and the server has not assigned its id.
    #[error("task {0} is still being saved")]
    PendingSync(String),
    /// Complete-all found no pending tasks.
    #[error("No pending tasks to complete")]
    NothingToComplete,
    /// Clear-completed found no completed tasks.
    #[error("No completed tasks to clear")]
    NothingToClear,
    /// The local store refused the change.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How a task operation ended once the server answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The server accepted the change.
    Confirmed,
    /// The server rejected the change or could not be reached. The list is
    /// back to its prior state.
    RolledBack {
        /// Failure class.
        category: ErrorCategory,
        /// Message shown to the user.
        message: String,
        /// Input to put back in the form, for operations that consumed one.
        restored_input: Option<RestoredInput>,
    },
    /// The backend rejected the session. The list was cleared and the user
    /// must log in again.
    SessionExpired,
    /// The view was closed or the session reset before the answer came
    /// back; nothing was applied.
    Discarded,
}

/// Input handed back by a rolled-back add or edit, in the inline syntax of
/// [`TaskDraft::parse_inline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoredInput {
    /// Text of a task that was never created.
    Add(String),
    /// Replacement text for an existing task.
    Edit(TaskId, String),
}

impl RestoredInput {
    /// The text to put back.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Add(text) | Self::Edit(_, text) => text,
        }
    }
}

impl SyncOutcome {
    /// Returns `true` for [`SyncOutcome::Confirmed`].
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// User input for a new or edited task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Task text, not yet validated.
    pub text: String,
    /// Optional priority.
    pub priority: Option<Priority>,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    /// A draft with only text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Parses a single input line.
    ///
    /// Trailing `!low`, `!medium` or `!high` sets the priority and a
    /// trailing `@YYYY-MM-DD` sets the due date, in any order. Anything
    /// else stays part of the text.
    #[must_use]
    pub fn parse_inline(line: &str) -> Self {
        let mut words: Vec<&str> = line.split_whitespace().collect();
        let mut draft = Self::default();
        while let Some(last) = words.last() {
            if let Some(p) = last.strip_prefix('!')
                && draft.priority.is_none()
                && let Ok(priority) = p.parse::<Priority>()
            {
                draft.priority = Some(priority);
            } else if let Some(d) = last.strip_prefix('@')
                && draft.due_date.is_none()
                && let Some(date) = parse_date(d)
            {
                draft.due_date = Some(date);
            } else {
                break;
            }
            words.pop();
        }
        draft.text = words.join(" ");
        draft
    }

    /// Renders the draft back into the inline syntax.
    #[must_use]
    pub fn to_inline(&self) -> String {
        let mut line = self.text.clone();
        if let Some(priority) = self.priority {
            line.push_str(&format!(" !{}", priority.to_string().to_lowercase()));
        }
        if let Some(due) = self.due_date {
            line.push_str(&format!(" @{}", due.format("%Y-%m-%d")));
        }
        line
    }

    /// Draft for editing an existing record.
    #[must_use]
    pub fn from_record(record: &TaskRecord) -> Self {
        Self {
            text: record.text.clone(),
            priority: record.priority,
            due_date: record.due_date,
        }
    }
}
