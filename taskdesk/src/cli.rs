//! Subcommands of the `taskdesk` binary.

use chrono::NaiveDate;
use taskdesk_proto::task::Priority;

use crate::tasks::{DateField, StatusFilter};

/// Top-level subcommand. Without one, the task screen opens.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in and store the session.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account.
    Register {
        /// Display name (letters only, 3+ characters).
        #[arg(long)]
        name: String,
        /// Account email.
        #[arg(long)]
        email: String,
        /// Password (8+ characters with upper, lower, digit and special).
        #[arg(long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Task list: interactive screen, or a one-shot action.
    Todo {
        /// One-shot action; opens the interactive screen when omitted.
        #[command(subcommand)]
        action: Option<TodoCommand>,
    },
    /// Show task statistics for the current account.
    Dashboard,
    /// Show the current account and its task counts.
    Profile,
    /// Send feedback.
    Feedback {
        /// Message text.
        #[arg(long)]
        message: String,
        /// Rating from 1 to 5.
        #[arg(long)]
        rating: u8,
        /// Name (taken from the session when logged in).
        #[arg(long)]
        name: Option<String>,
        /// Email (taken from the session when logged in).
        #[arg(long)]
        email: Option<String>,
        /// Age.
        #[arg(long)]
        age: Option<u8>,
    },
    /// Administration (admin accounts only).
    Admin {
        /// Admin action.
        #[command(subcommand)]
        action: AdminCommand,
    },
    /// List tasks matching a filter, with summary stats.
    Filter {
        /// Completion state.
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
        /// Only this priority (low, medium, high).
        #[arg(long)]
        priority: Option<Priority>,
        /// Case-insensitive text search.
        #[arg(long)]
        search: Option<String>,
        /// Range start (YYYY-MM-DD), inclusive.
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Range end (YYYY-MM-DD), inclusive.
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Date the range applies to.
        #[arg(long, value_enum)]
        by: Option<DateField>,
    },
}

/// One-shot task actions.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TodoCommand {
    /// Print the task list.
    List,
    /// Add a task.
    Add {
        /// Task text.
        text: String,
        /// Priority (low, medium, high).
        #[arg(long)]
        priority: Option<Priority>,
        /// Due date (YYYY-MM-DD).
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Replace a task's text, priority and due date.
    Edit {
        /// Task id.
        id: String,
        /// New text.
        text: String,
        /// Priority (low, medium, high).
        #[arg(long)]
        priority: Option<Priority>,
        /// Due date (YYYY-MM-DD).
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Delete a task.
    Rm {
        /// Task id.
        id: String,
    },
    /// Mark a task completed.
    Done {
        /// Task id.
        id: String,
    },
    /// Mark a task pending again.
    Undo {
        /// Task id.
        id: String,
    },
    /// Mark every pending task completed.
    CompleteAll,
    /// Delete every completed task.
    ClearCompleted,
}

/// Admin actions.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Show stats, users, tasks, feedback and recent activity.
    Show,
    /// Delete a user account.
    DeleteUser {
        /// User id.
        id: String,
    },
    /// Delete a task of any user.
    DeleteTodo {
        /// Task id.
        id: String,
    },
    /// Delete a feedback entry.
    DeleteFeedback {
        /// Feedback id.
        id: String,
    },
}
