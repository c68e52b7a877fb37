//! Filtering and summary statistics over a task list.

use std::fmt;

use chrono::NaiveDate;
use taskdesk_proto::task::{Priority, TaskRecord};

/// Which tasks to show by completion state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StatusFilter {
    /// Every task.
    #[default]
    All,
    /// Pending tasks.
    Active,
    /// Completed tasks.
    Completed,
}

impl StatusFilter {
    /// Next tab, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::All => Self::Active,
            Self::Active => Self::Completed,
            Self::Completed => Self::All,
        }
    }

    /// Tab label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

/// Date a range filter is evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DateField {
    /// The due date. Tasks without one never match a range.
    #[default]
    Due,
    /// The creation date.
    Created,
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Due => write!(f, "due"),
            Self::Created => write!(f, "created"),
        }
    }
}

/// Criteria a task must meet to be shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Completion state.
    pub status: StatusFilter,
    /// Only tasks with this priority.
    pub priority: Option<Priority>,
    /// Case-insensitive substring of the text.
    pub search: String,
    /// Start of the date range, inclusive.
    pub from: Option<NaiveDate>,
    /// End of the date range, inclusive.
    pub to: Option<NaiveDate>,
    /// Date the range applies to.
    pub date_field: DateField,
}

impl TaskFilter {
    /// Returns `true` if `record` meets every criterion.
    ///
    /// The date range only applies once both ends are set.
    #[must_use]
    pub fn matches(&self, record: &TaskRecord) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Active => !record.status.is_completed(),
            StatusFilter::Completed => record.status.is_completed(),
        };
        if !status_ok {
            return false;
        }
        if self.priority.is_some() && record.priority != self.priority {
            return false;
        }
        let needle = self.search.trim();
        if !needle.is_empty() && !record.text.to_lowercase().contains(&needle.to_lowercase()) {
            return false;
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            let date = match self.date_field {
                DateField::Due => record.due_date,
                DateField::Created => Some(record.created_at.date_naive()),
            };
            return date.is_some_and(|d| d >= from && d <= to);
        }
        true
    }

    /// Records that match, in their original order.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [TaskRecord]) -> Vec<&'a TaskRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    /// Cycles the priority filter: none, low, medium, high, none.
    pub const fn cycle_priority(&mut self) {
        self.priority = match self.priority {
            None => Some(Priority::Low),
            Some(Priority::Low) => Some(Priority::Medium),
            Some(Priority::Medium) => Some(Priority::High),
            Some(Priority::High) => None,
        };
    }

    /// Returns `true` if any criterion narrows the list.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status != StatusFilter::All
            || self.priority.is_some()
            || !self.search.trim().is_empty()
            || (self.from.is_some() && self.to.is_some())
    }
}

/// Counts over a task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    /// All tasks.
    pub total: usize,
    /// Completed tasks.
    pub completed: usize,
    /// Pending tasks.
    pub active: usize,
    /// Completed share in percent, rounded.
    pub progress: u8,
}

impl TaskStats {
    /// Computes the stats of `records`.
    #[must_use]
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TaskRecord>) -> Self {
        let (total, completed) = records.into_iter().fold((0, 0), |(t, c), r| {
            (t + 1, c + usize::from(r.status.is_completed()))
        });
        let progress = if total == 0 {
            0
        } else {
            // (200c + t) / 2t is round-half-up of 100c / t in integers.
            u8::try_from((completed * 200 + total) / (total * 2)).unwrap_or(100)
        };
        Self {
            total,
            completed,
            active: total - completed,
            progress,
        }
    }
}
