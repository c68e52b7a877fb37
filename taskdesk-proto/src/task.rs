//! Task record types for the `/todo` endpoints.
//!
//! A [`TaskRecord`] is what the server returns. [`NewTask`] and
//! [`TaskUpdate`] are the request bodies for create and update. Text
//! validation lives in [`TextPolicy`] so the client can reject bad input
//! before any request is made.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix used when rendering temporary identifiers.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Identifier of a task record.
///
/// Records fetched from or confirmed by the server carry a
/// [`TaskId::Server`] id. Records inserted optimistically carry a
/// [`TaskId::Temporary`] id until the create request resolves. Temporary
/// ids never go over the wire: the server only ever sees server ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskId {
    /// Identifier assigned by the server.
    Server(String),
    /// Placeholder assigned locally (UUID v7, time-ordered).
    Temporary(Uuid),
}

impl TaskId {
    /// Creates a fresh temporary identifier.
    #[must_use]
    pub fn temporary() -> Self {
        Self::Temporary(Uuid::now_v7())
    }

    /// Creates a server identifier.
    pub fn server(id: impl Into<String>) -> Self {
        Self::Server(id.into())
    }

    /// Returns `true` for a locally generated placeholder.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self::Server(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::Server(value.to_string())
    }
}

impl From<TaskId> for String {
    fn from(value: TaskId) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(id) => write!(f, "{id}"),
            Self::Temporary(uuid) => write!(f, "{TEMP_ID_PREFIX}{uuid}"),
        }
    }
}

/// Completion state of a task. Transitions are binary and reversible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not done yet.
    #[default]
    Pending,
    /// Done.
    Completed,
}

impl TaskStatus {
    /// Returns the opposite status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }

    /// Returns `true` for [`TaskStatus::Completed`].
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Task priority. The server spells these capitalised; lowercase is
/// accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// Low priority.
    #[serde(alias = "low")]
    Low,
    /// Medium priority (the default for new tasks).
    #[default]
    #[serde(alias = "medium")]
    Medium,
    /// High priority.
    #[serde(alias = "high")]
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Error returned when a priority string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority: {0} (expected low, medium or high)")]
pub struct UnknownPriority(pub String);

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(UnknownPriority(s.to_string())),
        }
    }
}

/// A task as stored by the server and mirrored in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Server id, or a temporary id while a create is in flight.
    #[serde(rename = "_id")]
    pub id: TaskId,
    /// Task text (trimmed, validated by [`TextPolicy`]).
    pub text: String,
    /// Completion state.
    #[serde(default)]
    pub status: TaskStatus,
    /// Optional priority.
    #[serde(default, with = "lenient_priority")]
    pub priority: Option<Priority>,
    /// Optional due date.
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
    /// Creation time. Server-assigned; local time for optimistic records.
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Applies an update body to this record in place.
    pub fn apply_update(&mut self, update: &TaskUpdate) {
        match update {
            TaskUpdate::Edit(edit) => {
                self.text.clone_from(&edit.text);
                self.priority = edit.priority;
                self.due_date = edit.due_date;
            }
            TaskUpdate::Status(change) => self.status = change.status,
        }
    }
}

/// Body of `POST /todo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    /// Task text.
    pub text: String,
    /// Initial status (server defaults to pending).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Optional priority.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient_priority")]
    pub priority: Option<Priority>,
    /// Optional due date.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "due_date")]
    pub due_date: Option<NaiveDate>,
}

/// Replacement of the editable fields of a task.
///
/// All three fields are always sent; `null` clears priority or due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEdit {
    /// New task text.
    pub text: String,
    /// New priority.
    #[serde(default, with = "lenient_priority")]
    pub priority: Option<Priority>,
    /// New due date.
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
}

/// A status-only change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// New status.
    pub status: TaskStatus,
}

/// Body of `PUT /todo/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskUpdate {
    /// Text, priority and due date replaced together.
    Edit(TaskEdit),
    /// Status flipped or set.
    Status(StatusChange),
}

impl TaskUpdate {
    /// Shorthand for a status-only update.
    #[must_use]
    pub const fn status(status: TaskStatus) -> Self {
        Self::Status(StatusChange { status })
    }
}

// ---------------------------------------------------------------------------
// Text validation
// ---------------------------------------------------------------------------

/// Reasons task text can be rejected before it is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Text is empty after trimming.
    #[error("Todo text is required")]
    Empty,
    /// Text is shorter than the policy minimum.
    #[error("Todo must be at least {min} characters")]
    TooShort {
        /// Minimum length in characters.
        min: usize,
    },
    /// Text exceeds the policy maximum.
    #[error("Todo cannot exceed {max} characters")]
    TooLong {
        /// Maximum length in characters.
        max: usize,
    },
    /// Text contains characters other than letters and spaces.
    #[error("Todo must contain only alphabets and spaces")]
    InvalidCharacters,
}

/// Length and charset rules for task text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPolicy {
    /// Minimum length in characters, after trimming.
    pub min_chars: usize,
    /// Maximum length in characters, after trimming.
    pub max_chars: usize,
    /// Only ASCII letters and whitespace are allowed.
    pub letters_only: bool,
}

impl Default for TextPolicy {
    fn default() -> Self {
        Self {
            min_chars: 2,
            max_chars: 50,
            letters_only: false,
        }
    }
}

impl TextPolicy {
    /// Trims `raw` and checks it against the policy.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] the text violates.
    pub fn normalize(&self, raw: &str) -> Result<String, ValidationError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty);
        }
        let len = text.chars().count();
        if len < self.min_chars {
            return Err(ValidationError::TooShort {
                min: self.min_chars,
            });
        }
        if len > self.max_chars {
            return Err(ValidationError::TooLong {
                max: self.max_chars,
            });
        }
        if self.letters_only
            && !text
                .chars()
                .all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        {
            return Err(ValidationError::InvalidCharacters);
        }
        Ok(text.to_string())
    }
}

// ---------------------------------------------------------------------------
// Lenient serde helpers
// ---------------------------------------------------------------------------

/// Parses either `YYYY-MM-DD` or an RFC 3339 timestamp into a date.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// `dueDate`: `null`, `""`, a date, or a timestamp on input; a date or `null`
/// on output.
pub mod due_date {
    use chrono::NaiveDate;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes as `YYYY-MM-DD` or `null`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    /// Deserializes leniently; blank strings become `None`.
    ///
    /// # Errors
    ///
    /// Fails on a non-blank string that is neither a date nor a timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_date(s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date: {s}"))),
        }
    }
}

/// `priority`: blank or missing becomes `None`, any casing is accepted.
pub mod lenient_priority {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Priority;

    /// Serializes the capitalised spelling or `null`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(priority: &Option<Priority>, s: S) -> Result<S::Ok, S::Error> {
        priority.serialize(s)
    }

    /// Deserializes case-insensitively; blank strings become `None`.
    ///
    /// # Errors
    ///
    /// Fails on an unknown, non-blank priority.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Priority>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some).map_err(D::Error::custom),
        }
    }
}
