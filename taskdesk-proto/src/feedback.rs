//! Feedback form payloads for `/feedback/add-feedback`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Highest star rating.
pub const MAX_RATING: u8 = 5;

/// Body of `POST /feedback/add-feedback`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// Submitter name.
    pub name: String,
    /// Submitter email.
    pub email: String,
    /// Optional age.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    /// Free-form message.
    pub message: String,
    /// Star rating, `1..=MAX_RATING`. Zero means "not rated yet".
    pub rating: u8,
}

/// Reasons a feedback form is rejected locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedbackError {
    /// Name, email, message or rating is missing.
    #[error("All fields are required")]
    FieldsMissing,
    /// Rating is above [`MAX_RATING`].
    #[error("rating must be between 1 and {MAX_RATING}")]
    RatingOutOfRange,
}

impl FeedbackRequest {
    /// Checks that every required field is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`FeedbackError::FieldsMissing`] for a blank field or a zero
    /// rating, and [`FeedbackError::RatingOutOfRange`] above five stars.
    pub fn validate(&self) -> Result<(), FeedbackError> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.message.trim().is_empty()
            || self.rating == 0
        {
            return Err(FeedbackError::FieldsMissing);
        }
        if self.rating > MAX_RATING {
            return Err(FeedbackError::RatingOutOfRange);
        }
        Ok(())
    }
}

/// A stored feedback entry, as listed by the admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    /// Server identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Submitter name.
    pub name: String,
    /// Submitter email.
    pub email: String,
    /// Optional age.
    #[serde(default)]
    pub age: Option<u8>,
    /// Star rating.
    pub rating: u8,
    /// Message text.
    pub message: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}
