//! Feedback form.

use taskdesk_proto::feedback::{FeedbackError, FeedbackRequest};

use crate::api::{ApiError, HttpApi};
use crate::session::SessionContext;

/// Shown after a successful submission.
pub const SUBMITTED: &str = "Feedback submitted successfully!";

/// Errors raised when submitting feedback.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The form is incomplete; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] FeedbackError),
    /// The backend rejected the submission or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SubmitError {
    /// Message to show the user, preferring the server's wording.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(e) => e.to_string(),
            Self::Api(e) => e
                .server_message()
                .map_or_else(|| "Feedback failed".to_string(), str::to_string),
        }
    }
}

/// A feedback form. When logged in, name and email come from the session
/// and cannot be changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackForm {
    request: FeedbackRequest,
    identity_locked: bool,
}

impl FeedbackForm {
    /// Creates a form, prefilled from the session user if there is one.
    #[must_use]
    pub fn new(session: &SessionContext) -> Self {
        match session.user() {
            Some(user) => Self {
                request: FeedbackRequest {
                    name: user.name,
                    email: user.email,
                    ..FeedbackRequest::default()
                },
                identity_locked: true,
            },
            None => Self {
                request: FeedbackRequest::default(),
                identity_locked: false,
            },
        }
    }

    /// Returns `true` when name and email are taken from the session.
    #[must_use]
    pub const fn is_identity_locked(&self) -> bool {
        self.identity_locked
    }

    /// Sets the name. Ignored (returns `false`) when locked.
    pub fn set_name(&mut self, name: &str) -> bool {
        if self.identity_locked {
            return false;
        }
        self.request.name = name.to_string();
        true
    }

    /// Sets the email. Ignored (returns `false`) when locked.
    pub fn set_email(&mut self, email: &str) -> bool {
        if self.identity_locked {
            return false;
        }
        self.request.email = email.to_string();
        true
    }

    /// Sets the optional age.
    pub const fn set_age(&mut self, age: Option<u8>) {
        self.request.age = age;
    }

    /// Sets the message.
    pub fn set_message(&mut self, message: &str) {
        self.request.message = message.to_string();
    }

    /// Sets the star rating.
    pub const fn set_rating(&mut self, rating: u8) {
        self.request.rating = rating;
    }

    /// The body that would be sent.
    #[must_use]
    pub const fn request(&self) -> &FeedbackRequest {
        &self.request
    }

    /// Validates and sends the form.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Invalid`] before sending anything, or
    /// [`SubmitError::Api`] if the backend refuses it.
    pub async fn submit(&self, api: &HttpApi) -> Result<&'static str, SubmitError> {
        self.request.validate()?;
        api.submit_feedback(&self.request).await?;
        tracing::info!(rating = self.request.rating, "feedback submitted");
        Ok(SUBMITTED)
    }
}
