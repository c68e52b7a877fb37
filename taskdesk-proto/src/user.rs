//! Account payloads for `/user/login-user` and `/user/register-user`.
//!
//! The credential checks below run on the client before a request is made.
//! They mirror the rules the backend enforces, so a rejected form never
//! costs a round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Characters allowed in a password besides ASCII letters and digits.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&#";

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum display name length.
pub const MIN_NAME_LENGTH: usize = 3;

/// Account role as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account.
    #[default]
    User,
    /// Administrator.
    Admin,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server identifier.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Account role (missing means a regular user).
    #[serde(default)]
    pub role: Role,
    /// Account creation time, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Returns `true` for administrator accounts.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Body of `POST /user/login-user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Lowercased, trimmed email.
    pub email: String,
    /// Trimmed password.
    pub password: String,
}

/// Body of `POST /user/register-user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Password satisfying [`validate_password`].
    pub password: String,
}

/// Response of the login and register endpoints.
///
/// Register may omit the token; login always sends one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    #[serde(default)]
    pub token: Option<String>,
    /// The authenticated account.
    #[serde(default)]
    pub user: Option<User>,
}

/// Reasons a login or registration form is rejected locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// Login form is missing email or password.
    #[error("All fields required")]
    LoginFieldsMissing,
    /// Registration form is missing a field.
    #[error("All fields are required")]
    RegisterFieldsMissing,
    /// Name is too short or contains non-letters.
    #[error("Name must contain only alphabets and at least 3 characters")]
    InvalidName,
    /// Password does not satisfy the complexity rule.
    #[error("Password must be 8+ chars with uppercase, lowercase, number & special char")]
    WeakPassword,
}

impl LoginRequest {
    /// Builds a login body, trimming both fields and lowercasing the email.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::LoginFieldsMissing`] if either is blank.
    pub fn new(email: &str, password: &str) -> Result<Self, CredentialError> {
        let email = email.trim().to_lowercase();
        let password = password.trim().to_string();
        if email.is_empty() || password.is_empty() {
            return Err(CredentialError::LoginFieldsMissing);
        }
        Ok(Self { email, password })
    }
}

impl RegisterRequest {
    /// Builds a registration body after checking every field.
    ///
    /// # Errors
    ///
    /// Returns the first [`CredentialError`] the form violates.
    pub fn new(name: &str, email: &str, password: &str) -> Result<Self, CredentialError> {
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(CredentialError::RegisterFieldsMissing);
        }
        validate_name(name)?;
        validate_password(password)?;
        Ok(Self {
            name: name.to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        })
    }
}

/// Checks that a display name is at least three ASCII letters.
///
/// # Errors
///
/// Returns [`CredentialError::InvalidName`] otherwise.
pub fn validate_name(name: &str) -> Result<(), CredentialError> {
    if name.chars().count() >= MIN_NAME_LENGTH && name.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(CredentialError::InvalidName)
    }
}

/// Checks password complexity.
///
/// At least eight characters drawn from letters, digits and
/// [`PASSWORD_SPECIALS`], with one of each class present.
///
/// # Errors
///
/// Returns [`CredentialError::WeakPassword`] otherwise.
pub fn validate_password(password: &str) -> Result<(), CredentialError> {
    let is_special = |c: char| PASSWORD_SPECIALS.contains(c);
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || is_special(c));
    let ok = allowed
        && password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(is_special);
    if ok {
        Ok(())
    } else {
        Err(CredentialError::WeakPassword)
    }
}
