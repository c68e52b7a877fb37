//! Login, registration and logout.

use taskdesk_proto::user::{AuthResponse, CredentialError, LoginRequest, RegisterRequest, User};

use crate::api::{ApiError, HttpApi};
use crate::session::{Session, SessionContext, SessionError};

/// Shown after a successful logout.
pub const LOGGED_OUT: &str = "Logged out successfully";

/// Where to go after logging in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// Regular accounts land on their dashboard.
    Dashboard,
    /// Administrators land on the admin panel.
    Admin,
}

impl Landing {
    fn for_user(user: Option<&User>) -> Self {
        if user.is_some_and(User::is_admin) {
            Self::Admin
        } else {
            Self::Dashboard
        }
    }
}

/// Errors raised by the account flows.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The form failed local validation; nothing was sent.
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    /// The backend rejected the request or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Login succeeded but the response carried no token.
    #[error("login response did not include a token")]
    MissingToken,
    /// The session could not be persisted.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AuthError {
    /// Message to show the user.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Credentials(e) => e.to_string(),
            Self::Api(e) => e
                .server_message()
                .map_or_else(|| fallback.to_string(), str::to_string),
            Self::MissingToken => fallback.to_string(),
            Self::Session(e) => e.to_string(),
        }
    }
}

/// Logs in and establishes the session.
///
/// # Errors
///
/// Returns [`AuthError::Credentials`] for a blank field, [`AuthError::Api`]
/// if the backend rejects the login, or [`AuthError::MissingToken`].
pub async fn login(
    api: &HttpApi,
    session: &SessionContext,
    email: &str,
    password: &str,
) -> Result<Landing, AuthError> {
    let request = LoginRequest::new(email, password)?;
    let response = api.login(&request).await?;
    establish(session, response)?.ok_or(AuthError::MissingToken)
}

/// Creates an account. If the backend answers with a token, the session is
/// established right away and the landing is returned.
///
/// # Errors
///
/// Returns [`AuthError::Credentials`] if the form is invalid, or
/// [`AuthError::Api`] if the backend rejects it.
pub async fn register(
    api: &HttpApi,
    session: &SessionContext,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Option<Landing>, AuthError> {
    let request = RegisterRequest::new(name, email, password)?;
    let response = api.register(&request).await?;
    establish(session, response)
}

/// Ends the session.
///
/// # Errors
///
/// Returns [`AuthError::Session`] if the session file could not be removed.
pub fn logout(session: &SessionContext) -> Result<&'static str, AuthError> {
    session.clear()?;
    Ok(LOGGED_OUT)
}

fn establish(
    session: &SessionContext,
    response: AuthResponse,
) -> Result<Option<Landing>, AuthError> {
    let Some(token) = response.token else {
        return Ok(None);
    };
    let landing = Landing::for_user(response.user.as_ref());
    session.establish(Session::new(token, response.user))?;
    tracing::info!(?landing, "logged in");
    Ok(Some(landing))
}
