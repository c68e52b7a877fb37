//! Authentication session shared by every part of the client.
//!
//! A [`SessionContext`] is an explicit, cloneable handle passed to whoever
//! needs the bearer token or the current user. State lives in a
//! [`tokio::sync::watch`] channel so long-running views can react to login,
//! logout and expiry. When a file path is configured, the session is also
//! persisted as JSON so it survives between invocations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use taskdesk_proto::user::User;
use tokio::sync::watch;

use crate::api::ApiError;

/// Errors raised while persisting or loading a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading or writing the session file failed.
    #[error("session file {path}: {source}")]
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The session file is not valid JSON.
    #[error("corrupt session file: {0}")]
    Json(#[from] serde_json::Error),

    /// Could not determine the user's data directory.
    #[error("could not determine data directory for the session file")]
    NoDataDir,
}

/// A logged-in session: the bearer token and the account it belongs to.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    /// Opaque bearer token.
    pub token: String,
    /// Account returned at login, if the server sent one.
    #[serde(default)]
    pub user: Option<User>,
}

impl Session {
    /// Creates a session.
    pub fn new(token: impl Into<String>, user: Option<User>) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug)]
struct Inner {
    state: watch::Sender<Option<Session>>,
    file: Option<PathBuf>,
}

/// Shared handle to the current session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl SessionContext {
    fn with_state(session: Option<Session>, file: Option<PathBuf>) -> Self {
        let (state, _) = watch::channel(session);
        Self {
            inner: Arc::new(Inner { state, file }),
        }
    }

    /// A context that is never written to disk, starting logged out.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_state(None, None)
    }

    /// A context that is never written to disk, starting with `session`.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self::with_state(Some(session), None)
    }

    /// Opens the session persisted at `path`.
    ///
    /// A missing file means "logged out" and is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the file exists but cannot be read,
    /// or [`SessionError::Json`] if it is corrupt.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let session = match std::fs::read_to_string(&path) {
            Ok(raw) => Some(serde_json::from_str::<Session>(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => return Err(SessionError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), logged_in = session.is_some(), "session loaded");
        Ok(Self::with_state(session, Some(path)))
    }

    /// Default session file location (`<data dir>/taskdesk/session.json`).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoDataDir`] if no data directory is known.
    pub fn default_path() -> Result<PathBuf, SessionError> {
        dirs::data_local_dir()
            .map(|d| d.join("taskdesk").join("session.json"))
            .ok_or(SessionError::NoDataDir)
    }

    /// Records a fresh login and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the file could not be written. The
    /// in-memory session is established regardless.
    pub fn establish(&self, session: Session) -> Result<(), SessionError> {
        let persisted = self.inner.file.as_deref().map(|path| write_file(path, &session));
        self.inner.state.send_replace(Some(session));
        tracing::info!("session established");
        persisted.transpose().map(|_| ())
    }

    /// Ends the session at the user's request (logout).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the session file could not be
    /// removed. The in-memory session is cleared regardless.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.inner.state.send_replace(None);
        tracing::info!("session cleared");
        self.remove_file()
    }

    /// Ends the session because the backend rejected it.
    ///
    /// Never fails: a leftover file only costs one more rejected request.
    pub fn expire(&self) {
        let had_session = self.inner.state.send_replace(None).is_some();
        if had_session {
            tracing::warn!("session expired");
        }
        if let Err(e) = self.remove_file() {
            tracing::warn!(error = %e, "could not remove expired session file");
        }
    }

    /// Returns the current session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner.state.borrow().clone()
    }

    /// Returns `true` while a session is established.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.state.borrow().is_some()
    }

    /// Bearer token of the current session.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().as_ref().map(|s| s.token.clone())
    }

    /// Token for the `Authorization: Bearer` header.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NoSession`] when logged out.
    pub fn bearer(&self) -> Result<String, ApiError> {
        self.token().ok_or(ApiError::NoSession)
    }

    /// Account of the current session.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner
            .state
            .borrow()
            .as_ref()
            .and_then(|s| s.user.clone())
    }

    /// Subscribes to session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.state.subscribe()
    }

    /// Path the session is persisted at, if any.
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        self.inner.file.as_deref()
    }

    fn remove_file(&self) -> Result<(), SessionError> {
        let Some(path) = self.inner.file.as_deref() else {
            return Ok(());
        };
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

fn write_file(path: &Path, session: &Session) -> Result<(), SessionError> {
    let io_err = |source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_vec_pretty(session)?;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(io_err)?;
    std::io::Write::write_all(&mut file, &json).map_err(io_err)
}
