//! User-facing notices (success and error toasts).
//!
//! Notices travel over a bounded channel. A slow or absent consumer never
//! blocks a mutation: when the channel is full the notice is logged and
//! dropped.

use tokio::sync::mpsc;

use crate::api::ErrorCategory;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// An operation succeeded.
    Success,
    /// Informational message.
    Info,
    /// An operation failed.
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: Level,
    /// Failure category for errors.
    pub category: Option<ErrorCategory>,
    /// Text to display.
    pub text: String,
}

impl Notice {
    /// A success notice.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            category: None,
            text: text.into(),
        }
    }

    /// An informational notice.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            category: None,
            text: text.into(),
        }
    }

    /// An error notice.
    pub fn error(category: ErrorCategory, text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            category: Some(category),
            text: text.into(),
        }
    }
}

/// Sending half of the notice channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Option<mpsc::Sender<Notice>>,
}

impl Notifier {
    /// Creates a notifier and the receiver its notices arrive on.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notice>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// A notifier that only logs.
    #[must_use]
    pub const fn silent() -> Self {
        Self { tx: None }
    }

    /// Publishes a notice.
    pub fn push(&self, notice: Notice) {
        match notice.level {
            Level::Error => tracing::info!(
                category = notice.category.map(ErrorCategory::label),
                text = %notice.text,
                "error notice"
            ),
            Level::Success | Level::Info => tracing::debug!(text = %notice.text, "notice"),
        }
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(notice) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                tracing::warn!(text = %dropped.text, "notice channel full, dropping notice");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("notice receiver gone");
            }
        }
    }

    /// Publishes a success notice.
    pub fn success(&self, text: impl Into<String>) {
        self.push(Notice::success(text));
    }

    /// Publishes an error notice.
    pub fn error(&self, category: ErrorCategory, text: impl Into<String>) {
        self.push(Notice::error(category, text));
    }
}
