//! Error body returned by the backend on non-success responses.

use serde::{Deserialize, Serialize};

/// `{"message": "..."}` as sent by the server alongside a 4xx/5xx status.
///
/// The message is optional: some failures come back with an empty or
/// non-JSON body, in which case the client falls back to its own text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason supplied by the server.
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Parses a raw response body, tolerating empty or non-JSON input.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Returns the server message if it is present and non-blank.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}
