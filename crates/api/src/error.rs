use sacco_util::KeystoreError;
use thiserror::Error;

/// Failure talking to the portal backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Network error: {0}. Hint: check connection/proxy and the configured base URL")]
    Network(String),

    /// A 401 on an authenticated endpoint; the stored token has already been cleared.
    #[error("Session expired (401). Hint: run `sacco login` to sign in again")]
    SessionExpired,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error(transparent)]
    Keystore(#[from] KeystoreError),
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}
