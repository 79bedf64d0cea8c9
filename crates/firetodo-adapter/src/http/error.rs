/*
[INPUT]:  Error sources (HTTP, REST error bodies, serialization, auth, local IO)
[OUTPUT]: Structured error types shared by the auth and document store adapters
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Firebase adapters
#[derive(Error, Debug)]
pub enum FirebaseError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// REST API returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Authentication service rejected the request.
    ///
    /// `code` is the SDK-style code, e.g. `auth/wrong-password`.
    #[error("Authentication failed ({code}): {message}")]
    Auth { code: String, message: String },

    /// Operation needs a signed-in user
    #[error("No user is signed in")]
    NotAuthenticated,

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Request rejected locally before it was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local persistence failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FirebaseError {
    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            FirebaseError::Auth { .. } | FirebaseError::NotAuthenticated
        )
    }

    /// SDK-style auth code, if this is an auth failure
    pub fn auth_code(&self) -> Option<&str> {
        match self {
            FirebaseError::Auth { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        FirebaseError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }

    /// Create an auth error from an SDK-style code
    pub fn auth(code: impl Into<String>, message: impl Into<String>) -> Self {
        FirebaseError::Auth {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, FirebaseError>;
