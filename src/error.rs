//! Error types for the Tap the Goose client.

use thiserror::Error;

/// Errors that can occur when using the Tap the Goose client.
#[derive(Debug, Error)]
pub enum GooseError {
    /// The request could not be delivered or its response could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// A request did not complete within the configured timeout.
    #[error("operation timed out")]
    Timeout,

    /// Failed to serialize a request body or deserialize a response body.
    ///
    /// Malformed timestamps in round payloads surface here as well.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Login was rejected. The message is suitable for display on the login form.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Human-readable reason, taken from the server when available.
        message: String,
    },

    /// The bearer token is missing, invalid or expired (HTTP 401).
    #[error("session is no longer valid")]
    Unauthorized,

    /// The current user is not allowed to perform the operation (HTTP 403).
    #[error("operation not permitted for the current user")]
    Forbidden,

    /// The requested resource does not exist (HTTP 404).
    #[error("resource not found")]
    NotFound,

    /// The server answered with an unexpected non-success status.
    #[error("server returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the raw body when it is not JSON.
        message: String,
    },

    /// A tap was attempted outside the round's active window.
    #[error("round is not active")]
    RoundNotActive,

    /// A tap was attempted while a previous tap is still awaiting its response.
    #[error("a tap is already in flight")]
    TapInFlight,

    /// An operation that requires a logged-in user was attempted without one.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A listing page was requested whose cursor has not been discovered yet.
    #[error("page {page} has not been reached yet")]
    UnknownPage {
        /// Zero-based page index.
        page: usize,
    },

    /// The round watcher has already stopped.
    #[error("round watcher has stopped")]
    WatcherStopped,

    /// Reading or writing persisted session data failed.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl GooseError {
    /// Returns `true` when the error means the stored session must be discarded.
    pub fn is_session_invalid(&self) -> bool {
        matches!(self, GooseError::Unauthorized)
    }
}

/// A specialized [`Result`] type for Tap the Goose client operations.
pub type Result<T> = std::result::Result<T, GooseError>;
