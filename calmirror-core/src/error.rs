//! Error types for calmirror.

use thiserror::Error;

/// Errors that can occur while planning or applying a sync run.
#[derive(Error, Debug)]
pub enum CalMirrorError {
    /// The event carries neither a timed instant nor an all-day date.
    #[error("Invalid event '{id}': {reason}")]
    InvalidEvent { id: String, reason: String },

    #[error("Calendar API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CalMirrorError {
    pub fn invalid_event(id: &str, reason: &str) -> Self {
        CalMirrorError::InvalidEvent {
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for calmirror operations.
pub type CalMirrorResult<T> = Result<T, CalMirrorError>;
