//! Error taxonomy shared across the workspace.
//!
//! Every variant here is recoverable at the scope of a single
//! message-processing attempt; none of them may stop the watcher.

use thiserror::Error;

/// Failures from a text-generation backend.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The backend could not be reached at all.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend is reachable but the expected model is not installed.
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// The backend answered with a non-success status.
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },

    /// The response parsed but carried no usable text.
    #[error("Empty response from backend")]
    EmptyResponse,
}

/// Failures in the page-automation layer.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// A required page element (composer, send control, thread control)
    /// could not be located.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The current-user identity could not be resolved; mention matching
    /// stays disabled for the rest of the session.
    #[error("Current user identity unresolved")]
    IdentityUnresolved,

    /// A pending reply record outlived its freshness window and was
    /// discarded.
    #[error("Stale pending reply discarded after {age_seconds}s")]
    StaleHandoff { age_seconds: i64 },

    /// The page driver failed to execute an operation.
    #[error("Page driver error: {0}")]
    Driver(String),

    /// Page-local storage access failed.
    #[error("Page storage error: {0}")]
    Storage(String),
}
