//! CDP driver errors.

use thiserror::Error;

use autoreply_protocols::AutomationError;

#[derive(Debug, Error)]
pub enum CdpError {
    /// The debugging endpoint did not answer.
    #[error("Chrome not available at {0}")]
    ChromeNotAvailable(String),

    /// No open tab matched the configured page URL fragment.
    #[error("No page matching \"{0}\" found")]
    PageNotFound(String),

    /// WebSocket connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The protocol returned an error response.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// In-page JavaScript raised.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// The session's WebSocket is gone.
    #[error("Session closed")]
    SessionClosed,
}

impl From<CdpError> for AutomationError {
    fn from(e: CdpError) -> Self {
        AutomationError::Driver(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_automation_error() {
        let err: AutomationError = CdpError::SessionClosed.into();
        assert!(matches!(err, AutomationError::Driver(_)));
        assert!(err.to_string().contains("Session closed"));
    }
}
