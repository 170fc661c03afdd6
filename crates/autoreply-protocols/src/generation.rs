//! Generation-backend contract and completion cleanup.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::GenerationError;

/// Input to a single reply generation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The message being replied to. Must be non-empty.
    pub message_text: String,
    /// Rendered surrounding conversation; may be empty.
    pub context_text: String,
    /// Sender display name; may be empty.
    pub sender_name: String,
}

impl GenerationRequest {
    pub fn new(message_text: impl Into<String>) -> Self {
        Self {
            message_text: message_text.into(),
            context_text: String::new(),
            sender_name: String::new(),
        }
    }

    pub fn with_context(mut self, context_text: impl Into<String>) -> Self {
        self.context_text = context_text.into();
        self
    }

    pub fn with_sender(mut self, sender_name: impl Into<String>) -> Self {
        self.sender_name = sender_name.into();
        self
    }
}

/// Result of a connectivity probe.
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    /// Model names reported by the backend.
    pub available_models: Vec<String>,
}

/// A text-generation backend.
///
/// Implementations submit a single non-streaming completion request with a
/// bounded output length and return cleaned text. All failures are typed
/// and recoverable; callers log and abort the one attempt.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Stable backend identifier (`"ollama"`, `"openai"`).
    fn id(&self) -> &str;

    /// The model this backend submits to.
    fn model(&self) -> &str;

    /// Submit a raw prompt and return the cleaned completion.
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Generate a reply for the given request through the fixed reply
    /// instruction template.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// Probe the backend and report available models.
    ///
    /// Not on the reply path; used by the control surface to display
    /// readiness.
    async fn test_connection(&self) -> Result<ConnectionStatus, GenerationError>;
}

static REASONING_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());

const REASONING_CLOSE: &str = "</think>";

/// Strip reasoning segments from a raw completion and trim whitespace.
///
/// Handles both well-formed paired markers and a dangling closing marker
/// with no opener (some models emit only the tail of the pair).
pub fn clean_completion(raw: &str) -> String {
    let stripped = REASONING_SEGMENT.replace_all(raw, "");
    let rest = match stripped.rfind(REASONING_CLOSE) {
        Some(idx) => &stripped[idx + REASONING_CLOSE.len()..],
        None => stripped.as_ref(),
    };
    rest.trim().to_string()
}

#[cfg(test)]
#[path = "generation_tests.rs"]
mod tests;
