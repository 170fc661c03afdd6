//! Chat-completions backend implementation.

use async_trait::async_trait;
use tracing::{debug, warn};

use autoreply_core::prompt::reply_prompt;
use autoreply_protocols::{
    clean_completion, ConnectionStatus, GenerationBackend, GenerationError, GenerationRequest,
};

use crate::api::{ChatMessage, ChatRequest, ChatResponse, ModelsResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Hosted chat-completions-style backend.
pub struct OpenAiBackend {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a backend against a compatible API at a custom base URL.
    pub fn with_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 150,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_options(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn build_request(&self, prompt: String) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    fn id(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_request = self.build_request(prompt.to_string());
        debug!(model = %self.model, "calling generation backend");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&api_request)
            .send()
            .await
            .map_err(|e| GenerationError::BackendUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let data: ChatResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "chat response did not parse");
            GenerationError::EmptyResponse
        })?;

        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let cleaned = clean_completion(&content);
        if cleaned.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(cleaned)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.complete(&reply_prompt(request)).await
    }

    async fn test_connection(&self) -> Result<ConnectionStatus, GenerationError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| GenerationError::BackendUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let models: ModelsResponse = response
            .json()
            .await
            .map_err(|_| GenerationError::EmptyResponse)?;
        let available_models: Vec<String> = models.data.into_iter().map(|m| m.id).collect();

        if !available_models.iter().any(|id| id == &self.model) {
            return Err(GenerationError::ModelNotAvailable(self.model.clone()));
        }

        Ok(ConnectionStatus { available_models })
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
