//! Ollama backend implementation.

use async_trait::async_trait;
use tracing::{debug, warn};

use autoreply_core::prompt::reply_prompt;
use autoreply_protocols::{
    clean_completion, ConnectionStatus, GenerationBackend, GenerationError, GenerationRequest,
};

use crate::api::{GenerateOptions, GenerateRequest, GenerateResponse, TagsResponse};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "qwen3:8b";

/// Local Ollama-style generation backend.
pub struct OllamaBackend {
    base_url: String,
    model: String,
    temperature: f32,
    num_predict: u32,
    client: reqwest::Client,
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_MODEL)
    }
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.7,
            num_predict: 150,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_options(mut self, temperature: f32, num_predict: u32) -> Self {
        self.temperature = temperature;
        self.num_predict = num_predict;
        self
    }

    fn build_request(&self, prompt: String) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.num_predict,
            },
        }
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    fn id(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_request = self.build_request(prompt.to_string());
        debug!(model = %self.model, "calling generation backend");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
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

        let data: GenerateResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "generation response did not parse");
            GenerationError::EmptyResponse
        })?;

        let cleaned = clean_completion(&data.response);
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
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|_| {
                GenerationError::BackendUnavailable(format!(
                    "cannot connect to {}; is ollama running?",
                    self.base_url
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|_| GenerationError::EmptyResponse)?;
        let available_models: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();

        // Matching on the name base tolerates tag differences
        // ("qwen3:8b" is satisfied by "qwen3:latest").
        let base = self.model.split(':').next().unwrap_or(&self.model);
        if !available_models.iter().any(|name| name.contains(base)) {
            return Err(GenerationError::ModelNotAvailable(format!(
                "{} not installed; run: ollama pull {}",
                self.model, self.model
            )));
        }

        Ok(ConnectionStatus { available_models })
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
