//! Configuration validation.

use crate::schema::{BackendKind, Config};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        if config.backend.base_url.trim().is_empty() {
            result.add("backend.base_url", "must not be empty");
        }
        if config.backend.model.trim().is_empty() {
            result.add("backend.model", "must not be empty");
        }
        if !(0.0..=2.0).contains(&config.backend.temperature) {
            result.add("backend.temperature", "must be between 0.0 and 2.0");
        }
        if config.backend.max_output_tokens == 0 {
            result.add("backend.max_output_tokens", "must be positive");
        }
        if config.backend.kind == BackendKind::OpenAi {
            match config.backend.api_key.as_deref() {
                None | Some("") => result.add("backend.api_key", "required for the openai backend"),
                Some(key) if !key.starts_with("sk-") => {
                    result.add("backend.api_key", "must start with sk-");
                }
                _ => {}
            }
        }

        if !(1..=10).contains(&config.reply.context_window) {
            result.add("reply.context_window", "must be between 1 and 10");
        }

        if config.watcher.settle_delay_ms > 10_000 {
            result.add("watcher.settle_delay_ms", "must be at most 10000");
        }
        if let Some(interval) = config.watcher.feed_poll_interval_ms {
            if interval < 1000 {
                result.add("watcher.feed_poll_interval_ms", "must be at least 1000");
            }
        }

        result
    }
}
