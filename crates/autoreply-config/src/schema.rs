//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub reply: ReplyConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,
}

/// Which generation backend to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local Ollama-style backend.
    Ollama,
    /// Hosted chat-completions-style backend.
    OpenAi,
}

/// Generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_kind")]
    pub kind: BackendKind,

    /// Base URL of the backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Credential for hosted backends; unused for local ones.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output length bound, in tokens.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn default_backend_kind() -> BackendKind {
    BackendKind::Ollama
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen3:8b".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    150
}

/// Reply behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    #[serde(default)]
    pub auto_reply_enabled: bool,

    /// Insert-and-send versus insert-only. Off by default.
    #[serde(default)]
    pub auto_send_enabled: bool,

    /// Debug mode: any mention matches regardless of user id.
    #[serde(default)]
    pub test_mode: bool,

    /// Number of preceding messages gathered as context.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            auto_reply_enabled: false,
            auto_send_enabled: false,
            test_mode: false,
            context_window: default_context_window(),
        }
    }
}

fn default_context_window() -> usize {
    3
}

/// Watcher tuning knobs, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Grace delay before attaching after page load.
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,

    /// Settling delay after a mutation batch before scanning it.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Retry interval while waiting for the activity container to exist.
    #[serde(default = "default_feed_attach_retry_ms")]
    pub feed_attach_retry_ms: u64,

    /// Optional periodic feed scan when event delivery is unreliable.
    /// Disabled when absent.
    #[serde(default)]
    pub feed_poll_interval_ms: Option<u64>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: default_startup_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            feed_attach_retry_ms: default_feed_attach_retry_ms(),
            feed_poll_interval_ms: None,
        }
    }
}

fn default_startup_delay_ms() -> u64 {
    3000
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_feed_attach_retry_ms() -> u64 {
    2000
}
