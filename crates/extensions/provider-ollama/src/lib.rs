//! Ollama-style generation backend for AutoReply.

mod api;
mod provider;

pub use provider::OllamaBackend;
