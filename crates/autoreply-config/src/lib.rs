//! Persisted settings for AutoReply.
//!
//! Settings are owned by the control surface and read by the core at
//! startup: which backend to call, whether auto-reply/auto-send start
//! enabled, and the watcher tuning knobs.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{BackendConfig, BackendKind, Config, ReplyConfig, WatcherConfig};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
