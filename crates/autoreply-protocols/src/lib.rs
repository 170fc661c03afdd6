//! Shared protocol types for AutoReply.
//!
//! Everything the crates agree on lives here: the observed-message data
//! model, the error taxonomy, the generation-backend contract, the
//! page-storage contract, and the control-surface message format.

pub mod control;
pub mod error;
pub mod generation;
pub mod message;
pub mod storage;

pub use control::{
    ConnectionReport, ControlRequest, ExportOutcome, ExportParams, ExportProgress, GeneratedReply,
    ToggleAck,
};
pub use error::{AutomationError, GenerationError};
pub use generation::{clean_completion, ConnectionStatus, GenerationBackend, GenerationRequest};
pub use message::{ContextEntry, ContextWindow, MessageSource, ObservedMessage, PendingReply};
pub use storage::{KvStore, MemoryKvStore};
