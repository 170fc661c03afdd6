//! Control-surface message contract.
//!
//! The control surface (popup/settings collaborator, or the CLI's stdio
//! channel) speaks JSON objects tagged by an `action` field. Field names
//! stay camelCase on the wire for compatibility with the original
//! extension messages.

use serde::{Deserialize, Serialize};

/// A request from the control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ControlRequest {
    /// Enable or disable auto-reply; `autoSend` selects insert-and-send
    /// versus insert-only.
    #[serde(rename = "toggleAutoReply")]
    ToggleAutoReply {
        enabled: bool,
        #[serde(default, rename = "autoSend")]
        auto_send: bool,
    },

    /// One-shot reply generation, bypassing the watcher.
    #[serde(rename = "generateAutoReply")]
    GenerateAutoReply {
        #[serde(rename = "messageText")]
        message_text: String,
        #[serde(default, rename = "surroundingMessages")]
        surrounding_messages: String,
        #[serde(default, rename = "senderName")]
        sender_name: String,
    },

    /// Backend connectivity probe.
    #[serde(rename = "testConnection")]
    TestConnection,

    #[serde(rename = "exportCSV")]
    ExportCsv(ExportParams),

    #[serde(rename = "copyTSV")]
    CopyTsv(ExportParams),

    #[serde(rename = "exportCSVDetailed")]
    ExportCsvDetailed(ExportParams),

    #[serde(rename = "copyTSVDetailed")]
    CopyTsvDetailed(ExportParams),
}

/// Parameters shared by the export actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportParams {
    /// Maximum number of saved items to collect.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Backend credential for the enrichment calls, where applicable.
    #[serde(default, rename = "apiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Acknowledgement for `toggleAutoReply`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleAck {
    pub success: bool,
}

/// Response for `generateAutoReply`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedReply {
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for `testConnection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final response for an export action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub success: bool,
    pub count: usize,
    #[serde(default, rename = "tsvData", skip_serializing_if = "Option::is_none")]
    pub tsv_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Progress event emitted while an export runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
