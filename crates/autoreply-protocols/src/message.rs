//! Observed-message data model.
//!
//! All of these are ephemeral: they are reconstructed from the page DOM on
//! every scan and never persisted, with the exception of [`PendingReply`],
//! which survives a navigation through page-local storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which list a message was observed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSource {
    /// The main per-channel message timeline.
    Timeline,
    /// The secondary activity/notifications feed.
    ActivityFeed,
}

/// A message reconstructed from the page DOM.
#[derive(Debug, Clone)]
pub struct ObservedMessage {
    /// Opaque page-assigned item key.
    pub item_key: String,
    /// Sender display name.
    pub sender: String,
    /// Message body text.
    pub body: String,
    /// Whether the message carries a mention addressed to the current user.
    pub addressed_to_me: bool,
    /// The list the message was found in.
    pub source: MessageSource,
}

/// Separator between context entries in the rendered context block.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

/// One `(sender, body)` pair in a context window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub sender: String,
    pub body: String,
}

/// An ordered window of messages surrounding a target message.
#[derive(Debug, Clone, Default)]
pub struct ContextWindow {
    entries: Vec<ContextEntry>,
}

impl ContextWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sender: impl Into<String>, body: impl Into<String>) {
        self.entries.push(ContextEntry {
            sender: sender.into(),
            body: body.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    /// Render the window as a single text block in document order.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.sender, e.body))
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }
}

/// Cross-navigation handoff record.
///
/// Written to page-local storage immediately before a navigation is
/// triggered and consumed exactly once after the navigation completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingReply {
    /// The message text to reply to.
    pub message_text: String,
    /// Display name of the sender being replied to.
    pub sender_name: String,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
    /// Whether to navigate back to the activity feed after sending.
    pub return_to_feed: bool,
}

impl PendingReply {
    pub fn new(message_text: impl Into<String>, sender_name: impl Into<String>) -> Self {
        Self {
            message_text: message_text.into(),
            sender_name: sender_name.into(),
            created_at: Utc::now(),
            return_to_feed: false,
        }
    }

    pub fn with_return_to_feed(mut self, value: bool) -> Self {
        self.return_to_feed = value;
        self
    }

    /// Age of the record relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}
