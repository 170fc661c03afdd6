//! Session state for the AutoReply watcher.
//!
//! Everything in this crate is owned by a single watcher task: the feature
//! flags, the bounded dedup trackers, and the durable pending-reply
//! outbox. A [`Session`] is created when auto-reply is enabled and dropped
//! when it is disabled; nothing here is ambient module state.

pub mod dedup;
pub mod outbox;
pub mod prompt;
pub mod session;

pub use dedup::{FeedTracker, ProcessedSet, PROCESSED_CAP};
pub use outbox::{ReplyOutbox, OUTBOX_KEY};
pub use prompt::{enrichment_prompt, parse_action_summary, reply_prompt, ActionSummary};
pub use session::Session;
