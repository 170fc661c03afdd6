//! Mutation watcher and reply orchestration.
//!
//! The watcher is a two-state machine (`Stopped → Watching`) driving a
//! single sequential task: mutation batches in, at most one reply attempt
//! out per newly observed mention. Every failure is local to one attempt;
//! nothing here may stop the watcher itself.

pub mod config;
pub mod poll;
pub mod reply;
mod task;
pub mod watcher;

pub use config::WatchOptions;
pub use poll::{poll_until, PollPolicy};
pub use reply::{DispatchOutcome, ReplyWriter};
pub use watcher::Watcher;
