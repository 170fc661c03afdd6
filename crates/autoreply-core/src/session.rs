//! Watcher session state.

use crate::dedup::{FeedTracker, ProcessedSet};

/// State owned by one enabled watcher.
///
/// Created when auto-reply is enabled, dropped when it is disabled; the
/// flags are mutated only by explicit control messages relayed from the
/// control surface.
#[derive(Debug)]
pub struct Session {
    /// Insert-and-send versus insert-only. Off by default.
    pub auto_send: bool,
    /// Debug/test mode: any mention matches, regardless of user id.
    pub test_mode: bool,
    /// Resolved current-user identifier, if resolution succeeded.
    pub user_id: Option<String>,
    /// Dedup tracker for the main timeline.
    pub timeline: ProcessedSet,
    /// Dedup tracker for the activity feed.
    pub feed: FeedTracker,
}

impl Session {
    pub fn new(auto_send: bool, test_mode: bool) -> Self {
        Self {
            auto_send,
            test_mode,
            user_id: None,
            timeline: ProcessedSet::new(),
            feed: FeedTracker::new(),
        }
    }

    /// Whether mention matching can run at all.
    ///
    /// Without a resolved identity only test mode keeps matching alive;
    /// otherwise the session takes no action rather than a wrong one.
    pub fn mention_matching_enabled(&self) -> bool {
        self.user_id.is_some() || self.test_mode
    }
}
