//! Bounded dedup trackers.
//!
//! Item keys observed in the page are processed at most once per session.
//! The set is capped: over a long-lived tab only the most recently added
//! keys are retained. Forgotten keys are acceptable because the page never
//! re-renders messages that old into fresh mutation batches.

use std::collections::{HashSet, VecDeque};

/// Maximum number of item keys retained per tracker.
pub const PROCESSED_CAP: usize = 100;

/// Insertion-ordered set of already-handled item keys.
#[derive(Debug)]
pub struct ProcessedSet {
    order: VecDeque<String>,
    index: HashSet<String>,
    cap: usize,
}

impl Default for ProcessedSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::with_cap(PROCESSED_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            order: VecDeque::new(),
            index: HashSet::new(),
            cap,
        }
    }

    /// Whether this key still needs processing.
    pub fn should_process(&self, id: &str) -> bool {
        !self.index.contains(id)
    }

    /// Record a key as handled, evicting the oldest entries past the cap.
    pub fn mark_processed(&mut self, id: &str) {
        if !self.index.insert(id.to_string()) {
            return;
        }
        self.order.push_back(id.to_string());
        while self.order.len() > self.cap {
            if let Some(oldest) = self.order.pop_front() {
                self.index.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn reset(&mut self) {
        self.order.clear();
        self.index.clear();
    }
}

/// Tracker for the secondary activity feed.
///
/// On top of the bounded set this remembers the current top-of-feed key so
/// that re-renders of the same entry are told apart from genuinely new
/// entries.
#[derive(Debug, Default)]
pub struct FeedTracker {
    seen: ProcessedSet,
    top_key: Option<String>,
}

impl FeedTracker {
    pub fn new() -> Self {
        Self {
            seen: ProcessedSet::new(),
            top_key: None,
        }
    }

    /// Record the observed top-of-feed key.
    ///
    /// Returns `true` when the entry is genuinely new: different from the
    /// current top and not yet processed.
    pub fn observe_top(&mut self, key: &str) -> bool {
        if self.top_key.as_deref() == Some(key) {
            return false;
        }
        self.top_key = Some(key.to_string());
        self.seen.should_process(key)
    }

    pub fn current_top(&self) -> Option<&str> {
        self.top_key.as_deref()
    }

    pub fn should_process(&self, key: &str) -> bool {
        self.seen.should_process(key)
    }

    pub fn mark_processed(&mut self, key: &str) {
        self.seen.mark_processed(key);
    }

    pub fn reset(&mut self) {
        self.seen.reset();
        self.top_key = None;
    }
}

#[cfg(test)]
#[path = "dedup_tests.rs"]
mod tests;
