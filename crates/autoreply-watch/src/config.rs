//! Watcher tuning knobs.

use std::time::Duration;

use crate::poll::PollPolicy;

/// Runtime options for one watcher.
///
/// The delays accommodate the host page's own asynchronous updates; they
/// are empirically necessary, not correctness-critical. Tests shrink them
/// to near zero.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Wait after a mutation batch before scanning it, letting the page
    /// finish rendering the batch.
    pub settle_delay: Duration,
    /// Wait between the injection steps (focus, clear, insert, send).
    pub step_delay: Duration,
    /// Messages gathered before a target as context.
    pub context_before: usize,
    /// Trailing messages additionally gathered in feed-triggered flows.
    pub feed_context_after: usize,
    /// Retry interval while waiting for the activity container to exist.
    pub feed_attach_retry: Duration,
    /// Optional periodic feed scan when event delivery is unreliable.
    pub feed_poll_interval: Option<Duration>,
    /// Freshness window for the cross-navigation handoff record.
    pub handoff_max_age: Duration,
    /// Polling for the send control to report an enabled state.
    pub send_poll: PollPolicy,
    /// Polling for the thread composer to appear after opening a thread.
    pub thread_poll: PollPolicy,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            step_delay: Duration::from_millis(100),
            context_before: 3,
            feed_context_after: 2,
            feed_attach_retry: Duration::from_secs(2),
            feed_poll_interval: None,
            handoff_max_age: Duration::from_secs(300),
            send_poll: PollPolicy::new(5, Duration::from_millis(200)),
            thread_poll: PollPolicy::new(10, Duration::from_millis(300)),
        }
    }
}
