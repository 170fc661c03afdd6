//! Bounded poll-until-condition primitive.
//!
//! The host page settles asynchronously: a clicked thread view renders a
//! composer some frames later, a send control flips to enabled after the
//! input event lands. Instead of fixed sleeps, callers poll a condition a
//! bounded number of times and give up cleanly.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// How often and how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_millis(200))
    }
}

/// Run `probe` until it yields a value or the policy is exhausted.
///
/// No sleep follows the final failed attempt.
pub async fn poll_until<T, F, Fut>(policy: &PollPolicy, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 0..policy.max_attempts {
        if let Some(value) = probe().await {
            return Some(value);
        }
        if attempt + 1 < policy.max_attempts {
            sleep(policy.interval).await;
        }
    }
    None
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
