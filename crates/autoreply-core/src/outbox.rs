//! Durable single-slot reply outbox.
//!
//! Completing a reply sometimes requires navigating away from the list
//! view into a conversation view, and in-memory state does not survive
//! that navigation. The outbox is one slot in page-local storage: a new
//! write overwrites any unconsumed prior value, and a value is deleted
//! immediately upon consumption so a stale or duplicate navigation event
//! cannot double-send.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use autoreply_protocols::{AutomationError, KvStore, PendingReply};

/// Storage key of the handoff slot.
pub const OUTBOX_KEY: &str = "autoreply:pending-reply";

/// Single-slot durable outbox over page-local storage.
pub struct ReplyOutbox {
    store: Arc<dyn KvStore>,
}

impl ReplyOutbox {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Write a record, overwriting any unconsumed prior value.
    pub async fn put(&self, record: &PendingReply) -> Result<(), AutomationError> {
        let raw = serde_json::to_string(record)
            .map_err(|e| AutomationError::Storage(e.to_string()))?;
        self.store.set(OUTBOX_KEY, &raw).await?;
        debug!(sender = %record.sender_name, "pending reply recorded");
        Ok(())
    }

    /// Read and clear the slot.
    ///
    /// The slot is emptied before the record is inspected, so a record is
    /// consumed at most once no matter what happens afterwards. Records
    /// older than `max_age` are reported as [`AutomationError::StaleHandoff`];
    /// unparseable records are dropped with a warning.
    pub async fn take(
        &self,
        max_age: chrono::Duration,
    ) -> Result<Option<PendingReply>, AutomationError> {
        let Some(raw) = self.store.get(OUTBOX_KEY).await? else {
            return Ok(None);
        };
        self.store.remove(OUTBOX_KEY).await?;

        let record: PendingReply = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "discarding unparseable pending reply record");
                return Ok(None);
            }
        };

        let age = record.age(Utc::now());
        if age > max_age {
            return Err(AutomationError::StaleHandoff {
                age_seconds: age.num_seconds(),
            });
        }
        Ok(Some(record))
    }

    /// Drop any unconsumed record.
    pub async fn clear(&self) -> Result<(), AutomationError> {
        self.store.remove(OUTBOX_KEY).await
    }
}

#[cfg(test)]
#[path = "outbox_tests.rs"]
mod tests;
