//! The page-driver seam.
//!
//! Everything the orchestration logic does to a page goes through this
//! trait: snapshotting the tree, subscribing to mutation batches, and the
//! small set of input gestures a reply needs. Production implements it
//! over a real browser tab; tests implement it in memory.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use autoreply_protocols::{AutomationError, KvStore};

use crate::node::{NodeKey, PageTree};

/// One batch of added nodes, as delivered by the page's mutation
/// notifications. Batch order follows notification arrival order, which
/// is not guaranteed to match message chronology.
#[derive(Debug, Clone)]
pub struct MutationBatch {
    pub added: Vec<NodeKey>,
}

/// A live page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Snapshot of the current page tree.
    async fn snapshot(&self) -> Result<PageTree, AutomationError>;

    /// Subscribe to subtree mutations under `root`.
    ///
    /// The subscription lives until the receiver is dropped; re-enabling
    /// the watcher creates a fresh one.
    async fn subscribe(
        &self,
        root: NodeKey,
    ) -> Result<mpsc::UnboundedReceiver<MutationBatch>, AutomationError>;

    async fn click(&self, node: NodeKey) -> Result<(), AutomationError>;

    async fn focus(&self, node: NodeKey) -> Result<(), AutomationError>;

    async fn clear_text(&self, node: NodeKey) -> Result<(), AutomationError>;

    async fn insert_text(&self, node: NodeKey, text: &str) -> Result<(), AutomationError>;

    /// Emit the input-changed notification the host page expects after a
    /// programmatic insert.
    async fn emit_input(&self, node: NodeKey) -> Result<(), AutomationError>;

    /// Synthesize the platform's submit key event on the node.
    async fn press_submit(&self, node: NodeKey) -> Result<(), AutomationError>;

    /// Trigger an in-app navigation.
    async fn navigate(&self, target: &str) -> Result<(), AutomationError>;

    /// Page-local persistent storage.
    fn storage(&self) -> Arc<dyn KvStore>;
}
