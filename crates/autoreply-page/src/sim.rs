//! In-memory page driver for tests.
//!
//! `SimPage` holds a [`PageTree`] behind a lock, records every gesture the
//! watcher performs, and broadcasts mutation batches to subscribers the
//! way a real page's mutation observer would: scoped to the subscribed
//! subtree. Click actions let a test script the page's reaction to a
//! click (a thread view appearing, a navigation re-render).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use autoreply_protocols::{AutomationError, KvStore, MemoryKvStore};

use crate::driver::{MutationBatch, PageDriver};
use crate::node::{NodeKey, NodeSpec, PageTree};

/// A gesture recorded by the sim page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    Click(NodeKey),
    Focus(NodeKey),
    ClearText(NodeKey),
    InsertText(NodeKey, String),
    EmitInput(NodeKey),
    PressSubmit(NodeKey),
    Navigate(String),
}

type ClickAction = Box<dyn FnMut(&mut PageTree) -> Vec<NodeKey> + Send>;

#[derive(Default)]
struct SimState {
    subscribers: Vec<(NodeKey, mpsc::UnboundedSender<MutationBatch>)>,
    events: Vec<SimEvent>,
    click_actions: HashMap<NodeKey, ClickAction>,
}

/// Simulated page.
pub struct SimPage {
    tree: Mutex<PageTree>,
    state: Mutex<SimState>,
    storage: Arc<MemoryKvStore>,
}

impl SimPage {
    pub fn new(tree: PageTree) -> Self {
        Self {
            tree: Mutex::new(tree),
            state: Mutex::new(SimState::default()),
            storage: Arc::new(MemoryKvStore::new()),
        }
    }

    /// Mutate the tree and broadcast the added nodes to matching
    /// subscribers.
    pub fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut PageTree) -> Vec<NodeKey>,
    {
        let added = {
            let mut tree = self.tree.lock();
            f(&mut tree)
        };
        self.broadcast(&added);
    }

    /// Append a subtree under `parent` and notify subscribers.
    pub fn append(&self, parent: NodeKey, spec: NodeSpec) -> NodeKey {
        let key = {
            let mut tree = self.tree.lock();
            tree.attach(parent, spec)
        };
        self.broadcast(&[key]);
        key
    }

    /// Replace the whole tree (a navigation re-render). Subscribers are
    /// not notified; the page starts a fresh mutation cycle afterwards.
    pub fn replace_tree(&self, tree: PageTree) {
        *self.tree.lock() = tree;
    }

    /// Script what happens in the page when `node` is clicked.
    pub fn on_click<F>(&self, node: NodeKey, action: F)
    where
        F: FnMut(&mut PageTree) -> Vec<NodeKey> + Send + 'static,
    {
        self.state.lock().click_actions.insert(node, Box::new(action));
    }

    /// Gestures recorded so far, in order.
    pub fn events(&self) -> Vec<SimEvent> {
        self.state.lock().events.clone()
    }

    /// Current tree contents, for assertions.
    pub fn tree(&self) -> PageTree {
        self.tree.lock().clone()
    }

    /// Convenience: the own text of a node (e.g. the composer).
    pub fn node_text(&self, node: NodeKey) -> String {
        self.tree
            .lock()
            .get(node)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    pub fn storage_handle(&self) -> Arc<MemoryKvStore> {
        self.storage.clone()
    }

    fn record(&self, event: SimEvent) {
        self.state.lock().events.push(event);
    }

    fn broadcast(&self, added: &[NodeKey]) {
        let tree = self.tree.lock();
        let mut state = self.state.lock();
        state.subscribers.retain(|(root, tx)| {
            let scoped: Vec<NodeKey> = added
                .iter()
                .copied()
                .filter(|k| tree.is_within(*k, *root))
                .collect();
            if scoped.is_empty() {
                return !tx.is_closed();
            }
            tx.send(MutationBatch { added: scoped }).is_ok()
        });
    }
}

#[async_trait]
impl PageDriver for SimPage {
    async fn snapshot(&self) -> Result<PageTree, AutomationError> {
        Ok(self.tree.lock().clone())
    }

    async fn subscribe(
        &self,
        root: NodeKey,
    ) -> Result<mpsc::UnboundedReceiver<MutationBatch>, AutomationError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().subscribers.push((root, tx));
        Ok(rx)
    }

    async fn click(&self, node: NodeKey) -> Result<(), AutomationError> {
        self.record(SimEvent::Click(node));
        let action = self.state.lock().click_actions.remove(&node);
        if let Some(mut action) = action {
            let added = {
                let mut tree = self.tree.lock();
                action(&mut tree)
            };
            self.broadcast(&added);
        }
        Ok(())
    }

    async fn focus(&self, node: NodeKey) -> Result<(), AutomationError> {
        self.record(SimEvent::Focus(node));
        Ok(())
    }

    async fn clear_text(&self, node: NodeKey) -> Result<(), AutomationError> {
        self.record(SimEvent::ClearText(node));
        self.tree.lock().set_text(node, "");
        Ok(())
    }

    async fn insert_text(&self, node: NodeKey, text: &str) -> Result<(), AutomationError> {
        self.record(SimEvent::InsertText(node, text.to_string()));
        self.tree.lock().set_text(node, text);
        Ok(())
    }

    async fn emit_input(&self, node: NodeKey) -> Result<(), AutomationError> {
        self.record(SimEvent::EmitInput(node));
        Ok(())
    }

    async fn press_submit(&self, node: NodeKey) -> Result<(), AutomationError> {
        self.record(SimEvent::PressSubmit(node));
        Ok(())
    }

    async fn navigate(&self, target: &str) -> Result<(), AutomationError> {
        self.record(SimEvent::Navigate(target.to_string()));
        Ok(())
    }

    fn storage(&self) -> Arc<dyn KvStore> {
        self.storage.clone()
    }
}

#[cfg(test)]
#[path = "sim_tests.rs"]
mod tests;
