//! Message, mention, and context extraction.

use tracing::debug;

use autoreply_protocols::{ContextWindow, MessageSource, ObservedMessage};

use crate::node::{NodeKey, PageTree};
use crate::selectors::SelectorSet;

/// Sender name used when the markup carries none.
const UNKNOWN_SENDER: &str = "Unknown";

/// DOM extraction over a selector set.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    selectors: SelectorSet,
}

impl Extractor {
    pub fn new(selectors: SelectorSet) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &SelectorSet {
        &self.selectors
    }

    /// Resolve the primary message container, falling back to the tree
    /// root when no candidate matches.
    pub fn message_container(&self, tree: &PageTree) -> NodeKey {
        self.selectors
            .message_container
            .select_first(tree, tree.root())
            .unwrap_or_else(|| tree.root())
    }

    /// Message-shaped elements within `scope` (including `scope` itself).
    pub fn messages_within(&self, tree: &PageTree, scope: NodeKey) -> Vec<NodeKey> {
        self.selectors.message.select(tree, scope)
    }

    /// The page-assigned item key of a message, looked up on the message
    /// or its closest keyed ancestor.
    pub fn item_key(&self, tree: &PageTree, message: NodeKey) -> Option<String> {
        let attr = self.selectors.item_key_attr.as_str();
        let keyed = tree.closest(message, |n| n.attr(attr).is_some())?;
        tree.get(keyed)
            .and_then(|n| n.attr(attr))
            .map(str::to_string)
    }

    /// Whether the message carries a mention addressed to the current
    /// user.
    ///
    /// A broadcast mention addresses everyone; in test mode any mention
    /// matches. Without a resolved user id (and outside test mode) nothing
    /// matches.
    pub fn mention_addressed(
        &self,
        tree: &PageTree,
        message: NodeKey,
        user_id: Option<&str>,
        test_mode: bool,
    ) -> bool {
        for mention in self.selectors.mention.select(tree, message) {
            let text = tree.text_content(mention);
            let text = text.trim();
            if self
                .selectors
                .broadcast_mentions
                .iter()
                .any(|b| b == text)
            {
                return true;
            }
            if test_mode {
                return true;
            }
            let mention_user = tree
                .get(mention)
                .and_then(|n| n.attr(&self.selectors.mention_user_attr));
            if let (Some(uid), Some(target)) = (user_id, mention_user) {
                if uid == target {
                    return true;
                }
            }
        }
        false
    }

    pub fn sender(&self, tree: &PageTree, message: NodeKey) -> Option<String> {
        let node = self.selectors.sender.select_first(tree, message)?;
        let text = tree.text_content(node).trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    pub fn body(&self, tree: &PageTree, message: NodeKey) -> Option<String> {
        let node = self.selectors.body.select_first(tree, message)?;
        let text = tree.text_content(node).trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    /// Reconstruct an [`ObservedMessage`] from a message element.
    ///
    /// Returns `None` when the element has no item key; such nodes cannot
    /// be dedup-tracked and are skipped entirely.
    pub fn observe(
        &self,
        tree: &PageTree,
        message: NodeKey,
        user_id: Option<&str>,
        test_mode: bool,
        source: MessageSource,
    ) -> Option<ObservedMessage> {
        let item_key = self.item_key(tree, message)?;
        Some(ObservedMessage {
            item_key,
            sender: self
                .sender(tree, message)
                .unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
            body: self.body(tree, message).unwrap_or_default(),
            addressed_to_me: self.mention_addressed(tree, message, user_id, test_mode),
            source,
        })
    }

    /// The message element containing `key`, if any.
    pub fn containing_message(&self, tree: &PageTree, key: NodeKey) -> Option<NodeKey> {
        tree.closest(key, |n| self.selectors.message.matches_node(n))
    }

    /// Up to `before` messages preceding the target in its list.
    pub fn context_before(&self, tree: &PageTree, target: NodeKey, before: usize) -> ContextWindow {
        self.context_around(tree, target, before, 0)
    }

    /// Up to `before` preceding and `after` trailing messages around the
    /// target, document order, entries without sender or body skipped.
    pub fn context_around(
        &self,
        tree: &PageTree,
        target: NodeKey,
        before: usize,
        after: usize,
    ) -> ContextWindow {
        let mut window = ContextWindow::new();

        let list = tree
            .closest(target, |n| self.selectors.list.matches_node(n))
            .or_else(|| self.selectors.list.select_first(tree, tree.root()));
        let Some(list) = list else {
            return window;
        };

        let messages = self.selectors.message.select(tree, list);
        let Some(index) = messages.iter().position(|k| *k == target) else {
            debug!("context target not found in its list");
            return window;
        };

        let start = index.saturating_sub(before);
        let end = (index + 1 + after).min(messages.len());
        for &key in messages[start..index].iter().chain(&messages[index + 1..end]) {
            if let (Some(sender), Some(body)) = (self.sender(tree, key), self.body(tree, key)) {
                window.push(sender, body);
            }
        }
        window
    }

    pub fn find_composer(&self, tree: &PageTree) -> Option<NodeKey> {
        self.selectors.composer.select_first(tree, tree.root())
    }

    /// The composer inside a given scope (e.g. an opened thread view).
    pub fn find_composer_within(&self, tree: &PageTree, scope: NodeKey) -> Option<NodeKey> {
        self.selectors.composer.select_first(tree, scope)
    }

    pub fn find_send_button(&self, tree: &PageTree) -> Option<NodeKey> {
        self.selectors.send_button.select_first(tree, tree.root())
    }

    /// Thread-entry control for a message, if the host page renders one.
    pub fn find_thread_button(&self, tree: &PageTree, message: NodeKey) -> Option<NodeKey> {
        self.selectors.thread_button.select_first(tree, message)
    }

    /// The opened reply-thread pane, once the host page renders it.
    pub fn find_thread_pane(&self, tree: &PageTree) -> Option<NodeKey> {
        self.selectors.thread_pane.select_first(tree, tree.root())
    }

    /// The message the host page highlighted right after a navigation.
    pub fn find_highlighted_message(&self, tree: &PageTree) -> Option<NodeKey> {
        let hit = self.selectors.highlight.select_first(tree, tree.root())?;
        self.containing_message(tree, hit).or(Some(hit))
    }

    /// The most recently rendered message carrying any mention.
    pub fn last_mention_message(&self, tree: &PageTree) -> Option<NodeKey> {
        self.selectors
            .mention
            .select(tree, tree.root())
            .into_iter()
            .rev()
            .find_map(|m| self.containing_message(tree, m))
    }

    pub fn feed_container(&self, tree: &PageTree) -> Option<NodeKey> {
        self.selectors.feed_container.select_first(tree, tree.root())
    }

    /// The current top entry of the activity feed.
    ///
    /// An entry whose slot is occupied by a non-message entity (app/bot
    /// notification badge) is skipped and the next slot is treated as top.
    pub fn feed_top_entry(&self, tree: &PageTree) -> Option<NodeKey> {
        let container = self.feed_container(tree)?;
        self.selectors
            .feed_item
            .select(tree, container)
            .into_iter()
            .find(|&entry| {
                self.selectors
                    .feed_app_badge
                    .select_first(tree, entry)
                    .is_none()
            })
    }
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
