//! Saved-item collection from the page.

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use autoreply_page::{NodeKey, PageTree, Query, Strategy};

/// One saved/bookmarked message, as scraped from the saved-items view.
#[derive(Debug, Clone)]
pub struct SavedItem {
    pub channel: String,
    pub sender: String,
    pub message: String,
    /// Rendered surrounding conversation, when the view carries it.
    pub context: String,
    /// Permalink back to the source message.
    pub link: String,
    pub saved_at: DateTime<Utc>,
}

/// Scrapes saved items through the usual fallback strategies.
#[derive(Debug, Clone)]
pub struct SavedItemCollector {
    item: Strategy,
    channel: Strategy,
    sender: Strategy,
    message: Strategy,
    context: Strategy,
    link: Strategy,
    /// Attribute carrying the epoch-seconds save timestamp.
    timestamp_attr: String,
}

impl Default for SavedItemCollector {
    fn default() -> Self {
        Self {
            item: Strategy::new(vec![
                Query::attr_eq("data-qa", "saved_item"),
                Query::class("p-saved_item"),
            ]),
            channel: Strategy::new(vec![
                Query::attr_eq("data-qa", "channel_name"),
                Query::class("p-saved_item__channel"),
            ]),
            sender: Strategy::new(vec![
                Query::class("c-message__sender_link"),
                Query::class("c-message_kit__sender"),
            ]),
            message: Strategy::one(Query::class("c-message_kit__blocks")),
            context: Strategy::one(Query::class("p-saved_item__context")),
            link: Strategy::one(Query::tag("a").and_attr_present("href")),
            timestamp_attr: "data-ts".to_string(),
        }
    }
}

impl SavedItemCollector {
    /// Collect up to `limit` saved items in document order.
    pub fn collect(&self, tree: &PageTree, limit: Option<usize>) -> Vec<SavedItem> {
        let mut items = Vec::new();
        for entry in self.item.select(tree, tree.root()) {
            if limit.is_some_and(|l| items.len() >= l) {
                break;
            }
            if let Some(item) = self.collect_one(tree, entry) {
                items.push(item);
            }
        }
        debug!(count = items.len(), "saved items collected");
        items
    }

    fn collect_one(&self, tree: &PageTree, entry: NodeKey) -> Option<SavedItem> {
        let message = self.text_of(tree, entry, &self.message)?;
        Some(SavedItem {
            channel: self.text_of(tree, entry, &self.channel).unwrap_or_default(),
            sender: self.text_of(tree, entry, &self.sender).unwrap_or_default(),
            message,
            context: self.text_of(tree, entry, &self.context).unwrap_or_default(),
            link: self.link_of(tree, entry).unwrap_or_default(),
            saved_at: self.timestamp_of(tree, entry),
        })
    }

    fn text_of(&self, tree: &PageTree, entry: NodeKey, strategy: &Strategy) -> Option<String> {
        let node = strategy.select_first(tree, entry)?;
        let text = tree.text_content(node).trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    fn link_of(&self, tree: &PageTree, entry: NodeKey) -> Option<String> {
        let anchor = self.link.select_first(tree, entry)?;
        tree.get(anchor)?.attr("href").map(str::to_string)
    }

    fn timestamp_of(&self, tree: &PageTree, entry: NodeKey) -> DateTime<Utc> {
        tree.get(entry)
            .and_then(|n| n.attr(&self.timestamp_attr))
            .and_then(|ts| ts.parse::<i64>().ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(Utc::now)
    }
}
