//! Well-known selector sets for the target markup.
//!
//! The default set mirrors what the host page currently renders: a
//! semantic `data-qa` attribute as the primary probe and a legacy class
//! name as the fallback. The whole set is plain data so tests (and future
//! markup drift) can swap individual strategies without touching the
//! extraction code.

use crate::query::{Query, Strategy};

/// Selector strategies for every extraction task.
#[derive(Debug, Clone)]
pub struct SelectorSet {
    /// Root candidates for the primary message container.
    pub message_container: Strategy,
    /// Message-shaped elements.
    pub message: Strategy,
    /// Attribute carrying the page-assigned item key, looked up on the
    /// message or its closest ancestor.
    pub item_key_attr: String,
    /// Mention elements inside a message.
    pub mention: Strategy,
    /// Attribute carrying the mentioned user id.
    pub mention_user_attr: String,
    /// Broadcast mention texts that address everyone.
    pub broadcast_mentions: Vec<String>,
    /// Message body block.
    pub body: Strategy,
    /// Sender display name.
    pub sender: Strategy,
    /// The list element containing a run of messages.
    pub list: Strategy,
    /// The composer input control.
    pub composer: Strategy,
    /// The send control.
    pub send_button: Strategy,
    /// Control opening the reply-thread view for a message.
    pub thread_button: Strategy,
    /// The opened reply-thread pane.
    pub thread_pane: Strategy,
    /// Marker the host page applies to the target message right after a
    /// navigation.
    pub highlight: Strategy,
    /// The secondary activity/notifications container.
    pub feed_container: Strategy,
    /// Entries inside the activity container.
    pub feed_item: Strategy,
    /// Badge marking an entry as app/bot-originated rather than a message.
    pub feed_app_badge: Strategy,
    /// The user-menu control exposing the current user id.
    pub user_button: Strategy,
    /// Attribute on the user-menu control carrying the user id.
    pub user_button_id_attr: String,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            message_container: Strategy::new(vec![
                Query::role("main"),
                Query::class("c-virtual_list__scroll_container"),
            ]),
            message: Strategy::new(vec![
                Query::class("c-message_kit__background"),
                Query::attr_eq("data-qa", "message_container"),
            ]),
            item_key_attr: "data-item-key".to_string(),
            mention: Strategy::new(vec![
                Query::class("c-mention"),
                Query::attr_eq("data-qa", "mention"),
            ]),
            mention_user_attr: "data-user-id".to_string(),
            broadcast_mentions: vec!["@channel".to_string(), "@here".to_string()],
            body: Strategy::one(Query::class("c-message_kit__blocks")),
            sender: Strategy::new(vec![
                Query::class("c-message__sender_link"),
                Query::class("c-message_kit__sender"),
            ]),
            list: Strategy::one(Query::role("list")),
            composer: Strategy::new(vec![
                Query::attr_eq("data-qa", "message_input"),
                Query::class("ql-editor").and_attr_eq("contenteditable", "true"),
                Query::role("textbox").and_attr_eq("contenteditable", "true"),
            ]),
            send_button: Strategy::new(vec![
                Query::attr_eq("data-qa", "texty_send_button"),
                Query::tag("button").and_aria_label_contains("送信"),
                Query::tag("button").and_aria_label_contains("Send"),
            ]),
            thread_button: Strategy::new(vec![
                Query::attr_eq("data-qa", "start_thread"),
                Query::tag("button").and_aria_label_contains("スレッド"),
                Query::tag("button").and_aria_label_contains("thread"),
            ]),
            thread_pane: Strategy::new(vec![
                Query::attr_eq("data-qa", "threads_flexpane"),
                Query::class("p-threads_flexpane"),
            ]),
            highlight: Strategy::new(vec![
                Query::attr_eq("data-qa", "highlighted_message"),
                Query::class("c-message--highlighted"),
            ]),
            feed_container: Strategy::new(vec![
                Query::attr_eq("data-qa", "activity_feed"),
                Query::class("p-activity_feed__list"),
            ]),
            feed_item: Strategy::new(vec![
                Query::attr_eq("data-qa", "activity_item"),
                Query::class("p-activity_item"),
            ]),
            feed_app_badge: Strategy::new(vec![
                Query::attr_eq("data-qa", "app_badge"),
                Query::class("c-app_badge"),
            ]),
            user_button: Strategy::one(Query::attr_eq("data-qa", "user-button")),
            user_button_id_attr: "data-user-id".to_string(),
        }
    }
}
