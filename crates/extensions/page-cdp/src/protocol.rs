//! CDP wire types and collector payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use autoreply_page::{NodeKey, PageNode, PageTree};

/// Outgoing protocol message.
#[derive(Debug, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    pub params: serde_json::Value,
}

/// Incoming protocol message: a response when `id` is set, an event when
/// `method` is set.
#[derive(Debug, Deserialize)]
pub struct CdpMessage {
    pub id: Option<u64>,
    pub method: Option<String>,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub result: serde_json::Value,
    pub error: Option<CdpErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct CdpErrorBody {
    pub message: String,
}

/// `/json/list` entry on the debugging endpoint.
#[derive(Debug, Deserialize)]
pub struct PageInfo {
    #[serde(default, rename = "type")]
    pub target_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: Option<String>,
}

/// One serialized element from the in-page collector.
#[derive(Debug, Deserialize)]
pub struct RawNode {
    pub id: u64,
    pub tag: String,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub children: Vec<u64>,
    pub parent: Option<u64>,
}

/// Snapshot payload from the collector.
#[derive(Debug, Deserialize)]
pub struct RawSnapshot {
    pub root: u64,
    pub nodes: Vec<RawNode>,
}

impl RawSnapshot {
    /// Convert the collector payload into a [`PageTree`].
    pub fn into_tree(self) -> PageTree {
        let nodes = self
            .nodes
            .into_iter()
            .map(|raw| PageNode {
                key: NodeKey(raw.id),
                tag: raw.tag,
                attributes: raw.attrs,
                classes: raw.classes,
                text: raw.text,
                children: raw.children.into_iter().map(NodeKey).collect(),
                parent: raw.parent.map(NodeKey),
            })
            .collect();
        PageTree::from_parts(NodeKey(self.root), nodes)
    }
}

/// Notification relayed through the collector binding.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollectorEvent {
    /// A mutation batch under an observed root.
    Mutation { observer: u64, added: Vec<u64> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_into_tree() {
        let raw: RawSnapshot = serde_json::from_str(
            r#"{
                "root": 1,
                "nodes": [
                    {"id": 1, "tag": "body", "children": [2], "parent": null},
                    {"id": 2, "tag": "div",
                     "attrs": {"data-qa": "message_input"},
                     "classes": ["ql-editor"],
                     "text": "draft",
                     "children": [], "parent": 1}
                ]
            }"#,
        )
        .unwrap();

        let tree = raw.into_tree();
        assert_eq!(tree.root(), NodeKey(1));
        let composer = tree.children(tree.root())[0];
        let node = tree.get(composer).unwrap();
        assert_eq!(node.attr("data-qa"), Some("message_input"));
        assert!(node.has_class("ql-editor"));
        assert_eq!(tree.text_content(composer), "draft");
    }

    #[test]
    fn test_collector_event_parse() {
        let event: CollectorEvent =
            serde_json::from_str(r#"{"type":"mutation","observer":3,"added":[10,11]}"#).unwrap();
        match event {
            CollectorEvent::Mutation { observer, added } => {
                assert_eq!(observer, 3);
                assert_eq!(added, vec![10, 11]);
            }
        }
    }

    #[test]
    fn test_message_response_vs_event() {
        let response: CdpMessage =
            serde_json::from_str(r#"{"id":7,"result":{"ok":true}}"#).unwrap();
        assert_eq!(response.id, Some(7));
        assert!(response.method.is_none());

        let event: CdpMessage = serde_json::from_str(
            r#"{"method":"Runtime.bindingCalled","params":{"name":"x","payload":"{}"}}"#,
        )
        .unwrap();
        assert!(event.id.is_none());
        assert_eq!(event.method.as_deref(), Some("Runtime.bindingCalled"));
    }
}
