//! Page tree model.
//!
//! A lightweight mirror of the rendered DOM: elements only, with tag,
//! attributes, classes, own text, and child order. Snapshots are cheap to
//! clone and safe to traverse while the real page keeps mutating.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stable key of a node within one page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey(pub u64);

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One element in the page tree.
#[derive(Debug, Clone)]
pub struct PageNode {
    pub key: NodeKey,
    pub tag: String,
    pub attributes: HashMap<String, String>,
    pub classes: Vec<String>,
    /// Text directly inside this element (not descendants).
    pub text: String,
    pub children: Vec<NodeKey>,
    pub parent: Option<NodeKey>,
}

impl PageNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c == name)
    }

    /// Whether the host page reports this control as disabled.
    pub fn is_disabled(&self) -> bool {
        self.attributes.contains_key("disabled")
            || self.attr("aria-disabled") == Some("true")
    }
}

/// Declarative node description used to grow trees.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    tag: String,
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
    text: String,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn class(mut self, name: impl Into<String>) -> Self {
        self.classes.push(name.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// The mirrored page: elements indexed by key, rooted at the body.
#[derive(Debug, Clone)]
pub struct PageTree {
    nodes: HashMap<NodeKey, PageNode>,
    root: NodeKey,
    next_key: u64,
}

impl Default for PageTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PageTree {
    /// An empty tree with a `body` root.
    pub fn new() -> Self {
        let root = NodeKey(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            PageNode {
                key: root,
                tag: "body".to_string(),
                attributes: HashMap::new(),
                classes: Vec::new(),
                text: String::new(),
                children: Vec::new(),
                parent: None,
            },
        );
        Self {
            nodes,
            root,
            next_key: 1,
        }
    }

    /// Rebuild a tree from externally keyed nodes, as delivered by a page
    /// driver snapshot. Keys are taken as-is.
    pub fn from_parts(root: NodeKey, nodes: Vec<PageNode>) -> Self {
        let next_key = nodes.iter().map(|n| n.key.0 + 1).max().unwrap_or(1);
        Self {
            nodes: nodes.into_iter().map(|n| (n.key, n)).collect(),
            root,
            next_key,
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn get(&self, key: NodeKey) -> Option<&PageNode> {
        self.nodes.get(&key)
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|n| n.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(&key)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attach a subtree described by `spec` under `parent`.
    ///
    /// Returns the key of the new subtree root. Unknown parents fall back
    /// to the tree root rather than failing; the page owes us nothing.
    pub fn attach(&mut self, parent: NodeKey, spec: NodeSpec) -> NodeKey {
        let parent = if self.nodes.contains_key(&parent) {
            parent
        } else {
            self.root
        };
        let key = NodeKey(self.next_key);
        self.next_key += 1;

        let NodeSpec {
            tag,
            attributes,
            classes,
            text,
            children,
        } = spec;

        self.nodes.insert(
            key,
            PageNode {
                key,
                tag,
                attributes: attributes.into_iter().collect(),
                classes,
                text,
                children: Vec::new(),
                parent: Some(parent),
            },
        );
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(key);
        }
        for child in children {
            self.attach(key, child);
        }
        key
    }

    /// Remove a node and its whole subtree.
    pub fn remove(&mut self, key: NodeKey) {
        if key == self.root {
            return;
        }
        let descendants = self.descendants(key);
        if let Some(parent) = self.parent(key) {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.retain(|c| *c != key);
            }
        }
        self.nodes.remove(&key);
        for d in descendants {
            self.nodes.remove(&d);
        }
    }

    /// Update the own text of a node.
    pub fn set_text(&mut self, key: NodeKey, text: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(&key) {
            node.text = text.into();
        }
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, key: NodeKey, name: impl Into<String>, value: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(&key) {
            node.attributes.insert(name.into(), value.into());
        }
    }

    pub fn remove_attr(&mut self, key: NodeKey, name: &str) {
        if let Some(node) = self.nodes.get_mut(&key) {
            node.attributes.remove(name);
        }
    }

    /// All descendants of `key` in document (preorder) order, excluding
    /// `key` itself.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self
            .children(key)
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// `key` itself followed by its descendants in document order.
    pub fn subtree(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = vec![key];
        out.extend(self.descendants(key));
        out
    }

    /// Whether `key` is `ancestor` or lies underneath it.
    pub fn is_within(&self, key: NodeKey, ancestor: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    /// Closest ancestor-or-self matching the predicate.
    pub fn closest<F>(&self, key: NodeKey, mut pred: F) -> Option<NodeKey>
    where
        F: FnMut(&PageNode) -> bool,
    {
        let mut current = Some(key);
        while let Some(k) = current {
            let node = self.get(k)?;
            if pred(node) {
                return Some(k);
            }
            current = node.parent;
        }
        None
    }

    /// Concatenated text of a node and its descendants, document order,
    /// like the DOM's `textContent`.
    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        for k in self.subtree(key) {
            if let Some(node) = self.get(k) {
                out.push_str(&node.text);
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
