//! Fallback query strategies.
//!
//! Every extraction task runs an ordered list of alternative queries
//! against a subtree; the first alternative that yields a non-empty node
//! set wins. This tolerates incremental third-party markup changes
//! without code changes: when the semantic attribute disappears, the
//! legacy class name still hits.

use crate::node::{NodeKey, PageNode, PageTree};

/// One condition on a single element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Attribute equals value; `None` means attribute presence.
    Attr {
        name: String,
        value: Option<String>,
    },
    Class(String),
    Tag(String),
    /// `aria-label` contains the fragment.
    AriaLabelContains(String),
}

impl Probe {
    fn matches(&self, node: &PageNode) -> bool {
        match self {
            Probe::Attr { name, value } => match value {
                Some(v) => node.attr(name) == Some(v.as_str()),
                None => node.attributes.contains_key(name),
            },
            Probe::Class(name) => node.has_class(name),
            Probe::Tag(tag) => node.tag == *tag,
            Probe::AriaLabelContains(fragment) => node
                .attr("aria-label")
                .is_some_and(|label| label.contains(fragment.as_str())),
        }
    }
}

/// A conjunction of probes, all of which must hold on one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    probes: Vec<Probe>,
}

impl Query {
    pub fn attr_eq(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            probes: vec![Probe::Attr {
                name: name.into(),
                value: Some(value.into()),
            }],
        }
    }

    pub fn attr_present(name: impl Into<String>) -> Self {
        Self {
            probes: vec![Probe::Attr {
                name: name.into(),
                value: None,
            }],
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self {
            probes: vec![Probe::Class(name.into())],
        }
    }

    pub fn role(value: impl Into<String>) -> Self {
        Self::attr_eq("role", value)
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            probes: vec![Probe::Tag(name.into())],
        }
    }

    pub fn aria_label_contains(fragment: impl Into<String>) -> Self {
        Self {
            probes: vec![Probe::AriaLabelContains(fragment.into())],
        }
    }

    pub fn and_attr_eq(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.probes.push(Probe::Attr {
            name: name.into(),
            value: Some(value.into()),
        });
        self
    }

    pub fn and_attr_present(mut self, name: impl Into<String>) -> Self {
        self.probes.push(Probe::Attr {
            name: name.into(),
            value: None,
        });
        self
    }

    pub fn and_tag(mut self, name: impl Into<String>) -> Self {
        self.probes.push(Probe::Tag(name.into()));
        self
    }

    pub fn and_class(mut self, name: impl Into<String>) -> Self {
        self.probes.push(Probe::Class(name.into()));
        self
    }

    pub fn and_aria_label_contains(mut self, fragment: impl Into<String>) -> Self {
        self.probes.push(Probe::AriaLabelContains(fragment.into()));
        self
    }

    pub fn matches(&self, node: &PageNode) -> bool {
        self.probes.iter().all(|p| p.matches(node))
    }
}

/// Ordered alternatives; the first one with a non-empty result wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    alternatives: Vec<Query>,
}

impl Strategy {
    pub fn new(alternatives: Vec<Query>) -> Self {
        Self { alternatives }
    }

    pub fn one(query: Query) -> Self {
        Self {
            alternatives: vec![query],
        }
    }

    /// Whether any alternative matches this single node.
    pub fn matches_node(&self, node: &PageNode) -> bool {
        self.alternatives.iter().any(|q| q.matches(node))
    }

    /// Run the alternatives against `scope`'s subtree (including `scope`
    /// itself), returning the first non-empty hit set in document order.
    pub fn select(&self, tree: &PageTree, scope: NodeKey) -> Vec<NodeKey> {
        for query in &self.alternatives {
            let hits: Vec<NodeKey> = tree
                .subtree(scope)
                .into_iter()
                .filter(|k| tree.get(*k).is_some_and(|n| query.matches(n)))
                .collect();
            if !hits.is_empty() {
                return hits;
            }
        }
        Vec::new()
    }

    pub fn select_first(&self, tree: &PageTree, scope: NodeKey) -> Option<NodeKey> {
        self.select(tree, scope).into_iter().next()
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
