//! Current-user identity resolution.
//!
//! The host page never states who the current user is; three independent
//! places usually leak it. The chain runs in order of reliability and the
//! first success wins. Total failure is logged, not fatal: the session
//! simply never matches user mentions.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use autoreply_protocols::{AutomationError, KvStore};

use crate::node::PageTree;
use crate::selectors::SelectorSet;

static SELF_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r#""self_id":"([^"]+)""#).unwrap());

/// Resolve the current-user identifier.
///
/// Chain: user-menu control attribute → workspace config blob in
/// page-local storage → inline script scan.
pub async fn resolve_user_id(
    tree: &PageTree,
    selectors: &SelectorSet,
    store: &dyn KvStore,
) -> Result<String, AutomationError> {
    if let Some(id) = from_user_button(tree, selectors) {
        debug!(user_id = %id, "identity resolved from user menu");
        return Ok(id);
    }
    if let Some(id) = from_local_config(store).await {
        debug!(user_id = %id, "identity resolved from workspace config blob");
        return Ok(id);
    }
    if let Some(id) = from_inline_scripts(tree) {
        debug!(user_id = %id, "identity resolved from inline script");
        return Ok(id);
    }
    warn!("could not determine current user id; mention matching disabled");
    Err(AutomationError::IdentityUnresolved)
}

fn from_user_button(tree: &PageTree, selectors: &SelectorSet) -> Option<String> {
    let button = selectors.user_button.select_first(tree, tree.root())?;
    tree.get(button)
        .and_then(|n| n.attr(&selectors.user_button_id_attr))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

async fn from_local_config(store: &dyn KvStore) -> Option<String> {
    let keys = match store.keys().await {
        Ok(keys) => keys,
        Err(e) => {
            debug!(error = %e, "page storage scan failed");
            return None;
        }
    };
    for key in keys.iter().filter(|k| k.contains("localConfig")) {
        let Ok(Some(raw)) = store.get(key).await else {
            continue;
        };
        let Ok(blob) = serde_json::from_str::<serde_json::Value>(&raw) else {
            continue;
        };
        let Some(teams) = blob.get("teams").and_then(|t| t.as_object()) else {
            continue;
        };
        for team in teams.values() {
            if let Some(id) = team.get("self_id").and_then(|v| v.as_str()) {
                if !id.is_empty() {
                    return Some(id.to_string());
                }
            }
        }
    }
    None
}

fn from_inline_scripts(tree: &PageTree) -> Option<String> {
    for key in tree.subtree(tree.root()) {
        let Some(node) = tree.get(key) else { continue };
        if node.tag != "script" || !node.text.contains("\"self_id\"") {
            continue;
        }
        if let Some(captures) = SELF_ID.captures(&node.text) {
            return Some(captures[1].to_string());
        }
    }
    None
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
