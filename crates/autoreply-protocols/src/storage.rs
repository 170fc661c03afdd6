//! Page-local persistent storage contract.
//!
//! The host page exposes a string key/value store that survives
//! navigations within the same origin. The watcher uses it for the
//! pending-reply handoff slot and for identity resolution (the workspace
//! config blob).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::AutomationError;

/// String key/value storage scoped to the page origin.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AutomationError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), AutomationError>;

    async fn remove(&self, key: &str) -> Result<(), AutomationError>;

    /// All keys currently present, in no particular order.
    async fn keys(&self) -> Result<Vec<String>, AutomationError>;
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AutomationError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AutomationError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AutomationError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, AutomationError> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryKvStore::new();
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));

        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_keys() {
        let store = MemoryKvStore::new();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        let mut keys = store.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
