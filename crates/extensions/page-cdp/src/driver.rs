//! `PageDriver` implementation over an attached page.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use autoreply_page::{MutationBatch, NodeKey, PageDriver, PageTree};
use autoreply_protocols::{AutomationError, KvStore};

use crate::client::CdpClient;
use crate::collector::{BINDING_NAME, COLLECTOR_JS};
use crate::error::CdpError;
use crate::protocol::{CdpMessage, CollectorEvent, RawSnapshot};

/// Where to find the page.
#[derive(Debug, Clone)]
pub struct CdpPageConfig {
    /// Chrome debugging endpoint.
    pub endpoint: String,
    /// Fragment identifying the workspace tab among open pages.
    pub page_url_fragment: String,
}

impl Default for CdpPageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9222".to_string(),
            page_url_fragment: "app.slack.com".to_string(),
        }
    }
}

type Subscriptions = Arc<Mutex<HashMap<u64, mpsc::UnboundedSender<MutationBatch>>>>;

/// A live page reached over the DevTools protocol.
pub struct CdpPage {
    client: Arc<CdpClient>,
    subscriptions: Subscriptions,
    storage: Arc<CdpStorage>,
}

impl CdpPage {
    /// Attach to the workspace tab and install the collector.
    pub async fn attach(config: CdpPageConfig) -> Result<Self, CdpError> {
        let ws_url = CdpClient::discover(&config.endpoint, &config.page_url_fragment).await?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let client = Arc::new(CdpClient::connect(&ws_url, event_tx).await?);

        client.call("Runtime.enable", json!({})).await?;
        client
            .call("Runtime.addBinding", json!({ "name": BINDING_NAME }))
            .await?;
        client.evaluate(COLLECTOR_JS).await?;

        let subscriptions: Subscriptions = Arc::new(Mutex::new(HashMap::new()));
        tokio::spawn(Self::pump_events(event_rx, subscriptions.clone()));

        debug!(endpoint = %config.endpoint, "attached to workspace page");
        Ok(Self {
            storage: Arc::new(CdpStorage {
                client: client.clone(),
            }),
            client,
            subscriptions,
        })
    }

    /// Route collector notifications to their subscriptions.
    async fn pump_events(
        mut event_rx: mpsc::UnboundedReceiver<CdpMessage>,
        subscriptions: Subscriptions,
    ) {
        while let Some(event) = event_rx.recv().await {
            if event.method.as_deref() != Some("Runtime.bindingCalled") {
                continue;
            }
            if event.params.get("name").and_then(Value::as_str) != Some(BINDING_NAME) {
                continue;
            }
            let Some(payload) = event.params.get("payload").and_then(Value::as_str) else {
                continue;
            };
            let parsed: CollectorEvent = match serde_json::from_str(payload) {
                Ok(parsed) => parsed,
                Err(e) => {
                    trace!(error = %e, "unparseable collector payload");
                    continue;
                }
            };
            match parsed {
                CollectorEvent::Mutation { observer, added } => {
                    let batch = MutationBatch {
                        added: added.into_iter().map(NodeKey).collect(),
                    };
                    let stale = {
                        let subscriptions = subscriptions.lock();
                        match subscriptions.get(&observer) {
                            Some(tx) => tx.send(batch).is_err(),
                            None => false,
                        }
                    };
                    if stale {
                        subscriptions.lock().remove(&observer);
                    }
                }
            }
        }
        debug!("event pump finished");
    }

    /// Call a collector gesture that answers `true` on success.
    async fn gesture(&self, expression: String, what: &str) -> Result<(), AutomationError> {
        let value = self.client.evaluate(&expression).await.map_err(AutomationError::from)?;
        if value.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(AutomationError::ElementNotFound(what.to_string()))
        }
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn snapshot(&self) -> Result<PageTree, AutomationError> {
        let value = self
            .client
            .evaluate("window.__autoreplySnapshot()")
            .await
            .map_err(AutomationError::from)?;
        let Some(raw) = value.as_str() else {
            return Err(AutomationError::Driver("snapshot returned no data".to_string()));
        };
        let snapshot: RawSnapshot = serde_json::from_str(raw)
            .map_err(|e| AutomationError::Driver(format!("snapshot parse: {e}")))?;
        Ok(snapshot.into_tree())
    }

    async fn subscribe(
        &self,
        root: NodeKey,
    ) -> Result<mpsc::UnboundedReceiver<MutationBatch>, AutomationError> {
        let value = self
            .client
            .evaluate(&format!("window.__autoreplyObserve({})", root.0))
            .await
            .map_err(AutomationError::from)?;
        let observer = value.as_u64().unwrap_or(0);
        if observer == 0 {
            return Err(AutomationError::ElementNotFound(format!(
                "mutation root {root}"
            )));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscriptions.lock().insert(observer, tx);
        Ok(rx)
    }

    async fn click(&self, node: NodeKey) -> Result<(), AutomationError> {
        self.gesture(format!("window.__autoreplyClick({})", node.0), "click target")
            .await
    }

    async fn focus(&self, node: NodeKey) -> Result<(), AutomationError> {
        self.gesture(format!("window.__autoreplyFocus({})", node.0), "focus target")
            .await
    }

    async fn clear_text(&self, node: NodeKey) -> Result<(), AutomationError> {
        self.gesture(format!("window.__autoreplyClear({})", node.0), "composer")
            .await
    }

    async fn insert_text(&self, node: NodeKey, text: &str) -> Result<(), AutomationError> {
        let escaped = serde_json::to_string(text)
            .map_err(|e| AutomationError::Driver(e.to_string()))?;
        self.gesture(
            format!("window.__autoreplyInsert({}, {escaped})", node.0),
            "composer",
        )
        .await
    }

    async fn emit_input(&self, node: NodeKey) -> Result<(), AutomationError> {
        self.gesture(format!("window.__autoreplyInput({})", node.0), "composer")
            .await
    }

    async fn press_submit(&self, node: NodeKey) -> Result<(), AutomationError> {
        self.gesture(format!("window.__autoreplyEnter({})", node.0), "composer")
            .await
    }

    async fn navigate(&self, target: &str) -> Result<(), AutomationError> {
        let escaped = serde_json::to_string(target)
            .map_err(|e| AutomationError::Driver(e.to_string()))?;
        if let Err(e) = self
            .gesture(format!("window.__autoreplyNavigate({escaped})"), "navigation target")
            .await
        {
            warn!(error = %e, target, "navigation control not found");
            return Err(e);
        }
        Ok(())
    }

    fn storage(&self) -> Arc<dyn KvStore> {
        self.storage.clone()
    }
}

/// `localStorage` of the attached page.
struct CdpStorage {
    client: Arc<CdpClient>,
}

#[async_trait]
impl KvStore for CdpStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, AutomationError> {
        let escaped = serde_json::to_string(key)
            .map_err(|e| AutomationError::Storage(e.to_string()))?;
        let value = self
            .client
            .evaluate(&format!("window.localStorage.getItem({escaped})"))
            .await
            .map_err(|e| AutomationError::Storage(e.to_string()))?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AutomationError> {
        let key = serde_json::to_string(key)
            .map_err(|e| AutomationError::Storage(e.to_string()))?;
        let value = serde_json::to_string(value)
            .map_err(|e| AutomationError::Storage(e.to_string()))?;
        self.client
            .evaluate(&format!("window.localStorage.setItem({key}, {value}); true"))
            .await
            .map_err(|e| AutomationError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AutomationError> {
        let key = serde_json::to_string(key)
            .map_err(|e| AutomationError::Storage(e.to_string()))?;
        self.client
            .evaluate(&format!("window.localStorage.removeItem({key}); true"))
            .await
            .map_err(|e| AutomationError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, AutomationError> {
        let value = self
            .client
            .evaluate("JSON.stringify(Object.keys(window.localStorage))")
            .await
            .map_err(|e| AutomationError::Storage(e.to_string()))?;
        let Some(raw) = value.as_str() else {
            return Ok(Vec::new());
        };
        serde_json::from_str(raw).map_err(|e| AutomationError::Storage(e.to_string()))
    }
}
