//! CDP WebSocket client.
//!
//! One WebSocket per attached page. Requests are correlated to responses
//! by id; everything else on the socket is an event and is handed to the
//! driver's event pump.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::CdpError;
use crate::protocol::{CdpMessage, CdpRequest, PageInfo};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type Pending = HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>;

/// CDP client bound to one page target.
pub struct CdpClient {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Arc<Mutex<Pending>>,
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Find the WebSocket URL of the first open page whose URL contains
    /// `url_fragment`.
    pub async fn discover(endpoint: &str, url_fragment: &str) -> Result<String, CdpError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{endpoint}: {e}")))?;
        let list_url = endpoint
            .join("/json/list")
            .map_err(|e| CdpError::ChromeNotAvailable(e.to_string()))?;
        debug!(%list_url, "discovering page targets");

        let pages: Vec<PageInfo> = reqwest::get(list_url.as_str())
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{endpoint}: {e}")))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(e.to_string()))?;

        pages
            .into_iter()
            .find(|p| p.target_type == "page" && p.url.contains(url_fragment))
            .and_then(|p| p.web_socket_debugger_url)
            .ok_or_else(|| CdpError::PageNotFound(url_fragment.to_string()))
    }

    /// Connect to a page target. Events are forwarded to `events`.
    pub async fn connect(
        ws_url: &str,
        events: mpsc::UnboundedSender<CdpMessage>,
    ) -> Result<Self, CdpError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(e.to_string()))?;
        let (ws_sink, mut ws_source) = ws_stream.split();

        let pending: Arc<Mutex<Pending>> = Arc::new(Mutex::new(HashMap::new()));
        let recv_task = {
            let pending = pending.clone();
            tokio::spawn(async move {
                while let Some(message) = ws_source.next().await {
                    let text = match message {
                        Ok(Message::Text(text)) => text,
                        Ok(Message::Close(_)) | Err(_) => break,
                        _ => continue,
                    };
                    let parsed: CdpMessage = match serde_json::from_str(&text) {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            trace!(error = %e, "unparseable protocol message");
                            continue;
                        }
                    };
                    match parsed.id {
                        Some(id) => {
                            let Some(tx) = pending.lock().remove(&id) else {
                                continue;
                            };
                            let outcome = match parsed.error {
                                Some(error) => Err(CdpError::Protocol(error.message)),
                                None => Ok(parsed.result),
                            };
                            let _ = tx.send(outcome);
                        }
                        None => {
                            if events.send(parsed).is_err() {
                                break;
                            }
                        }
                    }
                }
                debug!("protocol socket closed");
            })
        };

        Ok(Self {
            ws_tx: tokio::sync::Mutex::new(ws_sink),
            request_id: AtomicU64::new(1),
            pending,
            _recv_task: recv_task,
        })
    }

    /// Send one protocol command and await its response.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
        };
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let payload = serde_json::to_string(&request)
            .map_err(|e| CdpError::Protocol(e.to_string()))?;
        if let Err(e) = self.ws_tx.lock().await.send(Message::text(payload)).await {
            self.pending.lock().remove(&id);
            warn!(error = %e, method, "protocol send failed");
            return Err(CdpError::SessionClosed);
        }

        rx.await.map_err(|_| CdpError::SessionClosed)?
    }

    /// Evaluate an expression in the page, returning its value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;

        if let Some(details) = result.get("exceptionDetails") {
            let text = details
                .get("exception")
                .and_then(|e| e.get("description"))
                .and_then(|d| d.as_str())
                .unwrap_or("unknown exception");
            return Err(CdpError::JavaScript(text.to_string()));
        }
        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }
}
