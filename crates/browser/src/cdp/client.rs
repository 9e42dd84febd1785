//! CDP Client - The Core Communication Layer
//!
//! Design decisions:
//! 1. Single WebSocket per browser connection (no per-session WS overhead)
//! 2. Async message passing - no locks on the receive path
//! 3. Request/response matching via ID, events broadcast to subscribers
//! 4. Fail fast - no retries, no queuing. Let the caller decide.

use dashmap::DashMap;
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::protocol::*;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Upper bound for a single command round trip
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum CDPError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CDP protocol error: {code} - {message}")]
    Protocol { code: i32, message: String },

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Connection closed")]
    Closed,

    #[error("Invalid response for request {0}")]
    InvalidResponse(RequestId),
}

/// Result type for CDP operations
pub type Result<T> = std::result::Result<T, CDPError>;

/// Event subscriber callback
pub type EventCallback = Arc<dyn Fn(CDPEvent) + Send + Sync>;

/// CDP Client - manages single WebSocket connection to browser
pub struct CDPClient {
    /// Monotonic request ID counter
    next_id: AtomicU64,

    /// Pending requests waiting for responses
    pending: Arc<DashMap<RequestId, oneshot::Sender<CDPResponse>>>,

    /// Event subscribers, keyed by method name (e.g. "Page.loadEventFired")
    subscribers: Arc<DashMap<String, Vec<EventCallback>>>,

    /// WebSocket write half
    ws_sink: Arc<RwLock<WsSink>>,

    /// Stops the receive loop; dropping the client stops it too
    shutdown_tx: mpsc::Sender<()>,

    request_timeout: Duration,
}

impl CDPClient {
    /// Connect to Chrome DevTools Protocol endpoint
    pub async fn connect(ws_url: &str) -> Result<Arc<Self>> {
        Self::connect_with_timeout(ws_url, DEFAULT_REQUEST_TIMEOUT).await
    }

    pub async fn connect_with_timeout(ws_url: &str, request_timeout: Duration) -> Result<Arc<Self>> {
        let (ws_stream, _) = connect_async(ws_url).await?;
        let (sink, mut stream) = ws_stream.split();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let client = Arc::new(Self {
            next_id: AtomicU64::new(1),
            pending: Arc::new(DashMap::new()),
            subscribers: Arc::new(DashMap::new()),
            ws_sink: Arc::new(RwLock::new(sink)),
            shutdown_tx,
            request_timeout,
        });

        // The loop holds only the maps, not the client, so dropping the
        // last client handle closes the shutdown channel.
        let pending = client.pending.clone();
        let subscribers = client.subscribers.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    msg = stream.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                if let Err(e) = dispatch_message(&pending, &subscribers, &text) {
                                    tracing::error!("Failed to handle message: {}", e);
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                tracing::info!("WebSocket closed");
                                break;
                            }
                            Some(Err(e)) => {
                                tracing::error!("WebSocket error: {}", e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::debug!("CDP receive loop stopped");
                        break;
                    }
                }
            }

            // Dropping the senders wakes every waiter with Closed
            pending.clear();
        });

        Ok(client)
    }

    /// Send CDP request and wait for response
    pub async fn send_request(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
        session_id: Option<SessionId>,
    ) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CDPRequest {
            id,
            method: method.into(),
            params,
            session_id,
        };

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        let json = serde_json::to_string(&request)?;
        let sent = {
            let mut sink = self.ws_sink.write().await;
            sink.send(Message::Text(json)).await
        };
        if let Err(e) = sent {
            self.pending.remove(&id);
            return Err(CDPError::WebSocket(e));
        }

        let response = match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(CDPError::Closed),
            Err(_) => {
                self.pending.remove(&id);
                return Err(CDPError::Timeout(request.method));
            }
        };

        if response.id != id {
            return Err(CDPError::InvalidResponse(id));
        }

        if let Some(error) = response.error {
            return Err(CDPError::Protocol {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Subscribe to CDP events
    pub fn subscribe(&self, method: impl Into<String>, callback: EventCallback) {
        self.subscribers
            .entry(method.into())
            .or_default()
            .push(callback);
    }

    /// Close connection gracefully
    pub async fn close(self: Arc<Self>) -> Result<()> {
        let _ = self.shutdown_tx.send(()).await;
        let mut sink = self.ws_sink.write().await;
        sink.close().await?;
        Ok(())
    }
}

/// Route one incoming frame to its waiter or its event subscribers
fn dispatch_message(
    pending: &DashMap<RequestId, oneshot::Sender<CDPResponse>>,
    subscribers: &DashMap<String, Vec<EventCallback>>,
    text: &str,
) -> Result<()> {
    let msg: CDPMessage = serde_json::from_str(text)?;

    match msg {
        CDPMessage::Response(response) => {
            if let Some((_, tx)) = pending.remove(&response.id) {
                let _ = tx.send(response); // Receiver dropped: caller gave up
            } else {
                tracing::warn!("Received response for unknown request: {}", response.id);
            }
        }
        CDPMessage::Event(event) => {
            if let Some(callbacks) = subscribers.get(&event.method) {
                for callback in callbacks.value() {
                    callback(event.clone());
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_dispatch_response_to_waiter() {
        let pending = DashMap::new();
        let subscribers = DashMap::new();
        let (tx, mut rx) = oneshot::channel();
        pending.insert(7, tx);

        dispatch_message(&pending, &subscribers, r#"{"id":7,"result":{"ok":true}}"#).unwrap();

        let response = rx.try_recv().unwrap();
        assert_eq!(response.id, 7);
        assert_eq!(response.result.unwrap()["ok"], true);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_dispatch_event_to_subscribers() {
        let pending = DashMap::new();
        let subscribers: DashMap<String, Vec<EventCallback>> = DashMap::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        subscribers
            .entry("Page.loadEventFired".to_string())
            .or_default()
            .push(Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        dispatch_message(
            &pending,
            &subscribers,
            r#"{"method":"Page.loadEventFired","params":{"timestamp":1.0}}"#,
        )
        .unwrap();
        dispatch_message(&pending, &subscribers, r#"{"method":"Page.frameNavigated"}"#).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_rejects_garbage() {
        let pending = DashMap::new();
        let subscribers = DashMap::new();
        assert!(matches!(
            dispatch_message(&pending, &subscribers, "not json"),
            Err(CDPError::Json(_))
        ));
    }

    // Real connection tests need a running Chrome
    #[tokio::test]
    #[ignore]
    async fn test_connect() {
        let client = CDPClient::connect("ws://localhost:9222/devtools/browser")
            .await
            .unwrap();

        let result = client
            .send_request("Browser.getVersion", None, None)
            .await
            .unwrap();

        println!("Browser version: {:?}", result);
    }
}
