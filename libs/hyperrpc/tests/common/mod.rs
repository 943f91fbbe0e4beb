//! Common test utilities for HyperRPC integration tests
//!
//! `MemoryConnector` hands every connection attempt to the test as a
//! `MockPeer`, so request/reply timing runs under tokio's paused clock.
//! `MockRpcServer` is a real WebSocket server for end-to-end checks.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::mpsc as fmpsc;
use futures::{SinkExt, StreamExt};
use hyperrpc::{Clock, Connection, Connector, HyperRpcError, ProbeConfig, RpcClient, WsMessage};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

pub const TEST_URL: &str = "ws://memory.test/rpc";

/// In-memory connector; each successful attempt yields a `MockPeer`
#[derive(Clone)]
pub struct MemoryConnector {
    peers: mpsc::UnboundedSender<MockPeer>,
    refuse: Arc<AtomicBool>,
    attempts: Arc<AtomicUsize>,
}

/// Test side of the connector
pub struct PeerAcceptor {
    peers: mpsc::UnboundedReceiver<MockPeer>,
}

impl MemoryConnector {
    pub fn new() -> (Self, PeerAcceptor) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Self {
            peers: tx,
            refuse: Arc::new(AtomicBool::new(false)),
            attempts: Arc::new(AtomicUsize::new(0)),
        };
        (connector, PeerAcceptor { peers: rx })
    }

    /// Make the next attempts fail
    pub fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _url: &str) -> hyperrpc::Result<Connection> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(HyperRpcError::WebSocket("connection refused".into()));
        }

        let (to_client, from_server) = fmpsc::unbounded::<hyperrpc::Result<WsMessage>>();
        let (to_server, from_client) = fmpsc::unbounded::<WsMessage>();

        let sink = to_server.sink_map_err(|e| HyperRpcError::ConnectionClosed(e.to_string()));
        let connection = Connection::new(Box::pin(sink), Box::pin(from_server));

        self.peers
            .send(MockPeer {
                outbound: to_client,
                inbound: from_client,
            })
            .map_err(|_| HyperRpcError::WebSocket("acceptor dropped".into()))?;
        Ok(connection)
    }
}

impl PeerAcceptor {
    /// Wait for the next connection attempt
    pub async fn accept(&mut self) -> MockPeer {
        self.peers.recv().await.expect("connector dropped")
    }

    /// Wait at most `limit` for a connection attempt
    pub async fn accept_within(&mut self, limit: Duration) -> Option<MockPeer> {
        tokio::time::timeout(limit, self.peers.recv()).await.ok().flatten()
    }
}

/// Server end of one in-memory connection
pub struct MockPeer {
    outbound: fmpsc::UnboundedSender<hyperrpc::Result<WsMessage>>,
    inbound: fmpsc::UnboundedReceiver<WsMessage>,
}

impl MockPeer {
    /// Next frame written by the client, `None` once it hung up
    pub async fn recv_frame(&mut self) -> Option<WsMessage> {
        self.inbound.next().await
    }

    /// Next text frame, parsed
    pub async fn recv_request(&mut self) -> Value {
        loop {
            match self.inbound.next().await {
                Some(WsMessage::Text(text)) => {
                    return serde_json::from_str(&text).expect("client sent invalid JSON")
                }
                Some(_) => continue,
                None => panic!("client closed the connection"),
            }
        }
    }

    pub fn send_text(&self, text: impl Into<String>) {
        self.outbound
            .unbounded_send(Ok(WsMessage::Text(text.into())))
            .expect("client reader gone");
    }

    pub fn reply(&self, id: u64, result: Value) {
        self.send_text(json!({ "jsonrpc": "2.0", "id": id, "result": result }).to_string());
    }

    pub fn reply_error(&self, id: u64, code: i32, message: &str) {
        self.send_text(
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": code, "message": message },
            })
            .to_string(),
        );
    }

    pub fn notify(&self, event_name: &str, event: Value) {
        self.send_text(
            json!({
                "jsonrpc": "2.0",
                "id": 0,
                "result": { "event_name": event_name, "event": event },
            })
            .to_string(),
        );
    }

    /// Close the connection from the server side
    pub fn close(self, code: u16) {
        let _ = self.outbound.unbounded_send(Ok(WsMessage::Close(code)));
        self.outbound.close_channel();
    }

    /// Fail the client's read side
    pub fn fail(self, reason: &str) {
        let _ = self
            .outbound
            .unbounded_send(Err(HyperRpcError::WebSocket(reason.to_string())));
    }

    /// Make every further client write fail
    pub fn stop_reading(&mut self) {
        self.inbound.close();
    }
}

/// Clock the test moves by hand
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Probe settings that keep the probe out of the way
pub fn quiet_probe() -> ProbeConfig {
    ProbeConfig {
        fast_interval: Duration::from_secs(3600),
        normal_interval: Duration::from_secs(3600),
        timeout: Duration::from_secs(3600),
        ..ProbeConfig::default()
    }
}

/// Build a client on a fresh memory connector and wait until it is open
pub async fn connected_client() -> (RpcClient, MockPeer, PeerAcceptor, MemoryConnector) {
    let (connector, mut acceptor) = MemoryConnector::new();
    let client = hyperrpc::builder()
        .url(TEST_URL)
        .connector(connector.clone())
        .probe(quiet_probe())
        .buffered_stream("table_updated")
        .immediate_stream("game_player_auto_mode_updated")
        .build()
        .await
        .expect("client builds");
    let peer = acceptor.accept().await;
    wait_for(|| client.is_connected()).await;
    settle(&client).await;
    (client, peer, acceptor, connector)
}

/// Wait until the driver processed everything queued so far
pub async fn settle(client: &RpcClient) {
    client.stats().await.expect("driver alive");
}

/// Let in-flight frames reach the driver, then settle
///
/// Advances the paused clock by one millisecond.
pub async fn flush(client: &RpcClient) {
    tokio::time::sleep(Duration::from_millis(1)).await;
    settle(client).await;
}

/// Poll `condition` every millisecond for up to 5 seconds
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..5000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not met within 5s");
}

/// A JSON-RPC server over a real WebSocket
///
/// Answers every request with `{"echo": <method>, "params": <params>}` and
/// pushes one notification after the first request.
pub struct MockRpcServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
}

impl MockRpcServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let shutdown = shutdown_clone.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, shutdown).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self { addr, shutdown }
    }

    async fn handle_connection(stream: tokio::net::TcpStream, shutdown: Arc<Notify>) {
        use tokio_tungstenite::accept_async;
        use tokio_tungstenite::tungstenite::Message;

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();
        let mut notified = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let request: Value = match serde_json::from_str(&text) {
                                Ok(v) => v,
                                Err(_) => continue,
                            };
                            let reply = json!({
                                "jsonrpc": "2.0",
                                "id": request["id"],
                                "result": { "echo": request["method"], "params": request["params"] },
                            });
                            if write.send(Message::Text(reply.to_string())).await.is_err() {
                                break;
                            }
                            if !notified {
                                notified = true;
                                let push = json!({
                                    "jsonrpc": "2.0",
                                    "result": {
                                        "event_name": "table_updated",
                                        "event": { "update_serial": 1, "table_id": "t-1" },
                                    },
                                });
                                if write.send(Message::Text(push.to_string())).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockRpcServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
