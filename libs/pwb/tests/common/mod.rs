//! Common test utilities for PWB integration tests
//!
//! The facade runs on a real `RpcClient` whose connector hands each
//! connection to the test as a `MockPeer`.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::mpsc as fmpsc;
use futures::{SinkExt, StreamExt};
use hyperrpc::{Connection, Connector, HyperRpcError, WsMessage};
use pwb::{ClientSettings, PokerRpc};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Connector that turns every attempt into a `MockPeer`
pub struct PeerConnector {
    peers: mpsc::UnboundedSender<MockPeer>,
}

impl PeerConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MockPeer>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { peers: tx }, rx)
    }
}

#[async_trait]
impl Connector for PeerConnector {
    async fn connect(&self, _url: &str) -> hyperrpc::Result<Connection> {
        let (to_client, from_server) = fmpsc::unbounded::<hyperrpc::Result<WsMessage>>();
        let (to_server, from_client) = fmpsc::unbounded::<WsMessage>();

        let sink = to_server.sink_map_err(|e| HyperRpcError::ConnectionClosed(e.to_string()));
        self.peers
            .send(MockPeer {
                outbound: to_client,
                inbound: from_client,
            })
            .map_err(|_| HyperRpcError::WebSocket("test dropped the peer receiver".into()))?;
        Ok(Connection::new(Box::pin(sink), Box::pin(from_server)))
    }
}

/// Server end of one connection
pub struct MockPeer {
    outbound: fmpsc::UnboundedSender<hyperrpc::Result<WsMessage>>,
    inbound: fmpsc::UnboundedReceiver<WsMessage>,
}

impl MockPeer {
    /// Next request written by the client, parsed
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

    pub fn reply(&self, id: &Value, result: Value) {
        self.send_text(json!({ "jsonrpc": "2.0", "id": id, "result": result }).to_string());
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

    fn send_text(&self, text: String) {
        self.outbound
            .unbounded_send(Ok(WsMessage::Text(text)))
            .expect("client reader gone");
    }
}

/// Settings with the probe pushed out of the way
pub fn quiet_settings() -> ClientSettings {
    let mut settings = ClientSettings::default();
    settings.socket_url = "ws://memory.test/client-agent".to_string();
    settings.probe.fast_interval_ms = 3_600_000;
    settings.probe.normal_interval_ms = 3_600_000;
    settings.probe.timeout_ms = 3_600_000;
    settings
}

/// Facade on a connected client plus the server side of its connection
pub async fn connected_rpc() -> (PokerRpc, MockPeer) {
    let (connector, mut peers) = PeerConnector::new();
    let client = quiet_settings()
        .client_builder()
        .connector(connector)
        .build()
        .await
        .expect("client builds");
    let rpc = PokerRpc::new(client);

    let peer = peers.recv().await.expect("connection attempt");
    wait_for(|| rpc.is_connected()).await;
    rpc.rpc().stats().await.expect("driver alive");
    (rpc, peer)
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
