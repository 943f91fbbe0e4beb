//! Socket transport: one WebSocket connection at a time
//!
//! The transport is owned by the client driver and never shared. Work that
//! has to wait on the network (the connect attempt, the read loop) runs in
//! spawned tasks that report back through the post function as
//! [`TransportInput`]s. Each connection attempt gets a new generation
//! number; inputs from an older generation are ignored.

use crate::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::traits::*;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Report from a connect or read task
pub enum TransportInput {
    Connected { generation: u64, connection: Connection },
    ConnectFailed { generation: u64, reason: String },
    Frame { generation: u64, message: WsMessage },
    Errored { generation: u64, reason: String },
    Closed { generation: u64, code: u16 },
}

/// Transport events surfaced to the RPC layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Message(WsMessage),
    Error(String),
    Close(u16),
}

/// Posts task reports back to the owner
pub type PostFn = Arc<dyn Fn(TransportInput) + Send + Sync>;

pub struct SocketTransport {
    url: String,
    connector: Arc<dyn Connector>,
    strategy: Box<dyn ReconnectionStrategy>,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    post: PostFn,
    generation: u64,
    sink: Option<FrameSink>,
    reader: Option<JoinHandle<()>>,
    connecting: Option<JoinHandle<()>>,
    manual: bool,
    attempt: usize,
}

impl SocketTransport {
    pub fn new(
        url: String,
        connector: Arc<dyn Connector>,
        strategy: Box<dyn ReconnectionStrategy>,
        state: Arc<AtomicConnectionState>,
        metrics: Arc<AtomicMetrics>,
        post: PostFn,
    ) -> Self {
        Self {
            url,
            connector,
            strategy,
            state,
            metrics,
            post,
            generation: 0,
            sink: None,
            reader: None,
            connecting: None,
            manual: false,
            attempt: 0,
        }
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected() && self.sink.is_some()
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    /// Start a connection attempt
    ///
    /// No-op while already open or connecting.
    pub fn connect(&mut self) {
        match self.state.get() {
            ConnectionState::Open | ConnectionState::Connecting => {
                debug!("connect() ignored, transport is {:?}", self.state.get());
                return;
            }
            ConnectionState::Disconnected | ConnectionState::Closing => {}
        }

        self.generation += 1;
        self.state.set(ConnectionState::Connecting);

        let generation = self.generation;
        let connector = Arc::clone(&self.connector);
        let url = self.url.clone();
        let post = Arc::clone(&self.post);

        debug!("Connecting to {} (generation {})", url, generation);
        self.connecting = Some(tokio::spawn(async move {
            match connector.connect(&url).await {
                Ok(connection) => post(TransportInput::Connected { generation, connection }),
                Err(e) => post(TransportInput::ConnectFailed {
                    generation,
                    reason: e.to_string(),
                }),
            }
        }));
    }

    /// Apply a task report
    ///
    /// Returns the event the RPC layer has to react to, if any.
    pub fn handle(&mut self, input: TransportInput) -> Option<TransportEvent> {
        match input {
            TransportInput::Connected { generation, connection } => {
                if generation != self.generation || !self.state.is_connecting() {
                    debug!("Dropping stale connection (generation {})", generation);
                    return None;
                }
                self.open(connection);
                info!("Connected to {}", self.url);
                Some(TransportEvent::Open)
            }
            TransportInput::ConnectFailed { generation, reason } => {
                if generation != self.generation {
                    return None;
                }
                warn!("Failed to connect to {}: {}", self.url, reason);
                self.teardown();
                Some(TransportEvent::Error(reason))
            }
            TransportInput::Frame { generation, message } => {
                if generation != self.generation || !self.state.is_connected() {
                    return None;
                }
                self.metrics.increment_received();
                Some(TransportEvent::Message(message))
            }
            TransportInput::Errored { generation, reason } => {
                if generation != self.generation {
                    return None;
                }
                warn!("WebSocket error: {}", reason);
                self.teardown();
                Some(TransportEvent::Error(reason))
            }
            TransportInput::Closed { generation, code } => {
                if generation != self.generation {
                    return None;
                }
                info!("WebSocket closed with code {}", code);
                self.teardown();
                Some(TransportEvent::Close(code))
            }
        }
    }

    fn open(&mut self, connection: Connection) {
        let Connection { sink, mut stream } = connection;
        let generation = self.generation;
        let post = Arc::clone(&self.post);

        self.reader = Some(tokio::spawn(async move {
            loop {
                match stream.next().await {
                    Some(Ok(WsMessage::Close(code))) => {
                        post(TransportInput::Closed { generation, code });
                        return;
                    }
                    Some(Ok(message)) => post(TransportInput::Frame { generation, message }),
                    Some(Err(e)) => {
                        post(TransportInput::Errored {
                            generation,
                            reason: e.to_string(),
                        });
                        return;
                    }
                    None => {
                        post(TransportInput::Closed {
                            generation,
                            code: CLOSE_ABNORMAL,
                        });
                        return;
                    }
                }
            }
        }));

        self.sink = Some(sink);
        self.connecting = None;
        self.manual = false;
        self.attempt = 0;
        self.strategy.reset();
        self.state.set(ConnectionState::Open);
    }

    /// Close the connection
    ///
    /// `manual` suppresses reconnection until the next explicit connect.
    /// Returns the close event when there was something to close.
    pub async fn disconnect(&mut self, manual: bool) -> Option<TransportEvent> {
        self.manual = manual;
        match self.state.get() {
            ConnectionState::Open => {
                self.state.set(ConnectionState::Closing);
                if let Some(mut sink) = self.sink.take() {
                    if let Err(e) = sink.send(WsMessage::Close(CLOSE_NORMAL)).await {
                        debug!("Close frame not sent: {}", e);
                    }
                    let _ = sink.close().await;
                }
                info!("Disconnected from {} (manual: {})", self.url, manual);
                self.teardown();
                Some(TransportEvent::Close(CLOSE_NORMAL))
            }
            ConnectionState::Connecting => {
                // Outstanding connect result belongs to a dead generation now
                self.generation += 1;
                info!("Connect attempt to {} abandoned (manual: {})", self.url, manual);
                self.teardown();
                Some(TransportEvent::Close(CLOSE_NORMAL))
            }
            ConnectionState::Disconnected | ConnectionState::Closing => None,
        }
    }

    /// Write one text frame
    pub async fn send_text(&mut self, text: String) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(HyperRpcError::NotConnected)?;
        sink.send(WsMessage::Text(text)).await?;
        self.metrics.increment_sent();
        Ok(())
    }

    /// Delay before the next automatic reconnect
    ///
    /// `None` after a manual disconnect or once the strategy gives up.
    pub fn reconnect_delay(&mut self) -> Option<Duration> {
        if self.manual {
            return None;
        }
        let delay = self.strategy.next_delay(self.attempt)?;
        self.attempt += 1;
        self.metrics.increment_reconnects();
        Some(delay)
    }

    pub fn reconnect_attempt(&self) -> usize {
        self.attempt
    }

    fn teardown(&mut self) {
        self.sink = None;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(connecting) = self.connecting.take() {
            connecting.abort();
        }
        self.state.set(ConnectionState::Disconnected);
    }
}

impl Drop for SocketTransport {
    fn drop(&mut self) {
        self.teardown();
    }
}
