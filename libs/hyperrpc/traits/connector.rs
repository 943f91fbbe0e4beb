use crate::error::{HyperRpcError, Result};
use crate::message::{WsMessage, CLOSE_NO_STATUS};
use async_trait::async_trait;
use futures::{future, Sink, SinkExt, Stream, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

/// Write half of an open connection
pub type FrameSink = Pin<Box<dyn Sink<WsMessage, Error = HyperRpcError> + Send>>;

/// Read half of an open connection
///
/// The stream ends when the socket goes away without a close frame.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<WsMessage>> + Send>>;

/// An open, split WebSocket connection
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Connection {
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }
}

/// Opens WebSocket connections for the transport
///
/// The transport only ever talks to this trait, so tests can hand it
/// in-memory connections.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Connection>;
}

/// Connector backed by tokio-tungstenite
#[derive(Debug, Clone, Default)]
pub struct TungsteniteConnector {
    headers: Vec<(String, String)>,
}

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra HTTP headers sent with the upgrade request
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Connection> {
        let mut request = url
            .into_client_request()
            .map_err(|e| HyperRpcError::Configuration(format!("Invalid URL {}: {}", url, e)))?;

        for (key, value) in &self.headers {
            match (
                key.parse::<http::header::HeaderName>(),
                value.parse::<http::header::HeaderValue>(),
            ) {
                (Ok(name), Ok(value)) => {
                    request.headers_mut().insert(name, value);
                }
                (Err(_), _) => warn!("Invalid header name: {}", key),
                (_, Err(_)) => warn!("Invalid header value for key '{}': {}", key, value),
            }
        }

        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|e| HyperRpcError::WebSocket(e.to_string()))?;
        debug!("WebSocket handshake completed with {}", url);

        let (write, read) = ws_stream.split();

        let sink = write
            .sink_map_err(|e| HyperRpcError::WebSocket(e.to_string()))
            .with(|msg: WsMessage| future::ready(Ok::<_, HyperRpcError>(ws_message_to_tungstenite(msg))));

        let stream = read.filter_map(|item| {
            future::ready(match item {
                Ok(msg) => tungstenite_to_ws_message(msg).map(Ok),
                Err(e) => Some(Err(HyperRpcError::WebSocket(e.to_string()))),
            })
        });

        Ok(Connection::new(Box::pin(sink), Box::pin(stream)))
    }
}

/// Convert WsMessage to tungstenite Message
fn ws_message_to_tungstenite(msg: WsMessage) -> Message {
    match msg {
        WsMessage::Text(text) => Message::Text(text),
        WsMessage::Binary(data) => Message::Binary(data),
        WsMessage::Close(code) => Message::Close(Some(CloseFrame {
            code: CloseCode::from(code),
            reason: "".into(),
        })),
    }
}

/// Convert tungstenite Message to WsMessage
fn tungstenite_to_ws_message(msg: Message) -> Option<WsMessage> {
    match msg {
        Message::Text(text) => Some(WsMessage::Text(text)),
        Message::Binary(data) => Some(WsMessage::Binary(data)),
        Message::Close(frame) => Some(WsMessage::Close(
            frame.map(|f| u16::from(f.code)).unwrap_or(CLOSE_NO_STATUS),
        )),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}
