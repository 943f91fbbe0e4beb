use thiserror::Error;

/// Transport-level failures
///
/// Request failures never surface as this type: they reach the reply
/// callback as an `RpcError` with a status code.
#[derive(Error, Debug)]
pub enum HyperRpcError {
    /// Connect or socket I/O failed
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Write side went away mid-send
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    #[error("Not connected")]
    NotConnected,

    /// The client driver has stopped
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Builder rejected its inputs
    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, HyperRpcError>;
