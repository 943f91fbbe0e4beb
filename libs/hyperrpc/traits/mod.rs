//! # HyperRPC Traits
//!
//! Seams and small value types shared by the transport and the RPC layer:
//!
//! - **Connector**: Opens a WebSocket connection (tungstenite or in-memory)
//! - **ReconnectionStrategy**: Controls reconnection after unexpected closes
//! - **Clock**: Wall-clock source for probe timestamps
//! - **Listeners**: Ordered, identity de-duplicated observer lists

pub mod clock;
pub mod connector;
pub mod error;
pub mod listener;
pub mod message;
pub mod reconnect;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use connector::{Connection, Connector, FrameSink, FrameStream, TungsteniteConnector};
pub use error::{HyperRpcError, Result};
pub use listener::{
    CloseListener, ErrorListener, ListenerId, Listeners, OpenListener, TransportListeners,
};
pub use message::{WsMessage, CLOSE_ABNORMAL, CLOSE_NORMAL, CLOSE_NO_STATUS};
pub use reconnect::{FixedDelay, NeverReconnect, ReconnectionStrategy, DEFAULT_RECONNECT_DELAY};
