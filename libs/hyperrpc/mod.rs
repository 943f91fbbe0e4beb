//! # HyperRPC
//!
//! JSON-RPC 2.0 client over a single persistent WebSocket.
//!
//! ## Features
//!
//! - **Single-owner driver**: one task owns the socket, pending requests and timers
//! - **Type-state builder**: the URL is required at compile time
//! - **Request correlation**: ids, per-request timeouts, synthesized failures
//! - **Ordered notifications**: per-stream buffers released by update serial
//! - **Latency probe**: deep pings for jitter and server clock offset
//! - **Automatic reconnection**: fixed delay after any non-manual close
//!
//! ## Example
//!
//! ```rust,ignore
//! use hyperrpc::{RpcClient, RpcResponse};
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> hyperrpc::Result<()> {
//!     let client = hyperrpc::builder()
//!         .url("wss://api.example.com/rpc")
//!         .buffered_stream("table_updated")
//!         .build()
//!         .await?;
//!
//!     client.set_stream_handler("table_updated", |event| println!("{}", event));
//!
//!     let reply: RpcResponse<Value> = client.call("Foo.Bar", vec![json!(1)]).await;
//!     println!("{:?}", reply.into_result());
//!
//!     client.shutdown().await
//! }
//! ```

pub mod traits;
pub mod core;
pub mod rpc;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use self::core::{
    builder, client, config, connection_state, timer, transport,
    builder::{states, RpcClientBuilder},
    client::{ClientEvent, Metrics, RpcClient, RpcStats},
    config::{ClientConfig, ProbeConfig, StreamMode},
    connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState},
};

// Re-export the RPC layer
pub use rpc::{
    ClockOffset, DeepPingResult, Jitter, JitterRate, ProbeState, RpcError, RpcResponse,
    UpdateEvent, CODE_REQUEST_TIMEOUT, CODE_SERVICE_UNAVAILABLE, SYNTHETIC_ID,
};

// Convenience function
pub use self::core::builder as client_builder;

/// Type alias for Result with HyperRpcError
pub type Result<T> = std::result::Result<T, traits::HyperRpcError>;
