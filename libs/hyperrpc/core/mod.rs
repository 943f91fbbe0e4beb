//! Client core: the socket transport, the timer scheduler and the driver
//! that ties them to the JSON-RPC layer.

pub mod builder;
pub mod client;
pub mod config;
pub mod connection_state;
pub mod timer;
pub mod transport;

// Re-export main types
pub use builder::{states, RpcClientBuilder};
pub use client::{ClientEvent, JitterHandler, Metrics, RpcClient, RpcStats, StreamHandler};
pub use config::{ClientConfig, ProbeConfig, StreamMode};
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
pub use timer::{Scheduler, TimerId};

/// Create a new RPC client builder
///
/// # Example
/// ```ignore
/// let client = hyperrpc::builder()
///     .url("wss://api.example.com/rpc")
///     .buffered_stream("table_updated")
///     .build()
///     .await?;
/// ```
pub fn builder() -> RpcClientBuilder<builder::states::NoUrl> {
    RpcClientBuilder::new()
}
