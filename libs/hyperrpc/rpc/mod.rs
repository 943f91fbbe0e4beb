//! JSON-RPC layer: envelopes, correlation, notification ordering and the
//! latency probe. Everything here is plain state; the client driver in
//! `core::client` wires it to the transport and the timers.

pub mod correlation;
pub mod envelope;
pub mod probe;
pub mod reorder;

pub use correlation::{is_suppressed, Correlator, Delivery, PendingRequest, PingKind, ReplyHandler, RequestIds};
pub use envelope::{
    Incoming, RpcError, RpcRequest, RpcResponse, UpdateEvent, CODE_REQUEST_TIMEOUT,
    CODE_SERVICE_UNAVAILABLE, NOTIFICATION_ID, SYNTHETIC_ID,
};
pub use probe::{
    adopt_offset, estimate_server_offset, measure, ClockOffset, DeepPingResult, Jitter, JitterRate,
    LatencyProbe, Measurement, ProbeState, TIMEOUT_JITTER_DELAY_MS,
};
pub use reorder::{BufferedEvent, ReorderBuffer, Sequenced};
