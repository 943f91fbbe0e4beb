//! Request id allocation and the pending-request table

use crate::core::timer::TimerId;
use crate::rpc::envelope::RpcError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

/// Strictly increasing request ids, starting at 1
///
/// Shared by every handle of one client and never reset, so ids stay
/// unique across reconnects.
#[derive(Debug, Clone)]
pub struct RequestIds {
    next: Arc<AtomicU64>,
}

impl RequestIds {
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    #[inline]
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Id the next call to `next()` will hand out
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome handed to a reply handler
#[derive(Debug)]
pub enum Delivery {
    /// Raw response text from the server
    Reply(String),
    /// Locally synthesized failure
    Failure(RpcError),
}

/// Kind of internally issued deep ping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingKind {
    /// Part of the periodic latency probe
    Cycle,
    /// Standalone clock-offset refresh
    OneOff,
}

/// Who receives the outcome of a request
pub enum ReplyHandler {
    User(Box<dyn FnOnce(Delivery) + Send>),
    Ping(PingKind),
}

impl std::fmt::Debug for ReplyHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyHandler::User(_) => f.write_str("User"),
            ReplyHandler::Ping(kind) => write!(f, "Ping({:?})", kind),
        }
    }
}

/// One request awaiting its reply
#[derive(Debug)]
pub struct PendingRequest {
    pub id: u64,
    pub method: String,
    pub handler: ReplyHandler,
    pub created_at: Instant,
    pub timeout: TimerId,
}

/// Pending requests keyed by id
///
/// Every entry owns exactly one live timeout timer. Taking an entry out is
/// the single terminal transition of a request: whoever takes it delivers,
/// and any later event for the same id finds nothing.
#[derive(Debug, Default)]
pub struct Correlator {
    pending: HashMap<u64, PendingRequest>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, request: PendingRequest) {
        self.pending.insert(request.id, request);
    }

    /// Remove the entry for `id`, if still pending
    pub fn take(&mut self, id: u64) -> Option<PendingRequest> {
        self.pending.remove(&id)
    }

    /// Remove every entry, ordered by id
    pub fn drain(&mut self) -> Vec<PendingRequest> {
        let mut all: Vec<PendingRequest> = self.pending.drain().map(|(_, p)| p).collect();
        all.sort_by_key(|p| p.id);
        all
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// True when `payload` contains any of the suppression markers
pub fn is_suppressed(payload: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| payload.contains(m.as_str()))
}
