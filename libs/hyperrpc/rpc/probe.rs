//! Deep-ping latency probe
//!
//! The probe measures server-observed delay and the local/server clock
//! offset over the RPC channel itself. Timers are owned by the client
//! driver; this module keeps the probe's state and does the math.
//!
//! ```text
//!  Idle ──open──> Scheduled ──tick──> InFlight ──reply──> Answered ──> Scheduled
//!                     ^                   │
//!                     │                   └──timeout──> TimedOut (jitter 9999, forced disconnect)
//!                     └────── error reply while connected (fast interval)
//! ```

use crate::core::config::ProbeConfig;
use crate::core::timer::TimerId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Delay reported when a probe gets no reply in time
pub const TIMEOUT_JITTER_DELAY_MS: i64 = 9999;

const LOW_JITTER_BELOW_MS: i64 = 30;
const HIGH_JITTER_ABOVE_MS: i64 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JitterRate {
    Low,
    Medium,
    High,
}

/// One classified latency sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    pub delay_ms: i64,
    pub rate: JitterRate,
}

impl Jitter {
    pub fn new(delay_ms: i64) -> Self {
        let rate = if delay_ms < LOW_JITTER_BELOW_MS {
            JitterRate::Low
        } else if delay_ms > HIGH_JITTER_ABOVE_MS {
            JitterRate::High
        } else {
            JitterRate::Medium
        };
        Self { delay_ms, rate }
    }

    /// Sentinel sample emitted on probe timeout
    pub fn timeout() -> Self {
        Self::new(TIMEOUT_JITTER_DELAY_MS)
    }

    pub fn is_timeout(&self) -> bool {
        self.delay_ms == TIMEOUT_JITTER_DELAY_MS
    }
}

/// Result of the deep-ping method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepPingResult {
    pub client_timestamp: i64,
    pub server_timestamp: i64,
}

/// Raw server offset from one round trip
///
/// Assumes the request and the reply each took half the round trip.
/// `None` when the timestamps are too far apart to subtract.
pub fn estimate_server_offset(client_ts: i64, server_ts: i64, now_ms: i64) -> Option<i64> {
    let transmission = now_ms.checked_sub(client_ts)? / 2;
    server_ts.checked_sub(client_ts.checked_add(transmission)?)
}

/// Offset actually adopted: magnitudes under `noise` collapse to 0
pub fn adopt_offset(raw_offset: i64, noise: Duration) -> i64 {
    if u128::from(raw_offset.unsigned_abs()) < noise.as_millis() {
        0
    } else {
        raw_offset
    }
}

/// What one answered probe yields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub offset_ms: i64,
    pub jitter: Jitter,
    pub next_interval: Duration,
}

/// Turn a deep-ping reply into offset, jitter and the next interval
///
/// Returns `None` when the timestamps overflow the arithmetic; callers
/// treat that like a failed reply.
pub fn measure(config: &ProbeConfig, ping: &DeepPingResult, now_ms: i64) -> Option<Measurement> {
    let raw = estimate_server_offset(ping.client_timestamp, ping.server_timestamp, now_ms)?;
    let offset_ms = adopt_offset(raw, config.offset_noise);
    let delay = ping
        .server_timestamp
        .checked_sub(ping.client_timestamp)?
        .checked_sub(offset_ms)?;
    let jitter = Jitter::new(delay);
    let slow = i64::try_from(config.slow_threshold.as_millis()).unwrap_or(i64::MAX);
    let next_interval = if delay >= slow {
        config.fast_interval
    } else {
        config.normal_interval
    };
    Some(Measurement {
        offset_ms,
        jitter,
        next_interval,
    })
}

/// Estimated server clock minus local clock, in milliseconds
///
/// Cloned into every component that converts server timestamps; written
/// only by successful deep pings.
#[derive(Debug, Clone, Default)]
pub struct ClockOffset {
    inner: Arc<AtomicI64>,
}

impl ClockOffset {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self) -> i64 {
        self.inner.load(Ordering::Acquire)
    }

    pub fn set(&self, offset_ms: i64) {
        self.inner.store(offset_ms, Ordering::Release);
    }

    /// Convert a server timestamp (ms) to local time
    pub fn server_to_local(&self, server_ms: i64) -> i64 {
        server_ms.saturating_sub(self.get())
    }

    /// Convert a local timestamp (ms) to server time
    pub fn local_to_server(&self, local_ms: i64) -> i64 {
        local_ms.saturating_add(self.get())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Idle,
    Scheduled,
    InFlight,
    Answered,
    TimedOut,
}

/// Probe state plus the timers and request it is waiting on
#[derive(Debug)]
pub struct LatencyProbe {
    config: ProbeConfig,
    state: ProbeState,
    tick: Option<TimerId>,
    timeout: Option<TimerId>,
    request: Option<u64>,
}

impl LatencyProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            state: ProbeState::Idle,
            tick: None,
            timeout: None,
            request: None,
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Next probe armed on `tick`
    pub fn scheduled(&mut self, tick: TimerId) {
        self.tick = Some(tick);
        self.state = ProbeState::Scheduled;
    }

    pub fn is_tick(&self, id: TimerId) -> bool {
        self.tick == Some(id)
    }

    /// Ping `request` sent, reply expected before `timeout`
    pub fn started(&mut self, request: u64, timeout: TimerId) {
        self.tick = None;
        self.timeout = Some(timeout);
        self.request = Some(request);
        self.state = ProbeState::InFlight;
    }

    pub fn is_timeout(&self, id: TimerId) -> bool {
        self.state == ProbeState::InFlight && self.timeout == Some(id)
    }

    /// The in-flight probe ran out of time
    pub fn timed_out(&mut self) -> Jitter {
        self.timeout = None;
        self.request = None;
        self.state = ProbeState::TimedOut;
        Jitter::timeout()
    }

    /// Claim the reply to `request`
    ///
    /// Returns the probe timeout to cancel, or `None` when the reply
    /// belongs to a probe that already timed out or was cancelled.
    pub fn answered(&mut self, request: u64) -> Option<TimerId> {
        if self.state != ProbeState::InFlight || self.request != Some(request) {
            return None;
        }
        self.request = None;
        self.state = ProbeState::Answered;
        self.timeout.take()
    }

    /// Stop probing; returns the timers to cancel
    pub fn cancel(&mut self) -> Vec<TimerId> {
        self.request = None;
        self.state = ProbeState::Idle;
        self.tick.take().into_iter().chain(self.timeout.take()).collect()
    }
}
