use std::collections::HashMap;
use std::time::Duration;

/// Timeout applied to every request that expects a reply
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between two drain ticks of a notification buffer
pub const DEFAULT_DRAIN_DELAY: Duration = Duration::from_millis(10);

pub const DEFAULT_PING_METHOD: &str = "System.DeepPing";
pub const DEFAULT_SERIAL_FIELD: &str = "update_serial";

/// How a notification stream is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Held and released in `update_serial` order
    Buffered,
    /// Handed to the subscriber as it arrives
    Immediate,
}

/// Latency probe timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Interval after open and after a slow sample
    pub fast_interval: Duration,
    /// Interval after a healthy sample
    pub normal_interval: Duration,
    /// Reply deadline for one probe
    pub timeout: Duration,
    /// Delays at or above this select the fast interval
    pub slow_threshold: Duration,
    /// Offsets with a smaller magnitude are treated as zero
    pub offset_noise: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            fast_interval: Duration::from_secs(1),
            normal_interval: Duration::from_secs(3),
            timeout: Duration::from_secs(5),
            slow_threshold: Duration::from_millis(250),
            offset_noise: Duration::from_millis(1000),
        }
    }
}

/// Plain settings of an RPC client
///
/// Trait objects (connector, clock, reconnect strategy) live in the
/// builder; this struct only holds values.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL (wss:// or ws://)
    pub(crate) url: String,

    pub(crate) request_timeout: Duration,

    pub(crate) drain_delay: Duration,

    pub(crate) probe: ProbeConfig,

    /// Delivery mode per notification `event_name`; unknown names are dropped
    pub(crate) streams: HashMap<String, StreamMode>,

    /// Payload field holding the update serial of buffered events
    pub(crate) serial_field: String,

    /// Payloads containing any of these are kept out of the debug log
    pub(crate) log_suppress: Vec<String>,

    pub(crate) ping_method: String,

    /// Connect as soon as the client is built
    pub(crate) auto_connect: bool,
}

impl ClientConfig {
    pub(crate) fn new(url: String) -> Self {
        Self {
            url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            drain_delay: DEFAULT_DRAIN_DELAY,
            probe: ProbeConfig::default(),
            streams: HashMap::new(),
            serial_field: DEFAULT_SERIAL_FIELD.to_string(),
            log_suppress: vec![
                DEFAULT_PING_METHOD.to_string(),
                "\"result\":{\"client_timestamp\":".to_string(),
            ],
            ping_method: DEFAULT_PING_METHOD.to_string(),
            auto_connect: true,
        }
    }

    /// Get a reference to the URL
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn drain_delay(&self) -> Duration {
        self.drain_delay
    }

    pub fn probe(&self) -> &ProbeConfig {
        &self.probe
    }

    pub fn stream_mode(&self, event_name: &str) -> Option<StreamMode> {
        self.streams.get(event_name).copied()
    }

    pub fn serial_field(&self) -> &str {
        &self.serial_field
    }

    pub fn log_suppress(&self) -> &[String] {
        &self.log_suppress
    }

    pub fn ping_method(&self) -> &str {
        &self.ping_method
    }
}
