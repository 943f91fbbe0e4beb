use std::time::Duration;

/// Default pause between an unexpected close and the next connect attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Decides whether and when the transport reopens after an unexpected close
///
/// Manual disconnects never consult the strategy.
pub trait ReconnectionStrategy: Send + Sync {
    /// Delay before reconnection attempt `attempt` (0-indexed)
    ///
    /// `None` stops reconnecting.
    fn next_delay(&self, attempt: usize) -> Option<Duration>;

    /// Called once a connection opens successfully
    fn reset(&mut self) {}
}

/// Same pause before every attempt, optionally capped
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<usize>,
}

impl FixedDelay {
    /// `max_attempts: None` retries forever
    pub fn new(delay: Duration, max_attempts: Option<usize>) -> Self {
        Self { delay, max_attempts }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelay {
    /// 3 seconds, unlimited attempts
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_DELAY, None)
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempt >= max => None,
            _ => Some(self.delay),
        }
    }
}

/// Stay closed after the first unexpected close
#[derive(Debug, Clone)]
pub struct NeverReconnect;

impl ReconnectionStrategy for NeverReconnect {
    fn next_delay(&self, _attempt: usize) -> Option<Duration> {
        None
    }
}
