/// Source of wall-clock time in unix milliseconds
///
/// Probe timestamps go over the wire, so they come from the wall clock
/// rather than tokio's monotonic clock.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// UTC system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
