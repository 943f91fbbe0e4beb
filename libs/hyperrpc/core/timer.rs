//! Cancellable one-shot and periodic timers
//!
//! # Architecture
//!
//! Every timer is a small Tokio task that sleeps and then reports its
//! `TimerId` through an injected fire function:
//!
//! ```text
//! ┌──────────────────┐
//! │  Timer Task      │
//! │  (Tokio spawn)   │
//! │  sleep / tick ───┼──> fire(TimerId) ──> driver inbox ──> Scheduler::fire(id) ──> Some(key)
//! └──────────────────┘
//! ```
//!
//! The owner resolves the id back into its key with [`Scheduler::fire`].
//! A timer cancelled after its task already fired resolves to `None`, so
//! a late wakeup can never act on torn-down state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Identifies one scheduled timer; never reused by the same scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Callback invoked from the timer task when a timer elapses
pub type FireFn = Arc<dyn Fn(TimerId) + Send + Sync>;

struct Entry<K> {
    key: K,
    repeat: bool,
    handle: JoinHandle<()>,
}

/// Keyed set of live timers
pub struct Scheduler<K> {
    next_id: u64,
    live: HashMap<TimerId, Entry<K>>,
    fire: FireFn,
}

impl<K: Clone + fmt::Debug> Scheduler<K> {
    pub fn new(fire: FireFn) -> Self {
        Self {
            next_id: 1,
            live: HashMap::new(),
            fire,
        }
    }

    fn allocate(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Fire once after `delay`
    pub fn once(&mut self, delay: Duration, key: K) -> TimerId {
        let id = self.allocate();
        let fire = Arc::clone(&self.fire);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire(id);
        });
        debug!("Scheduled {} ({:?}) in {:?}", id, key, delay);
        self.live.insert(id, Entry { key, repeat: false, handle });
        id
    }

    /// Fire every `period` until cancelled
    ///
    /// The first firing happens one full period after scheduling.
    pub fn every(&mut self, period: Duration, key: K) -> TimerId {
        let id = self.allocate();
        let fire = Arc::clone(&self.fire);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // Skip the first immediate tick - wait for the first period
            ticker.tick().await;
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                fire(id);
            }
        });
        debug!("Scheduled {} ({:?}) every {:?}", id, key, period);
        self.live.insert(id, Entry { key, repeat: true, handle });
        id
    }

    /// Resolve a fired id to its key
    ///
    /// One-shot timers are retired here. Returns `None` for cancelled or
    /// unknown ids.
    pub fn fire(&mut self, id: TimerId) -> Option<K> {
        let repeat = self.live.get(&id)?.repeat;
        if repeat {
            self.live.get(&id).map(|entry| entry.key.clone())
        } else {
            self.live.remove(&id).map(|entry| entry.key)
        }
    }

    /// Cancel a timer; cancelling twice or after firing is a no-op
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.live.remove(&id) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel every timer whose key matches `predicate`
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&K) -> bool) -> usize {
        let ids: Vec<TimerId> = self
            .live
            .iter()
            .filter(|(_, entry)| predicate(&entry.key))
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.cancel(*id);
        }
        ids.len()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Cancel everything
    pub fn clear(&mut self) {
        for (_, entry) in self.live.drain() {
            entry.handle.abort();
        }
    }
}

impl<K> Drop for Scheduler<K> {
    fn drop(&mut self) {
        for (_, entry) in self.live.drain() {
            entry.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn scheduler() -> (Scheduler<&'static str>, mpsc::UnboundedReceiver<TimerId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let fire: FireFn = Arc::new(move |id| {
            let _ = tx.send(id);
        });
        (Scheduler::new(fire), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_fires_and_retires() {
        let (mut timers, mut fired) = scheduler();
        let id = timers.once(Duration::from_millis(10), "drain");

        let got = fired.recv().await.unwrap();
        assert_eq!(got, id);
        assert_eq!(timers.fire(got), Some("drain"));
        assert_eq!(timers.fire(got), None);
        assert!(timers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_resolves_to_none() {
        let (mut timers, mut fired) = scheduler();
        let cancelled = timers.once(Duration::from_millis(10), "timeout");
        let kept = timers.once(Duration::from_millis(20), "probe");

        assert!(timers.cancel(cancelled));
        assert!(!timers.cancel(cancelled));

        let got = fired.recv().await.unwrap();
        assert_eq!(got, kept);
        assert_eq!(timers.fire(cancelled), None);
        assert_eq!(timers.fire(kept), Some("probe"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_keeps_firing_until_cancelled() {
        let (mut timers, mut fired) = scheduler();
        let start = tokio::time::Instant::now();
        let id = timers.every(Duration::from_secs(1), "tick");

        for n in 1..=3u64 {
            let got = fired.recv().await.unwrap();
            assert_eq!(timers.fire(got), Some("tick"));
            assert_eq!(start.elapsed(), Duration::from_secs(n));
        }

        timers.cancel(id);
        assert!(timers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_where_and_clear() {
        let (mut timers, _fired) = scheduler();
        timers.once(Duration::from_secs(1), "request");
        timers.once(Duration::from_secs(1), "request");
        timers.once(Duration::from_secs(1), "drain");

        assert_eq!(timers.cancel_where(|k| *k == "request"), 2);
        assert_eq!(timers.len(), 1);

        timers.clear();
        assert!(timers.is_empty());
    }
}
