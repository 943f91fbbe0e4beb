//! Serial-ordered release of bursty notifications
//!
//! Events are held in arrival order and released one per drain tick,
//! smallest `update_serial` first. The buffer itself schedules nothing:
//! `push` reports when a drain cycle has to start and the owner arms the
//! timer.

use serde_json::Value;

/// Anything carrying an update serial (larger = later)
pub trait Sequenced {
    fn update_serial(&self) -> i64;
}

/// A held notification payload
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedEvent {
    pub update_serial: i64,
    pub payload: Value,
}

impl BufferedEvent {
    /// Read `serial_field` out of the payload
    ///
    /// Returns `None` when the field is missing or not an integer.
    pub fn from_payload(payload: Value, serial_field: &str) -> Option<Self> {
        let update_serial = payload.get(serial_field)?.as_i64()?;
        Some(Self {
            update_serial,
            payload,
        })
    }
}

impl Sequenced for BufferedEvent {
    fn update_serial(&self) -> i64 {
        self.update_serial
    }
}

/// Holding set for one notification stream
///
/// Non-empty whenever a drain cycle is active. No dedup, no gap
/// detection.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    held: Vec<T>,
    draining: bool,
}

impl<T: Sequenced> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self {
            held: Vec::new(),
            draining: false,
        }
    }

    /// Hold an event
    ///
    /// Returns `true` when this push starts a drain cycle.
    pub fn push(&mut self, item: T) -> bool {
        self.held.push(item);
        if self.draining {
            false
        } else {
            self.draining = true;
            true
        }
    }

    /// Release the held event with the smallest serial
    ///
    /// Ties go to the earliest arrival. The drain cycle ends when the set
    /// becomes empty.
    pub fn pop_next(&mut self) -> Option<T> {
        let index = self
            .held
            .iter()
            .enumerate()
            .min_by_key(|(_, item)| item.update_serial())
            .map(|(index, _)| index);

        let item = index.map(|i| self.held.remove(i));
        if self.held.is_empty() {
            self.draining = false;
        }
        item
    }

    /// Discard everything held and stop draining
    pub fn reset(&mut self) -> usize {
        let dropped = self.held.len();
        self.held.clear();
        self.draining = false;
        dropped
    }

    pub fn is_draining(&self) -> bool {
        self.draining
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl<T: Sequenced> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
