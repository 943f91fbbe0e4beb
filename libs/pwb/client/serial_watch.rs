//! Update-serial diagnostics for one entity stream
//!
//! Serials of a competition (or table) grow by one per change. Gaps and
//! regressions point at lost or reordered notifications; they are logged,
//! never fatal.

use std::cmp::Ordering;
use tracing::{debug, warn};

/// Outcome of comparing a serial against the last accepted one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialCheck {
    /// Nothing accepted yet for this entity
    First,
    /// Exactly one after the last serial
    Next,
    /// Serials were skipped; `missed` is how many
    Jump { missed: i64 },
    /// Same serial as the last one
    Duplicate,
    /// Older than the last serial
    Backwards,
}

impl SerialCheck {
    /// Whether the update should replace the current snapshot
    ///
    /// Only a strictly older serial is skipped.
    pub fn is_applicable(&self) -> bool {
        !matches!(self, SerialCheck::Backwards)
    }
}

/// Last accepted serial of one entity
#[derive(Debug, Clone)]
pub struct SerialWatch {
    label: &'static str,
    entity: Option<String>,
    last: Option<i64>,
}

impl SerialWatch {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entity: None,
            last: None,
        }
    }

    pub fn last(&self) -> Option<i64> {
        self.last
    }

    /// Classify `serial` for `entity` without recording it
    ///
    /// A different entity id restarts the sequence.
    pub fn check(&self, entity: &str, serial: i64) -> SerialCheck {
        let last = match (&self.entity, self.last) {
            (Some(current), Some(last)) if current == entity => last,
            _ => return SerialCheck::First,
        };

        match serial.cmp(&last) {
            Ordering::Greater => match serial.abs_diff(last) - 1 {
                0 => SerialCheck::Next,
                missed => SerialCheck::Jump {
                    missed: i64::try_from(missed).unwrap_or(i64::MAX),
                },
            },
            Ordering::Equal => SerialCheck::Duplicate,
            Ordering::Less => SerialCheck::Backwards,
        }
    }

    /// Classify `serial`, log anomalies and record it when applicable
    pub fn observe(&mut self, entity: &str, serial: i64) -> SerialCheck {
        let check = self.check(entity, serial);
        let last = self.last.unwrap_or_default();

        match check {
            SerialCheck::Jump { missed } => {
                warn!(
                    "Jump number occur on {} {}: latest serial [{}], current serial [{}], {} missed",
                    self.label, entity, last, serial, missed
                );
            }
            SerialCheck::Backwards => {
                warn!(
                    "Latest {} serial [{}] is larger than current serial [{}] on {}, update skipped",
                    self.label, last, serial, entity
                );
            }
            SerialCheck::Duplicate => {
                debug!("Duplicate {} serial [{}] on {}", self.label, serial, entity);
            }
            SerialCheck::First | SerialCheck::Next => {}
        }

        if check.is_applicable() {
            self.entity = Some(entity.to_string());
            self.last = Some(serial);
        }
        check
    }

    pub fn reset(&mut self) {
        self.entity = None;
        self.last = None;
    }
}
