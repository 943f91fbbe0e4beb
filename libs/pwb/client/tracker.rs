//! Latest competition/table state for one seat

use super::poker_rpc::PokerRpc;
use super::serial_watch::{SerialCheck, SerialWatch};
use crate::domain::{AutoModeUpdated, Competition, Table};
use chrono::{DateTime, Utc};
use hyperrpc::Jitter;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Copy of everything the tracker holds
#[derive(Debug, Clone, Default)]
pub struct MatchSnapshot {
    pub competition: Option<Competition>,
    pub table: Option<Table>,
    pub auto_mode: Option<AutoModeUpdated>,
    pub jitter: Option<Jitter>,
    /// Local time of the last applied update
    pub updated_at: Option<DateTime<Utc>>,
}

struct TrackerState {
    focus_competition: Option<String>,
    focus_table: Option<String>,
    competition_serials: SerialWatch,
    table_serials: SerialWatch,
    snapshot: MatchSnapshot,
}

/// Shared view of the match a player is sitting in
///
/// Updates for other competitions or tables are ignored once a focus is
/// set. Serial jumps are applied with a warning, repeats of the current
/// serial replace the snapshot and stale updates are not applied.
#[derive(Clone)]
pub struct MatchTracker {
    inner: Arc<RwLock<TrackerState>>,
}

impl MatchTracker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(TrackerState {
                focus_competition: None,
                focus_table: None,
                competition_serials: SerialWatch::new("competition"),
                table_serials: SerialWatch::new("table"),
                snapshot: MatchSnapshot::default(),
            })),
        }
    }

    /// Follow one competition and, optionally, one of its tables
    ///
    /// Clears the held state.
    pub fn focus(&self, competition_id: impl Into<String>, table_id: Option<String>) {
        let mut state = self.inner.write();
        state.focus_competition = Some(competition_id.into());
        state.focus_table = table_id;
        state.competition_serials.reset();
        state.table_serials.reset();
        state.snapshot = MatchSnapshot::default();
    }

    /// Route competition, table, auto-mode and jitter updates of `rpc` here
    pub fn attach(&self, rpc: &PokerRpc) {
        let tracker = self.clone();
        rpc.set_on_competition(move |competition| {
            tracker.apply_competition(competition);
        });
        let tracker = self.clone();
        rpc.set_on_table(move |table| {
            tracker.apply_table(table);
        });
        let tracker = self.clone();
        rpc.set_on_auto_mode(move |update| tracker.apply_auto_mode(update));
        let tracker = self.clone();
        rpc.set_on_jitter(move |jitter| tracker.record_jitter(jitter));
    }

    /// Returns `None` when the update belongs to another competition
    pub fn apply_competition(&self, competition: Competition) -> Option<SerialCheck> {
        let mut state = self.inner.write();
        if let Some(focus) = &state.focus_competition {
            if *focus != competition.id {
                debug!("Ignoring update of competition {}", competition.id);
                return None;
            }
        }

        let check = state
            .competition_serials
            .observe(&competition.id, competition.update_serial);
        if check.is_applicable() {
            state.snapshot.competition = Some(competition);
            state.snapshot.updated_at = Some(Utc::now());
        }
        Some(check)
    }

    /// Returns `None` when the update belongs to another table
    pub fn apply_table(&self, table: Table) -> Option<SerialCheck> {
        let mut state = self.inner.write();
        if let Some(focus) = &state.focus_competition {
            if *focus != table.meta.competition_id {
                debug!("Ignoring update of table {} ({})", table.id, table.meta.competition_id);
                return None;
            }
        }
        if let Some(focus) = &state.focus_table {
            if *focus != table.id {
                debug!("Ignoring update of table {}", table.id);
                return None;
            }
        }

        let check = state.table_serials.observe(&table.id, table.update_serial);
        if check.is_applicable() {
            state.snapshot.table = Some(table);
            state.snapshot.updated_at = Some(Utc::now());
        }
        Some(check)
    }

    pub fn apply_auto_mode(&self, update: AutoModeUpdated) {
        let mut state = self.inner.write();
        if let Some(focus) = &state.focus_table {
            if *focus != update.table_id {
                return;
            }
        }
        state.snapshot.auto_mode = Some(update);
    }

    pub fn record_jitter(&self, jitter: Jitter) {
        self.inner.write().snapshot.jitter = Some(jitter);
    }

    pub fn competition(&self) -> Option<Competition> {
        self.inner.read().snapshot.competition.clone()
    }

    pub fn table(&self) -> Option<Table> {
        self.inner.read().snapshot.table.clone()
    }

    pub fn jitter(&self) -> Option<Jitter> {
        self.inner.read().snapshot.jitter
    }

    pub fn is_auto_mode(&self) -> bool {
        self.inner
            .read()
            .snapshot
            .auto_mode
            .as_ref()
            .map(|u| u.is_on)
            .unwrap_or(false)
    }

    /// Serials of the held competition and table
    pub fn serials(&self) -> (Option<i64>, Option<i64>) {
        let state = self.inner.read();
        (
            state.competition_serials.last(),
            state.table_serials.last(),
        )
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        self.inner.read().snapshot.clone()
    }
}

impl Default for MatchTracker {
    fn default() -> Self {
        Self::new()
    }
}
