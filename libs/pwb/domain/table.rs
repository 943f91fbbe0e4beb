//! `table_updated` payload

use super::constants::TableStatus;
use super::game::GameState;
use super::null_as_default;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Table snapshot pushed on every change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Table {
    /// Larger serials happened later
    pub update_serial: i64,
    pub id: String,
    pub meta: TableMeta,
    pub state: Option<TableState>,
    /// Seconds since epoch
    pub update_at: i64,
}

impl Table {
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.update_at, 0).single()
    }

    pub fn status(&self) -> Option<TableStatus> {
        let state = self.state.as_ref()?;
        serde_json::from_value(serde_json::Value::String(state.status.clone())).ok()
    }

    /// Player sitting in `seat`, resolved through the seat map
    pub fn seated_player(&self, seat: usize) -> Option<&TablePlayerState> {
        let state = self.state.as_ref()?;
        let index = *state.seat_map.get(seat)?;
        if index < 0 {
            return None;
        }
        state.player_states.get(index as usize)
    }

    pub fn game_state(&self) -> Option<&GameState> {
        self.state.as_ref()?.game_state.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableMeta {
    pub competition_id: String,
    pub rule: String,
    pub mode: String,
    pub max_duration: i32,
    pub table_max_seat_count: i32,
    pub table_min_player_count: i32,
    pub min_chip_unit: i64,
    pub action_time: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableState {
    pub status: String,
    pub start_at: i64,
    /// Seat index to `player_states` index, -1 for an empty seat
    #[serde(deserialize_with = "null_as_default")]
    pub seat_map: Vec<i32>,
    pub blind_state: Option<TableBlindState>,
    pub current_dealer_seat: i32,
    pub current_bb_seat: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub player_states: Vec<TablePlayerState>,
    /// Hands played so far
    pub game_count: i32,
    /// Player indexes in this hand, starting from the dealer
    #[serde(deserialize_with = "null_as_default")]
    pub game_player_indexes: Vec<i32>,
    pub game_state: Option<GameState>,
    pub seat_changes: Option<TableGameSeatChanges>,
    pub last_player_game_action: Option<TablePlayerGameAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableBlindState {
    pub level: i32,
    pub ante: i64,
    pub dealer: i64,
    pub sb: i64,
    pub bb: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablePlayerState {
    pub player_id: String,
    /// 0 to 8
    pub seat: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub positions: Vec<String>,
    pub is_participated: bool,
    pub is_between_dealer_bb: bool,
    pub bankroll: i64,
    pub is_in: bool,
    pub game_statistics: GameStatistics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameStatistics {
    pub action_times: i32,
    pub raise_times: i32,
    pub call_times: i32,
    pub check_times: i32,
    pub is_fold: bool,
    pub fold_round: String,
}

/// Seats for the next hand
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableGameSeatChanges {
    pub new_dealer: i32,
    pub new_sb: i32,
    pub new_bb: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablePlayerGameAction {
    pub table_id: String,
    pub game_id: String,
    pub game_count: i32,
    pub round: String,
    pub update_at: i64,
    pub player_id: String,
    pub seat: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub positions: Vec<String>,
    pub action: String,
    pub chips: i64,
}
