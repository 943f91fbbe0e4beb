//! `competition_updated` payload

use super::constants::CompetitionStatus;
use super::null_as_default;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Competition snapshot pushed on every change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Competition {
    /// Larger serials happened later
    pub update_serial: i64,
    pub id: String,
    pub meta: CompetitionMeta,
    pub state: Option<CompetitionState>,
    /// Seconds since epoch
    pub update_at: i64,
}

impl Competition {
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.update_at, 0).single()
    }

    /// Typed status, `None` without state or for an unknown value
    pub fn status(&self) -> Option<CompetitionStatus> {
        let state = self.state.as_ref()?;
        serde_json::from_value(serde_json::Value::String(state.status.clone())).ok()
    }

    pub fn player(&self, player_id: &str) -> Option<&CompetitionPlayer> {
        self.state
            .as_ref()?
            .players
            .iter()
            .find(|p| p.player_id == player_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitionMeta {
    pub blind: Blind,
    /// Seconds
    pub max_duration: i32,
    pub min_player_count: i32,
    pub max_player_count: i32,
    pub table_max_seat_count: i32,
    pub table_min_player_count: i32,
    /// default, short_deck or omaha
    pub rule: String,
    pub mode: String,
    pub re_buy_setting: ReBuySetting,
    pub addon_setting: AddonSetting,
    pub advance_setting: AdvanceSetting,
    /// Seconds a player has to act
    pub action_time: i32,
    pub min_chip_unit: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blind {
    pub id: String,
    pub initial_level: i32,
    pub final_buy_in_level_idx: i32,
    /// Ante multiple collected from the dealer (short deck)
    pub dealer_blind_time: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub levels: Vec<BlindLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlindLevel {
    /// -1 marks a break
    pub level: i32,
    pub sb: i64,
    pub bb: i64,
    pub ante: i64,
    pub duration: i32,
    pub allow_addon: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReBuySetting {
    pub max_time: i32,
    pub waiting_time: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddonSetting {
    pub is_break_only: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub redeem_chips: Vec<i64>,
    pub max_time: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvanceSetting {
    pub rule: String,
    pub player_count: i32,
    pub blind_level: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitionState {
    pub open_at: i64,
    pub disable_at: i64,
    pub start_at: i64,
    pub end_at: i64,
    pub blind_state: Option<BlindState>,
    #[serde(deserialize_with = "null_as_default")]
    pub players: Vec<CompetitionPlayer>,
    pub status: String,
    /// Index is rank - 1
    #[serde(deserialize_with = "null_as_default")]
    pub rankings: Vec<CompetitionRank>,
    pub advance_state: Option<AdvanceState>,
    pub statistic: Option<Statistic>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlindState {
    pub final_buy_in_level_idx: i32,
    pub current_level_index: i32,
    /// End of every level, seconds
    #[serde(deserialize_with = "null_as_default")]
    pub end_ats: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitionPlayer {
    pub player_id: String,
    pub table_id: String,
    pub seat: i32,
    pub join_at: i64,

    pub status: String,
    pub rank: i32,
    pub chips: i64,
    pub is_re_buying: bool,
    pub re_buy_end_at: i64,
    pub re_buy_times: i32,
    pub addon_times: i32,

    pub best_winning_pot_chips: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub best_winning_combo: Vec<String>,
    pub best_winning_type: String,
    pub best_winning_power: i32,

    pub total_redeem_chips: i64,
    pub total_game_counts: i64,
    pub total_walk_times: i64,
    pub total_vpip_times: i32,
    pub total_fold_times: i32,
    pub total_preflop_fold_times: i32,
    pub total_flop_fold_times: i32,
    pub total_turn_fold_times: i32,
    pub total_river_fold_times: i32,
    pub total_action_times: i32,
    pub total_raise_times: i32,
    pub total_call_times: i32,
    pub total_check_times: i32,
    pub total_profit_times: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitionRank {
    pub player_id: String,
    pub final_chips: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvanceState {
    pub status: String,
    pub total_tables: i32,
    pub updated_tables: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub updated_table_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistic {
    pub total_buy_in_count: i32,
}
