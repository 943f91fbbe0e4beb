//! Hand state embedded in a table update

use super::constants::GameEvent;
use super::null_as_default;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub game_id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub meta: GameMeta,
    pub status: GameStatus,
    #[serde(deserialize_with = "null_as_default")]
    pub players: Vec<PlayerState>,
    pub result: Option<GameResult>,
}

impl GameState {
    pub fn current_event(&self) -> Option<GameEvent> {
        serde_json::from_value(serde_json::Value::String(self.status.current_event.clone())).ok()
    }

    /// Player whose turn it is
    pub fn current_player(&self) -> Option<&PlayerState> {
        self.players
            .iter()
            .find(|p| p.idx == self.status.current_player)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameMeta {
    pub ante: i64,
    pub blind: BlindSetting,
    pub limit: String,
    pub hole_cards_count: i32,
    pub required_hole_cards_count: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub combination_powers: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub deck: Vec<String>,
    pub burn_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlindSetting {
    pub dealer: i64,
    pub sb: i64,
    pub bb: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameStatus {
    pub mini_bet: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub pots: Vec<Pot>,
    pub round: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub burned: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub board: Vec<String>,
    pub previous_raise_size: i64,
    pub current_deck_position: i32,
    pub current_round_pot: i64,
    pub current_wager: i64,
    pub current_raiser: i32,
    pub current_player: i32,
    pub current_event: String,
    pub last_action: Option<GameAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pot {
    pub level: i64,
    pub wager: i64,
    pub total: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub contributors: HashMap<String, i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameAction {
    pub source: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerState {
    pub idx: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub positions: Vec<String>,

    pub acted: bool,
    pub did_action: Option<String>,
    pub fold: bool,
    /// Voluntarily put in pot
    pub vpip: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub allowed_actions: Vec<String>,

    pub bankroll: i64,
    /// bankroll - pot
    pub initial_stack_size: i64,
    /// initial_stack_size - wager
    pub stack_size: i64,
    pub pot: i64,
    /// Reset to 0 when a round closes
    pub wager: i64,

    #[serde(deserialize_with = "null_as_default")]
    pub hole_cards: Vec<String>,
    pub combination: Option<CombinationInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinationInfo {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cards: Vec<String>,
    pub power: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameResult {
    #[serde(deserialize_with = "null_as_default")]
    pub players: Vec<PlayerResult>,
    #[serde(deserialize_with = "null_as_default")]
    pub pots: Vec<PotResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerResult {
    pub idx: i32,
    #[serde(rename = "final")]
    pub final_chips: i64,
    pub changed: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PotResult {
    pub total: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub winners: Vec<Winner>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Winner {
    pub idx: i32,
    pub chips: i64,
}
