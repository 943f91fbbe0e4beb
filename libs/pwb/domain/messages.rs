//! Request bodies and reply payloads of the remote methods

use super::competition::Competition;
use super::null_as_default;
use super::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `game_player_auto_mode_updated` payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoModeUpdated {
    pub competition_id: String,
    pub table_id: String,
    pub is_on: bool,
}

// ============================================================================
// PlayerInfo
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespPlayer {
    pub id: String,
    pub uid: String,
    pub display_name: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespGetPlayerLatest {
    pub id: String,
    pub uid: String,
    pub display_name: String,
    /// Decimal string
    pub cpp: String,
    pub tickets: i32,
}

// ============================================================================
// Game
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespListGame {
    #[serde(deserialize_with = "null_as_default")]
    pub games: Vec<Game>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub image_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub categories: Vec<GameCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameCategory {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub tag: String,
    pub url: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespListGameLevels {
    pub total: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub data: Vec<GameLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameLevel {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub game_category_id: String,
    pub name: String,
    pub note: String,
    pub image_url: String,
    pub table_count: i32,
    pub player_count: i32,
}

/// Filter for `Game.ListCompetitions`, sent as a JSON string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReqListCompetitions {
    pub page: i32,
    pub limit: i32,
    pub game_category_id: String,
    pub game_level_id: String,
    pub ticket_cpp_value: String,
    pub statuses: Vec<String>,
}

impl ReqListCompetitions {
    pub fn new(
        page: i32,
        limit: i32,
        game_category_id: impl Into<String>,
        game_level_id: impl Into<String>,
        ticket_cpp_value: impl Into<String>,
        statuses: Vec<String>,
    ) -> Self {
        Self {
            page,
            limit,
            game_category_id: game_category_id.into(),
            game_level_id: game_level_id.into(),
            ticket_cpp_value: ticket_cpp_value.into(),
            statuses,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespListCompetitions {
    pub total: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub data: Vec<ListCompetition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListCompetition {
    pub competition_id: String,
    pub name: String,
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespListPlayerActiveCompetitions {
    #[serde(deserialize_with = "null_as_default")]
    pub active_competitions: Vec<ActiveCompetition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveCompetition {
    pub competition_id: String,
    pub competition_mode: String,
    pub competition_name: String,
    pub table_id: String,
    pub table_name: String,
    pub scene: String,
    pub is_afk: bool,
    pub player_status: String,
    pub competition_status: String,
}

// ============================================================================
// Match
// ============================================================================

/// Body of `Match.UpdateCompetitionEventSubscribeStates`, sent as a JSON string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReqUpdateCompetitionEventSubscribeStates {
    pub event_subscribe_states: Vec<CompetitionEventSubscribeState>,
}

impl ReqUpdateCompetitionEventSubscribeStates {
    /// Request toggling a single competition
    pub fn single(competition_id: impl Into<String>, is_event_subscribed: bool) -> Self {
        Self {
            event_subscribe_states: vec![CompetitionEventSubscribeState {
                competition_id: competition_id.into(),
                is_event_subscribed,
            }],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionEventSubscribeState {
    pub competition_id: String,
    pub is_event_subscribed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespCompetitionGetLatest {
    pub competition: Option<Competition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespTableGetLatest {
    pub table: Option<Table>,
}

// ============================================================================
// Client agent
// ============================================================================

/// Online flag per phone number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespCheckLoginStatus {
    #[serde(deserialize_with = "null_as_default")]
    pub online_states: HashMap<String, bool>,
}
