//! Domain Layer
//!
//! Notification payloads, request bodies, reply payloads and the string
//! constants of the PWB service. Plain serde data, no I/O.

pub mod competition;
pub mod constants;
pub mod game;
pub mod messages;
pub mod table;

use serde::{Deserialize, Deserializer};

pub use competition::{
    AddonSetting, AdvanceSetting, AdvanceState, Blind, BlindLevel, BlindState, Competition,
    CompetitionMeta, CompetitionPlayer, CompetitionRank, CompetitionState, ReBuySetting,
    Statistic,
};
pub use constants::{
    CompetitionMode, CompetitionStatus, GameEvent, PlayerAction, PlayerStatus, TableStatus,
    DEFAULT_SOCKET_URL, EVENT_AUTO_MODE_UPDATED, EVENT_COMPETITION_UPDATED, EVENT_TABLE_UPDATED,
    PLAYER_ACTION_READY,
};
pub use game::{
    BlindSetting, CombinationInfo, GameAction, GameMeta, GameResult, GameState, GameStatus,
    PlayerResult, PlayerState, Pot, PotResult, Winner,
};
pub use messages::{
    ActiveCompetition, AutoModeUpdated, CompetitionEventSubscribeState, Game, GameCategory,
    GameLevel, ListCompetition, ReqListCompetitions, ReqUpdateCompetitionEventSubscribeStates,
    RespCheckLoginStatus, RespCompetitionGetLatest, RespGetPlayerLatest, RespListCompetitions,
    RespListGame, RespListGameLevels, RespListPlayerActiveCompetitions, RespPlayer,
    RespTableGetLatest,
};
pub use table::{
    GameStatistics, Table, TableBlindState, TableGameSeatChanges, TableMeta,
    TablePlayerGameAction, TablePlayerState, TableState,
};

/// Read `null` as the type's default (the server sends null for empty lists)
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_competition_tolerates_nulls_and_missing_fields() {
        let competition: Competition = serde_json::from_value(json!({
            "update_serial": 12,
            "id": "c-1",
            "meta": { "mode": "cash", "blind": { "levels": null } },
            "state": {
                "status": "delayed_buy_in",
                "players": [{ "player_id": "p-1", "chips": 1500, "best_winning_combo": null }],
                "rankings": null,
                "blind_state": null
            },
            "update_at": 1_700_000_000
        }))
        .unwrap();

        assert_eq!(competition.update_serial, 12);
        assert!(competition.meta.blind.levels.is_empty());
        assert_eq!(competition.status(), Some(CompetitionStatus::DelayedBuyIn));
        assert_eq!(competition.player("p-1").map(|p| p.chips), Some(1500));
        assert!(competition.player("p-2").is_none());
        assert_eq!(
            competition.updated_at().map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn test_table_seat_map_resolution() {
        let table: Table = serde_json::from_value(json!({
            "update_serial": 3,
            "id": "t-1",
            "meta": { "competition_id": "c-1" },
            "state": {
                "status": "table_game_playing",
                "seat_map": [1, -1, 0],
                "player_states": [
                    { "player_id": "alice", "seat": 2 },
                    { "player_id": "bob", "seat": 0 }
                ],
                "game_state": {
                    "game_id": "g-1",
                    "status": { "current_player": 1, "current_event": "RoundStarted", "pots": null },
                    "players": [{ "idx": 0 }, { "idx": 1, "allowed_actions": ["fold", "call"] }]
                }
            }
        }))
        .unwrap();

        assert_eq!(table.status(), Some(TableStatus::TableGamePlaying));
        assert_eq!(table.seated_player(0).map(|p| p.player_id.as_str()), Some("bob"));
        assert!(table.seated_player(1).is_none());
        assert_eq!(table.seated_player(2).map(|p| p.player_id.as_str()), Some("alice"));
        assert!(table.seated_player(9).is_none());

        let game = table.game_state().unwrap();
        assert_eq!(game.current_event(), Some(GameEvent::RoundStarted));
        assert_eq!(game.current_player().unwrap().allowed_actions, vec!["fold", "call"]);
    }

    #[test]
    fn test_game_result_field_names() {
        let result: GameResult = serde_json::from_value(json!({
            "players": [{ "idx": 0, "final": 2000, "changed": 500 }],
            "pots": [{ "total": 1000, "winners": [{ "idx": 0, "chips": 1000 }] }]
        }))
        .unwrap();
        assert_eq!(result.players[0].final_chips, 2000);
        assert_eq!(result.pots[0].winners[0].chips, 1000);
    }

    #[test]
    fn test_request_bodies_serialize_with_wire_names() {
        let req = ReqUpdateCompetitionEventSubscribeStates::single("c-9", true);
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"event_subscribe_states":[{"competition_id":"c-9","is_event_subscribed":true}]}"#
        );

        let list = ReqListCompetitions::new(1, 20, "cat", "lvl", "10", vec!["registering".into()]);
        let value = serde_json::to_value(&list).unwrap();
        assert_eq!(value["game_category_id"], "cat");
        assert_eq!(value["statuses"], json!(["registering"]));
    }

    #[test]
    fn test_get_latest_wrappers() {
        let resp: RespCompetitionGetLatest =
            serde_json::from_value(json!({ "competition": { "id": "c-1", "update_serial": 4 } }))
                .unwrap();
        assert_eq!(resp.competition.map(|c| c.update_serial), Some(4));

        let empty: RespTableGetLatest = serde_json::from_value(json!({})).unwrap();
        assert!(empty.table.is_none());
    }
}
