//! Integration tests for the PWB facade
//!
//! Param shapes on the wire, typed replies and typed notifications.

mod common;

use common::*;
use hyperrpc::RpcResponse;
use parking_lot::Mutex;
use pwb::domain::{
    ReqListCompetitions, ReqUpdateCompetitionEventSubscribeStates, RespCompetitionGetLatest,
    RespPlayer, EVENT_AUTO_MODE_UPDATED, EVENT_COMPETITION_UPDATED, EVENT_TABLE_UPDATED,
};
use pwb::{AutoModeUpdated, MatchTracker, PlayerAction, SerialCheck, Table};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

fn ignore(_: RpcResponse<Value>) {}

#[tokio::test(start_paused = true)]
async fn test_match_methods_send_positional_params() {
    verbose_println!("Testing Match.* param shapes...");

    let (rpc, mut peer) = connected_rpc().await;

    rpc.send_competition_cash_buy_in("c-1", "100.5", "", "", ignore);
    rpc.send_competition_cash_out("c-1", "t-1", ignore);
    rpc.send_competition_get_latest("c-1", |_: RpcResponse<RespCompetitionGetLatest>| {});
    rpc.send_table_get_latest("c-1", "t-1", |_| {});
    rpc.send_table_join("c-1", "t-1", "", "", ignore);
    rpc.send_table_leave("c-1", "t-1", ignore);
    rpc.send_game_player_ready("c-1", "t-1", ignore);
    rpc.send_game_player_wager("c-1", "t-1", PlayerAction::Raise, 400, ignore);
    rpc.send_game_player_auto_mode("c-1", "t-1", true, ignore);

    let expected = [
        ("Match.CompetitionCashBuyIn", json!(["c-1", "100.5", "", ""])),
        ("Match.CompetitionCashOut", json!(["c-1", "t-1"])),
        ("Match.CompetitionGetLatest", json!(["c-1"])),
        ("Match.TableGetLatest", json!(["c-1", "t-1"])),
        ("Match.TableJoin", json!(["c-1", "t-1", "", ""])),
        ("Match.TableLeave", json!(["c-1", "t-1"])),
        ("Match.GamePlayerReady", json!(["c-1", "t-1"])),
        ("Match.GamePlayerWager", json!(["c-1", "t-1", "raise", 400])),
        ("Match.GamePlayerAutoMode", json!(["c-1", "t-1", true])),
    ];
    for (method, params) in expected {
        let request = peer.recv_request().await;
        verbose_println!("  {}", request);
        assert_eq!(request["jsonrpc"], "2.0");
        assert_eq!(request["method"], method);
        assert_eq!(request["params"], params);
    }
}

#[tokio::test(start_paused = true)]
async fn test_lobby_methods_send_positional_params() {
    let (rpc, mut peer) = connected_rpc().await;

    rpc.send_authenticate("token-abc", ignore);
    rpc.send_get_current_player(|_| {});
    rpc.send_get_player_latest_data(|_| {});
    rpc.send_get_player(Some("p-1"), None, |_| {});
    rpc.send_list_games(|_| {});
    rpc.send_list_game_levels(1, 20, "cat-1", |_| {});
    rpc.send_list_player_active_competitions(|_| {});

    let expected = [
        ("Auth.Authenticate", json!(["token-abc"])),
        ("PlayerInfo.GetCurrentPlayer", json!([])),
        ("PlayerInfo.GetPlayerLatestData", json!([])),
        ("PlayerInfo.GetPlayer", json!(["p-1", ""])),
        ("Game.ListGames", json!([])),
        ("Game.ListGameLevels", json!([1, 20, "cat-1"])),
        ("Game.ListPlayerActiveCompetitions", json!([])),
    ];
    for (method, params) in expected {
        let request = peer.recv_request().await;
        assert_eq!(request["method"], method);
        assert_eq!(request["params"], params);
    }
}

#[tokio::test(start_paused = true)]
async fn test_request_bodies_travel_as_json_strings() {
    let (rpc, mut peer) = connected_rpc().await;

    let filter = ReqListCompetitions::new(1, 10, "cat", "lvl", "5", vec!["registering".into()]);
    rpc.send_list_competitions(&filter, |_| {});
    rpc.send_update_competition_event_subscribe_states(
        &ReqUpdateCompetitionEventSubscribeStates::single("c-3", false),
        ignore,
    );

    let request = peer.recv_request().await;
    assert_eq!(request["method"], "Game.ListCompetitions");
    let encoded = request["params"][0].as_str().expect("string param");
    let decoded: ReqListCompetitions = serde_json::from_str(encoded).unwrap();
    assert_eq!(decoded, filter);

    let request = peer.recv_request().await;
    assert_eq!(request["method"], "Match.UpdateCompetitionEventSubscribeStates");
    assert_eq!(
        request["params"],
        json!([r#"{"event_subscribe_states":[{"competition_id":"c-3","is_event_subscribed":false}]}"#])
    );
}

#[tokio::test(start_paused = true)]
async fn test_ready_is_followed_by_deep_ping() {
    let (rpc, mut peer) = connected_rpc().await;

    rpc.send_ready(ignore);
    assert_eq!(peer.recv_request().await["method"], "System.Ready");

    let ping = peer.recv_request().await;
    assert_eq!(ping["method"], "System.DeepPing");
    assert_eq!(ping["params"].as_array().map(|p| p.len()), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_typed_replies() {
    let (rpc, mut peer) = connected_rpc().await;

    let (tx, rx) = oneshot::channel();
    let id = rpc.send_get_current_player(move |reply: RpcResponse<RespPlayer>| {
        let _ = tx.send(reply);
    });
    let request = peer.recv_request().await;
    assert_eq!(request["id"], json!(id));
    peer.reply(
        &request["id"],
        json!({ "id": "p-1", "uid": "u-1", "display_name": "Fiona", "avatar_url": "" }),
    );

    let reply = rx.await.unwrap();
    assert!(reply.is_success());
    assert_eq!(reply.method.as_deref(), Some("PlayerInfo.GetCurrentPlayer"));
    assert_eq!(reply.result.unwrap().display_name, "Fiona");

    let (tx, rx) = oneshot::channel();
    rpc.send_competition_get_latest("c-1", move |reply| {
        let _ = tx.send(reply);
    });
    let request = peer.recv_request().await;
    peer.reply(
        &request["id"],
        json!({ "competition": { "id": "c-1", "update_serial": 8, "meta": { "mode": "mtt" } } }),
    );
    let reply: RpcResponse<RespCompetitionGetLatest> = rx.await.unwrap();
    let competition = reply.result.and_then(|r| r.competition).unwrap();
    assert_eq!(competition.update_serial, 8);
    assert_eq!(competition.meta.mode, "mtt");
}

#[tokio::test(start_paused = true)]
async fn test_send_while_disconnected_fails_synchronously() {
    let (rpc, _peer) = connected_rpc().await;
    rpc.disconnect(true);
    wait_for(|| !rpc.is_connected()).await;

    let outcome = Arc::new(Mutex::new(None));
    let sink = outcome.clone();
    rpc.send_list_games(move |reply| {
        *sink.lock() = Some((reply.id, reply.error_code()));
    });
    assert_eq!(*outcome.lock(), Some((-1, Some(503))));
}

#[tokio::test(start_paused = true)]
async fn test_typed_notifications() {
    let (rpc, peer) = connected_rpc().await;

    let tables = Arc::new(Mutex::new(Vec::<Table>::new()));
    let sink = tables.clone();
    rpc.set_on_table(move |table| sink.lock().push(table));

    let modes = Arc::new(Mutex::new(Vec::<AutoModeUpdated>::new()));
    let sink = modes.clone();
    rpc.set_on_auto_mode(move |update| sink.lock().push(update));
    rpc.rpc().stats().await.unwrap();

    // Wrong type for `id`: dropped without affecting the stream
    peer.notify(EVENT_TABLE_UPDATED, json!({ "update_serial": 1, "id": 42 }));
    peer.notify(EVENT_TABLE_UPDATED, json!({ "update_serial": 3, "id": "t-1" }));
    peer.notify(EVENT_TABLE_UPDATED, json!({ "update_serial": 2, "id": "t-1" }));
    peer.notify(
        EVENT_AUTO_MODE_UPDATED,
        json!({ "competition_id": "c-1", "table_id": "t-1", "is_on": true }),
    );

    wait_for(|| tables.lock().len() == 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let serials: Vec<i64> = tables.lock().iter().map(|t| t.update_serial).collect();
    assert_eq!(serials, vec![2, 3]);
    assert_eq!(modes.lock().len(), 1);
    assert!(modes.lock()[0].is_on);

    rpc.clear_on_table();
    rpc.rpc().stats().await.unwrap();
    peer.notify(EVENT_TABLE_UPDATED, json!({ "update_serial": 4, "id": "t-1" }));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(tables.lock().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_tracker_follows_focused_competition() {
    let (rpc, peer) = connected_rpc().await;

    let tracker = MatchTracker::new();
    tracker.focus("c-1", None);
    tracker.attach(&rpc);
    rpc.rpc().stats().await.unwrap();

    peer.notify(EVENT_COMPETITION_UPDATED, json!({ "id": "c-1", "update_serial": 1 }));
    peer.notify(EVENT_COMPETITION_UPDATED, json!({ "id": "c-2", "update_serial": 50 }));
    peer.notify(EVENT_COMPETITION_UPDATED, json!({ "id": "c-1", "update_serial": 4 }));

    wait_for(|| tracker.serials().0 == Some(4)).await;
    assert_eq!(tracker.competition().map(|c| c.id), Some("c-1".to_string()));

    // Stale serial arriving later is not applied
    assert_eq!(
        tracker.apply_competition(pwb::Competition {
            id: "c-1".into(),
            update_serial: 2,
            ..Default::default()
        }),
        Some(SerialCheck::Backwards)
    );
    assert_eq!(tracker.serials().0, Some(4));
}
