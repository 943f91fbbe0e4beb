//! Integration tests for notification delivery
//!
//! Buffered streams release events in update-serial order, one per drain
//! tick. Immediate streams hand events over as they arrive.

mod common;

use common::*;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn serials(events: &Arc<Mutex<Vec<Value>>>) -> Vec<i64> {
    events
        .lock()
        .iter()
        .map(|e| e["update_serial"].as_i64().unwrap())
        .collect()
}

fn recorder() -> (Arc<Mutex<Vec<Value>>>, impl FnMut(Value) + Send + 'static) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    (events, move |event: Value| sink.lock().push(event))
}

#[tokio::test(start_paused = true)]
async fn test_buffered_stream_releases_smallest_serial_first() {
    verbose_println!("Testing serial ordering of a burst...");

    let (client, peer, _acceptor, _connector) = connected_client().await;
    let (events, handler) = recorder();
    client.set_stream_handler("table_updated", handler);
    settle(&client).await;

    for serial in [5, 3, 4] {
        peer.notify("table_updated", json!({ "update_serial": serial, "table_id": "t-1" }));
    }

    wait_for(|| events.lock().len() == 3).await;
    verbose_println!("  Delivered: {:?}", serials(&events));
    assert_eq!(serials(&events), vec![3, 4, 5]);
    assert_eq!(client.stats().await.unwrap().buffered_events, 0);
}

#[tokio::test(start_paused = true)]
async fn test_buffered_stream_releases_one_event_per_tick() {
    let (client, peer, _acceptor, _connector) = connected_client().await;
    let (events, handler) = recorder();
    client.set_stream_handler("table_updated", handler);
    settle(&client).await;

    peer.notify("table_updated", json!({ "update_serial": 2 }));
    peer.notify("table_updated", json!({ "update_serial": 1 }));
    peer.notify("table_updated", json!({ "update_serial": 3 }));
    flush(&client).await;
    assert!(events.lock().is_empty(), "nothing before the first tick");
    assert_eq!(client.stats().await.unwrap().buffered_events, 3);

    tokio::time::sleep(Duration::from_millis(11)).await;
    settle(&client).await;
    assert_eq!(serials(&events), vec![1]);

    tokio::time::sleep(Duration::from_millis(10)).await;
    settle(&client).await;
    assert_eq!(serials(&events), vec![1, 2]);

    // Late arrival joins the running cycle
    peer.notify("table_updated", json!({ "update_serial": 0 }));
    tokio::time::sleep(Duration::from_millis(30)).await;
    settle(&client).await;
    assert_eq!(serials(&events), vec![1, 2, 0, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_buffered_event_without_serial_is_dropped() {
    let (client, peer, _acceptor, _connector) = connected_client().await;
    let (events, handler) = recorder();
    client.set_stream_handler("table_updated", handler);
    settle(&client).await;

    peer.notify("table_updated", json!({ "table_id": "t-1" }));
    peer.notify("table_updated", json!({ "update_serial": 9 }));

    wait_for(|| events.lock().len() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(serials(&events), vec![9]);
}

#[tokio::test(start_paused = true)]
async fn test_immediate_stream_keeps_arrival_order() {
    let (client, peer, _acceptor, _connector) = connected_client().await;
    let (events, handler) = recorder();
    client.set_stream_handler("game_player_auto_mode_updated", handler);
    settle(&client).await;

    peer.notify("game_player_auto_mode_updated", json!({ "update_serial": 2, "is_on": true }));
    peer.notify("game_player_auto_mode_updated", json!({ "update_serial": 1, "is_on": false }));

    wait_for(|| events.lock().len() == 2).await;
    assert_eq!(serials(&events), vec![2, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribed_and_malformed_notifications_are_dropped() {
    let (client, peer, _acceptor, _connector) = connected_client().await;
    let (events, handler) = recorder();
    client.set_stream_handler("table_updated", handler);
    settle(&client).await;

    // Declared stream without a subscriber
    peer.notify("game_player_auto_mode_updated", json!({ "is_on": true }));
    // Undeclared stream
    peer.notify("competition_updated", json!({ "update_serial": 1 }));
    // Missing nested event
    peer.send_text(r#"{"jsonrpc":"2.0","id":0,"result":{"event_name":"table_updated"}}"#);
    // Not JSON at all
    peer.send_text("garbage");
    peer.notify("table_updated", json!({ "update_serial": 7 }));

    wait_for(|| events.lock().len() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(serials(&events), vec![7]);
    assert!(client.is_connected(), "bad frames never close the connection");
}

#[tokio::test(start_paused = true)]
async fn test_buffered_stream_holds_events_without_subscriber() {
    let (client, peer, _acceptor, _connector) = connected_client().await;

    peer.notify("table_updated", json!({ "update_serial": 2 }));
    peer.notify("table_updated", json!({ "update_serial": 1 }));
    flush(&client).await;
    assert_eq!(client.stats().await.unwrap().buffered_events, 2);

    // Drain ticks run with nobody listening and empty the buffer
    tokio::time::sleep(Duration::from_millis(50)).await;
    let stats = client.stats().await.unwrap();
    assert_eq!(stats.buffered_events, 0);
    assert_eq!(stats.live_timers, 1, "drain ticker stopped, probe tick left");
    assert!(client.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_handler_added_later_is_delivered_immediately() {
    let (client, peer, _acceptor, _connector) = connected_client().await;
    let (events, handler) = recorder();
    client.set_stream_handler("competition_updated", handler);
    settle(&client).await;

    peer.notify("competition_updated", json!({ "update_serial": 4 }));
    wait_for(|| events.lock().len() == 1).await;

    client.clear_stream_handler("competition_updated");
    flush(&client).await;
    peer.notify("competition_updated", json!({ "update_serial": 5 }));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(serials(&events), vec![4]);
}

#[tokio::test(start_paused = true)]
async fn test_reset_context_discards_held_events() {
    let (client, peer, _acceptor, _connector) = connected_client().await;
    let (events, handler) = recorder();
    client.set_stream_handler("table_updated", handler);
    settle(&client).await;

    peer.notify("table_updated", json!({ "update_serial": 1 }));
    peer.notify("table_updated", json!({ "update_serial": 2 }));
    flush(&client).await;
    assert_eq!(client.stats().await.unwrap().buffered_events, 2);

    client.reset_context();
    settle(&client).await;
    assert_eq!(client.stats().await.unwrap().buffered_events, 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(events.lock().is_empty());

    // Stream keeps working after the reset
    peer.notify("table_updated", json!({ "update_serial": 3 }));
    wait_for(|| events.lock().len() == 1).await;
    assert_eq!(serials(&events), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn test_connection_loss_discards_held_events() {
    let (client, peer, mut acceptor, _connector) = connected_client().await;
    let (events, handler) = recorder();
    client.set_stream_handler("table_updated", handler);
    settle(&client).await;

    peer.notify("table_updated", json!({ "update_serial": 1 }));
    peer.close(1006);
    let _peer = acceptor.accept().await;
    settle(&client).await;

    assert!(events.lock().is_empty());
    assert_eq!(client.stats().await.unwrap().buffered_events, 0);
}
