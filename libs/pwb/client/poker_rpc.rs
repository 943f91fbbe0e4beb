//! Typed facade over the PWB client-agent methods
//!
//! Every `send_*` builds the positional params the server expects and
//! forwards to [`RpcClient::send`], so the callback contract is the same:
//! it runs exactly once, with a 503 (id -1) when disconnected, a 408 on
//! timeout, or the decoded reply.

use crate::config::ClientSettings;
use crate::domain::*;
use hyperrpc::{
    CloseListener, ErrorListener, Jitter, ListenerId, OpenListener, RpcClient, RpcError,
    RpcResponse,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reply of methods whose result carries nothing the client reads
pub type Ack = RpcResponse<Value>;

/// Domain RPC helper bound to one connection
#[derive(Clone)]
pub struct PokerRpc {
    client: RpcClient,
}

impl PokerRpc {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }

    /// Build and connect a client from settings
    pub async fn connect_with(settings: &ClientSettings) -> hyperrpc::Result<Self> {
        let client = settings.client_builder().build().await?;
        Ok(Self::new(client))
    }

    /// Underlying JSON-RPC client
    pub fn rpc(&self) -> &RpcClient {
        &self.client
    }

    // ========================================================================
    // Auth
    // ========================================================================

    pub fn send_authenticate<F>(&self, token: &str, callback: F) -> u64
    where
        F: FnOnce(Ack) + Send + 'static,
    {
        self.client
            .send("Auth.Authenticate", vec![json!(token)], callback)
    }

    // ========================================================================
    // System
    // ========================================================================

    /// Tell the server the client is ready, then refresh the clock offset
    pub fn send_ready<F>(&self, callback: F) -> u64
    where
        F: FnOnce(Ack) + Send + 'static,
    {
        let id = self.client.send("System.Ready", vec![], callback);
        self.client.deep_ping();
        id
    }

    // ========================================================================
    // PlayerInfo
    // ========================================================================

    pub fn send_get_current_player<F>(&self, callback: F) -> u64
    where
        F: FnOnce(RpcResponse<RespPlayer>) + Send + 'static,
    {
        self.client
            .send("PlayerInfo.GetCurrentPlayer", vec![], callback)
    }

    pub fn send_get_player_latest_data<F>(&self, callback: F) -> u64
    where
        F: FnOnce(RpcResponse<RespGetPlayerLatest>) + Send + 'static,
    {
        self.client
            .send("PlayerInfo.GetPlayerLatestData", vec![], callback)
    }

    /// Look a player up by id or uid; a missing key is sent as ""
    pub fn send_get_player<F>(&self, id: Option<&str>, uid: Option<&str>, callback: F) -> u64
    where
        F: FnOnce(RpcResponse<RespPlayer>) + Send + 'static,
    {
        self.client.send(
            "PlayerInfo.GetPlayer",
            vec![json!(id.unwrap_or("")), json!(uid.unwrap_or(""))],
            callback,
        )
    }

    // ========================================================================
    // Game
    // ========================================================================

    pub fn send_list_games<F>(&self, callback: F) -> u64
    where
        F: FnOnce(RpcResponse<RespListGame>) + Send + 'static,
    {
        self.client.send("Game.ListGames", vec![], callback)
    }

    pub fn send_list_game_levels<F>(
        &self,
        page: i32,
        limit: i32,
        game_category_id: &str,
        callback: F,
    ) -> u64
    where
        F: FnOnce(RpcResponse<RespListGameLevels>) + Send + 'static,
    {
        self.client.send(
            "Game.ListGameLevels",
            vec![json!(page), json!(limit), json!(game_category_id)],
            callback,
        )
    }

    /// The filter travels as one JSON-encoded string param
    pub fn send_list_competitions<F>(&self, req: &ReqListCompetitions, callback: F) -> u64
    where
        F: FnOnce(RpcResponse<RespListCompetitions>) + Send + 'static,
    {
        self.send_encoded("Game.ListCompetitions", vec![], req, callback)
    }

    pub fn send_list_player_active_competitions<F>(&self, callback: F) -> u64
    where
        F: FnOnce(RpcResponse<RespListPlayerActiveCompetitions>) + Send + 'static,
    {
        self.client
            .send("Game.ListPlayerActiveCompetitions", vec![], callback)
    }

    // ========================================================================
    // Match
    // ========================================================================

    /// Buy into a cash competition; the location may be empty
    pub fn send_competition_cash_buy_in<F>(
        &self,
        competition_id: &str,
        cpp: &str,
        latitude: &str,
        longitude: &str,
        callback: F,
    ) -> u64
    where
        F: FnOnce(Ack) + Send + 'static,
    {
        self.client.send(
            "Match.CompetitionCashBuyIn",
            vec![
                json!(competition_id),
                json!(cpp),
                json!(latitude),
                json!(longitude),
            ],
            callback,
        )
    }

    pub fn send_competition_cash_out<F>(&self, competition_id: &str, table_id: &str, callback: F) -> u64
    where
        F: FnOnce(Ack) + Send + 'static,
    {
        self.client.send(
            "Match.CompetitionCashOut",
            vec![json!(competition_id), json!(table_id)],
            callback,
        )
    }

    /// Subscribe to (or drop) competition events; sent as a JSON string param
    pub fn send_update_competition_event_subscribe_states<F>(
        &self,
        req: &ReqUpdateCompetitionEventSubscribeStates,
        callback: F,
    ) -> u64
    where
        F: FnOnce(Ack) + Send + 'static,
    {
        self.send_encoded(
            "Match.UpdateCompetitionEventSubscribeStates",
            vec![],
            req,
            callback,
        )
    }

    pub fn send_competition_get_latest<F>(&self, competition_id: &str, callback: F) -> u64
    where
        F: FnOnce(RpcResponse<RespCompetitionGetLatest>) + Send + 'static,
    {
        self.client.send(
            "Match.CompetitionGetLatest",
            vec![json!(competition_id)],
            callback,
        )
    }

    pub fn send_table_get_latest<F>(&self, competition_id: &str, table_id: &str, callback: F) -> u64
    where
        F: FnOnce(RpcResponse<RespTableGetLatest>) + Send + 'static,
    {
        self.client.send(
            "Match.TableGetLatest",
            vec![json!(competition_id), json!(table_id)],
            callback,
        )
    }

    pub fn send_table_join<F>(
        &self,
        competition_id: &str,
        table_id: &str,
        latitude: &str,
        longitude: &str,
        callback: F,
    ) -> u64
    where
        F: FnOnce(Ack) + Send + 'static,
    {
        self.client.send(
            "Match.TableJoin",
            vec![
                json!(competition_id),
                json!(table_id),
                json!(latitude),
                json!(longitude),
            ],
            callback,
        )
    }

    pub fn send_table_leave<F>(&self, competition_id: &str, table_id: &str, callback: F) -> u64
    where
        F: FnOnce(Ack) + Send + 'static,
    {
        self.client.send(
            "Match.TableLeave",
            vec![json!(competition_id), json!(table_id)],
            callback,
        )
    }

    pub fn send_game_player_ready<F>(&self, competition_id: &str, table_id: &str, callback: F) -> u64
    where
        F: FnOnce(Ack) + Send + 'static,
    {
        self.client.send(
            "Match.GamePlayerReady",
            vec![json!(competition_id), json!(table_id)],
            callback,
        )
    }

    pub fn send_game_player_wager<F>(
        &self,
        competition_id: &str,
        table_id: &str,
        action: PlayerAction,
        chips: i64,
        callback: F,
    ) -> u64
    where
        F: FnOnce(Ack) + Send + 'static,
    {
        self.client.send(
            "Match.GamePlayerWager",
            vec![
                json!(competition_id),
                json!(table_id),
                json!(action.as_str()),
                json!(chips),
            ],
            callback,
        )
    }

    pub fn send_game_player_auto_mode<F>(
        &self,
        competition_id: &str,
        table_id: &str,
        is_on: bool,
        callback: F,
    ) -> u64
    where
        F: FnOnce(Ack) + Send + 'static,
    {
        self.client.send(
            "Match.GamePlayerAutoMode",
            vec![json!(competition_id), json!(table_id), json!(is_on)],
            callback,
        )
    }

    /// Send `params` followed by `body` encoded as a JSON string
    ///
    /// Returns 0 if `body` cannot be encoded; the callback then gets a 503.
    fn send_encoded<T, B, F>(&self, method: &str, mut params: Vec<Value>, body: &B, callback: F) -> u64
    where
        T: DeserializeOwned + 'static,
        B: Serialize,
        F: FnOnce(RpcResponse<T>) + Send + 'static,
    {
        match serde_json::to_string(body) {
            Ok(encoded) => {
                params.push(Value::String(encoded));
                self.client.send(method, params, callback)
            }
            Err(e) => {
                warn!("Failed to encode {} body: {}", method, e);
                callback(RpcResponse::failure(method, RpcError::send_failed(e)));
                0
            }
        }
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Competition updates, released in update-serial order
    pub fn set_on_competition<F>(&self, handler: F)
    where
        F: FnMut(Competition) + Send + 'static,
    {
        self.set_typed_handler(EVENT_COMPETITION_UPDATED, handler);
    }

    /// Table updates, released in update-serial order
    pub fn set_on_table<F>(&self, handler: F)
    where
        F: FnMut(Table) + Send + 'static,
    {
        self.set_typed_handler(EVENT_TABLE_UPDATED, handler);
    }

    /// Auto-mode changes, delivered as they arrive
    pub fn set_on_auto_mode<F>(&self, handler: F)
    where
        F: FnMut(AutoModeUpdated) + Send + 'static,
    {
        self.set_typed_handler(EVENT_AUTO_MODE_UPDATED, handler);
    }

    pub fn clear_on_competition(&self) {
        self.client.clear_stream_handler(EVENT_COMPETITION_UPDATED);
    }

    pub fn clear_on_table(&self) {
        self.client.clear_stream_handler(EVENT_TABLE_UPDATED);
    }

    pub fn clear_on_auto_mode(&self) {
        self.client.clear_stream_handler(EVENT_AUTO_MODE_UPDATED);
    }

    fn set_typed_handler<T, F>(&self, event_name: &'static str, mut handler: F)
    where
        T: DeserializeOwned,
        F: FnMut(T) + Send + 'static,
    {
        self.client
            .set_stream_handler(event_name, move |event| {
                match serde_json::from_value::<T>(event) {
                    Ok(update) => handler(update),
                    Err(e) => debug!("Dropping malformed {} event: {}", event_name, e),
                }
            });
    }

    // ========================================================================
    // Connection pass-throughs
    // ========================================================================

    pub fn set_on_jitter<F>(&self, handler: F)
    where
        F: FnMut(Jitter) + Send + 'static,
    {
        self.client.set_on_jitter(handler);
    }

    pub fn clear_on_jitter(&self) {
        self.client.clear_on_jitter();
    }

    /// Server clock minus local clock, in milliseconds
    pub fn clock_offset_ms(&self) -> i64 {
        self.client.clock_offset_ms()
    }

    /// Current server time estimated from the local clock
    pub fn server_now_ms(&self) -> i64 {
        self.client
            .clock_offset()
            .local_to_server(chrono::Utc::now().timestamp_millis())
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    pub fn connect(&self) {
        self.client.connect();
    }

    pub fn disconnect(&self, manual: bool) {
        self.client.disconnect(manual);
    }

    /// Leave the current scene: abandon pending calls and held events
    pub fn reset_context(&self) {
        self.client.reset_context();
    }

    pub fn stop_probe(&self) {
        self.client.stop_probe();
    }

    pub fn add_on_open(&self, listener: Arc<OpenListener>) -> ListenerId {
        self.client.add_on_open(listener)
    }

    pub fn remove_on_open(&self, id: ListenerId) -> bool {
        self.client.remove_on_open(id)
    }

    pub fn add_on_error(&self, listener: Arc<ErrorListener>) -> ListenerId {
        self.client.add_on_error(listener)
    }

    pub fn remove_on_error(&self, id: ListenerId) -> bool {
        self.client.remove_on_error(id)
    }

    pub fn add_on_close(&self, listener: Arc<CloseListener>) -> ListenerId {
        self.client.add_on_close(listener)
    }

    pub fn remove_on_close(&self, id: ListenerId) -> bool {
        self.client.remove_on_close(id)
    }

    pub async fn shutdown(&self) -> hyperrpc::Result<()> {
        self.client.shutdown().await
    }
}
