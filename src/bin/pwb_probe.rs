//! Connection probe for the PWB client-agent
//!
//! Connects, authenticates when a token is available, announces readiness
//! and reports latency, clock offset and connection metrics until Ctrl+C.
//! With a competition id (and optionally a table id) it also subscribes to
//! that competition and tracks its updates.
//!
//! Usage:
//!   cargo run --bin pwb_probe -- [competition_id [table_id]]
//!
//! Environment variables:
//!   CONFIG_PATH - config file (default: config.yaml)
//!   PWB_TOKEN - auth token (optional)
//!   PWB_SOCKET_URL - overrides socket_url

use anyhow::Result;
use hyperrpc::RpcResponse;
use pwb::domain::ReqUpdateCompetitionEventSubscribeStates;
use pwb::{ClientSettings, MatchTracker, PokerRpc, ShutdownManager};
use pwb_client::bin_common::{load_settings, parse_args, BinaryRunner, ConfigType, RunConfig};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

struct ProbeApp {
    run_config: RunConfig,
    settings: ClientSettings,
    competition_id: Option<String>,
    table_id: Option<String>,
    shutdown: ShutdownManager,
    tracker: MatchTracker,
    rpc: Option<PokerRpc>,
}

impl ProbeApp {
    fn new(settings: ClientSettings, args: Vec<String>) -> Self {
        let mut args = args.into_iter();
        Self {
            run_config: RunConfig::new("PWB Probe"),
            settings,
            competition_id: args.next(),
            table_id: args.next(),
            shutdown: ShutdownManager::new(),
            tracker: MatchTracker::new(),
            rpc: None,
        }
    }

    fn on_open(&self, rpc: &PokerRpc) {
        let token = self.settings.token.clone();
        let competition_id = self.competition_id.clone();
        let table_id = self.table_id.clone();
        let handle = rpc.clone();

        rpc.add_on_open(Arc::new(move || {
            // Runs on every (re)connect; the server session starts empty
            if let Some(token) = &token {
                handle.send_authenticate(token, log_failure);
            }
            handle.send_ready(log_failure);

            if let Some(competition_id) = &competition_id {
                handle.send_update_competition_event_subscribe_states(
                    &ReqUpdateCompetitionEventSubscribeStates::single(competition_id.as_str(), true),
                    log_failure,
                );
                handle.send_competition_get_latest(competition_id, |reply| {
                    if let Some(competition) = reply.result.and_then(|r| r.competition) {
                        info!(
                            "Competition {} at serial {}",
                            competition.id, competition.update_serial
                        );
                    }
                });
                if let Some(table_id) = &table_id {
                    handle.send_table_get_latest(competition_id, table_id, |reply| {
                        if let Some(table) = reply.result.and_then(|r| r.table) {
                            info!("Table {} at serial {}", table.id, table.update_serial);
                        }
                    });
                }
            }
        }));

        rpc.add_on_close(Arc::new(|code: u16| {
            warn!("Connection closed with code {}", code);
        }));
    }

    fn log_status(&self, rpc: &PokerRpc) {
        let metrics = rpc.rpc().metrics();
        let jitter = self
            .tracker
            .jitter()
            .map(|j| format!("{}ms ({:?})", j.delay_ms, j.rate))
            .unwrap_or_else(|| "-".to_string());
        let (competition_serial, table_serial) = self.tracker.serials();

        info!(
            "{:?} | jitter {} | offset {}ms | sent {} recv {} | reconnects {} | serials {:?}/{:?}",
            metrics.connection_state,
            jitter,
            rpc.clock_offset_ms(),
            metrics.messages_sent,
            metrics.messages_received,
            metrics.reconnect_count,
            competition_serial,
            table_serial,
        );
    }
}

fn log_failure(reply: RpcResponse<Value>) {
    if let Some(error) = &reply.error {
        warn!(
            "{} failed: {}",
            reply.method.as_deref().unwrap_or("request"),
            error
        );
    }
}

impl BinaryRunner for ProbeApp {
    async fn run(&mut self) -> Result<()> {
        // Listeners go in before the first open
        let client = self.settings.client_builder().auto_connect(false).build().await?;
        let rpc = PokerRpc::new(client);

        if let Some(competition_id) = &self.competition_id {
            self.tracker.focus(competition_id.clone(), self.table_id.clone());
        }
        self.tracker.attach(&rpc);
        self.on_open(&rpc);
        self.rpc = Some(rpc.clone());
        rpc.connect();

        while self
            .shutdown
            .interruptible_sleep(self.run_config.status_interval())
            .await
        {
            self.log_status(&rpc);
        }

        rpc.shutdown().await?;
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }

    fn shutdown(&self) -> &ShutdownManager {
        &self.shutdown
    }

    fn summary(&self) -> Option<String> {
        let metrics = self.rpc.as_ref()?.rpc().metrics();
        Some(format!(
            "Messages sent: {}, received: {}, reconnects: {}",
            metrics.messages_sent, metrics.messages_received, metrics.reconnect_count
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = load_settings(ConfigType::Client)?;
    pwb::init_tracing(&settings.log_level);
    settings.log();

    let mut app = ProbeApp::new(settings, parse_args());
    app.execute().await
}
