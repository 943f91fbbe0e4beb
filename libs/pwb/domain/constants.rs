//! Service constants: endpoint, stream names and string enums
//!
//! Model fields keep the raw strings sent by the server; these enums are
//! for comparing against them and for building requests.

use serde::{Deserialize, Serialize};

/// Development client-agent endpoint
pub const DEFAULT_SOCKET_URL: &str = "wss://dev.cyberpoker.online/v1/client-agent";

// Notification streams
pub const EVENT_COMPETITION_UPDATED: &str = "competition_updated";
pub const EVENT_TABLE_UPDATED: &str = "table_updated";
pub const EVENT_AUTO_MODE_UPDATED: &str = "game_player_auto_mode_updated";

/// Action sent to mark a player ready for the next hand
pub const PLAYER_ACTION_READY: &str = "ready";

/// Player status inside a competition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    WaitingTableBalancing,
    Playing,
    /// Out of the table, waiting to re-buy
    ReBuyWaiting,
    Knockout,
    /// Leaving a cash table at settlement
    CashLeaving,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::WaitingTableBalancing => "waiting_table_balancing",
            PlayerStatus::Playing => "playing",
            PlayerStatus::ReBuyWaiting => "re_buy_waiting",
            PlayerStatus::Knockout => "knockout",
            PlayerStatus::CashLeaving => "cash_leaving",
        }
    }
}

/// Competition mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionMode {
    Ct,  // Countdown tournament
    Mtt, // Multi-table tournament
    Cash,
}

impl CompetitionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitionMode::Ct => "ct",
            CompetitionMode::Mtt => "mtt",
            CompetitionMode::Cash => "cash",
        }
    }
}

/// Competition lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionStatus {
    #[serde(rename = "pre-registering")]
    PreRegistering,
    Registering,
    DelayedBuyIn,
    StoppedBuyIn,
    End,
    /// Closed automatically after failing to start
    AutoEnd,
    ForceEnd,
    /// Migrating during a graceful shutdown
    Restoring,
}

impl CompetitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitionStatus::PreRegistering => "pre-registering",
            CompetitionStatus::Registering => "registering",
            CompetitionStatus::DelayedBuyIn => "delayed_buy_in",
            CompetitionStatus::StoppedBuyIn => "stopped_buy_in",
            CompetitionStatus::End => "end",
            CompetitionStatus::AutoEnd => "auto_end",
            CompetitionStatus::ForceEnd => "force_end",
            CompetitionStatus::Restoring => "restoring",
        }
    }

    /// True for the three closed states
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            CompetitionStatus::End | CompetitionStatus::AutoEnd | CompetitionStatus::ForceEnd
        )
    }
}

/// Table status; the `TableGame*` variants track the hand in progress
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    TableCreated,
    TablePausing,
    TableRestoring,
    TableBalancing,
    TableClosed,
    TableGameOpened,
    TableGamePlaying,
    TableGameSettled,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::TableCreated => "table_created",
            TableStatus::TablePausing => "table_pausing",
            TableStatus::TableRestoring => "table_restoring",
            TableStatus::TableBalancing => "table_balancing",
            TableStatus::TableClosed => "table_closed",
            TableStatus::TableGameOpened => "table_game_opened",
            TableStatus::TableGamePlaying => "table_game_playing",
            TableStatus::TableGameSettled => "table_game_settled",
        }
    }
}

/// `status.current_event` of a hand
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GameEvent {
    ReadyRequested,
    BlindsRequested,
    RoundStarted,
    RoundClosed,
    GameClosed,
}

impl GameEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameEvent::ReadyRequested => "ReadyRequested",
            GameEvent::BlindsRequested => "BlindsRequested",
            GameEvent::RoundStarted => "RoundStarted",
            GameEvent::RoundClosed => "RoundClosed",
            GameEvent::GameClosed => "GameClosed",
        }
    }
}

/// Wager action of `Match.GamePlayerWager`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlayerAction {
    Fold,
    Call,
    Check,
    Bet,
    Raise,
    Allin,
}

impl PlayerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerAction::Fold => "fold",
            PlayerAction::Call => "call",
            PlayerAction::Check => "check",
            PlayerAction::Bet => "bet",
            PlayerAction::Raise => "raise",
            PlayerAction::Allin => "allin",
        }
    }

    /// Parse a server action string; `None` for anything else (e.g. "ready")
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fold" => Some(PlayerAction::Fold),
            "call" => Some(PlayerAction::Call),
            "check" => Some(PlayerAction::Check),
            "bet" => Some(PlayerAction::Bet),
            "raise" => Some(PlayerAction::Raise),
            "allin" => Some(PlayerAction::Allin),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
