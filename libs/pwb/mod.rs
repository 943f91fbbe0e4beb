//! PWB poker client
//!
//! Typed requests and notification models for the PWB client-agent
//! service, layered on a `hyperrpc` connection.

pub mod client;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod utils;

// Re-export commonly used items
pub use client::{MatchSnapshot, MatchTracker, PokerRpc, SerialCheck, SerialWatch};
pub use config::{ClientSettings, ConfigError};
pub use domain::{
    AutoModeUpdated, Competition, CompetitionMode, CompetitionStatus, GameState, PlayerAction,
    PlayerStatus, Table, TableStatus,
};
pub use infrastructure::init_tracing;
pub use utils::ShutdownManager;
