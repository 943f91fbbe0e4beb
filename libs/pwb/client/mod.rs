//! PWB client
//!
//! [`PokerRpc`] turns the remote methods into typed calls and the
//! notification streams into typed callbacks. [`MatchTracker`] keeps the
//! latest competition and table snapshots, checked with [`SerialWatch`].

mod poker_rpc;
mod serial_watch;
mod tracker;

pub use poker_rpc::{Ack, PokerRpc};
pub use serial_watch::{SerialCheck, SerialWatch};
pub use tracker::{MatchSnapshot, MatchTracker};
