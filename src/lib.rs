//! PWB client - Main Library
//!
//! Composition root for the PWB poker client binaries.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, runners)
//! - **pwb**: Domain facade, models and configuration (re-exported from workspace)
//! - **hyperrpc**: JSON-RPC over WebSocket client (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use pwb_client::bin_common::{load_settings, ConfigType};
//! use pwb_client::pwb::PokerRpc;
//! ```

// Re-export workspace libraries for convenience
pub use hyperrpc;
pub use pwb;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, load_settings, parse_args, ConfigType};
    pub use runner::{BinaryRunner, RunConfig};
}
