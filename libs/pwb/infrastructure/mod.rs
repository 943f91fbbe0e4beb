//! Infrastructure Layer
//!
//! Process-wide concerns shared by the binaries.

pub mod logging;

pub use logging::init_tracing;
