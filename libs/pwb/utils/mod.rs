//! Common utilities for PWB binaries

mod shutdown;

pub use shutdown::ShutdownManager;
