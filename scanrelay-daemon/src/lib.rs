//! scanrelay daemon library.
//!
//! Exposes the process wiring for integration testing.
//! In production, `scanrelay` is used as a binary (main.rs).

pub mod cli;
pub mod enqueue;
pub mod exporter;
pub mod logging;
pub mod metrics_server;
pub mod runtime;
