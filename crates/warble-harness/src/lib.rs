//! Deterministic simulation harness for warble call-session testing.
//!
//! This crate provides a virtual-clock implementation of the `Environment`
//! trait, a recording implementation of the `CallTransport` trait, and a
//! driver that executes session actions the way the production event loop
//! would, enabling deterministic, reproducible testing of whole call
//! scripts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod driver;
pub mod server;
pub mod sim_env;

pub use driver::{CallDriver, RecordingStats, RecordingTransport};
pub use sim_env::SimEnv;
