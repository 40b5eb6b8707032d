//! Warble call-audio core logic
//!
//! This crate contains the pure state machine logic for one Warble audio
//! call: packet demultiplexing, the auth handshake, the realtime cadence
//! with clock-offset echo, and the reliable fragmented data channel. It is
//! completely decoupled from I/O, enabling deterministic testing.
//!
//! # Architecture: "The Hollow Shell"
//!
//! Session logic is strictly separated from transport concerns:
//!
//! ```text
//!      ┌───────────────────────────┐
//!      │ warble-core               │
//!      │ - Call session machine    │
//!      │ - Ack tracker             │
//!      │ - Fragment reassembly     │
//!      └───────────────────────────┘
//!         ↓                     ↓
//! ┌─────────────────┐  ┌─────────────────┐
//! │ warble-harness  │  │ production app  │
//! │ - Virtual time  │  │ - Websocket     │
//! │ - Seeded RNG    │  │ - System clock  │
//! │ - Script driver │  │ - Event loop    │
//! └─────────────────┘  └─────────────────┘
//! ```
//!
//! # Key Principles
//!
//! - No I/O in Core: Never call `std::time::Instant::now()` or
//!   `rand::thread_rng()` directly
//! - Environment Trait: Time and randomness go through the `Environment`
//!   trait
//! - Deterministic: Given the same inputs and environment state, produce the
//!   same outputs
//!
//! # Modules
//!
//! - [`session`]: Call session state machine (handshake, cadence, teardown)
//! - [`realtime`]: Outbound realtime sequencing and clock-offset echo
//! - [`reliability`]: Selective-ack tracking for the data channel
//! - [`reassembly`]: Byte-range reassembly of fragmented messages
//! - [`env`]: Environment abstraction (time, RNG)
//! - [`transport`]: Transport abstraction (connect, disconnect, send)
//! - [`stats`]: Participant level reporting
//! - [`error`]: Session error types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod realtime;
pub mod reassembly;
pub mod reliability;
pub mod session;
pub mod stats;
pub mod transport;
