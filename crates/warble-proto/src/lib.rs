//! # Warble Protocol: Wire Format
//!
//! This crate implements the binary framing layer for warble call-audio
//! sessions.
//!
//! ## Protocol Design
//!
//! Every datagram on the wire is a single packet with a hybrid encoding:
//! - **PacketHeader**: 4 bytes of raw binary (Big Endian) carrying the
//!   message kind and the total packet length
//! - **Body**: Variable-length CBOR-encoded structured data
//!
//! The header's `total_len` field covers the header itself, so a packet is
//! self-describing: a receiver compares the declared length against the
//! datagram length before touching the body.
//!
//! ## Message Kinds
//!
//! Four kinds share the header format and split the session into logical
//! channels:
//!
//! - [`MessageKind::RealTime`]: 100ms-cadence audio/telemetry exchange,
//!   fire-and-forget
//! - [`MessageKind::Auth`]: session authorization handshake
//! - [`MessageKind::Data`]: reliable channel carrying fragmented messages
//!   with selective acknowledgements
//! - [`MessageKind::Stream`]: stream-to-participant mappings, only ever seen
//!   as the inner body of a reassembled data-channel message
//!
//! ## Implementation Notes
//!
//! - **Zero-Copy Parsing**: We use [`zerocopy`](https://docs.rs/zerocopy) to
//!   cast network bytes directly to [`PacketHeader`] structures, so the demux
//!   decision touches no more than the 4 header bytes.
//!
//! - **CBOR for Bodies**: Every field of every body is optional on the wire.
//!   Receivers treat absent fields as absent information rather than protocol
//!   errors, which keeps the format forward compatible.
//!
//! - **Explicit Validation**: All parsing functions validate invariants and
//!   return `Result` types. There are no "unchecked" fast paths that skip
//!   validation.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod header;
pub mod kinds;
pub mod messages;
pub mod packet;

pub use errors::{ProtocolError, Result};
pub use header::PacketHeader;
pub use kinds::MessageKind;
pub use messages::MessageBody;
pub use packet::Packet;
