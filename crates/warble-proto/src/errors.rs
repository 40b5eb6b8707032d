//! Error types for the warble wire protocol.
//!
//! All errors are structured, testable, and provide actionable information.

use thiserror::Error;

/// Protocol-level errors that can occur during packet parsing and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    // Packet parsing errors
    /// Packet is shorter than the header size
    #[error("packet too short: expected at least {expected} bytes, got {actual}")]
    PacketTooShort {
        /// Expected minimum size in bytes
        expected: usize,
        /// Actual size received
        actual: usize,
    },

    /// Declared length in the header doesn't match the datagram length
    #[error("packet length mismatch: header declares {declared} bytes, got {actual}")]
    LengthMismatch {
        /// Total length declared in the header
        declared: usize,
        /// Actual datagram length
        actual: usize,
    },

    /// Packet would exceed the 16-bit length field
    #[error("packet too large: {size} bytes exceeds maximum {max}")]
    PacketTooLarge {
        /// Actual packet size including header
        size: usize,
        /// Maximum encodable size
        max: usize,
    },

    // CBOR errors (wrapped for testability)
    /// Failed to encode a message body as CBOR
    #[error("failed to encode CBOR: {0}")]
    CborEncode(String),

    /// Failed to decode a CBOR message body
    #[error("failed to decode CBOR: {0}")]
    CborDecode(String),

    // Validation errors
    /// Unknown message kind
    #[error("unknown message kind: {0:#06x}")]
    UnknownKind(u16),
}

/// Convenient Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
