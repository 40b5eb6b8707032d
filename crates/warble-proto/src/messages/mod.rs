//! CBOR-encoded packet bodies.
//!
//! Each message kind has a corresponding body type. The `MessageBody` enum
//! provides type-safe body handling with automatic CBOR serialization.
//!
//! # Design Rationale
//!
//! ## Why CBOR Instead of Raw Binary?
//!
//! - **Forward Compatibility**: CBOR allows adding optional fields without
//!   breaking old clients. Binary formats require version negotiation for
//!   every schema change.
//!
//! - **Everything Is Optional**: Every field of every body is optional on the
//!   wire. A receiver treats an absent field as absent information, never as a
//!   parse error. Handlers decide per field whether absence is tolerable
//!   (most telemetry) or disqualifying (data-channel sequencing fields).
//!
//! ## Security Properties
//!
//! - **Bounded Deserialization**: Packet framing bounds every body under the
//!   16-bit length field (64 KB) before CBOR parsing begins, so the parser
//!   never sees unbounded input.
//!
//! - **No Eval/Code Execution**: CBOR is a pure data format with no code
//!   execution features. Unlike JSON with prototype pollution or YAML with
//!   code execution, CBOR cannot run code.
//!
//! - **Explicit Schema**: Each body type has an explicit Rust struct
//!   definition. Unknown fields are skipped, not interpreted.

pub mod auth;
pub mod data;
pub mod realtime;
pub mod stream;

use bytes::BufMut;

use crate::{
    MessageKind, Packet,
    errors::{ProtocolError, Result},
};
pub use auth::AuthMessage;
pub use data::DataMessage;
pub use realtime::{AudioMessage, ProfileEntry, RtMessage};
pub use stream::{StreamEntry, StreamMessage};

/// All possible packet bodies
///
/// The body type is determined by the `MessageKind` in the packet header,
/// so we serialize only the inner struct content (no variant tag in CBOR).
///
/// # Invariants
///
/// - **Kind Uniqueness**: Each body variant corresponds to exactly one
///   `MessageKind`. The `kind()` method returns a unique kind for each
///   variant.
///
/// - **Serialization Consistency**: Encoding a `MessageBody` and then
///   decoding it with the same kind MUST produce an equivalent value. This is
///   verified by round-trip tests.
///
/// # Security
///
/// - **No Variant Tag**: Unlike typical Rust enum serialization, we do NOT
///   serialize the variant discriminator. The packet header's `kind` field
///   already identifies the body type. This prevents attackers from sending
///   mismatched kind/body pairs.
///
/// - **Exhaustive Matching**: All methods use exhaustive `match` statements.
///   Adding a new variant will cause compile errors in `encode()`, `decode()`,
///   and `kind()`, ensuring no variant is accidentally left unhandled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Realtime audio/telemetry exchange
    RealTime(RtMessage),
    /// Session authorization handshake
    Auth(AuthMessage),
    /// Reliable data channel fragment or acknowledgement
    Data(DataMessage),
    /// Stream-to-participant mappings
    Stream(StreamMessage),
}

impl MessageBody {
    /// Get the message kind for this body variant
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::RealTime(_) => MessageKind::RealTime,
            Self::Auth(_) => MessageKind::Auth,
            Self::Data(_) => MessageKind::Data,
            Self::Stream(_) => MessageKind::Stream,
        }
    }

    /// Encode body to buffer
    ///
    /// Serializes only the inner struct, NOT the variant tag.
    /// The packet header's kind already identifies the body type.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::CborEncode`] if serialization fails.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let mut writer = dst.writer();

        match self {
            Self::RealTime(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Auth(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Data(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Stream(inner) => ciborium::ser::into_writer(inner, &mut writer),
        }
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))
    }

    /// Decode body from bytes based on kind
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::CborDecode`] if deserialization fails.
    ///
    /// # Security
    ///
    /// Absent fields decode to `None`/empty, and unknown fields are skipped.
    /// Structural CBOR damage is the only decode failure mode; which fields
    /// are required is a per-handler decision, not a parsing one.
    pub fn decode(kind: MessageKind, bytes: &[u8]) -> Result<Self> {
        let body = match kind {
            MessageKind::RealTime => Self::RealTime(
                ciborium::de::from_reader(bytes)
                    .map_err(|e| ProtocolError::CborDecode(e.to_string()))?,
            ),
            MessageKind::Auth => Self::Auth(
                ciborium::de::from_reader(bytes)
                    .map_err(|e| ProtocolError::CborDecode(e.to_string()))?,
            ),
            MessageKind::Data => Self::Data(
                ciborium::de::from_reader(bytes)
                    .map_err(|e| ProtocolError::CborDecode(e.to_string()))?,
            ),
            MessageKind::Stream => Self::Stream(
                ciborium::de::from_reader(bytes)
                    .map_err(|e| ProtocolError::CborDecode(e.to_string()))?,
            ),
        };

        Ok(body)
    }

    /// Convert body into a transport packet
    ///
    /// This method handles the logic-to-transport conversion:
    /// - Encodes the body to CBOR bytes
    /// - Sets the matching kind in the header
    /// - Creates a Packet with automatic total_len calculation
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails or the encoded body doesn't fit
    /// the 16-bit length field.
    pub fn into_packet(self) -> Result<Packet> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Packet::new(self.kind(), buf)
    }

    /// Parse body from a raw transport packet
    ///
    /// This method handles the transport-to-logic conversion:
    /// - Extracts the kind from the packet header
    /// - Decodes the body bytes based on the kind
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The kind is unknown
    /// - CBOR deserialization fails
    pub fn from_packet(packet: &Packet) -> Result<Self> {
        let kind = packet
            .header
            .kind_enum()
            .ok_or_else(|| ProtocolError::UnknownKind(packet.header.kind()))?;
        Self::decode(kind, &packet.payload)
    }
}
