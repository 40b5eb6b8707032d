//! Packet type combining header and body bytes.
//!
//! A `Packet` is the transport-layer datagram consisting of:
//! - 4-byte raw binary header (Big Endian) for O(1) channel demux
//! - Variable-length raw bytes (already encoded)
//!
//! This is a pure data holder (header + bytes). For high-level logic,
//! see `MessageBody::into_packet()` and `MessageBody::from_packet()`.

use bytes::{BufMut, Bytes};

use crate::{
    MessageKind, PacketHeader,
    errors::{ProtocolError, Result},
};

/// Complete protocol packet (transport layer)
///
/// Layout on the wire:
/// `[PacketHeader: 4 bytes, raw binary] + [body: variable bytes]`
///
/// This type holds raw bytes, NOT the `MessageBody` enum. This allows the
/// session to demux packets without deserializing the body.
///
/// # Invariants
///
/// - **Size Consistency**: `header.total_len()` MUST equal
///   `PacketHeader::SIZE + payload.len()`. This invariant is enforced by
///   [`Packet::new`] and verified by [`Packet::decode`].
///
/// - **Exact Framing**: A packet occupies its datagram exactly. Decoding
///   rejects datagrams whose length differs from the declared total in either
///   direction, truncated and padded alike.
///
/// # Security
///
/// This struct provides **structural validity** only. It guarantees the
/// declared length matches the datagram. It does **NOT** guarantee that the
/// kind is known or that the body is valid CBOR; both are checked later with
/// explicit error handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet header (4 bytes)
    pub header: PacketHeader,

    /// Raw body bytes (already CBOR-encoded)
    pub payload: Bytes,
}

impl Packet {
    /// Create a new packet with automatic total_len calculation
    ///
    /// The header's `total_len` field is set to `PacketHeader::SIZE +
    /// payload.len()`, ensuring consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PacketTooLarge`] if the total length doesn't
    /// fit the 16-bit length field. This is the enforcement point for the
    /// size limit: an oversized packet can never be constructed, so encoding
    /// is infallible.
    pub fn new(kind: MessageKind, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();

        let size = PacketHeader::SIZE + payload.len();
        let total_len = u16::try_from(size)
            .map_err(|_| ProtocolError::PacketTooLarge { size, max: u16::MAX as usize })?;

        Ok(Self { header: PacketHeader::new(kind, total_len), payload })
    }

    /// Encode packet into buffer (simple copy, no magic)
    ///
    /// Writes: `[header (4 bytes)] + [body (variable)]`
    ///
    /// # Security
    ///
    /// This function performs simple memory copies with no parsing or
    /// transformation. Size limits were already enforced by [`Packet::new`].
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.payload);
    }

    /// Decode packet from wire format
    ///
    /// Returns a Packet with raw bytes (does NOT deserialize the body).
    /// Use `MessageBody::from_packet()` if you need the high-level enum.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The datagram is shorter than the 4-byte header
    /// - The declared total length differs from the datagram length
    ///
    /// # Security
    ///
    /// - **Fail Fast**: All validation happens before allocating memory for
    ///   the body. Malformed headers are rejected without copying data.
    ///
    /// - **Exact Size**: The declared length must match the datagram length
    ///   exactly. A datagram with trailing garbage is rejected rather than
    ///   silently trimmed, so two peers can never disagree about where a
    ///   packet ends.
    ///
    /// - **No Deserialization**: This function does NOT parse CBOR. It only
    ///   validates structural framing. Body deserialization happens later
    ///   with explicit error handling.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = PacketHeader::from_bytes(bytes)?;

        let declared = header.total_len() as usize;
        if declared != bytes.len() {
            return Err(ProtocolError::LengthMismatch { declared, actual: bytes.len() });
        }

        let payload = Bytes::copy_from_slice(&bytes[PacketHeader::SIZE..]);

        Ok(Self { header: *header, payload })
    }
}
