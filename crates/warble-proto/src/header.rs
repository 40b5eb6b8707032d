//! Packet header implementation with zero-copy parsing.
//!
//! The `PacketHeader` is a fixed 4-byte structure that is serialized as raw
//! binary (Big Endian). This enables O(1) channel demux decisions without
//! deserialization overhead.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    MessageKind,
    errors::{ProtocolError, Result},
};

/// Fixed 4-byte packet header (Big Endian network byte order)
///
/// All multi-byte integers are stored in Big Endian format to match network
/// byte order. Fields are stored as raw byte arrays to avoid alignment issues
/// with `#[repr(C, packed)]`.
///
/// # Layout
///
/// | Bytes | Field       | Meaning                                 |
/// |-------|-------------|-----------------------------------------|
/// | 0-1   | `kind`      | u16 message kind                        |
/// | 2-3   | `total_len` | u16 total packet length, header included|
///
/// # Security Properties
///
/// - **Zero-Copy Safety**: The `#[repr(C, packed)]` layout with `zerocopy`
///   traits ensures that this struct can be safely cast from untrusted
///   network bytes. All 4-byte patterns are valid (no invalid bit patterns),
///   preventing undefined behavior.
///
/// - **Self-Describing Length**: `total_len` covers the header itself, so the
///   receiver can compare the declared length against the datagram length
///   before touching the body. That comparison lives in
///   [`Packet::decode`](crate::Packet::decode), which sees both lengths.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct PacketHeader {
    pub(crate) kind: [u8; 2],      // u16 message kind
    pub(crate) total_len: [u8; 2], // u16 total packet length (header + body)
}

impl PacketHeader {
    /// Size of the serialized header (4 bytes)
    pub const SIZE: usize = 4;

    /// Create a new header with the specified kind and total length.
    ///
    /// `total_len` is the full packet length including these 4 header bytes.
    #[must_use]
    pub fn new(kind: MessageKind, total_len: u16) -> Self {
        Self { kind: kind.to_u16().to_be_bytes(), total_len: total_len.to_be_bytes() }
    }

    /// Parse a header from network bytes (zero-copy, safe)
    ///
    /// This function casts raw bytes directly to a `PacketHeader` reference
    /// using compile-time layout verification from `zerocopy`. No data is
    /// copied.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PacketTooShort`] if the buffer holds fewer
    /// than 4 bytes.
    ///
    /// # Security
    ///
    /// - **Zero-Copy Safety**: The `zerocopy` crate verifies at compile-time
    ///   that `PacketHeader` has a stable memory layout. All bit patterns are
    ///   valid, so casting arbitrary bytes cannot cause undefined behavior.
    ///
    /// - **No Semantic Validation**: This function does NOT check that
    ///   `total_len` matches the datagram length or that `kind` is known.
    ///   Those checks need context this function doesn't have and happen in
    ///   [`Packet::decode`](crate::Packet::decode) and the session demux.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Ok(Self::ref_from_prefix(bytes)
            .map_err(|_| ProtocolError::PacketTooShort {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?
            .0)
    }

    /// Serialize header to bytes (zero-copy)
    #[must_use]
    #[allow(clippy::wrong_self_convention)] // Common serialization pattern
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let bytes = IntoBytes::as_bytes(self);
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(bytes);
        arr
    }

    /// Get the raw message kind
    #[must_use]
    pub fn kind(&self) -> u16 {
        u16::from_be_bytes(self.kind)
    }

    /// Get the message kind as an enum (if known)
    #[must_use]
    pub fn kind_enum(&self) -> Option<MessageKind> {
        MessageKind::from_u16(self.kind())
    }

    /// Get the declared total packet length (header + body)
    #[must_use]
    pub fn total_len(&self) -> u16 {
        u16::from_be_bytes(self.total_len)
    }
}

// Manual Debug implementation (can't derive due to packed repr)
impl std::fmt::Debug for PacketHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketHeader")
            .field("kind", &format!("{:#06x}", self.kind()))
            .field("total_len", &self.total_len())
            .finish()
    }
}

// Manual PartialEq implementation (can't derive due to packed repr)
impl PartialEq for PacketHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PacketHeader {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    impl Arbitrary for PacketHeader {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            (any::<u16>(), any::<u16>())
                .prop_map(|(kind, total_len)| PacketHeader {
                    kind: kind.to_be_bytes(),
                    total_len: total_len.to_be_bytes(),
                })
                .boxed()
        }
    }

    #[test]
    fn header_size() {
        assert_eq!(std::mem::size_of::<PacketHeader>(), PacketHeader::SIZE);
        assert_eq!(PacketHeader::SIZE, 4);
    }

    #[test]
    fn known_kinds_resolve() {
        let header = PacketHeader::new(MessageKind::Data, 12);
        assert_eq!(header.kind(), 0x0004);
        assert_eq!(header.kind_enum(), Some(MessageKind::Data));
        assert_eq!(header.total_len(), 12);
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let header = PacketHeader::from_bytes(&[0x00, 0x09, 0x00, 0x04]).unwrap();
        assert_eq!(header.kind(), 0x0009);
        assert_eq!(header.kind_enum(), None);
    }

    proptest! {
        #[test]
        fn header_round_trip(header in any::<PacketHeader>()) {
            let bytes = header.to_bytes();
            let parsed = PacketHeader::from_bytes(&bytes).expect("should parse");
            prop_assert_eq!(&header, parsed);
        }

        #[test]
        fn header_is_big_endian(kind in any::<u16>(), total_len in any::<u16>()) {
            let mut bytes = [0u8; 4];
            bytes[0..2].copy_from_slice(&kind.to_be_bytes());
            bytes[2..4].copy_from_slice(&total_len.to_be_bytes());

            let parsed = PacketHeader::from_bytes(&bytes).expect("should parse");
            prop_assert_eq!(parsed.kind(), kind);
            prop_assert_eq!(parsed.total_len(), total_len);
        }
    }

    #[test]
    fn reject_short_buffer() {
        for len in 0..PacketHeader::SIZE {
            let buf = vec![0u8; len];
            let result = PacketHeader::from_bytes(&buf);
            assert_eq!(result, Err(ProtocolError::PacketTooShort { expected: 4, actual: len }));
        }
    }
}
