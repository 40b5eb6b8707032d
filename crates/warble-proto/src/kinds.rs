//! Message kinds for warble packets.
//!
//! The kind identifies which logical channel a packet belongs to and how its
//! CBOR body should be interpreted. Kinds occupy a small contiguous range;
//! values outside it are reserved and must be rejected.

/// Packet message kinds
///
/// Each kind selects a distinct logical channel within the call session. The
/// kind determines which body type the packet carries.
///
/// # Representation
///
/// Kinds are serialized as Big Endian `u16` values in the packet header. The
/// `#[repr(u16)]` ensures stable numeric values for wire compatibility.
///
/// # Security
///
/// - **Unknown Kinds**: The `from_u16` method returns `None` for unknown
///   values rather than panicking. Packets with unknown kinds should be
///   rejected with
///   [`ProtocolError::UnknownKind`](crate::ProtocolError::UnknownKind).
///
/// - **No Implicit Behavior**: Each kind must be explicitly handled. There is
///   no "default" behavior for unknown kinds, preventing accidental
///   mishandling of malicious or corrupted packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageKind {
    /// Realtime audio/telemetry exchange on the 100ms cadence
    RealTime = 0x0002,
    /// Session authorization handshake
    Auth = 0x0003,
    /// Reliable data channel: fragments and selective acknowledgements
    Data = 0x0004,
    /// Stream-to-participant mappings, carried inside reassembled data
    /// messages
    Stream = 0x0005,
}

impl MessageKind {
    /// Convert to raw u16 value
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Convert from raw u16 value
    ///
    /// Returns `None` if the value doesn't correspond to a known kind.
    ///
    /// # Security
    ///
    /// This function is **total** (defined for all u16 values) and
    /// **infallible**. It returns `Option<Self>` to distinguish between
    /// known and unknown kinds, allowing callers to drop packets with
    /// unknown kinds explicitly.
    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0002 => Some(Self::RealTime),
            0x0003 => Some(Self::Auth),
            0x0004 => Some(Self::Data),
            0x0005 => Some(Self::Stream),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trip() {
        let kinds =
            [MessageKind::RealTime, MessageKind::Auth, MessageKind::Data, MessageKind::Stream];

        for kind in kinds {
            let value = kind.to_u16();
            let parsed = MessageKind::from_u16(value);
            assert_eq!(Some(kind), parsed);
        }
    }

    #[test]
    fn unknown_kind() {
        assert_eq!(MessageKind::from_u16(0x0000), None);
        assert_eq!(MessageKind::from_u16(0x0001), None);
        assert_eq!(MessageKind::from_u16(0x0006), None);
        assert_eq!(MessageKind::from_u16(0xFFFF), None);
    }
}
