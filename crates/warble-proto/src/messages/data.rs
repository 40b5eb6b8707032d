//! Reliable data channel body.
//!
//! Data messages carry fragments of larger logical messages together with
//! selective acknowledgements for the reverse direction. A single body can do
//! both jobs at once: a fragment with piggybacked acks, or a pure ack with no
//! fragment fields at all.

use serde::{Deserialize, Serialize};

/// Reliable channel message
///
/// # Field Groups
///
/// Fragment fields (`seq`, `msg_id`, `msg_len`, `offset`, `data`) describe a
/// byte range of a logical message. A body carrying a fragment must populate
/// `seq`, `msg_id`, and `msg_len`; a missing `offset` means zero and missing
/// `data` means an empty range.
///
/// Ack fields (`ack`, `ack_mask`) acknowledge the sender's view of the
/// reverse direction: `ack` is the highest packet sequence received in order,
/// and bit `k` of `ack_mask` reports whether packet `ack - 1 - k` was seen.
/// A mask of zero is omitted from the wire entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DataMessage {
    /// Packet sequence number on the data channel
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub seq: Option<u32>,
    /// Logical message this fragment belongs to
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub msg_id: Option<u32>,
    /// Total length of the logical message in bytes
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub msg_len: Option<u32>,
    /// Byte offset of this fragment within the logical message
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub offset: Option<u32>,
    /// Fragment payload
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Vec<u8>>,
    /// Cumulative acknowledgement for the reverse direction
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ack: Option<u32>,
    /// Selective acknowledgement history below `ack`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ack_mask: Option<u64>,
}
