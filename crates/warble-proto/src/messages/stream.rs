//! Stream mapping body.
//!
//! Stream messages never travel as top-level packets. They arrive as the
//! inner body of a fully reassembled data-channel message, framed with their
//! own 4-byte packet header inside the reassembled bytes.

use serde::{Deserialize, Serialize};

/// Stream-to-participant mapping update
///
/// Each entry binds a realtime `stream_id` to the participant it carries.
/// Receivers upsert entries into their local table; entries missing either
/// field are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StreamMessage {
    /// Mapping entries to upsert
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub streams: Vec<StreamEntry>,
}

/// A single stream-to-participant binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StreamEntry {
    /// Realtime stream identifier
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stream_id: Option<u32>,
    /// Participant profile bound to the stream
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub profile_id: Option<String>,
}
