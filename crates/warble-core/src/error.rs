//! Session error types.
//!
//! Every error here means "this inbound packet was dropped". The session
//! never tears itself down over a malformed packet; callers log the error and
//! keep feeding the session.

use thiserror::Error;
use warble_proto::ProtocolError;

use crate::reassembly::ReassemblyError;

/// Errors surfaced while processing an inbound packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Packet framing or body decoding failed
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The kind is known but never valid as a top-level packet
    #[error("no top-level handler for message kind {kind:#06x}")]
    UnhandledKind {
        /// The offending kind value
        kind: u16,
    },

    /// A data message arrived without its mandatory sequencing fields
    #[error("data message missing seq, msg_id, or msg_len")]
    MissingDataFields,

    /// The fragment was structurally inconsistent with reassembly state
    #[error("reassembly rejected fragment: {0}")]
    Reassembly(#[from] ReassemblyError),
}
