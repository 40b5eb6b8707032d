//! Transport abstraction for call datagram I/O.
//!
//! The `CallTransport` trait abstracts the datagram pipe under a call
//! session. The session itself never touches it directly; it returns
//! [`SessionAction`](crate::session::SessionAction) values and a driver
//! executes them against an implementation of this trait.
//!
//! # Implementations
//!
//! - **`RecordingTransport`** (warble-harness): Captures every call for
//!   assertion in deterministic tests
//! - Production drivers wrap a socket (or a websocket relay) and an event
//!   loop
//!
//! # Why Synchronous
//!
//! Every operation here is fire-and-forget from the session's point of view:
//! packets go out, connection state changes are requested, and whatever
//! happens next comes back later as an inbound packet or a timer tick.
//! Completion signals (connected, disconnected) reach the session as new
//! driver calls, so the trait needs no futures.

use warble_proto::Packet;

/// Abstract datagram pipe for a single call.
///
/// # Lifecycle
///
/// ```text
/// connect(muted)
///   ↓
/// send_packet() ... any number of times, both channels interleaved
///   ↓
/// disconnect(hangup)
/// ```
///
/// A mute toggle is a full disconnect/connect cycle with the new flag; the
/// peer treats the reconnect as the same participant changing media state.
pub trait CallTransport {
    /// Establish the datagram pipe for this call.
    ///
    /// `muted` selects which media profile to request from the far end.
    fn connect(&mut self, muted: bool);

    /// Tear the pipe down.
    ///
    /// `hangup` is false only when the caller drops the audio leg while
    /// staying in the call; both the mute toggle and a normal close pass
    /// true.
    fn disconnect(&mut self, hangup: bool);

    /// Send one encoded packet.
    ///
    /// Delivery is best-effort. The session never retransmits; reliability
    /// on the data channel comes from the far end resending unacked
    /// fragments.
    fn send_packet(&mut self, packet: Packet);
}
