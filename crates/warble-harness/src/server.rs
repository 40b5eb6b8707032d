//! Canned server-side messages for scripting a session under test.
//!
//! Every builder returns a complete wire datagram, framed exactly the way
//! the server frames it.
//!
//! # Panics
//!
//! Builders panic if the composed message overflows the header's 16-bit
//! length field; test scripts stay far below it.

use warble_proto::{
    MessageBody,
    messages::{
        AudioMessage, AuthMessage, DataMessage, ProfileEntry, RtMessage, StreamEntry,
        StreamMessage,
    },
};

/// Encode a message body into a wire datagram, as the server would.
#[must_use]
pub fn wire(body: MessageBody) -> Vec<u8> {
    let packet = body.into_packet().expect("message fits a datagram");
    let mut buf = Vec::new();
    packet.encode(&mut buf);
    buf
}

/// Auth message carrying a verdict.
#[must_use]
pub fn auth_verdict(authorized: bool) -> Vec<u8> {
    wire(MessageBody::Auth(AuthMessage { authorized: Some(authorized), ..Default::default() }))
}

/// Realtime packet stamped with a server clock reading.
#[must_use]
pub fn rt_server_time(server_time: i64) -> Vec<u8> {
    wire(MessageBody::RealTime(RtMessage {
        audio: Some(AudioMessage { server_time: Some(server_time), ..Default::default() }),
        ..Default::default()
    }))
}

/// Realtime packet carrying per-stream reports.
#[must_use]
pub fn rt_profiles(profiles: Vec<ProfileEntry>) -> Vec<u8> {
    wire(MessageBody::RealTime(RtMessage { profiles, ..Default::default() }))
}

/// Report a stream at a volume, with signal strength.
#[must_use]
pub fn volume_entry(stream_id: u32, volume: i32, signal_strength: i32) -> ProfileEntry {
    ProfileEntry {
        stream_id: Some(stream_id),
        volume: Some(volume),
        signal_strength: Some(signal_strength),
        ..Default::default()
    }
}

/// Report a stream as muted.
#[must_use]
pub fn muted_entry(stream_id: u32) -> ProfileEntry {
    ProfileEntry { stream_id: Some(stream_id), muted: Some(true), ..Default::default() }
}

/// One fragment of a logical data message.
#[must_use]
pub fn data_fragment(seq: u32, msg_id: u32, msg_len: u32, offset: u32, data: &[u8]) -> Vec<u8> {
    wire(MessageBody::Data(DataMessage {
        seq: Some(seq),
        msg_id: Some(msg_id),
        msg_len: Some(msg_len),
        offset: Some(offset),
        data: Some(data.to_vec()),
        ..Default::default()
    }))
}

/// Inner framed bytes of a stream update, ready to be cut into fragments.
#[must_use]
pub fn stream_update_bytes(entries: &[(u32, &str)]) -> Vec<u8> {
    let streams = entries
        .iter()
        .map(|&(stream_id, profile_id)| StreamEntry {
            stream_id: Some(stream_id),
            profile_id: Some(profile_id.to_string()),
        })
        .collect();
    let packet =
        MessageBody::Stream(StreamMessage { streams }).into_packet().expect("update fits");
    let mut buf = Vec::new();
    packet.encode(&mut buf);
    buf
}

/// Whole stream update carried in a single data fragment.
#[must_use]
pub fn stream_update(seq: u32, msg_id: u32, entries: &[(u32, &str)]) -> Vec<u8> {
    let inner = stream_update_bytes(entries);
    data_fragment(seq, msg_id, inner.len() as u32, 0, &inner)
}
