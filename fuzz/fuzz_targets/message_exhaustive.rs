//! Exhaustive positive space fuzzer for message encoding/decoding
//!
//! Unlike random fuzzing (packet_decode.rs), this fuzzer EXHAUSTIVELY tests
//! all combinations of:
//! - All four message kinds
//! - Edge-case values (0, 1, MAX) for sequence and clock fields
//! - Empty, single-entry, and multi-entry collections
//!
//! This ensures we don't miss bugs that occur only with specific kind+value
//! combinations that random sampling might not hit.

#![no_main]

use libfuzzer_sys::fuzz_target;
use warble_proto::{
    MessageBody, Packet,
    messages::{
        AudioMessage, AuthMessage, DataMessage, ProfileEntry, RtMessage, StreamEntry,
        StreamMessage,
    },
};

// Edge-case values for 32-bit fields (seq, msg_id, msg_len, offset)
const U32_EDGES: &[u32] = &[
    0,
    1,
    0x1000,           // Typical small value
    u16::MAX as u32,  // 16-bit boundary
    u32::MAX / 2,     // Mid-range
    u32::MAX - 1,
    u32::MAX,
];

// Edge-case values for microsecond clocks
const I64_EDGES: &[i64] = &[
    i64::MIN,
    -1,
    0,
    1,
    1_700_000_000_000_000, // Plausible wall clock
    i64::MAX,
];

// Edge-case values for signed level fields
const I32_EDGES: &[i32] = &[i32::MIN, -128, -1, 0, 1, 127, i32::MAX];

fn bodies(seq: u32, clock: i64, level: i32, payload: &[u8]) -> Vec<MessageBody> {
    vec![
        MessageBody::Auth(AuthMessage {
            session_token: Some("fuzz-token".to_string()),
            authorized: Some(seq % 2 == 0),
        }),
        MessageBody::RealTime(RtMessage {
            audio: Some(AudioMessage {
                seq: Some(seq),
                sample_time: Some(seq.wrapping_mul(320)),
                server_time: Some(clock),
                echo_time: Some(clock),
                ntp_time: Some(clock),
                total_frames_lost: Some(seq),
                audio: Some(payload.to_vec()),
            }),
            profiles: vec![ProfileEntry {
                stream_id: Some(seq),
                volume: Some(level),
                muted: Some(seq % 2 == 1),
                signal_strength: Some(level),
            }],
        }),
        MessageBody::Data(DataMessage {
            seq: Some(seq),
            msg_id: Some(seq),
            msg_len: Some(seq),
            offset: Some(seq),
            data: Some(payload.to_vec()),
            ack: Some(seq),
            ack_mask: Some((u64::from(seq) << 32) | u64::from(seq)),
        }),
        MessageBody::Stream(StreamMessage {
            streams: vec![
                StreamEntry { stream_id: Some(seq), profile_id: Some("fuzz-profile".to_string()) },
                StreamEntry { stream_id: None, profile_id: None },
            ],
        }),
    ]
}

fuzz_target!(|data: &[u8]| {
    // Use input data to select which combination to test
    // This allows libFuzzer to guide exploration while remaining exhaustive
    if data.len() < 3 {
        return;
    }

    let seq = U32_EDGES[data[0] as usize % U32_EDGES.len()];
    let clock = I64_EDGES[data[1] as usize % I64_EDGES.len()];
    let level = I32_EDGES[data[2] as usize % I32_EDGES.len()];
    let payload = &data[3..data.len().min(3 + 256)];

    for body in bodies(seq, clock, level, payload) {
        // INVARIANT 1: Every edge-value body builds a packet
        let packet = body.clone().into_packet().expect("body should fit a packet");
        assert_eq!(packet.header.kind_enum(), Some(body.kind()), "header kind must match body");

        // INVARIANT 2: The wire image decodes back
        let mut wire = Vec::new();
        packet.encode(&mut wire);
        let decoded = Packet::decode(&wire).expect("valid wire image should decode");

        // INVARIANT 3: The round trip is identity
        let round = MessageBody::from_packet(&decoded).expect("body should deserialize");
        assert_eq!(round, body, "round trip must preserve the body");
    }
});
