//! Random fuzzer for datagram decoding
//!
//! Feeds arbitrary bytes into the packet decode path and checks that:
//! - Decoding never panics, whatever the input
//! - Anything that decodes re-encodes to the exact input bytes
//! - Body deserialization of a decodable packet never panics either

#![no_main]

use libfuzzer_sys::fuzz_target;
use warble_proto::{MessageBody, Packet};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the decoder.
    let Ok(packet) = Packet::decode(data) else {
        return;
    };

    // INVARIANT 1: A decoded packet re-encodes to its own wire bytes.
    // Decode rejects trailing garbage, so the images match exactly.
    let mut buf = Vec::new();
    packet.encode(&mut buf);
    assert_eq!(buf, data, "re-encoding must reproduce the input");

    // INVARIANT 2: The declared length is the real length.
    assert_eq!(
        packet.header.total_len() as usize,
        buf.len(),
        "header length must match the encoded size"
    );

    // INVARIANT 3: Body deserialization is total. An unknown kind or
    // malformed CBOR payload is an error, never a panic.
    let _ = MessageBody::from_packet(&packet);
});
