//! Realtime channel bodies: audio telemetry and participant profiles.
//!
//! Realtime messages flow in both directions on a 100ms cadence once the
//! session is authorized. They are fire-and-forget: no sequencing guarantees,
//! no acknowledgements, and every field optional.

use serde::{Deserialize, Serialize};

/// Realtime exchange message
///
/// Client-to-server messages carry an [`AudioMessage`] with local telemetry.
/// Server-to-client messages carry the same structure plus zero or more
/// [`ProfileEntry`] records describing who is audible right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RtMessage {
    /// Audio telemetry for this tick
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub audio: Option<AudioMessage>,
    /// Per-participant audio levels (server-to-client only)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub profiles: Vec<ProfileEntry>,
}

/// Audio telemetry carried in every realtime message
///
/// # Clock Echo
///
/// The server stamps `server_time` with its own clock. A client that has seen
/// a server timestamp echoes its learned clock offset back in `server_time`
/// on every subsequent send, and stamps `echo_time` exactly once on the first
/// echoing message. This gives the server a round-trip estimate without any
/// dedicated time-sync exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AudioMessage {
    /// Sender's realtime sequence number, wraps at 16 bits
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub seq: Option<u32>,
    /// Running sample counter, advances by one packet's worth per tick
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sample_time: Option<u32>,
    /// Server clock in microseconds, or the client's echo of it
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub server_time: Option<i64>,
    /// Stamped once on the first message that echoes a learned offset
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub echo_time: Option<i64>,
    /// Sender's wall clock in microseconds
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ntp_time: Option<i64>,
    /// Cumulative count of lost inbound frames
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_frames_lost: Option<u32>,
    /// Opaque audio payload, present but empty while media flows elsewhere
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub audio: Option<Vec<u8>>,
}

/// Per-participant audio level report
///
/// Entries without a `stream_id` cannot be attributed to anyone and are
/// skipped by receivers. The stream-to-participant mapping arrives separately
/// on the data channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileEntry {
    /// Stream this report belongs to
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stream_id: Option<u32>,
    /// Speaking volume, larger is louder
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub volume: Option<i32>,
    /// Whether the participant has muted themselves
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub muted: Option<bool>,
    /// Network signal strength as reported by the participant
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signal_strength: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rt_serde() {
        let rt = RtMessage {
            audio: Some(AudioMessage {
                seq: Some(0x1234),
                sample_time: Some(320),
                total_frames_lost: Some(0),
                audio: Some(Vec::new()),
                ..Default::default()
            }),
            profiles: Vec::new(),
        };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&rt, &mut bytes).unwrap();

        let decoded: RtMessage = ciborium::de::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(rt, decoded);
    }

    #[test]
    fn profiles_survive_round_trip() {
        let rt = RtMessage {
            audio: None,
            profiles: vec![
                ProfileEntry {
                    stream_id: Some(1),
                    volume: Some(40),
                    muted: Some(false),
                    signal_strength: Some(3),
                },
                ProfileEntry { stream_id: None, ..Default::default() },
            ],
        };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&rt, &mut bytes).unwrap();

        let decoded: RtMessage = ciborium::de::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(decoded.profiles.len(), 2);
        assert_eq!(decoded.profiles[0].volume, Some(40));
        assert_eq!(decoded.profiles[1].stream_id, None);
    }

    #[test]
    fn negative_times_survive_round_trip() {
        let audio = AudioMessage { server_time: Some(-5_000_000), ..Default::default() };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&audio, &mut bytes).unwrap();

        let decoded: AudioMessage = ciborium::de::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(decoded.server_time, Some(-5_000_000));
    }
}
