//! Outbound realtime cadence state.
//!
//! One value of [`RtSender`] owns everything that changes from one 100ms
//! realtime send to the next: the 16-bit sequence, the running sample clock,
//! and the learned server clock offset with its one-shot echo.
//!
//! The sequence and sample-time origins are randomized at session open so a
//! rejoining client never collides with its previous incarnation's numbering.

use warble_proto::messages::{AudioMessage, RtMessage};

use crate::env::Environment;

/// Builder state for outbound realtime messages.
#[derive(Debug, Clone)]
pub struct RtSender {
    seq: u32,
    sample_time: u32,
    offset: Option<i64>,
    echo_pending: bool,
}

impl RtSender {
    /// Create sender state with randomized origins.
    ///
    /// The sequence starts uniformly in `[0, 0x10000)` and the sample clock
    /// anywhere in the 32-bit space. Both advance before first use, so the
    /// first message on the wire carries `initial_seq + 1`.
    #[must_use]
    pub fn new<E: Environment>(env: &E) -> Self {
        Self {
            seq: env.random_u32() & 0xFFFF,
            sample_time: env.random_u32(),
            offset: None,
            echo_pending: false,
        }
    }

    /// Learn the server clock offset from an inbound `server_time` stamp.
    ///
    /// The offset is `server_time - monotonic_now`, so adding it to a later
    /// monotonic reading reconstructs the server clock. Every observation
    /// re-arms the one-shot `echo_time` stamp. An offset of zero is as
    /// learned as any other value.
    pub fn observe_server_time(&mut self, server_time: i64, monotonic_now: i64) {
        self.offset = Some(server_time.wrapping_sub(monotonic_now));
        self.echo_pending = true;
    }

    /// The learned server clock offset, if any inbound stamp has been seen.
    #[must_use]
    pub fn clock_offset(&self) -> Option<i64> {
        self.offset
    }

    /// Current sequence number (the value most recently sent, before the
    /// next advance).
    #[must_use]
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Current sample clock value.
    #[must_use]
    pub fn sample_time(&self) -> u32 {
        self.sample_time
    }

    /// Advance the cadence and build the next outbound message.
    ///
    /// # Behavior
    ///
    /// - `seq` advances by one, wrapping at 16 bits
    /// - `sample_time` advances by one packet's worth of samples
    /// - `total_frames_lost` is reported as zero and `audio` as present but
    ///   empty; media flows out of band
    /// - once an offset is learned, every message carries the reconstructed
    ///   server clock in `server_time`, and the first message after each
    ///   observation also stamps it into `echo_time`
    pub fn next_message<E: Environment>(&mut self, env: &E, samples_per_packet: u32) -> RtMessage {
        self.seq = self.seq.wrapping_add(1) & 0xFFFF;
        self.sample_time = self.sample_time.wrapping_add(samples_per_packet);

        let mut audio = AudioMessage {
            seq: Some(self.seq),
            sample_time: Some(self.sample_time),
            ntp_time: Some(env.wall_clock_time()),
            total_frames_lost: Some(0),
            audio: Some(Vec::new()),
            ..Default::default()
        };

        if let Some(offset) = self.offset {
            let server_now = offset.wrapping_add(env.monotonic_time());
            if self.echo_pending {
                audio.echo_time = Some(server_now);
                self.echo_pending = false;
            }
            audio.server_time = Some(server_now);
        }

        RtMessage { audio: Some(audio), profiles: Vec::new() }
    }
}
