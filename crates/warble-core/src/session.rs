//! Call session state machine.
//!
//! This module implements the session layer for one audio call: it
//! demultiplexes decoded packets onto the auth, realtime, and data paths,
//! tracks the call lifecycle, and drives the outbound cadence.
//!
//! # Architecture: Action-Based State Machine
//!
//! The session follows the action pattern:
//! - Methods accept an [`Environment`] reference for time and randomness
//! - Methods return `Result<Vec<SessionAction>, SessionError>`
//! - Driver code executes actions (send packets, toggle timers, reconnect)
//!
//! This enables:
//! - Pure session logic (no I/O, no stored clocks)
//! - Easy testing (deterministic time and RNG)
//! - Composability (one driver can multiplex several calls)
//!
//! # State Machine
//!
//! ```text
//!                 authorized, unmuted   ┌───────┐
//!                ┌────────────────────> │ Audio │ ─────┐
//! ┌────────────┐ │                      └───────┘      │  close
//! │ Connecting │─┤                          ↕ reopen   ├────────> ┌────────┐
//! └────────────┘ │                      ┌───────┐      │          │ Hangup │
//!       ↑        └────────────────────> │ Muted │ ─────┘          └────────┘
//!       │          authorized, muted    └───────┘
//!       └──────── reopen (mute toggle) ─────┘
//! ```
//!
//! # Lifecycle
//!
//! 1. **Connecting**: transport connect requested, waiting for the server's
//!    auth verdict
//! 2. **Audio**: authorized while unmuted; realtime cadence is running
//! 3. **Muted**: authorized while muted; no outbound realtime traffic
//! 4. **Hangup**: call torn down; every operation becomes a no-op
//!
//! A mute toggle does not tear the session down. [`CallSession::reopen`]
//! reconnects the transport with the new flag and returns to `Connecting`;
//! learned stream mappings, the clock offset, and the ack cursor all survive.
//!
//! # Cadence
//!
//! While unmuted, the driver fires [`CallSession::rt_tick`] every
//! [`CallConfig::rt_interval`] to keep the realtime channel warm. Ack
//! flushes for the data channel are deferred: the session asks the driver
//! to schedule one and folds every packet that arrives in the meantime into
//! a single cumulative ack.

use std::{collections::HashMap, time::Duration};

use warble_proto::{
    MessageBody, MessageKind, Packet, PacketHeader,
    messages::{AuthMessage, DataMessage, RtMessage, StreamMessage},
};

use crate::{
    env::Environment,
    error::SessionError,
    realtime::RtSender,
    reassembly::{Admission, InsertOutcome, Reassembler},
    reliability::{AckFlush, AckTracker},
    stats::ParticipantStats,
};

/// Actions returned by the session state machine.
///
/// The driver (test harness or production client) executes these actions:
/// timer actions control the driver's clock sources, transport actions go to
/// the websocket layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Send this packet to the peer
    SendPacket(Packet),

    /// Open the transport with the given mute flag
    Connect {
        /// Whether the media line is muted
        muted: bool,
    },

    /// Close the transport
    Disconnect {
        /// Whether the peer should treat this as a hangup rather than a
        /// reconnect
        hangup: bool,
    },

    /// Start the periodic realtime send timer
    StartRtTimer {
        /// Tick interval
        period: Duration,
    },

    /// Stop the periodic realtime send timer
    StopRtTimer,

    /// Arrange a [`CallSession::flush_acks`] call once the driver is idle
    ScheduleAckFlush,

    /// Drop a previously scheduled ack flush
    CancelAckFlush,
}

/// Call state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Transport connect requested, no auth verdict yet
    Connecting,
    /// Authorized with live outbound audio
    Audio,
    /// Authorized with the media line muted
    Muted,
    /// Call torn down
    Hangup,
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// Interval between outbound realtime packets
    pub rt_interval: Duration,
    /// Samples represented by each realtime packet, advancing the sample
    /// clock per tick
    pub samples_per_packet: u32,
    /// Upper bound on a single reassembled data message
    pub max_message_len: u32,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            rt_interval: Duration::from_millis(100),
            samples_per_packet: 320,
            max_message_len: 16 * 1024 * 1024,
        }
    }
}

/// Session state machine for one audio call.
///
/// Owns the three per-channel components: the realtime sender, the ack
/// tracker, and the fragment reassembler. All I/O is delegated to the
/// driver through [`SessionAction`]s.
#[derive(Debug, Clone)]
pub struct CallSession {
    /// Current lifecycle state
    state: CallState,
    /// Mute flag the transport was last connected with
    muted: bool,
    /// Configuration
    config: CallConfig,
    /// Outbound realtime sequence and clock state
    rt: RtSender,
    /// Inbound data-channel ack state
    acks: AckTracker,
    /// Fragmented message reassembly buffers
    reassembly: Reassembler,
    /// Stream id to participant profile mappings learned from stream updates
    streams: HashMap<u32, String>,
    /// Whether the driver currently runs the realtime timer
    rt_timer_armed: bool,
}

impl CallSession {
    /// Open a session in [`CallState::Connecting`] and request a transport
    /// connect.
    ///
    /// The realtime sequence starts at a random 16-bit value and the sample
    /// clock at a random 32-bit value, so a reconnecting client is unlikely
    /// to collide with its previous incarnation.
    pub fn open<E: Environment>(
        env: &E,
        muted: bool,
        config: CallConfig,
    ) -> (Self, Vec<SessionAction>) {
        let session = Self {
            state: CallState::Connecting,
            muted,
            rt: RtSender::new(env),
            acks: AckTracker::new(),
            reassembly: Reassembler::new(config.max_message_len),
            streams: HashMap::new(),
            rt_timer_armed: false,
            config,
        };
        (session, vec![SessionAction::Connect { muted }])
    }

    /// Get current state
    #[must_use]
    pub fn state(&self) -> CallState {
        self.state
    }

    /// Get the mute flag the transport was last connected with
    #[must_use]
    pub fn muted(&self) -> bool {
        self.muted
    }

    /// Server-to-monotonic clock offset, once learned from an inbound
    /// realtime packet
    #[must_use]
    pub fn clock_offset(&self) -> Option<i64> {
        self.rt.clock_offset()
    }

    /// Whether the driver currently runs the realtime timer
    #[must_use]
    pub fn rt_timer_armed(&self) -> bool {
        self.rt_timer_armed
    }

    /// Inbound data-channel ack state
    #[must_use]
    pub fn acks(&self) -> &AckTracker {
        &self.acks
    }

    /// Fragment reassembly state
    #[must_use]
    pub fn reassembly(&self) -> &Reassembler {
        &self.reassembly
    }

    /// Participant profile mapped to `stream_id`, if a stream update
    /// announced one
    #[must_use]
    pub fn participant_for_stream(&self, stream_id: u32) -> Option<&str> {
        self.streams.get(&stream_id).map(String::as_str)
    }

    /// Number of known stream-to-participant mappings
    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Process one inbound datagram and return actions.
    ///
    /// Datagrams received after hangup are dropped without error. A failed
    /// packet never tears the session down; the caller logs the error and
    /// keeps feeding subsequent datagrams.
    ///
    /// # Errors
    ///
    /// Returns an error if the datagram fails framing or body decode, if the
    /// kind is unknown or not valid at the top level, or if a data message
    /// is structurally invalid.
    pub fn handle_packet<E: Environment, S: ParticipantStats>(
        &mut self,
        env: &E,
        stats: &mut S,
        datagram: &[u8],
    ) -> Result<Vec<SessionAction>, SessionError> {
        if self.state == CallState::Hangup {
            return Ok(Vec::new());
        }

        let packet = Packet::decode(datagram)?;
        match MessageBody::from_packet(&packet)? {
            MessageBody::RealTime(msg) => {
                self.handle_realtime(env, stats, &msg);
                Ok(Vec::new())
            },
            MessageBody::Auth(msg) => self.handle_auth(env, &msg),
            MessageBody::Data(msg) => self.handle_data(&msg),
            // Stream updates only travel inside reassembled data messages
            MessageBody::Stream(_) => {
                Err(SessionError::UnhandledKind { kind: MessageKind::Stream.to_u16() })
            },
        }
    }

    /// Auth verdict: a positive verdict starts (or restarts, after a mute
    /// toggle) the realtime channel. Anything else is ignored, the server
    /// closes the transport itself when it rejects a session.
    fn handle_auth<E: Environment>(
        &mut self,
        env: &E,
        msg: &AuthMessage,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if msg.authorized != Some(true) {
            tracing::debug!(authorized = ?msg.authorized, "Ignoring auth message without approval");
            return Ok(Vec::new());
        }

        let mut actions = Vec::new();
        if !self.muted {
            // Eager first packet so the server hears from us before the
            // first timer tick.
            actions.push(SessionAction::SendPacket(self.rt_packet(env)?));
            if !self.rt_timer_armed {
                self.rt_timer_armed = true;
                actions.push(SessionAction::StartRtTimer { period: self.config.rt_interval });
            }
        }
        self.set_state(if self.muted { CallState::Muted } else { CallState::Audio });
        Ok(actions)
    }

    /// Inbound realtime packet: learn the clock offset and forward
    /// per-participant levels to the stats sink.
    fn handle_realtime<E: Environment, S: ParticipantStats>(
        &mut self,
        env: &E,
        stats: &mut S,
        msg: &RtMessage,
    ) {
        if let Some(audio) = &msg.audio {
            if let Some(server_time) = audio.server_time {
                self.rt.observe_server_time(server_time, env.monotonic_time());
            }
        }

        let mut changed = false;
        for profile in &msg.profiles {
            let Some(stream_id) = profile.stream_id else { continue };
            let Some(participant_id) = self.streams.get(&stream_id) else { continue };

            let level = if profile.muted == Some(true) {
                -128
            } else if let Some(volume) = profile.volume {
                -volume
            } else {
                // Neither flag present carries no information
                continue;
            };
            let signal_strength = profile.signal_strength.unwrap_or(-1);

            changed |= stats.update(participant_id, level, signal_strength);
        }
        if changed {
            stats.participants_changed();
        }
    }

    /// Inbound data fragment: validate, ack, reassemble.
    ///
    /// Validation runs before any ack state changes, so a structurally
    /// invalid fragment is never acknowledged. A stale fragment (replay of
    /// an already retired message) is acknowledged but not buffered.
    fn handle_data(&mut self, msg: &DataMessage) -> Result<Vec<SessionAction>, SessionError> {
        let (Some(seq), Some(msg_id), Some(msg_len)) = (msg.seq, msg.msg_id, msg.msg_len) else {
            return Err(SessionError::MissingDataFields);
        };
        let offset = msg.offset.unwrap_or(0);
        let payload = msg.data.as_deref().unwrap_or(&[]);

        let admission = self.reassembly.admit(msg_id, msg_len, offset, payload.len())?;

        let outcome = self.acks.record(seq);
        let mut actions = Vec::new();
        if let Some(flush) = outcome.forced {
            actions.push(SessionAction::SendPacket(ack_packet(&flush)?));
        }
        if outcome.schedule {
            actions.push(SessionAction::ScheduleAckFlush);
        }

        if admission == Admission::Stale {
            return Ok(actions);
        }

        if self.reassembly.insert(msg_id, offset, payload) == InsertOutcome::Complete {
            self.finish_message(msg_id);
        }
        Ok(actions)
    }

    /// A reassembled message frames an inner packet. The replay cutoff
    /// advances past `msg_id` once the inner framing checks out as a stream
    /// update; a body that then fails to decode still advances the cutoff,
    /// the message was for us even if we could not use it.
    fn finish_message(&mut self, msg_id: u32) {
        let mut advance = false;
        let mut update = None;
        if let Some(buffer) = self.reassembly.buffer(msg_id) {
            if buffer.len() > PacketHeader::SIZE {
                if let Ok(inner) = Packet::decode(buffer) {
                    if inner.header.kind_enum() == Some(MessageKind::Stream) {
                        advance = true;
                        match MessageBody::decode(MessageKind::Stream, &inner.payload) {
                            Ok(MessageBody::Stream(msg)) => update = Some(msg),
                            _ => {
                                tracing::debug!(msg_id, "Stream update failed to decode");
                            },
                        }
                    }
                }
            }
        }

        if let Some(update) = update {
            self.apply_stream_update(update);
        }
        if advance {
            self.reassembly.retire(msg_id.wrapping_add(1));
        }
    }

    /// Merge a stream update into the stream-to-participant table. Entries
    /// missing either field are skipped.
    fn apply_stream_update(&mut self, update: StreamMessage) {
        for entry in update.streams {
            let (Some(stream_id), Some(profile_id)) = (entry.stream_id, entry.profile_id) else {
                continue;
            };
            tracing::debug!(stream_id, profile_id = %profile_id, "Stream mapped to participant");
            self.streams.insert(stream_id, profile_id);
        }
    }

    /// Periodic realtime send. Fired by the driver's timer; silent unless
    /// the timer is armed.
    ///
    /// # Errors
    ///
    /// Returns an error if the outbound packet fails to encode.
    pub fn rt_tick<E: Environment>(&mut self, env: &E) -> Result<Vec<SessionAction>, SessionError> {
        if self.state == CallState::Hangup || !self.rt_timer_armed {
            return Ok(Vec::new());
        }
        let packet = self.rt_packet(env)?;
        Ok(vec![SessionAction::SendPacket(packet)])
    }

    /// Send the deferred cumulative ack. Fired by the driver once idle
    /// after a [`SessionAction::ScheduleAckFlush`]; silent if nothing is
    /// pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the ack packet fails to encode.
    pub fn flush_acks(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        if !self.acks.flush_scheduled() {
            return Ok(Vec::new());
        }
        let flush = self.acks.flush();
        Ok(vec![SessionAction::SendPacket(ack_packet(&flush)?)])
    }

    /// Reconnect the transport with a new mute flag.
    ///
    /// No-op if the flag already matches or the call has hung up. The
    /// session returns to [`CallState::Connecting`] and waits for a fresh
    /// auth verdict; stream mappings, the clock offset, and the ack cursor
    /// survive the reconnect.
    pub fn reopen(&mut self, muted: bool) -> Vec<SessionAction> {
        if self.state == CallState::Hangup || muted == self.muted {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if self.rt_timer_armed {
            self.rt_timer_armed = false;
            actions.push(SessionAction::StopRtTimer);
        }
        if self.acks.flush_scheduled() {
            self.acks.cancel();
            actions.push(SessionAction::CancelAckFlush);
        }
        actions.push(SessionAction::Disconnect { hangup: true });
        actions.push(SessionAction::Connect { muted });

        self.muted = muted;
        self.set_state(CallState::Connecting);
        actions
    }

    /// Tear the call down. Idempotent.
    ///
    /// `hangup` tells the peer whether this is a final hangup or a
    /// transport-level disconnect.
    pub fn close(&mut self, hangup: bool) -> Vec<SessionAction> {
        if self.state == CallState::Hangup {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if self.acks.flush_scheduled() {
            self.acks.cancel();
            actions.push(SessionAction::CancelAckFlush);
        }
        if self.rt_timer_armed {
            self.rt_timer_armed = false;
            actions.push(SessionAction::StopRtTimer);
        }
        self.streams.clear();
        self.reassembly.clear();
        actions.push(SessionAction::Disconnect { hangup });
        self.set_state(CallState::Hangup);
        actions
    }

    fn rt_packet<E: Environment>(&mut self, env: &E) -> Result<Packet, SessionError> {
        let msg = self.rt.next_message(env, self.config.samples_per_packet);
        Ok(MessageBody::RealTime(msg).into_packet()?)
    }

    fn set_state(&mut self, next: CallState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "Call state change");
            self.state = next;
        }
    }
}

/// Build a pure ack packet from a flush. A zero mask is omitted on the
/// wire.
fn ack_packet(flush: &AckFlush) -> Result<Packet, SessionError> {
    let msg = DataMessage { ack: Some(flush.ack), ack_mask: flush.mask, ..Default::default() };
    Ok(MessageBody::Data(msg).into_packet()?)
}
