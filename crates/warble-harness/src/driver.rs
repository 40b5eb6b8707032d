//! Action-executing driver around one call session.
//!
//! The driver plays the role of the production event loop: it executes every
//! [`SessionAction`] against a recording transport, models the realtime
//! timer and the deferred ack flush, and advances virtual time tick by tick.
//! Tests script the server side by delivering datagrams and then inspect
//! what the session did.

use std::{collections::HashMap, time::Duration};

use warble_core::{
    env::Environment,
    error::SessionError,
    session::{CallConfig, CallSession, SessionAction},
    stats::ParticipantStats,
    transport::CallTransport,
};
use warble_proto::{MessageBody, Packet};

use crate::sim_env::SimEnv;

/// Transport recording every call for later inspection.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    /// Packets handed to the transport, in order
    pub sent: Vec<Packet>,
    /// Mute flag of each connect call
    pub connects: Vec<bool>,
    /// Hangup flag of each disconnect call
    pub disconnects: Vec<bool>,
}

impl CallTransport for RecordingTransport {
    fn connect(&mut self, muted: bool) {
        self.connects.push(muted);
    }

    fn disconnect(&mut self, hangup: bool) {
        self.disconnects.push(hangup);
    }

    fn send_packet(&mut self, packet: Packet) {
        self.sent.push(packet);
    }
}

/// Stats sink remembering the last report per participant.
///
/// `update` reports a change exactly when the values differ from the last
/// ones seen for that participant, mirroring how a real roster coalesces
/// repeated reports.
#[derive(Debug, Default)]
pub struct RecordingStats {
    levels: HashMap<String, (i32, i32)>,
    signals: usize,
}

impl RecordingStats {
    /// Last `(level, signal_strength)` reported for a participant
    #[must_use]
    pub fn level(&self, participant_id: &str) -> Option<(i32, i32)> {
        self.levels.get(participant_id).copied()
    }

    /// How many times the roster was told to refresh
    #[must_use]
    pub fn signals(&self) -> usize {
        self.signals
    }
}

impl ParticipantStats for RecordingStats {
    fn update(&mut self, participant_id: &str, level: i32, signal_strength: i32) -> bool {
        self.levels.insert(participant_id.to_string(), (level, signal_strength))
            != Some((level, signal_strength))
    }

    fn participants_changed(&mut self) {
        self.signals += 1;
    }
}

#[derive(Debug, Clone, Copy)]
struct RtTimer {
    period_micros: i64,
    deadline: i64,
}

/// Drives a [`CallSession`] against a recording transport on virtual time.
///
/// Timer actions arm and disarm driver-local timers; [`CallDriver::run_for`]
/// advances the clock and fires realtime ticks exactly when due, while
/// [`CallDriver::settle`] runs the deferred ack flush the way an idling
/// event loop would.
pub struct CallDriver {
    env: SimEnv,
    session: CallSession,
    transport: RecordingTransport,
    stats: RecordingStats,
    rt_timer: Option<RtTimer>,
    ack_flush_scheduled: bool,
}

impl CallDriver {
    /// Open a session with seed 0 and the default configuration.
    #[must_use]
    pub fn new(muted: bool) -> Self {
        Self::with_seed(0, muted)
    }

    /// Open a session with a specific RNG seed.
    #[must_use]
    pub fn with_seed(seed: u64, muted: bool) -> Self {
        Self::with_config(seed, muted, CallConfig::default())
    }

    /// Open a session with a specific seed and configuration.
    #[must_use]
    pub fn with_config(seed: u64, muted: bool, config: CallConfig) -> Self {
        let env = SimEnv::with_seed(seed);
        let (session, actions) = CallSession::open(&env, muted, config);
        let mut driver = Self {
            env,
            session,
            transport: RecordingTransport::default(),
            stats: RecordingStats::default(),
            rt_timer: None,
            ack_flush_scheduled: false,
        };
        driver.execute(actions);
        driver
    }

    /// The session under test
    #[must_use]
    pub fn session(&self) -> &CallSession {
        &self.session
    }

    /// Everything the session sent or asked of the transport
    #[must_use]
    pub fn transport(&self) -> &RecordingTransport {
        &self.transport
    }

    /// Participant reports the session forwarded
    #[must_use]
    pub fn stats(&self) -> &RecordingStats {
        &self.stats
    }

    /// The virtual environment, for advancing time out-of-band
    #[must_use]
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Period of the armed realtime timer, if any
    #[must_use]
    pub fn rt_timer(&self) -> Option<Duration> {
        self.rt_timer.map(|t| Duration::from_micros(t.period_micros as u64))
    }

    /// Whether an ack flush is waiting for [`CallDriver::settle`]
    #[must_use]
    pub fn ack_flush_scheduled(&self) -> bool {
        self.ack_flush_scheduled
    }

    /// Decode every packet handed to the transport, in order.
    ///
    /// # Panics
    ///
    /// Panics if a recorded packet fails to decode; the transport only
    /// carries packets the session itself produced.
    #[must_use]
    pub fn sent_bodies(&self) -> Vec<MessageBody> {
        self.transport
            .sent
            .iter()
            .map(|packet| {
                MessageBody::from_packet(packet).expect("session-built packet decodes")
            })
            .collect()
    }

    /// Wire encoding of every sent packet.
    #[must_use]
    pub fn sent_wire(&self) -> Vec<Vec<u8>> {
        self.transport
            .sent
            .iter()
            .map(|packet| {
                let mut buf = Vec::new();
                packet.encode(&mut buf);
                buf
            })
            .collect()
    }

    /// Feed one datagram from the server and execute the resulting actions.
    ///
    /// # Errors
    ///
    /// Propagates the session's verdict on the datagram. The session
    /// survives errors; the driver stays usable.
    pub fn deliver(&mut self, datagram: &[u8]) -> Result<(), SessionError> {
        let actions = self.session.handle_packet(&self.env, &mut self.stats, datagram)?;
        self.execute(actions);
        Ok(())
    }

    /// Advance virtual time, firing realtime ticks exactly when due.
    ///
    /// # Errors
    ///
    /// Propagates the first tick error.
    pub fn run_for(&mut self, duration: Duration) -> Result<(), SessionError> {
        let end = self.env.monotonic_time() + duration.as_micros() as i64;

        while let Some(timer) = self.rt_timer {
            if timer.deadline > end {
                break;
            }
            self.env.advance(timer.deadline - self.env.monotonic_time());
            let actions = self.session.rt_tick(&self.env)?;
            self.execute(actions);
            // execute() owns the timer state; re-read it before advancing
            // the deadline
            if let Some(timer) = &mut self.rt_timer {
                timer.deadline += timer.period_micros;
            }
        }

        let rest = end - self.env.monotonic_time();
        if rest > 0 {
            self.env.advance(rest);
        }
        Ok(())
    }

    /// Run the deferred ack flush, as the production loop would once idle.
    ///
    /// # Errors
    ///
    /// Propagates a flush encoding error.
    pub fn settle(&mut self) -> Result<(), SessionError> {
        if self.ack_flush_scheduled {
            self.ack_flush_scheduled = false;
            let actions = self.session.flush_acks()?;
            self.execute(actions);
        }
        Ok(())
    }

    /// Toggle the mute flag, reconnecting the transport.
    pub fn reopen(&mut self, muted: bool) {
        let actions = self.session.reopen(muted);
        self.execute(actions);
    }

    /// Tear the call down.
    pub fn close(&mut self, hangup: bool) {
        let actions = self.session.close(hangup);
        self.execute(actions);
    }

    fn execute(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::SendPacket(packet) => self.transport.send_packet(packet),
                SessionAction::Connect { muted } => self.transport.connect(muted),
                SessionAction::Disconnect { hangup } => self.transport.disconnect(hangup),
                SessionAction::StartRtTimer { period } => {
                    self.rt_timer = Some(RtTimer {
                        period_micros: period.as_micros() as i64,
                        deadline: self.env.monotonic_time() + period.as_micros() as i64,
                    });
                },
                SessionAction::StopRtTimer => self.rt_timer = None,
                SessionAction::ScheduleAckFlush => self.ack_flush_scheduled = true,
                SessionAction::CancelAckFlush => self.ack_flush_scheduled = false,
            }
        }
    }
}
