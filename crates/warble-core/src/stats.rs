//! Participant statistics sink.
//!
//! Inbound realtime messages carry per-participant audio levels. The session
//! resolves stream ids to participant ids and forwards the levels through
//! this trait, so UI concerns stay out of the protocol logic.

/// Sink for per-participant audio level updates.
///
/// Implemented by whatever owns the participant roster (a UI layer in
/// production, a recording stub in tests).
pub trait ParticipantStats {
    /// Record an audio level report for one participant.
    ///
    /// `level` is negated speaking volume with `-128` meaning muted, and
    /// `signal_strength` is `-1` when the participant didn't report one.
    ///
    /// Returns `true` if the report changed anything worth announcing. The
    /// session coalesces these into a single [`participants_changed`] call
    /// per inbound message.
    ///
    /// [`participants_changed`]: ParticipantStats::participants_changed
    fn update(&mut self, participant_id: &str, level: i32, signal_strength: i32) -> bool;

    /// Called once per inbound message if any [`update`] returned `true`.
    ///
    /// [`update`]: ParticipantStats::update
    fn participants_changed(&mut self);
}
