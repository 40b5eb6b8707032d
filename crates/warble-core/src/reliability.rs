//! Selective acknowledgement state for the data channel.
//!
//! The receiver acknowledges data packets with a cumulative `ack` (highest
//! sequence received, plus the history below it) and a 64-bit `ack_mask`
//! recording which of the 64 sequences below `ack` were actually seen. Acks
//! are deferred: recording a packet schedules a single flush, and every
//! packet recorded before the flush fires folds into the same response.
//!
//! # Mask Discipline
//!
//! Between packets, bit `k` of the internal mask describes sequence
//! `next_seq - 2 - k`, where `next_seq` is the sequence expected next. In a
//! flushed ack (`ack = next_seq - 1`), bit `k` therefore describes sequence
//! `ack - 1 - k`. A zero mask is never sent; a peer that receives no mask
//! reads the ack as purely cumulative.
//!
//! # Saturation
//!
//! A sequence jump that would walk history off the top of the 64-bit mask
//! forces an immediate flush of the old history mid-record, so no seen-bit is
//! lost while a flush is pending. Exactly 64 steps fit without forcing; the
//! 65th forces. After the forced flush the jump is absorbed into the
//! cumulative ack and the already-scheduled deferred flush stays armed.

const TOP_BIT: u64 = 1 << 63;

/// A flushed acknowledgement, ready to be placed into a data message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckFlush {
    /// Cumulative acknowledgement (highest sequence received)
    pub ack: u32,
    /// Seen-history below `ack`, omitted from the wire when empty
    pub mask: Option<u64>,
}

/// What a [`AckTracker::record`] call asks the caller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// History overflowed: send this ack immediately, mid-record
    pub forced: Option<AckFlush>,
    /// No flush was scheduled before this record: schedule one now
    pub schedule: bool,
}

/// Deferred selective-ack accumulator for inbound data packets.
///
/// # Invariants
///
/// - `next_seq` is one past the highest recorded sequence
/// - mask bit `k` describes sequence `next_seq - 2 - k`
/// - `flush_scheduled` is true exactly between a `schedule` request and the
///   matching [`flush`](AckTracker::flush) or [`cancel`](AckTracker::cancel)
#[derive(Debug, Clone)]
pub struct AckTracker {
    next_seq: u32,
    mask: u64,
    flush_scheduled: bool,
}

impl AckTracker {
    /// Create a tracker with no history.
    #[must_use]
    pub fn new() -> Self {
        Self { next_seq: 0, mask: 0, flush_scheduled: false }
    }

    /// Record one inbound data packet sequence.
    ///
    /// # Behavior
    ///
    /// The gap between `next_seq` and `seq` is walked into the mask one
    /// sequence at a time, but only while there is history to preserve
    /// (a flush pending or a nonzero mask). A gap arriving into a clean
    /// tracker is absorbed into the cumulative ack instead, so sequences
    /// skipped there are never reported missing.
    ///
    /// If the walk would shift a seen-bit off the top of the mask, the old
    /// history is flushed immediately via [`RecordOutcome::forced`] and the
    /// rest of the gap is absorbed.
    ///
    /// A stale or replayed `seq` (at or below the highest seen) rewinds
    /// `next_seq` to `seq + 1`; the tracker trusts the wire's numbering
    /// over its own.
    ///
    /// The caller must schedule a deferred flush when
    /// [`RecordOutcome::schedule`] is set, and deliver the forced flush
    /// before anything else it sends.
    pub fn record(&mut self, seq: u32) -> RecordOutcome {
        let mut pending = self.flush_scheduled;
        let mut forced = None;

        if pending || self.mask != 0 {
            while seq > self.next_seq {
                if self.mask & TOP_BIT != 0 {
                    forced = Some(AckFlush {
                        ack: self.next_seq.wrapping_sub(1),
                        mask: Some(self.mask),
                    });
                    self.mask = 0;
                    pending = false;
                    break;
                }
                self.next_seq = self.next_seq.wrapping_add(1);
                self.mask <<= 1;

                // The packet awaiting the deferred flush becomes history.
                if pending {
                    self.mask |= 1;
                    pending = false;
                }
            }
        }

        self.next_seq = seq.wrapping_add(1);
        self.mask <<= 1;
        if pending {
            self.mask |= 1;
        }

        let schedule = !self.flush_scheduled;
        self.flush_scheduled = true;

        RecordOutcome { forced, schedule }
    }

    /// Emit the deferred acknowledgement and clear the scheduled flag.
    ///
    /// The mask is consumed: history reported once is never reported again.
    pub fn flush(&mut self) -> AckFlush {
        self.flush_scheduled = false;

        let mask = if self.mask == 0 {
            None
        } else {
            let mask = self.mask;
            self.mask = 0;
            Some(mask)
        };

        AckFlush { ack: self.next_seq.wrapping_sub(1), mask }
    }

    /// Drop the scheduled flush without emitting it.
    ///
    /// The cursor and mask survive so a session that reconnects mid-call
    /// resumes acking from where it left off.
    pub fn cancel(&mut self) {
        self.flush_scheduled = false;
    }

    /// One past the highest recorded sequence.
    #[must_use]
    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    /// Current unsent seen-history mask.
    #[must_use]
    pub fn ack_mask(&self) -> u64 {
        self.mask
    }

    /// Whether a deferred flush is currently scheduled.
    #[must_use]
    pub fn flush_scheduled(&self) -> bool {
        self.flush_scheduled
    }
}

impl Default for AckTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_all(tracker: &mut AckTracker, seqs: &[u32]) -> Vec<RecordOutcome> {
        seqs.iter().map(|&seq| tracker.record(seq)).collect()
    }

    #[test]
    fn in_order_with_flushes_never_builds_a_mask() {
        let mut tracker = AckTracker::new();

        for seq in 1..=5 {
            let outcome = tracker.record(seq);
            assert_eq!(outcome.forced, None);
            assert!(outcome.schedule);

            let flush = tracker.flush();
            assert_eq!(flush.ack, seq);
            assert_eq!(flush.mask, None);
        }
    }

    #[test]
    fn burst_folds_into_one_ack_with_history() {
        let mut tracker = AckTracker::new();

        let outcomes = record_all(&mut tracker, &[1, 2, 3]);
        assert!(outcomes[0].schedule);
        assert!(!outcomes[1].schedule);
        assert!(!outcomes[2].schedule);
        assert!(outcomes.iter().all(|o| o.forced.is_none()));

        let flush = tracker.flush();
        assert_eq!(flush.ack, 3);
        assert_eq!(flush.mask, Some(0b11));
    }

    #[test]
    fn gap_in_burst_leaves_missing_bit_clear() {
        let mut tracker = AckTracker::new();

        record_all(&mut tracker, &[1, 2, 4]);

        let flush = tracker.flush();
        assert_eq!(flush.ack, 4);
        // bit 0 = seq 3 (missing), bit 1 = seq 2, bit 2 = seq 1
        assert_eq!(flush.mask, Some(0b110));
    }

    #[test]
    fn gap_into_clean_tracker_is_absorbed() {
        let mut tracker = AckTracker::new();

        tracker.record(1);
        let flush = tracker.flush();
        assert_eq!((flush.ack, flush.mask), (1, None));

        // Sequence 2 never arrives. With no pending flush and no mask,
        // the walk is skipped and the gap folds into the cumulative ack.
        let outcome = tracker.record(3);
        assert_eq!(outcome.forced, None);
        assert!(outcome.schedule);

        let flush = tracker.flush();
        assert_eq!((flush.ack, flush.mask), (3, None));
    }

    #[test]
    fn sixty_four_steps_fit_without_forcing() {
        let mut tracker = AckTracker::new();

        tracker.record(1);
        let outcome = tracker.record(66);
        assert_eq!(outcome.forced, None);

        // The seen-bit for sequence 1 was shifted off the top.
        let flush = tracker.flush();
        assert_eq!((flush.ack, flush.mask), (66, None));
    }

    #[test]
    fn sixty_fifth_step_forces_a_flush() {
        let mut tracker = AckTracker::new();

        tracker.record(1);
        let outcome = tracker.record(67);

        let forced = outcome.forced.unwrap();
        assert_eq!(forced.ack, 65);
        assert_eq!(forced.mask, Some(1 << 63));
        assert!(!outcome.schedule, "flush from the first record is still armed");

        // The deferred flush then reports the jump cumulatively.
        let flush = tracker.flush();
        assert_eq!((flush.ack, flush.mask), (67, None));
    }

    #[test]
    fn stale_seq_rewinds_the_cursor() {
        let mut tracker = AckTracker::new();

        record_all(&mut tracker, &[1, 2, 3]);
        tracker.record(2);

        assert_eq!(tracker.next_seq(), 3);
        let flush = tracker.flush();
        assert_eq!(flush.ack, 2);
    }

    #[test]
    fn flush_consumes_the_mask() {
        let mut tracker = AckTracker::new();

        record_all(&mut tracker, &[1, 2, 4]);
        let first = tracker.flush();
        assert!(first.mask.is_some());

        tracker.record(5);
        let second = tracker.flush();
        assert_eq!(second.ack, 5);
        assert_eq!(second.mask, None);
    }

    #[test]
    fn cancel_keeps_cursor_and_mask() {
        let mut tracker = AckTracker::new();

        record_all(&mut tracker, &[1, 2, 3]);
        let mask_before = tracker.ack_mask();
        tracker.cancel();

        assert!(!tracker.flush_scheduled());
        assert_eq!(tracker.next_seq(), 4);
        assert_eq!(tracker.ack_mask(), mask_before);

        // The surviving mask keeps the walk armed across the reconnect.
        // Sequence 3's receipt was only carried by the cancelled flush, so
        // the walk now reports it missing alongside the true gap at 4.
        let outcome = tracker.record(5);
        assert!(outcome.schedule);
        let flush = tracker.flush();
        assert_eq!(flush.ack, 5);
        assert_eq!(flush.mask, Some(0b1100));
    }

    #[test]
    fn schedule_requested_only_once_per_flush_cycle() {
        let mut tracker = AckTracker::new();

        assert!(tracker.record(1).schedule);
        assert!(!tracker.record(2).schedule);
        tracker.flush();
        assert!(tracker.record(3).schedule);
    }
}
