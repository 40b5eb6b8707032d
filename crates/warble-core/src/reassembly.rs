//! Fragment reassembly for the reliable data channel.
//!
//! Logical messages arrive as byte-range fragments in arbitrary order, with
//! arbitrary overlap and duplication. Each in-flight message keeps a
//! zero-filled buffer plus a sorted list of disjoint covered ranges; a
//! message completes when a single range covers the whole declared length.
//!
//! Completed messages advance a replay cutoff: every message id below it is
//! finished business, and fragments for those ids are acknowledged but
//! otherwise ignored.
//!
//! # Two-Phase API
//!
//! Processing a fragment is split into [`admit`](Reassembler::admit) (all
//! validation, fallible) and [`insert`](Reassembler::insert) (infallible).
//! The session must acknowledge the packet between the two phases, so
//! everything that can reject a fragment happens before any ack state
//! changes hands.

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors rejecting a structurally inconsistent fragment.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblyError {
    /// Fragment declares a different total length than the in-flight message
    #[error("message length mismatch: fragment declares {declared}, message has {existing}")]
    LengthMismatch {
        /// Length declared by the fragment
        declared: u32,
        /// Length the message was created with
        existing: u32,
    },

    /// Fragment range extends past the declared message length
    #[error("fragment out of bounds: offset {offset} + len {len} exceeds total {total}")]
    OutOfBounds {
        /// Fragment byte offset
        offset: u32,
        /// Fragment payload length
        len: usize,
        /// Declared total message length
        total: u32,
    },

    /// Declared message length exceeds the configured cap
    #[error("message too long: {declared} bytes exceeds limit {limit}")]
    TooLong {
        /// Length declared by the fragment
        declared: u32,
        /// Configured maximum message length
        limit: u32,
    },
}

/// Verdict of the validation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Message id is below the replay cutoff; ack the packet, skip the data
    Stale,
    /// Fragment is consistent and may be inserted
    Accepted,
}

/// Result of inserting an admitted fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The message still has holes
    Incomplete,
    /// A single range now covers the whole message
    Complete,
}

/// A covered byte range, `start` inclusive to `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    /// First covered byte
    pub start: u32,
    /// One past the last covered byte
    pub end: u32,
}

#[derive(Debug, Clone)]
struct PendingMessage {
    total_len: u32,
    buf: Vec<u8>,
    frags: Vec<Fragment>,
}

impl PendingMessage {
    fn new(total_len: u32) -> Self {
        Self { total_len, buf: vec![0; total_len as usize], frags: Vec::new() }
    }

    fn is_complete(&self) -> bool {
        self.frags.len() == 1 && self.frags[0].start == 0 && self.frags[0].end == self.total_len
    }
}

/// Reassembles fragmented logical messages and tracks the replay cutoff.
///
/// # Invariants
///
/// - Fragment lists are sorted, disjoint, and non-touching: any range that
///   overlaps or touches an existing one is merged on insert
/// - No in-flight entry has an id below `next_logical`
/// - Buffers never exceed the configured `max_message_len`
#[derive(Debug, Clone)]
pub struct Reassembler {
    messages: BTreeMap<u32, PendingMessage>,
    next_logical: u32,
    max_message_len: u32,
}

impl Reassembler {
    /// Create a reassembler accepting messages up to `max_message_len`
    /// bytes.
    #[must_use]
    pub fn new(max_message_len: u32) -> Self {
        Self { messages: BTreeMap::new(), next_logical: 0, max_message_len }
    }

    /// Validate a fragment against cutoff and message state.
    ///
    /// # Behavior
    ///
    /// Locates the in-flight message for `msg_id`, creating it from this
    /// fragment's declared length if it is new. Creation happens before
    /// range validation, so a rejected first fragment still leaves an empty
    /// entry pinning the declared length for later fragments.
    ///
    /// # Errors
    ///
    /// - [`ReassemblyError::TooLong`] if `total_len` exceeds the cap (checked
    ///   before any allocation)
    /// - [`ReassemblyError::LengthMismatch`] if `total_len` differs from the
    ///   existing entry
    /// - [`ReassemblyError::OutOfBounds`] if `offset + payload_len` extends
    ///   past `total_len`
    pub fn admit(
        &mut self,
        msg_id: u32,
        total_len: u32,
        offset: u32,
        payload_len: usize,
    ) -> Result<Admission, ReassemblyError> {
        if msg_id < self.next_logical {
            return Ok(Admission::Stale);
        }

        if total_len > self.max_message_len {
            return Err(ReassemblyError::TooLong {
                declared: total_len,
                limit: self.max_message_len,
            });
        }

        let entry = self.messages.entry(msg_id).or_insert_with(|| PendingMessage::new(total_len));

        if entry.total_len != total_len {
            return Err(ReassemblyError::LengthMismatch {
                declared: total_len,
                existing: entry.total_len,
            });
        }

        if u64::from(offset) + payload_len as u64 > u64::from(total_len) {
            return Err(ReassemblyError::OutOfBounds { offset, len: payload_len, total: total_len });
        }

        Ok(Admission::Accepted)
    }

    /// Copy an admitted fragment into place and merge its range.
    ///
    /// Must follow an [`admit`](Reassembler::admit) that returned
    /// [`Admission::Accepted`] for the same fragment; inserting anything
    /// else is a no-op reported as `Incomplete`.
    pub fn insert(&mut self, msg_id: u32, offset: u32, payload: &[u8]) -> InsertOutcome {
        let Some(entry) = self.messages.get_mut(&msg_id) else {
            return InsertOutcome::Incomplete;
        };

        let start = offset as usize;
        let Some(end) = start.checked_add(payload.len()).filter(|&end| end <= entry.buf.len())
        else {
            return InsertOutcome::Incomplete;
        };

        entry.buf[start..end].copy_from_slice(payload);
        insert_range(&mut entry.frags, offset, offset + payload.len() as u32);

        if entry.is_complete() { InsertOutcome::Complete } else { InsertOutcome::Incomplete }
    }

    /// Assembled bytes for an in-flight message.
    ///
    /// Uncovered holes read as zero; the contents are only meaningful once
    /// [`insert`](Reassembler::insert) has reported
    /// [`InsertOutcome::Complete`].
    #[must_use]
    pub fn buffer(&self, msg_id: u32) -> Option<&[u8]> {
        self.messages.get(&msg_id).map(|entry| entry.buf.as_slice())
    }

    /// Covered ranges for an in-flight message.
    #[must_use]
    pub fn fragments(&self, msg_id: u32) -> Option<&[Fragment]> {
        self.messages.get(&msg_id).map(|entry| entry.frags.as_slice())
    }

    /// Advance the replay cutoff and drop every entry below it.
    ///
    /// Entries at or above `cutoff` stay in flight, including completed ones
    /// whose inner content failed validation; they linger until a later
    /// completion moves the cutoff past them.
    pub fn retire(&mut self, cutoff: u32) {
        self.next_logical = cutoff;
        self.messages = self.messages.split_off(&cutoff);
    }

    /// Drop all in-flight messages without moving the cutoff.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Lowest message id not yet retired.
    #[must_use]
    pub fn next_logical(&self) -> u32 {
        self.next_logical
    }

    /// Whether a message id is currently in flight.
    #[must_use]
    pub fn contains(&self, msg_id: u32) -> bool {
        self.messages.contains_key(&msg_id)
    }

    /// Number of in-flight messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no messages are in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Merge `[start, end)` into a sorted list of disjoint ranges.
///
/// Touching counts as overlapping: inserting `[5, 10)` next to `[0, 5)`
/// produces `[0, 10)`. A range bridging several existing ranges absorbs all
/// of them.
fn insert_range(frags: &mut Vec<Fragment>, start: u32, end: u32) {
    let idx = frags.partition_point(|f| f.end < start);

    if idx == frags.len() || end < frags[idx].start {
        frags.insert(idx, Fragment { start, end });
        return;
    }

    frags[idx].start = frags[idx].start.min(start);
    if end > frags[idx].end {
        let mut new_end = end;
        let mut last = idx;
        while last + 1 < frags.len() && frags[last + 1].start <= new_end {
            new_end = new_end.max(frags[last + 1].end);
            last += 1;
        }
        frags[idx].end = new_end;
        if last > idx {
            frags.drain(idx + 1..=last);
        }
    }
}
