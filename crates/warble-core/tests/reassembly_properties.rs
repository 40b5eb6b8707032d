//! Property-based tests for fragment reassembly.
//!
//! These tests use proptest to verify invariants hold for all possible inputs:
//! - Delivery order never changes the reassembled bytes
//! - Completion is reported exactly when the byte range is covered
//! - The fragment list stays sorted, disjoint, and non-touching
//! - The replay cutoff admits and rejects consistently

use proptest::prelude::*;
use warble_core::reassembly::{Admission, InsertOutcome, Reassembler};

const MSG_ID: u32 = 0;
const MAX_LEN: u32 = 1 << 20;

// Strategy for message bytes plus interior cut points partitioning them
fn message_with_cuts() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
    (2usize..512).prop_flat_map(|len| {
        (
            proptest::collection::vec(any::<u8>(), len),
            proptest::collection::btree_set(1..len, 0..6),
        )
            .prop_map(|(bytes, cuts)| (bytes, cuts.into_iter().collect()))
    })
}

// Partition the message at the cut points, then shuffle the pieces
fn shuffled_partition() -> impl Strategy<Value = (Vec<u8>, Vec<(usize, usize)>)> {
    message_with_cuts().prop_flat_map(|(bytes, cuts)| {
        let mut bounds = vec![0];
        bounds.extend(cuts);
        bounds.push(bytes.len());
        let pieces: Vec<(usize, usize)> = bounds.windows(2).map(|w| (w[0], w[1])).collect();
        (Just(bytes), Just(pieces).prop_shuffle())
    })
}

// Arbitrary, possibly overlapping ranges within a message
fn overlapping_ranges() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..256).prop_flat_map(|len| {
        let range = (0..len, 1usize..=len).prop_map(move |(start, span)| {
            let end = (start + span).min(len);
            (start, end)
        });
        (Just(len), proptest::collection::vec(range, 1..12))
    })
}

fn feed(r: &mut Reassembler, total: u32, offset: usize, payload: &[u8]) -> InsertOutcome {
    let admission = r.admit(MSG_ID, total, offset as u32, payload.len()).unwrap();
    assert_eq!(admission, Admission::Accepted);
    r.insert(MSG_ID, offset as u32, payload)
}

#[test]
fn prop_delivery_order_is_irrelevant() {
    proptest!(|((bytes, pieces) in shuffled_partition())| {
        let mut r = Reassembler::new(MAX_LEN);
        let total = bytes.len() as u32;

        for (i, &(start, end)) in pieces.iter().enumerate() {
            let outcome = feed(&mut r, total, start, &bytes[start..end]);
            let last = i == pieces.len() - 1;
            prop_assert_eq!(outcome == InsertOutcome::Complete, last);
        }
        prop_assert_eq!(r.buffer(MSG_ID).unwrap(), &bytes[..]);
    });
}

#[test]
fn prop_duplicate_fragments_are_harmless() {
    proptest!(|((bytes, pieces) in shuffled_partition())| {
        let mut r = Reassembler::new(MAX_LEN);
        let total = bytes.len() as u32;

        for &(start, end) in &pieces {
            feed(&mut r, total, start, &bytes[start..end]);
        }
        // Replays of already covered ranges keep reporting completion and
        // leave the bytes untouched
        for &(start, end) in &pieces {
            let outcome = feed(&mut r, total, start, &bytes[start..end]);
            prop_assert_eq!(outcome, InsertOutcome::Complete);
        }
        prop_assert_eq!(r.buffer(MSG_ID).unwrap(), &bytes[..]);
    });
}

#[test]
fn prop_completion_matches_coverage_model() {
    proptest!(|((len, ranges) in overlapping_ranges())| {
        let mut r = Reassembler::new(MAX_LEN);
        let mut covered = vec![false; len];

        for &(start, end) in &ranges {
            let payload = vec![0xAB; end - start];
            let outcome = feed(&mut r, len as u32, start, &payload);

            covered[start..end].fill(true);
            let full = covered.iter().all(|c| *c);
            prop_assert_eq!(outcome == InsertOutcome::Complete, full);
        }
    });
}

#[test]
fn prop_fragment_list_stays_normalized() {
    proptest!(|((len, ranges) in overlapping_ranges())| {
        let mut r = Reassembler::new(MAX_LEN);

        for &(start, end) in &ranges {
            let payload = vec![0u8; end - start];
            feed(&mut r, len as u32, start, &payload);

            let frags = r.fragments(MSG_ID).unwrap();
            for pair in frags.windows(2) {
                // Sorted, disjoint, and separated by a real gap; touching
                // ranges must have merged
                prop_assert!(pair[0].end < pair[1].start);
            }
            for frag in frags {
                prop_assert!(frag.start < frag.end);
                prop_assert!(frag.end <= len as u32);
            }
        }
    });
}

#[test]
fn prop_cutoff_splits_admission() {
    proptest!(|(cutoff in 1u32..10_000, probe in 0u32..20_000)| {
        let mut r = Reassembler::new(MAX_LEN);
        r.retire(cutoff);

        let admission = r.admit(probe, 8, 0, 8).unwrap();
        if probe < cutoff {
            prop_assert_eq!(admission, Admission::Stale);
            prop_assert!(!r.contains(probe));
        } else {
            prop_assert_eq!(admission, Admission::Accepted);
            prop_assert!(r.contains(probe));
        }
    });
}
