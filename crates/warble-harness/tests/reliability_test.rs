//! Data-channel acknowledgement integration tests.
//!
//! Drives fragments through the full session and checks the ack traffic
//! that comes back out of the transport:
//! - A burst folds into one deferred ack carrying a history mask
//! - Gaps show up as cleared bits
//! - Window saturation forces an ack out ahead of the deferred flush

use warble_core::error::SessionError;
use warble_harness::{CallDriver, server};
use warble_proto::{MessageBody, messages::DataMessage};

/// Ack bodies the session has sent, in order.
fn acks(driver: &CallDriver) -> Vec<DataMessage> {
    driver
        .sent_bodies()
        .into_iter()
        .filter_map(|body| match body {
            MessageBody::Data(msg) => Some(msg),
            _ => None,
        })
        .collect()
}

/// Fragment of a message too large to complete, so only acks flow back.
fn fragment(seq: u32) -> Vec<u8> {
    server::data_fragment(seq, 0, 64, 0, &[0xAB; 8])
}

fn muted_session() -> CallDriver {
    let mut driver = CallDriver::new(true);
    driver.deliver(&server::auth_verdict(true)).unwrap();
    driver
}

#[test]
fn burst_folds_into_single_ack() {
    let mut driver = muted_session();

    for seq in 1..=3 {
        driver.deliver(&fragment(seq)).unwrap();
    }
    assert!(driver.ack_flush_scheduled());
    assert!(acks(&driver).is_empty());

    driver.settle().unwrap();

    let sent = acks(&driver);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].ack, Some(3));
    assert_eq!(sent[0].ack_mask, Some(0b11));
    assert_eq!(sent[0].seq, None);

    // Nothing left to flush
    driver.settle().unwrap();
    assert_eq!(acks(&driver).len(), 1);
}

#[test]
fn gap_is_visible_in_the_mask() {
    let mut driver = muted_session();

    for seq in [1, 2, 4] {
        driver.deliver(&fragment(seq)).unwrap();
    }
    driver.settle().unwrap();

    let sent = acks(&driver);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].ack, Some(4));
    assert_eq!(sent[0].ack_mask, Some(0b110));
}

#[test]
fn saturation_forces_immediate_ack() {
    let mut driver = muted_session();

    driver.deliver(&fragment(1)).unwrap();
    driver.deliver(&fragment(67)).unwrap();

    // The jump past the 64-bit window pushed an ack out at once.
    let sent = acks(&driver);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].ack, Some(65));
    assert_eq!(sent[0].ack_mask, Some(1 << 63));

    // The deferred flush still runs for the residue.
    assert!(driver.ack_flush_scheduled());
    driver.settle().unwrap();

    let sent = acks(&driver);
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].ack, Some(67));
    assert_eq!(sent[1].ack_mask, None);
}

#[test]
fn rejected_fragments_are_never_acked() {
    let mut driver = muted_session();

    // Fragment with no message identity at all
    let missing = server::wire(MessageBody::Data(DataMessage {
        seq: Some(5),
        data: Some(vec![0xAB; 8]),
        ..Default::default()
    }));
    let err = driver.deliver(&missing).unwrap_err();
    assert!(matches!(err, SessionError::MissingDataFields));

    // Fragment that overruns its own declared message length
    let overrun = server::data_fragment(6, 0, 4, 0, &[0xAB; 8]);
    let err = driver.deliver(&overrun).unwrap_err();
    assert!(matches!(err, SessionError::Reassembly(_)));

    assert!(!driver.ack_flush_scheduled());
    assert!(acks(&driver).is_empty());
}
