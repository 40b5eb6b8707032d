//! Auth handshake integration tests.
//!
//! Tests the connect-and-authorize flow through the driver:
//! - Transport connect requested on open
//! - Positive verdict starting the realtime cadence
//! - Muted sessions authorizing without realtime traffic
//! - Verdicts without approval leaving the session connecting

use std::time::Duration;

use warble_core::session::CallState;
use warble_harness::{CallDriver, server};
use warble_proto::MessageBody;

#[test]
fn open_requests_transport_connect() {
    let driver = CallDriver::new(false);

    assert_eq!(driver.transport().connects, vec![false]);
    assert_eq!(driver.session().state(), CallState::Connecting);
    assert!(driver.rt_timer().is_none());
    assert!(driver.transport().sent.is_empty());
}

#[test]
fn verdict_starts_cadence() {
    let mut driver = CallDriver::new(false);
    driver.deliver(&server::auth_verdict(true)).unwrap();

    assert_eq!(driver.session().state(), CallState::Audio);
    assert_eq!(driver.rt_timer(), Some(Duration::from_millis(100)));

    // The eager first packet goes out before any timer tick
    let bodies = driver.sent_bodies();
    assert_eq!(bodies.len(), 1);
    let MessageBody::RealTime(rt) = &bodies[0] else {
        panic!("expected a realtime packet, got {bodies:?}");
    };
    let audio = rt.audio.as_ref().unwrap();
    assert!(audio.seq.is_some());
    assert_eq!(audio.total_frames_lost, Some(0));
}

#[test]
fn muted_session_authorizes_silently() {
    let mut driver = CallDriver::new(true);
    driver.deliver(&server::auth_verdict(true)).unwrap();

    assert_eq!(driver.session().state(), CallState::Muted);
    assert!(driver.rt_timer().is_none());
    assert!(driver.transport().sent.is_empty());
}

#[test]
fn verdict_without_approval_keeps_connecting() {
    let mut driver = CallDriver::new(false);
    driver.deliver(&server::auth_verdict(false)).unwrap();

    assert_eq!(driver.session().state(), CallState::Connecting);
    assert!(driver.rt_timer().is_none());
    assert!(driver.transport().sent.is_empty());

    // Approval can still arrive later
    driver.deliver(&server::auth_verdict(true)).unwrap();
    assert_eq!(driver.session().state(), CallState::Audio);
}
