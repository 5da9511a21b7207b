//! Integration tests for teardown: after it, stillness.
//!
//! # Test Categories
//!
//! 1. **Release**: every hook and subscription is gone, natives restored
//! 2. **Stillness**: events, submissions, and late completions change nothing
//! 3. **Drop**: dropping the session tears down the same way

use std::sync::Arc;
use std::time::Duration;

use valwire_core::{DisplayBoard, FieldEvent, FormHandle, SubmitOutcome};
use valwire_harness::{
    LatchedTransport, ScriptedTransport, SignalRecorder, board_for, registration_form,
};
use valwire_runtime::{ConsumerConfig, FormSession, ProducerConfig, ServerCheck};

fn attach_registration(
    transport: Arc<LatchedTransport>,
) -> (FormHandle, DisplayBoard, FormSession, SignalRecorder) {
    let form = registration_form();
    let board = board_for(&form);
    let session = FormSession::attach(
        &form,
        &board,
        ProducerConfig::default().with_server_check(ServerCheck::new("/validate", transport)),
        ConsumerConfig::default(),
    )
    .expect("attach should succeed");
    let recorder = SignalRecorder::attach(session.bus());
    (form, board, session, recorder)
}

// ============================================================================
// Release Tests
// ============================================================================

#[test]
fn teardown_releases_hooks_and_subscriptions() {
    let latched = LatchedTransport::new(Arc::new(ScriptedTransport::new()));
    let (form, _board, mut session, _recorder) = attach_registration(Arc::new(latched));

    // Four fields, two hooks each, plus the gate; consumer plus recorder.
    assert_eq!(form.listener_count(), 9);
    assert_eq!(session.bus().subscriber_count(), 2);
    assert!(!form.native_feedback());

    session.teardown();

    assert_eq!(form.listener_count(), 0);
    assert_eq!(session.bus().subscriber_count(), 1, "only the recorder stays");
    assert!(form.native_feedback());
}

#[test]
fn teardown_is_idempotent() {
    let latched = LatchedTransport::new(Arc::new(ScriptedTransport::new()));
    let (form, _board, mut session, _recorder) = attach_registration(Arc::new(latched));

    session.teardown();
    session.teardown();
    session.teardown();

    assert_eq!(form.listener_count(), 0);
    assert!(form.native_feedback());
}

// ============================================================================
// Stillness Tests
// ============================================================================

#[test]
fn events_and_submissions_after_teardown_publish_nothing() {
    let latched = LatchedTransport::new(Arc::new(ScriptedTransport::new()));
    let (_form, board, mut session, recorder) = attach_registration(Arc::new(latched));

    session.fire("first-name", FieldEvent::Blur);
    assert_eq!(recorder.len(), 1);
    let frozen = board.non_empty();

    session.teardown();
    recorder.clear();

    session.fire("first-name", FieldEvent::Blur);
    session.set_value("email", "joe@example.com");
    session.fire("email", FieldEvent::Blur);
    // Native feedback is back, so the empty required fields cancel this,
    // without a single signal.
    assert_eq!(session.submit(), SubmitOutcome::Cancelled);

    assert!(recorder.is_empty());
    assert_eq!(board.non_empty(), frozen);
}

#[test]
fn late_completions_after_teardown_are_discarded() {
    let latched = LatchedTransport::new(Arc::new(ScriptedTransport::new()));
    let (_form, board, mut session, recorder) =
        attach_registration(Arc::new(latched.clone()));

    session.set_value("last-name", "Bloggs");
    session.fire("last-name", FieldEvent::Blur);
    assert!(recorder.is_empty(), "check is pending");

    session.teardown();
    latched.release();

    // The check resolves into a torn-down session: nothing to apply.
    assert_eq!(session.pump_blocking(Duration::from_millis(100)), 0);
    assert!(recorder.is_empty());
    assert_eq!(board.text_of(&"last-name-error".into()).as_deref(), Some(""));
}

// ============================================================================
// Drop Tests
// ============================================================================

#[test]
fn dropping_the_session_detaches_both_roles() {
    let form = registration_form();
    let board = board_for(&form);
    {
        let latched = LatchedTransport::new(Arc::new(ScriptedTransport::new()));
        let _session = FormSession::attach(
            &form,
            &board,
            ProducerConfig::default()
                .with_server_check(ServerCheck::new("/validate", Arc::new(latched))),
            ConsumerConfig::default(),
        )
        .expect("attach should succeed");
        assert_eq!(form.listener_count(), 9);
    }
    assert_eq!(form.listener_count(), 0);
    assert!(form.native_feedback());

    form.fire("first-name", FieldEvent::Blur);
    assert!(board.non_empty().is_empty());
}
