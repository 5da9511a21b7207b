//! Integration tests for the submission gate.
//!
//! # Test Categories
//!
//! 1. **Ordering**: the attempt signal precedes every field verdict
//! 2. **Cancellation**: any failing field cancels; valid fields stay silent
//! 3. **Synchrony**: the gate never waits on, or issues, server checks
//! 4. **Composition**: host submit listeners run after the gate

use std::sync::Arc;
use std::time::Duration;

use valwire_core::{DisplayBoard, FieldEvent, SubmitOutcome};
use valwire_harness::{
    LatchedTransport, ScriptedTransport, SignalRecorder, board_for, registration_form,
};
use valwire_runtime::{ConsumerConfig, FormSession, ProducerConfig, ServerCheck};

fn attach_registration() -> (FormSession, SignalRecorder, DisplayBoard) {
    let form = registration_form();
    let board = board_for(&form);
    let session = FormSession::attach(
        &form,
        &board,
        ProducerConfig::default().with_server_check(ServerCheck::new(
            "/validate",
            Arc::new(ScriptedTransport::new()),
        )),
        ConsumerConfig::default(),
    )
    .expect("attach should succeed");
    let recorder = SignalRecorder::attach(session.bus());
    (session, recorder, board)
}

fn fill_all_but_email(session: &FormSession) {
    session.set_value("first-name", "Joe");
    session.set_value("last-name", "Bloggs");
    session.set_value("age", "34");
}

// ============================================================================
// Ordering and Cancellation Tests
// ============================================================================

#[test]
fn gate_announces_then_reports_only_failures() {
    let (session, recorder, board) = attach_registration();
    fill_all_but_email(&session);

    assert_eq!(session.submit(), SubmitOutcome::Cancelled);

    // The attempt comes first; the one failing field follows; the three
    // valid fields say nothing.
    assert_eq!(
        recorder.labels(),
        vec![
            "submit".to_string(),
            "invalid:email-error:This field is required".to_string(),
        ]
    );
    assert_eq!(
        board.non_empty(),
        vec![("email-error".into(), "This field is required".to_string())]
    );
}

#[test]
fn failures_arrive_in_document_order() {
    let (session, recorder, _board) = attach_registration();
    session.set_value("email", "bad");
    session.set_value("age", "16");

    assert_eq!(session.submit(), SubmitOutcome::Cancelled);

    assert_eq!(
        recorder.labels(),
        vec![
            "submit".to_string(),
            "invalid:first-name-error:This field is required".to_string(),
            "invalid:last-name-error:This field is required".to_string(),
            "invalid:email-error:Invalid email address".to_string(),
            "invalid:age-error:Must be at least 18".to_string(),
        ]
    );
}

#[test]
fn fixing_the_failures_lets_submission_proceed() {
    let (session, recorder, board) = attach_registration();
    fill_all_but_email(&session);

    assert_eq!(session.submit(), SubmitOutcome::Cancelled);
    recorder.clear();

    session.set_value("email", "joe@example.com");
    assert_eq!(session.submit(), SubmitOutcome::Proceeded);

    assert_eq!(recorder.labels(), vec!["submit"]);
    // The sweep cleared the previous failure and nothing replaced it.
    assert!(board.non_empty().is_empty());
}

#[test]
fn each_attempt_restates_the_failures() {
    let (session, recorder, _board) = attach_registration();
    fill_all_but_email(&session);

    assert_eq!(session.submit(), SubmitOutcome::Cancelled);
    assert_eq!(session.submit(), SubmitOutcome::Cancelled);

    assert_eq!(
        recorder.labels(),
        vec![
            "submit".to_string(),
            "invalid:email-error:This field is required".to_string(),
            "submit".to_string(),
            "invalid:email-error:This field is required".to_string(),
        ]
    );
}

// ============================================================================
// Synchrony Tests
// ============================================================================

#[test]
fn the_gate_issues_no_server_checks() {
    let (session, recorder, _board) = attach_registration();
    fill_all_but_email(&session);
    session.set_value("email", "joe@example.com");

    assert_eq!(session.submit(), SubmitOutcome::Proceeded);

    assert_eq!(recorder.labels(), vec!["submit"]);
    // Nothing was dispatched, so nothing ever completes.
    assert_eq!(session.pump_blocking(Duration::from_millis(50)), 0);
}

#[test]
fn a_pending_check_neither_blocks_nor_fails_the_gate() {
    let form = registration_form();
    let board = board_for(&form);
    let latched = LatchedTransport::new(Arc::new(ScriptedTransport::new()));
    let session = FormSession::attach(
        &form,
        &board,
        ProducerConfig::default()
            .with_server_check(ServerCheck::new("/validate", Arc::new(latched.clone()))),
        ConsumerConfig::default(),
    )
    .expect("attach should succeed");
    let recorder = SignalRecorder::attach(session.bus());

    session.set_value("first-name", "Joe");
    session.set_value("email", "joe@example.com");
    session.set_value("last-name", "Bloggs");
    session.fire("last-name", FieldEvent::Blur);
    assert!(recorder.is_empty(), "check is pending, nothing published");

    // The gate runs on local verdicts alone and proceeds immediately.
    assert_eq!(session.submit(), SubmitOutcome::Proceeded);
    assert_eq!(recorder.labels(), vec!["submit"]);

    // The pending check was not invalidated by the sweep; it still lands.
    latched.release();
    assert_eq!(session.pump_until(1, Duration::from_secs(5)), 1);
    assert_eq!(
        recorder.labels(),
        vec!["submit".to_string(), "valid:last-name-error".to_string()]
    );
}

// ============================================================================
// Composition Tests
// ============================================================================

#[test]
fn host_listeners_run_after_the_gate_and_may_cancel() {
    let (session, recorder, _board) = attach_registration();
    fill_all_but_email(&session);
    session.set_value("email", "joe@example.com");

    session.form().on_submit(|intent| intent.prevent_default());

    assert_eq!(session.submit(), SubmitOutcome::Cancelled);
    // The gate itself passed: the attempt was announced, no field failed.
    assert_eq!(recorder.labels(), vec!["submit"]);
}
