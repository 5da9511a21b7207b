#![forbid(unsafe_code)]

//! Valwire demo binary: a scripted registration form walkthrough.
//!
//! Runs the full producer/consumer loop against an in-process "server"
//! that only accepts the last name `Bloggs`. Set `RUST_LOG=debug` to watch
//! the signal traffic.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;
use valwire_core::{
    CheckRequest, CheckResponse, CheckTransport, ConstraintOracle, DisplayBoard, Field, FieldEvent,
    FieldKind, FormHandle, LocationId, Reason, SubmitOutcome, TransportError, error_location_for,
};
use valwire_runtime::{ConsumerConfig, FormSession, ProducerConfig, ServerCheck};

/// What the authority says when the last name is anything else.
const BLOGGS_REJECTION: &str = "Enter 'Bloggs'";

/// How long a scripted step waits for its check to land.
const CHECK_WAIT: Duration = Duration::from_secs(5);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let form = registration_form();
    let board = board_for(&form);

    let authority: Arc<dyn CheckTransport> = Arc::new(|request: &CheckRequest| {
        let verdict = if request.field.as_str() == "last-name" && request.value != "Bloggs" {
            CheckResponse {
                valid: false,
                message: Some(BLOGGS_REJECTION.to_owned()),
            }
        } else {
            CheckResponse {
                valid: true,
                message: Some("OK".to_owned()),
            }
        };
        serde_json::to_string(&verdict).map_err(|e| TransportError::Unavailable(e.to_string()))
    });

    let producer_config =
        ProducerConfig::default().with_server_check(ServerCheck::new("/validate", authority));
    let consumer_config = ConsumerConfig::default().with_default_location("form-errors");

    let mut session = match FormSession::attach(&form, &board, producer_config, consumer_config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Attach error: {e}");
            std::process::exit(1);
        }
    };
    info!("session attached; walking the script");

    // A first pass over the untouched form. Every blur is classified locally;
    // the empty last name never reaches the server.
    for name in ["first-name", "last-name", "email", "age"] {
        session.fire(name, FieldEvent::Blur);
    }
    print_board("touring the empty form", &board);

    session.set_value("first-name", "Joe");
    session.fire("first-name", FieldEvent::Blur);
    print_board("first name filled in", &board);

    session.set_value("email", "joe@");
    session.fire("email", FieldEvent::Blur);
    print_board("a malformed email", &board);

    session.set_value("email", "joe@example.com");
    session.fire("email", FieldEvent::Blur);
    print_board("the email fixed", &board);

    session.set_value("age", "16");
    session.fire("age", FieldEvent::Blur);
    print_board("too young", &board);

    session.set_value("age", "34");
    session.fire("age", FieldEvent::Blur);
    print_board("a plausible age", &board);

    // Locally the name is fine, so the verdict is the server's alone.
    session.set_value("last-name", "Smith");
    session.fire("last-name", FieldEvent::Blur);
    session.pump_until(1, CHECK_WAIT);
    print_board("the server rejects Smith", &board);

    session.set_value("last-name", "Bloggs");
    session.fire("last-name", FieldEvent::Blur);
    session.pump_until(1, CHECK_WAIT);
    print_board("the server accepts Bloggs", &board);

    // Poke a hole and try to submit. The gate announces the attempt, the
    // board sweeps clean, and only the re-validated failure comes back.
    session.set_value("email", "");
    let outcome = session.submit();
    print_outcome("submitting with a hole", outcome, &board);

    session.set_value("email", "joe@example.com");
    let outcome = session.submit();
    print_outcome("submitting complete", outcome, &board);

    // After teardown the same interactions move nothing.
    session.teardown();
    session.set_value("email", "");
    session.fire("email", FieldEvent::Blur);
    print_board("after teardown", &board);
}

/// The demo form: two names, an email, and an age with a sane range.
fn registration_form() -> FormHandle {
    let fields = vec![
        Field::new("first-name", FieldKind::Text)
            .required()
            .with_message(Reason::ValueMissing, "Please enter your first name"),
        Field::new("last-name", FieldKind::Text)
            .required()
            .with_server_check(),
        Field::new("email", FieldKind::Email).required(),
        Field::new("age", FieldKind::Number)
            .with_min(18.0)
            .with_max(130.0),
    ];
    FormHandle::new(fields, Rc::new(ConstraintOracle))
}

/// A board with one conventional slot per field plus a shared fallback.
fn board_for(form: &FormHandle) -> DisplayBoard {
    let board = DisplayBoard::new();
    for name in form.field_names() {
        board.register(error_location_for(&name));
    }
    board.register(LocationId::from("form-errors"));
    board
}

fn print_board(step: &str, board: &DisplayBoard) {
    println!("== {step}");
    let messages = board.non_empty();
    if messages.is_empty() {
        println!("   (no messages)");
    }
    for (location, text) in messages {
        println!("   {location}: {text}");
    }
    println!();
}

fn print_outcome(step: &str, outcome: SubmitOutcome, board: &DisplayBoard) {
    let word = match outcome {
        SubmitOutcome::Proceeded => "the submission went through",
        SubmitOutcome::Cancelled => "the submission was cancelled",
    };
    println!("== {step}: {word}");
    let messages = board.non_empty();
    if messages.is_empty() {
        println!("   (no messages)");
    }
    for (location, text) in messages {
        println!("   {location}: {text}");
    }
    println!();
}
