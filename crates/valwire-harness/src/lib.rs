#![forbid(unsafe_code)]

//! Test harness for valwire: signal recording, scripted transports, and
//! shared fixtures.
//!
//! Everything here exists so integration tests can drive a full
//! producer/consumer round without a real server: [`SignalRecorder`]
//! captures bus traffic verbatim, the transports in [`transport`] answer
//! checks from scripts (instantly, on command, or never), and
//! [`fixtures`] carries the registration form the test suites share.

pub mod fixtures;
pub mod recorder;
pub mod transport;

pub use fixtures::{board_for, registration_form};
pub use recorder::SignalRecorder;
pub use transport::{FailingTransport, LatchedTransport, ScriptedTransport};
