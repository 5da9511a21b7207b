#![forbid(unsafe_code)]

//! Core vocabulary for valwire: fields, validity, signals, and the seams
//! runtimes plug into.
//!
//! # Key Components
//!
//! - [`Field`] - One form field: constraints, value, and presentation hints
//! - [`ValidityFlags`] / [`Reason`] - What can be wrong, and which wrong wins
//! - [`classify`] - The fixed-priority reduction from flags to one reason
//! - [`ValidityOracle`] / [`ConstraintOracle`] - The judging seam and its
//!   built-in implementation
//! - [`FormHandle`] - Shared form state, events, and the submission entry
//!   point
//! - [`SignalBus`] / [`Signal`] - Form-scoped publish/subscribe for
//!   validation outcomes
//! - [`DisplayBoard`] / [`LocationId`] - Where messages land
//! - [`CheckTransport`] - The seam server checks travel through
//!
//! # How it fits in the system
//! This crate is pure vocabulary and local logic; it spawns no threads and
//! performs no I/O. `valwire-runtime` builds the producer and consumer
//! roles on top of these types.

pub mod classify;
pub mod display;
pub mod events;
pub mod field;
pub mod form;
pub mod message;
pub mod oracle;
pub mod server_check;
pub mod signal;
pub mod validity;

pub use classify::{PRIORITY, Verdict, classify};
pub use display::{DisplayBoard, LocationId, error_location_for};
pub use events::{FieldEvent, ListenerId, SubmitIntent, SubmitOutcome};
pub use field::{Constraints, Field, FieldKind, FieldName, MessageOverrides, Step};
pub use form::{FormHandle, ListenerSet};
pub use message::resolve_message;
pub use oracle::{ConstraintOracle, ValidityOracle};
pub use server_check::{
    CHECK_UNAVAILABLE_MESSAGE, CheckRequest, CheckResponse, CheckTransport,
    MALFORMED_CHECK_MESSAGE, MalformedResponse, TransportError,
};
pub use signal::{Signal, SignalBus, SubscriberId};
pub use validity::{Reason, ValidityFlags};
