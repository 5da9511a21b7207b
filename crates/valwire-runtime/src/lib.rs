#![forbid(unsafe_code)]

//! valwire runtime: the producer and consumer roles over a shared form.
//!
//! # Key Components
//!
//! - [`Producer`] - Hooks field events, judges fields, publishes verdicts,
//!   and gates submission
//! - [`Consumer`] - Renders verdict signals onto a display board
//! - [`FormSession`] - Both roles wired onto a private bus in one call
//! - [`ProducerConfig`] / [`ConsumerConfig`] - Attach-time configuration,
//!   validated before anything touches the form
//! - [`CheckWorker`] - Thread-per-check execution of server checks
//! - [`FieldLocationMap`] - The consumer's attach-time location resolution
//!
//! # How it fits in the system
//! `valwire-core` supplies the vocabulary (fields, flags, signals, the
//! oracle and transport seams); this crate supplies the moving parts. All
//! coordination state lives on the main thread; only server checks cross a
//! thread boundary, and their completions are pulled back onto the main
//! thread by [`Producer::pump`].

pub mod check_worker;
pub mod config;
pub mod consumer;
pub mod location_map;
pub mod producer;
pub mod session;

pub use check_worker::{CheckCompletion, CheckOutcome, CheckTicket, CheckWorker};
pub use config::{AttachError, ConsumerConfig, ProducerConfig, ServerCheck};
pub use consumer::Consumer;
pub use location_map::FieldLocationMap;
pub use producer::Producer;
pub use session::FormSession;
