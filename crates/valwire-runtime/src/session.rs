#![forbid(unsafe_code)]

//! One-call wiring for the common case: producer plus consumer on a
//! private bus.
//!
//! [`FormSession::attach`] builds the bus, attaches the consumer first so
//! no early verdict is missed, then the producer. Attachment is atomic: if
//! either attach is refused, whatever was already attached detaches on the
//! way out and the form is left untouched.

use std::fmt;
use std::time::{Duration, Instant};

use valwire_core::{DisplayBoard, FieldEvent, FormHandle, SignalBus, SubmitOutcome};

use crate::config::{AttachError, ConsumerConfig, ProducerConfig};
use crate::consumer::Consumer;
use crate::producer::Producer;

/// A producer and consumer attached to one form, sharing a private bus.
pub struct FormSession {
    form: FormHandle,
    bus: SignalBus,
    board: DisplayBoard,
    producer: Producer,
    consumer: Consumer,
}

impl fmt::Debug for FormSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSession")
            .field("form", &self.form)
            .field("producer", &self.producer)
            .field("consumer", &self.consumer)
            .finish_non_exhaustive()
    }
}

impl FormSession {
    /// Wire a full session onto `form` and `board`.
    pub fn attach(
        form: &FormHandle,
        board: &DisplayBoard,
        producer_config: ProducerConfig,
        consumer_config: ConsumerConfig,
    ) -> Result<Self, AttachError> {
        let bus = SignalBus::new();
        let consumer = Consumer::attach(form, &bus, board, consumer_config)?;
        let producer = Producer::attach(form, &bus, producer_config)?;
        Ok(Self {
            form: form.clone(),
            bus,
            board: board.clone(),
            producer,
            consumer,
        })
    }

    /// The form this session runs on.
    #[must_use]
    pub fn form(&self) -> &FormHandle {
        &self.form
    }

    /// The session's private bus.
    #[must_use]
    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    /// The board the consumer renders onto.
    #[must_use]
    pub fn board(&self) -> &DisplayBoard {
        &self.board
    }

    /// The attached consumer.
    #[must_use]
    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    /// Set a field's value. Returns `false` for an unknown field.
    pub fn set_value(&self, name: &str, value: impl Into<String>) -> bool {
        self.form.set_value(name, value)
    }

    /// Set or clear a field's custom error.
    pub fn set_custom_error(&self, name: &str, error: Option<String>) -> bool {
        self.form.set_custom_error(name, error)
    }

    /// Fire a field event, as the host would on user interaction.
    pub fn fire(&self, name: &str, event: FieldEvent) -> usize {
        self.form.fire(name, event)
    }

    /// Attempt submission through the producer's gate.
    pub fn submit(&self) -> SubmitOutcome {
        self.form.request_submit()
    }

    /// Apply any waiting server check completions. Returns how many were
    /// taken off the channel.
    pub fn pump(&self) -> usize {
        self.producer.pump()
    }

    /// Like [`pump`], waiting up to `timeout` when nothing is ready.
    ///
    /// [`pump`]: FormSession::pump
    pub fn pump_blocking(&self, timeout: Duration) -> usize {
        self.producer.pump_blocking(timeout)
    }

    /// Pump until `count` completions have been applied or `timeout` has
    /// passed. Returns how many were applied.
    pub fn pump_until(&self, count: usize, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut total = self.producer.pump();
        while total < count {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let drained = self.producer.pump_blocking(remaining);
            if drained == 0 {
                break;
            }
            total += drained;
        }
        total
    }

    /// Detach producer and consumer together. After this the session is
    /// inert: events, submissions, and late check completions change
    /// nothing, and the board keeps whatever it showed.
    pub fn teardown(&mut self) {
        self.producer.detach();
        self.consumer.detach();
        tracing::info!(
            subscribers_left = self.bus.subscriber_count(),
            "session torn down"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
