#![forbid(unsafe_code)]

//! The consumer role: turns verdict signals into board text.
//!
//! A consumer never judges anything. It subscribes to the form's bus,
//! writes invalid messages to the location each signal names, clears on
//! valid, and wipes its locations when a submission sweep starts so stale
//! text never survives into a fresh round of verdicts.
//!
//! A message whose location cannot take text falls back to the configured
//! default location; with no default it is logged and dropped, never
//! thrown.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use valwire_core::{DisplayBoard, FormHandle, LocationId, Signal, SignalBus, SubscriberId};

use crate::config::{AttachError, ConsumerConfig};
use crate::location_map::FieldLocationMap;

struct ConsumerShared {
    map: FieldLocationMap,
    board: DisplayBoard,
    default_location: Option<LocationId>,
    detached: bool,
}

/// The attached consumer. Dropping it detaches.
pub struct Consumer {
    bus: SignalBus,
    subscriber: SubscriberId,
    shared: Rc<RefCell<ConsumerShared>>,
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("subscriber", &self.subscriber)
            .field("detached", &self.shared.borrow().detached)
            .finish_non_exhaustive()
    }
}

impl Consumer {
    /// Attach a consumer for `form`'s signals on `bus`, rendering onto
    /// `board`.
    ///
    /// The field-to-location map is resolved here, once, against the
    /// fields and board locations that exist right now.
    pub fn attach(
        form: &FormHandle,
        bus: &SignalBus,
        board: &DisplayBoard,
        config: ConsumerConfig,
    ) -> Result<Self, AttachError> {
        config
            .validate()
            .inspect_err(|error| tracing::warn!(%error, "consumer attach rejected"))?;
        if let Some(default) = &config.default_location
            && !board.contains(default)
        {
            tracing::warn!(location = %default, "default display location is not on the board");
        }

        let map = FieldLocationMap::build(form, board);
        let shared = Rc::new(RefCell::new(ConsumerShared {
            map,
            board: board.clone(),
            default_location: config.default_location,
            detached: false,
        }));

        let handler_shared = Rc::clone(&shared);
        let subscriber = bus.subscribe(move |signal| handle_signal(&handler_shared, signal));

        tracing::info!(
            mapped = shared.borrow().map.len(),
            subscriber,
            "consumer attached"
        );
        Ok(Self {
            bus: bus.clone(),
            subscriber,
            shared,
        })
    }

    /// The resolved field-to-location map.
    #[must_use]
    pub fn location_map(&self) -> FieldLocationMap {
        self.shared.borrow().map.clone()
    }

    /// Detach: unsubscribe and stop touching the board. Whatever the board
    /// shows stays as it is. Idempotent; also runs on drop.
    pub fn detach(&mut self) {
        {
            let mut shared = self.shared.borrow_mut();
            if shared.detached {
                return;
            }
            shared.detached = true;
        }
        self.bus.unsubscribe(self.subscriber);
        tracing::info!(subscriber = self.subscriber, "consumer detached");
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.detach();
    }
}

fn handle_signal(shared: &Rc<RefCell<ConsumerShared>>, signal: &Signal) {
    let guard = shared.borrow();
    if guard.detached {
        tracing::debug!(kind = signal.kind(), "signal ignored after detach");
        return;
    }
    match signal {
        Signal::FieldInvalid { location, message } => {
            render(&guard, location, Some(message));
        }
        Signal::FieldValid { location } => {
            render(&guard, location, None);
        }
        Signal::SubmitAttempted => {
            for id in guard.map.mapped_locations() {
                guard.board.clear(&id);
            }
            if let Some(default) = &guard.default_location {
                guard.board.clear(default);
            }
            tracing::trace!("board cleared for a fresh submission sweep");
        }
    }
}

fn render(guard: &ConsumerShared, location: &LocationId, text: Option<&str>) {
    let write = |id: &LocationId| match text {
        Some(message) => guard.board.set_text(id, message),
        None => guard.board.clear(id),
    };
    if write(location) {
        return;
    }
    if let Some(default) = &guard.default_location
        && write(default)
    {
        tracing::debug!(
            location = %location,
            default = %default,
            "message rerouted to the default location"
        );
        return;
    }
    tracing::warn!(location = %location, "no display location can take this message");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
