#![forbid(unsafe_code)]

//! Validation signals and the form-scoped bus that carries them.
//!
//! Producers publish [`Signal`]s describing validation outcomes; consumers
//! subscribe to render them. The bus is scoped to one form: nothing crosses
//! between forms, and nothing global observes it.
//!
//! Delivery is queued. A signal emitted while another is being delivered
//! waits until the in-flight signal has reached every subscriber, so
//! observers always see signals in emission order. Subscriber lists are
//! snapshotted per delivery: a subscriber added during a drain starts
//! receiving from the next delivered signal, and one removed during a drain
//! can still see the signal already in flight.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::display::LocationId;

// ─────────────────────────────────────────────────────────────────────────────
// Signal
// ─────────────────────────────────────────────────────────────────────────────

/// A validation outcome, published on the form's bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "kebab-case")]
pub enum Signal {
    /// A field was judged invalid. Carries the display location its message
    /// belongs to and the resolved message text.
    FieldInvalid {
        /// Where the message should be shown.
        location: LocationId,
        /// Resolved message text.
        message: String,
    },
    /// A field was judged valid; any message at its location should clear.
    FieldValid {
        /// Where the message should clear.
        location: LocationId,
    },
    /// A submission attempt started. Emitted before any per-field verdicts
    /// from the submission sweep.
    SubmitAttempted,
}

impl Signal {
    /// Stable kind name, for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FieldInvalid { .. } => "field-invalid",
            Self::FieldValid { .. } => "field-valid",
            Self::SubmitAttempted => "submit-attempted",
        }
    }

    /// The display location this signal targets, if any.
    #[must_use]
    pub fn location(&self) -> Option<&LocationId> {
        match self {
            Self::FieldInvalid { location, .. } | Self::FieldValid { location } => Some(location),
            Self::SubmitAttempted => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SignalBus
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier handed out by [`SignalBus::subscribe`].
pub type SubscriberId = u64;

type Handler = Rc<dyn Fn(&Signal)>;

struct BusInner {
    next_id: SubscriberId,
    subscribers: Vec<(SubscriberId, Handler)>,
    queue: VecDeque<Signal>,
    dispatching: bool,
}

impl fmt::Debug for BusInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusInner")
            .field("subscribers", &self.subscribers.len())
            .field("queued", &self.queue.len())
            .field("dispatching", &self.dispatching)
            .finish()
    }
}

/// Form-scoped signal bus. Clones share the same subscriber list and queue.
#[derive(Debug, Clone)]
pub struct SignalBus {
    inner: Rc<RefCell<BusInner>>,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                next_id: 1,
                subscribers: Vec::new(),
                queue: VecDeque::new(),
                dispatching: false,
            })),
        }
    }

    /// Register a handler for every signal on this bus.
    pub fn subscribe(&self, handler: impl Fn(&Signal) + 'static) -> SubscriberId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Rc::new(handler)));
        tracing::trace!(subscriber = id, "bus subscription added");
        id
    }

    /// Remove a subscriber. Returns `false` when the id is not registered,
    /// so removing twice is harmless.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sub, _)| *sub != id);
        let removed = inner.subscribers.len() < before;
        if removed {
            tracing::trace!(subscriber = id, "bus subscription removed");
        }
        removed
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Publish a signal.
    ///
    /// When called from inside a handler the signal is queued and delivered
    /// after the in-flight signal finishes its round, keeping observer order
    /// equal to emission order.
    pub fn emit(&self, signal: Signal) {
        {
            let mut inner = self.inner.borrow_mut();
            tracing::trace!(kind = signal.kind(), "signal emitted");
            inner.queue.push_back(signal);
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }

        loop {
            let signal = {
                let mut inner = self.inner.borrow_mut();
                match inner.queue.pop_front() {
                    Some(signal) => signal,
                    None => break,
                }
            };
            let handlers: Vec<Handler> = self
                .inner
                .borrow()
                .subscribers
                .iter()
                .map(|(_, handler)| Rc::clone(handler))
                .collect();
            for handler in &handlers {
                handler(&signal);
            }
        }

        self.inner.borrow_mut().dispatching = false;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
