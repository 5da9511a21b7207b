#![forbid(unsafe_code)]

//! The producer role: watches fields, judges them, and publishes verdicts.
//!
//! A producer hooks the form's activation event (blur by default) and its
//! invalid notice. Every evaluation advances the field's sequence number; a
//! verdict is published immediately when it is final, or deferred behind a
//! server check when the field is locally valid but server-checked. Check
//! completions come back through [`pump`] and are discarded when their
//! sequence no longer matches the field's, so only the freshest evaluation
//! ever speaks.
//!
//! The producer also guards submission: its submit listener emits
//! [`Signal::SubmitAttempted`], re-checks every field synchronously in
//! document order, and cancels the attempt when any field fails. Pending
//! server checks neither block nor pass the gate; a server-checked field
//! submits on its local verdict.
//!
//! [`pump`]: Producer::pump

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use valwire_core::{
    CHECK_UNAVAILABLE_MESSAGE, CheckRequest, CheckResponse, Field, FieldEvent, FieldName,
    FormHandle, ListenerSet, MALFORMED_CHECK_MESSAGE, Reason, Signal, SignalBus, Verdict, classify,
};

use crate::check_worker::{CheckCompletion, CheckOutcome, CheckTicket, CheckWorker};
use crate::config::{AttachError, ProducerConfig};

struct ServerRuntime {
    action: String,
    worker: CheckWorker,
}

struct ProducerShared {
    sequences: HashMap<FieldName, u64>,
    server: Option<ServerRuntime>,
    detached: bool,
}

/// The attached producer. Dropping it detaches.
pub struct Producer {
    form: FormHandle,
    bus: SignalBus,
    shared: Rc<RefCell<ProducerShared>>,
    listeners: ListenerSet,
    completions: Option<Receiver<CheckCompletion>>,
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("listeners", &self.listeners.len())
            .field("detached", &self.shared.borrow().detached)
            .finish_non_exhaustive()
    }
}

impl Producer {
    /// Attach a producer to `form`, publishing on `bus`.
    ///
    /// Validates `config` first; a rejected config leaves the form
    /// untouched. On success the form's native feedback is suppressed and
    /// every field present right now is hooked. Fields added later are not.
    pub fn attach(
        form: &FormHandle,
        bus: &SignalBus,
        config: ProducerConfig,
    ) -> Result<Self, AttachError> {
        config
            .validate(form)
            .inspect_err(|error| tracing::warn!(%error, "producer attach rejected"))?;

        let (server, completions) = match config.server_check {
            Some(server_check) => {
                let (worker, receiver) = CheckWorker::new(server_check.transport);
                (
                    Some(ServerRuntime {
                        action: server_check.action,
                        worker,
                    }),
                    Some(receiver),
                )
            }
            None => (None, None),
        };

        let shared = Rc::new(RefCell::new(ProducerShared {
            sequences: HashMap::new(),
            server,
            detached: false,
        }));

        form.set_native_feedback(false);
        let mut listeners = ListenerSet::new(form);

        let hook = {
            let form = form.clone();
            let bus = bus.clone();
            let shared = Rc::clone(&shared);
            move |name: &FieldName, _event: FieldEvent| {
                evaluate_field(&form, &bus, &shared, name);
            }
        };
        let names = form.field_names();
        for name in &names {
            listeners.track(form.add_listener(name.as_str(), config.activation, hook.clone()));
            listeners.track(form.add_listener(name.as_str(), FieldEvent::Invalid, hook.clone()));
        }

        let gate = {
            let form = form.clone();
            let bus = bus.clone();
            let shared = Rc::clone(&shared);
            form.clone().on_submit(move |intent| {
                if shared.borrow().detached {
                    return;
                }
                tracing::debug!("submission attempted");
                bus.emit(Signal::SubmitAttempted);

                let mut all_valid = true;
                for name in form.field_names() {
                    if form.check_validity(name.as_str()) == Some(false) {
                        all_valid = false;
                    }
                }
                if !all_valid {
                    tracing::debug!("submission cancelled by field failures");
                    intent.prevent_default();
                }
            })
        };
        listeners.track(gate);

        tracing::info!(
            fields = names.len(),
            activation = config.activation.as_str(),
            server_checks = completions.is_some(),
            "producer attached"
        );
        Ok(Self {
            form: form.clone(),
            bus: bus.clone(),
            shared,
            listeners,
            completions,
        })
    }

    /// Apply every check completion currently waiting, without blocking.
    /// Returns how many were taken off the channel, stale ones included.
    /// After detach this is a no-op.
    pub fn pump(&self) -> usize {
        if self.shared.borrow().detached {
            return 0;
        }
        let Some(receiver) = &self.completions else {
            return 0;
        };
        let mut drained = 0;
        while let Ok(completion) = receiver.try_recv() {
            self.apply_completion(completion);
            drained += 1;
        }
        drained
    }

    /// Like [`pump`], but waits up to `timeout` for the first completion
    /// when none is ready.
    ///
    /// [`pump`]: Producer::pump
    pub fn pump_blocking(&self, timeout: Duration) -> usize {
        if self.shared.borrow().detached {
            return 0;
        }
        let drained = self.pump();
        if drained > 0 {
            return drained;
        }
        let Some(receiver) = &self.completions else {
            return 0;
        };
        match receiver.recv_timeout(timeout) {
            Ok(completion) => {
                self.apply_completion(completion);
                1 + self.pump()
            }
            Err(_) => 0,
        }
    }

    fn apply_completion(&self, completion: CheckCompletion) {
        let CheckCompletion {
            field,
            sequence,
            outcome,
            elapsed,
        } = completion;

        if self.shared.borrow().detached {
            tracing::trace!(field = %field, "check completion ignored after detach");
            return;
        }
        let current = self
            .shared
            .borrow()
            .sequences
            .get(&field)
            .copied()
            .unwrap_or(0);
        if sequence != current {
            tracing::debug!(field = %field, sequence, current, "stale check completion discarded");
            return;
        }
        let Some(location) = self.form.with_field(field.as_str(), Field::display_location) else {
            tracing::warn!(field = %field, "check completion for unknown field discarded");
            return;
        };

        let elapsed_ms = elapsed.as_millis() as u64;
        match outcome {
            CheckOutcome::Transport(error) => {
                tracing::warn!(
                    field = %field,
                    %error,
                    elapsed_ms,
                    "server check unreachable; field treated as invalid"
                );
                self.bus.emit(Signal::FieldInvalid {
                    location,
                    message: CHECK_UNAVAILABLE_MESSAGE.to_string(),
                });
            }
            CheckOutcome::Body(body) => match CheckResponse::parse(&body) {
                Err(error) => {
                    tracing::error!(
                        field = %field,
                        %error,
                        elapsed_ms,
                        "unreadable server check response; field treated as invalid"
                    );
                    self.bus.emit(Signal::FieldInvalid {
                        location,
                        message: MALFORMED_CHECK_MESSAGE.to_string(),
                    });
                }
                Ok(response) if response.valid => {
                    tracing::debug!(field = %field, elapsed_ms, "server check passed");
                    self.bus.emit(Signal::FieldValid { location });
                }
                Ok(response) => {
                    let message = response
                        .message
                        .filter(|message| !message.is_empty())
                        .or_else(|| self.form.resolve_message(field.as_str(), Reason::Unknown))
                        .unwrap_or_else(|| MALFORMED_CHECK_MESSAGE.to_string());
                    tracing::debug!(field = %field, elapsed_ms, "server check rejected");
                    self.bus.emit(Signal::FieldInvalid { location, message });
                }
            },
        }
    }

    /// Detach: stop reacting to events, completions, and submissions, and
    /// restore the form's native feedback. Idempotent; also runs on drop.
    pub fn detach(&mut self) {
        {
            let mut shared = self.shared.borrow_mut();
            if shared.detached {
                return;
            }
            shared.detached = true;
        }
        self.listeners.release();
        self.form.set_native_feedback(true);
        tracing::info!("producer detached");
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.detach();
    }
}

/// One evaluation of one field, from whichever event triggered it.
fn evaluate_field(
    form: &FormHandle,
    bus: &SignalBus,
    shared: &Rc<RefCell<ProducerShared>>,
    name: &FieldName,
) {
    if shared.borrow().detached {
        tracing::trace!(field = %name, "evaluation skipped after detach");
        return;
    }
    let sequence = {
        let mut guard = shared.borrow_mut();
        let sequence = guard.sequences.entry(name.clone()).or_insert(0);
        *sequence += 1;
        *sequence
    };

    let Some(flags) = form.evaluate(name.as_str()) else {
        tracing::warn!(field = %name, "evaluation requested for unknown field");
        return;
    };
    let Some(field) = form.field(name.as_str()) else {
        return;
    };

    match classify(flags) {
        Verdict::Invalid(reason) => {
            let Some(message) = form.resolve_message(name.as_str(), reason) else {
                return;
            };
            tracing::debug!(field = %name, reason = reason.as_str(), sequence, "field invalid");
            bus.emit(Signal::FieldInvalid {
                location: field.display_location(),
                message,
            });
        }
        Verdict::Valid if field.server_checked => {
            let server = shared.borrow().server.as_ref().map(|server| {
                (server.action.clone(), server.worker.clone())
            });
            match server {
                Some((action, worker)) => {
                    tracing::debug!(
                        field = %name,
                        sequence,
                        "local verdict deferred to server check"
                    );
                    worker.dispatch(CheckTicket {
                        field: name.clone(),
                        sequence,
                        request: CheckRequest {
                            action,
                            field: name.clone(),
                            value: field.value.clone(),
                        },
                    });
                }
                None => {
                    tracing::warn!(
                        field = %name,
                        "server-checked field has no transport; local verdict stands"
                    );
                    bus.emit(Signal::FieldValid {
                        location: field.display_location(),
                    });
                }
            }
        }
        Verdict::Valid => {
            tracing::debug!(field = %name, sequence, "field valid");
            bus.emit(Signal::FieldValid {
                location: field.display_location(),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
