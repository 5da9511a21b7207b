#![forbid(unsafe_code)]

//! Background execution of server checks.
//!
//! Each dispatched ticket runs on its own short-lived thread so a slow
//! authority never stalls the main thread or other checks. Completions come
//! back over a channel; the producer drains them with its pump and decides
//! there, on the main thread, whether each one is still fresh.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use valwire_core::{CheckRequest, CheckTransport, FieldName, TransportError};

/// One server check to run: the request plus the bookkeeping the producer
/// needs to judge freshness when the answer comes back.
#[derive(Debug, Clone)]
pub struct CheckTicket {
    /// Field under check.
    pub field: FieldName,
    /// The field's evaluation sequence at dispatch time.
    pub sequence: u64,
    /// The request to perform.
    pub request: CheckRequest,
}

/// What a check produced.
#[derive(Debug)]
pub enum CheckOutcome {
    /// The raw response body, not yet parsed.
    Body(String),
    /// The transport failed before a body existed.
    Transport(TransportError),
}

/// A finished check, as delivered on the completion channel.
#[derive(Debug)]
pub struct CheckCompletion {
    /// Field the check was for.
    pub field: FieldName,
    /// Sequence the check was issued under.
    pub sequence: u64,
    /// What came back.
    pub outcome: CheckOutcome,
    /// Wall time the transport took.
    pub elapsed: Duration,
}

/// Dispatches check tickets onto worker threads.
#[derive(Clone)]
pub struct CheckWorker {
    transport: Arc<dyn CheckTransport>,
    sender: Sender<CheckCompletion>,
}

impl fmt::Debug for CheckWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckWorker").finish_non_exhaustive()
    }
}

impl CheckWorker {
    /// Create a worker around `transport`, returning it with the receiving
    /// end of its completion channel.
    #[must_use]
    pub fn new(transport: Arc<dyn CheckTransport>) -> (Self, Receiver<CheckCompletion>) {
        let (sender, receiver) = mpsc::channel();
        (Self { transport, sender }, receiver)
    }

    /// Run one ticket on a fresh thread.
    ///
    /// The completion lands on the channel whenever the transport finishes;
    /// a dropped receiver just discards it. If the thread cannot be spawned
    /// at all, an unavailable completion is delivered synchronously so the
    /// check still fails closed.
    pub fn dispatch(&self, ticket: CheckTicket) {
        let CheckTicket {
            field,
            sequence,
            request,
        } = ticket;
        tracing::debug!(field = %field, sequence, "server check dispatched");

        let transport = Arc::clone(&self.transport);
        let sender = self.sender.clone();
        let thread_field = field.clone();
        let spawned = thread::Builder::new()
            .name("valwire-check".to_string())
            .spawn(move || {
                let started = Instant::now();
                let outcome = match transport.perform(&request) {
                    Ok(body) => CheckOutcome::Body(body),
                    Err(error) => CheckOutcome::Transport(error),
                };
                let _ = sender.send(CheckCompletion {
                    field: thread_field,
                    sequence,
                    outcome,
                    elapsed: started.elapsed(),
                });
            });

        if let Err(error) = spawned {
            tracing::error!(field = %field, %error, "check worker thread failed to spawn");
            let _ = self.sender.send(CheckCompletion {
                field,
                sequence,
                outcome: CheckOutcome::Transport(TransportError::Unavailable(format!(
                    "worker thread spawn failed: {error}"
                ))),
                elapsed: Duration::ZERO,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
