#![forbid(unsafe_code)]

//! Verbatim capture of bus traffic for assertions.

use std::cell::RefCell;
use std::rc::Rc;

use valwire_core::{Signal, SignalBus, SubscriberId};

/// Records every signal on a bus, in delivery order.
#[derive(Debug)]
pub struct SignalRecorder {
    bus: SignalBus,
    subscriber: SubscriberId,
    log: Rc<RefCell<Vec<Signal>>>,
}

impl SignalRecorder {
    /// Subscribe a recorder to `bus`.
    #[must_use]
    pub fn attach(bus: &SignalBus) -> Self {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let subscriber = bus.subscribe(move |signal| sink.borrow_mut().push(signal.clone()));
        Self {
            bus: bus.clone(),
            subscriber,
            log,
        }
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn signals(&self) -> Vec<Signal> {
        self.log.borrow().clone()
    }

    /// Compact one-line labels for the recorded signals, easiest to assert
    /// against: `invalid:{location}:{message}`, `valid:{location}`,
    /// `submit`.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .map(|signal| match signal {
                Signal::FieldInvalid { location, message } => {
                    format!("invalid:{location}:{message}")
                }
                Signal::FieldValid { location } => format!("valid:{location}"),
                Signal::SubmitAttempted => "submit".to_string(),
            })
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    /// Number of recorded signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    /// Stop recording. Also happens on drop.
    pub fn detach(&self) {
        self.bus.unsubscribe(self.subscriber);
    }
}

impl Drop for SignalRecorder {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_delivery_order_with_labels() {
        let bus = SignalBus::new();
        let recorder = SignalRecorder::attach(&bus);

        bus.emit(Signal::SubmitAttempted);
        bus.emit(Signal::FieldInvalid {
            location: "email-error".into(),
            message: "Invalid format".to_string(),
        });
        bus.emit(Signal::FieldValid {
            location: "email-error".into(),
        });

        assert_eq!(
            recorder.labels(),
            vec![
                "submit",
                "invalid:email-error:Invalid format",
                "valid:email-error",
            ]
        );
        assert_eq!(recorder.len(), 3);

        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn detach_stops_recording() {
        let bus = SignalBus::new();
        let recorder = SignalRecorder::attach(&bus);
        recorder.detach();
        bus.emit(Signal::SubmitAttempted);
        assert!(recorder.is_empty());
        assert_eq!(bus.subscriber_count(), 0);
    }
}
