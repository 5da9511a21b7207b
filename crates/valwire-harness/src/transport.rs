#![forbid(unsafe_code)]

//! Check transports for tests: scripted answers, holdable answers, and
//! guaranteed failure.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use valwire_core::{CheckRequest, CheckTransport, TransportError};

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// Answers checks from a script keyed by `(field, value)`.
///
/// Unscripted requests get the fallback body, an accepting verdict unless
/// overridden. Bodies are raw strings, so malformed-response handling can
/// be scripted too.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    responses: HashMap<(String, String), String>,
    fallback: String,
    delay: Option<Duration>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// An empty script: everything gets the accepting fallback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            fallback: r#"{"valid": true}"#.to_string(),
            delay: None,
        }
    }

    /// Script a raw body for one `(field, value)` pair.
    #[must_use]
    pub fn respond(mut self, field: &str, value: &str, body: impl Into<String>) -> Self {
        self.responses
            .insert((field.to_string(), value.to_string()), body.into());
        self
    }

    /// Script an accepting verdict with an `"OK"` message.
    #[must_use]
    pub fn accept(self, field: &str, value: &str) -> Self {
        self.respond(field, value, r#"{"valid": true, "message": "OK"}"#)
    }

    /// Script a rejecting verdict carrying `message`.
    #[must_use]
    pub fn reject(self, field: &str, value: &str, message: &str) -> Self {
        let body = serde_json::json!({ "valid": false, "message": message }).to_string();
        self.respond(field, value, body)
    }

    /// Replace the fallback body for unscripted requests.
    #[must_use]
    pub fn with_fallback(mut self, body: impl Into<String>) -> Self {
        self.fallback = body.into();
        self
    }

    /// Sleep this long before every answer.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl CheckTransport for ScriptedTransport {
    fn perform(&self, request: &CheckRequest) -> Result<String, TransportError> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        let key = (request.field.as_str().to_string(), request.value.clone());
        Ok(self
            .responses
            .get(&key)
            .unwrap_or(&self.fallback)
            .clone())
    }
}

// ---------------------------------------------------------------------------
// LatchedTransport
// ---------------------------------------------------------------------------

/// Holds every check until [`release`] is called, then delegates.
///
/// This is how tests prove that nothing is published before a check
/// resolves: issue the check, assert silence, release, pump. A check still
/// waiting after `max_wait` fails as unavailable so a forgotten release
/// cannot hang a suite.
///
/// [`release`]: LatchedTransport::release
#[derive(Clone)]
pub struct LatchedTransport {
    inner: Arc<dyn CheckTransport>,
    latch: Arc<(Mutex<bool>, Condvar)>,
    max_wait: Duration,
}

impl LatchedTransport {
    /// Hold checks destined for `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn CheckTransport>) -> Self {
        Self {
            inner,
            latch: Arc::new((Mutex::new(false), Condvar::new())),
            max_wait: Duration::from_secs(5),
        }
    }

    /// Shorten or lengthen the give-up deadline.
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Let all held and future checks through.
    pub fn release(&self) {
        let (flag, signal) = &*self.latch;
        *flag.lock().unwrap() = true;
        signal.notify_all();
    }

    fn wait_released(&self) -> bool {
        let (flag, signal) = &*self.latch;
        let deadline = Instant::now() + self.max_wait;
        let mut released = flag.lock().unwrap();
        while !*released {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(
                    max_wait_ms = self.max_wait.as_millis() as u64,
                    "latch never released; check gives up"
                );
                return false;
            }
            released = signal.wait_timeout(released, remaining).unwrap().0;
        }
        true
    }
}

impl CheckTransport for LatchedTransport {
    fn perform(&self, request: &CheckRequest) -> Result<String, TransportError> {
        if !self.wait_released() {
            return Err(TransportError::Unavailable(
                "latch was never released".to_string(),
            ));
        }
        self.inner.perform(request)
    }
}

// ---------------------------------------------------------------------------
// FailingTransport
// ---------------------------------------------------------------------------

/// Fails every check as unavailable.
#[derive(Debug, Clone)]
pub struct FailingTransport {
    detail: String,
}

impl FailingTransport {
    /// Fail with this detail text.
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl CheckTransport for FailingTransport {
    fn perform(&self, _request: &CheckRequest) -> Result<String, TransportError> {
        Err(TransportError::Unavailable(self.detail.clone()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use valwire_core::FieldName;

    fn request(field: &str, value: &str) -> CheckRequest {
        CheckRequest {
            action: "/validate".to_string(),
            field: FieldName::from(field),
            value: value.to_string(),
        }
    }

    #[test]
    fn scripts_answer_by_field_and_value() {
        let transport = ScriptedTransport::new()
            .accept("last-name", "Bloggs")
            .reject("last-name", "Smith", "Enter 'Bloggs'");

        let ok = transport.perform(&request("last-name", "Bloggs")).unwrap();
        assert!(ok.contains(r#""valid":true"#) || ok.contains(r#""valid": true"#));

        let no = transport.perform(&request("last-name", "Smith")).unwrap();
        assert!(no.contains("Enter 'Bloggs'"));

        let fallback = transport.perform(&request("email", "a@b.co")).unwrap();
        assert_eq!(fallback, r#"{"valid": true}"#);
    }

    #[test]
    fn latch_holds_until_released() {
        let latched = LatchedTransport::new(Arc::new(ScriptedTransport::new()))
            .with_max_wait(Duration::from_millis(50));
        // Never released: the check gives up as unavailable.
        assert!(latched.perform(&request("a", "x")).is_err());

        let latched = LatchedTransport::new(Arc::new(ScriptedTransport::new()));
        latched.release();
        assert!(latched.perform(&request("a", "x")).is_ok());
    }

    #[test]
    fn failing_transport_always_fails() {
        let transport = FailingTransport::new("offline");
        let error = transport.perform(&request("a", "x")).unwrap_err();
        assert!(error.to_string().contains("offline"));
    }
}
