#![forbid(unsafe_code)]

//! Server check wire types and the transport seam.
//!
//! A server check asks a remote authority for a verdict on a locally-valid
//! value. The body coming back must be a JSON object with a boolean
//! `valid` and an optional string `message`; anything else is malformed
//! and treated as a failure, never a pass. Transports are injected through
//! [`CheckTransport`], so production wiring and tests use the same path.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

use crate::field::FieldName;

/// Message shown when a check could not reach the authority.
pub const CHECK_UNAVAILABLE_MESSAGE: &str =
    "Validation could not be completed. Check your connection and try again.";

/// Message shown when the authority's response was unreadable.
pub const MALFORMED_CHECK_MESSAGE: &str =
    "Validation response was malformed; expected a JSON object with a boolean \"valid\" and an optional string \"message\".";

// ---------------------------------------------------------------------------
// CheckRequest
// ---------------------------------------------------------------------------

/// One server check: which endpoint, for which field, with what value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRequest {
    /// Endpoint the check goes to.
    pub action: String,
    /// Field under check.
    pub field: FieldName,
    /// Value at the moment the check was issued.
    pub value: String,
}

impl CheckRequest {
    /// The query parameters a transport sends: `field` and `value`.
    #[must_use]
    pub fn query_pairs(&self) -> [(&'static str, &str); 2] {
        [("field", self.field.as_str()), ("value", &self.value)]
    }
}

// ---------------------------------------------------------------------------
// CheckResponse
// ---------------------------------------------------------------------------

/// Parsed verdict from the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    /// The verdict. Required; a body without it is malformed.
    pub valid: bool,
    /// Optional message text accompanying the verdict.
    #[serde(default)]
    pub message: Option<String>,
}

impl CheckResponse {
    /// Parse a response body.
    ///
    /// The body must be a JSON object carrying a boolean `valid`. A missing
    /// or mistyped `valid`, a non-object body, or unparseable JSON is an
    /// error. Unknown keys are ignored.
    pub fn parse(body: &str) -> Result<Self, MalformedResponse> {
        Ok(serde_json::from_str(body)?)
    }
}

/// A response body that could not be read as a [`CheckResponse`].
#[derive(Debug)]
pub struct MalformedResponse {
    detail: String,
}

impl fmt::Display for MalformedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed check response: {}", self.detail)
    }
}

impl std::error::Error for MalformedResponse {}

impl From<serde_json::Error> for MalformedResponse {
    fn from(error: serde_json::Error) -> Self {
        Self {
            detail: error.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// CheckTransport
// ---------------------------------------------------------------------------

/// Why a transport could not produce a response body.
#[derive(Debug)]
pub enum TransportError {
    /// The authority could not be reached or refused to answer.
    Unavailable(String),
    /// An I/O failure along the way.
    Io(io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(detail) => write!(f, "check transport unavailable: {detail}"),
            Self::Io(error) => write!(f, "check transport i/o: {error}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unavailable(_) => None,
            Self::Io(error) => Some(error),
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

/// Carries a [`CheckRequest`] to the authority and returns the raw body.
///
/// Implementations run on worker threads, hence the `Send + Sync` bound.
/// Any closure with the right shape is a transport.
pub trait CheckTransport: Send + Sync {
    /// Perform the check, returning the raw response body.
    fn perform(&self, request: &CheckRequest) -> Result<String, TransportError>;
}

impl<F> CheckTransport for F
where
    F: Fn(&CheckRequest) -> Result<String, TransportError> + Send + Sync,
{
    fn perform(&self, request: &CheckRequest) -> Result<String, TransportError> {
        self(request)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
