#![forbid(unsafe_code)]

//! Runtime attachment configuration.
//!
//! Configs are plain structs validated once, at attach time. A config that
//! cannot work is rejected with an [`AttachError`] before any listener or
//! subscription exists, so a failed attach leaves no trace on the form.

use std::fmt;
use std::sync::Arc;

use valwire_core::{CheckTransport, FieldEvent, FieldName, FormHandle, LocationId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an attach was refused.
#[derive(Debug)]
pub enum AttachError {
    /// The activation event was the invalid notice, which the producer
    /// already listens to. Hooking it as activation would loop.
    ActivationIsInvalidNotice,
    /// Fields ask for server checks but the config carries no transport.
    MissingCheckTransport {
        /// The server-checked fields, in document order.
        fields: Vec<FieldName>,
    },
    /// The server check action is empty or whitespace.
    EmptyCheckAction,
    /// The default display location id is empty.
    EmptyLocationId,
}

impl fmt::Display for AttachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActivationIsInvalidNotice => {
                write!(f, "activation event cannot be the invalid notice")
            }
            Self::MissingCheckTransport { fields } => {
                let names: Vec<&str> = fields.iter().map(FieldName::as_str).collect();
                write!(
                    f,
                    "fields [{}] are server-checked but no server check is configured",
                    names.join(", ")
                )
            }
            Self::EmptyCheckAction => write!(f, "server check action is empty"),
            Self::EmptyLocationId => write!(f, "default display location id is empty"),
        }
    }
}

impl std::error::Error for AttachError {}

// ---------------------------------------------------------------------------
// ServerCheck
// ---------------------------------------------------------------------------

/// Where server checks go and how they get there.
#[derive(Clone)]
pub struct ServerCheck {
    /// Endpoint identifier passed through on every request.
    pub action: String,
    /// Transport carrying requests to the authority.
    pub transport: Arc<dyn CheckTransport>,
}

impl ServerCheck {
    /// Pair an action with a transport.
    #[must_use]
    pub fn new(action: impl Into<String>, transport: Arc<dyn CheckTransport>) -> Self {
        Self {
            action: action.into(),
            transport,
        }
    }
}

impl fmt::Debug for ServerCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerCheck")
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ProducerConfig
// ---------------------------------------------------------------------------

/// Configuration for [`Producer::attach`].
///
/// [`Producer::attach`]: crate::Producer::attach
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Which field event triggers validation. [`FieldEvent::Blur`] by
    /// default; [`FieldEvent::Invalid`] is rejected at attach.
    pub activation: FieldEvent,
    /// Server check wiring, required when any field is server-checked.
    pub server_check: Option<ServerCheck>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            activation: FieldEvent::Blur,
            server_check: None,
        }
    }
}

impl ProducerConfig {
    /// Builder: validate on a different field event.
    #[must_use]
    pub fn with_activation(mut self, activation: FieldEvent) -> Self {
        self.activation = activation;
        self
    }

    /// Builder: wire server checks.
    #[must_use]
    pub fn with_server_check(mut self, server_check: ServerCheck) -> Self {
        self.server_check = Some(server_check);
        self
    }

    /// Check this config against the form it is about to attach to.
    pub fn validate(&self, form: &FormHandle) -> Result<(), AttachError> {
        if self.activation == FieldEvent::Invalid {
            return Err(AttachError::ActivationIsInvalidNotice);
        }
        if let Some(server_check) = &self.server_check {
            if server_check.action.trim().is_empty() {
                return Err(AttachError::EmptyCheckAction);
            }
        } else {
            let fields: Vec<FieldName> = form
                .field_names()
                .into_iter()
                .filter(|name| {
                    form.with_field(name.as_str(), |field| field.server_checked)
                        .unwrap_or(false)
                })
                .collect();
            if !fields.is_empty() {
                return Err(AttachError::MissingCheckTransport { fields });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ConsumerConfig
// ---------------------------------------------------------------------------

/// Configuration for [`Consumer::attach`].
///
/// [`Consumer::attach`]: crate::Consumer::attach
#[derive(Debug, Clone, Default)]
pub struct ConsumerConfig {
    /// Fallback location for messages whose own location cannot take text.
    pub default_location: Option<LocationId>,
}

impl ConsumerConfig {
    /// Builder: set the fallback location.
    #[must_use]
    pub fn with_default_location(mut self, id: impl Into<LocationId>) -> Self {
        self.default_location = Some(id.into());
        self
    }

    /// Check this config for shape faults.
    pub fn validate(&self) -> Result<(), AttachError> {
        if self
            .default_location
            .as_ref()
            .is_some_and(|id| id.as_str().trim().is_empty())
        {
            return Err(AttachError::EmptyLocationId);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
