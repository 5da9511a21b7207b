#![forbid(unsafe_code)]

//! Field descriptions: names, kinds, constraints, and per-field state.
//!
//! A [`Field`] carries everything needed to judge one input: its declared
//! constraints, its current value, an optional custom error set by the host,
//! and presentation hints (display reference, message overrides).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::display::{LocationId, error_location_for};
use crate::validity::Reason;

// ---------------------------------------------------------------------------
// FieldName
// ---------------------------------------------------------------------------

/// Name of a field, unique within a form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldName(String);

impl FieldName {
    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for FieldName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

/// What shape of input a field expects.
///
/// The kind decides which well-formedness checks apply and how numeric
/// constraints are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    /// Free text. No shape check.
    #[default]
    Text,
    /// An email address.
    Email,
    /// An absolute http(s) URL.
    Url,
    /// A decimal number.
    Number,
}

impl FieldKind {
    /// Stable lowercase name, for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Url => "url",
            Self::Number => "number",
        }
    }
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// Step constraint for numeric fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Any value is allowed.
    Any,
    /// Value must sit on a multiple of the step, measured from the minimum
    /// (or zero when no minimum is set).
    Of(f64),
}

/// Declarative constraints on a field's value.
///
/// All constraints are optional; an empty set accepts everything. Length
/// constraints count characters, not bytes. Range and step constraints only
/// apply to [`FieldKind::Number`] fields with a parseable value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    /// Value must be non-empty.
    pub required: bool,
    /// Regular expression the whole value must match.
    pub pattern: Option<String>,
    /// Inclusive numeric minimum.
    pub min: Option<f64>,
    /// Inclusive numeric maximum.
    pub max: Option<f64>,
    /// Numeric step.
    pub step: Option<Step>,
    /// Minimum length in characters.
    pub min_length: Option<usize>,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
}

// ---------------------------------------------------------------------------
// MessageOverrides
// ---------------------------------------------------------------------------

/// Author-supplied message text, keyed by reason.
///
/// When a field is judged invalid for a reason with an override, the
/// override wins over the built-in message. [`Reason::Unknown`] cannot be
/// overridden; attempts are logged and ignored.
#[derive(Debug, Clone, Default)]
pub struct MessageOverrides {
    map: HashMap<Reason, String>,
}

impl MessageOverrides {
    /// Set the message for a reason, replacing any previous override.
    pub fn set(&mut self, reason: Reason, message: impl Into<String>) {
        if reason == Reason::Unknown {
            tracing::warn!("ignoring message override for the unknown reason");
            return;
        }
        self.map.insert(reason, message.into());
    }

    /// The override for a reason, if any.
    #[must_use]
    pub fn get(&self, reason: Reason) -> Option<&str> {
        self.map.get(&reason).map(String::as_str)
    }

    /// Returns `true` when no override is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// One form field: declaration plus current state.
#[derive(Debug, Clone)]
pub struct Field {
    /// Unique name within the form.
    pub name: FieldName,
    /// Input shape.
    pub kind: FieldKind,
    /// Declarative constraints.
    pub constraints: Constraints,
    /// Current value. Always a string; numeric fields parse on evaluation.
    pub value: String,
    /// Host-set custom error. Non-empty text marks the field invalid with
    /// the highest priority.
    pub custom_error: Option<String>,
    /// Whether locally-valid values are additionally checked by a server
    /// authority.
    pub server_checked: bool,
    /// Explicit display location. When `None`, the `{name}-error`
    /// convention applies.
    pub display_ref: Option<LocationId>,
    /// Author message overrides.
    pub overrides: MessageOverrides,
}

impl Field {
    /// Create a field with no constraints and an empty value.
    #[must_use]
    pub fn new(name: impl Into<FieldName>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            constraints: Constraints::default(),
            value: String::new(),
            custom_error: None,
            server_checked: false,
            display_ref: None,
            overrides: MessageOverrides::default(),
        }
    }

    /// Builder: start from a value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Builder: mark the field required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.constraints.required = true;
        self
    }

    /// Builder: set the pattern constraint.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    /// Builder: set the numeric minimum.
    #[must_use]
    pub fn with_min(mut self, min: f64) -> Self {
        self.constraints.min = Some(min);
        self
    }

    /// Builder: set the numeric maximum.
    #[must_use]
    pub fn with_max(mut self, max: f64) -> Self {
        self.constraints.max = Some(max);
        self
    }

    /// Builder: set the numeric step.
    #[must_use]
    pub fn with_step(mut self, step: f64) -> Self {
        self.constraints.step = Some(Step::Of(step));
        self
    }

    /// Builder: set the minimum length in characters.
    #[must_use]
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.constraints.min_length = Some(min_length);
        self
    }

    /// Builder: set the maximum length in characters.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.constraints.max_length = Some(max_length);
        self
    }

    /// Builder: route locally-valid values through the server authority.
    #[must_use]
    pub fn with_server_check(mut self) -> Self {
        self.server_checked = true;
        self
    }

    /// Builder: set an explicit display location.
    #[must_use]
    pub fn with_display_ref(mut self, id: impl Into<LocationId>) -> Self {
        self.display_ref = Some(id.into());
        self
    }

    /// Builder: override the message for a reason.
    #[must_use]
    pub fn with_message(mut self, reason: Reason, message: impl Into<String>) -> Self {
        self.overrides.set(reason, message);
        self
    }

    /// Replace the current value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Set or clear the custom error. Empty text clears.
    pub fn set_custom_error(&mut self, error: Option<String>) {
        self.custom_error = error.filter(|text| !text.is_empty());
    }

    /// The display location this field's messages go to: the explicit
    /// reference when set, otherwise the `{name}-error` convention.
    #[must_use]
    pub fn display_location(&self) -> LocationId {
        self.display_ref
            .clone()
            .unwrap_or_else(|| error_location_for(&self.name))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_accumulate() {
        let field = Field::new("age", FieldKind::Number)
            .required()
            .with_min(18.0)
            .with_max(130.0)
            .with_step(1.0)
            .with_value("42");

        assert!(field.constraints.required);
        assert_eq!(field.constraints.min, Some(18.0));
        assert_eq!(field.constraints.max, Some(130.0));
        assert_eq!(field.constraints.step, Some(Step::Of(1.0)));
        assert_eq!(field.value, "42");
    }

    #[test]
    fn display_location_prefers_explicit_ref() {
        let plain = Field::new("email", FieldKind::Email);
        assert_eq!(plain.display_location().as_str(), "email-error");

        let routed = Field::new("email", FieldKind::Email).with_display_ref("banner");
        assert_eq!(routed.display_location().as_str(), "banner");
    }

    #[test]
    fn empty_custom_error_clears() {
        let mut field = Field::new("name", FieldKind::Text);
        field.set_custom_error(Some("taken".to_string()));
        assert_eq!(field.custom_error.as_deref(), Some("taken"));

        field.set_custom_error(Some(String::new()));
        assert_eq!(field.custom_error, None);

        field.set_custom_error(Some("taken".to_string()));
        field.set_custom_error(None);
        assert_eq!(field.custom_error, None);
    }

    #[test]
    fn overrides_reject_unknown() {
        let mut overrides = MessageOverrides::default();
        overrides.set(Reason::Unknown, "never shown");
        assert!(overrides.is_empty());

        overrides.set(Reason::ValueMissing, "please fill this in");
        assert_eq!(
            overrides.get(Reason::ValueMissing),
            Some("please fill this in")
        );
        assert_eq!(overrides.get(Reason::TooShort), None);
    }

    #[test]
    fn field_names_compare_by_text() {
        assert_eq!(FieldName::from("a"), FieldName::from("a".to_string()));
        assert!(FieldName::from("a") < FieldName::from("b"));
    }
}
