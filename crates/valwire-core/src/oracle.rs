#![forbid(unsafe_code)]

//! Constraint evaluation: turning a field's state into validity flags.
//!
//! The [`ValidityOracle`] trait is the seam between field declarations and
//! the judging logic. The built-in [`ConstraintOracle`] evaluates the
//! declarative constraints on [`Field`] and supplies a default message for
//! every reason, so message resolution is total.
//!
//! Evaluation rules:
//!
//! - A non-empty custom error always raises `CUSTOM_ERROR`.
//! - An empty value raises `VALUE_MISSING` when the field is required, and
//!   nothing else. Shape, pattern, length, and numeric checks all skip
//!   empty values.
//! - Pattern matching is anchored: the whole value must match.
//! - Length constraints count characters, not bytes.
//! - Range and step checks apply only to number fields whose value parses.

use regex::Regex;

use crate::field::{Field, FieldKind, Step};
use crate::validity::{Reason, ValidityFlags};

/// Judge of field validity and source of default messages.
pub trait ValidityOracle {
    /// Evaluate a field's current state into validity flags. Empty flags
    /// mean the field is valid.
    fn evaluate(&self, field: &Field) -> ValidityFlags;

    /// The default message for a field judged invalid for `reason`. Must
    /// return usable text for every reason.
    fn message_for(&self, field: &Field, reason: Reason) -> String;
}

/// Fallback message when nothing more specific applies.
const GENERIC: &str = "Enter a valid value";

/// The built-in oracle over [`Field`] constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintOracle;

impl ConstraintOracle {
    /// Create the oracle.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ValidityOracle for ConstraintOracle {
    fn evaluate(&self, field: &Field) -> ValidityFlags {
        let mut flags = ValidityFlags::empty();

        if field.custom_error.as_deref().is_some_and(|e| !e.is_empty()) {
            flags |= ValidityFlags::CUSTOM_ERROR;
        }

        if field.value.is_empty() {
            if field.constraints.required {
                flags |= ValidityFlags::VALUE_MISSING;
            }
            return flags;
        }

        match field.kind {
            FieldKind::Text => {}
            FieldKind::Email => {
                if !email_shape_ok(&field.value) {
                    flags |= ValidityFlags::TYPE_MISMATCH;
                }
            }
            FieldKind::Url => {
                if !url_shape_ok(&field.value) {
                    flags |= ValidityFlags::TYPE_MISMATCH;
                }
            }
            FieldKind::Number => {
                if field.value.trim().parse::<f64>().is_err() {
                    flags |= ValidityFlags::BAD_INPUT;
                }
            }
        }

        if let Some(pattern) = &field.constraints.pattern
            && let Some(re) = anchored(pattern)
            && !re.is_match(&field.value)
        {
            flags |= ValidityFlags::PATTERN_MISMATCH;
        }

        let chars = field.value.chars().count();
        if let Some(min_length) = field.constraints.min_length
            && chars < min_length
        {
            flags |= ValidityFlags::TOO_SHORT;
        }
        if let Some(max_length) = field.constraints.max_length
            && chars > max_length
        {
            flags |= ValidityFlags::TOO_LONG;
        }

        if field.kind == FieldKind::Number
            && let Ok(value) = field.value.trim().parse::<f64>()
        {
            if let Some(min) = field.constraints.min
                && value < min
            {
                flags |= ValidityFlags::RANGE_UNDERFLOW;
            }
            if let Some(max) = field.constraints.max
                && value > max
            {
                flags |= ValidityFlags::RANGE_OVERFLOW;
            }
            if let Some(Step::Of(step)) = field.constraints.step
                && step_mismatch(value, step, field.constraints.min)
            {
                flags |= ValidityFlags::STEP_MISMATCH;
            }
        }

        flags
    }

    fn message_for(&self, field: &Field, reason: Reason) -> String {
        match reason {
            Reason::CustomError => field
                .custom_error
                .as_deref()
                .filter(|e| !e.is_empty())
                .unwrap_or(GENERIC)
                .to_string(),
            Reason::ValueMissing => "This field is required".to_string(),
            Reason::PatternMismatch => "Invalid format".to_string(),
            Reason::BadInput => match field.kind {
                FieldKind::Email => "Invalid email address".to_string(),
                FieldKind::Url => "Invalid URL".to_string(),
                FieldKind::Number => "Must be a number".to_string(),
                FieldKind::Text => GENERIC.to_string(),
            },
            Reason::RangeOverflow => match field.constraints.max {
                Some(max) => format!("Must be at most {max}"),
                None => GENERIC.to_string(),
            },
            Reason::RangeUnderflow => match field.constraints.min {
                Some(min) => format!("Must be at least {min}"),
                None => GENERIC.to_string(),
            },
            Reason::TooLong => match field.constraints.max_length {
                Some(max_length) => format!("Must be at most {max_length} characters"),
                None => GENERIC.to_string(),
            },
            Reason::TooShort => match field.constraints.min_length {
                Some(min_length) => format!("Must be at least {min_length} characters"),
                None => GENERIC.to_string(),
            },
            Reason::StepMismatch => match field.constraints.step {
                Some(Step::Of(step)) => format!("Must be a multiple of {step}"),
                _ => GENERIC.to_string(),
            },
            Reason::Unknown => GENERIC.to_string(),
        }
    }
}

/// Compile a pattern anchored to the whole value.
///
/// An unusable pattern is logged and ignored; the constraint then accepts
/// everything, matching how browsers treat broken pattern attributes.
fn anchored(pattern: &str) -> Option<Regex> {
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => Some(re),
        Err(error) => {
            tracing::warn!(%error, pattern, "unusable pattern constraint ignored");
            None
        }
    }
}

/// Loose email shape check: one `@` splitting a non-empty local part from a
/// dotted domain whose labels are non-empty and whose last label has at
/// least two characters.
fn email_shape_ok(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return false;
    }
    labels.last().is_some_and(|tld| tld.len() >= 2)
}

/// Absolute http(s) URL with something after the scheme.
fn url_shape_ok(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    rest.is_some_and(|rest| !rest.is_empty())
}

/// Whether `value` misses the step grid anchored at the minimum (or zero).
///
/// Uses a relative tolerance so accumulated float error near large values
/// does not raise false mismatches.
fn step_mismatch(value: f64, step: f64, min: Option<f64>) -> bool {
    if !(step > 0.0) || !step.is_finite() {
        return false;
    }
    let base = min.unwrap_or(0.0);
    let offset = value - base;
    let nearest = (offset / step).round() * step;
    let tolerance = 1e-9 * offset.abs().max(step).max(1.0);
    (offset - nearest).abs() > tolerance
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
