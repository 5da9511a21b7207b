#![forbid(unsafe_code)]

//! Message resolution: one function, one answer.
//!
//! Resolution is total. Author overrides win when present; the oracle's
//! default covers everything else, including [`Reason::Unknown`].

use crate::field::Field;
use crate::oracle::ValidityOracle;
use crate::validity::Reason;

/// Resolve the message to display for a field judged invalid for `reason`.
///
/// The author's override for that reason wins; otherwise the oracle's
/// default applies. [`Reason::Unknown`] never consults overrides since it
/// cannot carry one.
#[must_use]
pub fn resolve_message(field: &Field, reason: Reason, oracle: &dyn ValidityOracle) -> String {
    if reason != Reason::Unknown
        && let Some(text) = field.overrides.get(reason)
    {
        return text.to_string();
    }
    oracle.message_for(field, reason)
}
