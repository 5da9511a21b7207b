#![forbid(unsafe_code)]

//! Fixed-priority classification of validity flags.
//!
//! An oracle may flag several violations at once; exactly one is reported.
//! The priority ladder is fixed and first-match-wins, so the reported reason
//! is deterministic for any flag set.

use crate::validity::{Reason, ValidityFlags};

/// The classification ladder, highest priority first.
///
/// Each entry maps a flag mask to its reported reason. `BadInput` owns two
/// flags; everything else owns one.
pub const PRIORITY: [(ValidityFlags, Reason); 9] = [
    (ValidityFlags::CUSTOM_ERROR, Reason::CustomError),
    (ValidityFlags::VALUE_MISSING, Reason::ValueMissing),
    (ValidityFlags::PATTERN_MISMATCH, Reason::PatternMismatch),
    (
        ValidityFlags::TYPE_MISMATCH.union(ValidityFlags::BAD_INPUT),
        Reason::BadInput,
    ),
    (ValidityFlags::RANGE_OVERFLOW, Reason::RangeOverflow),
    (ValidityFlags::RANGE_UNDERFLOW, Reason::RangeUnderflow),
    (ValidityFlags::TOO_LONG, Reason::TooLong),
    (ValidityFlags::TOO_SHORT, Reason::TooShort),
    (ValidityFlags::STEP_MISMATCH, Reason::StepMismatch),
];

/// The outcome of classifying a flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No violations; the field passed local validation.
    Valid,
    /// At least one violation; the highest-priority reason is reported.
    Invalid(Reason),
}

impl Verdict {
    /// Returns `true` if the verdict is `Valid`.
    #[must_use]
    pub fn is_valid(self) -> bool {
        matches!(self, Verdict::Valid)
    }

    /// Returns the reported reason, or `None` when valid.
    #[must_use]
    pub fn reason(self) -> Option<Reason> {
        match self {
            Verdict::Valid => None,
            Verdict::Invalid(reason) => Some(reason),
        }
    }
}

/// Collapse a flag set into a single verdict.
///
/// An empty set is `Valid`. A non-empty set yields the first reason in
/// [`PRIORITY`] whose mask intersects the set. A non-empty set that matches
/// no known mask (flags from a newer oracle revision, or raw bits injected
/// via `from_bits_retain`) is reported as [`Reason::Unknown`] and logged;
/// it is never reported valid.
#[must_use]
pub fn classify(flags: ValidityFlags) -> Verdict {
    if flags.is_empty() {
        return Verdict::Valid;
    }
    for (mask, reason) in PRIORITY {
        if flags.intersects(mask) {
            return Verdict::Invalid(reason);
        }
    }
    tracing::warn!(
        bits = flags.bits(),
        "validity flags set but no known reason matched"
    );
    Verdict::Invalid(Reason::Unknown)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_valid() {
        assert_eq!(classify(ValidityFlags::empty()), Verdict::Valid);
        assert!(classify(ValidityFlags::empty()).is_valid());
    }

    #[test]
    fn single_flags_map_to_their_reason() {
        let cases = [
            (ValidityFlags::CUSTOM_ERROR, Reason::CustomError),
            (ValidityFlags::VALUE_MISSING, Reason::ValueMissing),
            (ValidityFlags::PATTERN_MISMATCH, Reason::PatternMismatch),
            (ValidityFlags::TYPE_MISMATCH, Reason::BadInput),
            (ValidityFlags::BAD_INPUT, Reason::BadInput),
            (ValidityFlags::RANGE_OVERFLOW, Reason::RangeOverflow),
            (ValidityFlags::RANGE_UNDERFLOW, Reason::RangeUnderflow),
            (ValidityFlags::TOO_LONG, Reason::TooLong),
            (ValidityFlags::TOO_SHORT, Reason::TooShort),
            (ValidityFlags::STEP_MISMATCH, Reason::StepMismatch),
        ];
        for (flags, reason) in cases {
            assert_eq!(classify(flags), Verdict::Invalid(reason), "flags {flags:?}");
        }
    }

    #[test]
    fn custom_error_outranks_everything() {
        let flags = ValidityFlags::all();
        assert_eq!(classify(flags), Verdict::Invalid(Reason::CustomError));
    }

    #[test]
    fn value_missing_outranks_pattern() {
        let flags = ValidityFlags::VALUE_MISSING | ValidityFlags::PATTERN_MISMATCH;
        assert_eq!(classify(flags), Verdict::Invalid(Reason::ValueMissing));
    }

    #[test]
    fn pattern_outranks_lengths() {
        let flags =
            ValidityFlags::PATTERN_MISMATCH | ValidityFlags::TOO_SHORT | ValidityFlags::TOO_LONG;
        assert_eq!(classify(flags), Verdict::Invalid(Reason::PatternMismatch));
    }

    #[test]
    fn overflow_outranks_underflow() {
        let flags = ValidityFlags::RANGE_OVERFLOW | ValidityFlags::RANGE_UNDERFLOW;
        assert_eq!(classify(flags), Verdict::Invalid(Reason::RangeOverflow));
    }

    #[test]
    fn type_and_bad_input_share_a_reason() {
        let flags = ValidityFlags::TYPE_MISMATCH | ValidityFlags::BAD_INPUT;
        assert_eq!(classify(flags), Verdict::Invalid(Reason::BadInput));
    }

    #[test]
    fn unrecognized_bits_are_invalid_not_valid() {
        let flags = ValidityFlags::from_bits_retain(1 << 12);
        assert!(!flags.is_empty());
        assert_eq!(classify(flags), Verdict::Invalid(Reason::Unknown));
    }

    #[test]
    fn unrecognized_bits_next_to_known_flag_use_the_known_reason() {
        let flags = ValidityFlags::from_bits_retain((1 << 12) | ValidityFlags::TOO_SHORT.bits());
        assert_eq!(classify(flags), Verdict::Invalid(Reason::TooShort));
    }

    #[test]
    fn verdict_reason_accessor() {
        assert_eq!(classify(ValidityFlags::empty()).reason(), None);
        assert_eq!(
            classify(ValidityFlags::TOO_LONG).reason(),
            Some(Reason::TooLong)
        );
    }
}
