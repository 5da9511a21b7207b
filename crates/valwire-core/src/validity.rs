#![forbid(unsafe_code)]

//! Validity flags and the reason vocabulary.
//!
//! A [`ValidityFlags`] set is what an oracle reports for a field: zero or
//! more constraint violations. Classification collapses that set into a
//! single [`Reason`], the vocabulary used for message overrides and logging.

use bitflags::bitflags;

bitflags! {
    /// The raw validity state of a field as reported by an oracle.
    ///
    /// A field is valid exactly when the set is empty. Oracles may set any
    /// combination of flags; classification decides which one is reported.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ValidityFlags: u16 {
        /// A custom error was installed programmatically.
        const CUSTOM_ERROR = 1 << 0;
        /// The field is required and has no value.
        const VALUE_MISSING = 1 << 1;
        /// The value does not match the pattern constraint.
        const PATTERN_MISMATCH = 1 << 2;
        /// The value does not have the shape the field kind demands.
        const TYPE_MISMATCH = 1 << 3;
        /// The raw input could not be converted to the field's value type.
        const BAD_INPUT = 1 << 4;
        /// The value is above the maximum.
        const RANGE_OVERFLOW = 1 << 5;
        /// The value is below the minimum.
        const RANGE_UNDERFLOW = 1 << 6;
        /// The value has more characters than allowed.
        const TOO_LONG = 1 << 7;
        /// The value has fewer characters than required.
        const TOO_SHORT = 1 << 8;
        /// The value does not land on the step grid.
        const STEP_MISMATCH = 1 << 9;
    }
}

impl ValidityFlags {
    /// Returns `true` if no violation is flagged.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Reason
// ---------------------------------------------------------------------------

/// The single reported cause of an invalid verdict.
///
/// `BadInput` deliberately covers both [`ValidityFlags::TYPE_MISMATCH`] and
/// [`ValidityFlags::BAD_INPUT`]: both mean "the text does not parse as what
/// this field holds", and they share one message slot.
///
/// `Unknown` is the fallback for flag sets no known reason matches. It has
/// no override slot; it always resolves through the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// A programmatic custom error is installed.
    CustomError,
    /// Required field left empty.
    ValueMissing,
    /// Pattern constraint violated.
    PatternMismatch,
    /// Value cannot be interpreted as the field's kind.
    BadInput,
    /// Value above the maximum.
    RangeOverflow,
    /// Value below the minimum.
    RangeUnderflow,
    /// Too many characters.
    TooLong,
    /// Too few characters.
    TooShort,
    /// Value off the step grid.
    StepMismatch,
    /// Invalid for a cause this vocabulary does not know.
    Unknown,
}

impl Reason {
    /// Stable snake_case name, used for logging and diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::CustomError => "custom_error",
            Reason::ValueMissing => "value_missing",
            Reason::PatternMismatch => "pattern_mismatch",
            Reason::BadInput => "bad_input",
            Reason::RangeOverflow => "range_overflow",
            Reason::RangeUnderflow => "range_underflow",
            Reason::TooLong => "too_long",
            Reason::TooShort => "too_short",
            Reason::StepMismatch => "step_mismatch",
            Reason::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_flags_are_valid() {
        assert!(ValidityFlags::empty().is_valid());
        assert!(!ValidityFlags::VALUE_MISSING.is_valid());
    }

    #[test]
    fn flags_are_distinct_bits() {
        let all = ValidityFlags::all();
        assert_eq!(all.bits().count_ones(), 10);
    }

    #[test]
    fn combining_flags() {
        let flags = ValidityFlags::VALUE_MISSING | ValidityFlags::TOO_SHORT;
        assert!(flags.contains(ValidityFlags::VALUE_MISSING));
        assert!(flags.contains(ValidityFlags::TOO_SHORT));
        assert!(!flags.contains(ValidityFlags::CUSTOM_ERROR));
    }

    #[test]
    fn reason_names_are_stable() {
        assert_eq!(Reason::CustomError.as_str(), "custom_error");
        assert_eq!(Reason::ValueMissing.as_str(), "value_missing");
        assert_eq!(Reason::BadInput.as_str(), "bad_input");
        assert_eq!(Reason::Unknown.as_str(), "unknown");
        assert_eq!(format!("{}", Reason::StepMismatch), "step_mismatch");
    }
}
