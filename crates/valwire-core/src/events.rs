#![forbid(unsafe_code)]

//! Field and submission events observable on a form.

use std::fmt;

/// Events a field can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldEvent {
    /// Focus left the field.
    Blur,
    /// A committed value change.
    Change,
    /// A keystroke-level edit.
    Input,
    /// The field was judged invalid by a validity check.
    Invalid,
}

impl FieldEvent {
    /// Stable lowercase name, for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blur => "blur",
            Self::Change => "change",
            Self::Input => "input",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for FieldEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier handed out when a listener is added to a form.
pub type ListenerId = u64;

/// A submission attempt passed to submit listeners.
///
/// Listeners cancel the submission by calling [`prevent_default`].
///
/// [`prevent_default`]: SubmitIntent::prevent_default
#[derive(Debug)]
pub struct SubmitIntent {
    prevented: bool,
}

impl SubmitIntent {
    pub(crate) fn new() -> Self {
        Self { prevented: false }
    }

    /// Cancel the submission. Irrevocable for this attempt.
    pub fn prevent_default(&mut self) {
        self.prevented = true;
    }

    /// Whether any listener cancelled the submission.
    #[must_use]
    pub fn is_prevented(&self) -> bool {
        self.prevented
    }
}

/// Result of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No listener cancelled; the host may carry the submission forward.
    Proceeded,
    /// The submission was cancelled.
    Cancelled,
}

impl SubmitOutcome {
    /// Whether the attempt was cancelled.
    #[must_use]
    pub fn is_cancelled(self) -> bool {
        self == Self::Cancelled
    }
}
