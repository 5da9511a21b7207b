#![forbid(unsafe_code)]

//! Display locations: the slots validation messages are rendered into.
//!
//! A [`DisplayBoard`] is the headless stand-in for whatever surface a host
//! renders messages on. Consumers write through it; hosts and tests read it.
//! Writing to an unregistered location is a no-op that reports `false`, the
//! same way writing to a missing element goes nowhere.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::field::FieldName;

// ---------------------------------------------------------------------------
// LocationId
// ---------------------------------------------------------------------------

/// Stable identifier of a display location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    /// Create a location id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LocationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The conventional display location for a field: `{field-name}-error`.
///
/// Used when a field carries no explicit display reference.
#[must_use]
pub fn error_location_for(name: &FieldName) -> LocationId {
    LocationId(format!("{}-error", name.as_str()))
}

// ---------------------------------------------------------------------------
// DisplayBoard
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct BoardInner {
    slots: BTreeMap<LocationId, String>,
}

/// A cloneable handle over the set of display locations and their text.
///
/// Clones share state. All writes are keyed by [`LocationId`]; locations
/// must be registered before text can land on them.
#[derive(Debug, Clone, Default)]
pub struct DisplayBoard {
    inner: Rc<RefCell<BoardInner>>,
}

impl DisplayBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a location. Registering twice is a no-op that keeps the
    /// existing text.
    pub fn register(&self, id: impl Into<LocationId>) {
        self.inner
            .borrow_mut()
            .slots
            .entry(id.into())
            .or_default();
    }

    /// Returns `true` if the location is registered.
    #[must_use]
    pub fn contains(&self, id: &LocationId) -> bool {
        self.inner.borrow().slots.contains_key(id)
    }

    /// Set the text of a registered location.
    ///
    /// Returns `false` without side effects when the location is not
    /// registered.
    pub fn set_text(&self, id: &LocationId, text: impl Into<String>) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.slots.get_mut(id) {
            Some(slot) => {
                *slot = text.into();
                true
            }
            None => false,
        }
    }

    /// Clear the text of a registered location.
    ///
    /// Returns `false` when the location is not registered.
    pub fn clear(&self, id: &LocationId) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.slots.get_mut(id) {
            Some(slot) => {
                slot.clear();
                true
            }
            None => false,
        }
    }

    /// Clear the text of every registered location.
    pub fn clear_registered(&self) {
        for slot in self.inner.borrow_mut().slots.values_mut() {
            slot.clear();
        }
    }

    /// Current text of a location, or `None` if unregistered.
    #[must_use]
    pub fn text_of(&self, id: &LocationId) -> Option<String> {
        self.inner.borrow().slots.get(id).cloned()
    }

    /// All registered location ids, in sorted order.
    #[must_use]
    pub fn ids(&self) -> Vec<LocationId> {
        self.inner.borrow().slots.keys().cloned().collect()
    }

    /// All locations currently holding text, in sorted order.
    #[must_use]
    pub fn non_empty(&self) -> Vec<(LocationId, String)> {
        self.inner
            .borrow()
            .slots
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(id, text)| (id.clone(), text.clone()))
            .collect()
    }

    /// Number of registered locations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    /// Returns `true` if no location is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().slots.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convention_appends_error_suffix() {
        let name = FieldName::from("last-name");
        assert_eq!(error_location_for(&name).as_str(), "last-name-error");
    }

    #[test]
    fn register_and_write() {
        let board = DisplayBoard::new();
        board.register("email-error");
        let id = LocationId::from("email-error");

        assert!(board.contains(&id));
        assert!(board.set_text(&id, "Invalid email address"));
        assert_eq!(board.text_of(&id).as_deref(), Some("Invalid email address"));

        assert!(board.clear(&id));
        assert_eq!(board.text_of(&id).as_deref(), Some(""));
    }

    #[test]
    fn writes_to_unregistered_locations_go_nowhere() {
        let board = DisplayBoard::new();
        let id = LocationId::from("missing");

        assert!(!board.set_text(&id, "text"));
        assert!(!board.clear(&id));
        assert_eq!(board.text_of(&id), None);
    }

    #[test]
    fn clones_share_state() {
        let board = DisplayBoard::new();
        board.register("a");
        let other = board.clone();
        other.set_text(&"a".into(), "hello");
        assert_eq!(board.text_of(&"a".into()).as_deref(), Some("hello"));
    }

    #[test]
    fn re_register_keeps_text() {
        let board = DisplayBoard::new();
        board.register("a");
        board.set_text(&"a".into(), "kept");
        board.register("a");
        assert_eq!(board.text_of(&"a".into()).as_deref(), Some("kept"));
    }

    #[test]
    fn clear_registered_wipes_everything() {
        let board = DisplayBoard::new();
        board.register("a");
        board.register("b");
        board.set_text(&"a".into(), "one");
        board.set_text(&"b".into(), "two");

        board.clear_registered();

        assert!(board.non_empty().is_empty());
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn non_empty_is_sorted_and_filtered() {
        let board = DisplayBoard::new();
        board.register("b");
        board.register("a");
        board.register("c");
        board.set_text(&"c".into(), "three");
        board.set_text(&"a".into(), "one");

        let texts = board.non_empty();
        assert_eq!(
            texts,
            vec![
                ("a".into(), "one".to_string()),
                ("c".into(), "three".to_string()),
            ]
        );
    }
}
