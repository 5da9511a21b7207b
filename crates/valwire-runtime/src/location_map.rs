#![forbid(unsafe_code)]

//! The consumer's field-to-location map, built once at attach.
//!
//! Resolution per field, in order: an explicit display reference always
//! maps, even when the board does not know it (the author asked for it by
//! name, and the mismatch is logged); the `{name}-error` convention maps
//! only when the board has that location; otherwise the field is unmapped
//! and its messages ride the consumer's default location.

use valwire_core::{DisplayBoard, FieldName, FormHandle, LocationId, error_location_for};

/// Field-to-display-location mapping, frozen at consumer attach.
#[derive(Debug, Clone, Default)]
pub struct FieldLocationMap {
    entries: Vec<(FieldName, LocationId)>,
}

impl FieldLocationMap {
    /// Resolve every field on `form` against `board`.
    #[must_use]
    pub fn build(form: &FormHandle, board: &DisplayBoard) -> Self {
        let mut entries = Vec::new();
        for name in form.field_names() {
            let explicit = form
                .with_field(name.as_str(), |field| field.display_ref.clone())
                .flatten();
            if let Some(id) = explicit {
                if !board.contains(&id) {
                    tracing::warn!(
                        field = %name,
                        location = %id,
                        "explicit display ref is not on the board"
                    );
                }
                entries.push((name, id));
                continue;
            }
            let conventional = error_location_for(&name);
            if board.contains(&conventional) {
                entries.push((name, conventional));
            } else {
                tracing::debug!(field = %name, "no display location; messages ride the default");
            }
        }
        Self { entries }
    }

    /// The mapped location for a field, if it has one.
    #[must_use]
    pub fn location_for(&self, name: &FieldName) -> Option<&LocationId> {
        self.entries
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, id)| id)
    }

    /// Every mapped location once, in first-mapped order.
    #[must_use]
    pub fn mapped_locations(&self) -> Vec<LocationId> {
        let mut seen: Vec<LocationId> = Vec::new();
        for (_, id) in &self.entries {
            if !seen.contains(id) {
                seen.push(id.clone());
            }
        }
        seen
    }

    /// Mapped pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &LocationId)> {
        self.entries.iter().map(|(name, id)| (name, id))
    }

    /// Number of mapped fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no field is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
