#![forbid(unsafe_code)]

//! The registration form the integration suites share.

use std::rc::Rc;

use valwire_core::{ConstraintOracle, DisplayBoard, Field, FieldKind, FormHandle};

/// A four-field registration form: first name, server-checked last name,
/// email, and an age with bounds.
#[must_use]
pub fn registration_form() -> FormHandle {
    FormHandle::new(
        vec![
            Field::new("first-name", FieldKind::Text).required(),
            Field::new("last-name", FieldKind::Text)
                .required()
                .with_server_check(),
            Field::new("email", FieldKind::Email).required(),
            Field::new("age", FieldKind::Number).with_min(18.0).with_max(130.0),
        ],
        Rc::new(ConstraintOracle),
    )
}

/// A board with one registered location per field on `form`, resolved the
/// way the field itself would resolve it.
#[must_use]
pub fn board_for(form: &FormHandle) -> DisplayBoard {
    let board = DisplayBoard::new();
    for name in form.field_names() {
        if let Some(location) = form.with_field(name.as_str(), |field| field.display_location()) {
            board.register(location);
        }
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_board_covers_every_field() {
        let form = registration_form();
        let board = board_for(&form);
        for name in ["first-name", "last-name", "email", "age"] {
            assert!(board.contains(&format!("{name}-error").into()), "{name}");
        }
    }
}
