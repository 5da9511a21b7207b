#![forbid(unsafe_code)]

//! The form model: fields, listeners, and the submission entry point.
//!
//! A [`FormHandle`] is a cheap clone over shared form state, the way hosts,
//! producers, and consumers all see the same form. The oracle judging the
//! form is injected at construction; nothing here reaches for globals.
//!
//! Listener snapshots are taken per dispatch, so a listener may add or
//! remove listeners (including itself) while running. Borrows are never
//! held across a callback.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::events::{FieldEvent, ListenerId, SubmitIntent, SubmitOutcome};
use crate::field::{Field, FieldName};
use crate::message::resolve_message;
use crate::oracle::ValidityOracle;
use crate::validity::{Reason, ValidityFlags};

// ---------------------------------------------------------------------------
// FormModel
// ---------------------------------------------------------------------------

struct FieldListener {
    id: ListenerId,
    field: FieldName,
    event: FieldEvent,
    callback: Rc<dyn Fn(&FieldName, FieldEvent)>,
}

struct SubmitListener {
    id: ListenerId,
    callback: Rc<dyn Fn(&mut SubmitIntent)>,
}

struct FormModel {
    fields: Vec<Field>,
    oracle: Rc<dyn ValidityOracle>,
    field_listeners: Vec<FieldListener>,
    submit_listeners: Vec<SubmitListener>,
    next_listener: ListenerId,
    native_feedback: bool,
}

impl FormModel {
    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name.as_str() == name)
    }

    fn take_listener_id(&mut self) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// FormHandle
// ---------------------------------------------------------------------------

/// Shared handle to one form.
///
/// Clones share state. Field order is document order: the order fields were
/// given at construction (plus any appended later), which is also the order
/// submission sweeps visit them.
///
/// Runtimes hook the fields present when they attach. A field added after
/// attachment fires events into a void until a new runtime attaches, so
/// build the field set first and attach last.
#[derive(Clone)]
pub struct FormHandle {
    inner: Rc<RefCell<FormModel>>,
}

impl fmt::Debug for FormHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(model) => f
                .debug_struct("FormHandle")
                .field("fields", &model.fields.len())
                .field(
                    "listeners",
                    &(model.field_listeners.len() + model.submit_listeners.len()),
                )
                .field("native_feedback", &model.native_feedback)
                .finish(),
            Err(_) => f.write_str("FormHandle { <borrowed> }"),
        }
    }
}

impl FormHandle {
    /// Build a form over `fields`, judged by `oracle`.
    ///
    /// Field names must be unique and non-empty; offenders are logged and
    /// dropped, keeping the first occurrence of a duplicated name.
    #[must_use]
    pub fn new(fields: Vec<Field>, oracle: Rc<dyn ValidityOracle>) -> Self {
        let mut unique: Vec<Field> = Vec::with_capacity(fields.len());
        for field in fields {
            if field.name.as_str().is_empty() {
                tracing::warn!("field with an empty name dropped");
                continue;
            }
            if unique.iter().any(|existing| existing.name == field.name) {
                tracing::warn!(field = %field.name, "duplicate field name dropped");
                continue;
            }
            unique.push(field);
        }
        Self {
            inner: Rc::new(RefCell::new(FormModel {
                fields: unique,
                oracle,
                field_listeners: Vec::new(),
                submit_listeners: Vec::new(),
                next_listener: 1,
                native_feedback: true,
            })),
        }
    }

    /// Field names in document order.
    #[must_use]
    pub fn field_names(&self) -> Vec<FieldName> {
        self.inner
            .borrow()
            .fields
            .iter()
            .map(|field| field.name.clone())
            .collect()
    }

    /// Whether a field with this name exists.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.inner.borrow().position(name).is_some()
    }

    /// Append a field. Returns `false` and logs when the name is empty or
    /// taken.
    ///
    /// Fields appended after a runtime attached are not hooked by it.
    pub fn add_field(&self, field: Field) -> bool {
        if field.name.as_str().is_empty() {
            tracing::warn!("field with an empty name dropped");
            return false;
        }
        let mut model = self.inner.borrow_mut();
        if model.position(field.name.as_str()).is_some() {
            tracing::warn!(field = %field.name, "duplicate field name dropped");
            return false;
        }
        model.fields.push(field);
        true
    }

    /// Current value of a field.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<String> {
        let model = self.inner.borrow();
        model.position(name).map(|i| model.fields[i].value.clone())
    }

    /// Replace a field's value. Returns `false` for an unknown field.
    pub fn set_value(&self, name: &str, value: impl Into<String>) -> bool {
        let mut model = self.inner.borrow_mut();
        match model.position(name) {
            Some(i) => {
                model.fields[i].set_value(value);
                true
            }
            None => {
                tracing::warn!(field = name, "set_value on unknown field");
                false
            }
        }
    }

    /// Set or clear a field's custom error. Empty text clears. Returns
    /// `false` for an unknown field.
    pub fn set_custom_error(&self, name: &str, error: Option<String>) -> bool {
        let mut model = self.inner.borrow_mut();
        match model.position(name) {
            Some(i) => {
                model.fields[i].set_custom_error(error);
                true
            }
            None => {
                tracing::warn!(field = name, "set_custom_error on unknown field");
                false
            }
        }
    }

    /// Clone of a field's full state.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Field> {
        let model = self.inner.borrow();
        model.position(name).map(|i| model.fields[i].clone())
    }

    /// Run `f` against a field without cloning it.
    pub fn with_field<R>(&self, name: &str, f: impl FnOnce(&Field) -> R) -> Option<R> {
        let model = self.inner.borrow();
        model.position(name).map(|i| f(&model.fields[i]))
    }

    /// Evaluate a field through the form's oracle.
    #[must_use]
    pub fn evaluate(&self, name: &str) -> Option<ValidityFlags> {
        let (field, oracle) = {
            let model = self.inner.borrow();
            let i = model.position(name)?;
            (model.fields[i].clone(), Rc::clone(&model.oracle))
        };
        Some(oracle.evaluate(&field))
    }

    /// Resolve the display message for a field invalid for `reason`,
    /// overrides first.
    #[must_use]
    pub fn resolve_message(&self, name: &str, reason: Reason) -> Option<String> {
        let (field, oracle) = {
            let model = self.inner.borrow();
            let i = model.position(name)?;
            (model.fields[i].clone(), Rc::clone(&model.oracle))
        };
        Some(resolve_message(&field, reason, oracle.as_ref()))
    }

    /// Evaluate a field and fire its invalid notice when it fails.
    ///
    /// Returns `Some(true)` for a valid field, `Some(false)` after firing
    /// [`FieldEvent::Invalid`] listeners for an invalid one, `None` for an
    /// unknown field.
    pub fn check_validity(&self, name: &str) -> Option<bool> {
        let flags = self.evaluate(name)?;
        if flags.is_valid() {
            return Some(true);
        }
        self.fire(name, FieldEvent::Invalid);
        Some(false)
    }

    /// Fire an event on a field, invoking matching listeners in
    /// registration order. Returns the number of listeners invoked.
    pub fn fire(&self, name: &str, event: FieldEvent) -> usize {
        let matched: Vec<(FieldName, Rc<dyn Fn(&FieldName, FieldEvent)>)> = self
            .inner
            .borrow()
            .field_listeners
            .iter()
            .filter(|listener| listener.event == event && listener.field.as_str() == name)
            .map(|listener| (listener.field.clone(), Rc::clone(&listener.callback)))
            .collect();
        tracing::trace!(
            field = name,
            event = event.as_str(),
            listeners = matched.len(),
            "event fired"
        );
        for (field, callback) in &matched {
            callback(field, event);
        }
        matched.len()
    }

    /// Listen for `event` on the named field.
    pub fn add_listener(
        &self,
        name: &str,
        event: FieldEvent,
        callback: impl Fn(&FieldName, FieldEvent) + 'static,
    ) -> ListenerId {
        let mut model = self.inner.borrow_mut();
        let id = model.take_listener_id();
        model.field_listeners.push(FieldListener {
            id,
            field: FieldName::from(name),
            event,
            callback: Rc::new(callback),
        });
        id
    }

    /// Listen for submission attempts.
    pub fn on_submit(&self, callback: impl Fn(&mut SubmitIntent) + 'static) -> ListenerId {
        let mut model = self.inner.borrow_mut();
        let id = model.take_listener_id();
        model.submit_listeners.push(SubmitListener {
            id,
            callback: Rc::new(callback),
        });
        id
    }

    /// Remove one listener by id. Removes exactly the listener the id names
    /// and nothing else; returns `false` when the id is unknown.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut model = self.inner.borrow_mut();
        if let Some(i) = model.field_listeners.iter().position(|l| l.id == id) {
            model.field_listeners.remove(i);
            return true;
        }
        if let Some(i) = model.submit_listeners.iter().position(|l| l.id == id) {
            model.submit_listeners.remove(i);
            return true;
        }
        false
    }

    /// Number of registered listeners, field and submit combined.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let model = self.inner.borrow();
        model.field_listeners.len() + model.submit_listeners.len()
    }

    /// Toggle the built-in submission sweep.
    ///
    /// With native feedback on (the default), [`request_submit`] checks
    /// every field itself and cancels on the first failure without calling
    /// submit listeners. Runtimes that take over validation turn it off and
    /// run their own sweep from a submit listener.
    ///
    /// [`request_submit`]: FormHandle::request_submit
    pub fn set_native_feedback(&self, on: bool) {
        self.inner.borrow_mut().native_feedback = on;
    }

    /// Whether the built-in submission sweep is active.
    #[must_use]
    pub fn native_feedback(&self) -> bool {
        self.inner.borrow().native_feedback
    }

    /// Attempt to submit the form.
    ///
    /// With native feedback on, every field is checked in document order;
    /// any failure cancels before submit listeners run. Otherwise submit
    /// listeners decide through [`SubmitIntent::prevent_default`].
    pub fn request_submit(&self) -> SubmitOutcome {
        if self.native_feedback() {
            let mut all_valid = true;
            for name in self.field_names() {
                if self.check_validity(name.as_str()) == Some(false) {
                    all_valid = false;
                }
            }
            if !all_valid {
                tracing::debug!("submission cancelled by native sweep");
                return SubmitOutcome::Cancelled;
            }
        }

        let callbacks: Vec<Rc<dyn Fn(&mut SubmitIntent)>> = self
            .inner
            .borrow()
            .submit_listeners
            .iter()
            .map(|listener| Rc::clone(&listener.callback))
            .collect();
        let mut intent = SubmitIntent::new();
        for callback in &callbacks {
            callback(&mut intent);
        }
        if intent.is_prevented() {
            tracing::debug!("submission cancelled by listener");
            SubmitOutcome::Cancelled
        } else {
            SubmitOutcome::Proceeded
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<FormModel>> {
        Rc::downgrade(&self.inner)
    }
}

// ---------------------------------------------------------------------------
// ListenerSet
// ---------------------------------------------------------------------------

/// Tracks listener ids registered on one form so they can all be removed in
/// a single step.
///
/// Removal revokes each tracked id exactly once and touches nothing else
/// registered on the form. Dropping the set releases it.
pub struct ListenerSet {
    model: Weak<RefCell<FormModel>>,
    ids: Vec<ListenerId>,
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("ids", &self.ids)
            .finish()
    }
}

impl ListenerSet {
    /// Create an empty set bound to `form`.
    #[must_use]
    pub fn new(form: &FormHandle) -> Self {
        Self {
            model: form.downgrade(),
            ids: Vec::new(),
        }
    }

    /// Track an id for later release.
    pub fn track(&mut self, id: ListenerId) {
        self.ids.push(id);
    }

    /// Number of tracked ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` when nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Remove every tracked listener from the form. Safe to call more than
    /// once; later calls find nothing to do.
    pub fn release(&mut self) {
        let ids = std::mem::take(&mut self.ids);
        if ids.is_empty() {
            return;
        }
        let Some(inner) = self.model.upgrade() else {
            return;
        };
        let form = FormHandle { inner };
        for id in &ids {
            form.remove_listener(*id);
        }
        tracing::debug!(released = ids.len(), "listener set released");
    }
}

impl Drop for ListenerSet {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use crate::oracle::ConstraintOracle;

    fn form_with(fields: Vec<Field>) -> FormHandle {
        FormHandle::new(fields, Rc::new(ConstraintOracle))
    }

    fn counter() -> (Rc<RefCell<usize>>, impl Fn(&FieldName, FieldEvent)) {
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        (count, move |_: &FieldName, _| *sink.borrow_mut() += 1)
    }

    // -- construction tests --

    #[test]
    fn duplicate_names_keep_the_first() {
        let form = form_with(vec![
            Field::new("name", FieldKind::Text).with_value("first"),
            Field::new("name", FieldKind::Text).with_value("second"),
        ]);
        assert_eq!(form.field_names().len(), 1);
        assert_eq!(form.value_of("name").as_deref(), Some("first"));
    }

    #[test]
    fn field_order_is_document_order() {
        let form = form_with(vec![
            Field::new("b", FieldKind::Text),
            Field::new("a", FieldKind::Text),
            Field::new("c", FieldKind::Text),
        ]);
        let field_names = form.field_names();
        let names: Vec<&str> = field_names.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn add_field_appends_and_rejects_duplicates() {
        let form = form_with(vec![Field::new("a", FieldKind::Text)]);
        assert!(form.add_field(Field::new("b", FieldKind::Text)));
        assert!(!form.add_field(Field::new("a", FieldKind::Text)));
        assert_eq!(form.field_names().len(), 2);
    }

    #[test]
    fn empty_names_are_dropped() {
        let form = form_with(vec![
            Field::new("", FieldKind::Text),
            Field::new("a", FieldKind::Text),
        ]);
        assert_eq!(form.field_names().len(), 1);
        assert!(!form.add_field(Field::new("", FieldKind::Text)));
    }

    // -- state tests --

    #[test]
    fn unknown_fields_report_absence() {
        let form = form_with(vec![]);
        assert!(!form.set_value("ghost", "x"));
        assert_eq!(form.value_of("ghost"), None);
        assert_eq!(form.evaluate("ghost"), None);
        assert_eq!(form.check_validity("ghost"), None);
    }

    #[test]
    fn set_value_feeds_evaluation() {
        let form = form_with(vec![Field::new("age", FieldKind::Number).with_min(18.0)]);
        form.set_value("age", "16");
        assert_eq!(
            form.evaluate("age"),
            Some(ValidityFlags::RANGE_UNDERFLOW)
        );
        form.set_value("age", "21");
        assert!(form.evaluate("age").is_some_and(|f| f.is_valid()));
    }

    #[test]
    fn resolve_message_prefers_overrides() {
        let form = form_with(vec![Field::new("name", FieldKind::Text)
            .required()
            .with_message(Reason::ValueMissing, "Name, please")]);
        assert_eq!(
            form.resolve_message("name", Reason::ValueMissing).as_deref(),
            Some("Name, please")
        );
        assert_eq!(
            form.resolve_message("name", Reason::TooShort).as_deref(),
            Some("Enter a valid value")
        );
    }

    // -- listener tests --

    #[test]
    fn listeners_fire_for_their_event_only() {
        let form = form_with(vec![Field::new("a", FieldKind::Text)]);
        let (blurs, on_blur) = counter();
        let (changes, on_change) = counter();
        form.add_listener("a", FieldEvent::Blur, on_blur);
        form.add_listener("a", FieldEvent::Change, on_change);

        assert_eq!(form.fire("a", FieldEvent::Blur), 1);
        assert_eq!(form.fire("a", FieldEvent::Blur), 1);
        assert_eq!(form.fire("a", FieldEvent::Input), 0);

        assert_eq!(*blurs.borrow(), 2);
        assert_eq!(*changes.borrow(), 0);
    }

    #[test]
    fn listeners_are_scoped_to_their_field() {
        let form = form_with(vec![
            Field::new("a", FieldKind::Text),
            Field::new("b", FieldKind::Text),
        ]);
        let (count, on_blur) = counter();
        form.add_listener("a", FieldEvent::Blur, on_blur);

        form.fire("b", FieldEvent::Blur);
        assert_eq!(*count.borrow(), 0);
        form.fire("a", FieldEvent::Blur);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn remove_listener_revokes_exactly_one() {
        let form = form_with(vec![Field::new("a", FieldKind::Text)]);
        let (count, on_blur) = counter();
        let (other_count, other_blur) = counter();
        let id = form.add_listener("a", FieldEvent::Blur, on_blur);
        form.add_listener("a", FieldEvent::Blur, other_blur);

        assert!(form.remove_listener(id));
        assert!(!form.remove_listener(id));
        form.fire("a", FieldEvent::Blur);

        assert_eq!(*count.borrow(), 0);
        assert_eq!(*other_count.borrow(), 1);
        assert_eq!(form.listener_count(), 1);
    }

    #[test]
    fn listeners_may_remove_themselves_while_firing() {
        let form = form_with(vec![Field::new("a", FieldKind::Text)]);
        let slot: Rc<RefCell<Option<ListenerId>>> = Rc::new(RefCell::new(None));
        let form_clone = form.clone();
        let slot_clone = Rc::clone(&slot);
        let id = form.add_listener("a", FieldEvent::Blur, move |_, _| {
            if let Some(id) = slot_clone.borrow_mut().take() {
                form_clone.remove_listener(id);
            }
        });
        *slot.borrow_mut() = Some(id);

        assert_eq!(form.fire("a", FieldEvent::Blur), 1);
        assert_eq!(form.fire("a", FieldEvent::Blur), 0);
    }

    // -- validity notice tests --

    #[test]
    fn check_validity_fires_the_invalid_notice() {
        let form = form_with(vec![Field::new("name", FieldKind::Text).required()]);
        let (count, on_invalid) = counter();
        form.add_listener("name", FieldEvent::Invalid, on_invalid);

        assert_eq!(form.check_validity("name"), Some(false));
        assert_eq!(*count.borrow(), 1);

        form.set_value("name", "ada");
        assert_eq!(form.check_validity("name"), Some(true));
        assert_eq!(*count.borrow(), 1);
    }

    // -- submission tests --

    #[test]
    fn native_sweep_cancels_and_skips_submit_listeners() {
        let form = form_with(vec![
            Field::new("name", FieldKind::Text).required(),
            Field::new("age", FieldKind::Number).with_min(18.0).with_value("16"),
        ]);
        let submitted = Rc::new(RefCell::new(false));
        let sink = Rc::clone(&submitted);
        form.on_submit(move |_| *sink.borrow_mut() = true);

        let invalid_notices = Rc::new(RefCell::new(Vec::new()));
        let notice_sink = Rc::clone(&invalid_notices);
        for name in ["name", "age"] {
            let notice_sink = Rc::clone(&notice_sink);
            form.add_listener(name, FieldEvent::Invalid, move |field, _| {
                notice_sink.borrow_mut().push(field.as_str().to_string());
            });
        }

        assert_eq!(form.request_submit(), SubmitOutcome::Cancelled);
        assert!(!*submitted.borrow());
        // Both failures are reported, in document order.
        assert_eq!(*invalid_notices.borrow(), vec!["name", "age"]);
    }

    #[test]
    fn native_sweep_proceeds_when_all_fields_pass() {
        let form = form_with(vec![Field::new("name", FieldKind::Text)
            .required()
            .with_value("ada")]);
        let submitted = Rc::new(RefCell::new(false));
        let sink = Rc::clone(&submitted);
        form.on_submit(move |_| *sink.borrow_mut() = true);

        assert_eq!(form.request_submit(), SubmitOutcome::Proceeded);
        assert!(*submitted.borrow());
    }

    #[test]
    fn suppressed_feedback_defers_to_listeners() {
        let form = form_with(vec![Field::new("name", FieldKind::Text).required()]);
        form.set_native_feedback(false);

        // Invalid field, but no listener objects: the attempt proceeds.
        assert_eq!(form.request_submit(), SubmitOutcome::Proceeded);

        form.on_submit(|intent| intent.prevent_default());
        assert_eq!(form.request_submit(), SubmitOutcome::Cancelled);
    }

    // -- listener set tests --

    #[test]
    fn listener_set_releases_only_tracked_ids() {
        let form = form_with(vec![Field::new("a", FieldKind::Text)]);
        let (tracked_count, tracked) = counter();
        let (kept_count, kept) = counter();

        let mut set = ListenerSet::new(&form);
        set.track(form.add_listener("a", FieldEvent::Blur, tracked));
        form.add_listener("a", FieldEvent::Blur, kept);

        set.release();
        set.release();
        form.fire("a", FieldEvent::Blur);

        assert_eq!(*tracked_count.borrow(), 0);
        assert_eq!(*kept_count.borrow(), 1);
        assert_eq!(form.listener_count(), 1);
    }

    #[test]
    fn listener_set_releases_on_drop() {
        let form = form_with(vec![Field::new("a", FieldKind::Text)]);
        {
            let mut set = ListenerSet::new(&form);
            set.track(form.add_listener("a", FieldEvent::Blur, |_, _| {}));
            assert_eq!(form.listener_count(), 1);
        }
        assert_eq!(form.listener_count(), 0);
    }
}
