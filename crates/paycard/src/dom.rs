//! Host document abstraction
//!
//! The form engine never talks to a concrete UI toolkit. Inputs are reached
//! through [`FieldAccessor`] and the surrounding page through [`Document`];
//! a browser host implements them over the DOM, tests use
//! [`crate::memory::MemoryDocument`].

use std::rc::Rc;

use crate::error::Result;

/// What kind of control a field is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any text-like `<input>` (text, email, tel, ...)
    Text,
    Checkbox,
    Hidden,
    Select,
    Button,
}

impl FieldKind {
    /// Classify an element from its tag name and `type` attribute
    pub fn from_tag(tag: &str, input_type: Option<&str>) -> Self {
        match (tag.to_ascii_lowercase().as_str(), input_type) {
            ("select", _) => FieldKind::Select,
            ("button", _) => FieldKind::Button,
            ("input", Some(t)) if t.eq_ignore_ascii_case("checkbox") => FieldKind::Checkbox,
            ("input", Some(t)) if t.eq_ignore_ascii_case("hidden") => FieldKind::Hidden,
            ("input", Some(t))
                if t.eq_ignore_ascii_case("submit") || t.eq_ignore_ascii_case("button") =>
            {
                FieldKind::Button
            }
            _ => FieldKind::Text,
        }
    }
}

/// Events the engine listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldEvent {
    Input,
    Blur,
    Change,
    Click,
}

/// Handle returned by [`FieldAccessor::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Event callback. Listeners capture what they need; the event carries no
/// payload beyond the field's own state.
pub type Listener = Rc<dyn Fn()>;

/// Minimal view of one form control
pub trait FieldAccessor {
    fn name(&self) -> String;
    fn kind(&self) -> FieldKind;

    fn value(&self) -> String;
    /// Programmatic write; does not fire listeners
    fn set_value(&self, value: &str);

    fn checked(&self) -> bool;
    fn set_checked(&self, checked: bool);

    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);
    fn remove_attribute(&self, name: &str);

    fn add_listener(&self, event: FieldEvent, listener: Listener) -> ListenerId;
    /// Returns false when the listener is unknown
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// False once the element has been removed from the page
    fn is_connected(&self) -> bool;
}

pub type FieldHandle = Rc<dyn FieldAccessor>;

/// Remove a listener registered by a binding. A missing listener is expected
/// once the field has left the page; on a live field it means something else
/// unbound it first.
pub fn unbind(field: &dyn FieldAccessor, id: ListenerId) -> bool {
    let removed = field.remove_listener(id);
    if !removed {
        if field.is_connected() {
            tracing::debug!(field = %field.name(), "listener already removed from live field");
        } else {
            tracing::trace!(field = %field.name(), "field detached, nothing to unbind");
        }
    }
    removed
}

/// The element that had focus when the form was submitted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FocusedElement {
    Button {
        /// Value of `data-provider`
        provider: Option<String>,
    },
    Input {
        name: String,
        /// Value of the `type` attribute, `text` when absent
        input_type: String,
        /// `data-form-type` of the closest tagged container
        form_type: Option<String>,
        /// `data-provider` of the submit button following that container
        sibling_provider: Option<String>,
    },
    #[default]
    Other,
}

/// The page the widget renders into
pub trait Document {
    /// Replace the container's contents with `html`
    fn render(&self, container_id: &str, html: &str) -> Result<()>;

    /// Empty the container; a missing container is ignored
    fn clear(&self, container_id: &str);

    /// Rendered inputs and selects, in document order
    fn fields(&self) -> Vec<FieldHandle>;

    /// Rendered buttons carrying `data-provider`, in document order
    fn provider_buttons(&self) -> Vec<FieldHandle>;

    fn focused(&self) -> FocusedElement;

    /// Suppress or restore pointer interaction with the whole form
    fn set_loading(&self, loading: bool);

    /// Replace the text of a `data-slot` element
    fn set_slot_text(&self, slot: &str, text: &str);

    /// Full-page navigation
    fn navigate(&self, url: &str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryField;

    #[test]
    fn test_unbind_live_and_detached_fields() {
        let live = MemoryField::new("email", FieldKind::Text);
        let id = live.add_listener(FieldEvent::Input, Rc::new(|| {}));
        assert!(unbind(&*live, id));
        assert!(!unbind(&*live, id));

        let detached = MemoryField::new("phone", FieldKind::Text);
        let id = detached.add_listener(FieldEvent::Blur, Rc::new(|| {}));
        detached.disconnect();
        assert!(!detached.is_connected());
        assert!(unbind(&*detached, id));
        assert!(!unbind(&*detached, id));
        assert_eq!(detached.listener_count(), 0);
    }

    #[test]
    fn test_field_kind_from_tag() {
        assert_eq!(FieldKind::from_tag("SELECT", None), FieldKind::Select);
        assert_eq!(FieldKind::from_tag("input", Some("Checkbox")), FieldKind::Checkbox);
        assert_eq!(FieldKind::from_tag("input", Some("submit")), FieldKind::Button);
        assert_eq!(FieldKind::from_tag("input", None), FieldKind::Text);
    }
}
