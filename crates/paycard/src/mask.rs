// File: src/mask.rs
// Purpose: Bind input masks to form fields

use std::cell::RefCell;
use std::rc::Rc;

pub use paycard_validation::mask::{strip_non_digits, InputMask, MaskError, MaskSpec};

use crate::dom::{unbind, FieldAccessor, FieldEvent, FieldHandle, ListenerId};

/// Format `raw` into the field and return the result
fn write_masked(field: &dyn FieldAccessor, mask: &InputMask, raw: &str) -> String {
    let masked = if mask.is_regex() {
        mask.apply(raw)
    } else {
        mask.apply(&strip_non_digits(raw))
    };
    field.set_value(&masked);
    masked
}

/// What a mask callback sees after each keystroke
pub struct MaskEvent {
    pub name: String,
    /// Value after masking
    pub value: String,
    pub pattern: String,
    /// What the field held before masking
    raw: String,
    field: FieldHandle,
    mask: Rc<RefCell<InputMask>>,
}

impl MaskEvent {
    /// Re-apply the field's mask to the unmasked input, typically after the
    /// callback swapped the pattern
    pub fn update_value(&self) -> String {
        write_masked(self.field.as_ref(), &self.mask.borrow(), &self.raw)
    }

    pub fn field(&self) -> &FieldHandle {
        &self.field
    }
}

pub type MaskCallback = Rc<dyn Fn(&MaskEvent)>;

/// A mask bound to one field's `input` event
pub struct MaskedField {
    field: FieldHandle,
    mask: RefCell<Option<Rc<RefCell<InputMask>>>>,
    listener: RefCell<Option<ListenerId>>,
}

impl MaskedField {
    pub fn bind(
        field: FieldHandle,
        mask: Rc<RefCell<InputMask>>,
        callback: Option<MaskCallback>,
    ) -> Self {
        let weak_field = Rc::downgrade(&field);
        let weak_mask = Rc::downgrade(&mask);

        let id = field.add_listener(
            FieldEvent::Input,
            Rc::new(move || {
                let (Some(field), Some(mask)) = (weak_field.upgrade(), weak_mask.upgrade()) else {
                    return;
                };
                let raw = field.value();
                let (value, pattern) = {
                    let current = mask.borrow();
                    (
                        write_masked(field.as_ref(), &current, &raw),
                        current.pattern().to_string(),
                    )
                };
                if let Some(callback) = &callback {
                    callback(&MaskEvent {
                        name: field.name(),
                        value,
                        pattern,
                        raw,
                        field: field.clone(),
                        mask: mask.clone(),
                    });
                }
            }),
        );

        Self {
            field,
            mask: RefCell::new(Some(mask)),
            listener: RefCell::new(Some(id)),
        }
    }

    /// Shared handle to the mask, `None` once destroyed
    pub fn mask(&self) -> Option<Rc<RefCell<InputMask>>> {
        self.mask.borrow().clone()
    }

    pub fn pattern(&self) -> Option<String> {
        self.mask().map(|m| m.borrow().pattern().to_string())
    }

    /// Re-apply the mask to the current value without firing listeners
    pub fn remask(&self) -> Option<String> {
        let mask = self.mask()?;
        let raw = self.field.value();
        let masked = write_masked(self.field.as_ref(), &mask.borrow(), &raw);
        Some(masked)
    }

    /// Unbind the listener and drop the mask. Safe to call repeatedly.
    pub fn destroy(&self) {
        if let Some(id) = self.listener.borrow_mut().take() {
            unbind(self.field.as_ref(), id);
        }
        self.mask.borrow_mut().take();
    }
}

impl Drop for MaskedField {
    fn drop(&mut self) {
        self.destroy();
    }
}
