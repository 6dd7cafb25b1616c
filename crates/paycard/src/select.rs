//! Select widgets
//!
//! A [`SelectBox`] forwards `change` events on a `<select>` to a callback.
//! The form session uses one for the phone country picker.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::{unbind, FieldAccessor, FieldEvent, FieldHandle, ListenerId};

pub type ChangeCallback = Rc<dyn Fn(&str)>;

pub struct SelectBox {
    field: FieldHandle,
    listener: RefCell<Option<ListenerId>>,
}

impl SelectBox {
    pub fn bind(field: FieldHandle, on_change: ChangeCallback) -> Self {
        let weak = Rc::downgrade(&field);
        let id = field.add_listener(
            FieldEvent::Change,
            Rc::new(move || {
                if let Some(field) = weak.upgrade() {
                    on_change(&field.value());
                }
            }),
        );
        Self {
            field,
            listener: RefCell::new(Some(id)),
        }
    }

    pub fn value(&self) -> String {
        self.field.value()
    }

    pub fn name(&self) -> String {
        self.field.name()
    }

    pub fn destroy(&self) {
        if let Some(id) = self.listener.borrow_mut().take() {
            unbind(self.field.as_ref(), id);
        }
    }
}

impl Drop for SelectBox {
    fn drop(&mut self) {
        self.destroy();
    }
}
