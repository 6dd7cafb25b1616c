// File: src/field_validator.rs
// Purpose: Per-field validation bound to input/blur events

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use paycard_validation::{FieldValue, ValidationContext, ValidationResult};

use crate::dom::{unbind, FieldAccessor, FieldEvent, FieldHandle, FieldKind, ListenerId};

/// Read a field the way validation rules expect it: checkboxes as booleans,
/// everything else as text.
pub fn field_value(field: &dyn FieldAccessor) -> FieldValue {
    match field.kind() {
        FieldKind::Checkbox => FieldValue::Bool(field.checked()),
        _ => FieldValue::Text(field.value()),
    }
}

/// Mirror a result onto the element
fn reflect(field: &dyn FieldAccessor, result: &ValidationResult) {
    match result.first_error() {
        Some(message) => {
            field.set_attribute("aria-invalid", "true");
            field.set_attribute("data-error", message);
        }
        None => {
            field.remove_attribute("aria-invalid");
            field.remove_attribute("data-error");
        }
    }
}

struct Shared {
    field: FieldHandle,
    rule: RefCell<String>,
    bypass: Cell<bool>,
    context: Rc<ValidationContext>,
}

impl Shared {
    fn run(&self, bypass: bool) -> ValidationResult {
        let result = if bypass {
            ValidationResult::success()
        } else {
            self.context
                .validate(&field_value(self.field.as_ref()), &self.rule.borrow())
        };
        reflect(self.field.as_ref(), &result);
        result
    }
}

/// Validation for one field
pub struct FieldValidator {
    shared: Rc<Shared>,
    listener: RefCell<Option<ListenerId>>,
}

impl FieldValidator {
    /// Bind `rule` to `field`. Checkboxes validate on every `input`; other
    /// fields on `blur` when `validate_on_blur` is set, else on `input`.
    pub fn bind(
        field: FieldHandle,
        rule: impl Into<String>,
        context: Rc<ValidationContext>,
        validate_on_blur: bool,
    ) -> Self {
        let event = if field.kind() != FieldKind::Checkbox && validate_on_blur {
            FieldEvent::Blur
        } else {
            FieldEvent::Input
        };

        let shared = Rc::new(Shared {
            field: field.clone(),
            rule: RefCell::new(rule.into()),
            bypass: Cell::new(false),
            context,
        });

        let weak = Rc::downgrade(&shared);
        let id = field.add_listener(
            event,
            Rc::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.run(shared.bypass.get());
                }
            }),
        );

        Self {
            shared,
            listener: RefCell::new(Some(id)),
        }
    }

    /// Validate now. `bypass = true` reports valid without running rules.
    pub fn validate(&self, bypass: bool) -> ValidationResult {
        self.shared.run(bypass)
    }

    /// Validate honouring the current bypass flag
    pub fn check(&self) -> ValidationResult {
        self.shared.run(self.shared.bypass.get())
    }

    pub fn set_bypass(&self, bypass: bool) {
        self.shared.bypass.set(bypass);
    }

    pub fn is_bypassed(&self) -> bool {
        self.shared.bypass.get()
    }

    /// Swap the rule string without rebinding
    pub fn update_rule(&self, rule: impl Into<String>) {
        *self.shared.rule.borrow_mut() = rule.into();
    }

    pub fn rule(&self) -> String {
        self.shared.rule.borrow().clone()
    }

    pub fn field(&self) -> &FieldHandle {
        &self.shared.field
    }

    /// Unbind the listener. Safe to call repeatedly.
    pub fn destroy(&self) {
        if let Some(id) = self.listener.borrow_mut().take() {
            unbind(self.shared.field.as_ref(), id);
        }
    }
}

impl Drop for FieldValidator {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryField;

    fn context() -> Rc<ValidationContext> {
        Rc::new(ValidationContext::with_builtin_rules())
    }

    #[test]
    fn test_validates_on_blur_when_configured() {
        let field = MemoryField::new("email", FieldKind::Text);
        let _v = FieldValidator::bind(field.clone(), "required|email", context(), true);

        field.type_text("nope");
        assert_eq!(field.attribute("aria-invalid"), None);

        field.blur();
        assert_eq!(field.attribute("aria-invalid").as_deref(), Some("true"));
        assert_eq!(
            field.attribute("data-error").as_deref(),
            Some("Please enter a valid email address")
        );

        field.type_text("a@b.co");
        field.blur();
        assert_eq!(field.attribute("aria-invalid"), None);
        assert_eq!(field.attribute("data-error"), None);
    }

    #[test]
    fn test_validates_on_input_otherwise() {
        let field = MemoryField::new("cardCvv", FieldKind::Text);
        let _v = FieldValidator::bind(field.clone(), "required|min:3", context(), false);
        field.type_text("12");
        assert_eq!(field.attribute("aria-invalid").as_deref(), Some("true"));
    }

    #[test]
    fn test_checkbox_validates_on_input_even_with_blur() {
        let field = MemoryField::new("agreement", FieldKind::Checkbox);
        let v = FieldValidator::bind(field.clone(), "required", context(), true);
        field.toggle(false);
        assert_eq!(field.attribute("aria-invalid").as_deref(), Some("true"));
        field.toggle(true);
        assert!(v.validate(false).is_valid);
    }

    #[test]
    fn test_bypass_and_rule_update() {
        let field = MemoryField::new("cardCvv", FieldKind::Text);
        field.set_value("123");
        let v = FieldValidator::bind(field.clone(), "required|min:3", context(), true);

        assert!(v.validate(false).is_valid);
        v.update_rule("required|min:4");
        assert!(!v.validate(false).is_valid);
        assert!(v.validate(true).is_valid);

        v.set_bypass(true);
        assert!(v.check().is_valid);
        assert_eq!(v.rule(), "required|min:4");
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let field = MemoryField::new("x", FieldKind::Text);
        let v = FieldValidator::bind(field.clone(), "required", context(), false);
        v.destroy();
        v.destroy();
        assert_eq!(field.listener_count(), 0);
    }
}
