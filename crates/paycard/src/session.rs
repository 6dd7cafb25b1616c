// File: src/session.rs
// Purpose: Live bindings (masks, validators, selects, tabs) for one rendered form

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use paycard_validation::{card, phone, ValidationContext, ValidationResult};
use serde_json::Value as JsonValue;

use crate::backend::Payload;
use crate::dom::{
    unbind, Document, FieldAccessor, FieldEvent, FieldHandle, FieldKind, Listener, ListenerId,
};
use crate::error::Result;
use crate::field_validator::FieldValidator;
use crate::mask::{InputMask, MaskCallback, MaskEvent, MaskSpec, MaskedField};
use crate::policy::RequirementContext;
use crate::provider::ProviderKey;
use crate::select::SelectBox;

const CARD_NUMBER: &str = "cardNumber";
const CARD_CVV: &str = "cardCvv";
const PHONE: &str = "phone";
const COUNTRY: &str = "country";
const ZIP_CODE: &str = "zipCode";

/// Marks the input whose value is the subscriber id
pub const SUBSCRIBER_ID_ATTR: &str = "data-subscriber-id";

/// One field's outcome in a submit-time validation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    pub bypassed: bool,
    pub result: ValidationResult,
}

/// Submit-time validation of the whole form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValidation {
    pub provider: ProviderKey,
    pub fields: BTreeMap<String, FieldReport>,
}

impl FormValidation {
    pub fn is_valid(&self) -> bool {
        self.fields.values().all(|report| report.result.is_valid)
    }

    /// Error messages of failing fields
    pub fn errors(&self) -> BTreeMap<String, Vec<String>> {
        self.fields
            .iter()
            .filter(|(_, report)| !report.result.is_valid)
            .map(|(name, report)| (name.clone(), report.result.errors.clone()))
            .collect()
    }

    pub fn is_bypassed(&self, field: &str) -> Option<bool> {
        self.fields.get(field).map(|report| report.bypassed)
    }
}

/// Session behaviour taken from the host configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub validate_on_blur: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            validate_on_blur: true,
        }
    }
}

/// The bindings for one rendered form instance
///
/// Dropping the session (or calling [`FormSession::teardown`]) unbinds every
/// listener it registered and clears its rule context.
pub struct FormSession {
    context: Rc<ValidationContext>,
    fields: BTreeMap<String, FieldHandle>,
    masks: BTreeMap<String, Rc<MaskedField>>,
    validators: BTreeMap<String, Rc<FieldValidator>>,
    selects: Vec<SelectBox>,
    buttons: Vec<FieldHandle>,
    listeners: RefCell<Vec<(FieldHandle, ListenerId)>>,
    requirements: Rc<RefCell<RequirementContext>>,
    active_provider: Rc<Cell<ProviderKey>>,
    torn_down: bool,
}

fn build_mask(field: &dyn FieldAccessor, pattern: String) -> Result<Rc<RefCell<InputMask>>> {
    let mut spec = MaskSpec::new(pattern);
    spec.valid_chars = field.attribute("data-mask-chars");
    Ok(Rc::new(RefCell::new(InputMask::new(spec)?)))
}

/// Brand tracking for the card number field: swaps its own mask, tags the
/// input with the brand icon and keeps the security code mask and rule in
/// step.
fn card_number_callback(
    own: Rc<RefCell<InputMask>>,
    cvv_mask: Option<Rc<MaskedField>>,
    cvv_validator: Rc<OnceCell<Rc<FieldValidator>>>,
) -> MaskCallback {
    Rc::new(move |event: &MaskEvent| {
        let brand = card::detect(&event.value);

        if own.borrow().pattern() != brand.mask {
            let swapped = own.borrow_mut().update_options(MaskSpec::new(brand.mask));
            match swapped {
                Ok(()) => {
                    event.update_value();
                }
                Err(err) => tracing::warn!(error = %err, "card mask swap failed"),
            }
        }

        if brand.icon.is_empty() {
            event.field().remove_attribute("data-card-brand");
        } else {
            event.field().set_attribute("data-card-brand", brand.icon);
        }

        if let Some(cvv) = &cvv_mask {
            if let Some(mask) = cvv.mask() {
                let cvv_pattern = brand.cvv_mask();
                if mask.borrow().pattern() != cvv_pattern {
                    let swapped = mask.borrow_mut().update_options(MaskSpec::new(cvv_pattern));
                    if swapped.is_ok() {
                        cvv.remask();
                    }
                }
            }
        }
        if let Some(validator) = cvv_validator.get() {
            validator.update_rule(brand.cvv_rule());
        }
    })
}

impl FormSession {
    /// Bind masks, validators and select widgets to the rendered fields
    ///
    /// Fields are configured through attributes: `data-mask`,
    /// `data-mask-chars` and `data-validate`. A second field with an already
    /// bound name is ignored.
    pub fn bind(
        document: &dyn Document,
        context: Rc<ValidationContext>,
        requirements: RequirementContext,
        options: SessionOptions,
    ) -> Result<Self> {
        let mut fields = BTreeMap::new();
        for field in document.fields() {
            let name = field.name();
            if name.is_empty() || field.kind() == FieldKind::Button {
                continue;
            }
            if fields.contains_key(&name) {
                tracing::warn!(field = %name, "duplicate field name, keeping the first");
                continue;
            }
            fields.insert(name, field);
        }

        // The card number callback needs the security code mask, so bind it last
        let mut masks: BTreeMap<String, Rc<MaskedField>> = BTreeMap::new();
        let mut card_number = None;
        for (name, field) in &fields {
            let Some(pattern) = field.attribute("data-mask") else {
                continue;
            };
            let mask = build_mask(field.as_ref(), pattern)?;
            if name == CARD_NUMBER {
                card_number = Some((field.clone(), mask));
                continue;
            }
            masks.insert(
                name.clone(),
                Rc::new(MaskedField::bind(field.clone(), mask, None)),
            );
        }
        let cvv_validator = Rc::new(OnceCell::new());
        if let Some((field, mask)) = card_number {
            let callback = card_number_callback(
                mask.clone(),
                masks.get(CARD_CVV).cloned(),
                cvv_validator.clone(),
            );
            masks.insert(
                CARD_NUMBER.to_string(),
                Rc::new(MaskedField::bind(field, mask, Some(callback))),
            );
        }

        // Listeners fire in binding order: validators must see masked values
        let mut validators = BTreeMap::new();
        for (name, field) in &fields {
            if let Some(rule) = field.attribute("data-validate") {
                let validator = FieldValidator::bind(
                    field.clone(),
                    rule,
                    context.clone(),
                    options.validate_on_blur,
                );
                validators.insert(name.clone(), Rc::new(validator));
            }
        }
        if let Some(validator) = validators.get(CARD_CVV) {
            let _ = cvv_validator.set(validator.clone());
        }

        let mut requirements = requirements;
        let mut selects = Vec::new();
        if let Some(select) = fields.get(COUNTRY).filter(|f| f.kind() == FieldKind::Select) {
            let initial = select.value();
            if !initial.is_empty() {
                requirements.country = Some(initial);
            }
        }
        let requirements = Rc::new(RefCell::new(requirements));

        if let Some(select) = fields.get(COUNTRY).filter(|f| f.kind() == FieldKind::Select) {
            let phone_mask = masks.get(PHONE).cloned();
            let zip_validator = validators.get(ZIP_CODE).cloned();
            let requirements = requirements.clone();
            selects.push(SelectBox::bind(
                select.clone(),
                Rc::new(move |code: &str| {
                    tracing::debug!(country = code, "country changed");
                    requirements.borrow_mut().country = Some(code.to_string());

                    if let (Some(masked), Some(country)) = (&phone_mask, phone::country_by_code(code)) {
                        if let Some(mask) = masked.mask() {
                            let swapped = mask.borrow_mut().update_options(MaskSpec::new(country.mask));
                            if swapped.is_ok() {
                                masked.remask();
                            }
                        }
                    }
                    if let Some(validator) = &zip_validator {
                        validator.update_rule(requirements.borrow().zip_rule());
                    }
                }),
            ));
        }

        tracing::debug!(
            fields = fields.len(),
            masks = masks.len(),
            validators = validators.len(),
            "form session bound"
        );

        Ok(Self {
            context,
            fields,
            masks,
            validators,
            selects,
            buttons: document.provider_buttons(),
            listeners: RefCell::new(Vec::new()),
            requirements,
            active_provider: Rc::new(Cell::new(ProviderKey::default())),
            torn_down: false,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldHandle> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The input carrying the subscriber id, if rendered
    pub fn subscriber_field(&self) -> Option<&FieldHandle> {
        self.fields
            .values()
            .find(|field| field.attribute(SUBSCRIBER_ID_ATTR).is_some())
    }

    pub fn mask_pattern(&self, name: &str) -> Option<String> {
        self.masks.get(name).and_then(|mask| mask.pattern())
    }

    pub fn rule(&self, name: &str) -> Option<String> {
        self.validators.get(name).map(|validator| validator.rule())
    }

    pub fn validator(&self, name: &str) -> Option<&Rc<FieldValidator>> {
        self.validators.get(name)
    }

    pub fn context(&self) -> &Rc<ValidationContext> {
        &self.context
    }

    pub fn requirements(&self) -> RequirementContext {
        self.requirements.borrow().clone()
    }

    pub fn set_saved_card_payment(&self, saved: bool) {
        self.requirements.borrow_mut().is_saved_card_payment = saved;
    }

    pub fn active_provider(&self) -> ProviderKey {
        self.active_provider.get()
    }

    /// Register a listener that is removed on teardown. Returns false when
    /// no such field exists.
    pub fn listen(&self, name: &str, event: FieldEvent, listener: Listener) -> bool {
        let Some(field) = self.fields.get(name) else {
            return false;
        };
        let id = field.add_listener(event, listener);
        self.listeners.borrow_mut().push((field.clone(), id));
        true
    }

    /// Make every provider button a tab: clicking one makes its provider
    /// active and marks it with `data-active`
    pub fn bind_tabs(&self) {
        for button in &self.buttons {
            let Some(provider) = button
                .attribute("data-provider")
                .and_then(|p| p.parse::<ProviderKey>().ok())
            else {
                continue;
            };
            let active = self.active_provider.clone();
            let buttons: Vec<_> = self.buttons.iter().map(Rc::downgrade).collect();
            let id = button.add_listener(
                FieldEvent::Click,
                Rc::new(move || {
                    active.set(provider);
                    for button in buttons.iter().filter_map(|b| b.upgrade()) {
                        mark_active(button.as_ref(), provider);
                    }
                }),
            );
            self.listeners.borrow_mut().push((button.clone(), id));
        }
    }

    /// Make `provider` active and mark its tab
    pub fn set_active_tab(&self, provider: ProviderKey) {
        self.active_provider.set(provider);
        for button in &self.buttons {
            mark_active(button.as_ref(), provider);
        }
    }

    /// Bypass every validator and demote every provider button to
    /// `type="button"` ahead of provider detection
    pub fn reset_for_submit(&self) {
        for validator in self.validators.values() {
            validator.set_bypass(true);
        }
        for button in &self.buttons {
            button.set_attribute("type", "button");
        }
    }

    /// Promote the resolved provider's button to `type="submit"`
    pub fn mark_submit_button(&self, provider: ProviderKey) {
        for button in &self.buttons {
            if button.attribute("data-provider").as_deref() == Some(provider.as_str()) {
                button.set_attribute("type", "submit");
            }
        }
    }

    /// Validate every field required for `provider`; the rest are bypassed
    pub fn validate_for(&self, provider: ProviderKey) -> FormValidation {
        let requirements = self.requirements.borrow().clone();
        let fields = self
            .validators
            .iter()
            .map(|(name, validator)| {
                let bypassed = !requirements.should_validate(name, provider);
                validator.set_bypass(bypassed);
                let result = validator.validate(bypassed);
                (name.clone(), FieldReport { bypassed, result })
            })
            .collect();
        FormValidation { provider, fields }
    }

    /// Form values for submission: checkboxes as booleans, the rest as strings
    pub fn payload(&self) -> Payload {
        self.fields
            .iter()
            .map(|(name, field)| {
                let value = match field.kind() {
                    FieldKind::Checkbox => JsonValue::Bool(field.checked()),
                    _ => JsonValue::String(field.value()),
                };
                (name.clone(), value)
            })
            .collect()
    }

    /// Toggle `disabled` on every field and provider button
    pub fn set_disabled(&self, disabled: bool) {
        for field in self.fields.values().chain(self.buttons.iter()) {
            if disabled {
                field.set_attribute("disabled", "");
            } else {
                field.remove_attribute("disabled");
            }
        }
    }

    /// Unbind everything and clear the rule context. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        for mask in self.masks.values() {
            mask.destroy();
        }
        for validator in self.validators.values() {
            validator.destroy();
        }
        for select in &self.selects {
            select.destroy();
        }
        for (field, id) in self.listeners.borrow_mut().drain(..) {
            unbind(field.as_ref(), id);
        }
        self.masks.clear();
        self.validators.clear();
        self.selects.clear();
        self.context.clear();
        tracing::debug!("form session torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

fn mark_active(button: &dyn FieldAccessor, provider: ProviderKey) {
    if button.attribute("data-provider").as_deref() == Some(provider.as_str()) {
        button.set_attribute("data-active", "true");
    } else {
        button.remove_attribute("data-active");
    }
}

impl Drop for FormSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for FormSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSession")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("masks", &self.masks.keys().collect::<Vec<_>>())
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;
    use pretty_assertions::assert_eq;

    const MARKUP: &str = r#####"
        <div data-form-type="subscriberId">
          <select name="country"><option value="US" selected>US</option><option value="UA">UA</option></select>
          <input type="tel" name="phone" data-mask="+1 (###) ###-####" data-validate="required|phone" data-subscriber-id>
        </div>
        <button type="button" data-provider="paypal">PayPal</button>
        <input type="checkbox" name="agreement" data-validate="required">
        <input name="cardNumber" data-mask="#### #### #### ####" data-validate="required|card">
        <input name="cardCvv" data-mask="###" data-validate="required|min:3">
        <input name="zipCode" data-validate="required|zipCode">
        <input name="zipCode" data-validate="required">
        <button type="button" data-provider="creditCard">Pay</button>
    "#####;

    fn bound() -> (MemoryDocument, FormSession) {
        let doc = MemoryDocument::new().with_container("root");
        doc.render("root", MARKUP).unwrap();
        let session = FormSession::bind(
            &doc,
            Rc::new(ValidationContext::with_builtin_rules()),
            RequirementContext::default(),
            SessionOptions { validate_on_blur: false },
        )
        .unwrap();
        (doc, session)
    }

    #[test]
    fn test_bind_reads_attributes() {
        let (_doc, session) = bound();
        assert_eq!(session.mask_pattern("cardCvv").as_deref(), Some("###"));
        assert_eq!(session.rule("zipCode").as_deref(), Some("required|zipCode"));
        assert_eq!(session.requirements().country.as_deref(), Some("US"));
        assert_eq!(session.subscriber_field().map(|f| f.name()).as_deref(), Some("phone"));
    }

    #[test]
    fn test_card_brand_drives_cvv() {
        let (doc, session) = bound();
        let number = doc.field("cardNumber").unwrap();
        let cvv = doc.field("cardCvv").unwrap();

        cvv.type_text("123");
        number.type_text("3714");
        assert_eq!(session.mask_pattern("cardNumber").as_deref(), Some("#### ###### #####"));
        assert_eq!(session.mask_pattern("cardCvv").as_deref(), Some("####"));
        assert_eq!(session.rule("cardCvv").as_deref(), Some("required|min:4"));
        assert_eq!(number.attribute("data-card-brand").as_deref(), Some("amex"));
        assert_eq!(cvv.value(), "123");

        number.type_text("4111111111111111");
        assert_eq!(number.value(), "4111 1111 1111 1111");
        assert_eq!(session.mask_pattern("cardCvv").as_deref(), Some("###"));
        assert_eq!(session.rule("cardCvv").as_deref(), Some("required|min:3"));
    }

    #[test]
    fn test_input_validation_sees_masked_value() {
        let (doc, _session) = bound();
        let number = doc.field("cardNumber").unwrap();
        let cvv = doc.field("cardCvv").unwrap();

        number.type_text("41111111111111112");
        assert_eq!(number.value(), "4111 1111 1111 1111");
        assert_eq!(number.attribute("aria-invalid"), None);

        cvv.type_text("1a2");
        assert_eq!(cvv.value(), "12");
        assert_eq!(cvv.attribute("aria-invalid").as_deref(), Some("true"));

        cvv.type_text("123");
        assert_eq!(cvv.attribute("aria-invalid"), None);
    }

    #[test]
    fn test_country_change_swaps_phone_mask_and_zip_rule() {
        let (doc, session) = bound();
        let phone = doc.field("phone").unwrap();
        phone.type_text("5551234567");
        assert_eq!(phone.value(), "+1 (555) 123-4567");

        doc.field("country").unwrap().select("UA");
        assert_eq!(session.mask_pattern("phone").as_deref(), Some("+380 ## ### ## ##"));
        assert_eq!(session.requirements().country.as_deref(), Some("UA"));
        assert_eq!(session.rule("zipCode").as_deref(), Some("zipCode"));

        phone.type_text("501234567");
        assert_eq!(phone.value(), "+380 50 123 45 67");
    }

    #[test]
    fn test_submit_preparation() {
        let (doc, session) = bound();
        session.reset_for_submit();
        session.mark_submit_button(ProviderKey::Paypal);
        assert_eq!(doc.button("paypal").unwrap().attribute("type").as_deref(), Some("submit"));
        assert_eq!(doc.button("creditCard").unwrap().attribute("type").as_deref(), Some("button"));
        assert!(session.validator("cardNumber").unwrap().is_bypassed());
    }

    #[test]
    fn test_validate_for_paypal_bypasses_card_fields() {
        let (_doc, session) = bound();
        let report = session.validate_for(ProviderKey::Paypal);
        assert_eq!(report.is_bypassed("cardNumber"), Some(true));
        assert_eq!(report.is_bypassed("phone"), Some(false));
        assert_eq!(report.is_bypassed("agreement"), Some(false));
        assert_eq!(report.is_bypassed("zipCode"), Some(false));
        assert!(!report.is_valid());
        assert_eq!(
            report.errors().keys().cloned().collect::<Vec<_>>(),
            vec!["agreement", "phone", "zipCode"]
        );
    }

    #[test]
    fn test_payload_normalizes_checkboxes() {
        let (doc, session) = bound();
        doc.field("agreement").unwrap().toggle(true);
        doc.field("cardCvv").unwrap().type_text("999");
        let payload = session.payload();
        assert_eq!(payload["agreement"], JsonValue::Bool(true));
        assert_eq!(payload["cardCvv"], JsonValue::String("999".into()));
        assert_eq!(payload["country"], JsonValue::String("US".into()));
    }

    #[test]
    fn test_tabs_mark_active_provider() {
        let (doc, session) = bound();
        session.bind_tabs();
        doc.button("paypal").unwrap().click();
        assert_eq!(session.active_provider(), ProviderKey::Paypal);
        assert_eq!(doc.button("paypal").unwrap().attribute("data-active").as_deref(), Some("true"));
        session.set_active_tab(ProviderKey::CreditCard);
        assert_eq!(doc.button("paypal").unwrap().attribute("data-active"), None);
    }

    #[test]
    fn test_teardown_unbinds_everything() {
        let (doc, mut session) = bound();
        session.bind_tabs();
        let number = doc.field("cardNumber").unwrap();
        session.teardown();
        session.teardown();

        assert_eq!(number.listener_count(), 0);
        assert_eq!(doc.button("paypal").unwrap().listener_count(), 0);
        assert!(!session.context().has_rule("required"));
        number.type_text("4111111111111111");
        assert_eq!(number.value(), "4111111111111111");
    }
}
