//! paycard WASM
//!
//! Browser bindings for the pure paycard engines, so a host page can render
//! templates, mask input, detect card brands and validate values with the
//! same code the form engine runs.

use paycard_template::{bag_from_json, Template};
use paycard_validation::{card, FieldValue, InputMask, MaskSpec, ValidationContext};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Set panic hook for better error messages in the browser
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Card brand summary returned to JavaScript
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BrandInfo {
    pub name: String,
    pub mask: String,
    pub length: usize,
    pub icon: String,
    pub cvv_mask: String,
    pub cvv_rule: String,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Render a template against a plain JavaScript object
///
/// # Example (JavaScript)
/// ```javascript
/// renderTemplate('<% IF(paid) %>Thanks {{name}}<% ENDIF %>', { paid: true, name: 'Ada' });
/// ```
#[wasm_bindgen(js_name = renderTemplate)]
pub fn render_template(template: &str, data: JsValue) -> Result<String, JsValue> {
    let json: serde_json::Value = serde_wasm_bindgen::from_value(data)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse data: {}", e)))?;
    Ok(Template::parse(template).render(&bag_from_json(json)))
}

/// Apply a literal or `/regex/flags` mask. `validChars` overrides the `#`
/// character class.
#[wasm_bindgen(js_name = applyMask)]
pub fn apply_mask(pattern: &str, raw: &str, valid_chars: Option<String>) -> Result<String, JsValue> {
    let spec = MaskSpec {
        pattern: pattern.to_string(),
        valid_chars,
    };
    let mask = InputMask::new(spec).map_err(|e| {
        let message = e.to_string();
        web_sys::console::warn_1(&JsValue::from_str(&message));
        JsValue::from_str(&message)
    })?;
    Ok(mask.apply(raw))
}

/// Detect the card brand of a (partial) number
#[wasm_bindgen(js_name = detectCardBrand)]
pub fn detect_card_brand(number: &str) -> Result<JsValue, JsValue> {
    to_js(&brand_info(number))
}

fn brand_info(number: &str) -> BrandInfo {
    let brand = card::detect(number);
    BrandInfo {
        name: brand.name.to_string(),
        mask: brand.mask.to_string(),
        length: brand.length,
        icon: brand.icon.to_string(),
        cvv_mask: brand.cvv_mask(),
        cvv_rule: brand.cvv_rule(),
    }
}

/// Validate a value against a rule string such as `required|min:3`
///
/// # Returns
/// `{ isValid, errors }`
#[wasm_bindgen(js_name = validateValue)]
pub fn validate_value(value: &str, rules: &str) -> Result<JsValue, JsValue> {
    let context = ValidationContext::with_builtin_rules();
    to_js(&context.validate(&FieldValue::from(value), rules))
}

/// Validate a checkbox state against a rule string
#[wasm_bindgen(js_name = validateChecked)]
pub fn validate_checked(checked: bool, rules: &str) -> Result<JsValue, JsValue> {
    let context = ValidationContext::with_builtin_rules();
    to_js(&context.validate(&FieldValue::Bool(checked), rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_apply_mask() {
        assert_eq!(
            apply_mask("#### ####", "12345678", None).unwrap(),
            "1234 5678"
        );
        assert_eq!(apply_mask(r"/^\d{3}$/", "1234", None).unwrap(), "123");
    }

    #[wasm_bindgen_test]
    fn test_brand_info() {
        let amex = brand_info("3782");
        assert_eq!(amex.icon, "amex");
        assert_eq!(amex.cvv_rule, "required|min:4");
        assert_eq!(brand_info("").name, "Default");
    }
}
