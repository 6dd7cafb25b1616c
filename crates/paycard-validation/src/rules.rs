//! Built-in validation rules
//!
//! Every rule has the same shape: `(value, params, messages) -> Ok | message`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::card;
use crate::messages::Messages;
use crate::phone;
use crate::value::FieldValue;

pub type RuleResult = Result<(), String>;

/// Signature shared by the built-in rules
pub type BuiltinRule = fn(&FieldValue, &[String], &Messages) -> RuleResult;

static EMAIL_REGEX: Lazy<Option<Regex>> = Lazy::new(|| compile(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));
static EXPIRATION_REGEX: Lazy<Option<Regex>> = Lazy::new(|| compile(r"^(0[1-9]|1[0-2])\d{2}$"));
static ZIP_REGEX: Lazy<Option<Regex>> = Lazy::new(|| compile(r"^[\d-]*$"));

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|err| tracing::error!(pattern, error = %err, "invalid rule pattern"))
        .ok()
}

fn is_match(re: &Lazy<Option<Regex>>, text: &str) -> bool {
    Lazy::force(re).as_ref().is_some_and(|re| re.is_match(text))
}

fn check(ok: bool, rule: &str, params: &[String], messages: &Messages) -> RuleResult {
    if ok {
        Ok(())
    } else {
        Err(messages.format(rule, params))
    }
}

/// First parameter as a count; a missing or malformed parameter counts as 0
fn count_param(params: &[String]) -> usize {
    params
        .first()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0)
}

/// Fails for missing, null, empty string and unchecked checkbox. `0` passes.
pub fn required(value: &FieldValue, params: &[String], messages: &Messages) -> RuleResult {
    let present = match value {
        FieldValue::Missing | FieldValue::Null => false,
        FieldValue::Text(s) => !s.is_empty(),
        FieldValue::Bool(b) => *b,
        FieldValue::Number(_) => true,
    };
    check(present, "required", params, messages)
}

pub fn min_length(value: &FieldValue, params: &[String], messages: &Messages) -> RuleResult {
    let ok = value.as_text().chars().count() >= count_param(params);
    check(ok, "minLength", params, messages)
}

pub fn email(value: &FieldValue, params: &[String], messages: &Messages) -> RuleResult {
    check(is_match(&EMAIL_REGEX, &value.as_text()), "email", params, messages)
}

/// `MM/YY` or `MMYY`, month 01-12
pub fn expiration_date(value: &FieldValue, params: &[String], messages: &Messages) -> RuleResult {
    let stripped = value.as_text().replace('/', "");
    check(
        is_match(&EXPIRATION_REGEX, &stripped),
        "expirationDate",
        params,
        messages,
    )
}

/// Digit count must equal the detected brand's length
pub fn card(value: &FieldValue, params: &[String], messages: &Messages) -> RuleResult {
    let digits = phone::clean_digits(&value.as_text());
    let brand = card::detect(&digits);
    check(digits.len() == brand.length, "card", params, messages)
}

pub fn length(value: &FieldValue, params: &[String], messages: &Messages) -> RuleResult {
    let ok = value.as_text().chars().count() == count_param(params);
    check(ok, "length", params, messages)
}

pub fn min(value: &FieldValue, params: &[String], messages: &Messages) -> RuleResult {
    let ok = value.as_text().chars().count() >= count_param(params);
    check(ok, "min", params, messages)
}

/// The dialing code picks the country; the digit count must match its mask
pub fn phone(value: &FieldValue, params: &[String], messages: &Messages) -> RuleResult {
    let digits = phone::clean_digits(&value.as_text());
    let ok = phone::country_by_digits(&digits)
        .is_some_and(|country| digits.len() == country.expected_length());
    check(ok, "phone", params, messages)
}

pub fn zip_code(value: &FieldValue, params: &[String], messages: &Messages) -> RuleResult {
    check(is_match(&ZIP_REGEX, &value.as_text()), "zipCode", params, messages)
}

/// Built-in rules in registration order
pub fn builtin() -> [(&'static str, BuiltinRule); 9] {
    [
        ("required", required as BuiltinRule),
        ("minLength", min_length as BuiltinRule),
        ("email", email as BuiltinRule),
        ("expirationDate", expiration_date as BuiltinRule),
        ("card", card as BuiltinRule),
        ("length", length as BuiltinRule),
        ("min", min as BuiltinRule),
        ("phone", phone as BuiltinRule),
        ("zipCode", zip_code as BuiltinRule),
    ]
}
