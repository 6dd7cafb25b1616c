//! Values handed to validation rules

use std::borrow::Cow;

/// A field value as seen by a rule
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// No value at all (the field does not exist)
    Missing,
    Null,
    /// Checkbox state
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// String form used by length and pattern rules
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Missing | FieldValue::Null => Cow::Borrowed(""),
            FieldValue::Bool(b) => Cow::Owned(b.to_string()),
            FieldValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                Cow::Owned(format!("{}", *n as i64))
            }
            FieldValue::Number(n) => Cow::Owned(n.to_string()),
            FieldValue::Text(s) => Cow::Borrowed(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Number(n as f64)
    }
}
