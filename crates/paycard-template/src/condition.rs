// File: src/condition.rs
// Purpose: Parse and evaluate `IF(...)` conditions against a data bag

use crate::value::{DataBag, Value};

const EQUALS: &str = "===";

/// Right-hand side of an equality condition
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Value(Value),
    /// JSON array literal; the condition is a membership test
    OneOf(Vec<Value>),
    Undefined,
}

/// A parsed `IF` condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `IF(key)`
    Truthy(String),
    /// `IF(key === literal)`
    Equals { key: String, literal: Literal },
}

impl Condition {
    /// Parse condition text. Never fails; text without `===` is a truthy test.
    pub fn parse(text: &str) -> Self {
        match text.split_once(EQUALS) {
            Some((key, literal)) => Condition::Equals {
                key: key.trim().to_string(),
                literal: Literal::parse(literal.trim()),
            },
            None => Condition::Truthy(text.trim().to_string()),
        }
    }

    /// Pure evaluation: an absent key is always false
    pub fn evaluate(&self, data: &DataBag) -> bool {
        match self {
            Condition::Truthy(key) => data.get(key).is_some_and(Value::is_truthy),
            Condition::Equals { key, literal } => {
                let Some(value) = data.get(key) else {
                    return false;
                };
                match literal {
                    Literal::Value(expected) => value.strict_eq(expected),
                    Literal::OneOf(options) => options.iter().any(|o| o.strict_eq(value)),
                    // A present key can never hold `undefined`
                    Literal::Undefined => false,
                }
            }
        }
    }
}

impl Literal {
    /// Parse a literal: JSON (array, bool, number, null, double-quoted
    /// string), `undefined`, single-quoted string, or a bare word
    pub fn parse(text: &str) -> Self {
        if text == "undefined" {
            return Literal::Undefined;
        }

        if let Ok(json) = serde_json::from_str::<serde_json::Value>(text) {
            return match json {
                serde_json::Value::Array(items) => {
                    Literal::OneOf(items.into_iter().map(Value::from).collect())
                }
                other => Literal::Value(Value::from(other)),
            };
        }

        let unquoted = strip_quotes(text, '\'')
            .or_else(|| strip_quotes(text, '"'))
            .unwrap_or(text);
        Literal::Value(Value::String(unquoted.to_string()))
    }
}

fn strip_quotes(text: &str, quote: char) -> Option<&str> {
    text.strip_prefix(quote)?.strip_suffix(quote)
}
