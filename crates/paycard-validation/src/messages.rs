//! Error message table
//!
//! Messages are keyed by rule name and may reference rule parameters
//! positionally: `Minimum {0} characters required`.

use std::collections::HashMap;

const DEFAULT_MESSAGE: &str = "Invalid value";

static BUILTIN_MESSAGES: &[(&str, &str)] = &[
    ("required", "This field is required"),
    ("minLength", "Minimum {0} characters required"),
    ("email", "Please enter a valid email address"),
    ("expirationDate", "Please enter a valid expiration date (MM/YY)"),
    ("card", "Please enter a valid card number"),
    ("length", "Must be exactly {0} characters"),
    ("min", "Minimum {0} characters"),
    ("phone", "Please enter a valid phone number"),
    ("zipCode", "Please enter a valid zip code"),
];

/// Replaceable message table with a default fallback
#[derive(Debug, Clone)]
pub struct Messages {
    messages: HashMap<String, String>,
    fallback: String,
}

impl Messages {
    /// An empty table; every rule uses the fallback message
    pub fn empty() -> Self {
        Self {
            messages: HashMap::new(),
            fallback: DEFAULT_MESSAGE.to_string(),
        }
    }

    /// Override (or add) the message for one rule
    pub fn set(&mut self, rule: impl Into<String>, message: impl Into<String>) {
        self.messages.insert(rule.into(), message.into());
    }

    /// Merge overrides on top of the current table
    pub fn extend<I, K, V>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.messages
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    /// Raw template for a rule
    pub fn template(&self, rule: &str) -> &str {
        self.messages
            .get(rule)
            .map(String::as_str)
            .unwrap_or(self.fallback.as_str())
    }

    /// Message for `rule` with `{0}`, `{1}`, ... replaced by `params`
    pub fn format(&self, rule: &str, params: &[String]) -> String {
        params
            .iter()
            .enumerate()
            .fold(self.template(rule).to_string(), |msg, (i, param)| {
                msg.replace(&format!("{{{}}}", i), param)
            })
    }
}

impl Default for Messages {
    fn default() -> Self {
        let mut messages = Self::empty();
        messages.extend(BUILTIN_MESSAGES.iter().copied());
        messages
    }
}
