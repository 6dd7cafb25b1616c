//! Named-rule registry owned by one form session
//!
//! A context replaces a process-wide registry: each form session builds one,
//! registers the rules it needs, and drops it on teardown so a later render
//! with a different configuration starts clean.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;

use crate::messages::Messages;
use crate::rules::{self, RuleResult};
use crate::value::FieldValue;

/// A registered rule
pub type RuleFn = Rc<dyn Fn(&FieldValue, &[String], &Messages) -> RuleResult>;

/// Outcome of validating one value against a rule string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Valid iff `errors` is empty
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// First error message, if any
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

/// One `name:params` segment of a rule string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub name: String,
    pub params: Vec<String>,
}

/// Split `required|min:3|length:2,4` into rule specs. Empty segments are
/// dropped.
pub fn parse_rule_string(rule_string: &str) -> Vec<RuleSpec> {
    rule_string
        .split('|')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once(':') {
            Some((name, params)) => RuleSpec {
                name: name.trim().to_string(),
                params: params.split(',').map(|p| p.trim().to_string()).collect(),
            },
            None => RuleSpec {
                name: segment.to_string(),
                params: Vec::new(),
            },
        })
        .collect()
}

/// Rule registry plus the message table rules format their errors with
#[derive(Default)]
pub struct ValidationContext {
    rules: RefCell<HashMap<String, RuleFn>>,
    messages: RefCell<Messages>,
}

impl ValidationContext {
    /// A context with no rules and the default message table
    pub fn new() -> Self {
        Self::default()
    }

    /// A context with every built-in rule registered
    pub fn with_builtin_rules() -> Self {
        let context = Self::new();
        for (name, rule) in rules::builtin() {
            context.add_rule(name, rule);
        }
        context
    }

    /// Register a rule. The first registration of a name wins; later ones are
    /// ignored and `false` is returned.
    pub fn add_rule<F>(&self, name: &str, rule: F) -> bool
    where
        F: Fn(&FieldValue, &[String], &Messages) -> RuleResult + 'static,
    {
        let mut rules = self.rules.borrow_mut();
        if rules.contains_key(name) {
            tracing::debug!(rule = name, "rule already registered, keeping the first");
            return false;
        }
        rules.insert(name.to_string(), Rc::new(rule));
        true
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.borrow().contains_key(name)
    }

    /// Drop every registered rule
    pub fn clear(&self) {
        self.rules.borrow_mut().clear();
    }

    /// Replace the message table
    pub fn set_messages(&self, messages: Messages) {
        *self.messages.borrow_mut() = messages;
    }

    /// Merge message overrides into the current table
    pub fn extend_messages<I, K, V>(&self, overrides: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.messages.borrow_mut().extend(overrides);
    }

    /// Validate `value` against a pipe-delimited rule string. Unknown rule
    /// names are skipped.
    pub fn validate(&self, value: &FieldValue, rule_string: &str) -> ValidationResult {
        let specs = parse_rule_string(rule_string);
        let messages = self.messages.borrow();

        let errors = specs
            .iter()
            .filter_map(|spec| {
                // Clone the rule out so a rule may call back into the context
                let rule = self.rules.borrow().get(&spec.name).cloned();
                match rule {
                    Some(rule) => rule(value, spec.params.as_slice(), &*messages).err(),
                    None => {
                        tracing::trace!(rule = %spec.name, "unknown rule skipped");
                        None
                    }
                }
            })
            .collect();

        ValidationResult::from_errors(errors)
    }
}

impl std::fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.rules.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("ValidationContext")
            .field("rules", &names)
            .finish()
    }
}
