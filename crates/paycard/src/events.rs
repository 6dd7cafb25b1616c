//! Widget lifecycle callbacks

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::backend::Payload;
use crate::provider::ProviderKey;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadEvent {
    pub container_id: String,
    pub theme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitEvent {
    pub provider: ProviderKey,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessEvent {
    pub provider: ProviderKey,
    pub payment: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailEvent {
    pub provider: ProviderKey,
    pub message: String,
    /// Whatever the backend returned alongside the failure
    pub error: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidFormEvent {
    pub provider: ProviderKey,
    /// Field name to its error messages, failing fields only
    pub errors: BTreeMap<String, Vec<String>>,
}

type Handler<E> = Option<Box<dyn Fn(&E)>>;

/// Registered callbacks. Unset callbacks are skipped.
#[derive(Default)]
pub struct WidgetEvents {
    on_load: Handler<LoadEvent>,
    on_submit: Handler<SubmitEvent>,
    on_success: Handler<SuccessEvent>,
    on_fail: Handler<FailEvent>,
    on_invalid_form: Handler<InvalidFormEvent>,
}

impl WidgetEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_load(mut self, f: impl Fn(&LoadEvent) + 'static) -> Self {
        self.on_load = Some(Box::new(f));
        self
    }

    pub fn on_submit(mut self, f: impl Fn(&SubmitEvent) + 'static) -> Self {
        self.on_submit = Some(Box::new(f));
        self
    }

    pub fn on_success(mut self, f: impl Fn(&SuccessEvent) + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_fail(mut self, f: impl Fn(&FailEvent) + 'static) -> Self {
        self.on_fail = Some(Box::new(f));
        self
    }

    pub fn on_invalid_form(mut self, f: impl Fn(&InvalidFormEvent) + 'static) -> Self {
        self.on_invalid_form = Some(Box::new(f));
        self
    }

    pub(crate) fn load(&self, event: LoadEvent) {
        emit(&self.on_load, &event);
    }

    pub(crate) fn submit(&self, event: SubmitEvent) {
        emit(&self.on_submit, &event);
    }

    pub(crate) fn success(&self, event: SuccessEvent) {
        emit(&self.on_success, &event);
    }

    pub(crate) fn fail(&self, event: FailEvent) {
        emit(&self.on_fail, &event);
    }

    pub(crate) fn invalid_form(&self, event: InvalidFormEvent) {
        emit(&self.on_invalid_form, &event);
    }
}

fn emit<E>(handler: &Handler<E>, event: &E) {
    if let Some(handler) = handler {
        handler(event);
    }
}
