//! Shared fixtures: scripted collaborators and a widget wired to a
//! headless document that records every event it fires.
#![allow(dead_code)]

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use paycard::events::WidgetEvents;
use paycard::{
    Collaborators, ConfigLoader, ConfigRequest, FormConfig, MemoryDocument, PaymentGateway,
    PaymentResponse, Payload, ProviderKey, RegisterResponse, SubscriberRegistry, Widget,
    WidgetConfig,
};
use tokio::task::LocalSet;

pub const CONTAINER: &str = "checkout";

/// Route widget logs through the test writer; `RUST_LOG` picks the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Serves a fixed configuration, or fails with a message
pub struct ScriptedConfig {
    pub reply: RefCell<Result<FormConfig, String>>,
    pub requests: RefCell<Vec<ConfigRequest>>,
}

#[async_trait(?Send)]
impl ConfigLoader for ScriptedConfig {
    async fn fetch_config(&self, request: &ConfigRequest) -> Result<FormConfig> {
        self.requests.borrow_mut().push(request.clone());
        self.reply.borrow().clone().map_err(|message| anyhow!(message))
    }
}

/// Records payments and answers with a scripted response after `delay`
pub struct ScriptedGateway {
    pub reply: RefCell<Result<PaymentResponse, String>>,
    pub delay: Duration,
    pub calls: RefCell<Vec<(ProviderKey, Payload)>>,
}

#[async_trait(?Send)]
impl PaymentGateway for ScriptedGateway {
    async fn submit_payment(
        &self,
        provider: ProviderKey,
        payload: &Payload,
    ) -> Result<PaymentResponse> {
        self.calls.borrow_mut().push((provider, payload.clone()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.borrow().clone().map_err(|message| anyhow!(message))
    }
}

pub struct ScriptedRegistry {
    pub reply: RefCell<Result<RegisterResponse, String>>,
    pub calls: RefCell<Vec<String>>,
}

#[async_trait(?Send)]
impl SubscriberRegistry for ScriptedRegistry {
    async fn register_subscriber(&self, subscriber_id: &str) -> Result<RegisterResponse> {
        self.calls.borrow_mut().push(subscriber_id.to_string());
        self.reply.borrow().clone().map_err(|message| anyhow!(message))
    }
}

pub struct Harness {
    pub doc: Rc<MemoryDocument>,
    pub widget: Widget,
    pub config: Rc<ScriptedConfig>,
    pub gateway: Rc<ScriptedGateway>,
    pub registry: Rc<ScriptedRegistry>,
    pub events: Rc<RefCell<Vec<String>>>,
}

impl Harness {
    pub fn new(form: FormConfig) -> Self {
        Self::with_gateway_delay(form, Duration::ZERO)
    }

    pub fn with_gateway_delay(form: FormConfig, delay: Duration) -> Self {
        init_tracing();
        let doc = Rc::new(MemoryDocument::new().with_container(CONTAINER));
        let config = Rc::new(ScriptedConfig {
            reply: RefCell::new(Ok(form)),
            requests: RefCell::new(Vec::new()),
        });
        let gateway = Rc::new(ScriptedGateway {
            reply: RefCell::new(Ok(PaymentResponse::complete(serde_json::json!({ "id": "pay_1" })))),
            delay,
            calls: RefCell::new(Vec::new()),
        });
        let registry = Rc::new(ScriptedRegistry {
            reply: RefCell::new(Ok(RegisterResponse::default())),
            calls: RefCell::new(Vec::new()),
        });
        let events = Rc::new(RefCell::new(Vec::new()));

        let log = |events: &Rc<RefCell<Vec<String>>>| {
            let events = events.clone();
            move |entry: String| events.borrow_mut().push(entry)
        };
        let (on_load, on_submit, on_success, on_fail, on_invalid) =
            (log(&events), log(&events), log(&events), log(&events), log(&events));

        let widget = Widget::builder(
            doc.clone(),
            Collaborators {
                config: config.clone(),
                payments: gateway.clone(),
                subscribers: registry.clone(),
            },
        )
        .config(WidgetConfig::default())
        .events(
            WidgetEvents::new()
                .on_load(move |e| on_load(format!("load:{}", e.theme)))
                .on_submit(move |e| on_submit(format!("submit:{}", e.provider)))
                .on_success(move |e| on_success(format!("success:{}", e.provider)))
                .on_fail(move |e| on_fail(format!("fail:{}", e.message)))
                .on_invalid_form(move |e| {
                    let fields: Vec<&str> = e.errors.keys().map(String::as_str).collect();
                    on_invalid(format!("invalid:{}", fields.join(",")))
                }),
        )
        .build();

        Self {
            doc,
            widget,
            config,
            gateway,
            registry,
            events,
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// Type into a rendered field
    pub fn type_into(&self, name: &str, text: &str) {
        self.doc
            .field(name)
            .unwrap_or_else(|| panic!("field `{}` not rendered", name))
            .type_text(text);
    }

    /// Fill every field a card payment needs with valid values
    pub fn fill_valid_card_form(&self) {
        self.type_into("email", "buyer@example.com");
        self.doc.field("agreement").unwrap().toggle(true);
        self.type_into("cardNumber", "4111111111111111");
        self.type_into("cardHolder", "Jane Doe");
        self.type_into("cardExpiry", "1229");
        self.type_into("cardCvv", "123");
    }
}

/// Run a test body on a `LocalSet`, as the widget requires
pub async fn local<F: Future>(fut: F) -> F::Output {
    LocalSet::new().run_until(fut).await
}
