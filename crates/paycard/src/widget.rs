// File: src/widget.rs
// Purpose: Widget lifecycle: mount, refresh, submit, pre-register, unmount

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use paycard_validation::ValidationContext;

use crate::backend::{Collaborators, PaymentResponse, PaymentStatus};
use crate::config::{FormConfig, WidgetConfig};
use crate::debounce::Debouncer;
use crate::dom::{Document, FieldEvent};
use crate::error::{Result, WidgetError};
use crate::events::{FailEvent, InvalidFormEvent, LoadEvent, SubmitEvent, SuccessEvent, WidgetEvents};
use crate::policy::RequirementContext;
use crate::provider::{detect_active_provider, ProviderKey};
use crate::session::{FormSession, FormValidation, SessionOptions};
use crate::templates::TemplateSet;

/// Slot holding the price text
pub const PRICE_SLOT: &str = "price";

/// What a mounted widget is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Waiting for the first configuration
    NoConfig,
    Form,
    /// Configuration failed to load
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Unmounted,
    Mounted(RenderState),
    Submitting,
    /// The page navigated to the payment provider
    RedirectedAway,
}

/// Result of a submit attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation blocked the submission
    Invalid(FormValidation),
    Redirected(String),
    Completed,
    Failed(String),
}

struct WidgetInner {
    config: WidgetConfig,
    collaborators: Collaborators,
    document: Rc<dyn Document>,
    events: WidgetEvents,
    templates: TemplateSet,
    state: Cell<WidgetState>,
    container: RefCell<Option<String>>,
    form_config: RefCell<Option<FormConfig>>,
    session: RefCell<Option<FormSession>>,
    last_error: RefCell<Option<String>>,
    debouncer: Debouncer,
}

/// An embeddable checkout form
///
/// Cloning is cheap and yields a handle to the same widget. The widget is
/// single-threaded; drive it from a `tokio::task::LocalSet`.
#[derive(Clone)]
pub struct Widget {
    inner: Rc<WidgetInner>,
}

pub struct WidgetBuilder {
    document: Rc<dyn Document>,
    collaborators: Collaborators,
    config: WidgetConfig,
    events: WidgetEvents,
    templates: TemplateSet,
}

impl WidgetBuilder {
    pub fn config(mut self, config: WidgetConfig) -> Self {
        self.config = config;
        self
    }

    pub fn events(mut self, events: WidgetEvents) -> Self {
        self.events = events;
        self
    }

    pub fn templates(mut self, templates: TemplateSet) -> Self {
        self.templates = templates;
        self
    }

    pub fn build(self) -> Widget {
        let debouncer = Debouncer::new(self.config.form.debounce());
        Widget {
            inner: Rc::new(WidgetInner {
                config: self.config,
                collaborators: self.collaborators,
                document: self.document,
                events: self.events,
                templates: self.templates,
                state: Cell::new(WidgetState::Unmounted),
                container: RefCell::new(None),
                form_config: RefCell::new(None),
                session: RefCell::new(None),
                last_error: RefCell::new(None),
                debouncer,
            }),
        }
    }
}

/// Disables the form while a payment is in flight; re-enables it on drop
struct LoadingGuard<'a> {
    inner: &'a WidgetInner,
}

impl<'a> LoadingGuard<'a> {
    fn new(inner: &'a WidgetInner) -> Self {
        if let Some(session) = inner.session.borrow().as_ref() {
            session.set_disabled(true);
        }
        inner.document.set_loading(true);
        inner.state.set(WidgetState::Submitting);
        Self { inner }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.inner.session.borrow().as_ref() {
            session.set_disabled(false);
        }
        self.inner.document.set_loading(false);
        // An unmount during the request wins over the restore
        if self.inner.state.get() == WidgetState::Submitting {
            self.inner.state.set(WidgetState::Mounted(RenderState::Form));
        }
    }
}

impl Widget {
    pub fn builder(document: Rc<dyn Document>, collaborators: Collaborators) -> WidgetBuilder {
        WidgetBuilder {
            document,
            collaborators,
            config: WidgetConfig::default(),
            events: WidgetEvents::default(),
            templates: TemplateSet::builtin(),
        }
    }

    fn from_weak(weak: &Weak<WidgetInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn state(&self) -> WidgetState {
        self.inner.state.get()
    }

    pub fn container_id(&self) -> Option<String> {
        self.inner.container.borrow().clone()
    }

    /// Message of the last configuration failure, cleared by a successful
    /// refresh
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.borrow().clone()
    }

    pub fn form_config(&self) -> Option<FormConfig> {
        self.inner.form_config.borrow().clone()
    }

    /// Provider of the currently selected tab
    pub fn active_provider(&self) -> ProviderKey {
        self.with_session(FormSession::active_provider)
            .unwrap_or_default()
    }

    /// Run `f` against the live form session, if a form is rendered
    pub fn with_session<R>(&self, f: impl FnOnce(&FormSession) -> R) -> Option<R> {
        self.inner.session.borrow().as_ref().map(f)
    }

    /// Attach to `container_id` and load the form. Calls after the first are
    /// ignored until [`Widget::unmount`].
    pub async fn mount(&self, container_id: &str) -> Result<()> {
        if self.state() != WidgetState::Unmounted {
            tracing::debug!(container = container_id, "already mounted, ignoring mount");
            return Ok(());
        }
        *self.inner.container.borrow_mut() = Some(container_id.to_string());
        self.inner.state.set(WidgetState::Mounted(RenderState::NoConfig));
        tracing::info!(container = container_id, "widget mounted");
        self.refresh().await
    }

    /// Fetch the configuration and re-render. A failed fetch renders the
    /// error page and still returns `Ok`.
    pub async fn refresh(&self) -> Result<()> {
        let container = self.container_id().ok_or(WidgetError::NotMounted)?;
        let request = self.inner.config.config_request();
        tracing::debug!(container = %container, package = %request.package_id, "refreshing form");

        let fetched = self.inner.collaborators.config.fetch_config(&request).await;

        if self.container_id().as_deref() != Some(container.as_str()) {
            tracing::debug!("widget unmounted while loading configuration");
            return Ok(());
        }

        self.teardown_session();

        match fetched {
            Ok(form_config) => self.render_form(&container, form_config),
            Err(err) => {
                let err = WidgetError::Config(err);
                tracing::warn!(error = %err, "rendering error page");
                let message = err.to_string();
                let html = self.inner.templates.render_error(&message);
                *self.inner.last_error.borrow_mut() = Some(message);
                *self.inner.form_config.borrow_mut() = None;
                self.inner.document.render(&container, &html)?;
                self.inner.state.set(WidgetState::Mounted(RenderState::Error));
                Ok(())
            }
        }
    }

    fn render_form(&self, container: &str, form_config: FormConfig) -> Result<()> {
        let inner = &self.inner;
        let theme = inner
            .templates
            .resolve_theme(inner.config.form.theme.as_deref().or(form_config.theme.as_deref()))
            .to_string();

        let html = inner.templates.render_form(&form_config, &theme);
        inner.document.render(container, &html)?;

        let context = Rc::new(ValidationContext::with_builtin_rules());
        context.extend_messages(form_config.messages.clone());

        let requirements = RequirementContext {
            is_saved_card_payment: form_config.is_saved_card_payment,
            country: form_config.country.clone(),
            is_business_purchase_enabled: form_config.is_business_purchase_enabled,
        };
        let options = SessionOptions {
            validate_on_blur: inner.config.form.validate_on_blur,
        };
        let session = FormSession::bind(inner.document.as_ref(), context, requirements, options)?;

        *inner.session.borrow_mut() = Some(session);
        *inner.form_config.borrow_mut() = Some(form_config);
        *inner.last_error.borrow_mut() = None;
        inner.state.set(WidgetState::Mounted(RenderState::Form));

        self.init(container, theme);
        Ok(())
    }

    /// Wire tabs and the subscriber id pre-register, then announce the load
    fn init(&self, container: &str, theme: String) {
        let weak = Rc::downgrade(&self.inner);
        self.with_session(|session| {
            session.bind_tabs();
            if let Some(name) = session.subscriber_field().map(|field| field.name()) {
                session.listen(
                    &name,
                    FieldEvent::Input,
                    Rc::new(move || {
                        if let Some(widget) = Widget::from_weak(&weak) {
                            widget.schedule_pre_register();
                        }
                    }),
                );
            }
        });

        tracing::info!(container, theme = %theme, "form loaded");
        self.inner.events.load(LoadEvent {
            container_id: container.to_string(),
            theme,
        });
    }

    /// Restart the pre-register timer
    fn schedule_pre_register(&self) {
        let weak = Rc::downgrade(&self.inner);
        self.inner.debouncer.schedule(async move {
            if let Some(widget) = Widget::from_weak(&weak) {
                widget.pre_register().await;
            }
        });
    }

    /// Register the current subscriber id with the backend. Best effort:
    /// failures are logged and otherwise ignored.
    pub async fn pre_register(&self) {
        let subscriber_id = self
            .with_session(|session| session.subscriber_field().map(|field| field.value()))
            .flatten()
            .unwrap_or_default();
        if subscriber_id.trim().is_empty() {
            return;
        }

        match self
            .inner
            .collaborators
            .subscribers
            .register_subscriber(&subscriber_id)
            .await
        {
            Ok(response) => {
                if let Some(code) = &response.error_code {
                    tracing::debug!(code = %code, "pre-register rejected");
                    return;
                }
                if let Some(saved) = response.has_saved_card {
                    self.with_session(|session| session.set_saved_card_payment(saved));
                }
                if let Some(price) = &response.price_text {
                    self.inner.document.set_slot_text(PRICE_SLOT, price);
                }
                tracing::debug!("pre-register applied");
            }
            Err(err) => tracing::debug!(error = %err, "pre-register failed"),
        }
    }

    /// Validate and submit through the provider the user is paying with
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        match self.state() {
            WidgetState::Mounted(RenderState::Form) => {}
            WidgetState::Submitting => return Err(WidgetError::SubmissionInProgress),
            WidgetState::Unmounted => return Err(WidgetError::NotMounted),
            _ => return Err(WidgetError::NotReady),
        }

        let (provider, validation, payload) = {
            let session = self.inner.session.borrow();
            let session = session.as_ref().ok_or(WidgetError::NotReady)?;
            session.reset_for_submit();
            let provider = detect_active_provider(&self.inner.document.focused());
            session.mark_submit_button(provider);
            session.set_active_tab(provider);
            (provider, session.validate_for(provider), session.payload())
        };

        if !validation.is_valid() {
            tracing::info!(provider = %provider, "submission blocked by validation");
            self.inner.events.invalid_form(InvalidFormEvent {
                provider,
                errors: validation.errors(),
            });
            return Ok(SubmitOutcome::Invalid(validation));
        }

        self.inner.events.submit(SubmitEvent {
            provider,
            payload: payload.clone(),
        });

        let response = {
            let _loading = LoadingGuard::new(&self.inner);
            self.inner
                .collaborators
                .payments
                .submit_payment(provider, &payload)
                .await
        };

        let outcome = match response {
            Ok(response) => self.finish(provider, response),
            Err(err) => {
                let err = WidgetError::Payment(err);
                self.fail(provider, err.to_string(), None)
            }
        };
        tracing::info!(provider = %provider, outcome = ?outcome, "submission finished");
        Ok(outcome)
    }

    fn finish(&self, provider: ProviderKey, response: PaymentResponse) -> SubmitOutcome {
        if let Some(error) = &response.error {
            let raw = serde_json::to_value(error).ok();
            return self.fail(provider, error.message.clone(), raw);
        }

        match (response.status, response.redirect_url) {
            (PaymentStatus::Redirect, Some(url)) => {
                self.inner.document.navigate(&url);
                self.inner.state.set(WidgetState::RedirectedAway);
                SubmitOutcome::Redirected(url)
            }
            (PaymentStatus::Redirect, None) => {
                self.fail(provider, "redirect response without a URL".to_string(), None)
            }
            (PaymentStatus::Complete, _) => {
                self.inner.events.success(SuccessEvent {
                    provider,
                    payment: response.payment,
                });
                SubmitOutcome::Completed
            }
        }
    }

    fn fail(
        &self,
        provider: ProviderKey,
        message: String,
        error: Option<serde_json::Value>,
    ) -> SubmitOutcome {
        tracing::warn!(provider = %provider, message = %message, "payment failed");
        self.inner.events.fail(FailEvent {
            provider,
            message: message.clone(),
            error,
        });
        SubmitOutcome::Failed(message)
    }

    fn teardown_session(&self) {
        self.inner.debouncer.cancel();
        let session = self.inner.session.borrow_mut().take();
        if let Some(mut session) = session {
            session.teardown();
        }
    }

    /// Tear down the form and empty the container. Safe to call repeatedly.
    pub fn unmount(&self) {
        let Some(container) = self.inner.container.borrow_mut().take() else {
            return;
        };
        self.teardown_session();
        self.inner.document.clear(&container);
        *self.inner.form_config.borrow_mut() = None;
        self.inner.state.set(WidgetState::Unmounted);
        tracing::info!(container = %container, "widget unmounted");
    }
}
