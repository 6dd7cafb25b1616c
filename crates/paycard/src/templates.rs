// File: src/templates.rs
// Purpose: Built-in form templates, theme lookup and data bag assembly

use std::collections::HashMap;

use paycard_template::{DataBag, Template, Value};
use paycard_validation::phone::{self, Country};

use crate::config::{FormConfig, SubscriberIdType};
use crate::policy::RequirementContext;
use crate::provider::ProviderKey;

pub const DEFAULT_THEME: &str = "default";

const FORM_TEMPLATE: &str = include_str!("../templates/form.html");
const ERROR_TEMPLATE: &str = include_str!("../templates/error.html");
const OPTION_TEMPLATE: &str = include_str!("../templates/option.html");

/// Escape text for use inside HTML content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Parsed templates keyed by theme
pub struct TemplateSet {
    forms: HashMap<String, Template>,
    error: Template,
    option: Template,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateSet {
    /// The templates shipped with the crate
    pub fn builtin() -> Self {
        let mut forms = HashMap::new();
        forms.insert(DEFAULT_THEME.to_string(), Template::parse(FORM_TEMPLATE));
        Self {
            forms,
            error: Template::parse(ERROR_TEMPLATE),
            option: Template::parse(OPTION_TEMPLATE),
        }
    }

    /// Add or replace the form template for `theme`
    pub fn register(&mut self, theme: impl Into<String>, source: &str) {
        self.forms.insert(theme.into(), Template::parse(source));
    }

    pub fn with_theme(mut self, theme: impl Into<String>, source: &str) -> Self {
        self.register(theme, source);
        self
    }

    pub fn has_theme(&self, theme: &str) -> bool {
        self.forms.contains_key(theme)
    }

    /// Resolve a theme name, falling back to the default
    pub fn resolve_theme<'a>(&self, theme: Option<&'a str>) -> &'a str {
        match theme {
            Some(name) if self.has_theme(name) => name,
            Some(name) => {
                tracing::debug!(theme = name, "unknown theme, using default");
                DEFAULT_THEME
            }
            None => DEFAULT_THEME,
        }
    }

    fn form(&self, theme: &str) -> Option<&Template> {
        self.forms
            .get(theme)
            .or_else(|| self.forms.get(DEFAULT_THEME))
    }

    /// Render the checkout form for `config`
    pub fn render_form(&self, config: &FormConfig, theme: &str) -> String {
        let data = form_bag(config, theme, &self.option);
        self.form(theme)
            .map(|template| template.render(&data))
            .unwrap_or_default()
    }

    /// Render the page shown when the configuration could not be loaded
    pub fn render_error(&self, message: &str) -> String {
        let mut data = DataBag::new();
        data.insert("ERROR_MESSAGE".into(), Value::from(escape_html(message)));
        self.error.render(&data)
    }
}

/// Countries offered by the phone picker
pub fn offered_countries(config: &FormConfig) -> Vec<&'static Country> {
    if config.countries.is_empty() {
        return phone::COUNTRIES.iter().collect();
    }
    config
        .countries
        .iter()
        .filter_map(|code| phone::country_by_code(code))
        .collect()
}

/// The preselected country: the configured one when offered, else the first
pub fn selected_country(config: &FormConfig) -> Option<&'static Country> {
    let offered = offered_countries(config);
    config
        .country
        .as_deref()
        .and_then(|code| offered.iter().find(|c| c.code.eq_ignore_ascii_case(code)))
        .or_else(|| offered.first())
        .copied()
}

fn country_options(config: &FormConfig, option: &Template) -> String {
    let selected = selected_country(config).map(|c| c.code);
    offered_countries(config)
        .into_iter()
        .map(|country| {
            let mut data = DataBag::new();
            data.insert("CODE".into(), Value::from(country.code));
            data.insert("NAME".into(), Value::from(escape_html(country.name)));
            data.insert("DIAL_CODE".into(), Value::from(country.dial_code));
            data.insert("SELECTED".into(), Value::Bool(Some(country.code) == selected));
            option.render(&data)
        })
        .collect::<Vec<_>>()
        .join("")
}

fn form_bag(config: &FormConfig, theme: &str, option: &Template) -> DataBag {
    let mut data = DataBag::new();
    let text = |s: &str| Value::from(escape_html(s));

    data.insert("THEME".into(), text(theme));
    data.insert("TITLE".into(), text(&config.title));
    data.insert("PRICE_TEXT".into(), text(&config.price_text));
    data.insert("SUBMIT_LABEL".into(), text(&config.submit_label));
    data.insert("AGREEMENT_TEXT".into(), text(&config.agreement_text));
    data.insert(
        "SUBSCRIBER_ID".into(),
        text(config.subscriber_id.as_deref().unwrap_or_default()),
    );
    data.insert(
        "SUBSCRIBER_ID_TYPE".into(),
        Value::from(match config.subscriber_id_type {
            SubscriberIdType::Email => "email",
            SubscriberIdType::Phone => "phone",
        }),
    );

    let country = selected_country(config);
    data.insert(
        "PHONE_MASK".into(),
        text(country.map(|c| c.mask).unwrap_or_default()),
    );
    data.insert("COUNTRY_OPTIONS".into(), Value::from(country_options(config, option)));

    // Only the phone layout renders a country picker to fall back on
    let zip_country = match config.subscriber_id_type {
        SubscriberIdType::Phone => country.map(|c| c.code.to_string()),
        SubscriberIdType::Email => config.country.clone(),
    };
    let requirements = RequirementContext {
        country: zip_country,
        ..RequirementContext::default()
    };
    data.insert("ZIP_RULE".into(), Value::from(requirements.zip_rule()));

    let offers = |p: ProviderKey| Value::Bool(config.providers.contains(&p));
    data.insert("PAYPAL".into(), offers(ProviderKey::Paypal));
    data.insert("GOOGLE_PAY".into(), offers(ProviderKey::GooglePay));
    data.insert("APPLE_PAY".into(), offers(ProviderKey::ApplePay));

    data.insert("REQUIRE_AGREEMENT".into(), Value::Bool(config.require_agreement));
    data.insert("IS_SAVED_CARD".into(), Value::Bool(config.is_saved_card_payment));
    data.insert(
        "SAVED_CARD_LAST4".into(),
        text(config.saved_card_last4.as_deref().unwrap_or_default()),
    );
    data.insert("BUSINESS".into(), Value::Bool(config.is_business_purchase_enabled));
    data
}
