// File: src/config.rs
// Purpose: Host configuration (paycard.toml) and the fetched form configuration

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::backend::ConfigRequest;
use crate::provider::ProviderKey;

/// Widget configuration supplied by the embedding host
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WidgetConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub form: FormOptions,
}

/// Identifies the checkout session to the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub package_id: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub subscriber_id: Option<String>,
}

/// Client-side form behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormOptions {
    /// Validate text fields on blur instead of on every keystroke
    #[serde(default = "default_true")]
    pub validate_on_blur: bool,

    /// Quiet period before the subscriber id is pre-registered
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Overrides the theme sent by the backend
    #[serde(default)]
    pub theme: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            package_id: String::new(),
            language: default_language(),
            subscriber_id: None,
        }
    }
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_on_blur: true,
            debounce_ms: default_debounce_ms(),
            theme: None,
        }
    }
}

impl FormOptions {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl WidgetConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing or empty file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: WidgetConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from the default path (./paycard.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("paycard.toml")
    }

    /// Request sent to the config loader
    pub fn config_request(&self) -> ConfigRequest {
        ConfigRequest {
            token: self.session.token.clone(),
            package_id: self.session.package_id.clone(),
            language: self.session.language.clone(),
            subscriber_id: self.session.subscriber_id.clone(),
        }
    }
}

/// How the buyer identifies themselves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SubscriberIdType {
    #[default]
    Email,
    Phone,
}

/// Form configuration returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    #[serde(default)]
    pub theme: Option<String>,

    #[serde(default)]
    pub title: String,

    /// Wallet providers offered next to card entry, in display order
    #[serde(default)]
    pub providers: Vec<ProviderKey>,

    #[serde(default)]
    pub subscriber_id_type: SubscriberIdType,

    /// Prefilled subscriber id
    #[serde(default)]
    pub subscriber_id: Option<String>,

    /// Preselected country (ISO code)
    #[serde(default)]
    pub country: Option<String>,

    /// Countries offered in the phone picker; empty means all known
    #[serde(default)]
    pub countries: Vec<String>,

    #[serde(default)]
    pub price_text: String,

    #[serde(default)]
    pub is_saved_card_payment: bool,

    #[serde(default)]
    pub saved_card_last4: Option<String>,

    #[serde(default)]
    pub is_business_purchase_enabled: bool,

    #[serde(default = "default_true")]
    pub require_agreement: bool,

    #[serde(default)]
    pub agreement_text: String,

    #[serde(default = "default_submit_label")]
    pub submit_label: String,

    /// Validation message overrides keyed by rule name
    #[serde(default)]
    pub messages: HashMap<String, String>,
}

fn default_submit_label() -> String {
    "Pay".to_string()
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            theme: None,
            title: String::new(),
            providers: Vec::new(),
            subscriber_id_type: SubscriberIdType::default(),
            subscriber_id: None,
            country: None,
            countries: Vec::new(),
            price_text: String::new(),
            is_saved_card_payment: false,
            saved_card_last4: None,
            is_business_purchase_enabled: false,
            require_agreement: true,
            agreement_text: String::new(),
            submit_label: default_submit_label(),
            messages: HashMap::new(),
        }
    }
}
