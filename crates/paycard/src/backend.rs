// File: src/backend.rs
// Purpose: Collaborators the widget talks to over the network

use std::rc::Rc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::config::FormConfig;
use crate::provider::ProviderKey;

/// Normalized form values sent with a payment: checkboxes as booleans,
/// everything else as strings
pub type Payload = Map<String, JsonValue>;

/// Parameters for fetching the form configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRequest {
    pub token: String,
    pub package_id: String,
    pub language: String,
    #[serde(default)]
    pub subscriber_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Redirect,
    Complete,
}

/// Error reported by the payment backend in an otherwise well-formed reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub status: PaymentStatus,
    #[serde(default)]
    pub redirect_url: Option<String>,
    /// Raw payment record, passed through to `onSuccess`
    #[serde(default)]
    pub payment: Option<JsonValue>,
    #[serde(default)]
    pub error: Option<BackendError>,
}

impl PaymentResponse {
    pub fn complete(payment: JsonValue) -> Self {
        Self {
            status: PaymentStatus::Complete,
            redirect_url: None,
            payment: Some(payment),
            error: None,
        }
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Self {
            status: PaymentStatus::Redirect,
            redirect_url: Some(url.into()),
            payment: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub price_text: Option<String>,
    #[serde(default)]
    pub has_saved_card: Option<bool>,
}

#[async_trait(?Send)]
pub trait ConfigLoader {
    async fn fetch_config(&self, request: &ConfigRequest) -> Result<FormConfig>;
}

#[async_trait(?Send)]
pub trait PaymentGateway {
    async fn submit_payment(&self, provider: ProviderKey, payload: &Payload)
        -> Result<PaymentResponse>;
}

#[async_trait(?Send)]
pub trait SubscriberRegistry {
    async fn register_subscriber(&self, subscriber_id: &str) -> Result<RegisterResponse>;
}

/// Everything the widget needs from the outside world
#[derive(Clone)]
pub struct Collaborators {
    pub config: Rc<dyn ConfigLoader>,
    pub payments: Rc<dyn PaymentGateway>,
    pub subscribers: Rc<dyn SubscriberRegistry>,
}
