//! Payment providers and active-provider detection

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::FocusedElement;

/// Payment channel a submission goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ProviderKey {
    Paypal,
    GooglePay,
    ApplePay,
    #[default]
    CreditCard,
}

impl ProviderKey {
    pub const ALL: [ProviderKey; 4] = [
        ProviderKey::Paypal,
        ProviderKey::GooglePay,
        ProviderKey::ApplePay,
        ProviderKey::CreditCard,
    ];

    /// Value used in `data-provider` attributes
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKey::Paypal => "paypal",
            ProviderKey::GooglePay => "googlePay",
            ProviderKey::ApplePay => "applePay",
            ProviderKey::CreditCard => "creditCard",
        }
    }

    /// Human readable label for buttons and tabs
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKey::Paypal => "PayPal",
            ProviderKey::GooglePay => "Google Pay",
            ProviderKey::ApplePay => "Apple Pay",
            ProviderKey::CreditCard => "Card",
        }
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment provider `{0}`")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKey {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKey::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// `data-form-type` of the container holding the subscriber id input
pub const SUBSCRIBER_ID_FORM_TYPE: &str = "subscriberId";

/// Work out which provider the user is paying with from the focused element
pub fn detect_active_provider(focused: &FocusedElement) -> ProviderKey {
    match focused {
        FocusedElement::Button { provider } => provider
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or_default(),
        FocusedElement::Input {
            name, input_type, ..
        } if name.starts_with("card") && input_type != "checkbox" => ProviderKey::CreditCard,
        FocusedElement::Input {
            form_type: Some(form_type),
            sibling_provider,
            ..
        } if form_type == SUBSCRIBER_ID_FORM_TYPE => sibling_provider
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or_default(),
        _ => ProviderKey::CreditCard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn input(name: &str, input_type: &str, form_type: Option<&str>, sibling: Option<&str>) -> FocusedElement {
        FocusedElement::Input {
            name: name.into(),
            input_type: input_type.into(),
            form_type: form_type.map(Into::into),
            sibling_provider: sibling.map(Into::into),
        }
    }

    #[rstest]
    #[case::paypal_button(FocusedElement::Button { provider: Some("paypal".into()) }, ProviderKey::Paypal)]
    #[case::unknown_button(FocusedElement::Button { provider: Some("cash".into()) }, ProviderKey::CreditCard)]
    #[case::bare_button(FocusedElement::Button { provider: None }, ProviderKey::CreditCard)]
    #[case::card_input(input("cardNumber", "text", None, None), ProviderKey::CreditCard)]
    #[case::card_input_in_subscriber_block(input("cardHolder", "text", Some("subscriberId"), Some("paypal")), ProviderKey::CreditCard)]
    #[case::subscriber_email(input("email", "email", Some("subscriberId"), Some("googlePay")), ProviderKey::GooglePay)]
    #[case::subscriber_without_button(input("email", "email", Some("subscriberId"), None), ProviderKey::CreditCard)]
    #[case::other_input(input("zipCode", "text", None, None), ProviderKey::CreditCard)]
    #[case::nothing(FocusedElement::Other, ProviderKey::CreditCard)]
    fn test_detect_active_provider(#[case] focused: FocusedElement, #[case] expected: ProviderKey) {
        assert_eq!(detect_active_provider(&focused), expected);
    }

    #[test]
    fn test_provider_round_trips_through_str() {
        for p in ProviderKey::ALL {
            assert_eq!(p.as_str().parse::<ProviderKey>(), Ok(p));
        }
        assert!("visa".parse::<ProviderKey>().is_err());
        assert_eq!(
            serde_json::to_string(&ProviderKey::GooglePay).unwrap(),
            "\"googlePay\""
        );
    }
}
