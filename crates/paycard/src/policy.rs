//! Which fields must validate for a given provider

use crate::provider::ProviderKey;

/// Fields that only matter when paying with a freshly entered card
pub const CARD_FIELDS: [&str; 4] = ["cardNumber", "cardHolder", "cardCvv", "cardExpiry"];

/// Billing fields shown when business purchase is enabled
pub const BUSINESS_FIELDS: [&str; 3] = ["companyName", "companyVat", "companyAddress"];

/// Country whose buyers must give a zip code
pub const ZIP_COUNTRY: &str = "US";

/// State the field requirements depend on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementContext {
    pub is_saved_card_payment: bool,
    pub country: Option<String>,
    pub is_business_purchase_enabled: bool,
}

impl RequirementContext {
    pub fn is_card_field(name: &str) -> bool {
        CARD_FIELDS.contains(&name)
    }

    /// Fields validated for every provider
    pub fn is_shared_field(&self, name: &str) -> bool {
        match name {
            "email" | "phone" | "agreement" => true,
            "zipCode" => self.is_zip_country(),
            _ => self.is_business_purchase_enabled && BUSINESS_FIELDS.contains(&name),
        }
    }

    pub fn is_zip_country(&self) -> bool {
        self.country
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(ZIP_COUNTRY))
    }

    /// Rule string for the zip code input: mandatory only where required
    pub fn zip_rule(&self) -> &'static str {
        if self.is_zip_country() {
            "required|zipCode"
        } else {
            "zipCode"
        }
    }

    /// Whether `field` is validated when submitting through `provider`
    ///
    /// With a saved card only the card entry fields are exempt, and only for
    /// `creditCard`. Without one, anything outside the shared set is exempt
    /// for every provider except `creditCard`.
    pub fn should_validate(&self, field: &str, provider: ProviderKey) -> bool {
        if self.is_saved_card_payment {
            !(provider == ProviderKey::CreditCard && Self::is_card_field(field))
        } else {
            provider == ProviderKey::CreditCard || self.is_shared_field(field)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ctx(saved: bool, country: Option<&str>, business: bool) -> RequirementContext {
        RequirementContext {
            is_saved_card_payment: saved,
            country: country.map(Into::into),
            is_business_purchase_enabled: business,
        }
    }

    #[rstest]
    #[case::saved_card_skips_card_number(true, "cardNumber", ProviderKey::CreditCard, false)]
    #[case::saved_card_checks_email(true, "email", ProviderKey::CreditCard, true)]
    #[case::saved_card_other_provider(true, "cardCvv", ProviderKey::Paypal, true)]
    #[case::fresh_card_checks_card(false, "cardNumber", ProviderKey::CreditCard, true)]
    #[case::paypal_skips_card(false, "cardNumber", ProviderKey::Paypal, false)]
    #[case::paypal_checks_email(false, "email", ProviderKey::Paypal, true)]
    #[case::paypal_checks_agreement(false, "agreement", ProviderKey::Paypal, true)]
    #[case::paypal_checks_phone(false, "phone", ProviderKey::ApplePay, true)]
    #[case::paypal_skips_zip_outside_us(false, "zipCode", ProviderKey::Paypal, false)]
    fn test_should_validate(
        #[case] saved: bool,
        #[case] field: &str,
        #[case] provider: ProviderKey,
        #[case] expected: bool,
    ) {
        assert_eq!(ctx(saved, Some("DE"), false).should_validate(field, provider), expected);
    }

    #[test]
    fn test_zip_is_shared_only_in_us() {
        assert!(ctx(false, Some("us"), false).should_validate("zipCode", ProviderKey::GooglePay));
        assert!(!ctx(false, None, false).should_validate("zipCode", ProviderKey::GooglePay));
    }

    #[test]
    fn test_zip_rule() {
        assert_eq!(ctx(false, Some("US"), false).zip_rule(), "required|zipCode");
        assert_eq!(ctx(false, Some("DE"), false).zip_rule(), "zipCode");
    }

    #[test]
    fn test_business_fields_follow_flag() {
        assert!(ctx(false, None, true).should_validate("companyVat", ProviderKey::Paypal));
        assert!(!ctx(false, None, false).should_validate("companyVat", ProviderKey::Paypal));
    }
}
