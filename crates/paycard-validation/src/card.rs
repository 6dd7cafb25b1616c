//! Card brand detection
//!
//! Brands are matched in table order against the digits typed so far; the
//! patterns are prefix patterns so a brand is known after the first few
//! digits. Order encodes priority: broad prefixes (Visa's `^4`) come after
//! the narrower ones they would otherwise shadow.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Security code length for American Express
pub const AMEX_CVV_LENGTH: usize = 4;
/// Security code length for every other brand
pub const DEFAULT_CVV_LENGTH: usize = 3;

/// One row of the brand table
#[derive(Debug, Clone, Serialize)]
pub struct CardBrand {
    pub name: &'static str,
    /// Display mask, `#` is one digit
    pub mask: &'static str,
    /// Prefix pattern source; empty for the default brand
    pub regex: &'static str,
    /// Expected number of digits
    pub length: usize,
    pub icon: &'static str,
    #[serde(skip)]
    compiled: Option<Regex>,
}

impl CardBrand {
    fn new(
        name: &'static str,
        mask: &'static str,
        regex: &'static str,
        length: usize,
        icon: &'static str,
    ) -> Self {
        let compiled = match Regex::new(regex) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::error!(brand = name, error = %err, "invalid card brand pattern");
                None
            }
        };
        Self {
            name,
            mask,
            regex,
            length,
            icon,
            compiled,
        }
    }

    fn matches(&self, digits: &str) -> bool {
        self.compiled.as_ref().is_some_and(|re| re.is_match(digits))
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_BRAND.name
    }

    /// Length of the security code for this brand
    pub fn cvv_length(&self) -> usize {
        if self.name == "American Express" {
            AMEX_CVV_LENGTH
        } else {
            DEFAULT_CVV_LENGTH
        }
    }

    /// Mask for the security code field, e.g. `###`
    pub fn cvv_mask(&self) -> String {
        "#".repeat(self.cvv_length())
    }

    /// Rule string for the security code field, e.g. `required|min:3`
    pub fn cvv_rule(&self) -> String {
        format!("required|min:{}", self.cvv_length())
    }
}

static BRANDS: Lazy<Vec<CardBrand>> = Lazy::new(|| {
    vec![
        CardBrand::new(
            "American Express",
            "#### ###### #####",
            r"^3[47]\d{0,13}",
            15,
            "amex",
        ),
        // Carte Blanche ranges
        CardBrand::new(
            "Diners",
            "#### ###### ####",
            r"^30[0-5]\d{0,11}",
            14,
            "diners",
        ),
        // International ranges
        CardBrand::new(
            "Diners",
            "#### ###### ####",
            r"^3(?:09|[689])\d{0,12}",
            14,
            "diners",
        ),
        CardBrand::new(
            "Discover",
            "#### #### #### ####",
            r"^(?:6011|65\d{0,2}|64[4-9]\d?)\d{0,12}",
            16,
            "discover",
        ),
        CardBrand::new(
            "JCB",
            "#### #### #### ####",
            r"^(?:35\d{0,2})\d{0,12}",
            16,
            "jcb",
        ),
        CardBrand::new(
            "Maestro",
            "#### #### #### ####",
            r"^(?:5[0678]\d{0,2}|6304|67\d{0,2})\d{0,12}",
            16,
            "maestro",
        ),
        CardBrand::new(
            "MasterCard",
            "#### #### #### ####",
            r"^(?:5[1-5]\d{0,2}|22[2-9]\d{0,1}|2[3-7]\d{0,2})\d{0,12}",
            16,
            "mastercard",
        ),
        CardBrand::new("Visa", "#### #### #### ####", r"^4\d{0,15}", 16, "visa"),
        CardBrand::new(
            "UnionPay",
            "#### #### #### ####",
            r"^62\d{0,14}",
            16,
            "unionpay",
        ),
        CardBrand::new("Mir", "#### #### #### ####", r"^220[0-4]\d{0,12}", 16, "mir"),
    ]
});

static DEFAULT_BRAND: Lazy<CardBrand> = Lazy::new(|| CardBrand {
    name: "Default",
    mask: "#### #### #### ####",
    regex: "",
    length: 16,
    icon: "",
    compiled: None,
});

/// The ordered brand table
pub fn brands() -> &'static [CardBrand] {
    &BRANDS
}

/// The catch-all brand returned when nothing matches
pub fn default_brand() -> &'static CardBrand {
    &DEFAULT_BRAND
}

/// Classify a (partial) card number. Non-digits are ignored. Total: falls
/// back to the default brand.
pub fn detect(number: &str) -> &'static CardBrand {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    BRANDS
        .iter()
        .find(|brand| brand.matches(&digits))
        .unwrap_or_else(default_brand)
}
