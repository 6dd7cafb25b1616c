//! Phone country table
//!
//! Each country carries its dialing code and a display mask. The mask
//! starts with the dialing code as literal digits, so the number of digit
//! positions in the mask (literal digits plus `#` slots) is the expected
//! length of a complete, digits-only phone number.

use serde::Serialize;

/// A phone country entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code
    pub code: &'static str,
    pub name: &'static str,
    pub dial_code: &'static str,
    pub mask: &'static str,
}

impl Country {
    /// Digits expected in a complete number, dialing code included
    pub fn expected_length(&self) -> usize {
        self.mask
            .chars()
            .filter(|c| *c == '#' || c.is_ascii_digit())
            .count()
    }
}

pub static COUNTRIES: &[Country] = &[
    Country { code: "US", name: "United States", dial_code: "1", mask: "+1 (###) ###-####" },
    Country { code: "CA", name: "Canada", dial_code: "1", mask: "+1 (###) ###-####" },
    Country { code: "GB", name: "United Kingdom", dial_code: "44", mask: "+44 #### ######" },
    Country { code: "DE", name: "Germany", dial_code: "49", mask: "+49 ### ########" },
    Country { code: "FR", name: "France", dial_code: "33", mask: "+33 # ## ## ## ##" },
    Country { code: "ES", name: "Spain", dial_code: "34", mask: "+34 ### ### ###" },
    Country { code: "IT", name: "Italy", dial_code: "39", mask: "+39 ### ### ####" },
    Country { code: "NL", name: "Netherlands", dial_code: "31", mask: "+31 # ########" },
    Country { code: "PL", name: "Poland", dial_code: "48", mask: "+48 ### ### ###" },
    Country { code: "UA", name: "Ukraine", dial_code: "380", mask: "+380 ## ### ## ##" },
    Country { code: "BR", name: "Brazil", dial_code: "55", mask: "+55 (##) #####-####" },
    Country { code: "IN", name: "India", dial_code: "91", mask: "+91 #####-#####" },
    Country { code: "AU", name: "Australia", dial_code: "61", mask: "+61 # #### ####" },
];

/// Look up a country by ISO code (case-insensitive)
pub fn country_by_code(code: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Reverse lookup: the country whose dialing code is the longest prefix of
/// `digits`. Ties keep table order, so `1` resolves to the United States.
pub fn country_by_digits(digits: &str) -> Option<&'static Country> {
    COUNTRIES
        .iter()
        .filter(|c| digits.starts_with(c.dial_code))
        .fold(None, |best: Option<&'static Country>, c| match best {
            Some(b) if b.dial_code.len() >= c.dial_code.len() => Some(b),
            _ => Some(c),
        })
}

/// Strip everything but ASCII digits
pub fn clean_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}
