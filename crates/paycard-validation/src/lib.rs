//! paycard validation
//!
//! Pure validation building blocks shared by the form engine and the wasm
//! binding:
//!
//! - [`ValidationContext`]: named-rule registry (first registration wins)
//!   and pipe-delimited rule strings such as `required|min:3`
//! - built-in rules: `required`, `minLength`, `email`, `expirationDate`,
//!   `card`, `length`, `min`, `phone`, `zipCode`
//! - [`mask::InputMask`]: literal (`#### ####`) and regex (`/body/flags`)
//!   input masks
//! - [`card::detect`]: ordered card brand table
//! - [`phone`]: dialing-code country table used by the `phone` rule and by
//!   phone masks

pub mod card;
pub mod context;
pub mod mask;
pub mod messages;
pub mod phone;
pub mod rules;
pub mod value;

pub use card::{detect, CardBrand};
pub use context::{parse_rule_string, RuleFn, RuleSpec, ValidationContext, ValidationResult};
pub use mask::{InputMask, MaskError, MaskSpec};
pub use messages::Messages;
pub use phone::Country;
pub use value::FieldValue;
