//! # paycard-template
//!
//! A small templating language used to assemble checkout form HTML from
//! configuration data.
//!
//! - `{{KEY}}` placeholders are replaced by the bag value for `KEY`, or left
//!   untouched when the key is absent (multi-pass rendering).
//! - `<% IF(cond) %> ... <% ENDIF %>` blocks nest. `cond` is either `key`
//!   (truthy test) or `key === literal` where the literal is a JSON array
//!   (membership), boolean, number, `null`, `undefined` or a string.
//!
//! ```rust
//! use paycard_template::{render, DataBag, Value};
//!
//! let mut data = DataBag::new();
//! data.insert("a".into(), Value::Bool(true));
//! data.insert("b".into(), Value::Bool(false));
//!
//! let html = render("<% IF(a) %>1<% IF(b) %>2<% ENDIF %>3<% ENDIF %>", &data);
//! assert_eq!(html, "13");
//! ```

pub mod condition;
pub mod lexer;
pub mod parser;
pub mod render;
pub mod value;

pub use condition::{Condition, Literal};
pub use parser::Node;
pub use render::{render, Template};
pub use value::{bag_from_json, DataBag, Value};
