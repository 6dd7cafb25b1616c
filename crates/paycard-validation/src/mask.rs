// File: src/mask.rs
// Purpose: Literal and regex input masks

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Errors building an input mask
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("invalid mask pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("invalid mask character class `{pattern}`: {source}")]
    InvalidValidChars {
        pattern: String,
        source: regex::Error,
    },
}

/// Character class accepted by `#` slots when none is configured
const DEFAULT_VALID_CHARS: &str = r"\d";

/// How a mask was configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskSpec {
    /// Literal pattern (`#### ####`) or a `/body/flags` regex
    pub pattern: String,
    /// Character class for `#` slots, `\d` when absent
    pub valid_chars: Option<String>,
}

impl MaskSpec {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            valid_chars: None,
        }
    }

    pub fn with_valid_chars(mut self, valid_chars: impl Into<String>) -> Self {
        self.valid_chars = Some(valid_chars.into());
        self
    }
}

#[derive(Debug)]
enum Compiled {
    Literal { mask: Vec<char>, valid: Regex },
    Pattern(Regex),
}

/// Split `/body/flags` into its parts. Anything else is a literal mask.
fn split_regex(pattern: &str) -> Option<(&str, &str)> {
    let rest = pattern.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let (body, flags) = (&rest[..end], &rest[end + 1..]);
    if flags.chars().all(|c| c.is_ascii_alphabetic()) {
        Some((body, flags))
    } else {
        None
    }
}

fn compile(spec: &MaskSpec) -> Result<Compiled, MaskError> {
    if let Some((body, flags)) = split_regex(&spec.pattern) {
        let mut builder = RegexBuilder::new(body);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                // g, y, u and anything else have no meaning for a whole-value test
                other => tracing::trace!(flag = %other, "ignoring mask regex flag"),
            }
        }
        let re = builder.build().map_err(|source| MaskError::InvalidPattern {
            pattern: spec.pattern.clone(),
            source,
        })?;
        return Ok(Compiled::Pattern(re));
    }

    let class = spec.valid_chars.as_deref().unwrap_or(DEFAULT_VALID_CHARS);
    let valid = Regex::new(&format!("^(?:{})$", class)).map_err(|source| {
        MaskError::InvalidValidChars {
            pattern: class.to_string(),
            source,
        }
    })?;
    Ok(Compiled::Literal {
        mask: spec.pattern.chars().collect(),
        valid,
    })
}

/// A compiled input mask
#[derive(Debug)]
pub struct InputMask {
    spec: MaskSpec,
    compiled: Compiled,
}

impl InputMask {
    pub fn new(spec: MaskSpec) -> Result<Self, MaskError> {
        let compiled = compile(&spec)?;
        Ok(Self { spec, compiled })
    }

    /// Replace the pattern and character class. On error the mask is left
    /// unchanged.
    pub fn update_options(&mut self, spec: MaskSpec) -> Result<(), MaskError> {
        self.compiled = compile(&spec)?;
        self.spec = spec;
        Ok(())
    }

    pub fn spec(&self) -> &MaskSpec {
        &self.spec
    }

    pub fn pattern(&self) -> &str {
        &self.spec.pattern
    }

    pub fn is_regex(&self) -> bool {
        matches!(self.compiled, Compiled::Pattern(_))
    }

    /// Format `raw` against the mask
    ///
    /// Literal masks fill `#` slots from the input, skipping characters
    /// outside the valid class, and copy every other mask character through.
    /// Regex masks leave a matching value alone and otherwise drop its last
    /// character.
    pub fn apply(&self, raw: &str) -> String {
        match &self.compiled {
            Compiled::Pattern(re) => {
                if re.is_match(raw) {
                    raw.to_string()
                } else {
                    let mut value = raw.to_string();
                    value.pop();
                    value
                }
            }
            Compiled::Literal { mask, valid } => {
                let mut out = String::with_capacity(mask.len());
                let mut input = raw.chars().peekable();
                let mut buf = [0u8; 4];

                for &slot in mask {
                    if input.peek().is_none() {
                        break;
                    }
                    if slot == '#' {
                        for c in input.by_ref() {
                            if valid.is_match(c.encode_utf8(&mut buf)) {
                                out.push(c);
                                break;
                            }
                        }
                    } else {
                        out.push(slot);
                        if input.peek() == Some(&slot) {
                            input.next();
                        }
                    }
                }
                out
            }
        }
    }
}

/// Digits only
pub fn strip_non_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mask(pattern: &str) -> InputMask {
        InputMask::new(MaskSpec::new(pattern)).unwrap()
    }

    #[test]
    fn test_literal_mask_formats_digits() {
        let m = mask("#### #### #### ####");
        assert_eq!(m.apply("4111111111111111"), "4111 1111 1111 1111");
        assert_eq!(m.apply("41111"), "4111 1");
        assert_eq!(m.apply("4111"), "4111");
        assert_eq!(m.apply(""), "");
    }

    #[test]
    fn test_literal_mask_skips_invalid_and_consumes_literals() {
        let m = mask("##/##");
        assert_eq!(m.apply("1a2/34"), "12/34");
        assert_eq!(m.apply("12345"), "12/34");
    }

    #[test]
    fn test_output_never_exceeds_mask() {
        let m = mask("###");
        assert_eq!(m.apply("123456789"), "123");
    }

    #[test]
    fn test_custom_valid_chars() {
        let m = InputMask::new(MaskSpec::new("## ##").with_valid_chars("[A-Z]")).unwrap();
        assert_eq!(m.apply("a1BCD"), "BC D");
    }

    #[test]
    fn test_regex_mask_drops_last_char_on_mismatch() {
        let m = mask(r"/^\d{3}$/");
        assert!(m.is_regex());
        assert_eq!(m.apply("123"), "123");
        assert_eq!(m.apply("1234"), "123");
        assert_eq!(m.apply("12"), "1");
    }

    #[test]
    fn test_regex_flags() {
        let m = mask("/^abc$/i");
        assert_eq!(m.apply("ABC"), "ABC");
        let g = mask("/^a+$/g");
        assert_eq!(g.apply("aaa"), "aaa");
    }

    #[test]
    fn test_invalid_patterns_are_errors() {
        assert!(matches!(
            InputMask::new(MaskSpec::new("/(/")),
            Err(MaskError::InvalidPattern { .. })
        ));
        assert!(matches!(
            InputMask::new(MaskSpec::new("###").with_valid_chars("[")),
            Err(MaskError::InvalidValidChars { .. })
        ));
    }

    #[test]
    fn test_update_options_keeps_old_mask_on_error() {
        let mut m = mask("###");
        assert!(m.update_options(MaskSpec::new("/(/")).is_err());
        assert_eq!(m.pattern(), "###");
        m.update_options(MaskSpec::new("####")).unwrap();
        assert_eq!(m.apply("12345"), "1234");
    }
}
