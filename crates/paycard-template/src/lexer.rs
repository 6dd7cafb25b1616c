// File: src/lexer.rs
// Purpose: Split a template string into text, placeholder and conditional tokens

/// A lexical token borrowed from the template source
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// Plain text, emitted verbatim
    Text(&'a str),
    /// `{{KEY}}`; `raw` is the full token text for when the key is unresolved
    Placeholder { key: &'a str, raw: &'a str },
    /// `<% IF(condition) %>`
    If { condition: &'a str, raw: &'a str },
    /// `<% ENDIF %>`
    EndIf { raw: &'a str },
}

const PLACEHOLDER_OPEN: &str = "{{";
const PLACEHOLDER_CLOSE: &str = "}}";
const BLOCK_OPEN: &str = "<%";
const BLOCK_CLOSE: &str = "%>";

/// Tokenize a template. Never fails: anything that does not form a valid tag
/// is returned as text.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(offset) = next_tag_start(&source[cursor..]) {
        let tag_start = cursor + offset;
        match read_tag(source, tag_start) {
            Some((token, tag_end)) => {
                if text_start < tag_start {
                    tokens.push(Token::Text(&source[text_start..tag_start]));
                }
                tokens.push(token);
                cursor = tag_end;
                text_start = tag_end;
            }
            None => {
                // Not a tag; skip the opener and keep scanning
                cursor = tag_start + PLACEHOLDER_OPEN.len();
            }
        }
    }

    if text_start < source.len() {
        tokens.push(Token::Text(&source[text_start..]));
    }
    tokens
}

fn next_tag_start(haystack: &str) -> Option<usize> {
    match (haystack.find(PLACEHOLDER_OPEN), haystack.find(BLOCK_OPEN)) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Try to read a tag starting at `start`; returns the token and the byte
/// offset just past it
fn read_tag(source: &str, start: usize) -> Option<(Token<'_>, usize)> {
    let rest = &source[start..];
    if rest.starts_with(PLACEHOLDER_OPEN) {
        let close = rest.find(PLACEHOLDER_CLOSE)?;
        let end = start + close + PLACEHOLDER_CLOSE.len();
        let key = rest[PLACEHOLDER_OPEN.len()..close].trim();
        if !is_valid_key(key) {
            return None;
        }
        let raw = &source[start..end];
        return Some((Token::Placeholder { key, raw }, end));
    }

    let close = rest.find(BLOCK_CLOSE)?;
    let end = start + close + BLOCK_CLOSE.len();
    let raw = &source[start..end];
    let inner = rest[BLOCK_OPEN.len()..close].trim();

    if inner == "ENDIF" {
        return Some((Token::EndIf { raw }, end));
    }

    let after_if = inner.strip_prefix("IF")?.trim_start();
    let body = after_if.strip_prefix('(')?.strip_suffix(')')?;
    Some((
        Token::If {
            condition: body.trim(),
            raw,
        },
        end,
    ))
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_mixed() {
        let tokens = tokenize("a{{NAME}}<% IF(x) %>b<% ENDIF %>");
        assert_eq!(
            tokens,
            vec![
                Token::Text("a"),
                Token::Placeholder {
                    key: "NAME",
                    raw: "{{NAME}}"
                },
                Token::If {
                    condition: "x",
                    raw: "<% IF(x) %>"
                },
                Token::Text("b"),
                Token::EndIf { raw: "<% ENDIF %>" },
            ]
        );
    }

    #[test]
    fn test_invalid_placeholder_is_text() {
        let tokens = tokenize("{{ not a key }} and {{ok}}");
        assert_eq!(tokens[0], Token::Text("{{ not a key }} and "));
        assert!(matches!(tokens[1], Token::Placeholder { key: "ok", .. }));
    }

    #[test]
    fn test_condition_keeps_inner_parentheses() {
        let tokens = tokenize(r#"<%IF(label === "a (b)")%>"#);
        assert_eq!(
            tokens,
            vec![Token::If {
                condition: r#"label === "a (b)""#,
                raw: r#"<%IF(label === "a (b)")%>"#
            }]
        );
    }

    #[test]
    fn test_unknown_block_is_text() {
        let tokens = tokenize("<% ELSE %>");
        assert_eq!(tokens, vec![Token::Text("<% ELSE %>")]);
    }
}
