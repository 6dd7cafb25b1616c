// File: src/parser.rs
// Purpose: Recursive-descent parser from tokens to a template AST

use crate::condition::Condition;
use crate::lexer::{tokenize, Token};

/// A node of the template AST
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Placeholder { key: String, raw: String },
    Conditional { condition: Condition, body: Vec<Node> },
}

/// Parse template source into a list of nodes.
///
/// `IF`/`ENDIF` pairs are matched by nesting depth. An `IF` that never
/// closes and an `ENDIF` with nothing open are kept as literal text.
pub fn parse(source: &str) -> Vec<Node> {
    let tokens = tokenize(source);
    let mut pos = 0;
    let (nodes, _) = parse_nodes(&tokens, &mut pos, 0);
    nodes
}

/// Parse until an `ENDIF` closes the current depth or tokens run out.
/// Returns the nodes and whether an `ENDIF` terminated them.
fn parse_nodes(tokens: &[Token<'_>], pos: &mut usize, depth: usize) -> (Vec<Node>, bool) {
    let mut nodes = Vec::new();

    while let Some(token) = tokens.get(*pos) {
        *pos += 1;
        match token {
            Token::Text(text) => push_text(&mut nodes, text),
            Token::Placeholder { key, raw } => nodes.push(Node::Placeholder {
                key: (*key).to_string(),
                raw: (*raw).to_string(),
            }),
            Token::If { condition, raw } => {
                let (body, closed) = parse_nodes(tokens, pos, depth + 1);
                if closed {
                    nodes.push(Node::Conditional {
                        condition: Condition::parse(condition),
                        body,
                    });
                } else {
                    tracing::trace!(tag = *raw, "unclosed IF kept as text");
                    push_text(&mut nodes, raw);
                    for node in body {
                        match node {
                            Node::Text(text) => push_text(&mut nodes, &text),
                            other => nodes.push(other),
                        }
                    }
                }
            }
            Token::EndIf { raw } => {
                if depth > 0 {
                    return (nodes, true);
                }
                tracing::trace!("stray ENDIF kept as text");
                push_text(&mut nodes, raw);
            }
        }
    }

    (nodes, false)
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if let Some(Node::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}
