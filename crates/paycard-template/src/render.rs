// File: src/render.rs
// Purpose: Evaluate a parsed template against a data bag

use crate::parser::{parse, Node};
use crate::value::DataBag;

/// A parsed template that can be rendered against many data bags
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source. Parsing never fails; malformed tags become text.
    pub fn parse(source: &str) -> Self {
        Self {
            nodes: parse(source),
        }
    }

    /// The parsed AST
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Pure function: render against `data`. Unresolved placeholders are
    /// kept verbatim so a later pass can fill them.
    pub fn render(&self, data: &DataBag) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes, data, &mut out);
        out
    }
}

/// Parse and render in one step
pub fn render(template: &str, data: &DataBag) -> String {
    Template::parse(template).render(data)
}

fn render_nodes(nodes: &[Node], data: &DataBag, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Placeholder { key, raw } => match data.get(key) {
                Some(value) => out.push_str(&value.to_string()),
                None => out.push_str(raw),
            },
            Node::Conditional { condition, body } => {
                if condition.evaluate(data) {
                    render_nodes(body, data, out);
                }
            }
        }
    }
}
