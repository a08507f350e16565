//! Structural tfvars emitter.
//!
//! Walks a [`ResourceSet`] and writes tfvars text directly, without the JSON
//! round trip. For well-formed input (keys and values free of `"` and `\`,
//! list items free of `:`, values free of `},`) the output is byte-identical
//! to [`super::tfvars::LegacyGenerator`], including its comma conventions:
//! a closing `}` keeps its separating comma, everything else drops it.

use super::base::Generator;
use super::json::to_pretty_json;
use crate::record::{FieldValue, RuleAttr, RuleObject, ResourceSet, TagMap};
use anyhow::Result;

const INDENT: &str = "    ";

/// A value ready for printing. Leaves hold their final text.
enum Node {
    Leaf(String),
    Object(Vec<(String, Node)>),
    Array(Vec<Node>),
}

fn quoted(text: &str) -> Result<String> {
    to_pretty_json(text)
}

// Keys lose their quotes but keep JSON escaping.
fn bare(text: &str) -> Result<String> {
    let encoded = quoted(text)?;
    Ok(encoded[1..encoded.len() - 1].to_string())
}

fn string_map_node(map: &TagMap) -> Result<Node> {
    let entries = map
        .iter()
        .map(|(k, v)| -> Result<(String, Node)> { Ok((bare(k)?, Node::Leaf(quoted(v)?))) })
        .collect::<Result<Vec<_>>>()?;
    Ok(Node::Object(entries))
}

fn rule_node(rule: &RuleObject) -> Result<Node> {
    let mut entries = Vec::with_capacity(rule.attrs.len());
    for (key, attr) in &rule.attrs {
        let value = match attr {
            RuleAttr::Value(v) => Node::Leaf(quoted(v)?),
            RuleAttr::Options(o) => {
                let options = o
                    .options
                    .iter()
                    .map(string_map_node)
                    .collect::<Result<Vec<_>>>()?;
                Node::Object(vec![(bare(&o.protocol)?, Node::Array(options))])
            }
        };
        entries.push((bare(key)?, value));
    }
    Ok(Node::Object(entries))
}

fn field_node(value: &FieldValue) -> Result<Node> {
    let node = match value {
        FieldValue::Text(s) => Node::Leaf(quoted(s)?),
        FieldValue::Integer(i) => Node::Leaf(i.to_string()),
        FieldValue::Boolean(b) => Node::Leaf(b.to_string()),
        FieldValue::Cidrs(items) => Node::Array(
            items
                .iter()
                .map(|item| -> Result<Node> {
                    let inner = item
                        .strip_prefix('"')
                        .and_then(|s| s.strip_suffix('"'))
                        .unwrap_or(item);
                    Ok(Node::Leaf(quoted(inner)?))
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        FieldValue::Ids(items) => Node::Array(
            items
                .iter()
                .map(|item| -> Result<Node> { Ok(Node::Leaf(bare(item)?)) })
                .collect::<Result<Vec<_>>>()?,
        ),
        FieldValue::Rules(rules) => {
            Node::Array(rules.iter().map(rule_node).collect::<Result<Vec<_>>>()?)
        }
        FieldValue::Tags(tags) => string_map_node(tags)?,
    };
    Ok(node)
}

fn write_node(out: &mut String, node: &Node, depth: usize, comma: bool) {
    match node {
        Node::Leaf(text) => {
            out.push_str(text);
            out.push('\n');
        }
        Node::Object(entries) if entries.is_empty() => {
            out.push_str(if comma { "{},\n" } else { "{}\n" });
        }
        Node::Object(entries) => {
            out.push_str("{\n");
            for (index, (key, value)) in entries.iter().enumerate() {
                out.push_str(&INDENT.repeat(depth + 1));
                out.push_str(key);
                out.push_str(" = ");
                write_node(out, value, depth + 1, index + 1 < entries.len());
            }
            out.push_str(&INDENT.repeat(depth));
            out.push_str(if comma { "},\n" } else { "}\n" });
        }
        Node::Array(items) if items.is_empty() => out.push_str("[]\n"),
        Node::Array(items) => {
            out.push_str("[\n");
            for (index, item) in items.iter().enumerate() {
                out.push_str(&INDENT.repeat(depth + 1));
                write_node(out, item, depth + 1, index + 1 < items.len());
            }
            out.push_str(&INDENT.repeat(depth));
            out.push_str("]\n");
        }
    }
}

/// Emits tfvars text straight from the records.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectGenerator;

impl Generator for DirectGenerator {
    fn generate(&self, data: &ResourceSet) -> Result<String> {
        let mut out = format!("{} = {{\n", data.name);
        for (key, record) in data.iter() {
            let entries = record
                .iter()
                .map(|(field, value)| -> Result<(String, Node)> {
                    Ok((bare(field)?, field_node(value)?))
                })
                .collect::<Result<Vec<_>>>()?;
            out.push_str(key);
            out.push_str(" = ");
            write_node(&mut out, &Node::Object(entries), 0, true);
        }
        out.push_str("}\n");
        Ok(out)
    }
}
