//! Prop inference.
//!
//! One depth-first walk over the tree produces the stable, deduplicated table
//! of external parameters. The precedence contract:
//!
//! * kind specificity is `AttributeValueOptions > AttributeValue > Variable`;
//!   a later sighting replaces the kind only when strictly more specific, and
//!   ties keep the first sighting's metadata;
//! * `required` is the logical AND of every sighting's requiredness — one
//!   optional sighting anywhere makes the prop optional for good.
//!
//! Whether a prop can be a bare identifier in generated code is decided here,
//! once, and carried on the prop.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Reporter, Result};
use crate::ir::{AttributeValue, ConditionalNode, ElementNode, TemplateNode, VariableNode};
use crate::condition::ConditionTest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentStyle {
    /// The id is a valid bare identifier in the component dialects.
    Bare,
    /// The id needs quoted/indexed access (`props["my-id"]`).
    Indexed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PropKind {
    Variable,
    AttributeValue {
        node_name: String,
        attribute_name: String,
    },
    AttributeValueOptions {
        node_name: String,
        attribute_name: String,
        options: Vec<(String, String)>,
    },
}

impl PropKind {
    fn specificity(&self) -> u8 {
        match self {
            PropKind::Variable => 0,
            PropKind::AttributeValue { .. } => 1,
            PropKind::AttributeValueOptions { .. } => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prop {
    pub required: bool,
    pub ident: IdentStyle,
    #[serde(flatten)]
    pub kind: PropKind,
}

/// Prop table in discovery order. Identifier iteration order is part of the
/// deterministic-output contract, so this is an ordered list, not a hash map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Props(Vec<(String, Prop)>);

impl Props {
    pub fn new() -> Self {
        Props::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Prop> {
        self.0
            .iter()
            .find(|(prop_id, _)| prop_id == id)
            .map(|(_, prop)| prop)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Prop)> {
        self.0.iter().map(|(id, prop)| (id.as_str(), prop))
    }

    fn discover(&mut self, id: &str, required: bool, kind: PropKind) {
        match self.0.iter_mut().find(|(prop_id, _)| prop_id == id) {
            None => {
                self.0.push((
                    id.to_string(),
                    Prop {
                        required,
                        ident: ident_style(id),
                        kind,
                    },
                ));
            }
            Some((_, prop)) => {
                prop.required = prop.required && required;
                if kind.specificity() > prop.kind.specificity() {
                    prop.kind = kind;
                }
            }
        }
    }
}

pub fn ident_style(id: &str) -> IdentStyle {
    if valid_js_identifier(id) {
        IdentStyle::Bare
    } else {
        IdentStyle::Indexed
    }
}

pub fn valid_js_identifier(id: &str) -> bool {
    lazy_static! {
        static ref IDENT_RE: Regex = Regex::new(r"^[a-zA-Z_$][a-zA-Z0-9_$]*$").unwrap();
    }
    IDENT_RE.is_match(id)
}

pub fn infer_props(nodes: &[TemplateNode], reporter: &Reporter) -> Result<Props> {
    let mut props = Props::new();
    for node in nodes {
        walk(node, &mut props, reporter)?;
    }
    Ok(props)
}

fn walk(node: &TemplateNode, props: &mut Props, reporter: &Reporter) -> Result<()> {
    match node {
        TemplateNode::Element(element) => {
            discover_element(element, props, reporter)?;
            for child in &element.children {
                walk(child, props, reporter)?;
            }
        }
        TemplateNode::Variable(variable) => {
            discover_variable(variable, props, reporter)?;
            for child in &variable.children {
                walk(child, props, reporter)?;
            }
        }
        TemplateNode::Conditional(conditional) => {
            discover_conditional(conditional, props, reporter)?;
            for child in &conditional.children {
                walk(child, props, reporter)?;
            }
        }
        TemplateNode::Text(_) | TemplateNode::Comment(_) => {}
    }
    Ok(())
}

fn discover_element(element: &ElementNode, props: &mut Props, reporter: &Reporter) -> Result<()> {
    for (attribute_name, values) in &element.attributes {
        for value in values {
            match value {
                AttributeValue::Constant { .. } => {}
                AttributeValue::Variable { id, required } => {
                    if id.is_empty() {
                        reporter.report(format!(
                            "ignoring empty prop id on <{} {}>",
                            element.name, attribute_name
                        ))?;
                        continue;
                    }
                    props.discover(
                        id,
                        *required,
                        PropKind::AttributeValue {
                            node_name: element.name.clone(),
                            attribute_name: attribute_name.clone(),
                        },
                    );
                }
                AttributeValue::VariableOptions {
                    id,
                    required,
                    options,
                } => {
                    if id.is_empty() {
                        reporter.report(format!(
                            "ignoring empty prop id on <{} {}>",
                            element.name, attribute_name
                        ))?;
                        continue;
                    }
                    props.discover(
                        id,
                        *required,
                        PropKind::AttributeValueOptions {
                            node_name: element.name.clone(),
                            attribute_name: attribute_name.clone(),
                            options: options.clone(),
                        },
                    );
                }
            }
        }
    }
    Ok(())
}

fn discover_variable(variable: &VariableNode, props: &mut Props, reporter: &Reporter) -> Result<()> {
    if variable.id.is_empty() {
        reporter.report("ignoring variable element with empty id")?;
        return Ok(());
    }
    props.discover(&variable.id, !variable.optional, PropKind::Variable);
    Ok(())
}

fn discover_conditional(
    conditional: &ConditionalNode,
    props: &mut Props,
    reporter: &Reporter,
) -> Result<()> {
    if let ConditionTest::Parsed { ids, .. } = &conditional.test {
        for id in ids {
            if id.is_empty() {
                reporter.report("ignoring conditional with empty identifier")?;
                continue;
            }
            props.discover(id, !conditional.optional, PropKind::Variable);
        }
    }
    Ok(())
}
