//! Intermediate tree builder.
//!
//! Walks the parsed DOM depth-first, dispatching the DSL's custom elements to
//! the tokenizer and the expression translator, and attaching per-element CSS
//! information from the sniffing engine. Also computes the whole-document
//! tree-shaken stylesheet.

use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::attr;
use crate::condition::{self, ConditionTest};
use crate::css::Stylesheet;
use crate::error::{Reporter, Result};
use crate::ir::{
    AttributeValue, AttributeValues, CommentNode, ConditionalNode, CssProperty, ElementNode,
    TemplateComponent, TemplateNode, TextNode, VariableNode,
};
use crate::preparse::{self, CONDITIONAL_TAGS, VARIABLE_TAGS};
use crate::props;
use crate::sniff::{self, MatchedCss, ProbeElement, SniffOptions};

/// Attributes worth probing for CSS matches. Everything interesting to the
/// rule-matching engine hangs off `class`.
fn attribute_can_be_probed(name: &str) -> bool {
    name == "class"
}

/// Parse and analyse the two input strings into a [`TemplateComponent`].
pub fn build_component(markup: &str, css: &str, reporter: &Reporter) -> Result<TemplateComponent> {
    let sheets = vec![crate::css::parse_stylesheet(css)];
    let dom: RcDom = preparse::parse_dsl_document(markup, reporter)?;

    let mut nodes = Vec::new();
    for handle in preparse::body_children(&dom) {
        if let Some(node) = dom_to_node(&handle, &sheets, reporter)? {
            nodes.push(node);
        }
    }

    let css_string = whole_document_css(&nodes, &sheets, reporter)?;
    let props = props::infer_props(&nodes, reporter)?;

    Ok(TemplateComponent {
        nodes,
        props,
        css_string,
    })
}

fn dom_to_node(
    handle: &Handle,
    sheets: &[Stylesheet],
    reporter: &Reporter,
) -> Result<Option<TemplateNode>> {
    match &handle.data {
        NodeData::Text { contents } => Ok(Some(TemplateNode::Text(TextNode {
            value: contents.borrow().to_string(),
        }))),
        NodeData::Comment { contents } => Ok(Some(TemplateNode::Comment(CommentNode {
            value: contents.to_string(),
        }))),
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string();
            if VARIABLE_TAGS.contains(&tag.as_str()) {
                return Ok(Some(variable_node(handle, sheets, reporter)?));
            }
            if CONDITIONAL_TAGS.contains(&tag.as_str()) {
                return Ok(Some(conditional_node(handle, sheets, reporter)?));
            }

            let mut attributes: Vec<(String, AttributeValues)> = Vec::new();
            for attribute in attrs.borrow().iter() {
                let attribute_name = attribute.name.local.to_string();
                let values = attr::parse_attribute_value(&attribute.value, reporter)?;
                attributes.push((attribute_name, values));
            }

            let css_properties = matching_css_properties(&tag, &attributes, sheets, reporter)?;
            let children = children_of(handle, sheets, reporter)?;

            Ok(Some(TemplateNode::Element(ElementNode {
                name: tag,
                attributes,
                children,
                css_properties,
            })))
        }
        // Document / doctype / processing instructions carry no template
        // content of their own.
        _ => Ok(None),
    }
}

fn children_of(
    handle: &Handle,
    sheets: &[Stylesheet],
    reporter: &Reporter,
) -> Result<Vec<TemplateNode>> {
    let mut children = Vec::new();
    for child in handle.children.borrow().iter() {
        if let Some(node) = dom_to_node(child, sheets, reporter)? {
            children.push(node);
        }
    }
    Ok(children)
}

fn element_attribute(handle: &Handle, name: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.as_ref() == name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

fn has_attribute(handle: &Handle, name: &str) -> bool {
    element_attribute(handle, name).is_some()
}

fn variable_node(
    handle: &Handle,
    sheets: &[Stylesheet],
    reporter: &Reporter,
) -> Result<TemplateNode> {
    // 'key' is the legacy spelling of 'id'.
    let id = element_attribute(handle, "id").or_else(|| element_attribute(handle, "key"));
    let (id, optional) = match id {
        None => {
            reporter.report("expected an 'id' (or legacy 'key') attribute on the variable element")?;
            (String::new(), false)
        }
        Some(raw) => {
            // A trailing '?' in the id is the legacy optional marker.
            let optional = has_attribute(handle, "optional") || raw.contains('?');
            let id = raw.replacen('?', "", 1).trim().to_string();
            if id.is_empty() {
                reporter.report("expected the variable element id to have a value")?;
            }
            (id, optional)
        }
    };

    Ok(TemplateNode::Variable(VariableNode {
        id,
        optional,
        children: children_of(handle, sheets, reporter)?,
    }))
}

fn conditional_node(
    handle: &Handle,
    sheets: &[Stylesheet],
    reporter: &Reporter,
) -> Result<TemplateNode> {
    let optional = has_attribute(handle, "optional");
    let test = element_attribute(handle, "test").or_else(|| element_attribute(handle, "key"));

    let test = match test {
        None => {
            reporter
                .report("expected a 'test' (or legacy 'key') attribute on the conditional element")?;
            ConditionTest::parse_error("missing test attribute")
        }
        Some(raw) => {
            let parsed = condition::parse_condition(&raw);
            if let ConditionTest::ParseError { message } = &parsed {
                reporter.report(message.clone())?;
            }
            parsed
        }
    };

    Ok(TemplateNode::Conditional(ConditionalNode {
        optional,
        test,
        children: children_of(handle, sheets, reporter)?,
    }))
}

// ═══════════════════════════════════════════════════════════════════════════════
// CSS PROPERTY COLLECTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Snapshot with probed attributes reduced to their constant segments only;
/// plain variables contribute nothing because their runtime value is unknown.
fn reset_snapshot(name: &str, attributes: &[(String, AttributeValues)]) -> ProbeElement {
    let mut probe = ProbeElement::new(name);
    for (attribute_name, values) in attributes {
        let value = if attribute_can_be_probed(attribute_name) {
            values
                .iter()
                .map(|value| match value {
                    AttributeValue::Constant { value } => format!(" {}", value),
                    _ => String::new(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            constant_text(values)
        };
        probe.set_attribute(attribute_name, value);
    }
    probe
}

/// Snapshot with probed attributes set to the union of constant text and every
/// enum literal, used for the whole-document pass.
fn union_snapshot(name: &str, attributes: &[(String, AttributeValues)]) -> ProbeElement {
    let mut probe = ProbeElement::new(name);
    for (attribute_name, values) in attributes {
        let value = if attribute_can_be_probed(attribute_name) {
            values
                .iter()
                .map(|value| match value {
                    AttributeValue::Constant { value } => format!(" {}", value),
                    AttributeValue::VariableOptions { options, .. } => format!(
                        " {}",
                        options
                            .iter()
                            .map(|(_, literal)| literal.as_str())
                            .collect::<Vec<_>>()
                            .join(" ")
                    ),
                    AttributeValue::Variable { .. } => String::new(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            constant_text(values)
        };
        probe.set_attribute(attribute_name, value);
    }
    probe
}

fn constant_text(values: &AttributeValues) -> String {
    values
        .iter()
        .filter_map(|value| match value {
            AttributeValue::Constant { value } => Some(value.as_str()),
            _ => None,
        })
        .collect()
}

/// Baseline declarations plus, per enumerated attribute option, the
/// declarations that newly apply when that option is selected.
fn matching_css_properties(
    name: &str,
    attributes: &[(String, AttributeValues)],
    sheets: &[Stylesheet],
    reporter: &Reporter,
) -> Result<Vec<CssProperty>> {
    let mut css_properties = Vec::new();
    let options = SniffOptions::default();

    let reset_probe = reset_snapshot(name, attributes);
    let mut baseline = MatchedCss::new();
    sniff::sniff_element(&reset_probe, sheets, &options, &mut baseline, reporter)?;

    let constants = sniff::serialize_matches_as_declarations(&baseline);
    if !constants.is_empty() {
        css_properties.push(CssProperty::Constant { css: constants });
    }

    for (attribute_name, values) in attributes {
        if !attribute_can_be_probed(attribute_name) {
            continue;
        }
        let reset_value = reset_probe
            .attribute(attribute_name)
            .unwrap_or_default()
            .to_string();
        for value in values {
            let (id, enum_options) = match value {
                AttributeValue::VariableOptions { id, options, .. } => (id, options),
                _ => continue,
            };
            let mut condition = Vec::new();
            for (option_name, option_literal) in enum_options {
                let mut probe = reset_probe.clone();
                let probed_value = if reset_value.is_empty() {
                    option_literal.clone()
                } else {
                    format!("{} {}", reset_value, option_literal)
                };
                probe.set_attribute(attribute_name, probed_value);

                let mut matched = MatchedCss::new();
                sniff::sniff_element(&probe, sheets, &options, &mut matched, reporter)?;
                let newly_applied = sniff::diff_matches(&baseline, &matched);
                let css = sniff::serialize_matches_as_declarations(&newly_applied);
                if !css.is_empty() {
                    condition.push((option_name.clone(), css));
                }
            }
            if !condition.is_empty() {
                css_properties.push(CssProperty::Conditional {
                    id: id.clone(),
                    condition,
                });
            }
        }
    }

    Ok(css_properties)
}

/// Serialize every rule reachable by any element/attribute combination. Rules
/// never matched by any probe are dropped from the output entirely.
pub fn whole_document_css(
    nodes: &[TemplateNode],
    sheets: &[Stylesheet],
    reporter: &Reporter,
) -> Result<String> {
    let mut matched = MatchedCss::new();
    for node in nodes {
        collect_document_matches(node, sheets, &mut matched, reporter)?;
    }
    Ok(sniff::serialize_matches(&matched))
}

fn collect_document_matches(
    node: &TemplateNode,
    sheets: &[Stylesheet],
    matched: &mut MatchedCss,
    reporter: &Reporter,
) -> Result<()> {
    match node {
        TemplateNode::Element(element) => {
            let probe = union_snapshot(&element.name, &element.attributes);
            sniff::sniff_element(&probe, sheets, &SniffOptions::default(), matched, reporter)?;
            for child in &element.children {
                collect_document_matches(child, sheets, matched, reporter)?;
            }
        }
        TemplateNode::Variable(variable) => {
            for child in &variable.children {
                collect_document_matches(child, sheets, matched, reporter)?;
            }
        }
        TemplateNode::Conditional(conditional) => {
            for child in &conditional.children {
                collect_document_matches(child, sheets, matched, reporter)?;
            }
        }
        TemplateNode::Text(_) | TemplateNode::Comment(_) => {}
    }
    Ok(())
}
