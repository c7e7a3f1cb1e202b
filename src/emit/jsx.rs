//! Shared JSX rendering used by the React, React-styled-components and
//! Vue-JSX backends. Variation points (fragment wrapper, attribute-name
//! mapping) are plain data on the renderer rather than subclass hooks.

use crate::condition::{ConditionTest, Dialect};
use crate::emit::json_object;
use crate::ir::{AttributeValue, AttributeValues, ConditionalNode, VariableNode};
use crate::props::{valid_js_identifier, IdentStyle, Props};

/// How generated code reads a prop: bare identifier when the id allows it,
/// indexed access otherwise. The decision is made during prop inference and
/// carried on the prop; unknown ids fall back to the identifier test.
pub(crate) fn prop_access(id: &str, props: &Props) -> String {
    let bare = match props.get(id) {
        Some(prop) => prop.ident == IdentStyle::Bare,
        None => valid_js_identifier(id),
    };
    if bare {
        id.to_string()
    } else {
        format!("props[{}]", crate::condition::json_string(id))
    }
}

pub(crate) struct JsxRenderer {
    pub render: String,
    fragment_start: &'static str,
    fragment_end: &'static str,
    attribute_name_transform: fn(&str) -> String,
    props: Props,
}

impl JsxRenderer {
    pub fn new(
        props: Props,
        fragment_start: &'static str,
        fragment_end: &'static str,
        attribute_name_transform: fn(&str) -> String,
    ) -> Self {
        JsxRenderer {
            render: String::new(),
            fragment_start,
            fragment_end,
            attribute_name_transform,
            props,
        }
    }

    pub fn element(
        &mut self,
        name: &str,
        attributes: &[(String, AttributeValues)],
        has_children: bool,
    ) {
        self.render.push('<');
        self.render.push_str(name);
        for (attribute_name, values) in attributes {
            self.attribute(attribute_name, values);
        }
        if !has_children {
            self.render.push('/');
        }
        self.render.push('>');
    }

    fn attribute(&mut self, name: &str, values: &AttributeValues) {
        let attribute_name = (self.attribute_name_transform)(name);
        self.render.push(' ');
        self.render.push_str(&attribute_name);
        self.render.push('=');

        let contains_expression = values
            .iter()
            .any(|value| !matches!(value, AttributeValue::Constant { .. }));
        let contains_constant = values
            .iter()
            .any(|value| matches!(value, AttributeValue::Constant { .. }));

        if contains_expression {
            self.render.push('{');
        } else {
            self.render.push('"');
        }
        if contains_expression && contains_constant {
            self.render.push('`');
        }

        for value in values {
            let interpolated =
                contains_constant && !matches!(value, AttributeValue::Constant { .. });
            if interpolated {
                self.render.push_str("${");
            }
            self.attribute_value(value);
            if interpolated {
                self.render.push_str(" || ''}");
            }
        }

        if contains_expression && contains_constant {
            self.render.push('`');
        }
        if contains_expression {
            self.render.push('}');
        } else {
            self.render.push('"');
        }
    }

    fn attribute_value(&mut self, value: &AttributeValue) {
        match value {
            AttributeValue::Constant { value } => self.render.push_str(value),
            AttributeValue::Variable { id, .. } => {
                let access = prop_access(id, &self.props);
                self.render.push_str(&access);
            }
            AttributeValue::VariableOptions { id, options, .. } => {
                let access = prop_access(id, &self.props);
                let required = self
                    .props
                    .get(id)
                    .map(|prop| prop.required)
                    .unwrap_or(true);
                if !required {
                    self.render.push_str(&access);
                    self.render.push_str(" && ");
                }
                self.render.push_str(&json_object(options));
                self.render.push('[');
                self.render.push_str(&access);
                self.render.push(']');
            }
        }
    }

    pub fn close_element(&mut self, tag: &str) {
        self.render.push_str("\n</");
        self.render.push_str(tag);
        self.render.push_str(">\n");
    }

    pub fn text(&mut self, value: &str) {
        self.render.push_str(value);
    }

    pub fn comment(&mut self, value: &str) {
        self.render.push_str("{/*");
        self.render.push_str(value);
        self.render.push_str("*/}");
    }

    /// `{x !== undefined ? x : <default>}` — the default being `null`, a
    /// template literal for a single text child, or a fragment.
    pub fn variable(&mut self, variable: &VariableNode) {
        let access = prop_access(&variable.id, &self.props);
        self.render
            .push_str(&format!("{{{} !== undefined ? {} : ", access, access));
        if variable.children.is_empty() {
            self.render.push_str("null");
        } else if single_text_child(variable) {
            self.render.push('`');
        } else {
            let fragment_start = self.fragment_start;
            self.render.push('(');
            self.render.push('<');
            self.render.push_str(fragment_start);
            self.render.push('>');
        }
    }

    pub fn close_variable(&mut self, variable: &VariableNode) {
        if single_text_child(variable) {
            self.render.push('`');
        } else if !variable.children.is_empty() {
            let fragment_end = self.fragment_end;
            self.render.push_str("</");
            self.render.push_str(fragment_end);
            self.render.push_str(">)");
        }
        self.render.push('}');
    }

    pub fn conditional(&mut self, conditional: &ConditionalNode) {
        let fragment_start = self.fragment_start;
        match &conditional.test {
            ConditionTest::Parsed { .. } => {
                let expression = conditional
                    .test
                    .expression(Dialect::JavaScript)
                    .unwrap_or_default();
                self.render
                    .push_str(&format!("{{{} && (<{}>", expression, fragment_start));
            }
            ConditionTest::ParseError { message } => {
                self.render.push_str(&format!(
                    "{{/* parse error: {} */}}",
                    message.replace("*/", "* /")
                ));
                self.render
                    .push_str(&format!("{{false && (<{}>", fragment_start));
            }
        }
    }

    pub fn close_conditional(&mut self, _conditional: &ConditionalNode) {
        let fragment_end = self.fragment_end;
        self.render.push_str("</");
        self.render.push_str(fragment_end);
        self.render.push_str(">)}");
    }
}

fn single_text_child(variable: &VariableNode) -> bool {
    variable.children.len() == 1
        && matches!(
            variable.children[0],
            crate::ir::TemplateNode::Text(_)
        )
}

/// The render-function prelude: destructure bare-identifier props directly,
/// keep a `props` parameter when any id needs indexed access.
pub(crate) fn render_function_header(template_id: &str, props: &Props) -> String {
    let prop_ids: Vec<&str> = props.ids().collect();
    let contains_indexed = props.iter().any(|(_, prop)| prop.ident == IdentStyle::Indexed);
    let mut header = String::new();
    if contains_indexed {
        header.push_str(&format!(
            "export default function {}(props: Props){{\n",
            template_id
        ));
        let destructure: Vec<&str> = props
            .iter()
            .filter(|(_, prop)| prop.ident == IdentStyle::Bare)
            .map(|(id, _)| id)
            .collect();
        if !destructure.is_empty() {
            header.push_str(&format!("  const {{ {} }} = props;\n", destructure.join(", ")));
        }
    } else {
        header.push_str(&format!(
            "export default function {}({{ {} }}: Props){{\n",
            template_id,
            prop_ids.join(", ")
        ));
    }
    header.push_str("  return (\n");
    header
}
