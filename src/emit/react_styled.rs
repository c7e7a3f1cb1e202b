//! React styled-components backend.
//!
//! Every element that owns CSS properties gets a synthesized styled element
//! (collision-avoided with a counter suffix): constant declarations are
//! hoisted into the template literal, conditional declarations become
//! prop-keyed lookup functions. Class-attribute segments whose content was
//! compiled into the styled element are stripped; unpredictable plain-variable
//! segments survive.

use crate::emit::jsx::{prop_access, render_function_header, JsxRenderer};
use crate::emit::react::{attribute_name_transform, props_declaration, prop_type_name, option_union};
use crate::emit::{
    format_or_keep, json_object, Emitter, EmitterArgs, SourceFormatter, TemplateFiles,
};
use crate::ir::{
    AttributeValue, AttributeValues, CommentNode, ConditionalNode, CssProperty, ElementNode,
    TextNode, VariableNode,
};
use crate::props::{IdentStyle, Prop, PropKind, Props};

const DIRNAME: &str = "react-styled-components";

pub struct ReactStyledEmitter {
    template_id: String,
    props: Props,
    has_multiple_root_nodes: bool,
    renderer: JsxRenderer,
    imports: String,
    typescript: String,
    constants: String,
    styled_names: Vec<String>,
    file_data: String,
}

impl ReactStyledEmitter {
    pub fn new(args: &EmitterArgs) -> Self {
        let props = args.props.clone();
        ReactStyledEmitter {
            template_id: args.template_id.to_string(),
            has_multiple_root_nodes: args.has_multiple_root_nodes,
            renderer: JsxRenderer::new(
                props.clone(),
                "React.Fragment",
                "React.Fragment",
                attribute_name_transform,
            ),
            imports: "import React from 'react';\nimport styled from 'styled-components';\n"
                .to_string(),
            typescript: props_declaration(&props, render_prop_type),
            constants: String::new(),
            styled_names: Vec::new(),
            props,
            file_data: String::new(),
        }
    }

    fn new_styled_name(&mut self, tag_name: &str) -> String {
        let base = format!("Styled{}", capitalize_first(tag_name));
        let mut counter = 1usize;
        loop {
            let candidate = if counter == 1 {
                base.clone()
            } else {
                format!("{}_{}", base, counter)
            };
            counter += 1;
            if !self.styled_names.contains(&candidate) {
                self.styled_names.push(candidate.clone());
                return candidate;
            }
        }
    }

    fn render_css_property(&self, property: &CssProperty, styled_props_name: &str) -> String {
        match property {
            CssProperty::Constant { css } => css.clone(),
            CssProperty::Conditional { id, condition } => {
                let access = prop_access(id, &self.props);
                let bare = self
                    .props
                    .get(id)
                    .map(|prop| prop.ident == IdentStyle::Bare)
                    .unwrap_or(false);
                let mut rendered = String::from("${");
                if bare {
                    rendered.push_str(&format!("({{{}}}: {}) => (", id, styled_props_name));
                } else {
                    rendered.push_str(&format!("(props: {}) => (", styled_props_name));
                }
                rendered.push_str(&json_object(condition));
                rendered.push('[');
                rendered.push_str(&access);
                rendered.push_str("])}");
                rendered
            }
        }
    }

    /// `Pick<Props, "a" | "b">` over the conditional property ids, or nothing
    /// when the element's CSS is entirely constant.
    fn render_css_property_props(&self, css_properties: &[CssProperty]) -> Option<String> {
        let mut ids: Vec<String> = Vec::new();
        for property in css_properties {
            if let CssProperty::Conditional { id, .. } = property {
                let quoted = format!("\"{}\"", id);
                if !ids.contains(&quoted) {
                    ids.push(quoted);
                }
            }
        }
        if ids.is_empty() {
            None
        } else {
            Some(format!("Pick<Props, {}>", ids.join(" | ")))
        }
    }

    /// Drop class segments absorbed into the styled element; keep only the
    /// unpredictable plain-variable segments. Conditional CSS props are fed to
    /// the styled element as attributes.
    fn styled_attributes(&self, element: &ElementNode) -> Vec<(String, AttributeValues)> {
        let mut attributes: Vec<(String, AttributeValues)> = Vec::new();
        for (name, values) in &element.attributes {
            if name == "class" {
                let kept: AttributeValues = values
                    .iter()
                    .filter(|value| matches!(value, AttributeValue::Variable { .. }))
                    .cloned()
                    .collect();
                if !kept.is_empty() {
                    attributes.push((name.clone(), kept));
                }
            } else {
                attributes.push((name.clone(), values.clone()));
            }
        }
        for property in &element.css_properties {
            if let CssProperty::Conditional { id, .. } = property {
                attributes.push((
                    id.clone(),
                    vec![AttributeValue::Variable {
                        id: id.clone(),
                        required: true,
                    }],
                ));
            }
        }
        attributes
    }
}

impl Emitter for ReactStyledEmitter {
    fn on_element(&mut self, element: &ElementNode) -> String {
        if element.css_properties.is_empty() {
            self.renderer
                .element(&element.name, &element.attributes, !element.children.is_empty());
            return element.name.clone();
        }

        let styled_name = self.new_styled_name(&element.name);
        let styled_props_name = format!("{}Props", styled_name);
        let styled_body = self.render_styled_body(element, &styled_props_name);

        match self.render_css_property_props(&element.css_properties) {
            Some(picked) => {
                self.constants
                    .push_str(&format!("type {} = {};\n", styled_props_name, picked));
                self.constants.push_str(&format!(
                    "const {} = styled.{}<{}>`\n  {}\n`;\n\n",
                    styled_name, element.name, styled_props_name, styled_body
                ));
            }
            None => {
                self.constants.push_str(&format!(
                    "const {} = styled.{}`\n  {}\n`;\n\n",
                    styled_name, element.name, styled_body
                ));
            }
        }

        let attributes = self.styled_attributes(element);
        self.renderer
            .element(&styled_name, &attributes, !element.children.is_empty());
        styled_name
    }

    fn on_close_element(&mut self, tag: &str, _element: &ElementNode) {
        self.renderer.close_element(tag);
    }

    fn on_text(&mut self, text: &TextNode) {
        self.renderer.text(&text.value);
    }

    fn on_comment(&mut self, comment: &CommentNode) {
        self.renderer.comment(&comment.value);
    }

    fn on_variable(&mut self, variable: &VariableNode) -> bool {
        self.renderer.variable(variable);
        false
    }

    fn on_close_variable(&mut self, variable: &VariableNode) {
        self.renderer.close_variable(variable);
    }

    fn on_conditional(&mut self, conditional: &ConditionalNode) {
        self.renderer.conditional(conditional);
    }

    fn on_close_conditional(&mut self, conditional: &ConditionalNode) {
        self.renderer.close_conditional(conditional);
    }

    fn on_finalise(&mut self, _css: &str, formatter: &dyn SourceFormatter) {
        let mut render = render_function_header(&self.template_id, &self.props);
        if self.has_multiple_root_nodes {
            render.push_str("<React.Fragment>");
        }
        render.push_str(&self.renderer.render);
        if self.has_multiple_root_nodes {
            render.push_str("</React.Fragment>");
        }

        let file_data = format!(
            "{}\n{}\n\n{}\n\n{}\n  )\n}};\n",
            self.imports, self.typescript, self.constants, render
        );
        self.file_data = format_or_keep(formatter, "typescript", file_data);
    }

    fn serialize(&self) -> TemplateFiles {
        let mut files = TemplateFiles::new();
        files.insert(
            format!("{}/{}.tsx", DIRNAME, self.template_id),
            self.file_data.clone(),
        );
        files
    }
}

impl ReactStyledEmitter {
    fn render_styled_body(&self, element: &ElementNode, styled_props_name: &str) -> String {
        element
            .css_properties
            .iter()
            .map(|property| self.render_css_property(property, styled_props_name))
            .collect::<Vec<_>>()
            .join("\n  ")
    }
}

fn render_prop_type(id: &str, prop: &Prop) -> String {
    let mut rendered = prop_type_name(id, prop);
    match &prop.kind {
        PropKind::Variable => rendered.push_str("React.ReactNode;"),
        PropKind::AttributeValue { .. } => rendered.push_str("string;"),
        PropKind::AttributeValueOptions { options, .. } => {
            rendered.push_str(&option_union(options));
            rendered.push(';');
        }
    }
    rendered
}

fn capitalize_first(source: &str) -> String {
    let mut chars = source.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{run_emitter, NoFormatter};
    use crate::error::Reporter;
    use crate::ir::TemplateComponent;

    fn output_of(markup: &str, css: &str) -> String {
        let component: TemplateComponent =
            crate::builder::build_component(markup, css, &Reporter::new(false)).unwrap();
        let args = EmitterArgs {
            template_id: "widget",
            props: &component.props,
            has_multiple_root_nodes: component.nodes.len() > 1,
        };
        let mut emitter = ReactStyledEmitter::new(&args);
        let files = run_emitter(&mut emitter, &component, &NoFormatter);
        files["react-styled-components/widget.tsx"].clone()
    }

    #[test]
    fn styled_elements_hoist_constant_declarations() {
        let output = output_of("<p class=\"frog\">hello</p>", ".frog { color: blue }");
        assert!(output.contains("const StyledP = styled.p`"));
        assert!(output.contains("color: blue"));
        assert!(output.contains("<StyledP>hello"));
        assert!(output.contains("import styled from 'styled-components';"));
    }

    #[test]
    fn elements_without_css_render_unstyled() {
        let output = output_of("<p>hello</p>", "");
        assert!(output.contains("<p>hello"));
        assert!(!output.contains("styled.p"));
    }

    #[test]
    fn conditional_css_becomes_a_parameterized_style_function() {
        let output = output_of(
            "<p class=\"{{ kind: one | two }}\">x</p>",
            ".one { color: red } .two { color: blue }",
        );
        assert!(output.contains("type StyledPProps = Pick<Props, \"kind\">;"));
        assert!(output.contains("const StyledP = styled.p<StyledPProps>`"));
        assert!(output.contains("${({kind}: StyledPProps) => ("));
        assert!(output.contains("[kind])}"));
        // The styled element receives the owning prop as an attribute.
        assert!(output.contains("<StyledP kind={kind}"));
    }

    #[test]
    fn class_attribute_segments_absorbed_by_styles_are_stripped() {
        let output = output_of("<p class=\"frog\">hello</p>", ".frog { color: blue }");
        assert!(!output.contains("className=\"frog\""));
    }

    #[test]
    fn unpredictable_class_variables_survive_the_strip() {
        let output = output_of(
            "<p class=\"frog {{ extra }}\">hello</p>",
            ".frog { color: blue }",
        );
        assert!(output.contains("className={extra}"));
    }

    #[test]
    fn styled_names_avoid_collisions_with_a_counter() {
        let output = output_of(
            "<p class=\"frog\">a</p><p class=\"frog\">b</p>",
            ".frog { color: blue }",
        );
        assert!(output.contains("const StyledP = styled.p`"));
        assert!(output.contains("const StyledP_2 = styled.p`"));
    }
}
