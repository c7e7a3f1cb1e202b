//! React backend: a typed function component in TypeScript.

use crate::emit::jsx::{render_function_header, JsxRenderer};
use crate::emit::{format_or_keep, Emitter, EmitterArgs, SourceFormatter, TemplateFiles};
use crate::ir::{CommentNode, ConditionalNode, ElementNode, TextNode, VariableNode};
use crate::props::{IdentStyle, Prop, PropKind, Props};

const DIRNAME: &str = "react";

pub struct ReactEmitter {
    template_id: String,
    props: Props,
    has_multiple_root_nodes: bool,
    renderer: JsxRenderer,
    imports: String,
    typescript: String,
    constants: String,
    file_data: String,
}

impl ReactEmitter {
    pub fn new(args: &EmitterArgs) -> Self {
        let props = args.props.clone();
        ReactEmitter {
            template_id: args.template_id.to_string(),
            has_multiple_root_nodes: args.has_multiple_root_nodes,
            renderer: JsxRenderer::new(
                props.clone(),
                "React.Fragment",
                "React.Fragment",
                attribute_name_transform,
            ),
            imports: "import React from 'react';\n".to_string(),
            typescript: props_declaration(&props, render_prop_type),
            constants: String::new(),
            props,
            file_data: String::new(),
        }
    }
}

impl Emitter for ReactEmitter {
    fn on_element(&mut self, element: &ElementNode) -> String {
        self.renderer
            .element(&element.name, &element.attributes, !element.children.is_empty());
        element.name.clone()
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

/// Render the `type Props = { ... };` declaration with one line per prop.
pub(crate) fn props_declaration(
    props: &Props,
    render_prop_type: fn(&str, &Prop) -> String,
) -> String {
    let lines: Vec<String> = props
        .iter()
        .map(|(id, prop)| render_prop_type(id, prop))
        .collect();
    format!("type Props = {{\n  {}\n}};", lines.join("\n  "))
}

pub(crate) fn prop_type_name(id: &str, prop: &Prop) -> String {
    let mut rendered = if prop.ident == IdentStyle::Bare {
        id.to_string()
    } else {
        format!("\"{}\"", id)
    };
    if !prop.required {
        rendered.push('?');
    }
    rendered.push_str(": ");
    rendered
}

fn render_prop_type(id: &str, prop: &Prop) -> String {
    let mut rendered = prop_type_name(id, prop);
    match &prop.kind {
        PropKind::Variable => rendered.push_str("React.ReactNode;"),
        PropKind::AttributeValue {
            node_name,
            attribute_name,
        } => {
            let element_name = typescript_element_name(node_name);
            rendered.push_str(&format!(
                "React.{}HTMLAttributes<HTML{}Element>[\"{}\"];",
                element_name,
                element_name,
                attribute_name_transform(attribute_name)
            ));
        }
        PropKind::AttributeValueOptions { options, .. } => {
            rendered.push_str(&option_union(options));
            rendered.push(';');
        }
    }
    rendered
}

pub(crate) fn option_union(options: &[(String, String)]) -> String {
    options
        .iter()
        .map(|(name, _)| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// React uses JavaScript attribute names, which differ from the HTML ones.
pub(crate) fn attribute_name_transform(attribute_name: &str) -> String {
    match attribute_name {
        "class" => "className",
        "for" => "htmlFor",
        "autocomplete" => "autoComplete",
        "fill-rule" => "fillRule",
        "readonly" => "readOnly",
        "autofocus" => "autoFocus",
        "srcset" => "srcSet",
        "crossorigin" => "crossOrigin",
        "spellcheck" => "spellCheck",
        "tabindex" => "tabIndex",
        "maxlength" => "maxLength",
        other => other,
    }
    .to_string()
}

/// Map a tag name to the name used by React's TypeScript element types.
fn typescript_element_name(tag_name: &str) -> String {
    match tag_name {
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => String::new(),
        "a" => "Anchor".to_string(),
        "img" => "Image".to_string(),
        "textarea" => "TextArea".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{run_emitter, NoFormatter};
    use crate::error::Reporter;
    use crate::ir::{TemplateComponent, TemplateNode};

    fn component(markup: &str, css: &str) -> TemplateComponent {
        crate::builder::build_component(markup, css, &Reporter::new(false)).unwrap()
    }

    fn react_output(component: &TemplateComponent) -> String {
        let args = EmitterArgs {
            template_id: "widget",
            props: &component.props,
            has_multiple_root_nodes: component.nodes.len() > 1,
        };
        let mut emitter = ReactEmitter::new(&args);
        let files = run_emitter(&mut emitter, component, &NoFormatter);
        files["react/widget.tsx"].clone()
    }

    #[test]
    fn static_attributes_render_as_strings() {
        let output = react_output(&component("<p class=\"frog\">hello</p>", ""));
        assert!(output.contains("<p className=\"frog\">hello\n</p>"));
        assert!(output.contains("import React from 'react';"));
    }

    #[test]
    fn bound_attributes_render_as_expressions() {
        let output = react_output(&component("<a href=\"{{ href }}\">x</a>", ""));
        assert!(output.contains("<a href={href}>"));
        assert!(output.contains(
            "href: React.AnchorHTMLAttributes<HTMLAnchorElement>[\"href\"];"
        ));
    }

    #[test]
    fn mixed_attributes_render_as_template_literals() {
        let output = react_output(&component("<p class=\"base {{ extra }}\">x</p>", ""));
        assert!(output.contains("className={`base ${extra || ''}`}"));
    }

    #[test]
    fn enum_attributes_render_as_lookups() {
        let output = react_output(&component(
            "<p class=\"{{ kind: one | two }}\">x</p>",
            "",
        ));
        assert!(output.contains("{\"one\":\"one\",\"two\":\"two\"}[kind]"));
        assert!(output.contains("kind: \"one\" | \"two\";"));
    }

    #[test]
    fn variables_render_as_provided_or_default() {
        let variable = TemplateNode::Variable(crate::ir::VariableNode {
            id: "children".to_string(),
            optional: false,
            children: vec![TemplateNode::Text(crate::ir::TextNode {
                value: "fallback".to_string(),
            })],
        });
        let props = crate::props::infer_props(&[variable.clone()], &Reporter::new(false)).unwrap();
        let component = TemplateComponent {
            nodes: vec![variable],
            props,
            css_string: String::new(),
        };
        let output = react_output(&component);
        assert!(output.contains("{children !== undefined ? children : `fallback`}"));
    }

    #[test]
    fn conditionals_render_as_logical_and() {
        let output = react_output(&component(
            "<m-if test=\"frog !== 'frush'\"><p>x</p></m-if>",
            "",
        ));
        assert!(output.contains("{frog !== 'frush' && (<React.Fragment>"));
        assert!(output.contains("</React.Fragment>)}"));
    }

    #[test]
    fn parse_errors_render_inert_with_the_error_preserved() {
        let output = react_output(&component("<m-if test=\"a && b\"><p>x</p></m-if>", ""));
        assert!(output.contains("{false && (<React.Fragment>"));
        assert!(output.contains("parse error:"));
    }

    #[test]
    fn indexed_props_are_read_through_the_props_object() {
        let output = react_output(&component("<a href=\"{{ my-href }}\">x</a>", ""));
        assert!(output.contains("export default function widget(props: Props){"));
        assert!(output.contains("props[\"my-href\"]"));
    }

    #[test]
    fn bare_props_are_destructured_in_the_signature() {
        let output = react_output(&component("<a href=\"{{ href }}\">x</a>", ""));
        assert!(output.contains("export default function widget({ href }: Props){"));
    }

    #[test]
    fn multiple_roots_are_wrapped_in_a_fragment() {
        let output = react_output(&component("<p>a</p><p>b</p>", ""));
        assert!(output.contains("<React.Fragment><p>a"));
    }

    #[test]
    fn comments_render_as_jsx_comments() {
        let output = react_output(&component("<!-- note -->", ""));
        assert!(output.contains("{/* note */}"));
    }

    #[test]
    fn enum_attribute_values_are_attribute_value_lookups() {
        // Optional enums guard the lookup behind the prop.
        let output = react_output(&component(
            "<p class=\"{{ kind?: one | two }}\">x</p>",
            "",
        ));
        assert!(output.contains("kind && {\"one\":\"one\",\"two\":\"two\"}[kind]"));
        assert!(output.contains("kind?: \"one\" | \"two\";"));
    }

    #[test]
    fn childless_elements_self_close() {
        let output = react_output(&component("<br>", ""));
        assert!(output.contains("<br/>"));
    }

    #[test]
    fn attribute_values_can_mix_constant_and_enum_segments() {
        let component = component("<p class=\"base {{ kind: one | two }}\">x</p>", "");
        let output = react_output(&component);
        assert!(output
            .contains("className={`base ${{\"one\":\"one\",\"two\":\"two\"}[kind] || ''}`}"));
    }
}
