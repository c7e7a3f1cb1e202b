//! Mustache backend.
//!
//! Mustache is logic-less, so enumerated values cannot compare a variable to
//! a literal. Instead, `=` is a legal character in a section name: comparing
//! `kind` to `one` becomes a section over the literal variable name `kind=one`
//! which callers set truthy for the active option.

use crate::condition::{ConditionTest, Dialect};
use crate::emit::ember::squash_expression;
use crate::emit::{Emitter, EmitterArgs, SourceFormatter, TemplateFiles};
use crate::ir::{
    AttributeValue, AttributeValues, CommentNode, ConditionalNode, ElementNode, TextNode,
    VariableNode,
};

const DIRNAME: &str = "mustache";

/// Section name used as the never-rendered stand-in for parse errors.
const PARSE_ERROR_SECTION: &str = "parse-error";

pub struct MustacheEmitter {
    template_id: String,
    data: String,
    unescaped_variables: Vec<String>,
}

impl MustacheEmitter {
    pub fn new(args: &EmitterArgs) -> Self {
        MustacheEmitter {
            template_id: args.template_id.to_string(),
            data: String::new(),
            unescaped_variables: Vec::new(),
        }
    }

    fn render_attribute(&self, name: &str, values: &AttributeValues) -> String {
        let omitted_if_empty =
            values.len() == 1 && matches!(values[0], AttributeValue::Variable { .. });

        let mut rendered = String::from(" ");
        if omitted_if_empty {
            if let AttributeValue::Variable { id, .. } = &values[0] {
                rendered.push_str(&format!("{{{{#{}}}}}", id));
            }
        }
        rendered.push_str(name);
        rendered.push_str("=\"");
        let body: String = values
            .iter()
            .map(|value| match value {
                AttributeValue::Constant { value } => value.clone(),
                AttributeValue::Variable { id, .. } => format!("{{{{{}}}}}", id),
                AttributeValue::VariableOptions { id, options, .. } => options
                    .iter()
                    .map(|(option_name, literal)| {
                        format!(
                            "{{{{{id}={name}}}}}{literal}{{{{/{id}={name}}}}}",
                            id = id,
                            name = option_name,
                            literal = literal
                        )
                    })
                    .collect(),
            })
            .collect();
        rendered.push_str(body.trim());
        rendered.push('"');
        if omitted_if_empty {
            if let AttributeValue::Variable { id, .. } = &values[0] {
                rendered.push_str(&format!("{{{{/{}}}}}", id));
            }
        }
        rendered
    }
}

impl Emitter for MustacheEmitter {
    fn on_element(&mut self, element: &ElementNode) -> String {
        self.data.push('<');
        self.data.push_str(&element.name);
        for (name, values) in &element.attributes {
            let rendered = self.render_attribute(name, values);
            self.data.push_str(&rendered);
        }
        self.data.push('>');
        element.name.clone()
    }

    fn on_close_element(&mut self, tag: &str, _element: &ElementNode) {
        self.data.push_str(&format!("</{}>", tag));
    }

    fn on_text(&mut self, text: &TextNode) {
        self.data.push_str(&text.value);
    }

    fn on_comment(&mut self, comment: &CommentNode) {
        self.data.push_str(&format!("{{{{! {} }}}}", comment.value));
    }

    fn on_variable(&mut self, variable: &VariableNode) -> bool {
        self.unescaped_variables.push(variable.id.clone());
        self.data.push_str(&format!("{{{{{{ {} }}}}}}", variable.id));
        if !variable.children.is_empty() {
            // Inverted section: default content renders when the value is
            // absent.
            self.data.push_str(&format!("{{{{^{}}}}}", variable.id));
        }
        false
    }

    fn on_close_variable(&mut self, variable: &VariableNode) {
        if !variable.children.is_empty() {
            self.data.push_str(&format!("{{{{/{}}}}}", variable.id));
        }
    }

    fn on_conditional(&mut self, conditional: &ConditionalNode) {
        match &conditional.test {
            ConditionTest::Parsed { .. } => {
                let expression = conditional
                    .test
                    .expression(Dialect::JavaScript)
                    .unwrap_or_default();
                self.data
                    .push_str(&format!("{{{{#{}}}}}", squash_expression(expression)));
            }
            ConditionTest::ParseError { message } => {
                self.data.push_str(&format!(
                    "{{{{! parse error: {} }}}}{{{{#{}}}}}",
                    message, PARSE_ERROR_SECTION
                ));
            }
        }
    }

    fn on_close_conditional(&mut self, conditional: &ConditionalNode) {
        match &conditional.test {
            ConditionTest::Parsed { .. } => {
                let expression = conditional
                    .test
                    .expression(Dialect::JavaScript)
                    .unwrap_or_default();
                self.data
                    .push_str(&format!("{{{{/{}}}}}", squash_expression(expression)));
            }
            ConditionTest::ParseError { .. } => {
                self.data
                    .push_str(&format!("{{{{/{}}}}}", PARSE_ERROR_SECTION));
            }
        }
    }

    fn on_finalise(&mut self, _css: &str, _formatter: &dyn SourceFormatter) {
        if self.unescaped_variables.is_empty() {
            return;
        }
        let note = format!(
            "{{{{!\nDEVELOPER NOTE: This template uses triple-bracket \"{{{{{{\" which disables HTML escaping.\nPlease ensure these variables are properly escaped:\n\n  * {}.\n\nThe reason for this is to allow raw HTML, for values such as (eg) <span lang=\"mi\">Māori</span>.\n}}}}\n",
            self.unescaped_variables.join(",\n  * ")
        );
        self.data = format!("{}{}", note, self.data);
    }

    fn serialize(&self) -> TemplateFiles {
        let mut files = TemplateFiles::new();
        files.insert(
            format!("{}/{}.html", DIRNAME, self.template_id),
            self.data.clone(),
        );
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{run_emitter, NoFormatter};
    use crate::error::Reporter;
    use crate::ir::TemplateComponent;

    fn output_of(markup: &str) -> String {
        let component: TemplateComponent =
            crate::builder::build_component(markup, "", &Reporter::new(false)).unwrap();
        let args = EmitterArgs {
            template_id: "widget",
            props: &component.props,
            has_multiple_root_nodes: component.nodes.len() > 1,
        };
        let mut emitter = MustacheEmitter::new(&args);
        let files = run_emitter(&mut emitter, &component, &NoFormatter);
        files["mustache/widget.html"].clone()
    }

    #[test]
    fn single_variable_attributes_are_omitted_when_unset() {
        let output = output_of("<a href=\"{{ href }}\">x</a>");
        assert!(output.contains("{{#href}}href=\"{{href}}\"{{/href}}"));
    }

    #[test]
    fn enum_attributes_render_equality_sections() {
        let output = output_of("<p class=\"{{ kind: one | two }}\">x</p>");
        assert!(output.contains("{{kind=one}}one{{/kind=one}}"));
        assert!(output.contains("{{kind=two}}two{{/kind=two}}"));
    }

    #[test]
    fn variables_render_unescaped_with_a_developer_note() {
        let output = output_of("<m-variable id=\"content\"></m-variable>");
        assert!(output.contains("{{{ content }}}"));
        assert!(output.contains("DEVELOPER NOTE"));
        assert!(output.contains("  * content."));
    }

    #[test]
    fn variable_defaults_render_in_an_inverted_section() {
        let component = TemplateComponent {
            nodes: vec![crate::ir::TemplateNode::Variable(crate::ir::VariableNode {
                id: "content".to_string(),
                optional: true,
                children: vec![crate::ir::TemplateNode::Text(crate::ir::TextNode {
                    value: "fallback".to_string(),
                })],
            })],
            props: crate::props::Props::new(),
            css_string: String::new(),
        };
        let args = EmitterArgs {
            template_id: "widget",
            props: &component.props,
            has_multiple_root_nodes: false,
        };
        let mut emitter = MustacheEmitter::new(&args);
        let files = run_emitter(&mut emitter, &component, &NoFormatter);
        assert!(files["mustache/widget.html"]
            .contains("{{{ content }}}{{^content}}fallback{{/content}}"));
    }

    #[test]
    fn conditionals_render_squashed_sections() {
        let output = output_of("<m-if test=\"frog === 'frush'\"><p>x</p></m-if>");
        assert!(output.contains("{{#frog=frush}}"));
        assert!(output.contains("{{/frog=frush}}"));
    }

    #[test]
    fn parse_errors_render_an_inert_section() {
        let output = output_of("<m-if test=\"a && b\"><p>x</p></m-if>");
        assert!(output.contains("{{! parse error:"));
        assert!(output.contains("{{#parse-error}}"));
        assert!(output.contains("{{/parse-error}}"));
    }

    #[test]
    fn comments_render_as_mustache_comments() {
        let output = output_of("<!-- note -->");
        assert!(output.contains("{{!  note  }}"));
    }
}
