//! Ember (Handlebars) backend.

use lazy_static::lazy_static;
use regex::Regex;

use crate::condition::{ConditionTest, Dialect};
use crate::emit::{Emitter, EmitterArgs, SourceFormatter, TemplateFiles};
use crate::ir::{
    AttributeValue, AttributeValues, CommentNode, ConditionalNode, ElementNode, TextNode,
    VariableNode,
};
use crate::props::Props;

const DIRNAME: &str = "ember";

pub struct EmberEmitter {
    template_id: String,
    props: Props,
    data: String,
}

impl EmberEmitter {
    pub fn new(args: &EmitterArgs) -> Self {
        EmberEmitter {
            template_id: args.template_id.to_string(),
            props: args.props.clone(),
            data: String::new(),
        }
    }

    fn render_attribute(&self, name: &str, values: &AttributeValues) -> String {
        let single_variable =
            values.len() == 1 && matches!(values[0], AttributeValue::Variable { .. });

        let mut rendered = String::from(" ");
        rendered.push_str(name);
        rendered.push('=');
        if !single_variable {
            rendered.push('"');
        }
        let body: String = values
            .iter()
            .map(|value| match value {
                AttributeValue::Constant { value } => value.clone(),
                AttributeValue::Variable { id, .. } => format!("{{{{@{}}}}}", id),
                AttributeValue::VariableOptions { id, options, .. } => options
                    .iter()
                    .map(|(option_name, literal)| {
                        format!(
                            "{{{{if (eq {} {})}}}}{}{{{{/if}}}}",
                            id,
                            crate::condition::json_string(option_name),
                            literal
                        )
                    })
                    .collect(),
            })
            .collect();
        rendered.push_str(body.trim());
        if !single_variable {
            rendered.push('"');
        }
        rendered
    }
}

/// Squash a JavaScript comparison into a handlebars-safe token, e.g.
/// `frog === 'frush'` becomes `frog=frush`.
pub(crate) fn squash_expression(expression: &str) -> String {
    lazy_static! {
        static ref STRIP_RE: Regex = Regex::new(r#"[\s"']"#).unwrap();
        static ref EQUALS_RE: Regex = Regex::new(r"=+").unwrap();
    }
    let stripped = STRIP_RE.replace_all(expression, "");
    EQUALS_RE.replace_all(&stripped, "=").to_string()
}

impl Emitter for EmberEmitter {
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
        self.data.push_str(&format!("<!-- {} -->", comment.value));
    }

    fn on_variable(&mut self, variable: &VariableNode) -> bool {
        let required = self
            .props
            .get(&variable.id)
            .map(|prop| prop.required)
            .unwrap_or(false);
        if required {
            self.data.push_str(&format!("{{{{@{}}}}}", variable.id));
            return true;
        }
        self.data.push_str(&format!("{{{{#if {}}}}}", variable.id));
        self.data.push_str(&format!("{{{{@{}}}}}", variable.id));
        if !variable.children.is_empty() {
            self.data.push_str("{{else}}");
        }
        false
    }

    fn on_close_variable(&mut self, variable: &VariableNode) {
        let required = self
            .props
            .get(&variable.id)
            .map(|prop| prop.required)
            .unwrap_or(false);
        if !required {
            self.data.push_str("{{/if}}");
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
                    .push_str(&format!("{{{{#if @{}}}}}", squash_expression(expression)));
            }
            ConditionTest::ParseError { message } => {
                self.data
                    .push_str(&format!("{{{{! parse error: {} }}}}{{{{#if false}}}}", message));
            }
        }
    }

    fn on_close_conditional(&mut self, _conditional: &ConditionalNode) {
        self.data.push_str("{{/if}}");
    }

    fn on_finalise(&mut self, _css: &str, _formatter: &dyn SourceFormatter) {}

    fn serialize(&self) -> TemplateFiles {
        let mut files = TemplateFiles::new();
        files.insert(
            format!("{}/{}.hbs", DIRNAME, self.template_id),
            self.data.clone(),
        );
        files
    }
}
