//! Markup-only backend: literal HTML with placeholder comments for variables.

use crate::emit::{format_or_keep, Emitter, EmitterArgs, SourceFormatter, TemplateFiles};
use crate::ir::{
    AttributeValue, AttributeValues, CommentNode, ConditionalNode, ElementNode, TextNode,
    VariableNode,
};
use crate::props::Props;

const DIRNAME: &str = "html";

pub struct MarkupEmitter {
    template_id: String,
    props: Props,
    html: String,
}

impl MarkupEmitter {
    pub fn new(args: &EmitterArgs) -> Self {
        MarkupEmitter {
            template_id: args.template_id.to_string(),
            props: args.props.clone(),
            html: String::new(),
        }
    }
}

/// Constants render verbatim; enumerated values render their first option's
/// literal; plain variables render nothing.
fn attribute_text(values: &AttributeValues) -> String {
    values
        .iter()
        .filter_map(|value| match value {
            AttributeValue::Constant { value } => Some(value.clone()),
            AttributeValue::VariableOptions { options, .. } => {
                options.first().map(|(_, literal)| literal.clone())
            }
            AttributeValue::Variable { .. } => None,
        })
        .filter(|value| !value.is_empty())
        .collect()
}

impl Emitter for MarkupEmitter {
    fn on_element(&mut self, element: &ElementNode) -> String {
        self.html.push('<');
        self.html.push_str(&element.name);
        for (name, values) in &element.attributes {
            self.html
                .push_str(&format!(" {}=\"{}\"", name, attribute_text(values)));
        }
        self.html.push('>');
        element.name.clone()
    }

    fn on_close_element(&mut self, tag: &str, _element: &ElementNode) {
        self.html.push_str(&format!("</{}>", tag));
    }

    fn on_text(&mut self, text: &TextNode) {
        self.html.push_str(&text.value);
    }

    fn on_comment(&mut self, comment: &CommentNode) {
        self.html.push_str(&format!("<!--{}-->", comment.value));
    }

    fn on_variable(&mut self, variable: &VariableNode) -> bool {
        self.html
            .push_str(&format!("<!-- '{}' goes here -->", variable.id));
        // Required variables have no fallback to show; optional ones render
        // their default children.
        self.props
            .get(&variable.id)
            .map(|prop| prop.required)
            .unwrap_or(false)
    }

    fn on_close_variable(&mut self, _variable: &VariableNode) {}

    fn on_conditional(&mut self, _conditional: &ConditionalNode) {}

    fn on_close_conditional(&mut self, _conditional: &ConditionalNode) {}

    fn on_finalise(&mut self, _css: &str, formatter: &dyn SourceFormatter) {
        self.html = format_or_keep(formatter, "html", std::mem::take(&mut self.html));
    }

    fn serialize(&self) -> TemplateFiles {
        let mut files = TemplateFiles::new();
        files.insert(
            format!("{}/{}.html", DIRNAME, self.template_id),
            self.html.clone(),
        );
        files
    }
}
