//! Django template backend.

use crate::condition::{squash_identifier, ConditionTest, Dialect};
use crate::emit::{Emitter, EmitterArgs, SourceFormatter, TemplateFiles};
use crate::ir::{
    AttributeValue, AttributeValues, CommentNode, ConditionalNode, ElementNode, TextNode,
    VariableNode,
};
use crate::props::Props;

const DIRNAME: &str = "django";

pub struct DjangoEmitter {
    template_id: String,
    props: Props,
    data: String,
}

impl DjangoEmitter {
    pub fn new(args: &EmitterArgs) -> Self {
        DjangoEmitter {
            template_id: args.template_id.to_string(),
            props: args.props.clone(),
            data: String::new(),
        }
    }

    fn render_attribute(&self, name: &str, values: &AttributeValues) -> String {
        let omitted_if_empty =
            values.len() == 1 && matches!(values[0], AttributeValue::Variable { .. });

        let mut rendered = String::from(" ");
        if omitted_if_empty {
            if let AttributeValue::Variable { id, .. } = &values[0] {
                rendered.push_str(&format!("{{% if {} %}}", squash_identifier(id)));
            }
        }
        rendered.push_str(name);
        rendered.push_str("=\"");
        let body: String = values
            .iter()
            .map(|value| match value {
                AttributeValue::Constant { value } => value.clone(),
                AttributeValue::Variable { id, .. } => {
                    format!("{{{{ {} }}}}", squash_identifier(id))
                }
                AttributeValue::VariableOptions { id, options, .. } => {
                    let mut chain = String::new();
                    for (index, (option_name, literal)) in options.iter().enumerate() {
                        if index == 0 {
                            chain.push_str("{% if ");
                        } else {
                            chain.push_str("{% elif ");
                        }
                        chain.push_str(&squash_identifier(id));
                        chain.push_str(" == ");
                        chain.push_str(&crate::condition::json_string(option_name));
                        chain.push_str(" %}");
                        chain.push_str(literal);
                        if index == options.len() - 1 {
                            chain.push_str("{% endif %}");
                        }
                    }
                    chain
                }
            })
            .collect();
        rendered.push_str(body.trim());
        rendered.push('"');
        if omitted_if_empty {
            rendered.push_str("{% endif %}");
        }
        rendered
    }
}

impl Emitter for DjangoEmitter {
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
        self.data
            .push_str(&format!("{{% comment %}}{}{{% endcomment %}}", comment.value));
    }

    fn on_variable(&mut self, variable: &VariableNode) -> bool {
        let required = self
            .props
            .get(&variable.id)
            .map(|prop| prop.required)
            .unwrap_or(false);
        let identifier = squash_identifier(&variable.id);

        if !required && !variable.children.is_empty() {
            self.data.push_str(&format!("{{% if {} %}}", identifier));
        }
        self.data.push_str(&format!("{{{{ {} }}}}", identifier));
        if !required && !variable.children.is_empty() {
            self.data.push_str("{% else %}");
        }
        required
    }

    fn on_close_variable(&mut self, variable: &VariableNode) {
        let required = self
            .props
            .get(&variable.id)
            .map(|prop| prop.required)
            .unwrap_or(false);
        if !required && !variable.children.is_empty() {
            self.data.push_str("{% endif %}");
        }
    }

    fn on_conditional(&mut self, conditional: &ConditionalNode) {
        match &conditional.test {
            ConditionTest::Parsed { .. } => {
                let expression = conditional
                    .test
                    .expression(Dialect::Django)
                    .unwrap_or_default();
                self.data.push_str(&format!("{{% if {} %}}", expression));
            }
            ConditionTest::ParseError { message } => {
                self.data.push_str(&format!(
                    "{{% comment %}} parse error: {} {{% endcomment %}}{{% if False %}}",
                    message
                ));
            }
        }
    }

    fn on_close_conditional(&mut self, _conditional: &ConditionalNode) {
        self.data.push_str("{% endif %}");
    }

    fn on_finalise(&mut self, _css: &str, _formatter: &dyn SourceFormatter) {}

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
        let mut emitter = DjangoEmitter::new(&args);
        let files = run_emitter(&mut emitter, &component, &NoFormatter);
        files["django/widget.html"].clone()
    }

    #[test]
    fn single_variable_attributes_are_omitted_when_unset() {
        let output = output_of("<a href=\"{{ href }}\">x</a>");
        assert!(output.contains("{% if href %}href=\"{{ href }}\"{% endif %}"));
    }

    #[test]
    fn enum_attributes_render_if_elif_chains() {
        let output = output_of("<p class=\"{{ kind: one | two }}\">x</p>");
        assert!(output.contains("{% if kind == \"one\" %}one{% elif kind == \"two\" %}two{% endif %}"));
    }

    #[test]
    fn required_variables_interpolate_and_suppress_defaults() {
        let output = output_of("<m-variable id=\"title\"></m-variable>");
        assert_eq!(output, "{{ title }}");
    }

    #[test]
    fn optional_variables_wrap_defaults_in_if_else() {
        let component = TemplateComponent {
            nodes: vec![crate::ir::TemplateNode::Variable(crate::ir::VariableNode {
                id: "title".to_string(),
                optional: true,
                children: vec![crate::ir::TemplateNode::Text(crate::ir::TextNode {
                    value: "fallback".to_string(),
                })],
            })],
            props: crate::props::infer_props(
                &[crate::ir::TemplateNode::Variable(crate::ir::VariableNode {
                    id: "title".to_string(),
                    optional: true,
                    children: Vec::new(),
                })],
                &Reporter::new(false),
            )
            .unwrap(),
            css_string: String::new(),
        };
        let args = EmitterArgs {
            template_id: "widget",
            props: &component.props,
            has_multiple_root_nodes: false,
        };
        let mut emitter = DjangoEmitter::new(&args);
        let files = run_emitter(&mut emitter, &component, &NoFormatter);
        assert_eq!(
            files["django/widget.html"],
            "{% if title %}{{ title }}{% else %}fallback{% endif %}"
        );
    }

    #[test]
    fn conditionals_use_the_django_dialect() {
        let output = output_of("<m-if test=\"frog !== 'frush'\"><p>x</p></m-if>");
        assert!(output.contains("{% if frog != \"frush\" %}"));
        assert!(output.contains("{% endif %}"));
    }

    #[test]
    fn parse_errors_render_an_inert_if() {
        let output = output_of("<m-if test=\"a && b\"><p>x</p></m-if>");
        assert!(output.contains("{% comment %} parse error:"));
        assert!(output.contains("{% if False %}"));
        assert!(output.contains("{% endif %}"));
    }

    #[test]
    fn comments_render_as_django_comments() {
        let output = output_of("<!-- note -->");
        assert_eq!(output, "{% comment %} note {% endcomment %}");
    }
}
