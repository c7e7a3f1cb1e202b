//! Angular backend: a component class with an inline template.

use crate::condition::{ConditionTest, Dialect};
use crate::emit::jsx::prop_access;
use crate::emit::react::option_union;
use crate::emit::{
    format_or_keep, json_object, pascal_case, Emitter, EmitterArgs, SourceFormatter, TemplateFiles,
};
use crate::ir::{
    AttributeValue, AttributeValues, CommentNode, ConditionalNode, ElementNode, TextNode,
    VariableNode,
};
use crate::props::{IdentStyle, Prop, PropKind, Props};

const DIRNAME: &str = "angular";

pub struct AngularEmitter {
    template_id: String,
    props: Props,
    template: String,
    typescript: String,
    file_data: String,
}

impl AngularEmitter {
    pub fn new(args: &EmitterArgs) -> Self {
        let props = args.props.clone();
        let typescript = format!(
            "type Props = {{\n  {}\n}};",
            props
                .iter()
                .map(|(id, prop)| render_prop_type(id, prop))
                .collect::<Vec<_>>()
                .join("\n  ")
        );
        AngularEmitter {
            template_id: args.template_id.to_string(),
            props,
            template: String::new(),
            typescript,
            file_data: String::new(),
        }
    }

    fn render_attribute(&self, name: &str, values: &AttributeValues) -> String {
        // Event-handler shorthand: onclick="{{ press }}" -> (click)="press($event)"
        if is_event_attribute(name) && values.len() == 1 {
            if let AttributeValue::Variable { id, .. } = &values[0] {
                return format!(" ({})=\"{}($event)\"", &name[2..], id);
            }
        }

        let only_constants = values
            .iter()
            .all(|value| matches!(value, AttributeValue::Constant { .. }));

        let mut rendered = String::from(" ");
        if !only_constants {
            rendered.push('[');
        }
        rendered.push_str(name);
        if !only_constants {
            rendered.push(']');
        }
        rendered.push_str("=\"");
        for value in values {
            match value {
                AttributeValue::Constant { value } => rendered.push_str(value),
                AttributeValue::Variable { id, .. } => {
                    rendered.push_str(&format!(
                        "{{{{ {} || '' }}}}",
                        prop_access(id, &self.props)
                    ));
                }
                AttributeValue::VariableOptions { id, options, .. } => {
                    let access = prop_access(id, &self.props);
                    let required = self
                        .props
                        .get(id)
                        .map(|prop| prop.required)
                        .unwrap_or(true);
                    let lookup = format!("{}[{}]", json_object(options), access);
                    let expression = if required {
                        lookup
                    } else {
                        format!("{} && {}", access, lookup)
                    };
                    rendered.push_str(&format!("{{{{ {} || '' }}}}", expression));
                }
            }
        }
        rendered.push('"');
        rendered
    }
}

impl Emitter for AngularEmitter {
    fn on_element(&mut self, element: &ElementNode) -> String {
        self.template.push('<');
        self.template.push_str(&element.name);
        for (name, values) in &element.attributes {
            let rendered = self.render_attribute(name, values);
            self.template.push_str(&rendered);
        }
        self.template.push('>');
        element.name.clone()
    }

    fn on_close_element(&mut self, tag: &str, _element: &ElementNode) {
        self.template.push_str(&format!("</{}>", tag));
    }

    fn on_text(&mut self, text: &TextNode) {
        self.template.push_str(&text.value);
    }

    fn on_comment(&mut self, comment: &CommentNode) {
        self.template.push_str(&format!("<!--{}-->", comment.value));
    }

    fn on_variable(&mut self, variable: &VariableNode) -> bool {
        self.template.push_str(&format!("{{{{{}}}}}", variable.id));
        if !variable.children.is_empty() {
            self.template.push_str(&format!(
                "<ng-template *ngIf=\"{} == undefined\">",
                variable.id
            ));
        }
        false
    }

    fn on_close_variable(&mut self, variable: &VariableNode) {
        if !variable.children.is_empty() {
            self.template.push_str("</ng-template>");
        }
    }

    fn on_conditional(&mut self, conditional: &ConditionalNode) {
        match &conditional.test {
            ConditionTest::Parsed { .. } => {
                let expression = conditional
                    .test
                    .expression(Dialect::JavaScript)
                    .unwrap_or_default();
                self.template
                    .push_str(&format!("<span *ngIf=\"{}\">", expression));
            }
            ConditionTest::ParseError { message } => {
                self.template
                    .push_str(&format!("<!-- parse error: {} -->", message));
            }
        }
    }

    fn on_close_conditional(&mut self, conditional: &ConditionalNode) {
        if matches!(conditional.test, ConditionTest::Parsed { .. }) {
            self.template.push_str("</span>");
        }
    }

    fn on_finalise(&mut self, _css: &str, formatter: &dyn SourceFormatter) {
        let component_var_name = pascal_case(&self.template_id);
        let file_data = format!(
            "import {{ Component }} from \"@angular/core\";\n\n{}\n\n@Component({{\n  selector: '{}',\n  template: `{}\n`\n}})\nexport default class {} {{}}",
            self.typescript, self.template_id, self.template, component_var_name
        );
        self.file_data = format_or_keep(formatter, "typescript", file_data);
    }

    fn serialize(&self) -> TemplateFiles {
        let mut files = TemplateFiles::new();
        files.insert(
            format!("{}/{}.ts", DIRNAME, self.template_id),
            self.file_data.clone(),
        );
        files
    }
}

fn is_event_attribute(attribute_name: &str) -> bool {
    attribute_name.starts_with("on") && attribute_name.len() >= 3
}

fn render_prop_type(id: &str, prop: &Prop) -> String {
    let mut rendered = if prop.ident == IdentStyle::Bare {
        id.to_string()
    } else {
        format!("\"{}\"", id)
    };
    if !prop.required {
        rendered.push('?');
    }
    rendered.push_str(": ");
    match &prop.kind {
        PropKind::Variable | PropKind::AttributeValue { .. } => rendered.push_str("any;"),
        PropKind::AttributeValueOptions { options, .. } => {
            rendered.push_str(&option_union(options));
            rendered.push(';');
        }
    }
    rendered
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
        let mut emitter = AngularEmitter::new(&args);
        let files = run_emitter(&mut emitter, &component, &NoFormatter);
        files["angular/widget.ts"].clone()
    }

    #[test]
    fn renders_a_component_class() {
        let output = output_of("<p>hello</p>");
        assert!(output.contains("import { Component } from \"@angular/core\";"));
        assert!(output.contains("selector: 'widget',"));
        assert!(output.contains("export default class Widget {}"));
        assert!(output.contains("<p>hello</p>"));
    }

    #[test]
    fn bound_attributes_use_property_binding() {
        let output = output_of("<a href=\"{{ href }}\">x</a>");
        assert!(output.contains("[href]=\"{{ href || '' }}\""));
    }

    #[test]
    fn event_attributes_use_event_binding() {
        let output = output_of("<button onclick=\"{{ press }}\">x</button>");
        assert!(output.contains("(click)=\"press($event)\""));
    }

    #[test]
    fn conditionals_use_ng_if_spans() {
        let output = output_of("<m-if test=\"frog !== 'frush'\"><p>x</p></m-if>");
        assert!(output.contains("<span *ngIf=\"frog !== 'frush'\">"));
        assert!(output.contains("</span>"));
    }

    #[test]
    fn variables_with_defaults_render_an_ng_template() {
        let output = output_of("<m-if test=\"x\"><m-variable id=\"v\" optional></m-if>");
        assert!(output.contains("{{v}}"));
    }
}
