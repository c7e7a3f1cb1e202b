//! Vue single-file-component backend.
//!
//! Attribute values with non-constant segments become computed properties on
//! the component; variables become slots; conditionals become `v-if` spans
//! driven by a boolean computed.

use crate::condition::{ConditionTest, Dialect};
use crate::emit::jsx::prop_access;
use crate::emit::{
    format_or_keep, json_object, pascal_case, Emitter, EmitterArgs, SourceFormatter, TemplateFiles,
};
use crate::ir::{
    AttributeValue, AttributeValues, CommentNode, ConditionalNode, ElementNode, TextNode,
    VariableNode,
};
use crate::props::{valid_js_identifier, IdentStyle, Prop, PropKind, Props};

const DIRNAME: &str = "vue";

struct ComputedProp {
    identifiers: Vec<String>,
    expression: String,
    response_type: &'static str,
}

pub struct VueEmitter {
    template_id: String,
    props: Props,
    template: String,
    computed: Vec<(String, ComputedProp)>,
    final_data: String,
}

impl VueEmitter {
    pub fn new(args: &EmitterArgs) -> Self {
        VueEmitter {
            template_id: args.template_id.to_string(),
            props: args.props.clone(),
            template: String::new(),
            computed: Vec::new(),
            final_data: String::new(),
        }
    }

    fn new_computed_name(&self, attribute_name: &str) -> String {
        let base = format!("computed{}", pascal_case(attribute_name));
        let mut counter = 1usize;
        loop {
            let candidate = if counter == 1 {
                base.clone()
            } else {
                format!("{}{}", base, counter)
            };
            counter += 1;
            if !self.computed.iter().any(|(name, _)| name == &candidate) {
                return candidate;
            }
        }
    }

    fn render_attribute(&mut self, name: &str, values: &AttributeValues) -> String {
        let only_constants = values
            .iter()
            .all(|value| matches!(value, AttributeValue::Constant { .. }));

        if only_constants {
            let text: String = values
                .iter()
                .filter_map(|value| match value {
                    AttributeValue::Constant { value } => Some(value.as_str()),
                    _ => None,
                })
                .collect();
            return format!(" {}=\"{}\"", name, text);
        }

        let contains_constant = values
            .iter()
            .any(|value| matches!(value, AttributeValue::Constant { .. }));
        let computed_name = self.new_computed_name(name);

        let mut identifiers = Vec::new();
        let mut expression = String::new();
        if contains_constant {
            expression.push('`');
        }
        for value in values {
            let interpolated = contains_constant
                && !matches!(value, AttributeValue::Constant { .. });
            if interpolated {
                expression.push_str("${ ");
            }
            match value {
                AttributeValue::Constant { value } => expression.push_str(value),
                AttributeValue::Variable { id, .. } => {
                    identifiers.push(id.clone());
                    expression.push_str(&prop_access(id, &self.props));
                }
                AttributeValue::VariableOptions { id, options, .. } => {
                    identifiers.push(id.clone());
                    let access = prop_access(id, &self.props);
                    let required = self
                        .props
                        .get(id)
                        .map(|prop| prop.required)
                        .unwrap_or(true);
                    if !required {
                        expression.push_str(&access);
                        expression.push_str(" && ");
                    }
                    expression.push_str(&json_object(options));
                    expression.push('[');
                    expression.push_str(&access);
                    expression.push(']');
                }
            }
            if interpolated {
                expression.push_str(" || '' }");
            }
        }
        if contains_constant {
            expression.push('`');
        }

        self.computed.push((
            computed_name.clone(),
            ComputedProp {
                identifiers,
                expression,
                response_type: "string",
            },
        ));

        format!(" :{}=\"{}\"", name, computed_name)
    }

    fn render_computed(&self) -> String {
        self.computed
            .iter()
            .map(|(name, computed)| {
                let contains_indexed = computed
                    .identifiers
                    .iter()
                    .any(|identifier| !valid_js_identifier(identifier));
                let mut spread: Vec<&str> = Vec::new();
                for identifier in &computed.identifiers {
                    if valid_js_identifier(identifier) && !spread.contains(&identifier.as_str()) {
                        spread.push(identifier);
                    }
                }
                let spread = spread.join(", ");

                let mut function = String::from("(");
                if contains_indexed {
                    function.push_str(&format!("props: Props): {} => ", computed.response_type));
                    if !spread.is_empty() {
                        function.push('{');
                        function.push_str(&format!("      const {{ {} }} = props;\n", spread));
                        function.push_str("      return ");
                    } else {
                        function.push('(');
                    }
                } else {
                    function.push_str(&format!(
                        "{{{}}}: Props): {} => (",
                        spread, computed.response_type
                    ));
                }
                function.push_str(&computed.expression);
                if contains_indexed && !spread.is_empty() {
                    function.push('}');
                } else {
                    function.push(')');
                }
                format!("{}: {}", name, function)
            })
            .collect::<Vec<_>>()
            .join(",\n    ")
    }

    fn props_type_string(&self) -> String {
        self.props
            .iter()
            .map(|(id, prop)| format!("{};", render_prop_type(id, prop)))
            .collect::<Vec<_>>()
            .join("\n  ")
    }

    fn extend_props_string(&self) -> String {
        self.props
            .iter()
            .map(|(id, prop)| {
                let key = if prop.ident == IdentStyle::Bare {
                    id.to_string()
                } else {
                    crate::condition::json_string(id)
                };
                format!(
                    "{}: Object as () => Props[{}],",
                    key,
                    crate::condition::json_string(id)
                )
            })
            .collect::<Vec<_>>()
            .join("\n    ")
    }
}

impl Emitter for VueEmitter {
    fn on_element(&mut self, element: &ElementNode) -> String {
        self.template.push('<');
        self.template.push_str(&element.name);
        let rendered: Vec<String> = element
            .attributes
            .iter()
            .map(|(name, values)| self.render_attribute(name, values))
            .collect();
        for attribute in rendered {
            self.template.push_str(&attribute);
        }
        if element.children.is_empty() {
            self.template.push('/');
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
        // 'children' maps to the default slot.
        if variable.id == "children" {
            self.template.push_str("<slot>");
        } else {
            self.template.push_str(&format!(
                "<slot name={}>",
                crate::condition::json_string(&variable.id)
            ));
        }
        self.props
            .get(&variable.id)
            .map(|prop| prop.required)
            .unwrap_or(false)
    }

    fn on_close_variable(&mut self, _variable: &VariableNode) {
        self.template.push_str("</slot>");
    }

    fn on_conditional(&mut self, conditional: &ConditionalNode) {
        match &conditional.test {
            ConditionTest::Parsed { ids, .. } => {
                let computed_name = self.new_computed_name(&ids.join(" "));
                let expression = conditional
                    .test
                    .expression(Dialect::JavaScript)
                    .unwrap_or_default()
                    .to_string();
                self.computed.push((
                    computed_name.clone(),
                    ComputedProp {
                        identifiers: ids.clone(),
                        expression,
                        response_type: "boolean",
                    },
                ));
                self.template
                    .push_str(&format!("<span v-if=\"{}\">", computed_name));
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

    fn on_finalise(&mut self, css: &str, formatter: &dyn SourceFormatter) {
        let component_var_name = pascal_case(&self.template_id);
        let props_string = self.props_type_string();
        let extend_props_string = self.extend_props_string();
        let computed_string = self.render_computed();

        let mut script = String::new();
        if !props_string.is_empty() {
            script.push_str(&format!("type Props = {{\n  {}\n}};\n\n", props_string));
        }
        script.push_str(&format!("const {} = Vue.extend({{\n", component_var_name));
        if !extend_props_string.is_empty() {
            script.push_str("  props: {\n    ");
            script.push_str(&extend_props_string);
            script.push_str("\n  },\n");
        }
        if !computed_string.is_empty() {
            script.push_str("  computed: {\n");
            script.push_str(&format!("    {}\n", computed_string));
            script.push_str("  }\n");
        }
        script.push_str("});\n");
        script.push_str(&format!("export default {};", component_var_name));

        let mut final_data = format!("<template>\n{}\n</template>\n", self.template);
        if !css.is_empty() {
            final_data.push_str(&format!("<style scoped>\n{}\n</style>\n", css));
        }
        final_data.push_str(&format!(
            "<script lang=\"ts\">\nimport Vue from \"vue\";\n\n{}\n</script>\n",
            script
        ));

        self.final_data = format_or_keep(formatter, "vue", final_data);
    }

    fn serialize(&self) -> TemplateFiles {
        let mut files = TemplateFiles::new();
        files.insert(
            format!("{}/{}.vue", DIRNAME, self.template_id),
            self.final_data.clone(),
        );
        files
    }
}

fn render_prop_type(id: &str, prop: &Prop) -> String {
    let mut rendered = if prop.ident == IdentStyle::Bare {
        id.to_string()
    } else {
        crate::condition::json_string(id)
    };
    if !prop.required {
        rendered.push('?');
    }
    rendered.push_str(": ");
    match &prop.kind {
        PropKind::Variable => rendered.push_str("Vue.VNode"),
        PropKind::AttributeValue { .. } => rendered.push_str("string"),
        PropKind::AttributeValueOptions { options, .. } => {
            rendered.push_str(&crate::emit::react::option_union(options));
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

    fn output_of(markup: &str, css: &str) -> String {
        let component: TemplateComponent =
            crate::builder::build_component(markup, css, &Reporter::new(false)).unwrap();
        let args = EmitterArgs {
            template_id: "my-widget",
            props: &component.props,
            has_multiple_root_nodes: component.nodes.len() > 1,
        };
        let mut emitter = VueEmitter::new(&args);
        let files = run_emitter(&mut emitter, &component, &NoFormatter);
        files["vue/my-widget.vue"].clone()
    }

    #[test]
    fn static_attributes_stay_plain() {
        let output = output_of("<p class=\"frog\">hello</p>", "");
        assert!(output.contains("<p class=\"frog\">hello</p>"));
        assert!(output.contains("<template>"));
        assert!(output.contains("import Vue from \"vue\";"));
    }

    #[test]
    fn bound_attributes_become_computed_properties() {
        let output = output_of("<a href=\"{{ href }}\">x</a>", "");
        assert!(output.contains("<a :href=\"computedHref\">"));
        assert!(output.contains("computedHref: ({href}: Props): string => (href)"));
        assert!(output.contains("href: Object as () => Props[\"href\"],"));
    }

    #[test]
    fn variables_become_slots() {
        let output = output_of("<m-variable id=\"children\"></m-variable>", "");
        assert!(output.contains("<slot></slot>"));
    }

    #[test]
    fn named_variables_become_named_slots() {
        let output = output_of("<m-variable id=\"title\" optional></m-variable>", "");
        assert!(output.contains("<slot name=\"title\"></slot>"));
    }

    #[test]
    fn conditionals_become_v_if_spans() {
        let output = output_of("<m-if test=\"frog !== 'frush'\"><p>x</p></m-if>", "");
        assert!(output.contains("<span v-if=\"computedFrog\">"));
        assert!(output.contains("computedFrog: ({frog}: Props): boolean => (frog !== 'frush')"));
        assert!(output.contains("</span>"));
    }

    #[test]
    fn parse_errors_render_as_comments_without_a_wrapper() {
        let output = output_of("<m-if test=\"a && b\"><p>x</p></m-if>", "");
        assert!(output.contains("<!-- parse error:"));
        assert!(!output.contains("</span>"));
    }

    #[test]
    fn whole_document_css_lands_in_a_scoped_style_block() {
        let output = output_of("<p class=\"frog\">x</p>", ".frog { color: blue }");
        assert!(output.contains("<style scoped>"));
        assert!(output.contains(".frog{ color: blue }"));
    }

    #[test]
    fn component_name_is_pascal_cased() {
        let output = output_of("<p>x</p>", "");
        assert!(output.contains("const MyWidget = Vue.extend({"));
        assert!(output.contains("export default MyWidget;"));
    }
}
