//! Vue JSX backend: a functional Vue component with a JSX render function.

use crate::emit::jsx::JsxRenderer;
use crate::emit::react::option_union;
use crate::emit::{format_or_keep, Emitter, EmitterArgs, SourceFormatter, TemplateFiles};
use crate::ir::{CommentNode, ConditionalNode, ElementNode, TextNode, VariableNode};
use crate::props::{IdentStyle, Prop, PropKind, Props};

const DIRNAME: &str = "vue-jsx";

pub struct VueJsxEmitter {
    template_id: String,
    props: Props,
    has_multiple_root_nodes: bool,
    renderer: JsxRenderer,
    file_data: String,
}

impl VueJsxEmitter {
    pub fn new(args: &EmitterArgs) -> Self {
        let props = args.props.clone();
        VueJsxEmitter {
            template_id: args.template_id.to_string(),
            has_multiple_root_nodes: args.has_multiple_root_nodes,
            renderer: JsxRenderer::new(
                props.clone(),
                "Fragment",
                "Fragment",
                attribute_name_transform,
            ),
            props,
            file_data: String::new(),
        }
    }
}

impl Emitter for VueJsxEmitter {
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
        let render_string = format!(
            "{}{}{}",
            if self.has_multiple_root_nodes {
                "<Fragment>"
            } else {
                ""
            },
            self.renderer.render,
            if self.has_multiple_root_nodes {
                "</Fragment>"
            } else {
                ""
            }
        );

        let mut file_data = if render_string.contains("<Fragment>") {
            "// Vue3 Fragment component\nimport Vue, { Fragment } from 'vue';".to_string()
        } else {
            "import Vue from 'vue';".to_string()
        };

        let props_string = format!(
            "props: {{\n    {}\n  }},",
            self.props
                .iter()
                .map(|(id, prop)| render_prop_type(id, prop))
                .collect::<Vec<_>>()
                .join(",\n    ")
        );
        let spread_const_props = format!(
            "const {{ {} }} = props;",
            self.props
                .iter()
                .filter(|(_, prop)| prop.ident == IdentStyle::Bare)
                .map(|(id, _)| id)
                .collect::<Vec<_>>()
                .join(", ")
        );

        file_data.push_str(&format!(
            "\n\nexport default Vue.component({}, {{\n  functional: true,\n  {}\n  render: function(h, context) {{\n    const {{ props }} = context;\n    {}\n    return ({})\n }}}})",
            crate::condition::json_string(&self.template_id),
            props_string,
            spread_const_props,
            render_string
        ));

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
    attribute_name.starts_with("on") && attribute_name.len() > 2
}

/// Vue JSX keeps HTML attribute names except for event handlers, which use
/// the camel-cased `onClick` convention.
fn attribute_name_transform(attribute_name: &str) -> String {
    if is_event_attribute(attribute_name) {
        let mut chars = attribute_name[2..].chars();
        match chars.next() {
            Some(first) => format!("on{}{}", first.to_uppercase(), chars.as_str()),
            None => attribute_name.to_string(),
        }
    } else {
        attribute_name.to_string()
    }
}

fn render_prop_type(id: &str, prop: &Prop) -> String {
    let mut rendered = if prop.ident == IdentStyle::Bare {
        id.to_string()
    } else {
        format!("\"{}\"", id)
    };
    rendered.push_str(": ");
    match &prop.kind {
        PropKind::Variable => rendered.push_str("Object as () => Vue.VNode"),
        PropKind::AttributeValue { attribute_name, .. } => {
            if is_event_attribute(attribute_name) {
                rendered.push_str("Function as (e: Event) => Function");
            } else {
                rendered.push_str("String as () => string");
            }
        }
        PropKind::AttributeValueOptions { options, .. } => {
            rendered.push_str(&format!("Object as () => {}", option_union(options)));
        }
    }
    if !prop.required {
        rendered.push_str(" | undefined");
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
            template_id: "widget",
            props: &component.props,
            has_multiple_root_nodes: component.nodes.len() > 1,
        };
        let mut emitter = VueJsxEmitter::new(&args);
        let files = run_emitter(&mut emitter, &component, &NoFormatter);
        files["vue-jsx/widget.ts"].clone()
    }

    #[test]
    fn renders_a_functional_component() {
        let output = output_of("<p>hello</p>", "");
        assert!(output.contains("export default Vue.component(\"widget\", {"));
        assert!(output.contains("functional: true,"));
        assert!(output.contains("render: function(h, context) {"));
        assert!(output.contains("import Vue from 'vue';"));
        assert!(!output.contains("Fragment"));
    }

    #[test]
    fn fragments_use_the_vue_fragment_import() {
        let output = output_of("<p>a</p><p>b</p>", "");
        assert!(output.contains("import Vue, { Fragment } from 'vue';"));
        assert!(output.contains("return (<Fragment>"));
    }

    #[test]
    fn event_attributes_are_camel_cased_function_props() {
        let output = output_of("<button onclick=\"{{ press }}\">x</button>", "");
        assert!(output.contains("onClick={press}"));
        assert!(output.contains("press: Function as (e: Event) => Function"));
    }

    #[test]
    fn variable_props_are_vnode_factories() {
        let output = output_of("<m-variable id=\"children\" optional></m-variable>", "");
        assert!(output.contains("children: Object as () => Vue.VNode | undefined"));
    }

    #[test]
    fn conditionals_use_the_plain_fragment_wrapper() {
        let output = output_of("<m-if test=\"frog\"><p>x</p></m-if>", "");
        assert!(output.contains("{frog && (<Fragment>"));
        assert!(output.contains("</Fragment>)}"));
    }
}
