//! Style-only backend: serializes the whole-document tree-shaken CSS.

use crate::emit::{format_or_keep, Emitter, EmitterArgs, SourceFormatter, TemplateFiles};
use crate::ir::{CommentNode, ConditionalNode, ElementNode, TextNode, VariableNode};

const DIRNAME: &str = "css";

pub struct StylesheetEmitter {
    template_id: String,
    css: String,
}

impl StylesheetEmitter {
    pub fn new(args: &EmitterArgs) -> Self {
        StylesheetEmitter {
            template_id: args.template_id.to_string(),
            css: String::new(),
        }
    }
}

impl Emitter for StylesheetEmitter {
    fn on_element(&mut self, element: &ElementNode) -> String {
        element.name.clone()
    }

    fn on_close_element(&mut self, _tag: &str, _element: &ElementNode) {}

    fn on_text(&mut self, _text: &TextNode) {}

    fn on_comment(&mut self, _comment: &CommentNode) {}

    fn on_variable(&mut self, _variable: &VariableNode) -> bool {
        false
    }

    fn on_close_variable(&mut self, _variable: &VariableNode) {}

    fn on_conditional(&mut self, _conditional: &ConditionalNode) {}

    fn on_close_conditional(&mut self, _conditional: &ConditionalNode) {}

    fn on_finalise(&mut self, css: &str, formatter: &dyn SourceFormatter) {
        self.css = format_or_keep(formatter, "css", css.to_string());
    }

    fn serialize(&self) -> TemplateFiles {
        let mut files = TemplateFiles::new();
        files.insert(
            format!("{}/{}.css", DIRNAME, self.template_id),
            self.css.clone(),
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

    #[test]
    fn serializes_the_tree_shaken_css() {
        let component: TemplateComponent = crate::builder::build_component(
            "<p>hello</p>",
            "p { color: red } .treeShake { background: blue }",
            &Reporter::new(false),
        )
        .unwrap();
        let args = EmitterArgs {
            template_id: "widget",
            props: &component.props,
            has_multiple_root_nodes: false,
        };
        let mut emitter = StylesheetEmitter::new(&args);
        let files = run_emitter(&mut emitter, &component, &NoFormatter);
        let css = &files["css/widget.css"];
        assert!(css.contains("color: red"));
        assert!(!css.contains("treeShake"));
    }
}
