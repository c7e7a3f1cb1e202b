//! Emission framework.
//!
//! One walker drives every backend emitter through the same event contract,
//! in document order, exactly once per backend. Backends are independent
//! implementations of [`Emitter`]; shared rendering logic lives in free
//! functions and composable helpers, not in a class hierarchy.

use std::collections::BTreeMap;

use crate::ir::{TemplateComponent, TemplateNode};
use crate::props::Props;

mod angular;
mod django;
mod ember;
mod jsx;
mod markup;
mod mustache;
mod react;
mod react_styled;
mod stylesheet;
mod vue;
mod vue_jsx;

pub use angular::AngularEmitter;
pub use django::DjangoEmitter;
pub use ember::EmberEmitter;
pub use markup::MarkupEmitter;
pub use mustache::MustacheEmitter;
pub use react::ReactEmitter;
pub use react_styled::ReactStyledEmitter;
pub use stylesheet::StylesheetEmitter;
pub use vue::VueEmitter;
pub use vue_jsx::VueJsxEmitter;

/// Relative output path -> file contents. Backends use disjoint directory
/// names, so merged maps never collide.
pub type TemplateFiles = BTreeMap<String, String>;

/// Construction arguments shared by every backend.
pub struct EmitterArgs<'a> {
    pub template_id: &'a str,
    pub props: &'a Props,
    pub has_multiple_root_nodes: bool,
}

/// An optional external pretty-printer, one dialect name per output grammar.
/// Formatting failure is never fatal; emitters fall back to unformatted text.
pub trait SourceFormatter {
    fn format(&self, dialect: &str, source: &str) -> std::result::Result<String, String>;
}

/// The default formatter: passes sources through untouched.
pub struct NoFormatter;

impl SourceFormatter for NoFormatter {
    fn format(&self, _dialect: &str, source: &str) -> std::result::Result<String, String> {
        Ok(source.to_string())
    }
}

/// Format `source`, tolerating formatter failure.
pub(crate) fn format_or_keep(formatter: &dyn SourceFormatter, dialect: &str, source: String) -> String {
    match formatter.format(dialect, &source) {
        Ok(formatted) => formatted,
        Err(_) => source,
    }
}

/// The shared event contract every backend implements.
pub trait Emitter {
    /// Open an element. Returns the rendered tag identifier that will be
    /// handed back to [`Emitter::on_close_element`].
    fn on_element(&mut self, element: &crate::ir::ElementNode) -> String;

    /// Close an element. Only called when the element has children.
    fn on_close_element(&mut self, tag: &str, element: &crate::ir::ElementNode);

    fn on_text(&mut self, text: &crate::ir::TextNode);

    fn on_comment(&mut self, comment: &crate::ir::CommentNode);

    /// Open a variable. Returning `true` suppresses rendering of the default
    /// children.
    fn on_variable(&mut self, variable: &crate::ir::VariableNode) -> bool;

    fn on_close_variable(&mut self, variable: &crate::ir::VariableNode);

    fn on_conditional(&mut self, conditional: &crate::ir::ConditionalNode);

    fn on_close_conditional(&mut self, conditional: &crate::ir::ConditionalNode);

    /// Last event of the pass, carrying the whole-document CSS.
    fn on_finalise(&mut self, css: &str, formatter: &dyn SourceFormatter);

    fn serialize(&self) -> TemplateFiles;
}

/// Drive one emitter over the full tree in document order.
pub fn run_emitter(
    emitter: &mut dyn Emitter,
    component: &TemplateComponent,
    formatter: &dyn SourceFormatter,
) -> TemplateFiles {
    fn walk(emitter: &mut dyn Emitter, node: &TemplateNode) {
        match node {
            TemplateNode::Element(element) => {
                let tag = emitter.on_element(element);
                if !element.children.is_empty() {
                    for child in &element.children {
                        walk(emitter, child);
                    }
                    emitter.on_close_element(&tag, element);
                }
            }
            TemplateNode::Text(text) => emitter.on_text(text),
            TemplateNode::Comment(comment) => emitter.on_comment(comment),
            TemplateNode::Variable(variable) => {
                let suppress_children = emitter.on_variable(variable);
                if !suppress_children {
                    for child in &variable.children {
                        walk(emitter, child);
                    }
                }
                emitter.on_close_variable(variable);
            }
            TemplateNode::Conditional(conditional) => {
                emitter.on_conditional(conditional);
                for child in &conditional.children {
                    walk(emitter, child);
                }
                emitter.on_close_conditional(conditional);
            }
        }
    }

    for node in &component.nodes {
        walk(emitter, node);
    }
    emitter.on_finalise(&component.css_string, formatter);
    emitter.serialize()
}

/// Run every configured backend and merge their outputs.
pub fn emit_all(
    component: &TemplateComponent,
    template_id: &str,
    formatter: &dyn SourceFormatter,
) -> TemplateFiles {
    let args = EmitterArgs {
        template_id,
        props: &component.props,
        has_multiple_root_nodes: component.nodes.len() > 1,
    };

    let mut emitters: Vec<Box<dyn Emitter>> = vec![
        Box::new(MarkupEmitter::new(&args)),
        Box::new(StylesheetEmitter::new(&args)),
        Box::new(ReactEmitter::new(&args)),
        Box::new(ReactStyledEmitter::new(&args)),
        Box::new(VueEmitter::new(&args)),
        Box::new(VueJsxEmitter::new(&args)),
        Box::new(AngularEmitter::new(&args)),
        Box::new(EmberEmitter::new(&args)),
        Box::new(MustacheEmitter::new(&args)),
        Box::new(DjangoEmitter::new(&args)),
    ];

    let mut files = TemplateFiles::new();
    for emitter in &mut emitters {
        files.extend(run_emitter(emitter.as_mut(), component, formatter));
    }
    files
}

/// PascalCase a template id for use as a component/class name.
pub(crate) fn pascal_case(source: &str) -> String {
    let mut result = String::new();
    let mut upper_next = true;
    for ch in source.chars() {
        if ch.is_ascii_alphanumeric() {
            if upper_next {
                result.extend(ch.to_uppercase());
                upper_next = false;
            } else {
                result.push(ch);
            }
        } else {
            upper_next = true;
        }
    }
    result
}

/// Render ordered pairs as a JavaScript object literal, preserving order.
pub(crate) fn json_object(pairs: &[(String, String)]) -> String {
    let rendered: Vec<String> = pairs
        .iter()
        .map(|(name, value)| {
            format!(
                "{}:{}",
                crate::condition::json_string(name),
                crate::condition::json_string(value)
            )
        })
        .collect();
    format!("{{{}}}", rendered.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_handles_separators_and_camel_humps() {
        assert_eq!(pascal_case("my-template"), "MyTemplate");
        assert_eq!(pascal_case("my template"), "MyTemplate");
        assert_eq!(pascal_case("simple"), "Simple");
        assert_eq!(pascal_case("myTemplate"), "MyTemplate");
    }

    #[test]
    fn json_object_preserves_order() {
        let pairs = vec![
            ("z".to_string(), "1".to_string()),
            ("a".to_string(), "2".to_string()),
        ];
        assert_eq!(json_object(&pairs), "{\"z\":\"1\",\"a\":\"2\"}");
    }
}
