//! HTML pre-parse: insertion-mode aliasing and DSL-aware fixups.
//!
//! Tags like `<select>` and `<tbody>` trigger HTML5 insertion modes that
//! silently relocate the DSL's custom child elements. Before parsing, those
//! tag names are rewritten to a neutral alias element carrying the original
//! name in a side attribute; after parsing, each alias is replaced in place by
//! a fresh element of the recorded name. Finally, children parsed into
//! variable elements are relocated to be their following siblings.

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, LocalName};
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};
use regex::Regex;

use crate::error::{CompileError, Reporter, Result};

pub const ALIAS_TAG: &str = "m-alias";
pub const ALIAS_ATTR: &str = "data-original-element-name";

/// Tag names whose HTML5 insertion modes rearrange unknown children.
pub const PARSING_MODE_TAGS: [&str; 8] = [
    "table", "thead", "tbody", "tfoot", "tr", "caption", "select", "option",
];

/// The DSL's variable element, plus its legacy spelling.
pub const VARIABLE_TAGS: [&str; 2] = ["m-variable", "mt-variable"];

/// The DSL's conditional element, plus its legacy spelling.
pub const CONDITIONAL_TAGS: [&str; 2] = ["m-if", "mt-if"];

/// Parse the annotated markup into an `RcDom`, aliasing insertion-mode tags
/// around the HTML5 parser and restoring them afterwards.
pub fn parse_dsl_document(markup: &str, reporter: &Reporter) -> Result<RcDom> {
    let wrapped = format!("<body>{}</body>", alias_parsing_mode_elements(markup));
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut wrapped.as_bytes())
        .map_err(|e| CompileError::Parse(format!("{}", e)))?;

    restore_parsing_mode_elements(&dom, reporter)?;
    relocate_variable_children(&dom);
    Ok(dom)
}

/// The parsed body's child nodes, which are the template's root nodes.
pub fn body_children(dom: &RcDom) -> Vec<Handle> {
    fn find_body(handle: &Handle) -> Option<Handle> {
        if let NodeData::Element { name, .. } = &handle.data {
            if name.local.as_ref() == "body" {
                return Some(handle.clone());
            }
        }
        for child in handle.children.borrow().iter() {
            if let Some(found) = find_body(child) {
                return Some(found);
            }
        }
        None
    }
    find_body(&dom.document)
        .map(|body| body.children.borrow().clone())
        .unwrap_or_default()
}

/// Rewrite `<tag` / `</tag` for insertion-mode tags into the alias element.
/// Tag names are matched immediately after `<` or `</`, tolerant of trailing
/// whitespace or a newline before `>`.
pub fn alias_parsing_mode_elements(markup: &str) -> String {
    lazy_static! {
        static ref TAG_RE: Regex = Regex::new(r"<(/?)([^\n >]+)").unwrap();
    }
    TAG_RE
        .replace_all(markup, |caps: &regex::Captures| {
            let closing = &caps[1];
            let tag_name = &caps[2];
            if PARSING_MODE_TAGS.contains(&tag_name) {
                if closing.is_empty() {
                    format!("<{} {}=\"{}\" ", ALIAS_TAG, ALIAS_ATTR, tag_name)
                } else {
                    format!("</{}", ALIAS_TAG)
                }
            } else {
                format!("<{}{}", closing, tag_name)
            }
        })
        .to_string()
}

fn element_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

fn collect_elements(handle: &Handle, tag: &str, out: &mut Vec<Handle>) {
    if element_name(handle).as_deref() == Some(tag) {
        out.push(handle.clone());
    }
    for child in handle.children.borrow().iter() {
        collect_elements(child, tag, out);
    }
}

fn parent_of(handle: &Handle) -> Option<Handle> {
    let weak = handle.parent.take();
    let parent = weak.as_ref().and_then(|weak| weak.upgrade());
    handle.parent.set(weak);
    parent
}

/// Replace every alias element with a fresh element of the recorded name,
/// carrying over children and the remaining attributes.
fn restore_parsing_mode_elements(dom: &RcDom, reporter: &Reporter) -> Result<()> {
    let mut aliases = Vec::new();
    collect_elements(&dom.document, ALIAS_TAG, &mut aliases);

    for alias in aliases {
        let (alias_name, attrs) = match &alias.data {
            NodeData::Element { name, attrs, .. } => (name, attrs),
            _ => continue,
        };
        // DOMs may change attribute casing, so compare case-insensitively.
        let original_name = attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.as_ref().eq_ignore_ascii_case(ALIAS_ATTR))
            .map(|attr| attr.value.to_string());
        let original_name = match original_name {
            Some(name) => name,
            None => {
                reporter.report(format!("{} missing {} attribute", ALIAS_TAG, ALIAS_ATTR))?;
                continue;
            }
        };
        let parent = match parent_of(&alias) {
            Some(parent) => parent,
            None => {
                reporter.report("parsing mode element must not be top-level")?;
                continue;
            }
        };

        let kept_attrs: Vec<_> = attrs
            .borrow()
            .iter()
            .filter(|attr| !attr.name.local.as_ref().eq_ignore_ascii_case(ALIAS_ATTR))
            .cloned()
            .collect();
        // Keep the alias's namespace, swap in the recorded local name.
        let mut restored_name = alias_name.clone();
        restored_name.local = LocalName::from(original_name.as_str());
        let replacement = Node::new(NodeData::Element {
            name: restored_name,
            attrs: RefCell::new(kept_attrs),
            template_contents: RefCell::new(None),
            mathml_annotation_xml_integration_point: false,
        });

        let children: Vec<Handle> = alias.children.borrow_mut().drain(..).collect();
        for child in &children {
            child.parent.set(Some(Rc::downgrade(&replacement)));
        }
        replacement.children.borrow_mut().extend(children);
        replacement.parent.set(Some(Rc::downgrade(&parent)));

        let mut parent_children = parent.children.borrow_mut();
        match parent_children
            .iter()
            .position(|child| Rc::ptr_eq(child, &alias))
        {
            Some(index) => parent_children[index] = replacement,
            None => {
                drop(parent_children);
                reporter.report("parsing mode element lost its place in the tree")?;
                continue;
            }
        }
        alias.parent.set(None);
    }
    Ok(())
}

/// Move the parsed children of every variable element out, as siblings
/// directly following it, preserving order. Authors usually leave the
/// variable tag unclosed, which makes the HTML5 parser swallow following
/// content as children.
fn relocate_variable_children(dom: &RcDom) {
    for tag in VARIABLE_TAGS {
        let mut variables = Vec::new();
        collect_elements(&dom.document, tag, &mut variables);
        for variable in variables {
            let children: Vec<Handle> = variable.children.borrow_mut().drain(..).collect();
            if children.is_empty() {
                continue;
            }
            let parent = match parent_of(&variable) {
                Some(parent) => parent,
                None => continue,
            };
            for child in &children {
                child.parent.set(Some(Rc::downgrade(&parent)));
            }
            let mut parent_children = parent.children.borrow_mut();
            if let Some(index) = parent_children
                .iter()
                .position(|child| Rc::ptr_eq(child, &variable))
            {
                for (offset, child) in children.into_iter().enumerate() {
                    parent_children.insert(index + 1 + offset, child);
                }
            }
        }
    }
}
