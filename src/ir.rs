//! Intermediate tree produced by the front-end and consumed by every emitter.
//!
//! The tree is immutable once built: parents own their children, and a compile
//! invocation constructs it exactly once from the two input strings.

use serde::{Deserialize, Serialize};

use crate::condition::ConditionTest;
use crate::props::Props;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TemplateNode {
    Element(ElementNode),
    Text(TextNode),
    Comment(CommentNode),
    Variable(VariableNode),
    Conditional(ConditionalNode),
}

/// Ordered segments of one attribute value. Mixed constant/variable strings
/// keep their document order.
pub type AttributeValues = Vec<AttributeValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AttributeValue {
    Constant {
        value: String,
    },
    Variable {
        id: String,
        required: bool,
    },
    VariableOptions {
        id: String,
        required: bool,
        /// Ordered option name -> rendered literal. The name is the friendly
        /// name when ` as ` was used, otherwise the literal itself.
        options: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CssProperty {
    /// Declarations that always apply to the owning element.
    Constant { css: String },
    /// Declarations that apply when the prop `id` equals one of the option
    /// names. Ordered option name -> declarations text.
    Conditional {
        id: String,
        condition: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub name: String,
    /// Attribute order is document order.
    pub attributes: Vec<(String, AttributeValues)>,
    pub children: Vec<TemplateNode>,
    pub css_properties: Vec<CssProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableNode {
    pub id: String,
    pub optional: bool,
    /// Default content rendered when the caller does not supply the prop.
    pub children: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalNode {
    pub optional: bool,
    pub test: ConditionTest,
    pub children: Vec<TemplateNode>,
}

/// The fully analysed component: node tree, inferred prop contract, and the
/// tree-shaken whole-document stylesheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateComponent {
    pub nodes: Vec<TemplateNode>,
    pub props: Props,
    pub css_string: String,
}

impl ElementNode {
    pub fn attribute(&self, name: &str) -> Option<&AttributeValues> {
        self.attributes
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, values)| values)
    }
}
