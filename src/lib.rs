//! # retemplate
//!
//! A retargetable template compiler: one HTML source annotated with a small
//! variable/conditional DSL, plus an associated stylesheet, compiled into
//! equivalent template/component source files for roughly ten output formats.
//!
//! ## Pipeline
//!
//! 1. **Pre-parse** (`preparse`): insertion-mode-sensitive tags are aliased
//!    around the HTML5 parser and restored afterwards.
//! 2. **Tokenize** (`attr`): `{{ ... }}` regions in attribute values become
//!    constant/variable/enumerated segments.
//! 3. **Translate** (`condition`): conditional `test` expressions are parsed
//!    and re-rendered once per target dialect.
//! 4. **Match** (`css`, `sniff`): stylesheet rules are matched per element
//!    with graceful handling of vendor/unparseable selectors; merge and diff
//!    over the matched tree drive per-enum-option CSS attribution.
//! 5. **Build** (`builder`, `ir`): the intermediate tree, with per-element CSS
//!    properties and the tree-shaken whole-document stylesheet.
//! 6. **Infer** (`props`): the typed prop contract.
//! 7. **Emit** (`emit`): one walker pass per backend over a shared visitor
//!    contract; each backend serializes its own files.
//!
//! A compile invocation is a pure function of its two input strings: probing
//! uses disposable element snapshots, never the parsed tree, and all output
//! containers iterate deterministically.

pub mod attr;
pub mod builder;
pub mod compile;
pub mod condition;
pub mod css;
pub mod emit;
pub mod error;
pub mod ir;
pub mod preparse;
pub mod props;
pub mod sniff;

pub use compile::{compile, compile_with_formatter, CompileOutput};
pub use condition::{ConditionTest, Dialect};
pub use emit::{Emitter, NoFormatter, SourceFormatter, TemplateFiles};
pub use error::{CompileError, Reporter, Result};
pub use ir::{
    AttributeValue, CommentNode, ConditionalNode, CssProperty, ElementNode, TemplateComponent,
    TemplateNode, TextNode, VariableNode,
};
pub use props::{IdentStyle, Prop, PropKind, Props};

#[cfg(test)]
mod compile_tests;
