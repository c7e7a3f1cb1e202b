//! Conditional-expression translator.
//!
//! The `test` attribute of a conditional element accepts a deliberately small
//! grammar: a bare identifier, or an identifier compared against a string
//! literal with `==`/`===`/`!=`/`!==` (either operand order). The expression is
//! parsed with oxc and re-rendered once per target dialect; everything outside
//! that grammar becomes a typed parse-error node rather than an exception.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::Expression;
use oxc_parser::Parser;
use oxc_span::SourceType;
use oxc_syntax::operator::BinaryOperator;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Target expression dialects. New dialects are added here, in one place,
/// rather than scattered through the emitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dialect {
    /// Native boolean form with strict operators and single-quoted strings.
    JavaScript,
    /// Identifiers sigil-prefixed with `$` and squashed to identifier-safe
    /// characters; two-character operators; JSON string literals.
    Php,
    /// Identifiers squashed to identifier-safe characters (no sigil);
    /// two-character operators; JSON string literals.
    Django,
}

pub const DIALECTS: [Dialect; 3] = [Dialect::JavaScript, Dialect::Php, Dialect::Django];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConditionTest {
    Parsed {
        ids: Vec<String>,
        expressions: BTreeMap<Dialect, String>,
    },
    ParseError {
        message: String,
    },
}

impl ConditionTest {
    pub fn parse_error(message: impl Into<String>) -> Self {
        ConditionTest::ParseError {
            message: message.into(),
        }
    }

    pub fn expression(&self, dialect: Dialect) -> Option<&str> {
        match self {
            ConditionTest::Parsed { expressions, .. } => {
                expressions.get(&dialect).map(String::as_str)
            }
            ConditionTest::ParseError { .. } => None,
        }
    }
}

const SHAPE_MESSAGE: &str = "test expression must be either (1) a variable, or (2) a variable \
     compared to a string, like `myVar === 'value'` or `myVar !== 'value'`";

enum Operand {
    Ident(String),
    Str(String),
}

fn operand(expression: &Expression) -> Option<Operand> {
    match expression {
        Expression::Identifier(ident) => Some(Operand::Ident(ident.name.to_string())),
        Expression::StringLiteral(literal) => Some(Operand::Str(literal.value.to_string())),
        _ => None,
    }
}

/// Parse a `test` attribute value and translate it for every dialect.
pub fn parse_condition(test: &str) -> ConditionTest {
    let allocator = Allocator::default();
    let source_type = SourceType::default();
    let parsed = Parser::new(&allocator, test, source_type).parse_expression();

    let expression = match parsed {
        Ok(expression) => expression,
        Err(errors) => {
            return ConditionTest::parse_error(format!(
                "invalid expression syntax in test \"{}\": {:?}",
                test, errors
            ))
        }
    };

    match &expression {
        Expression::Identifier(ident) => {
            let name = ident.name.to_string();
            let mut expressions = BTreeMap::new();
            expressions.insert(Dialect::JavaScript, name.clone());
            expressions.insert(Dialect::Php, format!("${}", squash_identifier(&name)));
            expressions.insert(Dialect::Django, squash_identifier(&name));
            ConditionTest::Parsed {
                ids: vec![name],
                expressions,
            }
        }
        Expression::BinaryExpression(binary) => {
            let negated = match binary.operator {
                BinaryOperator::Equality | BinaryOperator::StrictEquality => false,
                BinaryOperator::Inequality | BinaryOperator::StrictInequality => true,
                _ => return ConditionTest::parse_error(SHAPE_MESSAGE),
            };
            let left = operand(&binary.left);
            let right = operand(&binary.right);
            let (left, right) = match (left, right) {
                (Some(left), Some(right)) => (left, right),
                _ => return ConditionTest::parse_error(SHAPE_MESSAGE),
            };
            // Exactly one identifier and one string literal, either order.
            let ids = match (&left, &right) {
                (Operand::Ident(id), Operand::Str(_)) | (Operand::Str(_), Operand::Ident(id)) => {
                    vec![id.clone()]
                }
                _ => return ConditionTest::parse_error(SHAPE_MESSAGE),
            };
            let mut expressions = BTreeMap::new();
            for dialect in DIALECTS {
                expressions.insert(
                    dialect,
                    format!(
                        "{} {} {}",
                        render_operand(&left, dialect),
                        render_operator(negated, dialect),
                        render_operand(&right, dialect)
                    ),
                );
            }
            ConditionTest::Parsed { ids, expressions }
        }
        _ => ConditionTest::parse_error(SHAPE_MESSAGE),
    }
}

fn render_operator(negated: bool, dialect: Dialect) -> &'static str {
    match (dialect, negated) {
        (Dialect::JavaScript, false) => "===",
        (Dialect::JavaScript, true) => "!==",
        (_, false) => "==",
        (_, true) => "!=",
    }
}

fn render_operand(operand: &Operand, dialect: Dialect) -> String {
    match (operand, dialect) {
        (Operand::Ident(name), Dialect::JavaScript) => name.clone(),
        (Operand::Ident(name), Dialect::Php) => format!("${}", squash_identifier(name)),
        (Operand::Ident(name), Dialect::Django) => squash_identifier(name),
        (Operand::Str(value), Dialect::JavaScript) => single_quoted(value),
        (Operand::Str(value), _) => json_string(value),
    }
}

/// Replace anything outside `[a-zA-Z_0-9]` so the identifier survives template
/// languages without quoted lookups.
pub fn squash_identifier(identifier: &str) -> String {
    lazy_static! {
        static ref NON_IDENT_RE: Regex = Regex::new(r"[^a-zA-Z_0-9]").unwrap();
    }
    NON_IDENT_RE.replace_all(identifier, "_").to_string()
}

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}
