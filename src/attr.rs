//! Attribute-value tokenizer.
//!
//! Scans `{{ ... }}` regions out of a raw attribute value string. Text outside
//! the braces becomes constant segments; each braced region is one variable
//! expression: `name '?'? (':' option ('|' option)*)?` where an option is
//! `literal (' as ' friendlyName)?`. A trailing `?` marks the variable
//! optional. A `{{` without a matching `}}` is reported and tokenization stops
//! with the partial result.

use crate::error::{Reporter, Result};
use crate::ir::{AttributeValue, AttributeValues};

const START: &str = "{{";
const END: &str = "}}";
const OPTIONS_SEPARATOR: char = ':';
const OPTION_DELIMITER: char = '|';
const OPTIONAL_MARKER: char = '?';
const FRIENDLY_NAME_SEPARATOR: &str = " as ";

pub fn parse_attribute_value(raw: &str, reporter: &Reporter) -> Result<AttributeValues> {
    let mut segments = Vec::new();
    let mut remaining = raw;

    while !remaining.is_empty() {
        match remaining.find(START) {
            None => {
                segments.push(AttributeValue::Constant {
                    value: remaining.to_string(),
                });
                remaining = "";
            }
            Some(0) => match remaining.find(END) {
                None => {
                    reporter.report(format!("attribute value with {} but no {}", START, END))?;
                    return Ok(segments);
                }
                Some(end_index) => {
                    segments.push(parse_variable_expression(&remaining[START.len()..end_index]));
                    remaining = &remaining[end_index + END.len()..];
                }
            },
            Some(start_index) => {
                segments.push(AttributeValue::Constant {
                    value: remaining[..start_index].to_string(),
                });
                remaining = &remaining[start_index..];
            }
        }
    }

    Ok(segments)
}

fn parse_variable_expression(expression: &str) -> AttributeValue {
    let (key_part, options_part) = match expression.find(OPTIONS_SEPARATOR) {
        None => (expression, None),
        Some(index) => (
            &expression[..index],
            Some(&expression[index + OPTIONS_SEPARATOR.len_utf8()..]),
        ),
    };

    let mut key = key_part.trim();
    let optional = key.ends_with(OPTIONAL_MARKER);
    if optional {
        key = &key[..key.len() - OPTIONAL_MARKER.len_utf8()];
    }

    let options_part = match options_part {
        None => {
            return AttributeValue::Variable {
                id: key.to_string(),
                required: !optional,
            }
        }
        Some(options_part) => options_part,
    };

    let mut options: Vec<(String, String)> = Vec::new();
    for option in options_part.split(OPTION_DELIMITER) {
        // Each option is either " literal " or " literal as friendlyName ".
        let parts: Vec<&str> = option.split(FRIENDLY_NAME_SEPARATOR).collect();
        let literal = parts[0].trim();
        let name = if parts.len() == 2 {
            parts[1].trim()
        } else {
            literal
        };
        if name.is_empty() {
            continue;
        }
        match options.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, value)) => *value = literal.to_string(),
            None => options.push((name.to_string(), literal.to_string())),
        }
    }

    AttributeValue::VariableOptions {
        id: key.to_string(),
        required: !optional,
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient() -> Reporter {
        Reporter::new(false)
    }

    #[test]
    fn plain_text_is_one_constant() {
        let values = parse_attribute_value("btn primary", &lenient()).unwrap();
        assert_eq!(
            values,
            vec![AttributeValue::Constant {
                value: "btn primary".to_string()
            }]
        );
    }

    #[test]
    fn bare_variable() {
        let values = parse_attribute_value("{{ href }}", &lenient()).unwrap();
        assert_eq!(
            values,
            vec![AttributeValue::Variable {
                id: "href".to_string(),
                required: true
            }]
        );
    }

    #[test]
    fn optional_variable() {
        let values = parse_attribute_value("{{ href? }}", &lenient()).unwrap();
        assert_eq!(
            values,
            vec![AttributeValue::Variable {
                id: "href".to_string(),
                required: false
            }]
        );
    }

    #[test]
    fn mixed_constant_and_variable_segments() {
        let values = parse_attribute_value("btn {{ kind }} end", &lenient()).unwrap();
        assert_eq!(
            values,
            vec![
                AttributeValue::Constant {
                    value: "btn ".to_string()
                },
                AttributeValue::Variable {
                    id: "kind".to_string(),
                    required: true
                },
                AttributeValue::Constant {
                    value: " end".to_string()
                },
            ]
        );
    }

    #[test]
    fn enumerated_options_use_literal_as_name() {
        let values = parse_attribute_value("{{ kind: btn-primary | btn-secondary }}", &lenient())
            .unwrap();
        assert_eq!(
            values,
            vec![AttributeValue::VariableOptions {
                id: "kind".to_string(),
                required: true,
                options: vec![
                    ("btn-primary".to_string(), "btn-primary".to_string()),
                    ("btn-secondary".to_string(), "btn-secondary".to_string()),
                ],
            }]
        );
    }

    #[test]
    fn friendly_names_become_the_storage_key() {
        let values = parse_attribute_value(
            "{{ kind: btn-primary as primary | btn-secondary as secondary }}",
            &lenient(),
        )
        .unwrap();
        assert_eq!(
            values,
            vec![AttributeValue::VariableOptions {
                id: "kind".to_string(),
                required: true,
                options: vec![
                    ("primary".to_string(), "btn-primary".to_string()),
                    ("secondary".to_string(), "btn-secondary".to_string()),
                ],
            }]
        );
    }

    #[test]
    fn empty_option_names_are_dropped() {
        let values = parse_attribute_value("{{ kind: one | | two }}", &lenient()).unwrap();
        assert_eq!(
            values,
            vec![AttributeValue::VariableOptions {
                id: "kind".to_string(),
                required: true,
                options: vec![
                    ("one".to_string(), "one".to_string()),
                    ("two".to_string(), "two".to_string()),
                ],
            }]
        );
    }

    #[test]
    fn optional_enumerated_variable() {
        let values = parse_attribute_value("{{ kind?: a | b }}", &lenient()).unwrap();
        match &values[0] {
            AttributeValue::VariableOptions { id, required, .. } => {
                assert_eq!(id, "kind");
                assert!(!required);
            }
            other => panic!("unexpected segment {:?}", other),
        }
    }

    #[test]
    fn unterminated_variable_returns_partial_result() {
        let values = parse_attribute_value("before {{ href", &lenient()).unwrap();
        assert_eq!(
            values,
            vec![AttributeValue::Constant {
                value: "before ".to_string()
            }]
        );
    }

    #[test]
    fn unterminated_variable_halts_in_strict_mode() {
        let strict = Reporter::new(true);
        assert!(parse_attribute_value("{{ href", &strict).is_err());
    }
}
