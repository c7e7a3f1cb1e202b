//! Stylesheet reader.
//!
//! Produces the rule lists the sniffing engine walks: plain style rules keep
//! their selector text and the raw declarations between the braces, `@media`
//! blocks keep their condition and nested style rules. Declarations are never
//! interpreted here; matching and serialization happen downstream.

#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    /// Attributes of the owning `<style>`/`<link>` node, when there is one.
    /// Used by the sniffing engine's stylesheet allow/deny filters.
    pub owner_attributes: Vec<(String, String)>,
    pub rules: Vec<CssRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CssRule {
    Style {
        selector_text: String,
        declarations: String,
    },
    Media {
        condition: String,
        children: Vec<CssRule>,
    },
}

pub fn parse_stylesheet(css: &str) -> Stylesheet {
    Stylesheet {
        owner_attributes: Vec::new(),
        rules: parse_rules(&strip_comments(css)),
    }
}

fn strip_comments(css: &str) -> String {
    let mut output = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(open) = rest.find("/*") {
        output.push_str(&rest[..open]);
        match rest[open + 2..].find("*/") {
            Some(close) => rest = &rest[open + 2 + close + 2..],
            None => return output,
        }
    }
    output.push_str(rest);
    output
}

fn parse_rules(input: &str) -> Vec<CssRule> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut pos = 0;
    let mut rules = Vec::new();

    while pos < len {
        while pos < len && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= len {
            break;
        }

        let open = input[pos..].find('{').map(|rel| pos + rel);
        let semi = input[pos..].find(';').map(|rel| pos + rel);

        // Braceless at-statements (@charset "...";, @import ...;)
        if input[pos..].starts_with('@') {
            match (open, semi) {
                (Some(open_idx), Some(semi_idx)) if semi_idx < open_idx => {
                    pos = semi_idx + 1;
                    continue;
                }
                (None, Some(semi_idx)) => {
                    pos = semi_idx + 1;
                    continue;
                }
                _ => {}
            }
        }

        let open_idx = match open {
            Some(open_idx) => open_idx,
            None => break,
        };
        let selector = input[pos..open_idx].trim().to_string();

        // Matching closing brace for this rule.
        let body_start = open_idx + 1;
        let mut depth = 1usize;
        let mut body_end = len;
        for (i, ch) in input[body_start..].char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        body_end = body_start + i;
                        break;
                    }
                }
                _ => {}
            }
        }
        let body = &input[body_start..body_end];
        pos = (body_end + 1).min(len);

        if selector.is_empty() {
            continue;
        }
        if let Some(condition) = selector.strip_prefix("@media") {
            rules.push(CssRule::Media {
                condition: condition.trim().to_string(),
                children: parse_rules(body),
            });
        } else {
            rules.push(CssRule::Style {
                selector_text: selector,
                declarations: body.to_string(),
            });
        }
    }

    rules
}
