//! CSS rule-matching engine.
//!
//! Given an element snapshot and a set of stylesheets, collects the rules
//! whose selectors could plausibly match that element. Selectors are
//! normalized before matching: hierarchical context and pseudo-classes are
//! treated as "could match", because the element is probed in isolation.
//!
//! Probing never touches the parsed template tree. Each probe renders a
//! disposable one-element document and matches selectors there, so repeated
//! probes with different attribute values are pure functions of the snapshot.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::css::{CssRule, Stylesheet};
use crate::error::{Reporter, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// MATCHED-RULE TREE
// ═══════════════════════════════════════════════════════════════════════════════

/// Rule index -> match, for one stylesheet.
pub type SheetMatches = BTreeMap<usize, RuleMatch>;

/// Stylesheet index -> per-sheet matches. BTreeMap keying keeps iteration
/// (and therefore serialized output) deterministic.
pub type MatchedCss = BTreeMap<usize, SheetMatches>;

#[derive(Debug, Clone, PartialEq)]
pub enum RuleMatch {
    Style {
        selectors: Vec<String>,
        declarations: String,
    },
    Media {
        before: String,
        children: SheetMatches,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROBE ELEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// A transient snapshot of one element: tag name plus attribute values as they
/// should be seen by the matcher. Built fresh for every probe pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl ProbeElement {
    pub fn new(name: impl Into<String>) -> Self {
        ProbeElement {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: String) {
        match self
            .attributes
            .iter_mut()
            .find(|(attr_name, _)| attr_name == name)
        {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    fn to_markup(&self) -> String {
        let mut markup = String::new();
        markup.push('<');
        markup.push_str(&self.name);
        for (name, value) in &self.attributes {
            markup.push(' ');
            markup.push_str(name);
            markup.push_str("=\"");
            markup.push_str(&escape_attribute(value));
            markup.push('"');
        }
        markup.push('>');
        markup.push_str("</");
        markup.push_str(&self.name);
        markup.push('>');
        markup
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Parse the probe into a throwaway document. Tags that HTML5 insertion modes
/// would relocate out of `<body>` get a minimal wrapper context first.
fn probe_document(probe: &ProbeElement) -> Html {
    let markup = probe.to_markup();
    let wrapped = match probe.name.as_str() {
        "tr" | "thead" | "tbody" | "tfoot" | "caption" | "col" | "colgroup" => {
            format!("<table>{}</table>", markup)
        }
        "td" | "th" => format!("<table><tr>{}</tr></table>", markup),
        "option" | "optgroup" => format!("<select>{}</select>", markup),
        _ => markup,
    };
    Html::parse_document(&wrapped)
}

fn find_probe_element<'a>(document: &'a Html, tag: &str) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == tag)
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILTER OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Substring filters for one list (allow or deny). Empty lists are inactive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SniffFilter {
    /// Matched against the JSON of the stylesheet's owner-node attributes.
    pub stylesheet: Vec<String>,
    /// Matched against `@media` condition text.
    pub media: Vec<String>,
    /// Matched against rule selector text.
    pub rule: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SniffOptions {
    pub whitelist: SniffFilter,
    pub blacklist: SniffFilter,
}

fn sheet_is_allowed(sheet: &Stylesheet, options: &SniffOptions) -> bool {
    if sheet.owner_attributes.is_empty() {
        return true;
    }
    let attributes_json = owner_attributes_json(sheet);
    let whitelisted = options.whitelist.stylesheet.is_empty()
        || options
            .whitelist
            .stylesheet
            .iter()
            .any(|needle| attributes_json.contains(needle.as_str()));
    let blacklisted = options
        .blacklist
        .stylesheet
        .iter()
        .any(|needle| attributes_json.contains(needle.as_str()));
    whitelisted && !blacklisted
}

fn owner_attributes_json(sheet: &Stylesheet) -> String {
    let pairs: Vec<String> = sheet
        .owner_attributes
        .iter()
        .map(|(name, value)| {
            format!(
                "{}:{}",
                crate::condition::json_string(name),
                crate::condition::json_string(value)
            )
        })
        .collect();
    format!("{{{}}}", pairs.join(","))
}

fn media_is_allowed(condition: &str, options: &SniffOptions) -> bool {
    if condition.is_empty() {
        return false;
    }
    let whitelisted = options.whitelist.media.is_empty()
        || options
            .whitelist
            .media
            .iter()
            .any(|needle| condition.contains(needle.as_str()));
    let blacklisted = options
        .blacklist
        .media
        .iter()
        .any(|needle| condition.contains(needle.as_str()));
    whitelisted && !blacklisted
}

fn rule_is_allowed(selector_text: &str, options: &SniffOptions) -> bool {
    if selector_text.is_empty() {
        return false;
    }
    let whitelisted = options.whitelist.rule.is_empty()
        || options
            .whitelist
            .rule
            .iter()
            .any(|needle| selector_text.contains(needle.as_str()));
    let blacklisted = options
        .blacklist
        .rule
        .iter()
        .any(|needle| selector_text.contains(needle.as_str()));
    whitelisted && !blacklisted
}

// ═══════════════════════════════════════════════════════════════════════════════
// MATCHING
// ═══════════════════════════════════════════════════════════════════════════════

/// Match every allowed rule of every allowed stylesheet against the probe,
/// accumulating into `matched` so repeated passes merge.
pub fn sniff_element(
    probe: &ProbeElement,
    sheets: &[Stylesheet],
    options: &SniffOptions,
    matched: &mut MatchedCss,
    reporter: &Reporter,
) -> Result<()> {
    let document = probe_document(probe);
    let element = match find_probe_element(&document, &probe.name) {
        Some(element) => element,
        None => {
            reporter.report(format!(
                "probe element <{}> was dropped while parsing",
                probe.name
            ))?;
            return Ok(());
        }
    };

    for (sheet_index, sheet) in sheets.iter().enumerate() {
        if !sheet_is_allowed(sheet, options) {
            continue;
        }
        let sheet_matches = matched.entry(sheet_index).or_default();
        filter_rules(&document, element, &sheet.rules, options, sheet_matches, reporter)?;
    }

    Ok(())
}

fn filter_rules(
    document: &Html,
    element: ElementRef<'_>,
    rules: &[CssRule],
    options: &SniffOptions,
    out: &mut SheetMatches,
    reporter: &Reporter,
) -> Result<()> {
    for (rule_index, rule) in rules.iter().enumerate() {
        match rule {
            CssRule::Style {
                selector_text,
                declarations,
            } => {
                lazy_static! {
                    static ref CHARSET_RE: Regex = Regex::new(r"@charset.*?;").unwrap();
                }
                let sanitized = CHARSET_RE.replace_all(selector_text, "").to_string();
                if !rule_is_allowed(&sanitized, options) {
                    continue;
                }
                for selector in split_selectors(&sanitized) {
                    let normalized = normalize_selector(&selector);
                    let is_match =
                        match_normalized(document, element, &selector, &normalized, reporter)?;
                    if !is_match {
                        continue;
                    }
                    let entry = out.entry(rule_index).or_insert_with(|| RuleMatch::Style {
                        selectors: Vec::new(),
                        declarations: declarations.clone(),
                    });
                    match entry {
                        RuleMatch::Style { selectors, .. } => {
                            if !selectors.contains(&selector) {
                                selectors.push(selector.clone());
                            }
                        }
                        RuleMatch::Media { .. } => {
                            reporter.report(format!(
                                "matched rule {} cannot change from media to style",
                                rule_index
                            ))?;
                        }
                    }
                }
            }
            CssRule::Media {
                condition,
                children,
            } => {
                if !media_is_allowed(condition, options) {
                    continue;
                }
                let mut child_matches = match out.get(&rule_index) {
                    Some(RuleMatch::Media { children, .. }) => children.clone(),
                    Some(RuleMatch::Style { .. }) => {
                        reporter.report(format!(
                            "matched rule {} cannot change from style to media",
                            rule_index
                        ))?;
                        SheetMatches::new()
                    }
                    None => SheetMatches::new(),
                };
                filter_rules(document, element, children, options, &mut child_matches, reporter)?;
                if !child_matches.is_empty() {
                    out.insert(
                        rule_index,
                        RuleMatch::Media {
                            before: format!("@media {}", condition),
                            children: child_matches,
                        },
                    );
                }
            }
        }
    }
    Ok(())
}

fn match_normalized(
    document: &Html,
    element: ElementRef<'_>,
    original_selector: &str,
    normalized: &str,
    reporter: &Reporter,
) -> Result<bool> {
    let parsed = match Selector::parse(normalized) {
        Ok(parsed) => parsed,
        Err(error) => {
            // @charset fragments reach here when they survive sanitising;
            // those are ignored without a report.
            if !original_selector.trim_start().starts_with("@charset") {
                reporter.report(format!(
                    "unmatchable selector `{}` (normalized `{}`): {:?}",
                    original_selector, normalized, error
                ))?;
            }
            return Ok(false);
        }
    };
    let element_id = element.id();
    Ok(document
        .select(&parsed)
        .any(|candidate| candidate.id() == element_id))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SELECTOR NORMALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Reduce a selector to the one compound segment that could match an isolated
/// element: drop hierarchical context (`.a + .b > .c` becomes `.c`) and drop
/// pseudo-classes/-elements from the first real (unescaped) colon onward.
/// Escaped colons (`\:` as in utility-class names) survive the pass.
pub fn normalize_selector(selector: &str) -> String {
    const ESCAPED_COLON_PLACEHOLDER: &str = "css-sniff-placeholder";
    lazy_static! {
        static ref HIERARCHY_RE: Regex = Regex::new(r"^.*[\s]").unwrap();
        static ref PSEUDO_RE: Regex = Regex::new(r":+.*$").unwrap();
    }

    let protected = selector.replace("\\:", ESCAPED_COLON_PLACEHOLDER);
    let trimmed = protected.trim();
    let without_hierarchy = HIERARCHY_RE.replace(trimmed, "");
    let without_pseudo = PSEUDO_RE.replace(&without_hierarchy, "");
    without_pseudo
        .trim()
        .replace(ESCAPED_COLON_PLACEHOLDER, "\\:")
}

/// Split a selector list on top-level commas. Commas inside `()` or `[]` are
/// not split points. At-rules are returned whole.
pub fn split_selectors(selectors: &str) -> Vec<String> {
    if selectors.starts_with('@') {
        return vec![selectors.to_string()];
    }

    let mut split = Vec::new();
    let mut parens = 0i32;
    let mut brackets = 0i32;
    let mut so_far = String::new();
    for ch in selectors.chars() {
        match ch {
            '(' => parens += 1,
            ')' => parens -= 1,
            '[' => brackets += 1,
            ']' => brackets -= 1,
            ',' if parens == 0 && brackets == 0 => {
                split.push(so_far.trim().to_string());
                so_far.clear();
                continue;
            }
            _ => {}
        }
        so_far.push(ch);
    }
    split.push(so_far.trim().to_string());
    split
}

// ═══════════════════════════════════════════════════════════════════════════════
// MERGE / DIFF / SERIALIZE
// ═══════════════════════════════════════════════════════════════════════════════

/// Deep union of two matched-rule trees: style rules union their selector
/// lists, media rules union their children.
pub fn merge_matches(target: &mut MatchedCss, source: &MatchedCss) {
    for (sheet_index, source_sheet) in source {
        let target_sheet = target.entry(*sheet_index).or_default();
        merge_sheet(target_sheet, source_sheet);
    }
}

fn merge_sheet(target: &mut SheetMatches, source: &SheetMatches) {
    for (rule_index, source_rule) in source {
        match (target.get_mut(rule_index), source_rule) {
            (None, _) => {
                target.insert(*rule_index, source_rule.clone());
            }
            (
                Some(RuleMatch::Style { selectors, .. }),
                RuleMatch::Style {
                    selectors: source_selectors,
                    ..
                },
            ) => {
                for selector in source_selectors {
                    if !selectors.contains(selector) {
                        selectors.push(selector.clone());
                    }
                }
            }
            (
                Some(RuleMatch::Media { children, .. }),
                RuleMatch::Media {
                    children: source_children,
                    ..
                },
            ) => merge_sheet(children, source_children),
            // Mismatched kinds keep the existing entry.
            (Some(_), _) => {}
        }
    }
}

/// Recursive set subtraction: rules present in `b` but absent at the same
/// stylesheet/rule path in `a`. Media wrappers survive only when at least one
/// child survives.
pub fn diff_matches(a: &MatchedCss, b: &MatchedCss) -> MatchedCss {
    let mut diff = MatchedCss::new();
    for (sheet_index, b_sheet) in b {
        let a_sheet = a.get(sheet_index);
        let mut diff_sheet = SheetMatches::new();
        for (rule_index, b_rule) in b_sheet {
            match b_rule {
                RuleMatch::Style { .. } => {
                    let present_in_a = a_sheet
                        .map(|sheet| sheet.contains_key(rule_index))
                        .unwrap_or(false);
                    if !present_in_a {
                        diff_sheet.insert(*rule_index, b_rule.clone());
                    }
                }
                RuleMatch::Media { before, children } => {
                    let a_children = match a_sheet.and_then(|sheet| sheet.get(rule_index)) {
                        Some(RuleMatch::Media { children, .. }) => Some(children),
                        _ => None,
                    };
                    let mut diff_children = SheetMatches::new();
                    for (child_index, child_rule) in children {
                        let present_in_a = a_children
                            .map(|children| children.contains_key(child_index))
                            .unwrap_or(false);
                        if !present_in_a {
                            diff_children.insert(*child_index, child_rule.clone());
                        }
                    }
                    if !diff_children.is_empty() {
                        diff_sheet.insert(
                            *rule_index,
                            RuleMatch::Media {
                                before: before.clone(),
                                children: diff_children,
                            },
                        );
                    }
                }
            }
        }
        if !diff_sheet.is_empty() {
            diff.insert(*sheet_index, diff_sheet);
        }
    }
    diff
}

/// Serialize matches back into literal CSS rules.
pub fn serialize_matches(matched: &MatchedCss) -> String {
    let mut css = String::new();
    for sheet in matched.values() {
        for rule in sheet.values() {
            match rule {
                RuleMatch::Style {
                    selectors,
                    declarations,
                } => {
                    css.push_str(&selectors.join(","));
                    css.push('{');
                    css.push_str(declarations);
                    css.push('}');
                }
                RuleMatch::Media { before, children } => {
                    css.push_str(before);
                    css.push('{');
                    for child in children.values() {
                        match child {
                            RuleMatch::Style {
                                selectors,
                                declarations,
                            } => {
                                css.push_str(&selectors.join(","));
                                css.push('{');
                                css.push_str(declarations);
                                css.push('}');
                            }
                            RuleMatch::Media { .. } => {
                                log::warn!("media rule nested in media rule is not serializable");
                            }
                        }
                    }
                    css.push('}');
                }
            }
        }
    }
    css
}

/// Serialize only the declarations, for per-element css-property collection.
/// Sheets are joined with `;`.
pub fn serialize_matches_as_declarations(matched: &MatchedCss) -> String {
    matched
        .values()
        .map(|sheet| {
            sheet
                .values()
                .map(|rule| match rule {
                    RuleMatch::Style { declarations, .. } => declarations.clone(),
                    RuleMatch::Media { before, children } => {
                        let inner: String = children
                            .values()
                            .filter_map(|child| match child {
                                RuleMatch::Style { declarations, .. } => {
                                    Some(declarations.clone())
                                }
                                RuleMatch::Media { .. } => {
                                    log::warn!(
                                        "media rule nested in media rule is not serializable"
                                    );
                                    None
                                }
                            })
                            .collect();
                        format!("{}{{{}}}", before, inner)
                    }
                })
                .collect::<Vec<_>>()
                .join("")
        })
        .collect::<Vec<_>>()
        .join(";")
        .trim()
        .to_string()
}
