//! End-to-end pipeline tests over the public compile entry point.

use crate::compile::compile;
use crate::condition::{ConditionTest, Dialect};
use crate::ir::TemplateNode;
use crate::props::PropKind;

const BACKEND_DIRS: [&str; 10] = [
    "html",
    "css",
    "react",
    "react-styled-components",
    "vue",
    "vue-jsx",
    "angular",
    "ember",
    "mustache",
    "django",
];

#[test]
fn every_backend_produces_a_file() {
    let output = compile("<p>hello</p>", "p { color: red }", "paragraph", false).unwrap();
    assert!(!output.files.is_empty());
    for dir in BACKEND_DIRS {
        assert!(
            output
                .files
                .keys()
                .any(|path| path.starts_with(&format!("{}/", dir))),
            "no file under {}/",
            dir
        );
    }
    assert!(output.files["css/paragraph.css"].contains("color: red"));
}

#[test]
fn output_paths_follow_the_directory_slash_id_convention() {
    let output = compile("<p>hello</p>", "", "widget", false).unwrap();
    assert_eq!(output.files["html/widget.html"], "<p>hello</p>");
    assert!(output.files.contains_key("react/widget.tsx"));
    assert!(output.files.contains_key("vue/widget.vue"));
    assert!(output.files.contains_key("ember/widget.hbs"));
}

#[test]
fn unreachable_css_is_tree_shaken_from_every_file() {
    let output = compile(
        "<p>hello</p>",
        "p { color: red } .treeShake { background: blue }",
        "paragraph",
        false,
    )
    .unwrap();
    for (path, contents) in &output.files {
        assert!(
            !contents.contains("treeShake"),
            "{} leaked a tree-shaken rule",
            path
        );
    }
}

#[test]
fn class_matched_css_is_kept_and_unmatched_css_dropped() {
    let output = compile(
        "<p class=\"frog\">hello</p>",
        ".frog { color: blue } .tree-shake { background: yellow }",
        "paragraph",
        false,
    )
    .unwrap();
    assert!(output.component.css_string.contains(".frog"));
    let serialized = format!("{:?}", output.files);
    assert!(serialized.contains(".frog"));
    assert!(!serialized.contains(".tree-shake"));
}

#[test]
fn variable_elements_infer_props_and_relocate_children() {
    let output = compile(
        "<m-variable id=\"someId\"><p>stuff</p>",
        "",
        "widget",
        true,
    )
    .unwrap();
    assert_eq!(output.component.props.len(), 1);
    let prop = output.component.props.get("someId").unwrap();
    assert!(prop.required);
    assert_eq!(prop.kind, PropKind::Variable);

    // The nested paragraph was rearranged into a following sibling.
    assert_eq!(output.component.nodes.len(), 2);
    match &output.component.nodes[0] {
        TemplateNode::Variable(variable) => assert!(variable.children.is_empty()),
        other => panic!("unexpected node {:?}", other),
    }
    match &output.component.nodes[1] {
        TemplateNode::Element(element) => assert_eq!(element.name, "p"),
        other => panic!("unexpected node {:?}", other),
    }
}

#[test]
fn conditional_expressions_translate_per_dialect() {
    let output = compile(
        "<m-if test=\"frog !== 'frush'\"><p>x</p></m-if>",
        "",
        "widget",
        true,
    )
    .unwrap();
    match &output.component.nodes[0] {
        TemplateNode::Conditional(conditional) => match &conditional.test {
            ConditionTest::Parsed { ids, expressions } => {
                assert_eq!(ids, &vec!["frog".to_string()]);
                assert_eq!(expressions[&Dialect::JavaScript], "frog !== 'frush'");
                assert_eq!(expressions[&Dialect::Php], "$frog != \"frush\"");
                assert_eq!(expressions[&Dialect::Django], "frog != \"frush\"");
            }
            other => panic!("unexpected test {:?}", other),
        },
        other => panic!("unexpected node {:?}", other),
    }
}

#[test]
fn conditionals_do_not_interfere_with_the_css_string() {
    let output = compile(
        "<m-if test=\"bob === 'frog'\"><h1 class=\"my-style\"><m-variable id=\"children\"></m-variable></h1></m-if>",
        ".my-style { color: blue; }",
        "widget",
        true,
    )
    .unwrap();
    assert!(output.component.css_string.len() > 20);
    assert!(output.component.css_string.contains(".my-style"));
}

#[test]
fn lenient_mode_never_fails_on_malformed_input() {
    let garbage = [
        "<m-variable><p>no id</p>",
        "<m-if><p>no test</p></m-if>",
        "<m-if test=\"a &&\"><p>bad</p></m-if>",
        "<a href=\"{{ unterminated\">x</a>",
        "<m-alias>orphaned</m-alias>",
        "<<<<>>>>",
        "",
    ];
    for markup in garbage {
        let result = compile(markup, "][ { broken css", "widget", false);
        assert!(result.is_ok(), "lenient compile failed for {:?}", markup);
    }
}

#[test]
fn strict_mode_raises_on_the_same_inputs() {
    assert!(compile("<m-variable><p>no id</p>", "", "widget", true).is_err());
    assert!(compile("<m-if><p>no test</p></m-if>", "", "widget", true).is_err());
    assert!(compile("<a href=\"{{ oops\">x</a>", "", "widget", true).is_err());
}

#[test]
fn compiling_twice_yields_byte_identical_output() {
    let markup = "<p class=\"base {{ kind: one | two }}\">\
                  <m-variable id=\"children\"></m-variable></p>\
                  <m-if test=\"kind === 'one'\"><span>one</span></m-if>";
    let css = ".base { margin: 0 } .one { color: red } .two { color: blue }";
    let first = compile(markup, css, "widget", false).unwrap();
    let second = compile(markup, css, "widget", false).unwrap();
    assert_eq!(first.files, second.files);
    assert_eq!(first.component, second.component);
}

#[test]
fn enum_literals_reach_the_stylesheet_but_variables_do_not() {
    let output = compile(
        "<p class=\"{{ kind: one | two }} {{ free }}\">x</p>",
        ".one { color: red } .two { color: blue } .free { color: green }",
        "widget",
        false,
    )
    .unwrap();
    assert!(output.component.css_string.contains(".one"));
    assert!(output.component.css_string.contains(".two"));
    // A plain variable's runtime value is unknowable, so .free is unreachable.
    assert!(!output.component.css_string.contains(".free"));
}

#[test]
fn insertion_mode_sensitive_markup_survives_the_round_trip() {
    let output = compile(
        "<select><m-variable id=\"children\"></m-variable></select>",
        "",
        "widget",
        true,
    )
    .unwrap();
    match &output.component.nodes[0] {
        TemplateNode::Element(element) => {
            assert_eq!(element.name, "select");
            assert!(matches!(
                element.children[0],
                TemplateNode::Variable(_)
            ));
        }
        other => panic!("unexpected node {:?}", other),
    }
    assert!(output.files["html/widget.html"].contains("<select>"));
}

#[test]
fn media_rules_survive_into_the_style_output() {
    let output = compile(
        "<p>hello</p>",
        "@media (min-width: 600px) { p { color: red } .gone { left: 0 } }",
        "widget",
        false,
    )
    .unwrap();
    let css = &output.files["css/widget.css"];
    assert!(css.contains("@media (min-width: 600px)"));
    assert!(css.contains("color: red"));
    assert!(!css.contains(".gone"));
}

#[test]
fn vendor_selectors_never_abort_a_compile() {
    let output = compile(
        "<input class=\"field\">",
        "input::-moz-focus-inner { border: 0 } .field:-ms-input-placeholder { color: grey } .field { padding: 1px }",
        "widget",
        false,
    )
    .unwrap();
    assert!(output.component.css_string.contains("padding: 1px"));
}
