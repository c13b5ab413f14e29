//! Tests for the native selector matcher.

use flow_css::{CssMatcher, SelectorParseError};
use flow_dom::{DomTree, NodeId, parse_markup};

const PAGE: &str = r#"
<div id="main" class="page">
  <h1>Title</h1>
  <p class="lead intro">First</p>
  <p>Second</p>
  <ul id="nav">
    <li class="item"><a href="/a">A</a></li>
    <li class="item active"><a>B</a></li>
    <li class="item"><a href="https://c.org/x.pdf">C</a></li>
  </ul>
  <form><input type="checkbox" checked><input type="text" disabled><select><option selected>o</option></select></form>
  <span></span>
</div>"#;

fn query(tree: &DomTree, selectors: &str) -> Vec<NodeId> {
    CssMatcher::new()
        .query_all(tree, NodeId::ROOT, selectors)
        .unwrap()
}

fn tags(tree: &DomTree, nodes: &[NodeId]) -> Vec<String> {
    nodes
        .iter()
        .map(|&n| tree.tag_name(n).unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_type_class_and_id() {
    let tree = parse_markup(PAGE);
    assert_eq!(query(&tree, "p").len(), 2);
    assert_eq!(query(&tree, "p.lead.intro").len(), 1);
    assert_eq!(query(&tree, "#nav").len(), 1);
    assert_eq!(query(&tree, "LI.item").len(), 3);
    assert_eq!(query(&tree, "*.active").len(), 1);
}

#[test]
fn test_combinators() {
    let tree = parse_markup(PAGE);
    assert_eq!(query(&tree, "#main > p").len(), 2);
    assert_eq!(query(&tree, "#main > a").len(), 0);
    assert_eq!(query(&tree, "#main a").len(), 3);
    assert_eq!(tags(&tree, &query(&tree, "h1 + p")), ["p"]);
    assert_eq!(query(&tree, "h1 ~ p").len(), 2);
    assert_eq!(query(&tree, "h1~ul>li").len(), 3);
}

#[test]
fn test_descendant_backtracking() {
    // The nearest `section` ancestor has no `article` parent; the outer one does.
    let tree = parse_markup(
        "<article><section><div><section><span>x</span></section></div></section></article>",
    );
    assert_eq!(query(&tree, "article > section span").len(), 1);
}

#[test]
fn test_attribute_operators() {
    let tree = parse_markup(PAGE);
    assert_eq!(query(&tree, "a[href]").len(), 2);
    assert_eq!(query(&tree, "a[href='/a']").len(), 1);
    assert_eq!(query(&tree, "a[href^=https]").len(), 1);
    assert_eq!(query(&tree, r#"a[href$=".pdf"]"#).len(), 1);
    assert_eq!(query(&tree, "a[href*='c.org']").len(), 1);
    assert_eq!(query(&tree, "li[class~=active]").len(), 1);
    assert_eq!(query(&tree, "a[href^='']").len(), 0);
}

#[test]
fn test_structural_pseudo_classes() {
    let tree = parse_markup(PAGE);
    let first = query(&tree, "li:first-child a");
    assert_eq!(tree.get_attribute(first[0], "href"), Some("/a"));
    assert_eq!(query(&tree, "li:last-child").len(), 1);
    assert_eq!(query(&tree, "p:first-of-type").len(), 1);
    assert_eq!(query(&tree, "h1:only-of-type").len(), 1);
    assert_eq!(query(&tree, "li:nth-child(odd)").len(), 2);
    assert_eq!(query(&tree, "li:nth-last-child(1)").len(), 1);
    assert_eq!(query(&tree, "p:nth-of-type(2)").len(), 1);
    assert_eq!(query(&tree, "span:empty").len(), 1);
    assert_eq!(query(&tree, "li:not(.active)").len(), 2);
    assert_eq!(query(&tree, "li:not(.active, :first-child)").len(), 1);
}

#[test]
fn test_form_state_pseudo_classes() {
    let tree = parse_markup(PAGE);
    assert_eq!(query(&tree, ":checked").len(), 2);
    assert_eq!(query(&tree, "input:disabled").len(), 1);
    assert_eq!(query(&tree, "input:enabled").len(), 1);
    assert_eq!(query(&tree, "a:link").len(), 2);
    assert!(query(&tree, "a:hover").is_empty());
}

#[test]
fn test_selector_list_is_tree_ordered_and_unique() {
    let tree = parse_markup(PAGE);
    let found = query(&tree, "ul, h1, #nav");
    assert_eq!(tags(&tree, &found), ["h1", "ul"]);
}

#[test]
fn test_scope_limits_results_not_combinators() {
    let tree = parse_markup(PAGE);
    let nav = tree.get_element_by_id("nav").unwrap();
    let matcher = CssMatcher::new();
    assert_eq!(matcher.query_all(&tree, nav, "#main li").unwrap().len(), 3);
    assert!(matcher.query_all(&tree, nav, "p").unwrap().is_empty());
    let first = matcher.query_first(&tree, nav, "a").unwrap();
    assert_eq!(first.and_then(|a| tree.get_attribute(a, "href")), Some("/a"));
}

#[test]
fn test_matches() {
    let tree = parse_markup(PAGE);
    let nav = tree.get_element_by_id("nav").unwrap();
    let matcher = CssMatcher::new();
    assert!(matcher.matches(&tree, nav, "div > ul#nav").unwrap());
    assert!(!matcher.matches(&tree, nav, "ol").unwrap());
}

#[test]
fn test_syntax_errors() {
    let tree = parse_markup(PAGE);
    let matcher = CssMatcher::new();
    let err = |s: &str| matcher.query_all(&tree, NodeId::ROOT, s).unwrap_err();
    assert_eq!(err("  "), SelectorParseError::Empty);
    assert_eq!(err("ul >"), SelectorParseError::DanglingCombinator);
    assert_eq!(
        err("li:frobnicate"),
        SelectorParseError::UnknownPseudoClass("frobnicate".to_string())
    );
    assert_eq!(
        err("li:nth-child(x)"),
        SelectorParseError::InvalidNth("x".to_string())
    );
    assert!(matches!(
        err("p!"),
        SelectorParseError::UnexpectedCharacter { found: '!', .. }
    ));
    assert_eq!(err("a[href='x"), SelectorParseError::UnexpectedEnd);
}
