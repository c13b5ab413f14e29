//! Tests for selector-to-XPath translation.

use flow_query::tokenizer::parse;
use flow_query::xpath::{translate, xpath_literal};

fn xpath(selector: &str) -> String {
    translate(&parse(selector)[0]).unwrap()
}

const HAS_A: &str = "contains(concat(' ', @class, ' '), ' a ')";

#[test]
fn test_id_and_class_steps() {
    assert_eq!(
        xpath("#x li.a"),
        format!("./descendant::*[@id = 'x']/descendant::li[{HAS_A}]")
    );
}

#[test]
fn test_combinator_axes() {
    assert_eq!(xpath("ul > li"), "./descendant::ul/child::li");
    assert_eq!(
        xpath("h1 + p"),
        "./descendant::h1/following-sibling::*[1]/self::p"
    );
    assert_eq!(xpath("h1 ~ p"), "./descendant::h1/following-sibling::p");
}

#[test]
fn test_attribute_predicates() {
    assert_eq!(xpath("a[href]"), "./descendant::a[@href != '']");
    assert_eq!(xpath("a[href='/x']"), "./descendant::a[@href = '/x']");
    assert_eq!(
        xpath("a[href^='http']"),
        "./descendant::a[starts-with(@href, 'http')]"
    );
    assert_eq!(
        xpath("a[href$=.pdf]"),
        "./descendant::a[substring(@href, string-length(@href) - 4 + 1) = '.pdf']"
    );
    assert_eq!(xpath("a[href*=org]"), "./descendant::a[contains(@href, 'org')]");
}

#[test]
fn test_empty_attribute_values() {
    assert_eq!(xpath("a[href='']"), "./descendant::a[false()]");
    assert_eq!(xpath("a[href^='']"), "./descendant::a[@href != '']");
}

#[test]
fn test_structural_pseudo_classes() {
    assert_eq!(
        xpath("li:first-child"),
        "./descendant::li[count(preceding-sibling::*) = 0]"
    );
    assert_eq!(
        xpath("li:last-child"),
        "./descendant::li[count(following-sibling::*) = 0]"
    );
    assert_eq!(
        xpath("p:only-of-type"),
        "./descendant::p[count(preceding-sibling::p) = 0 and count(following-sibling::p) = 0]"
    );
    assert_eq!(
        xpath("p:nth-of-type(2)"),
        "./descendant::p[count(preceding-sibling::p) + 1 = 2]"
    );
    assert_eq!(
        xpath("li:nth-child(odd)"),
        "./descendant::li[(count(preceding-sibling::*) + 1) mod 2 = 1]"
    );
    assert_eq!(xpath("li:nth-child(n)"), "./descendant::li");
    assert_eq!(
        xpath("div:empty"),
        "./descendant::div[count(child::node()) = 0]"
    );
}

#[test]
fn test_state_and_text_pseudo_classes() {
    assert_eq!(xpath("input:enabled"), "./descendant::input[not(@disabled)]");
    assert_eq!(xpath("input:disabled"), "./descendant::input[@disabled]");
    assert_eq!(xpath("input:checked"), "./descendant::input[@checked]");
    assert_eq!(
        xpath(r#"p:contains("it's")"#),
        r#"./descendant::p[contains(., "it's")]"#
    );
}

#[test]
fn test_negation() {
    assert_eq!(xpath("li:not(.a)"), format!("./descendant::li[not({HAS_A})]"));
    assert_eq!(
        xpath("div:not(span#q)"),
        "./descendant::div[not(self::span and @id = 'q')]"
    );
    assert_eq!(xpath("*:not(*)"), "./descendant::*[not(self::node())]");
}

#[test]
fn test_malformed_group_has_no_translation() {
    assert!(translate(&parse("ul >")[0]).is_none());
}

#[test]
fn test_literals_with_both_quotes() {
    assert_eq!(
        xpath_literal(r#"say "it's""#),
        r#"concat('say "it', "'", 's"')"#
    );
}
