//! Tests for the selector tokenizer.

use flow_common::warning::has_warned;
use flow_query::tokenizer::{
    AttributeFilter, AttributeOperator, Combinator, NthArgument, PseudoClass, SelectorStep, parse,
};

fn single_step(selector: &str) -> SelectorStep {
    let groups = parse(selector);
    assert_eq!(groups.len(), 1, "{selector}");
    assert_eq!(groups[0].steps.len(), 1, "{selector}");
    groups[0].steps[0].clone()
}

fn filter(name: &str, operator: AttributeOperator, value: &str) -> AttributeFilter {
    AttributeFilter {
        name: name.to_string(),
        operator: Some(operator),
        value: Some(value.to_string()),
    }
}

#[test]
fn test_groups_are_split_and_deduplicated() {
    let groups = parse("ul > li, ul>li ,p,  ul  >  li");
    let sources: Vec<&str> = groups.iter().map(|g| g.source.as_str()).collect();
    assert_eq!(sources, ["ul > li", "p"]);
}

#[test]
fn test_empty_alternatives_are_dropped() {
    assert!(parse("").is_empty());
    assert!(parse(" , ,").is_empty());
    assert_eq!(parse("a,,b").len(), 2);
}

#[test]
fn test_compound_fragments() {
    let step = single_step("UL#nav.menu.main[data-x^='1']:first-child");
    assert_eq!(step.tag, "ul");
    assert_eq!(step.id.as_deref(), Some("nav"));
    assert_eq!(step.classes, ["menu", "main"]);
    assert_eq!(step.attributes, [filter("data-x", AttributeOperator::Prefix, "1")]);
    assert_eq!(step.pseudos, [PseudoClass::FirstChild]);
    assert_eq!(step.combinator, Combinator::Descendant);
}

#[test]
fn test_fragments_in_any_order() {
    let step = single_step(".a#b.c");
    assert_eq!(step.tag, "*");
    assert_eq!(step.id.as_deref(), Some("b"));
    assert_eq!(step.classes, ["a", "c"]);
}

#[test]
fn test_combinators() {
    let groups = parse("div > p + span ~ a b");
    let combinators: Vec<Combinator> = groups[0].steps.iter().map(|s| s.combinator).collect();
    assert_eq!(
        combinators,
        [
            Combinator::Descendant,
            Combinator::Child,
            Combinator::Adjacent,
            Combinator::General,
            Combinator::Descendant,
        ]
    );
}

#[test]
fn test_leading_combinator_is_relative_to_scope() {
    let groups = parse("> li");
    assert_eq!(groups[0].steps[0].combinator, Combinator::Child);
    assert!(!groups[0].is_malformed());
}

#[test]
fn test_trailing_combinator_is_malformed() {
    let groups = parse("ul >");
    assert_eq!(groups[0].trailing_combinator, Some(Combinator::Child));
    assert!(groups[0].is_malformed());
}

#[test]
fn test_attribute_operators() {
    let step = single_step(r#"a[href][rel=next][lang|=en][title~=x][class*=btn][src$="a b.png"]"#);
    assert_eq!(
        step.attributes,
        [
            AttributeFilter {
                name: "href".to_string(),
                operator: None,
                value: None,
            },
            filter("rel", AttributeOperator::Exact, "next"),
            filter("lang", AttributeOperator::Exact, "en"),
            filter("title", AttributeOperator::Substring, "x"),
            filter("class", AttributeOperator::Substring, "btn"),
            filter("src", AttributeOperator::Suffix, "a b.png"),
        ]
    );
}

#[test]
fn test_nth_arguments() {
    let formula = |step, offset| NthArgument::Formula { step, offset };
    assert_eq!(NthArgument::parse("odd"), formula(2, 1));
    assert_eq!(NthArgument::parse("EVEN"), formula(2, 0));
    assert_eq!(NthArgument::parse(" 2n + 1 "), formula(2, 1));
    assert_eq!(NthArgument::parse("-n+3"), formula(-1, 3));
    assert_eq!(NthArgument::parse("3n"), formula(3, 0));
    assert_eq!(NthArgument::parse("3"), NthArgument::Position(3));
    assert_eq!(NthArgument::parse("-2"), NthArgument::Position(0));
    assert_eq!(NthArgument::parse("n"), NthArgument::Any);
    assert_eq!(NthArgument::parse("bogus"), NthArgument::Any);
}

#[test]
fn test_nth_matches() {
    let odd = NthArgument::parse("odd");
    let hits: Vec<usize> = (1..=6).filter(|&p| odd.matches(p)).collect();
    assert_eq!(hits, [1, 3, 5]);

    let first_three = NthArgument::parse("-n+3");
    let hits: Vec<usize> = (1..=6).filter(|&p| first_three.matches(p)).collect();
    assert_eq!(hits, [1, 2, 3]);

    assert!((1..=6).all(|p| !NthArgument::Position(0).matches(p)));
}

#[test]
fn test_pseudo_arguments() {
    let step = single_step("li:nth-child(2n+1):contains('a b'):not(.x)");
    assert_eq!(
        step.pseudos[0],
        PseudoClass::NthChild(NthArgument::Formula { step: 2, offset: 1 })
    );
    assert_eq!(step.pseudos[1], PseudoClass::Contains("a b".to_string()));
    let PseudoClass::Not(negation) = &step.pseudos[2] else {
        panic!("expected :not");
    };
    assert_eq!(negation.tag, "*");
    assert_eq!(negation.classes, ["x"]);
}

#[test]
fn test_negated_id_shorthand() {
    let step = single_step("div:not([#main])");
    let PseudoClass::Not(negation) = &step.pseudos[0] else {
        panic!("expected :not");
    };
    assert_eq!(negation.attributes, [filter("id", AttributeOperator::Exact, "main")]);
}

#[test]
fn test_unknown_pseudo_class_is_ignored_with_warning() {
    let step = single_step("a:hover.x");
    assert!(step.pseudos.is_empty());
    assert_eq!(step.classes, ["x"]);
    assert!(has_warned("Selector", "unknown pseudo-class ':hover' ignored"));
}

#[test]
fn test_unreadable_text_stops_the_step() {
    let step = single_step("p.a!b.c");
    assert_eq!(step.tag, "p");
    assert_eq!(step.classes, ["a"]);
}

#[test]
fn test_groups_serialize_for_explain() {
    let groups = parse("ul > li:nth-child(odd)");
    let json = serde_json::to_value(&groups).unwrap();
    let step = &json[0]["steps"][1];
    assert_eq!(step["combinator"], "child");
    assert_eq!(step["pseudos"][0]["kind"], "nth-child");
    assert_eq!(step["pseudos"][0]["argument"]["formula"]["step"], 2);
}
