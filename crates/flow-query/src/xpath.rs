//! Selector-to-XPath translation.
//!
//! Each [`SelectorGroup`] becomes one location path rooted at the context
//! node (`.`). Steps map to axes, filters to predicates:
//!
//! | selector       | XPath                                           |
//! |----------------|-------------------------------------------------|
//! | `A B`          | `/descendant::B`                                |
//! | `A > B`        | `/child::B`                                     |
//! | `A + B`        | `/following-sibling::*[1]/self::B`              |
//! | `A ~ B`        | `/following-sibling::B`                         |
//! | `#v`           | `[@id='v']`                                     |
//! | `.v`           | `[contains(concat(' ', @class, ' '), ' v ')]`   |
//! | `[n]`          | `[@n != '']`                                    |
//! | `:first-child` | `[count(preceding-sibling::*) = 0]`             |
//!
//! The host evaluator runs each group's path against the same context node
//! and the backend concatenates the node lists in group order.

use std::fmt::Write;

use flow_common::warning::warn_once;
use flow_dom::{DomTree, NodeId};

use crate::engine::SelectorBackend;
use crate::host::{Backend, DocumentEvaluator};
use crate::tokenizer::{
    self, AttributeFilter, AttributeOperator, Combinator, Negation, NthArgument, PseudoClass,
    SelectorGroup, SelectorStep,
};

/// The XPath expression selecting `group`'s matches, or `None` for a group
/// that cannot match anything.
#[must_use]
pub fn translate(group: &SelectorGroup) -> Option<String> {
    if group.is_malformed() {
        return None;
    }
    let mut expression = String::from(".");
    for step in &group.steps {
        push_step(&mut expression, step);
    }
    Some(expression)
}

fn push_step(out: &mut String, step: &SelectorStep) {
    let tag = &step.tag;
    let _ = match step.combinator {
        Combinator::Descendant => write!(out, "/descendant::{tag}"),
        Combinator::Child => write!(out, "/child::{tag}"),
        Combinator::Adjacent => write!(out, "/following-sibling::*[1]/self::{tag}"),
        Combinator::General => write!(out, "/following-sibling::{tag}"),
    };

    if let Some(id) = &step.id {
        let _ = write!(out, "[@id = {}]", xpath_literal(id));
    }
    for class in &step.classes {
        let _ = write!(out, "[{}]", class_predicate(class));
    }
    for filter in &step.attributes {
        let _ = write!(out, "[{}]", attribute_predicate(filter));
    }
    for pseudo in &step.pseudos {
        if let Some(predicate) = pseudo_predicate(pseudo, tag) {
            let _ = write!(out, "[{predicate}]");
        }
    }
}

fn class_predicate(class: &str) -> String {
    format!(
        "contains(concat(' ', @class, ' '), {})",
        xpath_literal(&format!(" {class} "))
    )
}

/// Absent and empty attributes fail every test, as in the walker.
fn attribute_predicate(filter: &AttributeFilter) -> String {
    let name = &filter.name;
    let value = filter.value.as_deref().unwrap_or_default();
    let Some(operator) = filter.operator else {
        return format!("@{name} != ''");
    };
    if value.is_empty() {
        // Every non-empty value starts with, ends with and contains "".
        return match operator {
            AttributeOperator::Exact => "false()".to_string(),
            _ => format!("@{name} != ''"),
        };
    }

    let literal = xpath_literal(value);
    match operator {
        AttributeOperator::Exact => format!("@{name} = {literal}"),
        AttributeOperator::Prefix => format!("starts-with(@{name}, {literal})"),
        AttributeOperator::Suffix => format!(
            "substring(@{name}, string-length(@{name}) - {} + 1) = {literal}",
            value.chars().count()
        ),
        AttributeOperator::Substring => format!("contains(@{name}, {literal})"),
    }
}

fn pseudo_predicate(pseudo: &PseudoClass, tag: &str) -> Option<String> {
    let predicate = match pseudo {
        PseudoClass::FirstChild => "count(preceding-sibling::*) = 0".to_string(),
        PseudoClass::LastChild => "count(following-sibling::*) = 0".to_string(),
        PseudoClass::OnlyChild => {
            "count(preceding-sibling::*) = 0 and count(following-sibling::*) = 0".to_string()
        }
        PseudoClass::FirstOfType => format!("count(preceding-sibling::{tag}) = 0"),
        PseudoClass::LastOfType => format!("count(following-sibling::{tag}) = 0"),
        PseudoClass::OnlyOfType => format!(
            "count(preceding-sibling::{tag}) = 0 and count(following-sibling::{tag}) = 0"
        ),
        PseudoClass::NthChild(argument) => {
            return nth_predicate("count(preceding-sibling::*) + 1", *argument);
        }
        PseudoClass::NthOfType(argument) => {
            return nth_predicate(&format!("count(preceding-sibling::{tag}) + 1"), *argument);
        }
        PseudoClass::Empty => "count(child::node()) = 0".to_string(),
        PseudoClass::Contains(text) => format!("contains(., {})", xpath_literal(text)),
        PseudoClass::Enabled => "not(@disabled)".to_string(),
        PseudoClass::Disabled => "@disabled".to_string(),
        PseudoClass::Checked => "@checked".to_string(),
        PseudoClass::Not(negation) => format!("not({})", negation_test(negation)),
    };
    Some(predicate)
}

/// Predicate selecting the positions `argument` describes, given an
/// expression for the 1-based position.
fn nth_predicate(position: &str, argument: NthArgument) -> Option<String> {
    match argument {
        NthArgument::Any => None,
        NthArgument::Position(k) => Some(format!("{position} = {k}")),
        NthArgument::Formula { step: 0, offset } => Some(format!("{position} = {offset}")),
        NthArgument::Formula { step, offset } if step > 0 => {
            let remainder = offset.rem_euclid(step);
            let mut predicate = format!("({position}) mod {step} = {remainder}");
            // Positions below the offset are not reached by n >= 0.
            if offset > step {
                let _ = write!(predicate, " and {position} >= {offset}");
            }
            Some(predicate)
        }
        NthArgument::Formula { step, offset } => Some(format!(
            "{position} <= {offset} and ({offset} - ({position})) mod {} = 0",
            step.unsigned_abs()
        )),
    }
}

fn negation_test(negation: &Negation) -> String {
    let mut parts = Vec::new();
    if negation.tag != "*" {
        parts.push(format!("self::{}", negation.tag));
    }
    if let Some(id) = &negation.id {
        parts.push(format!("@id = {}", xpath_literal(id)));
    }
    parts.extend(negation.classes.iter().map(String::as_str).map(class_predicate));
    parts.extend(negation.attributes.iter().map(attribute_predicate));
    if parts.is_empty() {
        return "self::node()".to_string();
    }
    parts.join(" and ")
}

/// [§ 3.7 Lexical Structure](https://www.w3.org/TR/xpath-10/#exprlex)
///
/// XPath literals have no escapes: a value holding both quote kinds is
/// spliced together with `concat()`.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let pieces: Vec<String> = value.split('\'').map(|piece| format!("'{piece}'")).collect();
    format!("concat({})", pieces.join(", \"'\", "))
}

/// Backend that runs translated groups through a host XPath evaluator.
pub struct XPathBackend {
    evaluator: Box<dyn DocumentEvaluator>,
}

impl XPathBackend {
    /// Wrap a host evaluator.
    #[must_use]
    pub fn new(evaluator: Box<dyn DocumentEvaluator>) -> Self {
        Self { evaluator }
    }

    fn evaluate_group(&self, group: &SelectorGroup, tree: &DomTree, scope: NodeId) -> Vec<NodeId> {
        let Some(expression) = translate(group) else {
            return Vec::new();
        };

        #[cfg(feature = "match-trace")]
        eprintln!("[match-trace] xpath '{}' => {expression}", group.source);

        self.evaluator
            .select_nodes(tree, &expression, scope)
            .unwrap_or_else(|err| {
                warn_once("XPath", &format!("'{expression}' failed: {err}"));
                Vec::new()
            })
    }
}

impl SelectorBackend for XPathBackend {
    fn kind(&self) -> Backend {
        Backend::XPath
    }

    fn select_all(&self, tree: &DomTree, scope: NodeId, query: &str) -> Vec<NodeId> {
        tokenizer::parse(query)
            .iter()
            .flat_map(|group| self.evaluate_group(group, tree, scope))
            .collect()
    }

    fn select_first(&self, tree: &DomTree, scope: NodeId, query: &str) -> Option<NodeId> {
        tokenizer::parse(query)
            .iter()
            .find_map(|group| self.evaluate_group(group, tree, scope).first().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate_one(selector: &str) -> String {
        translate(&tokenizer::parse(selector)[0]).unwrap()
    }

    #[test]
    fn test_literal_quoting() {
        assert_eq!(xpath_literal("plain"), "'plain'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal(r#"a'b"c"#),
            r#"concat('a', "'", 'b"c')"#
        );
    }

    #[test]
    fn test_nth_formulas() {
        let p = "P";
        let formula = |step, offset| NthArgument::Formula { step, offset };
        assert_eq!(nth_predicate(p, formula(2, 1)).unwrap(), "(P) mod 2 = 1");
        assert_eq!(nth_predicate(p, formula(2, 0)).unwrap(), "(P) mod 2 = 0");
        assert_eq!(nth_predicate(p, formula(3, 5)).unwrap(), "(P) mod 3 = 2 and P >= 5");
        assert_eq!(nth_predicate(p, formula(3, -1)).unwrap(), "(P) mod 3 = 2");
        assert_eq!(
            nth_predicate(p, formula(-1, 3)).unwrap(),
            "P <= 3 and (3 - (P)) mod 1 = 0"
        );
        assert_eq!(nth_predicate(p, formula(0, 4)).unwrap(), "P = 4");
        assert_eq!(nth_predicate(p, NthArgument::Position(2)).unwrap(), "P = 2");
        assert!(nth_predicate(p, NthArgument::Any).is_none());
    }

    #[test]
    fn test_relative_steps() {
        assert_eq!(translate_one("> li"), "./child::li");
        assert_eq!(
            translate_one("h1 + p"),
            "./descendant::h1/following-sibling::*[1]/self::p"
        );
        assert_eq!(
            translate_one("h1 ~ *"),
            "./descendant::h1/following-sibling::*"
        );
    }
}
