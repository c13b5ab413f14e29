//! DOM walker matcher.
//!
//! Evaluates parsed [`SelectorGroup`]s directly against the tree. Each
//! group starts from the query scope and narrows a working set one step at a
//! time, left to right, with no backtracking:
//!
//! 1. the step's relation (descendant scan, id lookup, children, siblings)
//!    produces candidates from the previous set;
//! 2. id, class, attribute and pseudo-class filters drop candidates (a
//!    formula `:nth-child` replaces them with same-tag siblings instead);
//! 3. the survivors become the previous set for the next step.
//!
//! Duplicates within a group are suppressed with per-call `HashSet`s; nothing
//! is written to the tree.

mod pseudo;

use std::collections::HashSet;

use flow_dom::{DomTree, ElementData, NodeId};

use crate::tokenizer::{AttributeFilter, AttributeOperator, Combinator, SelectorGroup, SelectorStep};

use pseudo::SiblingCache;

/// Every element matched by `group` under `scope`.
///
/// Descendant steps keep the scan order of the previous set, so results are
/// in document order for the common single-scope case.
#[must_use]
pub fn match_all(group: &SelectorGroup, tree: &DomTree, scope: NodeId) -> Vec<NodeId> {
    if group.is_malformed() {
        return Vec::new();
    }

    let mut siblings = SiblingCache::default();
    let mut previous = vec![scope];
    for step in &group.steps {
        previous = apply_step(step, tree, &previous, &mut siblings);

        #[cfg(feature = "match-trace")]
        eprintln!(
            "[match-trace] walker '{}' {:?} {}: {} element(s)",
            group.source,
            step.combinator,
            step.tag,
            previous.len()
        );

        if previous.is_empty() {
            break;
        }
    }
    previous
}

/// Results of every group, concatenated in group order.
#[must_use]
pub fn query_all(groups: &[SelectorGroup], tree: &DomTree, scope: NodeId) -> Vec<NodeId> {
    groups
        .iter()
        .flat_map(|group| match_all(group, tree, scope))
        .collect()
}

/// The first result of [`query_all`], without evaluating the groups after
/// the first one that matches. Within a group, the last step stops at its
/// first survivor.
#[must_use]
pub fn match_first(groups: &[SelectorGroup], tree: &DomTree, scope: NodeId) -> Option<NodeId> {
    groups
        .iter()
        .find_map(|group| first_in_group(group, tree, scope))
}

fn first_in_group(group: &SelectorGroup, tree: &DomTree, scope: NodeId) -> Option<NodeId> {
    if group.is_malformed() {
        return None;
    }
    let (last, leading) = group.steps.split_last()?;

    let mut siblings = SiblingCache::default();
    let mut previous = vec![scope];
    for step in leading {
        previous = apply_step(step, tree, &previous, &mut siblings);
        if previous.is_empty() {
            return None;
        }
    }

    if last.pseudos.iter().any(pseudo::expands) {
        return apply_step(last, tree, &previous, &mut siblings).first().copied();
    }
    relation(last, tree, &previous).into_iter().find(|&c| {
        passes_simple_filters(last, tree, c)
            && last
                .pseudos
                .iter()
                .all(|p| pseudo::matches(p, tree, c, &mut siblings))
    })
}

fn apply_step(
    step: &SelectorStep,
    tree: &DomTree,
    previous: &[NodeId],
    siblings: &mut SiblingCache,
) -> Vec<NodeId> {
    let mut candidates = relation(step, tree, previous);
    candidates.retain(|&c| passes_simple_filters(step, tree, c));

    for pseudo in &step.pseudos {
        if candidates.is_empty() {
            break;
        }
        candidates = pseudo::apply(pseudo, tree, candidates, siblings);
    }
    candidates
}

/// Candidates the step's combinator reaches from `previous`, tag-checked.
fn relation(step: &SelectorStep, tree: &DomTree, previous: &[NodeId]) -> Vec<NodeId> {
    match step.combinator {
        Combinator::Descendant => descendants(step, tree, previous),
        Combinator::Child => previous
            .iter()
            .flat_map(|&p| tree.element_children(p))
            .filter(|&c| has_tag(tree, c, &step.tag))
            .collect(),
        Combinator::Adjacent => previous
            .iter()
            .filter_map(|&p| tree.next_element_sibling(p))
            .filter(|&s| has_tag(tree, s, &step.tag))
            .collect(),
        Combinator::General => {
            let mut seen = HashSet::new();
            previous
                .iter()
                .flat_map(|&p| tree.following_siblings(p))
                .filter(|&s| has_tag(tree, s, &step.tag) && seen.insert(s))
                .collect()
        }
    }
}

/// Id, class and attribute tests. On a descendant step the id was already
/// used for the lookup.
fn passes_simple_filters(step: &SelectorStep, tree: &DomTree, node: NodeId) -> bool {
    let id = step
        .id
        .as_deref()
        .filter(|_| step.combinator != Combinator::Descendant);
    tree.as_element(node).is_some_and(|element| {
        id.is_none_or(|id| element.id() == Some(id))
            && step.classes.iter().all(|class| element.has_class(class))
            && step
                .attributes
                .iter()
                .all(|filter| attribute_matches(filter, element))
    })
}

/// Descendant relation: the id index when the step has an id, otherwise a
/// tag scan below each previous element.
///
/// The id lookup overrides the step's tag, so `span#x` finds `div#x`. The
/// element must still lie below one of the previous elements.
fn descendants(step: &SelectorStep, tree: &DomTree, previous: &[NodeId]) -> Vec<NodeId> {
    if let Some(id) = &step.id {
        return tree
            .get_element_by_id(id)
            .filter(|&e| previous.iter().any(|&p| tree.is_descendant_of(e, p)))
            .into_iter()
            .collect();
    }

    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for &p in previous {
        for element in tree.elements_by_tag_name(p, &step.tag) {
            if seen.insert(element) {
                found.push(element);
            }
        }
    }
    found
}

fn has_tag(tree: &DomTree, node: NodeId, tag: &str) -> bool {
    tree.as_element(node).is_some_and(|e| e.has_tag(tag))
}

/// An absent or empty attribute fails every filter, presence included.
pub(crate) fn attribute_matches(filter: &AttributeFilter, element: &ElementData) -> bool {
    let Some(actual) = element.attrs.get(&filter.name).filter(|v| !v.is_empty()) else {
        return false;
    };
    let expected = filter.value.as_deref().unwrap_or_default();
    match filter.operator {
        None => true,
        Some(AttributeOperator::Exact) => actual == expected,
        Some(AttributeOperator::Prefix) => actual.starts_with(expected),
        Some(AttributeOperator::Suffix) => actual.ends_with(expected),
        Some(AttributeOperator::Substring) => actual.contains(expected),
    }
}
