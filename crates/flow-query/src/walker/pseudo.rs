//! Pseudo-class predicates, one per [`PseudoClass`] variant.
//!
//! Structural predicates need the candidate's parent; an element without
//! one fails them. `:nth-child(an+b)` is the one pseudo-class that does not
//! filter: see [`apply`].

use std::collections::{HashMap, HashSet};

use flow_dom::{DomTree, NodeId, inner_html};

use super::attribute_matches;
use crate::tokenizer::{Negation, NthArgument, PseudoClass};

/// Element children per parent, collected once per group evaluation.
#[derive(Debug, Default)]
pub struct SiblingCache {
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl SiblingCache {
    fn element_children(&mut self, tree: &DomTree, parent: NodeId) -> &[NodeId] {
        self.children
            .entry(parent)
            .or_insert_with(|| tree.element_children(parent).collect())
    }
}

/// Narrow `candidates` by `pseudo`.
///
/// A formula `:nth-child` instead replaces each candidate with the element
/// siblings sharing its tag at the positions the formula steps through, in
/// first-emitted order without duplicates.
pub fn apply(
    pseudo: &PseudoClass,
    tree: &DomTree,
    mut candidates: Vec<NodeId>,
    cache: &mut SiblingCache,
) -> Vec<NodeId> {
    if let PseudoClass::NthChild(argument @ NthArgument::Formula { .. }) = pseudo {
        return nth_child_siblings(tree, &candidates, *argument, cache);
    }
    candidates.retain(|&c| matches(pseudo, tree, c, cache));
    candidates
}

/// Whether [`apply`] can add elements that were not candidates.
pub fn expands(pseudo: &PseudoClass) -> bool {
    matches!(pseudo, PseudoClass::NthChild(NthArgument::Formula { .. }))
}

/// Whether `node` satisfies `pseudo` on its own.
pub fn matches(
    pseudo: &PseudoClass,
    tree: &DomTree,
    node: NodeId,
    cache: &mut SiblingCache,
) -> bool {
    match pseudo {
        PseudoClass::FirstChild => first_child(tree, node),
        PseudoClass::LastChild => last_child(tree, node),
        PseudoClass::OnlyChild => first_child(tree, node) && last_child(tree, node),
        PseudoClass::FirstOfType => {
            of_type_position(tree, node, cache).is_some_and(|(i, _)| i == 1)
        }
        PseudoClass::LastOfType => {
            of_type_position(tree, node, cache).is_some_and(|(i, total)| i == total)
        }
        PseudoClass::OnlyOfType => {
            of_type_position(tree, node, cache).is_some_and(|(_, total)| total == 1)
        }
        PseudoClass::NthChild(argument) => nth_child(tree, node, *argument, cache),
        PseudoClass::NthOfType(argument) => {
            of_type_position(tree, node, cache).is_some_and(|(i, _)| argument.matches(i))
        }
        PseudoClass::Empty => tree.children(node).is_empty(),
        PseudoClass::Contains(text) => inner_html(tree, node).contains(text.as_str()),
        PseudoClass::Enabled => !tree.has_attribute(node, "disabled"),
        PseudoClass::Disabled => tree.has_attribute(node, "disabled"),
        PseudoClass::Checked => tree.has_attribute(node, "checked"),
        PseudoClass::Not(negation) => !negation_matches(negation, tree, node),
    }
}

fn first_child(tree: &DomTree, node: NodeId) -> bool {
    tree.parent(node)
        .is_some_and(|parent| tree.first_element_child(parent) == Some(node))
}

fn last_child(tree: &DomTree, node: NodeId) -> bool {
    tree.parent(node)
        .is_some_and(|parent| tree.last_element_child(parent) == Some(node))
}

/// `Position(k)`: the parent's k-th element child must be this node.
/// `Formula`: this node's own position must be hit; [`apply`] expands instead.
fn nth_child(
    tree: &DomTree,
    node: NodeId,
    argument: NthArgument,
    cache: &mut SiblingCache,
) -> bool {
    if argument == NthArgument::Any {
        return true;
    }
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    let children = cache.element_children(tree, parent);
    match argument {
        NthArgument::Position(k) => k
            .checked_sub(1)
            .and_then(|index| children.get(index))
            .is_some_and(|&child| child == node),
        _ => children
            .iter()
            .position(|&child| child == node)
            .is_some_and(|index| argument.matches(index + 1)),
    }
}

fn nth_child_siblings(
    tree: &DomTree,
    candidates: &[NodeId],
    argument: NthArgument,
    cache: &mut SiblingCache,
) -> Vec<NodeId> {
    let mut scanned = HashSet::new();
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for &candidate in candidates {
        let (Some(parent), Some(tag)) = (tree.parent(candidate), tree.tag_name(candidate)) else {
            continue;
        };
        if !scanned.insert((parent, tag.to_ascii_lowercase())) {
            continue;
        }
        for (index, &child) in cache.element_children(tree, parent).iter().enumerate() {
            if argument.matches(index + 1) && same_tag(tree, child, candidate) && seen.insert(child)
            {
                found.push(child);
            }
        }
    }
    found
}

/// 1-based position among same-tag element siblings, and their count.
fn of_type_position(
    tree: &DomTree,
    node: NodeId,
    cache: &mut SiblingCache,
) -> Option<(usize, usize)> {
    let parent = tree.parent(node)?;
    let mut index = None;
    let mut total = 0;
    for &child in cache.element_children(tree, parent) {
        if same_tag(tree, child, node) {
            total += 1;
            if child == node {
                index = Some(total);
            }
        }
    }
    index.map(|i| (i, total))
}

fn same_tag(tree: &DomTree, a: NodeId, b: NodeId) -> bool {
    match (tree.tag_name(a), tree.tag_name(b)) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

fn negation_matches(negation: &Negation, tree: &DomTree, node: NodeId) -> bool {
    tree.as_element(node).is_some_and(|element| {
        element.has_tag(&negation.tag)
            && negation
                .id
                .as_deref()
                .is_none_or(|id| element.id() == Some(id))
            && negation.classes.iter().all(|class| element.has_class(class))
            && negation
                .attributes
                .iter()
                .all(|filter| attribute_matches(filter, element))
    })
}
