//! Selector data model and right-to-left matching.
//!
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/)

use flow_dom::{DomTree, ElementData, NodeId, NodeType};

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    /// "A type selector is the name of a document language element type,
    /// and represents an instance of that element type in the document tree."
    Type(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    Class(String),

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    Id(String),

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    Attribute(AttributeSelector),

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    PseudoClass(PseudoClass),

    /// [§ 4.3 :not()](https://www.w3.org/TR/selectors-4/#negation)
    /// "The negation pseudo-class, :not(), is a functional pseudo-class taking
    /// a selector list as an argument. It represents an element that is not
    /// represented by its argument."
    Not(Vec<CompoundSelector>),

    /// User-action pseudo-classes (`:hover`, `:focus`, ...) and
    /// pseudo-elements. Valid syntax, but a static document never has an
    /// element in those states.
    NeverMatch,
}

/// Pseudo-classes that can be decided from the tree alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    /// [§ 14.1 :root](https://www.w3.org/TR/selectors-4/#the-root-pseudo)
    Root,
    /// [§ 14.4.1 :first-child](https://www.w3.org/TR/selectors-4/#the-first-child-pseudo)
    FirstChild,
    /// [§ 14.4.2 :last-child](https://www.w3.org/TR/selectors-4/#the-last-child-pseudo)
    LastChild,
    /// [§ 14.4.3 :only-child](https://www.w3.org/TR/selectors-4/#the-only-child-pseudo)
    OnlyChild,
    /// [§ 14.5.3 :first-of-type](https://www.w3.org/TR/selectors-4/#the-first-of-type-pseudo)
    FirstOfType,
    /// [§ 14.5.4 :last-of-type](https://www.w3.org/TR/selectors-4/#the-last-of-type-pseudo)
    LastOfType,
    /// [§ 14.5.5 :only-of-type](https://www.w3.org/TR/selectors-4/#the-only-of-type-pseudo)
    OnlyOfType,
    /// [§ 14.4.4 :nth-child()](https://www.w3.org/TR/selectors-4/#the-nth-child-pseudo)
    NthChild(Nth),
    /// [§ 14.4.5 :nth-last-child()](https://www.w3.org/TR/selectors-4/#the-nth-last-child-pseudo)
    NthLastChild(Nth),
    /// [§ 14.5.1 :nth-of-type()](https://www.w3.org/TR/selectors-4/#the-nth-of-type-pseudo)
    NthOfType(Nth),
    /// [§ 14.5.2 :nth-last-of-type()](https://www.w3.org/TR/selectors-4/#the-nth-last-of-type-pseudo)
    NthLastOfType(Nth),
    /// [§ 14.2 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
    Empty,
    /// [§ 8.2 :link](https://www.w3.org/TR/selectors-4/#the-link-pseudo)
    Link,
    /// [§ 13.3.1 :checked](https://www.w3.org/TR/selectors-4/#checked)
    Checked,
    /// [§ 13.1.2 :disabled](https://www.w3.org/TR/selectors-4/#disabled-pseudo)
    Disabled,
    /// [§ 13.1.1 :enabled](https://www.w3.org/TR/selectors-4/#enabled-pseudo)
    Enabled,
}

/// [§ 14.3 An+B microsyntax](https://www.w3.org/TR/css-syntax-3/#anb-microsyntax)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    /// Step `A`
    pub a: i32,
    /// Offset `B`
    pub b: i32,
}

impl Nth {
    /// "represents an element that has An+B-1 siblings before it ... for any
    /// positive integer or zero value of n"
    #[must_use]
    pub fn matches(self, position: usize) -> bool {
        let Ok(position) = i64::try_from(position) else {
            return false;
        };
        let (a, b) = (i64::from(self.a), i64::from(self.b));
        if a == 0 {
            return position == b;
        }
        let diff = position - b;
        diff % a == 0 && diff / a >= 0
    }
}

/// Attribute selectors per [§ 6.4](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// `[attr]`
    Exists(String),
    /// `[attr=value]`
    Equals(String, String),
    /// `[attr~=value]`: one whitespace-separated word equals `value`
    Includes(String, String),
    /// `[attr|=value]`: equals `value` or starts with `value-`
    DashMatch(String, String),
    /// `[attr^=value]`
    PrefixMatch(String, String),
    /// `[attr$=value]`
    SuffixMatch(String, String),
    /// `[attr*=value]`
    SubstringMatch(String, String),
}

impl AttributeSelector {
    /// "[att^=val] ... If 'val' is the empty string then the selector does not
    /// represent anything." The same holds for `$=`, `*=` and `~=`.
    fn matches(&self, element: &ElementData) -> bool {
        let attrs = &element.attrs;
        match self {
            Self::Exists(name) => attrs.contains_key(name),
            Self::Equals(name, val) => attrs.get(name).is_some_and(|v| v == val),
            Self::Includes(name, val) => {
                !val.is_empty()
                    && attrs
                        .get(name)
                        .is_some_and(|v| v.split_ascii_whitespace().any(|w| w == val))
            }
            Self::DashMatch(name, val) => attrs.get(name).is_some_and(|v| {
                v == val || v.strip_prefix(val.as_str()).is_some_and(|r| r.starts_with('-'))
            }),
            Self::PrefixMatch(name, val) => {
                !val.is_empty() && attrs.get(name).is_some_and(|v| v.starts_with(val.as_str()))
            }
            Self::SuffixMatch(name, val) => {
                !val.is_empty() && attrs.get(name).is_some_and(|v| v.ends_with(val.as_str()))
            }
            Self::SubstringMatch(name, val) => {
                !val.is_empty() && attrs.get(name).is_some_and(|v| v.contains(val.as_str()))
            }
        }
    }
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator, and represents a set of simultaneous
/// conditions on a single element."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    /// The simple selectors, all of which must match.
    pub simple_selectors: Vec<SimpleSelector>,
}

impl CompoundSelector {
    /// Whether every simple selector matches `node`. Non-elements never match.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(element) = tree.as_element(node) else {
            return false;
        };
        self.simple_selectors
            .iter()
            .all(|simple| simple_matches(simple, tree, node, element))
    }
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `A B`
    Descendant,
    /// `A > B`
    Child,
    /// `A + B`
    NextSibling,
    /// `A ~ B`
    SubsequentSibling,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// Stored subject first: for `A > B C` the subject is `C` and `combinators`
/// is `[(Descendant, B), (Child, A)]`, the order in which matching walks
/// away from the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound selector.
    pub subject: CompoundSelector,
    /// (combinator, compound) pairs going left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    /// [§ 4.1 Selector Matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
    ///
    /// Matches right to left. Descendant and subsequent-sibling combinators
    /// try every candidate, so `div > p span` matches when any `p` ancestor
    /// has a `div` parent, not only the nearest one.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.subject.matches(tree, node) && self.matches_from(0, tree, node)
    }

    fn matches_from(&self, index: usize, tree: &DomTree, node: NodeId) -> bool {
        let Some((combinator, compound)) = self.combinators.get(index) else {
            return true;
        };
        let next = |candidate: NodeId| {
            compound.matches(tree, candidate) && self.matches_from(index + 1, tree, candidate)
        };
        match combinator {
            Combinator::Descendant => tree.ancestors(node).any(next),
            Combinator::Child => tree.parent(node).is_some_and(next),
            Combinator::NextSibling => tree.prev_element_sibling(node).is_some_and(next),
            Combinator::SubsequentSibling => tree
                .preceding_siblings(node)
                .filter(|&s| tree.is_element(s))
                .any(next),
        }
    }
}

fn simple_matches(
    simple: &SimpleSelector,
    tree: &DomTree,
    node: NodeId,
    element: &ElementData,
) -> bool {
    match simple {
        SimpleSelector::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
        SimpleSelector::Universal => true,
        SimpleSelector::Class(class_name) => element.has_class(class_name),
        SimpleSelector::Id(id) => element.id() == Some(id.as_str()),
        SimpleSelector::Attribute(attr) => attr.matches(element),
        SimpleSelector::PseudoClass(pc) => pseudo_class_matches(*pc, tree, node, element),
        SimpleSelector::Not(list) => !list.iter().any(|c| c.matches(tree, node)),
        SimpleSelector::NeverMatch => false,
    }
}

/// 1-based index of `node` among its parent's element children that satisfy
/// `same_kind`, counted from the front, and the total count.
fn sibling_position(
    tree: &DomTree,
    node: NodeId,
    same_kind: impl Fn(&ElementData) -> bool,
) -> Option<(usize, usize)> {
    let parent = tree.parent(node)?;
    let mut index = None;
    let mut total = 0;
    for child in tree.element_children(parent) {
        if tree.as_element(child).is_some_and(&same_kind) {
            total += 1;
            if child == node {
                index = Some(total);
            }
        }
    }
    index.map(|i| (i, total))
}

fn pseudo_class_matches(
    pc: PseudoClass,
    tree: &DomTree,
    node: NodeId,
    element: &ElementData,
) -> bool {
    let any_element = |_: &ElementData| true;
    let same_type = |e: &ElementData| e.tag_name.eq_ignore_ascii_case(&element.tag_name);
    // (index from the front, index from the back)
    let positions = |of_type: bool| {
        let found = if of_type {
            sibling_position(tree, node, same_type)
        } else {
            sibling_position(tree, node, any_element)
        };
        found.map(|(index, total)| (index, total - index + 1))
    };

    match pc {
        // "In HTML, this is the html element."
        PseudoClass::Root => tree.document_element() == Some(node),
        PseudoClass::FirstChild => positions(false).is_some_and(|(front, _)| front == 1),
        PseudoClass::LastChild => positions(false).is_some_and(|(_, back)| back == 1),
        PseudoClass::OnlyChild => positions(false) == Some((1, 1)),
        PseudoClass::FirstOfType => positions(true).is_some_and(|(front, _)| front == 1),
        PseudoClass::LastOfType => positions(true).is_some_and(|(_, back)| back == 1),
        PseudoClass::OnlyOfType => positions(true) == Some((1, 1)),
        PseudoClass::NthChild(nth) => positions(false).is_some_and(|(front, _)| nth.matches(front)),
        PseudoClass::NthLastChild(nth) => {
            positions(false).is_some_and(|(_, back)| nth.matches(back))
        }
        PseudoClass::NthOfType(nth) => positions(true).is_some_and(|(front, _)| nth.matches(front)),
        PseudoClass::NthLastOfType(nth) => {
            positions(true).is_some_and(|(_, back)| nth.matches(back))
        }

        // "The :empty pseudo-class represents an element that has no
        // children." Comments do not count; white space text does, as in
        // shipping engines.
        PseudoClass::Empty => tree.children(node).iter().all(|&c| {
            match tree.get(c).map(|n| &n.node_type) {
                Some(NodeType::Text(t)) => t.is_empty(),
                Some(NodeType::Comment(_)) => true,
                _ => false,
            }
        }),

        PseudoClass::Link => {
            matches!(element.tag_name.as_str(), "a" | "area") && element.attrs.contains_key("href")
        }
        PseudoClass::Checked => match element.tag_name.as_str() {
            "option" => element.attrs.contains_key("selected"),
            _ => element.attrs.contains_key("checked"),
        },
        PseudoClass::Disabled => element.attrs.contains_key("disabled"),
        PseudoClass::Enabled => !element.attrs.contains_key("disabled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_formula() {
        let odd = Nth { a: 2, b: 1 };
        assert!(odd.matches(1) && odd.matches(3) && !odd.matches(2));
        let first_three = Nth { a: -1, b: 3 };
        assert!(first_three.matches(1) && first_three.matches(3) && !first_three.matches(4));
        let exact = Nth { a: 0, b: 2 };
        assert!(exact.matches(2) && !exact.matches(4));
        let from_fourth = Nth { a: 1, b: 4 };
        assert!(!from_fourth.matches(3) && from_fourth.matches(9));
    }
}
