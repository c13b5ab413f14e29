//! Axis navigation and node tests.
//!
//! [§ 2.2 Axes](https://www.w3.org/TR/xpath-10/#axes)

use flow_dom::{DomTree, NodeId, NodeType};

use crate::parser::{Axis, NodeTest};

/// Nodes along `axis` from `node`, in axis order (reverse axes nearest
/// first). The attribute axis is handled by the evaluator.
#[must_use]
pub fn navigate(tree: &DomTree, node: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => tree.children(node).to_vec(),
        Axis::Descendant => tree.descendants(node).collect(),
        Axis::DescendantOrSelf => std::iter::once(node).chain(tree.descendants(node)).collect(),
        Axis::Parent => tree.parent(node).into_iter().collect(),
        Axis::Ancestor => tree.ancestors(node).collect(),
        Axis::AncestorOrSelf => std::iter::once(node).chain(tree.ancestors(node)).collect(),
        Axis::FollowingSibling => tree.following_siblings(node).collect(),
        Axis::PrecedingSibling => tree.preceding_siblings(node).collect(),
        Axis::Following => following(tree, node),
        Axis::Preceding => preceding(tree, node),
        Axis::SelfAxis => vec![node],
        Axis::Attribute => Vec::new(),
    }
}

/// "the following axis contains all nodes in the same document as the context
/// node that are after the context node in document order, excluding any
/// descendants"
fn following(tree: &DomTree, node: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    for start in std::iter::once(node).chain(tree.ancestors(node)) {
        for sibling in tree.following_siblings(start) {
            result.push(sibling);
            result.extend(tree.descendants(sibling));
        }
    }
    result.sort_by(|&a, &b| tree.compare_tree_order(a, b));
    result
}

/// "the preceding axis contains all nodes in the same document as the context
/// node that are before the context node in document order, excluding any
/// ancestors"
fn preceding(tree: &DomTree, node: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    for start in std::iter::once(node).chain(tree.ancestors(node)) {
        for sibling in tree.preceding_siblings(start) {
            result.push(sibling);
            result.extend(tree.descendants(sibling));
        }
    }
    // Reverse axis: nearest first.
    result.sort_by(|&a, &b| tree.compare_tree_order(b, a));
    result
}

/// [§ 2.3 Node Tests](https://www.w3.org/TR/xpath-10/#node-tests)
///
/// "Every axis has a principal node type." For every axis handled here it is
/// element, so `*` and name tests select elements only. Name tests compare
/// ASCII-case-insensitively, as HTML documents do.
#[must_use]
pub fn matches_node_test(tree: &DomTree, node: NodeId, test: &NodeTest) -> bool {
    let Some(data) = tree.get(node) else {
        return false;
    };
    match (test, &data.node_type) {
        (NodeTest::Node, _) => true,
        (NodeTest::Any, NodeType::Element(_)) => true,
        (NodeTest::Name(name), NodeType::Element(element)) => {
            element.tag_name.eq_ignore_ascii_case(name)
        }
        (NodeTest::Text, NodeType::Text(_)) => true,
        (NodeTest::Comment, NodeType::Comment(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_dom::parse_markup;

    #[test]
    fn test_sibling_axes() {
        let tree = parse_markup("<ul><li>1</li><li>2</li><li>3</li></ul>");
        let items = tree.elements_by_tag_name(NodeId::ROOT, "li");
        assert_eq!(
            navigate(&tree, items[1], Axis::FollowingSibling),
            vec![items[2]]
        );
        assert_eq!(
            navigate(&tree, items[2], Axis::PrecedingSibling),
            vec![items[1], items[0]]
        );
    }

    #[test]
    fn test_following_and_preceding() {
        let tree = parse_markup("<a><b></b><c><d></d></c></a><e></e>");
        let tag = |t: &str| tree.elements_by_tag_name(NodeId::ROOT, t)[0];
        assert_eq!(
            navigate(&tree, tag("b"), Axis::Following),
            vec![tag("c"), tag("d"), tag("e")]
        );
        assert_eq!(navigate(&tree, tag("d"), Axis::Preceding), vec![tag("b")]);
    }

    #[test]
    fn test_node_tests() {
        let tree = parse_markup("<DIV>text<!--c--></DIV>");
        let div = tree.document_element().unwrap();
        let children = tree.children(div);
        assert!(matches_node_test(&tree, div, &NodeTest::Name("div".to_string())));
        assert!(matches_node_test(&tree, div, &NodeTest::Any));
        assert!(!matches_node_test(&tree, children[0], &NodeTest::Any));
        assert!(matches_node_test(&tree, children[0], &NodeTest::Text));
        assert!(matches_node_test(&tree, children[1], &NodeTest::Comment));
        assert!(matches_node_test(&tree, children[1], &NodeTest::Node));
    }
}
