//! XPath Evaluation Engine
//!
//! Evaluates parsed XPath expressions against a [`DomTree`].

use std::collections::{HashMap, HashSet};

use flow_dom::{DomTree, NodeId};

use crate::XPathError;
use crate::axes::{matches_node_test, navigate};
use crate::functions;
use crate::parser::{Axis, BinaryOp, Expr, NodeTest, Step};
use crate::value::XPathValue;

/// Pre-order position of every node reachable from one tree root.
///
/// Node ids are allocation order, not document order, once a tree has been
/// mutated; node-sets are sorted with this index instead.
pub struct DocumentOrder {
    index: HashMap<NodeId, usize>,
}

impl DocumentOrder {
    /// Index the tree containing `node`.
    #[must_use]
    pub fn new(tree: &DomTree, node: NodeId) -> Self {
        let root = tree.ancestors(node).last().unwrap_or(node);
        let index = std::iter::once(root)
            .chain(tree.descendants(root))
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();
        Self { index }
    }

    /// Sort into document order and drop duplicates.
    pub fn sort(&self, nodes: &mut Vec<NodeId>) {
        nodes.sort_by_key(|id| (self.index.get(id).copied().unwrap_or(usize::MAX), id.0));
        nodes.dedup();
    }
}

/// Evaluation context
pub struct EvalContext<'a> {
    /// The document being queried
    pub tree: &'a DomTree,
    /// The context node
    pub node: NodeId,
    /// "the context position" (1-based)
    pub position: usize,
    /// "the context size"
    pub size: usize,
    /// Shared document-order index
    pub order: &'a DocumentOrder,
}

impl<'a> EvalContext<'a> {
    /// A context of size one at `node`.
    #[must_use]
    pub const fn new(tree: &'a DomTree, node: NodeId, order: &'a DocumentOrder) -> Self {
        Self {
            tree,
            node,
            position: 1,
            size: 1,
            order,
        }
    }

    const fn at(&self, node: NodeId, position: usize, size: usize) -> Self {
        Self {
            tree: self.tree,
            node,
            position,
            size,
            order: self.order,
        }
    }
}

/// Evaluate `expr` in `ctx`.
///
/// # Errors
///
/// Returns an error for type errors (steps applied to non-node-sets) and for
/// unknown functions or wrong argument counts.
pub fn evaluate(expr: &Expr, ctx: &EvalContext<'_>) -> Result<XPathValue, XPathError> {
    match expr {
        Expr::Root => {
            let root = ctx.tree.ancestors(ctx.node).last().unwrap_or(ctx.node);
            Ok(XPathValue::NodeSet(vec![root]))
        }
        Expr::Context => Ok(XPathValue::NodeSet(vec![ctx.node])),
        Expr::Parent => Ok(XPathValue::NodeSet(
            ctx.tree.parent(ctx.node).into_iter().collect(),
        )),
        Expr::Union(left, right) => {
            let mut nodes = expect_nodeset(evaluate(left, ctx)?, "|")?;
            nodes.extend(expect_nodeset(evaluate(right, ctx)?, "|")?);
            ctx.order.sort(&mut nodes);
            Ok(XPathValue::NodeSet(nodes))
        }
        Expr::Path(base, step) => {
            let nodes = expect_nodeset(evaluate(base, ctx)?, "/")?;
            apply_step(ctx, &nodes, step)
        }
        Expr::Filter(base, predicate) => {
            let nodes = expect_nodeset(evaluate(base, ctx)?, "[]")?;
            Ok(XPathValue::NodeSet(apply_predicate(ctx, nodes, predicate)?))
        }
        Expr::Function(name, args) => functions::call(name, args, ctx),
        Expr::Binary(left, op, right) => evaluate_binary(left, *op, right, ctx),
        Expr::Negate(inner) => Ok(XPathValue::Number(
            -evaluate(inner, ctx)?.to_number(ctx.tree),
        )),
        Expr::Number(n) => Ok(XPathValue::Number(*n)),
        Expr::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expr::Step(step) => apply_step(ctx, &[ctx.node], step),
    }
}

fn expect_nodeset(value: XPathValue, operator: &'static str) -> Result<Vec<NodeId>, XPathError> {
    match value {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        _ => Err(XPathError::NotANodeSet(operator)),
    }
}

/// [§ 2.1 Location Steps](https://www.w3.org/TR/xpath-10/#section-Location-Steps)
///
/// "The node-set selected by the location step is the node-set that results
/// from generating an initial node-set from the axis and node-test, and then
/// filtering that node-set by each of the predicates in turn."
fn apply_step(
    ctx: &EvalContext<'_>,
    nodes: &[NodeId],
    step: &Step,
) -> Result<XPathValue, XPathError> {
    if step.axis == Axis::Attribute {
        if !step.predicates.is_empty() {
            return Err(XPathError::Unsupported("predicates on the attribute axis"));
        }
        return Ok(XPathValue::StringList(attribute_values(
            ctx.tree,
            nodes,
            &step.node_test,
        )));
    }

    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for &node in nodes {
        let mut selected: Vec<NodeId> = navigate(ctx.tree, node, step.axis)
            .into_iter()
            .filter(|&candidate| matches_node_test(ctx.tree, candidate, &step.node_test))
            .collect();
        for predicate in &step.predicates {
            selected = apply_predicate(ctx, selected, predicate)?;
        }
        result.extend(selected.into_iter().filter(|&id| seen.insert(id)));
    }
    ctx.order.sort(&mut result);
    Ok(XPathValue::NodeSet(result))
}

fn attribute_values(tree: &DomTree, nodes: &[NodeId], test: &NodeTest) -> Vec<String> {
    let mut values = Vec::new();
    for &node in nodes {
        let Some(element) = tree.as_element(node) else {
            continue;
        };
        for (name, value) in element.attrs.iter() {
            let selected = match test {
                NodeTest::Any | NodeTest::Node => true,
                NodeTest::Name(wanted) => name.eq_ignore_ascii_case(wanted),
                NodeTest::Text | NodeTest::Comment => false,
            };
            if selected {
                values.push(value.to_string());
            }
        }
    }
    values
}

/// [§ 2.4 Predicates](https://www.w3.org/TR/xpath-10/#predicates)
///
/// "If the result is a number, the result will be converted to true if the
/// number is equal to the context position and will be converted to false
/// otherwise; if the result is not a number, then the result will be converted
/// as if by a call to the boolean function."
fn apply_predicate(
    ctx: &EvalContext<'_>,
    nodes: Vec<NodeId>,
    predicate: &Expr,
) -> Result<Vec<NodeId>, XPathError> {
    let size = nodes.len();
    let mut kept = Vec::with_capacity(size);
    for (index, node) in nodes.into_iter().enumerate() {
        let position = index + 1;
        let inner = ctx.at(node, position, size);
        let keep = match evaluate(predicate, &inner)? {
            XPathValue::Number(n) => position_equals(position, n),
            other => other.to_boolean(),
        };
        if keep {
            kept.push(node);
        }
    }
    Ok(kept)
}

#[allow(clippy::cast_precision_loss)]
fn position_equals(position: usize, n: f64) -> bool {
    position as f64 == n
}

fn evaluate_binary(
    left: &Expr,
    op: BinaryOp,
    right: &Expr,
    ctx: &EvalContext<'_>,
) -> Result<XPathValue, XPathError> {
    match op {
        BinaryOp::Or => {
            let value = evaluate(left, ctx)?.to_boolean() || evaluate(right, ctx)?.to_boolean();
            Ok(XPathValue::Boolean(value))
        }
        BinaryOp::And => {
            let value = evaluate(left, ctx)?.to_boolean() && evaluate(right, ctx)?.to_boolean();
            Ok(XPathValue::Boolean(value))
        }
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq => {
            let l = evaluate(left, ctx)?;
            let r = evaluate(right, ctx)?;
            Ok(XPathValue::Boolean(compare(ctx.tree, &l, op, &r)))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let l = evaluate(left, ctx)?.to_number(ctx.tree);
            let r = evaluate(right, ctx)?.to_number(ctx.tree);
            Ok(XPathValue::Number(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
                _ => l % r,
            }))
        }
    }
}

/// [§ 3.4 Booleans](https://www.w3.org/TR/xpath-10/#booleans)
///
/// Comparisons involving node-sets (or attribute lists) are existential:
/// "the comparison will be true if and only if there is a node in the
/// node-set such that the result of performing the comparison on the
/// string-value of the node and the other object is true."
fn compare(tree: &DomTree, left: &XPathValue, op: BinaryOp, right: &XPathValue) -> bool {
    match (left.member_strings(tree), right.member_strings(tree)) {
        (Some(ls), Some(rs)) => ls.iter().any(|l| {
            rs.iter().any(|r| {
                compare_scalars(
                    tree,
                    &XPathValue::String(l.clone()),
                    op,
                    &XPathValue::String(r.clone()),
                )
            })
        }),
        (Some(ls), None) => {
            if let XPathValue::Boolean(_) = right {
                compare_scalars(tree, &XPathValue::Boolean(left.to_boolean()), op, right)
            } else {
                ls.into_iter()
                    .any(|l| compare_scalars(tree, &XPathValue::String(l), op, right))
            }
        }
        (None, Some(rs)) => {
            if let XPathValue::Boolean(_) = left {
                compare_scalars(tree, left, op, &XPathValue::Boolean(right.to_boolean()))
            } else {
                rs.into_iter()
                    .any(|r| compare_scalars(tree, left, op, &XPathValue::String(r)))
            }
        }
        (None, None) => compare_scalars(tree, left, op, right),
    }
}

/// "If at least one object to be compared is a boolean, then each object to be
/// compared is converted to a boolean... Otherwise, if at least one object to
/// be compared is a number... Otherwise, both objects to be compared are
/// converted to strings." Relational operators always compare numbers.
fn compare_scalars(tree: &DomTree, left: &XPathValue, op: BinaryOp, right: &XPathValue) -> bool {
    let equality = matches!(op, BinaryOp::Eq | BinaryOp::NotEq);
    let equal = if !equality {
        None
    } else if matches!(left, XPathValue::Boolean(_)) || matches!(right, XPathValue::Boolean(_)) {
        Some(left.to_boolean() == right.to_boolean())
    } else if matches!(left, XPathValue::Number(_)) || matches!(right, XPathValue::Number(_)) {
        let (l, r) = (left.to_number(tree), right.to_number(tree));
        Some(l == r)
    } else {
        Some(left.to_string_value(tree) == right.to_string_value(tree))
    };

    match (op, equal) {
        (BinaryOp::Eq, Some(equal)) => equal,
        (BinaryOp::NotEq, Some(equal)) => !equal,
        _ => {
            let (l, r) = (left.to_number(tree), right.to_number(tree));
            match op {
                BinaryOp::Lt => l < r,
                BinaryOp::LtEq => l <= r,
                BinaryOp::Gt => l > r,
                _ => l >= r,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use flow_dom::parse_markup;

    fn eval_at(tree: &DomTree, node: NodeId, xpath: &str) -> XPathValue {
        let order = DocumentOrder::new(tree, node);
        let ctx = EvalContext::new(tree, node, &order);
        evaluate(&parse(xpath).unwrap(), &ctx).unwrap()
    }

    #[test]
    fn test_descendant_with_attribute_predicate() {
        let tree = parse_markup(r#"<div><p id="a"></p><p id="b"></p></div>"#);
        let result = eval_at(&tree, NodeId::ROOT, ".//p[@id='b']");
        assert_eq!(result, XPathValue::NodeSet(vec![tree.get_element_by_id("b").unwrap()]));
    }

    #[test]
    fn test_positional_predicate_counts_along_axis() {
        let tree = parse_markup("<ul><li>1</li><li>2</li><li>3</li></ul>");
        let items = tree.elements_by_tag_name(NodeId::ROOT, "li");
        let next = eval_at(&tree, items[0], "following-sibling::*[1]");
        assert_eq!(next, XPathValue::NodeSet(vec![items[1]]));
        let prev = eval_at(&tree, items[2], "preceding-sibling::*[1]");
        assert_eq!(prev, XPathValue::NodeSet(vec![items[1]]));
    }

    #[test]
    fn test_missing_attribute_comparisons_are_false() {
        let tree = parse_markup("<p></p>");
        let p = tree.document_element().unwrap();
        assert_eq!(eval_at(&tree, p, "@id = ''"), XPathValue::Boolean(false));
        assert_eq!(eval_at(&tree, p, "@id != ''"), XPathValue::Boolean(false));
        assert_eq!(eval_at(&tree, p, "not(@id)"), XPathValue::Boolean(true));
    }

    #[test]
    fn test_arithmetic_and_mod() {
        let tree = DomTree::new();
        assert_eq!(
            eval_at(&tree, NodeId::ROOT, "(5 + 1) mod 4"),
            XPathValue::Number(2.0)
        );
        assert_eq!(eval_at(&tree, NodeId::ROOT, "7 div 2"), XPathValue::Number(3.5));
        assert_eq!(eval_at(&tree, NodeId::ROOT, "-3 mod 2"), XPathValue::Number(-1.0));
    }

    #[test]
    fn test_step_on_string_is_type_error() {
        let tree = DomTree::new();
        let order = DocumentOrder::new(&tree, NodeId::ROOT);
        let ctx = EvalContext::new(&tree, NodeId::ROOT, &order);
        let expr = parse("'a'/child::b").unwrap();
        assert!(matches!(evaluate(&expr, &ctx), Err(XPathError::NotANodeSet(_))));
    }
}
