//! XPath 1.0 evaluator for flow-dom trees.
//!
//! Plays the role of the host document's
//! [`document.evaluate()`](https://dom.spec.whatwg.org/#dom-xpathevaluatorbase-evaluate):
//! an expression string and a context node go in, an [`XPathResult`] that is
//! drained with [`XPathResult::iterate_next`] comes out.
//!
//! # Example
//!
//! ```
//! use flow_dom::parse_markup;
//! use flow_xpath::XPathEvaluator;
//!
//! let tree = parse_markup("<ul><li>a</li><li>b</li></ul>");
//! let mut result = XPathEvaluator::new()
//!     .evaluate(".//li[2]", &tree, tree.root())
//!     .unwrap();
//! let second = result.iterate_next().unwrap();
//! assert_eq!(tree.text_content(second), "b");
//! assert!(result.iterate_next().is_none());
//! ```
//!
//! Supported: the core function library, every axis except `namespace::`,
//! and the `node()`, `text()` and `comment()` node tests. Variables and
//! namespaces are not supported.

pub mod axes;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

use flow_dom::{DomTree, NodeId};
use thiserror::Error;

use crate::eval::{DocumentOrder, EvalContext};
use crate::parser::Expr;
pub use crate::value::XPathValue;

/// Errors raised while compiling or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    /// The expression text is not valid XPath.
    #[error("XPath syntax error at byte {offset}: {message}")]
    Syntax {
        /// What went wrong
        message: String,
        /// Byte offset into the expression
        offset: usize,
    },
    /// An axis name outside XPath 1.0 (or the unsupported namespace axis).
    #[error("unknown axis '{0}'")]
    UnknownAxis(String),
    /// A function outside the core library.
    #[error("unknown function '{0}()'")]
    UnknownFunction(String),
    /// A core function called with the wrong number of arguments.
    #[error("{function}() expects {expected} argument(s), got {found}")]
    Arity {
        /// Function name
        function: String,
        /// Accepted argument counts
        expected: &'static str,
        /// Arguments supplied
        found: usize,
    },
    /// An operator that needs a node-set was given another type.
    #[error("'{0}' requires a node-set operand")]
    NotANodeSet(&'static str),
    /// A construct the evaluator recognizes but does not implement.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    /// The context node does not exist in the tree.
    #[error("context node {0:?} is not in the tree")]
    InvalidContext(NodeId),
}

/// [§ XPathEvaluator](https://dom.spec.whatwg.org/#interface-xpathevaluator)
///
/// Stateless entry point; compile once with [`Self::create_expression`] or
/// evaluate directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct XPathEvaluator;

impl XPathEvaluator {
    /// Create an evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parse `expression` for repeated evaluation.
    ///
    /// # Errors
    ///
    /// Returns a syntax error when `expression` does not parse.
    pub fn create_expression(&self, expression: &str) -> Result<XPathExpression, XPathError> {
        Ok(XPathExpression {
            source: expression.to_string(),
            expr: parser::parse(expression)?,
        })
    }

    /// Parse and evaluate `expression` with `context` as the context node.
    ///
    /// # Errors
    ///
    /// Returns syntax errors, evaluation errors, and
    /// [`XPathError::InvalidContext`] for a context node outside `tree`.
    pub fn evaluate(
        &self,
        expression: &str,
        tree: &DomTree,
        context: NodeId,
    ) -> Result<XPathResult, XPathError> {
        self.create_expression(expression)?.evaluate(tree, context)
    }
}

/// [§ XPathExpression](https://dom.spec.whatwg.org/#interface-xpathexpression)
#[derive(Debug, Clone)]
pub struct XPathExpression {
    source: String,
    expr: Expr,
}

impl XPathExpression {
    /// The expression text this was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate with `context` as the context node.
    ///
    /// # Errors
    ///
    /// See [`XPathEvaluator::evaluate`].
    pub fn evaluate(&self, tree: &DomTree, context: NodeId) -> Result<XPathResult, XPathError> {
        if tree.get(context).is_none() {
            return Err(XPathError::InvalidContext(context));
        }
        let order = DocumentOrder::new(tree, context);
        let ctx = EvalContext::new(tree, context, &order);
        let value = eval::evaluate(&self.expr, &ctx)?;
        Ok(XPathResult { value, cursor: 0 })
    }
}

/// [§ XPathResult](https://dom.spec.whatwg.org/#interface-xpathresult)
///
/// Node-set results behave as `ORDERED_NODE_ITERATOR_TYPE`; other results
/// expose their scalar value.
#[derive(Debug, Clone)]
pub struct XPathResult {
    value: XPathValue,
    cursor: usize,
}

impl XPathResult {
    /// "iterateNext()": the next node in document order, or `None` when
    /// exhausted or when the result is not a node-set.
    pub fn iterate_next(&mut self) -> Option<NodeId> {
        let node = self.value.as_nodeset()?.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(node)
    }

    /// "snapshotLength": number of nodes in a node-set result.
    #[must_use]
    pub fn snapshot_length(&self) -> usize {
        self.value.as_nodeset().map_or(0, <[NodeId]>::len)
    }

    /// "snapshotItem(index)"
    #[must_use]
    pub fn snapshot_item(&self, index: usize) -> Option<NodeId> {
        self.value.as_nodeset()?.get(index).copied()
    }

    /// "booleanValue"
    #[must_use]
    pub fn boolean_value(&self) -> bool {
        self.value.to_boolean()
    }

    /// "numberValue"
    #[must_use]
    pub fn number_value(&self, tree: &DomTree) -> f64 {
        self.value.to_number(tree)
    }

    /// "stringValue"
    #[must_use]
    pub fn string_value(&self, tree: &DomTree) -> String {
        self.value.to_string_value(tree)
    }

    /// The raw value.
    pub const fn value(&self) -> &XPathValue {
        &self.value
    }
}

impl Iterator for XPathResult {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.iterate_next()
    }
}
