//! Native CSS selector matching.
//!
//! A self-contained `querySelectorAll` in the shape a browser host provides:
//! the full selector list is parsed up front (any syntax error rejects the
//! whole query), then every descendant of the scope is tested right to left
//! against each complex selector.
//!
//! [§ 4.2.6 Mixin ParentNode](https://dom.spec.whatwg.org/#dom-parentnode-queryselectorall)
//!
//! "The querySelectorAll(selectors) method steps are to return the static
//! result of running scope-match a selectors string selectors against this."

pub mod parser;
pub mod selector;

use flow_dom::{DomTree, NodeId};
use thiserror::Error;

pub use parser::parse_selector_list;
pub use selector::{
    AttributeSelector, Combinator, ComplexSelector, CompoundSelector, Nth, PseudoClass,
    SimpleSelector,
};

/// The `SyntaxError` a host raises for an unparseable selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorParseError {
    /// Nothing but whitespace.
    #[error("empty selector")]
    Empty,
    /// A character that cannot start or continue the current construct.
    #[error("unexpected '{found}' at byte {offset}")]
    UnexpectedCharacter {
        /// The offending character
        found: char,
        /// Byte offset into the selector text
        offset: usize,
    },
    /// Input ended inside a construct.
    #[error("unexpected end of selector")]
    UnexpectedEnd,
    /// `>`, `+` or `~` with nothing to its right.
    #[error("combinator without a right-hand selector")]
    DanglingCombinator,
    /// A pseudo-class this matcher does not know.
    #[error("unknown pseudo-class ':{0}'")]
    UnknownPseudoClass(String),
    /// An `:nth-*()` argument that is not An+B.
    #[error("invalid An+B argument '{0}'")]
    InvalidNth(String),
}

/// Selector matcher over a [`DomTree`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CssMatcher;

impl CssMatcher {
    /// Create a matcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// "querySelectorAll(selectors)": every element descendant of `scope`
    /// matching any selector in the list, in tree order.
    ///
    /// Combinators may reach outside the scope (`#outer li` from an element
    /// inside `#outer` still matches), as they do in browsers.
    ///
    /// # Errors
    ///
    /// Returns the parse error when `selectors` is not a valid selector list.
    pub fn query_all(
        &self,
        tree: &DomTree,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Vec<NodeId>, SelectorParseError> {
        let list = parse_selector_list(selectors)?;
        Ok(tree
            .descendants(scope)
            .filter(|&node| list.iter().any(|complex| complex.matches(tree, node)))
            .collect())
    }

    /// "querySelector(selectors)": the first match in tree order.
    ///
    /// # Errors
    ///
    /// See [`Self::query_all`].
    pub fn query_first(
        &self,
        tree: &DomTree,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Option<NodeId>, SelectorParseError> {
        let list = parse_selector_list(selectors)?;
        Ok(tree
            .descendants(scope)
            .find(|&node| list.iter().any(|complex| complex.matches(tree, node))))
    }

    /// [§ 4.2.8 Element.matches()](https://dom.spec.whatwg.org/#dom-element-matches)
    ///
    /// # Errors
    ///
    /// See [`Self::query_all`].
    pub fn matches(
        &self,
        tree: &DomTree,
        element: NodeId,
        selectors: &str,
    ) -> Result<bool, SelectorParseError> {
        let list = parse_selector_list(selectors)?;
        Ok(list.iter().any(|complex| complex.matches(tree, element)))
    }
}
