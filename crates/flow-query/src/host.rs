//! Host capabilities.
//!
//! A host may offer a native selector matcher, an XPath evaluator, both, or
//! neither. [`HostCapabilities`] records what is available; the engine picks
//! its backend from it once, at construction.

use std::fmt;

use flow_css::{CssMatcher, SelectorParseError};
use flow_dom::{DomTree, NodeId};
use flow_xpath::{XPathError, XPathEvaluator};
use serde::Serialize;
use strum_macros::{Display, EnumString};

/// A matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// The host's own `querySelectorAll`.
    Native,
    /// Selector groups translated to XPath and run by the host evaluator.
    #[strum(serialize = "xpath")]
    #[serde(rename = "xpath")]
    XPath,
    /// Direct tree walking; always available.
    Walker,
}

/// [§ 4.2.6 Mixin ParentNode](https://dom.spec.whatwg.org/#dom-parentnode-queryselectorall)
///
/// A host-provided selector engine. The query is handed over unparsed.
pub trait NativeSelectorMatcher: Send + Sync {
    /// Every element under `scope` matching `selectors`.
    ///
    /// # Errors
    ///
    /// The host's syntax error for an unparseable selector list.
    fn query_selector_all(
        &self,
        tree: &DomTree,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Vec<NodeId>, SelectorParseError>;

    /// The first element under `scope` matching `selectors`.
    ///
    /// # Errors
    ///
    /// See [`Self::query_selector_all`].
    fn query_selector(
        &self,
        tree: &DomTree,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Option<NodeId>, SelectorParseError> {
        Ok(self
            .query_selector_all(tree, scope, selectors)?
            .first()
            .copied())
    }
}

impl NativeSelectorMatcher for CssMatcher {
    fn query_selector_all(
        &self,
        tree: &DomTree,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Vec<NodeId>, SelectorParseError> {
        self.query_all(tree, scope, selectors)
    }

    fn query_selector(
        &self,
        tree: &DomTree,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Option<NodeId>, SelectorParseError> {
        self.query_first(tree, scope, selectors)
    }
}

/// [§ Interface XPathEvaluator](https://dom.spec.whatwg.org/#interface-xpathevaluator)
///
/// A host-provided XPath evaluator, reduced to the node-set case.
pub trait DocumentEvaluator: Send + Sync {
    /// The nodes selected by `expression` from `context`, in document order.
    ///
    /// # Errors
    ///
    /// Whatever the evaluator reports for a bad expression or context.
    fn select_nodes(
        &self,
        tree: &DomTree,
        expression: &str,
        context: NodeId,
    ) -> Result<Vec<NodeId>, XPathError>;
}

impl DocumentEvaluator for XPathEvaluator {
    fn select_nodes(
        &self,
        tree: &DomTree,
        expression: &str,
        context: NodeId,
    ) -> Result<Vec<NodeId>, XPathError> {
        let mut result = self.evaluate(expression, tree, context)?;
        let mut nodes = Vec::with_capacity(result.snapshot_length());
        while let Some(node) = result.iterate_next() {
            nodes.push(node);
        }
        Ok(nodes)
    }
}

/// What the host offers.
#[derive(Default)]
pub struct HostCapabilities {
    pub(crate) native: Option<Box<dyn NativeSelectorMatcher>>,
    pub(crate) xpath: Option<Box<dyn DocumentEvaluator>>,
}

impl HostCapabilities {
    /// A bare host: only the walker is available.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Both built-in capabilities: [`CssMatcher`] and [`XPathEvaluator`].
    #[must_use]
    pub fn full() -> Self {
        Self::none()
            .with_native(CssMatcher::new())
            .with_xpath(XPathEvaluator::new())
    }

    /// Add a native selector matcher.
    #[must_use]
    pub fn with_native(mut self, matcher: impl NativeSelectorMatcher + 'static) -> Self {
        self.native = Some(Box::new(matcher));
        self
    }

    /// Add an XPath evaluator.
    #[must_use]
    pub fn with_xpath(mut self, evaluator: impl DocumentEvaluator + 'static) -> Self {
        self.xpath = Some(Box::new(evaluator));
        self
    }

    /// Whether a native matcher is present.
    #[must_use]
    pub const fn has_native(&self) -> bool {
        self.native.is_some()
    }

    /// Whether an XPath evaluator is present.
    #[must_use]
    pub const fn has_xpath(&self) -> bool {
        self.xpath.is_some()
    }

    /// Native first, then XPath, then the walker.
    #[must_use]
    pub const fn preferred_backend(&self) -> Backend {
        if self.has_native() {
            Backend::Native
        } else if self.has_xpath() {
            Backend::XPath
        } else {
            Backend::Walker
        }
    }
}

impl fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCapabilities")
            .field("native", &self.has_native())
            .field("xpath", &self.has_xpath())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!("xpath".parse::<Backend>().unwrap(), Backend::XPath);
        assert_eq!("walker".parse::<Backend>().unwrap(), Backend::Walker);
        assert_eq!(Backend::Native.to_string(), "native");
        assert_eq!(Backend::XPath.to_string(), "xpath");
        assert!("auto".parse::<Backend>().is_err());
    }

    #[test]
    fn test_preferred_backend() {
        assert_eq!(HostCapabilities::none().preferred_backend(), Backend::Walker);
        assert_eq!(HostCapabilities::full().preferred_backend(), Backend::Native);
        assert_eq!(
            HostCapabilities::none()
                .with_xpath(XPathEvaluator::new())
                .preferred_backend(),
            Backend::XPath
        );
    }
}
