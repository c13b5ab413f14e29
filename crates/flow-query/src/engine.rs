//! Query engine.
//!
//! [`QueryEngine`] owns one [`SelectorBackend`], chosen from the host's
//! capabilities when the engine is built. Every query after that goes
//! through the same backend.

use std::fmt;

use flow_dom::{DomTree, NodeId, NodeType};

use crate::QueryError;
use crate::host::{Backend, HostCapabilities};
use crate::native::NativeBackend;
use crate::tokenizer;
use crate::walker;
use crate::xpath::XPathBackend;

/// A matching strategy over a [`DomTree`].
///
/// Backends never fail: unreadable queries and collaborator errors come back
/// as empty results, reported through `warn_once`.
pub trait SelectorBackend: Send + Sync {
    /// Which strategy this is.
    #[must_use]
    fn kind(&self) -> Backend;

    /// Every match for `query` under `scope`.
    #[must_use]
    fn select_all(&self, tree: &DomTree, scope: NodeId, query: &str) -> Vec<NodeId>;

    /// The first entry of [`Self::select_all`].
    #[must_use]
    fn select_first(&self, tree: &DomTree, scope: NodeId, query: &str) -> Option<NodeId> {
        self.select_all(tree, scope, query).first().copied()
    }
}

/// Tokenizes the query and walks the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkerBackend;

impl SelectorBackend for WalkerBackend {
    fn kind(&self) -> Backend {
        Backend::Walker
    }

    fn select_all(&self, tree: &DomTree, scope: NodeId, query: &str) -> Vec<NodeId> {
        walker::query_all(&tokenizer::parse(query), tree, scope)
    }

    fn select_first(&self, tree: &DomTree, scope: NodeId, query: &str) -> Option<NodeId> {
        walker::match_first(&tokenizer::parse(query), tree, scope)
    }
}

/// `querySelectorAll` / `querySelector` over a [`DomTree`].
pub struct QueryEngine {
    backend: Box<dyn SelectorBackend>,
}

impl QueryEngine {
    /// Build an engine on the best backend `host` offers: native, then
    /// XPath, then the walker.
    #[must_use]
    pub fn new(host: HostCapabilities) -> Self {
        let HostCapabilities { native, xpath } = host;
        let backend: Box<dyn SelectorBackend> = match (native, xpath) {
            (Some(matcher), _) => Box::new(NativeBackend::new(matcher)),
            (None, Some(evaluator)) => Box::new(XPathBackend::new(evaluator)),
            (None, None) => Box::new(WalkerBackend),
        };
        Self { backend }
    }

    /// Build an engine on a specific backend.
    ///
    /// # Errors
    ///
    /// [`QueryError::BackendUnavailable`] when `host` lacks the capability
    /// `backend` needs.
    pub fn with_backend(backend: Backend, host: HostCapabilities) -> Result<Self, QueryError> {
        let backend: Box<dyn SelectorBackend> = match backend {
            Backend::Native => Box::new(NativeBackend::new(
                host.native.ok_or(QueryError::BackendUnavailable(backend))?,
            )),
            Backend::XPath => Box::new(XPathBackend::new(
                host.xpath.ok_or(QueryError::BackendUnavailable(backend))?,
            )),
            Backend::Walker => Box::new(WalkerBackend),
        };
        Ok(Self { backend })
    }

    /// The backend in use.
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend.kind()
    }

    /// [§ 4.2.6 querySelectorAll](https://dom.spec.whatwg.org/#dom-parentnode-queryselectorall)
    ///
    /// Every element under `scope` matching `query`. With the walker and
    /// XPath backends, results are grouped by comma-separated alternative in
    /// source order; a repeated alternative is evaluated once.
    ///
    /// # Errors
    ///
    /// [`QueryError::InvalidScope`] when `scope` is not a document or element
    /// node of `tree`.
    pub fn query_selector_all(
        &self,
        tree: &DomTree,
        scope: NodeId,
        query: &str,
    ) -> Result<Vec<NodeId>, QueryError> {
        check_scope(tree, scope)?;
        Ok(self.backend.select_all(tree, scope, query))
    }

    /// [§ 4.2.6 querySelector](https://dom.spec.whatwg.org/#dom-parentnode-queryselector)
    ///
    /// # Errors
    ///
    /// See [`Self::query_selector_all`].
    pub fn query_selector(
        &self,
        tree: &DomTree,
        scope: NodeId,
        query: &str,
    ) -> Result<Option<NodeId>, QueryError> {
        check_scope(tree, scope)?;
        Ok(self.backend.select_first(tree, scope, query))
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new(HostCapabilities::none())
    }
}

impl fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngine")
            .field("backend", &self.backend())
            .finish()
    }
}

fn check_scope(tree: &DomTree, scope: NodeId) -> Result<(), QueryError> {
    match tree.get(scope).map(|node| &node.node_type) {
        Some(NodeType::Document | NodeType::Element(_)) => Ok(()),
        _ => Err(QueryError::InvalidScope(scope)),
    }
}
