//! Native delegate: the query string goes to the host matcher as is.

use flow_common::warning::warn_once;
use flow_dom::{DomTree, NodeId};

use crate::engine::SelectorBackend;
use crate::host::{Backend, NativeSelectorMatcher};

/// Backend forwarding to a host [`NativeSelectorMatcher`].
pub struct NativeBackend {
    matcher: Box<dyn NativeSelectorMatcher>,
}

impl NativeBackend {
    /// Wrap a host matcher.
    #[must_use]
    pub fn new(matcher: Box<dyn NativeSelectorMatcher>) -> Self {
        Self { matcher }
    }
}

impl SelectorBackend for NativeBackend {
    fn kind(&self) -> Backend {
        Backend::Native
    }

    fn select_all(&self, tree: &DomTree, scope: NodeId, query: &str) -> Vec<NodeId> {
        self.matcher
            .query_selector_all(tree, scope, query)
            .unwrap_or_else(|err| {
                warn_once("Native", &format!("'{query}' rejected: {err}"));
                Vec::new()
            })
    }

    fn select_first(&self, tree: &DomTree, scope: NodeId, query: &str) -> Option<NodeId> {
        self.matcher
            .query_selector(tree, scope, query)
            .unwrap_or_else(|err| {
                warn_once("Native", &format!("'{query}' rejected: {err}"));
                None
            })
    }
}
