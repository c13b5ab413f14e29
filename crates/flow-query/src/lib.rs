//! `querySelectorAll` emulation over a [`flow_dom::DomTree`].
//!
//! A query runs on one of three backends, picked once from what the host
//! offers:
//!
//! - [`Backend::Native`]: the host's own selector matcher gets the query
//!   string unparsed.
//! - [`Backend::XPath`]: the query is split into [`tokenizer::SelectorGroup`]s,
//!   each translated by [`xpath::translate`] and run by the host's XPath
//!   evaluator.
//! - [`Backend::Walker`]: the groups are matched by walking the tree
//!   ([`walker::match_all`]).
//!
//! ```
//! use flow_dom::{NodeId, parse_markup};
//! use flow_query::{HostCapabilities, QueryEngine};
//!
//! let tree = parse_markup(r#"<ul><li class="a">1</li><li>2</li></ul>"#);
//! let engine = QueryEngine::new(HostCapabilities::none());
//! let found = engine.query_selector_all(&tree, NodeId::ROOT, "ul > li.a").unwrap();
//! assert_eq!(found.len(), 1);
//! ```
//!
//! Matching never fails on selector text. Unreadable fragments and
//! collaborator errors are reported once through
//! [`flow_common::warning::warn_once`] and degrade to smaller or empty
//! results.

pub mod engine;
pub mod host;
pub mod native;
pub mod tokenizer;
pub mod walker;
pub mod xpath;

use flow_dom::NodeId;
use thiserror::Error;

pub use engine::{QueryEngine, SelectorBackend, WalkerBackend};
pub use host::{Backend, DocumentEvaluator, HostCapabilities, NativeSelectorMatcher};
pub use tokenizer::SelectorGroup;

/// Precondition failures of a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The scope is not a document or element node of the tree.
    #[error("node {0:?} is not a document or element")]
    InvalidScope(NodeId),
    /// A forced backend the host cannot provide.
    #[error("host has no {0} backend")]
    BackendUnavailable(Backend),
}
