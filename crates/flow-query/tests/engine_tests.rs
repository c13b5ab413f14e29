//! Tests for backend selection and the query engine.

use std::sync::{Arc, Mutex};

use flow_common::warning::has_warned;
use flow_css::SelectorParseError;
use flow_dom::{DomTree, NodeId, parse_markup};
use flow_query::{
    Backend, DocumentEvaluator, HostCapabilities, NativeSelectorMatcher, QueryEngine, QueryError,
};
use flow_xpath::{XPathError, XPathEvaluator};

const LIST: &str = r#"<div id="x"><ul><li class="a">1</li><li class="b">2</li><li class="a">3</li></ul></div>"#;

const PAGE: &str = r#"
<div class="page">
  <h1>Title</h1>
  <p class="lead a">First</p>
  <p>Second</p>
  <ul>
    <li class="a"><a href="/a">A</a></li>
    <li class="a b"><a>B</a></li>
    <li><a href="https://c.org/x.pdf">C</a></li>
    <li class="b"><span></span></li>
  </ul>
  <div><p>Nested</p><span>s</span></div>
</div>"#;

/// Queries every backend answers the same way from the document.
const SHARED_QUERIES: &[&str] = &[
    "p",
    "div p",
    "div > p",
    "ul > li",
    "li.a",
    ".a.b",
    "h1 + p",
    "h1 ~ p",
    "p + span",
    "a[href]",
    "a[href^='https']",
    "a[href$='.pdf']",
    "li:first-child",
    "li:last-child",
    "span:only-child",
    "li:nth-child(odd)",
    "li:nth-child(2)",
    "li:nth-child(-n+2)",
    "p:first-of-type",
    "p:last-of-type",
    "p:nth-of-type(2)",
    "span:empty",
    "li:not(.a)",
    "ul li a",
    "h1, ul > li.b",
];

fn engine(backend: Backend) -> QueryEngine {
    QueryEngine::with_backend(backend, HostCapabilities::full()).unwrap()
}

fn texts(tree: &DomTree, nodes: &[NodeId]) -> Vec<String> {
    nodes.iter().map(|&n| tree.text_content(n)).collect()
}

fn sorted(mut nodes: Vec<NodeId>) -> Vec<NodeId> {
    nodes.sort_unstable();
    nodes
}

#[test]
fn test_backend_selection_follows_capabilities() {
    assert_eq!(QueryEngine::new(HostCapabilities::none()).backend(), Backend::Walker);
    assert_eq!(QueryEngine::new(HostCapabilities::full()).backend(), Backend::Native);
    let xpath_only = HostCapabilities::none().with_xpath(XPathEvaluator::new());
    assert_eq!(QueryEngine::new(xpath_only).backend(), Backend::XPath);
    assert_eq!(QueryEngine::default().backend(), Backend::Walker);
}

#[test]
fn test_forced_backend_must_be_available() {
    let err = QueryEngine::with_backend(Backend::Native, HostCapabilities::none()).unwrap_err();
    assert_eq!(err, QueryError::BackendUnavailable(Backend::Native));
    let err = QueryEngine::with_backend(Backend::XPath, HostCapabilities::none()).unwrap_err();
    assert_eq!(err.to_string(), "host has no xpath backend");
    assert!(QueryEngine::with_backend(Backend::Walker, HostCapabilities::none()).is_ok());
}

#[test]
fn test_scope_must_be_document_or_element() {
    let tree = parse_markup("<p>text</p>");
    let p = tree.elements_by_tag_name(NodeId::ROOT, "p")[0];
    let text = tree.children(p)[0];
    let engine = engine(Backend::Walker);

    assert!(engine.query_selector_all(&tree, p, "*").is_ok());
    assert_eq!(
        engine.query_selector_all(&tree, text, "*"),
        Err(QueryError::InvalidScope(text))
    );
    assert_eq!(
        engine.query_selector(&tree, NodeId(999), "p"),
        Err(QueryError::InvalidScope(NodeId(999)))
    );
}

#[test]
fn test_list_scenarios_on_every_backend() {
    let tree = parse_markup(LIST);
    for backend in [Backend::Native, Backend::XPath, Backend::Walker] {
        let engine = engine(backend);
        let run = |q: &str| texts(&tree, &engine.query_selector_all(&tree, NodeId::ROOT, q).unwrap());
        assert_eq!(run("#x li.a"), ["1", "3"], "{backend}");
        assert_eq!(run("ul > li:first-child"), ["1"], "{backend}");
        assert_eq!(run("li:not(.a)"), ["2"], "{backend}");
    }
}

#[test]
fn test_backends_agree_on_shared_queries() {
    let tree = parse_markup(PAGE);
    let walker = engine(Backend::Walker);
    for backend in [Backend::XPath, Backend::Native] {
        let other = engine(backend);
        for query in SHARED_QUERIES {
            let expected = sorted(walker.query_selector_all(&tree, NodeId::ROOT, query).unwrap());
            let found = sorted(other.query_selector_all(&tree, NodeId::ROOT, query).unwrap());
            assert_eq!(found, expected, "{backend}: {query}");
        }
    }
}

#[test]
fn test_walker_and_xpath_keep_group_order() {
    let tree = parse_markup(LIST);
    for backend in [Backend::XPath, Backend::Walker] {
        let found = engine(backend)
            .query_selector_all(&tree, NodeId::ROOT, "li.b, li.a, li.b")
            .unwrap();
        assert_eq!(texts(&tree, &found), ["2", "1", "3"], "{backend}");
    }
}

#[test]
fn test_contains_differs_between_markup_and_text() {
    let tree = parse_markup("<p><b>bold</b></p>");
    let query = "p:contains('<b>')";
    let walker = engine(Backend::Walker);
    let xpath = engine(Backend::XPath);
    assert_eq!(walker.query_selector_all(&tree, NodeId::ROOT, query).unwrap().len(), 1);
    assert!(xpath.query_selector_all(&tree, NodeId::ROOT, query).unwrap().is_empty());
    assert_eq!(
        xpath
            .query_selector_all(&tree, NodeId::ROOT, "p:contains(bold)")
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_walker_id_and_nth_child_rules_differ_from_standard_matching() {
    let tree = parse_markup(LIST);
    let walker = engine(Backend::Walker);
    let run = |engine: &QueryEngine, q: &str| {
        texts(&tree, &engine.query_selector_all(&tree, NodeId::ROOT, q).unwrap())
    };
    assert_eq!(run(&walker, "span#x li.b"), ["2"]);
    assert_eq!(run(&walker, "li.b:nth-child(odd)"), ["1", "3"]);
    for backend in [Backend::Native, Backend::XPath] {
        let standard = engine(backend);
        assert!(run(&standard, "span#x li.b").is_empty(), "{backend}");
        assert!(run(&standard, "li.b:nth-child(odd)").is_empty(), "{backend}");
    }
}

#[test]
fn test_query_selector_returns_first_match() {
    let tree = parse_markup(LIST);
    for backend in [Backend::Native, Backend::XPath, Backend::Walker] {
        let engine = engine(backend);
        let first = engine.query_selector(&tree, NodeId::ROOT, "li.a").unwrap();
        assert_eq!(first.map(|n| tree.text_content(n)).as_deref(), Some("1"));
        assert_eq!(engine.query_selector(&tree, NodeId::ROOT, "ol").unwrap(), None);
    }
}

#[test]
fn test_scoped_queries() {
    let tree = parse_markup(LIST);
    let ul = tree.elements_by_tag_name(NodeId::ROOT, "ul")[0];
    for backend in [Backend::XPath, Backend::Walker] {
        let engine = engine(backend);
        assert_eq!(engine.query_selector_all(&tree, ul, "li").unwrap().len(), 3);
        assert!(engine.query_selector_all(&tree, ul, "div").unwrap().is_empty());
        assert_eq!(engine.query_selector_all(&tree, ul, "> li.b").unwrap().len(), 1);
    }
}

#[test]
fn test_native_syntax_error_degrades_to_empty() {
    let tree = parse_markup(LIST);
    let native = engine(Backend::Native);
    let found = native
        .query_selector_all(&tree, NodeId::ROOT, "li:frobnicate")
        .unwrap();
    assert!(found.is_empty());
    assert!(has_warned(
        "Native",
        "'li:frobnicate' rejected: unknown pseudo-class ':frobnicate'"
    ));

    // The walker drops the unknown pseudo-class instead.
    let walker = engine(Backend::Walker);
    assert_eq!(
        walker
            .query_selector_all(&tree, NodeId::ROOT, "li:frobnicate")
            .unwrap()
            .len(),
        3
    );
}

struct RecordingEvaluator {
    seen: Arc<Mutex<Vec<String>>>,
}

impl DocumentEvaluator for RecordingEvaluator {
    fn select_nodes(
        &self,
        tree: &DomTree,
        expression: &str,
        context: NodeId,
    ) -> Result<Vec<NodeId>, XPathError> {
        self.seen.lock().unwrap().push(expression.to_string());
        XPathEvaluator::new().select_nodes(tree, expression, context)
    }
}

#[test]
fn test_duplicate_groups_are_evaluated_once() {
    let tree = parse_markup(LIST);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let host = HostCapabilities::none().with_xpath(RecordingEvaluator {
        seen: Arc::clone(&seen),
    });
    let engine = QueryEngine::new(host);
    let found = engine
        .query_selector_all(&tree, NodeId::ROOT, "li, li ,li.a")
        .unwrap();
    assert_eq!(found.len(), 5);
    assert_eq!(seen.lock().unwrap().len(), 2);
}

struct FailingEvaluator;

impl DocumentEvaluator for FailingEvaluator {
    fn select_nodes(&self, _: &DomTree, _: &str, _: NodeId) -> Result<Vec<NodeId>, XPathError> {
        Err(XPathError::Unsupported("nothing"))
    }
}

#[test]
fn test_evaluator_errors_degrade_to_empty_groups() {
    let tree = parse_markup(LIST);
    let engine = QueryEngine::new(HostCapabilities::none().with_xpath(FailingEvaluator));
    assert!(engine.query_selector_all(&tree, NodeId::ROOT, "li").unwrap().is_empty());
    assert!(engine.query_selector(&tree, NodeId::ROOT, "li").unwrap().is_none());
}

struct RecordingMatcher {
    seen: Arc<Mutex<Vec<String>>>,
}

impl NativeSelectorMatcher for RecordingMatcher {
    fn query_selector_all(
        &self,
        _: &DomTree,
        _: NodeId,
        selectors: &str,
    ) -> Result<Vec<NodeId>, SelectorParseError> {
        self.seen.lock().unwrap().push(selectors.to_string());
        Ok(Vec::new())
    }
}

#[test]
fn test_native_receives_query_unparsed() {
    let tree = parse_markup(LIST);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let host = HostCapabilities::none().with_native(RecordingMatcher {
        seen: Arc::clone(&seen),
    });
    let engine = QueryEngine::new(host);
    let _ = engine.query_selector_all(&tree, NodeId::ROOT, " li ,li ").unwrap();
    let _ = engine.query_selector(&tree, NodeId::ROOT, "ul >").unwrap();
    assert_eq!(*seen.lock().unwrap(), [" li ,li ", "ul >"]);
}

#[test]
fn test_engine_debug_names_backend() {
    assert_eq!(
        format!("{:?}", engine(Backend::XPath)),
        "QueryEngine { backend: XPath }"
    );
    assert_eq!(
        format!("{:?}", HostCapabilities::full()),
        "HostCapabilities { native: true, xpath: true }"
    );
}
