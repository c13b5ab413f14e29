//! Property tests over generated documents.

use flow_dom::{DomTree, NodeId, parse_markup};
use flow_query::{Backend, HostCapabilities, QueryEngine};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

const TAGS: &[&str] = &["div", "p", "span", "ul", "li"];
const CLASSES: &[&str] = &["", "a", "b", "a b"];

/// Walker and XPath translation agree on all of these.
const QUERIES: &[&str] = &[
    "div p",
    "div > span",
    "ul > li",
    "li.a",
    ".a.b",
    "p + span",
    "div ~ p",
    "li:first-child",
    "li:last-child",
    "span:only-child",
    "li:nth-child(odd)",
    "li:nth-child(2)",
    "p:nth-of-type(2n)",
    "div:empty",
    "li:not(.a)",
    "[class^=a]",
    "div > *:not(.b)",
];

/// Random nested markup over a small tag and class vocabulary.
#[derive(Debug, Clone)]
struct Page(String);

impl Arbitrary for Page {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut markup = String::new();
        let roots = usize::arbitrary(g) % 4 + 1;
        for _ in 0..roots {
            push_element(g, 0, &mut markup);
        }
        Self(markup)
    }
}

fn push_element(g: &mut Gen, depth: usize, out: &mut String) {
    let tag = *g.choose(TAGS).unwrap();
    let class = *g.choose(CLASSES).unwrap();
    out.push('<');
    out.push_str(tag);
    if !class.is_empty() {
        out.push_str(&format!(" class=\"{class}\""));
    }
    out.push('>');
    if bool::arbitrary(g) {
        out.push('t');
    }
    if depth < 3 {
        for _ in 0..usize::arbitrary(g) % 4 {
            push_element(g, depth + 1, out);
        }
    }
    out.push_str(&format!("</{tag}>"));
}

fn run(tree: &DomTree, backend: Backend, query: &str) -> Vec<NodeId> {
    QueryEngine::with_backend(backend, HostCapabilities::full())
        .unwrap()
        .query_selector_all(tree, NodeId::ROOT, query)
        .unwrap()
}

#[quickcheck]
fn prop_tag_query_is_preorder_without_duplicates(page: Page, pick: usize) -> bool {
    let tree = parse_markup(&page.0);
    let tag = TAGS[pick % TAGS.len()];
    let expected: Vec<NodeId> = tree
        .descendants(NodeId::ROOT)
        .filter(|&n| tree.tag_name(n) == Some(tag))
        .collect();
    run(&tree, Backend::Walker, tag) == expected
}

#[quickcheck]
fn prop_duplicate_groups_change_nothing(page: Page, pick: usize) -> bool {
    let tree = parse_markup(&page.0);
    let query = QUERIES[pick % QUERIES.len()];
    let doubled = format!("{query}, {query}");
    run(&tree, Backend::Walker, query) == run(&tree, Backend::Walker, &doubled)
}

#[quickcheck]
fn prop_walker_and_xpath_select_the_same_elements(page: Page) -> bool {
    let tree = parse_markup(&page.0);
    QUERIES.iter().all(|query| {
        let mut walker = run(&tree, Backend::Walker, query);
        let mut xpath = run(&tree, Backend::XPath, query);
        walker.sort_unstable();
        xpath.sort_unstable();
        walker == xpath
    })
}

#[quickcheck]
fn prop_queries_leave_the_tree_unchanged(page: Page, pick: usize) -> bool {
    let tree = parse_markup(&page.0);
    let before = flow_dom::outer_html(&tree, NodeId::ROOT);
    let _ = run(&tree, Backend::Walker, QUERIES[pick % QUERIES.len()]);
    flow_dom::outer_html(&tree, NodeId::ROOT) == before
}
