//! flowq: run `querySelectorAll` against an HTML file from the terminal.
//!
//! Run with: cargo run --bin flowq -- 'ul > li.a' page.html

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use flow_common::warning::set_quiet;
use flow_dom::{DomTree, NodeId, outer_html, parse_markup};
use flow_query::tokenizer::{self, SelectorGroup};
use flow_query::xpath::translate;
use flow_query::{Backend, HostCapabilities, QueryEngine};
use owo_colors::OwoColorize;
use serde::Serialize;

/// flowq: CSS selector queries over HTML
#[derive(Parser, Debug)]
#[command(name = "flowq")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # All matches, printed as markup
    flowq 'ul > li.a' page.html

    # First match only, on the XPath backend
    flowq --first --backend xpath 'li:nth-child(odd)' page.html

    # Query inline HTML
    flowq --html '<p class="a">x</p>' 'p.a'

    # Show how the query is parsed and translated
    flowq --explain 'div#main a[href^=http]'
"#)]
struct Cli {
    /// Selector list to run
    #[arg(value_name = "SELECTORS")]
    query: String,

    /// Path to an HTML file
    #[arg(value_name = "FILE")]
    path: Option<PathBuf>,

    /// Parse HTML string directly instead of a file
    #[arg(long, value_name = "HTML")]
    html: Option<String>,

    /// Matching backend: auto, native, xpath or walker
    #[arg(short, long, default_value = "auto")]
    backend: String,

    /// Run the query from the element with this id instead of the document
    #[arg(long, value_name = "ID")]
    scope: Option<String>,

    /// Only the first match (querySelector)
    #[arg(long)]
    first: bool,

    /// Print the parsed groups and their XPath translations, then exit
    #[arg(long)]
    explain: bool,

    /// Print matches as JSON
    #[arg(long)]
    json: bool,

    /// Suppress warnings
    #[arg(short, long)]
    quiet: bool,
}

/// One group as shown by `--explain`.
#[derive(Serialize)]
struct Explained<'a> {
    group: &'a SelectorGroup,
    xpath: Option<String>,
}

/// One match as shown by `--json`.
#[derive(Serialize)]
struct Match<'a> {
    node: usize,
    tag: &'a str,
    id: Option<&'a str>,
    classes: Vec<&'a str>,
    html: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    set_quiet(cli.quiet);

    if cli.explain {
        return explain(&cli.query);
    }

    let tree = load_tree(&cli)?;
    let engine = build_engine(&cli.backend)?;
    let scope = match &cli.scope {
        Some(id) => tree
            .get_element_by_id(id)
            .with_context(|| format!("no element with id '{id}'"))?,
        None => NodeId::ROOT,
    };

    let matches = if cli.first {
        engine
            .query_selector(&tree, scope, &cli.query)?
            .into_iter()
            .collect()
    } else {
        engine.query_selector_all(&tree, scope, &cli.query)?
    };

    if cli.json {
        print_json(&tree, &matches)?;
    } else {
        print_matches(&tree, &matches, engine.backend());
    }
    Ok(())
}

/// Load the document from CLI arguments
fn load_tree(cli: &Cli) -> anyhow::Result<DomTree> {
    if let Some(ref html) = cli.html {
        Ok(parse_markup(html))
    } else if let Some(ref path) = cli.path {
        let markup = fs::read_to_string(path)
            .with_context(|| format!("reading '{}'", path.display()))?;
        Ok(parse_markup(&markup))
    } else {
        bail!("a file path or --html is required")
    }
}

fn build_engine(backend: &str) -> anyhow::Result<QueryEngine> {
    if backend.eq_ignore_ascii_case("auto") {
        return Ok(QueryEngine::new(HostCapabilities::full()));
    }
    let backend: Backend = backend
        .to_ascii_lowercase()
        .parse()
        .with_context(|| format!("unknown backend '{backend}'"))?;
    Ok(QueryEngine::with_backend(backend, HostCapabilities::full())?)
}

fn explain(query: &str) -> anyhow::Result<()> {
    let groups = tokenizer::parse(query);
    let explained: Vec<Explained<'_>> = groups
        .iter()
        .map(|group| Explained {
            group,
            xpath: translate(group),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&explained)?);
    Ok(())
}

fn print_json(tree: &DomTree, matches: &[NodeId]) -> anyhow::Result<()> {
    let records: Vec<Match<'_>> = matches
        .iter()
        .filter_map(|&node| {
            let element = tree.as_element(node)?;
            Some(Match {
                node: node.0,
                tag: &element.tag_name,
                id: element.id(),
                classes: element.classes().collect(),
                html: outer_html(tree, node),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn print_matches(tree: &DomTree, matches: &[NodeId], backend: Backend) {
    for (index, &node) in matches.iter().enumerate() {
        let tag = tree.tag_name(node).unwrap_or_default();
        println!(
            "{} {} {}",
            format!("[{index}]").dimmed(),
            tag.green(),
            outer_html(tree, node)
        );
    }
    eprintln!(
        "{}",
        format!("{} match(es) via {backend}", matches.len()).cyan()
    );
}
