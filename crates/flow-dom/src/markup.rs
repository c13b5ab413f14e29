//! Lenient markup loader.
//!
//! Builds a [`DomTree`] from an HTML-like fragment without the full
//! [§ 13.2 Parsing HTML documents](https://html.spec.whatwg.org/multipage/parsing.html)
//! machinery: no implied `<html>`/`<body>`, no foster parenting, no
//! adoption agency. What it does handle:
//!
//! - start/end tags, quoted, unquoted, and boolean attributes
//! - void elements and `/>` self-closing tags
//! - comments, with doctypes and processing instructions skipped
//! - raw text for `<script>` and `<style>`
//! - implicit closing of repeated `<li>`, `<p>`, `<option>`, `<tr>`, `<td>`, `<th>`, `<dt>`, `<dd>`
//! - a small set of character references
//!
//! Anything it cannot make sense of is kept as text and reported through
//! [`warn_once`].

use flow_common::warning::warn_once;

use crate::serialize::is_void_element;
use crate::{DomTree, NodeId};

/// Elements whose contents are not parsed as markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements closed by a following sibling start tag of the same name.
const SELF_NESTING_FORBIDDEN: &[&str] = &["li", "p", "option", "tr", "td", "th", "dt", "dd"];

/// Parse `input` into a new document tree.
#[must_use]
pub fn parse_markup(input: &str) -> DomTree {
    let mut loader = MarkupLoader::new(input);
    loader.run();
    loader.tree
}

struct MarkupLoader {
    input: Vec<char>,
    pos: usize,
    tree: DomTree,
    /// Stack of open elements; the document is the implicit bottom.
    open_elements: Vec<NodeId>,
    text: String,
}

impl MarkupLoader {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            tree: DomTree::new(),
            open_elements: Vec::new(),
            text: String::new(),
        }
    }

    fn current_node(&self) -> NodeId {
        self.open_elements.last().copied().unwrap_or(NodeId::ROOT)
    }

    fn peek_codepoint(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek_codepoint(0)?;
        self.pos += 1;
        Some(c)
    }

    fn next_few_characters_are_case_insensitive(&self, target: &str) -> bool {
        target
            .chars()
            .enumerate()
            .all(|(i, t)| self.peek_codepoint(i).is_some_and(|c| c.eq_ignore_ascii_case(&t)))
    }

    fn skip_whitespace(&mut self) {
        while self.peek_codepoint(0).is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn run(&mut self) {
        while let Some(c) = self.peek_codepoint(0) {
            if c != '<' {
                self.text.push(c);
                self.pos += 1;
                continue;
            }
            match self.peek_codepoint(1) {
                Some('!') => {
                    self.flush_text();
                    self.markup_declaration();
                }
                Some('?') => {
                    self.flush_text();
                    let _ = self.skip_past(">");
                }
                Some('/') => {
                    self.flush_text();
                    self.end_tag();
                }
                Some(n) if n.is_ascii_alphabetic() => {
                    self.flush_text();
                    self.start_tag();
                }
                _ => {
                    self.text.push('<');
                    self.pos += 1;
                }
            }
        }
        self.flush_text();
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let decoded = decode_character_references(&std::mem::take(&mut self.text));
        let node = self.tree.create_text(&decoded);
        self.tree.append_child(self.current_node(), node);
    }

    /// Advance past the next occurrence of `terminator`, returning what came
    /// before it. Unterminated input consumes the rest.
    fn skip_past(&mut self, terminator: &str) -> String {
        let mut skipped = String::new();
        while self.peek_codepoint(0).is_some() {
            if self.next_few_characters_are_case_insensitive(terminator) {
                self.pos += terminator.chars().count();
                return skipped;
            }
            if let Some(c) = self.consume() {
                skipped.push(c);
            }
        }
        warn_once("Markup", &format!("unterminated construct, expected '{terminator}'"));
        skipped
    }

    fn markup_declaration(&mut self) {
        if self.next_few_characters_are_case_insensitive("<!--") {
            self.pos += 4;
            let data = self.skip_past("-->");
            let node = self.tree.create_comment(&data);
            self.tree.append_child(self.current_node(), node);
        } else {
            // DOCTYPE, CDATA and friends carry nothing selectors can see.
            let _ = self.skip_past(">");
        }
    }

    fn tag_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek_codepoint(0) {
            if c.is_whitespace() || c == '>' || c == '/' {
                break;
            }
            name.push(c.to_ascii_lowercase());
            self.pos += 1;
        }
        name
    }

    fn end_tag(&mut self) {
        self.pos += 2; // "</"
        let name = self.tag_name();
        let _ = self.skip_past(">");

        let position = self
            .open_elements
            .iter()
            .rposition(|&id| self.tree.tag_name(id) == Some(name.as_str()));
        match position {
            Some(index) => self.open_elements.truncate(index),
            None => warn_once("Markup", &format!("ignored unmatched end tag </{name}>")),
        }
    }

    fn start_tag(&mut self) {
        self.pos += 1; // "<"
        let name = self.tag_name();
        let attrs = self.attributes();
        let self_closing = if self.peek_codepoint(0) == Some('/') {
            self.pos += 1;
            true
        } else {
            false
        };
        if self.consume() != Some('>') {
            warn_once("Markup", &format!("unterminated start tag <{name}>"));
        }

        if SELF_NESTING_FORBIDDEN.contains(&name.as_str())
            && self.tree.tag_name(self.current_node()) == Some(name.as_str())
        {
            let _ = self.open_elements.pop();
        }

        let element = self
            .tree
            .create_element(&name, attrs.iter().map(|(n, v)| (n.as_str(), v.as_str())));
        self.tree.append_child(self.current_node(), element);

        if self_closing || is_void_element(&name) {
            return;
        }
        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let content = self.skip_past(&format!("</{name}"));
            let _ = self.skip_past(">");
            if !content.is_empty() {
                let text = self.tree.create_text(&content);
                self.tree.append_child(element, text);
            }
            return;
        }
        self.open_elements.push(element);
    }

    fn attributes(&mut self) -> Vec<(String, String)> {
        let mut attrs: Vec<(String, String)> = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek_codepoint(0) {
                None | Some('>') => break,
                Some('/') if self.peek_codepoint(1) == Some('>') => break,
                Some('/') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }

            let mut name = String::new();
            while let Some(c) = self.peek_codepoint(0) {
                if c.is_whitespace() || matches!(c, '=' | '>' | '/') {
                    break;
                }
                name.push(c.to_ascii_lowercase());
                self.pos += 1;
            }

            self.skip_whitespace();
            let value = if self.peek_codepoint(0) == Some('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.attribute_value()
            } else {
                String::new()
            };

            // [§ 13.2.5.33] "if there is already an attribute on the token with
            // the exact same name... the new attribute must be removed"
            if attrs.iter().any(|(n, _)| *n == name) {
                warn_once("Markup", &format!("duplicate attribute '{name}' dropped"));
            } else {
                attrs.push((name, value));
            }
        }
        attrs
    }

    fn attribute_value(&mut self) -> String {
        let mut raw = String::new();
        match self.peek_codepoint(0) {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                while let Some(c) = self.consume() {
                    if c == quote {
                        break;
                    }
                    raw.push(c);
                }
            }
            _ => {
                while let Some(c) = self.peek_codepoint(0) {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    raw.push(c);
                    self.pos += 1;
                }
            }
        }
        decode_character_references(&raw)
    }
}

/// [§ 13.5 Named character references](https://html.spec.whatwg.org/multipage/named-characters.html)
///
/// Decode the handful of named references markup fixtures use, plus decimal
/// and hexadecimal numeric references. Unknown references stay literal.
#[must_use]
pub fn decode_character_references(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let reference = &rest[1..semi];
            resolve_reference(reference).map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_reference(reference: &str) -> Option<char> {
    match reference {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = reference.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
