//! XPath Value Types
//!
//! XPath 1.0 has four data types: node-set, boolean, number, and string.
//! Attributes are not nodes in the arena DOM, so the attribute axis yields a
//! list of attribute values instead of a node-set.

use flow_dom::{DomTree, NodeId, NodeType};

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum XPathValue {
    /// Nodes in document order, without duplicates.
    NodeSet(Vec<NodeId>),
    /// `true()` / `false()` and comparison results
    Boolean(bool),
    /// IEEE 754 double
    Number(f64),
    /// String value
    String(String),
    /// Values selected by the attribute axis, in context-node order.
    StringList(Vec<String>),
}

impl XPathValue {
    /// An empty node-set.
    pub const fn empty_nodeset() -> Self {
        Self::NodeSet(Vec::new())
    }

    /// [§ 4.3 boolean()](https://www.w3.org/TR/xpath-10/#function-boolean)
    #[must_use]
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::NodeSet(nodes) => !nodes.is_empty(),
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::StringList(list) => !list.is_empty(),
        }
    }

    /// [§ 4.4 number()](https://www.w3.org/TR/xpath-10/#function-number)
    #[must_use]
    pub fn to_number(&self, tree: &DomTree) -> f64 {
        match self {
            Self::Boolean(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            _ => string_to_number(&self.to_string_value(tree)),
        }
    }

    /// [§ 4.2 string()](https://www.w3.org/TR/xpath-10/#function-string)
    ///
    /// "A node-set is converted to a string by returning the string-value of
    /// the node in the node-set that is first in document order."
    #[must_use]
    pub fn to_string_value(&self, tree: &DomTree) -> String {
        match self {
            Self::NodeSet(nodes) => nodes
                .first()
                .map(|&id| node_string_value(tree, id))
                .unwrap_or_default(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => number_to_string(*n),
            Self::String(s) => s.clone(),
            Self::StringList(list) => list.first().cloned().unwrap_or_default(),
        }
    }

    /// String values of every member, when this is a node-set or an
    /// attribute list.
    #[must_use]
    pub fn member_strings(&self, tree: &DomTree) -> Option<Vec<String>> {
        match self {
            Self::NodeSet(nodes) => Some(nodes.iter().map(|&id| node_string_value(tree, id)).collect()),
            Self::StringList(list) => Some(list.clone()),
            _ => None,
        }
    }

    /// The nodes, when this is a node-set.
    #[must_use]
    pub fn as_nodeset(&self) -> Option<&[NodeId]> {
        match self {
            Self::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }
}

impl Default for XPathValue {
    fn default() -> Self {
        Self::empty_nodeset()
    }
}

impl From<bool> for XPathValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<f64> for XPathValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<String> for XPathValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// [§ 5 Data Model](https://www.w3.org/TR/xpath-10/#data-model) string-value:
/// the concatenated text descendants for the root and elements, the data for
/// text and comment nodes.
#[must_use]
pub fn node_string_value(tree: &DomTree, id: NodeId) -> String {
    match tree.get(id).map(|n| &n.node_type) {
        Some(NodeType::Comment(text)) => text.clone(),
        Some(_) => tree.text_content(id),
        None => String::new(),
    }
}

/// [§ 4.4](https://www.w3.org/TR/xpath-10/#function-number) "a string that
/// consists of optional whitespace followed by an optional minus sign followed
/// by a Number followed by whitespace is converted to the IEEE 754 number...
/// any other string is converted to NaN"
#[must_use]
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .strip_prefix('-')
            .unwrap_or(trimmed)
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.');
    if valid {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// [§ 4.2](https://www.w3.org/TR/xpath-10/#function-string) number formatting:
/// integers print without a decimal point, `NaN` and infinities by name.
#[must_use]
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        // Exact integral value within i64 range.
        #[allow(clippy::cast_possible_truncation)]
        let integral = n as i64;
        integral.to_string()
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_conversion() {
        assert!(XPathValue::NodeSet(vec![NodeId(1)]).to_boolean());
        assert!(!XPathValue::NodeSet(vec![]).to_boolean());
        assert!(XPathValue::Number(1.0).to_boolean());
        assert!(!XPathValue::Number(f64::NAN).to_boolean());
        assert!(!XPathValue::String(String::new()).to_boolean());
        assert!(XPathValue::StringList(vec![String::new()]).to_boolean());
    }

    #[test]
    fn test_number_conversion() {
        let tree = DomTree::new();
        assert_eq!(XPathValue::Boolean(true).to_number(&tree), 1.0);
        assert_eq!(XPathValue::String(" 42 ".to_string()).to_number(&tree), 42.0);
        assert_eq!(XPathValue::String("-1.5".to_string()).to_number(&tree), -1.5);
        assert!(XPathValue::String("1e3".to_string()).to_number(&tree).is_nan());
        assert!(XPathValue::String("abc".to_string()).to_number(&tree).is_nan());
    }

    #[test]
    fn test_string_conversion() {
        let tree = DomTree::new();
        assert_eq!(XPathValue::Boolean(false).to_string_value(&tree), "false");
        assert_eq!(XPathValue::Number(42.0).to_string_value(&tree), "42");
        assert_eq!(XPathValue::Number(3.25).to_string_value(&tree), "3.25");
        assert_eq!(XPathValue::Number(f64::NAN).to_string_value(&tree), "NaN");
        assert_eq!(XPathValue::empty_nodeset().to_string_value(&tree), "");
    }
}
