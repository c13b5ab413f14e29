//! XPath 1.0 Core Function Library
//!
//! [§ 4 Core Function Library](https://www.w3.org/TR/xpath-10/#corelib)

use crate::XPathError;
use crate::eval::{EvalContext, evaluate};
use crate::parser::Expr;
use crate::value::{XPathValue, node_string_value};

/// Call the core function `name` with unevaluated `args`.
///
/// # Errors
///
/// [`XPathError::UnknownFunction`] for names outside the core library,
/// [`XPathError::Arity`] for a wrong argument count, and any error raised
/// while evaluating an argument.
pub fn call(name: &str, args: &[Expr], ctx: &EvalContext<'_>) -> Result<XPathValue, XPathError> {
    let tree = ctx.tree;
    let arg = |i: usize| evaluate(&args[i], ctx);
    let string_arg = |i: usize| -> Result<String, XPathError> {
        Ok(arg(i)?.to_string_value(tree))
    };
    // Zero-argument string functions default to the context node.
    let string_or_context = |i: usize| -> Result<String, XPathError> {
        if args.len() > i {
            string_arg(i)
        } else {
            Ok(node_string_value(tree, ctx.node))
        }
    };

    let value = match name {
        // [§ 4.1 Node Set Functions]
        "last" => {
            arity(name, args, 0, 0)?;
            XPathValue::Number(usize_to_f64(ctx.size))
        }
        "position" => {
            arity(name, args, 0, 0)?;
            XPathValue::Number(usize_to_f64(ctx.position))
        }
        "count" => {
            arity(name, args, 1, 1)?;
            match arg(0)? {
                XPathValue::NodeSet(nodes) => XPathValue::Number(usize_to_f64(nodes.len())),
                XPathValue::StringList(values) => XPathValue::Number(usize_to_f64(values.len())),
                _ => return Err(XPathError::NotANodeSet("count()")),
            }
        }
        "name" | "local-name" => {
            arity(name, args, 0, 1)?;
            let target = if args.is_empty() {
                Some(ctx.node)
            } else {
                match arg(0)? {
                    XPathValue::NodeSet(nodes) => nodes.first().copied(),
                    _ => return Err(XPathError::NotANodeSet("name()")),
                }
            };
            XPathValue::String(
                target
                    .and_then(|id| tree.tag_name(id))
                    .unwrap_or_default()
                    .to_string(),
            )
        }

        // [§ 4.2 String Functions]
        "string" => {
            arity(name, args, 0, 1)?;
            XPathValue::String(string_or_context(0)?)
        }
        "concat" => {
            if args.len() < 2 {
                return Err(XPathError::Arity {
                    function: name.to_string(),
                    expected: "at least 2",
                    found: args.len(),
                });
            }
            let mut out = String::new();
            for i in 0..args.len() {
                out.push_str(&string_arg(i)?);
            }
            XPathValue::String(out)
        }
        "starts-with" => {
            arity(name, args, 2, 2)?;
            XPathValue::Boolean(string_arg(0)?.starts_with(&string_arg(1)?))
        }
        "contains" => {
            arity(name, args, 2, 2)?;
            XPathValue::Boolean(string_arg(0)?.contains(&string_arg(1)?))
        }
        "substring-before" => {
            arity(name, args, 2, 2)?;
            let (haystack, needle) = (string_arg(0)?, string_arg(1)?);
            XPathValue::String(
                haystack
                    .find(&needle)
                    .map(|i| haystack[..i].to_string())
                    .unwrap_or_default(),
            )
        }
        "substring-after" => {
            arity(name, args, 2, 2)?;
            let (haystack, needle) = (string_arg(0)?, string_arg(1)?);
            XPathValue::String(
                haystack
                    .find(&needle)
                    .map(|i| haystack[i + needle.len()..].to_string())
                    .unwrap_or_default(),
            )
        }
        "substring" => {
            arity(name, args, 2, 3)?;
            let source = string_arg(0)?;
            let start = arg(1)?.to_number(tree);
            let length = if args.len() == 3 {
                arg(2)?.to_number(tree)
            } else {
                f64::INFINITY
            };
            XPathValue::String(substring(&source, start, length))
        }
        "string-length" => {
            arity(name, args, 0, 1)?;
            XPathValue::Number(usize_to_f64(string_or_context(0)?.chars().count()))
        }
        "normalize-space" => {
            arity(name, args, 0, 1)?;
            let source = string_or_context(0)?;
            XPathValue::String(source.split_whitespace().collect::<Vec<_>>().join(" "))
        }
        "translate" => {
            arity(name, args, 3, 3)?;
            let source = string_arg(0)?;
            let from: Vec<char> = string_arg(1)?.chars().collect();
            let to: Vec<char> = string_arg(2)?.chars().collect();
            let translated = source
                .chars()
                .filter_map(|c| match from.iter().position(|&f| f == c) {
                    Some(i) => to.get(i).copied(),
                    None => Some(c),
                })
                .collect();
            XPathValue::String(translated)
        }

        // [§ 4.3 Boolean Functions]
        "boolean" => {
            arity(name, args, 1, 1)?;
            XPathValue::Boolean(arg(0)?.to_boolean())
        }
        "not" => {
            arity(name, args, 1, 1)?;
            XPathValue::Boolean(!arg(0)?.to_boolean())
        }
        "true" => {
            arity(name, args, 0, 0)?;
            XPathValue::Boolean(true)
        }
        "false" => {
            arity(name, args, 0, 0)?;
            XPathValue::Boolean(false)
        }

        // [§ 4.4 Number Functions]
        "number" => {
            arity(name, args, 0, 1)?;
            if args.is_empty() {
                XPathValue::Number(XPathValue::NodeSet(vec![ctx.node]).to_number(tree))
            } else {
                XPathValue::Number(arg(0)?.to_number(tree))
            }
        }
        "sum" => {
            arity(name, args, 1, 1)?;
            let value = arg(0)?;
            let members = value
                .member_strings(tree)
                .ok_or(XPathError::NotANodeSet("sum()"))?;
            XPathValue::Number(
                members
                    .iter()
                    .map(|s| XPathValue::String(s.clone()).to_number(tree))
                    .sum(),
            )
        }
        "floor" => {
            arity(name, args, 1, 1)?;
            XPathValue::Number(arg(0)?.to_number(tree).floor())
        }
        "ceiling" => {
            arity(name, args, 1, 1)?;
            XPathValue::Number(arg(0)?.to_number(tree).ceil())
        }
        "round" => {
            arity(name, args, 1, 1)?;
            XPathValue::Number(xpath_round(arg(0)?.to_number(tree)))
        }

        _ => return Err(XPathError::UnknownFunction(name.to_string())),
    };
    Ok(value)
}

fn arity(name: &str, args: &[Expr], min: usize, max: usize) -> Result<(), XPathError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = match (min, max) {
        (0, 0) => "0",
        (1, 1) => "1",
        (2, 2) => "2",
        (3, 3) => "3",
        (0, 1) => "0 or 1",
        _ => "2 or 3",
    };
    Err(XPathError::Arity {
        function: name.to_string(),
        expected,
        found: args.len(),
    })
}

#[allow(clippy::cast_precision_loss)]
fn usize_to_f64(n: usize) -> f64 {
    n as f64
}

/// "The round function returns the number that is closest to the argument and
/// that is an integer. If there are two such numbers, then the one that is
/// closest to positive infinity is returned."
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else {
        (n + 0.5).floor()
    }
}

/// [§ 4.2 substring()](https://www.w3.org/TR/xpath-10/#function-substring)
///
/// "returns the substring of the first argument starting at the position
/// specified in the second argument with length specified in the third
/// argument... each character in the string is considered to have a numeric
/// position: the position of the first character is 1". Characters are kept
/// when `round(start) <= position < round(start) + round(length)`.
fn substring(source: &str, start: f64, length: f64) -> String {
    let first = xpath_round(start);
    let end = first + xpath_round(length);
    source
        .chars()
        .enumerate()
        .filter(|&(i, _)| {
            let position = usize_to_f64(i + 1);
            position >= first && position < end
        })
        .map(|(_, c)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_rounding() {
        assert_eq!(substring("12345", 2.0, 3.0), "234");
        assert_eq!(substring("12345", 1.5, 2.6), "234");
        assert_eq!(substring("12345", 0.0, 3.0), "12");
        assert_eq!(substring("12345", f64::NAN, 3.0), "");
        assert_eq!(substring("12345", 4.0, f64::INFINITY), "45");
        assert_eq!(substring("12345", -42.0, f64::INFINITY), "12345");
    }

    #[test]
    fn test_round() {
        assert_eq!(xpath_round(2.5), 3.0);
        assert_eq!(xpath_round(-2.5), -2.0);
        assert!(xpath_round(f64::NAN).is_nan());
    }
}
