//! Selector list parser.
//!
//! [§ 4 Selector syntax](https://www.w3.org/TR/selectors-4/#syntax)
//!
//! Unlike a stylesheet parser, which drops an invalid rule and moves on, a
//! query entry point must reject the whole list: `querySelectorAll` "throws
//! a SyntaxError" when the selector does not parse.

use crate::SelectorParseError;
use crate::selector::{
    AttributeSelector, Combinator, ComplexSelector, CompoundSelector, Nth, PseudoClass,
    SimpleSelector,
};

/// [§ 4.3.10 ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
const fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

/// [§ 4.3.9 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
const fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit()
}

/// Parse a comma-separated selector list.
///
/// # Errors
///
/// Returns the first syntax error found; no partial list is produced.
pub fn parse_selector_list(input: &str) -> Result<Vec<ComplexSelector>, SelectorParseError> {
    if input.trim().is_empty() {
        return Err(SelectorParseError::Empty);
    }
    SelectorParser::new(input).parse_list()
}

/// Cursor over the selector text.
struct SelectorParser<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> SelectorParser<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Returns whether any whitespace was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.position;
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            let _ = self.bump();
        }
        self.position != start
    }

    fn unexpected(&self) -> SelectorParseError {
        match self.peek() {
            Some(found) => SelectorParseError::UnexpectedCharacter {
                found,
                offset: self.position,
            },
            None => SelectorParseError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorParseError> {
        if self.peek() == Some(expected) {
            let _ = self.bump();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_list(&mut self) -> Result<Vec<ComplexSelector>, SelectorParseError> {
        let mut list = vec![self.parse_complex()?];
        while self.peek() == Some(',') {
            let _ = self.bump();
            list.push(self.parse_complex()?);
        }
        match self.peek() {
            None => Ok(list),
            Some(_) => Err(self.unexpected()),
        }
    }

    /// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
    ///
    /// Stops before a `,` or at the end of input.
    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorParseError> {
        let _ = self.skip_whitespace();
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_space => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            if combinator != Combinator::Descendant {
                let _ = self.bump();
                let _ = self.skip_whitespace();
                if matches!(self.peek(), None | Some(',')) {
                    return Err(SelectorParseError::DanglingCombinator);
                }
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        // Subject last in source order, first in the matching chain.
        let subject = compounds.pop().ok_or(SelectorParseError::Empty)?;
        let combinators = compounds
            .into_iter()
            .zip(combinators)
            .rev()
            .map(|(compound, combinator)| (combinator, compound))
            .collect();
        Ok(ComplexSelector {
            subject,
            combinators,
        })
    }

    /// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
    ///
    /// "If it contains a type selector or universal selector, that type
    /// selector or universal selector must come first in the sequence."
    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorParseError> {
        let mut simple_selectors = Vec::new();
        match self.peek() {
            Some('*') => {
                let _ = self.bump();
                simple_selectors.push(SimpleSelector::Universal);
            }
            Some(c) if is_ident_start_char(c) => {
                simple_selectors.push(SimpleSelector::Type(
                    self.parse_ident()?.to_ascii_lowercase(),
                ));
            }
            _ => {}
        }

        loop {
            let simple = match self.peek() {
                Some('#') => {
                    let _ = self.bump();
                    SimpleSelector::Id(self.parse_name()?)
                }
                Some('.') => {
                    let _ = self.bump();
                    SimpleSelector::Class(self.parse_ident()?)
                }
                Some('[') => SimpleSelector::Attribute(self.parse_attribute()?),
                Some(':') => self.parse_pseudo()?,
                _ => break,
            };
            simple_selectors.push(simple);
        }

        if simple_selectors.is_empty() {
            return Err(self.unexpected());
        }
        Ok(CompoundSelector { simple_selectors })
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    fn parse_ident(&mut self) -> Result<String, SelectorParseError> {
        if !self.peek().is_some_and(is_ident_start_char) {
            return Err(self.unexpected());
        }
        self.parse_name()
    }

    /// A run of ident code points; ids may start with a digit in HTML.
    fn parse_name(&mut self) -> Result<String, SelectorParseError> {
        let start = self.position;
        while self.peek().is_some_and(is_ident_char) {
            let _ = self.bump();
        }
        if self.position == start {
            return Err(self.unexpected());
        }
        Ok(self.input[start..self.position].to_string())
    }

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorParseError> {
        self.expect('[')?;
        let _ = self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        let _ = self.skip_whitespace();

        let operator = match self.peek() {
            Some(']') => {
                let _ = self.bump();
                return Ok(AttributeSelector::Exists(name));
            }
            Some('=') => '=',
            Some(op @ ('~' | '|' | '^' | '$' | '*')) => {
                let _ = self.bump();
                op
            }
            _ => return Err(self.unexpected()),
        };
        self.expect('=')?;
        let _ = self.skip_whitespace();
        let value = self.parse_attribute_value()?;
        let _ = self.skip_whitespace();
        self.expect(']')?;

        Ok(match operator {
            '~' => AttributeSelector::Includes(name, value),
            '|' => AttributeSelector::DashMatch(name, value),
            '^' => AttributeSelector::PrefixMatch(name, value),
            '$' => AttributeSelector::SuffixMatch(name, value),
            '*' => AttributeSelector::SubstringMatch(name, value),
            _ => AttributeSelector::Equals(name, value),
        })
    }

    /// Quoted string or unquoted ident.
    fn parse_attribute_value(&mut self) -> Result<String, SelectorParseError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let _ = self.bump();
                let start = self.position;
                while let Some(c) = self.bump() {
                    if c == quote {
                        return Ok(self.input[start..self.position - 1].to_string());
                    }
                }
                Err(SelectorParseError::UnexpectedEnd)
            }
            _ => self.parse_ident(),
        }
    }

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    /// [§ 11 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
    fn parse_pseudo(&mut self) -> Result<SimpleSelector, SelectorParseError> {
        self.expect(':')?;
        if self.peek() == Some(':') {
            let _ = self.bump();
            let _ = self.parse_ident()?;
            return Ok(SimpleSelector::NeverMatch);
        }
        let name = self.parse_ident()?.to_ascii_lowercase();

        if self.peek() == Some('(') {
            let _ = self.bump();
            let _ = self.skip_whitespace();
            let simple = match name.as_str() {
                "not" => SimpleSelector::Not(self.parse_compound_list()?),
                "nth-child" => SimpleSelector::PseudoClass(PseudoClass::NthChild(self.parse_nth()?)),
                "nth-last-child" => {
                    SimpleSelector::PseudoClass(PseudoClass::NthLastChild(self.parse_nth()?))
                }
                "nth-of-type" => {
                    SimpleSelector::PseudoClass(PseudoClass::NthOfType(self.parse_nth()?))
                }
                "nth-last-of-type" => {
                    SimpleSelector::PseudoClass(PseudoClass::NthLastOfType(self.parse_nth()?))
                }
                _ => return Err(SelectorParseError::UnknownPseudoClass(name)),
            };
            let _ = self.skip_whitespace();
            self.expect(')')?;
            return Ok(simple);
        }

        let pseudo = match name.as_str() {
            "root" => PseudoClass::Root,
            "first-child" => PseudoClass::FirstChild,
            "last-child" => PseudoClass::LastChild,
            "only-child" => PseudoClass::OnlyChild,
            "first-of-type" => PseudoClass::FirstOfType,
            "last-of-type" => PseudoClass::LastOfType,
            "only-of-type" => PseudoClass::OnlyOfType,
            "empty" => PseudoClass::Empty,
            "link" | "any-link" => PseudoClass::Link,
            "checked" => PseudoClass::Checked,
            "disabled" => PseudoClass::Disabled,
            "enabled" => PseudoClass::Enabled,
            "hover" | "active" | "focus" | "focus-within" | "focus-visible" | "visited"
            | "target" => return Ok(SimpleSelector::NeverMatch),
            _ => return Err(SelectorParseError::UnknownPseudoClass(name)),
        };
        Ok(SimpleSelector::PseudoClass(pseudo))
    }

    /// Compound selectors separated by commas, up to the closing `)`.
    fn parse_compound_list(&mut self) -> Result<Vec<CompoundSelector>, SelectorParseError> {
        let mut list = vec![self.parse_compound()?];
        let _ = self.skip_whitespace();
        while self.peek() == Some(',') {
            let _ = self.bump();
            let _ = self.skip_whitespace();
            list.push(self.parse_compound()?);
            let _ = self.skip_whitespace();
        }
        Ok(list)
    }

    /// The raw argument up to `)`, decoded as An+B.
    fn parse_nth(&mut self) -> Result<Nth, SelectorParseError> {
        let start = self.position;
        while self.peek().is_some_and(|c| c != ')') {
            let _ = self.bump();
        }
        let raw = &self.input[start..self.position];
        parse_nth(raw).ok_or_else(|| SelectorParseError::InvalidNth(raw.trim().to_string()))
    }
}

/// [§ 6 The An+B microsyntax](https://www.w3.org/TR/css-syntax-3/#anb-microsyntax)
///
/// Accepts `odd`, `even`, an integer, and `An+B` forms with optional signs
/// and inner whitespace.
#[must_use]
pub fn parse_nth(raw: &str) -> Option<Nth> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    match compact.as_str() {
        "odd" => return Some(Nth { a: 2, b: 1 }),
        "even" => return Some(Nth { a: 2, b: 0 }),
        _ => {}
    }
    let Some((step, offset)) = compact.split_once('n') else {
        return Some(Nth {
            a: 0,
            b: compact.parse().ok()?,
        });
    };
    let a = match step {
        "" | "+" => 1,
        "-" => -1,
        _ => step.parse().ok()?,
    };
    let b = if offset.is_empty() {
        0
    } else if offset.starts_with(['+', '-']) {
        offset.strip_prefix('+').unwrap_or(offset).parse().ok()?
    } else {
        return None;
    };
    Some(Nth { a, b })
}
