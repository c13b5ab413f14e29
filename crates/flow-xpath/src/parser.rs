//! XPath Parser
//!
//! Recursive descent parser for XPath 1.0 expressions, one function per
//! grammar level of [§ 3 Expressions](https://www.w3.org/TR/xpath-10/#section-Expressions).

use crate::XPathError;
use crate::lexer::{Lexer, Token};

/// Parsed XPath expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `/` on its own: the document node
    Root,
    /// `.`
    Context,
    /// `..`
    Parent,
    /// `a | b`
    Union(Box<Expr>, Box<Expr>),
    /// `base/step`
    Path(Box<Expr>, Box<Step>),
    /// `primary[predicate]`
    Filter(Box<Expr>, Box<Expr>),
    /// `name(args...)`
    Function(String, Vec<Expr>),
    /// Binary operator application
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Unary minus
    Negate(Box<Expr>),
    /// Numeric literal
    Number(f64),
    /// String literal
    Literal(String),
    /// A relative location path of one step from the context node
    Step(Box<Step>),
}

/// Binary operators, grouped by precedence in the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `or`
    Or,
    /// `and`
    And,
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `div`
    Div,
    /// `mod`
    Mod,
}

/// [§ 2.1 Location Steps](https://www.w3.org/TR/xpath-10/#section-Location-Steps)
///
/// "A location step has three parts: an axis, a node test, and zero or more
/// predicates."
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Direction of travel from the context node
    pub axis: Axis,
    /// Which nodes along the axis are selected
    pub node_test: NodeTest,
    /// Filters applied with positions counted along the axis
    pub predicates: Vec<Expr>,
}

impl Step {
    const fn new(axis: Axis, node_test: NodeTest) -> Self {
        Self {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }
}

/// [§ 2.2 Axes](https://www.w3.org/TR/xpath-10/#axes)
///
/// The namespace axis is not supported; HTML trees carry no namespace nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `child::`
    Child,
    /// `descendant::`
    Descendant,
    /// `descendant-or-self::`
    DescendantOrSelf,
    /// `parent::`
    Parent,
    /// `ancestor::`
    Ancestor,
    /// `ancestor-or-self::`
    AncestorOrSelf,
    /// `following-sibling::`
    FollowingSibling,
    /// `preceding-sibling::`
    PrecedingSibling,
    /// `following::`
    Following,
    /// `preceding::`
    Preceding,
    /// `self::`
    SelfAxis,
    /// `attribute::` or `@`
    Attribute,
}

impl Axis {
    /// Look up an axis by its XPath name.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Self::Child),
            "descendant" => Some(Self::Descendant),
            "descendant-or-self" => Some(Self::DescendantOrSelf),
            "parent" => Some(Self::Parent),
            "ancestor" => Some(Self::Ancestor),
            "ancestor-or-self" => Some(Self::AncestorOrSelf),
            "following-sibling" => Some(Self::FollowingSibling),
            "preceding-sibling" => Some(Self::PrecedingSibling),
            "following" => Some(Self::Following),
            "preceding" => Some(Self::Preceding),
            "self" => Some(Self::SelfAxis),
            "attribute" => Some(Self::Attribute),
            _ => None,
        }
    }

    /// [§ 2.4](https://www.w3.org/TR/xpath-10/#predicates) "An axis that only
    /// ever contains the context node or nodes that are before the context
    /// node in document order is a reverse axis."
    #[must_use]
    pub const fn is_reverse(self) -> bool {
        matches!(
            self,
            Self::Parent
                | Self::Ancestor
                | Self::AncestorOrSelf
                | Self::PrecedingSibling
                | Self::Preceding
        )
    }
}

/// [§ 2.3 Node Tests](https://www.w3.org/TR/xpath-10/#node-tests)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `*`: any node of the axis' principal type
    Any,
    /// A name test, compared ASCII-case-insensitively
    Name(String),
    /// `node()`
    Node,
    /// `text()`
    Text,
    /// `comment()`
    Comment,
}

/// XPath parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a parser positioned at the first token.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Parser { lexer, current }
    }

    /// Parse a complete expression; trailing tokens are an error.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError::Syntax`] or [`XPathError::UnknownAxis`] when the
    /// input is not a supported XPath 1.0 expression.
    pub fn parse(&mut self) -> Result<Expr, XPathError> {
        let expr = self.parse_or_expr()?;
        if self.current != Token::Eof {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn unexpected(&self) -> XPathError {
        XPathError::Syntax {
            message: format!("unexpected {:?}", self.current),
            offset: self.lexer.position(),
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), XPathError> {
        if self.current == *token {
            self.advance();
            Ok(())
        } else {
            Err(XPathError::Syntax {
                message: format!("expected {token:?}, found {:?}", self.current),
                offset: self.lexer.position(),
            })
        }
    }

    fn parse_or_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_and_expr()?;
        while self.current == Token::Or {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::Or, Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_equality_expr()?;
        while self.current == Token::And {
            self.advance();
            let right = self.parse_equality_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::And, Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_relational_expr()?;
        loop {
            let op = match self.current {
                Token::Eq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_additive_expr()?;
        loop {
            let op = match self.current {
                Token::Lt => BinaryOp::Lt,
                Token::LtEq => BinaryOp::LtEq,
                Token::Gt => BinaryOp::Gt,
                Token::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.current {
                Token::Multiply => BinaryOp::Mul,
                Token::Div => BinaryOp::Div,
                Token::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, XPathError> {
        if self.current == Token::Minus {
            self.advance();
            let expr = self.parse_unary_expr()?;
            Ok(Expr::Negate(Box::new(expr)))
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_path_expr()?;
        while self.current == Token::Pipe {
            self.advance();
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// `//` is shorthand for `/descendant-or-self::node()/`.
    fn descendant_or_self(base: Expr) -> Expr {
        Expr::Path(
            Box::new(base),
            Box::new(Step::new(Axis::DescendantOrSelf, NodeTest::Node)),
        )
    }

    fn parse_path_expr(&mut self) -> Result<Expr, XPathError> {
        let expr = match self.current {
            Token::Slash => {
                self.advance();
                if !self.starts_step() {
                    return Ok(Expr::Root);
                }
                let step = self.parse_step()?;
                Expr::Path(Box::new(Expr::Root), Box::new(step))
            }
            Token::DoubleSlash => {
                self.advance();
                let step = self.parse_step()?;
                Expr::Path(Box::new(Self::descendant_or_self(Expr::Root)), Box::new(step))
            }
            _ => self.parse_filter_expr()?,
        };
        self.parse_path_continuation(expr)
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.current,
            Token::Name(_)
                | Token::Star
                | Token::At
                | Token::Axis(_)
                | Token::NodeType(_)
                | Token::Dot
                | Token::DoubleDot
        )
    }

    fn parse_path_continuation(&mut self, mut expr: Expr) -> Result<Expr, XPathError> {
        loop {
            match self.current {
                Token::Slash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), Box::new(step));
                }
                Token::DoubleSlash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(Self::descendant_or_self(expr)), Box::new(step));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_filter_expr(&mut self) -> Result<Expr, XPathError> {
        let mut expr = self.parse_primary_expr()?;
        while self.current == Token::LeftBracket {
            self.advance();
            let pred = self.parse_or_expr()?;
            self.expect(&Token::RightBracket)?;
            expr = Expr::Filter(Box::new(expr), Box::new(pred));
        }
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, XPathError> {
        match &self.current {
            Token::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::Literal(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::Literal(s))
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_or_expr()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }
            Token::Name(name) => {
                let name = name.clone();
                if self.lexer_at_paren() {
                    self.advance();
                    self.advance(); // (
                    let args = self.parse_function_args()?;
                    Ok(Expr::Function(name, args))
                } else {
                    Ok(Expr::Step(Box::new(self.parse_step()?)))
                }
            }
            Token::Dot => {
                self.advance();
                Ok(Expr::Context)
            }
            Token::DoubleDot => {
                self.advance();
                Ok(Expr::Parent)
            }
            Token::Star | Token::At | Token::Axis(_) | Token::NodeType(_) => {
                Ok(Expr::Step(Box::new(self.parse_step()?)))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// A name directly followed by `(` is a function call.
    fn lexer_at_paren(&self) -> bool {
        let mut probe = Lexer::new(self.remaining_input());
        probe.next_token() == Token::LeftParen
    }

    fn remaining_input(&self) -> &'a str {
        self.lexer.rest()
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        let mut axis = Axis::Child;
        match &self.current {
            Token::Dot => {
                self.advance();
                return Ok(Step::new(Axis::SelfAxis, NodeTest::Node));
            }
            Token::DoubleDot => {
                self.advance();
                return Ok(Step::new(Axis::Parent, NodeTest::Node));
            }
            Token::At => {
                axis = Axis::Attribute;
                self.advance();
            }
            Token::Axis(name) => {
                axis = Axis::from_name(name).ok_or_else(|| XPathError::UnknownAxis(name.clone()))?;
                self.advance();
                self.expect(&Token::DoubleColon)?;
            }
            _ => {}
        }

        let node_test = match &self.current {
            Token::Star => NodeTest::Any,
            Token::Name(name) => NodeTest::Name(name.clone()),
            Token::NodeType(kind) => {
                let test = match kind.as_str() {
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => NodeTest::Node,
                };
                self.advance();
                self.expect(&Token::LeftParen)?;
                if self.current != Token::RightParen {
                    return Err(self.unexpected());
                }
                test
            }
            _ => return Err(self.unexpected()),
        };
        self.advance();

        let mut step = Step::new(axis, node_test);
        while self.current == Token::LeftBracket {
            self.advance();
            step.predicates.push(self.parse_or_expr()?);
            self.expect(&Token::RightBracket)?;
        }
        Ok(step)
    }

    fn parse_function_args(&mut self) -> Result<Vec<Expr>, XPathError> {
        let mut args = Vec::new();
        if self.current != Token::RightParen {
            args.push(self.parse_or_expr()?);
            while self.current == Token::Comma {
                self.advance();
                args.push(self.parse_or_expr()?);
            }
        }
        self.expect(&Token::RightParen)?;
        Ok(args)
    }
}

/// Parse an XPath expression.
///
/// # Errors
///
/// See [`Parser::parse`].
pub fn parse(input: &str) -> Result<Expr, XPathError> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let expr = parse("/root/child").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_context_relative_path() {
        let expr = parse("./descendant::li[@class='a']").unwrap();
        let Expr::Path(base, step) = expr else {
            panic!("expected a path");
        };
        assert_eq!(*base, Expr::Context);
        assert_eq!(step.axis, Axis::Descendant);
        assert_eq!(step.node_test, NodeTest::Name("li".to_string()));
        assert_eq!(step.predicates.len(), 1);
    }

    #[test]
    fn test_descendant_shorthand() {
        let expr = parse("//item").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_function() {
        let expr = parse("count(preceding-sibling::*)").unwrap();
        assert!(matches!(expr, Expr::Function(name, args) if name == "count" && args.len() == 1));
    }

    #[test]
    fn test_node_type_step() {
        let expr = parse("count(child::node()) = 0").unwrap();
        assert!(matches!(expr, Expr::Binary(_, BinaryOp::Eq, _)));
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 mod 2 = 1 and true()").unwrap();
        assert!(matches!(expr, Expr::Binary(_, BinaryOp::And, _)));
    }

    #[test]
    fn test_unknown_axis() {
        assert!(matches!(
            parse("namespace::x"),
            Err(XPathError::UnknownAxis(name)) if name == "namespace"
        ));
    }

    #[test]
    fn test_trailing_garbage() {
        assert!(matches!(parse("a ]"), Err(XPathError::Syntax { .. })));
        assert!(parse("a[").is_err());
    }
}
