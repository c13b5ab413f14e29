//! XPath Lexer
//!
//! Tokenizes XPath expressions into tokens.
//!
//! [§ 3.7 Lexical Structure](https://www.w3.org/TR/xpath-10/#exprlex) resolves
//! the ambiguity between names and operators by looking at the preceding
//! token: "If there is a preceding token and the preceding token is not one of
//! @, ::, (, [, , or an Operator, then a * must be recognized as a
//! MultiplyOperator and an NCName must be recognized as an OperatorName."
//! This matters for HTML, where `div` is both an element and an operator.

/// XPath token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Operators
    /// `/`
    Slash,
    /// `//`
    DoubleSlash,
    /// `.`
    Dot,
    /// `..`
    DoubleDot,
    /// `@`
    At,
    /// `|`
    Pipe,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*` as a name test
    Star,
    /// `*` as multiplication
    Multiply,
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
    /// `and`
    And,
    /// `or`
    Or,
    /// `mod`
    Mod,
    /// `div`
    Div,

    // Brackets
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,

    // Literals
    /// Numeric literal
    Number(f64),
    /// Quoted string literal, quotes removed
    Literal(String),

    // Names
    /// `NCName`, used for name tests and function names
    Name(String),
    /// `node`, `text`, `comment` followed by `(`
    NodeType(String),
    /// Axis name followed by `::`
    Axis(String),

    // Special
    /// `::`
    DoubleColon,
    /// `,`
    Comma,
    /// A character that starts no token
    Unknown(char),

    /// End of input
    Eof,
}

impl Token {
    /// Whether a name following this token is an operator name.
    const fn ends_operand(&self) -> bool {
        matches!(
            self,
            Self::RightParen
                | Self::RightBracket
                | Self::Number(_)
                | Self::Literal(_)
                | Self::Name(_)
                | Self::Star
                | Self::Dot
                | Self::DoubleDot
        )
    }
}

/// XPath lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    operator_expected: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            operator_expected: false,
        }
    }

    /// Byte offset of the next unread character.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// The unread input.
    #[must_use]
    pub fn rest(&self) -> &'a str {
        self.remaining()
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        let token = self.scan();
        self.operator_expected = token.ends_operand();
        token
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance(1);
        token
    }

    fn scan(&mut self) -> Token {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Token::Eof;
        };

        match c {
            '/' => {
                self.advance(1);
                if self.peek() == Some('/') {
                    self.advance(1);
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '.' => {
                if self.peek_at(1) == Some('.') {
                    self.advance(2);
                    Token::DoubleDot
                } else if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.read_number()
                } else {
                    self.single(Token::Dot)
                }
            }
            '@' => self.single(Token::At),
            '|' => self.single(Token::Pipe),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' if self.operator_expected => self.single(Token::Multiply),
            '*' => self.single(Token::Star),
            '=' => self.single(Token::Eq),
            '!' if self.peek_at(1) == Some('=') => {
                self.advance(2);
                Token::NotEq
            }
            '<' | '>' => {
                self.advance(1);
                let or_equal = self.peek() == Some('=');
                if or_equal {
                    self.advance(1);
                }
                match (c, or_equal) {
                    ('<', false) => Token::Lt,
                    ('<', true) => Token::LtEq,
                    (_, false) => Token::Gt,
                    (_, true) => Token::GtEq,
                }
            }
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            ',' => self.single(Token::Comma),
            ':' if self.peek_at(1) == Some(':') => {
                self.advance(2);
                Token::DoubleColon
            }
            '"' | '\'' => self.read_literal(c),
            '0'..='9' => self.read_number(),
            _ if is_name_start_char(c) => self.read_name_or_keyword(),
            _ => {
                self.advance(c.len_utf8());
                Token::Unknown(c)
            }
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }
        if self.peek() == Some('.') {
            self.advance(1);
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance(1);
            }
        }
        Token::Number(self.input[start..self.pos].parse().unwrap_or(f64::NAN))
    }

    fn read_literal(&mut self, quote: char) -> Token {
        self.advance(1);
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                break;
            }
            self.advance(c.len_utf8());
        }
        if self.peek().is_none() {
            // Unterminated: hand the parser something it will reject.
            return Token::Unknown(quote);
        }
        let value = self.input[start..self.pos].to_string();
        self.advance(1);
        Token::Literal(value)
    }

    fn read_name_or_keyword(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        let name = &self.input[start..self.pos];

        if self.operator_expected {
            match name {
                "and" => return Token::And,
                "or" => return Token::Or,
                "mod" => return Token::Mod,
                "div" => return Token::Div,
                _ => {}
            }
        }

        let after_name = self.pos;
        self.skip_whitespace();
        if self.remaining().starts_with("::") {
            return Token::Axis(name.to_string());
        }
        if self.peek() == Some('(') && matches!(name, "node" | "text" | "comment") {
            return Token::NodeType(name.to_string());
        }
        self.pos = after_name;
        Token::Name(name.to_string())
    }

    /// Tokenize entire input
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if matches!(token, Token::Eof) {
                break;
            }
            tokens.push(token);
        }
        tokens
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let mut lexer = Lexer::new("/root/child");
        assert_eq!(lexer.next_token(), Token::Slash);
        assert_eq!(lexer.next_token(), Token::Name("root".to_string()));
        assert_eq!(lexer.next_token(), Token::Slash);
        assert_eq!(lexer.next_token(), Token::Name("child".to_string()));
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn test_predicate() {
        let mut lexer = Lexer::new("item[@id='test']");
        assert_eq!(lexer.next_token(), Token::Name("item".to_string()));
        assert_eq!(lexer.next_token(), Token::LeftBracket);
        assert_eq!(lexer.next_token(), Token::At);
        assert_eq!(lexer.next_token(), Token::Name("id".to_string()));
        assert_eq!(lexer.next_token(), Token::Eq);
        assert_eq!(lexer.next_token(), Token::Literal("test".to_string()));
        assert_eq!(lexer.next_token(), Token::RightBracket);
    }

    #[test]
    fn test_axis() {
        let mut lexer = Lexer::new("following-sibling :: *[1]");
        assert_eq!(
            lexer.next_token(),
            Token::Axis("following-sibling".to_string())
        );
        assert_eq!(lexer.next_token(), Token::DoubleColon);
        assert_eq!(lexer.next_token(), Token::Star);
        assert_eq!(lexer.next_token(), Token::LeftBracket);
        assert_eq!(lexer.next_token(), Token::Number(1.0));
    }

    #[test]
    fn test_element_named_like_operator() {
        let tokens = Lexer::new("child::div[@a] div 2").tokenize();
        assert_eq!(tokens[2], Token::Name("div".to_string()));
        assert_eq!(tokens[7], Token::Div);
    }

    #[test]
    fn test_star_after_operand_is_multiply() {
        let tokens = Lexer::new("count(*) * 2").tokenize();
        assert_eq!(tokens[2], Token::Star);
        assert_eq!(tokens[4], Token::Multiply);
    }

    #[test]
    fn test_mod_expression() {
        let tokens = Lexer::new("(position() + 1) mod 2 = 0").tokenize();
        assert!(tokens.contains(&Token::Mod));
        assert!(matches!(tokens.last(), Some(Token::Number(n)) if *n == 0.0));
    }

    #[test]
    fn test_node_type() {
        let tokens = Lexer::new("child::node()").tokenize();
        assert_eq!(tokens[2], Token::NodeType("node".to_string()));
    }

    #[test]
    fn test_unterminated_literal() {
        let mut lexer = Lexer::new("'abc");
        assert_eq!(lexer.next_token(), Token::Unknown('\''));
    }
}
