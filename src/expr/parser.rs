//! Lexer and recursive-descent parser for formula expressions
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! ternary   := or ( "?" ternary ":" ternary )?
//! or        := and ( ("||" | "or") and )*
//! and       := equality ( ("&&" | "and") equality )*
//! equality  := compare ( ("==" | "!=") compare )*
//! compare   := additive ( ("<" | "<=" | ">" | ">=") additive )*
//! additive  := term ( ("+" | "-") term )*
//! term      := unary ( ("*" | "/" | "%") unary )*
//! unary     := ("-" | "+" | "!" | "not") unary | power
//! power     := postfix ( "^" unary )?
//! postfix   := primary ( "." ident | "[" ternary "]" )*
//! primary   := number | string | "true" | "false" | ident | ident "(" args ")" | "(" ternary ")"
//! ```

use thiserror::Error;

/// Deepest recursion the parser allows (ternaries, unary chains, parentheses)
const MAX_NESTING: usize = 256;
/// Longest formula, in tokens; also bounds the depth of operator chains
const MAX_TOKENS: usize = 1024;

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Neq,
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f32),
    Str(String),
    Bool(bool),
    /// A variable reference (e.g. `frame`, `objects`)
    Ident(String),
    /// Dotted member access (`objects.p1`)
    Member { object: Box<Expr>, field: String },
    /// Indexed member access (`objects["home.player1"]`)
    Index { object: Box<Expr>, index: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    Conditional {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Call { name: String, args: Vec<Expr> },
}

/// Error produced while tokenizing or parsing
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error at {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f32),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Question,
    Colon,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    AndAnd,
    OrOr,
}

fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens: Vec<(Token, usize)> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        // A dot directly after an operand is member access, otherwise it may start `.5`
        let after_operand = matches!(
            tokens.last(),
            Some((Token::Ident(_) | Token::RParen | Token::RBracket | Token::Number(_) | Token::Str(_), _))
        );
        let starts_number = c.is_ascii_digit()
            || (c == '.'
                && !after_operand
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()));

        if starts_number {
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .parse::<f32>()
                .map_err(|_| ParseError::new(format!("invalid number '{text}'"), start))?;
            tokens.push((Token::Number(value), start));
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '$' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                i += 1;
            }
            tokens.push((Token::Ident(chars[start..i].iter().collect()), start));
            continue;
        }

        if c == '"' || c == '\'' {
            i += 1;
            let mut text = String::new();
            loop {
                match chars.get(i) {
                    None => return Err(ParseError::new("unterminated string", start)),
                    Some(&ch) if ch == c => {
                        i += 1;
                        break;
                    }
                    Some('\\') => {
                        match chars.get(i + 1) {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(&other) => text.push(other),
                            None => return Err(ParseError::new("unterminated string", start)),
                        }
                        i += 2;
                    }
                    Some(&ch) => {
                        text.push(ch);
                        i += 1;
                    }
                }
            }
            tokens.push((Token::Str(text), start));
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (token, len) = match (c, next) {
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('<', Some('=')) => (Token::Lte, 2),
            ('>', Some('=')) => (Token::Gte, 2),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('^', _) => (Token::Caret, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (',', _) => (Token::Comma, 1),
            ('.', _) => (Token::Dot, 1),
            ('?', _) => (Token::Question, 1),
            (':', _) => (Token::Colon, 1),
            ('!', _) => (Token::Bang, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            _ => return Err(ParseError::new(format!("unexpected character '{c}'"), start)),
        };
        tokens.push((token, start));
        i += len;
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    /// Run `rule` one nesting level deeper, failing past `MAX_NESTING`
    fn nested(&mut self, rule: fn(&mut Self) -> Result<Expr, ParseError>) -> Result<Expr, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new("expression nested too deeply", self.position()));
        }
        self.depth += 1;
        let expr = rule(self);
        self.depth -= 1;
        expr
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|(_, p)| *p).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(name)) if name == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ParseError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(ParseError::new(format!("expected {what}"), self.position()))
        }
    }

    fn ternary(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> Result<Expr, ParseError> {
        let condition = self.or()?;
        if self.eat(&Token::Question) {
            let then_expr = self.ternary()?;
            self.expect(Token::Colon, "':'")?;
            let else_expr = self.ternary()?;
            return Ok(Expr::Conditional {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            });
        }
        Ok(condition)
    }

    fn or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.and()?;
        while self.eat(&Token::OrOr) || self.eat_keyword("or") {
            let right = self.and()?;
            left = binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.equality()?;
        while self.eat(&Token::AndAnd) || self.eat_keyword("and") {
            let right = self.equality()?;
            left = binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.compare()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinOp::Eq,
                Some(Token::NotEq) => BinOp::Neq,
                _ => break,
            };
            self.pos += 1;
            let right = self.compare()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn compare(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::Lte) => BinOp::Lte,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::Gte) => BinOp::Gte,
                _ => break,
            };
            self.pos += 1;
            let right = self.additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.term()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let right = self.unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::prefixed)
    }

    fn prefixed(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Plus) => Some(UnaryOp::Plus),
            Some(Token::Bang) => Some(UnaryOp::Not),
            Some(Token::Ident(name)) if name == "not" => Some(UnaryOp::Not),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                let operand = self.unary()?;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.postfix()?;
        if self.eat(&Token::Caret) {
            // Right associative: 2^3^2 == 2^(3^2)
            let exponent = self.unary()?;
            return Ok(binary(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) {
                match self.advance() {
                    Some(Token::Ident(field)) => {
                        expr = Expr::Member {
                            object: Box::new(expr),
                            field,
                        };
                    }
                    _ => return Err(ParseError::new("expected member name after '.'", self.position())),
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.ternary()?;
                self.expect(Token::RBracket, "']'")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::LParen) => {
                let inner = self.ternary()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                _ if self.peek() == Some(&Token::LParen) => {
                    self.pos += 1;
                    let args = self.arguments()?;
                    Ok(Expr::Call { name, args })
                }
                _ => Ok(Expr::Ident(name)),
            },
            Some(token) => Err(ParseError::new(format!("unexpected token {token:?}"), position)),
            None => Err(ParseError::new("unexpected end of expression", position)),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.ternary()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(Token::RParen, "')' after arguments")?;
            return Ok(args);
        }
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

impl Expr {
    /// Parse a complete expression; trailing input is an error
    pub fn parse(src: &str) -> Result<Expr, ParseError> {
        let tokens = tokenize(src)?;
        if tokens.len() > MAX_TOKENS {
            return Err(ParseError::new("expression too long", 0));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            end: src.len(),
            depth: 0,
        };
        let expr = parser.ternary()?;
        if parser.pos < parser.tokens.len() {
            return Err(ParseError::new("unexpected trailing input", parser.position()));
        }
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    #[test]
    fn test_literal_parsing() {
        assert_eq!(Expr::parse("42.5").unwrap(), Expr::Number(42.5));
        assert_eq!(Expr::parse(".5").unwrap(), Expr::Number(0.5));
        assert_eq!(Expr::parse("1e3").unwrap(), Expr::Number(1000.0));
        assert_eq!(Expr::parse("'hi'").unwrap(), Expr::Str("hi".to_string()));
        assert_eq!(Expr::parse("true").unwrap(), Expr::Bool(true));
    }

    #[test]
    fn test_operator_precedence_mul_over_add() {
        let parsed = Expr::parse("a + b * c").unwrap();
        assert_eq!(
            parsed,
            binary(BinOp::Add, ident("a"), binary(BinOp::Mul, ident("b"), ident("c")))
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let parsed = Expr::parse("(a + b) * c").unwrap();
        assert_eq!(
            parsed,
            binary(BinOp::Mul, binary(BinOp::Add, ident("a"), ident("b")), ident("c"))
        );
    }

    #[test]
    fn test_power_is_right_associative_and_binds_over_negation() {
        let parsed = Expr::parse("-2^3^2").unwrap();
        let expected = Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(binary(
                BinOp::Pow,
                Expr::Number(2.0),
                binary(BinOp::Pow, Expr::Number(3.0), Expr::Number(2.0)),
            )),
        };
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_member_and_index_access() {
        let parsed = Expr::parse("objects.p1.x").unwrap();
        let expected = Expr::Member {
            object: Box::new(Expr::Member {
                object: Box::new(ident("objects")),
                field: "p1".to_string(),
            }),
            field: "x".to_string(),
        };
        assert_eq!(parsed, expected);

        let parsed = Expr::parse("objects[\"home.player1\"].y").unwrap();
        match parsed {
            Expr::Member { object, field } => {
                assert_eq!(field, "y");
                assert!(matches!(*object, Expr::Index { .. }));
            }
            other => panic!("Expected Member, got {other:?}"),
        }
    }

    #[test]
    fn test_function_calls() {
        match Expr::parse("max(min(a, b), c)").unwrap() {
            Expr::Call { name, args } => {
                assert_eq!(name, "max");
                assert_eq!(args.len(), 2);
                assert!(matches!(&args[0], Expr::Call { name, .. } if name == "min"));
            }
            other => panic!("Expected Call, got {other:?}"),
        }
        assert_eq!(
            Expr::parse("rand()").unwrap(),
            Expr::Call {
                name: "rand".to_string(),
                args: vec![]
            }
        );
    }

    #[test]
    fn test_ternary_and_keywords() {
        match Expr::parse("frame > 10 and not hidden ? 1 : 0").unwrap() {
            Expr::Conditional { condition, .. } => {
                assert!(matches!(*condition, Expr::Binary { op: BinOp::And, .. }));
            }
            other => panic!("Expected Conditional, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_input() {
        assert!(Expr::parse("").is_err());
        assert!(Expr::parse("1 +").is_err());
        assert!(Expr::parse("(1 + 2").is_err());
        assert!(Expr::parse("1 2").is_err());
        assert!(Expr::parse("'open").is_err());
        assert!(Expr::parse("a # b").is_err());
        assert!(Expr::parse("objects.").is_err());
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let parens = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
        assert!(Expr::parse(&parens).is_err());
        // Under the token limit, still too deep
        let parens = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert!(Expr::parse(&parens).is_err());
        let negations = format!("{}1", "-".repeat(300));
        assert!(Expr::parse(&negations).is_err());
        let chain = vec!["1"; 2000].join("+");
        assert!(Expr::parse(&chain).is_err());

        let modest = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(Expr::parse(&modest).unwrap(), Expr::Number(1.0));
    }

    #[test]
    fn test_whitespace_handling() {
        assert_eq!(
            Expr::parse("  a   +   b  ").unwrap(),
            binary(BinOp::Add, ident("a"), ident("b"))
        );
    }
}
