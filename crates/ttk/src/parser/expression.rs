//! Expression grammar: precedence climbing over binary operators, the
//! ternary, and the primary terms beneath them.

use super::ast::{Args, BinaryOp, Expr, Number, Path, QuotedPart, Segment, SegmentName};
use super::grammar::{PResult, Parser};
use crate::lexer::TokenKind;

/// An infix operator found at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Infix {
    Binary(BinaryOp),
    Ternary,
}

impl Parser<'_> {
    pub(super) fn expr(&mut self) -> PResult<Option<Expr>> {
        self.trace("expr");
        match self.operand()? {
            Some(lhs) => self.expr_tail(lhs).map(Some),
            None => Ok(None),
        }
    }

    /// Continue an expression whose first operand is already parsed.
    pub(super) fn expr_tail(&mut self, lhs: Expr) -> PResult<Expr> {
        self.binary(lhs, 0)
    }

    fn infix(&self) -> Option<Infix> {
        let token = self.cursor.peek();
        let op = match token.kind {
            TokenKind::Question => return Some(Infix::Ternary),
            TokenKind::CmpOp => match token.literal.as_str() {
                "==" => BinaryOp::Eq,
                "!=" => BinaryOp::Ne,
                "<" => BinaryOp::Lt,
                ">" => BinaryOp::Gt,
                "<=" => BinaryOp::Le,
                _ => BinaryOp::Ge,
            },
            TokenKind::BinOp => match token.literal.as_str() {
                "-" => BinaryOp::Sub,
                "*" => BinaryOp::Mul,
                _ => BinaryOp::Mod,
            },
            TokenKind::And => BinaryOp::And,
            TokenKind::Or => BinaryOp::Or,
            TokenKind::Cat => BinaryOp::Cat,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Div => BinaryOp::IntDiv,
            _ => return None,
        };
        Some(Infix::Binary(op))
    }

    /// Fold infix operators binding at least as tightly as `min` onto `lhs`.
    fn binary(&mut self, mut lhs: Expr, min: u8) -> PResult<Expr> {
        let mut folded = 0;
        while let Some(infix) = self.infix() {
            match infix {
                Infix::Ternary => {
                    if min > 0 {
                        break;
                    }
                    self.cursor.consume();
                    let then = self.operand()?;
                    let then = self.require(then, "expression")?;
                    let then = self.binary(then, 1)?;
                    self.expect(TokenKind::Colon, "':'")?;
                    let otherwise = self.nested(Self::expr)?;
                    return Ok(Expr::Ternary {
                        condition: Box::new(lhs),
                        then: Box::new(then),
                        otherwise: Box::new(self.require(otherwise, "expression")?),
                    });
                }
                Infix::Binary(op) => {
                    let precedence = op.precedence();
                    if precedence < min {
                        break;
                    }
                    folded += 1;
                    self.check_nesting(folded)?;
                    self.cursor.consume();
                    let rhs = self.operand()?;
                    let rhs = self.require(rhs, "expression")?;
                    let rhs = self.binary(rhs, precedence + 1)?;
                    lhs = Expr::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
            }
        }
        Ok(lhs)
    }

    /// A term, possibly negated. `NOT` applies to the term only.
    fn operand(&mut self) -> PResult<Option<Expr>> {
        self.nested(|parser| {
            if parser.eat(TokenKind::Not) {
                let inner = parser.operand()?;
                return Ok(Some(Expr::Not(Box::new(parser.require(inner, "expression")?))));
            }
            parser.term()
        })
    }

    /// A primary term, a list/hash literal, or a parenthesized expression.
    pub(super) fn term(&mut self) -> PResult<Option<Expr>> {
        self.trace("term");
        match self.cursor.kind() {
            TokenKind::LParen => {
                self.cursor.consume();
                let inner = self.parenthesized()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Some(inner))
            }
            TokenKind::LBracket | TokenKind::LBrace => self.lterm().map(Some),
            _ => self.sterm(),
        }
    }

    /// The inside of `( ... )`: an expression or a single assignment.
    fn parenthesized(&mut self) -> PResult<Expr> {
        let mark = self.cursor.mark();
        if let Some(target) = self.ident()? {
            if self.eat(TokenKind::Assign) {
                let value = self.expr()?;
                return Ok(Expr::Assign {
                    target,
                    value: Box::new(self.require(value, "expression")?),
                });
            }
            self.cursor.reset(mark);
        }
        let inner = self.expr()?;
        self.require(inner, "expression")
    }

    /// Literals, numbers, references, quoted strings and variable paths.
    fn sterm(&mut self) -> PResult<Option<Expr>> {
        match self.cursor.kind() {
            TokenKind::Literal => Ok(Some(Expr::Literal(self.cursor.consume().literal))),
            TokenKind::Number => self.number().map(Some),
            TokenKind::Ref => {
                self.cursor.consume();
                let path = self.ident()?;
                Ok(Some(Expr::Ref(self.require(path, "variable")?)))
            }
            TokenKind::Quote => {
                self.cursor.consume();
                let parts = self.quoted()?;
                self.expect(TokenKind::Quote, "closing quote")?;
                Ok(Some(Expr::Quoted(parts)))
            }
            _ => Ok(self.ident()?.map(Expr::Path)),
        }
    }

    fn number(&mut self) -> PResult<Expr> {
        let token = self.cursor.peek();
        let number = if token.literal.contains('.') {
            token.literal.parse().ok().map(Number::Float)
        } else {
            token
                .literal
                .parse()
                .map(Number::Integer)
                .ok()
                .or_else(|| token.literal.parse().ok().map(Number::Float))
        };
        let number = number.ok_or_else(|| self.error("malformed number"))?;
        self.cursor.consume();
        Ok(Expr::Number(number))
    }

    /// List, range and hash literals.
    fn lterm(&mut self) -> PResult<Expr> {
        if self.eat(TokenKind::LBrace) {
            let mut pairs = Vec::new();
            loop {
                if self.eat(TokenKind::RBrace) {
                    return Ok(Expr::Hash(pairs));
                }
                if self.eat(TokenKind::Comma) {
                    continue;
                }
                let key = self.hash_key()?;
                self.expect(TokenKind::Assign, "'=' or '=>'")?;
                let value = self.expr()?;
                pairs.push((key, self.require(value, "expression")?));
            }
        }

        self.expect(TokenKind::LBracket, "'['")?;
        let mut items = Vec::new();
        loop {
            if self.eat(TokenKind::RBracket) {
                return Ok(Expr::List(items));
            }
            if self.eat(TokenKind::Comma) {
                continue;
            }
            let item = self.expr()?;
            let item = self.require(item, "list item")?;
            if items.is_empty() && self.eat(TokenKind::To) {
                let to = self.term()?;
                let to = self.require(to, "range end")?;
                self.expect(TokenKind::RBracket, "']'")?;
                return Ok(Expr::Range {
                    from: Box::new(item),
                    to: Box::new(to),
                });
            }
            items.push(item);
        }
    }

    fn hash_key(&mut self) -> PResult<SegmentName> {
        match self.cursor.kind() {
            TokenKind::Ident | TokenKind::Literal | TokenKind::Number => {
                Ok(SegmentName::Name(self.cursor.consume().literal))
            }
            TokenKind::Dollar | TokenKind::DollarBrace => self.computed_name(),
            TokenKind::Quote => {
                self.cursor.consume();
                let parts = self.quoted()?;
                self.expect(TokenKind::Quote, "closing quote")?;
                Ok(SegmentName::Computed(Box::new(Expr::Quoted(parts))))
            }
            _ => Err(self.error(format!("hash key expected, found '{}'", self.cursor.peek().literal))),
        }
    }

    /// Text and variable references between synthetic quote tokens.
    pub(super) fn quoted(&mut self) -> PResult<Vec<QuotedPart>> {
        let mut parts = Vec::new();
        loop {
            match self.cursor.kind() {
                TokenKind::Quote | TokenKind::Eof => return Ok(parts),
                TokenKind::Text => parts.push(QuotedPart::Text(self.cursor.consume().literal)),
                TokenKind::Semicolon => {
                    self.cursor.consume();
                }
                _ => {
                    let path = self.ident()?;
                    parts.push(QuotedPart::Path(self.require(path, "variable")?));
                }
            }
        }
    }

    /// A dotted path of nodes. A numeric segment indexes a list; a float
    /// token such as `0.1` in `matrix.0.1` is two indices.
    pub(super) fn ident(&mut self) -> PResult<Option<Path>> {
        let Some(first) = self.node()? else {
            return Ok(None);
        };
        let mut segments = vec![first];
        while self.at(TokenKind::Dot) {
            self.cursor.consume();
            if self.at(TokenKind::Number) {
                let index = self.cursor.consume().literal;
                segments.extend(index.split('.').map(|part| Segment {
                    name: SegmentName::Name(part.to_string()),
                    args: None,
                }));
                continue;
            }
            let node = self.node()?;
            segments.push(self.require(node, "identifier")?);
        }
        Ok(Some(Path { segments }))
    }

    /// One path segment: `name`, `$var` or `${ expr }`, with optional call
    /// arguments.
    fn node(&mut self) -> PResult<Option<Segment>> {
        let name = match self.cursor.kind() {
            TokenKind::Ident => SegmentName::Name(self.cursor.consume().literal),
            TokenKind::Dollar | TokenKind::DollarBrace => self.computed_name()?,
            _ => return Ok(None),
        };
        let args = if self.at(TokenKind::LParen) {
            Some(self.params()?)
        } else {
            None
        };
        Ok(Some(Segment { name, args }))
    }

    /// `$name` or `${ expr }`. With `v1dollar`, `$name` is just `name`.
    fn computed_name(&mut self) -> PResult<SegmentName> {
        if self.eat(TokenKind::DollarBrace) {
            let inner = self.expr()?;
            let inner = self.require(inner, "expression")?;
            self.expect(TokenKind::RBrace, "'}'")?;
            return Ok(SegmentName::Computed(Box::new(inner)));
        }
        self.expect(TokenKind::Dollar, "'$'")?;
        let name = self.expect(TokenKind::Ident, "variable name after '$'")?.literal;
        if self.options.v1dollar {
            Ok(SegmentName::Name(name))
        } else {
            Ok(SegmentName::Computed(Box::new(Expr::Path(Path::simple(name)))))
        }
    }

    /// `( args )` after a path segment.
    fn params(&mut self) -> PResult<Args> {
        self.expect(TokenKind::LParen, "'('")?;
        let args = self.args()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(args)
    }
}
