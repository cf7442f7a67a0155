//! Read cursor over an immutable token buffer.

use crate::lexer::{Token, TokenKind};

/// A seekable position in a token slice.
///
/// The cursor never modifies the buffer. Rewinding is explicit: `unconsume`
/// steps back one token and `reset` returns to a saved `mark`.
pub(crate) struct TokenCursor<'t> {
    tokens: &'t [Token],
    watermark: usize,
    eof: Token,
}

impl<'t> TokenCursor<'t> {
    pub(crate) fn new(tokens: &'t [Token]) -> Self {
        let end = tokens.last().map_or(0, |t| t.position);
        TokenCursor {
            tokens,
            watermark: 0,
            eof: Token::new(TokenKind::Eof, "", end),
        }
    }

    pub(crate) fn peek(&self) -> &Token {
        self.tokens.get(self.watermark).unwrap_or(&self.eof)
    }

    pub(crate) fn kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// Return the current token and advance past it. At the end of the
    /// buffer this keeps returning the end-of-input token.
    pub(crate) fn consume(&mut self) -> Token {
        let token = self.peek().clone();
        if self.watermark < self.tokens.len() {
            self.watermark += 1;
        }
        token
    }

    pub(crate) fn unconsume(&mut self) {
        self.watermark = self.watermark.saturating_sub(1);
    }

    pub(crate) fn mark(&self) -> usize {
        self.watermark
    }

    pub(crate) fn reset(&mut self, mark: usize) {
        self.watermark = mark;
    }
}
