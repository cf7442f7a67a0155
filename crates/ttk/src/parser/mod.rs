//! Recursive-descent parser producing a [`Document`].
//!
//! The grammar reads a token buffer through a rewindable cursor. Statements,
//! directives and argument lists live in `grammar`, expressions in
//! `expression`; `document` hoists BLOCK definitions once parsing succeeds.

pub mod ast;
mod cursor;
mod document;
mod error;
mod expression;
mod grammar;

pub use ast::Document;
pub use error::ParseError;
pub use grammar::ParseOptions;

use crate::diagnostics::Diagnostics;
use crate::lexer::Token;

/// Parse a token buffer produced by [`tokenize`](crate::lexer::tokenize).
///
/// `source` is the text the tokens came from; it is only used to locate
/// errors.
///
/// # Errors
///
/// Returns the first syntax error. There is no recovery.
pub fn parse(
    tokens: &[Token],
    source: &str,
    options: ParseOptions,
    diagnostics: &dyn Diagnostics,
) -> Result<Document, ParseError> {
    let mut parser = grammar::Parser::new(tokens, source, options, diagnostics);
    let body = parser.template()?;
    Document::compile(body, source)
}
