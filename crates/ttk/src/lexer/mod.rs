//! Template tokenizer.
//!
//! Splits source text into text runs and directives, applies chomp flags to
//! the whitespace around each directive, and tokenizes directive bodies with
//! winnow. Interpolated strings and (optionally) plain text are re-scanned
//! for `$var` references.

mod chomp;
mod directive;
mod interpolate;
mod keywords;
mod scanner;
mod token;

pub use chomp::Chomp;
pub use token::{Token, TokenKind};

use crate::parser::ParseError;

/// Lexer settings, normally derived from a [`Template`](crate::Template).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerOptions {
    pub start_tag: String,
    pub end_tag: String,
    pub pre_chomp: Chomp,
    pub post_chomp: Chomp,
    /// Scan plain text for `$var` and `${ expr }`.
    pub interpolate: bool,
    /// Recognize reserved words in any case.
    pub anycase: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        LexerOptions {
            start_tag: "[%".to_string(),
            end_tag: "%]".to_string(),
            pre_chomp: Chomp::None,
            post_chomp: Chomp::None,
            interpolate: false,
            anycase: false,
        }
    }
}

/// Tokenize template source.
///
/// The result always ends with a [`TokenKind::Eof`] token, and every
/// directive is followed by a [`TokenKind::Semicolon`].
///
/// # Example
///
/// ```
/// use ttk::lexer::{tokenize, LexerOptions, TokenKind};
///
/// let tokens = tokenize("Hi [% name %]", &LexerOptions::default()).unwrap();
/// let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     [TokenKind::Text, TokenKind::Ident, TokenKind::Semicolon, TokenKind::Eof]
/// );
/// ```
///
/// # Errors
///
/// Returns an error for an unterminated quoted string.
pub fn tokenize(source: &str, options: &LexerOptions) -> Result<Vec<Token>, ParseError> {
    scanner::scan(source, options)
}
