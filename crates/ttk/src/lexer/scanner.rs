//! Splits template source into text runs and directives.

use winnow::error::ErrMode;
use winnow::prelude::*;

use super::LexerOptions;
use super::chomp::Chomp;
use super::directive::{Lexeme, lexeme, number};
use super::keywords::{operator_kind, word_kind};
use super::token::{Token, TokenKind};
use crate::parser::ParseError;

/// Tokenize a whole template.
pub(crate) fn scan(source: &str, options: &LexerOptions) -> Result<Vec<Token>, ParseError> {
    let mut scanner = Scanner::new(source, options.anycase);
    let mut offset = 0;
    let mut post_chomp = Chomp::None;

    while let Some((start, end)) = find_directive(source, offset, options) {
        let mut text = post_chomp.apply_post(&source[offset..start]);
        let body_start = start + options.start_tag.len();
        let directive = Directive::split(&source[body_start..end], body_start, options);
        if !text.is_empty() {
            directive.pre_chomp.apply_pre(&mut text);
        }
        scanner.text_run(&text, offset, options.interpolate)?;
        if !directive.comment {
            scanner.directive(directive.body, directive.position)?;
        }
        scanner.separator(end);

        post_chomp = directive.post_chomp;
        offset = end + options.end_tag.len();
    }

    let text = post_chomp.apply_post(&source[offset..]);
    scanner.text_run(&text, offset, options.interpolate)?;
    Ok(scanner.finish())
}

/// Locate the next complete directive, returning the offsets of its start
/// tag and of its end tag. A start tag with no end tag is left as text.
fn find_directive(source: &str, offset: usize, options: &LexerOptions) -> Option<(usize, usize)> {
    if options.start_tag.is_empty() || options.end_tag.is_empty() {
        return None;
    }
    let start = offset + source[offset..].find(options.start_tag.as_str())?;
    let body = start + options.start_tag.len();
    let end = body + source[body..].find(options.end_tag.as_str())?;
    Some((start, end))
}

/// The inside of one directive with its chomp flags removed.
struct Directive<'s> {
    body: &'s str,
    position: usize,
    comment: bool,
    pre_chomp: Chomp,
    post_chomp: Chomp,
}

impl<'s> Directive<'s> {
    fn split(raw: &'s str, position: usize, options: &LexerOptions) -> Self {
        let comment = raw.starts_with('#');
        let mut body = raw;
        let mut position = position;
        let mut pre_chomp = options.pre_chomp;
        if !comment {
            if let Some(flag) = raw.chars().next().and_then(Chomp::from_flag) {
                pre_chomp = flag;
                body = &raw[1..];
                position += 1;
            }
        }

        let mut post_chomp = options.post_chomp;
        let trimmed = body.trim_end();
        if let Some(flag) = trimmed.chars().last().and_then(Chomp::from_flag) {
            post_chomp = flag;
            body = &trimmed[..trimmed.len() - 1];
        }

        Directive {
            body,
            position,
            comment,
            pre_chomp,
            post_chomp,
        }
    }
}

/// Accumulates tokens for one template.
pub(crate) struct Scanner<'s> {
    source: &'s str,
    anycase: bool,
    tokens: Vec<Token>,
}

impl<'s> Scanner<'s> {
    fn new(source: &'s str, anycase: bool) -> Self {
        Scanner {
            source,
            anycase,
            tokens: Vec::new(),
        }
    }

    fn finish(mut self) -> Vec<Token> {
        self.push(TokenKind::Eof, "", self.source.len());
        self.tokens
    }

    pub(super) fn push(&mut self, kind: TokenKind, literal: impl Into<String>, position: usize) {
        self.tokens.push(Token::new(kind, literal, position));
    }

    pub(super) fn separator(&mut self, position: usize) {
        self.push(TokenKind::Semicolon, ";", position);
    }

    fn text_run(&mut self, text: &str, position: usize, interpolate: bool) -> Result<(), ParseError> {
        if text.is_empty() {
            Ok(())
        } else if interpolate {
            self.interpolate(text, position)
        } else {
            self.push(TokenKind::Text, text, position);
            Ok(())
        }
    }

    /// Tokenize the body of a directive starting at byte offset `base`.
    pub(super) fn directive(&mut self, body: &str, base: usize) -> Result<(), ParseError> {
        let mut rest = body;
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                return Ok(());
            }
            let position = base + (body.len() - rest.len());
            match lexeme.parse_next(&mut rest) {
                Ok(lexeme) => self.classify(lexeme, &mut rest, position)?,
                Err(ErrMode::Cut(_)) => {
                    return Err(ParseError::unterminated_string(self.source, position));
                }
                Err(_) => {
                    return Err(ParseError::syntax(self.source, position, "unrecognised input"));
                }
            }
        }
    }

    fn classify(&mut self, lexeme: Lexeme<'_>, rest: &mut &str, position: usize) -> Result<(), ParseError> {
        match lexeme {
            Lexeme::Comment => {}
            Lexeme::Quoted { quote: '\'', content } => {
                self.push(TokenKind::Literal, unescape_single(content), position);
            }
            Lexeme::Quoted { content, .. } => self.double_quoted(content, position)?,
            Lexeme::Number(n) => self.push(TokenKind::Number, n, position),
            Lexeme::Filename(name) => self.push(TokenKind::Filename, name, position),
            Lexeme::Word(word) => match word_kind(word, self.anycase) {
                Some((kind, literal)) => self.push(kind, literal, position),
                None => self.push(TokenKind::Ident, word, position),
            },
            Lexeme::Operator("-") if self.sign_allowed() && rest.starts_with(|c: char| c.is_ascii_digit()) => {
                let digits = number
                    .parse_next(rest)
                    .map_err(|_| ParseError::syntax(self.source, position, "malformed number"))?;
                self.push(TokenKind::Number, format!("-{digits}"), position);
            }
            Lexeme::Operator(op) => self.push(operator_kind(op), op, position),
            Lexeme::Unquoted(text) => self.push(TokenKind::Unquoted, text, position),
        }
        Ok(())
    }

    /// A `-` before digits is a sign unless it follows an operand.
    fn sign_allowed(&self) -> bool {
        !self.tokens.last().is_some_and(|t| t.kind.ends_operand())
    }

    /// Double-quoted strings with `$` or `\` are decoded and interpolated
    /// between synthetic quote tokens; others are plain literals.
    fn double_quoted(&mut self, content: &str, position: usize) -> Result<(), ParseError> {
        if !content.contains(['$', '\\']) {
            self.push(TokenKind::Literal, content, position);
            return Ok(());
        }
        self.push(TokenKind::Quote, "\"", position);
        self.interpolate(&decode_escapes(content), position + 1)?;
        self.push(TokenKind::Quote, "\"", position + content.len() + 1);
        Ok(())
    }
}

fn unescape_single(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('\\', Some(&next @ ('\'' | '\\'))) => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Decode `\n`, `\r`, `\t` and `\X`; `\$` is kept for the interpolator.
fn decode_escapes(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('$') => out.push_str("\\$"),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
