//! Lexemes inside a directive, recognized with winnow.

use winnow::ascii::digit1;
use winnow::combinator::{alt, opt, repeat};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

/// A raw lexeme before reserved-word and operator classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lexeme<'i> {
    Comment,
    Quoted { quote: char, content: &'i str },
    Number(&'i str),
    Filename(&'i str),
    Word(&'i str),
    Operator(&'i str),
    Unquoted(&'i str),
}

/// Recognize the next lexeme. Alternatives are tried in priority order, so
/// `a/b` is a filename rather than a division and `12` a number rather than
/// a word.
///
/// An unterminated quoted string fails with `ErrMode::Cut`.
pub(crate) fn lexeme<'i>(input: &mut &'i str) -> ModalResult<Lexeme<'i>> {
    alt((
        comment.value(Lexeme::Comment),
        quoted.map(|(quote, content)| Lexeme::Quoted { quote, content }),
        number.map(Lexeme::Number),
        filename.map(Lexeme::Filename),
        word.map(Lexeme::Word),
        operator.map(Lexeme::Operator),
        take_while(1.., |c: char| !c.is_whitespace()).map(Lexeme::Unquoted),
    ))
    .parse_next(input)
}

/// `#` up to the end of the line.
fn comment(input: &mut &str) -> ModalResult<()> {
    ('#', take_till(0.., |c: char| c == '\n'))
        .void()
        .parse_next(input)
}

/// A single or double quoted string; the content keeps its escapes.
fn quoted<'i>(input: &mut &'i str) -> ModalResult<(char, &'i str)> {
    let quote = one_of(['"', '\'']).parse_next(input)?;
    let body = *input;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            *input = &body[i + 1..];
            return Ok((quote, &body[..i]));
        }
    }
    Err(ErrMode::Cut(ContextError::new()))
}

/// An unsigned decimal number; the sign is decided by the scanner.
pub(crate) fn number<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (digit1, opt(('.', digit1))).take().parse_next(input)
}

fn filename<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((separated_path, ('/', word).take())).parse_next(input)
}

/// `/?word` followed by one or more `/`, `:` or `::` separated parts.
fn separated_path<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        opt('/'),
        word,
        repeat::<_, _, (), _, _>(
            1..,
            (alt(("::", ":", "/")), take_while(0.., is_word_char)),
        ),
    )
        .take()
        .parse_next(input)
}

fn word<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., is_word_char).parse_next(input)
}

fn operator<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((
        "${",
        "->",
        "=>",
        "==",
        "!=",
        "<=",
        ">=",
        "&&",
        "||",
        "..",
        one_of([
            '(', ')', '{', '}', '[', ']', ':', ';', ',', '/', '\\', '+', '-', '*', '%', '?', '$',
            '=', '!', '<', '>', '&', '|', '.',
        ])
        .take(),
    ))
    .parse_next(input)
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
