//! `$var` and `${ expr }` references inside text.

use std::mem;

use super::directive::is_word_char;
use super::scanner::Scanner;
use super::token::TokenKind;
use crate::parser::ParseError;

impl Scanner<'_> {
    /// Split `text` into TEXT tokens and embedded references, each reference
    /// followed by a statement separator. `\$` yields a literal dollar sign.
    pub(crate) fn interpolate(&mut self, text: &str, base: usize) -> Result<(), ParseError> {
        let mut pending = String::new();
        let mut pending_start = 0;
        let mut i = 0;

        while i < text.len() {
            let rest = &text[i..];
            if rest.starts_with("\\$") {
                if pending.is_empty() {
                    pending_start = i;
                }
                pending.push('$');
                i += 2;
                continue;
            }
            if let Some(inner) = rest.strip_prefix("${") {
                if let Some(close) = matching_brace(inner) {
                    self.flush_text(&mut pending, base + pending_start);
                    self.directive(&inner[..close], base + i + 2)?;
                    self.separator(base + i + 2 + close);
                    i += close + 3;
                    pending_start = i;
                    continue;
                }
            }
            if let Some(after) = rest.strip_prefix('$') {
                let name = reference_name(after);
                if !name.is_empty() {
                    self.flush_text(&mut pending, base + pending_start);
                    self.directive(name, base + i + 1)?;
                    self.separator(base + i + 1 + name.len());
                    i += name.len() + 1;
                    pending_start = i;
                    continue;
                }
            }

            let Some(c) = rest.chars().next() else {
                break;
            };
            if pending.is_empty() {
                pending_start = i;
            }
            pending.push(c);
            i += c.len_utf8();
            if c == '\\' {
                if let Some(next) = text[i..].chars().next() {
                    pending.push(next);
                    i += next.len_utf8();
                }
            }
        }
        self.flush_text(&mut pending, base + pending_start);
        Ok(())
    }

    fn flush_text(&mut self, pending: &mut String, position: usize) {
        if !pending.is_empty() {
            self.push(TokenKind::Text, mem::take(pending), position);
        }
    }
}

/// Offset of the `}` closing a `${`, skipping nested braces and quoted
/// strings.
fn matching_brace(inner: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote = None;
    let mut chars = inner.char_indices();
    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(open), _) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') if depth == 0 => return Some(i),
            (None, '}') => depth -= 1,
            (None, _) => {}
        }
    }
    None
}

/// The dotted name after a `$`, without trailing dots.
fn reference_name(after: &str) -> &str {
    if !after.starts_with(is_word_char) {
        return "";
    }
    let end = after
        .find(|c: char| !is_word_char(c) && c != '.')
        .unwrap_or(after.len());
    after[..end].trim_end_matches('.')
}
