//! Error and control-flow types for rendering.

use strsim::levenshtein;
use thiserror::Error;

use crate::parser::ParseError;
use crate::types::Exception;

/// An error returned by a render call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template source could not be tokenized or parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An exception escaped every `TRY` block.
    #[error("{0}")]
    Exception(Exception),
}

impl TemplateError {
    /// The uncaught exception, if this is a runtime error.
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            TemplateError::Exception(e) => Some(e),
            TemplateError::Parse(_) => None,
        }
    }
}

/// Non-local exits unwinding through the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Interrupt {
    /// `NEXT`: continue with the next loop iteration.
    Next,
    /// `LAST`: leave the innermost loop.
    Last,
    /// `RETURN`: leave the current template or block.
    Return,
    Throw(Exception),
}

impl From<Exception> for Interrupt {
    fn from(e: Exception) -> Self {
        Interrupt::Throw(e)
    }
}

pub(crate) type Flow<T> = Result<T, Interrupt>;

/// Compute "did you mean" suggestions for a name that was not found.
///
/// Candidates within edit distance 1 (for names of three characters or
/// fewer) or 2 (longer names) are returned, closest first, at most three.
pub fn compute_suggestions<'a>(name: &str, available: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let max_distance = if name.len() <= 3 { 1 } else { 2 };
    let mut suggestions: Vec<(usize, &str)> = available
        .into_iter()
        .filter_map(|candidate| {
            let dist = levenshtein(name, candidate);
            (dist <= max_distance && dist > 0).then_some((dist, candidate))
        })
        .collect();

    suggestions.sort_by_key(|(dist, _)| *dist);
    suggestions.dedup_by(|a, b| a.1 == b.1);
    suggestions.into_iter().take(3).map(|(_, s)| s.to_string()).collect()
}

/// `<name>: not found`, with a suggestion appended when one exists.
pub(crate) fn not_found<'a>(
    kind: &str,
    name: &str,
    available: impl IntoIterator<Item = &'a str>,
) -> Exception {
    let suggestions = compute_suggestions(name, available);
    let info = match suggestions.as_slice() {
        [] => format!("{name}: not found"),
        [only] => format!("{name}: not found (did you mean '{only}'?)"),
        many => format!("{name}: not found (did you mean one of: {}?)", many.join(", ")),
    };
    Exception::new(kind, info)
}
