use thiserror::Error;

/// Number of source characters quoted in a syntax error.
const EXCERPT_CHARS: usize = 10;

/// An error raised while scanning or parsing template source.
///
/// Parse errors are fatal: no partial AST is produced and the error reaches
/// the caller of the render entry point unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Unexpected or missing token.
    #[error("{message} at line {line}, column {column}, near '{excerpt}'")]
    Syntax {
        message: String,
        position: usize,
        line: usize,
        column: usize,
        excerpt: String,
    },

    /// A quoted string without its closing quote.
    #[error("unterminated string at line {line}, column {column}")]
    UnterminatedString {
        position: usize,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    pub(crate) fn syntax(source: &str, position: usize, message: impl Into<String>) -> Self {
        let (line, column) = calculate_position(source, position);
        ParseError::Syntax {
            message: message.into(),
            position,
            line,
            column,
            excerpt: excerpt(source, position),
        }
    }

    pub(crate) fn unterminated_string(source: &str, position: usize) -> Self {
        let (line, column) = calculate_position(source, position);
        ParseError::UnterminatedString {
            position,
            line,
            column,
        }
    }

    /// Byte offset of the error in the template source.
    pub fn position(&self) -> usize {
        match self {
            ParseError::Syntax { position, .. } | ParseError::UnterminatedString { position, .. } => {
                *position
            }
        }
    }

    /// One-based line and column of the error.
    pub fn line_column(&self) -> (usize, usize) {
        match self {
            ParseError::Syntax { line, column, .. }
            | ParseError::UnterminatedString { line, column, .. } => (*line, *column),
        }
    }
}

fn clamp_to_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Calculate line and column from a byte offset.
fn calculate_position(source: &str, offset: usize) -> (usize, usize) {
    let consumed = &source[..clamp_to_boundary(source, offset)];
    let line = consumed.chars().filter(|&c| c == '\n').count() + 1;
    let column = match consumed.rfind('\n') {
        Some(pos) => consumed[pos + 1..].chars().count() + 1,
        None => consumed.chars().count() + 1,
    };
    (line, column)
}

/// The text following `offset`, cut to a few characters with newlines escaped.
fn excerpt(source: &str, offset: usize) -> String {
    let rest = &source[clamp_to_boundary(source, offset)..];
    let mut excerpt: String = rest
        .chars()
        .take(EXCERPT_CHARS)
        .collect::<String>()
        .replace('\n', "\\n");
    if rest.chars().count() > EXCERPT_CHARS {
        excerpt.push_str("...");
    }
    excerpt
}
