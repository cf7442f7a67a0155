use serde::Serialize;

/// Classification of a lexed token.
///
/// Reserved words get their own kinds so the grammar can match on them
/// directly; `FOREACH` and `BREAK` are folded into [`TokenKind::For`] and
/// [`TokenKind::Last`] by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// Plain text between directives.
    Text,
    Ident,
    Number,
    /// A quoted string needing no interpolation (quotes removed).
    Literal,
    /// A slash or colon separated path such as `lib/header` or `Foo::Bar`.
    Filename,
    /// Anything the directive scanner could not classify.
    Unquoted,
    /// Synthetic delimiter around an interpolated double-quoted string.
    Quote,
    /// Statement separator, explicit or inserted after each directive.
    Semicolon,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Colon,
    Question,
    Comma,
    Dot,
    Plus,
    Slash,
    Dollar,
    DollarBrace,
    Ref,

    Cat,
    To,
    Assign,
    Not,
    And,
    Or,
    Div,
    CmpOp,
    BinOp,
    Filter,

    Get,
    Call,
    Set,
    Default,
    Insert,
    Include,
    Process,
    Wrapper,
    Block,
    End,
    Use,
    Plugin,
    Macro,
    Perl,
    RawPerl,
    Step,
    If,
    Unless,
    Else,
    Elsif,
    For,
    Next,
    While,
    Switch,
    Case,
    Meta,
    In,
    Try,
    Throw,
    Catch,
    Final,
    Last,
    Return,
    Stop,
    Clear,
    View,
    Debug,

    /// End of the token stream.
    Eof,
}

impl TokenKind {
    /// Returns true for tokens after which a `-` is a binary operator rather
    /// than the sign of a number.
    pub(crate) fn ends_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Number
                | TokenKind::Literal
                | TokenKind::Filename
                | TokenKind::Quote
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }
}

/// A single token with its source text and byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            literal: literal.into(),
            position,
        }
    }
}
