//! Reserved-word and operator lookup tables.

use super::token::TokenKind;

/// Map a bare word to its reserved kind.
///
/// `and`, `or`, `not`, `mod` and `div` are recognized in lower case
/// regardless of case sensitivity. With `anycase` every word is upper-cased
/// before the lookup.
pub(crate) fn word_kind(word: &str, anycase: bool) -> Option<(TokenKind, String)> {
    let lower = match word {
        "and" => Some(TokenKind::And),
        "or" => Some(TokenKind::Or),
        "not" => Some(TokenKind::Not),
        "div" => Some(TokenKind::Div),
        "_" => Some(TokenKind::Cat),
        "mod" => return Some((TokenKind::BinOp, "%".to_string())),
        _ => None,
    };
    if let Some(kind) = lower {
        return Some((kind, word.to_uppercase()));
    }
    let key = if anycase {
        word.to_ascii_uppercase()
    } else {
        word.to_string()
    };
    let kind = match key.as_str() {
        "GET" => TokenKind::Get,
        "CALL" => TokenKind::Call,
        "SET" => TokenKind::Set,
        "DEFAULT" => TokenKind::Default,
        "INSERT" => TokenKind::Insert,
        "INCLUDE" => TokenKind::Include,
        "PROCESS" => TokenKind::Process,
        "WRAPPER" => TokenKind::Wrapper,
        "BLOCK" => TokenKind::Block,
        "END" => TokenKind::End,
        "USE" => TokenKind::Use,
        "PLUGIN" => TokenKind::Plugin,
        "FILTER" => TokenKind::Filter,
        "MACRO" => TokenKind::Macro,
        "PERL" => TokenKind::Perl,
        "RAWPERL" => TokenKind::RawPerl,
        "TO" => TokenKind::To,
        "STEP" => TokenKind::Step,
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        "NOT" => TokenKind::Not,
        "DIV" => TokenKind::Div,
        "MOD" => return Some((TokenKind::BinOp, "%".to_string())),
        "IF" => TokenKind::If,
        "UNLESS" => TokenKind::Unless,
        "ELSE" => TokenKind::Else,
        "ELSIF" => TokenKind::Elsif,
        "FOR" | "FOREACH" => TokenKind::For,
        "NEXT" => TokenKind::Next,
        "WHILE" => TokenKind::While,
        "SWITCH" => TokenKind::Switch,
        "CASE" => TokenKind::Case,
        "META" => TokenKind::Meta,
        "IN" => TokenKind::In,
        "TRY" => TokenKind::Try,
        "THROW" => TokenKind::Throw,
        "CATCH" => TokenKind::Catch,
        "FINAL" => TokenKind::Final,
        "LAST" | "BREAK" => TokenKind::Last,
        "RETURN" => TokenKind::Return,
        "STOP" => TokenKind::Stop,
        "CLEAR" => TokenKind::Clear,
        "VIEW" => TokenKind::View,
        "DEBUG" => TokenKind::Debug,
        _ => return None,
    };
    Some((kind, key))
}

/// Map an operator or punctuation string to its kind.
///
/// Unknown operators (`&`, `->`, ...) fall through to `Unquoted`.
pub(crate) fn operator_kind(op: &str) -> TokenKind {
    match op {
        "(" => TokenKind::LParen,
        ")" => TokenKind::RParen,
        "[" => TokenKind::LBracket,
        "]" => TokenKind::RBracket,
        "{" => TokenKind::LBrace,
        "}" => TokenKind::RBrace,
        ":" => TokenKind::Colon,
        ";" => TokenKind::Semicolon,
        "?" => TokenKind::Question,
        "," => TokenKind::Comma,
        "." => TokenKind::Dot,
        ".." => TokenKind::To,
        "+" => TokenKind::Plus,
        "/" => TokenKind::Slash,
        "$" => TokenKind::Dollar,
        "${" => TokenKind::DollarBrace,
        "\\" => TokenKind::Ref,
        "=" | "=>" => TokenKind::Assign,
        "&&" => TokenKind::And,
        "||" => TokenKind::Or,
        "!" => TokenKind::Not,
        "|" => TokenKind::Filter,
        "==" | "!=" | "<" | ">" | "<=" | ">=" => TokenKind::CmpOp,
        "-" | "*" | "%" => TokenKind::BinOp,
        _ => TokenKind::Unquoted,
    }
}
