//! Statement and directive grammar.
//!
//! A recursive-descent parser over the token buffer. Productions that may
//! not apply return `Ok(None)` without consuming input; `require` turns such
//! a miss into a syntax error naming the expected production.

use super::ast::{
    Args, Assignment, Case, Catch, Expr, FilterSpec, LoopControl, Name, NameArgs, Node, Path,
    SegmentName,
};
use super::cursor::TokenCursor;
use super::error::ParseError;
use crate::diagnostics::{Diagnostics, Level};
use crate::lexer::{Token, TokenKind};

pub(crate) type PResult<T> = Result<T, ParseError>;

/// Deepest nesting of blocks, terms and operator chains accepted.
const MAX_NESTING: usize = 128;

/// Grammar switches taken from the template configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// `$name` inside a directive means `name` rather than "the variable
    /// named by the value of `name`".
    pub v1dollar: bool,
    /// Report every rule invocation to the diagnostics sink.
    pub trace: bool,
}

pub(crate) struct Parser<'a> {
    pub(super) cursor: TokenCursor<'a>,
    source: &'a str,
    pub(super) options: ParseOptions,
    diagnostics: &'a dyn Diagnostics,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        tokens: &'a [Token],
        source: &'a str,
        options: ParseOptions,
        diagnostics: &'a dyn Diagnostics,
    ) -> Self {
        Parser {
            cursor: TokenCursor::new(tokens),
            source,
            options,
            diagnostics,
            depth: 0,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    pub(super) fn trace(&self, rule: &str) {
        if self.options.trace {
            let token = self.cursor.peek();
            self.diagnostics.record(
                Level::Trace,
                &format!("{rule} at {:?} '{}' (offset {})", token.kind, token.literal, token.position),
            );
        }
    }

    pub(super) fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::syntax(self.source, self.cursor.peek().position, message)
    }

    fn describe(&self) -> String {
        let token = self.cursor.peek();
        match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Semicolon => "end of directive".to_string(),
            _ => format!("'{}'", token.literal),
        }
    }

    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.cursor.kind() == kind
    }

    /// Consume the current token if it has the given kind.
    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        let matched = self.at(kind);
        if matched {
            self.cursor.consume();
        }
        matched
    }

    pub(super) fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.cursor.consume())
        } else {
            Err(self.error(format!("expected {what}, found {}", self.describe())))
        }
    }

    /// Run `production` one nesting level deeper.
    pub(super) fn nested<T>(&mut self, production: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.check_nesting(1)?;
        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    /// Fail if `extra` more levels would exceed `MAX_NESTING`.
    pub(super) fn check_nesting(&self, extra: usize) -> PResult<()> {
        if self.depth.saturating_add(extra) > MAX_NESTING {
            return Err(self.error(format!("nested more than {MAX_NESTING} levels deep")));
        }
        Ok(())
    }

    pub(super) fn require<T>(&self, value: Option<T>, production: &str) -> PResult<T> {
        value.ok_or_else(|| self.error(format!("{production} expected, found {}", self.describe())))
    }

    // =========================================================================
    // Chunks
    // =========================================================================

    /// Parse a whole template.
    pub(crate) fn template(&mut self) -> PResult<Vec<Node>> {
        let mut nodes = Vec::new();
        while !self.at(TokenKind::Eof) {
            if let Some(node) = self.chunk()? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    /// A text run, an empty statement, or one statement and its separator.
    fn chunk(&mut self) -> PResult<Option<Node>> {
        match self.cursor.kind() {
            TokenKind::Text => Ok(Some(Node::Text(self.cursor.consume().literal))),
            TokenKind::Semicolon => {
                self.cursor.consume();
                Ok(None)
            }
            _ => {
                let statement = self.statement()?;
                let statement = self.require(statement, "statement")?;
                self.expect(TokenKind::Semicolon, "';' or end of directive")?;
                Ok(Some(statement))
            }
        }
    }

    /// Chunks up to, but not including, one of `terminators`.
    fn body_until(&mut self, terminators: &[TokenKind], opener: &Token) -> PResult<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            let kind = self.cursor.kind();
            if terminators.contains(&kind) {
                return Ok(nodes);
            }
            if kind == TokenKind::Eof {
                return Err(ParseError::syntax(
                    self.source,
                    opener.position,
                    format!("missing END for {} started here", opener.literal),
                ));
            }
            if let Some(node) = self.chunk()? {
                nodes.push(node);
            }
        }
    }

    fn statement(&mut self) -> PResult<Option<Node>> {
        self.trace("statement");
        self.nested(Self::statement_body)
    }

    fn statement_body(&mut self) -> PResult<Option<Node>> {
        if let Some(node) = self.complex_statement()? {
            return Ok(Some(node));
        }
        if let Some(node) = self.directive()? {
            return Ok(Some(node));
        }
        match self.cursor.kind() {
            TokenKind::Block => self.block().map(Some),
            TokenKind::Wrapper => self.wrapper().map(Some),
            TokenKind::Filter => self.filter_block().map(Some),
            TokenKind::Use
            | TokenKind::Plugin
            | TokenKind::Macro
            | TokenKind::Perl
            | TokenKind::RawPerl
            | TokenKind::Meta
            | TokenKind::View
            | TokenKind::Debug => Err(self.error(format!(
                "{} directive is not supported",
                self.cursor.peek().literal
            ))),
            _ => Ok(None),
        }
    }

    /// An expression or a setlist. Both start with a literal or a variable;
    /// only a following `=` makes it an assignment.
    fn complex_statement(&mut self) -> PResult<Option<Node>> {
        let expr = if self.at(TokenKind::Literal) {
            let literal = self.cursor.consume().literal;
            if self.eat(TokenKind::Assign) {
                let assignments = self.setlist_tail(Path::simple(literal))?;
                return self.postfixed(Node::Set(assignments)).map(Some);
            }
            self.expr_tail(Expr::Literal(literal))?
        } else if let Some(path) = self.ident()? {
            if self.eat(TokenKind::Assign) {
                if self.at(TokenKind::Block) {
                    return Err(self.error("capturing BLOCK output is not supported"));
                }
                let assignments = self.setlist_tail(path)?;
                return self.postfixed(Node::Set(assignments)).map(Some);
            }
            self.expr_tail(Expr::Path(path))?
        } else {
            match self.expr()? {
                Some(expr) => expr,
                None => return Ok(None),
            }
        };
        self.postfixed(Node::Get(expr)).map(Some)
    }

    /// Wrap `node` in any trailing `IF`/`UNLESS`/`FOR`/`WHILE`/`WRAPPER`/`FILTER`.
    fn postfixed(&mut self, node: Node) -> PResult<Node> {
        let kind = self.cursor.kind();
        let node = match kind {
            TokenKind::If | TokenKind::Unless => {
                self.cursor.consume();
                let condition = self.expr()?;
                Node::If {
                    unless: kind == TokenKind::Unless,
                    condition: self.require(condition, "condition")?,
                    body: vec![node],
                    elsifs: Vec::new(),
                    otherwise: None,
                }
            }
            TokenKind::Wrapper => {
                self.cursor.consume();
                Node::Wrapper {
                    target: self.nameargs()?,
                    body: vec![node],
                }
            }
            TokenKind::For => {
                self.cursor.consume();
                let (variable, iterable) = self.loop_variable()?;
                Node::For {
                    variable,
                    iterable,
                    body: vec![node],
                }
            }
            TokenKind::While => {
                self.cursor.consume();
                let condition = self.expr()?;
                Node::While {
                    condition: self.require(condition, "condition")?,
                    body: vec![node],
                }
            }
            TokenKind::Filter => {
                self.cursor.consume();
                Node::Filter {
                    filter: self.lnameargs()?,
                    body: vec![node],
                }
            }
            _ => return Ok(node),
        };
        self.nested(|parser| parser.postfixed(node))
    }

    // =========================================================================
    // Directives
    // =========================================================================

    fn directive(&mut self) -> PResult<Option<Node>> {
        if let Some(node) = self.atomic_directive()? {
            return self.postfixed(node).map(Some);
        }
        match self.cursor.kind() {
            TokenKind::If | TokenKind::Unless => self.condition().map(Some),
            TokenKind::Switch => self.switch().map(Some),
            TokenKind::For | TokenKind::While => self.loop_block().map(Some),
            TokenKind::Try => self.try_block().map(Some),
            _ => Ok(None),
        }
    }

    fn atomic_directive(&mut self) -> PResult<Option<Node>> {
        let kind = self.cursor.kind();
        let node = match kind {
            TokenKind::Get | TokenKind::Call => {
                self.cursor.consume();
                let expr = self.expr()?;
                let expr = self.require(expr, "expression")?;
                if kind == TokenKind::Get {
                    Node::Get(expr)
                } else {
                    Node::Call(expr)
                }
            }
            TokenKind::Set | TokenKind::Default => {
                self.cursor.consume();
                let assignments = self.setlist()?;
                let assignments = self.require(assignments, "assignment")?;
                if kind == TokenKind::Set {
                    Node::Set(assignments)
                } else {
                    Node::Default(assignments)
                }
            }
            TokenKind::Insert | TokenKind::Include | TokenKind::Process | TokenKind::Throw => {
                self.cursor.consume();
                let target = self.nameargs()?;
                match kind {
                    TokenKind::Insert => Node::Insert(target),
                    TokenKind::Include => Node::Include(target),
                    TokenKind::Process => Node::Process(target),
                    _ => Node::Throw(target),
                }
            }
            TokenKind::Next | TokenKind::Last => {
                let token = self.cursor.consume();
                Node::LoopControl {
                    control: if kind == TokenKind::Next {
                        LoopControl::Next
                    } else {
                        LoopControl::Last
                    },
                    position: token.position,
                }
            }
            TokenKind::Clear => {
                self.cursor.consume();
                Node::Clear
            }
            TokenKind::Stop => {
                self.cursor.consume();
                Node::Stop
            }
            TokenKind::Return => {
                self.cursor.consume();
                Node::Return
            }
            _ => return Ok(None),
        };
        Ok(Some(node))
    }

    fn setlist(&mut self) -> PResult<Option<Vec<Assignment>>> {
        let target = if self.at(TokenKind::Literal) {
            Path::simple(self.cursor.consume().literal)
        } else {
            match self.ident()? {
                Some(path) => path,
                None => return Ok(None),
            }
        };
        self.expect(TokenKind::Assign, "'='")?;
        self.setlist_tail(target).map(Some)
    }

    /// Assignments after the first `target =`; commas between them are optional.
    fn setlist_tail(&mut self, target: Path) -> PResult<Vec<Assignment>> {
        let value = self.expr()?;
        let mut assignments = vec![Assignment {
            target,
            value: self.require(value, "expression")?,
        }];
        loop {
            let target = match self.cursor.kind() {
                TokenKind::Comma => {
                    self.cursor.consume();
                    continue;
                }
                TokenKind::Literal => Path::simple(self.cursor.consume().literal),
                TokenKind::Ident | TokenKind::Dollar | TokenKind::DollarBrace => {
                    let path = self.ident()?;
                    self.require(path, "variable")?
                }
                _ => return Ok(assignments),
            };
            self.expect(TokenKind::Assign, "'='")?;
            let value = self.expr()?;
            assignments.push(Assignment {
                target,
                value: self.require(value, "expression")?,
            });
        }
    }

    // =========================================================================
    // Block directives
    // =========================================================================

    fn condition(&mut self) -> PResult<Node> {
        let opener = self.cursor.consume();
        let condition = self.expr()?;
        let condition = self.require(condition, "condition")?;
        self.expect(TokenKind::Semicolon, "end of directive")?;

        let branch_end = [TokenKind::End, TokenKind::Else, TokenKind::Elsif];
        let body = self.body_until(&branch_end, &opener)?;
        let mut elsifs = Vec::new();
        while self.eat(TokenKind::Elsif) {
            let elsif_condition = self.expr()?;
            let elsif_condition = self.require(elsif_condition, "condition")?;
            self.expect(TokenKind::Semicolon, "end of directive")?;
            elsifs.push((elsif_condition, self.body_until(&branch_end, &opener)?));
        }
        let otherwise = if self.eat(TokenKind::Else) {
            self.expect(TokenKind::Semicolon, "end of directive")?;
            Some(self.body_until(&branch_end, &opener)?)
        } else {
            None
        };
        self.expect(TokenKind::End, "END")?;

        Ok(Node::If {
            unless: opener.kind == TokenKind::Unless,
            condition,
            body,
            elsifs,
            otherwise,
        })
    }

    fn switch(&mut self) -> PResult<Node> {
        let opener = self.cursor.consume();
        let subject = self.expr()?;
        let subject = self.require(subject, "expression")?;
        self.expect(TokenKind::Semicolon, "end of directive")?;

        let case_end = [TokenKind::Case, TokenKind::End];
        // Whatever precedes the first CASE is never output.
        self.body_until(&case_end, &opener)?;

        let mut cases = Vec::new();
        while self.eat(TokenKind::Case) {
            let value = match self.cursor.kind() {
                TokenKind::Semicolon => None,
                TokenKind::Default => {
                    self.cursor.consume();
                    None
                }
                _ => {
                    let term = self.term()?;
                    Some(self.require(term, "CASE value")?)
                }
            };
            self.expect(TokenKind::Semicolon, "end of directive")?;
            let body = self.body_until(&case_end, &opener)?;
            cases.push(Case { value, body });
        }
        self.expect(TokenKind::End, "END")?;

        Ok(Node::Switch { subject, cases })
    }

    fn loop_block(&mut self) -> PResult<Node> {
        let opener = self.cursor.consume();
        let node = if opener.kind == TokenKind::For {
            let (variable, iterable) = self.loop_variable()?;
            self.expect(TokenKind::Semicolon, "end of directive")?;
            Node::For {
                variable,
                iterable,
                body: self.body_until(&[TokenKind::End], &opener)?,
            }
        } else {
            let condition = self.expr()?;
            let condition = self.require(condition, "condition")?;
            self.expect(TokenKind::Semicolon, "end of directive")?;
            Node::While {
                condition,
                body: self.body_until(&[TokenKind::End], &opener)?,
            }
        };
        self.expect(TokenKind::End, "END")?;
        Ok(node)
    }

    /// `[name = | name IN] term`. The name is only a loop variable when
    /// followed by `=` or `IN`; otherwise it is rewound and read as the term.
    fn loop_variable(&mut self) -> PResult<(Option<String>, Expr)> {
        let mut variable = None;
        if self.at(TokenKind::Ident) {
            let name = self.cursor.consume();
            if matches!(self.cursor.kind(), TokenKind::Assign | TokenKind::In) {
                self.cursor.consume();
                variable = Some(name.literal);
            } else {
                self.cursor.unconsume();
            }
        }
        let iterable = self.term()?;
        Ok((variable, self.require(iterable, "loop value")?))
    }

    fn try_block(&mut self) -> PResult<Node> {
        let opener = self.cursor.consume();
        self.expect(TokenKind::Semicolon, "end of directive")?;

        let clause_end = [TokenKind::Catch, TokenKind::Final, TokenKind::End];
        let body = self.body_until(&clause_end, &opener)?;
        let mut catches = Vec::new();
        while self.eat(TokenKind::Catch) {
            let signature = match self.cursor.kind() {
                TokenKind::Semicolon => None,
                TokenKind::Default => {
                    self.cursor.consume();
                    None
                }
                _ => Some(self.filename()?),
            };
            self.expect(TokenKind::Semicolon, "end of directive")?;
            let body = self.body_until(&clause_end, &opener)?;
            catches.push(Catch { signature, body });
        }
        let finally = if self.eat(TokenKind::Final) {
            self.expect(TokenKind::Semicolon, "end of directive")?;
            Some(self.body_until(&[TokenKind::End], &opener)?)
        } else {
            None
        };
        self.expect(TokenKind::End, "END")?;

        Ok(Node::Try {
            body,
            catches,
            finally,
        })
    }

    fn block(&mut self) -> PResult<Node> {
        let opener = self.cursor.consume();
        let name = if self.at(TokenKind::Literal) {
            self.cursor.consume().literal
        } else {
            self.filename()?
        };
        let meta = self.metadata()?;
        self.expect(TokenKind::Semicolon, "end of directive")?;
        let body = self.body_until(&[TokenKind::End], &opener)?;
        self.expect(TokenKind::End, "END")?;
        Ok(Node::Block { name, meta, body })
    }

    /// `key = constant` pairs after a BLOCK name.
    fn metadata(&mut self) -> PResult<Vec<(String, String)>> {
        let mut meta = Vec::new();
        loop {
            if self.eat(TokenKind::Comma) {
                continue;
            }
            if !self.at(TokenKind::Ident) {
                return Ok(meta);
            }
            let key = self.cursor.consume().literal;
            self.expect(TokenKind::Assign, "'='")?;
            let value = match self.cursor.kind() {
                TokenKind::Literal | TokenKind::Number => self.cursor.consume().literal,
                TokenKind::Quote => {
                    self.cursor.consume();
                    let mut text = String::new();
                    while !self.eat(TokenKind::Quote) {
                        match self.cursor.kind() {
                            TokenKind::Text => text.push_str(&self.cursor.consume().literal),
                            _ => return Err(self.error("metadata values must be constant")),
                        }
                    }
                    text
                }
                _ => return Err(self.error("metadata values must be constant")),
            };
            meta.push((key, value));
        }
    }

    fn wrapper(&mut self) -> PResult<Node> {
        let opener = self.cursor.consume();
        let target = self.nameargs()?;
        self.expect(TokenKind::Semicolon, "end of directive")?;
        let body = self.body_until(&[TokenKind::End], &opener)?;
        self.expect(TokenKind::End, "END")?;
        Ok(Node::Wrapper { target, body })
    }

    fn filter_block(&mut self) -> PResult<Node> {
        let opener = self.cursor.consume();
        let filter = self.lnameargs()?;
        self.expect(TokenKind::Semicolon, "end of directive")?;
        let body = self.body_until(&[TokenKind::End], &opener)?;
        self.expect(TokenKind::End, "END")?;
        Ok(Node::Filter { filter, body })
    }

    // =========================================================================
    // Names and arguments
    // =========================================================================

    /// Dot-joined file name parts: `header`, `lib/menu.tt`, `file.not_found`.
    fn filename(&mut self) -> PResult<String> {
        let mut name = self.filepart()?;
        while self.eat(TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.filepart()?);
        }
        Ok(name)
    }

    fn filepart(&mut self) -> PResult<String> {
        match self.cursor.kind() {
            TokenKind::Filename | TokenKind::Ident | TokenKind::Number => {
                Ok(self.cursor.consume().literal)
            }
            _ => Err(self.error(format!("file name expected, found {}", self.describe()))),
        }
    }

    /// `name + name ... [(args) | args]`, or `$var args`.
    fn nameargs(&mut self) -> PResult<NameArgs> {
        self.trace("nameargs");
        if self.eat(TokenKind::Dollar) {
            let path = self.ident()?;
            let path = self.require(path, "variable")?;
            return Ok(NameArgs {
                names: vec![Name::Dynamic(path)],
                args: self.args()?,
            });
        }

        let mut names = vec![self.name()?];
        while self.eat(TokenKind::Plus) {
            names.push(self.name()?);
        }
        let args = if self.eat(TokenKind::LParen) {
            let args = self.args()?;
            self.expect(TokenKind::RParen, "')'")?;
            args
        } else {
            self.args()?
        };
        Ok(NameArgs { names, args })
    }

    fn name(&mut self) -> PResult<Name> {
        match self.cursor.kind() {
            TokenKind::Quote => {
                self.cursor.consume();
                let parts = self.quoted()?;
                self.expect(TokenKind::Quote, "closing quote")?;
                Ok(Name::Quoted(parts))
            }
            TokenKind::Literal => Ok(Name::Static(self.cursor.consume().literal)),
            _ => self.filename().map(Name::Static),
        }
    }

    /// `[alias =] nameargs`, backtracking when no `=` follows the alias.
    fn lnameargs(&mut self) -> PResult<FilterSpec> {
        let mark = self.cursor.mark();
        if matches!(self.cursor.kind(), TokenKind::Literal | TokenKind::Ident) {
            let alias = self.cursor.consume().literal;
            if self.eat(TokenKind::Assign) {
                return Ok(FilterSpec {
                    alias: Some(alias),
                    target: self.nameargs()?,
                });
            }
            self.cursor.reset(mark);
        }
        Ok(FilterSpec {
            alias: None,
            target: self.nameargs()?,
        })
    }

    /// Named (`key = expr`) and positional arguments; commas are optional.
    pub(super) fn args(&mut self) -> PResult<Args> {
        self.trace("args");
        let mut args = Args::default();
        loop {
            let candidate = if self.at(TokenKind::Literal) {
                Some(Expr::Literal(self.cursor.consume().literal))
            } else {
                self.ident()?.map(Expr::Path)
            };
            match candidate {
                Some(candidate) if self.at(TokenKind::Assign) => {
                    let key = self.argument_name(&candidate)?;
                    self.cursor.consume();
                    let value = self.expr()?;
                    args.named.push((key, self.require(value, "argument value")?));
                }
                Some(candidate) => {
                    // An operator after what looked like a whole argument
                    // continues it as an expression.
                    args.positional.push(self.expr_tail(candidate)?);
                }
                None => match self.expr()? {
                    Some(expr) => args.positional.push(expr),
                    None => return Ok(args),
                },
            }
            self.eat(TokenKind::Comma);
        }
    }

    fn argument_name(&self, candidate: &Expr) -> PResult<String> {
        match candidate {
            Expr::Literal(name) => Ok(name.clone()),
            Expr::Path(path) => match path.segments.as_slice() {
                [segment] if segment.args.is_none() => match &segment.name {
                    SegmentName::Name(name) => Ok(name.clone()),
                    SegmentName::Computed(_) => Err(self.error("invalid argument name")),
                },
                _ => Err(self.error("invalid argument name")),
            },
            _ => Err(self.error("invalid argument name")),
        }
    }
}
