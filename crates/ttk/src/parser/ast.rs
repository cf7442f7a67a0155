//! AST types for parsed templates.

use std::rc::Rc;

/// A compiled template.
///
/// `blocks` holds the BLOCK definitions found in `body`, hoisted so they can
/// be used before their textual position. A block's own nested BLOCKs are
/// hoisted into that block's `Document`.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub body: Vec<Node>,
    pub blocks: Vec<(String, Rc<Document>)>,
    /// `BLOCK name key=value` metadata, bound as variables when the block runs.
    pub meta: Vec<(String, String)>,
}

/// A statement or text run.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    /// Evaluate and output (`GET`, or a bare expression).
    Get(Expr),
    /// Evaluate and discard (`CALL`).
    Call(Expr),
    Set(Vec<Assignment>),
    /// Assign only where the current value is false (`DEFAULT`).
    Default(Vec<Assignment>),
    If {
        unless: bool,
        condition: Expr,
        body: Vec<Node>,
        elsifs: Vec<(Expr, Vec<Node>)>,
        otherwise: Option<Vec<Node>>,
    },
    For {
        variable: Option<String>,
        iterable: Expr,
        body: Vec<Node>,
    },
    While {
        condition: Expr,
        body: Vec<Node>,
    },
    Switch {
        subject: Expr,
        cases: Vec<Case>,
    },
    Try {
        body: Vec<Node>,
        catches: Vec<Catch>,
        finally: Option<Vec<Node>>,
    },
    Block {
        name: String,
        meta: Vec<(String, String)>,
        body: Vec<Node>,
    },
    Include(NameArgs),
    Process(NameArgs),
    Insert(NameArgs),
    Wrapper {
        target: NameArgs,
        body: Vec<Node>,
    },
    Filter {
        filter: FilterSpec,
        body: Vec<Node>,
    },
    Throw(NameArgs),
    LoopControl {
        control: LoopControl,
        position: usize,
    },
    Clear,
    Stop,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Next,
    Last,
}

/// One `CASE` of a `SWITCH`. `value` is `None` for `CASE DEFAULT` or a bare `CASE`.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub value: Option<Expr>,
    pub body: Vec<Node>,
}

/// One `CATCH` clause. `signature` is `None` for a catch-all.
#[derive(Debug, Clone, PartialEq)]
pub struct Catch {
    pub signature: Option<String>,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Path,
    pub value: Expr,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(String),
    Number(Number),
    Path(Path),
    /// `\path`: the referenced value itself.
    Ref(Path),
    /// An interpolated double-quoted string.
    Quoted(Vec<QuotedPart>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    List(Vec<Expr>),
    Range {
        from: Box<Expr>,
        to: Box<Expr>,
    },
    Hash(Vec<(SegmentName, Expr)>),
    /// A parenthesized assignment, `(a = 5)`, which yields the assigned value.
    Assign {
        target: Path,
        value: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Cat,
    Add,
    Sub,
    Mod,
    Mul,
    Div,
    IntDiv,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter. The ternary sits below all of these.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 2,
            BinaryOp::And | BinaryOp::Or => 5,
            BinaryOp::Cat => 10,
            BinaryOp::Add | BinaryOp::Sub => 20,
            BinaryOp::Mod => 30,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::IntDiv => 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuotedPart {
    Text(String),
    Path(Path),
}

/// A dotted variable path such as `user.name` or `list.sort('x').0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub segments: Vec<Segment>,
}

impl Path {
    pub fn simple(name: impl Into<String>) -> Self {
        Path {
            segments: vec![Segment {
                name: SegmentName::Name(name.into()),
                args: None,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub name: SegmentName,
    /// Present when the segment is called: `name(args)`.
    pub args: Option<Args>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SegmentName {
    Name(String),
    /// `${ expr }` or `$var`: the name is the value of the expression.
    Computed(Box<Expr>),
}

/// Call arguments, split into named and positional lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub named: Vec<(String, Expr)>,
    pub positional: Vec<Expr>,
}

/// Target names and arguments of INCLUDE, PROCESS, WRAPPER, FILTER and THROW.
#[derive(Debug, Clone, PartialEq)]
pub struct NameArgs {
    pub names: Vec<Name>,
    pub args: Args,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Name {
    Static(String),
    Quoted(Vec<QuotedPart>),
    /// `$var`: the name is the value of a variable.
    Dynamic(Path),
}

/// A `FILTER` target with an optional alias (`FILTER bold = format(...)`).
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub alias: Option<String>,
    pub target: NameArgs,
}
