//! Template interpreter.
//!
//! Walks a compiled [`Document`](crate::parser::Document) against a variable
//! stash and produces output text. Expressions are evaluated in
//! `expression`, statements in `evaluator`; `context` carries the per-render
//! state (scopes, block table, filters, recursion depth).

mod context;
mod error;
mod evaluator;
mod expression;
mod filters;
mod loader;
mod operators;
mod stash;
mod vmethods;

pub use context::NativeBlock;
pub use error::{TemplateError, compute_suggestions};
pub use filters::{Filter, FilterFn};
pub use loader::{FileSystemLoader, LoadError, MemoryLoader, TemplateLoader};
pub use stash::StashView;

pub(crate) use context::{BlockDef, Context};
pub(crate) use evaluator::render_template;
