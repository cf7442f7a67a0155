//! A Template Toolkit style template engine.
//!
//! Templates mix plain text with `[% ... %]` directives. Source is
//! tokenized ([`lexer`]), parsed into an AST ([`parser`]) and rendered
//! against a variable stash ([`interpreter`]). [`Template`] carries the
//! configuration; [`render`] uses the defaults.

pub mod diagnostics;
pub mod interpreter;
pub mod lexer;
pub mod parser;
mod template;
pub mod types;

pub use diagnostics::{Diagnostics, Level, RecordingDiagnostics, TracingDiagnostics};
pub use interpreter::{
    FileSystemLoader, Filter, FilterFn, LoadError, MemoryLoader, NativeBlock, StashView, TemplateError,
    TemplateLoader, compute_suggestions,
};
pub use lexer::Chomp;
pub use parser::ParseError;
pub use template::{BlockSource, Template, render};
pub use types::{Exception, Function, Value, Vars};

/// Creates a [`Vars`] map from key-value pairs.
///
/// Values are converted via `Into<Value>`, so integers, floats, strings,
/// vectors and nested `Vars` can be passed directly.
///
/// # Example
///
/// ```
/// use ttk::vars;
///
/// let v = vars! { "count" => 3, "name" => "Alice" };
/// assert_eq!(v.len(), 2);
/// assert_eq!(v["count"].as_integer(), Some(3));
/// assert_eq!(v["name"].as_str(), Some("Alice"));
/// ```
#[macro_export]
macro_rules! vars {
    {} => {
        $crate::Vars::new()
    };
    { $($key:expr => $value:expr),+ $(,)? } => {
        {
            let mut map = $crate::Vars::new();
            $(
                map.insert($key.to_string(), ::std::convert::Into::<$crate::Value>::into($value));
            )+
            map
        }
    };
}
