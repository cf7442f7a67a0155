//! Output formatting for CLI commands.

mod diagnostic;
pub mod table;

pub use diagnostic::TtkDiagnostic;
