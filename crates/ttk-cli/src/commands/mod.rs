//! CLI command implementations.

mod check;
mod render;
mod tokens;

pub use check::{run_check, CheckArgs};
pub use render::{run_render, RenderArgs};
pub use tokens::{run_tokens, TokensArgs};

use std::fs::read_to_string;
use std::io::{self, Read};
use std::path::Path;

use miette::{miette, Result};
use ttk::Chomp;

/// Read a template from a file, or from standard input when the path is `-`.
pub(crate) fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| miette!("Cannot read standard input: {}", e))?;
        return Ok(source);
    }
    read_to_string(path).map_err(|e| miette!("Cannot read {}: {}", path.display(), e))
}

/// Parse a chomp flag (`+`, `-`, `=` or `~`).
pub(crate) fn parse_chomp(s: &str) -> Result<Chomp, String> {
    let mut chars = s.chars();
    match (chars.next().and_then(Chomp::from_flag), chars.next()) {
        (Some(chomp), None) => Ok(chomp),
        _ => Err(format!("invalid chomp flag '{}': expected one of + - = ~", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chomp_flags() {
        assert_eq!(parse_chomp("~"), Ok(Chomp::Greedy));
        assert_eq!(parse_chomp("+"), Ok(Chomp::None));
        assert!(parse_chomp("--").is_err());
        assert!(parse_chomp("x").is_err());
    }
}
