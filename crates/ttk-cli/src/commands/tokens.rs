//! Implementation of the `ttk tokens` command.

use std::path::PathBuf;

use miette::{miette, Result};
use ttk::Template;

use super::read_source;
use crate::output::table::format_token_table;
use crate::output::TtkDiagnostic;

/// Arguments for the tokens command.
#[derive(Debug, clap::Args)]
pub struct TokensArgs {
    /// Template file to tokenize ("-" reads standard input)
    pub template: PathBuf,

    /// Expand $var references in plain text
    #[arg(long)]
    pub interpolate: bool,

    /// Accept directive keywords in any case
    #[arg(long)]
    pub anycase: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the tokens command.
pub fn run_tokens(args: TokensArgs) -> Result<i32> {
    let source = read_source(&args.template)?;
    let template = Template::builder()
        .interpolate(args.interpolate)
        .anycase(args.anycase)
        .build();

    let tokens = match template.tokenize(&source) {
        Ok(tokens) => tokens,
        Err(e) => {
            let diagnostic = TtkDiagnostic::from_parse_error(&args.template, &source, &e);
            return Err(diagnostic.into());
        }
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tokens).map_err(|e| miette!("{}", e))?
        );
    } else {
        println!("{}", format_token_table(&tokens));
    }
    Ok(exitcode::OK)
}
