//! Implementation of the `ttk check` command.

use std::path::PathBuf;

use miette::{miette, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use ttk::Template;

use super::read_source;
use crate::output::TtkDiagnostic;

/// Arguments for the check command.
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Template files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Accept directive keywords in any case
    #[arg(long)]
    pub anycase: bool,

    /// Treat `$name` in directives as the variable `name`
    #[arg(long)]
    pub v1dollar: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output for one checked file.
#[derive(Debug, Serialize)]
struct CheckJson {
    file: String,
    ok: bool,
    error: Option<String>,
    line: Option<usize>,
    column: Option<usize>,
}

/// Run the check command.
pub fn run_check(args: CheckArgs) -> Result<i32> {
    let template = Template::builder()
        .anycase(args.anycase)
        .v1dollar(args.v1dollar)
        .build();

    let mut results = Vec::new();
    let mut failed = 0;
    for path in &args.files {
        let source = read_source(path)?;
        match template.compile(&source) {
            Ok(document) => {
                if !args.json {
                    println!(
                        "{} {} ({} blocks)",
                        "ok".green().bold(),
                        path.display(),
                        document.blocks.len()
                    );
                }
                results.push(CheckJson {
                    file: path.display().to_string(),
                    ok: true,
                    error: None,
                    line: None,
                    column: None,
                });
            }
            Err(e) => {
                failed += 1;
                if !args.json {
                    let diagnostic = TtkDiagnostic::from_parse_error(path, &source, &e);
                    eprintln!("{:?}", miette::Report::new(diagnostic));
                }
                let (line, column) = e.line_column();
                results.push(CheckJson {
                    file: path.display().to_string(),
                    ok: false,
                    error: Some(e.to_string()),
                    line: Some(line),
                    column: Some(column),
                });
            }
        }
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&results).map_err(|e| miette!("{}", e))?
        );
    } else if failed > 0 {
        eprintln!(
            "{} {} of {} files failed",
            "error:".red().bold(),
            failed,
            args.files.len()
        );
    }

    Ok(if failed == 0 { exitcode::OK } else { exitcode::DATAERR })
}
