//! Implementation of the `ttk render` command.

use std::fs::{read_to_string, write};
use std::path::PathBuf;

use miette::{miette, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use ttk::{Chomp, Template, TemplateError, Value, Vars};

use super::{parse_chomp, read_source};
use crate::output::TtkDiagnostic;

/// Arguments for the render command.
#[derive(Debug, clap::Args)]
pub struct RenderArgs {
    /// Template file to render ("-" reads standard input)
    pub template: PathBuf,

    /// JSON file whose top-level object supplies the variables
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Variables in name=value format (repeatable, applied after --data)
    #[arg(short = 'D', long = "define", value_parser = parse_key_val)]
    pub defines: Vec<(String, String)>,

    /// Directory searched for INCLUDE, PROCESS, WRAPPER and INSERT (repeatable)
    #[arg(short = 'I', long = "include-path")]
    pub include_path: Vec<PathBuf>,

    /// Trim whitespace around the output and around block output
    #[arg(long)]
    pub trim: bool,

    /// Expand $var references in plain text
    #[arg(long)]
    pub interpolate: bool,

    /// Accept directive keywords in any case
    #[arg(long)]
    pub anycase: bool,

    /// Default chomp flag before each directive
    #[arg(long, value_parser = parse_chomp)]
    pub pre_chomp: Option<Chomp>,

    /// Default chomp flag after each directive
    #[arg(long, value_parser = parse_chomp)]
    pub post_chomp: Option<Chomp>,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output for render results.
#[derive(Serialize)]
pub struct RenderResult {
    pub output: String,
}

/// Parse a key=value variable string.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid variable format '{}': expected name=value", s))?;
    Ok((key.to_string(), value.to_string()))
}

/// Load the variables from `--data` and `--define`.
fn load_vars(args: &RenderArgs) -> Result<Vars> {
    let mut vars = match &args.data {
        Some(path) => {
            let text = read_to_string(path).map_err(|e| miette!("Cannot read data file {}: {}", path.display(), e))?;
            match serde_json::from_str::<Value>(&text) {
                Ok(Value::Map(map)) => map.borrow().clone(),
                Ok(_) => return Err(miette!("Data file {} must contain a JSON object", path.display())),
                Err(e) => return Err(miette!("Failed to parse data file {}: {}", path.display(), e)),
            }
        }
        None => Vars::new(),
    };

    for (key, value) in &args.defines {
        // Try parsing as i64 first, fall back to String
        let value = match value.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::from(value.as_str()),
        };
        vars.insert(key.clone(), value);
    }
    Ok(vars)
}

/// Run the render command.
pub fn run_render(args: RenderArgs) -> Result<i32> {
    let source = read_source(&args.template)?;
    let vars = load_vars(&args)?;

    let include_path = if args.include_path.is_empty() {
        let mut dirs = Vec::new();
        if let Some(parent) = args.template.parent().filter(|p| !p.as_os_str().is_empty()) {
            dirs.push(parent.to_path_buf());
        }
        dirs.push(PathBuf::from("."));
        dirs
    } else {
        args.include_path.clone()
    };

    let template = Template::builder()
        .trim(args.trim)
        .interpolate(args.interpolate)
        .anycase(args.anycase)
        .pre_chomp(args.pre_chomp.unwrap_or_default())
        .post_chomp(args.post_chomp.unwrap_or_default())
        .include_path(include_path)
        .build();

    let output = match template.process(&source, &vars) {
        Ok(output) => output,
        Err(TemplateError::Parse(e)) => {
            let diagnostic = TtkDiagnostic::from_parse_error(&args.template, &source, &e);
            eprintln!("{:?}", miette::Report::new(diagnostic));
            return Ok(exitcode::DATAERR);
        }
        Err(TemplateError::Exception(e)) => {
            if args.json {
                let output = serde_json::json!({
                    "error": { "type": e.kind(), "info": e.info() }
                });
                eprintln!(
                    "{}",
                    serde_json::to_string_pretty(&output).map_err(|e| miette!("{}", e))?
                );
            } else {
                eprintln!("{} {}", "error:".red().bold(), e);
            }
            return Ok(exitcode::DATAERR);
        }
    };

    let text = if args.json {
        serde_json::to_string_pretty(&RenderResult { output }).map_err(|e| miette!("{}", e))?
    } else {
        output
    };

    match &args.output {
        Some(path) => {
            write(path, text).map_err(|e| miette!("Cannot write {}: {}", path.display(), e))?;
        }
        None if args.json => println!("{}", text),
        None => print!("{}", text),
    }
    Ok(exitcode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_splits_at_first_equals() {
        assert_eq!(
            parse_key_val("title=a=b"),
            Ok(("title".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_val("title").is_err());
    }
}
