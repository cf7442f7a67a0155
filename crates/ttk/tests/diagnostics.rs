//! Tests for the diagnostics emitted while parsing and rendering.

use std::sync::Arc;

use ttk::{Level, MemoryLoader, RecordingDiagnostics, Template, Vars};

fn record(template: &Template, source: &str) -> RecordingDiagnostics {
    let diagnostics = RecordingDiagnostics::new();
    // Errors are fine here; only the recorded messages matter.
    let _ = template.process_with(source, &Vars::new(), &diagnostics);
    diagnostics
}

#[test]
fn test_include_and_process_are_logged() {
    let diagnostics = record(
        &Template::new(),
        "[% BLOCK greet %]hi[% END %][% INCLUDE greet %][% PROCESS greet %]",
    );
    let debug = diagnostics.messages(Level::Debug);
    assert!(debug.contains(&"INCLUDE 'greet'".to_string()));
    assert!(debug.contains(&"PROCESS 'greet'".to_string()));
    assert_eq!(debug[0], "rendering with 0 predefined blocks");
}

#[test]
fn test_loaded_files_are_logged() {
    let template = Template::builder()
        .loader(Arc::new(MemoryLoader::new().with_file("header", "h")))
        .build();
    let diagnostics = record(&template, "[% INCLUDE header %]");
    assert!(
        diagnostics
            .messages(Level::Debug)
            .contains(&"loaded './header'".to_string())
    );
}

#[test]
fn test_missing_template_is_a_warning() {
    let diagnostics = record(&Template::new(), "[% TRY %][% INCLUDE missing %][% CATCH %][% END %]");
    assert_eq!(
        diagnostics.messages(Level::Warn),
        vec!["template 'missing' not found".to_string()]
    );
    assert!(
        diagnostics
            .messages(Level::Debug)
            .iter()
            .any(|m| m.starts_with("caught file.not_found error"))
    );
}

#[test]
fn test_stop_is_logged() {
    let diagnostics = record(&Template::new(), "a[% STOP %]");
    assert!(
        diagnostics
            .messages(Level::Debug)
            .contains(&"render stopped".to_string())
    );
}

#[test]
fn test_debug_option_traces_grammar_rules() {
    let template = Template::builder().debug(true).build();
    let diagnostics = record(&template, "[% IF x %]y[% END %]");
    let trace = diagnostics.messages(Level::Trace);
    assert_eq!(trace[0], "statement at If 'IF' (offset 3)");
    assert!(trace.contains(&"expr at Ident 'x' (offset 6)".to_string()));
}

#[test]
fn test_no_trace_without_debug_option() {
    let diagnostics = record(&Template::new(), "[% x %]");
    assert!(diagnostics.messages(Level::Trace).is_empty());
}

#[test]
fn test_entries_keep_order() {
    let diagnostics = record(&Template::new(), "[% BLOCK a %][% END %][% INCLUDE a %][% STOP %]");
    let entries = diagnostics.entries();
    let (last_level, last_message) = entries.last().unwrap();
    assert_eq!(*last_level, Level::Debug);
    assert_eq!(last_message, "render stopped");
}

#[test]
fn test_levels_are_ordered() {
    assert!(Level::Trace < Level::Debug);
    assert!(Level::Debug < Level::Info);
    assert!(Level::Info < Level::Warn);
}
