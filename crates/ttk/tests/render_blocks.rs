//! Tests for BLOCK definitions, INCLUDE, PROCESS, WRAPPER, INSERT and
//! template loading.

use std::fs;
use std::sync::Arc;

use ttk::{BlockSource, Exception, MemoryLoader, Template, Vars, render, vars};

fn r(source: &str) -> String {
    render(source, &Vars::new()).unwrap()
}

/// A template that loads files from memory.
fn with_files(files: &[(&str, &str)]) -> Template {
    let loader = files
        .iter()
        .fold(MemoryLoader::new(), |loader, (path, text)| loader.with_file(path, *text));
    Template::builder().loader(Arc::new(loader)).build()
}

fn with_blocks(blocks: Vec<(&str, BlockSource)>) -> Template {
    Template::builder()
        .blocks(
            blocks
                .into_iter()
                .map(|(name, block)| (name.to_string(), block))
                .collect(),
        )
        .build()
}

// =========================================================================
// BLOCK, INCLUDE and PROCESS
// =========================================================================

#[test]
fn test_block_used_before_definition() {
    assert_eq!(r("[% INCLUDE greet %]![% BLOCK greet %]hi[% END %]"), "hi!");
}

#[test]
fn test_block_definition_produces_no_output() {
    assert_eq!(r("a[% BLOCK unused %]never[% END %]b"), "ab");
}

#[test]
fn test_include_isolates_variables() {
    let source = "[% x = 1 %][% BLOCK change %][% x = 2 %][% END %][% INCLUDE change %][% x %]";
    assert_eq!(r(source), "1");
}

#[test]
fn test_include_isolates_nested_data() {
    let source = "[% user = { name = 'a' } %]\
                  [% BLOCK rename %][% user.name = 'b' %][% END %]\
                  [% INCLUDE rename %][% user.name %]";
    assert_eq!(r(source), "a");
}

#[test]
fn test_process_shares_variables() {
    let source = "[% x = 1 %][% BLOCK change %][% x = 2 %][% END %][% PROCESS change %][% x %]";
    assert_eq!(r(source), "2");
}

#[test]
fn test_include_arguments_are_local() {
    let source = "[% BLOCK greet %]Hello [% name %][% END %][% INCLUDE greet name = 'Ann' %]|[% name %]";
    assert_eq!(r(source), "Hello Ann|");
}

#[test]
fn test_process_arguments_persist() {
    let source = "[% BLOCK greet %]Hello [% name %][% END %][% PROCESS greet name = 'Ann' %]|[% name %]";
    assert_eq!(r(source), "Hello Ann|Ann");
}

#[test]
fn test_block_metadata_and_argument_override() {
    let source = "[% BLOCK page title = 'Home' %]<[% title %]>[% END %]\
                  [% INCLUDE page %][% INCLUDE page title = 'About' %]";
    assert_eq!(r(source), "<Home><About>");
}

#[test]
fn test_include_several_names() {
    let source = "[% BLOCK a %]A[% END %][% BLOCK b %]B[% END %][% INCLUDE a + b %]";
    assert_eq!(r(source), "AB");
}

#[test]
fn test_dynamic_block_names() {
    let source = "[% BLOCK part_2 %]two[% END %][% INCLUDE $which %]/[% INCLUDE \"part_$n\" %]";
    let data = vars! { "which" => "part_2", "n" => 2 };
    assert_eq!(render(source, &data).unwrap(), "two/two");
}

#[test]
fn test_recursive_block_with_base_case() {
    let source = "[% BLOCK down %][% n %][% IF n > 0 %][% INCLUDE down n = n - 1 %][% END %][% END %]\
                  [% INCLUDE down n = 3 %]";
    assert_eq!(r(source), "3210");
}

#[test]
fn test_unbounded_recursion_is_an_error() {
    let template = Template::builder().max_depth(10).build();
    let source = "[% BLOCK recurse %][% INCLUDE recurse %][% END %][% INCLUDE recurse %]";
    let err = template.process(source, &Vars::new()).unwrap_err();
    let exception = err.exception().unwrap();
    assert_eq!(exception.kind(), "recursion");
    assert_eq!(
        exception.info(),
        "recurse: maximum recursion depth of 10 exceeded"
    );
}

#[test]
fn test_global_is_shared_across_includes() {
    let source = "[% BLOCK bump %][% global.count = global.count + 1 %][% END %]\
                  [% INCLUDE bump %][% INCLUDE bump %][% global.count %]";
    assert_eq!(r(source), "2");
}

// =========================================================================
// WRAPPER
// =========================================================================

#[test]
fn test_wrapper_chain() {
    let source = "[% BLOCK a %]A[[% content %]][% END %]\
                  [% BLOCK b %]B[[% content %]][% END %]\
                  [% WRAPPER a + b %]X[% END %]";
    assert_eq!(r(source), "A[B[X]]");
}

#[test]
fn test_wrapper_arguments_and_body_scope() {
    let source = "[% BLOCK box %][% title %]:[% content %][% END %]\
                  [% WRAPPER box title = 'T' %][% seen = 1 %]body[% END %]/[% seen %]";
    assert_eq!(r(source), "T:body/1");
}

#[test]
fn test_postfix_wrapper() {
    assert_eq!(r("[% BLOCK em %]*[% content %]*[% END %][% 'hi' WRAPPER em %]"), "*hi*");
}

// =========================================================================
// Predefined and native blocks
// =========================================================================

#[test]
fn test_predefined_text_block() {
    let template = with_blocks(vec![("header", BlockSource::text("== [% title %] =="))]);
    let out = template
        .process("[% INCLUDE header title = 'News' %]", &Vars::new())
        .unwrap();
    assert_eq!(out, "== News ==");
}

#[test]
fn test_template_block_shadows_predefined() {
    let template = with_blocks(vec![("header", "outer".into())]);
    let out = template
        .process("[% BLOCK header %]inner[% END %][% INCLUDE header %]", &Vars::new())
        .unwrap();
    assert_eq!(out, "inner");
}

#[test]
fn test_native_block_reads_stash() {
    let template = with_blocks(vec![(
        "shout",
        BlockSource::native(|stash| Ok(format!("<{}>", stash.get("name").to_string().to_uppercase()))),
    )]);
    let out = template
        .process("[% INCLUDE shout name = 'ann' %][% PROCESS shout %]", &vars! { "name" => "bob" })
        .unwrap();
    assert_eq!(out, "<ANN><BOB>");
}

#[test]
fn test_native_block_errors_are_catchable() {
    let template = with_blocks(vec![(
        "fail",
        BlockSource::native(|_| Err(Exception::new("native", "bad input"))),
    )]);
    let source = "[% TRY %][% INCLUDE fail %][% CATCH native %]caught [% error.info %][% END %]";
    assert_eq!(template.process(source, &Vars::new()).unwrap(), "caught bad input");
}

#[test]
fn test_trim_applies_to_block_output() {
    let template = Template::builder()
        .trim(true)
        .blocks([("b".to_string(), BlockSource::text("  x \n"))].into())
        .build();
    assert_eq!(template.process("[[% INCLUDE b %]]\n", &Vars::new()).unwrap(), "[x]");
}

// =========================================================================
// External templates
// =========================================================================

#[test]
fn test_include_from_memory_loader() {
    let template = with_files(&[("header", "<h1>[% title %]</h1>"), ("lib/menu", "menu")]);
    let out = template
        .process("[% INCLUDE header title = 'Hi' %][% INCLUDE lib/menu %]", &Vars::new())
        .unwrap();
    assert_eq!(out, "<h1>Hi</h1>menu");
}

#[test]
fn test_insert_is_not_processed() {
    let template = with_files(&[("raw.txt", "[% not processed %]")]);
    let out = template.process("<[% INSERT raw.txt %]>", &Vars::new()).unwrap();
    assert_eq!(out, "<[% not processed %]>");
}

#[test]
fn test_blocks_from_processed_file_stay_defined() {
    let template = with_files(&[("defs", "[% BLOCK helper %]h[% END %]")]);
    let out = template
        .process("[% PROCESS defs %][% PROCESS helper %]", &Vars::new())
        .unwrap();
    assert_eq!(out, "h");
}

#[test]
fn test_blocks_from_included_file_are_dropped() {
    let template = with_files(&[("defs", "[% BLOCK helper %]h[% END %]")]);
    let err = template
        .process("[% INCLUDE defs %][% PROCESS helper %]", &Vars::new())
        .unwrap_err();
    assert_eq!(err.exception().unwrap().kind(), "file.not_found");
}

#[test]
fn test_stop_in_included_file_keeps_partial_output() {
    let template = with_files(&[("part", "b[% STOP %]x")]);
    assert_eq!(template.process("a[% INCLUDE part %]c", &Vars::new()).unwrap(), "ab");
}

#[test]
fn test_include_path_search_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    fs::write(second.path().join("footer.tt"), "bye [% who %]").unwrap();
    fs::write(first.path().join("header.tt"), "first").unwrap();
    fs::write(second.path().join("header.tt"), "second").unwrap();

    let template = Template::builder()
        .include_path(vec![first.path().to_path_buf(), second.path().to_path_buf()])
        .build();
    let out = template
        .process("[% INCLUDE header.tt %] [% INCLUDE footer.tt who = 'all' %]", &Vars::new())
        .unwrap();
    assert_eq!(out, "first bye all");
}

#[test]
fn test_absolute_path_bypasses_include_path() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("abs.tt");
    fs::write(&file, "absolute [% n %]").unwrap();

    let source = format!("[% INCLUDE \"{}\" n = 1 %]", file.display());
    assert_eq!(r(&source), "absolute 1");
}
