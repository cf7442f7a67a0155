//! Integration tests for the grammar and document compilation.

use ttk::parser::Document;
use ttk::parser::ast::{BinaryOp, Expr, LoopControl, Node, Number, Path, SegmentName};
use ttk::{ParseError, Template};

fn compile(source: &str) -> Document {
    Template::new().compile(source).unwrap()
}

fn compile_err(source: &str) -> ParseError {
    Template::new().compile(source).unwrap_err()
}

fn single_expr(source: &str) -> Expr {
    let doc = compile(source);
    match doc.body.as_slice() {
        [Node::Get(expr)] => expr.clone(),
        other => panic!("expected a single GET, got {other:?}"),
    }
}

fn int(n: i64) -> Expr {
    Expr::Number(Number::Integer(n))
}

fn var(name: &str) -> Expr {
    Expr::Path(Path::simple(name))
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

// =========================================================================
// Expressions
// =========================================================================

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    assert_eq!(
        single_expr("[% 1 + 2 * 3 %]"),
        binary(BinaryOp::Add, int(1), binary(BinaryOp::Mul, int(2), int(3)))
    );
}

#[test]
fn test_binary_operators_are_left_associative() {
    assert_eq!(
        single_expr("[% 10 - 3 - 2 %]"),
        binary(BinaryOp::Sub, binary(BinaryOp::Sub, int(10), int(3)), int(2))
    );
}

#[test]
fn test_concatenation_binds_looser_than_arithmetic() {
    assert_eq!(
        single_expr("[% a _ b + 1 %]"),
        binary(BinaryOp::Cat, var("a"), binary(BinaryOp::Add, var("b"), int(1)))
    );
}

#[test]
fn test_ternary_is_right_associative() {
    let expected = Expr::Ternary {
        condition: Box::new(var("a")),
        then: Box::new(var("b")),
        otherwise: Box::new(Expr::Ternary {
            condition: Box::new(var("c")),
            then: Box::new(var("d")),
            otherwise: Box::new(var("e")),
        }),
    };
    assert_eq!(single_expr("[% a ? b : c ? d : e %]"), expected);
}

#[test]
fn test_not_applies_to_the_next_term() {
    assert_eq!(
        single_expr("[% !a && b %]"),
        binary(BinaryOp::And, Expr::Not(Box::new(var("a"))), var("b"))
    );
}

#[test]
fn test_parenthesized_expression_continues_into_operators() {
    assert_eq!(
        single_expr("[% (1 + 2) * 3 %]"),
        binary(BinaryOp::Mul, binary(BinaryOp::Add, int(1), int(2)), int(3))
    );
}

#[test]
fn test_parenthesized_assignment() {
    assert!(matches!(single_expr("[% (x = 5) %]"), Expr::Assign { .. }));
}

#[test]
fn test_dotted_path_with_numeric_segments() {
    let Expr::Path(path) = single_expr("[% matrix.0.1 %]") else {
        panic!("expected a path");
    };
    let names: Vec<&SegmentName> = path.segments.iter().map(|s| &s.name).collect();
    assert_eq!(
        names,
        vec![
            &SegmentName::Name("matrix".to_string()),
            &SegmentName::Name("0".to_string()),
            &SegmentName::Name("1".to_string()),
        ]
    );
}

#[test]
fn test_call_arguments_split_named_and_positional() {
    let Expr::Path(path) = single_expr("[% f(1, a = 2, 3) %]") else {
        panic!("expected a path");
    };
    let args = path.segments[0].args.as_ref().unwrap();
    assert_eq!(args.positional, vec![int(1), int(3)]);
    assert_eq!(args.named, vec![("a".to_string(), int(2))]);
}

#[test]
fn test_range_literal() {
    assert_eq!(
        single_expr("[% [1..n] %]"),
        Expr::Range {
            from: Box::new(int(1)),
            to: Box::new(var("n")),
        }
    );
}

#[test]
fn test_empty_hash_literal() {
    assert_eq!(single_expr("[% {} %]"), Expr::Hash(Vec::new()));
}

#[test]
fn test_dollar_variable_is_computed_unless_v1dollar() {
    let Expr::Path(path) = single_expr("[% $name %]") else {
        panic!("expected a path");
    };
    assert!(matches!(path.segments[0].name, SegmentName::Computed(_)));

    let template = Template::builder().v1dollar(true).build();
    let doc = template.compile("[% $name %]").unwrap();
    assert_eq!(doc.body, vec![Node::Get(var("name"))]);
}

// =========================================================================
// Statements
// =========================================================================

#[test]
fn test_multiple_statements_in_one_directive() {
    let doc = compile("[% a = 1; b = 2; a %]");
    assert_eq!(doc.body.len(), 3);
    assert!(matches!(doc.body[0], Node::Set(_)));
    assert!(matches!(doc.body[2], Node::Get(_)));
}

#[test]
fn test_setlist_with_optional_commas() {
    let doc = compile("[% SET a = 1, b = 2 c = 3 %]");
    let [Node::Set(assignments)] = doc.body.as_slice() else {
        panic!("expected one SET");
    };
    assert_eq!(assignments.len(), 3);
}

#[test]
fn test_postfix_if_wraps_statement() {
    let doc = compile("[% 'yes' IF ok %]");
    let [Node::If { unless, body, .. }] = doc.body.as_slice() else {
        panic!("expected IF");
    };
    assert!(!unless);
    assert_eq!(body, &vec![Node::Get(Expr::Literal("yes".to_string()))]);
}

#[test]
fn test_postfix_on_setlist() {
    let doc = compile("[% x = 1 UNLESS y %]");
    assert!(matches!(doc.body.as_slice(), [Node::If { unless: true, .. }]));
}

#[test]
fn test_postfix_modifiers_chain() {
    let doc = compile("[% x FOREACH x = list IF show %]");
    let [Node::If { body, .. }] = doc.body.as_slice() else {
        panic!("expected IF outermost");
    };
    assert!(matches!(body.as_slice(), [Node::For { .. }]));
}

#[test]
fn test_if_elsif_else() {
    let doc = compile("[% IF a %]1[% ELSIF b %]2[% ELSIF c %]3[% ELSE %]4[% END %]");
    let [Node::If { elsifs, otherwise, .. }] = doc.body.as_slice() else {
        panic!("expected IF");
    };
    assert_eq!(elsifs.len(), 2);
    assert_eq!(otherwise, &Some(vec![Node::Text("4".to_string())]));
}

#[test]
fn test_for_loop_variable_forms() {
    for source in [
        "[% FOR x IN list %][% END %]",
        "[% FOREACH x = list %][% END %]",
    ] {
        let doc = compile(source);
        let [Node::For { variable, .. }] = doc.body.as_slice() else {
            panic!("expected FOR");
        };
        assert_eq!(variable.as_deref(), Some("x"));
    }

    let doc = compile("[% FOR list %][% END %]");
    assert!(matches!(doc.body.as_slice(), [Node::For { variable: None, .. }]));
}

#[test]
fn test_switch_discards_text_before_first_case() {
    let doc = compile("[% SWITCH x %]ignored[% CASE 'a' %]A[% CASE DEFAULT %]D[% END %]");
    let [Node::Switch { cases, .. }] = doc.body.as_slice() else {
        panic!("expected SWITCH");
    };
    assert_eq!(cases.len(), 2);
    assert!(cases[1].value.is_none());
}

#[test]
fn test_try_catch_final() {
    let doc = compile("[% TRY %]a[% CATCH file.not_found %]b[% CATCH %]c[% FINAL %]d[% END %]");
    let [Node::Try {
        catches, finally, ..
    }] = doc.body.as_slice()
    else {
        panic!("expected TRY");
    };
    assert_eq!(catches[0].signature.as_deref(), Some("file.not_found"));
    assert_eq!(catches[1].signature, None);
    assert!(finally.is_some());
}

#[test]
fn test_try_without_clauses_is_legal() {
    assert!(matches!(compile("[% TRY %]x[% END %]").body.as_slice(), [Node::Try { .. }]));
}

#[test]
fn test_filter_alias() {
    let doc = compile("[% FILTER shout = upper %]x[% END %]");
    let [Node::Filter { filter, .. }] = doc.body.as_slice() else {
        panic!("expected FILTER");
    };
    assert_eq!(filter.alias.as_deref(), Some("shout"));
}

#[test]
fn test_include_with_several_names_and_args() {
    let doc = compile("[% INCLUDE header + footer title = 'Hi' %]");
    let [Node::Include(target)] = doc.body.as_slice() else {
        panic!("expected INCLUDE");
    };
    assert_eq!(target.names.len(), 2);
    assert_eq!(target.args.named[0].0, "title");
}

// =========================================================================
// Document compilation
// =========================================================================

#[test]
fn test_blocks_are_hoisted_out_of_the_body() {
    let doc = compile("[% INCLUDE foo %][% BLOCK foo %]x[% END %]y");
    assert_eq!(doc.blocks.len(), 1);
    assert_eq!(doc.blocks[0].0, "foo");
    assert_eq!(doc.body.len(), 2);
    assert_eq!(doc.body[1], Node::Text("y".to_string()));
}

#[test]
fn test_blocks_inside_directives_are_hoisted() {
    let doc = compile("[% IF x %][% BLOCK inner %]i[% END %][% END %]");
    assert_eq!(doc.blocks.len(), 1);
    let [Node::If { body, .. }] = doc.body.as_slice() else {
        panic!("expected IF");
    };
    assert!(body.is_empty());
}

#[test]
fn test_nested_blocks_hoist_into_their_parent() {
    let doc = compile("[% BLOCK outer %][% BLOCK inner %]i[% END %]o[% END %]");
    assert_eq!(doc.blocks.len(), 1);
    let outer = &doc.blocks[0].1;
    assert_eq!(outer.blocks[0].0, "inner");
    assert_eq!(outer.body, vec![Node::Text("o".to_string())]);
}

#[test]
fn test_block_metadata() {
    let doc = compile("[% BLOCK box title = 'Box' width = 3 %][% END %]");
    assert_eq!(
        doc.blocks[0].1.meta,
        vec![
            ("title".to_string(), "Box".to_string()),
            ("width".to_string(), "3".to_string()),
        ]
    );
}

#[test]
fn test_loop_control_inside_loop_is_accepted() {
    let doc = compile("[% FOR x IN y %][% IF x %][% NEXT %][% END %][% END %]");
    let [Node::For { body, .. }] = doc.body.as_slice() else {
        panic!("expected FOR");
    };
    let [Node::If { body, .. }] = body.as_slice() else {
        panic!("expected IF");
    };
    assert!(matches!(
        body.as_slice(),
        [Node::LoopControl {
            control: LoopControl::Next,
            ..
        }]
    ));
}

// =========================================================================
// Errors
// =========================================================================

#[test]
fn test_loop_control_outside_loop_is_rejected() {
    let err = compile_err("[% NEXT %]");
    assert!(err.to_string().contains("NEXT used outside of a loop"), "{err}");
    let err = compile_err("[% BLOCK b %][% LAST %][% END %]");
    assert!(err.to_string().contains("LAST used outside of a loop"), "{err}");
}

#[test]
fn test_missing_end_points_at_opener() {
    let err = compile_err("ab\n[% IF x %]never closed");
    assert!(err.to_string().contains("missing END for IF"), "{err}");
    assert_eq!(err.line_column(), (2, 4));
}

#[test]
fn test_unsupported_directives() {
    for (source, word) in [
        ("[% USE Date %]", "USE"),
        ("[% MACRO m BLOCK %]", "MACRO"),
        ("[% PERL %]", "PERL"),
        ("[% META a = 1 %]", "META"),
    ] {
        let err = compile_err(source);
        assert!(err.to_string().contains(&format!("{word} directive is not supported")), "{err}");
    }
}

#[test]
fn test_block_capture_is_rejected() {
    let err = compile_err("[% x = BLOCK %]y[% END %]");
    assert!(err.to_string().contains("capturing BLOCK output"), "{err}");
}

#[test]
fn test_syntax_error_reports_location_and_excerpt() {
    let err = compile_err("line one\n[% a = %]");
    let ParseError::Syntax {
        line,
        column,
        excerpt,
        ..
    } = &err
    else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(*line, 2);
    assert_eq!(*column, 8);
    assert_eq!(excerpt, "%]");
    assert_eq!(err.position(), 16);
}

#[test]
fn test_excerpt_is_truncated_and_escapes_newlines() {
    let err = compile_err("[% END %]\nsome more text here");
    let ParseError::Syntax { excerpt, .. } = err else {
        panic!("expected a syntax error");
    };
    assert_eq!(excerpt, "END %]\\nsom...");
}

// =========================================================================
// Nesting limits
// =========================================================================

fn assert_too_deep(source: &str) {
    let err = compile_err(source);
    assert!(matches!(err, ParseError::Syntax { .. }));
    assert!(err.to_string().contains("nested more than 128 levels deep"), "{err}");
}

#[test]
fn test_deeply_nested_parentheses_are_rejected() {
    assert_too_deep(&format!("[% {}1{} %]", "(".repeat(1000), ")".repeat(1000)));
}

#[test]
fn test_moderate_nesting_is_accepted() {
    let source = format!("[% {}1{} %]", "(".repeat(50), ")".repeat(50));
    assert_eq!(single_expr(&source), int(1));
}

#[test]
fn test_deeply_nested_blocks_are_rejected() {
    assert_too_deep(&format!("{}x{}", "[% IF 1 %]".repeat(500), "[% END %]".repeat(500)));
}

#[test]
fn test_long_chains_are_rejected() {
    assert_too_deep(&format!("[% {}x %]", "NOT ".repeat(1000)));
    assert_too_deep(&format!("[% x{} %]", " IF 1".repeat(1000)));
    assert_too_deep(&format!("[% 1{} %]", " + 1".repeat(1000)));
    assert_too_deep(&format!("[% {}[1] %]", "[".repeat(1000)));
}
