//! Rendering tests for text, variables, expressions and virtual methods.

use ttk::{Template, Value, Vars, render, vars};

fn r(source: &str) -> String {
    render(source, &Vars::new()).unwrap()
}

fn rv(source: &str, vars: &Vars) -> String {
    render(source, vars).unwrap()
}

// =========================================================================
// Text and variables
// =========================================================================

#[test]
fn test_plain_text_passes_through() {
    assert_eq!(r("Hello, world!\n"), "Hello, world!\n");
}

#[test]
fn test_variable_substitution() {
    assert_eq!(rv("Hello [% name %]!", &vars! { "name" => "World" }), "Hello World!");
}

#[test]
fn test_undefined_variable_is_empty() {
    assert_eq!(r("[[% missing %]][[% missing.deeper.still %]]"), "[][]");
}

#[test]
fn test_nested_maps_and_lists() {
    let data = vars! {
        "user" => vars! { "name" => "Ann", "langs" => vec!["rust", "perl"] },
    };
    assert_eq!(rv("[% user.name %] likes [% user.langs.0 %]", &data), "Ann likes rust");
}

#[test]
fn test_json_data() {
    let json = r#"{"user": {"name": "Ann", "tags": ["a", "b"], "age": 41.5, "admin": true, "boss": null}}"#;
    let data: Value = serde_json::from_str(json).unwrap();
    let vars: Vars = data.as_map().unwrap().borrow().clone();
    let source = "[% user.name %]/[% user.tags.join('+') %]/[% user.age %]/[% user.admin %]/[[% user.boss %]]";
    assert_eq!(rv(source, &vars), "Ann/a+b/41.5/1/[]");
}

#[test]
fn test_negative_list_index_counts_from_end() {
    let data = vars! { "items" => vec!["a", "b", "c"] };
    assert_eq!(rv("[% items.-1 %][% items.5 %]", &data), "c");
}

#[test]
fn test_nested_list_index_pair() {
    let data = vars! {
        "matrix" => vec![
            Value::list([Value::from(1), Value::from(2)]),
            Value::list([Value::from(3), Value::from(4)]),
        ],
    };
    assert_eq!(rv("[% matrix.1.0 %]", &data), "3");
}

#[test]
fn test_scalar_stringification() {
    let data = vars! {
        "yes" => true,
        "no" => false,
        "list" => vec![1, 2, 3],
        "map" => vars! { "a" => 1 },
    };
    assert_eq!(rv("[[% yes %]][[% no %]][[% list %]][[% map %]]", &data), "[1][][1,2,3][HASH]");
}

#[test]
fn test_private_names_are_hidden() {
    let data = vars! { "_secret" => "x", "user" => vars! { ".hidden" => "y", "_pw" => "z" } };
    assert_eq!(rv("[[% _secret %]][[% user._pw %]]", &data), "[][]");
}

#[test]
fn test_caller_data_is_not_modified() {
    let data = vars! { "items" => vec![1, 2, 3], "name" => "orig" };
    let out = rv("[% items.push(4); name = 'changed'; items.size %]", &data);
    assert_eq!(out, "4");
    assert_eq!(data["items"].as_list().unwrap().borrow().len(), 3);
    assert_eq!(data["name"].as_str(), Some("orig"));
}

// =========================================================================
// Assignment
// =========================================================================

#[test]
fn test_set_and_get() {
    assert_eq!(r("[% x = 5 %][% x %]"), "5");
    assert_eq!(r("[% SET a = 1 b = 2 %][% a + b %]"), "3");
}

#[test]
fn test_assignment_produces_no_output() {
    assert_eq!(r("a[% x = 'hidden' %]b"), "ab");
}

#[test]
fn test_parenthesized_assignment_yields_previous_value() {
    assert_eq!(r("[% y = (x = 5) %]<[% y %]>/[% x %]"), "<>/5");
    assert_eq!(r("[% x = 1 %][% y = (x = 5) %]<[% y %]>/[% x %]"), "<1>/5");
}

#[test]
fn test_nested_assignment_yields_previous_value() {
    let source = "[% user.name = 'a' %][% old = (user.name = 'b') %][% old %]/[% user.name %]";
    assert_eq!(r(source), "a/b");
    let data = vars! { "items" => vec!["a", "b"] };
    assert_eq!(rv("[% old = (items.1 = 'B') %][% old %]/[% items.1 %]", &data), "b/B");
}

#[test]
fn test_default_only_sets_false_values() {
    let data = vars! { "a" => 7, "b" => 0 };
    assert_eq!(rv("[% DEFAULT a = 1, b = 2, c = 3 %][% a %][% b %][% c %]", &data), "723");
}

#[test]
fn test_dotted_assignment_creates_maps() {
    assert_eq!(r("[% user.name = 'Bob' %][% user.name %]"), "Bob");
    assert_eq!(r("[% a.b.c = 1 %][% a.b.c %]"), "1");
}

#[test]
fn test_assignment_into_list_index() {
    let data = vars! { "items" => vec!["a", "b"] };
    assert_eq!(rv("[% items.1 = 'B' %][% items.join('') %]", &data), "aB");
}

#[test]
fn test_computed_names() {
    let data = vars! { "key" => "color", "color" => "red" };
    assert_eq!(rv("[% $key %]/[% ${ 'col' _ 'or' } %]", &data), "red/red");
}

// =========================================================================
// Operators
// =========================================================================

#[test]
fn test_arithmetic() {
    assert_eq!(r("[% 1 + 2 * 3 %]"), "7");
    assert_eq!(r("[% 10 - 3 - 2 %]"), "5");
    assert_eq!(r("[% 7 / 2 %]"), "3.5");
    assert_eq!(r("[% 8 / 2 %]"), "4");
    assert_eq!(r("[% 7 div 2 %]"), "3");
    assert_eq!(r("[% 7 % 3 %]"), "1");
    assert_eq!(r("[% 7 mod 3 %]"), "1");
    assert_eq!(r("[% x = 3; x-1 %]"), "2");
}

#[test]
fn test_float_rounding_artifacts_are_corrected() {
    assert_eq!(r("[% 0.1 + 0.2 %]"), "0.3");
    assert_eq!(r("[% 1.5 * 2 %]"), "3");
    assert_eq!(r("[% 2.5 %]"), "2.5");
}

#[test]
fn test_numeric_strings_do_arithmetic() {
    let data = vars! { "n" => "40" };
    assert_eq!(rv("[% n + 2 %]", &data), "42");
}

#[test]
fn test_concatenation() {
    assert_eq!(r("[% 'a' _ 'b' _ 1 + 2 %]"), "ab3");
}

#[test]
fn test_comparisons() {
    assert_eq!(r("[% 10 > 9 ? 'y' : 'n' %]"), "y");
    assert_eq!(r("[% '10' < '9' ? 'y' : 'n' %]"), "n");
    assert_eq!(r("[% 'b' > 'a' ? 'y' : 'n' %]"), "y");
    assert_eq!(r("[% 1 == 1.0 ? 'y' : 'n' %]"), "y");
    assert_eq!(r("[% 'abc' != 'abd' ? 'y' : 'n' %]"), "y");
    assert_eq!(r("[% 2 == 3 %]"), "");
    assert_eq!(r("[% 3 >= 3 %]"), "1");
}

#[test]
fn test_logical_operators_return_deciding_operand() {
    assert_eq!(r("[% missing || 'fallback' %]"), "fallback");
    assert_eq!(r("[% 'first' OR 'second' %]"), "first");
    assert_eq!(r("[% 1 && 'last' %]"), "last");
    assert_eq!(r("[% 0 AND 'never' %]"), "");
    assert_eq!(r("[% NOT 0 %]"), "1");
}

#[test]
fn test_ternary_chains() {
    let source = "[% n < 0 ? 'neg' : n == 0 ? 'zero' : 'pos' %]";
    assert_eq!(rv(source, &vars! { "n" => -3 }), "neg");
    assert_eq!(rv(source, &vars! { "n" => 0 }), "zero");
    assert_eq!(rv(source, &vars! { "n" => 5 }), "pos");
}

#[test]
fn test_ranges_and_literals() {
    assert_eq!(r("[% r = [1..4]; r.join('-') %]"), "1-2-3-4");
    assert_eq!(r("[% l = [1, 'two', 3]; l.size %]"), "3");
    assert_eq!(r("[% h = { a = 1, b => 2, 'c' = 3 }; h.keys.join(',') %]"), "a,b,c");
}

// =========================================================================
// Strings and interpolation
// =========================================================================

#[test]
fn test_double_quoted_interpolation() {
    let data = vars! { "name" => "Ann", "user" => vars! { "id" => 7 } };
    assert_eq!(rv(r#"[% "Hi $name (#${user.id})" %]"#, &data), "Hi Ann (#7)");
}

#[test]
fn test_escaped_dollar_in_quoted_string() {
    assert_eq!(r(r#"[% "costs \$5\t!" %]"#), "costs $5\t!");
}

#[test]
fn test_text_interpolation_option() {
    let template = Template::builder().interpolate(true).build();
    let out = template
        .process("Dear $user.name, you owe \\$${ amount }.", &vars! {
            "user" => vars! { "name" => "Ann" },
            "amount" => 12,
        })
        .unwrap();
    assert_eq!(out, "Dear Ann, you owe $12.");
}

#[test]
fn test_text_interpolation_with_nested_braces() {
    let template = Template::builder().interpolate(true).build();
    let data = vars! { "user" => vars! { "name" => "Ann" }, "field" => "name" };
    let out = template
        .process("${ user.${ field } } ${ field ? '}' : 'none' }!", &data)
        .unwrap();
    assert_eq!(out, "Ann }!");
}

// =========================================================================
// Functions
// =========================================================================

#[test]
fn test_function_values_are_called() {
    let data = vars! {
        "count" => Value::function(|args| Ok(Value::from(args.len()))),
        "greet" => Value::function(|args| {
            let name = args.first().map(Value::to_string).unwrap_or_default();
            Ok(Value::from(format!("hello {name}")))
        }),
    };
    assert_eq!(rv("[% count(1, 2, 3) %]", &data), "3");
    assert_eq!(rv("[% count(1, a = 2) %]", &data), "2");
    assert_eq!(rv("[% greet('bob').upper %]", &data), "HELLO BOB");
}

#[test]
fn test_functions_in_maps_are_called() {
    let data = vars! {
        "obj" => vars! { "double" => Value::function(|args| {
            Ok(Value::from(args.first().and_then(Value::to_i64).unwrap_or(0) * 2))
        }) },
    };
    assert_eq!(rv("[% obj.double(21) %]", &data), "42");
}

#[test]
fn test_inc_and_dec() {
    assert_eq!(r("[% inc(5) %]/[% dec(5) %]"), "6/4");
    assert_eq!(r("[% inc %]/[% dec %]"), "1/-1");
    assert_eq!(r("[% inc = 'mine' %][% inc %]/[% x.inc %]"), "mine/");
}

// =========================================================================
// Virtual methods
// =========================================================================

#[test]
fn test_list_methods() {
    let data = vars! { "l" => vec![3, 1, 2], "w" => vec!["b", "A", "c", "b"] };
    assert_eq!(rv("[% l.sort.join(' ') %]", &data), "1 2 3");
    assert_eq!(rv("[% w.sort.join %]", &data), "A,b,b,c");
    assert_eq!(rv("[% l.reverse.join %]", &data), "2,1,3");
    assert_eq!(rv("[% l.size %]/[% l.max %]", &data), "3/2");
    assert_eq!(rv("[% l.first %][% l.last %]", &data), "32");
    assert_eq!(rv("[% w.unique.join %]", &data), "b,A,c");
}

#[test]
fn test_list_mutators() {
    let data = vars! { "l" => vec![1, 2, 3] };
    assert_eq!(rv("[% l.push(4); l.unshift(0); l.join %]", &data), "0,1,2,3,4");
    assert_eq!(rv("[% l.pop %]:[% l.shift %]:[% l.join %]", &data), "3:1:2");
}

#[test]
fn test_sort_by_key() {
    let data = vars! {
        "people" => vec![
            Value::from(vars! { "name" => "Cy", "age" => 30 }),
            Value::from(vars! { "name" => "al", "age" => 25 }),
            Value::from(vars! { "name" => "Bo", "age" => 35 }),
        ],
    };
    let source = "[% FOR p IN people.sort('name') %][% p.name %] [% END %]";
    assert_eq!(rv(source, &data), "al Bo Cy ");
}

#[test]
fn test_map_methods() {
    let data = vars! { "h" => vars! { "b" => 2, "a" => 1 } };
    assert_eq!(rv("[% h.keys.join %]|[% h.values.join %]", &data), "b,a|2,1");
    assert_eq!(rv("[% h.exists('a') ? 'y' : 'n' %][% h.exists('z') ? 'y' : 'n' %]", &data), "yn");
    assert_eq!(rv("[% h.delete('b'); h.keys.join %]", &data), "a");
    assert_eq!(
        rv("[% h.import({ c = 3 }); h.keys.sort.join %]", &data),
        "a,b,c"
    );
}

#[test]
fn test_scalar_methods() {
    let data = vars! { "s" => "  hello   world  ", "csv" => "a,b,c", "w" => "rust" };
    assert_eq!(rv("[% w.length %]", &data), "4");
    assert_eq!(rv("[% w.upper %]/[% w.ucfirst %]", &data), "RUST/Rust");
    assert_eq!(rv("[[% s.trim %]]", &data), "[hello   world]");
    assert_eq!(rv("[[% s.collapse %]]", &data), "[hello world]");
    assert_eq!(rv("[% csv.split(',').join('|') %]", &data), "a|b|c");
    assert_eq!(rv("[% s.split.size %]", &data), "2");
    assert_eq!(rv("[% w.substr(1, 2) %]|[% w.substr(-2) %]", &data), "us|st");
    assert_eq!(rv("[% w.repeat(3) %]", &data), "rustrustrust");
    assert_eq!(rv("[% w.replace('u', 'o') %]", &data), "rost");
    assert_eq!(rv("[% w.list.size %]", &data), "1");
    assert_eq!(rv("[% w.defined ? 'y' : 'n' %]", &data), "y");
}

// =========================================================================
// Whitespace control
// =========================================================================

#[test]
fn test_chomp_flags() {
    assert_eq!(r("a\n  [%- 'x' %]"), "ax");
    assert_eq!(r("[% 'x' -%]  \nb"), "xb");
    assert_eq!(r("a \n\t[%= 'x' =%] \n b"), "a x b");
    assert_eq!(r("a \n\t[%~ 'x' ~%] \n b"), "axb");
}

#[test]
fn test_collapse_chomp_always_leaves_one_space() {
    assert_eq!(r("a[%= 'x' =%]b"), "a x b");
    assert_eq!(r("[%= 'x' =%]"), "x");
}

#[test]
fn test_trim_option() {
    let template = Template::builder().trim(true).build();
    assert_eq!(template.process("\n\n  hi  \n", &Vars::new()).unwrap(), "hi");
}

#[test]
fn test_multiline_listing() {
    let data = vars! {
        "title" => "Inventory",
        "items" => vec![
            Value::from(vars! { "name" => "apple", "qty" => 3 }),
            Value::from(vars! { "name" => "pear", "qty" => 0 }),
            Value::from(vars! { "name" => "plum", "qty" => 12 }),
        ],
    };
    let source = "\
[% title %]
[% FOR item IN items -%]
- [% item.name %]: [% item.qty || 'none' %]
[% END -%]
total: [% items.size %]";
    insta::assert_snapshot!(rv(source, &data), @r"
    Inventory
    - apple: 3
    - pear: none
    - plum: 12
    total: 3
    ");
}
