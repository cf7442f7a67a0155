//! Statement evaluation.
//!
//! Nodes write their output into the buffer they are given. Blocks,
//! `TRY`, `FILTER` and `WRAPPER` bodies render into buffers of their own,
//! so `CLEAR` only discards the innermost one.

use std::mem;
use std::rc::Rc;

use crate::diagnostics::Level;
use crate::interpreter::context::{BlockDef, Context};
use crate::interpreter::error::{Flow, Interrupt, TemplateError};
use crate::interpreter::expression::{assign, eval, eval_args, eval_named, name_text};
use crate::interpreter::operators::loose_eq;
use crate::interpreter::stash::StashView;
use crate::parser::Document;
use crate::parser::ast::{Assignment, Case, Catch, Expr, FilterSpec, LoopControl, NameArgs, Node};
use crate::types::{Exception, Value};

const LOOP: &str = "loop";

/// Render a compiled template from the top.
///
/// `STOP` ends the render early keeping the output so far; any other
/// uncaught exception is returned.
pub(crate) fn render_template(document: &Document, ctx: &mut Context<'_>) -> Result<String, TemplateError> {
    ctx.register(document);
    let mut out = String::new();
    match render_nodes(&document.body, ctx, &mut out) {
        Ok(()) | Err(Interrupt::Return | Interrupt::Next | Interrupt::Last) => {}
        Err(Interrupt::Throw(e)) if e.is_stop() => ctx.log(Level::Debug, "render stopped"),
        Err(Interrupt::Throw(e)) => return Err(TemplateError::Exception(e)),
    }
    if ctx.config.trim {
        Ok(out.trim().to_string())
    } else {
        Ok(out)
    }
}

fn render_nodes(nodes: &[Node], ctx: &mut Context<'_>, out: &mut String) -> Flow<()> {
    for node in nodes {
        render_node(node, ctx, out)?;
    }
    Ok(())
}

fn render_node(node: &Node, ctx: &mut Context<'_>, out: &mut String) -> Flow<()> {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Get(expr) => {
            let value = eval(expr, ctx)?;
            out.push_str(&value.to_string());
        }
        Node::Call(expr) => {
            eval(expr, ctx)?;
        }
        Node::Set(assignments) => set_all(assignments, false, ctx)?,
        Node::Default(assignments) => set_all(assignments, true, ctx)?,
        Node::If {
            unless,
            condition,
            body,
            elsifs,
            otherwise,
        } => {
            let mut branch = None;
            if eval(condition, ctx)?.is_truthy() != *unless {
                branch = Some(body);
            } else {
                for (condition, body) in elsifs {
                    if eval(condition, ctx)?.is_truthy() {
                        branch = Some(body);
                        break;
                    }
                }
            }
            if let Some(body) = branch.or(otherwise.as_ref()) {
                render_nodes(body, ctx, out)?;
            }
        }
        Node::For {
            variable,
            iterable,
            body,
        } => render_for(variable.as_deref(), iterable, body, ctx, out)?,
        Node::While { condition, body } => render_while(condition, body, ctx, out)?,
        Node::Switch { subject, cases } => render_switch(subject, cases, ctx, out)?,
        Node::Try {
            body,
            catches,
            finally,
        } => render_try(body, catches, finally.as_deref(), ctx, out)?,
        // Definitions were hoisted when the document was compiled.
        Node::Block { .. } => {}
        Node::Include(target) => process(target, true, ctx, out)?,
        Node::Process(target) => process(target, false, ctx, out)?,
        Node::Insert(target) => {
            for name in &target.names {
                let name = name_text(name, ctx)?;
                out.push_str(&ctx.load_text(&name)?);
            }
        }
        Node::Wrapper { target, body } => wrapper(target, body, ctx, out)?,
        Node::Filter { filter, body } => apply_filter(filter, body, ctx, out)?,
        Node::Throw(target) => return Err(throw(target, ctx)?.into()),
        Node::LoopControl { control, .. } => {
            return Err(match control {
                LoopControl::Next => Interrupt::Next,
                LoopControl::Last => Interrupt::Last,
            });
        }
        Node::Clear => out.clear(),
        Node::Stop => return Err(Exception::stop().into()),
        Node::Return => return Err(Interrupt::Return),
    }
    Ok(())
}

fn set_all(assignments: &[Assignment], default: bool, ctx: &mut Context<'_>) -> Result<(), Exception> {
    for assignment in assignments {
        let value = eval(&assignment.value, ctx)?;
        assign(&assignment.target, value, default, ctx)?;
    }
    Ok(())
}

// =========================================================================
// Loops
// =========================================================================

/// `FOR`. Null iterates zero times, a map iterates its entries sorted by
/// key as `{ key, value }` pairs, and any other scalar once.
///
/// Without a loop variable the body runs in a child scope into which map
/// items are merged. With one, the variable is set in the current scope
/// and the previous `loop` binding is restored afterwards.
fn render_for(
    variable: Option<&str>,
    iterable: &Expr,
    body: &[Node],
    ctx: &mut Context<'_>,
    out: &mut String,
) -> Flow<()> {
    let items = match eval(iterable, ctx)? {
        Value::Null => return Ok(()),
        Value::List(list) => list.borrow().clone(),
        Value::Map(map) => {
            let mut entries: Vec<(String, Value)> = map
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            entries
                .into_iter()
                .map(|(key, value)| Value::map([("key", Value::from(key)), ("value", value)]))
                .collect()
        }
        other => vec![other],
    };

    let saved_loop = ctx.stash.lookup(LOOP);
    if variable.is_none() {
        ctx.stash.push_scope();
    }
    let result = iterate(variable, &items, body, ctx, out);
    match (variable, saved_loop) {
        (None, _) => ctx.stash.pop_scope(),
        (Some(_), Some(previous)) => ctx.stash.set(LOOP, previous),
        (Some(_), None) => ctx.stash.unset(LOOP),
    }
    result
}

fn iterate(
    variable: Option<&str>,
    items: &[Value],
    body: &[Node],
    ctx: &mut Context<'_>,
    out: &mut String,
) -> Flow<()> {
    for (index, item) in items.iter().enumerate() {
        ctx.stash.set(LOOP, loop_record(index, items));
        match (variable, item) {
            (Some(name), _) => ctx.stash.set(name, item.clone()),
            (None, Value::Map(map)) => {
                for (key, value) in map.borrow().iter() {
                    ctx.stash.set(key, value.clone());
                }
            }
            (None, _) => {}
        }
        match render_nodes(body, ctx, out) {
            Ok(()) | Err(Interrupt::Next) => {}
            Err(Interrupt::Last) => break,
            Err(other) => return Err(other),
        }
    }
    Ok(())
}

/// The `loop` variable for iteration `index` over `items`.
fn loop_record(index: usize, items: &[Value]) -> Value {
    let size = items.len();
    let count = index + 1;
    let odd = count % 2 == 1;
    Value::map([
        ("index", Value::from(index)),
        ("count", Value::from(count)),
        ("number", Value::from(count)),
        ("first", Value::Bool(index == 0)),
        ("last", Value::Bool(count == size)),
        ("size", Value::from(size)),
        ("max", Value::from(size.saturating_sub(1))),
        (
            "prev",
            index
                .checked_sub(1)
                .and_then(|i| items.get(i))
                .cloned()
                .unwrap_or_default(),
        ),
        ("next", items.get(count).cloned().unwrap_or_default()),
        ("odd", Value::Bool(odd)),
        ("even", Value::Bool(!odd)),
        ("parity", Value::from(if odd { "odd" } else { "even" })),
    ])
}

fn render_while(condition: &Expr, body: &[Node], ctx: &mut Context<'_>, out: &mut String) -> Flow<()> {
    let limit = ctx.config.max_while;
    let mut iterations = 0;
    while eval(condition, ctx)?.is_truthy() {
        if iterations >= limit {
            return Err(Exception::new(
                "while",
                format!("runaway WHILE loop (more than {limit} iterations)"),
            )
            .into());
        }
        iterations += 1;
        match render_nodes(body, ctx, out) {
            Ok(()) | Err(Interrupt::Next) => {}
            Err(Interrupt::Last) => break,
            Err(other) => return Err(other),
        }
    }
    Ok(())
}

// =========================================================================
// SWITCH and TRY
// =========================================================================

/// Run the first case whose value equals the subject (a list value matches
/// if any element does), or else the first default case.
fn render_switch(subject: &Expr, cases: &[Case], ctx: &mut Context<'_>, out: &mut String) -> Flow<()> {
    let subject = eval(subject, ctx)?;
    let mut fallback = None;
    for case in cases {
        match &case.value {
            None => {
                fallback.get_or_insert(&case.body);
            }
            Some(expr) => {
                let matched = match eval(expr, ctx)? {
                    Value::List(values) => values.borrow().iter().any(|v| loose_eq(&subject, v)),
                    value => loose_eq(&subject, &value),
                };
                if matched {
                    return render_nodes(&case.body, ctx, out);
                }
            }
        }
    }
    match fallback {
        Some(body) => render_nodes(body, ctx, out),
        None => Ok(()),
    }
}

/// `TRY`. Output produced before an exception is kept. The first
/// matching `CATCH` handles it with `error` and `e` bound; `STOP` is never
/// caught. `FINAL` always runs, and an exception it raises wins.
fn render_try(
    body: &[Node],
    catches: &[Catch],
    finally: Option<&[Node]>,
    ctx: &mut Context<'_>,
    out: &mut String,
) -> Flow<()> {
    let mut buffer = String::new();
    let mut result = render_nodes(body, ctx, &mut buffer);

    let caught = match &result {
        Err(Interrupt::Throw(e)) if !e.is_stop() => Some(e.clone()),
        _ => None,
    };
    if let Some(e) = caught {
        let handler = catches.iter().find(|catch| {
            catch
                .signature
                .as_deref()
                .is_none_or(|signature| e.matches(signature))
        });
        if let Some(handler) = handler {
            ctx.log(Level::Debug, &format!("caught {e}"));
            ctx.stash.set("error", Value::Error(e.clone()));
            ctx.stash.set("e", Value::Error(e));
            result = render_nodes(&handler.body, ctx, &mut buffer);
        }
    }

    let final_result = match finally {
        Some(body) => render_nodes(body, ctx, &mut buffer),
        None => Ok(()),
    };
    out.push_str(&buffer);
    final_result.and(result)
}

fn throw(target: &NameArgs, ctx: &mut Context<'_>) -> Result<Exception, Exception> {
    let kind = match target.names.first() {
        Some(name) => name_text(name, ctx)?,
        None => Exception::UNDEF.to_string(),
    };
    let info = match target.args.positional.first() {
        Some(expr) => eval(expr, ctx)?.to_string(),
        None => String::new(),
    };
    Ok(Exception::new(kind, info))
}

// =========================================================================
// Blocks, wrappers and filters
// =========================================================================

/// `INCLUDE` (isolated) or `PROCESS` each named block or file in turn.
fn process(target: &NameArgs, isolate: bool, ctx: &mut Context<'_>, out: &mut String) -> Flow<()> {
    let args = eval_named(&target.args, ctx)?;
    for name in &target.names {
        let name = name_text(name, ctx)?;
        invoke(&name, &args, isolate, ctx, out)?;
    }
    Ok(())
}

fn invoke(
    name: &str,
    args: &[(String, Value)],
    isolate: bool,
    ctx: &mut Context<'_>,
    out: &mut String,
) -> Flow<()> {
    let block = ctx.find_block(name)?;
    ctx.enter(name)?;
    let directive = if isolate { "INCLUDE" } else { "PROCESS" };
    ctx.log(Level::Debug, &format!("{directive} '{name}'"));

    let saved = isolate.then(|| ctx.isolate());
    let result = run_block(&block, args, ctx, out);
    if let Some(saved) = saved {
        ctx.restore(saved);
    }
    ctx.leave();
    result
}

/// Bind metadata and arguments, then render the block. Named blocks are
/// trimmed when the template trims; on `STOP` the partial output is kept.
fn run_block(block: &BlockDef, args: &[(String, Value)], ctx: &mut Context<'_>, out: &mut String) -> Flow<()> {
    match block {
        BlockDef::Native(f) => {
            bind(args, ctx);
            let text = f(&StashView::new(&ctx.stash))?;
            out.push_str(&text);
            Ok(())
        }
        BlockDef::Document(document) => {
            ctx.register(document);
            for (key, value) in &document.meta {
                ctx.stash.set(key, Value::from(value.as_str()));
            }
            bind(args, ctx);

            let mut buffer = String::new();
            let result = match render_nodes(&document.body, ctx, &mut buffer) {
                Err(Interrupt::Return) => Ok(()),
                other => other,
            };
            match &result {
                Ok(()) if ctx.config.trim => out.push_str(buffer.trim()),
                Ok(()) => out.push_str(&buffer),
                Err(Interrupt::Throw(e)) if e.is_stop() => out.push_str(&buffer),
                Err(_) => {}
            }
            result
        }
    }
}

fn bind(args: &[(String, Value)], ctx: &mut Context<'_>) {
    for (name, value) in args {
        ctx.stash.set(name, value.clone());
    }
}

/// `WRAPPER a + b`: the body becomes `content` for `b`, whose output
/// becomes `content` for `a`.
fn wrapper(target: &NameArgs, body: &[Node], ctx: &mut Context<'_>, out: &mut String) -> Flow<()> {
    let mut content = String::new();
    render_nodes(body, ctx, &mut content)?;

    let args = eval_named(&target.args, ctx)?;
    let names = target
        .names
        .iter()
        .map(|name| name_text(name, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    for name in names.iter().rev() {
        let mut wrapper_args = args.clone();
        wrapper_args.push(("content".to_string(), Value::String(mem::take(&mut content))));
        invoke(name, &wrapper_args, true, ctx, &mut content)?;
    }
    out.push_str(&content);
    Ok(())
}

fn apply_filter(spec: &FilterSpec, body: &[Node], ctx: &mut Context<'_>, out: &mut String) -> Flow<()> {
    let args = eval_args(&spec.target.args, ctx)?;
    let mut filters = Vec::with_capacity(spec.target.names.len());
    for name in &spec.target.names {
        let name = name_text(name, ctx)?;
        filters.push(ctx.filters.resolve(&name, &args)?);
    }
    if let (Some(alias), [filter]) = (&spec.alias, filters.as_slice()) {
        ctx.filters.define_alias(alias, Rc::clone(filter));
    }

    let mut text = String::new();
    render_nodes(body, ctx, &mut text)?;
    for filter in &filters {
        text = filter(&text)?;
    }
    out.push_str(&text);
    Ok(())
}
