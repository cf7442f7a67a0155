//! Expression evaluation and variable path resolution.

use std::mem;

use crate::interpreter::context::Context;
use crate::interpreter::operators;
use crate::interpreter::stash::is_private;
use crate::interpreter::vmethods::{list_method, map_method, scalar_method};
use crate::parser::ast::{Args, BinaryOp, Expr, Name, Number, Path, QuotedPart, SegmentName};
use crate::types::{Exception, Value};

/// Ranges longer than this are refused rather than allocated.
const MAX_RANGE: i64 = 1_000_000;

pub(crate) fn eval(expr: &Expr, ctx: &mut Context<'_>) -> Result<Value, Exception> {
    match expr {
        Expr::Literal(text) => Ok(Value::from(text.as_str())),
        Expr::Number(Number::Integer(n)) => Ok(Value::Integer(*n)),
        Expr::Number(Number::Float(n)) => Ok(Value::Float(*n)),
        Expr::Path(path) => resolve(path, ctx, true),
        Expr::Ref(path) => resolve(path, ctx, false),
        Expr::Quoted(parts) => interpolate(parts, ctx).map(Value::String),
        Expr::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
        } => {
            let lhs = eval(lhs, ctx)?;
            if !lhs.is_truthy() {
                return Ok(Value::from(""));
            }
            let rhs = eval(rhs, ctx)?;
            Ok(if rhs.is_truthy() { rhs } else { Value::from("") })
        }
        Expr::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
        } => {
            let lhs = eval(lhs, ctx)?;
            if lhs.is_truthy() {
                return Ok(lhs);
            }
            let rhs = eval(rhs, ctx)?;
            Ok(if rhs.is_truthy() { rhs } else { Value::from("") })
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, ctx)?;
            let rhs = eval(rhs, ctx)?;
            operators::apply(*op, &lhs, &rhs)
        }
        Expr::Not(inner) => Ok(Value::Bool(!eval(inner, ctx)?.is_truthy())),
        Expr::Ternary {
            condition,
            then,
            otherwise,
        } => {
            if eval(condition, ctx)?.is_truthy() {
                eval(then, ctx)
            } else {
                eval(otherwise, ctx)
            }
        }
        Expr::List(items) => {
            let values = items
                .iter()
                .map(|item| eval(item, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::list(values))
        }
        Expr::Range { from, to } => {
            let from = eval(from, ctx)?.to_i64().unwrap_or(0);
            let to = eval(to, ctx)?.to_i64().unwrap_or(0);
            if to.saturating_sub(from) >= MAX_RANGE {
                return Err(Exception::undef(format!("range {from}..{to} is too large")));
            }
            Ok(Value::list((from..=to).map(Value::Integer)))
        }
        Expr::Hash(pairs) => {
            let mut entries = Vec::with_capacity(pairs.len());
            for (key, value) in pairs {
                let key = segment_name(key, ctx)?;
                entries.push((key, eval(value, ctx)?));
            }
            Ok(Value::map(entries))
        }
        Expr::Assign { target, value } => {
            let value = eval(value, ctx)?;
            assign(target, value, false, ctx)
        }
    }
}

/// Concatenate the parts of a double-quoted string.
pub(crate) fn interpolate(parts: &[QuotedPart], ctx: &mut Context<'_>) -> Result<String, Exception> {
    let mut text = String::new();
    for part in parts {
        match part {
            QuotedPart::Text(t) => text.push_str(t),
            QuotedPart::Path(path) => text.push_str(&resolve(path, ctx, true)?.to_string()),
        }
    }
    Ok(text)
}

/// The string a directive name stands for: a file or block name, a
/// filter name, or an exception type.
pub(crate) fn name_text(name: &Name, ctx: &mut Context<'_>) -> Result<String, Exception> {
    match name {
        Name::Static(text) => Ok(text.clone()),
        Name::Quoted(parts) => interpolate(parts, ctx),
        Name::Dynamic(path) => Ok(resolve(path, ctx, true)?.to_string()),
    }
}

fn segment_name(name: &SegmentName, ctx: &mut Context<'_>) -> Result<String, Exception> {
    match name {
        SegmentName::Name(text) => Ok(text.clone()),
        SegmentName::Computed(expr) => Ok(eval(expr, ctx)?.to_string()),
    }
}

/// Positional argument values followed, if there are any named
/// arguments, by one map holding them.
pub(crate) fn eval_args(args: &Args, ctx: &mut Context<'_>) -> Result<Vec<Value>, Exception> {
    let mut values = args
        .positional
        .iter()
        .map(|arg| eval(arg, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    if !args.named.is_empty() {
        values.push(Value::map(eval_named(args, ctx)?));
    }
    Ok(values)
}

pub(crate) fn eval_named(args: &Args, ctx: &mut Context<'_>) -> Result<Vec<(String, Value)>, Exception> {
    args.named
        .iter()
        .map(|(name, value)| Ok((name.clone(), eval(value, ctx)?)))
        .collect()
}

/// Read a variable path.
///
/// Each segment is resolved against the value so far: private names yield
/// null, then virtual methods are tried, then members, and functions are
/// called with the segment's arguments. A missing value anywhere yields
/// null. With `call_last` unset a function in the final position is
/// returned uncalled.
pub(crate) fn resolve(path: &Path, ctx: &mut Context<'_>, call_last: bool) -> Result<Value, Exception> {
    let last = path.segments.len().saturating_sub(1);
    let mut current = Value::Null;

    for (i, segment) in path.segments.iter().enumerate() {
        let name = segment_name(&segment.name, ctx)?;
        if is_private(&name) {
            return Ok(Value::Null);
        }
        let args = match &segment.args {
            Some(args) => eval_args(args, ctx)?,
            None => Vec::new(),
        };
        let call = call_last || i < last;

        current = if i == 0 {
            match ctx.stash.lookup(&name) {
                Some(Value::Function(f)) if call => f.call(&args)?,
                Some(Value::Null) | None if path.segments.len() == 1 => {
                    root_op(&name, &args).unwrap_or_default()
                }
                Some(value) => value,
                None => Value::Null,
            }
        } else {
            member(&current, &name, &args, call)?
        };

        if current.is_null() {
            return Ok(Value::Null);
        }
    }
    Ok(current)
}

/// Functions available on undefined root names: `inc(n)` and `dec(n)`.
/// Without an argument they count from zero.
fn root_op(name: &str, args: &[Value]) -> Option<Value> {
    let n = args.first().and_then(Value::to_i64).unwrap_or(0);
    match name {
        "inc" => Some(Value::Integer(n.saturating_add(1))),
        "dec" => Some(Value::Integer(n.saturating_sub(1))),
        _ => None,
    }
}

fn member(value: &Value, name: &str, args: &[Value], call: bool) -> Result<Value, Exception> {
    let found = match value {
        Value::List(list) => {
            if let Some(result) = list_method(list, name, args) {
                return result;
            }
            match name.parse::<i64>() {
                Ok(index) => {
                    let items = list.borrow();
                    let position = if index < 0 {
                        usize::try_from(index.unsigned_abs())
                            .ok()
                            .and_then(|back| items.len().checked_sub(back))
                    } else {
                        usize::try_from(index).ok()
                    };
                    position
                        .and_then(|p| items.get(p).cloned())
                        .unwrap_or_default()
                }
                Err(_) => Value::Null,
            }
        }
        Value::Map(map) => {
            if let Some(result) = map_method(map, name, args) {
                return result;
            }
            map.borrow().get(name).cloned().unwrap_or_default()
        }
        Value::Error(e) => match name {
            "type" => Value::from(e.kind()),
            "info" => Value::from(e.info()),
            _ => Value::Null,
        },
        Value::Function(_) => Value::Null,
        scalar => return scalar_method(scalar, name, args).unwrap_or(Ok(Value::Null)),
    };
    match found {
        Value::Function(f) if call => f.call(args),
        other => Ok(other),
    }
}

/// Assign `value` to `target`, creating intermediate maps as needed.
///
/// With `default` set an existing true value is kept. Private segments
/// make the assignment a no-op. Returns the value previously bound to
/// `target`, or null.
pub(crate) fn assign(
    target: &Path,
    value: Value,
    default: bool,
    ctx: &mut Context<'_>,
) -> Result<Value, Exception> {
    let mut names = Vec::with_capacity(target.segments.len());
    for segment in &target.segments {
        names.push(segment_name(&segment.name, ctx)?);
    }
    if names.iter().any(|name| is_private(name)) {
        return Ok(Value::Null);
    }
    let Some((last, parents)) = names.split_last() else {
        return Ok(Value::Null);
    };

    if parents.is_empty() {
        let previous = ctx.stash.lookup(last).unwrap_or_default();
        if !(default && previous.is_truthy()) {
            ctx.stash.set(last, value);
        }
        return Ok(previous);
    }

    let root = match ctx.stash.lookup(&parents[0]) {
        Some(existing @ (Value::Map(_) | Value::List(_))) => existing,
        _ => {
            let fresh = Value::map(Vec::<(String, Value)>::new());
            ctx.stash.set(&parents[0], fresh.clone());
            fresh
        }
    };
    let container = parents[1..]
        .iter()
        .fold(root, |container, name| child_container(&container, name));
    Ok(store(&container, last, value, default))
}

/// The map stored under `name` in `container`, created if missing.
fn child_container(container: &Value, name: &str) -> Value {
    match container {
        Value::Map(map) => {
            let mut entries = map.borrow_mut();
            match entries.get(name) {
                Some(existing @ (Value::Map(_) | Value::List(_))) => existing.clone(),
                _ => {
                    let fresh = Value::map(Vec::<(String, Value)>::new());
                    entries.insert(name.to_string(), fresh.clone());
                    fresh
                }
            }
        }
        Value::List(list) => {
            let index = name.parse::<usize>().ok();
            let items = list.borrow();
            index
                .and_then(|i| items.get(i).cloned())
                .filter(|v| matches!(v, Value::Map(_) | Value::List(_)))
                .unwrap_or_default()
        }
        _ => Value::Null,
    }
}

fn store(container: &Value, name: &str, value: Value, default: bool) -> Value {
    match container {
        Value::Map(map) => {
            let mut entries = map.borrow_mut();
            let previous = entries.get(name).cloned().unwrap_or_default();
            if !(default && previous.is_truthy()) {
                entries.insert(name.to_string(), value);
            }
            previous
        }
        Value::List(list) => {
            let mut items = list.borrow_mut();
            match name.parse::<usize>() {
                Ok(i) if i < items.len() => mem::replace(&mut items[i], value),
                Ok(i) if i == items.len() => {
                    items.push(value);
                    Value::Null
                }
                _ => Value::Null,
            }
        }
        _ => Value::Null,
    }
}
