//! Virtual methods on lists, maps and scalars.
//!
//! Each dispatcher returns `None` when `name` is not a method of that kind
//! of value, leaving the caller to fall back to member access.

use std::cmp::Ordering;

use indexmap::IndexSet;

use crate::interpreter::filters::{collapse, count_arg, lcfirst, repeat, replace, ucfirst};
use crate::types::{Exception, List, Map, Value};

type MethodResult = Option<Result<Value, Exception>>;

pub(crate) fn list_method(list: &List, name: &str, args: &[Value]) -> MethodResult {
    let value = match name {
        "sort" => {
            let mut items = list.borrow().clone();
            match args.first().map(Value::to_string) {
                Some(key) => items.sort_by(|a, b| compare(&field(a, &key), &field(b, &key))),
                None => items.sort_by(compare),
            }
            Value::list(items)
        }
        "push" => {
            list.borrow_mut().extend(args.iter().cloned());
            Value::Null
        }
        "unshift" => {
            let mut items = list.borrow_mut();
            for (i, arg) in args.iter().enumerate() {
                items.insert(i, arg.clone());
            }
            Value::Null
        }
        "pop" => list.borrow_mut().pop().unwrap_or_default(),
        "shift" => {
            let mut items = list.borrow_mut();
            if items.is_empty() {
                Value::Null
            } else {
                items.remove(0)
            }
        }
        "join" => {
            let separator = args.first().map_or_else(|| ",".to_string(), Value::to_string);
            let items = list.borrow();
            let parts: Vec<String> = items.iter().map(Value::to_string).collect();
            Value::String(parts.join(&separator))
        }
        "reverse" => Value::list(list.borrow().iter().rev().cloned()),
        "size" => Value::from(list.borrow().len()),
        "max" => Value::from(list.borrow().len() as i64 - 1),
        "first" => list.borrow().first().cloned().unwrap_or_default(),
        "last" => list.borrow().last().cloned().unwrap_or_default(),
        "unique" => {
            let mut seen = IndexSet::new();
            let items = list.borrow();
            Value::list(
                items
                    .iter()
                    .filter(|item| seen.insert(item.to_string()))
                    .cloned(),
            )
        }
        _ => return None,
    };
    Some(Ok(value))
}

/// Sort order: numeric when both values are numbers, otherwise
/// case-insensitive text.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            let (x, y) = (a.to_f64().unwrap_or(0.0), b.to_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        _ => a.to_string().to_lowercase().cmp(&b.to_string().to_lowercase()),
    }
}

fn field(item: &Value, key: &str) -> Value {
    item.as_map()
        .and_then(|map| map.borrow().get(key).cloned())
        .unwrap_or_default()
}

pub(crate) fn map_method(map: &Map, name: &str, args: &[Value]) -> MethodResult {
    let value = match name {
        "keys" => Value::list(map.borrow().keys().map(|k| Value::from(k.as_str()))),
        "values" => Value::list(map.borrow().values().cloned()),
        "import" => {
            for arg in args {
                if let Value::Map(other) = arg {
                    // Importing a map into itself changes nothing.
                    if other.as_ptr() == map.as_ptr() {
                        continue;
                    }
                    let entries: Vec<(String, Value)> = other
                        .borrow()
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    map.borrow_mut().extend(entries);
                }
            }
            Value::Null
        }
        "exists" => {
            let key = args.first().map(Value::to_string).unwrap_or_default();
            Value::Bool(map.borrow().contains_key(&key))
        }
        "delete" => {
            let mut entries = map.borrow_mut();
            for key in args {
                entries.shift_remove(&key.to_string());
            }
            Value::Null
        }
        _ => return None,
    };
    Some(Ok(value))
}

/// Methods on strings, numbers and booleans. `defined` also answers for
/// null.
pub(crate) fn scalar_method(value: &Value, name: &str, args: &[Value]) -> MethodResult {
    if value.is_null() {
        return (name == "defined").then_some(Ok(Value::Bool(false)));
    }
    let text = value.to_string();
    let result = match name {
        "defined" => Value::Bool(true),
        "length" => Value::from(text.chars().count()),
        "size" => Value::Integer(1),
        "upper" => Value::String(text.to_uppercase()),
        "lower" => Value::String(text.to_lowercase()),
        "ucfirst" => Value::String(ucfirst(&text)),
        "lcfirst" => Value::String(lcfirst(&text)),
        "trim" => Value::String(text.trim().to_string()),
        "collapse" => Value::String(collapse(&text)),
        "repeat" => match repeat(&text, count_arg(args.first()).unwrap_or(1)) {
            Ok(repeated) => Value::String(repeated),
            Err(e) => return Some(Err(e)),
        },
        "replace" => {
            let search = args.first().map(Value::to_string).unwrap_or_default();
            let replacement = args.get(1).map(Value::to_string).unwrap_or_default();
            Value::String(replace(&text, &search, &replacement))
        }
        "split" => match args.first().map(Value::to_string) {
            Some(separator) if !separator.is_empty() => {
                Value::list(text.split(separator.as_str()).map(Value::from))
            }
            _ => Value::list(text.split_whitespace().map(Value::from)),
        },
        "substr" => {
            let chars: Vec<char> = text.chars().collect();
            let offset = args.first().and_then(Value::to_i64).unwrap_or(0);
            let start = clamp_index(offset, chars.len());
            let end = match args.get(1).and_then(Value::to_i64) {
                Some(len) => start.saturating_add(usize::try_from(len).unwrap_or(0)).min(chars.len()),
                None => chars.len(),
            };
            Value::String(chars[start..end].iter().collect())
        }
        "list" => Value::list([value.clone()]),
        _ => return None,
    };
    Some(Ok(result))
}

/// A possibly negative offset into a sequence of `len` items; negative
/// offsets count from the end.
fn clamp_index(offset: i64, len: usize) -> usize {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let index = if offset < 0 { len_i + offset } else { offset };
    usize::try_from(index.clamp(0, len_i)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> List {
        match Value::list(items.iter().map(|s| Value::from(*s))) {
            Value::List(list) => list,
            _ => unreachable!(),
        }
    }

    fn call(list: &List, name: &str, args: &[Value]) -> Value {
        list_method(list, name, args).unwrap().unwrap()
    }

    #[test]
    fn sort_is_case_insensitive_and_returns_a_new_list() {
        let list = strings(&["b", "C", "a"]);
        assert_eq!(call(&list, "sort", &[]).to_string(), "a,b,C");
        assert_eq!(Value::List(list).to_string(), "b,C,a");
    }

    #[test]
    fn numbers_sort_numerically() {
        let list = match Value::list([10, 9, 100].map(Value::from)) {
            Value::List(list) => list,
            _ => unreachable!(),
        };
        assert_eq!(call(&list, "sort", &[]).to_string(), "9,10,100");
    }

    #[test]
    fn substr_handles_negative_offsets() {
        let text = Value::from("template");
        let r = scalar_method(&text, "substr", &[Value::from(-4)]).unwrap().unwrap();
        assert_eq!(r.to_string(), "late");
        let r = scalar_method(&text, "substr", &[Value::from(0), Value::from(4)])
            .unwrap()
            .unwrap();
        assert_eq!(r.to_string(), "temp");
    }

    #[test]
    fn repeat_with_a_huge_count_is_an_error() {
        let text = Value::from("ab");
        let r = scalar_method(&text, "repeat", &[Value::from(2)]).unwrap().unwrap();
        assert_eq!(r.to_string(), "abab");
        let err = scalar_method(&text, "repeat", &[Value::Integer(i64::MAX)])
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind(), "undef");
    }

    #[test]
    fn unknown_methods_fall_through() {
        assert!(scalar_method(&Value::from("x"), "nope", &[]).is_none());
        assert!(list_method(&strings(&[]), "keys", &[]).is_none());
    }
}
