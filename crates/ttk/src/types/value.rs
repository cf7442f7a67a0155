use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use super::Exception;

/// A shared, mutable list. Virtual methods such as `push` mutate it in place.
pub type List = Rc<RefCell<Vec<Value>>>;

/// A shared, mutable map that keeps insertion order.
pub type Map = Rc<RefCell<IndexMap<String, Value>>>;

/// Top-level template variables, as passed to a render call.
pub type Vars = IndexMap<String, Value>;

/// A host function callable from a template.
///
/// Functions receive the positional call arguments (named arguments are
/// appended as a single trailing map) and may fail with an [`Exception`],
/// which templates can catch with `TRY`/`CATCH`.
#[derive(Clone)]
pub struct Function(Rc<dyn Fn(&[Value]) -> Result<Value, Exception>>);

impl Function {
    pub fn new(f: impl Fn(&[Value]) -> Result<Value, Exception> + 'static) -> Self {
        Function(Rc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, Exception> {
        (self.0)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Function(..)")
    }
}

/// A dynamically typed template value.
///
/// # Example
///
/// ```
/// use ttk::Value;
///
/// let n: Value = 42.into();
/// let list = Value::list([Value::from("a"), Value::from("b")]);
///
/// assert_eq!(n.to_string(), "42");
/// assert_eq!(list.to_string(), "a,b");
/// assert!(!Value::Null.is_truthy());
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// The null object returned for missing lookups. Renders as "" and is false.
    #[default]
    Null,

    Bool(bool),

    Integer(i64),

    Float(f64),

    String(String),

    List(List),

    Map(Map),

    Function(Function),

    /// A caught exception, as bound to `error` inside a `CATCH` block.
    Error(Exception),
}

impl Value {
    /// Build a list value from any sequence of values.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// Build a map value from key/value pairs, keeping their order.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Map(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    /// Wrap a closure as a callable value.
    pub fn function(f: impl Fn(&[Value]) -> Result<Value, Exception> + 'static) -> Value {
        Value::Function(Function::new(f))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Template truthiness: null, false, zero, "" and "0" are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty() && s != "0",
            Value::List(_) | Value::Map(_) | Value::Function(_) | Value::Error(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Numeric view of this value as a float.
    ///
    /// Strings are parsed after trimming; anything that is not a number
    /// yields `None`.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Numeric view of this value truncated to an integer.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::String(s) => match s.trim().parse::<i64>() {
                Ok(n) => Some(n),
                Err(_) => self.to_f64().map(|f| f.trunc() as i64),
            },
            _ => self.to_f64().map(|f| f.trunc() as i64),
        }
    }

    /// Copy this value and everything reachable from it.
    ///
    /// Lists and maps are shared between clones of a `Value`; a deep clone
    /// gives the copy its own storage so mutations cannot leak back.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::List(items) => Value::list(items.borrow().iter().map(Value::deep_clone)),
            Value::Map(entries) => Value::map(
                entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone())),
            ),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null | Value::Bool(false) => Ok(()),
            Value::Bool(true) => f.write_str("1"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => f.write_str(&format_float(*n)),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Map(_) => f.write_str("HASH"),
            Value::Function(_) => f.write_str("CODE"),
            Value::Error(e) => write!(f, "{e}"),
        }
    }
}

/// Render a float the way templates expect.
///
/// Integral values drop their fractional part, and binary rounding artifacts
/// such as `4.140000000000001` are corrected to 12 significant digits.
pub(crate) fn format_float(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let shortest = n.to_string();
    if has_rounding_artifact(&shortest) {
        to_precision(n, 12)
    } else {
        shortest
    }
}

/// Matches `\.[0-9]*00000[1-9]+$`.
fn has_rounding_artifact(repr: &str) -> bool {
    let Some((_, fraction)) = repr.split_once('.') else {
        return false;
    };
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let head = fraction.trim_end_matches(|c: char| ('1'..='9').contains(&c));
    head.len() < fraction.len() && head.ends_with("00000")
}

fn to_precision(n: f64, significant: i32) -> String {
    let magnitude = n.abs().log10().floor() as i32;
    let decimals = (significant - 1 - magnitude).max(0) as usize;
    let fixed = format!("{n:.decimals$}");
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Integer)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items.into_iter().map(Into::into))
    }
}

impl From<Vars> for Value {
    fn from(entries: Vars) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Exception> for Value {
    fn from(e: Exception) -> Self {
        Value::Error(e)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any template data value")
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E>(self, n: i64) -> Result<Value, E> {
        Ok(Value::Integer(n))
    }

    fn visit_u64<E>(self, n: u64) -> Result<Value, E> {
        Ok(i64::try_from(n).map_or(Value::Float(n as f64), Value::Integer))
    }

    fn visit_f64<E>(self, n: f64) -> Result<Value, E> {
        Ok(Value::Float(n))
    }

    fn visit_str<E>(self, s: &str) -> Result<Value, E> {
        Ok(Value::from(s))
    }

    fn visit_string<E>(self, s: String) -> Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::list(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut entries = Vars::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            entries.insert(key, value);
        }
        Ok(Value::from(entries))
    }
}
