//! Output filters.
//!
//! A filter rewrites the text produced by a `FILTER` block or a `| name`
//! pipe. Filters are looked up through an ordered list of namespaces: the
//! caller's filters first, then the built-ins. Dynamic filters receive the
//! call arguments and build the actual text transformation.

use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use unicode_segmentation::UnicodeSegmentation;

use crate::interpreter::error::not_found;
use crate::types::{Exception, Value};

/// A text transformation produced by a filter.
pub type FilterFn = dyn Fn(&str) -> Result<String, Exception>;

type StaticFn = dyn Fn(&str) -> Result<String, Exception> + Send + Sync;
type FactoryFn = dyn Fn(&[Value]) -> Result<Box<FilterFn>, Exception> + Send + Sync;

/// A named filter as registered with a [`Template`](crate::Template).
#[derive(Clone)]
pub enum Filter {
    /// Applied as-is; call arguments are ignored.
    Static(Arc<StaticFn>),
    /// Called with the filter arguments each time it is used, returning the
    /// transformation to apply.
    Dynamic(Arc<FactoryFn>),
}

impl Filter {
    pub fn new(f: impl Fn(&str) -> Result<String, Exception> + Send + Sync + 'static) -> Self {
        Filter::Static(Arc::new(f))
    }

    pub fn dynamic(
        f: impl Fn(&[Value]) -> Result<Box<FilterFn>, Exception> + Send + Sync + 'static,
    ) -> Self {
        Filter::Dynamic(Arc::new(f))
    }

    /// Build the transformation for one use of this filter.
    pub fn instantiate(&self, args: &[Value]) -> Result<Rc<FilterFn>, Exception> {
        match self {
            Filter::Static(f) => {
                let f = Arc::clone(f);
                Ok(Rc::new(move |text: &str| f(text)))
            }
            Filter::Dynamic(factory) => factory(args).map(Rc::from),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Static(_) => f.write_str("Filter::Static(..)"),
            Filter::Dynamic(_) => f.write_str("Filter::Dynamic(..)"),
        }
    }
}

/// Filters visible to one render: namespaces in priority order plus the
/// aliases defined by `FILTER alias = name(...)` so far.
pub(crate) struct FilterRegistry<'t> {
    namespaces: Vec<&'t IndexMap<String, Filter>>,
    aliases: IndexMap<String, Rc<FilterFn>>,
}

impl<'t> FilterRegistry<'t> {
    pub(crate) fn new(caller: &'t IndexMap<String, Filter>) -> Self {
        FilterRegistry {
            namespaces: vec![caller, &*BUILTIN_FILTERS],
            aliases: IndexMap::new(),
        }
    }

    /// Find `name` and instantiate it with `args`.
    pub(crate) fn resolve(&self, name: &str, args: &[Value]) -> Result<Rc<FilterFn>, Exception> {
        if let Some(alias) = self.aliases.get(name) {
            return Ok(Rc::clone(alias));
        }
        match self.namespaces.iter().find_map(|ns| ns.get(name)) {
            Some(filter) => filter.instantiate(args),
            None => Err(not_found("filter.not_found", name, self.names())),
        }
    }

    pub(crate) fn define_alias(&mut self, alias: &str, filter: Rc<FilterFn>) {
        self.aliases.insert(alias.to_string(), filter);
    }

    pub(crate) fn aliases(&self) -> IndexMap<String, Rc<FilterFn>> {
        self.aliases.clone()
    }

    pub(crate) fn restore_aliases(&mut self, aliases: IndexMap<String, Rc<FilterFn>>) {
        self.aliases = aliases;
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.aliases
            .keys()
            .chain(self.namespaces.iter().flat_map(|ns| ns.keys()))
            .map(String::as_str)
    }
}

// =========================================================================
// Built-in filters
// =========================================================================

static BUILTIN_FILTERS: LazyLock<IndexMap<String, Filter>> = LazyLock::new(builtin_filters);

fn builtin_filters() -> IndexMap<String, Filter> {
    let mut filters = IndexMap::new();
    let mut add = |name: &str, filter: Filter| {
        filters.insert(name.to_string(), filter);
    };

    add("html", Filter::new(|text| Ok(html(text))));
    add(
        "html_line_break",
        Filter::new(|text| Ok(text.replace('\n', "<br />\n"))),
    );
    add("uri", Filter::new(|text| Ok(percent_encode(text, URI_SAFE))));
    add("url", Filter::new(|text| Ok(percent_encode(text, URL_SAFE))));
    add("upper", Filter::new(|text| Ok(text.to_uppercase())));
    add("lower", Filter::new(|text| Ok(text.to_lowercase())));
    add("ucfirst", Filter::new(|text| Ok(ucfirst(text))));
    add("lcfirst", Filter::new(|text| Ok(lcfirst(text))));
    add("trim", Filter::new(|text| Ok(text.trim().to_string())));
    add("collapse", Filter::new(|text| Ok(collapse(text))));
    add("null", Filter::new(|_| Ok(String::new())));

    add(
        "indent",
        Filter::dynamic(|args| {
            let pad = match args.first() {
                None => "    ".to_string(),
                Some(Value::Integer(n)) => repeat(" ", usize::try_from(*n).unwrap_or(0))?,
                Some(other) => other.to_string(),
            };
            Ok(boxed(move |text| Ok(indent(text, &pad))))
        }),
    );
    add(
        "truncate",
        Filter::dynamic(|args| {
            let len = count_arg(args.first()).unwrap_or(32);
            let suffix = args.get(1).map_or_else(|| "...".to_string(), Value::to_string);
            Ok(boxed(move |text| Ok(truncate(text, len, &suffix))))
        }),
    );
    add(
        "repeat",
        Filter::dynamic(|args| {
            let times = count_arg(args.first()).unwrap_or(1);
            Ok(boxed(move |text| repeat(text, times)))
        }),
    );
    add(
        "replace",
        Filter::dynamic(|args| {
            let search = args.first().map(Value::to_string).unwrap_or_default();
            let replacement = args.get(1).map(Value::to_string).unwrap_or_default();
            Ok(boxed(move |text| Ok(replace(text, &search, &replacement))))
        }),
    );
    add(
        "remove",
        Filter::dynamic(|args| {
            let search = args.first().map(Value::to_string).unwrap_or_default();
            Ok(boxed(move |text| Ok(replace(text, &search, ""))))
        }),
    );

    filters
}

fn boxed(f: impl Fn(&str) -> Result<String, Exception> + 'static) -> Box<FilterFn> {
    Box::new(f)
}

/// Longest text `repeat` and `indent` will build, in bytes.
const MAX_REPEAT_LEN: usize = 16 * 1024 * 1024;

/// `text` repeated `times` times. Results longer than `MAX_REPEAT_LEN`
/// raise `undef`.
pub(crate) fn repeat(text: &str, times: usize) -> Result<String, Exception> {
    match text.len().checked_mul(times) {
        Some(len) if len <= MAX_REPEAT_LEN => Ok(text.repeat(times)),
        _ => Err(Exception::undef(format!("cannot repeat text {times} times"))),
    }
}

/// A non-negative count argument. Negative counts are treated as zero.
pub(crate) fn count_arg(value: Option<&Value>) -> Option<usize> {
    value
        .and_then(Value::to_i64)
        .map(|n| usize::try_from(n).unwrap_or(0))
}

pub(crate) fn html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Characters left alone by `uri`, beyond ASCII letters and digits.
const URI_SAFE: &str = "-_.~";
/// `url` also keeps the reserved characters that structure a URL.
const URL_SAFE: &str = "-_.~;/?:@&=+$,[]!*'()#";

fn percent_encode(text: &str, safe: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        let c = char::from(byte);
        if byte.is_ascii_alphanumeric() || (byte.is_ascii() && safe.contains(c)) {
            out.push(c);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

pub(crate) fn ucfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn lcfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Trim, then squeeze every inner whitespace run to one space.
pub(crate) fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Prefix every line with `pad`.
fn indent(text: &str, pad: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| format!("{pad}{line}"))
        .collect()
}

/// Cut `text` to at most `len` grapheme clusters, ending with `suffix`
/// when anything was removed.
fn truncate(text: &str, len: usize, suffix: &str) -> String {
    if text.graphemes(true).count() <= len {
        return text.to_string();
    }
    let keep = len.saturating_sub(suffix.graphemes(true).count());
    let mut out: String = text.graphemes(true).take(keep).collect();
    out.push_str(suffix);
    out.graphemes(true).take(len).collect()
}

/// Replace every occurrence of `search`; an empty pattern changes nothing.
pub(crate) fn replace(text: &str, search: &str, replacement: &str) -> String {
    if search.is_empty() {
        text.to_string()
    } else {
        text.replace(search, replacement)
    }
}
