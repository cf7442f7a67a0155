//! Variable scopes.

use indexmap::IndexMap;

use crate::types::{Value, Vars};

/// Name of the map shared by every scope of a render, including
/// `INCLUDE`d ones.
pub(crate) const GLOBAL: &str = "global";

/// Returns true for names hidden from templates: a leading `_` or `.`.
pub(crate) fn is_private(name: &str) -> bool {
    name.starts_with(['_', '.'])
}

/// A stack of scopes. Lookups walk from the innermost scope outwards;
/// writes land in the innermost scope.
#[derive(Debug, Clone)]
pub(crate) struct Stash {
    scopes: Vec<IndexMap<String, Value>>,
}

impl Stash {
    /// The root scope: a deep copy of the caller's data plus `global`.
    pub(crate) fn new(vars: &Vars) -> Self {
        let mut root: IndexMap<String, Value> = vars
            .iter()
            .map(|(name, value)| (name.clone(), value.deep_clone()))
            .collect();
        if !matches!(root.get(GLOBAL), Some(Value::Map(_))) {
            root.insert(GLOBAL.to_string(), Value::map(Vec::<(String, Value)>::new()));
        }
        Stash { scopes: vec![root] }
    }

    /// A single-scope copy sharing nothing with this stash except `global`.
    pub(crate) fn isolated(&self) -> Self {
        let mut flat = IndexMap::new();
        for scope in &self.scopes {
            for (name, value) in scope {
                let copy = if name == GLOBAL {
                    value.clone()
                } else {
                    value.deep_clone()
                };
                flat.insert(name.clone(), copy);
            }
        }
        Stash { scopes: vec![flat] }
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    pub(crate) fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// The value bound to `name`, or `None` if it is unbound or private.
    pub(crate) fn lookup(&self, name: &str) -> Option<Value> {
        if is_private(name) {
            return None;
        }
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
    }

    /// The value bound to `name`, or null.
    pub(crate) fn get(&self, name: &str) -> Value {
        self.lookup(name).unwrap_or_default()
    }

    /// Bind `name` in the innermost scope. Private names are ignored.
    pub(crate) fn set(&mut self, name: &str, value: Value) {
        if is_private(name) {
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Remove the innermost binding of `name`, exposing any outer one.
    pub(crate) fn unset(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.shift_remove(name);
        }
    }
}

/// Read-only access to the variables in scope, handed to native blocks.
pub struct StashView<'a> {
    stash: &'a Stash,
}

impl<'a> StashView<'a> {
    pub(crate) fn new(stash: &'a Stash) -> Self {
        StashView { stash }
    }

    /// The value of a variable, or null when it is unbound or private.
    pub fn get(&self, name: &str) -> Value {
        self.stash.get(name)
    }
}
