//! Scope objects: ad-hoc values and helpers visible by bare name inside templates.
//!
//! A scope is consulted through an explicit lookup contract rather than by
//! forwarding arbitrary member access. Engines that need bindings up front
//! (Tera builds a full context per render) enumerate them through [`Scope::names`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Name/value lookup capability a template scope must provide.
pub trait Scope: fmt::Debug + Send + Sync {
    /// Resolve a bare name to a value, computing it if the scope exposes a method.
    fn lookup(&self, name: &str) -> Option<Value>;

    /// Names this scope can resolve.
    fn names(&self) -> Vec<String>;
}

/// A scope that resolves nothing. Used when a render is started without one.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyScope;

impl Scope for EmptyScope {
    fn lookup(&self, _name: &str) -> Option<Value> {
        None
    }

    fn names(&self) -> Vec<String> {
        Vec::new()
    }
}

type Method = Arc<dyn Fn() -> Value + Send + Sync>;

/// A scope built from fixed values and zero-argument methods.
///
/// ```
/// use serde_json::json;
/// use strata_core::{Scope, ScopeBindings};
///
/// let scope = ScopeBindings::new()
///     .value("site_name", json!("Strata"))
///     .method("some_text", || json!("text!"));
///
/// assert_eq!(scope.lookup("some_text"), Some(json!("text!")));
/// ```
#[derive(Clone, Default)]
pub struct ScopeBindings {
    values: BTreeMap<String, Value>,
    methods: BTreeMap<String, Method>,
}

impl ScopeBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a fixed value.
    #[must_use]
    pub fn value(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        self.methods.remove(&name);
        self.values.insert(name, value);
        self
    }

    /// Bind a method, evaluated on every lookup.
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        let name = name.into();
        self.values.remove(&name);
        self.methods.insert(name, Arc::new(method));
        self
    }
}

impl fmt::Debug for ScopeBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeBindings")
            .field("values", &self.values)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Scope for ScopeBindings {
    fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        self.methods.get(name).map(|method| method())
    }

    fn names(&self) -> Vec<String> {
        self.values
            .keys()
            .chain(self.methods.keys())
            .cloned()
            .collect()
    }
}

impl Scope for serde_json::Map<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}
