//! Registry of injected extension modules.

use crate::Value;
use indexmap::IndexMap;

/// Named extension instances of one context, in injection order.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: IndexMap<String, Value>,
}

impl ModuleRegistry {
    /// The instance registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.modules.get(name)
    }

    /// Registers `instance`, replacing an earlier module of the same name.
    pub fn insert(&mut self, name: impl Into<String>, instance: Value) -> Option<Value> {
        self.modules.insert(name.into(), instance)
    }

    /// Forgets `name`.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.modules.shift_remove(name)
    }

    /// Registered names, oldest first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
