//! Named dependency bindings injected into handlers.

use std::any::Any;
use std::collections::BTreeMap;

/// External collaborators the schema declares and the importer binds.
///
/// The runner verifies every declared name has a binding before any
/// handler executes; handlers then read them by name with a concrete
/// type.
#[derive(Default)]
pub struct Dependencies {
    values: BTreeMap<String, Box<dyn Any + Send + Sync>>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value under a dependency name, replacing any previous
    /// binding.
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), Box::new(value));
    }

    /// The binding for `name`, downcast to `T`. `None` when unbound or
    /// bound to a different type.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.values.get(name)?.as_ref().downcast_ref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}
