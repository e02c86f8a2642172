//! Type-keyed lookup shared by model adaptors and renderers

use std::collections::HashMap;

use super::{TypeKey, Value};

/// Maps runtime types to handlers. Lookup walks a value's lineage: exact
/// type, declared supertypes, then the universal fallback.
#[derive(Debug, Clone)]
pub struct TypeRegistry<V> {
    entries: HashMap<TypeKey, V>,
}

impl<V> Default for TypeRegistry<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> TypeRegistry<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `key`, returning the one it replaces
    pub fn insert(&mut self, key: TypeKey, handler: V) -> Option<V> {
        self.entries.insert(key, handler)
    }

    pub fn get(&self, key: &TypeKey) -> Option<&V> {
        self.entries.get(key)
    }

    /// First handler registered along the value's lineage
    pub fn lookup(&self, value: &Value) -> Option<&V> {
        let found = value
            .lineage()
            .iter()
            .find_map(|key| self.entries.get(key));
        if found.is_none() {
            tracing::trace!(value_type = %value.type_name(), "no handler registered");
        }
        found
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
