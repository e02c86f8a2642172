//! Per-instance attribute storage

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};

use super::{Aggregate, Value};

/// Attributes bound on one template instance, in binding order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeStore {
    attributes: IndexMap<String, Value>,
    /// Names whose list was built by `add`; a list bound by the caller is
    /// kept as one element instead of being extended
    accumulated: IndexSet<String>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite `name`
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        self.accumulated.shift_remove(&name);
        self.attributes.insert(name, value.into());
    }

    /// Create `name`, or append to it. A value already bound under `name`,
    /// including a list passed in by the caller, is promoted to a list
    /// holding both values.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.get_mut(&name) {
            None => {
                self.attributes.insert(name, value);
            }
            Some(existing) => {
                append(existing, value, self.accumulated.contains(&name));
                self.accumulated.insert(name);
            }
        }
    }

    /// Parse `items.{a, b, c}`, zip the field names against `values` and
    /// append the resulting aggregate to the list under `items`
    pub fn add_aggregate<I, V>(&mut self, spec: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let (name, fields) = parse_aggregate_spec(spec)?;
        let aggregate = Value::Aggregate(Aggregate::from_fields(&fields, values)?);
        match self.attributes.get_mut(&name) {
            None => {
                self.attributes.insert(name.clone(), Value::List(vec![aggregate]));
            }
            Some(existing) => append(existing, aggregate, self.accumulated.contains(&name)),
        }
        self.accumulated.insert(name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.accumulated.shift_remove(name);
        self.attributes.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

fn append(existing: &mut Value, value: Value, accumulated: bool) {
    match existing {
        Value::List(items) if accumulated => items.push(value),
        bound => {
            let first = std::mem::replace(bound, Value::List(Vec::with_capacity(2)));
            if let Value::List(items) = bound {
                items.push(first);
                items.push(value);
            }
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Split `items.{a, b}` into the attribute name and its ordered field names
pub fn parse_aggregate_spec(spec: &str) -> Result<(String, Vec<String>)> {
    let invalid = |reason: &str| Error::InvalidAggregateSpec {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = spec.trim();
    let (name, rest) = trimmed
        .split_once('.')
        .ok_or_else(|| invalid("expected 'name.{field, ...}'"))?;
    let name = name.trim();
    if !is_identifier(name) {
        return Err(invalid("attribute name is not an identifier"));
    }

    let inner = rest
        .trim()
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .ok_or_else(|| invalid("field list must be wrapped in braces"))?;

    let mut fields: Vec<String> = Vec::new();
    for field in inner.split(',').map(str::trim) {
        if !is_identifier(field) {
            return Err(invalid(&format!("'{}' is not a field name", field)));
        }
        if fields.iter().any(|f| f == field) {
            return Err(invalid(&format!("field '{}' listed twice", field)));
        }
        fields.push(field.to_string());
    }

    Ok((name.to_string(), fields))
}
