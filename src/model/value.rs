//! Attribute values bound into template instances

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};

use super::Model;

/// Runtime type identity used by adaptor and renderer lookup
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Marker type under which numeric renderers and adaptors are registered.
/// Integers and floats both list it as their supertype.
pub enum Number {}

/// Ad-hoc record with fields in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregate {
    fields: IndexMap<String, Value>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zip field names against values; the counts must match
    pub fn from_fields<I, V>(names: &[String], values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.len() != names.len() {
            return Err(Error::AggregateArity {
                expected: names.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            fields: names.iter().cloned().zip(values).collect(),
        })
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, (name, value)) in self.fields.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, "}}")
    }
}

/// A scalar, list or aggregate attribute value
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Opaque application object resolved through model adaptors
    Object(Arc<dyn Model>),
    List(Vec<Value>),
    Aggregate(Aggregate),
}

impl Value {
    pub fn object<M: Model>(model: M) -> Self {
        Value::Object(Arc::new(model))
    }

    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_aggregate(&self) -> Option<&Aggregate> {
        match self {
            Value::Aggregate(agg) => Some(agg),
            _ => None,
        }
    }

    /// The wrapped application object, if any
    pub fn as_model(&self) -> Option<&dyn Model> {
        match self {
            Value::Object(model) => Some(&**model),
            _ => None,
        }
    }

    /// Downcast a wrapped application object to its concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_model()?.as_any().downcast_ref::<T>()
    }

    /// Exact runtime type
    pub fn type_key(&self) -> TypeKey {
        match self {
            Value::Bool(_) => TypeKey::of::<bool>(),
            Value::Int(_) => TypeKey::of::<i64>(),
            Value::Float(_) => TypeKey::of::<f64>(),
            Value::Str(_) => TypeKey::of::<String>(),
            Value::Object(model) => {
                let model: &dyn Model = &**model;
                TypeKey {
                    id: model.as_any().type_id(),
                    name: model.type_name(),
                }
            }
            Value::List(_) => TypeKey::of::<Vec<Value>>(),
            Value::Aggregate(_) => TypeKey::of::<Aggregate>(),
        }
    }

    /// Human readable type name for error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "integer".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::Object(model) => {
                let model: &dyn Model = &**model;
                short_type_name(model.type_name()).to_string()
            }
            Value::List(_) => "list".to_string(),
            Value::Aggregate(_) => "aggregate".to_string(),
        }
    }

    /// Exact type, then supertypes in declaration order, then the universal fallback
    pub fn lineage(&self) -> Vec<TypeKey> {
        let mut keys = vec![self.type_key()];
        match self {
            Value::Int(_) | Value::Float(_) => keys.push(TypeKey::of::<Number>()),
            Value::Object(model) => keys.extend(model.supertypes()),
            _ => {}
        }
        keys.push(TypeKey::of::<dyn Any>());
        keys
    }
}

/// Strip the module path from a `std::any::type_name` string
pub(crate) fn short_type_name(full: &str) -> &str {
    let head = full.split('<').next().unwrap_or(full);
    head.rsplit("::").next().unwrap_or(head)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Aggregate(a), Value::Aggregate(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Object(model) => write!(f, "{}", model),
            Value::List(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Aggregate(agg) => write!(f, "{}", agg),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(x as f64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Aggregate> for Value {
    fn from(agg: Aggregate) -> Self {
        Value::Aggregate(agg)
    }
}

impl From<Arc<dyn Model>> for Value {
    fn from(model: Arc<dyn Model>) -> Self {
        Value::Object(model)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Point {
        x: i64,
    }

    impl fmt::Display for Point {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "({})", self.x)
        }
    }

    impl Model for Point {}

    #[test]
    fn test_lineage_for_numbers() {
        let lineage = Value::from(3).lineage();
        assert_eq!(lineage[0], TypeKey::of::<i64>());
        assert_eq!(lineage[1], TypeKey::of::<Number>());
        assert_eq!(lineage[2], TypeKey::of::<dyn Any>());
    }

    #[test]
    fn test_object_type_key_is_concrete_type() {
        let value = Value::object(Point { x: 4 });
        assert_eq!(value.type_key(), TypeKey::of::<Point>());
        assert_eq!(value.type_name(), "Point");
        assert_eq!(value.downcast_ref::<Point>().map(|p| p.x), Some(4));
        assert_eq!(value.to_string(), "(4)");
    }

    #[test]
    fn test_aggregate_arity() {
        let names = vec!["a".to_string(), "b".to_string()];
        let err = Aggregate::from_fields(&names, vec![1]).unwrap_err();
        assert!(matches!(
            err,
            Error::AggregateArity {
                expected: 2,
                actual: 1
            }
        ));

        let agg = Aggregate::from_fields(&names, vec![1, 2]).unwrap();
        assert_eq!(agg.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(agg.to_string(), "{a=1, b=2}");
    }

    #[test]
    fn test_object_equality_is_identity() {
        let a = Value::object(Point { x: 1 });
        let b = Value::object(Point { x: 1 });
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
