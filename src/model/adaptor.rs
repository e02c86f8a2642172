//! Property resolution policies

use std::any::Any;
use std::sync::Arc;

use crate::error::{Error, Result};

use super::{snake_case, Aggregate, Model, TypeKey, TypeRegistry, Value};

/// Resolves a named property off a value
///
/// Adaptors are registered per type on a group. An adaptor that only special
/// cases some properties forwards the rest to [`ObjectModelAdaptor`]:
///
/// ```
/// use textplate::{ModelAdaptor, ObjectModelAdaptor, Result, Value};
///
/// struct Shouting;
///
/// impl ModelAdaptor for Shouting {
///     fn get_property(&self, value: &Value, property: &str) -> Result<Value> {
///         match property {
///             "name" => Ok(ObjectModelAdaptor
///                 .get_property(value, property)?
///                 .to_string()
///                 .to_uppercase()
///                 .into()),
///             _ => ObjectModelAdaptor.get_property(value, property),
///         }
///     }
/// }
/// ```
pub trait ModelAdaptor: Send + Sync {
    fn get_property(&self, value: &Value, property: &str) -> Result<Value>;
}

/// Default policy: public field, then getter-style accessor, then index
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectModelAdaptor;

impl ObjectModelAdaptor {
    fn from_model(model: &dyn Model, property: &str) -> Option<Value> {
        if let Some(value) = model.field(property) {
            return Some(value);
        }

        let base = snake_case(property);
        let accessors = [
            format!("get_{}", base),
            format!("is_{}", base),
            format!("has_{}", base),
            base.clone(),
        ];
        if let Some(value) = accessors.iter().find_map(|name| model.accessor(name)) {
            return Some(value);
        }

        property
            .parse::<usize>()
            .ok()
            .and_then(|idx| model.index(idx))
    }
}

impl ModelAdaptor for ObjectModelAdaptor {
    fn get_property(&self, value: &Value, property: &str) -> Result<Value> {
        let found = match value {
            Value::Object(model) => Self::from_model(&**model, property),
            Value::Aggregate(agg) => agg.get(property).cloned(),
            Value::List(items) => property
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx).cloned()),
            _ => None,
        };
        found.ok_or_else(|| Error::no_such_property(value.type_name(), property))
    }
}

/// Field lookup on aggregates built by `add_aggregate`
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateAdaptor;

impl ModelAdaptor for AggregateAdaptor {
    fn get_property(&self, value: &Value, property: &str) -> Result<Value> {
        value
            .as_aggregate()
            .and_then(|agg: &Aggregate| agg.get(property))
            .cloned()
            .ok_or_else(|| Error::no_such_property(value.type_name(), property))
    }
}

/// Adaptors keyed by runtime type
#[derive(Clone)]
pub struct ModelAdaptorRegistry {
    adaptors: TypeRegistry<Arc<dyn ModelAdaptor>>,
}

impl Default for ModelAdaptorRegistry {
    fn default() -> Self {
        let mut adaptors: TypeRegistry<Arc<dyn ModelAdaptor>> = TypeRegistry::new();
        adaptors.insert(TypeKey::of::<Aggregate>(), Arc::new(AggregateAdaptor));
        adaptors.insert(TypeKey::of::<dyn Any>(), Arc::new(ObjectModelAdaptor));
        Self { adaptors }
    }
}

impl std::fmt::Debug for ModelAdaptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAdaptorRegistry")
            .field("registered", &self.adaptors.len())
            .finish()
    }
}

impl ModelAdaptorRegistry {
    /// Registry seeded with the aggregate and object adaptors
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `adaptor` for values of type `T` and for objects naming `T` as a supertype
    pub fn register<T: ?Sized + 'static>(&mut self, adaptor: impl ModelAdaptor + 'static) {
        self.adaptors.insert(TypeKey::of::<T>(), Arc::new(adaptor));
    }

    pub fn lookup(&self, value: &Value) -> Option<&Arc<dyn ModelAdaptor>> {
        self.adaptors.lookup(value)
    }

    /// Resolve `property` with the nearest registered adaptor
    pub fn get_property(&self, value: &Value, property: &str) -> Result<Value> {
        match self.lookup(value) {
            Some(adaptor) => adaptor.get_property(value, property),
            None => Err(Error::no_such_property(value.type_name(), property)),
        }
    }
}
