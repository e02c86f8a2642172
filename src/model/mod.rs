//! Attribute value model and property resolution
//!
//! Application objects enter templates as [`Value::Object`]. The engine has no
//! compile-time knowledge of their shape: properties are resolved at render
//! time by the [`ModelAdaptor`] registered for the object's type, falling back
//! to [`ObjectModelAdaptor`], which asks the object itself through the
//! capabilities of the [`Model`] trait.

pub mod adaptor;
pub mod registry;
pub mod store;
mod value;

use std::any::Any;
use std::fmt;

pub use adaptor::{AggregateAdaptor, ModelAdaptor, ModelAdaptorRegistry, ObjectModelAdaptor};
pub use registry::TypeRegistry;
pub use store::{parse_aggregate_spec, AttributeStore};
pub use value::{Aggregate, Number, TypeKey, Value};

/// Access to the concrete type behind a `dyn Model`
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// An application object that templates can read properties from
///
/// Every capability is optional. A type that exposes nothing can still be
/// rendered through its `Display` impl, and a custom [`ModelAdaptor`] can read
/// its private state after downcasting.
///
/// ```
/// use std::fmt;
/// use textplate::{Model, Value};
///
/// #[derive(Debug)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl fmt::Display for User {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "{}:{}", self.id, self.name)
///     }
/// }
///
/// impl Model for User {
///     fn field(&self, name: &str) -> Option<Value> {
///         match name {
///             "id" => Some(self.id.into()),
///             _ => None,
///         }
///     }
///
///     fn accessor(&self, name: &str) -> Option<Value> {
///         match name {
///             "get_name" => Some(self.name.clone().into()),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Model: AsAny + fmt::Debug + fmt::Display + Send + Sync {
    /// A public data field with exactly this name
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// A zero-argument accessor such as `get_name`, `is_manager` or `has_parking_spot`
    fn accessor(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Element at `index` for indexable objects
    fn index(&self, _index: usize) -> Option<Value> {
        None
    }

    /// Types this object should also be looked up as, nearest first
    fn supertypes(&self) -> Vec<TypeKey> {
        Vec::new()
    }
}

/// Convert a template property name (`parkingSpot`) to Rust accessor style (`parking_spot`)
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (idx, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if idx > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
