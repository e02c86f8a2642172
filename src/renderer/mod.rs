//! Attribute renderers turning values into output text
//!
//! Renderers are registered per type on a template group and receive the
//! expression's `format` option and the active locale. Values without a
//! renderer are written with their `Display` impl.

pub mod config;
mod number;
pub mod printf;
mod string;

use std::sync::Arc;

pub use config::RenderConfig;
pub use number::NumberRenderer;
pub use string::StringRenderer;

use crate::error::Result;
use crate::locale::Locale;
use crate::model::{Number, TypeKey, TypeRegistry, Value};

/// Formats a value for output
pub trait AttributeRenderer: Send + Sync {
    fn render(&self, value: &Value, format: Option<&str>, locale: &Locale) -> Result<String>;
}

/// Renderers keyed by runtime type
#[derive(Clone, Default)]
pub struct RendererRegistry {
    renderers: TypeRegistry<Arc<dyn AttributeRenderer>>,
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("registered", &self.renderers.len())
            .finish()
    }
}

impl RendererRegistry {
    /// Empty registry: every value renders through `Display`
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with [`NumberRenderer`] for numbers and [`StringRenderer`] for strings
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register::<Number>(NumberRenderer);
        registry.register::<String>(StringRenderer);
        registry
    }

    pub fn register<T: ?Sized + 'static>(&mut self, renderer: impl AttributeRenderer + 'static) {
        self.renderers.insert(TypeKey::of::<T>(), Arc::new(renderer));
    }

    pub fn lookup(&self, value: &Value) -> Option<&Arc<dyn AttributeRenderer>> {
        self.renderers.lookup(value)
    }

    /// Render a scalar with the nearest registered renderer, or `Display`
    pub fn render(&self, value: &Value, format: Option<&str>, locale: &Locale) -> Result<String> {
        match self.lookup(value) {
            Some(renderer) => renderer.render(value, format, locale),
            None => Ok(value.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_values_use_display() {
        let registry = RendererRegistry::new();
        let out = registry
            .render(&Value::Int(1234), Some("%,d"), &Locale::root())
            .unwrap();
        assert_eq!(out, "1234");
    }

    #[test]
    fn test_standard_registry_formats_numbers() {
        let registry = RendererRegistry::standard();
        let out = registry
            .render(&Value::Int(1234), Some("%,d"), &Locale::new("de"))
            .unwrap();
        assert_eq!(out, "1.234");
        let out = registry
            .render(&Value::from("abc"), Some("upper"), &Locale::root())
            .unwrap();
        assert_eq!(out, "ABC");
    }

    struct Brackets;

    impl AttributeRenderer for Brackets {
        fn render(&self, value: &Value, _format: Option<&str>, _locale: &Locale) -> Result<String> {
            Ok(format!("[{}]", value))
        }
    }

    #[test]
    fn test_exact_type_beats_number() {
        let mut registry = RendererRegistry::standard();
        registry.register::<i64>(Brackets);
        let out = registry
            .render(&Value::Int(5), Some("%d"), &Locale::root())
            .unwrap();
        assert_eq!(out, "[5]");
        let out = registry
            .render(&Value::Float(1.5), Some("%.2f"), &Locale::root())
            .unwrap();
        assert_eq!(out, "1.50");
    }
}
