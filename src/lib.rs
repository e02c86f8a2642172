//! textplate - A text template engine
//!
//! Templates mix literal text with `<expression>`s. They are compiled once,
//! grouped into a [`TemplateGroup`], and rendered against attributes bound on
//! a [`Template`] instance. Properties of application objects are resolved by
//! pluggable [`ModelAdaptor`]s and values are formatted by pluggable,
//! locale-aware [`AttributeRenderer`]s.
//!
//! # Example
//!
//! ```rust
//! use textplate::{TemplateGroup, Value};
//!
//! let group = TemplateGroup::from_source(r#"
//! decl(type, name, value) ::= "<type> <name><init(value)>;"
//! init(v) ::= " = <v>"
//! "#).unwrap();
//!
//! let mut decl = group.instance_of("decl").unwrap();
//! decl.add("type", "int").unwrap();
//! decl.add("name", "x").unwrap();
//! decl.add("value", 0).unwrap();
//! assert_eq!(decl.render().unwrap(), "int x = 0;");
//!
//! let mut list = group.inline("<xs; separator=\", \">").unwrap();
//! list.add("xs", Value::list([1, 2, 3])).unwrap();
//! assert_eq!(list.render().unwrap(), "1, 2, 3");
//! ```

pub mod error;
pub mod group;
mod interp;
pub mod locale;
pub mod model;
pub mod parser;
pub mod renderer;
pub mod template;

pub use error::{Error, Result, SyntaxError};
pub use group::{GroupConfig, TemplateGroup};
pub use locale::{Locale, LocaleCatalog, LocaleError};
pub use model::{Aggregate, Model, ModelAdaptor, ObjectModelAdaptor, TypeKey, Value};
pub use parser::{ast, CompiledTemplate};
pub use renderer::{AttributeRenderer, NumberRenderer, RenderConfig, StringRenderer};
pub use template::Template;

/// Compile `template`, bind `values` as `%1`, `%2`, ... and render it with
/// `line_width` as the width for bare `wrap` options
///
/// # Example
///
/// ```rust
/// use textplate::Value;
///
/// let out = textplate::format(
///     30,
///     "int <%1>[] = { <%2; wrap, anchor, separator=\", \"> };",
///     [Value::from("a"), Value::list([3, 9, 20, 2, 1, 4, 6, 32, 5, 6, 77, 888])],
/// )
/// .unwrap();
/// assert_eq!(
///     out,
///     "int a[] = { 3, 9, 20, 2, 1, 4,\n            6, 32, 5, 6, 77,\n            888 };"
/// );
/// ```
pub fn format<I, V>(line_width: usize, template: &str, values: I) -> Result<String>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let mut instance = Template::new(template)?;
    for (idx, value) in values.into_iter().enumerate() {
        instance.set(&format!("%{}", idx + 1), value)?;
    }
    instance.render_with(&RenderConfig::new().with_line_width(line_width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_binds_positional_values() {
        let out = format(80, "<%1>-<%2>", ["a", "b"]).unwrap();
        assert_eq!(out, "a-b");
    }

    #[test]
    fn test_format_propagates_syntax_errors() {
        let err = format(80, "<%1", ["a"]).unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }
}
