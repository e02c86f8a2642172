//! Template instances: a compiled template plus the attributes bound for one render
//!
//! # Example
//!
//! ```
//! use textplate::Template;
//!
//! let mut hello = Template::new("Hello, <name>").unwrap();
//! hello.add("name", "World").unwrap();
//! assert_eq!(hello.render().unwrap(), "Hello, World");
//! ```

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::group::{default_group, TemplateGroup, ANONYMOUS_TEMPLATE};
use crate::interp::Interpreter;
use crate::locale::Locale;
use crate::model::{parse_aggregate_spec, AttributeStore, Value};
use crate::parser::{compile, CompiledTemplate, Delimiters};
use crate::renderer::RenderConfig;

/// One instantiation of a compiled template
///
/// Instances are cheap: the compiled template is shared, only the attribute
/// store belongs to the instance. Rendering never modifies the store, so an
/// instance can be rebound and rendered again after a failure.
#[derive(Debug, Clone)]
pub struct Template<'g> {
    group: &'g TemplateGroup,
    compiled: Arc<CompiledTemplate>,
    attributes: AttributeStore,
}

impl Template<'static> {
    /// Compile standalone template text with the default `<` `>` delimiters
    pub fn new(source: &str) -> Result<Self> {
        Self::compile_standalone(source, Delimiters::default())
    }

    /// Compile standalone template text with custom delimiters
    pub fn with_delimiters(source: &str, start: char, stop: char) -> Result<Self> {
        Self::compile_standalone(source, Delimiters::new(start, stop))
    }

    fn compile_standalone(source: &str, delimiters: Delimiters) -> Result<Self> {
        let compiled = compile(ANONYMOUS_TEMPLATE, source, None, delimiters)?;
        Ok(Self::from_compiled(default_group(), Arc::new(compiled)))
    }
}

impl<'g> Template<'g> {
    pub(crate) fn from_compiled(group: &'g TemplateGroup, compiled: Arc<CompiledTemplate>) -> Self {
        Self {
            group,
            compiled,
            attributes: AttributeStore::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.compiled.name
    }

    pub fn compiled(&self) -> &Arc<CompiledTemplate> {
        &self.compiled
    }

    pub fn group(&self) -> &'g TemplateGroup {
        self.group
    }

    /// Bind `value` under `name`, promoting an existing binding to a list
    pub fn add(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.check_parameter(name)?;
        self.attributes.add(name, value);
        Ok(self)
    }

    /// Bind `value` under `name`, replacing any existing binding
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.check_parameter(name)?;
        self.attributes.set(name, value);
        Ok(self)
    }

    /// Append an aggregate built from `spec` (`items.{a, b}`) and `values`
    pub fn add_aggregate<I, V>(&mut self, spec: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let (name, _) = parse_aggregate_spec(spec)?;
        self.check_parameter(&name)?;
        self.attributes.add_aggregate(spec, values)?;
        Ok(self)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Render with the root locale and no default line width
    pub fn render(&self) -> Result<String> {
        self.render_with(&RenderConfig::default())
    }

    /// Render with `locale` handed to attribute renderers
    pub fn render_locale(&self, locale: &Locale) -> Result<String> {
        self.render_with(&RenderConfig::new().with_locale(locale.clone()))
    }

    pub fn render_with(&self, config: &RenderConfig) -> Result<String> {
        Interpreter::new(self.group, config).render(&self.compiled, &self.attributes)
    }

    fn check_parameter(&self, name: &str) -> Result<()> {
        if self.compiled.accepts(name) {
            Ok(())
        } else {
            Err(Error::UnknownParameter {
                template: self.compiled.name.clone(),
                name: name.to_string(),
            })
        }
    }
}
