//! Template groups
//!
//! A group owns a namespace of named templates loaded from group source text,
//! a group file or a directory, together with the region overrides and the
//! model adaptor and renderer registries used while rendering its templates.
//!
//! # Example
//!
//! ```text
//! // test.stg
//! decl(type, name, value) ::= "<type> <name><init(value)>;"
//! init(v) ::= " = <v>"
//!
//! method(name) ::= <<
//! void <name>() {
//!     <@preamble()>
//! }
//! >>
//!
//! @method.preamble() ::= "log();"
//! ```
//!
//! Declarations are parsed when the group is loaded; each template body is
//! compiled on first lookup and cached for the life of the group.

mod config;

pub use config::GroupConfig;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::{Lazy, OnceCell};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::model::{ModelAdaptor, ModelAdaptorRegistry};
use crate::parser::{compile, parse_group, CompiledTemplate, Delimiters, FormalParam, GroupSource, RegionDecl};
use crate::renderer::{AttributeRenderer, RendererRegistry};
use crate::template::Template;

/// Extension of multi-template group files inside directory groups
const GROUP_FILE_EXTENSION: &str = "stg";

/// Name given to templates compiled from ad-hoc source
pub const ANONYMOUS_TEMPLATE: &str = "anonymous";

static DEFAULT_GROUP: Lazy<TemplateGroup> = Lazy::new(TemplateGroup::new);

/// The group backing standalone templates
pub(crate) fn default_group() -> &'static TemplateGroup {
    &DEFAULT_GROUP
}

/// A declared template and its lazily compiled form
#[derive(Debug)]
struct TemplateEntry {
    params: Vec<FormalParam>,
    body: String,
    delimiters: Delimiters,
    origin: Option<PathBuf>,
    compiled: OnceCell<Arc<CompiledTemplate>>,
}

/// A named collection of templates sharing adaptors, renderers and region overrides
///
/// Registries are configured through `&mut self` before the group is shared;
/// once it is behind a reference only region overrides can still change.
#[derive(Debug)]
pub struct TemplateGroup {
    config: GroupConfig,
    templates: HashMap<String, TemplateEntry>,
    regions: RwLock<HashMap<(String, String), Arc<CompiledTemplate>>>,
    adaptors: ModelAdaptorRegistry,
    renderers: RendererRegistry,
}

impl Default for TemplateGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateGroup {
    /// Create an empty group with the default configuration
    pub fn new() -> Self {
        Self::with_config(GroupConfig::default())
    }

    /// Create an empty group
    pub fn with_config(config: GroupConfig) -> Self {
        Self {
            config,
            templates: HashMap::new(),
            regions: RwLock::new(HashMap::new()),
            adaptors: ModelAdaptorRegistry::default(),
            renderers: RendererRegistry::new(),
        }
    }

    /// Seed the number and string renderers
    pub fn with_standard_renderers(mut self) -> Self {
        self.renderers = RendererRegistry::standard();
        self
    }

    /// Build a group from group source text
    pub fn from_source(source: &str) -> Result<Self> {
        let mut group = Self::new();
        group.load_source(source)?;
        Ok(group)
    }

    /// Build a group from a group file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut group = Self::new();
        group.load_file(path)?;
        Ok(group)
    }

    /// Build a group from a directory of template files
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut group = Self::new();
        group.load_dir(dir)?;
        Ok(group)
    }

    /// Add the declarations of group source text
    pub fn load_source(&mut self, source: &str) -> Result<()> {
        let parsed = parse_group(source).map_err(|errors| Error::syntax("<group>", errors))?;
        let regions = self.ingest(parsed, None)?;
        self.install_regions(regions)?;
        tracing::debug!(templates = self.templates.len(), "loaded group source");
        self.finish_load()
    }

    /// Add the declarations of a group file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let parsed = read_group_file(path)?;
        let regions = self.ingest(parsed, Some(path))?;
        self.install_regions(regions)?;
        tracing::debug!(path = %path.display(), templates = self.templates.len(), "loaded group file");
        self.finish_load()
    }

    /// Add every template file directly inside `dir`
    ///
    /// Each `*.st` file (see [`GroupConfig::template_extension`]) must declare a
    /// template named after the file stem; `*.stg` files are loaded as group
    /// files. Region overrides are applied after all files are read, so they
    /// may refer to templates from any file.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let metadata = std::fs::metadata(dir).map_err(|e| Error::io(dir, e))?;
        if !metadata.is_dir() {
            return Err(Error::load(dir, "not a directory"));
        }

        let mut regions = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| Error::load(dir, e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let extension = path.extension().and_then(|e| e.to_str());
            if extension == Some(self.config.template_extension.as_str()) {
                let parsed = read_group_file(path)?;
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                if !parsed.templates.iter().any(|t| t.name == stem) {
                    return Err(Error::load(
                        path,
                        format!("expected a declaration of template '{}'", stem),
                    ));
                }
                regions.extend(self.ingest(parsed, Some(path))?);
            } else if extension == Some(GROUP_FILE_EXTENSION) {
                let parsed = read_group_file(path)?;
                regions.extend(self.ingest(parsed, Some(path))?);
            } else {
                tracing::trace!(path = %path.display(), "skipping non-template file");
            }
        }

        self.install_regions(regions)?;
        tracing::debug!(dir = %dir.display(), templates = self.templates.len(), "loaded template directory");
        self.finish_load()
    }

    /// Declare a template programmatically
    pub fn define_template(
        &mut self,
        name: impl Into<String>,
        params: Vec<FormalParam>,
        body: impl Into<String>,
    ) -> Result<()> {
        let delimiters = self.config.delimiters;
        self.insert(name.into(), params, body.into(), delimiters, None)
    }

    /// Register a model adaptor for values of type `T` and its subtypes
    pub fn register_model_adaptor<T: ?Sized + 'static>(
        &mut self,
        adaptor: impl ModelAdaptor + 'static,
    ) {
        self.adaptors.register::<T>(adaptor);
    }

    /// Register a renderer for values of type `T` and its subtypes
    pub fn register_renderer<T: ?Sized + 'static>(
        &mut self,
        renderer: impl AttributeRenderer + 'static,
    ) {
        self.renderers.register::<T>(renderer);
    }

    /// Replace the body of `region` inside `template` for all later renders
    ///
    /// The body is compiled with the owning template's delimiters and sees the
    /// owning template's attributes.
    pub fn register_region_override(&self, template: &str, region: &str, body: &str) -> Result<()> {
        self.install_region(template, region, body, None)
    }

    /// Region override registered for `(template, region)`
    pub fn region_override(&self, template: &str, region: &str) -> Option<Arc<CompiledTemplate>> {
        self.regions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(template.to_string(), region.to_string()))
            .cloned()
    }

    /// A fresh instance of the named template with no attributes bound
    pub fn instance_of(&self, name: &str) -> Result<Template<'_>> {
        Ok(Template::from_compiled(self, self.compiled(name)?))
    }

    /// Compile ad-hoc template text against this group
    ///
    /// The result accepts any attribute and may include the group's templates.
    pub fn inline(&self, source: &str) -> Result<Template<'_>> {
        let compiled = compile(ANONYMOUS_TEMPLATE, source, None, self.config.delimiters)?;
        Ok(Template::from_compiled(self, Arc::new(compiled)))
    }

    /// The compiled form of `name`, compiling it on first use
    ///
    /// Concurrent first lookups compile once; the others wait for the result.
    pub fn compiled(&self, name: &str) -> Result<Arc<CompiledTemplate>> {
        let entry = self
            .templates
            .get(name)
            .ok_or_else(|| Error::no_such_template(name))?;

        entry
            .compiled
            .get_or_try_init(|| {
                let label = match &entry.origin {
                    Some(path) => format!("{} ({})", name, path.display()),
                    None => name.to_string(),
                };
                tracing::debug!(template = %label, "compiling template");
                compile(name, &entry.body, Some(entry.params.clone()), entry.delimiters)
                    .map(Arc::new)
            })
            .cloned()
    }

    /// Compile every declared template, reporting the first failure
    pub fn compile_all(&self) -> Result<()> {
        for name in self.template_names() {
            self.compiled(name)?;
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Declared template names in sorted order
    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    pub fn adaptors(&self) -> &ModelAdaptorRegistry {
        &self.adaptors
    }

    pub fn renderers(&self) -> &RendererRegistry {
        &self.renderers
    }

    fn insert(
        &mut self,
        name: String,
        params: Vec<FormalParam>,
        body: String,
        delimiters: Delimiters,
        origin: Option<&Path>,
    ) -> Result<()> {
        if self.templates.contains_key(&name) {
            return Err(Error::DuplicateTemplate { name });
        }
        self.templates.insert(
            name,
            TemplateEntry {
                params,
                body,
                delimiters,
                origin: origin.map(Path::to_path_buf),
                compiled: OnceCell::new(),
            },
        );
        Ok(())
    }

    /// Register the templates of a parsed source; returns its region declarations
    fn ingest(
        &mut self,
        parsed: GroupSource,
        origin: Option<&Path>,
    ) -> Result<Vec<(Delimiters, RegionDecl)>> {
        let delimiters = parsed.delimiters.unwrap_or(self.config.delimiters);
        for decl in parsed.templates {
            self.insert(decl.name, decl.params, decl.body, delimiters, origin)?;
        }
        Ok(parsed
            .regions
            .into_iter()
            .map(|region| (delimiters, region))
            .collect())
    }

    fn install_regions(&self, regions: Vec<(Delimiters, RegionDecl)>) -> Result<()> {
        for (delimiters, decl) in regions {
            self.install_region(&decl.template, &decl.region, &decl.body, Some(delimiters))?;
        }
        Ok(())
    }

    fn install_region(
        &self,
        template: &str,
        region: &str,
        body: &str,
        delimiters: Option<Delimiters>,
    ) -> Result<()> {
        let owner = self.compiled(template)?;
        if !owner.regions().contains(&region) {
            return Err(Error::NoSuchRegion {
                template: template.to_string(),
                region: region.to_string(),
            });
        }

        let name = format!("{}.{}", template, region);
        let delimiters = delimiters.unwrap_or(owner.delimiters);
        let compiled = compile(name, body, None, delimiters)?;
        self.regions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((template.to_string(), region.to_string()), Arc::new(compiled));
        tracing::debug!(template, region, "registered region override");
        Ok(())
    }

    fn finish_load(&self) -> Result<()> {
        if self.config.eager_compile {
            self.compile_all()?;
        }
        Ok(())
    }
}

fn read_group_file(path: &Path) -> Result<GroupSource> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_group(&text).map_err(|errors| Error::syntax(path.display().to_string(), errors))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
decl(type, name, value) ::= "<type> <name><init(value)>;"
init(v) ::= " = <v>"
"#;

    #[test]
    fn test_load_source_declares_templates() {
        let group = TemplateGroup::from_source(SOURCE).unwrap();
        assert_eq!(group.template_names(), vec!["decl", "init"]);
        assert_eq!(group.len(), 2);
        assert!(group.contains("init"));
    }

    #[test]
    fn test_unknown_template() {
        let group = TemplateGroup::from_source(SOURCE).unwrap();
        match group.instance_of("nope") {
            Err(Error::NoSuchTemplate { name }) => assert_eq!(name, "nope"),
            other => panic!("Expected NoSuchTemplate, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_duplicate_template() {
        let err = TemplateGroup::from_source("a() ::= \"x\"\na() ::= \"y\"").unwrap_err();
        assert!(matches!(err, Error::DuplicateTemplate { name } if name == "a"));
    }

    #[test]
    fn test_compilation_is_memoized() {
        let group = TemplateGroup::from_source(SOURCE).unwrap();
        let first = group.compiled("decl").unwrap();
        let second = group.compiled("decl").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.param_names(), vec!["type", "name", "value"]);
    }

    #[test]
    fn test_body_errors_surface_on_lookup() {
        let group = TemplateGroup::from_source("bad() ::= \"<oops\"").unwrap();
        let err = group.compiled("bad").unwrap_err();
        assert!(!err.syntax_errors().is_empty());
    }

    #[test]
    fn test_eager_compile_fails_load() {
        let mut group = TemplateGroup::with_config(GroupConfig::new().with_eager_compile(true));
        let err = group.load_source("bad() ::= \"<oops\"").unwrap_err();
        assert!(matches!(err, Error::Syntax { template, .. } if template == "bad"));
    }

    #[test]
    fn test_region_override_requires_declared_region() {
        let group = TemplateGroup::from_source("m() ::= \"a<@body()>b\"").unwrap();
        group.register_region_override("m", "body", "x").unwrap();
        assert!(group.region_override("m", "body").is_some());

        let err = group.register_region_override("m", "other", "x").unwrap_err();
        assert!(matches!(err, Error::NoSuchRegion { .. }));
        let err = group.register_region_override("z", "body", "x").unwrap_err();
        assert!(matches!(err, Error::NoSuchTemplate { .. }));
    }

    #[test]
    fn test_region_declared_in_source() {
        let group =
            TemplateGroup::from_source("m() ::= \"a<@body()>b\"\n@m.body() ::= \"x\"").unwrap();
        let body = group.region_override("m", "body").unwrap();
        assert_eq!(body.name, "m.body");
    }

    #[test]
    fn test_group_delimiters_apply_to_templates() {
        let group = TemplateGroup::from_source("delimiters \"$\", \"$\"\nt(x) ::= \"<$x$>\"").unwrap();
        let compiled = group.compiled("t").unwrap();
        assert_eq!(compiled.delimiters, Delimiters::new('$', '$'));
    }

    #[test]
    fn test_escaped_delimiter_in_group_string() {
        let group = TemplateGroup::from_source(r#"t() ::= "a \<b> c""#).unwrap();
        let t = group.instance_of("t").unwrap();
        assert_eq!(t.render().unwrap(), "a <b> c");
    }

    #[test]
    fn test_define_template() {
        let mut group = TemplateGroup::new();
        group
            .define_template("t", vec![FormalParam::new("x")], "[<x>]")
            .unwrap();
        assert!(group.contains("t"));
        assert!(group.define_template("t", vec![], "").is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TemplateGroup::from_file("/definitely/not/here.stg").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
