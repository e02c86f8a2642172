//! Template evaluation
//!
//! The interpreter walks a compiled template against an attribute store.
//! Attribute lookups are dynamically scoped: an included template or an
//! anonymous sub-template sees its own bindings first, then those of every
//! enclosing template. Nested templates write into a fork of the caller's
//! output taken where their text lands, so indentation, wrapping and anchors
//! inside them see real output columns.

mod writer;

use crate::error::{Error, Result};
use crate::group::TemplateGroup;
use crate::model::{AttributeStore, Value};
use crate::parser::{
    Argument, AttributePath, Call, CompiledTemplate, Expr, Function, MapTarget, Node,
    PathSegment, Primary, Region, Spanned, Wrap,
};
use crate::renderer::RenderConfig;

use writer::{Layout, OutputWriter};

/// Attribute bound to the element while applying a template without parameters
const IMPLICIT_ELEMENT: &str = "it";

/// One level of attribute bindings
struct Scope<'a> {
    attributes: &'a AttributeStore,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    fn lookup(&self, name: &str) -> Option<&'a Value> {
        match self.attributes.get(name) {
            Some(value) => Some(value),
            None => self.parent.and_then(|parent| parent.lookup(name)),
        }
    }
}

/// Evaluation state for the template currently executing
#[derive(Clone, Copy)]
struct Frame<'a> {
    /// Template whose regions are being filled
    template: &'a CompiledTemplate,
    scope: &'a Scope<'a>,
    depth: usize,
}

/// Intermediate result of an expression before it is written
///
/// Template invocations stay unevaluated until written so they render at
/// their final position. Their output is never passed through a renderer.
#[derive(Clone)]
enum Item<'e> {
    Value(Value),
    Include(&'e Call),
    Apply {
        target: &'e MapTarget,
        element: Value,
        idx: usize,
    },
}

#[derive(Clone)]
enum Resolved<'e> {
    One(Item<'e>),
    Many(Vec<Item<'e>>),
}

impl From<Value> for Resolved<'_> {
    fn from(value: Value) -> Self {
        match value {
            Value::List(items) => Resolved::Many(items.into_iter().map(Item::Value).collect()),
            other => Resolved::One(Item::Value(other)),
        }
    }
}

/// Renders compiled templates of one group
pub(crate) struct Interpreter<'a> {
    group: &'a TemplateGroup,
    config: &'a RenderConfig,
}

impl<'a> Interpreter<'a> {
    pub fn new(group: &'a TemplateGroup, config: &'a RenderConfig) -> Self {
        Self { group, config }
    }

    /// Render `template` with `attributes`; on failure nothing is returned
    pub fn render(&self, template: &CompiledTemplate, attributes: &AttributeStore) -> Result<String> {
        let scope = Scope {
            attributes,
            parent: None,
        };
        let frame = Frame {
            template,
            scope: &scope,
            depth: 0,
        };
        let mut out = OutputWriter::new();
        self.exec(&template.nodes, frame, &mut out)?;
        Ok(out.finish())
    }

    fn exec(&self, nodes: &[Spanned<Node>], frame: Frame<'_>, out: &mut OutputWriter) -> Result<()> {
        for node in nodes {
            match &node.node {
                Node::Literal(text) => out.write(text),
                Node::Expr(expr) => self.exec_expr(expr, frame, out)?,
                Node::Region(region) => self.exec_region(region, frame, out)?,
            }
        }
        Ok(())
    }

    /// Region bodies count as one nesting level, so an override that refers
    /// to its own region stops at the recursion limit
    fn exec_region(&self, region: &Region, frame: Frame<'_>, out: &mut OutputWriter) -> Result<()> {
        let name = region.name.as_str();
        let replacement = self.group.region_override(&frame.template.name, name);
        let nodes = match (&replacement, &region.default) {
            (Some(body), _) => {
                tracing::debug!(template = %frame.template.name, region = name, "using region override");
                body.nodes.as_slice()
            }
            (None, Some(nodes)) => nodes.as_slice(),
            (None, None) => return Ok(()),
        };

        let depth = self.descend(frame, || format!("{}.{}", frame.template.name, name))?;
        self.exec(nodes, Frame { depth, ..frame }, out)
    }

    fn exec_expr(&self, expr: &Expr, frame: Frame<'_>, out: &mut OutputWriter) -> Result<()> {
        let mut resolved = self.eval_primary(&expr.primary, frame)?;
        for target in &expr.maps {
            resolved = self.apply(&target.node, resolved, frame)?;
        }

        let mut elements = Vec::new();
        match resolved {
            Resolved::One(item) => flatten(item, &mut elements),
            Resolved::Many(items) => {
                for item in items {
                    flatten(item, &mut elements);
                }
            }
        }

        let wrap = match expr.options.wrap {
            Some(Wrap::Width(width)) => Some(width),
            Some(Wrap::LineWidth) => self.config.line_width,
            None => None,
        };
        let layout = Layout {
            separator: expr.options.separator.as_deref().unwrap_or(""),
            wrap,
        };
        let format = expr.options.format.as_deref();

        out.begin_expression(expr.options.anchor);
        let written = out.write_elements(elements.len(), layout, |idx, element_out| {
            self.write_item(&elements[idx], format, frame, element_out)
        });
        out.end_expression();
        written
    }

    /// Write one element: values through the renderers, templates in place
    fn write_item(
        &self,
        item: &Item<'_>,
        format: Option<&str>,
        frame: Frame<'_>,
        out: &mut OutputWriter,
    ) -> Result<()> {
        match item {
            Item::Value(value) => {
                let text = self
                    .group
                    .renderers()
                    .render(value, format, &self.config.locale)?;
                out.write(&text);
                Ok(())
            }
            Item::Include(call) => self.include(call, frame, out),
            Item::Apply {
                target,
                element,
                idx,
            } => self.apply_one(target, element.clone(), *idx, frame, out),
        }
    }

    /// Evaluate an item to a value, rendering template output on its own
    fn force(&self, item: Item<'_>, frame: Frame<'_>) -> Result<Value> {
        match item {
            Item::Value(value) => Ok(value),
            template => {
                let mut out = OutputWriter::new();
                self.write_item(&template, None, frame, &mut out)?;
                Ok(Value::Str(out.finish()))
            }
        }
    }

    fn eval_primary<'e>(&self, primary: &'e Primary, frame: Frame<'_>) -> Result<Resolved<'e>> {
        match primary {
            Primary::Attribute(path) => Ok(self.resolve_path(path, frame)?.into()),
            Primary::Include(call) => Ok(Resolved::One(Item::Include(call))),
            Primary::Function(function, argument) => {
                let value = self.eval_argument(argument, frame)?;
                Ok(call_function(*function, value.into()))
            }
        }
    }

    fn eval_argument(&self, argument: &Argument, frame: Frame<'_>) -> Result<Value> {
        match argument {
            Argument::Attribute(path) => self.resolve_path(path, frame),
            Argument::Literal(text) => Ok(Value::Str(text.clone())),
        }
    }

    fn resolve_path(&self, path: &AttributePath, frame: Frame<'_>) -> Result<Value> {
        let root = path.root.node.as_str();
        let mut value = frame
            .scope
            .lookup(root)
            .cloned()
            .ok_or_else(|| Error::no_such_attribute(root))?;
        for segment in &path.segments {
            value = self.property(value, segment)?;
        }
        Ok(value)
    }

    /// One path step; a property step through a list maps over its elements
    fn property(&self, value: Value, segment: &PathSegment) -> Result<Value> {
        match (value, segment) {
            (Value::List(items), PathSegment::Index(idx)) => items
                .get(*idx)
                .cloned()
                .ok_or_else(|| Error::no_such_property("list", idx.to_string())),
            (Value::List(items), PathSegment::Property(_)) => items
                .into_iter()
                .map(|item| self.property(item, segment))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            (value, segment) => self
                .group
                .adaptors()
                .get_property(&value, &segment.as_property()),
        }
    }

    /// Render a named template with positional arguments
    fn include(&self, call: &Call, frame: Frame<'_>, out: &mut OutputWriter) -> Result<()> {
        let name = call.name.node.as_str();
        let callee = self.group.compiled(name)?;
        let params = callee.params.as_deref().unwrap_or(&[]);

        let mut bindings = AttributeStore::new();
        if !call.args.is_empty() {
            let required = params.iter().filter(|p| p.default.is_none()).count();
            if call.args.len() > params.len() || call.args.len() < required {
                return Err(Error::ArgumentCount {
                    template: name.to_string(),
                    expected: params.len(),
                    actual: call.args.len(),
                });
            }
            for (param, argument) in params.iter().zip(&call.args) {
                bindings.set(param.name.as_str(), self.eval_argument(argument, frame)?);
            }
        }
        // Without arguments, a caller attribute of the same name wins over the default
        for param in params {
            let Some(default) = &param.default else {
                continue;
            };
            let inherited = call.args.is_empty() && frame.scope.lookup(&param.name).is_some();
            if !bindings.contains(&param.name) && !inherited {
                bindings.set(param.name.as_str(), default.as_str());
            }
        }

        self.render_nested(&callee, &callee.nodes, bindings, frame, out)
    }

    /// Apply a map target to every element, or once to a single value
    ///
    /// Output of an earlier application becomes the element of the next one.
    fn apply<'e>(
        &self,
        target: &'e MapTarget,
        resolved: Resolved<'e>,
        frame: Frame<'_>,
    ) -> Result<Resolved<'e>> {
        match resolved {
            Resolved::One(item) => Ok(Resolved::One(Item::Apply {
                target,
                element: self.force(item, frame)?,
                idx: 0,
            })),
            Resolved::Many(items) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| {
                    Ok(Item::Apply {
                        target,
                        element: self.force(item, frame)?,
                        idx,
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Resolved::Many),
        }
    }

    fn apply_one(
        &self,
        target: &MapTarget,
        element: Value,
        idx: usize,
        frame: Frame<'_>,
        out: &mut OutputWriter,
    ) -> Result<()> {
        let mut bindings = AttributeStore::new();
        bindings.set("i", (idx + 1) as i64);
        bindings.set("i0", idx as i64);

        match target {
            MapTarget::Anonymous(sub) => {
                match sub.params.as_slice() {
                    [] => bindings.set(IMPLICIT_ELEMENT, element),
                    [element_param] => bindings.set(element_param.as_str(), element),
                    [element_param, index_param, ..] => {
                        bindings.set(element_param.as_str(), element);
                        bindings.set(index_param.as_str(), (idx + 1) as i64);
                    }
                }
                self.render_nested(frame.template, &sub.body, bindings, frame, out)
            }
            MapTarget::Named(name) => {
                let callee = self.group.compiled(name.as_str())?;
                let params = callee.params.as_deref().unwrap_or(&[]);
                match params.first() {
                    Some(param) => bindings.set(param.name.as_str(), element),
                    None => bindings.set(IMPLICIT_ELEMENT, element),
                }
                self.render_nested(&callee, &callee.nodes, bindings, frame, out)
            }
        }
    }

    /// Execute `nodes` with `bindings` layered over the caller's scope
    fn render_nested(
        &self,
        template: &CompiledTemplate,
        nodes: &[Spanned<Node>],
        bindings: AttributeStore,
        frame: Frame<'_>,
        out: &mut OutputWriter,
    ) -> Result<()> {
        let depth = self.descend(frame, || template.name.clone())?;
        let scope = Scope {
            attributes: &bindings,
            parent: Some(frame.scope),
        };
        let nested = Frame {
            template,
            scope: &scope,
            depth,
        };
        self.exec(nodes, nested, out)
    }

    /// Depth of the next nesting level, or `RecursionLimit` past the bound
    fn descend(&self, frame: Frame<'_>, template: impl FnOnce() -> String) -> Result<usize> {
        let depth = frame.depth + 1;
        let limit = self.group.config().max_depth;
        if depth > limit {
            return Err(Error::RecursionLimit {
                limit,
                template: template(),
            });
        }
        Ok(depth)
    }
}

fn flatten<'e>(item: Item<'e>, elements: &mut Vec<Item<'e>>) {
    match item {
        Item::Value(Value::List(values)) => {
            for value in values {
                flatten(Item::Value(value), elements);
            }
        }
        other => elements.push(other),
    }
}

fn call_function(function: Function, resolved: Resolved<'_>) -> Resolved<'_> {
    match (function, resolved) {
        (Function::Length, Resolved::Many(items)) => {
            Resolved::One(Item::Value(Value::Int(items.len() as i64)))
        }
        (Function::Length, Resolved::One(_)) => Resolved::One(Item::Value(Value::Int(1))),
        (Function::First, Resolved::Many(mut items)) => {
            if items.is_empty() {
                Resolved::Many(items)
            } else {
                Resolved::One(items.swap_remove(0))
            }
        }
        (Function::Last, Resolved::Many(mut items)) => match items.pop() {
            Some(item) => Resolved::One(item),
            None => Resolved::Many(items),
        },
        (Function::Rest, Resolved::Many(mut items)) => {
            if !items.is_empty() {
                items.remove(0);
            }
            Resolved::Many(items)
        }
        (Function::Trunc, Resolved::Many(mut items)) => {
            items.pop();
            Resolved::Many(items)
        }
        (Function::Reverse, Resolved::Many(mut items)) => {
            items.reverse();
            Resolved::Many(items)
        }
        (Function::First | Function::Last | Function::Reverse, one) => one,
        (Function::Rest | Function::Trunc, Resolved::One(_)) => Resolved::Many(Vec::new()),
    }
}
