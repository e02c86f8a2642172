//! Abstract syntax tree for compiled templates

use std::fmt;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Valid identifier (alphanumeric + underscore, starts with letter/_)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Start and stop characters bracketing expressions in template text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub start: char,
    pub stop: char,
}

impl Delimiters {
    pub fn new(start: char, stop: char) -> Self {
        Self { start, stop }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            start: '<',
            stop: '>',
        }
    }
}

/// A piece of template body
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Verbatim output text
    Literal(String),
    /// `<expr>`
    Expr(Expr),
    /// `<@name()>` or `<@name>default<@end>`
    Region(Region),
}

/// Named insertion point that a group may override
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: Identifier,
    /// Body used when no override is registered; `None` for `<@name()>`
    pub default: Option<Vec<Spanned<Node>>>,
}

/// An expression: a primary value, zero or more map targets, and options
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub primary: Primary,
    pub maps: Vec<Spanned<MapTarget>>,
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primary {
    /// `name.prop.0`
    Attribute(AttributePath),
    /// `tmpl(arg, "text")`
    Include(Call),
    /// `first(list)`
    Function(Function, Argument),
}

/// Attribute name followed by property and index segments
#[derive(Debug, Clone, PartialEq)]
pub struct AttributePath {
    pub root: Spanned<Identifier>,
    pub segments: Vec<PathSegment>,
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root.node)?;
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Property(String),
    Index(usize),
}

impl PathSegment {
    /// The segment as a property name handed to model adaptors
    pub fn as_property(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => write!(f, "{}", name),
            PathSegment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// Template invocation with positional arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: Spanned<Identifier>,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Attribute(AttributePath),
    Literal(String),
}

/// Target of `:` application
#[derive(Debug, Clone, PartialEq)]
pub enum MapTarget {
    /// `{x, i | body}`
    Anonymous(SubTemplate),
    /// `tmpl()`
    Named(Identifier),
}

/// Inline anonymous template
#[derive(Debug, Clone, PartialEq)]
pub struct SubTemplate {
    pub params: Vec<String>,
    pub body: Vec<Spanned<Node>>,
}

/// Options following `;` inside an expression
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Options {
    pub format: Option<String>,
    pub wrap: Option<Wrap>,
    pub anchor: bool,
    pub separator: Option<String>,
}

impl Options {
    pub fn is_empty(&self) -> bool {
        *self == Options::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    /// Bare `wrap`: use the render-time line width
    LineWidth,
    /// `wrap=N`
    Width(usize),
}

/// Formal parameter of a named template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormalParam {
    pub name: String,
    pub default: Option<String>,
}

impl FormalParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }
}

/// Builtin list functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    First,
    Last,
    Rest,
    Trunc,
    Length,
    Reverse,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "first" => Some(Function::First),
            "last" => Some(Function::Last),
            "rest" => Some(Function::Rest),
            "trunc" => Some(Function::Trunc),
            "length" => Some(Function::Length),
            "reverse" => Some(Function::Reverse),
            _ => None,
        }
    }
}
