//! Template compiler: lexing, parsing and the compiled representation

pub mod ast;
mod grammar;
pub mod group;
pub mod lexer;

pub use ast::*;
pub use grammar::parse;
pub use group::{parse_group, GroupSource, RegionDecl, TemplateDecl};

use crate::error::{Error, Result};

/// An immutable, parsed template ready for evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    pub name: String,
    /// Declared formal parameters; `None` for ad-hoc templates that accept any attribute
    pub params: Option<Vec<FormalParam>>,
    pub nodes: Vec<Spanned<Node>>,
    pub delimiters: Delimiters,
    pub source: String,
}

impl CompiledTemplate {
    /// Whether an attribute named `name` may be bound on an instance
    pub fn accepts(&self, name: &str) -> bool {
        match &self.params {
            Some(params) => params.iter().any(|p| p.name == name),
            None => true,
        }
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params
            .iter()
            .flatten()
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Names of all regions declared anywhere in the template body
    pub fn regions(&self) -> Vec<&str> {
        fn walk<'n>(nodes: &'n [Spanned<Node>], out: &mut Vec<&'n str>) {
            for node in nodes {
                match &node.node {
                    Node::Region(region) => {
                        out.push(region.name.as_str());
                        if let Some(default) = &region.default {
                            walk(default, out);
                        }
                    }
                    Node::Expr(expr) => {
                        for target in &expr.maps {
                            if let MapTarget::Anonymous(sub) = &target.node {
                                walk(&sub.body, out);
                            }
                        }
                    }
                    Node::Literal(_) => {}
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }
}

/// Compile template source text
pub fn compile(
    name: impl Into<String>,
    source: &str,
    params: Option<Vec<FormalParam>>,
    delimiters: Delimiters,
) -> Result<CompiledTemplate> {
    let name = name.into();
    let nodes = parse(source, delimiters).map_err(|errors| Error::syntax(name.clone(), errors))?;
    tracing::debug!(template = %name, nodes = nodes.len(), "compiled template");

    Ok(CompiledTemplate {
        name,
        params,
        nodes,
        delimiters,
        source: source.to_string(),
    })
}
