//! Parser for group files holding several template declarations
//!
//! ```text
//! delimiters "$", "$"
//!
//! decl(type, name, value) ::= "$type$ $name$$init(value)$;"
//! init(v) ::= <<
//!  = $v$
//! >>
//! @decl.comment() ::= "// generated"
//! ```

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use logos::{Lexer, Logos};

use crate::error::SyntaxError;
use crate::parser::ast::{Delimiters, FormalParam, Span};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum GroupToken {
    #[token("::=")]
    Defines,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("@")]
    At,
    #[token("=")]
    Equals,

    #[token("delimiters")]
    Delimiters,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape_body(lex.slice()))]
    Str(String),

    /// `<<...>>` with one leading and one trailing newline removed
    #[token("<<", big_string)]
    BigString(String),

    /// `<%...%>` with newlines and the indentation after them removed
    #[token("<%", big_string_trimmed)]
    BigStringTrimmed(String),

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/", logos::skip)]
    BlockComment,
}

/// Strip quotes from a group string and resolve `\"`, `\\`, `\n`, `\t` and
/// `\r`. Other escapes are kept for the template lexer, so `\<` stays an
/// escaped delimiter.
fn unescape_body(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn big_string(lex: &mut Lexer<GroupToken>) -> Option<String> {
    let end = lex.remainder().find(">>")?;
    let raw = lex.remainder()[..end].to_string();
    lex.bump(end + 2);

    let body = raw
        .strip_prefix("\r\n")
        .or_else(|| raw.strip_prefix('\n'))
        .unwrap_or(&raw);
    let body = body
        .strip_suffix("\r\n")
        .or_else(|| body.strip_suffix('\n'))
        .unwrap_or(body);
    Some(body.to_string())
}

fn big_string_trimmed(lex: &mut Lexer<GroupToken>) -> Option<String> {
    let end = lex.remainder().find("%>")?;
    let raw = lex.remainder()[..end].to_string();
    lex.bump(end + 2);

    let mut body = String::with_capacity(raw.len());
    let mut lines = raw.lines();
    if let Some(first) = lines.next() {
        body.push_str(first);
    }
    for line in lines {
        body.push_str(line.trim_start());
    }
    Some(body)
}

/// A named template declaration
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDecl {
    pub name: String,
    pub params: Vec<FormalParam>,
    pub body: String,
    pub span: Span,
}

/// `@template.region() ::= body`
#[derive(Debug, Clone, PartialEq)]
pub struct RegionDecl {
    pub template: String,
    pub region: String,
    pub body: String,
    pub span: Span,
}

/// Everything declared in one group source
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupSource {
    pub delimiters: Option<Delimiters>,
    pub templates: Vec<TemplateDecl>,
    pub regions: Vec<RegionDecl>,
}

#[derive(Debug, Clone)]
enum Decl {
    Template(TemplateDecl),
    Region(RegionDecl),
}

/// Lex a group source into tokens with spans
pub fn lex_group(input: &str) -> Result<Vec<(GroupToken, Span)>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut lexer = GroupToken::lexer(input);
    while let Some(tok) = lexer.next() {
        let span = lexer.span();
        match tok {
            Ok(tok) => tokens.push((tok, span)),
            Err(()) => {
                let slice = lexer.slice();
                let message = if slice.starts_with("<<") {
                    "unterminated '<<' block; expected '>>'".to_string()
                } else if slice.starts_with("<%") {
                    "unterminated '<%' block; expected '%>'".to_string()
                } else if slice.starts_with('"') {
                    "unterminated string".to_string()
                } else {
                    format!("unexpected input '{}'", slice)
                };
                return Err(SyntaxError::new(span, message));
            }
        }
    }
    Ok(tokens)
}

/// Parse a group source into its declarations
pub fn parse_group(input: &str) -> Result<GroupSource, Vec<SyntaxError>> {
    let tokens = lex_group(input).map_err(|e| vec![e])?;
    let len = input.len();

    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));
    let token_stream =
        Stream::from_iter(token_iter).map((len..len).into(), |(t, s): (_, _)| (t, s));

    group_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn group_parser<'a, I>() -> impl Parser<'a, I, GroupSource, extra::Err<Rich<'a, GroupToken>>> + Clone
where
    I: ValueInput<'a, Token = GroupToken, Span = SimpleSpan>,
{
    let identifier = select! {
        GroupToken::Ident(s) => s,
    };

    let string_literal = select! {
        GroupToken::Str(s) => s,
    };

    let body = select! {
        GroupToken::Str(s) => s,
        GroupToken::BigString(s) => s,
        GroupToken::BigStringTrimmed(s) => s,
    };

    let delimiters = just(GroupToken::Delimiters)
        .ignore_then(string_literal.clone())
        .then_ignore(just(GroupToken::Comma))
        .then(string_literal.clone())
        .try_map(|(start, stop), span| {
            match (single_char(&start), single_char(&stop)) {
                (Some(start), Some(stop)) => Ok(Delimiters::new(start, stop)),
                _ => Err(Rich::custom(
                    span,
                    "delimiters must be single characters",
                )),
            }
        });

    let param = identifier
        .clone()
        .then(just(GroupToken::Equals).ignore_then(string_literal).or_not())
        .map(|(name, default)| FormalParam { name, default });

    let template_decl = identifier
        .clone()
        .then(
            param
                .separated_by(just(GroupToken::Comma))
                .collect::<Vec<_>>()
                .delimited_by(just(GroupToken::ParenOpen), just(GroupToken::ParenClose)),
        )
        .then_ignore(just(GroupToken::Defines))
        .then(body.clone())
        .try_map(|((name, params), body), span: SimpleSpan| {
            for (idx, p) in params.iter().enumerate() {
                if params[..idx].iter().any(|q| q.name == p.name) {
                    return Err(Rich::custom(
                        span,
                        format!("parameter '{}' declared twice in '{}'", p.name, name),
                    ));
                }
            }
            Ok(Decl::Template(TemplateDecl {
                name,
                params,
                body,
                span: span.into_range(),
            }))
        });

    let region_decl = just(GroupToken::At)
        .ignore_then(identifier.clone())
        .then_ignore(just(GroupToken::Dot))
        .then(identifier)
        .then_ignore(just(GroupToken::ParenOpen))
        .then_ignore(just(GroupToken::ParenClose))
        .then_ignore(just(GroupToken::Defines))
        .then(body)
        .map_with(|((template, region), body), e| {
            Decl::Region(RegionDecl {
                template,
                region,
                body,
                span: span_range(&e.span()),
            })
        });

    delimiters
        .or_not()
        .then(
            choice((template_decl, region_decl))
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then_ignore(end())
        .map(|(delimiters, decls)| {
            let mut source = GroupSource {
                delimiters,
                ..GroupSource::default()
            };
            for decl in decls {
                match decl {
                    Decl::Template(t) => source.templates.push(t),
                    Decl::Region(r) => source.regions.push(r),
                }
            }
            source
        })
}
