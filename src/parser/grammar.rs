//! Template grammar using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::SyntaxError;
use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// One `key[=value]` entry after `;`
#[derive(Debug, Clone)]
enum OptionValue {
    Str(String),
    Int(usize),
    Ident(String),
}

#[derive(Debug, Clone)]
enum Directive {
    Format(String),
    Wrap(Wrap),
    Anchor,
    Separator(String),
}

impl Directive {
    fn key(&self) -> &'static str {
        match self {
            Directive::Format(_) => "format",
            Directive::Wrap(_) => "wrap",
            Directive::Anchor => "anchor",
            Directive::Separator(_) => "separator",
        }
    }
}

fn directive(key: &str, value: Option<OptionValue>) -> Result<Directive, String> {
    match (key, value) {
        ("format", Some(OptionValue::Str(s))) => Ok(Directive::Format(s)),
        ("separator", Some(OptionValue::Str(s))) => Ok(Directive::Separator(s)),
        ("wrap", None) => Ok(Directive::Wrap(Wrap::LineWidth)),
        ("wrap", Some(OptionValue::Int(n))) if n > 0 => Ok(Directive::Wrap(Wrap::Width(n))),
        ("anchor", None) => Ok(Directive::Anchor),
        ("format" | "separator", _) => Err(format!("option '{}' expects a string value", key)),
        ("wrap", _) => Err("option 'wrap' expects a positive width".to_string()),
        ("anchor", Some(_)) => Err("option 'anchor' takes no value".to_string()),
        (other, _) => Err(format!(
            "unknown option '{}'; expected one of: format, wrap, anchor, separator",
            other
        )),
    }
}

/// Parse template text into nodes
pub fn parse(source: &str, delimiters: Delimiters) -> Result<Vec<Spanned<Node>>, Vec<SyntaxError>> {
    let tokens = crate::parser::lexer::lex(source, delimiters).map_err(|e| vec![e])?;
    let len = source.len();

    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    template_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn template_parser<'a, I>(
) -> impl Parser<'a, I, Vec<Spanned<Node>>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let identifier = select! {
        Token::Ident(s) => Identifier::new(s),
    }
    .map_with(|id, e| Spanned::new(id, span_range(&e.span())));

    let string_literal = select! {
        Token::Str(s) => s,
    };

    // Region names exclude `end`, which closes a region block
    let region_name = select! {
        Token::Ident(s) if s != "end" => Identifier::new(s),
    };

    let segment = just(Token::Dot).ignore_then(choice((
        select! { Token::Ident(s) => PathSegment::Property(s) },
        select! { Token::Int(n) => PathSegment::Index(n) },
    )));

    let path = identifier
        .clone()
        .then(segment.repeated().collect::<Vec<_>>())
        .map(|(root, segments)| AttributePath { root, segments });

    let argument = choice((
        string_literal.clone().map(Argument::Literal),
        path.clone().map(Argument::Attribute),
    ));

    // `name(args)` is either a builtin function or a template include
    let call = identifier
        .clone()
        .then(
            argument
                .clone()
                .separated_by(just(Token::Comma))
                .collect::<Vec<_>>()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
        )
        .try_map(|(name, mut args), span| {
            match Function::from_name(name.node.as_str()) {
                Some(func) if args.len() == 1 => Ok(Primary::Function(func, args.remove(0))),
                Some(_) => Err(Rich::custom(
                    span,
                    format!("function '{}' takes exactly one argument", name.node),
                )),
                None => Ok(Primary::Include(Call { name, args })),
            }
        });

    let primary = choice((call, path.clone().map(Primary::Attribute)));

    let option_value = choice((
        string_literal.clone().map(OptionValue::Str),
        select! { Token::Int(n) => OptionValue::Int(n) },
        select! { Token::Ident(s) => OptionValue::Ident(s) },
    ));

    let option = identifier
        .clone()
        .then(just(Token::Equals).ignore_then(option_value).or_not())
        .try_map(|(key, value), span| {
            directive(key.node.as_str(), value).map_err(|msg| Rich::custom(span, msg))
        });

    let options = just(Token::Semi)
        .ignore_then(
            option
                .separated_by(just(Token::Comma))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .try_map(|directives, span| {
            let mut options = Options::default();
            let mut seen: Vec<&'static str> = Vec::new();
            for d in directives {
                if seen.contains(&d.key()) {
                    return Err(Rich::custom(
                        span,
                        format!("option '{}' given more than once", d.key()),
                    ));
                }
                seen.push(d.key());
                match d {
                    Directive::Format(f) => options.format = Some(f),
                    Directive::Wrap(w) => options.wrap = Some(w),
                    Directive::Anchor => options.anchor = true,
                    Directive::Separator(s) => options.separator = Some(s),
                }
            }
            Ok(options)
        });

    let nodes = recursive(|nodes| {
        let literal = select! {
            Token::Text(s) => Node::Literal(s),
        };

        let sub_template = just(Token::BraceOpen)
            .ignore_then(
                select! { Token::Ident(s) => s }
                    .separated_by(just(Token::Comma))
                    .at_least(1)
                    .collect::<Vec<_>>()
                    .then_ignore(just(Token::Pipe))
                    .or_not(),
            )
            .then(nodes.clone())
            .then_ignore(just(Token::BraceClose))
            .try_map(|(params, body), span| {
                let params = params.unwrap_or_default();
                if params.len() > 2 {
                    return Err(Rich::custom(
                        span,
                        "anonymous templates take at most two parameters (element and index)",
                    ));
                }
                Ok(MapTarget::Anonymous(SubTemplate { params, body }))
            });

        let named_target = identifier
            .clone()
            .then_ignore(just(Token::ParenOpen))
            .then_ignore(just(Token::ParenClose))
            .map(|name| MapTarget::Named(name.node));

        let map_target = just(Token::Colon)
            .ignore_then(choice((sub_template, named_target)))
            .map_with(|t, e| Spanned::new(t, span_range(&e.span())));

        let expression = just(Token::Open)
            .ignore_then(primary.clone())
            .then(map_target.repeated().collect::<Vec<_>>())
            .then(options.clone().or_not())
            .then_ignore(just(Token::Close))
            .map(|((primary, maps), options)| {
                Node::Expr(Expr {
                    primary,
                    maps,
                    options: options.unwrap_or_default(),
                })
            });

        // `<@name()>`
        let region_ref = just(Token::Open)
            .ignore_then(just(Token::At))
            .ignore_then(region_name.clone())
            .then_ignore(just(Token::ParenOpen))
            .then_ignore(just(Token::ParenClose))
            .then_ignore(just(Token::Close))
            .map(|name| Node::Region(Region {
                name,
                default: None,
            }));

        // `<@name> default <@end>`
        let region_block = just(Token::Open)
            .ignore_then(just(Token::At))
            .ignore_then(region_name)
            .then_ignore(just(Token::Close))
            .then(nodes.clone())
            .then_ignore(just(Token::Open))
            .then_ignore(just(Token::At))
            .then_ignore(just(Token::Ident("end".to_string())))
            .then_ignore(just(Token::Close))
            .map(|(name, body)| {
                Node::Region(Region {
                    name,
                    default: Some(body),
                })
            });

        choice((literal, region_ref, region_block, expression))
            .map_with(|n, e| Spanned::new(n, span_range(&e.span())))
            .repeated()
            .collect::<Vec<_>>()
            .boxed()
    });

    nodes.then_ignore(end())
}
