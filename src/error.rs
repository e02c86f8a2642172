//! Error types for compiling and rendering templates

use std::path::PathBuf;

use ariadne::{Color, Label, Report, ReportKind, Source};
use chumsky::error::{Rich, RichPattern, RichReason};
use thiserror::Error;

use crate::parser::group::GroupToken;
use crate::parser::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// A malformed template or group source, reported at compile time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("syntax error at {}: {message}", span.start)]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl SyntaxError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self::Syntax {
            span,
            message: message.into(),
            expected: Vec::new(),
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            SyntaxError::Syntax { span, .. } => span,
        }
    }

    /// Byte offset of the offending input
    pub fn position(&self) -> usize {
        self.span().start
    }

    pub fn message(&self) -> &str {
        match self {
            SyntaxError::Syntax { message, .. } => message,
        }
    }

    pub fn expected(&self) -> &[String] {
        match self {
            SyntaxError::Syntax { expected, .. } => expected,
        }
    }

    /// 1-based line and column of the error within `source`
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let offset = self.position().min(source.len());
        let before = source.get(..offset).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(idx) => before[idx + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, column)
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        let (span, message, expected) = match self {
            SyntaxError::Syntax {
                span,
                message,
                expected,
            } => (span, message, expected),
        };
        let expected_str = if expected.is_empty() {
            String::new()
        } else {
            format!("\nExpected: {}", expected.join(", "))
        };

        let report = Report::build(ReportKind::Error, filename, span.start)
            .with_message(message)
            .with_label(
                Label::new((filename, span.clone()))
                    .with_message(format!("{}{}", message, expected_str))
                    .with_color(Color::Red),
            )
            .finish();

        match report.write((filename, Source::from(source)), &mut buf) {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Convert a chumsky error into a [`SyntaxError`], describing tokens with `describe`
fn from_rich<T>(err: Rich<'_, T>, describe: fn(&T) -> String) -> SyntaxError {
    let message = match err.reason() {
        RichReason::ExpectedFound { found, .. } => match found {
            Some(tok) => format!("unexpected {}", describe(tok)),
            None => "unexpected end of input".to_string(),
        },
        RichReason::Custom(msg) => msg.to_string(),
        #[allow(unreachable_patterns)]
        _ => "invalid syntax".to_string(),
    };

    let expected: Vec<String> = err
        .expected()
        .filter_map(|e| match e {
            RichPattern::Token(tok) => Some(describe(tok)),
            RichPattern::Label(label) => Some(label.to_string()),
            RichPattern::EndOfInput => Some("end of input".to_string()),
            RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
            RichPattern::Any => Some("any token".to_string()),
            RichPattern::SomethingElse => None,
            #[allow(unreachable_patterns)]
            _ => None,
        })
        .collect();

    SyntaxError::Syntax {
        span: err.span().into_range(),
        message,
        expected,
    }
}

impl<'a> From<Rich<'a, Token>> for SyntaxError {
    fn from(err: Rich<'a, Token>) -> Self {
        from_rich(err, format_token)
    }
}

impl<'a> From<Rich<'a, GroupToken>> for SyntaxError {
    fn from(err: Rich<'a, GroupToken>) -> Self {
        from_rich(err, format_group_token)
    }
}

/// Format a template token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Text(s) => format!("text {:?}", s),
        Token::Open => "start of expression".to_string(),
        Token::Close => "end of expression".to_string(),
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::Str(s) => format!("string \"{}\"", s),
        Token::Int(n) => format!("integer {}", n),
        Token::Dot => "'.'".to_string(),
        Token::Colon => "':'".to_string(),
        Token::Semi => "';'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Equals => "'='".to_string(),
        Token::Pipe => "'|'".to_string(),
        Token::At => "'@'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::BraceOpen => "'{'".to_string(),
        Token::BraceClose => "'}'".to_string(),
    }
}

fn format_group_token(tok: &GroupToken) -> String {
    match tok {
        GroupToken::Defines => "'::='".to_string(),
        GroupToken::Delimiters => "keyword 'delimiters'".to_string(),
        GroupToken::Ident(s) => format!("identifier '{}'", s),
        GroupToken::Str(s) => format!("string \"{}\"", s),
        GroupToken::BigString(_) => "'<<' block".to_string(),
        GroupToken::BigStringTrimmed(_) => "'<%' block".to_string(),
        _ => format!("{:?}", tok),
    }
}

/// Errors raised while loading groups, binding attributes or rendering
#[derive(Error, Debug)]
pub enum Error {
    /// Template source failed to compile
    #[error("template '{template}' has syntax errors: {}", format_syntax_errors(.errors))]
    Syntax {
        template: String,
        errors: Vec<SyntaxError>,
    },

    #[error("no such template '{name}'")]
    NoSuchTemplate { name: String },

    #[error("template '{template}' has no region '{region}'")]
    NoSuchRegion { template: String, region: String },

    #[error("no such attribute '{name}'")]
    NoSuchAttribute { name: String },

    #[error("no such property '{property}' on {owner_type}")]
    NoSuchProperty {
        owner_type: String,
        property: String,
    },

    /// Aggregate field spec and value count disagree
    #[error("aggregate expects {expected} values but {actual} were given")]
    AggregateArity { expected: usize, actual: usize },

    #[error("invalid aggregate spec '{spec}': {reason}")]
    InvalidAggregateSpec { spec: String, reason: String },

    #[error("cannot render {value_type} with format '{format}': {reason}")]
    Render {
        format: String,
        value_type: String,
        reason: String,
    },

    #[error("template nesting exceeded {limit} levels in '{template}'")]
    RecursionLimit { limit: usize, template: String },

    #[error("template '{template}' has no parameter '{name}'")]
    UnknownParameter { template: String, name: String },

    #[error("template '{template}' expects {expected} arguments but got {actual}")]
    ArgumentCount {
        template: String,
        expected: usize,
        actual: usize,
    },

    #[error("template '{name}' is defined more than once")]
    DuplicateTemplate { name: String },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot load '{}': {reason}", path.display())]
    Load { path: PathBuf, reason: String },
}

impl Error {
    pub fn syntax(template: impl Into<String>, errors: Vec<SyntaxError>) -> Self {
        Self::Syntax {
            template: template.into(),
            errors,
        }
    }

    pub fn no_such_template(name: impl Into<String>) -> Self {
        Self::NoSuchTemplate { name: name.into() }
    }

    pub fn no_such_attribute(name: impl Into<String>) -> Self {
        Self::NoSuchAttribute { name: name.into() }
    }

    pub fn no_such_property(owner_type: impl Into<String>, property: impl Into<String>) -> Self {
        Self::NoSuchProperty {
            owner_type: owner_type.into(),
            property: property.into(),
        }
    }

    pub fn render(
        format: impl Into<String>,
        value_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Render {
            format: format.into(),
            value_type: value_type.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Syntax errors carried by this error, if any
    pub fn syntax_errors(&self) -> &[SyntaxError] {
        match self {
            Error::Syntax { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn format_syntax_errors(errors: &[SyntaxError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_counts_from_one() {
        let err = SyntaxError::new(8..9, "boom");
        assert_eq!(err.line_col("abc\ndef\nghi"), (3, 1));
        assert_eq!(err.line_col("abcdefghij"), (1, 9));
    }

    #[test]
    fn test_format_includes_message_and_file() {
        let err = SyntaxError::new(6..7, "unterminated expression");
        let report = err.format("Hello <name", "hello.st");
        assert!(report.contains("unterminated expression"));
        assert!(report.contains("hello.st"));
    }

    #[test]
    fn test_error_display() {
        let err = Error::no_such_property("User", "secret");
        assert_eq!(err.to_string(), "no such property 'secret' on User");

        let err = Error::syntax("t", vec![SyntaxError::new(3..4, "bad")]);
        assert_eq!(
            err.to_string(),
            "template 't' has syntax errors: syntax error at 3: bad"
        );
        assert_eq!(err.syntax_errors().len(), 1);
    }
}
