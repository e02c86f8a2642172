//! Lexer for template text
//!
//! Template text is scanned by hand because the expression delimiters are
//! chosen at runtime. The inside of each expression is tokenized with logos.

use logos::Logos;

use crate::error::SyntaxError;
use crate::parser::ast::Delimiters;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Tokens fed to the template grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal output text, escapes already applied
    Text(String),
    /// Start delimiter
    Open,
    /// Stop delimiter
    Close,
    Ident(String),
    Str(String),
    Int(usize),
    Dot,
    Colon,
    Semi,
    Comma,
    Equals,
    Pipe,
    At,
    ParenOpen,
    ParenClose,
    BraceOpen,
    BraceClose,
}

/// Tokens found between delimiters
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
enum ExprToken {
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token("=")]
    Equals,
    #[token("|")]
    Pipe,
    #[token("@")]
    At,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,

    // `%1` style names are bound by the `format` helper
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*|%[0-9]+", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<usize>().ok())]
    Int(usize),
}

impl From<ExprToken> for Token {
    fn from(tok: ExprToken) -> Self {
        match tok {
            ExprToken::Dot => Token::Dot,
            ExprToken::Colon => Token::Colon,
            ExprToken::Semi => Token::Semi,
            ExprToken::Comma => Token::Comma,
            ExprToken::Equals => Token::Equals,
            ExprToken::Pipe => Token::Pipe,
            ExprToken::At => Token::At,
            ExprToken::ParenOpen => Token::ParenOpen,
            ExprToken::ParenClose => Token::ParenClose,
            ExprToken::Ident(s) => Token::Ident(s),
            ExprToken::Str(s) => Token::Str(s),
            ExprToken::Int(n) => Token::Int(n),
        }
    }
}

/// Strip quotes from a string literal and resolve backslash escapes
pub(crate) fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Lex template text into tokens with spans
pub fn lex(source: &str, delimiters: Delimiters) -> Result<Vec<(Token, Span)>, SyntaxError> {
    let mut scanner = Scanner {
        src: source,
        pos: 0,
        delimiters,
        tokens: Vec::new(),
    };
    scanner.text(None)?;
    Ok(scanner.tokens)
}

struct Scanner<'s> {
    src: &'s str,
    pos: usize,
    delimiters: Delimiters,
    tokens: Vec<(Token, Span)>,
}

impl<'s> Scanner<'s> {
    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn emit(&mut self, tok: Token, span: Span) {
        self.tokens.push((tok, span));
    }

    fn flush(&mut self, buf: &mut String, start: usize) {
        if !buf.is_empty() {
            let text = std::mem::take(buf);
            self.emit(Token::Text(text), start..self.pos);
        }
    }

    /// Scan literal text. `brace` holds the offset of the `{` that opened an
    /// anonymous template, in which case an unescaped `}` ends the text.
    fn text(&mut self, brace: Option<usize>) -> Result<(), SyntaxError> {
        let start_delim = self.delimiters.start;
        let mut buf = String::new();
        let mut start = self.pos;

        while let Some(c) = self.peek() {
            if c == '\\' {
                let mut ahead = self.rest().chars().skip(1);
                match ahead.next() {
                    Some(next) if next == start_delim || (brace.is_some() && next == '}') => {
                        buf.push(next);
                        self.pos += 1 + next.len_utf8();
                    }
                    _ => {
                        buf.push('\\');
                        self.pos += 1;
                    }
                }
                continue;
            }

            if brace.is_some() && c == '}' {
                self.flush(&mut buf, start);
                self.emit(Token::BraceClose, self.pos..self.pos + 1);
                self.pos += 1;
                return Ok(());
            }

            if c == start_delim {
                let after = &self.rest()[c.len_utf8()..];
                if after.starts_with('!') {
                    self.comment()?;
                } else if after.starts_with('\\') {
                    let escaped = self.escape_sequence()?;
                    buf.push_str(&escaped);
                } else {
                    self.flush(&mut buf, start);
                    self.expression()?;
                    start = self.pos;
                }
                continue;
            }

            buf.push(c);
            self.pos += c.len_utf8();
        }

        if let Some(open) = brace {
            return Err(SyntaxError::new(
                open..open + 1,
                "unterminated anonymous template; expected '}'",
            ));
        }
        self.flush(&mut buf, start);
        Ok(())
    }

    /// Skip `<! ... !>`
    fn comment(&mut self) -> Result<(), SyntaxError> {
        let open = self.pos;
        let body_start = self.pos + self.delimiters.start.len_utf8() + 1;
        let terminator = format!("!{}", self.delimiters.stop);
        match self.src[body_start..].find(&terminator) {
            Some(idx) => {
                self.pos = body_start + idx + terminator.len();
                Ok(())
            }
            None => Err(SyntaxError::new(open..body_start, "unterminated comment")),
        }
    }

    /// Resolve `<\n>`, `<\t>`, `<\ >`, `<\uXXXX>` and runs of them
    fn escape_sequence(&mut self) -> Result<String, SyntaxError> {
        let open = self.pos;
        self.pos += self.delimiters.start.len_utf8();
        let mut out = String::new();

        loop {
            match self.peek() {
                Some('\\') => self.pos += 1,
                Some(c) if c == self.delimiters.stop && !out.is_empty() => {
                    self.pos += c.len_utf8();
                    return Ok(out);
                }
                _ => return Err(SyntaxError::new(open..self.pos, "malformed escape sequence")),
            }

            match self.peek() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(' ') => out.push(' '),
                Some('u') => {
                    let hex = self.rest().get(1..5).unwrap_or("");
                    let ch = u32::from_str_radix(hex, 16)
                        .ok()
                        .filter(|_| hex.len() == 4)
                        .and_then(char::from_u32)
                        .ok_or_else(|| {
                            SyntaxError::new(self.pos..self.pos + 1, "invalid unicode escape")
                        })?;
                    out.push(ch);
                    self.pos += 4;
                }
                _ => {
                    return Err(SyntaxError::new(
                        self.pos.saturating_sub(1)..self.pos + 1,
                        "unknown escape sequence",
                    ))
                }
            }
            self.pos += 1;
        }
    }

    fn expression(&mut self) -> Result<(), SyntaxError> {
        let open = self.pos;
        let stop = self.delimiters.stop;
        let open_len = self.delimiters.start.len_utf8();
        self.emit(Token::Open, open..open + open_len);
        self.pos += open_len;

        loop {
            let trimmed = self.rest().trim_start();
            self.pos = self.src.len() - trimmed.len();

            let Some(c) = self.peek() else {
                return Err(SyntaxError::new(
                    open..open + open_len,
                    format!("unterminated expression; expected '{}'", stop),
                ));
            };

            if c == stop {
                self.emit(Token::Close, self.pos..self.pos + c.len_utf8());
                self.pos += c.len_utf8();
                return Ok(());
            }

            if c == '{' {
                let brace = self.pos;
                self.emit(Token::BraceOpen, brace..brace + 1);
                self.pos += 1;
                self.template_params();
                self.text(Some(brace))?;
                continue;
            }

            let mut lexer = ExprToken::lexer(self.rest());
            match lexer.next() {
                Some(Ok(tok)) => {
                    let span = lexer.span();
                    let abs = self.pos + span.start..self.pos + span.end;
                    self.pos = abs.end;
                    self.emit(tok.into(), abs);
                }
                _ => {
                    return Err(SyntaxError::new(
                        self.pos..self.pos + c.len_utf8(),
                        format!("unexpected character '{}' in expression", c),
                    ))
                }
            }
        }
    }

    /// Emit `ident (, ident)* |` if it opens the anonymous template at the cursor
    fn template_params(&mut self) {
        let base = self.pos;
        let rest = self.rest();
        let mut tokens = Vec::new();
        let mut idx = 0;
        let bytes = rest.as_bytes();
        let skip_ws = |i: &mut usize| {
            while *i < bytes.len() && (bytes[*i] as char).is_ascii_whitespace() {
                *i += 1;
            }
        };

        loop {
            skip_ws(&mut idx);
            let ident_start = idx;
            if idx < bytes.len() && (bytes[idx].is_ascii_alphabetic() || bytes[idx] == b'_') {
                idx += 1;
                while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_')
                {
                    idx += 1;
                }
            } else {
                return;
            }
            tokens.push((
                Token::Ident(rest[ident_start..idx].to_string()),
                base + ident_start..base + idx,
            ));
            skip_ws(&mut idx);
            match bytes.get(idx) {
                Some(b',') => {
                    tokens.push((Token::Comma, base + idx..base + idx + 1));
                    idx += 1;
                }
                Some(b'|') => {
                    tokens.push((Token::Pipe, base + idx..base + idx + 1));
                    idx += 1;
                    break;
                }
                _ => return,
            }
        }

        // Whitespace after `|` on the same line is not part of the body
        while idx < bytes.len() && (bytes[idx] == b' ' || bytes[idx] == b'\t') {
            idx += 1;
        }
        self.tokens.extend(tokens);
        self.pos = base + idx;
    }
}
