use std::{collections::VecDeque, sync::LazyLock};

use regex::{Captures, Regex};

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind},
    token::{Token, TokenKind},
};

/// One alternation per token class, tried in priority order. Anchored so
/// that every match starts exactly where the previous one ended.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = concat!(
        r"^\s*(?:",
        r"(?P<com>//.*)",
        r"|(?P<key>(?:while|if|do|else|end|return|def)\b)",
        r"|(?P<id>[A-Za-z_][A-Za-z0-9_]*)",
        r"|(?P<num>[0-9]+|\(-[0-9]+\))",
        r#"|(?P<str>"(?:\\.|[^"\\])*")"#,
        r"|(?P<pun>==|<=|>=|&&|\|\||[-+*/%<>=])",
        r"|(?P<sep>[;(),])",
        r"|(?P<other>\S+)",
        r")",
    );
    Regex::new(pattern).expect("token pattern is a valid regex")
});

/// Line-at-a-time scanner with an incrementally filled lookahead buffer.
pub struct Scanner<'a> {
    lines: std::str::Lines<'a>,
    line: usize,
    queue: VecDeque<Token>,
    exhausted: bool,
    eof: Token,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            line: 0,
            queue: VecDeque::new(),
            exhausted: false,
            eof: Token::eof(0),
        }
    }

    /// Consumes the next token. Past the end this keeps returning the
    /// end-of-input sentinel.
    pub fn next_token(&mut self) -> Result<Token, Diagnostic> {
        if self.fill(0)? {
            if let Some(token) = self.queue.pop_front() {
                return Ok(token);
            }
        }
        Ok(self.eof.clone())
    }

    /// Looks `k` tokens ahead without consuming anything.
    pub fn peek(&mut self, k: usize) -> Result<&Token, Diagnostic> {
        if self.fill(k)? {
            Ok(&self.queue[k])
        } else {
            Ok(&self.eof)
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.is_eof();
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn fill(&mut self, k: usize) -> Result<bool, Diagnostic> {
        while self.queue.len() <= k {
            if self.exhausted {
                return Ok(false);
            }
            match self.lines.next() {
                Some(text) => {
                    self.line += 1;
                    self.scan_line(text)?;
                }
                None => {
                    self.exhausted = true;
                    self.eof = Token::eof(self.line);
                }
            }
        }
        Ok(true)
    }

    fn scan_line(&mut self, text: &str) -> Result<(), Diagnostic> {
        let line = self.line;
        let mut rest = text;
        let mut scanned = 0usize;
        while !rest.trim_start().is_empty() {
            let caps = TOKEN_PATTERN.captures(rest).ok_or_else(|| {
                Diagnostic::new(DiagnosticKind::Lex, format!("unrecognized text `{}`", rest.trim()))
                    .with_line(line)
            })?;
            let end = caps.get(0).map_or(rest.len(), |m| m.end());
            if let Some(token) = classify(&caps, line)? {
                self.queue.push_back(token);
                scanned += 1;
            }
            rest = &rest[end..];
        }
        if scanned > 0 {
            tracing::trace!(line, tokens = scanned, "scanned line");
        }
        Ok(())
    }
}

fn classify(caps: &Captures<'_>, line: usize) -> Result<Option<Token>, Diagnostic> {
    if caps.name("com").is_some() {
        return Ok(None);
    }
    if let Some(m) = caps.name("key") {
        return Ok(Some(Token::new(TokenKind::Keyword, m.as_str(), line)));
    }
    if let Some(m) = caps.name("id") {
        return Ok(Some(Token::new(TokenKind::Identifier, m.as_str(), line)));
    }
    if let Some(m) = caps.name("num") {
        return number_literal(m.as_str(), line).map(Some);
    }
    if let Some(m) = caps.name("str") {
        return Ok(Some(Token::new(TokenKind::String, unescape(m.as_str()), line)));
    }
    if let Some(m) = caps.name("pun") {
        return Ok(Some(Token::new(TokenKind::Punct, m.as_str(), line)));
    }
    if let Some(m) = caps.name("sep") {
        return Ok(Some(Token::new(TokenKind::Separator, m.as_str(), line)));
    }
    let text = caps.name("other").map_or("", |m| m.as_str());
    Err(Diagnostic::new(DiagnosticKind::Lex, format!("unrecognized text `{text}`")).with_line(line))
}

/// Parses `123` or the parenthesized negative form `(-123)`.
fn number_literal(text: &str, line: usize) -> Result<Token, Diagnostic> {
    let digits = match text.strip_prefix("(-").and_then(|t| t.strip_suffix(')')) {
        Some(digits) => format!("-{digits}"),
        None => text.to_string(),
    };
    digits.parse::<i64>().map(|value| Token::number(value, line)).map_err(|_| {
        Diagnostic::new(
            DiagnosticKind::Lex,
            format!("integer literal `{text}` is out of range"),
        )
        .with_line(line)
    })
}

/// Strips the surrounding quotes and resolves `\\`, `\"` and `\n`. Any
/// other backslash sequence is kept verbatim.
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('"') => value.push('"'),
            Some('\\') => value.push('\\'),
            Some(other) => {
                value.push('\\');
                value.push(other);
            }
            None => value.push('\\'),
        }
    }
    value
}
