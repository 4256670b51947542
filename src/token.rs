use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    String,
    Punct,
    Keyword,
    Separator,
    Eof,
}

/// A classified lexeme. For string literals `lexeme` holds the unescaped
/// text; for numbers it holds the decimal form of `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub value: i64,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            value: 0,
        }
    }

    pub fn number(value: i64, line: usize) -> Self {
        Self {
            kind: TokenKind::Number,
            lexeme: value.to_string(),
            line,
            value,
        }
    }

    pub fn eof(line: usize) -> Self {
        Self::new(TokenKind::Eof, "", line)
    }

    pub fn is(&self, kind: TokenKind, lexeme: &str) -> bool {
        self.kind == kind && self.lexeme == lexeme
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Human-readable location used in syntax diagnostics.
    pub fn location(&self) -> String {
        if self.is_eof() {
            "end of input".to_string()
        } else {
            format!("`{}` at line {}", self.lexeme, self.line)
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            TokenKind::Identifier => "id",
            TokenKind::Number => "num",
            TokenKind::String => "str",
            TokenKind::Punct => "pun",
            TokenKind::Keyword => "key",
            TokenKind::Separator => "sep",
            TokenKind::Eof => return write!(f, "<eof>"),
        };
        match self.kind {
            TokenKind::String => write!(f, "<{tag}:{:?}>", self.lexeme),
            _ => write!(f, "<{tag}:{}>", self.lexeme),
        }
    }
}
