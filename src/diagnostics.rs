use std::fmt;

use thiserror::Error;

/// Classification of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lex,
    Syntax,
    Name,
    Arity,
    Type,
    Arithmetic,
    DuplicateDefinition,
    Host,
    ResourceExhausted,
    /// Misuse of the embedding API, e.g. running an uncompiled program.
    Usage,
}

impl DiagnosticKind {
    pub fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Lex => "LexError",
            DiagnosticKind::Syntax => "SyntaxError",
            DiagnosticKind::Name => "NameError",
            DiagnosticKind::Arity => "ArityError",
            DiagnosticKind::Type => "TypeError",
            DiagnosticKind::Arithmetic => "ArithmeticError",
            DiagnosticKind::DuplicateDefinition => "DuplicateDefinitionError",
            DiagnosticKind::Host => "HostError",
            DiagnosticKind::ResourceExhausted => "ResourceExhausted",
            DiagnosticKind::Usage => "UsageError",
        }
    }
}

/// Rich diagnostic information surfaced to embedders.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// 1-based source line, when the fault can be pinned to one.
    pub line: Option<usize>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            notes: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)?;
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Unified error type for the Sloth toolchain.
#[derive(Debug, Error)]
pub enum SlothError {
    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SlothError {
    /// The diagnostic kind, if this error came from the language itself.
    pub fn kind(&self) -> Option<DiagnosticKind> {
        match self {
            SlothError::Diagnostic(diag) => Some(diag.kind),
            SlothError::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SlothError>;

pub(crate) fn error(kind: DiagnosticKind, message: impl Into<String>) -> SlothError {
    SlothError::from(Diagnostic::new(kind, message))
}

pub(crate) fn error_at(kind: DiagnosticKind, message: impl Into<String>, line: usize) -> SlothError {
    SlothError::from(Diagnostic::new(kind, message).with_line(line))
}

/// Like [`error_at`], for faults that may not come from a script line
/// (calls made from native code through `Vm::call`).
pub(crate) fn diagnostic_near(
    kind: DiagnosticKind,
    message: impl Into<String>,
    line: Option<usize>,
) -> Diagnostic {
    let diag = Diagnostic::new(kind, message);
    match line {
        Some(line) => diag.with_line(line),
        None => diag,
    }
}
