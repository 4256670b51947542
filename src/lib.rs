//! Core library for the Sloth embeddable scripting language: a line-based
//! scanner, a recursive-descent parser, a tree-walking evaluator with
//! dynamically scoped call frames, and a VM that links independently
//! compiled script libraries and host functions into one namespace.

pub mod ast;
pub mod diagnostics;
pub mod environment;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod runtime;
mod stack;
pub mod token;
pub mod value;
pub mod vm;

pub use diagnostics::{Diagnostic, DiagnosticKind, Result, SlothError};
pub use program::Program;
pub use runtime::{ExecutionContext, Interpreter};
pub use value::Value;
pub use vm::{HostError, HostFunction, Vm};
