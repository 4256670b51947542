use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use indexmap::IndexMap;

use crate::{
    ast::FunctionDef,
    diagnostics::{diagnostic_near, error, DiagnosticKind, Result},
    environment::FunctionTable,
    program::Program,
    runtime::{ExecutionContext, Interpreter},
    value::Value,
};

/// Error type host functions report failures with.
pub type HostError = Box<dyn std::error::Error>;

type HostCallback = dyn Fn(&[Value]) -> std::result::Result<Value, HostError>;

/// A native function exposed to scripts by name.
#[derive(Clone)]
pub struct HostFunction {
    name: String,
    callback: Rc<HostCallback>,
}

impl HostFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the callback. Both an `Err` and a panic inside the callback
    /// are reported as a `Host` diagnostic.
    pub fn invoke(&self, args: &[Value], line: Option<usize>) -> Result<Value> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(args))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(diagnostic_near(
                DiagnosticKind::Host,
                format!("host function `{}` failed: {err}", self.name),
                line,
            )
            .into()),
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(diagnostic_near(
                    DiagnosticKind::Host,
                    format!("host function `{}` panicked: {reason}", self.name),
                    line,
                )
                .into())
            }
        }
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<host fn {}>", self.name)
    }
}

/// Shared function namespace: script functions harvested from linked
/// libraries plus registered host functions.
///
/// The tables only change through `link` and `register_host_function`;
/// runs borrow the VM immutably.
#[derive(Default)]
pub struct Vm {
    functions: FunctionTable,
    hosts: IndexMap<String, HostFunction>,
    context: ExecutionContext,
}

impl Vm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: ExecutionContext) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    /// Exposes a compiled program's functions to every program later run
    /// against this VM. A library that has not run yet is run once first.
    /// On a name collision the most recently linked definition wins.
    pub fn link(&mut self, program: &mut Program) -> Result<()> {
        if !program.is_compiled() {
            return Err(error(
                DiagnosticKind::Usage,
                "cannot link a program that has not been compiled",
            ));
        }
        if program.functions().is_none() {
            program.run_with(Some(&*self), &self.context)?;
        }
        let harvested: Vec<(String, Rc<FunctionDef>)> = program
            .functions()
            .map(|table| {
                table
                    .iter()
                    .map(|(name, def)| (name.clone(), Rc::clone(def)))
                    .collect()
            })
            .unwrap_or_default();
        for (name, def) in harvested {
            if self.functions.insert(name.clone(), def).is_some() {
                tracing::warn!(function = %name, "linked function shadows an earlier definition");
            }
        }
        tracing::debug!(functions = self.functions.len(), "linked library");
        Ok(())
    }

    pub fn register_host_function<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&[Value]) -> std::result::Result<Value, HostError> + 'static,
    {
        let name = name.into();
        tracing::debug!(function = %name, "registered host function");
        self.hosts.insert(
            name.clone(),
            HostFunction {
                name,
                callback: Rc::new(callback),
            },
        );
    }

    /// Calls a linked script function (or host function) from native code.
    /// The call runs under a fresh main frame bound to this VM, and its
    /// diagnostics carry no line.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let mut interpreter = Interpreter::new(Some(self), self.context.clone());
        interpreter.call_function(name, args.to_vec(), None)
    }

    pub fn function(&self, name: &str) -> Option<Rc<FunctionDef>> {
        self.functions.get(name).cloned()
    }

    pub fn host_function(&self, name: &str) -> Option<&HostFunction> {
        self.hosts.get(name)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}
