use crate::{
    ast,
    diagnostics::{error, DiagnosticKind, Result},
    environment::FunctionTable,
    parser,
    runtime::{ExecutionContext, Interpreter},
    value::Value,
    vm::Vm,
};

/// A script compilation unit: source text, its syntax tree once compiled,
/// and the function table left behind by its last successful run.
#[derive(Debug)]
pub struct Program {
    source: String,
    ast: Option<ast::Program>,
    functions: Option<FunctionTable>,
}

impl Program {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ast: None,
            functions: None,
        }
    }

    pub fn is_compiled(&self) -> bool {
        self.ast.is_some()
    }

    pub fn ast(&self) -> Option<&ast::Program> {
        self.ast.as_ref()
    }

    /// Scans and parses the source. Compiling twice is a no-op.
    pub fn compile(&mut self) -> Result<()> {
        if self.ast.is_some() {
            tracing::debug!("program already compiled, skipping");
            return Ok(());
        }
        let program = parser::parse_program(&self.source)?;
        tracing::debug!(items = program.items.len(), "compiled program");
        self.ast = Some(program);
        Ok(())
    }

    pub fn run(&mut self, vm: Option<&Vm>) -> Result<Value> {
        self.run_with(vm, &ExecutionContext::default())
    }

    /// Executes the compiled program under a fresh main frame. Side effects
    /// of a failed run are not rolled back, but the function table of a
    /// failed run is discarded.
    pub fn run_with(&mut self, vm: Option<&Vm>, context: &ExecutionContext) -> Result<Value> {
        let Some(program) = &self.ast else {
            return Err(error(
                DiagnosticKind::Usage,
                "program has not been compiled",
            ));
        };
        let mut interpreter = Interpreter::new(vm, context.clone());
        match interpreter.eval_program(program) {
            Ok(value) => {
                self.functions = Some(interpreter.globals().borrow().functions().clone());
                tracing::debug!(result = %value, "run finished");
                Ok(value)
            }
            Err(err) => {
                self.functions = None;
                tracing::debug!(error = %err, "run failed");
                Err(err)
            }
        }
    }

    /// Functions registered by the last successful run.
    pub fn functions(&self) -> Option<&FunctionTable> {
        self.functions.as_ref()
    }
}
