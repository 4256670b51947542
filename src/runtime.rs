use std::rc::Rc;

use crate::{
    ast::{BinaryOp, Call, Expression, FunctionDef, Operand, Program, Stmt, StmtKind},
    diagnostics::{diagnostic_near, error_at, DiagnosticKind, Result},
    environment::{Environment, EnvironmentRef},
    stack::ensure_sufficient_stack,
    value::{self, Value},
    vm::Vm,
};

/// Tunables for a single run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Script call depth at which evaluation fails with `ResourceExhausted`.
    pub max_call_depth: usize,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            max_call_depth: 2048,
        }
    }
}

/// Tree-walking evaluator. One instance drives one run: it owns a fresh
/// main frame and optionally resolves calls through a [`Vm`].
pub struct Interpreter<'vm> {
    globals: EnvironmentRef,
    env: EnvironmentRef,
    vm: Option<&'vm Vm>,
    context: ExecutionContext,
    depth: usize,
}

impl<'vm> Interpreter<'vm> {
    pub fn new(vm: Option<&'vm Vm>, context: ExecutionContext) -> Self {
        let globals = Environment::main();
        Self {
            env: Rc::clone(&globals),
            globals,
            vm,
            context,
            depth: 0,
        }
    }

    pub fn globals(&self) -> &EnvironmentRef {
        &self.globals
    }

    pub fn eval_program(&mut self, program: &Program) -> Result<Value> {
        let mut last_value = Value::ZERO;
        for stmt in &program.items {
            match self.execute_statement(stmt)? {
                FlowControl::Next => {}
                FlowControl::NextValue(value) => last_value = value,
                FlowControl::Return(value) => return Ok(value),
            }
        }
        Ok(last_value)
    }

    /// Calls `name` with already evaluated arguments, resolving it against
    /// this run's own functions, then the VM's linked functions, then the
    /// VM's host functions. `line` is `None` for calls made from native code.
    pub fn call_function(
        &mut self,
        name: &str,
        args: Vec<Value>,
        line: Option<usize>,
    ) -> Result<Value> {
        let script = self
            .globals
            .borrow()
            .function(name)
            .or_else(|| self.vm.and_then(|vm| vm.function(name)));
        if let Some(def) = script {
            return self.call_script(&def, args, line);
        }
        if let Some(host) = self.vm.and_then(|vm| vm.host_function(name)) {
            tracing::trace!(function = host.name(), "calling host function");
            return host.invoke(&args, line);
        }
        Err(diagnostic_near(
            DiagnosticKind::Name,
            format!("undefined function `{name}`"),
            line,
        )
        .into())
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<FlowControl> {
        ensure_sufficient_stack(|| self.execute_statement_inner(stmt))
    }

    fn execute_statement_inner(&mut self, stmt: &Stmt) -> Result<FlowControl> {
        match &stmt.kind {
            StmtKind::Expression(expr) => Ok(FlowControl::NextValue(self.evaluate(expr)?)),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_true(condition.line)? {
                    self.execute_block(then_branch)
                } else if let Some(branch) = else_branch {
                    self.execute_block(branch)
                } else {
                    Ok(FlowControl::NextValue(Value::ZERO))
                }
            }
            StmtKind::While { condition, body } => {
                let mut last_value = Value::ZERO;
                while self.evaluate(condition)?.is_true(condition.line)? {
                    match self.execute_block(body)? {
                        FlowControl::Next => {}
                        FlowControl::NextValue(value) => last_value = value,
                        FlowControl::Return(value) => return Ok(FlowControl::Return(value)),
                    }
                }
                Ok(FlowControl::NextValue(last_value))
            }
            StmtKind::Return(expr) => Ok(FlowControl::Return(self.evaluate(expr)?)),
            StmtKind::Function(def) => {
                self.globals.borrow_mut().define_function(Rc::clone(def))?;
                Ok(FlowControl::Next)
            }
        }
    }

    /// Runs a block in the current frame. A `Return` stops the block and is
    /// handed to the caller unchanged.
    fn execute_block(&mut self, statements: &[Stmt]) -> Result<FlowControl> {
        let mut last_value = Value::ZERO;
        for stmt in statements {
            match self.execute_statement(stmt)? {
                FlowControl::Next => {}
                FlowControl::NextValue(value) => last_value = value,
                flow @ FlowControl::Return(_) => return Ok(flow),
            }
        }
        Ok(FlowControl::NextValue(last_value))
    }

    /// Evaluates an operand/operator sequence: converts it to postfix with an
    /// operator stack (ties pop first, so equal priorities associate left),
    /// then folds the postfix form on a value stack.
    fn evaluate(&mut self, expr: &Expression) -> Result<Value> {
        let mut stack: Vec<Value> = Vec::with_capacity(expr.rest.len() + 1);
        for item in postfix(expr) {
            match item {
                Postfix::Operand(operand) => stack.push(self.operand(operand)?),
                Postfix::Operator(op) => {
                    let (Some(rhs), Some(lhs)) = (stack.pop(), stack.pop()) else {
                        return Err(malformed(expr));
                    };
                    stack.push(value::binary(op, &lhs, &rhs, expr.line)?);
                }
            }
        }
        let result = match (stack.pop(), stack.is_empty()) {
            (Some(result), true) => result,
            _ => return Err(malformed(expr)),
        };
        if let Some(target) = &expr.target {
            Environment::set(&self.env, target, result.clone());
        }
        Ok(result)
    }

    fn operand(&mut self, operand: &Operand) -> Result<Value> {
        match operand {
            Operand::Identifier { name, line } => Environment::get(&self.env, name, *line),
            Operand::Number(n) => Ok(Value::Int(*n)),
            Operand::String(s) => Ok(Value::String(s.clone())),
            Operand::Call(call) => self.call(call),
            Operand::Group(inner) => ensure_sufficient_stack(|| self.evaluate(inner)),
        }
    }

    /// Arguments can nest calls to any depth, so this is guarded the same
    /// way as script calls.
    fn call(&mut self, call: &Call) -> Result<Value> {
        ensure_sufficient_stack(|| {
            let mut args = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                args.push(self.evaluate(arg)?);
            }
            self.call_function(&call.callee, args, Some(call.line))
        })
    }

    fn call_script(
        &mut self,
        def: &FunctionDef,
        args: Vec<Value>,
        line: Option<usize>,
    ) -> Result<Value> {
        if args.len() < def.params.len() {
            let diag = diagnostic_near(
                DiagnosticKind::Arity,
                format!(
                    "function `{}` expects {} arguments but received {}",
                    def.name,
                    def.params.len(),
                    args.len()
                ),
                line,
            )
            .with_note(format!(
                "`{}({})` is defined at line {}",
                def.name,
                def.params.join(", "),
                def.line
            ));
            return Err(diag.into());
        }
        if self.depth >= self.context.max_call_depth {
            return Err(diagnostic_near(
                DiagnosticKind::ResourceExhausted,
                format!(
                    "maximum call depth of {} exceeded in `{}`",
                    self.context.max_call_depth, def.name
                ),
                line,
            )
            .into());
        }

        let frame = Environment::call_frame(Rc::clone(&self.env));
        {
            let mut scope = frame.borrow_mut();
            for (name, value) in def.params.iter().zip(args) {
                scope.define(name.as_str(), value);
            }
        }
        tracing::trace!(function = %def.name, depth = self.depth, "calling script function");

        let caller = std::mem::replace(&mut self.env, frame);
        self.depth += 1;
        let outcome = ensure_sufficient_stack(|| self.execute_block(&def.body));
        self.depth -= 1;
        self.env = caller;

        match outcome? {
            FlowControl::Return(value) | FlowControl::NextValue(value) => Ok(value),
            FlowControl::Next => Ok(Value::ZERO),
        }
    }
}

enum FlowControl {
    Next,
    NextValue(Value),
    Return(Value),
}

enum Postfix<'e> {
    Operand(&'e Operand),
    Operator(BinaryOp),
}

fn postfix(expr: &Expression) -> Vec<Postfix<'_>> {
    let mut output = Vec::with_capacity(expr.term_count());
    let mut operators: Vec<BinaryOp> = Vec::new();
    output.push(Postfix::Operand(&expr.first));
    for (op, operand) in &expr.rest {
        while let Some(&top) = operators.last() {
            if top.priority() < op.priority() {
                break;
            }
            output.push(Postfix::Operator(top));
            operators.pop();
        }
        operators.push(*op);
        output.push(Postfix::Operand(operand));
    }
    while let Some(op) = operators.pop() {
        output.push(Postfix::Operator(op));
    }
    output
}

fn malformed(expr: &Expression) -> crate::SlothError {
    error_at(
        DiagnosticKind::Syntax,
        format!("malformed expression {expr}"),
        expr.line,
    )
}
