use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{
    ast::FunctionDef,
    diagnostics::{error_at, DiagnosticKind, Result},
    value::Value,
};

pub type EnvironmentRef = Rc<RefCell<Environment>>;

pub type FunctionTable = IndexMap<String, Rc<FunctionDef>>;

/// A variable frame.
///
/// The main frame has no parent and owns the program's function table.
/// Call frames point at the frame of their *caller*, so lookups that miss
/// locally walk the call stack (dynamic scoping), not the definition site.
#[derive(Debug, Default)]
pub struct Environment {
    parent: Option<EnvironmentRef>,
    variables: IndexMap<String, Value>,
    functions: FunctionTable,
}

impl Environment {
    pub fn main() -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            parent: None,
            variables: IndexMap::new(),
            functions: IndexMap::new(),
        }))
    }

    pub fn call_frame(caller: EnvironmentRef) -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            parent: Some(caller),
            variables: IndexMap::new(),
            functions: IndexMap::new(),
        }))
    }

    /// Binds `name` in this frame only. Used for call parameters.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Writes to the nearest frame that already owns `name`, falling back
    /// to the main frame.
    pub fn set(env: &EnvironmentRef, name: &str, value: Value) {
        let mut frame = Rc::clone(env);
        loop {
            let parent = {
                let mut current = frame.borrow_mut();
                if current.variables.contains_key(name) || current.parent.is_none() {
                    current.variables.insert(name.to_string(), value);
                    return;
                }
                current.parent.clone()
            };
            match parent {
                Some(parent) => frame = parent,
                None => return,
            }
        }
    }

    pub fn get(env: &EnvironmentRef, name: &str, line: usize) -> Result<Value> {
        let mut frame = Rc::clone(env);
        loop {
            let parent = {
                let current = frame.borrow();
                if let Some(value) = current.variables.get(name) {
                    return Ok(value.clone());
                }
                current.parent.clone()
            };
            match parent {
                Some(parent) => frame = parent,
                None => break,
            }
        }
        Err(error_at(
            DiagnosticKind::Name,
            format!("undefined variable `{name}`"),
            line,
        ))
    }

    /// Registers a script function. A name may be defined once per program.
    pub fn define_function(&mut self, def: Rc<FunctionDef>) -> Result<()> {
        if self.functions.contains_key(&def.name) {
            return Err(error_at(
                DiagnosticKind::DuplicateDefinition,
                format!("function `{}` is already defined", def.name),
                def.line,
            ));
        }
        self.functions.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn function(&self, name: &str) -> Option<Rc<FunctionDef>> {
        self.functions.get(name).cloned()
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }
}
