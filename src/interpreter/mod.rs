mod builtins;
mod call;
pub mod context;
mod expression;
mod object;
mod operator;
mod prelude;
mod tree;

use std::rc::Rc;

use compact_str::CompactString;

pub use builtins::Builtins;
pub use context::{BufferedContext, StdioContext};

use crate::{
    environment::Environment,
    lexer::Span,
    parser::{statement::Statement, Program},
    value::{
        error::{CallFrame, Exception, RuntimeError, RuntimeErrorKind},
        Instance, Value,
    },
};

/// How a statement finished.
#[derive(Debug, Clone)]
pub enum Exit {
    Success,
    Break,
    Continue,
    Return(Value),
}

/// Host services the interpreter needs.
pub trait SystemContext {
    fn writeln(&mut self, text: &str);
    /// Loads the source of an `include` target.
    fn read_include(&mut self, path: &str) -> std::io::Result<String>;
}

/// Where a plain assignment binds a name that is not yet bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssignmentScope {
    /// The nearest existing binding, else the current frame.
    #[default]
    Lexical,
    /// Assignments and function declarations always bind in the global
    /// frame, while reads stay lexical.
    Global,
}

#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    pub max_call_depth: usize,
    pub assignment_scope: AssignmentScope,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 2000,
            assignment_scope: AssignmentScope::Lexical,
        }
    }
}

/// Turns a bare error kind into a raised exception at `span`.
pub(crate) trait OrRaise<T> {
    fn or_raise(self, interpreter: &TreeWalkInterpreter, span: Span) -> Result<T, RuntimeError>;
}

impl<T> OrRaise<T> for Result<T, RuntimeErrorKind> {
    fn or_raise(self, interpreter: &TreeWalkInterpreter, span: Span) -> Result<T, RuntimeError> {
        self.map_err(|kind| interpreter.raise(kind, span))
    }
}

pub struct TreeWalkInterpreter {
    context: Box<dyn SystemContext>,
    config: InterpreterConfig,
    builtins: Builtins,
    globals: Environment,
    call_stack: Vec<CallFrame>,
    include_stack: Vec<CompactString>,
}

impl TreeWalkInterpreter {
    pub fn new(context: impl SystemContext + 'static, config: InterpreterConfig) -> Self {
        let builtins = Builtins::new();
        let globals = Environment::new();
        prelude::install(&globals, &builtins);
        Self {
            context: Box::new(context),
            config,
            builtins,
            globals,
            call_stack: Vec::new(),
            include_stack: Vec::new(),
        }
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn context(&mut self) -> &mut dyn SystemContext {
        self.context.as_mut()
    }

    /// Exposes a host value, such as a `HostFunction`, as a global.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.bind(name, value);
    }

    /// Runs a checked program in the global frame.
    ///
    /// Returns the value of the last top-level expression statement.
    pub fn run(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        tracing::debug!(statements = program.statements().len(), "running program");
        let globals = self.globals.clone();
        let mut last = Value::Null;
        for statement in program.iter() {
            match statement {
                Statement::Expression(stmt) => {
                    last = self.evaluate(&stmt.expr, &globals)?;
                }
                statement => {
                    self.execute(statement, &globals)?;
                }
            }
        }
        Ok(last)
    }

    /// Builds the exception for a failure the runtime detected itself.
    pub fn raise(&self, kind: RuntimeErrorKind, span: Span) -> RuntimeError {
        let class = self.builtins.class(kind.class()).clone();
        let message: CompactString = kind.to_string().into();
        let payload = Rc::new(Instance::new(class.clone()));
        payload.set_field("message", Value::String(message.clone()));
        Exception {
            payload,
            class_name: class.name.clone(),
            message,
            span,
            traceback: self.call_stack.clone(),
            code: Some(kind.code()),
        }
        .into()
    }

    /// Raises a guest exception instance.
    pub fn raise_instance(&mut self, payload: Rc<Instance>, span: Span) -> RuntimeError {
        let message = match self.instance_text(&payload, false, span) {
            Ok(message) => message.into(),
            Err(error @ RuntimeError::Exit(_)) => return error,
            Err(_) => crate::value::default_instance_text(&payload).into(),
        };
        Exception {
            class_name: payload.class.name.clone(),
            payload,
            message,
            span,
            traceback: self.call_stack.clone(),
            code: None,
        }
        .into()
    }
}
