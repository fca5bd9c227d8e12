use std::rc::Rc;

use compact_str::CompactString;
use thiserror::Error;

use super::{object::BuiltinClass, Instance, Value};
use crate::lexer::Span;

/// Catalogue of the failures the runtime raises itself.
///
/// Each kind is raised as an instance of its built-in exception class.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("Division by zero.")]
    DivByZero,
    #[error("Index {index} is out of range for length {length}.")]
    OutOfRange { index: i64, length: usize },
    #[error("Key {0} not found.")]
    KeyNotFound(String),
    #[error("{type_name} has no attribute `{name}`.")]
    AttrNotFound {
        type_name: CompactString,
        name: CompactString,
    },
    #[error("Variable `{0}` is not defined.")]
    VarNotFound(CompactString),
    #[error("{name} expected {expected} argument(s) but got {actual}.")]
    ArgCount {
        name: CompactString,
        expected: CompactString,
        actual: usize,
    },
    #[error("Unsupported operand types for {operator}: {lhs} and {rhs}.")]
    UnsupportedOperands {
        operator: &'static str,
        lhs: CompactString,
        rhs: CompactString,
    },
    #[error("Unsupported operand type for unary {operator}: {operand}.")]
    UnsupportedOperand {
        operator: &'static str,
        operand: CompactString,
    },
    #[error("{0} is not callable.")]
    NotCallable(CompactString),
    #[error("{0} is not subscriptable.")]
    NotSubscriptable(CompactString),
    #[error("Unhashable type {0}.")]
    Unhashable(CompactString),
    #[error("Can't set attributes on {0}.")]
    ReadOnly(CompactString),
    #[error("Iterator returned {0} instead of an item or null.")]
    InvalidIteratorItem(CompactString),
    #[error("Can't inherit from {0}.")]
    InvalidSuperClass(CompactString),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Module {module} has no variable `{name}`.")]
    ModuleVarNotFound {
        module: CompactString,
        name: CompactString,
    },
    #[error("Maximum call depth of {0} exceeded.")]
    StackOverflow(usize),
    #[error("Integer overflow in {0}.")]
    Overflow(&'static str),
    #[error("Failed to include {path}: {reason}")]
    IncludeError { path: CompactString, reason: String },
}

impl RuntimeErrorKind {
    /// The built-in class instantiated when this kind is raised.
    pub fn class(&self) -> BuiltinClass {
        match self {
            Self::DivByZero => BuiltinClass::DivByZero,
            Self::OutOfRange { .. } => BuiltinClass::OutOfRange,
            Self::KeyNotFound(_) => BuiltinClass::KeyNotFound,
            Self::AttrNotFound { .. } => BuiltinClass::AttrNotFound,
            Self::VarNotFound(_) => BuiltinClass::VarNotFound,
            Self::ArgCount { .. } => BuiltinClass::ArgCount,
            Self::UnsupportedOperands { .. }
            | Self::UnsupportedOperand { .. }
            | Self::NotCallable(_)
            | Self::NotSubscriptable(_)
            | Self::Unhashable(_)
            | Self::ReadOnly(_)
            | Self::InvalidIteratorItem(_)
            | Self::InvalidSuperClass(_)
            | Self::InvalidArgument(_) => BuiltinClass::NotImplemented,
            Self::ModuleVarNotFound { .. } => BuiltinClass::ModuleVarNotFound,
            Self::StackOverflow(_) => BuiltinClass::StackOverflow,
            Self::Overflow(_) => BuiltinClass::Overflow,
            Self::IncludeError { .. } => BuiltinClass::IncludeError,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::DivByZero => "RT001",
            Self::OutOfRange { .. } => "RT002",
            Self::KeyNotFound(_) => "RT003",
            Self::AttrNotFound { .. } => "RT004",
            Self::VarNotFound(_) => "RT005",
            Self::ArgCount { .. } => "RT006",
            Self::UnsupportedOperands { .. } => "RT007",
            Self::UnsupportedOperand { .. } => "RT008",
            Self::NotCallable(_) => "RT009",
            Self::NotSubscriptable(_) => "RT010",
            Self::Unhashable(_) => "RT011",
            Self::ReadOnly(_) => "RT012",
            Self::InvalidIteratorItem(_) => "RT013",
            Self::InvalidSuperClass(_) => "RT014",
            Self::InvalidArgument(_) => "RT015",
            Self::ModuleVarNotFound { .. } => "RT016",
            Self::StackOverflow(_) => "RT017",
            Self::Overflow(_) => "RT018",
            Self::IncludeError { .. } => "RT019",
        }
    }
}

/// One entry of the guest call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    pub name: CompactString,
    pub span: Span,
}

/// A raised exception: an instance of a class rooted at `Exception`.
#[derive(Clone, Error)]
#[error("{class_name}: {message}")]
pub struct Exception {
    pub payload: Rc<Instance>,
    pub class_name: CompactString,
    pub message: CompactString,
    pub span: Span,
    /// Innermost call last.
    pub traceback: Vec<CallFrame>,
    /// Set when the runtime raised the exception itself.
    pub code: Option<&'static str>,
}

impl std::fmt::Debug for Exception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exception")
            .field("class_name", &self.class_name)
            .field("message", &self.message)
            .field("span", &self.span)
            .field("traceback", &self.traceback)
            .finish()
    }
}

impl Exception {
    pub fn code(&self) -> &'static str {
        self.code.unwrap_or("RT000")
    }

    pub fn payload_value(&self) -> Value {
        Value::Instance(self.payload.clone())
    }
}

/// Everything that unwinds evaluation.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Exception(Box<Exception>),
    /// Raised by `exit` and never intercepted.
    #[error("exit({0})")]
    Exit(i32),
}

impl RuntimeError {
    pub fn as_exception(&self) -> Option<&Exception> {
        match self {
            Self::Exception(exception) => Some(exception),
            Self::Exit(_) => None,
        }
    }
}

impl From<Exception> for RuntimeError {
    fn from(exception: Exception) -> Self {
        Self::Exception(Box::new(exception))
    }
}
