pub mod environment;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod string;
pub mod value;

use thiserror::Error;

use interpreter::{InterpreterConfig, StdioContext, SystemContext, TreeWalkInterpreter};
use parser::{Parser, ParserError};
use resolver::{ResolutionError, Resolver};
use value::{
    error::{Exception, RuntimeError},
    Value,
};

/// Any failure of a whole evaluation.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Parse(#[from] ParserError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Runtime(Box<Exception>),
    #[error("Program exited with code {0}.")]
    Exit(i32),
}

impl From<RuntimeError> for EvalError {
    fn from(error: RuntimeError) -> Self {
        match error {
            RuntimeError::Exception(exception) => Self::Runtime(exception),
            RuntimeError::Exit(code) => Self::Exit(code),
        }
    }
}

/// Parses, checks and runs `source` with stdio and the default configuration.
///
/// Returns the value of the last top-level expression statement, or `null`.
pub fn evaluate(source: &str) -> Result<Value, EvalError> {
    evaluate_with(source, StdioContext::new(), InterpreterConfig::default())
}

pub fn evaluate_with(
    source: &str,
    context: impl SystemContext + 'static,
    config: InterpreterConfig,
) -> Result<Value, EvalError> {
    let program = Parser::new(source).parse()?;
    Resolver::new().resolve_program(&program)?;
    let mut interpreter = TreeWalkInterpreter::new(context, config);
    Ok(interpreter.run(&program)?)
}
