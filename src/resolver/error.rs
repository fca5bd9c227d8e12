use crate::lexer::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionErrorKind {
    #[error("Can't use `break` outside of a loop.")]
    BreakOutsideLoop,
    #[error("Can't use `continue` outside of a loop.")]
    ContinueOutsideLoop,
    #[error("Can't return from outside a function.")]
    NonFunctionReturn,
}

#[derive(Debug, Error, Clone)]
#[error("{kind}")]
pub struct ResolutionError {
    pub kind: ResolutionErrorKind,
    pub span: Span,
}

impl ResolutionError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            ResolutionErrorKind::BreakOutsideLoop => "RA001",
            ResolutionErrorKind::ContinueOutsideLoop => "RA002",
            ResolutionErrorKind::NonFunctionReturn => "RA003",
        }
    }
}
