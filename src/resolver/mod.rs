mod error;
pub mod formatter;

use crate::parser::{
    expression::{Expression, ExpressionNode},
    statement::{FunctionDecl, Statement},
    Program,
};
pub use error::{ResolutionError, ResolutionErrorKind};

#[derive(Clone, Copy, PartialEq, Eq)]
enum FunctionEnvironment {
    None,
    Function,
}

/// Static pass checking that control flow statements appear where they can
/// take effect.
pub struct Resolver {
    function: FunctionEnvironment,
    loop_depth: usize,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            function: FunctionEnvironment::None,
            loop_depth: 0,
        }
    }

    pub fn resolve_program(mut self, program: &Program) -> Result<(), ResolutionError> {
        self.resolve_statements(program.statements())
    }

    pub fn resolve_expression_and_consume(
        mut self,
        expr: &Expression,
    ) -> Result<(), ResolutionError> {
        self.resolve_expression(expr)
    }

    fn resolve_statements(&mut self, statements: &[Statement]) -> Result<(), ResolutionError> {
        for statement in statements {
            self.resolve_statement(statement)?;
        }
        Ok(())
    }

    fn resolve_statement(&mut self, statement: &Statement) -> Result<(), ResolutionError> {
        match statement {
            Statement::FunctionDecl(decl) => self.resolve_function(decl),
            Statement::ModuleDecl(decl) => self.resolve_container(&decl.body),
            Statement::ClassDecl(decl) => {
                if let Some(super_class) = &decl.super_class {
                    self.resolve_expression(super_class)?;
                }
                self.resolve_container(&decl.body)
            }
            Statement::Body(stmt) => self.resolve_statements(&stmt.body),
            Statement::Include(_) => Ok(()),
            Statement::Expression(stmt) => self.resolve_expression(&stmt.expr),
            Statement::If(stmt) => {
                self.resolve_expression(&stmt.condition)?;
                self.resolve_statements(&stmt.success)?;
                if let Some(failure) = &stmt.failure {
                    self.resolve_statements(failure)?;
                }
                Ok(())
            }
            Statement::While(stmt) => {
                if let Some(condition) = &stmt.condition {
                    self.resolve_expression(condition)?;
                }
                if let Some(step) = &stmt.step {
                    self.resolve_expression(step)?;
                }
                self.resolve_loop_body(&stmt.body)
            }
            Statement::ForEach(stmt) => {
                self.resolve_expression(&stmt.iterable)?;
                self.resolve_loop_body(&stmt.body)
            }
            Statement::Break(span) => {
                if self.loop_depth == 0 {
                    return Err(ResolutionError {
                        kind: ResolutionErrorKind::BreakOutsideLoop,
                        span: *span,
                    });
                }
                Ok(())
            }
            Statement::Continue(span) => {
                if self.loop_depth == 0 {
                    return Err(ResolutionError {
                        kind: ResolutionErrorKind::ContinueOutsideLoop,
                        span: *span,
                    });
                }
                Ok(())
            }
            Statement::Return(stmt) => {
                if self.function == FunctionEnvironment::None {
                    return Err(ResolutionError {
                        kind: ResolutionErrorKind::NonFunctionReturn,
                        span: stmt.span,
                    });
                }
                match &stmt.value {
                    Some(value) => self.resolve_expression(value),
                    None => Ok(()),
                }
            }
        }
    }

    fn resolve_loop_body(&mut self, body: &[Statement]) -> Result<(), ResolutionError> {
        self.loop_depth += 1;
        let result = self.resolve_statements(body);
        self.loop_depth -= 1;
        result
    }

    /// Module and class bodies are neither loops nor functions.
    fn resolve_container(&mut self, body: &[Statement]) -> Result<(), ResolutionError> {
        let enclosing = (self.function, self.loop_depth);
        self.function = FunctionEnvironment::None;
        self.loop_depth = 0;
        let result = self.resolve_statements(body);
        (self.function, self.loop_depth) = enclosing;
        result
    }

    fn resolve_function(&mut self, decl: &FunctionDecl) -> Result<(), ResolutionError> {
        let enclosing = (self.function, self.loop_depth);
        self.function = FunctionEnvironment::Function;
        self.loop_depth = 0;
        let result = self.resolve_statements(&decl.body);
        (self.function, self.loop_depth) = enclosing;
        result
    }

    fn resolve_expression(&mut self, expr: &Expression) -> Result<(), ResolutionError> {
        // Only function literals can contain statements.
        for node in expr.iter_nodes() {
            if let ExpressionNode::Function(decl) = node {
                self.resolve_function(decl)?;
            }
        }
        Ok(())
    }
}
