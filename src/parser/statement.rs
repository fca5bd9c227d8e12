use std::rc::Rc;

use compact_str::CompactString;

use super::expression::Expression;
use crate::{lexer::Span, string::Ident};

#[derive(Debug, Clone)]
pub enum Statement {
    // Declarations
    FunctionDecl(Rc<FunctionDecl>),
    ModuleDecl(ModuleDecl),
    ClassDecl(ClassDecl),
    // Non-declarations
    Body(BodyStatement),
    Include(IncludeStatement),
    Expression(ExpressionStatement),
    If(IfStatement),
    While(WhileStatement),
    ForEach(ForEachStatement),
    Break(Span),
    Continue(Span),
    Return(ReturnStatement),
}

impl Statement {
    pub fn get_span(&self) -> Span {
        match self {
            Statement::FunctionDecl(decl) => decl.span,
            Statement::ModuleDecl(decl) => decl.span,
            Statement::ClassDecl(decl) => decl.span,
            Statement::Body(stmt) => stmt.span,
            Statement::Include(stmt) => stmt.span,
            Statement::Expression(stmt) => stmt.span,
            Statement::If(stmt) => stmt.span,
            Statement::While(stmt) => stmt.span,
            Statement::ForEach(stmt) => stmt.span,
            Statement::Break(span) | Statement::Continue(span) => *span,
            Statement::Return(stmt) => stmt.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Ident,
    pub parameters: Vec<Ident>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ModuleDecl {
    pub name: Ident,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Ident,
    pub super_class: Option<Expression>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BodyStatement {
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IncludeStatement {
    pub path: CompactString,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expr: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub condition: Expression,
    pub success: Vec<Statement>,
    pub failure: Option<Vec<Statement>>,
    pub span: Span,
}

/// `while`, `do … while`, and the loop half of a C-style `for`.
#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub condition: Option<Expression>,
    pub body: Vec<Statement>,
    /// Runs after every iteration that ends normally or with `continue`.
    pub step: Option<Expression>,
    /// Checks the condition after the body instead of before it.
    pub eval_after: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForEachStatement {
    pub variable: Ident,
    pub iterable: Expression,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub value: Option<Expression>,
    pub span: Span,
}
