mod error;
pub mod expression;
pub mod formatter;
pub mod statement;

use std::rc::Rc;

use compact_str::CompactString;

pub use error::{ParserError, ParserErrorKind};
use expression::{
    Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef,
    IncompleteExpression, InfixAssignmentOperator, InfixOperator, InfixShortCircuitOperator,
    PostfixOperator, PrefixOperator,
};
use statement::{
    BodyStatement, ClassDecl, ExpressionStatement, ForEachStatement, FunctionDecl,
    IfStatement, IncludeStatement, ModuleDecl, ReturnStatement, Statement, WhileStatement,
};

use crate::{
    lexer::{unescape_string, Lexer, Span, Token, TokenKind},
    string::Ident,
};

/// A parsed source file.
#[derive(Debug, Clone, Default)]
pub struct Program {
    statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn get_statement(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<Statement> {
        self.statements
    }
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    lookahead: Option<Token>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: None,
        }
    }

    pub fn get_source(&self) -> &'src str {
        self.lexer.get_source()
    }

    fn peek(&mut self) -> Result<Token, ParserError> {
        match self.lookahead {
            Some(token) => Ok(token),
            None => {
                let token = self.lexer.next_token()?;
                self.lookahead = Some(token);
                Ok(token)
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParserError> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => Ok(self.lexer.next_token()?),
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParserError> {
        let token = self.next_token()?;
        if token.kind != expected {
            Err(ParserError {
                kind: ParserErrorKind::UnexpectedToken {
                    actual: token.kind,
                    expected,
                },
                span: token.span,
            })
        } else {
            Ok(token)
        }
    }

    fn eat_if(&mut self, next: TokenKind) -> Result<Option<Token>, ParserError> {
        let token = self.peek()?;
        if token.kind != next {
            Ok(None)
        } else {
            self.lookahead = None;
            Ok(Some(token))
        }
    }

    fn check(&mut self, next: TokenKind) -> Result<bool, ParserError> {
        Ok(self.peek()?.kind == next)
    }

    fn lexeme(&self, token: &Token) -> &'src str {
        &self.lexer.get_source()[token.span.range()]
    }

    fn expect_ident(&mut self) -> Result<Ident, ParserError> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(Ident::new(self.lexeme(&token), token.span))
    }

    fn skip_semicolons(&mut self) -> Result<(), ParserError> {
        while self.eat_if(TokenKind::Semicolon)?.is_some() {}
        Ok(())
    }
}

// Statements
impl<'src> Parser<'src> {
    pub fn parse(&mut self) -> Result<Program, ParserError> {
        let mut statements = Vec::new();
        loop {
            self.skip_semicolons()?;
            if self.check(TokenKind::Eof)? {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Program::new(statements))
    }

    pub fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        let token = self.peek()?;
        let statement = match token.kind {
            TokenKind::KeywordInclude => self.parse_include_statement()?,
            TokenKind::KeywordReturn => self.parse_return_statement()?,
            TokenKind::KeywordIf => self.parse_if_statement()?,
            TokenKind::KeywordWhile => self.parse_while_statement()?,
            TokenKind::KeywordDo => self.parse_do_while_statement()?,
            TokenKind::KeywordFor => self.parse_for_statement()?,
            TokenKind::KeywordBreak => {
                self.next_token()?;
                Statement::Break(token.span)
            }
            TokenKind::KeywordContinue => {
                self.next_token()?;
                Statement::Continue(token.span)
            }
            TokenKind::KeywordModule => self.parse_module_declaration()?,
            TokenKind::KeywordClass => self.parse_class_declaration()?,
            TokenKind::KeywordFun => {
                // `fun (` starts a function literal used as an expression.
                self.next_token()?;
                if self.check(TokenKind::LeftParenthesis)? {
                    self.parse_expression_statement_from(Some(token))?
                } else {
                    let decl = self.parse_function_rest(token.span)?;
                    Statement::FunctionDecl(Rc::new(decl))
                }
            }
            _ => self.parse_expression_statement_from(None)?,
        };
        self.eat_if(TokenKind::Semicolon)?;
        Ok(statement)
    }

    fn parse_block(&mut self) -> Result<(Vec<Statement>, Span), ParserError> {
        let left = self.expect(TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        loop {
            self.skip_semicolons()?;
            if let Some(right) = self.eat_if(TokenKind::RightBrace)? {
                return Ok((body, left.span.merge(&right.span)));
            }
            if self.check(TokenKind::Eof)? {
                let eof = self.next_token()?;
                return Err(ParserError {
                    kind: ParserErrorKind::UnexpectedToken {
                        actual: eof.kind,
                        expected: TokenKind::RightBrace,
                    },
                    span: eof.span,
                });
            }
            body.push(self.parse_statement()?);
        }
    }

    fn parse_include_statement(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordInclude)?;
        let path = self.expect(TokenKind::StringLiteral)?;
        Ok(Statement::Include(IncludeStatement {
            path: CompactString::from(unescape_string(self.lexeme(&path))),
            span: keyword.span.merge(&path.span),
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordReturn)?;
        let next = self.peek()?;
        let value = match next.kind {
            TokenKind::RightBrace | TokenKind::Semicolon | TokenKind::Eof => None,
            _ => Some(self.parse_sequence()?),
        };
        let span = value
            .as_ref()
            .map_or(keyword.span, |value| keyword.span.merge(&value.get_span()));
        Ok(Statement::Return(ReturnStatement { value, span }))
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordIf)?;
        let condition = self.parse_expression()?;
        let (success, mut span) = self.parse_block()?;
        span = keyword.span.merge(&span);

        let failure = if self.eat_if(TokenKind::KeywordElse)?.is_some() {
            if self.check(TokenKind::KeywordIf)? {
                let nested = self.parse_if_statement()?;
                span = span.merge(&nested.get_span());
                Some(vec![nested])
            } else {
                let (failure, failure_span) = self.parse_block()?;
                span = span.merge(&failure_span);
                Some(failure)
            }
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            condition,
            success,
            failure,
            span,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordWhile)?;
        let condition = self.parse_expression()?;
        let (body, span) = self.parse_block()?;
        Ok(Statement::While(WhileStatement {
            condition: Some(condition),
            body,
            step: None,
            eval_after: false,
            span: keyword.span.merge(&span),
        }))
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordDo)?;
        let (body, _) = self.parse_block()?;
        self.expect(TokenKind::KeywordWhile)?;
        let condition = self.parse_expression()?;
        let span = keyword.span.merge(&condition.get_span());
        Ok(Statement::While(WhileStatement {
            condition: Some(condition),
            body,
            step: None,
            eval_after: true,
            span,
        }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordFor)?;
        if self.eat_if(TokenKind::LeftParenthesis)?.is_none() {
            let variable = self.expect_ident()?;
            self.expect(TokenKind::KeywordIn)?;
            let iterable = self.parse_expression()?;
            let (body, span) = self.parse_block()?;
            return Ok(Statement::ForEach(ForEachStatement {
                variable,
                iterable,
                body,
                span: keyword.span.merge(&span),
            }));
        }

        let initializer = self.parse_optional_sequence(TokenKind::Semicolon)?;
        self.expect(TokenKind::Semicolon)?;
        let condition = self.parse_optional_sequence(TokenKind::Semicolon)?;
        self.expect(TokenKind::Semicolon)?;
        let step = self.parse_optional_sequence(TokenKind::RightParenthesis)?;
        self.expect(TokenKind::RightParenthesis)?;
        let (body, span) = self.parse_block()?;
        let span = keyword.span.merge(&span);

        let while_loop = Statement::While(WhileStatement {
            condition,
            body,
            step,
            eval_after: false,
            span,
        });
        let mut statements = Vec::with_capacity(2);
        if let Some(initializer) = initializer {
            statements.push(Statement::Expression(ExpressionStatement {
                span: initializer.get_span(),
                expr: initializer,
            }));
        }
        statements.push(while_loop);
        Ok(Statement::Body(BodyStatement {
            body: statements,
            span,
        }))
    }

    fn parse_optional_sequence(
        &mut self,
        terminator: TokenKind,
    ) -> Result<Option<Expression>, ParserError> {
        if self.check(terminator)? {
            Ok(None)
        } else {
            Ok(Some(self.parse_sequence()?))
        }
    }

    fn parse_module_declaration(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordModule)?;
        let name = self.expect_ident()?;
        let (body, span) = self.parse_block()?;
        Ok(Statement::ModuleDecl(ModuleDecl {
            name,
            body,
            span: keyword.span.merge(&span),
        }))
    }

    fn parse_class_declaration(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordClass)?;
        let name = self.expect_ident()?;
        let super_class = if self.eat_if(TokenKind::LeftParenthesis)?.is_some() {
            let super_class = self.parse_expression()?;
            self.expect(TokenKind::RightParenthesis)?;
            Some(super_class)
        } else {
            None
        };
        let (body, span) = self.parse_block()?;
        Ok(Statement::ClassDecl(ClassDecl {
            name,
            super_class,
            body,
            span: keyword.span.merge(&span),
        }))
    }

    /// Parses the part of a function declaration after `fun`.
    fn parse_function_rest(&mut self, start: Span) -> Result<FunctionDecl, ParserError> {
        let name = self.expect_ident()?;
        self.parse_function_signature(name, start)
    }

    fn parse_function_signature(
        &mut self,
        name: Ident,
        start: Span,
    ) -> Result<FunctionDecl, ParserError> {
        self.expect(TokenKind::LeftParenthesis)?;
        let mut parameters = Vec::new();
        if self.eat_if(TokenKind::RightParenthesis)?.is_none() {
            loop {
                parameters.push(self.expect_ident()?);
                if self.eat_if(TokenKind::Comma)?.is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RightParenthesis)?;
        }
        let (body, span) = self.parse_block()?;
        Ok(FunctionDecl {
            name,
            parameters,
            body,
            span: start.merge(&span),
        })
    }

    fn parse_expression_statement_from(
        &mut self,
        function_keyword: Option<Token>,
    ) -> Result<Statement, ParserError> {
        let mut tree = IncompleteExpression::new();
        let first = match function_keyword {
            Some(keyword) => {
                let lhs = self.parse_function_literal(keyword.span, &mut tree)?;
                self.parse_expression_pratt_from(lhs, 0, &mut tree)?
            }
            None => self.parse_expression_pratt(0, &mut tree)?,
        };
        let root = self.parse_sequence_rest(first, &mut tree)?;
        let expr = Expression::new(tree, root)
            .expect("Root was obtained from the tree itself so it must be valid.");
        Ok(Statement::Expression(ExpressionStatement {
            span: expr.get_span(),
            expr,
        }))
    }
}

// Pratt parser for expressions
impl<'src> Parser<'src> {
    /// Parses a single expression without top-level commas.
    pub fn parse_expression(&mut self) -> Result<Expression, ParserError> {
        let mut tree = IncompleteExpression::new();
        let root = self.parse_expression_pratt(0, &mut tree)?;
        Ok(Expression::new(tree, root)
            .expect("Root was obtained from the tree itself so it must be valid."))
    }

    /// Parses a comma separated sequence whose value is its last element.
    pub fn parse_sequence(&mut self) -> Result<Expression, ParserError> {
        let mut tree = IncompleteExpression::new();
        let first = self.parse_expression_pratt(0, &mut tree)?;
        let root = self.parse_sequence_rest(first, &mut tree)?;
        Ok(Expression::new(tree, root)
            .expect("Root was obtained from the tree itself so it must be valid."))
    }

    fn parse_sequence_rest(
        &mut self,
        first: ExpressionNodeRef,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        if !self.check(TokenKind::Comma)? {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat_if(TokenKind::Comma)?.is_some() {
            expressions.push(self.parse_expression_pratt(0, tree)?);
        }
        let span = self.span_of(tree, first).merge(&self.span_of(
            tree,
            *expressions.last().expect("Sequence has at least one element."),
        ));
        Ok(tree.push(ExpressionNode::Sequence { expressions }, span))
    }

    fn span_of(&self, tree: &IncompleteExpression, node: ExpressionNodeRef) -> Span {
        tree.get_span(node)
            .expect("Caller should make sure the ref is valid.")
    }

    fn parse_expression_pratt(
        &mut self,
        min_bp: u8,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        let lhs = self.parse_left_expression(tree)?;
        self.parse_expression_pratt_from(lhs, min_bp, tree)
    }

    fn parse_expression_pratt_from(
        &mut self,
        mut lhs: ExpressionNodeRef,
        min_bp: u8,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        loop {
            let token = self.peek()?;

            if let Some(operator) = PostfixOperator::from_token(token.kind) {
                if operator.get_binding_power() < min_bp {
                    break;
                }
                self.next_token()?;
                lhs = self.parse_postfix(operator, lhs, tree)?;
                continue;
            }

            if let Some(operator) = InfixOperator::from_token(token.kind) {
                let (l_bp, r_bp) = operator.get_binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.next_token()?;
                let rhs = self.parse_expression_pratt(r_bp, tree)?;
                let span = self.span_of(tree, lhs).merge(&self.span_of(tree, rhs));
                lhs = tree.push(ExpressionNode::Infix { operator, lhs, rhs }, span);
                continue;
            }

            if let Some(operator) = InfixShortCircuitOperator::from_token(token.kind) {
                let (l_bp, r_bp) = operator.get_binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.next_token()?;
                let rhs = self.parse_expression_pratt(r_bp, tree)?;
                let span = self.span_of(tree, lhs).merge(&self.span_of(tree, rhs));
                lhs = tree.push(
                    ExpressionNode::InfixShortCircuit { operator, lhs, rhs },
                    span,
                );
                continue;
            }

            if let Some(operator) = InfixAssignmentOperator::from_token(token.kind) {
                let (l_bp, r_bp) = operator.get_binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.next_token()?;
                let target = tree
                    .get_node(lhs)
                    .and_then(ExpressionNode::get_assignment_target)
                    .ok_or_else(|| ParserError {
                        kind: ParserErrorKind::InvalidAssignmentTarget,
                        span: token.span,
                    })?;
                let rhs = self.parse_expression_pratt(r_bp, tree)?;
                let span = self.span_of(tree, lhs).merge(&self.span_of(tree, rhs));
                lhs = tree.push(
                    ExpressionNode::InfixAssignment {
                        operator,
                        target,
                        rhs,
                    },
                    span,
                );
                continue;
            }

            break;
        }
        Ok(lhs)
    }

    fn parse_postfix(
        &mut self,
        operator: PostfixOperator,
        lhs: ExpressionNodeRef,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        let start = self.span_of(tree, lhs);
        match operator {
            PostfixOperator::Call => {
                let (arguments, end) =
                    self.parse_delimited(TokenKind::RightParenthesis, tree)?;
                Ok(tree.push(
                    ExpressionNode::Call {
                        callee: lhs,
                        arguments,
                    },
                    start.merge(&end),
                ))
            }
            PostfixOperator::Subscript => {
                let index = self.parse_expression_pratt(0, tree)?;
                let end = self.expect(TokenKind::RightBracket)?;
                Ok(tree.push(
                    ExpressionNode::Subscript { object: lhs, index },
                    start.merge(&end.span),
                ))
            }
            PostfixOperator::Dot => {
                let name = self.expect_ident()?;
                let span = start.merge(&name.span);
                Ok(tree.push(ExpressionNode::Get { object: lhs, name }, span))
            }
        }
    }

    /// Parses comma separated expressions up to and including `closing`.
    fn parse_delimited(
        &mut self,
        closing: TokenKind,
        tree: &mut IncompleteExpression,
    ) -> Result<(Vec<ExpressionNodeRef>, Span), ParserError> {
        let mut elements = Vec::new();
        loop {
            if let Some(end) = self.eat_if(closing)? {
                return Ok((elements, end.span));
            }
            elements.push(self.parse_expression_pratt(0, tree)?);
            if self.eat_if(TokenKind::Comma)?.is_none() {
                let end = self.expect(closing)?;
                return Ok((elements, end.span));
            }
        }
    }

    fn parse_left_expression(
        &mut self,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        let token = self.next_token()?;
        let span = token.span;

        let kind = match token.kind {
            TokenKind::IntLiteral => {
                let value = self
                    .lexeme(&token)
                    .replace('_', "")
                    .parse()
                    .expect("Integer literals are validated by the lexer.");
                ExpressionAtomKind::Int(value)
            }
            TokenKind::FloatLiteral => {
                let value = self
                    .lexeme(&token)
                    .replace('_', "")
                    .parse()
                    .expect("Float literals are guaranteed to be parseable into f64.");
                ExpressionAtomKind::Float(value)
            }
            TokenKind::StringLiteral => ExpressionAtomKind::StringLiteral(CompactString::from(
                unescape_string(self.lexeme(&token)),
            )),
            TokenKind::Ident => ExpressionAtomKind::Identifier(self.lexeme(&token).into()),
            TokenKind::KeywordTrue => ExpressionAtomKind::Bool(true),
            TokenKind::KeywordFalse => ExpressionAtomKind::Bool(false),
            TokenKind::KeywordNull => ExpressionAtomKind::Null,
            TokenKind::LeftParenthesis => {
                let inner = self.parse_expression_pratt(0, tree)?;
                let inner = self.parse_sequence_rest(inner, tree)?;
                let end = self.expect(TokenKind::RightParenthesis)?;
                return Ok(tree.push(ExpressionNode::Group { inner }, span.merge(&end.span)));
            }
            TokenKind::LeftBracket => {
                let (elements, end) = self.parse_delimited(TokenKind::RightBracket, tree)?;
                return Ok(tree.push(ExpressionNode::List { elements }, span.merge(&end)));
            }
            TokenKind::LeftBrace => return self.parse_dict_literal(span, tree),
            TokenKind::KeywordFun => return self.parse_function_literal(span, tree),
            TokenKind::KeywordNew => return self.parse_new_expression(span, tree),
            kind => {
                if let Some(operator) = PrefixOperator::from_token(kind) {
                    let rhs = self.parse_expression_pratt(operator.get_binding_power(), tree)?;
                    let span = span.merge(&self.span_of(tree, rhs));
                    return Ok(tree.push(ExpressionNode::Prefix { operator, rhs }, span));
                }
                return Err(ParserError {
                    kind: ParserErrorKind::NonExpression(kind),
                    span,
                });
            }
        };
        Ok(tree.push(ExpressionNode::Atom(ExpressionAtom { kind, span }), span))
    }

    fn parse_dict_literal(
        &mut self,
        start: Span,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        let mut entries = Vec::new();
        let end = loop {
            if let Some(end) = self.eat_if(TokenKind::RightBrace)? {
                break end;
            }
            let key = self.parse_expression_pratt(0, tree)?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression_pratt(0, tree)?;
            entries.push((key, value));
            if self.eat_if(TokenKind::Comma)?.is_none() {
                break self.expect(TokenKind::RightBrace)?;
            }
        };
        Ok(tree.push(ExpressionNode::Dict { entries }, start.merge(&end.span)))
    }

    /// Parses `fun (params) { body }` once `fun` has been consumed.
    fn parse_function_literal(
        &mut self,
        start: Span,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        let name = Ident::new("<anonymous>", start);
        let decl = self.parse_function_signature(name, start)?;
        let span = decl.span;
        Ok(tree.push(ExpressionNode::Function(Rc::new(decl)), span))
    }

    /// Parses `new Path.To.Class(args)` once `new` has been consumed.
    fn parse_new_expression(
        &mut self,
        start: Span,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        let token = self.next_token()?;
        let mut class = match token.kind {
            TokenKind::Ident => {
                let kind = ExpressionAtomKind::Identifier(self.lexeme(&token).into());
                tree.push(
                    ExpressionNode::Atom(ExpressionAtom {
                        kind,
                        span: token.span,
                    }),
                    token.span,
                )
            }
            TokenKind::LeftParenthesis => {
                let inner = self.parse_expression_pratt(0, tree)?;
                let end = self.expect(TokenKind::RightParenthesis)?;
                tree.push(
                    ExpressionNode::Group { inner },
                    token.span.merge(&end.span),
                )
            }
            _ => {
                return Err(ParserError {
                    kind: ParserErrorKind::InvalidNewTarget,
                    span: token.span,
                })
            }
        };
        while self.eat_if(TokenKind::Dot)?.is_some() {
            class = self.parse_postfix(PostfixOperator::Dot, class, tree)?;
        }
        self.expect(TokenKind::LeftParenthesis)?;
        let (arguments, end) = self.parse_delimited(TokenKind::RightParenthesis, tree)?;
        Ok(tree.push(
            ExpressionNode::New { class, arguments },
            start.merge(&end),
        ))
    }
}
