use std::rc::Rc;

use compact_str::CompactString;

use super::{expression::capture, AssignmentScope, Exit, TreeWalkInterpreter};
use crate::{
    environment::Environment,
    parser::{
        expression::Expression,
        statement::{
            ClassDecl, ForEachStatement, FunctionDecl, IfStatement, IncludeStatement, ModuleDecl,
            ReturnStatement, Statement, WhileStatement,
        },
        Parser,
    },
    resolver::Resolver,
    value::{
        error::{RuntimeError, RuntimeErrorKind},
        BuiltinClass, Class, Function, Module, Value,
    },
};

impl TreeWalkInterpreter {
    pub(crate) fn execute(
        &mut self,
        statement: &Statement,
        environment: &Environment,
    ) -> Result<Exit, RuntimeError> {
        match statement {
            Statement::FunctionDecl(decl) => self.interpret_function_declaration(decl, environment),
            Statement::ModuleDecl(decl) => self.interpret_module_declaration(decl, environment),
            Statement::ClassDecl(decl) => self.interpret_class_declaration(decl, environment),
            Statement::Body(stmt) => self.execute_block(&stmt.body, environment),
            Statement::Include(stmt) => self.interpret_include_statement(stmt, environment),
            Statement::Expression(stmt) => {
                self.evaluate(&stmt.expr, environment)?;
                Ok(Exit::Success)
            }
            Statement::If(stmt) => self.interpret_if_statement(stmt, environment),
            Statement::While(stmt) => self.interpret_while_statement(stmt, environment),
            Statement::ForEach(stmt) => self.interpret_for_each_statement(stmt, environment),
            Statement::Break(_) => Ok(Exit::Break),
            Statement::Continue(_) => Ok(Exit::Continue),
            Statement::Return(stmt) => self.interpret_return_statement(stmt, environment),
        }
    }

    /// Runs statements in order until one of them does not finish normally.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Statement],
        environment: &Environment,
    ) -> Result<Exit, RuntimeError> {
        for statement in statements {
            match self.execute(statement, environment)? {
                Exit::Success => {}
                exit => return Ok(exit),
            }
        }
        Ok(Exit::Success)
    }
}

// Declarations
impl TreeWalkInterpreter {
    fn interpret_function_declaration(
        &mut self,
        decl: &Rc<FunctionDecl>,
        environment: &Environment,
    ) -> Result<Exit, RuntimeError> {
        let target = if self.config.assignment_scope == AssignmentScope::Global
            && !environment.is_namespace()
        {
            self.globals.clone()
        } else {
            environment.clone()
        };
        // Bound before capturing so the function can see itself.
        target.bind(decl.name.name.clone(), Value::Null);
        let function = Function::new(decl.clone(), capture(environment));
        target.bind(decl.name.name.clone(), Value::Function(Rc::new(function)));
        Ok(Exit::Success)
    }

    fn interpret_class_declaration(
        &mut self,
        decl: &ClassDecl,
        environment: &Environment,
    ) -> Result<Exit, RuntimeError> {
        let super_class = match &decl.super_class {
            Some(expr) => match self.evaluate(expr, environment)? {
                Value::Class(class) => class,
                other => {
                    return Err(self.raise(
                        RuntimeErrorKind::InvalidSuperClass(other.type_name()),
                        expr.get_span(),
                    ))
                }
            },
            None => self.builtins.class(BuiltinClass::Object).clone(),
        };

        let namespace = environment.new_namespace();
        self.execute_block(&decl.body, &namespace)?;
        let attributes = namespace
            .bindings()
            .into_iter()
            .map(|(name, value)| match value {
                Value::Function(function) => {
                    let method = Function::clone(&function).into_method();
                    (name, Value::Function(Rc::new(method)))
                }
                value => (name, value),
            })
            .collect();

        let class = Class::new(&*decl.name.name, attributes, Some(super_class));
        tracing::debug!(
            class = %class.name,
            super_class = %class.super_class.as_ref().map_or("", |class| class.name.as_str()),
            "created class"
        );
        environment.bind(decl.name.name.clone(), Value::Class(Rc::new(class)));
        Ok(Exit::Success)
    }

    fn interpret_module_declaration(
        &mut self,
        decl: &ModuleDecl,
        environment: &Environment,
    ) -> Result<Exit, RuntimeError> {
        let namespace = environment.new_namespace();
        self.execute_block(&decl.body, &namespace)?;
        let module = Module {
            name: CompactString::from(&*decl.name.name),
            attributes: namespace.bindings().into_iter().collect(),
        };
        tracing::debug!(module = %module.name, "created module");
        environment.bind(decl.name.name.clone(), Value::Module(Rc::new(module)));
        Ok(Exit::Success)
    }
}

// Statement interpreter
impl TreeWalkInterpreter {
    fn interpret_include_statement(
        &mut self,
        stmt: &IncludeStatement,
        environment: &Environment,
    ) -> Result<Exit, RuntimeError> {
        let path = stmt.path.clone();
        let failure = |reason: String| RuntimeErrorKind::IncludeError {
            path: path.clone(),
            reason,
        };

        if self.include_stack.contains(&path) {
            return Err(self.raise(failure("circular include".into()), stmt.span));
        }
        let source = match self.context.read_include(&path) {
            Ok(source) => source,
            Err(error) => return Err(self.raise(failure(error.to_string()), stmt.span)),
        };
        let program = match Parser::new(&source).parse() {
            Ok(program) => program,
            Err(error) => return Err(self.raise(failure(error.to_string()), stmt.span)),
        };
        if let Err(error) = Resolver::new().resolve_program(&program) {
            return Err(self.raise(failure(error.to_string()), stmt.span));
        }

        tracing::debug!(path = %path, statements = program.statements().len(), "including");
        self.include_stack.push(path.clone());
        let result = self.execute_block(program.statements(), environment);
        self.include_stack.pop();
        result.map(|_| Exit::Success)
    }

    fn interpret_if_statement(
        &mut self,
        stmt: &IfStatement,
        environment: &Environment,
    ) -> Result<Exit, RuntimeError> {
        if self.check_condition(Some(&stmt.condition), environment)? {
            self.execute_block(&stmt.success, environment)
        } else if let Some(failure) = &stmt.failure {
            self.execute_block(failure, environment)
        } else {
            Ok(Exit::Success)
        }
    }

    fn interpret_while_statement(
        &mut self,
        stmt: &WhileStatement,
        environment: &Environment,
    ) -> Result<Exit, RuntimeError> {
        let mut check = !stmt.eval_after;
        loop {
            if check && !self.check_condition(stmt.condition.as_ref(), environment)? {
                break;
            }
            check = true;
            match self.execute_block(&stmt.body, environment)? {
                Exit::Break => break,
                Exit::Return(value) => return Ok(Exit::Return(value)),
                Exit::Success | Exit::Continue => {}
            }
            if let Some(step) = &stmt.step {
                self.evaluate(step, environment)?;
            }
        }
        Ok(Exit::Success)
    }

    /// A missing condition is always true.
    fn check_condition(
        &mut self,
        condition: Option<&Expression>,
        environment: &Environment,
    ) -> Result<bool, RuntimeError> {
        match condition {
            Some(condition) => {
                let value = self.evaluate(condition, environment)?;
                self.truthy(&value, condition.get_span())
            }
            None => Ok(true),
        }
    }

    fn interpret_for_each_statement(
        &mut self,
        stmt: &ForEachStatement,
        environment: &Environment,
    ) -> Result<Exit, RuntimeError> {
        let span = stmt.iterable.get_span();
        let iterable = self.evaluate(&stmt.iterable, environment)?;
        let iterator = self.iter_value(&iterable, span)?;
        while let Some(value) = self.next_value(&iterator, span)? {
            environment.bind(stmt.variable.name.clone(), value);
            match self.execute_block(&stmt.body, environment)? {
                Exit::Break => break,
                Exit::Return(value) => return Ok(Exit::Return(value)),
                Exit::Success | Exit::Continue => {}
            }
        }
        Ok(Exit::Success)
    }

    fn interpret_return_statement(
        &mut self,
        stmt: &ReturnStatement,
        environment: &Environment,
    ) -> Result<Exit, RuntimeError> {
        let value = match &stmt.value {
            Some(expr) => self.evaluate(expr, environment)?,
            None => Value::Null,
        };
        Ok(Exit::Return(value))
    }
}
