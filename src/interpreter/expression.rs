use std::rc::Rc;

use compact_str::CompactString;

use super::{AssignmentScope, OrRaise, TreeWalkInterpreter};
use crate::{
    environment::Environment,
    lexer::Span,
    parser::expression::{
        AssignmentTarget, Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode,
        ExpressionNodeRef, InfixAssignmentOperator, InfixShortCircuitOperator,
    },
    string::{Ident, IdentName},
    value::{
        error::{RuntimeError, RuntimeErrorKind},
        Dict, Function, Value,
    },
};

/// The environment a closure created in `environment` captures.
///
/// Top-level closures see later globals. Anything nested captures a
/// snapshot that shares the cells bound so far.
pub(crate) fn capture(environment: &Environment) -> Environment {
    if environment.is_global() {
        environment.clone()
    } else {
        environment.snapshot()
    }
}

impl TreeWalkInterpreter {
    pub(crate) fn evaluate(
        &mut self,
        expr: &Expression,
        environment: &Environment,
    ) -> Result<Value, RuntimeError> {
        self.evaluate_expression_node(expr, expr.get_root_ref(), environment)
    }

    fn evaluate_expression_node(
        &mut self,
        expr: &Expression,
        node_ref: ExpressionNodeRef,
        environment: &Environment,
    ) -> Result<Value, RuntimeError> {
        let node = expr
            .get_node(node_ref)
            .expect("Node refs are created by the parser for this tree.");
        let span = expr
            .get_subspan(node_ref)
            .expect("Every node has a span.");

        match node {
            ExpressionNode::Atom(atom) => self.evaluate_atom(atom, environment),
            ExpressionNode::Group { inner } => {
                self.evaluate_expression_node(expr, *inner, environment)
            }
            ExpressionNode::Sequence { expressions } => {
                let mut last = Value::Null;
                for expression in expressions {
                    last = self.evaluate_expression_node(expr, *expression, environment)?;
                }
                Ok(last)
            }
            ExpressionNode::Prefix { operator, rhs } => {
                let rhs = self.evaluate_expression_node(expr, *rhs, environment)?;
                self.unary(*operator, rhs, span)
            }
            ExpressionNode::Infix { operator, lhs, rhs } => {
                let lhs = self.evaluate_expression_node(expr, *lhs, environment)?;
                let rhs = self.evaluate_expression_node(expr, *rhs, environment)?;
                self.binary(*operator, lhs, rhs, span)
            }
            ExpressionNode::InfixShortCircuit { operator, lhs, rhs } => {
                let lhs = self.evaluate_expression_node(expr, *lhs, environment)?;
                let is_truthy = self.truthy(&lhs, span)?;
                match (operator, is_truthy) {
                    (InfixShortCircuitOperator::And, false) | (InfixShortCircuitOperator::Or, true) => {
                        Ok(lhs)
                    }
                    _ => self.evaluate_expression_node(expr, *rhs, environment),
                }
            }
            ExpressionNode::InfixAssignment {
                operator,
                target,
                rhs,
            } => self.evaluate_assignment(expr, *operator, target, *rhs, span, environment),
            ExpressionNode::Call { callee, arguments } => {
                let callee = self.evaluate_expression_node(expr, *callee, environment)?;
                let arguments = self.evaluate_arguments(expr, arguments, environment)?;
                self.call_value(callee, arguments, span)
            }
            ExpressionNode::New { class, arguments } => {
                let class = self.evaluate_expression_node(expr, *class, environment)?;
                let arguments = self.evaluate_arguments(expr, arguments, environment)?;
                match class {
                    Value::Class(class) => self.instantiate(&class, arguments, span),
                    other => Err(self.raise(
                        RuntimeErrorKind::InvalidArgument(format!(
                            "`new` expects a class but got {}.",
                            other.type_name()
                        )),
                        span,
                    )),
                }
            }
            ExpressionNode::Subscript { object, index } => {
                let object = self.evaluate_expression_node(expr, *object, environment)?;
                let index = self.evaluate_expression_node(expr, *index, environment)?;
                self.get_item(&object, &index, span)
            }
            ExpressionNode::Get { object, name } => {
                let object = self.evaluate_expression_node(expr, *object, environment)?;
                self.get_attr(&object, &name.name, span)
            }
            ExpressionNode::Function(decl) => Ok(Value::Function(Rc::new(Function::new(
                decl.clone(),
                capture(environment),
            )))),
            ExpressionNode::List { elements } => {
                let elements = self.evaluate_arguments(expr, elements, environment)?;
                Ok(Value::list(elements))
            }
            ExpressionNode::Dict { entries } => {
                let dict = Dict::default();
                for (key, value) in entries {
                    let key = self.evaluate_expression_node(expr, *key, environment)?;
                    let value = self.evaluate_expression_node(expr, *value, environment)?;
                    dict.set(&key, value).or_raise(self, span)?;
                }
                Ok(Value::Dict(Rc::new(dict)))
            }
        }
    }

    fn evaluate_atom(
        &mut self,
        atom: &ExpressionAtom,
        environment: &Environment,
    ) -> Result<Value, RuntimeError> {
        let value = match &atom.kind {
            ExpressionAtomKind::Int(v) => Value::Int(*v),
            ExpressionAtomKind::Float(v) => Value::Float(*v),
            ExpressionAtomKind::Bool(v) => Value::Bool(*v),
            ExpressionAtomKind::Null => Value::Null,
            ExpressionAtomKind::StringLiteral(v) => Value::String(v.clone()),
            ExpressionAtomKind::Identifier(name) => {
                self.lookup_variable(name, atom.span, environment)?
            }
        };
        Ok(value)
    }

    fn lookup_variable(
        &self,
        name: &IdentName,
        span: Span,
        environment: &Environment,
    ) -> Result<Value, RuntimeError> {
        environment
            .get(name)
            .ok_or_else(|| {
                self.raise(
                    RuntimeErrorKind::VarNotFound(CompactString::from(&**name)),
                    span,
                )
            })
    }

    /// Evaluates arguments left to right, stopping at the first failure.
    fn evaluate_arguments(
        &mut self,
        expr: &Expression,
        arguments: &[ExpressionNodeRef],
        environment: &Environment,
    ) -> Result<Vec<Value>, RuntimeError> {
        arguments
            .iter()
            .map(|argument| self.evaluate_expression_node(expr, *argument, environment))
            .collect()
    }
}

// Assignment
impl TreeWalkInterpreter {
    fn evaluate_assignment(
        &mut self,
        expr: &Expression,
        operator: InfixAssignmentOperator,
        target: &AssignmentTarget,
        rhs: ExpressionNodeRef,
        span: Span,
        environment: &Environment,
    ) -> Result<Value, RuntimeError> {
        match target {
            AssignmentTarget::Variable(ident) => {
                let value = match operator {
                    InfixAssignmentOperator::Assign => {
                        self.evaluate_expression_node(expr, rhs, environment)?
                    }
                    InfixAssignmentOperator::Inplace(operator) => {
                        let current = self.lookup_variable(&ident.name, ident.span, environment)?;
                        let rhs = self.evaluate_expression_node(expr, rhs, environment)?;
                        self.binary(operator, current, rhs, span)?
                    }
                };
                self.assign_variable(ident, value.clone(), environment);
                Ok(value)
            }
            AssignmentTarget::Attribute { object, name } => {
                let object = self.evaluate_expression_node(expr, *object, environment)?;
                let value = match operator {
                    InfixAssignmentOperator::Assign => {
                        self.evaluate_expression_node(expr, rhs, environment)?
                    }
                    InfixAssignmentOperator::Inplace(operator) => {
                        let current = self.get_attr(&object, &name.name, span)?;
                        let rhs = self.evaluate_expression_node(expr, rhs, environment)?;
                        self.binary(operator, current, rhs, span)?
                    }
                };
                self.set_attr(&object, &name.name, value.clone(), span)?;
                Ok(value)
            }
            AssignmentTarget::Subscript { object, index } => {
                let object = self.evaluate_expression_node(expr, *object, environment)?;
                let index = self.evaluate_expression_node(expr, *index, environment)?;
                let value = match operator {
                    InfixAssignmentOperator::Assign => {
                        self.evaluate_expression_node(expr, rhs, environment)?
                    }
                    InfixAssignmentOperator::Inplace(operator) => {
                        let current = self.get_item(&object, &index, span)?;
                        let rhs = self.evaluate_expression_node(expr, rhs, environment)?;
                        self.binary(operator, current, rhs, span)?
                    }
                };
                self.set_item(&object, &index, value.clone(), span)?;
                Ok(value)
            }
        }
    }

    /// Writes a plain variable according to the configured assignment scope.
    ///
    /// Module and class bodies always bind locally so their bindings can be
    /// harvested.
    fn assign_variable(&self, ident: &Ident, value: Value, environment: &Environment) {
        if environment.is_namespace() {
            environment.bind(ident.name.clone(), value);
            return;
        }
        match self.config.assignment_scope {
            AssignmentScope::Lexical => {
                if !environment.set(&ident.name, value.clone()) {
                    environment.bind(ident.name.clone(), value);
                }
            }
            AssignmentScope::Global => self.globals.bind(ident.name.clone(), value),
        }
    }
}
