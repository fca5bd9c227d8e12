//! Operator dispatch with overload hooks.

use std::rc::Rc;

use super::{OrRaise, TreeWalkInterpreter};
use crate::{
    lexer::Span,
    parser::expression::{InfixOperator, PrefixOperator},
    value::{error::RuntimeError, numeric, BuiltinClass, Instance, Value},
};

impl TreeWalkInterpreter {
    /// Fetches `name` from `instance` and calls it.
    ///
    /// Returns `None` only when fetching the hook failed with `AttrNotFound`
    /// or `VarNotFound`. Failures raised by the hook itself propagate.
    pub(crate) fn call_hook(
        &mut self,
        instance: &Rc<Instance>,
        name: &str,
        arguments: Vec<Value>,
        span: Span,
    ) -> Result<Option<Value>, RuntimeError> {
        let hook = match self.get_attr(&Value::Instance(instance.clone()), name, span) {
            Ok(hook) => hook,
            Err(error) if self.is_missing_hook(&error) => return Ok(None),
            Err(error) => return Err(error),
        };
        self.call_value(hook, arguments, span).map(Some)
    }

    fn is_missing_hook(&self, error: &RuntimeError) -> bool {
        error.as_exception().map_or(false, |exception| {
            let class = &exception.payload.class;
            self.builtins.is(class, BuiltinClass::AttrNotFound)
                || self.builtins.is(class, BuiltinClass::VarNotFound)
        })
    }

    pub(crate) fn binary(
        &mut self,
        operator: InfixOperator,
        lhs: Value,
        rhs: Value,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        if let Value::Instance(instance) = &lhs {
            if let Some(result) = self.call_hook(instance, operator.hook(), vec![rhs.clone()], span)? {
                return Ok(result);
            }
            if operator == InfixOperator::BangEqual {
                let equal = self.binary(InfixOperator::EqualEqual, lhs.clone(), rhs, span)?;
                return Ok(Value::Bool(!self.truthy(&equal, span)?));
            }
        }
        numeric::binary(operator, &lhs, &rhs).or_raise(self, span)
    }

    pub(crate) fn unary(
        &mut self,
        operator: PrefixOperator,
        operand: Value,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        if let Value::Instance(instance) = &operand {
            if let Some(result) = self.call_hook(instance, operator.hook(), Vec::new(), span)? {
                return Ok(result);
            }
            if operator == PrefixOperator::Bang {
                return Ok(Value::Bool(!self.truthy(&operand, span)?));
            }
        }
        numeric::unary(operator, &operand).or_raise(self, span)
    }

    /// Truthiness, consulting `__bool__` on instances.
    pub(crate) fn truthy(&mut self, value: &Value, span: Span) -> Result<bool, RuntimeError> {
        match value {
            Value::Instance(instance) => Ok(self
                .call_hook(instance, "__bool__", Vec::new(), span)?
                .map_or(true, |result| result.is_truthy())),
            value => Ok(value.is_truthy()),
        }
    }

    /// `==` including the `__eq__` hook.
    pub(crate) fn values_equal(
        &mut self,
        lhs: &Value,
        rhs: &Value,
        span: Span,
    ) -> Result<bool, RuntimeError> {
        let result = self.binary(InfixOperator::EqualEqual, lhs.clone(), rhs.clone(), span)?;
        self.truthy(&result, span)
    }
}
