use std::rc::Rc;

use compact_str::{format_compact, CompactString};

use super::{object::bind_method, Exit, OrRaise, TreeWalkInterpreter};
use crate::{
    lexer::Span,
    value::{
        describe_arity,
        error::{CallFrame, RuntimeError, RuntimeErrorKind},
        BuiltinClass, Class, Function, Instance, Value,
    },
};

/// Remaining host stack below which a call grows the stack.
const RED_ZONE: usize = 100 * 1024;
/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

fn callee_name(callee: &Value) -> CompactString {
    match callee {
        Value::Function(function) => function.name.clone(),
        Value::NativeFunction(native) => native.name().into(),
        Value::Class(class) => class.name.clone(),
        Value::Instance(instance) => instance.class.name.clone(),
        value => value.type_name(),
    }
}

impl TreeWalkInterpreter {
    /// Calls any callable value, recording it on the call stack.
    pub(crate) fn call_value(
        &mut self,
        callee: Value,
        arguments: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        self.call_stack.push(CallFrame {
            name: callee_name(&callee),
            span,
        });
        if self.call_stack.len() > self.config.max_call_depth {
            let error = self.raise(
                RuntimeErrorKind::StackOverflow(self.config.max_call_depth),
                span,
            );
            self.call_stack.pop();
            return Err(error);
        }
        let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
            self.dispatch_call(callee, arguments, span)
        });
        self.call_stack.pop();
        result
    }

    fn dispatch_call(
        &mut self,
        callee: Value,
        arguments: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(function) => self.call_function(&function, arguments, span),
            Value::NativeFunction(native) => {
                let arguments = native.prepare_arguments(arguments).or_raise(self, span)?;
                native.function.call(span, self, arguments)
            }
            Value::Class(class) => self.instantiate(&class, arguments, span),
            Value::Instance(instance) => {
                match self.call_hook(&instance, "__call__", arguments, span)? {
                    Some(result) => Ok(result),
                    None => Err(self.raise(
                        RuntimeErrorKind::NotCallable(instance.class.name.clone()),
                        span,
                    )),
                }
            }
            value => Err(self.raise(RuntimeErrorKind::NotCallable(value.type_name()), span)),
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(function = %function.name))]
    fn call_function(
        &mut self,
        function: &Function,
        mut arguments: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let frame = function.closure.new_scope();
        match &function.receiver {
            Some(receiver) => frame.bind("this", receiver.clone()),
            None if function.is_method => {
                if arguments.is_empty() {
                    return Err(self.raise(
                        RuntimeErrorKind::ArgCount {
                            name: function.name.clone(),
                            expected: describe_arity(function.arity() + 1, Some(function.arity() + 1)),
                            actual: 0,
                        },
                        span,
                    ));
                }
                frame.bind("this", arguments.remove(0));
            }
            None => {}
        }

        if arguments.len() != function.arity() {
            return Err(self.raise(
                RuntimeErrorKind::ArgCount {
                    name: function.name.clone(),
                    expected: format_compact!("{}", function.arity()),
                    actual: arguments.len(),
                },
                span,
            ));
        }
        for (parameter, argument) in function.decl.parameters.iter().zip(arguments) {
            frame.bind(parameter.name.clone(), argument);
        }

        match self.execute_block(&function.decl.body, &frame)? {
            Exit::Return(value) => Ok(value),
            Exit::Success | Exit::Break | Exit::Continue => Ok(Value::Null),
        }
    }

    /// Creates an instance of `class` and runs its initializer.
    pub(crate) fn instantiate(
        &mut self,
        class: &Rc<Class>,
        arguments: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        if self.builtins.is(class, BuiltinClass::List) {
            return Ok(Value::list(arguments));
        }
        if self.builtins.is(class, BuiltinClass::Dict) {
            if !arguments.is_empty() {
                return Err(self.raise(
                    RuntimeErrorKind::ArgCount {
                        name: class.name.clone(),
                        expected: "0".into(),
                        actual: arguments.len(),
                    },
                    span,
                ));
            }
            return Ok(Value::Dict(Rc::default()));
        }

        let instance = Value::Instance(Rc::new(Instance::new(class.clone())));
        match class.find_attribute("__init__") {
            Some(initializer) => {
                self.call_value(bind_method(initializer, &instance), arguments, span)?;
            }
            None if !arguments.is_empty() => {
                return Err(self.raise(
                    RuntimeErrorKind::ArgCount {
                        name: class.name.clone(),
                        expected: "0".into(),
                        actual: arguments.len(),
                    },
                    span,
                ));
            }
            None => {}
        }
        Ok(instance)
    }
}
