//! Global functions and classes available to every program.

use std::rc::Rc;

use super::{builtins::int_argument, Builtins, TreeWalkInterpreter};
use crate::{
    environment::Environment,
    lexer::Span,
    string::IdentName,
    value::{
        error::{RuntimeError, RuntimeErrorKind},
        numeric::MAX_SEQUENCE_LENGTH,
        Arity, BuiltinClass, Class, Instance, NativeFn, NativeFunction, Value,
    },
};

pub(crate) fn install(globals: &Environment, builtins: &Builtins) {
    for class in builtins.iter() {
        globals.bind(class.name.as_str(), Value::Class(class.clone()));
    }

    let functions = [
        NativeFn::new("print", Arity::at_least(0), print),
        NativeFn::new("str", Arity::exact(1), str_value),
        NativeFn::new("dump", Arity::exact(1), dump_value),
        NativeFn::new("len", Arity::exact(1), len),
        NativeFn::new("iter", Arity::exact(1), iter),
        NativeFn::new("next", Arity::exact(1), next),
        NativeFn::new("Item", Arity::exact(1), item),
        NativeFn::new("raise", Arity::exact(1), raise),
        NativeFn::new("exit", Arity::range(0, 1), exit),
        NativeFn::new("range", Arity::range(1, 3), range),
        NativeFn::new("type", Arity::exact(1), type_of),
        NativeFn::new("isinstance", Arity::exact(2), is_instance),
        NativeFn::new("int", Arity::exact(1), int),
        NativeFn::new("float", Arity::exact(1), float),
    ];
    for function in functions {
        let name = IdentName::from(function.name());
        globals.bind(name, function.into_value());
    }
}

fn invalid_argument(
    interpreter: &TreeWalkInterpreter,
    message: String,
    span: Span,
) -> RuntimeError {
    interpreter.raise(RuntimeErrorKind::InvalidArgument(message), span)
}

fn print(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let parts = arguments
        .iter()
        .map(|argument| interpreter.stringify(argument, span))
        .collect::<Result<Vec<_>, _>>()?;
    interpreter.context().writeln(&parts.join(" "));
    Ok(Value::Null)
}

fn str_value(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    Ok(Value::string(interpreter.stringify(&arguments[0], span)?))
}

fn dump_value(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    Ok(Value::string(interpreter.dump(&arguments[0], span)?))
}

fn len(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    interpreter.call_method(&arguments[0], "length", Vec::new(), span)
}

fn iter(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    interpreter.iter_value(&arguments[0], span)
}

fn next(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    interpreter.call_method(&arguments[0], "next", Vec::new(), span)
}

fn item(
    _span: Span,
    _interpreter: &mut TreeWalkInterpreter,
    mut arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    Ok(Value::item(arguments.remove(0)))
}

fn raise(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let exception_class = interpreter.builtins().class(BuiltinClass::Exception).clone();
    let payload = match &arguments[0] {
        Value::Instance(instance) if instance.class.is_subclass_of(&exception_class) => {
            instance.clone()
        }
        Value::String(message) => {
            let instance = Instance::new(exception_class);
            instance.set_field("message", Value::String(message.clone()));
            Rc::new(instance)
        }
        other => {
            return Err(invalid_argument(
                interpreter,
                format!(
                    "raise expects an Exception instance or a message but got {}.",
                    other.type_name()
                ),
                span,
            ))
        }
    };
    Err(interpreter.raise_instance(payload, span))
}

fn exit(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let code = match arguments.first() {
        None => 0,
        Some(code) => int_argument(interpreter, code, "Exit code", span)?,
    };
    let code = i32::try_from(code).map_err(|_| {
        invalid_argument(interpreter, format!("Exit code {code} is out of range."), span)
    })?;
    Err(RuntimeError::Exit(code))
}

fn range(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let bounds = arguments
        .iter()
        .map(|argument| int_argument(interpreter, argument, "Range bound", span))
        .collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match bounds[..] {
        [stop] => (0, stop, 1),
        [start, stop] => (start, stop, 1),
        [start, stop, step] => (start, stop, step),
        _ => unreachable!("arity is checked before the call"),
    };
    if step == 0 {
        return Err(invalid_argument(
            interpreter,
            "Range step must not be zero.".into(),
            span,
        ));
    }

    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let count = if step > 0 {
        (stop - start + step - 1) / step
    } else {
        (start - stop - step - 1) / -step
    }
    .max(0);
    if count > MAX_SEQUENCE_LENGTH as i128 {
        return Err(interpreter.raise(RuntimeErrorKind::Overflow("range"), span));
    }
    // Every element lies between start and stop, so it fits in an i64.
    let elements = (0..count)
        .map(|index| Value::Int((start + index * step) as i64))
        .collect();
    Ok(Value::list(elements))
}

fn type_of(
    _span: Span,
    _interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    Ok(Value::String(arguments[0].type_name()))
}

fn class_of(builtins: &Builtins, value: &Value) -> Option<Rc<Class>> {
    match value {
        Value::Instance(instance) => Some(instance.class.clone()),
        Value::List(_) => Some(builtins.class(BuiltinClass::List).clone()),
        Value::Dict(_) => Some(builtins.class(BuiltinClass::Dict).clone()),
        Value::String(_) => Some(builtins.class(BuiltinClass::String).clone()),
        _ => None,
    }
}

fn is_instance(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let Value::Class(ancestor) = &arguments[1] else {
        return Err(invalid_argument(
            interpreter,
            format!(
                "isinstance expects a class but got {}.",
                arguments[1].type_name()
            ),
            span,
        ));
    };
    let result = class_of(interpreter.builtins(), &arguments[0])
        .map_or(false, |class| class.is_subclass_of(ancestor));
    Ok(Value::Bool(result))
}

fn int(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let value = match &arguments[0] {
        Value::Int(v) => *v,
        Value::Bool(v) => i64::from(*v),
        Value::Float(v) if v.is_finite() && v.trunc().abs() < i64::MAX as f64 => v.trunc() as i64,
        Value::String(text) => text.trim().parse().map_err(|_| {
            invalid_argument(
                interpreter,
                format!("Invalid literal for int: {}.", arguments[0].repr()),
                span,
            )
        })?,
        other => {
            return Err(invalid_argument(
                interpreter,
                format!("Can't convert {} to int.", other.repr()),
                span,
            ))
        }
    };
    Ok(Value::Int(value))
}

fn float(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let value = match &arguments[0] {
        Value::Int(v) => *v as f64,
        Value::Float(v) => *v,
        Value::Bool(v) => f64::from(u8::from(*v)),
        Value::String(text) => text.trim().parse().map_err(|_| {
            invalid_argument(
                interpreter,
                format!("Invalid literal for float: {}.", arguments[0].repr()),
                span,
            )
        })?,
        other => {
            return Err(invalid_argument(
                interpreter,
                format!("Can't convert {} to float.", other.type_name()),
                span,
            ))
        }
    };
    Ok(Value::Float(value))
}
