use std::rc::Rc;

use compact_str::{CompactString, ToCompactString};
use indexmap::IndexMap;

use super::{OrRaise, TreeWalkInterpreter};
use crate::{
    lexer::Span,
    string::IdentName,
    value::{
        error::{RuntimeError, RuntimeErrorKind},
        native::NativeCallback,
        Arity, BuiltinClass, Class, Dict, Instance, List, NativeFn, Value,
    },
};

/// The classes every interpreter starts with.
///
/// The runtime compares against these by identity, so each interpreter owns
/// exactly one copy of each.
pub struct Builtins {
    classes: Vec<Rc<Class>>,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    pub fn new() -> Self {
        let mut classes: Vec<Rc<Class>> = Vec::with_capacity(BuiltinClass::ALL.len());
        for which in BuiltinClass::ALL {
            let super_class = which
                .parent()
                .map(|parent| classes[parent as usize].clone());
            classes.push(Rc::new(Class::new(
                which.name(),
                methods(which),
                super_class,
            )));
        }
        Self { classes }
    }

    pub fn class(&self, which: BuiltinClass) -> &Rc<Class> {
        &self.classes[which as usize]
    }

    /// Whether `class` is the built-in `which` itself, not a subclass.
    pub fn is(&self, class: &Rc<Class>, which: BuiltinClass) -> bool {
        Rc::ptr_eq(class, self.class(which))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rc<Class>> {
        self.classes.iter()
    }
}

fn method(name: &'static str, arity: Arity, callback: NativeCallback) -> (IdentName, Value) {
    (name.into(), NativeFn::new(name, arity, callback).into_value())
}

fn methods(which: BuiltinClass) -> IndexMap<IdentName, Value> {
    let methods = match which {
        BuiltinClass::Exception => vec![
            method("__init__", Arity::range(1, 2), exception_init),
            method("__str__", Arity::exact(1), exception_str),
        ],
        BuiltinClass::List => vec![
            method("get", Arity::exact(2), list_get),
            method("set", Arity::exact(3), list_set),
            method("length", Arity::exact(1), list_length),
            method("push", Arity::exact(2), list_push),
            method("insert", Arity::exact(3), list_insert),
            method("remove", Arity::exact(2), list_remove),
            method("pop", Arity::exact(1), list_pop),
            method("contains", Arity::exact(2), list_contains),
            method("map", Arity::exact(2), list_map),
            method("filter", Arity::exact(2), list_filter),
            method("reduce", Arity::range(2, 3), list_reduce),
            method("iter", Arity::exact(1), list_iter),
        ],
        BuiltinClass::Dict => vec![
            method("get", Arity::range(2, 3), dict_get),
            method("set", Arity::exact(3), dict_set),
            method("length", Arity::exact(1), dict_length),
            method("remove", Arity::exact(2), dict_remove),
            method("contains", Arity::exact(2), dict_contains),
            method("keys", Arity::exact(1), dict_keys),
            method("values", Arity::exact(1), dict_values),
            method("iter", Arity::exact(1), dict_iter),
        ],
        BuiltinClass::String => vec![
            method("length", Arity::exact(1), string_length),
            method("upper", Arity::exact(1), string_upper),
            method("lower", Arity::exact(1), string_lower),
            method("split", Arity::range(1, 2), string_split),
            method("iter", Arity::exact(1), string_iter),
        ],
        BuiltinClass::ListIterator => vec![
            method("next", Arity::exact(1), list_iterator_next),
            method("iter", Arity::exact(1), list_iterator_iter),
        ],
        _ => Vec::new(),
    };
    methods.into_iter().collect()
}

fn invalid_receiver(
    interpreter: &TreeWalkInterpreter,
    expected: &str,
    actual: Option<&Value>,
    span: Span,
) -> RuntimeError {
    let actual = actual.map_or_else(|| CompactString::from("nothing"), Value::type_name);
    interpreter.raise(
        RuntimeErrorKind::InvalidArgument(format!("Expected a {expected} receiver but got {actual}.")),
        span,
    )
}

fn this_list(
    interpreter: &TreeWalkInterpreter,
    arguments: &[Value],
    span: Span,
) -> Result<Rc<List>, RuntimeError> {
    match arguments.first() {
        Some(Value::List(list)) => Ok(list.clone()),
        other => Err(invalid_receiver(interpreter, "list", other, span)),
    }
}

fn this_dict(
    interpreter: &TreeWalkInterpreter,
    arguments: &[Value],
    span: Span,
) -> Result<Rc<Dict>, RuntimeError> {
    match arguments.first() {
        Some(Value::Dict(dict)) => Ok(dict.clone()),
        other => Err(invalid_receiver(interpreter, "dict", other, span)),
    }
}

fn this_string(
    interpreter: &TreeWalkInterpreter,
    arguments: &[Value],
    span: Span,
) -> Result<CompactString, RuntimeError> {
    match arguments.first() {
        Some(Value::String(text)) => Ok(text.clone()),
        other => Err(invalid_receiver(interpreter, "string", other, span)),
    }
}

fn this_instance(
    interpreter: &TreeWalkInterpreter,
    arguments: &[Value],
    span: Span,
) -> Result<Rc<Instance>, RuntimeError> {
    match arguments.first() {
        Some(Value::Instance(instance)) => Ok(instance.clone()),
        other => Err(invalid_receiver(interpreter, "instance", other, span)),
    }
}

pub(crate) fn int_argument(
    interpreter: &TreeWalkInterpreter,
    value: &Value,
    what: &str,
    span: Span,
) -> Result<i64, RuntimeError> {
    match value {
        Value::Int(v) => Ok(*v),
        value => Err(interpreter.raise(
            RuntimeErrorKind::InvalidArgument(format!(
                "{what} must be an int, not {}.",
                value.type_name()
            )),
            span,
        )),
    }
}

/// A fresh `ListIterator` walking `items`.
pub(crate) fn list_iterator(interpreter: &TreeWalkInterpreter, items: Vec<Value>) -> Value {
    let class = interpreter.builtins().class(BuiltinClass::ListIterator).clone();
    let iterator = Instance::new(class);
    iterator.set_field("__items__", Value::list(items));
    iterator.set_field("__index__", Value::Int(0));
    Value::Instance(Rc::new(iterator))
}

// Exception

fn exception_init(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let this = this_instance(interpreter, &arguments, span)?;
    let message = arguments.get(1).cloned().unwrap_or(Value::Null);
    this.set_field("message", message);
    Ok(Value::Null)
}

fn exception_str(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let this = this_instance(interpreter, &arguments, span)?;
    match this.get_field("message") {
        None | Some(Value::Null) => Ok(Value::string("")),
        Some(message) => Ok(Value::string(interpreter.stringify(&message, span)?)),
    }
}

// List

fn list_get(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let list = this_list(interpreter, &arguments, span)?;
    let index = int_argument(interpreter, &arguments[1], "List index", span)?;
    list.get(index).or_raise(interpreter, span)
}

fn list_set(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let list = this_list(interpreter, &arguments, span)?;
    let index = int_argument(interpreter, &arguments[1], "List index", span)?;
    list.set(index, arguments[2].clone())
        .or_raise(interpreter, span)?;
    Ok(Value::Null)
}

fn list_length(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let list = this_list(interpreter, &arguments, span)?;
    Ok(Value::Int(list.len() as i64))
}

fn list_push(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let list = this_list(interpreter, &arguments, span)?;
    list.push(arguments[1].clone());
    Ok(Value::Null)
}

fn list_insert(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let list = this_list(interpreter, &arguments, span)?;
    let index = int_argument(interpreter, &arguments[1], "List index", span)?;
    list.insert(index, arguments[2].clone())
        .or_raise(interpreter, span)?;
    Ok(Value::Null)
}

fn list_remove(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let list = this_list(interpreter, &arguments, span)?;
    let index = int_argument(interpreter, &arguments[1], "List index", span)?;
    list.remove(index).or_raise(interpreter, span)
}

fn list_pop(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let list = this_list(interpreter, &arguments, span)?;
    list.pop().or_raise(interpreter, span)
}

fn list_contains(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let list = this_list(interpreter, &arguments, span)?;
    for element in list.snapshot() {
        if interpreter.values_equal(&element, &arguments[1], span)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn list_map(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let list = this_list(interpreter, &arguments, span)?;
    let mapped = list
        .snapshot()
        .into_iter()
        .map(|element| interpreter.call_value(arguments[1].clone(), vec![element], span))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::list(mapped))
}

fn list_filter(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let list = this_list(interpreter, &arguments, span)?;
    let mut kept = Vec::new();
    for element in list.snapshot() {
        let verdict = interpreter.call_value(arguments[1].clone(), vec![element.clone()], span)?;
        if interpreter.truthy(&verdict, span)? {
            kept.push(element);
        }
    }
    Ok(Value::list(kept))
}

fn list_reduce(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let list = this_list(interpreter, &arguments, span)?;
    let mut elements = list.snapshot().into_iter();
    let initial = match arguments.get(2) {
        Some(initial) => Some(initial.clone()),
        None => elements.next(),
    };
    let Some(mut accumulator) = initial else {
        return Err(interpreter.raise(
            RuntimeErrorKind::InvalidArgument(
                "reduce of an empty list needs an initial value.".into(),
            ),
            span,
        ));
    };
    for element in elements {
        accumulator = interpreter.call_value(arguments[1].clone(), vec![accumulator, element], span)?;
    }
    Ok(accumulator)
}

fn list_iter(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let list = this_list(interpreter, &arguments, span)?;
    Ok(list_iterator(interpreter, list.snapshot()))
}

// Dict

fn dict_get(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let dict = this_dict(interpreter, &arguments, span)?;
    match arguments.get(2) {
        Some(default) => Ok(dict
            .get(&arguments[1])
            .or_raise(interpreter, span)?
            .unwrap_or_else(|| default.clone())),
        None => dict.get_or_missing(&arguments[1]).or_raise(interpreter, span),
    }
}

fn dict_set(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let dict = this_dict(interpreter, &arguments, span)?;
    dict.set(&arguments[1], arguments[2].clone())
        .or_raise(interpreter, span)?;
    Ok(Value::Null)
}

fn dict_length(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let dict = this_dict(interpreter, &arguments, span)?;
    Ok(Value::Int(dict.len() as i64))
}

fn dict_remove(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let dict = this_dict(interpreter, &arguments, span)?;
    dict.remove(&arguments[1]).or_raise(interpreter, span)
}

fn dict_contains(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let dict = this_dict(interpreter, &arguments, span)?;
    dict.contains(&arguments[1])
        .map(Value::Bool)
        .or_raise(interpreter, span)
}

fn dict_keys(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let dict = this_dict(interpreter, &arguments, span)?;
    Ok(Value::list(dict.keys()))
}

fn dict_values(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let dict = this_dict(interpreter, &arguments, span)?;
    Ok(Value::list(dict.values()))
}

fn dict_iter(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let dict = this_dict(interpreter, &arguments, span)?;
    Ok(list_iterator(interpreter, dict.keys()))
}

// String

fn string_length(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let text = this_string(interpreter, &arguments, span)?;
    Ok(Value::Int(text.chars().count() as i64))
}

fn string_upper(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let text = this_string(interpreter, &arguments, span)?;
    Ok(Value::string(text.to_uppercase()))
}

fn string_lower(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let text = this_string(interpreter, &arguments, span)?;
    Ok(Value::string(text.to_lowercase()))
}

fn string_split(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let text = this_string(interpreter, &arguments, span)?;
    let parts: Vec<Value> = match arguments.get(1) {
        None | Some(Value::Null) => text.split_whitespace().map(Value::from).collect(),
        Some(Value::String(separator)) if !separator.is_empty() => {
            text.split(separator.as_str()).map(Value::from).collect()
        }
        Some(Value::String(_)) => {
            return Err(interpreter.raise(
                RuntimeErrorKind::InvalidArgument("Empty separator.".into()),
                span,
            ))
        }
        Some(other) => {
            return Err(interpreter.raise(
                RuntimeErrorKind::InvalidArgument(format!(
                    "Separator must be a string, not {}.",
                    other.type_name()
                )),
                span,
            ))
        }
    };
    Ok(Value::list(parts))
}

fn string_iter(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let text = this_string(interpreter, &arguments, span)?;
    let characters = text
        .chars()
        .map(|c| Value::String(c.to_compact_string()))
        .collect();
    Ok(list_iterator(interpreter, characters))
}

// ListIterator

fn list_iterator_next(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let this = this_instance(interpreter, &arguments, span)?;
    let (Some(Value::List(items)), Some(Value::Int(index))) =
        (this.get_field("__items__"), this.get_field("__index__"))
    else {
        return Err(invalid_receiver(interpreter, "list iterator", arguments.first(), span));
    };
    if index >= items.len() as i64 {
        return Ok(Value::Null);
    }
    let element = items.get(index).or_raise(interpreter, span)?;
    this.set_field("__index__", Value::Int(index + 1));
    Ok(Value::item(element))
}

fn list_iterator_iter(
    span: Span,
    interpreter: &mut TreeWalkInterpreter,
    arguments: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let this = this_instance(interpreter, &arguments, span)?;
    Ok(Value::Instance(this))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_is_rooted_at_object() {
        let builtins = Builtins::new();
        let object = builtins.class(BuiltinClass::Object);
        let exception = builtins.class(BuiltinClass::Exception);
        for which in BuiltinClass::ALL {
            assert!(builtins.class(which).is_subclass_of(object));
        }
        assert!(builtins.class(BuiltinClass::DivByZero).is_subclass_of(exception));
        assert!(!builtins.class(BuiltinClass::List).is_subclass_of(exception));
        assert!(builtins.is(exception, BuiltinClass::Exception));
        assert!(!builtins.is(exception, BuiltinClass::Object));
    }

    #[test]
    fn collection_classes_carry_native_methods() {
        let builtins = Builtins::new();
        let list = builtins.class(BuiltinClass::List);
        for name in ["get", "push", "map", "reduce", "iter"] {
            assert!(matches!(
                list.find_attribute(name),
                Some(Value::NativeFunction(_))
            ));
        }
        let error = builtins.class(BuiltinClass::KeyNotFound);
        assert!(error.find_attribute("__str__").is_some());
    }
}
