use std::rc::Rc;

use compact_str::{CompactString, ToCompactString};

use super::{builtins::int_argument, OrRaise, TreeWalkInterpreter};
use crate::{
    lexer::Span,
    value::{
        collection::resolve_index,
        default_instance_text,
        error::{RuntimeError, RuntimeErrorKind},
        BuiltinClass, Instance, Renderer, Value,
    },
};

/// Binds functions fetched through a receiver to that receiver.
pub(crate) fn bind_method(method: Value, receiver: &Value) -> Value {
    match method {
        Value::Function(function) => Value::Function(Rc::new(function.bind(receiver.clone()))),
        Value::NativeFunction(native) => Value::NativeFunction(native.bind(receiver.clone())),
        value => value,
    }
}

// Attribute access
impl TreeWalkInterpreter {
    pub(crate) fn get_attr(
        &mut self,
        object: &Value,
        name: &str,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let not_found = || RuntimeErrorKind::AttrNotFound {
            type_name: object.type_name(),
            name: name.into(),
        };
        let found = match object {
            Value::Instance(instance) => match instance.get_field(name) {
                Some(field) => Some(field),
                None => instance
                    .class
                    .find_attribute(name)
                    .map(|attribute| bind_method(attribute, object)),
            },
            Value::Class(class) => class.find_attribute(name),
            Value::Module(module) => {
                return module.get(name).ok_or_else(|| {
                    self.raise(
                        RuntimeErrorKind::ModuleVarNotFound {
                            module: module.name.clone(),
                            name: name.into(),
                        },
                        span,
                    )
                })
            }
            Value::List(_) => self.builtin_method(BuiltinClass::List, object, name),
            Value::Dict(_) => self.builtin_method(BuiltinClass::Dict, object, name),
            Value::String(_) => self.builtin_method(BuiltinClass::String, object, name),
            _ => None,
        };
        found.ok_or_else(not_found).or_raise(self, span)
    }

    fn builtin_method(&self, which: BuiltinClass, receiver: &Value, name: &str) -> Option<Value> {
        self.builtins
            .class(which)
            .find_attribute(name)
            .map(|method| bind_method(method, receiver))
    }

    pub(crate) fn set_attr(
        &mut self,
        object: &Value,
        name: &str,
        value: Value,
        span: Span,
    ) -> Result<(), RuntimeError> {
        match object {
            Value::Instance(instance) => {
                instance.set_field(name, value);
                Ok(())
            }
            object => Err(self.raise(RuntimeErrorKind::ReadOnly(object.type_name()), span)),
        }
    }

    /// Fetches `name` through `object` and calls it.
    pub(crate) fn call_method(
        &mut self,
        object: &Value,
        name: &str,
        arguments: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let method = self.get_attr(object, name, span)?;
        self.call_value(method, arguments, span)
    }
}

// Item access
impl TreeWalkInterpreter {
    pub(crate) fn get_item(
        &mut self,
        object: &Value,
        index: &Value,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match object {
            Value::List(list) => {
                let index = int_argument(self, index, "List index", span)?;
                list.get(index).or_raise(self, span)
            }
            Value::Dict(dict) => dict.get_or_missing(index).or_raise(self, span),
            Value::String(text) => {
                let index = int_argument(self, index, "String index", span)?;
                let characters: Vec<char> = text.chars().collect();
                let position = resolve_index(index, characters.len()).or_raise(self, span)?;
                Ok(Value::String(characters[position].to_compact_string()))
            }
            Value::Instance(instance) => {
                match self.call_hook(instance, "__getitem__", vec![index.clone()], span)? {
                    Some(value) => Ok(value),
                    None => Err(self.not_subscriptable(object, span)),
                }
            }
            object => Err(self.not_subscriptable(object, span)),
        }
    }

    pub(crate) fn set_item(
        &mut self,
        object: &Value,
        index: &Value,
        value: Value,
        span: Span,
    ) -> Result<(), RuntimeError> {
        match object {
            Value::List(list) => {
                let index = int_argument(self, index, "List index", span)?;
                list.set(index, value).or_raise(self, span)
            }
            Value::Dict(dict) => dict.set(index, value).or_raise(self, span),
            Value::Instance(instance) => {
                match self.call_hook(instance, "__setitem__", vec![index.clone(), value], span)? {
                    Some(_) => Ok(()),
                    None => Err(self.not_subscriptable(object, span)),
                }
            }
            object => Err(self.not_subscriptable(object, span)),
        }
    }

    fn not_subscriptable(&self, object: &Value, span: Span) -> RuntimeError {
        self.raise(RuntimeErrorKind::NotSubscriptable(object.type_name()), span)
    }
}

// Iteration
impl TreeWalkInterpreter {
    pub(crate) fn iter_value(&mut self, value: &Value, span: Span) -> Result<Value, RuntimeError> {
        self.call_method(value, "iter", Vec::new(), span)
    }

    /// One step of `iterator`. `None` once it is exhausted.
    pub(crate) fn next_value(
        &mut self,
        iterator: &Value,
        span: Span,
    ) -> Result<Option<Value>, RuntimeError> {
        match self.call_method(iterator, "next", Vec::new(), span)? {
            Value::Item(inner) => Ok(Some(Value::clone(&inner))),
            Value::Null => Ok(None),
            other => Err(self.raise(
                RuntimeErrorKind::InvalidIteratorItem(other.type_name()),
                span,
            )),
        }
    }
}

// Rendering
impl TreeWalkInterpreter {
    /// The `str` form of a value.
    pub(crate) fn stringify(&mut self, value: &Value, span: Span) -> Result<String, RuntimeError> {
        self.render(value, false, span)
    }

    /// The `dump` form of a value.
    pub(crate) fn dump(&mut self, value: &Value, span: Span) -> Result<String, RuntimeError> {
        self.render(value, true, span)
    }

    fn render(&mut self, value: &Value, quoted: bool, span: Span) -> Result<String, RuntimeError> {
        let mut on_instance =
            |instance: &Rc<Instance>, quoted: bool| self.instance_text(instance, quoted, span);
        Renderer::new(&mut on_instance).render(value, quoted)
    }

    /// Text of an instance: `__repr__` (dump only), then `__str__`, then
    /// the default `<Name instance>`.
    pub(crate) fn instance_text(
        &mut self,
        instance: &Rc<Instance>,
        quoted: bool,
        span: Span,
    ) -> Result<String, RuntimeError> {
        if quoted {
            if let Some(text) = self.call_hook(instance, "__repr__", Vec::new(), span)? {
                return Ok(hook_text(text));
            }
        }
        match self.call_hook(instance, "__str__", Vec::new(), span)? {
            Some(text) => Ok(hook_text(text)),
            None => Ok(default_instance_text(instance)),
        }
    }
}

/// Strings returned by a rendering hook are used as-is. Anything else is
/// rendered without consulting hooks again.
fn hook_text(value: Value) -> String {
    match value {
        Value::String(text) => CompactString::into_string(text),
        value => value.to_string(),
    }
}
