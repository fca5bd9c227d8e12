use std::{any::Any, rc::Rc};

use compact_str::CompactString;
use indexmap::IndexMap;

use super::{
    describe_arity,
    error::{RuntimeError, RuntimeErrorKind},
    Dict, DictKey, List, Value,
};
use crate::{interpreter::TreeWalkInterpreter, lexer::Span};

/// How many arguments a native function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exact(count: usize) -> Self {
        Self {
            min: count,
            max: Some(count),
        }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }

    /// The arity once `count` leading arguments have been supplied.
    fn without(&self, count: usize) -> Self {
        Self {
            min: self.min.saturating_sub(count),
            max: self.max.map(|max| max.saturating_sub(count)),
        }
    }
}

/// A function implemented by the host.
///
/// Methods receive their receiver as the first argument and count it in
/// their arity.
pub trait NativeFunction {
    fn name(&self) -> &str;
    fn arity(&self) -> Arity;
    fn call(
        &self,
        span: Span,
        interpreter: &mut TreeWalkInterpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError>;
}

/// A native function value, possibly bound to a receiver.
#[derive(Clone)]
pub struct NativeRef {
    pub function: Rc<dyn NativeFunction>,
    pub receiver: Option<Box<Value>>,
}

impl NativeRef {
    pub fn new(function: Rc<dyn NativeFunction>) -> Self {
        Self {
            function,
            receiver: None,
        }
    }

    pub fn name(&self) -> &str {
        self.function.name()
    }

    pub fn bind(&self, receiver: Value) -> Self {
        Self {
            function: self.function.clone(),
            receiver: Some(Box::new(receiver)),
        }
    }

    pub fn is_same(&self, other: &NativeRef) -> bool {
        Rc::ptr_eq(&self.function, &other.function)
            && match (&self.receiver, &other.receiver) {
                (None, None) => true,
                (Some(lhs), Some(rhs)) => lhs.is_equal(rhs),
                _ => false,
            }
    }

    /// Prepends the receiver and checks the arity.
    pub fn prepare_arguments(&self, arguments: Vec<Value>) -> Result<Vec<Value>, RuntimeErrorKind> {
        let arity = self.function.arity();
        let supplied = usize::from(self.receiver.is_some());
        if !arity.accepts(arguments.len() + supplied) {
            let visible = arity.without(supplied);
            return Err(RuntimeErrorKind::ArgCount {
                name: self.name().into(),
                expected: describe_arity(visible.min, visible.max),
                actual: arguments.len(),
            });
        }
        Ok(match &self.receiver {
            Some(receiver) => {
                let mut full = Vec::with_capacity(arguments.len() + 1);
                full.push(Value::clone(receiver));
                full.extend(arguments);
                full
            }
            None => arguments,
        })
    }
}

pub type NativeCallback =
    fn(Span, &mut TreeWalkInterpreter, Vec<Value>) -> Result<Value, RuntimeError>;

/// A built-in backed by a plain function pointer.
pub struct NativeFn {
    name: &'static str,
    arity: Arity,
    callback: NativeCallback,
}

impl NativeFn {
    pub fn new(name: &'static str, arity: Arity, callback: NativeCallback) -> Self {
        Self {
            name,
            arity,
            callback,
        }
    }

    pub fn into_value(self) -> Value {
        Value::NativeFunction(NativeRef::new(Rc::new(self)))
    }
}

impl NativeFunction for NativeFn {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn call(
        &self,
        span: Span,
        interpreter: &mut TreeWalkInterpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        (self.callback)(span, interpreter, arguments)
    }
}

/// A value as seen from the host side of the bridge.
#[derive(Debug, Clone)]
pub enum HostValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<HostValue>),
    Mapping(Vec<(HostValue, HostValue)>),
    /// Anything the host has no counterpart for.
    Opaque(OpaqueValue),
}

/// A guest value carried through the host untouched.
#[derive(Clone)]
pub struct OpaqueValue(Value);

impl std::fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Opaque({})", self.0.repr())
    }
}

impl OpaqueValue {
    /// Wraps an arbitrary host object so the guest can hold it.
    pub fn from_host(object: Rc<dyn Any>) -> Self {
        Self(Value::Opaque(object))
    }

    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        match &self.0 {
            Value::Opaque(object) => object.clone().downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl HostValue {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::None,
            Value::Bool(v) => Self::Bool(*v),
            Value::Int(v) => Self::Int(*v),
            Value::Float(v) => Self::Float(*v),
            Value::String(v) => Self::String(v.to_string()),
            Value::List(list) => {
                Self::Sequence(list.snapshot().iter().map(Self::from_value).collect())
            }
            Value::Dict(dict) => Self::Mapping(
                dict.entries()
                    .iter()
                    .map(|(key, value)| (Self::from_value(&key.to_value()), Self::from_value(value)))
                    .collect(),
            ),
            value => Self::Opaque(OpaqueValue(value.clone())),
        }
    }

    pub fn into_value(self) -> Result<Value, RuntimeErrorKind> {
        let value = match self {
            Self::None => Value::Null,
            Self::Bool(v) => Value::Bool(v),
            Self::Int(v) => Value::Int(v),
            Self::Float(v) => Value::Float(v),
            Self::String(v) => Value::String(CompactString::from(v)),
            Self::Sequence(elements) => {
                let elements = elements
                    .into_iter()
                    .map(HostValue::into_value)
                    .collect::<Result<Vec<_>, _>>()?;
                Value::List(Rc::new(List::new(elements)))
            }
            Self::Mapping(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = DictKey::from_value(&key.into_value()?)?;
                    map.insert(key, value.into_value()?);
                }
                Value::Dict(Rc::new(Dict::new(map)))
            }
            Self::Opaque(OpaqueValue(value)) => value,
        };
        Ok(value)
    }
}

type HostCallback = dyn Fn(Vec<HostValue>) -> Result<HostValue, String>;

/// Adapts a host closure over marshalled values into a callable guest value.
///
/// An `Err` from the closure is raised as a `NotImplemented` exception
/// carrying the message.
pub struct HostFunction {
    name: CompactString,
    arity: Arity,
    callback: Box<HostCallback>,
}

impl HostFunction {
    pub fn new<F>(name: &str, arity: Arity, callback: F) -> Self
    where
        F: Fn(Vec<HostValue>) -> Result<HostValue, String> + 'static,
    {
        Self {
            name: name.into(),
            arity,
            callback: Box::new(callback),
        }
    }

    pub fn into_value(self) -> Value {
        Value::NativeFunction(NativeRef::new(Rc::new(self)))
    }
}

impl NativeFunction for HostFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn call(
        &self,
        span: Span,
        interpreter: &mut TreeWalkInterpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let arguments = arguments.iter().map(HostValue::from_value).collect();
        let result = (self.callback)(arguments)
            .map_err(|message| interpreter.raise(RuntimeErrorKind::InvalidArgument(message), span))?;
        result
            .into_value()
            .map_err(|kind| interpreter.raise(kind, span))
    }
}
