pub mod collection;
pub mod error;
pub mod formatter;
pub mod native;
pub mod numeric;
pub mod object;

use std::{any::Any, convert::Infallible, fmt::Display, rc::Rc};

use compact_str::{format_compact, CompactString};

pub use collection::{Dict, DictKey, List};
pub use native::{
    Arity, HostFunction, HostValue, NativeFn, NativeFunction, NativeRef, OpaqueValue,
};
pub use object::{BuiltinClass, Class, Function, Instance, Module};

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(CompactString),
    List(Rc<List>),
    Dict(Rc<Dict>),
    Function(Rc<Function>),
    NativeFunction(NativeRef),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
    /// One step of an iterator.
    Item(Rc<Value>),
    Module(Rc<Module>),
    /// A host value passed through the bridge untouched.
    Opaque(Rc<dyn Any>),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::Float(v) => write!(f, "Float({v:?})"),
            Self::String(v) => write!(f, "String({v:?})"),
            Self::Opaque(_) => write!(f, "Opaque"),
            value => write!(f, "{}({})", value.variant_name(), value.repr()),
        }
    }
}

impl Value {
    pub fn string(text: impl Into<CompactString>) -> Self {
        Self::String(text.into())
    }

    pub fn list(elements: Vec<Value>) -> Self {
        Self::List(Rc::new(List::new(elements)))
    }

    pub fn item(value: Value) -> Self {
        Self::Item(Rc::new(value))
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::String(_) => "String",
            Self::List(_) => "List",
            Self::Dict(_) => "Dict",
            Self::Function(_) => "Function",
            Self::NativeFunction(_) => "NativeFunction",
            Self::Class(_) => "Class",
            Self::Instance(_) => "Instance",
            Self::Item(_) => "Item",
            Self::Module(_) => "Module",
            Self::Opaque(_) => "Opaque",
        }
    }

    /// The name reported by `type()` and used in error messages.
    pub fn type_name(&self) -> CompactString {
        match self {
            Self::Null => "null".into(),
            Self::Bool(_) => "bool".into(),
            Self::Int(_) => "int".into(),
            Self::Float(_) => "float".into(),
            Self::String(_) => "string".into(),
            Self::List(_) => "list".into(),
            Self::Dict(_) => "dict".into(),
            Self::Function(_) => "function".into(),
            Self::NativeFunction(_) => "native function".into(),
            Self::Class(_) => "class".into(),
            Self::Instance(instance) => instance.class.name.clone(),
            Self::Item(_) => "item".into(),
            Self::Module(_) => "module".into(),
            Self::Opaque(_) => "opaque".into(),
        }
    }

    /// Truthiness of everything except instances, which may define `__bool__`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null | Self::Bool(false) => false,
            Self::Int(v) => *v != 0,
            Self::Float(v) => *v != 0.0,
            Self::String(v) => !v.is_empty(),
            Self::List(list) => !list.is_empty(),
            Self::Dict(dict) => !dict.is_empty(),
            _ => true,
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::String(_)
        )
    }

    /// Equality without overload hooks: atomic values by value, everything
    /// else by identity.
    pub fn is_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(lhs), Self::Bool(rhs)) => lhs == rhs,
            (Self::Int(lhs), Self::Int(rhs)) => lhs == rhs,
            (Self::Float(lhs), Self::Float(rhs)) => lhs == rhs,
            (Self::Int(lhs), Self::Float(rhs)) | (Self::Float(rhs), Self::Int(lhs)) => {
                (*lhs as f64) == *rhs
            }
            (Self::String(lhs), Self::String(rhs)) => lhs == rhs,
            (Self::List(lhs), Self::List(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Self::Dict(lhs), Self::Dict(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Self::Function(lhs), Self::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Self::NativeFunction(lhs), Self::NativeFunction(rhs)) => lhs.is_same(rhs),
            (Self::Class(lhs), Self::Class(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Self::Instance(lhs), Self::Instance(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Self::Item(lhs), Self::Item(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Self::Module(lhs), Self::Module(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Self::Opaque(lhs), Self::Opaque(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }

    /// The debug form without consulting `__repr__`.
    pub fn repr(&self) -> String {
        let result: Result<String, Infallible> =
            Renderer::new(&mut |instance, _| Ok(default_instance_text(instance)))
                .render(self, true);
        match result {
            Ok(text) => text,
            Err(never) => match never {},
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result: Result<String, Infallible> =
            Renderer::new(&mut |instance, _| Ok(default_instance_text(instance)))
                .render(self, false);
        match result {
            Ok(text) => write!(f, "{text}"),
            Err(never) => match never {},
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

pub fn default_instance_text(instance: &Instance) -> String {
    format!("<{} instance>", instance.class.name)
}

/// Quotes a string the way `dump` shows string literals.
pub fn quote_string(text: &str) -> String {
    let mut buffer = String::with_capacity(text.len() + 2);
    buffer.push('\'');
    for c in text.chars() {
        match c {
            '\\' => buffer.push_str("\\\\"),
            '\'' => buffer.push_str("\\'"),
            '\n' => buffer.push_str("\\n"),
            '\t' => buffer.push_str("\\t"),
            '\r' => buffer.push_str("\\r"),
            '\0' => buffer.push_str("\\0"),
            c => buffer.push(c),
        }
    }
    buffer.push('\'');
    buffer
}

type InstanceHook<'a, E> = dyn FnMut(&Rc<Instance>, bool) -> Result<String, E> + 'a;

/// Walks nested values producing either the `str` or the `dump` form.
///
/// Instances are delegated to `on_instance` so callers can consult overload
/// hooks. Collections that contain themselves print as `[...]` or `{...}`.
pub struct Renderer<'a, E> {
    on_instance: &'a mut InstanceHook<'a, E>,
    active: Vec<*const ()>,
}

impl<'a, E> Renderer<'a, E> {
    pub fn new(on_instance: &'a mut InstanceHook<'a, E>) -> Self {
        Self {
            on_instance,
            active: Vec::new(),
        }
    }

    pub fn render(&mut self, value: &Value, quoted: bool) -> Result<String, E> {
        let text = match value {
            Value::Null => "null".into(),
            Value::Bool(v) => format!("{v}"),
            Value::Int(v) => format!("{v}"),
            Value::Float(v) => numeric::format_float(*v),
            Value::String(v) if quoted => quote_string(v),
            Value::String(v) => v.to_string(),
            Value::List(list) => {
                let address = Rc::as_ptr(list) as *const ();
                if self.active.contains(&address) {
                    return Ok("[...]".into());
                }
                self.active.push(address);
                let parts: Result<Vec<String>, E> = list
                    .snapshot()
                    .iter()
                    .map(|element| self.render(element, true))
                    .collect();
                self.active.pop();
                format!("[{}]", parts?.join(", "))
            }
            Value::Dict(dict) => {
                let address = Rc::as_ptr(dict) as *const ();
                if self.active.contains(&address) {
                    return Ok("{...}".into());
                }
                self.active.push(address);
                let parts: Result<Vec<String>, E> = dict
                    .entries()
                    .iter()
                    .map(|(key, value)| {
                        let key = self.render(&key.to_value(), true)?;
                        let value = self.render(value, true)?;
                        Ok(format!("{key}: {value}"))
                    })
                    .collect();
                self.active.pop();
                format!("{{{}}}", parts?.join(", "))
            }
            Value::Item(inner) => format!("Item({})", self.render(inner, true)?),
            Value::Function(function) => format!("<function {}>", function.name),
            Value::NativeFunction(native) => format!("<native function {}>", native.name()),
            Value::Class(class) => format!("<class {}>", class.name),
            Value::Module(module) => format!("<module {}>", module.name),
            Value::Instance(instance) => (self.on_instance)(instance, quoted)?,
            Value::Opaque(_) => "<opaque>".into(),
        };
        Ok(text)
    }
}

/// Builds a `CompactString` describing an arity mismatch.
pub(crate) fn describe_arity(min: usize, max: Option<usize>) -> CompactString {
    match max {
        Some(max) if max == min => format_compact!("{min}"),
        Some(max) => format_compact!("{min} to {max}"),
        None => format_compact!("at least {min}"),
    }
}
