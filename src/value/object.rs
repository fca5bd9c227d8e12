use std::{cell::RefCell, collections::HashMap, rc::Rc};

use compact_str::CompactString;
use indexmap::IndexMap;

use super::Value;
use crate::{environment::Environment, parser::statement::FunctionDecl, string::IdentName};

/// Classes created by the runtime before any user code runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinClass {
    Object,
    Exception,
    DivByZero,
    OutOfRange,
    KeyNotFound,
    AttrNotFound,
    VarNotFound,
    ArgCount,
    NotImplemented,
    ModuleVarNotFound,
    StackOverflow,
    Overflow,
    IncludeError,
    List,
    Dict,
    String,
    ListIterator,
}

impl BuiltinClass {
    /// Every built-in class, parents before children.
    pub const ALL: [BuiltinClass; 17] = [
        Self::Object,
        Self::Exception,
        Self::DivByZero,
        Self::OutOfRange,
        Self::KeyNotFound,
        Self::AttrNotFound,
        Self::VarNotFound,
        Self::ArgCount,
        Self::NotImplemented,
        Self::ModuleVarNotFound,
        Self::StackOverflow,
        Self::Overflow,
        Self::IncludeError,
        Self::List,
        Self::Dict,
        Self::String,
        Self::ListIterator,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Exception => "Exception",
            Self::DivByZero => "DivByZero",
            Self::OutOfRange => "OutOfRange",
            Self::KeyNotFound => "KeyNotFound",
            Self::AttrNotFound => "AttrNotFound",
            Self::VarNotFound => "VarNotFound",
            Self::ArgCount => "ArgCount",
            Self::NotImplemented => "NotImplemented",
            Self::ModuleVarNotFound => "ModuleVarNotFound",
            Self::StackOverflow => "StackOverflow",
            Self::Overflow => "Overflow",
            Self::IncludeError => "IncludeError",
            Self::List => "List",
            Self::Dict => "Dict",
            Self::String => "String",
            Self::ListIterator => "ListIterator",
        }
    }

    pub fn parent(&self) -> Option<BuiltinClass> {
        match self {
            Self::Object => None,
            Self::Exception | Self::List | Self::Dict | Self::String | Self::ListIterator => {
                Some(Self::Object)
            }
            _ => Some(Self::Exception),
        }
    }
}

pub struct Class {
    pub name: CompactString,
    pub attributes: IndexMap<IdentName, Value>,
    pub super_class: Option<Rc<Class>>,
}

impl std::fmt::Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Class({})", self.name)
    }
}

impl Class {
    pub fn new(
        name: impl Into<CompactString>,
        attributes: IndexMap<IdentName, Value>,
        super_class: Option<Rc<Class>>,
    ) -> Self {
        Self {
            name: name.into(),
            attributes,
            super_class,
        }
    }

    /// Looks `name` up on this class and then its ancestors.
    pub fn find_attribute(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.attributes.get(name) {
            return Some(value.clone());
        }
        self.super_class
            .as_ref()
            .and_then(|super_class| super_class.find_attribute(name))
    }

    /// Whether `self` is `ancestor` or derives from it.
    pub fn is_subclass_of(self: &Rc<Self>, ancestor: &Rc<Class>) -> bool {
        let mut current = Some(self.clone());
        while let Some(class) = current {
            if Rc::ptr_eq(&class, ancestor) {
                return true;
            }
            current = class.super_class.clone();
        }
        false
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    pub fields: RefCell<HashMap<IdentName, Value>>,
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance({})", self.class.name)
    }
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn set_field(&self, name: impl Into<IdentName>, value: Value) {
        self.fields.borrow_mut().insert(name.into(), value);
    }
}

pub struct Module {
    pub name: CompactString,
    pub attributes: IndexMap<IdentName, Value>,
}

impl Module {
    pub fn get(&self, name: &str) -> Option<Value> {
        self.attributes.get(name).cloned()
    }
}

/// A user-defined function or method.
#[derive(Clone)]
pub struct Function {
    pub name: CompactString,
    pub decl: Rc<FunctionDecl>,
    pub closure: Environment,
    /// Bound `this`.
    pub receiver: Option<Value>,
    /// Set for functions harvested into a class body.
    pub is_method: bool,
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Function({})", self.name)
    }
}

impl Function {
    pub fn new(decl: Rc<FunctionDecl>, closure: Environment) -> Self {
        Self {
            name: CompactString::from(&*decl.name.name),
            decl,
            closure,
            receiver: None,
            is_method: false,
        }
    }

    pub fn bind(&self, receiver: Value) -> Function {
        Function {
            receiver: Some(receiver),
            ..self.clone()
        }
    }

    pub fn into_method(self) -> Function {
        Function {
            is_method: true,
            ..self
        }
    }

    pub fn arity(&self) -> usize {
        self.decl.parameters.len()
    }
}
