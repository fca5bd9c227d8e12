use std::cell::RefCell;

use compact_str::CompactString;
use indexmap::IndexMap;

use super::{error::RuntimeErrorKind, Value};

#[derive(Debug, Default)]
pub struct List {
    elements: RefCell<Vec<Value>>,
}

impl List {
    pub fn new(elements: Vec<Value>) -> Self {
        Self {
            elements: RefCell::new(elements),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    /// A copy of the elements, safe to hold while guest code mutates the list.
    pub fn snapshot(&self) -> Vec<Value> {
        self.elements.borrow().clone()
    }

    /// Resolves a possibly negative index against the current length.
    pub fn resolve_index(&self, index: i64) -> Result<usize, RuntimeErrorKind> {
        resolve_index(index, self.len())
    }

    pub fn get(&self, index: i64) -> Result<Value, RuntimeErrorKind> {
        let position = self.resolve_index(index)?;
        Ok(self.elements.borrow()[position].clone())
    }

    pub fn set(&self, index: i64, value: Value) -> Result<(), RuntimeErrorKind> {
        let position = self.resolve_index(index)?;
        self.elements.borrow_mut()[position] = value;
        Ok(())
    }

    pub fn push(&self, value: Value) {
        self.elements.borrow_mut().push(value);
    }

    /// Inserts before `index`; an index equal to the length appends.
    pub fn insert(&self, index: i64, value: Value) -> Result<(), RuntimeErrorKind> {
        let length = self.len();
        let position = if index == length as i64 {
            length
        } else {
            resolve_index(index, length)?
        };
        self.elements.borrow_mut().insert(position, value);
        Ok(())
    }

    pub fn remove(&self, index: i64) -> Result<Value, RuntimeErrorKind> {
        let position = self.resolve_index(index)?;
        Ok(self.elements.borrow_mut().remove(position))
    }

    pub fn pop(&self) -> Result<Value, RuntimeErrorKind> {
        self.elements
            .borrow_mut()
            .pop()
            .ok_or(RuntimeErrorKind::OutOfRange {
                index: -1,
                length: 0,
            })
    }
}

pub fn resolve_index(index: i64, length: usize) -> Result<usize, RuntimeErrorKind> {
    let resolved = if index < 0 {
        index + length as i64
    } else {
        index
    };
    if (0..length as i64).contains(&resolved) {
        Ok(resolved as usize)
    } else {
        Err(RuntimeErrorKind::OutOfRange { index, length })
    }
}

/// The subset of values usable as dictionary keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    Null,
    Bool(bool),
    Int(i64),
    /// Stored by bit pattern with `-0.0` folded into `0.0`.
    Float(u64),
    String(CompactString),
}

impl DictKey {
    pub fn from_value(value: &Value) -> Result<Self, RuntimeErrorKind> {
        let key = match value {
            Value::Null => Self::Null,
            Value::Bool(v) => Self::Bool(*v),
            Value::Int(v) => Self::Int(*v),
            Value::Float(v) => {
                let v = if *v == 0.0 { 0.0f64 } else { *v };
                Self::Float(v.to_bits())
            }
            Value::String(v) => Self::String(v.clone()),
            value => return Err(RuntimeErrorKind::Unhashable(value.type_name())),
        };
        Ok(key)
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(v) => Value::Bool(*v),
            Self::Int(v) => Value::Int(*v),
            Self::Float(bits) => Value::Float(f64::from_bits(*bits)),
            Self::String(v) => Value::String(v.clone()),
        }
    }
}

/// An insertion ordered dictionary.
#[derive(Debug, Default)]
pub struct Dict {
    entries: RefCell<IndexMap<DictKey, Value>>,
}

impl Dict {
    pub fn new(entries: IndexMap<DictKey, Value>) -> Self {
        Self {
            entries: RefCell::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn entries(&self) -> Vec<(DictKey, Value)> {
        self.entries
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.borrow().keys().map(DictKey::to_value).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.borrow().values().cloned().collect()
    }

    pub fn get(&self, key: &Value) -> Result<Option<Value>, RuntimeErrorKind> {
        let key = DictKey::from_value(key)?;
        Ok(self.entries.borrow().get(&key).cloned())
    }

    pub fn get_or_missing(&self, key: &Value) -> Result<Value, RuntimeErrorKind> {
        self.get(key)?
            .ok_or_else(|| RuntimeErrorKind::KeyNotFound(key.repr()))
    }

    pub fn set(&self, key: &Value, value: Value) -> Result<(), RuntimeErrorKind> {
        let key = DictKey::from_value(key)?;
        self.entries.borrow_mut().insert(key, value);
        Ok(())
    }

    pub fn remove(&self, key: &Value) -> Result<Value, RuntimeErrorKind> {
        let dict_key = DictKey::from_value(key)?;
        self.entries
            .borrow_mut()
            .shift_remove(&dict_key)
            .ok_or_else(|| RuntimeErrorKind::KeyNotFound(key.repr()))
    }

    pub fn contains(&self, key: &Value) -> Result<bool, RuntimeErrorKind> {
        let key = DictKey::from_value(key)?;
        Ok(self.entries.borrow().contains_key(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_indices_count_from_the_end() {
        let list = List::new(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert!(matches!(list.get(-1), Ok(Value::Int(3))));
        assert!(matches!(list.get(0), Ok(Value::Int(1))));
        assert_eq!(
            list.get(3).unwrap_err(),
            RuntimeErrorKind::OutOfRange {
                index: 3,
                length: 3
            }
        );
        assert!(list.get(-4).is_err());
    }

    #[test]
    fn insert_at_length_appends() {
        let list = List::new(vec![Value::Int(1)]);
        list.insert(1, Value::Int(2)).unwrap();
        list.insert(0, Value::Int(0)).unwrap();
        assert_eq!(Value::List(list.into()).to_string(), "[0, 1, 2]");
    }

    #[test]
    fn dict_keeps_insertion_order() {
        let dict = Dict::default();
        dict.set(&Value::from("b"), Value::Int(1)).unwrap();
        dict.set(&Value::from("a"), Value::Int(2)).unwrap();
        dict.set(&Value::from("b"), Value::Int(3)).unwrap();
        assert_eq!(Value::Dict(dict.into()).repr(), "{'b': 3, 'a': 2}");
    }

    #[test]
    fn unhashable_keys_are_rejected() {
        let dict = Dict::default();
        let key = Value::list(Vec::new());
        assert_eq!(
            dict.set(&key, Value::Null).unwrap_err(),
            RuntimeErrorKind::Unhashable("list".into())
        );
    }
}
