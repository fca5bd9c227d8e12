use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{string::IdentName, value::Value};

/// A shared, mutable binding.
pub type Cell = Rc<RefCell<Value>>;

/// A chain of frames mapping names to cells.
///
/// Cloning an `Environment` aliases the same frame.
#[derive(Clone)]
pub struct Environment {
    inner: Rc<RefCell<Frame>>,
}

struct Frame {
    values: IndexMap<IdentName, Cell>,
    parent: Option<Environment>,
    /// Module and class bodies. Assignments there always bind locally.
    namespace: bool,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let frame = self.inner.borrow();
        f.debug_struct("Environment")
            .field("names", &frame.values.keys().collect::<Vec<_>>())
            .field("global", &frame.parent.is_none())
            .finish()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Creates a root frame.
    pub fn new() -> Self {
        Self::from_frame(Frame {
            values: IndexMap::new(),
            parent: None,
            namespace: false,
        })
    }

    fn from_frame(frame: Frame) -> Self {
        Self {
            inner: Rc::new(RefCell::new(frame)),
        }
    }

    /// An empty child frame.
    pub fn new_scope(&self) -> Self {
        Self::from_frame(Frame {
            values: IndexMap::new(),
            parent: Some(self.clone()),
            namespace: false,
        })
    }

    /// An empty child frame for a module or class body.
    pub fn new_namespace(&self) -> Self {
        Self::from_frame(Frame {
            values: IndexMap::new(),
            parent: Some(self.clone()),
            namespace: true,
        })
    }

    /// A new frame holding the same cells and parent as this one.
    ///
    /// Later bindings in either frame are invisible to the other, while
    /// writes to cells that existed at snapshot time are shared.
    pub fn snapshot(&self) -> Self {
        let frame = self.inner.borrow();
        Self::from_frame(Frame {
            values: frame.values.clone(),
            parent: frame.parent.clone(),
            namespace: frame.namespace,
        })
    }

    /// The root of the chain.
    pub fn global(&self) -> Self {
        let mut current = self.clone();
        loop {
            let parent = current.inner.borrow().parent.clone();
            match parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    pub fn is_global(&self) -> bool {
        self.inner.borrow().parent.is_none()
    }

    pub fn is_namespace(&self) -> bool {
        self.inner.borrow().namespace
    }

    pub fn is_same(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Binds `name` in this frame, reusing the cell if the frame has one.
    pub fn bind(&self, name: impl Into<IdentName>, value: Value) {
        let name = name.into();
        let mut frame = self.inner.borrow_mut();
        match frame.values.get(&name) {
            Some(cell) => *cell.borrow_mut() = value,
            None => {
                frame.values.insert(name, Rc::new(RefCell::new(value)));
            }
        }
    }

    fn find_cell(&self, name: &str) -> Option<Cell> {
        let mut current = self.clone();
        loop {
            let next = {
                let frame = current.inner.borrow();
                if let Some(cell) = frame.values.get(name) {
                    return Some(cell.clone());
                }
                frame.parent.clone()
            };
            current = next?;
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.find_cell(name).map(|cell| cell.borrow().clone())
    }

    /// Writes the nearest existing binding. Returns `false` if there is none.
    pub fn set(&self, name: &str, value: Value) -> bool {
        match self.find_cell(name) {
            Some(cell) => {
                *cell.borrow_mut() = value;
                true
            }
            None => false,
        }
    }

    /// The bindings of this frame only, in binding order.
    pub fn bindings(&self) -> Vec<(IdentName, Value)> {
        self.inner
            .borrow()
            .values
            .iter()
            .map(|(name, cell)| (name.clone(), cell.borrow().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(environment: &Environment, name: &str) -> Option<i64> {
        match environment.get(name) {
            Some(Value::Int(v)) => Some(v),
            _ => None,
        }
    }

    #[test]
    fn lookup_walks_parents() {
        let global = Environment::new();
        global.bind("x", Value::Int(1));
        let child = global.new_scope();
        assert_eq!(int(&child, "x"), Some(1));
        assert!(child.get("y").is_none());
        assert!(child.global().is_same(&global));
    }

    #[test]
    fn set_writes_the_nearest_binding() {
        let global = Environment::new();
        global.bind("x", Value::Int(1));
        let child = global.new_scope();
        assert!(child.set("x", Value::Int(2)));
        assert_eq!(int(&global, "x"), Some(2));
        assert!(!child.set("missing", Value::Null));
    }

    #[test]
    fn bind_reuses_the_frame_cell() {
        let global = Environment::new();
        global.bind("x", Value::Int(1));
        let snapshot = global.snapshot();
        global.bind("x", Value::Int(2));
        assert_eq!(int(&snapshot, "x"), Some(2));
    }

    #[test]
    fn snapshot_shares_cells_but_not_new_bindings() {
        let frame = Environment::new().new_scope();
        frame.bind("counter", Value::Int(0));
        let snapshot = frame.snapshot();

        assert!(snapshot.set("counter", Value::Int(5)));
        assert_eq!(int(&frame, "counter"), Some(5));

        frame.bind("later", Value::Int(1));
        assert!(snapshot.get("later").is_none());
        snapshot.bind("own", Value::Int(1));
        assert!(frame.get("own").is_none());
    }

    #[test]
    fn bindings_are_local_and_ordered() {
        let global = Environment::new();
        global.bind("outer", Value::Null);
        let namespace = global.new_namespace();
        namespace.bind("b", Value::Int(1));
        namespace.bind("a", Value::Int(2));
        let names: Vec<_> = namespace
            .bindings()
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect();
        assert_eq!(names, ["b", "a"]);
        assert!(namespace.is_namespace());
    }
}
