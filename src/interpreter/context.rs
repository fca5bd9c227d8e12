use std::{
    cell::RefCell,
    collections::HashMap,
    io::{Error, ErrorKind},
    path::PathBuf,
    rc::Rc,
};

use super::SystemContext;

/// Writes to stdout and includes files relative to a root directory.
pub struct StdioContext {
    root: PathBuf,
}

impl Default for StdioContext {
    fn default() -> Self {
        Self::new()
    }
}

impl StdioContext {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SystemContext for StdioContext {
    fn writeln(&mut self, text: &str) {
        println!("{text}");
    }

    fn read_include(&mut self, path: &str) -> std::io::Result<String> {
        std::fs::read_to_string(self.root.join(path))
    }
}

/// Collects output in memory and serves includes from a fixed table.
///
/// Clones share the same buffer, so a test can keep one handle while the
/// interpreter owns another.
#[derive(Clone, Default)]
pub struct BufferedContext {
    buffer: Rc<RefCell<String>>,
    includes: Rc<RefCell<HashMap<String, String>>>,
}

impl BufferedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include(self, path: &str, source: &str) -> Self {
        self.includes
            .borrow_mut()
            .insert(path.to_string(), source.to_string());
        self
    }

    pub fn data(&self) -> String {
        self.buffer.borrow().clone()
    }

    pub fn into_data(self) -> String {
        self.data()
    }
}

impl SystemContext for BufferedContext {
    fn writeln(&mut self, text: &str) {
        let mut buffer = self.buffer.borrow_mut();
        buffer.push_str(text);
        buffer.push('\n');
    }

    fn read_include(&mut self, path: &str) -> std::io::Result<String> {
        self.includes
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("no such file `{path}`")))
    }
}
