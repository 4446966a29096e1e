//! Lexical environments
//!
//! An environment is a persistent singly-linked chain of frames, newest
//! first. Extending never touches the parent, so a closure holding an older
//! chain keeps seeing exactly the bindings it captured, while cells shared
//! between chains stay aliased.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::error::{RuntimeError, RuntimeResult};
use super::value::{Cell, Value};

struct Frame {
    name: String,
    cell: Cell,
    next: Env,
}

/// Chain of name/cell bindings
#[derive(Clone, Default)]
pub struct Environment {
    head: Option<Rc<Frame>>,
}

pub type Env = Environment;

impl Environment {
    /// Create an empty environment
    pub fn new() -> Self {
        Environment { head: None }
    }

    /// Find the most recent binding of `name`
    pub fn get(&self, name: &str) -> Option<Cell> {
        self.iter()
            .find(|(bound, _)| *bound == name)
            .map(|(_, cell)| cell.clone())
    }

    /// Like [`Environment::get`], faulting when the name is unbound
    pub fn lookup(&self, name: &str) -> RuntimeResult<Cell> {
        self.get(name).ok_or_else(|| RuntimeError::unbound(name))
    }

    /// Prepend a binding to an existing cell
    pub fn bind_cell(&self, name: impl Into<String>, cell: Cell) -> Env {
        Environment {
            head: Some(Rc::new(Frame {
                name: name.into(),
                cell,
                next: self.clone(),
            })),
        }
    }

    /// Prepend a binding to a freshly allocated cell
    pub fn bind(&self, name: impl Into<String>, value: Value) -> Env {
        self.bind_cell(name, Rc::new(RefCell::new(value)))
    }

    /// Prepend several bindings at once
    ///
    /// The first binding becomes the head of the chain, so a repeated name
    /// resolves to its first occurrence.
    pub fn extend<I>(&self, bindings: I) -> Env
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let bindings: Vec<_> = bindings.into_iter().collect();
        bindings
            .into_iter()
            .rev()
            .fold(self.clone(), |env, (name, value)| env.bind(name, value))
    }

    /// Iterate bindings from newest to oldest
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    /// Number of frames in the chain
    pub fn depth(&self) -> usize {
        self.iter().count()
    }
}

pub struct Iter<'a> {
    next: Option<&'a Frame>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Cell);

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.next?;
        self.next = frame.next.head.as_deref();
        Some((frame.name.as_str(), &frame.cell))
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|(name, _)| name)).finish()
    }
}

/// Read a cell's current contents
pub fn dereference(cell: &Cell) -> Value {
    cell.borrow().clone()
}

/// Replace a cell's contents
pub fn update(cell: &Cell, value: Value) {
    *cell.borrow_mut() = value;
}
