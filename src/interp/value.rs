//! Runtime values for the interpreter

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::Expr;

use super::env::Env;
use super::object::{Object, ObjectBinding, Template};

/// Mutable, aliasable storage slot
pub type Cell = Rc<RefCell<Value>>;

/// Fixed-length array storage shared by every handle to the array
pub type ArrayStorage = Rc<RefCell<Vec<Value>>>;

/// Parameters, body and captured environment of a function or procedure
pub struct Closure {
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    /// Captured by reference: later writes to shared cells stay visible
    pub env: Env,
}

/// Runtime value
#[derive(Clone)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    /// Boolean
    Bool(bool),
    /// String
    String(String),
    /// Absence of a value
    None,
    /// Function closure, applied for its result
    Closure(Rc<Closure>),
    /// Procedure, applied for effect
    Procedure(Rc<Closure>),
    /// Reference cell
    Ref(Cell),
    /// Array (mutable interior)
    Array(ArrayStorage),
    /// Class template
    Template(Rc<Template>),
    /// Instance of a concrete template
    Object(Rc<Object>),
    /// Object viewed through one of its ancestor templates
    Binding(Rc<ObjectBinding>),
    /// Placeholder body of an abstract method
    Abstract,
}

impl Value {
    pub fn new_ref(value: Value) -> Value {
        Value::Ref(Rc::new(RefCell::new(value)))
    }

    pub fn new_array(len: usize) -> Value {
        Value::Array(Rc::new(RefCell::new(vec![Value::None; len])))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Bool(_) => "boolean",
            Value::String(_) => "string",
            Value::None => "none",
            Value::Closure(_) => "function",
            Value::Procedure(_) => "procedure",
            Value::Ref(_) => "ref",
            Value::Array(_) => "array",
            Value::Template(_) => "template",
            Value::Object(_) => "object",
            Value::Binding(_) => "object binding",
            Value::Abstract => "abstract method",
        }
    }

    /// Try to get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

thread_local! {
    /// Arrays and cells whose contents are being formatted on this thread
    static FORMATTING: RefCell<Vec<*const ()>> = const { RefCell::new(Vec::new()) };
}

/// Marks shared storage as being formatted until dropped
struct CycleGuard(*const ());

impl CycleGuard {
    /// `None` if `storage` is already being formatted further up the stack
    fn enter<T>(storage: &Rc<T>) -> Option<CycleGuard> {
        let ptr = Rc::as_ptr(storage) as *const ();
        FORMATTING.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&ptr) {
                return None;
            }
            active.push(ptr);
            Some(CycleGuard(ptr))
        })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        FORMATTING.with(|active| active.borrow_mut().retain(|ptr| *ptr != self.0));
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::None => write!(f, "none"),
            Value::Closure(c) => write!(f, "<function [{}] {}>", c.params.join(","), c.body),
            Value::Procedure(c) => write!(f, "<procedure [{}] {}>", c.params.join(","), c.body),
            Value::Ref(cell) => match CycleGuard::enter(cell) {
                Some(_guard) => write!(f, "<ref {}>", cell.borrow()),
                None => write!(f, "<ref ...>"),
            },
            Value::Array(items) => {
                let Some(_guard) = CycleGuard::enter(items) else {
                    return write!(f, "[...]");
                };
                write!(f, "[")?;
                for (i, v) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Template(t) => write!(f, "<template {}>", t.full_name),
            Value::Object(o) => write!(f, "<object of type {}>", o.template.full_name),
            Value::Binding(b) => write!(
                f,
                "<object binding <template {}> <object of type {}>>",
                b.template.full_name, b.object.template.full_name
            ),
            Value::Abstract => write!(f, "<function not implemented>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Ref(cell) => match CycleGuard::enter(cell) {
                Some(_guard) => write!(f, "Ref({:?})", cell.borrow()),
                None => write!(f, "Ref(...)"),
            },
            Value::Array(items) => match CycleGuard::enter(items) {
                Some(_guard) => f.debug_list().entries(items.borrow().iter()).finish(),
                None => write!(f, "[...]"),
            },
            other => write!(f, "{}", other),
        }
    }
}

/// Scalars compare by value; everything with identity compares by pointer
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::Abstract, Value::Abstract) => true,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Procedure(a), Value::Procedure(b)) => Rc::ptr_eq(a, b),
            (Value::Ref(a), Value::Ref(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Template(a), Value::Template(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Binding(a), Value::Binding(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
