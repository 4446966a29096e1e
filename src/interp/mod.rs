//! Tree-walking interpreter
//!
//! Evaluates expressions directly over persistent lexical environments.

pub mod env;
pub mod error;
pub mod eval;
pub mod object;
pub mod primitives;
pub mod value;

use std::rc::Rc;

use crate::ast::{Expr, Primitive};

pub use env::{Env, Environment};
pub use error::{RuntimeError, RuntimeResult};
pub use eval::Interpreter;
pub use object::{Object, ObjectBinding, ROOT_TEMPLATE, Template};
pub use value::{Closure, Value};

const PARAM_NAMES: [&str; 3] = ["x", "y", "z"];

/// Wrap a builtin primitive as a function value
fn builtin(prim: Primitive) -> Value {
    let params: Vec<String> = PARAM_NAMES[..prim.arity()]
        .iter()
        .map(|p| p.to_string())
        .collect();
    let args = params.iter().map(Expr::id).collect();
    Value::Closure(Rc::new(Closure {
        params,
        body: Rc::new(Expr::prim(prim, args)),
        env: Env::new(),
    }))
}

/// Environment holding every builtin primitive under its surface name
pub fn primitives_env() -> Env {
    Primitive::BUILTINS
        .iter()
        .fold(Env::new(), |env, prim| env.bind(prim.name(), Value::new_ref(builtin(*prim))))
}

/// Environment a fresh program starts in: the builtins plus the root
/// `Object` template, whose methods run over the builtins
pub fn initial_env() -> Env {
    let primitives = primitives_env();
    let root = Template::root(primitives.clone());
    primitives.bind(ROOT_TEMPLATE, Value::new_ref(Value::Template(Rc::new(root))))
}
