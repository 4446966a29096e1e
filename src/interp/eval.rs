//! Tree-walking evaluator
//!
//! One rule per [`Expr`] variant. The interpreter itself carries no scope
//! state: every rule receives the environment it runs in, and all mutable
//! state lives in the cells reachable from it.

use std::rc::Rc;

use crate::ast::{Expr, Literal, Primitive};

use super::env::{Env, dereference};
use super::error::{RuntimeError, RuntimeResult};
use super::primitives;
use super::value::{Closure, Value};

/// Binding that holds the array inside the closures `with-array` exposes
const ARRAY_SLOT: &str = "%array";

/// Tree-walking interpreter
pub struct Interpreter {
    /// Lines written by `print`
    output: Vec<String>,
    /// Also write printed lines to stdout
    echo: bool,
}

impl Interpreter {
    /// Create a new interpreter that only buffers its output
    pub fn new() -> Self {
        Interpreter {
            output: Vec::new(),
            echo: false,
        }
    }

    /// Create an interpreter that echoes printed values to stdout
    pub fn with_echo() -> Self {
        Interpreter {
            output: Vec::new(),
            echo: true,
        }
    }

    /// Get captured output (for testing)
    pub fn get_output(&self) -> &[String] {
        &self.output
    }

    /// Drain captured output
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Evaluate an expression
    pub fn eval(&mut self, expr: &Expr, env: &Env) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal(lit) => Ok(eval_literal(lit)),

            Expr::PrimitiveCall { prim, args } => {
                if args.len() != prim.arity() {
                    return Err(RuntimeError::Arity {
                        callee: prim.name().to_string(),
                        expected: prim.arity(),
                        received: args.len(),
                    });
                }
                let values = self.eval_args(args, env)?;
                self.eval_primitive(*prim, values)
            }

            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval_condition(cond, env, "if condition")? {
                    self.eval(then_branch, env)
                } else {
                    self.eval(else_branch, env)
                }
            }

            Expr::Let { bindings, body } => {
                // Right-hand sides see only the outer scope
                let mut values = Vec::with_capacity(bindings.len());
                for (name, init) in bindings {
                    values.push((name.clone(), self.eval(init, env)?));
                }
                let inner = env.extend(values);
                self.eval(body, &inner)
            }

            Expr::Identifier(name) => Ok(dereference(&env.lookup(name)?)),

            Expr::Call { func, args } => {
                let callee = self.eval(func, env)?;
                let closure = match callee {
                    Value::Closure(closure) => closure,
                    other => {
                        return Err(RuntimeError::type_mismatch(
                            "call",
                            "function",
                            other.type_name(),
                        ));
                    }
                };
                let values = self.eval_args(args, env)?;
                self.apply(&closure, values, &callee_name(func))
            }

            Expr::ProcedureCall { func, args } => {
                let callee = self.eval(func, env)?;
                let procedure = match callee {
                    Value::Procedure(procedure) => procedure,
                    other => {
                        return Err(RuntimeError::type_mismatch(
                            "procedure call",
                            "procedure",
                            other.type_name(),
                        ));
                    }
                };
                let values = self.eval_args(args, env)?;
                self.apply(&procedure, values, &callee_name(func))?;
                Ok(Value::None)
            }

            Expr::Function { params, body } => Ok(Value::Closure(Rc::new(Closure {
                params: params.clone(),
                body: body.clone(),
                env: env.clone(),
            }))),

            Expr::Procedure { params, body } => Ok(Value::Procedure(Rc::new(Closure {
                params: params.clone(),
                body: body.clone(),
                env: env.clone(),
            }))),

            Expr::RefCell(init) => Ok(Value::new_ref(self.eval(init, env)?)),

            Expr::Do(exprs) => {
                let mut result = Value::None;
                for expr in exprs {
                    result = self.eval(expr, env)?;
                }
                Ok(result)
            }

            Expr::While { cond, body } => {
                while self.eval_condition(cond, env, "while condition")? {
                    self.eval(body, env)?;
                }
                Ok(Value::None)
            }

            Expr::Array { size } => match self.eval(size, env)? {
                // A negative size yields an empty array
                Value::Int(n) => Ok(Value::new_array(usize::try_from(n).unwrap_or(0))),
                other => Err(RuntimeError::type_mismatch(
                    "array size",
                    "integer",
                    other.type_name(),
                )),
            },

            Expr::WithArray { array, body } => {
                let array = match self.eval(array, env)? {
                    array @ Value::Array(_) => array,
                    other => {
                        return Err(RuntimeError::type_mismatch(
                            "with-array",
                            "array",
                            other.type_name(),
                        ));
                    }
                };
                let inner = env.extend(array_bindings(array));
                self.eval(body, &inner)
            }

            Expr::Template(def) => Ok(Value::Template(self.define_template(def, env)?)),

            Expr::Object { template, args } => {
                let template = match self.eval(template, env)? {
                    Value::Template(template) => template,
                    other => {
                        return Err(RuntimeError::type_mismatch(
                            "new",
                            "template",
                            other.type_name(),
                        ));
                    }
                };
                Ok(Value::Object(self.instantiate(&template, args, env)?))
            }

            Expr::ObjectBinding { template, object } => {
                let object = self.eval(object, env)?;
                let template = self.eval(template, env)?;
                Ok(Value::Binding(self.bind_object(object, template)?))
            }

            Expr::WithCall {
                target,
                method,
                args,
            } => self.with_call(target, method, args, env),

            Expr::AbstractStub => Ok(Value::Abstract),
        }
    }

    /// Evaluate arguments left to right
    pub(crate) fn eval_args(&mut self, args: &[Expr], env: &Env) -> RuntimeResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg, env)).collect()
    }

    fn eval_condition(&mut self, cond: &Expr, env: &Env, context: &str) -> RuntimeResult<bool> {
        let value = self.eval(cond, env)?;
        value
            .as_bool()
            .ok_or_else(|| RuntimeError::type_mismatch(context, "boolean", value.type_name()))
    }

    /// Apply a function or procedure body over its captured environment
    pub fn apply(
        &mut self,
        closure: &Closure,
        args: Vec<Value>,
        callee: &str,
    ) -> RuntimeResult<Value> {
        self.apply_in(closure, args, callee, &closure.env)
    }

    /// Apply a body over an explicit base environment
    pub(crate) fn apply_in(
        &mut self,
        closure: &Closure,
        args: Vec<Value>,
        callee: &str,
        base: &Env,
    ) -> RuntimeResult<Value> {
        if args.len() != closure.params.len() {
            return Err(RuntimeError::Arity {
                callee: callee.to_string(),
                expected: closure.params.len(),
                received: args.len(),
            });
        }
        tracing::trace!(callee, args = args.len(), "applying");
        let inner = base.extend(closure.params.iter().cloned().zip(args));
        self.eval(&closure.body, &inner)
    }

    fn eval_primitive(&mut self, prim: Primitive, args: Vec<Value>) -> RuntimeResult<Value> {
        match prim {
            Primitive::Print => {
                let line = args[0].to_string();
                if self.echo {
                    println!("{}", line);
                }
                self.output.push(line);
                Ok(Value::None)
            }
            Primitive::ArrayMap => {
                let items = primitives::array(prim, &args[0])?;
                // Snapshot so the mapped function may write to the array
                let snapshot = items.borrow().clone();
                let mut mapped = Vec::with_capacity(snapshot.len());
                for item in snapshot {
                    let result = match &args[1] {
                        Value::Closure(f) => self.apply(f, vec![item], "map")?,
                        Value::Procedure(p) => {
                            self.apply(p, vec![item], "map")?;
                            Value::None
                        }
                        other => {
                            return Err(RuntimeError::type_mismatch(
                                "map",
                                "function",
                                other.type_name(),
                            ));
                        }
                    };
                    mapped.push(result);
                }
                Ok(Value::Array(Rc::new(std::cell::RefCell::new(mapped))))
            }
            _ => primitives::apply(prim, &args),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn eval_literal(lit: &Literal) -> Value {
    match lit {
        Literal::Int(n) => Value::Int(*n),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Str(s) => Value::String(s.clone()),
        Literal::None => Value::None,
    }
}

/// Best-effort name for arity diagnostics
fn callee_name(func: &Expr) -> String {
    match func {
        Expr::Identifier(name) => name.clone(),
        Expr::PrimitiveCall {
            prim: Primitive::Deref,
            args,
        } => match args.as_slice() {
            [Expr::Identifier(name)] => name.clone(),
            _ => "function".to_string(),
        },
        _ => "function".to_string(),
    }
}

/// A closure over a one-slot environment holding `array`
fn array_closure(array: &Value, params: &[&str], prim: Primitive) -> Value {
    let mut args = vec![Expr::id(ARRAY_SLOT)];
    args.extend(params.iter().map(|p| Expr::id(*p)));
    Value::Closure(Rc::new(Closure {
        params: params.iter().map(|p| p.to_string()).collect(),
        body: Rc::new(Expr::prim(prim, args)),
        env: Env::new().bind(ARRAY_SLOT, array.clone()),
    }))
}

/// `index`, `length` and `map` over one array's storage, each in a cell
/// like any other surface-visible name
fn array_bindings(array: Value) -> Vec<(String, Value)> {
    vec![
        (
            "index".to_string(),
            Value::new_ref(array_closure(&array, &["i"], Primitive::ArrayIndex)),
        ),
        (
            "length".to_string(),
            Value::new_ref(array_closure(&array, &[], Primitive::ArrayLength)),
        ),
        (
            "map".to_string(),
            Value::new_ref(array_closure(&array, &["f"], Primitive::ArrayMap)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eval(expr: &Expr) -> RuntimeResult<Value> {
        Interpreter::new().eval(expr, &Env::new())
    }

    fn function(params: &[&str], body: Expr) -> Expr {
        Expr::Function {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: Rc::new(body),
        }
    }

    #[test]
    fn test_let_bindings_are_simultaneous() {
        // let x = 1 in let x = 2, y = x in y  ==> 1
        let expr = Expr::Let {
            bindings: vec![("x".into(), Expr::int(1))],
            body: Box::new(Expr::Let {
                bindings: vec![("x".into(), Expr::int(2)), ("y".into(), Expr::id("x"))],
                body: Box::new(Expr::id("y")),
            }),
        };
        assert_eq!(eval(&expr), Ok(Value::Int(1)));
    }

    #[test]
    fn test_closure_uses_captured_environment() {
        // let x = 10, f = fn(y) x + y in let x = 0 in f(1)  ==> 11
        let expr = Expr::Let {
            bindings: vec![("x".into(), Expr::int(10))],
            body: Box::new(Expr::Let {
                bindings: vec![(
                    "f".into(),
                    function(
                        &["y"],
                        Expr::prim(Primitive::Add, vec![Expr::id("x"), Expr::id("y")]),
                    ),
                )],
                body: Box::new(Expr::Let {
                    bindings: vec![("x".into(), Expr::int(0))],
                    body: Box::new(Expr::Call {
                        func: Box::new(Expr::id("f")),
                        args: vec![Expr::int(1)],
                    }),
                }),
            }),
        };
        assert_eq!(eval(&expr), Ok(Value::Int(11)));
    }

    #[test]
    fn test_call_arity_and_type() {
        let call = |func: Expr, args: Vec<Expr>| Expr::Call {
            func: Box::new(func),
            args,
        };
        assert_eq!(
            eval(&call(function(&["a"], Expr::id("a")), vec![])),
            Err(RuntimeError::Arity {
                callee: "function".into(),
                expected: 1,
                received: 0,
            })
        );
        assert!(matches!(
            eval(&call(Expr::int(3), vec![])),
            Err(RuntimeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_procedure_call_yields_none() {
        let expr = Expr::ProcedureCall {
            func: Box::new(Expr::Procedure {
                params: vec![],
                body: Rc::new(Expr::int(5)),
            }),
            args: vec![],
        };
        assert_eq!(eval(&expr), Ok(Value::None));
    }

    #[test]
    fn test_if_requires_boolean() {
        let expr = Expr::If {
            cond: Box::new(Expr::int(0)),
            then_branch: Box::new(Expr::int(1)),
            else_branch: Box::new(Expr::int(2)),
        };
        assert!(matches!(eval(&expr), Err(RuntimeError::TypeMismatch { .. })));
    }

    #[test]
    fn test_empty_do_is_none() {
        assert_eq!(eval(&Expr::Do(vec![])), Ok(Value::None));
    }

    #[test]
    fn test_unbound_identifier() {
        assert_eq!(
            eval(&Expr::id("ghost")),
            Err(RuntimeError::UnboundIdentifier {
                name: "ghost".into()
            })
        );
    }

    #[test]
    fn test_with_array_length_and_map() {
        let array = Expr::Array {
            size: Box::new(Expr::int(3)),
        };
        let length = Expr::WithArray {
            array: Box::new(array.clone()),
            body: Box::new(Expr::Call {
                func: Box::new(Expr::deref_id("length")),
                args: vec![],
            }),
        };
        assert_eq!(eval(&length), Ok(Value::Int(3)));

        let mapped = Expr::WithArray {
            array: Box::new(array),
            body: Box::new(Expr::Call {
                func: Box::new(Expr::deref_id("map")),
                args: vec![function(&["e"], Expr::int(7))],
            }),
        };
        let result = eval(&mapped).unwrap();
        assert_eq!(format!("{}", result), "[7, 7, 7]");
    }
}
