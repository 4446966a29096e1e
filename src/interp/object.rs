//! Templates, objects and scoped method dispatch
//!
//! A template is a class: a named level of constructor parameters and
//! methods on top of a parent template. Every chain ends at the root
//! `Object` template. An object is the environment produced by running the
//! constructor chain; methods run inside it through an [`ObjectBinding`],
//! which views the object through one of its ancestor templates and limits
//! dispatch to the methods visible at that level.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{Expr, TemplateDef};

use super::env::{Env, dereference};
use super::error::{RuntimeError, RuntimeResult};
use super::eval::Interpreter;
use super::value::Value;

/// Name of the template every chain ends at
pub const ROOT_TEMPLATE: &str = "Object";

/// Constructor data of one level of a template chain
#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    pub params: Vec<String>,
    /// Evaluated to construct the next level up
    pub super_args: Vec<Expr>,
}

/// Class template
pub struct Template {
    pub is_abstract: bool,
    pub name: String,
    /// Own name followed by every ancestor name, dot-joined
    pub full_name: String,
    pub parent: Option<Rc<Template>>,
    /// This level first, then each ancestor up to the root
    pub levels: Vec<Level>,
    /// Every method visible at this level; the most derived definition of
    /// each name wins
    pub methods: IndexMap<String, Value>,
    /// Method bindings over the parent's scope, ending at the primitives
    pub scope: Env,
}

impl Template {
    /// The root `Object` template
    pub fn root(scope: Env) -> Template {
        Template {
            is_abstract: false,
            name: ROOT_TEMPLATE.to_string(),
            full_name: ROOT_TEMPLATE.to_string(),
            parent: None,
            levels: vec![Level {
                name: ROOT_TEMPLATE.to_string(),
                params: Vec::new(),
                super_args: Vec::new(),
            }],
            methods: IndexMap::new(),
            scope,
        }
    }

    /// Constructor parameters of the most derived level
    pub fn params(&self) -> &[String] {
        &self.levels[0].params
    }

    /// This template followed by each ancestor
    pub fn ancestors(&self) -> impl Iterator<Item = &Template> {
        std::iter::successors(Some(self), |t| t.parent.as_deref())
    }

    /// True if `other`'s chain of level names ends this template's chain
    ///
    /// Matching on names keeps objects built before a template was
    /// redeclared bindable to the new declaration.
    pub fn descends_from(&self, other: &Template) -> bool {
        let own: Vec<&str> = self.ancestors().map(|t| t.name.as_str()).collect();
        let expected: Vec<&str> = other.ancestors().map(|t| t.name.as_str()).collect();
        own.ends_with(&expected)
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("full_name", &self.full_name)
            .field("is_abstract", &self.is_abstract)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Instance of a concrete template
pub struct Object {
    pub template: Rc<Template>,
    /// Constructor parameters of every level over the template's scope
    pub env: Env,
}

/// An object viewed through one of its ancestor templates
pub struct ObjectBinding {
    pub template: Rc<Template>,
    pub object: Rc<Object>,
}

impl Interpreter {
    /// Build a template from its definition
    pub fn define_template(&mut self, def: &TemplateDef, env: &Env) -> RuntimeResult<Rc<Template>> {
        let parent = match self.eval(&def.superclass, env)? {
            Value::Template(parent) => parent,
            other => {
                return Err(RuntimeError::type_mismatch(
                    "class definition",
                    "template",
                    other.type_name(),
                ));
            }
        };

        let mut levels = Vec::with_capacity(parent.levels.len() + 1);
        levels.push(Level {
            name: def.name.clone(),
            params: def.params.clone(),
            super_args: def.super_args.clone(),
        });
        levels.extend(parent.levels.iter().cloned());

        let mut methods = parent.methods.clone();
        let mut scope = parent.scope.clone();
        for method in &def.methods {
            let value = self.eval(&method.body, env)?;
            // Replacing keeps the position of the inherited entry
            methods.insert(method.name.clone(), value.clone());
            scope = scope.bind(method.name.clone(), Value::new_ref(value));
        }

        let full_name = format!("{}.{}", def.name, parent.full_name);
        if !def.is_abstract {
            let stub = methods
                .iter()
                .find(|(_, value)| matches!(value, Value::Abstract));
            if let Some((method, _)) = stub {
                return Err(RuntimeError::AbstractMethodContract {
                    template: full_name,
                    method: method.clone(),
                });
            }
        }

        tracing::debug!(
            template = %full_name,
            is_abstract = def.is_abstract,
            methods = methods.len(),
            "defined template"
        );

        Ok(Rc::new(Template {
            is_abstract: def.is_abstract,
            name: def.name.clone(),
            full_name,
            parent: Some(parent),
            levels,
            methods,
            scope,
        }))
    }

    /// Run the constructor chain of `template`
    ///
    /// Leaf arguments are evaluated in the caller's environment. Each
    /// ancestor level's parameters are then bound to the previous level's
    /// superclass arguments, evaluated in the environment built so far.
    pub fn instantiate(
        &mut self,
        template: &Rc<Template>,
        args: &[Expr],
        env: &Env,
    ) -> RuntimeResult<Rc<Object>> {
        if template.is_abstract {
            return Err(RuntimeError::AbstractInstantiation {
                template: template.full_name.clone(),
            });
        }
        if args.len() != template.params().len() {
            return Err(RuntimeError::Arity {
                callee: template.full_name.clone(),
                expected: template.params().len(),
                received: args.len(),
            });
        }

        let values = self.eval_args(args, env)?;
        let mut object_env = template.scope.extend(
            template
                .params()
                .iter()
                .cloned()
                .zip(values.into_iter().map(Value::new_ref)),
        );

        for pair in template.levels.windows(2) {
            let (child, level) = (&pair[0], &pair[1]);
            if child.super_args.len() != level.params.len() {
                return Err(RuntimeError::Arity {
                    callee: level.name.clone(),
                    expected: level.params.len(),
                    received: child.super_args.len(),
                });
            }
            let values = self.eval_args(&child.super_args, &object_env)?;
            object_env = object_env.extend(
                level
                    .params
                    .iter()
                    .cloned()
                    .zip(values.into_iter().map(Value::new_ref)),
            );
        }

        tracing::debug!(template = %template.full_name, "constructed object");

        Ok(Rc::new(Object {
            template: template.clone(),
            env: object_env,
        }))
    }

    /// View `object` through `template`, which must be one of its ancestors
    pub fn bind_object(&mut self, object: Value, template: Value) -> RuntimeResult<Rc<ObjectBinding>> {
        let object = match object {
            Value::Object(object) => object,
            other => {
                return Err(RuntimeError::type_mismatch(
                    "object binding",
                    "object",
                    other.type_name(),
                ));
            }
        };
        let template = match template {
            Value::Template(template) => template,
            other => {
                return Err(RuntimeError::type_mismatch(
                    "object binding",
                    "template",
                    other.type_name(),
                ));
            }
        };

        if !object.template.descends_from(&template) {
            return Err(RuntimeError::SubtypeMismatch {
                object_type: object.template.full_name.clone(),
                expected_type: template.full_name.clone(),
            });
        }

        tracing::debug!(
            template = %template.full_name,
            object = %object.template.full_name,
            "bound object"
        );

        Ok(Rc::new(ObjectBinding { template, object }))
    }

    /// Invoke `method` on the object behind `target`
    ///
    /// Only methods visible at the bound template's level are reachable,
    /// but the object's own (most derived) implementation runs. Arguments
    /// are evaluated in the caller's environment and the body runs inside
    /// the object's environment.
    pub fn with_call(
        &mut self,
        target: &Expr,
        method: &str,
        args: &[Expr],
        env: &Env,
    ) -> RuntimeResult<Value> {
        let binding = match self.eval(target, env)? {
            Value::Binding(binding) => binding,
            other => {
                return Err(RuntimeError::type_mismatch(
                    "with",
                    "object binding",
                    other.type_name(),
                ));
            }
        };

        if !binding.template.methods.contains_key(method) {
            return Err(RuntimeError::InaccessibleMethod {
                method: method.to_string(),
                template: binding.template.full_name.clone(),
            });
        }

        let object = &binding.object;
        let implementation = match dereference(&object.env.lookup(method)?) {
            Value::Ref(cell) => dereference(&cell),
            other => other,
        };
        let closure = match implementation {
            Value::Procedure(closure) | Value::Closure(closure) => closure,
            other => {
                return Err(RuntimeError::type_mismatch(
                    "with",
                    "procedure",
                    other.type_name(),
                ));
            }
        };

        let values = self.eval_args(args, env)?;
        tracing::trace!(
            method,
            object = %object.template.full_name,
            "dispatching method"
        );
        self.apply_in(&closure, values, method, &object.env)?;
        Ok(Value::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{MethodDef, Primitive};
    use pretty_assertions::assert_eq;

    fn procedure(params: &[&str], body: Expr) -> Expr {
        Expr::Procedure {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: Rc::new(body),
        }
    }

    fn def(name: &str, superclass: &str, is_abstract: bool, methods: Vec<MethodDef>) -> TemplateDef {
        TemplateDef {
            is_abstract,
            name: name.to_string(),
            superclass: Expr::id(superclass),
            params: Vec::new(),
            super_args: Vec::new(),
            methods,
        }
    }

    fn method(name: &str, body: Expr) -> MethodDef {
        MethodDef {
            name: name.to_string(),
            body,
        }
    }

    fn root_env() -> Env {
        Env::new().bind(ROOT_TEMPLATE, Value::Template(Rc::new(Template::root(Env::new()))))
    }

    fn print_int(n: i64) -> Expr {
        procedure(&[], Expr::prim(Primitive::Print, vec![Expr::int(n)]))
    }

    #[test]
    fn test_full_name_and_levels() {
        let mut interp = Interpreter::new();
        let env = root_env();
        let a = interp.define_template(&def("A", ROOT_TEMPLATE, false, vec![]), &env).unwrap();
        let env = env.bind("A", Value::Template(a));
        let b = interp.define_template(&def("B", "A", false, vec![]), &env).unwrap();

        assert_eq!(b.full_name, "B.A.Object");
        assert_eq!(
            b.levels.iter().map(|l| l.name.as_str()).collect::<Vec<_>>(),
            vec!["B", "A", "Object"]
        );
    }

    #[test]
    fn test_concrete_template_must_implement_stubs() {
        let mut interp = Interpreter::new();
        let env = root_env();
        let shape = interp
            .define_template(
                &def("Shape", ROOT_TEMPLATE, true, vec![method("area", Expr::AbstractStub)]),
                &env,
            )
            .unwrap();
        let env = env.bind("Shape", Value::Template(shape));

        let err = interp
            .define_template(&def("Blob", "Shape", false, vec![]), &env)
            .unwrap_err();
        assert_eq!(
            err,
            RuntimeError::AbstractMethodContract {
                template: "Blob.Shape.Object".into(),
                method: "area".into(),
            }
        );

        let square = interp
            .define_template(
                &def("Square", "Shape", false, vec![method("area", print_int(4))]),
                &env,
            )
            .unwrap();
        assert!(matches!(square.methods["area"], Value::Procedure(_)));
    }

    #[test]
    fn test_superclass_must_be_template() {
        let mut interp = Interpreter::new();
        let env = root_env().bind("n", Value::Int(3));
        assert!(matches!(
            interp.define_template(&def("A", "n", false, vec![]), &env),
            Err(RuntimeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_binding_requires_ancestor() {
        let mut interp = Interpreter::new();
        let env = root_env();
        let a = interp.define_template(&def("A", ROOT_TEMPLATE, false, vec![]), &env).unwrap();
        let env = env.bind("A", Value::Template(a.clone()));
        let b = interp.define_template(&def("B", "A", false, vec![]), &env).unwrap();

        let object = interp.instantiate(&a, &[], &env).unwrap();
        assert!(interp
            .bind_object(Value::Object(object.clone()), Value::Template(a.clone()))
            .is_ok());
        assert_eq!(
            interp
                .bind_object(Value::Object(object), Value::Template(b.clone()))
                .err(),
            Some(RuntimeError::SubtypeMismatch {
                object_type: "A.Object".into(),
                expected_type: "B.A.Object".into(),
            })
        );

        let derived = interp.instantiate(&b, &[], &env).unwrap();
        assert!(interp
            .bind_object(Value::Object(derived), Value::Template(a))
            .is_ok());
    }

    #[test]
    fn test_abstract_template_cannot_be_instantiated() {
        let mut interp = Interpreter::new();
        let env = root_env();
        let a = interp.define_template(&def("A", ROOT_TEMPLATE, true, vec![]), &env).unwrap();
        assert_eq!(
            interp.instantiate(&a, &[], &env).err().map(|e| e.to_string()),
            Some("Cannot instantiate abstract template `A.Object`".to_string())
        );
    }

    #[test]
    fn test_with_call_runs_most_derived_method() {
        let mut interp = Interpreter::new();
        let env = root_env();
        let a = interp
            .define_template(&def("A", ROOT_TEMPLATE, false, vec![method("m", print_int(1))]), &env)
            .unwrap();
        let env = env.bind("A", Value::Template(a.clone()));
        let b = interp
            .define_template(&def("B", "A", false, vec![method("m", print_int(2))]), &env)
            .unwrap();

        let object = interp.instantiate(&b, &[], &env).unwrap();
        let binding = interp
            .bind_object(Value::Object(object), Value::Template(a))
            .unwrap();
        let env = env.bind("o", Value::Binding(binding));

        assert_eq!(interp.with_call(&Expr::id("o"), "m", &[], &env), Ok(Value::None));
        assert_eq!(interp.get_output(), &["2".to_string()]);

        assert_eq!(
            interp.with_call(&Expr::id("o"), "missing", &[], &env),
            Err(RuntimeError::InaccessibleMethod {
                method: "missing".into(),
                template: "A.Object".into(),
            })
        );
    }
}
