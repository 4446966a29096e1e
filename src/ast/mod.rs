//! Abstract syntax for the imp language
//!
//! The parser produces these types; the interpreter only ever reads them.
//! Every surface construct is desugared into this closed set of variants,
//! so the evaluator has exactly one rule per [`Expr`] case.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Constant embedded directly in the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(String),
    None,
}

/// Host operation invoked through [`Expr::PrimitiveCall`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    IsZero,
    Length,
    Substring,
    Concat,
    StartsWith,
    EndsWith,
    Lower,
    Upper,
    // Used by surface desugaring, never bound to a name
    Print,
    Deref,
    Update,
    UpdateArray,
    // Bodies of the closures exposed by `with-array`
    ArrayIndex,
    ArrayLength,
    ArrayMap,
}

impl Primitive {
    /// Primitives bound by name in every fresh session
    pub const BUILTINS: [Primitive; 17] = [
        Primitive::Add,
        Primitive::Sub,
        Primitive::Mul,
        Primitive::Div,
        Primitive::IsZero,
        Primitive::Lt,
        Primitive::Gt,
        Primitive::Le,
        Primitive::Ge,
        Primitive::Eq,
        Primitive::Length,
        Primitive::Substring,
        Primitive::Concat,
        Primitive::StartsWith,
        Primitive::EndsWith,
        Primitive::Lower,
        Primitive::Upper,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Add => "+",
            Primitive::Sub => "-",
            Primitive::Mul => "*",
            Primitive::Div => "/",
            Primitive::Lt => "<",
            Primitive::Gt => ">",
            Primitive::Le => "<=",
            Primitive::Ge => ">=",
            Primitive::Eq => "==",
            Primitive::IsZero => "zero?",
            Primitive::Length => "length",
            Primitive::Substring => "substring",
            Primitive::Concat => "concat",
            Primitive::StartsWith => "startswith",
            Primitive::EndsWith => "endswith",
            Primitive::Lower => "lower",
            Primitive::Upper => "upper",
            Primitive::Print => "print",
            Primitive::Deref => "deref",
            Primitive::Update => "update",
            Primitive::UpdateArray => "update-array",
            Primitive::ArrayIndex => "array-index",
            Primitive::ArrayLength => "array-length",
            Primitive::ArrayMap => "array-map",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Primitive::IsZero
            | Primitive::Length
            | Primitive::Lower
            | Primitive::Upper
            | Primitive::Print
            | Primitive::Deref
            | Primitive::ArrayLength => 1,
            Primitive::Substring | Primitive::UpdateArray => 3,
            _ => 2,
        }
    }
}

/// One method of a template: a procedure literal or [`Expr::AbstractStub`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub body: Expr,
}

/// Template (class) definition as written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDef {
    pub is_abstract: bool,
    pub name: String,
    /// Evaluates to the superclass template
    pub superclass: Expr,
    /// This level's constructor parameters
    pub params: Vec<String>,
    /// Arguments this level passes up to construct its parent
    pub super_args: Vec<Expr>,
    pub methods: Vec<MethodDef>,
}

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    PrimitiveCall {
        prim: Primitive,
        args: Vec<Expr>,
    },
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// Simultaneous bindings: each right-hand side sees only the outer scope
    Let {
        bindings: Vec<(String, Expr)>,
        body: Box<Expr>,
    },
    Identifier(String),
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    ProcedureCall {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Function {
        params: Vec<String>,
        body: Rc<Expr>,
    },
    Procedure {
        params: Vec<String>,
        body: Rc<Expr>,
    },
    RefCell(Box<Expr>),
    Do(Vec<Expr>),
    While {
        cond: Box<Expr>,
        body: Box<Expr>,
    },
    Array {
        size: Box<Expr>,
    },
    WithArray {
        array: Box<Expr>,
        body: Box<Expr>,
    },
    Template(Rc<TemplateDef>),
    Object {
        template: Box<Expr>,
        args: Vec<Expr>,
    },
    ObjectBinding {
        template: Box<Expr>,
        object: Box<Expr>,
    },
    WithCall {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    AbstractStub,
}

impl Expr {
    pub fn int(n: i64) -> Expr {
        Expr::Literal(Literal::Int(n))
    }

    pub fn bool(b: bool) -> Expr {
        Expr::Literal(Literal::Bool(b))
    }

    pub fn string(s: impl Into<String>) -> Expr {
        Expr::Literal(Literal::Str(s.into()))
    }

    pub fn none() -> Expr {
        Expr::Literal(Literal::None)
    }

    pub fn id(name: impl Into<String>) -> Expr {
        Expr::Identifier(name.into())
    }

    pub fn prim(prim: Primitive, args: Vec<Expr>) -> Expr {
        Expr::PrimitiveCall { prim, args }
    }

    /// Surface-level variable read: the binding holds a cell, read through it
    pub fn deref_id(name: impl Into<String>) -> Expr {
        Expr::prim(Primitive::Deref, vec![Expr::id(name)])
    }
}

/// One parsed unit of REPL input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopLevel {
    Statement(Expr),
    Declaration { name: String, expr: Expr },
    ProcedureDef { name: String, expr: Expr },
    TemplateDef { name: String, expr: Expr },
    ObjectAssignment { name: String, expr: Expr },
    Abstract(Expr),
    Quit,
    Multi,
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "]")
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "Int({})", n),
            Literal::Bool(b) => write!(f, "Bool({})", b),
            Literal::Str(s) => write!(f, "Str({:?})", s),
            Literal::None => write!(f, "None"),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.name, self.body)
    }
}

/// Structural dump, printed by `#abs`
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::PrimitiveCall { prim, args } => {
                write!(f, "Prim({},", prim)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "If({},{},{})", cond, then_branch, else_branch),
            Expr::Let { bindings, body } => {
                write!(f, "Let([")?;
                for (i, (name, expr)) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "({},{})", name, expr)?;
                }
                write!(f, "],{})", body)
            }
            Expr::Identifier(name) => write!(f, "Id({})", name),
            Expr::Call { func, args } => {
                write!(f, "Call({},", func)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::ProcedureCall { func, args } => {
                write!(f, "ProcCall({},", func)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Function { params, body } => {
                write!(f, "Function([{}],{})", params.join(","), body)
            }
            Expr::Procedure { params, body } => {
                write!(f, "Procedure([{}],{})", params.join(","), body)
            }
            Expr::RefCell(init) => write!(f, "Ref({})", init),
            Expr::Do(exprs) => {
                write!(f, "Do(")?;
                write_list(f, exprs)?;
                write!(f, ")")
            }
            Expr::While { cond, body } => write!(f, "While({},{})", cond, body),
            Expr::Array { size } => write!(f, "Array({})", size),
            Expr::WithArray { array, body } => write!(f, "WithArray({},{})", array, body),
            Expr::Template(def) => {
                let keyword = if def.is_abstract { "AbsClass" } else { "Class" };
                write!(
                    f,
                    "{}({},{},[{}],",
                    keyword,
                    def.name,
                    def.superclass,
                    def.params.join(",")
                )?;
                write_list(f, &def.super_args)?;
                write!(f, ",")?;
                write_list(f, &def.methods)?;
                write!(f, ")")
            }
            Expr::Object { template, args } => {
                write!(f, "New({},", template)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::ObjectBinding { template, object } => {
                write!(f, "Bind({},{})", template, object)
            }
            Expr::WithCall {
                target,
                method,
                args,
            } => {
                write!(f, "With({},{},", target, method)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::AbstractStub => write!(f, "NotImplemented"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        assert_eq!(Primitive::BUILTINS.len(), 17);
        assert!(Primitive::BUILTINS.contains(&Primitive::IsZero));
        assert_eq!(Primitive::Substring.arity(), 3);
        // internal primitives are not bound by name
        assert!(!Primitive::BUILTINS.contains(&Primitive::Deref));
    }

    #[test]
    fn test_display_is_structural() {
        let expr = Expr::If {
            cond: Box::new(Expr::bool(true)),
            then_branch: Box::new(Expr::deref_id("x")),
            else_branch: Box::new(Expr::string("no")),
        };
        assert_eq!(
            expr.to_string(),
            r#"If(Bool(true),Prim(deref,[Id(x)]),Str("no"))"#
        );
    }
}
