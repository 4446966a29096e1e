//! Runtime faults
//!
//! Every fault aborts the current top-level unit; nothing inside the
//! evaluator catches or retries them.

use miette::Diagnostic;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum RuntimeError {
    #[error("Type mismatch in {context}: expected {expected}, found {found}")]
    #[diagnostic(code(runtime::type_mismatch))]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("`{callee}` expected {expected} arguments but received {received}")]
    #[diagnostic(code(runtime::arity))]
    Arity {
        callee: String,
        expected: usize,
        received: usize,
    },

    #[error("Unknown identifier `{name}`")]
    #[diagnostic(code(runtime::unbound_identifier))]
    UnboundIdentifier { name: String },

    #[error("Cannot instantiate abstract template `{template}`")]
    #[diagnostic(code(runtime::abstract_instantiation))]
    AbstractInstantiation { template: String },

    #[error("Concrete template `{template}` leaves method `{method}` unimplemented")]
    #[diagnostic(
        code(runtime::abstract_method_contract),
        help("implement the method or declare the template with `absclass`")
    )]
    AbstractMethodContract { template: String, method: String },

    #[error("Object of type `{object_type}` is not of type `{expected_type}`")]
    #[diagnostic(code(runtime::subtype_mismatch))]
    SubtypeMismatch {
        object_type: String,
        expected_type: String,
    },

    #[error("Method `{method}` is not accessible through `{template}`")]
    #[diagnostic(
        code(runtime::inaccessible_method),
        help("the method must be declared, possibly abstractly, at the bound template level")
    )]
    InaccessibleMethod { method: String, template: String },

    #[error("Division by zero")]
    #[diagnostic(code(runtime::division_by_zero))]
    DivisionByZero,

    #[error("Index {index} out of bounds for array of length {len}")]
    #[diagnostic(code(runtime::index_out_of_bounds))]
    IndexOutOfBounds { index: i64, len: usize },
}

impl RuntimeError {
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        RuntimeError::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unbound(name: impl Into<String>) -> Self {
        RuntimeError::UnboundIdentifier { name: name.into() }
    }
}
