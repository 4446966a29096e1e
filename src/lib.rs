//! imp: a small imperative language with closures, reference cells and
//! class templates
//!
//! # Architecture
//!
//! ```text
//! Source → Lexer → Parser (desugaring) → TopLevel units → Session → Interpreter
//! ```
//!
//! Every variable lives in a reference cell held by a persistent
//! environment, so closures capture bindings by sharing cells rather than
//! copying values. Templates form single-inheritance chains rooted at
//! `Object`; objects are reached through bindings that restrict which
//! methods are visible.
//!
//! # Example
//!
//! ```text
//! class (Counter Object (start) () ((show () print start;)))
//! obj Counter c = new Counter(3)
//! (with c show ())
//! ```

pub mod ast;
pub mod common;
pub mod diagnostics;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;

pub use diagnostics::{SourceFile, SyntaxError};
pub use interp::{Interpreter, RuntimeError, Value};
pub use repl::{Outcome, Session};

/// Interpreter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse source code into top-level units
pub fn parse(source: &str) -> miette::Result<Vec<ast::TopLevel>> {
    let tokens = lexer::lex(source)?;
    Ok(parser::parse(&tokens, source)?)
}

/// Run source code in a fresh session and return everything it printed
pub fn run(source: &str) -> miette::Result<Vec<String>> {
    let mut session = Session::new();
    session.run_source(source)?;
    Ok(session.take_output())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_run_collects_output() {
        assert_eq!(run("print (+ 1 2);").unwrap(), vec!["3".to_string()]);
    }
}
