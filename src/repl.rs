//! Interactive session
//!
//! A [`Session`] owns the top-level environment and runs one unit at a
//! time against it. Each declaration extends the environment; a fault
//! aborts only the unit that raised it.

use miette::{IntoDiagnostic, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::ast::TopLevel;
use crate::diagnostics::SourceFile;
use crate::interp::{self, Env, Interpreter, RuntimeError, RuntimeResult, Value};
use crate::{lexer, parser};

const PROMPT: &str = "imp> ";
const CONTINUATION: &str = "| ";

/// Result of running one top-level unit
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A statement ran to completion
    Completed(Value),
    /// A name was bound; carries the confirmation message
    Defined(String),
    /// Structural dump of an expression
    Dumped(String),
    Quit,
    /// Switch to multi-line input
    Continue,
}

/// Top-level interpreter state
pub struct Session {
    interp: Interpreter,
    env: Env,
    /// Printed values and confirmation messages in the order they appeared
    transcript: Vec<String>,
    /// Write confirmation messages to stdout as each unit finishes
    echo: bool,
}

impl Session {
    /// Create a session whose printed values are only buffered
    pub fn new() -> Self {
        Session {
            interp: Interpreter::new(),
            env: interp::initial_env(),
            transcript: Vec::new(),
            echo: false,
        }
    }

    /// Create a session that also writes printed values and confirmation
    /// messages to stdout
    pub fn interactive() -> Self {
        Session {
            interp: Interpreter::with_echo(),
            env: interp::initial_env(),
            transcript: Vec::new(),
            echo: true,
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Values printed so far
    pub fn output(&self) -> &[String] {
        self.interp.get_output()
    }

    /// Drain values printed so far
    pub fn take_output(&mut self) -> Vec<String> {
        self.interp.take_output()
    }

    /// Everything this session has printed or confirmed, in order
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Run one top-level unit, reporting its confirmation message as soon
    /// as it completes
    pub fn execute(&mut self, unit: &TopLevel) -> RuntimeResult<Outcome> {
        let printed = self.interp.get_output().len();
        let result = self.run_unit(unit);
        self.transcript.extend_from_slice(&self.interp.get_output()[printed..]);
        if let Ok(Outcome::Defined(message) | Outcome::Dumped(message)) = &result {
            if self.echo {
                println!("{}", message);
            }
            self.transcript.push(message.clone());
        }
        result
    }

    fn run_unit(&mut self, unit: &TopLevel) -> RuntimeResult<Outcome> {
        match unit {
            TopLevel::Statement(expr) => Ok(Outcome::Completed(self.interp.eval(expr, &self.env)?)),
            TopLevel::Declaration { name, expr } | TopLevel::ProcedureDef { name, expr } => {
                let value = self.interp.eval(expr, &self.env)?;
                tracing::debug!(name = %name, kind = value.type_name(), "declared");
                self.define(name, value);
                Ok(Outcome::Defined(format!("{} defined", name)))
            }
            TopLevel::TemplateDef { name, expr } => {
                let value = self.interp.eval(expr, &self.env)?;
                let message = match &value {
                    Value::Template(template) => format!("{} defined", template.full_name),
                    other => {
                        return Err(RuntimeError::type_mismatch(
                            "class definition",
                            "template",
                            other.type_name(),
                        ));
                    }
                };
                self.define(name, value);
                Ok(Outcome::Defined(message))
            }
            TopLevel::ObjectAssignment { name, expr } => {
                let value = self.interp.eval(expr, &self.env)?;
                let message = match &value {
                    Value::Binding(binding) => format!(
                        "{} of type {} got assigned a {} object",
                        name, binding.template.full_name, binding.object.template.full_name
                    ),
                    other => {
                        return Err(RuntimeError::type_mismatch(
                            "object assignment",
                            "object binding",
                            other.type_name(),
                        ));
                    }
                };
                self.define(name, value);
                Ok(Outcome::Defined(message))
            }
            TopLevel::Abstract(expr) => Ok(Outcome::Dumped(expr.to_string())),
            TopLevel::Quit => Ok(Outcome::Quit),
            TopLevel::Multi => Ok(Outcome::Continue),
        }
    }

    /// Bind a surface-visible name, held in a cell like every variable
    fn define(&mut self, name: &str, value: Value) {
        self.env = self.env.bind(name, Value::new_ref(value));
    }

    /// Lex, parse and run every unit in `source`
    pub fn run_source(&mut self, source: &str) -> Result<Vec<Outcome>> {
        self.run_file(&SourceFile::new("<input>", source))
    }

    /// Run every unit of a file, stopping at the first fault or `#quit`
    ///
    /// Units that ran before a fault keep their bindings and have already
    /// been reported.
    pub fn run_file(&mut self, file: &SourceFile) -> Result<Vec<Outcome>> {
        let tokens = lexer::lex_file(file)?;
        let units = parser::parse_file(&tokens, file)?;
        let mut outcomes = Vec::with_capacity(units.len());
        for unit in &units {
            let outcome = self.execute(unit)?;
            let quit = outcome == Outcome::Quit;
            outcomes.push(outcome);
            if quit {
                break;
            }
        }
        Ok(outcomes)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the interactive loop until `#quit` or end of input
pub fn run() -> Result<()> {
    let mut editor = DefaultEditor::new().into_diagnostic()?;
    let mut session = Session::interactive();

    println!("imp {}", crate::VERSION);
    println!("Type #quit to leave; #multi starts a multi-line unit ended by #end.");

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).into_diagnostic(),
        };
        if line.trim().is_empty() {
            continue;
        }
        editor.add_history_entry(line.as_str()).into_diagnostic()?;

        match session.run_source(&line) {
            Ok(outcomes) => {
                if outcomes.contains(&Outcome::Quit) {
                    break;
                }
                if outcomes.last() == Some(&Outcome::Continue) {
                    let Some(block) = read_block(&mut editor)? else {
                        break;
                    };
                    match session.run_source(&block) {
                        Ok(outcomes) if outcomes.contains(&Outcome::Quit) => break,
                        Ok(_) => {}
                        Err(err) => eprintln!("{:?}", err),
                    }
                }
            }
            Err(err) => eprintln!("{:?}", err),
        }
    }

    Ok(())
}

/// Collect lines up to `#end`; `None` if input ends first
fn read_block(editor: &mut DefaultEditor) -> Result<Option<String>> {
    let mut lines = Vec::new();
    loop {
        match editor.readline(CONTINUATION) {
            Ok(line) if line.trim() == "#end" => return Ok(Some(lines.join("\n"))),
            Ok(line) => lines.push(line),
            Err(ReadlineError::Interrupted) => return Ok(Some(String::new())),
            Err(ReadlineError::Eof) => return Ok(None),
            Err(err) => return Err(err).into_diagnostic(),
        }
    }
}
