//! Driver: runs source text statement by statement through the parser, the
//! code generator and the interpreter.

pub mod builtin_functions;

use kaleido_codegen::{CodegenError, Context};
use kaleido_parser::ast::TopLevel;
use kaleido_parser::{ParseError, Parser, TokenSource};
use kaleido_source::{Located, Source};
use kaleido_vm::{RuntimeError, Vm};
use thiserror::Error;
use tracing::debug;

/// Any failure of a single top-level statement.
#[derive(Error, Debug)]
pub enum StatementError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Print the IR of every generated function to stderr.
    pub emit_ir: bool,
    /// Run anonymous top-level expressions after generating them.
    pub execute: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            emit_ir: false,
            execute: true,
        }
    }
}

/// Result of one successful top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A named function was generated and stored. Also reported for anonymous
    /// expressions when execution is disabled.
    Defined(String),
    /// An `extern` declaration.
    Declared(String),
    /// An anonymous expression was executed.
    Evaluated(f64),
}

/// Compilation and execution state persisting across inputs.
pub struct Session {
    ctx: Context,
    vm: Vm,
    options: SessionOptions,
}

impl Session {
    /// Create a session with the built-in native functions registered.
    pub fn new(options: SessionOptions) -> Self {
        let mut vm = Vm::new();
        builtin_functions::register_builtin_functions(&mut vm);
        Self::with_vm(options, vm)
    }

    pub fn with_vm(options: SessionOptions, vm: Vm) -> Self {
        Self {
            ctx: Context::new(),
            vm,
            options,
        }
    }

    /// Runs every top-level statement of `source`.
    ///
    /// A failing statement reports exactly one diagnostic to `source.errors`
    /// and is skipped. Returns the outcomes of the statements that succeeded.
    pub fn run(&mut self, source: &Source) -> Vec<Outcome> {
        let mut tokens = TokenSource::new(source);
        let mut outcomes = Vec::new();

        loop {
            let parsed = Parser::new(&mut tokens, self.ctx.precedence()).parse_top_level();
            let result = match parsed {
                None => break,
                Some(Ok(item)) => {
                    let (span, item) = item.split();
                    debug!(%item, "parsed statement");
                    self.statement(&item).map_err(|err| Located::at(err, span))
                }
                Some(Err(err)) => Err(err.map(StatementError::from)),
            };

            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(failure) => {
                    debug!(span = ?failure.span(), "statement failed");
                    source.errors.add_error(failure.into());
                }
            }
        }

        outcomes
    }

    fn statement(&mut self, item: &TopLevel) -> Result<Outcome, StatementError> {
        let function = self.ctx.generate(item)?;
        if self.options.emit_ir {
            eprint!("{}", function);
        }
        let name = function.name.clone();

        match item {
            TopLevel::Definition(_) => Ok(Outcome::Defined(name)),
            TopLevel::Extern(_) => Ok(Outcome::Declared(name)),
            TopLevel::Expression(_) => {
                let result = if self.options.execute {
                    self.vm.call(self.ctx.module(), &name, &[]).map(Some)
                } else {
                    Ok(None)
                };
                self.ctx.module_mut().remove(&name);

                Ok(match result? {
                    Some(value) => Outcome::Evaluated(value),
                    None => Outcome::Defined(name),
                })
            }
        }
    }
}

/// For testing purposes only. Runs `source` in a fresh session and returns
/// the outcomes together with the rendered diagnostics.
pub fn interpret(source: &str) -> (Vec<Outcome>, Vec<String>) {
    let source: Source = source.into();
    let outcomes = Session::new(SessionOptions::default()).run(&source);
    let errors = source
        .errors
        .diagnostics()
        .iter()
        .map(|diagnostic| diagnostic.message().to_string())
        .collect();
    (outcomes, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_expressions_are_removed() {
        let source: Source = "def f(x) x; f(2); 3".into();
        let mut session = Session::new(SessionOptions::default());
        let outcomes = session.run(&source);

        assert_eq!(
            outcomes,
            vec![
                Outcome::Defined("f".to_string()),
                Outcome::Evaluated(2.0),
                Outcome::Evaluated(3.0)
            ]
        );
        let names: Vec<_> = session
            .ctx
            .module()
            .functions()
            .iter()
            .map(|function| function.name.as_str())
            .collect();
        assert_eq!(names, vec!["f"]);
    }

    #[test]
    fn test_no_exec() {
        let source: Source = "1 + 2".into();
        let options = SessionOptions {
            execute: false,
            ..SessionOptions::default()
        };
        let outcomes = Session::new(options).run(&source);
        assert_eq!(outcomes, vec![Outcome::Defined("__anon_expr".to_string())]);
    }

    #[test]
    fn test_one_diagnostic_per_failure() {
        let source: Source = "def f(x) y; 1 +; g(1); 4".into();
        let outcomes = Session::new(SessionOptions::default()).run(&source);

        assert_eq!(outcomes, vec![Outcome::Evaluated(4.0)]);
        let diagnostics = source.errors.diagnostics();
        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics[0].message(), "unknown variable `y`");
        assert_eq!(diagnostics[0].span(), 0..10);
        assert_eq!(diagnostics[1].message(), "expected an expression, found `;`");
        assert_eq!(diagnostics[2].message(), "unknown function `g`");
    }

    #[test]
    fn test_session_state_persists_across_sources() {
        let mut session = Session::new(SessionOptions::default());
        let definitions: Source = "def binary | 5 (a b) if a then 1 else b".into();
        session.run(&definitions);

        let source: Source = "0 | 0 | 7".into();
        assert_eq!(session.run(&source), vec![Outcome::Evaluated(7.0)]);
        assert!(source.has_no_errors());
    }

    #[test]
    fn test_runtime_error_reported() {
        let (outcomes, errors) = interpret("extern sin(x); sin(1)");
        assert_eq!(outcomes, vec![Outcome::Declared("sin".to_string())]);
        assert_eq!(errors, vec!["unresolved external function `sin`".to_string()]);
    }
}
