//! Front end: tokenizer, abstract syntax tree, operator precedence table and parser.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod precedence;

use crate::lexer::Token;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A grammar violation. Aborts the current top-level statement only.
    #[error("expected {expected}, found {found}")]
    Syntax { expected: &'static str, found: Token },

    #[error("invalid number of operands for operator: expected {expected}, found {found}")]
    OperatorArity { expected: usize, found: usize },

    #[error("invalid precedence {0}: must be in 1..100")]
    PrecedenceRange(f64),
}

pub use parser::{Parser, TokenSource};
pub use precedence::PrecedenceTable;
