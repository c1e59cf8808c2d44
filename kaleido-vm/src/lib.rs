//! Interpreter executing [`kaleido_ir`] modules.

pub mod value;
pub mod vm;

pub use vm::Vm;

use thiserror::Error;

/// Maximum number of nested calls before execution is aborted.
pub const MAX_CALL_DEPTH: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// A declared function has neither a body nor a native implementation.
    #[error("unresolved external function `{0}`")]
    UnresolvedExternal(String),

    #[error("function `{name}` expects {expected} arguments, received {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("maximum call depth of {0} exceeded")]
    CallDepth(usize),

    #[error("malformed function `{function}`: {reason}")]
    Malformed { function: String, reason: String },
}

/// A function implemented by the host.
#[derive(Clone)]
pub struct NativeFn {
    pub ident: String,
    pub arity: usize,
    pub func: &'static dyn Fn(&[f64]) -> f64,
}

impl std::fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn {}>", self.ident)
    }
}
