//! Lowers the abstract syntax tree into SSA IR.
//!
//! A [`Context`] owns all state that persists across top-level statements:
//! the operator precedence table, the prototype registry and the module of
//! generated functions. Everything else lives only while one function body is
//! generated.

pub mod codegen;
pub mod scope;

use kaleido_ir::{Function, Module, VerifyError};
use kaleido_parser::ast::{self, Prototype, TopLevel};
use kaleido_parser::{ParseError, PrecedenceTable};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    /// Unknown variable, function or unary operator.
    #[error("unknown {kind} `{name}`")]
    Name { kind: &'static str, name: String },

    #[error("incorrect number of arguments passed to `{callee}`: expected {expected}, found {found}")]
    Arity {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("destination of `=` must be a variable")]
    AssignmentTarget,

    /// A binary operator parsed successfully but no function implements it.
    #[error("binary operator `{0}` has no implementing function")]
    InternalInvariant(char),

    #[error(transparent)]
    Precedence(#[from] ParseError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// Every prototype seen so far, keyed by function name.
pub type Registry = HashMap<String, Prototype>;

/// Compilation state shared by every top-level statement of a session.
#[derive(Debug, Default)]
pub struct Context {
    precedence: PrecedenceTable,
    registry: Registry,
    module: Module,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// The precedence table the parser must use for the next statement.
    pub fn precedence(&self) -> &PrecedenceTable {
        &self.precedence
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    /// Generates one top-level statement and returns the resulting function.
    pub fn generate(&mut self, item: &TopLevel) -> Result<&Function, CodegenError> {
        match item {
            TopLevel::Extern(proto) => Ok(self.declare(proto)),
            TopLevel::Definition(function) | TopLevel::Expression(function) => {
                self.define(function)
            }
        }
    }

    /// Registers `proto` and adds a bodiless declaration to the module.
    pub fn declare(&mut self, proto: &Prototype) -> &Function {
        debug!(%proto, "declaring function");
        self.registry.insert(proto.name.clone(), proto.clone());
        self.module.declare(&proto.name, &proto.params).0
    }

    /// Generates `function` and inserts it into the module, replacing any
    /// previous definition of the same name.
    ///
    /// The prototype is registered before the body is generated, enabling
    /// recursion. A binary operator's precedence is installed before the body
    /// too, and restored if generation fails.
    pub fn define(&mut self, function: &ast::Function) -> Result<&Function, CodegenError> {
        let proto = &function.proto;
        debug!(%proto, "defining function");

        let installed = match (proto.is_binary_op(), proto.operator_name()) {
            (true, Some(symbol)) => {
                Some((symbol, self.precedence.define(symbol, proto.precedence)?))
            }
            _ => None,
        };
        self.registry.insert(proto.name.clone(), proto.clone());

        let generated = codegen::FunctionCodegen::new(proto, &self.registry, &self.module)
            .generate(&function.body);

        match generated {
            Ok(generated) => {
                for callee in &generated.declarations {
                    self.module.declare(&callee.name, &callee.params);
                }
                Ok(self.module.define(generated.function))
            }
            Err(err) => {
                if let Some((symbol, previous)) = installed {
                    warn!(%symbol, ?previous, "rolling back operator precedence");
                    self.precedence.restore(symbol, previous);
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaleido_parser::ast::Expr;
    use kaleido_parser::lexer::Token;
    use kaleido_parser::{Parser, TokenSource};

    fn parse(ctx: &Context, source: &str) -> TopLevel {
        let mut tokens = TokenSource::lex(source);
        Parser::new(&mut tokens, ctx.precedence())
            .parse_top_level()
            .unwrap()
            .unwrap()
            .into_inner()
    }

    fn generate(ctx: &mut Context, source: &str) -> Result<String, CodegenError> {
        let item = parse(ctx, source);
        ctx.generate(&item).map(|function| function.name.clone())
    }

    #[test]
    fn test_extern_registers_declaration() {
        let mut ctx = Context::new();
        assert_eq!(generate(&mut ctx, "extern sin(x)").unwrap(), "sin");
        assert!(ctx.module().get_function("sin").unwrap().is_declaration());
        assert_eq!(ctx.registry["sin"].params, vec!["x".to_string()]);
    }

    #[test]
    fn test_binary_operator_installs_precedence() {
        let mut ctx = Context::new();
        generate(&mut ctx, "def binary | 5 (a b) a + b").unwrap();
        assert_eq!(ctx.precedence().lookup('|'), Some(5));
        assert!(ctx.module().get_function("binary|").is_some());
    }

    #[test]
    fn test_failed_operator_rolls_back_precedence() {
        let mut ctx = Context::new();
        let err = generate(&mut ctx, "def binary $ 15 (a b) a + missing").unwrap_err();
        assert_eq!(
            err,
            CodegenError::Name {
                kind: "variable",
                name: "missing".to_string()
            }
        );
        assert_eq!(ctx.precedence().lookup('$'), None);
        assert!(ctx.module().get_function("binary$").is_none());

        let mut tokens = TokenSource::lex("a $ b");
        let result = Parser::new(&mut tokens, ctx.precedence())
            .parse_top_level()
            .unwrap();
        assert_eq!(
            result.unwrap_err().into_inner(),
            ParseError::Syntax {
                expected: "`;` after top-level statement",
                found: Token::Char('$'),
            }
        );
    }

    #[test]
    fn test_failed_redefinition_restores_previous_precedence() {
        let mut ctx = Context::new();
        generate(&mut ctx, "def binary | 5 (a b) a").unwrap();
        assert!(generate(&mut ctx, "def binary | 50 (a b) c").is_err());
        assert_eq!(ctx.precedence().lookup('|'), Some(5));
        assert!(ctx.module().get_function("binary|").is_some());
    }

    #[test]
    fn test_failed_redefinition_keeps_previous_body() {
        let mut ctx = Context::new();
        generate(&mut ctx, "def f(x) x + 1").unwrap();
        assert!(generate(&mut ctx, "def f(x) f(x) + y").is_err());
        assert!(!ctx.module().get_function("f").unwrap().is_declaration());
    }

    #[test]
    fn test_failed_definition_adds_nothing_to_module() {
        let mut ctx = Context::new();
        assert!(generate(&mut ctx, "def f(x) f(x) + y").is_err());
        assert!(ctx.module().functions().is_empty());
        // The prototype stays registered for later forward references.
        assert!(ctx.registry.contains_key("f"));
    }

    #[test]
    fn test_failed_definition_declares_no_callees() {
        let mut ctx = Context::new();
        assert!(generate(&mut ctx, "def g(x) missing").is_err());
        assert!(generate(&mut ctx, "def f(x) g(x) + y").is_err());
        assert!(ctx.module().functions().is_empty());

        generate(&mut ctx, "def f(x) g(x)").unwrap();
        let names: Vec<_> = ctx
            .module()
            .functions()
            .iter()
            .map(|function| function.name.as_str())
            .collect();
        assert_eq!(names, vec!["g", "f"]);
        assert!(ctx.module().get_function("g").unwrap().is_declaration());
    }

    #[test]
    fn test_forward_reference_through_registry() {
        let mut ctx = Context::new();
        generate(&mut ctx, "extern odd(n)").unwrap();
        generate(&mut ctx, "def even(n) if n < 1 then 1 else odd(n - 1)").unwrap();
        generate(&mut ctx, "def odd(n) if n < 1 then 0 else even(n - 1)").unwrap();
        assert!(!ctx.module().get_function("odd").unwrap().is_declaration());
        assert!(!ctx.module().get_function("even").unwrap().is_declaration());
    }

    #[test]
    fn test_hand_built_prototype_with_invalid_precedence() {
        let mut ctx = Context::new();
        let function = ast::Function {
            proto: Prototype::binary('|', 0, "a".to_string(), "b".to_string()),
            body: Expr::NumberLit(0.0),
        };
        assert_eq!(
            ctx.define(&function).unwrap_err(),
            CodegenError::Precedence(ParseError::PrecedenceRange(0.0))
        );
        assert!(ctx.module().functions().is_empty());
    }
}
