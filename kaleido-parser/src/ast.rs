//! Abstract syntax tree.
//!
//! Every node is owned exclusively by its parent. The `Display` impls render
//! trees as s-expressions, e.g. `(+ 1 (* 2 3))`.

use std::fmt;

/// Prefix of the function backing a user-defined unary operator.
pub const UNARY_PREFIX: &str = "unary";
/// Prefix of the function backing a user-defined binary operator.
pub const BINARY_PREFIX: &str = "binary";
/// Name given to the prototype wrapping a top-level expression.
pub const ANON_EXPR_NAME: &str = "__anon_expr";
/// Precedence of a user binary operator that does not declare one.
pub const DEFAULT_BINARY_PRECEDENCE: u32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    NumberLit(f64),
    /// A variable reference (e.g. `foo`).
    Variable(String),
    /// A prefix operator application (e.g. `!x`).
    Unary { op: char, operand: Box<Expr> },
    /// A binary expression (e.g. `1+1`).
    Binary {
        op: char,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call { callee: String, args: Vec<Expr> },
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        else_: Box<Expr>,
    },
    /// `for var = start, end [, step] in body`
    For {
        var: String,
        start: Box<Expr>,
        end: Box<Expr>,
        step: Option<Box<Expr>>,
        body: Box<Expr>,
    },
    /// `var a [= init], b [= init] in body`
    Var {
        bindings: Vec<(String, Option<Expr>)>,
        body: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    None,
    Unary,
    Binary,
}

/// A callable's signature: name, parameters and operator classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub name: String,
    pub params: Vec<String>,
    pub kind: OperatorKind,
    /// Only meaningful when `kind` is [`OperatorKind::Binary`].
    pub precedence: u32,
}

impl Prototype {
    /// A plain (non-operator) function prototype.
    pub fn function(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
            kind: OperatorKind::None,
            precedence: 0,
        }
    }

    pub fn unary(symbol: char, param: String) -> Self {
        Self {
            name: format!("{}{}", UNARY_PREFIX, symbol),
            params: vec![param],
            kind: OperatorKind::Unary,
            precedence: 0,
        }
    }

    pub fn binary(symbol: char, precedence: u32, lhs: String, rhs: String) -> Self {
        Self {
            name: format!("{}{}", BINARY_PREFIX, symbol),
            params: vec![lhs, rhs],
            kind: OperatorKind::Binary,
            precedence,
        }
    }

    pub fn is_binary_op(&self) -> bool {
        self.kind == OperatorKind::Binary
    }

    /// The operator symbol, i.e. the last character of the name.
    /// Returns `None` for plain functions.
    pub fn operator_name(&self) -> Option<char> {
        match self.kind {
            OperatorKind::None => None,
            OperatorKind::Unary | OperatorKind::Binary => self.name.chars().last(),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub proto: Prototype,
    pub body: Expr,
}

/// One top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    Definition(Function),
    Extern(Prototype),
    /// An anonymous expression wrapped in a nullary `__anon_expr` function.
    Expression(Function),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::NumberLit(val) => write!(f, "{}", val),
            Expr::Variable(ident) => write!(f, "{}", ident),
            Expr::Unary { op, operand } => write!(f, "({} {})", op, operand),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", op, lhs, rhs),
            Expr::Call { callee, args } => {
                write!(f, "(call {}", callee)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
            Expr::If { cond, then, else_ } => write!(f, "(if {} {} {})", cond, then, else_),
            Expr::For {
                var,
                start,
                end,
                step,
                body,
            } => {
                write!(f, "(for {} {} {}", var, start, end)?;
                if let Some(step) = step {
                    write!(f, " {}", step)?;
                }
                write!(f, " {})", body)
            }
            Expr::Var { bindings, body } => {
                write!(f, "(var (")?;
                for (i, (name, init)) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    match init {
                        Some(init) => write!(f, "({} {})", name, init)?,
                        None => write!(f, "{}", name)?,
                    }
                }
                write!(f, ") {})", body)
            }
        }
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(" "))?;
        if self.is_binary_op() {
            write!(f, " prec {}", self.precedence)?;
        }
        Ok(())
    }
}

impl fmt::Display for TopLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopLevel::Definition(func) => write!(f, "(def {} {})", func.proto, func.body),
            TopLevel::Extern(proto) => write!(f, "(extern {})", proto),
            TopLevel::Expression(func) => write!(f, "{}", func.body),
        }
    }
}
