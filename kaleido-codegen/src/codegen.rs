//! Lowers one function body into a [`kaleido_ir::Function`].

use crate::scope::ScopeStack;
use crate::{CodegenError, Registry};
use kaleido_ir::{ArithOp, CmpPredicate, FunctionBuilder, Module, ValueId};
use kaleido_parser::ast::{Expr, Prototype, BINARY_PREFIX, UNARY_PREFIX};
use tracing::debug;

type CodegenResult<T> = Result<T, CodegenError>;

/// A generated function and the prototypes of the callees it needs declared
/// in the module before it can be stored.
#[derive(Debug)]
pub struct Generated {
    pub function: kaleido_ir::Function,
    pub declarations: Vec<Prototype>,
}

/// Generates the body of a single function.
///
/// Callees are resolved against the function being generated first, then the
/// module, then the registry. A callee found only in the registry is collected
/// into [`Generated::declarations`]; the module itself is never modified.
pub struct FunctionCodegen<'c> {
    proto: &'c Prototype,
    registry: &'c Registry,
    module: &'c Module,
    builder: FunctionBuilder,
    scopes: ScopeStack,
    declarations: Vec<Prototype>,
}

impl<'c> FunctionCodegen<'c> {
    pub fn new(proto: &'c Prototype, registry: &'c Registry, module: &'c Module) -> Self {
        Self {
            proto,
            registry,
            module,
            builder: FunctionBuilder::new(proto.name.clone(), proto.params.clone()),
            scopes: ScopeStack::new(),
            declarations: Vec::new(),
        }
    }

    /// Consumes `self` and returns the verified function.
    /// Parameters are copied into slots so the body may assign to them.
    pub fn generate(mut self, body: &Expr) -> CodegenResult<Generated> {
        let proto = self.proto;
        let ret = self.with_scope(|cg| {
            for (index, param) in proto.params.iter().enumerate() {
                let slot = cg.builder.alloca(param);
                let arg = cg.builder.param(index);
                cg.builder.store(slot, arg);
                cg.scopes.bind(param, slot);
            }
            cg.expr(body)
        })?;
        self.builder.ret(ret);
        debug_assert!(self.scopes.is_empty());

        let function = self.builder.finish()?;
        debug!(name = %function.name, "generated function");
        Ok(Generated {
            function,
            declarations: self.declarations,
        })
    }

    /// Runs `f` inside a new scope. The scope is exited on every path out of `f`.
    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> CodegenResult<T>) -> CodegenResult<T> {
        self.scopes.enter();
        let result = f(self);
        self.scopes.exit();
        result
    }

    /// Returns the arity of `callee`, recording a declaration if only its
    /// prototype is known.
    fn resolve_callee(&mut self, callee: &str) -> Option<usize> {
        if callee == self.proto.name {
            return Some(self.proto.arity());
        }
        if let Some(function) = self.module.get_function(callee) {
            return Some(function.arity());
        }
        let proto = self.registry.get(callee)?;
        if !self.declarations.iter().any(|declared| declared.name == proto.name) {
            debug!(callee, "declaring callee from registry");
            self.declarations.push(proto.clone());
        }
        Some(proto.arity())
    }

    fn call(&mut self, callee: &str, args: Vec<ValueId>) -> CodegenResult<ValueId> {
        match self.resolve_callee(callee) {
            Some(arity) if arity == args.len() => Ok(self.builder.call(callee, args)),
            Some(arity) => Err(CodegenError::Arity {
                callee: callee.to_string(),
                expected: arity,
                found: args.len(),
            }),
            None => Err(CodegenError::Name {
                kind: "function",
                name: callee.to_string(),
            }),
        }
    }

    fn variable_slot(&self, name: &str) -> CodegenResult<kaleido_ir::SlotId> {
        self.scopes.lookup(name).ok_or_else(|| CodegenError::Name {
            kind: "variable",
            name: name.to_string(),
        })
    }

    /// Compares `value` against `0.0`, producing a branch condition.
    fn truthy(&mut self, value: ValueId) -> ValueId {
        let zero = self.builder.const_f64(0.0);
        self.builder.cmp(CmpPredicate::One, value, zero)
    }

    fn expr(&mut self, expr: &Expr) -> CodegenResult<ValueId> {
        match expr {
            Expr::NumberLit(val) => Ok(self.builder.const_f64(*val)),
            Expr::Variable(name) => {
                let slot = self.variable_slot(name)?;
                Ok(self.builder.load(slot))
            }
            Expr::Unary { op, operand } => {
                let operand = self.expr(operand)?;
                let callee = format!("{}{}", UNARY_PREFIX, op);
                match self.resolve_callee(&callee) {
                    Some(1) => Ok(self.builder.call(&callee, vec![operand])),
                    Some(arity) => Err(CodegenError::Arity {
                        callee,
                        expected: arity,
                        found: 1,
                    }),
                    None => Err(CodegenError::Name {
                        kind: "unary operator",
                        name: op.to_string(),
                    }),
                }
            }
            Expr::Binary { op: '=', lhs, rhs } => {
                let name = match lhs.as_ref() {
                    Expr::Variable(name) => name,
                    _ => return Err(CodegenError::AssignmentTarget),
                };
                let value = self.expr(rhs)?;
                let slot = self.variable_slot(name)?;
                self.builder.store(slot, value);
                Ok(value)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.expr(lhs)?;
                let rhs = self.expr(rhs)?;
                match op {
                    '+' => Ok(self.builder.arith(ArithOp::Add, lhs, rhs)),
                    '-' => Ok(self.builder.arith(ArithOp::Sub, lhs, rhs)),
                    '*' => Ok(self.builder.arith(ArithOp::Mul, lhs, rhs)),
                    '<' => {
                        let less = self.builder.cmp(CmpPredicate::Ult, lhs, rhs);
                        Ok(self.builder.ui_to_fp(less))
                    }
                    _ => {
                        let callee = format!("{}{}", BINARY_PREFIX, op);
                        match self.resolve_callee(&callee) {
                            Some(2) => Ok(self.builder.call(&callee, vec![lhs, rhs])),
                            _ => Err(CodegenError::InternalInvariant(*op)),
                        }
                    }
                }
            }
            Expr::Call { callee, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.expr(arg)?);
                }
                self.call(callee, values)
            }
            Expr::If { cond, then, else_ } => self.if_expr(cond, then, else_),
            Expr::For {
                var,
                start,
                end,
                step,
                body,
            } => self.for_expr(var, start, end, step.as_deref(), body),
            Expr::Var { bindings, body } => self.with_scope(|cg| {
                for (name, init) in bindings {
                    let value = match init {
                        Some(init) => cg.expr(init)?,
                        None => cg.builder.const_f64(0.0),
                    };
                    let slot = cg.builder.alloca(name);
                    cg.builder.store(slot, value);
                    cg.scopes.bind(name, slot);
                }
                cg.expr(body)
            }),
        }
    }

    fn if_expr(&mut self, cond: &Expr, then: &Expr, else_: &Expr) -> CodegenResult<ValueId> {
        let cond = self.expr(cond)?;
        let cond = self.truthy(cond);

        let then_block = self.builder.append_block("then");
        let else_block = self.builder.append_block("else");
        let merge_block = self.builder.append_block("ifcont");
        self.builder.cond_br(cond, then_block, else_block);

        self.builder.position_at_end(then_block);
        let then_value = self.expr(then)?;
        // Nested control flow may have moved the insertion point.
        let then_end = self.builder.current_block();
        self.builder.br(merge_block);

        self.builder.position_at_end(else_block);
        let else_value = self.expr(else_)?;
        let else_end = self.builder.current_block();
        self.builder.br(merge_block);

        self.builder.position_at_end(merge_block);
        Ok(self
            .builder
            .phi(vec![(then_value, then_end), (else_value, else_end)]))
    }

    fn for_expr(
        &mut self,
        var: &str,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &Expr,
    ) -> CodegenResult<ValueId> {
        // The start value does not see the induction variable.
        let start = self.expr(start)?;
        let slot = self.builder.alloca(var);
        self.builder.store(slot, start);

        let loop_block = self.builder.append_block("loop");
        let after_block = self.builder.append_block("afterloop");
        self.builder.br(loop_block);
        self.builder.position_at_end(loop_block);

        self.with_scope(|cg| {
            cg.scopes.bind(var, slot);
            cg.expr(body)?;

            let step = match step {
                Some(step) => cg.expr(step)?,
                None => cg.builder.const_f64(1.0),
            };
            let current = cg.builder.load(slot);
            let next = cg.builder.arith(ArithOp::Add, current, step);
            cg.builder.store(slot, next);

            let end = cg.expr(end)?;
            let end = cg.truthy(end);
            cg.builder.cond_br(end, loop_block, after_block);
            Ok(())
        })?;

        self.builder.position_at_end(after_block);
        Ok(self.builder.const_f64(0.0))
    }
}
