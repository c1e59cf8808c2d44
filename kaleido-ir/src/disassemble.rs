//! Textual rendering of [`Function`] and [`Module`].

use crate::function::{
    ArithOp, Body, CmpPredicate, Function, FunctionBody, Instruction, Terminator,
};
use crate::module::Module;
use crate::{BlockId, ValueId};
use std::fmt;

/// Resolves value and block names while printing a single function.
struct Names<'f> {
    params: &'f [String],
    body: &'f Body,
}

impl<'f> Names<'f> {
    fn value(&self, value: ValueId) -> String {
        match self.params.get(value.index()) {
            Some(param) => format!("%{}", param),
            None => format!("%{}", value.0),
        }
    }

    fn block(&self, block: BlockId) -> String {
        match self.body.block(block) {
            Some(block) => format!("%{}", block.label),
            None => format!("%<invalid block {}>", block.0),
        }
    }

    fn values(&self, values: &[ValueId]) -> String {
        values
            .iter()
            .map(|value| format!("double {}", self.value(*value)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn instruction(&self, f: &mut fmt::Formatter<'_>, instruction: &Instruction) -> fmt::Result {
        match instruction {
            Instruction::Const { dest, value } => {
                write!(f, "{} = const double {}", self.value(*dest), value)
            }
            Instruction::Arith { dest, op, lhs, rhs } => {
                let name = match op {
                    ArithOp::Add => "fadd",
                    ArithOp::Sub => "fsub",
                    ArithOp::Mul => "fmul",
                };
                write!(
                    f,
                    "{} = {} double {}, {}",
                    self.value(*dest),
                    name,
                    self.value(*lhs),
                    self.value(*rhs)
                )
            }
            Instruction::Cmp {
                dest,
                pred,
                lhs,
                rhs,
            } => {
                let pred = match pred {
                    CmpPredicate::Ult => "ult",
                    CmpPredicate::One => "one",
                };
                write!(
                    f,
                    "{} = fcmp {} double {}, {}",
                    self.value(*dest),
                    pred,
                    self.value(*lhs),
                    self.value(*rhs)
                )
            }
            Instruction::UiToFp { dest, value } => write!(
                f,
                "{} = uitofp i1 {} to double",
                self.value(*dest),
                self.value(*value)
            ),
            Instruction::Load { dest, slot } => {
                write!(f, "{} = load double, ${}", self.value(*dest), slot.0)
            }
            Instruction::Store { slot, value } => {
                write!(f, "store double {}, ${}", self.value(*value), slot.0)
            }
            Instruction::Call { dest, callee, args } => write!(
                f,
                "{} = call double @{}({})",
                self.value(*dest),
                callee,
                self.values(args)
            ),
            Instruction::Phi { dest, incoming } => {
                let incoming = incoming
                    .iter()
                    .map(|(value, block)| {
                        format!("[ {}, {} ]", self.value(*value), self.block(*block))
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{} = phi double {}", self.value(*dest), incoming)
            }
        }
    }

    fn terminator(&self, f: &mut fmt::Formatter<'_>, terminator: &Terminator) -> fmt::Result {
        match *terminator {
            Terminator::Br(target) => write!(f, "br label {}", self.block(target)),
            Terminator::CondBr {
                cond,
                then_block,
                else_block,
            } => write!(
                f,
                "br i1 {}, label {}, label {}",
                self.value(cond),
                self.block(then_block),
                self.block(else_block)
            ),
            Terminator::Ret(value) => write!(f, "ret double {}", self.value(value)),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|param| format!("double %{}", param))
            .collect::<Vec<_>>()
            .join(", ");

        let body = match &self.body {
            FunctionBody::Declared => {
                return writeln!(f, "declare double @{}({})", self.name, params);
            }
            FunctionBody::Defined(body) => body,
        };

        writeln!(f, "define double @{}({}) {{", self.name, params)?;
        let names = Names {
            params: &self.params,
            body,
        };

        for (index, block) in body.blocks.iter().enumerate() {
            writeln!(f, "{}:", block.label)?;
            if index == 0 {
                for (index, slot) in body.slots.iter().enumerate() {
                    writeln!(f, "  ${} = alloca double ; {}", index, slot.name)?;
                }
            }
            for instruction in &block.instructions {
                write!(f, "  ")?;
                names.instruction(f, instruction)?;
                writeln!(f)?;
            }
            match &block.terminator {
                Some(terminator) => {
                    write!(f, "  ")?;
                    names.terminator(f, terminator)?;
                    writeln!(f)?;
                }
                None => writeln!(f, "  <unterminated>")?,
            }
        }

        writeln!(f, "}}")
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, function) in self.functions().iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", function)?;
        }
        Ok(())
    }
}
