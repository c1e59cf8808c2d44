//! Definitions for [`Function`], [`Block`] and [`Instruction`].

use crate::{BlockId, SlotId, ValueId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

/// Floating point comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpPredicate {
    /// Unordered or less than: true if either operand is NaN or `lhs < rhs`.
    Ult,
    /// Ordered and not equal: false if either operand is NaN.
    One,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `%dest = <value>`
    Const { dest: ValueId, value: f64 },
    Arith {
        dest: ValueId,
        op: ArithOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    /// Produces a boolean.
    Cmp {
        dest: ValueId,
        pred: CmpPredicate,
        lhs: ValueId,
        rhs: ValueId,
    },
    /// Widens a boolean into `0.0` or `1.0`.
    UiToFp { dest: ValueId, value: ValueId },
    Load { dest: ValueId, slot: SlotId },
    Store { slot: SlotId, value: ValueId },
    Call {
        dest: ValueId,
        callee: String,
        args: Vec<ValueId>,
    },
    /// Selects the value paired with the predecessor block control arrived from.
    Phi {
        dest: ValueId,
        incoming: Vec<(ValueId, BlockId)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Terminator {
    Br(BlockId),
    CondBr {
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret(ValueId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub label: String,
    pub instructions: Vec<Instruction>,
    /// `None` only while the block is under construction.
    pub terminator: Option<Terminator>,
}

/// A memory slot, named after the variable it backs.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub slots: Vec<Slot>,
    pub blocks: Vec<Block>,
    /// Number of SSA values, including the arguments.
    pub value_count: u32,
}

impl Body {
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    /// A signature only (`extern`, or a callee referenced before its definition).
    Declared,
    Defined(Body),
}

/// A callable taking and returning numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: FunctionBody,
}

impl Function {
    pub fn declaration(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
            body: FunctionBody::Declared,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_declaration(&self) -> bool {
        matches!(self.body, FunctionBody::Declared)
    }

    pub fn body(&self) -> Option<&Body> {
        match &self.body {
            FunctionBody::Declared => None,
            FunctionBody::Defined(body) => Some(body),
        }
    }
}
