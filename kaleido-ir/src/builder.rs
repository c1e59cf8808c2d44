//! Incremental construction of a [`Function`] body.

use crate::function::{
    ArithOp, Block, Body, CmpPredicate, Function, FunctionBody, Instruction, Slot, Terminator,
};
use crate::{BlockId, SlotId, ValueId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    #[error("block `{0}` of function `{1}` has no terminator")]
    MissingTerminator(String, String),

    #[error("block `{0}` of function `{1}` is terminated more than once")]
    MultipleTerminators(String, String),
}

/// Appends instructions at the end of a current insertion block.
///
/// A builder owns the function under construction; dropping it discards the
/// partial function, and [`FunctionBuilder::finish`] produces the completed one.
pub struct FunctionBuilder {
    name: String,
    params: Vec<String>,
    slots: Vec<Slot>,
    blocks: Vec<Block>,
    value_count: u32,
    current: BlockId,
    /// Blocks that received a second terminator.
    overterminated: Vec<BlockId>,
}

impl FunctionBuilder {
    /// Opens a function body positioned at the end of an empty `entry` block.
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        let value_count = params.len() as u32;
        Self {
            name: name.into(),
            params,
            slots: Vec::new(),
            blocks: vec![Block {
                label: "entry".to_string(),
                instructions: Vec::new(),
                terminator: None,
            }],
            value_count,
            current: BlockId::ENTRY,
            overterminated: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// The value of the incoming argument at `index`.
    pub fn param(&self, index: usize) -> ValueId {
        debug_assert!(index < self.params.len());
        ValueId(index as u32)
    }

    /// Creates a new empty block. Labels are made unique within the function.
    pub fn append_block(&mut self, label: &str) -> BlockId {
        let taken = |candidate: &str| self.blocks.iter().any(|block| block.label == candidate);
        let mut unique = label.to_string();
        let mut suffix = 1;
        while taken(&unique) {
            unique = format!("{}{}", label, suffix);
            suffix += 1;
        }

        self.blocks.push(Block {
            label: unique,
            instructions: Vec::new(),
            terminator: None,
        });
        BlockId(self.blocks.len() as u32 - 1)
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        debug_assert!(block.index() < self.blocks.len());
        self.current = block;
    }

    /// The block instructions are currently appended to.
    pub fn current_block(&self) -> BlockId {
        self.current
    }

    /// Allocates a new memory slot for the variable `name`.
    pub fn alloca(&mut self, name: &str) -> SlotId {
        self.slots.push(Slot {
            name: name.to_string(),
        });
        SlotId(self.slots.len() as u32 - 1)
    }

    fn fresh_value(&mut self) -> ValueId {
        let value = ValueId(self.value_count);
        self.value_count += 1;
        value
    }

    fn push(&mut self, instruction: Instruction) {
        self.blocks[self.current.index()].instructions.push(instruction);
    }

    pub fn const_f64(&mut self, value: f64) -> ValueId {
        let dest = self.fresh_value();
        self.push(Instruction::Const { dest, value });
        dest
    }

    pub fn arith(&mut self, op: ArithOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        let dest = self.fresh_value();
        self.push(Instruction::Arith { dest, op, lhs, rhs });
        dest
    }

    pub fn cmp(&mut self, pred: CmpPredicate, lhs: ValueId, rhs: ValueId) -> ValueId {
        let dest = self.fresh_value();
        self.push(Instruction::Cmp {
            dest,
            pred,
            lhs,
            rhs,
        });
        dest
    }

    pub fn ui_to_fp(&mut self, value: ValueId) -> ValueId {
        let dest = self.fresh_value();
        self.push(Instruction::UiToFp { dest, value });
        dest
    }

    pub fn load(&mut self, slot: SlotId) -> ValueId {
        let dest = self.fresh_value();
        self.push(Instruction::Load { dest, slot });
        dest
    }

    pub fn store(&mut self, slot: SlotId, value: ValueId) {
        self.push(Instruction::Store { slot, value });
    }

    pub fn call(&mut self, callee: &str, args: Vec<ValueId>) -> ValueId {
        let dest = self.fresh_value();
        self.push(Instruction::Call {
            dest,
            callee: callee.to_string(),
            args,
        });
        dest
    }

    pub fn phi(&mut self, incoming: Vec<(ValueId, BlockId)>) -> ValueId {
        let dest = self.fresh_value();
        self.push(Instruction::Phi { dest, incoming });
        dest
    }

    fn terminate(&mut self, terminator: Terminator) {
        let block = &mut self.blocks[self.current.index()];
        if block.terminator.is_some() {
            self.overterminated.push(self.current);
        }
        block.terminator = Some(terminator);
    }

    pub fn br(&mut self, target: BlockId) {
        self.terminate(Terminator::Br(target));
    }

    pub fn cond_br(&mut self, cond: ValueId, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn ret(&mut self, value: ValueId) {
        self.terminate(Terminator::Ret(value));
    }

    /// Verifies and finalizes the function.
    pub fn finish(self) -> Result<Function, VerifyError> {
        if let Some(block) = self.overterminated.first() {
            return Err(VerifyError::MultipleTerminators(
                self.blocks[block.index()].label.clone(),
                self.name,
            ));
        }
        if let Some(block) = self.blocks.iter().find(|block| block.terminator.is_none()) {
            return Err(VerifyError::MissingTerminator(
                block.label.clone(),
                self.name.clone(),
            ));
        }

        Ok(Function {
            name: self.name,
            params: self.params,
            body: FunctionBody::Defined(Body {
                slots: self.slots,
                blocks: self.blocks,
                value_count: self.value_count,
            }),
        })
    }
}
