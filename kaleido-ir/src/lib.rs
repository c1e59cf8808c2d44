//! SSA intermediate representation.
//!
//! Every value is defined exactly once. Mutable source variables live in
//! memory slots which are read with `load` and written with `store`.
//! All numbers are `f64`; comparisons produce a boolean which must be widened
//! with `uitofp` before it can flow back into arithmetic.

pub mod builder;
pub mod disassemble;
pub mod function;
pub mod module;

pub use builder::{FunctionBuilder, VerifyError};
pub use function::{
    ArithOp, Block, Body, CmpPredicate, Function, FunctionBody, Instruction, Slot, Terminator,
};
pub use module::Module;

/// An SSA value. Ids `0..params.len()` are the incoming arguments of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

/// A basic block within a single function. Block `0` is the entry block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

/// A memory slot backing a mutable variable within a single function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl BlockId {
    pub const ENTRY: BlockId = BlockId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SlotId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
