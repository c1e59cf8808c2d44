use crate::value::Value;
use crate::{NativeFn, RuntimeError, MAX_CALL_DEPTH};
use kaleido_ir::{
    ArithOp, Block, BlockId, Body, CmpPredicate, Function, Instruction, Module, SlotId,
    Terminator, ValueId,
};
use std::collections::HashMap;
use tracing::trace;

type RuntimeResult<T> = Result<T, RuntimeError>;

/// Register file, slot storage and resume position of one invocation.
struct CallFrame<'m> {
    function: &'m Function,
    body: &'m Body,
    registers: Vec<Option<Value>>,
    slots: Vec<Option<f64>>,
    /// Block being executed and the block control arrived from.
    block: BlockId,
    previous: Option<BlockId>,
    /// Index of the next instruction in `block`.
    ip: usize,
    /// Register receiving the result of the call this frame is waiting on.
    return_to: Option<ValueId>,
}

/// What the interpreter loop has to do after a single step of a frame.
enum Step<'m> {
    Next,
    Call {
        dest: ValueId,
        callee: &'m str,
        args: Vec<f64>,
    },
    Return(f64),
}

/// Result of entering a function.
enum Callee<'m> {
    Native(f64),
    Frame(CallFrame<'m>),
}

impl<'m> CallFrame<'m> {
    fn new(function: &'m Function, body: &'m Body, args: &[f64]) -> Self {
        let mut registers = vec![None; body.value_count as usize];
        for (register, arg) in registers.iter_mut().zip(args) {
            *register = Some(Value::Number(*arg));
        }
        Self {
            function,
            body,
            registers,
            slots: vec![None; body.slots.len()],
            block: BlockId::ENTRY,
            previous: None,
            ip: 0,
            return_to: None,
        }
    }

    fn malformed(&self, reason: impl ToString) -> RuntimeError {
        RuntimeError::Malformed {
            function: self.function.name.clone(),
            reason: reason.to_string(),
        }
    }

    fn get(&self, value: ValueId) -> RuntimeResult<Value> {
        self.registers
            .get(value.index())
            .copied()
            .flatten()
            .ok_or_else(|| self.malformed(format!("use of undefined value %{}", value.0)))
    }

    fn number(&self, value: ValueId) -> RuntimeResult<f64> {
        self.get(value)?
            .as_number()
            .ok_or_else(|| self.malformed(format!("%{} is not a number", value.0)))
    }

    fn boolean(&self, value: ValueId) -> RuntimeResult<bool> {
        self.get(value)?
            .as_bool()
            .ok_or_else(|| self.malformed(format!("%{} is not a boolean", value.0)))
    }

    fn set(&mut self, dest: ValueId, value: Value) -> RuntimeResult<()> {
        match self.registers.get_mut(dest.index()) {
            Some(register) => {
                *register = Some(value);
                Ok(())
            }
            None => Err(self.malformed(format!("value %{} out of range", dest.0))),
        }
    }

    fn load(&self, slot: SlotId) -> RuntimeResult<f64> {
        self.slots
            .get(slot.index())
            .copied()
            .flatten()
            .ok_or_else(|| self.malformed(format!("load from uninitialized slot ${}", slot.0)))
    }

    fn store(&mut self, slot: SlotId, value: f64) -> RuntimeResult<()> {
        match self.slots.get_mut(slot.index()) {
            Some(stored) => {
                *stored = Some(value);
                Ok(())
            }
            None => Err(self.malformed(format!("slot ${} out of range", slot.0))),
        }
    }

    /// Stores the result of the call this frame was waiting on.
    fn resume(&mut self, value: f64) -> RuntimeResult<()> {
        match self.return_to.take() {
            Some(dest) => self.set(dest, Value::Number(value)),
            None => Err(self.malformed("resumed without a pending call")),
        }
    }

    /// Executes the next instruction, or the terminator once the block is done.
    fn step(&mut self) -> RuntimeResult<Step<'m>> {
        let body = self.body;
        let block = body
            .block(self.block)
            .ok_or_else(|| self.malformed(format!("branch to missing block {}", self.block.0)))?;

        let instruction = match block.instructions.get(self.ip) {
            Some(instruction) => instruction,
            None => return self.terminate(block),
        };
        self.ip += 1;

        match instruction {
            Instruction::Const { dest, value } => {
                self.set(*dest, Value::Number(*value))?;
            }
            Instruction::Arith { dest, op, lhs, rhs } => {
                let a = self.number(*lhs)?;
                let b = self.number(*rhs)?;
                let result = match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                };
                self.set(*dest, Value::Number(result))?;
            }
            Instruction::Cmp {
                dest,
                pred,
                lhs,
                rhs,
            } => {
                let a = self.number(*lhs)?;
                let b = self.number(*rhs)?;
                let result = match pred {
                    // true when unordered
                    CmpPredicate::Ult => !(a >= b),
                    // false when unordered
                    CmpPredicate::One => a < b || a > b,
                };
                self.set(*dest, Value::Bool(result))?;
            }
            Instruction::UiToFp { dest, value } => {
                let flag = self.boolean(*value)?;
                self.set(*dest, Value::Number(if flag { 1.0 } else { 0.0 }))?;
            }
            Instruction::Load { dest, slot } => {
                let value = self.load(*slot)?;
                self.set(*dest, Value::Number(value))?;
            }
            Instruction::Store { slot, value } => {
                let value = self.number(*value)?;
                self.store(*slot, value)?;
            }
            Instruction::Call { dest, callee, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.number(*arg))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                return Ok(Step::Call {
                    dest: *dest,
                    callee: callee.as_str(),
                    args,
                });
            }
            Instruction::Phi { dest, incoming } => {
                let previous = self.previous;
                let value = incoming
                    .iter()
                    .find(|(_, block)| Some(*block) == previous)
                    .map(|(value, _)| *value)
                    .ok_or_else(|| {
                        self.malformed(format!(
                            "phi in block `{}` has no entry for its predecessor",
                            block.label
                        ))
                    })?;
                let value = self.get(value)?;
                self.set(*dest, value)?;
            }
        }
        Ok(Step::Next)
    }

    fn terminate(&mut self, block: &Block) -> RuntimeResult<Step<'m>> {
        let target = match block.terminator {
            Some(Terminator::Br(target)) => target,
            Some(Terminator::CondBr {
                cond,
                then_block,
                else_block,
            }) => {
                if self.boolean(cond)? {
                    then_block
                } else {
                    else_block
                }
            }
            Some(Terminator::Ret(value)) => return Ok(Step::Return(self.number(value)?)),
            None => {
                return Err(self.malformed(format!("block `{}` has no terminator", block.label)))
            }
        };
        self.previous = Some(self.block);
        self.block = target;
        self.ip = 0;
        Ok(Step::Next)
    }
}

/// Executes functions of a [`Module`]. Declarations without a body are
/// resolved against the registered native functions.
#[derive(Debug)]
pub struct Vm {
    natives: HashMap<String, NativeFn>,
    max_depth: usize,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_max_depth(MAX_CALL_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            natives: HashMap::new(),
            max_depth,
        }
    }

    pub fn add_native_fn(
        &mut self,
        ident: &str,
        func: &'static dyn Fn(&[f64]) -> f64,
        arity: usize,
    ) {
        self.natives.insert(
            ident.to_string(),
            NativeFn {
                ident: ident.to_string(),
                arity,
                func,
            },
        );
    }

    /// Calls the function `name` of `module` with `args`.
    ///
    /// Suspended callers wait on `call_stack` until the frame above them returns.
    pub fn call(&self, module: &Module, name: &str, args: &[f64]) -> RuntimeResult<f64> {
        let mut frame = match self.enter(module, name, args, 0)? {
            Callee::Native(value) => return Ok(value),
            Callee::Frame(frame) => frame,
        };
        let mut call_stack: Vec<CallFrame<'_>> = Vec::new();

        loop {
            match frame.step()? {
                Step::Next => {}
                Step::Call { dest, callee, args } => {
                    match self.enter(module, callee, &args, call_stack.len() + 1)? {
                        Callee::Native(value) => frame.set(dest, Value::Number(value))?,
                        Callee::Frame(next) => {
                            frame.return_to = Some(dest);
                            call_stack.push(std::mem::replace(&mut frame, next));
                        }
                    }
                }
                Step::Return(value) => match call_stack.pop() {
                    Some(mut caller) => {
                        caller.resume(value)?;
                        frame = caller;
                    }
                    None => return Ok(value),
                },
            }
        }
    }

    /// Resolves `name` and either runs the native implementation or returns a
    /// fresh frame for its body.
    fn enter<'m>(
        &self,
        module: &'m Module,
        name: &str,
        args: &[f64],
        depth: usize,
    ) -> RuntimeResult<Callee<'m>> {
        if depth >= self.max_depth {
            return Err(RuntimeError::CallDepth(self.max_depth));
        }
        trace!(name, ?args, depth, "call");

        let defined = module
            .get_function(name)
            .and_then(|function| function.body().map(|body| (function, body)));
        match defined {
            Some((function, body)) => {
                check_arity(name, function.arity(), args)?;
                Ok(Callee::Frame(CallFrame::new(function, body, args)))
            }
            None => match self.natives.get(name) {
                Some(native) => {
                    check_arity(name, native.arity, args)?;
                    Ok(Callee::Native((native.func)(args)))
                }
                None => Err(RuntimeError::UnresolvedExternal(name.to_string())),
            },
        }
    }
}

fn check_arity(name: &str, expected: usize, args: &[f64]) -> RuntimeResult<()> {
    if expected == args.len() {
        Ok(())
    } else {
        Err(RuntimeError::Arity {
            name: name.to_string(),
            expected,
            found: args.len(),
        })
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
