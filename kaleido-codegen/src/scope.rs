//! Lexical scopes of a single function body.

use kaleido_ir::SlotId;
use std::collections::HashMap;
use tracing::trace;

/// Maps every variable name in scope to its active memory slot.
///
/// Entering a scope records a mark in the undo list. Every binding made while
/// the scope is open pushes the slot it shadowed (or `None`). Exiting unwinds
/// the undo list back to the mark, most recent binding first, so duplicate
/// names within one scope are restored correctly.
#[derive(Debug, Default)]
pub struct ScopeStack {
    active: HashMap<String, SlotId>,
    undo: Vec<(String, Option<SlotId>)>,
    frames: Vec<usize>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self) {
        self.frames.push(self.undo.len());
    }

    /// Makes `name` refer to `slot` until the innermost scope exits.
    pub fn bind(&mut self, name: &str, slot: SlotId) {
        debug_assert!(!self.frames.is_empty(), "binding outside of any scope");
        let shadowed = self.active.insert(name.to_string(), slot);
        trace!(name, ?slot, ?shadowed, "binding variable");
        self.undo.push((name.to_string(), shadowed));
    }

    pub fn exit(&mut self) {
        let mark = match self.frames.pop() {
            Some(mark) => mark,
            None => return,
        };
        while self.undo.len() > mark {
            if let Some((name, shadowed)) = self.undo.pop() {
                trace!(%name, ?shadowed, "restoring variable");
                match shadowed {
                    Some(slot) => {
                        self.active.insert(name, slot);
                    }
                    None => {
                        self.active.remove(&name);
                    }
                }
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<SlotId> {
        self.active.get(name).copied()
    }

    /// `true` when no variable is bound.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.undo.is_empty()
    }
}
