//! Binary operator precedence table.

use crate::ParseError;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tracing::trace;

/// Precedences a user-defined binary operator may declare.
pub const PRECEDENCE_RANGE: RangeInclusive<u32> = 1..=100;

/// Binary operators the code generator lowers directly. These can not be redefined.
const BUILTIN_OPERATORS: [char; 5] = ['=', '<', '+', '-', '*'];

pub fn is_builtin_operator(symbol: char) -> bool {
    BUILTIN_OPERATORS.contains(&symbol)
}

/// Mutable mapping from single-character operator symbol to binding priority.
/// A higher value binds tighter.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedenceTable {
    table: HashMap<char, u32>,
}

impl PrecedenceTable {
    /// Create a table containing only the built-in operators.
    pub fn new() -> Self {
        let mut table = HashMap::new();
        table.insert('=', 2);
        table.insert('<', 10);
        table.insert('+', 20);
        table.insert('-', 20);
        table.insert('*', 40);
        Self { table }
    }

    /// Returns the precedence of `symbol` or `None` if it is not a registered binary operator.
    pub fn lookup(&self, symbol: char) -> Option<u32> {
        self.table.get(&symbol).copied()
    }

    /// Registers `symbol` with `precedence`, returning the entry it replaced, if any.
    /// `precedence` must lie in [`PRECEDENCE_RANGE`].
    pub fn define(&mut self, symbol: char, precedence: u32) -> Result<Option<u32>, ParseError> {
        if !PRECEDENCE_RANGE.contains(&precedence) {
            return Err(ParseError::PrecedenceRange(precedence as f64));
        }
        trace!(%symbol, precedence, "defining binary operator precedence");
        Ok(self.table.insert(symbol, precedence))
    }

    /// Undoes a [`define`](Self::define): restores `previous` or removes the entry.
    pub fn restore(&mut self, symbol: char, previous: Option<u32>) {
        trace!(%symbol, ?previous, "restoring binary operator precedence");
        match previous {
            Some(precedence) => {
                self.table.insert(symbol, precedence);
            }
            None => {
                self.table.remove(&symbol);
            }
        }
    }
}

impl Default for PrecedenceTable {
    fn default() -> Self {
        Self::new()
    }
}
