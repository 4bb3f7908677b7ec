//! Operand stack shared by every frame of one interpreter

use core_types::{Value, VmFault};

/// LIFO operand stack.
///
/// One stack serves the whole call chain. The floor marks the base of the
/// active frame: pops below it fail like pops from an empty stack, so a
/// callee can never consume its caller's operands.
#[derive(Debug)]
pub struct ValueStack {
    values: Vec<Value>,
    limit: usize,
    floor: usize,
}

impl ValueStack {
    /// Create an empty stack holding at most `limit` values
    pub fn new(limit: usize) -> Self {
        Self {
            values: Vec::with_capacity(limit.min(256)),
            limit,
            floor: 0,
        }
    }

    /// Number of values on the stack
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the stack holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Configured maximum depth
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Current floor
    pub fn floor(&self) -> usize {
        self.floor
    }

    /// Move the floor
    pub fn set_floor(&mut self, floor: usize) {
        self.floor = floor;
    }

    /// Push a value
    pub fn push(&mut self, value: Value) -> Result<(), VmFault> {
        if self.values.len() >= self.limit {
            return Err(VmFault::StackOverflow { limit: self.limit });
        }
        self.values.push(value);
        Ok(())
    }

    /// Pop the top value
    pub fn pop(&mut self) -> Result<Value, VmFault> {
        if self.values.len() <= self.floor {
            return Err(VmFault::StackUnderflow);
        }
        self.values.pop().ok_or(VmFault::StackUnderflow)
    }

    /// Value `n` positions below the top (0 is the top), without removing it
    pub fn peek(&self, n: usize) -> Result<&Value, VmFault> {
        let available = self.values.len().saturating_sub(self.floor);
        if n >= available {
            return Err(VmFault::StackUnderflow);
        }
        Ok(&self.values[self.values.len() - 1 - n])
    }

    /// Pop `count` values, returned in push order
    pub fn pop_n(&mut self, count: usize) -> Result<Vec<Value>, VmFault> {
        if self.values.len().saturating_sub(self.floor) < count {
            return Err(VmFault::StackUnderflow);
        }
        let start = self.values.len() - count;
        Ok(self.values.split_off(start))
    }

    /// Drop everything above `len`
    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }
}
