//! Closures and captured variables
//!
//! Every local slot is a shared cell. `fclosure` copies cell handles, not
//! values, so a write through any closure (or through the defining frame)
//! is seen by all of them, and the cells outlive the frame that made them.

use std::rc::Rc;
use std::sync::Arc;

use bytecode_system::FunctionBytecode;
use core_types::{
    CallContext, CallMode, Callable, InterpretedCall, Invocation, Value, VarCell, VmFault,
};

use crate::call_frame::Frame;

/// Interpreted function with its captured environment
#[derive(Debug, Clone)]
pub struct Closure {
    /// Function body
    pub function: Arc<FunctionBytecode>,
    /// Captured cells, in descriptor order
    pub captures: Rc<[VarCell]>,
}

impl Closure {
    /// Create a closure with the given captures
    pub fn new(function: Arc<FunctionBytecode>, captures: Vec<VarCell>) -> Self {
        Self {
            function,
            captures: Rc::from(captures),
        }
    }

    /// Create a closure with no captured variables
    pub fn without_captures(function: Arc<FunctionBytecode>) -> Self {
        Self::new(function, Vec::new())
    }

    /// Resolve `function`'s capture descriptors against the creating frame
    pub fn capture(function: Arc<FunctionBytecode>, frame: &Frame) -> Result<Self, VmFault> {
        let captures = function
            .captures
            .iter()
            .map(|desc| {
                let index = desc.index as usize;
                if desc.is_local {
                    frame
                        .locals
                        .get(index)
                        .cloned()
                        .ok_or(VmFault::InvalidLocal { index })
                } else {
                    frame
                        .captures
                        .get(index)
                        .cloned()
                        .ok_or(VmFault::InvalidCapture { index })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(function, captures))
    }
}

impl Callable for Closure {
    fn name(&self) -> &str {
        &self.function.name
    }

    fn is_constructor(&self) -> bool {
        true
    }

    fn invoke(
        &self,
        _cx: &mut dyn CallContext,
        this: Value,
        args: Vec<Value>,
        _mode: CallMode,
    ) -> Result<Invocation, VmFault> {
        Ok(Invocation::Interpret(InterpretedCall {
            function: Arc::clone(&self.function),
            captures: Rc::clone(&self.captures),
            this,
            args,
        }))
    }
}
