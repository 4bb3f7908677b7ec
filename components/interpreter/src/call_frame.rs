//! Activation records and the call stack

use std::rc::Rc;
use std::sync::Arc;

use bytecode_system::FunctionBytecode;
use core_types::{new_cell, InterpretedCall, ObjectRef, Value, VarCell};

/// How a frame's return value is delivered
#[derive(Debug, Clone)]
pub enum FrameKind {
    /// Plain call: the return value is the result
    Call,
    /// Construction: a non-object return value is replaced by the object
    Construct(ObjectRef),
}

/// Call frame representing one function invocation
#[derive(Debug)]
pub struct Frame {
    /// Function being executed
    pub function: Arc<FunctionBytecode>,
    /// `this` binding
    pub this: Value,
    /// Local slots, parameters first
    pub locals: Vec<VarCell>,
    /// Cells captured by the closure
    pub captures: Rc<[VarCell]>,
    /// Next instruction to execute
    pub pc: usize,
    /// Start of the instruction currently executing
    pub instr_pc: usize,
    /// Operand stack depth at entry
    pub stack_base: usize,
    /// Return protocol
    pub kind: FrameKind,
}

impl Frame {
    /// Create a frame for `call`; missing parameters read as undefined and
    /// surplus arguments are dropped
    pub fn new(call: InterpretedCall, stack_base: usize, kind: FrameKind) -> Self {
        let InterpretedCall {
            function,
            captures,
            this,
            args,
        } = call;
        let slots = function.local_count.max(function.param_count) as usize;
        let params = function.param_count as usize;
        let mut args = args.into_iter();
        let locals = (0..slots)
            .map(|i| {
                let value = if i < params {
                    args.next().unwrap_or(Value::Undefined)
                } else {
                    Value::Undefined
                };
                new_cell(value)
            })
            .collect();
        Self {
            function,
            this,
            locals,
            captures,
            pc: 0,
            instr_pc: 0,
            stack_base,
            kind,
        }
    }

    /// Function name for diagnostics
    pub fn name(&self) -> &str {
        if self.function.name.is_empty() {
            "<anonymous>"
        } else {
            &self.function.name
        }
    }
}

/// Stack of active frames; the caller of each frame is the one below it
#[derive(Debug, Default)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    /// Create an empty call stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if no frame is active
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Enter a frame
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Leave the innermost frame
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Innermost frame
    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Innermost frame, mutably
    pub fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Discard frames above `len`, returning the outermost one discarded
    pub fn truncate(&mut self, len: usize) -> Option<Frame> {
        if len >= self.frames.len() {
            return None;
        }
        self.frames.drain(len..).next()
    }

    /// Function names, innermost first
    pub fn backtrace(&self) -> Vec<String> {
        self.frames.iter().rev().map(|f| f.name().to_string()).collect()
    }
}
