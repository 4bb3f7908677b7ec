//! Assembler for [`FunctionBytecode`]
//!
//! Used by the compiler and by tests to emit instructions without
//! hand-encoding operand bytes. Forward branches go through [`Label`]s and
//! are patched when [`FunctionBuilder::build`] runs.

use std::collections::HashMap;

use crate::chunk::{CaptureDescriptor, FunctionBytecode, HandlerRange};
use crate::error::BuildError;
use crate::opcode::{Opcode, OperandKind};
use crate::value::Constant;

/// A position in the code, possibly not yet known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(usize);

#[derive(Debug)]
struct PendingHandler {
    start: Label,
    end: Label,
    handler: Label,
    stack_depth: u16,
}

/// Incrementally builds one function
#[derive(Debug)]
pub struct FunctionBuilder {
    function: FunctionBytecode,
    labels: Vec<Option<usize>>,
    // (position of the i32 operand, target)
    patches: Vec<(usize, Label)>,
    handlers: Vec<PendingHandler>,
    atom_index: HashMap<String, u32>,
    error: Option<BuildError>,
}

impl FunctionBuilder {
    /// Start a new function
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            function: FunctionBytecode::new(name),
            labels: Vec::new(),
            patches: Vec::new(),
            handlers: Vec::new(),
            atom_index: HashMap::new(),
            error: None,
        }
    }

    /// Set the parameter count; grows the local count to match
    pub fn params(&mut self, count: u16) -> &mut Self {
        self.function.param_count = count;
        self.function.local_count = self.function.local_count.max(count);
        self
    }

    /// Set the local count (parameters included)
    pub fn locals(&mut self, count: u16) -> &mut Self {
        self.function.local_count = count.max(self.function.param_count);
        self
    }

    /// Current code position
    pub fn pc(&self) -> usize {
        self.function.code.len()
    }

    fn fail(&mut self, error: BuildError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn check_kind(&mut self, op: Opcode, expected: &[OperandKind], given: &'static str) -> bool {
        if expected.contains(&op.operand_kind()) {
            true
        } else {
            self.fail(BuildError::OperandMismatch {
                opcode: op.mnemonic(),
                given,
            });
            false
        }
    }

    /// Emit an instruction without operand
    pub fn emit(&mut self, op: Opcode) -> &mut Self {
        if self.check_kind(op, &[OperandKind::None], "missing") {
            self.function.code.push(op as u8);
        }
        self
    }

    /// Emit an instruction with an 8-bit immediate
    pub fn emit_i8(&mut self, op: Opcode, value: i8) -> &mut Self {
        if self.check_kind(op, &[OperandKind::I8], "i8") {
            self.function.code.push(op as u8);
            self.function.code.push(value as u8);
        }
        self
    }

    /// Emit an instruction with a 32-bit immediate
    pub fn emit_i32(&mut self, op: Opcode, value: i32) -> &mut Self {
        if self.check_kind(op, &[OperandKind::I32], "i32") {
            self.function.code.push(op as u8);
            self.function.code.extend_from_slice(&value.to_le_bytes());
        }
        self
    }

    /// Emit an instruction with an index or count operand
    ///
    /// The encoded width follows the opcode: u32 for constant and atom
    /// indices, u16 for locals, captures and counts.
    pub fn emit_index(&mut self, op: Opcode, index: u32) -> &mut Self {
        match op.operand_kind() {
            OperandKind::Const | OperandKind::Atom => {
                self.function.code.push(op as u8);
                self.function.code.extend_from_slice(&index.to_le_bytes());
            }
            OperandKind::Local | OperandKind::VarRef | OperandKind::Argc | OperandKind::Count => {
                match u16::try_from(index) {
                    Ok(narrow) => {
                        self.function.code.push(op as u8);
                        self.function.code.extend_from_slice(&narrow.to_le_bytes());
                    }
                    Err(_) => self.fail(BuildError::TableOverflow(op.mnemonic())),
                }
            }
            _ => self.fail(BuildError::OperandMismatch {
                opcode: op.mnemonic(),
                given: "index",
            }),
        }
        self
    }

    /// Emit an instruction that names an atom, interning it
    pub fn emit_atom(&mut self, op: Opcode, name: &str) -> &mut Self {
        if self.check_kind(op, &[OperandKind::Atom], "atom") {
            let index = self.atom(name);
            self.emit_index(op, index);
        }
        self
    }

    /// Emit a branch to `target`
    pub fn emit_jump(&mut self, op: Opcode, target: Label) -> &mut Self {
        if self.check_kind(op, &[OperandKind::Label], "label") {
            self.function.code.push(op as u8);
            self.patches.push((self.pc(), target));
            self.function.code.extend_from_slice(&0i32.to_le_bytes());
        }
        self
    }

    /// Allocate an unbound label
    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Bind `label` to the current position
    pub fn bind(&mut self, label: Label) -> &mut Self {
        let pc = self.pc();
        if let Some(slot) = self.labels.get_mut(label.0) {
            *slot = Some(pc);
        }
        self
    }

    /// Allocate a label bound to the current position
    pub fn here(&mut self) -> Label {
        let label = self.new_label();
        self.bind(label);
        label
    }

    /// Intern an atom, returning its index
    pub fn atom(&mut self, name: &str) -> u32 {
        if let Some(&index) = self.atom_index.get(name) {
            return index;
        }
        let index = self.function.atoms.len() as u32;
        self.function.atoms.push(name.to_string());
        self.atom_index.insert(name.to_string(), index);
        index
    }

    /// Add a constant, returning its index
    pub fn add_constant(&mut self, constant: Constant) -> u32 {
        self.function.constants.push(constant);
        (self.function.constants.len() - 1) as u32
    }

    /// Push a number using the smallest encoding that preserves it
    pub fn push_number(&mut self, n: f64) -> &mut Self {
        let is_int = n.fract() == 0.0 && !(n == 0.0 && n.is_sign_negative());
        if is_int && n >= i8::MIN as f64 && n <= i8::MAX as f64 {
            self.emit_i8(Opcode::PushI8, n as i8)
        } else if is_int && n >= i32::MIN as f64 && n <= i32::MAX as f64 {
            self.emit_i32(Opcode::PushI32, n as i32)
        } else {
            let index = self.add_constant(Constant::Number(n));
            self.emit_index(Opcode::PushConst, index)
        }
    }

    /// Push a string literal
    pub fn push_string(&mut self, s: &str) -> &mut Self {
        self.emit_atom(Opcode::PushAtom, s)
    }

    /// Emit `fclosure` for a nested function
    pub fn closure(&mut self, function: FunctionBytecode) -> &mut Self {
        let index = self.add_constant(Constant::from(function));
        self.emit_index(Opcode::FClosure, index)
    }

    /// Protect `[start, end)` with a handler at `handler`
    ///
    /// `stack_depth` is the operand depth above the frame base that the
    /// handler expects, before the exception value is pushed.
    pub fn add_handler(
        &mut self,
        start: Label,
        end: Label,
        handler: Label,
        stack_depth: u16,
    ) -> &mut Self {
        self.handlers.push(PendingHandler {
            start,
            end,
            handler,
            stack_depth,
        });
        self
    }

    /// Declare a captured variable, returning its capture index
    pub fn capture(&mut self, is_local: bool, index: u16) -> u16 {
        let descriptor = CaptureDescriptor::new(is_local, index);
        if let Some(existing) = self.function.captures.iter().position(|c| *c == descriptor) {
            return existing as u16;
        }
        self.function.captures.push(descriptor);
        (self.function.captures.len() - 1) as u16
    }

    fn resolve(&self, label: Label) -> Result<usize, BuildError> {
        self.labels
            .get(label.0)
            .copied()
            .flatten()
            .ok_or(BuildError::UnboundLabel(label.0))
    }

    /// Patch branches and produce the function
    pub fn build(mut self) -> Result<FunctionBytecode, BuildError> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        if self.function.captures.len() > u16::MAX as usize {
            return Err(BuildError::TableOverflow("captures"));
        }

        for &(at, target) in &self.patches {
            let target = self.resolve(target)? as i64;
            let offset = target - (at as i64 + 4);
            let offset = i32::try_from(offset).map_err(|_| BuildError::OffsetOutOfRange)?;
            self.function.code[at..at + 4].copy_from_slice(&offset.to_le_bytes());
        }

        let mut handlers = Vec::with_capacity(self.handlers.len());
        for pending in &self.handlers {
            let position = |label: Label| {
                self.resolve(label)
                    .and_then(|pc| u32::try_from(pc).map_err(|_| BuildError::OffsetOutOfRange))
            };
            handlers.push(HandlerRange {
                try_start: position(pending.start)?,
                try_end: position(pending.end)?,
                handler_pc: position(pending.handler)?,
                stack_depth: pending.stack_depth,
            });
        }
        self.function.handlers = handlers;

        Ok(self.function)
    }
}
