//! Decoded instruction representation

use std::fmt;

use crate::opcode::{Opcode, OperandKind};

/// Decoded operand of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// No operand
    None,
    /// Signed immediate (`push_i8`, `push_i32`)
    Int(i32),
    /// Unsigned index or count (constants, atoms, locals, captures, argc)
    Index(u32),
    /// Branch offset relative to the next instruction
    Offset(i32),
}

/// A single decoded bytecode instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Position of the opcode byte
    pub pc: usize,
    /// The opcode for this instruction
    pub opcode: Opcode,
    /// The decoded operand
    pub operand: Operand,
}

impl Instruction {
    /// Position immediately following this instruction's encoding
    pub fn next_pc(&self) -> usize {
        self.pc + self.opcode.size()
    }

    /// Unsigned operand value, zero when the instruction has none
    pub fn index(&self) -> usize {
        match self.operand {
            Operand::Index(i) => i as usize,
            _ => 0,
        }
    }

    /// Signed immediate value
    pub fn int(&self) -> i32 {
        match self.operand {
            Operand::Int(i) | Operand::Offset(i) => i,
            Operand::Index(i) => i as i32,
            Operand::None => 0,
        }
    }

    /// Absolute target of a branch, `None` if not a branch or the offset
    /// leaves the address space
    pub fn branch_target(&self) -> Option<usize> {
        match self.operand {
            Operand::Offset(off) => {
                let target = self.next_pc() as i64 + off as i64;
                usize::try_from(target).ok()
            }
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}: {}", self.pc, self.opcode)?;
        match (self.opcode.operand_kind(), self.operand) {
            (OperandKind::Label, Operand::Offset(off)) => match self.branch_target() {
                Some(target) => write!(f, " {:+} -> {:04}", off, target),
                None => write!(f, " {:+}", off),
            },
            (_, Operand::Int(i)) => write!(f, " {}", i),
            (_, Operand::Index(i)) => write!(f, " {}", i),
            _ => Ok(()),
        }
    }
}
