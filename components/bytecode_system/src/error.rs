//! Errors raised while decoding, building or loading bytecode

use thiserror::Error;

/// Failure to read an instruction or a serialized function
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BytecodeError {
    /// The byte at `pc` is not an opcode
    #[error("invalid opcode 0x{opcode:02x} at pc {pc}")]
    InvalidOpcode {
        /// Offending byte
        opcode: u8,
        /// Position of the byte
        pc: usize,
    },
    /// An operand extends past the end of the code
    #[error("truncated instruction at pc {pc}")]
    Truncated {
        /// Position of the read
        pc: usize,
    },
    /// Serialized data does not start with the chunk magic
    #[error("invalid magic number")]
    BadMagic,
    /// Serialized data uses an unknown format version
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),
    /// Serialized data ended early
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEof {
        /// Read position
        offset: usize,
    },
    /// A serialized string is not UTF-8
    #[error("invalid UTF-8 in serialized string")]
    InvalidUtf8,
    /// A serialized constant has an unknown tag
    #[error("unknown constant tag: {0}")]
    UnknownConstantTag(u8),
    /// Function constants are nested deeper than the loader accepts
    #[error("function constants nested deeper than {limit} levels")]
    NestingTooDeep {
        /// Maximum nesting depth
        limit: usize,
    },
    /// A serialized BigInt could not be parsed
    #[error("invalid bigint literal: {0}")]
    InvalidBigInt(String),
}

/// Misuse of [`crate::FunctionBuilder`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The operand passed does not match the opcode's operand kind
    #[error("opcode {opcode} does not take a {given} operand")]
    OperandMismatch {
        /// Opcode mnemonic
        opcode: &'static str,
        /// Description of the operand given
        given: &'static str,
    },
    /// A label was referenced but never bound
    #[error("label {0} was never bound")]
    UnboundLabel(usize),
    /// A branch target is further than an i32 offset can reach
    #[error("branch offset out of range")]
    OffsetOutOfRange,
    /// More entries than the operand width can index
    #[error("{0} table overflow")]
    TableOverflow(&'static str),
}
