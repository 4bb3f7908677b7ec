//! Bytecode system for the Corten VM
//!
//! This crate defines the instruction set the interpreter executes, the
//! immutable [`FunctionBytecode`] a compiler hands over, and the tools
//! around it.
//!
//! # Features
//!
//! - Stack-machine opcodes with fixed-width operands
//! - Reader interface used by the dispatch loop
//! - [`FunctionBuilder`] assembler with labels and handler ranges
//! - Binary serialization and a disassembler
//!
//! # Example
//!
//! ```
//! use bytecode_system::{FunctionBuilder, FunctionBytecode, Opcode};
//!
//! let mut builder = FunctionBuilder::new("answer");
//! builder.push_number(42.0).emit(Opcode::Return);
//! let function = builder.build().unwrap();
//!
//! // Serialize
//! let bytes = function.to_bytes();
//! let restored = FunctionBytecode::from_bytes(&bytes).unwrap();
//! assert_eq!(restored, function);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod chunk;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod value;

// Re-export main types at crate root
pub use builder::{FunctionBuilder, Label};
pub use chunk::{CaptureDescriptor, FunctionBytecode, HandlerRange, MAX_FUNCTION_NESTING};
pub use error::{BuildError, BytecodeError};
pub use instruction::{Instruction, Operand};
pub use opcode::{Opcode, OperandKind};
pub use value::Constant;
