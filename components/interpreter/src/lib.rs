//! Bytecode interpreter for the Corten VM
//!
//! This crate provides a stack-based virtual machine with:
//! - One operand stack shared by every frame, with a configurable limit
//! - An explicit frame stack; script calls never recurse on the host stack
//! - An open calling convention covering closures, host functions and
//!   bound functions
//! - Per-function handler ranges for catching thrown values
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bytecode_system::{FunctionBuilder, Opcode};
//! use core_types::Value;
//! use interpreter::VM;
//!
//! let mut b = FunctionBuilder::new("main");
//! b.push_number(42.0).emit(Opcode::Return);
//!
//! let mut vm = VM::new();
//! let result = vm.execute(Arc::new(b.build().unwrap()), Value::Undefined, vec![]).unwrap();
//! assert_eq!(result, Value::from(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_frame;
pub mod callable;
pub mod config;
pub mod dispatch;
pub mod operators;
pub mod realm;
pub mod stack;
pub mod upvalue;
pub mod vm;

// Re-export main types at crate root
pub use call_frame::{CallStack, Frame, FrameKind};
pub use callable::{BoundFunction, FunctionCall, NativeFn, NativeFunction};
pub use config::{
    VmConfig, DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_NATIVE_DEPTH, DEFAULT_MAX_STACK_DEPTH,
};
pub use dispatch::Dispatcher;
pub use realm::Realm;
pub use stack::ValueStack;
pub use upvalue::Closure;
pub use vm::VM;
