//! Error kinds and execution faults.
//!
//! [`ErrorKind`] names the built-in error constructors. [`VmFault`] is the
//! error half of every fallible interpreter operation: either an internal
//! invariant violation that aborts execution, or a script-level throw that
//! handler ranges may catch.

use std::fmt;

use bytecode_system::BytecodeError;
use thiserror::Error;

use crate::value::Value;

/// The kind of a script error.
///
/// These correspond to the built-in error constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Plain `Error`
    Error,
    /// Syntax error in source code
    SyntaxError,
    /// Type error (e.g., calling a non-function)
    TypeError,
    /// Reference to an undefined variable
    ReferenceError,
    /// Value out of allowed range
    RangeError,
    /// Error in eval() function
    EvalError,
    /// Error in URI handling functions
    URIError,
    /// Internal engine error
    InternalError,
}

impl ErrorKind {
    /// Constructor name, also the `name` property of instances
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::URIError => "URIError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure of an interpreter operation.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, VmFault};
///
/// let fault = VmFault::type_error("x is not iterable");
/// assert!(!fault.is_fatal());
/// assert_eq!(fault.to_string(), "TypeError: x is not iterable");
///
/// assert!(VmFault::StackUnderflow.is_fatal());
/// ```
#[derive(Debug, Clone, Error)]
pub enum VmFault {
    /// Pop from an empty value stack
    #[error("value stack underflow")]
    StackUnderflow,
    /// Push beyond the configured value stack limit
    #[error("value stack overflow (limit {limit})")]
    StackOverflow {
        /// Configured maximum depth
        limit: usize,
    },
    /// Byte at `pc` is not an opcode
    #[error("invalid opcode 0x{opcode:02x} at pc {pc}")]
    InvalidOpcode {
        /// Offending byte
        opcode: u8,
        /// Position in the function's code
        pc: usize,
    },
    /// Operand runs past the end of the code
    #[error("truncated instruction at pc {pc}")]
    TruncatedInstruction {
        /// Position of the read
        pc: usize,
    },
    /// Opcode that is part of the instruction set but not executable yet
    #[error("opcode {opcode} at pc {pc} is not implemented")]
    UnimplementedOpcode {
        /// Mnemonic
        opcode: &'static str,
        /// Position in the function's code
        pc: usize,
    },
    /// Constant index out of range
    #[error("constant index {index} out of range")]
    InvalidConstant {
        /// Operand value
        index: usize,
    },
    /// Atom index out of range
    #[error("atom index {index} out of range")]
    InvalidAtom {
        /// Operand value
        index: usize,
    },
    /// Local slot index out of range
    #[error("local index {index} out of range")]
    InvalidLocal {
        /// Operand value
        index: usize,
    },
    /// Captured variable index out of range
    #[error("capture index {index} out of range")]
    InvalidCapture {
        /// Operand value
        index: usize,
    },
    /// Branch target outside the function's code
    #[error("branch target out of range at pc {pc}")]
    InvalidJump {
        /// Position of the branch
        pc: usize,
    },
    /// An instruction ran with no frame on the call stack
    #[error("no active frame")]
    NoActiveFrame,
    /// Serialized bytecode could not be read
    #[error("malformed bytecode: {0}")]
    Malformed(String),
    /// A thrown script value
    #[error("Uncaught exception: {0}")]
    Exception(Value),
    /// A script error raised by the engine, thrown as an error object of
    /// `kind` once it reaches script code
    #[error("{kind}: {message}")]
    Error {
        /// Error constructor
        kind: ErrorKind,
        /// Message text
        message: String,
    },
    /// Call of a value that is not callable
    #[error("{0} is not a function")]
    NotCallable(String),
    /// `new` applied to a value that is not a constructor
    #[error("{0} is not a constructor")]
    NotConstructor(String),
    /// The configured instruction budget ran out
    #[error("step budget of {steps} instructions exhausted")]
    StepBudgetExhausted {
        /// Instructions executed
        steps: u64,
    },
}

impl VmFault {
    /// Script-level error of the given kind
    pub fn throw(kind: ErrorKind, message: impl Into<String>) -> Self {
        VmFault::Error {
            kind,
            message: message.into(),
        }
    }

    /// TypeError
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::throw(ErrorKind::TypeError, message)
    }

    /// RangeError
    pub fn range_error(message: impl Into<String>) -> Self {
        Self::throw(ErrorKind::RangeError, message)
    }

    /// ReferenceError
    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::throw(ErrorKind::ReferenceError, message)
    }

    /// Internal faults abort the whole execution; everything else is a
    /// script exception that handler ranges can catch.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            VmFault::Exception(_)
                | VmFault::Error { .. }
                | VmFault::NotCallable(_)
                | VmFault::NotConstructor(_)
        )
    }

    /// Kind and message of a catchable fault that still needs an error
    /// object; `None` for thrown values and fatal faults
    pub fn error_parts(&self) -> Option<(ErrorKind, String)> {
        match self {
            VmFault::Error { kind, message } => Some((*kind, message.clone())),
            VmFault::NotCallable(_) | VmFault::NotConstructor(_) => {
                Some((ErrorKind::TypeError, self.to_string()))
            }
            _ => None,
        }
    }
}

impl From<BytecodeError> for VmFault {
    fn from(err: BytecodeError) -> Self {
        match err {
            BytecodeError::InvalidOpcode { opcode, pc } => VmFault::InvalidOpcode { opcode, pc },
            BytecodeError::Truncated { pc } => VmFault::TruncatedInstruction { pc },
            other => VmFault::Malformed(other.to_string()),
        }
    }
}
