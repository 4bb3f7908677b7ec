//! Core value types, object model and semantics shared by the VM.
//!
//! This crate provides the foundational types for the Corten VM: value
//! representation, the object and function model, the coercion and
//! comparison algorithms, and the fault type every operation returns.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of script values
//! - [`ObjectRef`] / [`PropertyKey`] - Shared objects and normalized keys
//! - [`Callable`] / [`CallContext`] - The open calling convention
//! - [`convert`] / [`compare`] - ToNumber, ToInt32, equality, `<`
//! - [`VmFault`] / [`ErrorKind`] - Faults and script error kinds
//!
//! # Examples
//!
//! ```
//! use core_types::{compare, convert, Value};
//!
//! assert!(compare::abstract_equals(&Value::Null, &Value::Undefined));
//! assert_eq!(convert::to_int32(4294967295.0), -1);
//! assert_eq!(Value::from(0.5).to_string(), "0.5");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod compare;
pub mod convert;
mod error;
mod function;
mod object;
mod value;

pub use convert::Numeric;
pub use error::{ErrorKind, VmFault};
pub use function::{
    new_cell, CallContext, CallMode, Callable, InterpretedCall, Invocation, VarCell,
};
pub use object::{JsObject, ObjectKind, ObjectRef, PropertyKey, MAX_STRING_LENGTH};
pub use value::{Symbol, SymbolRef, Value};
