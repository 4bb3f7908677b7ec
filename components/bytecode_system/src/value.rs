//! Constant-pool values
//!
//! Constants are compile-time values and are shared read-only across
//! interpreter instances, so they carry no runtime object references.
//! Nested functions live in the pool as [`Constant::Function`].

use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::chunk::FunctionBytecode;

/// A constant-pool entry
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// undefined
    Undefined,
    /// null
    Null,
    /// Boolean literal
    Boolean(bool),
    /// Number literal (IEEE 754 double)
    Number(f64),
    /// String literal
    String(String),
    /// BigInt literal
    BigInt(BigInt),
    /// Nested function body, instantiated by `fclosure`
    Function(Arc<FunctionBytecode>),
}

impl Constant {
    /// Check if the constant is a number
    pub fn is_number(&self) -> bool {
        matches!(self, Constant::Number(_))
    }

    /// Try to get the number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Constant::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the nested function
    pub fn as_function(&self) -> Option<&Arc<FunctionBytecode>> {
        match self {
            Constant::Function(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Undefined => write!(f, "undefined"),
            Constant::Null => write!(f, "null"),
            Constant::Boolean(b) => write!(f, "{}", b),
            Constant::Number(n) => write!(f, "{}", n),
            Constant::String(s) => write!(f, "{:?}", s),
            Constant::BigInt(n) => write!(f, "{}n", n),
            Constant::Function(func) => write!(f, "<function {}>", func.name),
        }
    }
}

impl From<f64> for Constant {
    fn from(n: f64) -> Self {
        Constant::Number(n)
    }
}

impl From<&str> for Constant {
    fn from(s: &str) -> Self {
        Constant::String(s.to_string())
    }
}

impl From<FunctionBytecode> for Constant {
    fn from(f: FunctionBytecode) -> Self {
        Constant::Function(Arc::new(f))
    }
}
