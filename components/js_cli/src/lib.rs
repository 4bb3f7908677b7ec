//! Corten VM CLI Library
//!
//! Provides the Runtime struct and supporting modules for the `corten-vm`
//! binary, which runs and disassembles serialized bytecode files.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod runtime;

pub use cli::{Cli, Command};
pub use error::{CliError, CliResult};
pub use runtime::Runtime;
