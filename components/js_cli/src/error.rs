//! Error types for the CLI

use std::path::PathBuf;

use core_types::VmFault;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Bytecode file could not be read
    #[error("Could not read file '{path}': {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Bytecode file is not a valid serialized function
    #[error("Invalid bytecode in '{path}': {fault}")]
    Load {
        /// File that failed
        path: PathBuf,
        /// Decode failure
        fault: VmFault,
    },

    /// Execution ended in a fault or an uncaught exception
    #[error("{0}")]
    Execution(#[from] VmFault),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
