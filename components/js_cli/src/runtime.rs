//! Runtime orchestration for bytecode files
//!
//! The Runtime owns one VM and turns files on disk into executions or
//! listings.

use std::path::Path;
use std::sync::Arc;

use bytecode_system::FunctionBytecode;
use core_types::Value;
use interpreter::{VmConfig, VM};
use tracing::info;

use crate::error::{CliError, CliResult};

/// Main runtime that loads and executes bytecode files
#[derive(Debug)]
pub struct Runtime {
    vm: VM,
}

impl Runtime {
    /// Create a runtime whose VM uses `config`
    ///
    /// # Example
    /// ```
    /// use interpreter::VmConfig;
    /// use js_cli::Runtime;
    ///
    /// let runtime = Runtime::new(VmConfig::default().with_step_budget(1_000));
    /// assert_eq!(runtime.vm().config().step_budget, Some(1_000));
    /// ```
    pub fn new(config: VmConfig) -> Self {
        Self {
            vm: VM::with_config(config),
        }
    }

    /// Read and decode a bytecode file
    ///
    /// # Errors
    /// Returns `CliError::Io` if the file cannot be read and
    /// `CliError::Load` if its contents are not serialized bytecode
    pub fn load_file(&self, path: &Path) -> CliResult<Arc<FunctionBytecode>> {
        let bytes = std::fs::read(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        VM::load(&bytes).map_err(|fault| CliError::Load {
            path: path.to_path_buf(),
            fault,
        })
    }

    /// Execute a bytecode file as a top-level call
    ///
    /// # Returns
    /// The value the top-level function returned
    ///
    /// # Errors
    /// Returns `CliError` if the file cannot be loaded or execution fails
    pub fn run_file(&mut self, path: &Path) -> CliResult<Value> {
        let function = self.load_file(path)?;
        info!(file = %path.display(), function = %function.name, "running");
        let result = self.vm.execute(function, Value::Undefined, vec![])?;
        info!(steps = self.vm.steps(), "finished");
        Ok(result)
    }

    /// Disassemble a bytecode file
    pub fn disassemble_file(&self, path: &Path) -> CliResult<String> {
        Ok(self.load_file(path)?.disassemble())
    }

    /// The VM, for installing globals before a run
    pub fn vm(&self) -> &VM {
        &self.vm
    }

    /// Mutable access to the VM
    pub fn vm_mut(&mut self) -> &mut VM {
        &mut self.vm
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}
