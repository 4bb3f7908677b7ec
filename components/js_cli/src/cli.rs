//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use interpreter::VmConfig;

/// Corten VM: run serialized bytecode
#[derive(Debug, Parser)]
#[command(name = "corten-vm", version, about)]
pub struct Cli {
    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,

    /// Maximum operand stack depth, in values
    #[arg(long, global = true)]
    pub max_stack: Option<usize>,

    /// Maximum number of active call frames
    #[arg(long, global = true)]
    pub max_frames: Option<usize>,

    /// Maximum nesting of host functions calling back into script
    #[arg(long, global = true)]
    pub max_native_depth: Option<usize>,

    /// Abort after this many instructions
    #[arg(long, global = true)]
    pub step_budget: Option<u64>,

    /// Log frame and exception events (repeat for per-instruction traces)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Subcommands
#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Execute a bytecode file and print its result
    Run {
        /// Serialized bytecode file
        file: PathBuf,
    },
    /// Print a listing of a bytecode file
    Disasm {
        /// Serialized bytecode file
        file: PathBuf,
    },
}

impl Cli {
    /// VM limits selected on the command line
    pub fn vm_config(&self) -> VmConfig {
        let mut config = VmConfig::default();
        if let Some(depth) = self.max_stack {
            config = config.with_max_stack_depth(depth);
        }
        if let Some(depth) = self.max_frames {
            config = config.with_max_call_depth(depth);
        }
        if let Some(depth) = self.max_native_depth {
            config = config.with_max_native_depth(depth);
        }
        if let Some(steps) = self.step_budget {
            config = config.with_step_budget(steps);
        }
        config
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}
