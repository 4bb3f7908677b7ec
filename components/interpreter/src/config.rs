//! Interpreter limits

/// Default maximum number of values on the operand stack
pub const DEFAULT_MAX_STACK_DEPTH: usize = 65_536;

/// Default maximum number of nested calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// Default maximum number of host functions calling back into script at once
pub const DEFAULT_MAX_NATIVE_DEPTH: usize = 64;

/// Resource limits of one interpreter instance
///
/// # Example
///
/// ```
/// use interpreter::VmConfig;
///
/// let config = VmConfig::default().with_max_call_depth(500).with_step_budget(1_000_000);
/// assert_eq!(config.max_call_depth, 500);
/// assert_eq!(config.step_budget, Some(1_000_000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Values the operand stack may hold; exceeding it is fatal
    pub max_stack_depth: usize,
    /// Nested calls allowed before a RangeError is thrown
    pub max_call_depth: usize,
    /// Nested re-entries from host functions into the dispatch loop allowed
    /// before a RangeError is thrown; each one holds a run loop on the host stack
    pub max_native_depth: usize,
    /// Instructions one top-level execution may run; `None` is unlimited
    pub step_budget: Option<u64>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_native_depth: DEFAULT_MAX_NATIVE_DEPTH,
            step_budget: None,
        }
    }
}

impl VmConfig {
    /// Set the operand stack limit
    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    /// Set the call depth limit
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Set the host re-entry limit
    pub fn with_max_native_depth(mut self, depth: usize) -> Self {
        self.max_native_depth = depth;
        self
    }

    /// Limit the instructions per execution
    pub fn with_step_budget(mut self, steps: u64) -> Self {
        self.step_budget = Some(steps);
        self
    }
}
