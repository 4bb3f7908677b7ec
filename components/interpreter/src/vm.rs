//! Virtual Machine for bytecode execution
//!
//! Main entry point for embedders.

use std::rc::Rc;
use std::sync::Arc;

use bytecode_system::FunctionBytecode;
use core_types::{CallContext, ObjectRef, PropertyKey, Value, VmFault};
use tracing::debug;

use crate::callable::NativeFunction;
use crate::config::VmConfig;
use crate::dispatch::Dispatcher;
use crate::upvalue::Closure;

/// Virtual Machine for executing bytecode
///
/// The VM owns one operand stack, one frame stack and one global object.
/// Bytecode is shared read-only, so many VMs (one per thread) may run the
/// same function concurrently.
#[derive(Debug)]
pub struct VM {
    dispatcher: Dispatcher,
}

impl VM {
    /// Create a VM with default limits
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    /// Create a VM with the given limits
    pub fn with_config(config: VmConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(config),
        }
    }

    /// Decode serialized bytecode
    pub fn load(bytes: &[u8]) -> Result<Arc<FunctionBytecode>, VmFault> {
        Ok(Arc::new(FunctionBytecode::from_bytes(bytes)?))
    }

    /// Run `function` as a top-level call and return its result
    ///
    /// # Arguments
    ///
    /// * `function` - Compiled function body, entered with no captures
    /// * `this` - The `this` binding
    /// * `args` - Arguments bound to the parameter slots
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The returned value
    /// * `Err(VmFault::Exception(v))` - A throw no handler caught; `v` is the
    ///   thrown value, an error object for engine-raised errors
    /// * `Err(fault)` - An internal fault aborted execution
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use bytecode_system::{FunctionBuilder, Opcode};
    /// use core_types::Value;
    /// use interpreter::VM;
    ///
    /// let mut b = FunctionBuilder::new("main");
    /// b.push_string("5").push_number(3.0).emit(Opcode::Add).emit(Opcode::Return);
    /// let function = Arc::new(b.build().unwrap());
    ///
    /// let mut vm = VM::new();
    /// let result = vm.execute(function, Value::Undefined, vec![]).unwrap();
    /// assert_eq!(result, Value::from("53"));
    /// ```
    pub fn execute(
        &mut self,
        function: Arc<FunctionBytecode>,
        this: Value,
        args: Vec<Value>,
    ) -> Result<Value, VmFault> {
        debug!(function = %function.name, args = args.len(), "execute");
        self.dispatcher.reset_steps();
        let closure = self
            .dispatcher
            .realm()
            .new_closure(Closure::without_captures(function));
        self.call(&Value::Object(closure), this, args)
    }

    /// Call any callable value to completion
    pub fn call(&mut self, callee: &Value, this: Value, args: Vec<Value>) -> Result<Value, VmFault> {
        self.dispatcher
            .call_value(callee, this, args)
            .map_err(|fault| self.to_boundary(fault))
    }

    /// Evaluate `new callee(...args)`
    pub fn construct(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, VmFault> {
        self.dispatcher
            .construct_value(callee, args)
            .map_err(|fault| self.to_boundary(fault))
    }

    /// Engine-raised errors leave the VM as thrown error objects
    fn to_boundary(&self, fault: VmFault) -> VmFault {
        if fault.error_parts().is_some() {
            VmFault::Exception(self.dispatcher.materialize(fault))
        } else {
            fault
        }
    }

    /// Get a global variable by name
    ///
    /// # Returns
    ///
    /// * `Some(Value)` - The value if the global exists
    /// * `None` - If the global does not exist
    pub fn get_global(&self, name: &str) -> Option<Value> {
        let global = self.dispatcher.realm().global();
        let key = PropertyKey::from(name);
        if global.has_own(&key) {
            Some(global.get(&key))
        } else {
            None
        }
    }

    /// Set a global variable
    pub fn set_global(&mut self, name: &str, value: Value) {
        self.dispatcher.realm().global().set_named(name, value);
    }

    /// Install a host function as a global
    ///
    /// ```
    /// use core_types::Value;
    /// use interpreter::VM;
    ///
    /// let mut vm = VM::new();
    /// vm.define_native("answer", |_cx, _this, _args| Ok(Value::from(42)));
    /// assert!(vm.get_global("answer").is_some());
    /// ```
    pub fn define_native<F>(&mut self, name: &str, func: F) -> ObjectRef
    where
        F: Fn(&mut dyn CallContext, &Value, &[Value]) -> Result<Value, VmFault> + 'static,
    {
        self.dispatcher.realm().define_native(name, func)
    }

    /// Wrap a host function as a function object without binding it
    pub fn native_function<F>(&self, name: &str, func: F) -> Value
    where
        F: Fn(&mut dyn CallContext, &Value, &[Value]) -> Result<Value, VmFault> + 'static,
    {
        let native = Rc::new(NativeFunction::new(name, func));
        Value::Object(self.dispatcher.realm().new_function(native))
    }

    /// The global object
    pub fn global(&self) -> ObjectRef {
        self.dispatcher.realm().global().clone()
    }

    /// Limits in effect
    pub fn config(&self) -> VmConfig {
        self.dispatcher.config()
    }

    /// Values on the operand stack; zero between executions
    pub fn stack_depth(&self) -> usize {
        self.dispatcher.stack().len()
    }

    /// Active frames; zero between executions
    pub fn frame_depth(&self) -> usize {
        self.dispatcher.frames().len()
    }

    /// Instructions run by the last execution
    pub fn steps(&self) -> u64 {
        self.dispatcher.steps()
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}
