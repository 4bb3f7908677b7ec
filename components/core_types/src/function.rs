//! Function model.
//!
//! Every callable object wraps an `Rc<dyn Callable>`. The interpreter never
//! matches on concrete callable types: it asks the callable to
//! [`Callable::invoke`] and either receives a finished value or a request
//! to interpret bytecode on its own frame stack.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use bytecode_system::FunctionBytecode;

use crate::error::{ErrorKind, VmFault};
use crate::object::ObjectRef;
use crate::value::Value;

/// Shared, mutable variable slot captured by closures
pub type VarCell = Rc<RefCell<Value>>;

/// Create a fresh variable cell
pub fn new_cell(value: Value) -> VarCell {
    Rc::new(RefCell::new(value))
}

/// How a callable is being entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Plain call
    Call,
    /// `new` expression; `this` is the freshly allocated object
    Construct,
}

/// Request to run bytecode in a new frame
#[derive(Debug, Clone)]
pub struct InterpretedCall {
    /// Function body
    pub function: Arc<FunctionBytecode>,
    /// Captured variable cells, indexed by `get_var_ref`
    pub captures: Rc<[VarCell]>,
    /// `this` binding of the new frame
    pub this: Value,
    /// Arguments, in source order
    pub args: Vec<Value>,
}

/// Outcome of invoking a callable
#[derive(Debug)]
pub enum Invocation {
    /// The call finished and produced a value
    Complete(Value),
    /// The caller must push a frame and interpret
    Interpret(InterpretedCall),
}

/// A callable value.
///
/// New kinds of callables (bound functions, proxies, host functions) are
/// added by implementing this trait.
pub trait Callable: fmt::Debug {
    /// Function name, used in messages and default string forms
    fn name(&self) -> &str;

    /// Whether `new` may be applied
    fn is_constructor(&self) -> bool {
        false
    }

    /// Object whose `prototype` property seeds constructed objects, when it
    /// is not the function object itself
    fn bound_target(&self) -> Option<&ObjectRef> {
        None
    }

    /// Perform the call
    fn invoke(
        &self,
        cx: &mut dyn CallContext,
        this: Value,
        args: Vec<Value>,
        mode: CallMode,
    ) -> Result<Invocation, VmFault>;
}

/// Services the interpreter offers to native code
pub trait CallContext {
    /// The global object
    fn global(&self) -> ObjectRef;

    /// New plain object with the realm's object prototype
    fn new_object(&self) -> ObjectRef;

    /// New array with the realm's array prototype
    fn new_array(&self, elements: Vec<Value>) -> ObjectRef;

    /// New error object with the realm's error prototype
    fn new_error(&self, kind: ErrorKind, message: &str) -> Value;

    /// New function object around `callable`
    fn new_function(&self, callable: Rc<dyn Callable>) -> ObjectRef;

    /// Call `callee` to completion, re-entering the interpreter if needed
    fn call(&mut self, callee: &Value, this: Value, args: Vec<Value>) -> Result<Value, VmFault>;
}
