//! Host and bound callables
//!
//! Both plug into the same [`Callable`] protocol as interpreted closures,
//! so the dispatch loop never needs to know which kind it is calling.

use std::fmt;
use std::rc::Rc;

use core_types::{CallContext, CallMode, Callable, Invocation, ObjectRef, Value, VmFault};

/// Signature of a host function: context, `this`, arguments
pub type NativeFn = dyn Fn(&mut dyn CallContext, &Value, &[Value]) -> Result<Value, VmFault>;

/// Function implemented by the embedder
pub struct NativeFunction {
    name: String,
    func: Box<NativeFn>,
    constructor: bool,
}

impl NativeFunction {
    /// Create a native function that can only be called
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut dyn CallContext, &Value, &[Value]) -> Result<Value, VmFault> + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
            constructor: false,
        }
    }

    /// Create a native function that may also be used with `new`; under
    /// `new` it receives the freshly allocated object as `this`
    pub fn constructor<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut dyn CallContext, &Value, &[Value]) -> Result<Value, VmFault> + 'static,
    {
        Self {
            constructor: true,
            ..Self::new(name, func)
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("constructor", &self.constructor)
            .finish()
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_constructor(&self) -> bool {
        self.constructor
    }

    fn invoke(
        &self,
        cx: &mut dyn CallContext,
        this: Value,
        args: Vec<Value>,
        _mode: CallMode,
    ) -> Result<Invocation, VmFault> {
        (self.func)(cx, &this, &args).map(Invocation::Complete)
    }
}

/// Function with a fixed `this` and leading arguments
#[derive(Debug)]
pub struct BoundFunction {
    target: ObjectRef,
    target_callable: Rc<dyn Callable>,
    bound_this: Value,
    bound_args: Vec<Value>,
    name: String,
}

impl BoundFunction {
    /// Bind `target`; fails if it is not callable
    pub fn new(target: ObjectRef, bound_this: Value, bound_args: Vec<Value>) -> Result<Self, VmFault> {
        let target_callable = target
            .callable()
            .ok_or_else(|| VmFault::type_error("Bind must be called on a function"))?;
        let name = format!("bound {}", target_callable.name());
        Ok(Self {
            target,
            target_callable,
            bound_this,
            bound_args,
            name,
        })
    }
}

impl Callable for BoundFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_constructor(&self) -> bool {
        self.target_callable.is_constructor()
    }

    fn bound_target(&self) -> Option<&ObjectRef> {
        Some(&self.target)
    }

    fn invoke(
        &self,
        cx: &mut dyn CallContext,
        this: Value,
        args: Vec<Value>,
        mode: CallMode,
    ) -> Result<Invocation, VmFault> {
        let mut full_args = self.bound_args.clone();
        full_args.extend(args);
        let this = match mode {
            CallMode::Call => self.bound_this.clone(),
            CallMode::Construct => this,
        };
        self.target_callable.invoke(cx, this, full_args, mode)
    }
}

/// `Function.prototype.call`
///
/// Forwards to the receiver's own [`Callable::invoke`], so an interpreted
/// target is entered as a frame of the current run instead of a nested one.
#[derive(Debug, Default)]
pub struct FunctionCall;

impl Callable for FunctionCall {
    fn name(&self) -> &str {
        "call"
    }

    fn invoke(
        &self,
        cx: &mut dyn CallContext,
        this: Value,
        args: Vec<Value>,
        _mode: CallMode,
    ) -> Result<Invocation, VmFault> {
        let target = this
            .as_object()
            .and_then(ObjectRef::callable)
            .ok_or_else(|| VmFault::NotCallable(this.to_string()))?;
        let mut args = args.into_iter();
        let this_arg = args.next().unwrap_or(Value::Undefined);
        target.invoke(cx, this_arg, args.collect(), CallMode::Call)
    }
}
