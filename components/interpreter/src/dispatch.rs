//! Dispatch loop for bytecode execution
//!
//! Script-to-script calls never recurse on the host stack: a call pushes a
//! [`Frame`] and the loop carries on in the callee, a return pops it and
//! resumes the caller. Only native functions that call back into script
//! (through [`CallContext::call`]) start a nested run, which stops when the
//! frame it entered returns.

use std::rc::Rc;
use std::sync::Arc;

use bytecode_system::{Constant, FunctionBytecode, Instruction, Opcode};
use core_types::compare::strict_equals;
use core_types::convert::to_property_key;
use core_types::{
    CallContext, CallMode, Callable, ErrorKind, InterpretedCall, Invocation, ObjectRef,
    PropertyKey, Value, VarCell, VmFault,
};
use tracing::{debug, trace, warn};

use crate::call_frame::{CallStack, Frame, FrameKind};
use crate::config::VmConfig;
use crate::operators;
use crate::realm::Realm;
use crate::stack::ValueStack;
use crate::upvalue::Closure;

/// Outcome of one instruction
type Step = Result<Option<Value>, VmFault>;

/// Dispatch handler for executing bytecode
#[derive(Debug)]
pub struct Dispatcher {
    /// Operand stack shared by all frames
    stack: ValueStack,
    /// Active frames, innermost last
    frames: CallStack,
    /// Global object and intrinsics
    realm: Realm,
    /// Resource limits
    config: VmConfig,
    /// Instructions executed since the last reset
    steps: u64,
    /// Native calls currently on the host stack
    native_depth: usize,
}

impl Dispatcher {
    /// Create a dispatcher with a fresh realm
    pub fn new(config: VmConfig) -> Self {
        Self {
            stack: ValueStack::new(config.max_stack_depth),
            frames: CallStack::new(),
            realm: Realm::new(),
            config,
            steps: 0,
            native_depth: 0,
        }
    }

    /// The realm
    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// The operand stack
    pub fn stack(&self) -> &ValueStack {
        &self.stack
    }

    /// The active frames
    pub fn frames(&self) -> &CallStack {
        &self.frames
    }

    /// Resource limits in effect
    pub fn config(&self) -> VmConfig {
        self.config
    }

    /// Instructions executed since the last reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Restart the step budget
    pub fn reset_steps(&mut self) {
        self.steps = 0;
    }

    /// Call `callee` to completion
    pub fn call_value(
        &mut self,
        callee: &Value,
        this: Value,
        args: Vec<Value>,
    ) -> Result<Value, VmFault> {
        self.check_native_depth()?;
        let callable = callable_of(callee)?;
        match self.invoke(&callable, this, args, CallMode::Call)? {
            Invocation::Complete(value) => Ok(value),
            Invocation::Interpret(call) => self.run_call(call, FrameKind::Call),
        }
    }

    /// Construct with `callee` as `new callee(...args)`, to completion
    pub fn construct_value(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, VmFault> {
        self.check_native_depth()?;
        let (callable, this) = self.prepare_construct(callee)?;
        let receiver = Value::Object(this.clone());
        match self.invoke(&callable, receiver, args, CallMode::Construct)? {
            Invocation::Complete(value) => Ok(construct_result(value, this)),
            Invocation::Interpret(call) => self.run_call(call, FrameKind::Construct(this)),
        }
    }

    fn run_call(&mut self, call: InterpretedCall, kind: FrameKind) -> Result<Value, VmFault> {
        let entry_depth = self.frames.len();
        self.push_frame(call, kind);
        self.run(entry_depth)
    }

    fn run(&mut self, entry_depth: usize) -> Result<Value, VmFault> {
        loop {
            match self.step(entry_depth) {
                Ok(None) => {}
                Ok(Some(value)) => return Ok(value),
                Err(fault) => self.handle_fault(fault, entry_depth)?,
            }
        }
    }

    fn step(&mut self, entry_depth: usize) -> Step {
        if let Some(budget) = self.config.step_budget {
            if self.steps >= budget {
                return Err(VmFault::StepBudgetExhausted { steps: budget });
            }
        }
        self.steps += 1;

        let frame = self.frames.top_mut().ok_or(VmFault::NoActiveFrame)?;
        let function = Arc::clone(&frame.function);
        if frame.pc >= function.len() {
            return self.do_return(Value::Undefined, entry_depth);
        }
        let instr = function.decode(frame.pc)?;
        frame.instr_pc = instr.pc;
        frame.pc = instr.next_pc();
        trace!(
            target: "interpreter::dispatch",
            function = %function.name,
            depth = self.stack.len(),
            "{}",
            instr
        );
        self.execute(&function, &instr, entry_depth)
    }

    fn execute(
        &mut self,
        function: &Arc<FunctionBytecode>,
        instr: &Instruction,
        entry_depth: usize,
    ) -> Step {
        match instr.opcode {
            Opcode::Nop => {}

            Opcode::PushUndefined => self.push(Value::Undefined)?,
            Opcode::PushNull => self.push(Value::Null)?,
            Opcode::PushTrue => self.push(Value::Boolean(true))?,
            Opcode::PushFalse => self.push(Value::Boolean(false))?,
            Opcode::PushThis => {
                let this = self.frame()?.this.clone();
                self.push(this)?;
            }
            Opcode::PushI8 | Opcode::PushI32 => self.push(Value::Number(instr.int() as f64))?,
            Opcode::PushConst => {
                let value = self.load_constant(function, instr.index())?;
                self.push(value)?;
            }
            Opcode::PushAtom => {
                let atom = atom(function, instr.index())?;
                self.push(Value::string(atom))?;
            }
            Opcode::FClosure => {
                let index = instr.index();
                let nested = function
                    .constant(index)
                    .and_then(Constant::as_function)
                    .ok_or(VmFault::InvalidConstant { index })?;
                let closure = self.instantiate(nested)?;
                self.push(closure)?;
            }

            Opcode::Drop => {
                self.pop()?;
            }
            Opcode::Nip => {
                let b = self.pop()?;
                self.pop()?;
                self.push(b)?;
            }
            Opcode::Dup => {
                let a = self.stack.peek(0)?.clone();
                self.push(a)?;
            }
            Opcode::Dup2 => {
                let b = self.stack.peek(0)?.clone();
                let a = self.stack.peek(1)?.clone();
                self.push(a)?;
                self.push(b)?;
            }
            Opcode::Swap => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(b)?;
                self.push(a)?;
            }
            Opcode::Rot3L => {
                let c = self.pop()?;
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(b)?;
                self.push(c)?;
                self.push(a)?;
            }

            Opcode::Add => self.binary(operators::add)?,
            Opcode::Sub => self.binary(operators::sub)?,
            Opcode::Mul => self.binary(operators::mul)?,
            Opcode::Div => self.binary(operators::div)?,
            Opcode::Mod => self.binary(operators::rem)?,
            Opcode::Pow => self.binary(operators::pow)?,
            Opcode::Plus => self.unary(operators::plus)?,
            Opcode::Neg => self.unary(operators::neg)?,
            Opcode::Inc => self.unary(operators::inc)?,
            Opcode::Dec => self.unary(operators::dec)?,

            Opcode::BitAnd => self.binary(operators::bit_and)?,
            Opcode::BitOr => self.binary(operators::bit_or)?,
            Opcode::BitXor => self.binary(operators::bit_xor)?,
            Opcode::Shl => self.binary(operators::shl)?,
            Opcode::Sar => self.binary(operators::sar)?,
            Opcode::Shr => self.binary(operators::shr)?,
            Opcode::BitNot => self.unary(operators::bit_not)?,
            Opcode::LNot => {
                let a = self.pop()?;
                self.push(Value::Boolean(!a.is_truthy()))?;
            }

            Opcode::Eq => self.compare(operators::loose_eq)?,
            Opcode::Neq => self.compare(|a, b| operators::loose_eq(a, b).map(|eq| !eq))?,
            Opcode::StrictEq => self.compare(|a, b| Ok(strict_equals(a, b)))?,
            Opcode::StrictNeq => self.compare(|a, b| Ok(!strict_equals(a, b)))?,
            Opcode::Lt => self.compare(operators::lt)?,
            Opcode::Lte => self.compare(operators::lte)?,
            Opcode::Gt => self.compare(operators::gt)?,
            Opcode::Gte => self.compare(operators::gte)?,
            Opcode::InstanceOf => self.compare(instance_of)?,
            Opcode::In => {
                let target = self.pop()?;
                let key = self.pop()?;
                let obj = target.as_object().ok_or_else(|| {
                    VmFault::type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        to_property_key(&key),
                        target
                    ))
                })?;
                let found = obj.has(&to_property_key(&key));
                self.push(Value::Boolean(found))?;
            }

            Opcode::And => {
                if !self.stack.peek(0)?.is_truthy() {
                    self.jump(function, instr)?;
                } else {
                    self.pop()?;
                }
            }
            Opcode::Or => {
                if self.stack.peek(0)?.is_truthy() {
                    self.jump(function, instr)?;
                } else {
                    self.pop()?;
                }
            }
            Opcode::Nullish => {
                if !self.stack.peek(0)?.is_nullish() {
                    self.jump(function, instr)?;
                } else {
                    self.pop()?;
                }
            }

            Opcode::GetVar => {
                let name = atom(function, instr.index())?;
                let key = PropertyKey::from(name);
                let global = self.realm.global();
                if !global.has(&key) {
                    return Err(VmFault::reference_error(format!("{} is not defined", name)));
                }
                let value = global.get(&key);
                self.push(value)?;
            }
            Opcode::PutVar => {
                let name = atom(function, instr.index())?;
                let value = self.pop()?;
                self.realm.global().set_named(name, value);
            }
            Opcode::SetVar => {
                let name = atom(function, instr.index())?;
                let value = self.stack.peek(0)?.clone();
                self.realm.global().set_named(name, value);
            }
            Opcode::DeleteVar => {
                let name = atom(function, instr.index())?;
                let deleted = self.realm.global().delete(&PropertyKey::from(name));
                self.push(Value::Boolean(deleted))?;
            }
            Opcode::GetLoc => {
                let value = self.local(instr.index())?.borrow().clone();
                self.push(value)?;
            }
            Opcode::PutLoc => {
                let cell = self.local(instr.index())?;
                let value = self.pop()?;
                *cell.borrow_mut() = value;
            }
            Opcode::SetLoc => {
                let cell = self.local(instr.index())?;
                let value = self.stack.peek(0)?.clone();
                *cell.borrow_mut() = value;
            }
            Opcode::GetVarRef => {
                let value = self.capture(instr.index())?.borrow().clone();
                self.push(value)?;
            }
            Opcode::PutVarRef => {
                let cell = self.capture(instr.index())?;
                let value = self.pop()?;
                *cell.borrow_mut() = value;
            }
            Opcode::SetVarRef => {
                let cell = self.capture(instr.index())?;
                let value = self.stack.peek(0)?.clone();
                *cell.borrow_mut() = value;
            }

            Opcode::Object => {
                let obj = self.realm.new_object();
                self.push(Value::Object(obj))?;
            }
            Opcode::ArrayFrom => {
                let elements = self.stack.pop_n(instr.index())?;
                let array = self.realm.new_array(elements);
                self.push(Value::Object(array))?;
            }
            Opcode::DefineField => {
                let name = atom(function, instr.index())?;
                let value = self.pop()?;
                match self.stack.peek(0)? {
                    Value::Object(obj) => obj.set_named(name, value),
                    other => {
                        return Err(VmFault::type_error(format!(
                            "Cannot define property '{}' on {}",
                            name, other
                        )))
                    }
                }
            }
            Opcode::GetField => {
                let key = PropertyKey::from(atom(function, instr.index())?);
                let target = self.pop()?;
                let value = get_property(&target, &key)?;
                self.push(value)?;
            }
            Opcode::GetField2 => {
                let key = PropertyKey::from(atom(function, instr.index())?);
                let target = self.stack.peek(0)?.clone();
                let value = get_property(&target, &key)?;
                self.push(value)?;
            }
            Opcode::PutField => {
                let key = PropertyKey::from(atom(function, instr.index())?);
                let value = self.pop()?;
                let target = self.pop()?;
                set_property(&target, key, value)?;
            }
            Opcode::GetArrayEl => {
                let key = self.pop()?;
                let target = self.pop()?;
                let value = get_property(&target, &to_property_key(&key))?;
                self.push(value)?;
            }
            Opcode::PutArrayEl => {
                let value = self.pop()?;
                let key = self.pop()?;
                let target = self.pop()?;
                set_property(&target, to_property_key(&key), value)?;
            }
            Opcode::Delete => {
                let key = self.pop()?;
                let target = self.pop()?;
                let deleted = match &target {
                    Value::Object(obj) => obj.delete(&to_property_key(&key)),
                    Value::Undefined | Value::Null => {
                        return Err(VmFault::type_error(
                            "Cannot convert undefined or null to object",
                        ))
                    }
                    _ => true,
                };
                self.push(Value::Boolean(deleted))?;
            }
            Opcode::TypeOf => {
                let a = self.pop()?;
                self.push(Value::from(a.type_of()))?;
            }

            Opcode::IfFalse => {
                if !self.pop()?.is_truthy() {
                    self.jump(function, instr)?;
                }
            }
            Opcode::IfTrue => {
                if self.pop()?.is_truthy() {
                    self.jump(function, instr)?;
                }
            }
            Opcode::Goto => self.jump(function, instr)?,

            Opcode::Call => {
                let args = self.stack.pop_n(instr.index())?;
                let callee = self.pop()?;
                self.call_op(&callee, Value::Undefined, args)?;
            }
            Opcode::CallMethod => {
                let args = self.stack.pop_n(instr.index())?;
                let callee = self.pop()?;
                let this = self.pop()?;
                self.call_op(&callee, this, args)?;
            }
            Opcode::CallConstructor => {
                let args = self.stack.pop_n(instr.index())?;
                let callee = self.pop()?;
                self.construct_op(&callee, args)?;
            }
            Opcode::Return => {
                let value = self.pop()?;
                return self.do_return(value, entry_depth);
            }
            Opcode::ReturnUndef => return self.do_return(Value::Undefined, entry_depth),
            Opcode::Throw => {
                let value = self.pop()?;
                return Err(VmFault::Exception(value));
            }

            Opcode::Await | Opcode::Yield => {
                return Err(VmFault::UnimplementedOpcode {
                    opcode: instr.opcode.mnemonic(),
                    pc: instr.pc,
                })
            }
        }
        Ok(None)
    }

    fn push(&mut self, value: Value) -> Result<(), VmFault> {
        self.stack.push(value)
    }

    fn pop(&mut self) -> Result<Value, VmFault> {
        self.stack.pop()
    }

    fn binary(&mut self, op: fn(&Value, &Value) -> Result<Value, VmFault>) -> Result<(), VmFault> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = op(&a, &b)?;
        self.push(result)
    }

    fn unary(&mut self, op: fn(&Value) -> Result<Value, VmFault>) -> Result<(), VmFault> {
        let a = self.pop()?;
        let result = op(&a)?;
        self.push(result)
    }

    fn compare(&mut self, op: fn(&Value, &Value) -> Result<bool, VmFault>) -> Result<(), VmFault> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = op(&a, &b)?;
        self.push(Value::Boolean(result))
    }

    fn frame(&self) -> Result<&Frame, VmFault> {
        self.frames.top().ok_or(VmFault::NoActiveFrame)
    }

    fn local(&self, index: usize) -> Result<VarCell, VmFault> {
        self.frame()?
            .locals
            .get(index)
            .cloned()
            .ok_or(VmFault::InvalidLocal { index })
    }

    fn capture(&self, index: usize) -> Result<VarCell, VmFault> {
        self.frame()?
            .captures
            .get(index)
            .cloned()
            .ok_or(VmFault::InvalidCapture { index })
    }

    fn jump(&mut self, function: &FunctionBytecode, instr: &Instruction) -> Result<(), VmFault> {
        let target = instr
            .branch_target()
            .filter(|target| *target <= function.len())
            .ok_or(VmFault::InvalidJump { pc: instr.pc })?;
        self.frames.top_mut().ok_or(VmFault::NoActiveFrame)?.pc = target;
        Ok(())
    }

    fn load_constant(&self, function: &FunctionBytecode, index: usize) -> Result<Value, VmFault> {
        let constant = function
            .constant(index)
            .ok_or(VmFault::InvalidConstant { index })?;
        Ok(match constant {
            Constant::Undefined => Value::Undefined,
            Constant::Null => Value::Null,
            Constant::Boolean(b) => Value::Boolean(*b),
            Constant::Number(n) => Value::Number(*n),
            Constant::String(s) => Value::string(s),
            Constant::BigInt(n) => Value::BigInt(n.clone()),
            Constant::Function(nested) => self.instantiate(nested)?,
        })
    }

    fn instantiate(&self, nested: &Arc<FunctionBytecode>) -> Result<Value, VmFault> {
        let closure = Closure::capture(Arc::clone(nested), self.frame()?)?;
        Ok(Value::Object(self.realm.new_closure(closure)))
    }

    fn check_call_depth(&self) -> Result<(), VmFault> {
        if self.frames.len() + self.native_depth >= self.config.max_call_depth {
            return Err(VmFault::range_error("Maximum call stack size exceeded"));
        }
        Ok(())
    }

    /// Host functions re-entering the loop nest on the host stack
    fn check_native_depth(&self) -> Result<(), VmFault> {
        if self.native_depth > self.config.max_native_depth {
            return Err(VmFault::range_error("Maximum call stack size exceeded"));
        }
        Ok(())
    }

    fn invoke(
        &mut self,
        callable: &Rc<dyn Callable>,
        this: Value,
        args: Vec<Value>,
        mode: CallMode,
    ) -> Result<Invocation, VmFault> {
        self.check_call_depth()?;
        self.native_depth += 1;
        let result = callable.invoke(self, this, args, mode);
        self.native_depth -= 1;
        result
    }

    fn call_op(&mut self, callee: &Value, this: Value, args: Vec<Value>) -> Result<(), VmFault> {
        let callable = callable_of(callee)?;
        match self.invoke(&callable, this, args, CallMode::Call)? {
            Invocation::Complete(value) => self.push(value),
            Invocation::Interpret(call) => {
                self.push_frame(call, FrameKind::Call);
                Ok(())
            }
        }
    }

    fn construct_op(&mut self, callee: &Value, args: Vec<Value>) -> Result<(), VmFault> {
        let (callable, this) = self.prepare_construct(callee)?;
        let receiver = Value::Object(this.clone());
        match self.invoke(&callable, receiver, args, CallMode::Construct)? {
            Invocation::Complete(value) => self.push(construct_result(value, this)),
            Invocation::Interpret(call) => {
                self.push_frame(call, FrameKind::Construct(this));
                Ok(())
            }
        }
    }

    /// Resolve the constructor and allocate the object it initializes
    fn prepare_construct(&self, callee: &Value) -> Result<(Rc<dyn Callable>, ObjectRef), VmFault> {
        let callable = callable_of(callee)
            .ok()
            .filter(|c| c.is_constructor())
            .ok_or_else(|| VmFault::NotConstructor(describe(callee)))?;
        let mut source = match callee {
            Value::Object(obj) => obj.clone(),
            _ => return Err(VmFault::NotConstructor(describe(callee))),
        };
        while let Some(target) = source.callable().and_then(|c| c.bound_target().cloned()) {
            source = target;
        }
        let proto = match source.get_named("prototype") {
            Value::Object(proto) => proto,
            _ => self.realm.object_prototype().clone(),
        };
        Ok((callable, ObjectRef::new_plain(Some(proto))))
    }

    fn push_frame(&mut self, call: InterpretedCall, kind: FrameKind) {
        let frame = Frame::new(call, self.stack.len(), kind);
        debug!(
            function = frame.name(),
            depth = self.frames.len() + 1,
            "enter frame"
        );
        self.frames.push(frame);
        self.sync_floor();
    }

    fn sync_floor(&mut self) {
        let floor = self.frames.top().map_or(0, |f| f.stack_base);
        self.stack.set_floor(floor);
    }

    fn do_return(&mut self, value: Value, entry_depth: usize) -> Step {
        let frame = self.frames.pop().ok_or(VmFault::NoActiveFrame)?;
        self.stack.truncate(frame.stack_base);
        debug!(function = frame.name(), depth = self.frames.len(), "exit frame");
        let value = match frame.kind {
            FrameKind::Construct(this) => construct_result(value, this),
            FrameKind::Call => value,
        };
        self.sync_floor();
        if self.frames.len() <= entry_depth {
            return Ok(Some(value));
        }
        self.push(value)?;
        Ok(None)
    }

    /// Route a fault: fatal faults abort the run, script exceptions unwind
    /// to the nearest covering handler range
    fn handle_fault(&mut self, fault: VmFault, entry_depth: usize) -> Result<(), VmFault> {
        if fault.is_fatal() {
            warn!(%fault, backtrace = ?self.frames.backtrace(), "execution aborted");
            self.abort_to(entry_depth);
            return Err(fault);
        }
        let exception = self.materialize(fault);
        while self.frames.len() > entry_depth {
            let frame = self.frames.top_mut().ok_or(VmFault::NoActiveFrame)?;
            if let Some(handler) = frame.function.handler_for(frame.instr_pc).copied() {
                let depth = frame.stack_base + handler.stack_depth as usize;
                let invalid = if handler.handler_pc as usize > frame.function.len() {
                    Some(VmFault::InvalidJump { pc: frame.instr_pc })
                } else if depth > self.stack.len() {
                    Some(VmFault::Malformed(format!(
                        "handler at pc {} expects {} values on the stack",
                        handler.handler_pc, handler.stack_depth
                    )))
                } else {
                    None
                };
                if let Some(fault) = invalid {
                    warn!(%fault, backtrace = ?self.frames.backtrace(), "execution aborted");
                    self.abort_to(entry_depth);
                    return Err(fault);
                }
                frame.pc = handler.handler_pc as usize;
                debug!(
                    function = frame.name(),
                    pc = frame.instr_pc,
                    handler = frame.pc,
                    "exception caught"
                );
                self.stack.truncate(depth);
                if let Err(overflow) = self.stack.push(exception) {
                    self.abort_to(entry_depth);
                    return Err(overflow);
                }
                return Ok(());
            }
            if let Some(frame) = self.frames.pop() {
                self.stack.truncate(frame.stack_base);
            }
            self.sync_floor();
        }
        Err(VmFault::Exception(exception))
    }

    fn abort_to(&mut self, entry_depth: usize) {
        if let Some(frame) = self.frames.truncate(entry_depth) {
            self.stack.truncate(frame.stack_base);
        }
        self.sync_floor();
    }

    /// The script value a catchable fault throws
    pub fn materialize(&self, fault: VmFault) -> Value {
        match fault {
            VmFault::Exception(value) => value,
            other => match other.error_parts() {
                Some((kind, message)) => Value::Object(self.realm.new_error(kind, &message)),
                None => Value::string(other.to_string()),
            },
        }
    }
}

impl CallContext for Dispatcher {
    fn global(&self) -> ObjectRef {
        self.realm.global().clone()
    }

    fn new_object(&self) -> ObjectRef {
        self.realm.new_object()
    }

    fn new_array(&self, elements: Vec<Value>) -> ObjectRef {
        self.realm.new_array(elements)
    }

    fn new_error(&self, kind: ErrorKind, message: &str) -> Value {
        Value::Object(self.realm.new_error(kind, message))
    }

    fn new_function(&self, callable: Rc<dyn Callable>) -> ObjectRef {
        self.realm.new_function(callable)
    }

    fn call(&mut self, callee: &Value, this: Value, args: Vec<Value>) -> Result<Value, VmFault> {
        self.call_value(callee, this, args)
    }
}

fn atom(function: &FunctionBytecode, index: usize) -> Result<&str, VmFault> {
    function.atom(index).ok_or(VmFault::InvalidAtom { index })
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Symbol(s) => s.to_string(),
        Value::Object(obj) if obj.is_array() => "array".to_string(),
        Value::Object(obj) => match obj.callable() {
            Some(callable) if !callable.name().is_empty() => callable.name().to_string(),
            Some(_) => "anonymous".to_string(),
            None => "object".to_string(),
        },
        other => other.to_string(),
    }
}

fn callable_of(value: &Value) -> Result<Rc<dyn Callable>, VmFault> {
    value
        .as_object()
        .and_then(ObjectRef::callable)
        .ok_or_else(|| VmFault::NotCallable(describe(value)))
}

fn construct_result(value: Value, this: ObjectRef) -> Value {
    match value {
        Value::Object(_) => value,
        _ => Value::Object(this),
    }
}

fn get_property(target: &Value, key: &PropertyKey) -> Result<Value, VmFault> {
    match target {
        Value::Object(obj) => Ok(obj.get(key)),
        Value::Undefined | Value::Null => Err(VmFault::type_error(format!(
            "Cannot read properties of {} (reading '{}')",
            target, key
        ))),
        Value::String(s) => Ok(match key {
            PropertyKey::String(name) if &**name == "length" => {
                Value::Number(s.encode_utf16().count() as f64)
            }
            PropertyKey::Index(i) => s
                .encode_utf16()
                .nth(*i as usize)
                .map_or(Value::Undefined, |unit| {
                    Value::string(String::from_utf16_lossy(&[unit]))
                }),
            _ => Value::Undefined,
        }),
        _ => Ok(Value::Undefined),
    }
}

fn set_property(target: &Value, key: PropertyKey, value: Value) -> Result<(), VmFault> {
    match target {
        Value::Object(obj) => {
            obj.set(key, value);
            Ok(())
        }
        Value::Undefined | Value::Null => Err(VmFault::type_error(format!(
            "Cannot set properties of {} (setting '{}')",
            target, key
        ))),
        _ => Ok(()),
    }
}

fn instance_of(value: &Value, ctor: &Value) -> Result<bool, VmFault> {
    let mut ctor = ctor
        .as_object()
        .filter(|obj| obj.is_callable())
        .cloned()
        .ok_or_else(|| VmFault::type_error("Right-hand side of 'instanceof' is not callable"))?;
    while let Some(target) = ctor.callable().and_then(|c| c.bound_target().cloned()) {
        ctor = target;
    }
    let obj = match value {
        Value::Object(obj) => obj,
        _ => return Ok(false),
    };
    match ctor.get_named("prototype") {
        Value::Object(proto) => Ok(obj.inherits_from(&proto)),
        other => Err(VmFault::type_error(format!(
            "Function has non-object prototype '{}' in instanceof check",
            other
        ))),
    }
}
