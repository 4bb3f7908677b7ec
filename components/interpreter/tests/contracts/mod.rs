//! Contract tests for interpreter API
//!
//! These tests pin the observable behavior of the public embedding surface.

use std::sync::Arc;

use bytecode_system::{Constant, FunctionBuilder, FunctionBytecode, Opcode, MAX_FUNCTION_NESTING};
use core_types::{ErrorKind, Value, VmFault};
use interpreter::{VmConfig, VM};

fn function(b: FunctionBuilder) -> Arc<bytecode_system::FunctionBytecode> {
    Arc::new(b.build().unwrap())
}

/// VM::execute() runs bytecode and returns the returned value
#[test]
fn test_vm_execute_contract() {
    let mut vm = VM::new();
    let mut b = FunctionBuilder::new("main");
    b.push_number(42.0).emit(Opcode::Return);

    let result = vm.execute(function(b), Value::Undefined, vec![]);
    assert_eq!(result.unwrap(), Value::from(42));
}

/// Falling off the end of the code returns undefined
#[test]
fn test_vm_implicit_return_contract() {
    let mut vm = VM::new();
    let mut b = FunctionBuilder::new("main");
    b.push_number(1.0);

    let result = vm.execute(function(b), Value::Undefined, vec![]);
    assert_eq!(result.unwrap(), Value::Undefined);
    assert_eq!(vm.stack_depth(), 0);
}

/// The VM is clean after every execution, successful or not
#[test]
fn test_vm_state_reset_contract() {
    let mut vm = VM::new();

    let mut ok = FunctionBuilder::new("ok");
    ok.push_number(1.0).push_number(2.0).emit(Opcode::Return);
    vm.execute(function(ok), Value::Undefined, vec![]).unwrap();
    assert_eq!((vm.stack_depth(), vm.frame_depth()), (0, 0));

    let mut throws = FunctionBuilder::new("throws");
    throws.push_number(1.0).push_number(2.0).emit(Opcode::Throw);
    assert!(vm.execute(function(throws), Value::Undefined, vec![]).is_err());
    assert_eq!((vm.stack_depth(), vm.frame_depth()), (0, 0));

    let mut fatal = FunctionBuilder::new("fatal");
    fatal.push_number(1.0).emit(Opcode::Await);
    assert!(vm.execute(function(fatal), Value::Undefined, vec![]).is_err());
    assert_eq!((vm.stack_depth(), vm.frame_depth()), (0, 0));
}

/// Thrown values cross the boundary unchanged
#[test]
fn test_uncaught_value_contract() {
    let mut vm = VM::new();
    let mut b = FunctionBuilder::new("main");
    b.push_string("payload").emit(Opcode::Throw);

    match vm.execute(function(b), Value::Undefined, vec![]) {
        Err(VmFault::Exception(value)) => assert_eq!(value, Value::from("payload")),
        other => panic!("Expected Exception, got {:?}", other),
    }
}

/// Engine errors reach the embedder as error objects
#[test]
fn test_engine_error_contract() {
    let mut vm = VM::new();
    let mut b = FunctionBuilder::new("main");
    b.emit_atom(Opcode::GetVar, "nope").emit(Opcode::Return);

    let err = vm.execute(function(b), Value::Undefined, vec![]).unwrap_err();
    assert!(!err.is_fatal());
    assert_eq!(
        err.to_string(),
        "Uncaught exception: ReferenceError: nope is not defined"
    );
}

/// Internal faults never produce error objects
#[test]
fn test_fatal_fault_contract() {
    let mut vm = VM::with_config(VmConfig::default().with_max_stack_depth(1));
    let mut b = FunctionBuilder::new("main");
    b.push_number(1.0).push_number(2.0).emit(Opcode::Return);

    let err = vm.execute(function(b), Value::Undefined, vec![]).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.error_parts().is_none());
}

/// VM::call() invokes any callable, including host functions
#[test]
fn test_vm_call_contract() {
    let mut vm = VM::new();
    let echo = vm.native_function("echo", |_cx, this, args| {
        Ok(Value::from(format!("{}:{}", this, args.len())))
    });

    let result = vm.call(&echo, Value::from("t"), vec![Value::Null, Value::Null]);
    assert_eq!(result.unwrap(), Value::from("t:2"));
}

/// VM::call() of a non-callable is a TypeError object
#[test]
fn test_vm_call_non_callable_contract() {
    let mut vm = VM::new();
    let err = vm.call(&Value::Null, Value::Undefined, vec![]).unwrap_err();
    match err {
        VmFault::Exception(Value::Object(obj)) => {
            assert_eq!(obj.get_named("message"), Value::from("null is not a function"));
        }
        other => panic!("Expected TypeError object, got {:?}", other),
    }
}

/// Error objects built by natives carry name and message
#[test]
fn test_native_error_contract() {
    let mut vm = VM::new();
    let fail = vm.native_function("fail", |cx, _this, _args| {
        Err(VmFault::Exception(cx.new_error(ErrorKind::SyntaxError, "bad token")))
    });

    match vm.call(&fail, Value::Undefined, vec![]).unwrap_err() {
        VmFault::Exception(Value::Object(obj)) => {
            assert_eq!(obj.get_named("name"), Value::from("SyntaxError"));
            assert_eq!(obj.get_named("message"), Value::from("bad token"));
            assert_eq!(obj.default_string(), "SyntaxError: bad token");
        }
        other => panic!("Expected SyntaxError object, got {:?}", other),
    }
}

/// Natives may raise engine errors with VmFault::throw
#[test]
fn test_native_throw_contract() {
    let mut vm = VM::new();
    vm.define_native("check", |_cx, _this, args| {
        if args.is_empty() {
            return Err(VmFault::range_error("need an argument"));
        }
        Ok(Value::Undefined)
    });

    let mut b = FunctionBuilder::new("main");
    let start = b.here();
    b.emit_atom(Opcode::GetVar, "check")
        .emit_index(Opcode::Call, 0)
        .emit(Opcode::Return);
    let end = b.here();
    let handler = b.here();
    b.emit_atom(Opcode::GetVar, "RangeError")
        .emit(Opcode::InstanceOf)
        .emit(Opcode::Return);
    b.add_handler(start, end, handler, 0);

    let result = vm.execute(function(b), Value::Undefined, vec![]);
    assert_eq!(result.unwrap(), Value::Boolean(true));
}

/// VM::load() rejects data that is not serialized bytecode
#[test]
fn test_vm_load_contract() {
    assert!(matches!(VM::load(b"nope"), Err(VmFault::Malformed(_))));

    let mut b = FunctionBuilder::new("main");
    b.push_number(7.0).emit(Opcode::Return);
    let bytes = b.build().unwrap().to_bytes();
    let loaded = VM::load(&bytes).unwrap();
    assert_eq!(loaded.name, "main");
}

/// VM::load() refuses nesting deeper than the loader limit instead of
/// exhausting the host stack
#[test]
fn test_vm_load_nesting_contract() {
    let mut function = FunctionBytecode::new("inner");
    for _ in 0..=MAX_FUNCTION_NESTING {
        let mut outer = FunctionBytecode::new("outer");
        outer.constants.push(Constant::Function(Arc::new(function)));
        function = outer;
    }

    match VM::load(&function.to_bytes()) {
        Err(VmFault::Malformed(message)) => assert!(message.contains("nested deeper")),
        other => panic!("Expected Malformed, got {:?}", other),
    }
}

/// Every realm exposes the standard error constructors
#[test]
fn test_error_constructors_contract() {
    let vm = VM::new();
    for name in [
        "Error",
        "TypeError",
        "RangeError",
        "ReferenceError",
        "SyntaxError",
        "EvalError",
        "URIError",
    ] {
        let ctor = vm.get_global(name).unwrap_or_else(|| panic!("{} missing", name));
        let ctor = ctor.as_object().unwrap();
        assert!(ctor.is_callable(), "{} is not callable", name);
        assert!(ctor.get_named("prototype").as_object().is_some());
    }
}
