//! Integration tests for interpreter
//!
//! Tests the interaction between the bytecode format, the VM and host code

use std::sync::Arc;
use std::thread;

use bytecode_system::{FunctionBuilder, FunctionBytecode, Opcode};
use core_types::convert::to_number;
use core_types::Value;
use interpreter::VM;

/// function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
fn create_fib_program(n: f64) -> FunctionBytecode {
    let mut fib = FunctionBuilder::new("fib");
    fib.params(1);
    let recurse = fib.new_label();
    fib.emit_index(Opcode::GetLoc, 0)
        .push_number(2.0)
        .emit(Opcode::Lt)
        .emit_jump(Opcode::IfFalse, recurse);
    fib.emit_index(Opcode::GetLoc, 0).emit(Opcode::Return);
    fib.bind(recurse);
    fib.emit_atom(Opcode::GetVar, "fib")
        .emit_index(Opcode::GetLoc, 0)
        .push_number(1.0)
        .emit(Opcode::Sub)
        .emit_index(Opcode::Call, 1);
    fib.emit_atom(Opcode::GetVar, "fib")
        .emit_index(Opcode::GetLoc, 0)
        .push_number(2.0)
        .emit(Opcode::Sub)
        .emit_index(Opcode::Call, 1);
    fib.emit(Opcode::Add).emit(Opcode::Return);

    let mut main = FunctionBuilder::new("main");
    main.closure(fib.build().unwrap())
        .emit_atom(Opcode::PutVar, "fib")
        .emit_atom(Opcode::GetVar, "fib")
        .push_number(n)
        .emit_index(Opcode::Call, 1)
        .emit(Opcode::Return);
    main.build().unwrap()
}

#[test]
fn test_vm_complex_arithmetic() {
    // (10 + 5) * 3 - 2 = 43
    let mut b = FunctionBuilder::new("main");
    b.push_number(10.0)
        .push_number(5.0)
        .emit(Opcode::Add)
        .push_number(3.0)
        .emit(Opcode::Mul)
        .push_number(2.0)
        .emit(Opcode::Sub)
        .emit(Opcode::Return);

    let mut vm = VM::new();
    let result = vm.execute(Arc::new(b.build().unwrap()), Value::Undefined, vec![]);
    assert_eq!(result.unwrap(), Value::from(43));
}

#[test]
fn test_serialized_program_runs() {
    let bytes = create_fib_program(15.0).to_bytes();
    let function = VM::load(&bytes).unwrap();

    let mut vm = VM::new();
    let result = vm.execute(function, Value::Undefined, vec![]).unwrap();
    assert_eq!(result, Value::from(610));
}

#[test]
fn test_serialized_handlers_and_captures_survive() {
    let mut inner = FunctionBuilder::new("inner");
    let v = inner.capture(true, 0) as u32;
    inner.emit_index(Opcode::GetVarRef, v).emit(Opcode::Throw);

    let mut b = FunctionBuilder::new("main");
    b.locals(1);
    b.push_string("captured").emit_index(Opcode::PutLoc, 0);
    let start = b.here();
    b.closure(inner.build().unwrap()).emit_index(Opcode::Call, 0);
    let end = b.here();
    b.emit(Opcode::Return);
    let handler = b.here();
    b.emit(Opcode::Return);
    b.add_handler(start, end, handler, 0);

    let bytes = b.build().unwrap().to_bytes();
    let mut vm = VM::new();
    let result = vm
        .execute(VM::load(&bytes).unwrap(), Value::Undefined, vec![])
        .unwrap();
    assert_eq!(result, Value::from("captured"));
}

#[test]
fn test_disassembly_lists_nested_functions() {
    let listing = create_fib_program(3.0).disassemble();
    assert!(listing.contains("function main (params: 0, locals: 0, captures: 0)"));
    assert!(listing.contains("  function fib (params: 1, locals: 0, captures: 0)"));
    assert!(listing.contains("get_var"));
    assert!(listing.contains("\"fib\""));
    assert!(listing.contains("if_false"));
}

#[test]
fn test_shared_bytecode_across_threads() {
    let program = Arc::new(create_fib_program(12.0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let program = Arc::clone(&program);
            thread::spawn(move || {
                let mut vm = VM::new();
                let result = vm.execute(program, Value::Undefined, vec![]).unwrap();
                to_number(&result)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 144.0);
    }
}

#[test]
fn test_independent_vms_do_not_share_globals() {
    let mut b = FunctionBuilder::new("main");
    b.push_number(1.0).emit_atom(Opcode::PutVar, "flag");
    let program = Arc::new(b.build().unwrap());

    let mut first = VM::new();
    let second = VM::new();
    first
        .execute(Arc::clone(&program), Value::Undefined, vec![])
        .unwrap();

    assert_eq!(first.get_global("flag"), Some(Value::from(1)));
    assert!(second.get_global("flag").is_none());
}

#[test]
fn test_host_and_script_interleave() {
    // script -> native -> script -> native
    let mut vm = VM::new();
    vm.define_native("hostAdd", |cx, _this, args| {
        let callback = cx.global().get_named("scriptDouble");
        let sum = to_number(&args[0]) + to_number(&args[1]);
        cx.call(&callback, Value::Undefined, vec![Value::from(sum)])
    });
    vm.define_native("hostLog", |_cx, _this, args| Ok(args[0].clone()));

    let mut double = FunctionBuilder::new("scriptDouble");
    double.params(1);
    double
        .emit_atom(Opcode::GetVar, "hostLog")
        .emit_index(Opcode::GetLoc, 0)
        .push_number(2.0)
        .emit(Opcode::Mul)
        .emit_index(Opcode::Call, 1)
        .emit(Opcode::Return);

    let mut b = FunctionBuilder::new("main");
    b.closure(double.build().unwrap())
        .emit_atom(Opcode::PutVar, "scriptDouble")
        .emit_atom(Opcode::GetVar, "hostAdd")
        .push_number(4.0)
        .push_number(5.0)
        .emit_index(Opcode::Call, 2)
        .emit(Opcode::Return);

    let result = vm
        .execute(Arc::new(b.build().unwrap()), Value::Undefined, vec![])
        .unwrap();
    assert_eq!(result, Value::from(18));
    assert_eq!((vm.stack_depth(), vm.frame_depth()), (0, 0));
}

#[test]
fn test_exception_through_native_reaches_script_handler() {
    // script handler <- native <- script throw
    let mut vm = VM::new();
    vm.define_native("invoke", |cx, _this, args| {
        cx.call(&args[0], Value::Undefined, vec![])
    });

    let mut thrower = FunctionBuilder::new("thrower");
    thrower.push_string("deep").emit(Opcode::Throw);

    let mut b = FunctionBuilder::new("main");
    let start = b.here();
    b.emit_atom(Opcode::GetVar, "invoke")
        .closure(thrower.build().unwrap())
        .emit_index(Opcode::Call, 1)
        .emit(Opcode::Return);
    let end = b.here();
    let handler = b.here();
    b.push_string("caught ").emit(Opcode::Swap).emit(Opcode::Add).emit(Opcode::Return);
    b.add_handler(start, end, handler, 0);

    let result = vm
        .execute(Arc::new(b.build().unwrap()), Value::Undefined, vec![])
        .unwrap();
    assert_eq!(result, Value::from("caught deep"));
    assert_eq!((vm.stack_depth(), vm.frame_depth()), (0, 0));
}
