//! Bytecode to Interpreter Integration Tests
//!
//! Tests the integration between bytecode_system and interpreter components.
//! Every program here goes through the binary chunk format before it runs.

use bytecode_system::{Constant, FunctionBuilder, Opcode};
use core_types::{Value, VmFault};
use integration_tests::serialized;
use interpreter::VM;
use num_bigint::BigInt;

fn run(b: FunctionBuilder) -> Result<Value, VmFault> {
    let mut vm = VM::new();
    vm.execute(serialized(b).unwrap(), Value::Undefined, vec![])
}

fn push_bigint(b: &mut FunctionBuilder, n: i64) {
    let index = b.add_constant(Constant::BigInt(BigInt::from(n)));
    b.emit_index(Opcode::PushConst, index);
}

/// Test: constants of every kind survive serialization
#[test]
fn test_constant_pool_kinds() {
    let mut b = FunctionBuilder::new("main");
    let c = b.add_constant(Constant::Null);
    b.emit_index(Opcode::PushConst, c);
    let c = b.add_constant(Constant::Boolean(true));
    b.emit_index(Opcode::PushConst, c);
    let c = b.add_constant(Constant::Number(2.5));
    b.emit_index(Opcode::PushConst, c);
    let c = b.add_constant(Constant::String("str".to_string()));
    b.emit_index(Opcode::PushConst, c);
    push_bigint(&mut b, -9);
    b.emit_index(Opcode::ArrayFrom, 5)
        .push_string("")
        .emit(Opcode::Add)
        .emit(Opcode::Return);

    assert_eq!(run(b).unwrap(), Value::from(",true,2.5,str,-9"));
}

/// Test: BigInt arithmetic stays exact
#[test]
fn test_bigint_arithmetic() {
    // 2n ** 100n
    let mut b = FunctionBuilder::new("main");
    push_bigint(&mut b, 2);
    push_bigint(&mut b, 100);
    b.emit(Opcode::Pow).emit(Opcode::Return);

    let expected = BigInt::from(1u8) << 100usize;
    assert_eq!(run(b).unwrap(), Value::BigInt(expected));
}

/// Test: BigInt and Number do not mix
#[test]
fn test_bigint_number_mix_is_type_error() {
    let mut b = FunctionBuilder::new("main");
    push_bigint(&mut b, 1);
    b.push_number(1.0).emit(Opcode::Add).emit(Opcode::Return);

    match run(b).unwrap_err() {
        VmFault::Exception(Value::Object(err)) => {
            assert_eq!(err.get_named("name"), Value::from("TypeError"));
        }
        other => panic!("Expected TypeError, got {:?}", other),
    }
}

/// Test: BigInt compares with Number by value
#[test]
fn test_bigint_comparison() {
    let mut b = FunctionBuilder::new("main");
    push_bigint(&mut b, 10);
    b.push_number(10.0).emit(Opcode::Eq);
    push_bigint(&mut b, 10);
    b.push_number(10.0).emit(Opcode::StrictEq);
    push_bigint(&mut b, 3);
    b.push_number(3.5).emit(Opcode::Lt);
    push_bigint(&mut b, 0);
    b.emit(Opcode::TypeOf);
    b.emit_index(Opcode::ArrayFrom, 4)
        .push_string("")
        .emit(Opcode::Add)
        .emit(Opcode::Return);

    assert_eq!(run(b).unwrap(), Value::from("true,false,true,bigint"));
}

/// Test: BigInt division by zero is a RangeError
#[test]
fn test_bigint_division_by_zero() {
    let mut b = FunctionBuilder::new("main");
    push_bigint(&mut b, 1);
    push_bigint(&mut b, 0);
    b.emit(Opcode::Div).emit(Opcode::Return);

    match run(b).unwrap_err() {
        VmFault::Exception(Value::Object(err)) => {
            assert_eq!(err.get_named("name"), Value::from("RangeError"));
            assert_eq!(err.get_named("message"), Value::from("Division by zero"));
        }
        other => panic!("Expected RangeError, got {:?}", other),
    }
}

/// Test: a closure outlives the frame that created it
#[test]
fn test_escaping_closure_keeps_captured_state() {
    // function make(start) { return () => start++; }
    let mut next = FunctionBuilder::new("next");
    let start = next.capture(true, 0) as u32;
    next.emit_index(Opcode::GetVarRef, start)
        .emit(Opcode::Dup)
        .emit(Opcode::Inc)
        .emit_index(Opcode::PutVarRef, start)
        .emit(Opcode::Return);

    let mut make = FunctionBuilder::new("make");
    make.params(1);
    make.closure(next.build().unwrap()).emit(Opcode::Return);

    let mut vm = VM::new();
    let mut b = FunctionBuilder::new("main");
    b.closure(make.build().unwrap())
        .push_number(100.0)
        .emit_index(Opcode::Call, 1)
        .emit(Opcode::Return);
    let counter = vm
        .execute(serialized(b).unwrap(), Value::Undefined, vec![])
        .unwrap();

    let first = vm.call(&counter, Value::Undefined, vec![]).unwrap();
    let second = vm.call(&counter, Value::Undefined, vec![]).unwrap();
    assert_eq!(first, Value::from(100));
    assert_eq!(second, Value::from(101));
}

/// Test: two closures from one frame share the same variable
#[test]
fn test_sibling_closures_share_variable() {
    let mut set = FunctionBuilder::new("set");
    set.params(1);
    let x = set.capture(true, 0) as u32;
    set.emit_index(Opcode::GetLoc, 0)
        .emit_index(Opcode::PutVarRef, x)
        .emit(Opcode::ReturnUndef);

    let mut get = FunctionBuilder::new("get");
    let x = get.capture(true, 0) as u32;
    get.emit_index(Opcode::GetVarRef, x).emit(Opcode::Return);

    // let x; return [set, get];
    let mut b = FunctionBuilder::new("main");
    b.locals(1);
    b.closure(set.build().unwrap())
        .closure(get.build().unwrap())
        .emit_index(Opcode::ArrayFrom, 2)
        .emit(Opcode::Return);

    let mut vm = VM::new();
    let pair = vm
        .execute(serialized(b).unwrap(), Value::Undefined, vec![])
        .unwrap();
    let pair = pair.as_object().unwrap();
    let set = pair.get(&0u32.into());
    let get = pair.get(&1u32.into());

    vm.call(&set, Value::Undefined, vec![Value::from("shared")])
        .unwrap();
    assert_eq!(
        vm.call(&get, Value::Undefined, vec![]).unwrap(),
        Value::from("shared")
    );
}

/// Test: corrupted code is reported, not executed
#[test]
fn test_corrupted_code_is_fatal() {
    let mut b = FunctionBuilder::new("main");
    b.push_number(1.0).emit(Opcode::Return);
    let mut bytes = b.build().unwrap().to_bytes();
    let last = bytes.len() - 1;
    bytes.truncate(last);

    assert!(matches!(VM::load(&bytes), Err(VmFault::Malformed(_))));
}
