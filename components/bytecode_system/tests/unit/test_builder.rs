//! Tests for FunctionBuilder

use bytecode_system::{BuildError, FunctionBuilder, Opcode};

#[test]
fn test_short_circuit_jump() {
    // a && b
    let mut b = FunctionBuilder::new("and");
    let done = b.new_label();
    b.emit(Opcode::PushFalse);
    b.emit_jump(Opcode::And, done);
    b.emit(Opcode::PushTrue);
    b.bind(done);
    b.emit(Opcode::Return);
    let f = b.build().unwrap();

    let and = f.decode(1).unwrap();
    assert_eq!(and.branch_target(), Some(7));
}

#[test]
fn test_local_index_overflow() {
    let mut b = FunctionBuilder::new("f");
    b.emit_index(Opcode::GetLoc, 70000);
    assert_eq!(b.build().unwrap_err(), BuildError::TableOverflow("get_loc"));
}

#[test]
fn test_first_error_wins() {
    let mut b = FunctionBuilder::new("f");
    b.emit(Opcode::Goto);
    b.emit_i8(Opcode::Add, 1);
    assert!(matches!(
        b.build(),
        Err(BuildError::OperandMismatch { opcode: "goto", .. })
    ));
}

#[test]
fn test_captures_are_deduplicated() {
    let mut b = FunctionBuilder::new("f");
    assert_eq!(b.capture(true, 2), 0);
    assert_eq!(b.capture(false, 0), 1);
    assert_eq!(b.capture(true, 2), 0);
    assert_eq!(b.build().unwrap().captures.len(), 2);
}
