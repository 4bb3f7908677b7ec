//! Tests for instruction decoding

use bytecode_system::{FunctionBuilder, Opcode, Operand};

#[test]
fn test_decode_signed_immediates() {
    let mut b = FunctionBuilder::new("f");
    b.emit_i8(Opcode::PushI8, -128);
    b.emit_i32(Opcode::PushI32, -70000);
    let f = b.build().unwrap();

    let first = f.decode(0).unwrap();
    assert_eq!(first.operand, Operand::Int(-128));
    let second = f.decode(first.next_pc()).unwrap();
    assert_eq!(second.int(), -70000);
}

#[test]
fn test_decode_index_operands() {
    let mut b = FunctionBuilder::new("f");
    b.emit_index(Opcode::GetLoc, 513);
    b.emit_atom(Opcode::GetVar, "x");
    let f = b.build().unwrap();

    let get_loc = f.decode(0).unwrap();
    assert_eq!(get_loc.index(), 513);
    assert_eq!(get_loc.next_pc(), 3);
    let get_var = f.decode(3).unwrap();
    assert_eq!(get_var.opcode, Opcode::GetVar);
    assert_eq!(f.atom(get_var.index()), Some("x"));
}

#[test]
fn test_decode_truncated_operand() {
    let mut b = FunctionBuilder::new("f");
    b.emit_index(Opcode::GetLoc, 1);
    let mut f = b.build().unwrap();
    f.code.pop();
    assert!(f.decode(0).is_err());
}

#[test]
fn test_instruction_display_for_branch() {
    let mut b = FunctionBuilder::new("f");
    let end = b.new_label();
    b.emit_jump(Opcode::Goto, end);
    b.emit(Opcode::Nop);
    b.bind(end);
    let f = b.build().unwrap();
    assert_eq!(f.decode(0).unwrap().to_string(), "0000: goto +1 -> 0006");
}
