//! Contract compliance tests for bytecode_system
//! Verifies the reader interface the interpreter depends on

use bytecode_system::{
    BytecodeError, Constant, FunctionBuilder, FunctionBytecode, HandlerRange, Opcode, OperandKind,
};

/// Every instruction is one opcode byte plus a 0/1/2/4 byte operand
#[test]
fn test_contract_operand_widths() {
    for op in Opcode::ALL {
        let width = op.operand_kind().width();
        assert!(matches!(width, 0 | 1 | 2 | 4), "{} has width {}", op, width);
    }
}

/// Branch offsets are relative to the end of the branch instruction
#[test]
fn test_contract_relative_branch_offsets() {
    let mut b = FunctionBuilder::new("f");
    let target = b.new_label();
    b.emit(Opcode::PushTrue);
    b.emit_jump(Opcode::IfTrue, target);
    b.emit(Opcode::PushNull);
    b.bind(target);
    b.emit(Opcode::ReturnUndef);
    let f = b.build().unwrap();

    // if_true at pc 1 ends at pc 6; one push_null follows
    assert_eq!(f.read_i32(2).unwrap(), 1);
}

/// The reader interface exposes opcode, operand readers, pools and length
#[test]
fn test_contract_reader_interface() {
    let mut b = FunctionBuilder::new("f");
    let idx = b.add_constant(Constant::Number(2.5));
    b.emit_index(Opcode::PushConst, idx);
    b.emit_atom(Opcode::PutVar, "x");
    b.emit(Opcode::ReturnUndef);
    let f = b.build().unwrap();

    assert_eq!(f.read_opcode(0).unwrap(), Opcode::PushConst);
    assert_eq!(f.read_u32(1).unwrap(), 0);
    assert_eq!(f.constants()[0], Constant::Number(2.5));
    assert_eq!(f.atoms()[0], "x");
    assert_eq!(f.len(), 11);
}

/// Unknown bytes are reported as invalid opcodes, never panics
#[test]
fn test_contract_invalid_opcode() {
    let mut f = FunctionBytecode::new("bad");
    f.code = vec![0xee];
    assert_eq!(
        f.read_opcode(0),
        Err(BytecodeError::InvalidOpcode { opcode: 0xee, pc: 0 })
    );
}

/// The first covering handler range wins
#[test]
fn test_contract_handler_order() {
    let mut f = FunctionBytecode::new("f");
    f.handlers = vec![
        HandlerRange {
            try_start: 4,
            try_end: 8,
            handler_pc: 20,
            stack_depth: 1,
        },
        HandlerRange {
            try_start: 0,
            try_end: 16,
            handler_pc: 30,
            stack_depth: 0,
        },
    ];
    assert_eq!(f.handler_for(5).map(|h| h.handler_pc), Some(20));
    assert_eq!(f.handler_for(10).map(|h| h.handler_pc), Some(30));
    assert_eq!(f.handler_for(16), None);
}

/// Operands that are local or capture indices are 16-bit
#[test]
fn test_contract_local_operands_are_u16() {
    assert_eq!(OperandKind::Local.width(), 2);
    assert_eq!(OperandKind::VarRef.width(), 2);
    assert_eq!(OperandKind::Argc.width(), 2);
}
