//! Tests for FunctionBytecode

use std::sync::Arc;

use bytecode_system::{
    BytecodeError, CaptureDescriptor, Constant, FunctionBuilder, FunctionBytecode, Opcode,
    MAX_FUNCTION_NESTING,
};
use num_bigint::BigInt;

fn add_function() -> FunctionBytecode {
    let mut b = FunctionBuilder::new("add");
    b.params(2);
    b.emit_index(Opcode::GetLoc, 0)
        .emit_index(Opcode::GetLoc, 1)
        .emit(Opcode::Add)
        .emit(Opcode::Return);
    b.build().unwrap()
}

#[test]
fn test_chunk_creation() {
    let f = FunctionBytecode::new("empty");
    assert_eq!(f.name, "empty");
    assert!(f.is_empty());
    assert_eq!(f.constants().len(), 0);
    assert_eq!(f.atoms().len(), 0);
}

#[test]
fn test_reader_interface() {
    let f = add_function();
    assert_eq!(f.len(), 8);
    assert_eq!(f.read_opcode(0).unwrap(), Opcode::GetLoc);
    assert_eq!(f.read_u16(4).unwrap(), 1);
    assert_eq!(f.read_opcode(6).unwrap(), Opcode::Add);
    assert!(matches!(f.read_u8(8), Err(BytecodeError::Truncated { pc: 8 })));
}

#[test]
fn test_instruction_iteration() {
    let f = add_function();
    let ops: Vec<Opcode> = f.instructions().map(|i| i.unwrap().opcode).collect();
    assert_eq!(
        ops,
        vec![Opcode::GetLoc, Opcode::GetLoc, Opcode::Add, Opcode::Return]
    );
}

#[test]
fn test_serialization_roundtrip_with_nested_function() {
    let mut inner = FunctionBuilder::new("inner");
    inner.capture(true, 0);
    inner.emit_index(Opcode::GetVarRef, 0).emit(Opcode::Return);

    let mut outer = FunctionBuilder::new("outer");
    outer.locals(1);
    outer.add_constant(Constant::BigInt(BigInt::from(1u64) << 80));
    outer.add_constant(Constant::String("héllo".into()));
    outer.closure(inner.build().unwrap());
    outer.emit(Opcode::Return);
    let f = outer.build().unwrap();

    let bytes = f.to_bytes();
    assert_eq!(&bytes[..4], b"BCNK");
    let restored = FunctionBytecode::from_bytes(&bytes).unwrap();
    assert_eq!(restored, f);

    let nested = restored.constant(2).and_then(|c| c.as_function()).unwrap();
    assert_eq!(nested.captures, vec![CaptureDescriptor::new(true, 0)]);
}

#[test]
fn test_from_bytes_rejects_wrong_version() {
    let mut bytes = add_function().to_bytes();
    bytes[4] = 1;
    assert_eq!(
        FunctionBytecode::from_bytes(&bytes),
        Err(BytecodeError::UnsupportedVersion(1))
    );
}

#[test]
fn test_from_bytes_rejects_truncated_data() {
    let bytes = add_function().to_bytes();
    let result = FunctionBytecode::from_bytes(&bytes[..bytes.len() - 3]);
    assert!(matches!(result, Err(BytecodeError::UnexpectedEof { .. })));
}

/// A chain of `levels` function constants below the top-level function
fn nested_functions(levels: usize) -> FunctionBytecode {
    let mut function = FunctionBytecode::new("inner");
    for _ in 0..levels {
        let mut outer = FunctionBytecode::new("outer");
        outer.constants.push(Constant::Function(Arc::new(function)));
        function = outer;
    }
    function
}

#[test]
fn test_from_bytes_accepts_nesting_at_limit() {
    let bytes = nested_functions(MAX_FUNCTION_NESTING).to_bytes();
    assert!(FunctionBytecode::from_bytes(&bytes).is_ok());
}

#[test]
fn test_from_bytes_rejects_deep_nesting() {
    let bytes = nested_functions(MAX_FUNCTION_NESTING + 1).to_bytes();
    assert_eq!(
        FunctionBytecode::from_bytes(&bytes),
        Err(BytecodeError::NestingTooDeep {
            limit: MAX_FUNCTION_NESTING
        })
    );
}

#[test]
fn test_disassemble_lists_instructions_and_atoms() {
    let mut b = FunctionBuilder::new("main");
    b.emit_atom(Opcode::GetVar, "print")
        .push_string("hi")
        .emit_index(Opcode::Call, 1)
        .emit(Opcode::Return);
    let text = b.build().unwrap().disassemble();

    assert!(text.starts_with("function main"));
    assert!(text.contains("get_var 0 ; \"print\""));
    assert!(text.contains("push_atom 1 ; \"hi\""));
    assert!(text.contains("call 1"));
}
