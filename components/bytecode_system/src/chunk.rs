//! Compiled function bytecode
//!
//! Contains the instruction bytes, constants, atoms and the metadata the
//! interpreter needs to build a frame: parameter and local counts, the
//! protected-range table and the capture descriptors.

use std::fmt::Write as _;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::error::BytecodeError;
use crate::instruction::{Instruction, Operand};
use crate::opcode::{Opcode, OperandKind};
use crate::value::Constant;

const MAGIC: &[u8; 4] = b"BCNK";
const VERSION: u8 = 2;

/// Deepest chain of nested function constants a serialized chunk may hold
pub const MAX_FUNCTION_NESTING: usize = 256;

/// A protected range of a function's code
///
/// While the instruction at `pc` satisfies `try_start <= pc < try_end`, an
/// exception raised there transfers control to `handler_pc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerRange {
    /// First covered instruction
    pub try_start: u32,
    /// One past the last covered instruction
    pub try_end: u32,
    /// Where the handler starts; the exception value is on top of the stack
    pub handler_pc: u32,
    /// Operand-stack depth, relative to the frame base, restored on entry
    pub stack_depth: u16,
}

impl HandlerRange {
    /// Whether `pc` lies inside the protected range
    pub fn covers(&self, pc: usize) -> bool {
        (self.try_start as usize) <= pc && pc < (self.try_end as usize)
    }
}

/// Descriptor for a captured variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureDescriptor {
    /// true if the variable is a local of the creating frame, false if it is
    /// one of the creating frame's own captures
    pub is_local: bool,
    /// Local index (if local) or capture index (if not)
    pub index: u16,
}

impl CaptureDescriptor {
    /// Create a new capture descriptor
    pub fn new(is_local: bool, index: u16) -> Self {
        Self { is_local, index }
    }
}

/// Immutable bytecode of one function
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionBytecode {
    /// Function name, empty for anonymous functions and scripts
    pub name: String,
    /// Encoded instructions
    pub code: Vec<u8>,
    /// Constant pool
    pub constants: Vec<Constant>,
    /// Interned strings referenced by index
    pub atoms: Vec<String>,
    /// Number of declared parameters
    pub param_count: u16,
    /// Size of the locals array, parameters included
    pub local_count: u16,
    /// Protected ranges, innermost first
    pub handlers: Vec<HandlerRange>,
    /// Variables captured when a closure over this function is created
    pub captures: Vec<CaptureDescriptor>,
}

impl FunctionBytecode {
    /// Create a new empty function
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Length of the code in bytes
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Whether the function has no code
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Constant pool
    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Atom table
    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    /// Look up a constant by index
    pub fn constant(&self, index: usize) -> Option<&Constant> {
        self.constants.get(index)
    }

    /// Look up an atom by index
    pub fn atom(&self, index: usize) -> Option<&str> {
        self.atoms.get(index).map(String::as_str)
    }

    /// Read the opcode at `pc`
    pub fn read_opcode(&self, pc: usize) -> Result<Opcode, BytecodeError> {
        let byte = self.read_u8(pc)?;
        Opcode::from_u8(byte).ok_or(BytecodeError::InvalidOpcode { opcode: byte, pc })
    }

    /// Read one byte at `pc`
    pub fn read_u8(&self, pc: usize) -> Result<u8, BytecodeError> {
        self.code
            .get(pc)
            .copied()
            .ok_or(BytecodeError::Truncated { pc })
    }

    /// Read a little-endian u16 at `pc`
    pub fn read_u16(&self, pc: usize) -> Result<u16, BytecodeError> {
        Ok(u16::from_le_bytes(self.read_array(pc)?))
    }

    /// Read a little-endian u32 at `pc`
    pub fn read_u32(&self, pc: usize) -> Result<u32, BytecodeError> {
        Ok(u32::from_le_bytes(self.read_array(pc)?))
    }

    /// Read a little-endian i32 at `pc`
    pub fn read_i32(&self, pc: usize) -> Result<i32, BytecodeError> {
        Ok(i32::from_le_bytes(self.read_array(pc)?))
    }

    fn read_array<const N: usize>(&self, pc: usize) -> Result<[u8; N], BytecodeError> {
        let end = pc.checked_add(N).ok_or(BytecodeError::Truncated { pc })?;
        self.code
            .get(pc..end)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(BytecodeError::Truncated { pc })
    }

    /// Decode the instruction starting at `pc`
    pub fn decode(&self, pc: usize) -> Result<Instruction, BytecodeError> {
        let opcode = self.read_opcode(pc)?;
        let at = pc + 1;
        let operand = match opcode.operand_kind() {
            OperandKind::None => Operand::None,
            OperandKind::I8 => Operand::Int(self.read_u8(at)? as i8 as i32),
            OperandKind::I32 => Operand::Int(self.read_i32(at)?),
            OperandKind::Const | OperandKind::Atom => Operand::Index(self.read_u32(at)?),
            OperandKind::Local | OperandKind::VarRef | OperandKind::Argc | OperandKind::Count => {
                Operand::Index(self.read_u16(at)? as u32)
            }
            OperandKind::Label => Operand::Offset(self.read_i32(at)?),
        };
        Ok(Instruction { pc, opcode, operand })
    }

    /// Iterate over the decoded instructions in order
    ///
    /// Iteration stops after the first decode error, which is yielded.
    pub fn instructions(&self) -> impl Iterator<Item = Result<Instruction, BytecodeError>> + '_ {
        let mut pc = 0;
        let mut failed = false;
        std::iter::from_fn(move || {
            if failed || pc >= self.code.len() {
                return None;
            }
            let decoded = self.decode(pc);
            match &decoded {
                Ok(inst) => pc = inst.next_pc(),
                Err(_) => failed = true,
            }
            Some(decoded)
        })
    }

    /// First protected range covering `pc`
    pub fn handler_for(&self, pc: usize) -> Option<&HandlerRange> {
        self.handlers.iter().find(|range| range.covers(pc))
    }

    /// Human-readable listing of the function and its nested functions
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        self.disassemble_into(&mut out, 0);
        out
    }

    fn disassemble_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let name = if self.name.is_empty() {
            "<anonymous>"
        } else {
            self.name.as_str()
        };
        let _ = writeln!(
            out,
            "{}function {} (params: {}, locals: {}, captures: {})",
            indent,
            name,
            self.param_count,
            self.local_count,
            self.captures.len()
        );
        for inst in self.instructions() {
            match inst {
                Ok(inst) => {
                    let _ = write!(out, "{}  {}", indent, inst);
                    match (inst.opcode.operand_kind(), inst.operand) {
                        (OperandKind::Atom, Operand::Index(i)) => {
                            if let Some(atom) = self.atom(i as usize) {
                                let _ = write!(out, " ; {:?}", atom);
                            }
                        }
                        (OperandKind::Const, Operand::Index(i)) => {
                            if let Some(constant) = self.constant(i as usize) {
                                let _ = write!(out, " ; {}", constant);
                            }
                        }
                        _ => {}
                    }
                    out.push('\n');
                }
                Err(e) => {
                    let _ = writeln!(out, "{}  <{}>", indent, e);
                }
            }
        }
        for range in &self.handlers {
            let _ = writeln!(
                out,
                "{}  handler [{:04}, {:04}) -> {:04} depth {}",
                indent, range.try_start, range.try_end, range.handler_pc, range.stack_depth
            );
        }
        for constant in &self.constants {
            if let Constant::Function(nested) = constant {
                nested.disassemble_into(out, depth + 1);
            }
        }
    }

    /// Serialize to the binary chunk format
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.push(VERSION);
        self.encode_into(&mut bytes);
        bytes
    }

    /// Deserialize from the binary chunk format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BytecodeError> {
        let mut reader = ByteReader { bytes, offset: 0 };
        if reader.take(MAGIC.len())? != MAGIC {
            return Err(BytecodeError::BadMagic);
        }
        let version = reader.u8()?;
        if version != VERSION {
            return Err(BytecodeError::UnsupportedVersion(version));
        }
        Self::decode_from(&mut reader, 0)
    }

    fn encode_into(&self, bytes: &mut Vec<u8>) {
        put_str(bytes, &self.name);
        bytes.extend_from_slice(&self.param_count.to_le_bytes());
        bytes.extend_from_slice(&self.local_count.to_le_bytes());

        bytes.extend_from_slice(&(self.code.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&self.code);

        bytes.extend_from_slice(&(self.constants.len() as u32).to_le_bytes());
        for constant in &self.constants {
            encode_constant(constant, bytes);
        }

        bytes.extend_from_slice(&(self.atoms.len() as u32).to_le_bytes());
        for atom in &self.atoms {
            put_str(bytes, atom);
        }

        bytes.extend_from_slice(&(self.handlers.len() as u32).to_le_bytes());
        for range in &self.handlers {
            bytes.extend_from_slice(&range.try_start.to_le_bytes());
            bytes.extend_from_slice(&range.try_end.to_le_bytes());
            bytes.extend_from_slice(&range.handler_pc.to_le_bytes());
            bytes.extend_from_slice(&range.stack_depth.to_le_bytes());
        }

        bytes.extend_from_slice(&(self.captures.len() as u32).to_le_bytes());
        for capture in &self.captures {
            bytes.push(u8::from(capture.is_local));
            bytes.extend_from_slice(&capture.index.to_le_bytes());
        }
    }

    fn decode_from(reader: &mut ByteReader<'_>, depth: usize) -> Result<Self, BytecodeError> {
        let name = reader.string()?;
        let param_count = reader.u16()?;
        let local_count = reader.u16()?;

        let code_len = reader.u32()? as usize;
        let code = reader.take(code_len)?.to_vec();

        let const_count = reader.u32()? as usize;
        let mut constants = Vec::with_capacity(const_count.min(1024));
        for _ in 0..const_count {
            constants.push(decode_constant(reader, depth)?);
        }

        let atom_count = reader.u32()? as usize;
        let mut atoms = Vec::with_capacity(atom_count.min(1024));
        for _ in 0..atom_count {
            atoms.push(reader.string()?);
        }

        let handler_count = reader.u32()? as usize;
        let mut handlers = Vec::with_capacity(handler_count.min(1024));
        for _ in 0..handler_count {
            handlers.push(HandlerRange {
                try_start: reader.u32()?,
                try_end: reader.u32()?,
                handler_pc: reader.u32()?,
                stack_depth: reader.u16()?,
            });
        }

        let capture_count = reader.u32()? as usize;
        let mut captures = Vec::with_capacity(capture_count.min(1024));
        for _ in 0..capture_count {
            let is_local = reader.u8()? != 0;
            let index = reader.u16()?;
            captures.push(CaptureDescriptor::new(is_local, index));
        }

        Ok(Self {
            name,
            code,
            constants,
            atoms,
            param_count,
            local_count,
            handlers,
            captures,
        })
    }
}

fn put_str(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u32).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
}

fn encode_constant(constant: &Constant, bytes: &mut Vec<u8>) {
    match constant {
        Constant::Undefined => bytes.push(0),
        Constant::Null => bytes.push(1),
        Constant::Boolean(b) => {
            bytes.push(2);
            bytes.push(u8::from(*b));
        }
        Constant::Number(n) => {
            bytes.push(3);
            bytes.extend_from_slice(&n.to_le_bytes());
        }
        Constant::String(s) => {
            bytes.push(4);
            put_str(bytes, s);
        }
        Constant::BigInt(n) => {
            bytes.push(5);
            put_str(bytes, &n.to_string());
        }
        Constant::Function(f) => {
            bytes.push(6);
            f.encode_into(bytes);
        }
    }
}

fn decode_constant(reader: &mut ByteReader<'_>, depth: usize) -> Result<Constant, BytecodeError> {
    let tag = reader.u8()?;
    match tag {
        0 => Ok(Constant::Undefined),
        1 => Ok(Constant::Null),
        2 => Ok(Constant::Boolean(reader.u8()? != 0)),
        3 => Ok(Constant::Number(f64::from_le_bytes(reader.array()?))),
        4 => Ok(Constant::String(reader.string()?)),
        5 => {
            let digits = reader.string()?;
            digits
                .parse::<BigInt>()
                .map(Constant::BigInt)
                .map_err(|_| BytecodeError::InvalidBigInt(digits))
        }
        6 => {
            if depth >= MAX_FUNCTION_NESTING {
                return Err(BytecodeError::NestingTooDeep {
                    limit: MAX_FUNCTION_NESTING,
                });
            }
            let nested = FunctionBytecode::decode_from(reader, depth + 1)?;
            Ok(Constant::Function(Arc::new(nested)))
        }
        _ => Err(BytecodeError::UnknownConstantTag(tag)),
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], BytecodeError> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(BytecodeError::UnexpectedEof { offset: self.offset })?;
        let slice = self
            .bytes
            .get(self.offset..end)
            .ok_or(BytecodeError::UnexpectedEof { offset: self.offset })?;
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], BytecodeError> {
        let offset = self.offset;
        self.take(N)?
            .try_into()
            .map_err(|_| BytecodeError::UnexpectedEof { offset })
    }

    fn u8(&mut self) -> Result<u8, BytecodeError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, BytecodeError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, BytecodeError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn string(&mut self) -> Result<String, BytecodeError> {
        let len = self.u32()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| BytecodeError::InvalidUtf8)
    }
}
