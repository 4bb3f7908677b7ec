//! Bytecode opcodes for the stack VM
//!
//! Every instruction is one opcode byte followed by a fixed-width operand.
//! The operand width is a property of the opcode alone, so a decoder never
//! needs more than the opcode byte to find the next instruction.

use std::fmt;

/// Shape of the operand that follows an opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// No operand
    None,
    /// Signed 8-bit immediate
    I8,
    /// Signed 32-bit immediate
    I32,
    /// Index into the constant pool (u32)
    Const,
    /// Index into the atom table (u32)
    Atom,
    /// Index into the frame's locals (u16)
    Local,
    /// Index into the frame's captured variables (u16)
    VarRef,
    /// Argument count of a call (u16)
    Argc,
    /// Element count (u16)
    Count,
    /// Signed 32-bit branch offset, relative to the next instruction
    Label,
}

impl OperandKind {
    /// Width of the operand in bytes
    pub const fn width(self) -> usize {
        match self {
            OperandKind::None => 0,
            OperandKind::I8 => 1,
            OperandKind::Local | OperandKind::VarRef | OperandKind::Argc | OperandKind::Count => 2,
            OperandKind::I32 | OperandKind::Const | OperandKind::Atom | OperandKind::Label => 4,
        }
    }
}

macro_rules! opcodes {
    ($( $(#[$doc:meta])* $name:ident = $byte:literal, $mnemonic:literal, $kind:ident; )*) => {
        /// Bytecode opcodes
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $( $(#[$doc])* $name = $byte, )*
        }

        impl Opcode {
            /// Decode an opcode byte; `None` for bytes outside the instruction set
            pub const fn from_u8(byte: u8) -> Option<Opcode> {
                match byte {
                    $( $byte => Some(Opcode::$name), )*
                    _ => None,
                }
            }

            /// Lowercase assembler name
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Operand shape carried by this opcode
            pub const fn operand_kind(self) -> OperandKind {
                match self {
                    $( Opcode::$name => OperandKind::$kind, )*
                }
            }

            /// Every opcode, in encoding order
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];
        }
    };
}

opcodes! {
    /// Do nothing
    Nop = 0x00, "nop", None;

    // Constants
    /// Push undefined
    PushUndefined = 0x01, "push_undefined", None;
    /// Push null
    PushNull = 0x02, "push_null", None;
    /// Push true
    PushTrue = 0x03, "push_true", None;
    /// Push false
    PushFalse = 0x04, "push_false", None;
    /// Push the frame's `this` binding
    PushThis = 0x05, "push_this", None;
    /// Push a small integer
    PushI8 = 0x06, "push_i8", I8;
    /// Push a 32-bit integer
    PushI32 = 0x07, "push_i32", I32;
    /// Push a constant-pool entry
    PushConst = 0x08, "push_const", Const;
    /// Push an atom as a string value
    PushAtom = 0x09, "push_atom", Atom;
    /// Create a closure from a function constant, capturing per its descriptors
    FClosure = 0x0a, "fclosure", Const;

    // Stack manipulation
    /// a ->
    Drop = 0x10, "drop", None;
    /// a b -> b
    Nip = 0x11, "nip", None;
    /// a -> a a
    Dup = 0x12, "dup", None;
    /// a b -> a b a b
    Dup2 = 0x13, "dup2", None;
    /// a b -> b a
    Swap = 0x14, "swap", None;
    /// a b c -> b c a
    Rot3L = 0x15, "rot3l", None;

    // Arithmetic
    /// a b -> a + b
    Add = 0x20, "add", None;
    /// a b -> a - b
    Sub = 0x21, "sub", None;
    /// a b -> a * b
    Mul = 0x22, "mul", None;
    /// a b -> a / b
    Div = 0x23, "div", None;
    /// a b -> a % b
    Mod = 0x24, "mod", None;
    /// a b -> a ** b
    Pow = 0x25, "pow", None;
    /// a -> +a
    Plus = 0x26, "plus", None;
    /// a -> -a
    Neg = 0x27, "neg", None;
    /// a -> a + 1
    Inc = 0x28, "inc", None;
    /// a -> a - 1
    Dec = 0x29, "dec", None;

    // Bitwise
    /// a b -> a & b
    BitAnd = 0x30, "and_bits", None;
    /// a b -> a | b
    BitOr = 0x31, "or_bits", None;
    /// a b -> a ^ b
    BitXor = 0x32, "xor", None;
    /// a b -> a << b
    Shl = 0x33, "shl", None;
    /// a b -> a >> b
    Sar = 0x34, "sar", None;
    /// a b -> a >>> b
    Shr = 0x35, "shr", None;
    /// a -> ~a
    BitNot = 0x36, "bit_not", None;
    /// a -> !a
    LNot = 0x37, "lnot", None;

    // Comparison
    /// a b -> a == b
    Eq = 0x40, "eq", None;
    /// a b -> a != b
    Neq = 0x41, "neq", None;
    /// a b -> a === b
    StrictEq = 0x42, "strict_eq", None;
    /// a b -> a !== b
    StrictNeq = 0x43, "strict_neq", None;
    /// a b -> a < b
    Lt = 0x44, "lt", None;
    /// a b -> a <= b
    Lte = 0x45, "lte", None;
    /// a b -> a > b
    Gt = 0x46, "gt", None;
    /// a b -> a >= b
    Gte = 0x47, "gte", None;
    /// a b -> a instanceof b
    InstanceOf = 0x48, "instanceof", None;
    /// key obj -> key in obj
    In = 0x49, "in", None;

    // Short-circuit logic
    /// Keep a falsy top and jump, otherwise pop it and fall through
    And = 0x4a, "and", Label;
    /// Keep a truthy top and jump, otherwise pop it and fall through
    Or = 0x4b, "or", Label;
    /// Keep a non-nullish top and jump, otherwise pop it and fall through
    Nullish = 0x4c, "nullish", Label;

    // Variables
    /// -> global[atom]
    GetVar = 0x50, "get_var", Atom;
    /// v -> (global[atom] = v)
    PutVar = 0x51, "put_var", Atom;
    /// v -> v (global[atom] = v)
    SetVar = 0x52, "set_var", Atom;
    /// -> delete global[atom]
    DeleteVar = 0x53, "delete_var", Atom;
    /// -> locals[idx]
    GetLoc = 0x54, "get_loc", Local;
    /// v -> (locals[idx] = v)
    PutLoc = 0x55, "put_loc", Local;
    /// v -> v (locals[idx] = v)
    SetLoc = 0x56, "set_loc", Local;
    /// -> captures[idx]
    GetVarRef = 0x57, "get_var_ref", VarRef;
    /// v -> (captures[idx] = v)
    PutVarRef = 0x58, "put_var_ref", VarRef;
    /// v -> v (captures[idx] = v)
    SetVarRef = 0x59, "set_var_ref", VarRef;

    // Objects and properties
    /// -> {}
    Object = 0x60, "object", None;
    /// e0 .. eN-1 -> [e0 .. eN-1]
    ArrayFrom = 0x61, "array_from", Count;
    /// obj v -> obj (obj[atom] = v)
    DefineField = 0x62, "define_field", Atom;
    /// obj -> obj[atom]
    GetField = 0x63, "get_field", Atom;
    /// obj -> obj obj[atom]
    GetField2 = 0x64, "get_field2", Atom;
    /// obj v -> (obj[atom] = v)
    PutField = 0x65, "put_field", Atom;
    /// obj key -> obj[key]
    GetArrayEl = 0x66, "get_array_el", None;
    /// obj key v -> (obj[key] = v)
    PutArrayEl = 0x67, "put_array_el", None;
    /// obj key -> delete obj[key]
    Delete = 0x68, "delete", None;
    /// a -> typeof a
    TypeOf = 0x69, "typeof", None;

    // Control flow
    /// c -> ; branch when ToBoolean(c) is false
    IfFalse = 0x70, "if_false", Label;
    /// c -> ; branch when ToBoolean(c) is true
    IfTrue = 0x71, "if_true", Label;
    /// Unconditional branch
    Goto = 0x72, "goto", Label;

    // Calls
    /// f a0 .. aN-1 -> f(a0 .. aN-1)
    Call = 0x78, "call", Argc;
    /// this f a0 .. aN-1 -> this.f(a0 .. aN-1)
    CallMethod = 0x79, "call_method", Argc;
    /// f a0 .. aN-1 -> new f(a0 .. aN-1)
    CallConstructor = 0x7a, "call_constructor", Argc;
    /// v -> ; return v to the caller
    Return = 0x7b, "return", None;
    /// Return undefined to the caller
    ReturnUndef = 0x7c, "return_undef", None;
    /// v -> ; throw v
    Throw = 0x7d, "throw", None;

    // Staged: generator and async suspension
    /// Suspend until a promise settles
    Await = 0x7e, "await", None;
    /// Suspend a generator
    Yield = 0x7f, "yield", None;
}

impl Opcode {
    /// Encoded size of the instruction (opcode byte plus operand)
    pub const fn size(self) -> usize {
        1 + self.operand_kind().width()
    }

    /// Whether the operand is a relative branch offset
    pub fn is_branch(self) -> bool {
        self.operand_kind() == OperandKind::Label
    }

    /// Check if this opcode ends a basic block unconditionally
    pub fn is_unconditional_terminator(self) -> bool {
        matches!(
            self,
            Opcode::Return | Opcode::ReturnUndef | Opcode::Goto | Opcode::Throw
        )
    }

    /// Check if this opcode is a binary arithmetic operation
    pub fn is_binary_arithmetic(self) -> bool {
        matches!(
            self,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod | Opcode::Pow
        )
    }

    /// Opcodes kept in the instruction set but not executed yet
    pub fn is_staged(self) -> bool {
        matches!(self, Opcode::Await | Opcode::Yield)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
