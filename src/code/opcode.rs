//! Opcode definitions for the Monkey instruction set.
//!
//! Every opcode has exactly one [`Definition`] in a static table indexed by
//! the opcode byte. Encoding, decoding and disassembly all read operand
//! layouts from that table, so adding an opcode means adding an enum variant
//! and a table row.

use crate::error::CodeError;

/// Opcodes for the bytecode virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // ============ Constants & Stack ============
    /// Push a constant from the pool: CONSTANT <index:u16>
    Constant = 0,
    /// Pop the top value from the stack
    Pop,
    /// Push true
    True,
    /// Push false
    False,
    /// Push null
    Null,

    // ============ Arithmetic ============
    Add,
    Sub,
    Mul,
    Div,

    // ============ Comparison ============
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,

    // ============ Prefix ============
    /// Negate an integer: -a
    Minus,
    /// Logical not: !a
    Bang,

    // ============ Control Flow ============
    /// Pop and jump if falsy: JUMP_NOT_TRUTHY <target:u16>
    JumpNotTruthy,
    /// Unconditional jump: JUMP <target:u16>
    Jump,

    // ============ Bindings ============
    /// GET_GLOBAL <slot:u16>
    GetGlobal,
    /// SET_GLOBAL <slot:u16>
    SetGlobal,
    /// GET_LOCAL <slot:u8>
    GetLocal,
    /// SET_LOCAL <slot:u8>
    SetLocal,
    /// GET_BUILTIN <index:u8>
    GetBuiltin,
    /// GET_FREE <index:u8>
    GetFree,

    // ============ Collections ============
    /// Build an array from the top N values: ARRAY <count:u16>
    Array,
    /// Build a hash from the top N values (N = 2 * pairs): HASH <count:u16>
    Hash,
    /// obj[index]
    Index,

    // ============ Functions & Calls ============
    /// CALL <arg_count:u8>
    Call,
    /// Return the top of the stack from the current function
    ReturnValue,
    /// Return null from the current function
    Return,
    /// CLOSURE <function_index:u16> <free_count:u8>
    Closure,
    /// Push the closure currently executing
    CurrentClosure,
}

/// How one opcode is named and laid out in the byte stream.
#[derive(Debug, PartialEq, Eq)]
pub struct Definition {
    pub opcode: Opcode,
    pub name: &'static str,
    /// Width in bytes of each operand, in order.
    pub operand_widths: &'static [usize],
}

impl Definition {
    /// Total encoded length: the opcode byte plus all operands.
    pub fn instruction_len(&self) -> usize {
        1 + self.operand_widths.iter().sum::<usize>()
    }
}

macro_rules! definitions {
    ($($op:ident => $name:literal [$($width:literal),*]),* $(,)?) => {
        pub(crate) static DEFINITIONS: &[Definition] = &[
            $(Definition {
                opcode: Opcode::$op,
                name: $name,
                operand_widths: &[$($width),*],
            }),*
        ];
    };
}

// Rows must stay in discriminant order.
definitions! {
    Constant => "OpConstant" [2],
    Pop => "OpPop" [],
    True => "OpTrue" [],
    False => "OpFalse" [],
    Null => "OpNull" [],
    Add => "OpAdd" [],
    Sub => "OpSub" [],
    Mul => "OpMul" [],
    Div => "OpDiv" [],
    Equal => "OpEqual" [],
    NotEqual => "OpNotEqual" [],
    GreaterThan => "OpGreaterThan" [],
    LessThan => "OpLessThan" [],
    Minus => "OpMinus" [],
    Bang => "OpBang" [],
    JumpNotTruthy => "OpJumpNotTruthy" [2],
    Jump => "OpJump" [2],
    GetGlobal => "OpGetGlobal" [2],
    SetGlobal => "OpSetGlobal" [2],
    GetLocal => "OpGetLocal" [1],
    SetLocal => "OpSetLocal" [1],
    GetBuiltin => "OpGetBuiltin" [1],
    GetFree => "OpGetFree" [1],
    Array => "OpArray" [2],
    Hash => "OpHash" [2],
    Index => "OpIndex" [],
    Call => "OpCall" [1],
    ReturnValue => "OpReturnValue" [],
    Return => "OpReturn" [],
    Closure => "OpClosure" [2, 1],
    CurrentClosure => "OpCurrentClosure" [],
}

/// Look up the definition of a raw opcode byte.
///
/// This is the only place opcode bytes are validated.
pub fn lookup(byte: u8) -> Result<&'static Definition, CodeError> {
    DEFINITIONS
        .get(byte as usize)
        .ok_or(CodeError::undefined_opcode(byte))
}

impl Opcode {
    pub fn definition(self) -> &'static Definition {
        &DEFINITIONS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.definition().name
    }
}

impl TryFrom<u8> for Opcode {
    type Error = CodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        lookup(byte).map(|def| def.opcode)
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}
