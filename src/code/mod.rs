//! The Monkey instruction set.
//!
//! - `opcode`: opcodes and the static definition table (name + operand widths)
//! - `instructions`: encoding (`make`), decoding and disassembly of byte streams

pub mod instructions;
pub mod opcode;

pub use instructions::{
    decode, make, read_operands, read_u16, read_u8, DecodedInstruction, Instructions,
};
pub use opcode::{lookup, Definition, Opcode};
