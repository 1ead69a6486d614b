//! Encoded instruction streams: building, decoding and disassembly.

use std::fmt;
use std::ops::Deref;

use crate::code::opcode::{lookup, Definition, Opcode};
use crate::error::CodeError;

/// A flat stream of encoded instructions.
///
/// Layout of each instruction: `[opcode:1][operand_1]...[operand_n]`, operands
/// big-endian at the widths given by the opcode's [`Definition`]. No padding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Instructions(Vec<u8>);

impl Instructions {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append another encoded instruction (or stream) and return the offset
    /// at which it starts.
    pub fn append(&mut self, other: &Instructions) -> usize {
        let position = self.0.len();
        self.0.extend_from_slice(&other.0);
        position
    }

    /// Overwrite bytes starting at `position` with `replacement`.
    ///
    /// Used for patching operands of already emitted instructions; the
    /// replacement must fit inside the existing stream.
    pub(crate) fn overwrite(&mut self, position: usize, replacement: &Instructions) {
        self.0[position..position + replacement.len()].copy_from_slice(&replacement.0);
    }

    /// Drop everything from `len` onward.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Instructions {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Instructions {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl FromIterator<Instructions> for Instructions {
    fn from_iter<I: IntoIterator<Item = Instructions>>(iter: I) -> Self {
        let mut out = Instructions::new();
        for ins in iter {
            out.append(&ins);
        }
        out
    }
}

/// Encode one instruction.
///
/// The operand count must match the opcode's definition and every operand
/// must fit its declared width.
pub fn make(op: Opcode, operands: &[usize]) -> Result<Instructions, CodeError> {
    let def = op.definition();
    if operands.len() != def.operand_widths.len() {
        return Err(CodeError::operand_count(
            def.name,
            def.operand_widths.len(),
            operands.len(),
        ));
    }

    let mut instruction = Vec::with_capacity(def.instruction_len());
    instruction.push(op as u8);

    for (&operand, &width) in operands.iter().zip(def.operand_widths) {
        match width {
            2 => {
                let value = u16::try_from(operand)
                    .map_err(|_| CodeError::operand_overflow(def.name, operand, width))?;
                instruction.extend_from_slice(&value.to_be_bytes());
            }
            1 => {
                let value = u8::try_from(operand)
                    .map_err(|_| CodeError::operand_overflow(def.name, operand, width))?;
                instruction.push(value);
            }
            _ => {
                return Err(CodeError::UnsupportedWidth {
                    opcode: def.name,
                    width,
                })
            }
        }
    }

    Ok(Instructions(instruction))
}

/// Read the operands of an instruction whose opcode byte has already been
/// consumed. `bytes` starts at the first operand.
///
/// Returns the operand values and the number of operand bytes read.
pub fn read_operands(def: &Definition, bytes: &[u8]) -> Result<(Vec<usize>, usize), CodeError> {
    let needed = def.instruction_len() - 1;
    if bytes.len() < needed {
        return Err(CodeError::truncated(def.name, needed, bytes.len()));
    }

    let mut operands = Vec::with_capacity(def.operand_widths.len());
    let mut offset = 0;

    for &width in def.operand_widths {
        match width {
            2 => {
                let value = read_u16(&bytes[offset..])
                    .ok_or_else(|| CodeError::truncated(def.name, needed, bytes.len()))?;
                operands.push(usize::from(value));
            }
            1 => {
                let value = read_u8(&bytes[offset..])
                    .ok_or_else(|| CodeError::truncated(def.name, needed, bytes.len()))?;
                operands.push(usize::from(value));
            }
            _ => {
                return Err(CodeError::UnsupportedWidth {
                    opcode: def.name,
                    width,
                })
            }
        }
        offset += width;
    }

    Ok((operands, offset))
}

/// Read a big-endian u16 from the start of `bytes`, or `None` if fewer than
/// two bytes remain.
pub fn read_u16(bytes: &[u8]) -> Option<u16> {
    match bytes {
        [high, low, ..] => Some(u16::from_be_bytes([*high, *low])),
        _ => None,
    }
}

/// Read a u8 from the start of `bytes`, or `None` if it is empty.
pub fn read_u8(bytes: &[u8]) -> Option<u8> {
    bytes.first().copied()
}

/// A single decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    pub opcode: Opcode,
    pub operands: Vec<usize>,
    /// Encoded length in bytes, opcode included.
    pub len: usize,
}

/// Decode the instruction starting at `bytes[0]`.
pub fn decode(bytes: &[u8]) -> Result<DecodedInstruction, CodeError> {
    let Some(&byte) = bytes.first() else {
        return Err(CodeError::Truncated {
            opcode: "<none>",
            needed: 1,
            available: 0,
        });
    };
    let def = lookup(byte)?;
    let (operands, read) = read_operands(def, &bytes[1..])?;
    Ok(DecodedInstruction {
        opcode: def.opcode,
        operands,
        len: 1 + read,
    })
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.name())?;
        for operand in &self.operands {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}

/// Disassembly: one `OFFSET NAME OPERANDS...` line per instruction.
impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut offset = 0;
        while offset < self.0.len() {
            match decode(&self.0[offset..]) {
                Ok(ins) => {
                    writeln!(f, "{:04} {}", offset, ins)?;
                    offset += ins.len;
                }
                Err(err) => {
                    writeln!(f, "ERROR: {}", err)?;
                    break;
                }
            }
        }
        Ok(())
    }
}
