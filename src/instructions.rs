use byteorder::ByteOrder;

use crate::{constants, enum_to_u8, Endian, Opcode, OperandType, Word};

/// A decoded operand record: the addressing mode and the 32-bit payload.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct OperandRecord {
    pub kind: OperandType,
    pub payload: Word,
}

impl OperandRecord {
    pub fn new(kind: OperandType, payload: Word) -> OperandRecord {
        OperandRecord { kind, payload }
    }
}

/// Appends one opcode byte.
pub fn write_opcode(code: &mut Vec<u8>, opcode: Opcode) {
    code.push(enum_to_u8(opcode));
}

/// Appends one operand record: the type byte followed by the little-endian
/// payload.
pub fn write_operand(code: &mut Vec<u8>, kind: OperandType, payload: Word) {
    code.push(enum_to_u8(kind));
    let start = code.len();
    code.resize(start + constants::WORD_BYTES as usize, 0u8);
    Endian::write_i32(&mut code[start..], payload);
}

/// Appends a full instruction. The operand count is not checked here; the
/// stream only decodes if it matches `opcode.operand_count()`.
pub fn write_instruction(code: &mut Vec<u8>, opcode: Opcode, operands: &[OperandRecord]) {
    write_opcode(code, opcode);
    for operand in operands {
        write_operand(code, operand.kind, operand.payload);
    }
}

/// Builds an operand record from a short addressing-mode tag:
/// `operand!(imm v)`, `operand!(reg r)`, `operand!(mem v)` (memory at
/// immediate address) or `operand!(mem reg r)` (memory at register).
#[macro_export]
macro_rules! operand {
    (imm $value:expr) => {
        $crate::OperandRecord::new($crate::OperandType::Immediate, $value)
    };
    (reg $index:expr) => {
        $crate::OperandRecord::new($crate::OperandType::Register, $index)
    };
    (mem reg $index:expr) => {
        $crate::OperandRecord::new($crate::OperandType::MemoryRegister, $index)
    };
    (mem $address:expr) => {
        $crate::OperandRecord::new($crate::OperandType::MemoryImmediate, $address)
    };
}
