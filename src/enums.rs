use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::ToPrimitive;
use std::str::FromStr;
use util::ParseEnumError;

/// Bytecode operation set.
///
/// The discriminant of each variant is the opcode byte emitted into the
/// code segment. Every instruction is encoded as one opcode byte followed
/// by [`operand_count`](#method.operand_count) operand records.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum Opcode {
    /// Copy a value: `MOV dest, src`.
    MOV,
    /// Three-operand addition: `ADD dest, src1, src2`.
    ADD,
    /// Three-operand subtraction: `SUB dest, src1, src2`.
    SUB,
    /// Three-operand multiplication: `MUL dest, src1, src2`.
    MUL,
    /// Three-operand division: `DIV dest, src1, src2`. A zero divisor faults.
    DIV,
    /// Bitwise and, read-modify-write: `AND dest, src`.
    AND,
    /// Bitwise or, read-modify-write: `OR dest, src`.
    OR,
    /// Bitwise exclusive-or, read-modify-write: `XOR dest, src`.
    XOR,
    /// Shift left: `SHL dest, src`.
    SHL,
    /// Logical (zero-fill) shift right: `SHR dest, src`.
    SHR,
    /// Compare: `CMP a, b` sets the zero/greater/less flags from `a - b`.
    CMP,
    /// Unconditional jump to an absolute byte address.
    JMP,
    /// Jump if the zero flag is set.
    JE,
    /// Jump if the zero flag is clear.
    JNE,
    /// Jump if the greater flag is set.
    JG,
    /// Jump if the less flag is set.
    JL,
    /// Jump if the zero or less flag is set.
    JLE,
    /// Jump if the zero or greater flag is set.
    JGE,
    /// Synonym of `MOV`; source programs use it to signal a memory read.
    LOAD,
    /// Synonym of `MOV`; source programs use it to signal a memory write.
    STORE,
    /// Push a value onto the stack: `PUSH src`.
    PUSH,
    /// Pop the top of the stack into a destination: `POP dest`.
    POP,
    /// Push the address of the next instruction and jump: `CALL addr`.
    CALL,
    /// Pop a return address and jump to it; halts on the sentinel.
    RET,
}

impl Opcode {
    /// Number of operand records following the opcode byte.
    pub fn operand_count(self) -> usize {
        match self {
            Opcode::ADD | Opcode::SUB | Opcode::MUL | Opcode::DIV => 3,

            Opcode::MOV
            | Opcode::AND
            | Opcode::OR
            | Opcode::XOR
            | Opcode::SHL
            | Opcode::SHR
            | Opcode::CMP
            | Opcode::LOAD
            | Opcode::STORE => 2,

            Opcode::PUSH
            | Opcode::POP
            | Opcode::JMP
            | Opcode::JE
            | Opcode::JNE
            | Opcode::JG
            | Opcode::JL
            | Opcode::JLE
            | Opcode::JGE
            | Opcode::CALL => 1,

            Opcode::RET => 0,
        }
    }
}

impl FromStr for Opcode {
    type Err = ParseEnumError;

    /// Looks up an uppercased mnemonic.
    fn from_str(s: &str) -> Result<Opcode, ParseEnumError> {
        let opcode = match s {
            "MOV" => Opcode::MOV,
            "ADD" => Opcode::ADD,
            "SUB" => Opcode::SUB,
            "MUL" => Opcode::MUL,
            "DIV" => Opcode::DIV,
            "AND" => Opcode::AND,
            "OR" => Opcode::OR,
            "XOR" => Opcode::XOR,
            "SHL" => Opcode::SHL,
            "SHR" => Opcode::SHR,
            "CMP" => Opcode::CMP,
            "JMP" => Opcode::JMP,
            "JE" => Opcode::JE,
            "JNE" => Opcode::JNE,
            "JG" => Opcode::JG,
            "JL" => Opcode::JL,
            "JLE" => Opcode::JLE,
            "JGE" => Opcode::JGE,
            "LOAD" => Opcode::LOAD,
            "STORE" => Opcode::STORE,
            "PUSH" => Opcode::PUSH,
            "POP" => Opcode::POP,
            "CALL" => Opcode::CALL,
            "RET" => Opcode::RET,
            _ => {
                return Err(ParseEnumError {
                    value: s.to_string(),
                    enum_name: "Opcode",
                })
            }
        };
        Ok(opcode)
    }
}

/// Discriminator byte preceding every 32-bit operand payload in the
/// bytecode, naming one of the five addressing modes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum OperandType {
    /// The payload is the value itself.
    Immediate,
    /// The payload is a register index.
    Register,
    /// The payload is an absolute byte address to load from or store to.
    MemoryImmediate,
    /// The payload is the index of the register holding the address.
    MemoryRegister,
    /// Placeholder for an unresolved label; the linker rewrites it to
    /// `Immediate` or `MemoryImmediate` while patching the payload.
    LabelRef,
}

macro_rules! impl_enum_display {
    ($e:ty) => {
        impl std::fmt::Display for $e {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                std::fmt::Debug::fmt(self, f)
            }
        }
    };
}

impl_enum_display!(Opcode);
impl_enum_display!(OperandType);

#[inline]
pub fn enum_to_u8<T: ToPrimitive + Copy>(val: T) -> u8 {
    val.to_u8().unwrap()
}
