use byteorder::ByteOrder;

use r16::{constants, write_opcode, write_operand, Endian, OperandType, Word};
use r16obj::{Fixup, ObjectArtifact, Symbol};

use crate::parser::{Item, Operand, Program};

/// Linearizes a parsed program: bytecode and relocations first, then the
/// data symbols and the raw little-endian data words.
///
/// Immediates are truncated from the lexer's 64-bit values to the machine
/// word here.
pub fn generate(program: &Program) -> ObjectArtifact {
    let mut code = Vec::new();
    let mut symbols = Vec::new();
    let mut fixups = Vec::new();

    for item in &program.items {
        match item {
            Item::Label(name) => {
                symbols.push(Symbol {
                    name: name.clone(),
                    address: code.len() as i32,
                    is_external: false,
                    is_data: false,
                });
            }
            Item::Instruction { opcode, operands } => {
                write_opcode(&mut code, *opcode);
                for operand in operands {
                    emit_operand(&mut code, operand, program, &mut fixups);
                }
            }
        }
    }

    let code_size = code.len() as i32;

    for (name, word_offset) in &program.data_labels {
        symbols.push(Symbol {
            name: name.clone(),
            address: code_size + (word_offset * constants::WORD_BYTES) as i32,
            is_external: false,
            is_data: true,
        });
    }

    let mut data = vec![0u8; program.data_words.len() * constants::WORD_BYTES as usize];
    Endian::write_i32_into(&program.data_words[..], &mut data[..]);

    ObjectArtifact::from(code, data, symbols, fixups)
}

fn emit_operand(
    code: &mut Vec<u8>,
    operand: &Operand,
    program: &Program,
    fixups: &mut Vec<Fixup>,
) {
    match operand {
        Operand::Immediate(value) => {
            write_operand(code, OperandType::Immediate, *value as Word)
        }
        Operand::Register(index) => {
            write_operand(code, OperandType::Register, Word::from(*index))
        }
        Operand::MemoryImmediate(address) => {
            write_operand(code, OperandType::MemoryImmediate, *address as Word)
        }
        Operand::MemoryRegister(index) => {
            write_operand(code, OperandType::MemoryRegister, Word::from(*index))
        }
        Operand::LabelRef { name, memory } => {
            // Zero placeholder; the fixup points at the payload bytes.
            write_operand(code, OperandType::LabelRef, 0);
            fixups.push(Fixup {
                bytecode_offset: (code.len() - constants::WORD_BYTES as usize) as i32,
                symbol: name.clone(),
                is_data_label: program.data_labels.contains_key(name),
                is_memory_reference: *memory,
            });
        }
    }
}
