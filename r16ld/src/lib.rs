//! Linker for r16 object artifacts.
//!
//! Takes an ordered list of objects, lays out all code segments followed by
//! all data segments behind a six-byte entry trampoline (`JMP MAIN`),
//! assigns every symbol its final absolute address, and patches every
//! label fixup in place. The result is a flat byte image executable by the
//! [`Processor`](../r16/struct.Processor.html) with nothing left symbolic:
//! after linking, no `LabelRef` operand remains.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use byteorder::ByteOrder;

use r16::{constants, enum_to_u8, write_opcode, write_operand, Endian, Opcode, OperandType};
use r16obj::ObjectArtifact;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    DuplicateSymbol(String),
    UndefinedSymbol(String),
    MissingEntryPoint,
    FixupOutOfRange(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DuplicateSymbol(name) => {
                write!(f, "Multiple definitions of symbol: {}", name)
            }
            Error::UndefinedSymbol(name) => {
                write!(f, "Undefined symbol during linking: {}", name)
            }
            Error::MissingEntryPoint => {
                write!(f, "Entry point '{}' not found", constants::ENTRY_SYMBOL)
            }
            Error::FixupOutOfRange(name) => {
                write!(f, "Fixup address out of range for symbol: {}", name)
            }
        }
    }
}

impl StdError for Error {}

/// Accumulates object artifacts in link order.
pub struct Linker {
    objects: Vec<ObjectArtifact>,
}

impl Linker {
    pub fn new() -> Linker {
        Linker {
            objects: Vec::new(),
        }
    }

    pub fn add_object(&mut self, object: ObjectArtifact) {
        self.objects.push(object);
    }

    pub fn link(self) -> Result<Vec<u8>, Error> {
        link(&self.objects)
    }
}

impl Default for Linker {
    fn default() -> Linker {
        Linker::new()
    }
}

/// Links the objects in the given order into one executable image.
pub fn link(objects: &[ObjectArtifact]) -> Result<Vec<u8>, Error> {
    // Object i's code starts at trampoline + preceding code sizes; all
    // data segments follow the last code segment in the same order.
    let mut code_offsets = Vec::with_capacity(objects.len());
    let mut offset = constants::TRAMPOLINE_BYTES as i32;
    for object in objects {
        code_offsets.push(offset);
        offset += object.code_segment().len() as i32;
    }

    let data_base = offset;
    let mut data_offsets = Vec::with_capacity(objects.len());
    let mut data_offset = 0;
    for object in objects {
        data_offsets.push(data_offset);
        data_offset += object.data_segment().len() as i32;
    }

    let globals = global_symbol_table(objects, &code_offsets, data_base, &data_offsets)?;

    let entry = *globals
        .get(constants::ENTRY_SYMBOL)
        .ok_or(Error::MissingEntryPoint)?;

    let mut image = Vec::with_capacity((data_base + data_offset) as usize);
    write_opcode(&mut image, Opcode::JMP);
    write_operand(&mut image, OperandType::Immediate, 0);
    for object in objects {
        image.extend_from_slice(object.code_segment());
    }
    for object in objects {
        image.extend_from_slice(object.data_segment());
    }

    for (index, object) in objects.iter().enumerate() {
        for fixup in object.fixups() {
            let target = *globals
                .get(&fixup.symbol)
                .ok_or_else(|| Error::UndefinedSymbol(fixup.symbol.clone()))?;
            let offset = fixup.bytecode_offset + code_offsets[index];
            patch(&mut image, offset, fixup.is_memory_reference, target)
                .map_err(|()| Error::FixupOutOfRange(fixup.symbol.clone()))?;
        }
    }

    // The trampoline payload is patched like any other fixup; its operand
    // is a plain immediate.
    patch(&mut image, 2, false, entry).map_err(|()| Error::FixupOutOfRange(
        constants::ENTRY_SYMBOL.to_string(),
    ))?;

    Ok(image)
}

/// Resolves every non-external symbol to its final absolute address.
fn global_symbol_table(
    objects: &[ObjectArtifact],
    code_offsets: &[i32],
    data_base: i32,
    data_offsets: &[i32],
) -> Result<HashMap<String, i32>, Error> {
    let mut globals = HashMap::new();

    for (index, object) in objects.iter().enumerate() {
        for symbol in object.symbols() {
            if symbol.is_external {
                continue;
            }

            let address = if symbol.is_data {
                // The object-local address is relative to its code-then-data
                // layout; rebase the data part onto the image's data block.
                data_base + data_offsets[index] + (symbol.address - object.code_size())
            } else {
                code_offsets[index] + symbol.address
            };

            if globals.insert(symbol.name.clone(), address).is_some() {
                return Err(Error::DuplicateSymbol(symbol.name.clone()));
            }
        }
    }

    Ok(globals)
}

/// Rewrites the operand at `offset` (pointing at the payload, with the type
/// byte immediately before it) into a resolved immediate or memory
/// reference.
fn patch(image: &mut [u8], offset: i32, memory_reference: bool, address: i32) -> Result<(), ()> {
    let end = offset + constants::WORD_BYTES as i32;
    if offset < 1 || end as usize > image.len() {
        return Err(());
    }

    let kind = if memory_reference {
        OperandType::MemoryImmediate
    } else {
        OperandType::Immediate
    };
    image[(offset - 1) as usize] = enum_to_u8(kind);
    Endian::write_i32(&mut image[offset as usize..end as usize], address);
    Ok(())
}
