//! The relocatable object artifact produced by `r16asm` and consumed by
//! `r16ld`: raw code and data bytes, the symbols the translation unit
//! defines, and the fixups the linker must patch.
//!
//! The on-disk layout is fixed: all counts and string lengths are 64-bit
//! little-endian, addresses and offsets are 32-bit little-endian signed,
//! strings are length-prefixed UTF-8 without terminator, and booleans are
//! one byte each.
//!
//! ```text
//! i32  code_size
//! u64  code_segment_len, bytes
//! u64  data_segment_len, bytes
//! u64  symbol_count,     symbols
//! u64  fixup_count,      fixups
//!
//! symbol := str name, i32 address, u8 is_external, u8 is_data
//! fixup  := i32 bytecode_offset, str name, u8 is_data_label, u8 is_memory_reference
//! ```

use std::fs::File;
use std::io::prelude::*;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use byteorder::{ReadBytesExt, WriteBytesExt};
use util::{Endian, ReadStringExt, WriteStringExt};

/// A name defined by one translation unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// Byte offset within the object's code-then-data layout: for code
    /// symbols the offset into the code segment, for data symbols
    /// `code_size + word_offset * 4`.
    pub address: i32,
    /// Reserved for a future dynamic-link feature; the generator always
    /// writes false and the linker skips external symbols.
    pub is_external: bool,
    pub is_data: bool,
}

/// A deferred patch: the linker writes the resolved address of `symbol`
/// over the four placeholder bytes at `bytecode_offset`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fixup {
    /// Offset of the payload (not of the preceding type byte) within the
    /// object's code segment.
    pub bytecode_offset: i32,
    pub symbol: String,
    pub is_data_label: bool,
    /// Whether the source operand was bracketed. Decides whether the
    /// patched operand becomes a memory reference or an immediate.
    pub is_memory_reference: bool,
}

#[derive(Debug, PartialEq)]
pub struct ObjectArtifact {
    code_size: i32,
    code_segment: Vec<u8>,
    data_segment: Vec<u8>,
    symbols: Vec<Symbol>,
    fixups: Vec<Fixup>,
}

impl ObjectArtifact {
    pub fn from(
        code_segment: Vec<u8>,
        data_segment: Vec<u8>,
        symbols: Vec<Symbol>,
        fixups: Vec<Fixup>,
    ) -> ObjectArtifact {
        ObjectArtifact {
            code_size: code_segment.len() as i32,
            code_segment,
            data_segment,
            symbols,
            fixups,
        }
    }

    /// Byte length of the code segment, stored explicitly in the artifact.
    pub fn code_size(&self) -> i32 {
        self.code_size
    }

    pub fn code_segment(&self) -> &[u8] {
        &self.code_segment[..]
    }

    pub fn data_segment(&self) -> &[u8] {
        &self.data_segment[..]
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols[..]
    }

    pub fn fixups(&self) -> &[Fixup] {
        &self.fixups[..]
    }
}

pub fn read<R: Read>(reader: &mut R) -> io::Result<ObjectArtifact> {
    let code_size = reader.read_i32::<Endian>()?;

    let code_len = reader.read_u64::<Endian>()?;
    let mut code_segment = vec![0; code_len as usize];
    reader.read_exact(&mut code_segment)?;

    let data_len = reader.read_u64::<Endian>()?;
    let mut data_segment = vec![0; data_len as usize];
    reader.read_exact(&mut data_segment)?;

    let symbol_count = reader.read_u64::<Endian>()?;
    let mut symbols = Vec::with_capacity(symbol_count as usize);
    for _ in 0..symbol_count {
        let name = reader.read_len_string()?;
        let address = reader.read_i32::<Endian>()?;
        let is_external = reader.read_u8()? != 0;
        let is_data = reader.read_u8()? != 0;
        symbols.push(Symbol {
            name,
            address,
            is_external,
            is_data,
        });
    }

    let fixup_count = reader.read_u64::<Endian>()?;
    let mut fixups = Vec::with_capacity(fixup_count as usize);
    for _ in 0..fixup_count {
        let bytecode_offset = reader.read_i32::<Endian>()?;
        let symbol = reader.read_len_string()?;
        let is_data_label = reader.read_u8()? != 0;
        let is_memory_reference = reader.read_u8()? != 0;
        fixups.push(Fixup {
            bytecode_offset,
            symbol,
            is_data_label,
            is_memory_reference,
        });
    }

    Ok(ObjectArtifact {
        code_size,
        code_segment,
        data_segment,
        symbols,
        fixups,
    })
}

pub fn write<W: Write>(writer: &mut W, object: &ObjectArtifact) -> io::Result<()> {
    writer.write_i32::<Endian>(object.code_size)?;

    writer.write_u64::<Endian>(object.code_segment.len() as u64)?;
    writer.write_all(&object.code_segment[..])?;

    writer.write_u64::<Endian>(object.data_segment.len() as u64)?;
    writer.write_all(&object.data_segment[..])?;

    writer.write_u64::<Endian>(object.symbols.len() as u64)?;
    for symbol in &object.symbols {
        writer.write_len_string(&symbol.name)?;
        writer.write_i32::<Endian>(symbol.address)?;
        writer.write_u8(symbol.is_external as u8)?;
        writer.write_u8(symbol.is_data as u8)?;
    }

    writer.write_u64::<Endian>(object.fixups.len() as u64)?;
    for fixup in &object.fixups {
        writer.write_i32::<Endian>(fixup.bytecode_offset)?;
        writer.write_len_string(&fixup.symbol)?;
        writer.write_u8(fixup.is_data_label as u8)?;
        writer.write_u8(fixup.is_memory_reference as u8)?;
    }

    Ok(())
}

pub trait ReadObjExt: Read + Sized {
    fn read_obj(&mut self) -> io::Result<ObjectArtifact> {
        read(self)
    }
}

impl<R: Read + Sized> ReadObjExt for R {}

pub trait WriteObjExt: Write + Sized {
    fn write_obj(&mut self, object: &ObjectArtifact) -> io::Result<()> {
        write(self, object)
    }
}

impl<W: Write + Sized> WriteObjExt for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<ObjectArtifact> {
    BufReader::new(File::open(path)?).read_obj()
}

pub fn write_file<P: AsRef<Path>>(path: P, object: &ObjectArtifact) -> io::Result<()> {
    BufWriter::new(File::create(path)?).write_obj(object)
}
