use std::io::{self, Read, Write};
use std::{error::Error, fmt};

use byteorder::{ReadBytesExt, WriteBytesExt};

pub type Endian = byteorder::LittleEndian;

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ParseEnumError {
    pub value: String,
    pub enum_name: &'static str,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Failed to parse \"{}\" as {}.",
            &self.value, &self.enum_name
        )
    }
}

impl Error for ParseEnumError {}

/// Reads a string serialized as a 64-bit little-endian byte count followed
/// by that many UTF-8 bytes, without terminator.
pub trait ReadStringExt: Read {
    fn read_len_string(&mut self) -> io::Result<String> {
        let length = self.read_u64::<Endian>()?;
        let mut bytes = vec![0; length as usize];
        self.read_exact(&mut bytes)?;
        String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

impl<R: Read> ReadStringExt for R {}

/// Writes a string as a 64-bit little-endian byte count followed by the
/// raw UTF-8 bytes.
pub trait WriteStringExt: Write {
    fn write_len_string(&mut self, value: &str) -> io::Result<()> {
        self.write_u64::<Endian>(value.len() as u64)?;
        self.write_all(value.as_bytes())
    }
}

impl<W: Write> WriteStringExt for W {}
