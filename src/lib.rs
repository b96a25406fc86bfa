//! The r16 virtual processor.
//!
//! A small register machine with sixteen signed 32-bit general registers,
//! of which `R15` serves as the instruction pointer and `R14` as the stack
//! pointer. Code and data share a single byte-addressed memory; the stack
//! is a separate buffer that grows downward.
//!
//! Programs are flat memory images produced by the `r16ld` linker. The
//! bytecode stream is a sequence of instructions, each a one-byte opcode
//! followed by a fixed number of five-byte operand records (a type byte
//! and a little-endian 32-bit payload). See [`Opcode`](enum.Opcode.html)
//! and [`OperandType`](enum.OperandType.html) for the encoding.

pub mod constants;

mod enums;
mod instructions;
mod memory;
mod processor;

#[cfg(test)]
mod test;

pub use crate::enums::*;
pub use crate::instructions::*;
pub use crate::memory::{Memory, Storage};
pub use crate::processor::{Fault, Flags, Processor};
pub use util::Endian;

/// The machine word: everything the processor computes on is a signed
/// 32-bit value.
pub type Word = i32;

/// Absolute byte offset into the memory image.
pub type Address = i32;
