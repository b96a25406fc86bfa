use super::Word;
use std::mem;

pub const WORD_BYTES: u32 = mem::size_of::<Word>() as u32;

/// Size of one encoded operand record: one type byte plus a 32-bit payload.
pub const OPERAND_BYTES: u32 = 1 + WORD_BYTES;

pub const REGISTER_COUNT: usize = 16;

/// `R15` holds the instruction pointer.
pub const IP_INDEX: usize = 15;

/// `R14` holds the stack pointer.
pub const SP_INDEX: usize = 14;

pub const DEFAULT_MEMORY_SIZE: u32 = 1024 * 1024;
pub const DEFAULT_STACK_SIZE: u32 = 64 * 1024;

/// Return address pushed before execution starts; `RET` observing it
/// terminates the program instead of jumping.
pub const SENTINEL_RETURN: Word = -1;

/// Symbol the linked image starts at, via the entry trampoline.
pub const ENTRY_SYMBOL: &str = "MAIN";

/// Size of the `JMP MAIN` trampoline the linker places at image offset 0:
/// one opcode byte plus one immediate operand record.
pub const TRAMPOLINE_BYTES: u32 = 1 + OPERAND_BYTES;
