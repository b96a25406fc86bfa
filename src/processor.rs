use std::error::Error as StdError;
use std::fmt;

use num_traits::FromPrimitive;

use crate::memory::{Memory, Storage};
use crate::{constants, Address, Opcode, OperandRecord, OperandType, Word};

/// Comparison flags set by `CMP` and consumed by the conditional jumps.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Flags {
    pub zero: bool,
    pub greater: bool,
    pub less: bool,
}

/// A terminal execution failure. Any fault aborts the program.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Fault {
    IpOutOfRange(Address),
    MemoryOutOfRange(Address),
    StackOutOfRange(Address),
    RegisterOutOfRange(Word),
    DivisionByZero,
    InvalidOpcode(u8),
    InvalidOperandType(u8),
    InvalidDestination(OperandType),
    ImageTooLarge { image: usize, memory: usize },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Fault::IpOutOfRange(address) => {
                write!(f, "Instruction pointer out of range at address {}", address)
            }
            Fault::MemoryOutOfRange(address) => {
                write!(f, "Memory out of range at address {}", address)
            }
            Fault::StackOutOfRange(address) => {
                write!(f, "Stack out of range at address {}", address)
            }
            Fault::RegisterOutOfRange(index) => {
                write!(f, "Register index out of range: {}", index)
            }
            Fault::DivisionByZero => f.write_str("Division by zero"),
            Fault::InvalidOpcode(byte) => write!(f, "Invalid opcode: {:#04x}", byte),
            Fault::InvalidOperandType(byte) => write!(f, "Invalid operand type: {:#04x}", byte),
            Fault::InvalidDestination(kind) => {
                write!(f, "Destination operand must be register or memory, got {}", kind)
            }
            Fault::ImageTooLarge { image, memory } => write!(
                f,
                "Image of {} bytes does not fit into {} bytes of memory",
                image, memory
            ),
        }
    }
}

impl StdError for Fault {}

/// The r16 interpreter: registers, flags, code+data memory and a separate
/// descending stack.
///
/// A freshly constructed processor has all general registers zeroed, the
/// instruction pointer (`R15`) at the entry trampoline, the stack pointer
/// (`R14`) at the top of the stack with the sentinel return address pushed,
/// and all flags cleared.
#[derive(Debug)]
pub struct Processor {
    registers: [Word; constants::REGISTER_COUNT],
    flags: Flags,
    memory: Memory,
    stack: Memory,
}

impl Processor {
    /// Loads `image` at address 0 of a `memory_size`-byte memory and sets
    /// up the initial register and stack state.
    pub fn new(image: &[u8], memory_size: u32, stack_size: u32) -> Result<Processor, Fault> {
        if image.len() > memory_size as usize {
            return Err(Fault::ImageTooLarge {
                image: image.len(),
                memory: memory_size as usize,
            });
        }

        let mut memory = Memory::new(memory_size);
        if !image.is_empty() {
            match memory.borrow_slice_mut(0, image.len() as u32) {
                Ok(slice) => slice.copy_from_slice(image),
                Err(()) => {
                    return Err(Fault::ImageTooLarge {
                        image: image.len(),
                        memory: memory_size as usize,
                    })
                }
            }
        }

        let mut processor = Processor {
            registers: [0; constants::REGISTER_COUNT],
            flags: Flags::default(),
            memory,
            stack: Memory::new(stack_size),
        };

        processor.registers[constants::SP_INDEX] = stack_size as Word;
        processor.push(constants::SENTINEL_RETURN)?;

        Ok(processor)
    }

    pub fn register(&self, index: usize) -> Word {
        self.registers[index]
    }

    pub fn registers(&self) -> &[Word] {
        &self.registers[..]
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Executes instructions until `RET` pops the sentinel return address.
    pub fn run(&mut self) -> Result<(), Fault> {
        loop {
            let opcode_byte = self.fetch_byte()?;
            let opcode =
                Opcode::from_u8(opcode_byte).ok_or(Fault::InvalidOpcode(opcode_byte))?;

            let mut operands = [OperandRecord::new(OperandType::Immediate, 0); 3];
            let count = opcode.operand_count();
            for slot in operands.iter_mut().take(count) {
                *slot = self.fetch_operand()?;
            }

            if opcode == Opcode::RET {
                if self.ret()? {
                    return Ok(());
                }
            } else {
                self.exec(opcode, &operands[..count])?;
            }
        }
    }

    fn fetch_byte(&mut self) -> Result<u8, Fault> {
        let ip = self.registers[constants::IP_INDEX];
        if ip < 0 {
            return Err(Fault::IpOutOfRange(ip));
        }
        let byte = self
            .memory
            .read_byte(ip as u32)
            .map_err(|()| Fault::IpOutOfRange(ip))?;
        self.registers[constants::IP_INDEX] = ip + 1;
        Ok(byte)
    }

    fn fetch_word(&mut self) -> Result<Word, Fault> {
        let ip = self.registers[constants::IP_INDEX];
        if ip < 0 {
            return Err(Fault::IpOutOfRange(ip));
        }
        let value = self
            .memory
            .read_word(ip as u32)
            .map_err(|()| Fault::IpOutOfRange(ip))?;
        self.registers[constants::IP_INDEX] = ip + constants::WORD_BYTES as Word;
        Ok(value as Word)
    }

    fn fetch_operand(&mut self) -> Result<OperandRecord, Fault> {
        let type_byte = self.fetch_byte()?;
        let kind =
            OperandType::from_u8(type_byte).ok_or(Fault::InvalidOperandType(type_byte))?;
        let payload = self.fetch_word()?;
        Ok(OperandRecord::new(kind, payload))
    }

    fn register_index(&self, payload: Word) -> Result<usize, Fault> {
        if payload >= 0 && (payload as usize) < constants::REGISTER_COUNT {
            Ok(payload as usize)
        } else {
            Err(Fault::RegisterOutOfRange(payload))
        }
    }

    fn load_memory(&self, address: Address) -> Result<Word, Fault> {
        if address < 0 {
            return Err(Fault::MemoryOutOfRange(address));
        }
        self.memory
            .read_word(address as u32)
            .map(|value| value as Word)
            .map_err(|()| Fault::MemoryOutOfRange(address))
    }

    fn store_memory(&mut self, address: Address, value: Word) -> Result<(), Fault> {
        if address < 0 {
            return Err(Fault::MemoryOutOfRange(address));
        }
        self.memory
            .write_word(address as u32, value as u32)
            .map_err(|()| Fault::MemoryOutOfRange(address))
    }

    fn load_stack(&self, address: Address) -> Result<Word, Fault> {
        if address < 0 {
            return Err(Fault::StackOutOfRange(address));
        }
        self.stack
            .read_word(address as u32)
            .map(|value| value as Word)
            .map_err(|()| Fault::StackOutOfRange(address))
    }

    fn store_stack(&mut self, address: Address, value: Word) -> Result<(), Fault> {
        if address < 0 {
            return Err(Fault::StackOutOfRange(address));
        }
        self.stack
            .write_word(address as u32, value as u32)
            .map_err(|()| Fault::StackOutOfRange(address))
    }

    /// Evaluates an operand as a source value.
    fn value_of(&self, operand: OperandRecord) -> Result<Word, Fault> {
        match operand.kind {
            OperandType::Immediate | OperandType::LabelRef => Ok(operand.payload),
            OperandType::Register => {
                let index = self.register_index(operand.payload)?;
                Ok(self.registers[index])
            }
            OperandType::MemoryImmediate => self.load_memory(operand.payload),
            OperandType::MemoryRegister => {
                let index = self.register_index(operand.payload)?;
                self.load_memory(self.registers[index])
            }
        }
    }

    /// Writes `value` through a destination operand. Only register and
    /// memory operands are writable.
    fn write_dest(&mut self, operand: OperandRecord, value: Word) -> Result<(), Fault> {
        match operand.kind {
            OperandType::Register => {
                let index = self.register_index(operand.payload)?;
                self.registers[index] = value;
                Ok(())
            }
            OperandType::MemoryImmediate => self.store_memory(operand.payload, value),
            OperandType::MemoryRegister => {
                let index = self.register_index(operand.payload)?;
                self.store_memory(self.registers[index], value)
            }
            OperandType::Immediate | OperandType::LabelRef => {
                Err(Fault::InvalidDestination(operand.kind))
            }
        }
    }

    fn push(&mut self, value: Word) -> Result<(), Fault> {
        let top = self.registers[constants::SP_INDEX] - constants::WORD_BYTES as Word;
        self.store_stack(top, value)?;
        self.registers[constants::SP_INDEX] = top;
        Ok(())
    }

    fn pop(&mut self) -> Result<Word, Fault> {
        let top = self.registers[constants::SP_INDEX];
        let value = self.load_stack(top)?;
        self.registers[constants::SP_INDEX] = top + constants::WORD_BYTES as Word;
        Ok(value)
    }

    /// Returns true when the popped return address is the sentinel.
    fn ret(&mut self) -> Result<bool, Fault> {
        let return_address = self.pop()?;
        if return_address == constants::SENTINEL_RETURN {
            return Ok(true);
        }
        self.registers[constants::IP_INDEX] = return_address;
        Ok(false)
    }

    fn exec(&mut self, opcode: Opcode, operands: &[OperandRecord]) -> Result<(), Fault> {
        match opcode {
            Opcode::MOV | Opcode::LOAD | Opcode::STORE => {
                let value = self.value_of(operands[1])?;
                self.write_dest(operands[0], value)
            }

            Opcode::ADD => self.arithmetic(operands, Word::wrapping_add),
            Opcode::SUB => self.arithmetic(operands, Word::wrapping_sub),
            Opcode::MUL => self.arithmetic(operands, Word::wrapping_mul),
            Opcode::DIV => {
                let lhs = self.value_of(operands[1])?;
                let rhs = self.value_of(operands[2])?;
                if rhs == 0 {
                    return Err(Fault::DivisionByZero);
                }
                self.write_dest(operands[0], lhs.wrapping_div(rhs))
            }

            Opcode::AND => self.modify(operands, |dest, src| dest & src),
            Opcode::OR => self.modify(operands, |dest, src| dest | src),
            Opcode::XOR => self.modify(operands, |dest, src| dest ^ src),
            Opcode::SHL => self.modify(operands, |dest, src| dest.wrapping_shl(src as u32)),
            Opcode::SHR => {
                self.modify(operands, |dest, src| {
                    ((dest as u32).wrapping_shr(src as u32)) as Word
                })
            }

            Opcode::CMP => {
                let lhs = self.value_of(operands[0])?;
                let rhs = self.value_of(operands[1])?;
                let result = lhs.wrapping_sub(rhs);
                self.flags = Flags {
                    zero: result == 0,
                    greater: result > 0,
                    less: result < 0,
                };
                Ok(())
            }

            Opcode::JMP
            | Opcode::JE
            | Opcode::JNE
            | Opcode::JG
            | Opcode::JL
            | Opcode::JLE
            | Opcode::JGE => {
                let taken = match opcode {
                    Opcode::JMP => true,
                    Opcode::JE => self.flags.zero,
                    Opcode::JNE => !self.flags.zero,
                    Opcode::JG => self.flags.greater,
                    Opcode::JL => self.flags.less,
                    Opcode::JLE => self.flags.zero || self.flags.less,
                    Opcode::JGE => self.flags.zero || self.flags.greater,
                    _ => unreachable!(),
                };
                if taken {
                    self.registers[constants::IP_INDEX] = operands[0].payload;
                }
                Ok(())
            }

            Opcode::PUSH => {
                let value = self.value_of(operands[0])?;
                self.push(value)
            }
            Opcode::POP => {
                let value = self.pop()?;
                self.write_dest(operands[0], value)
            }

            Opcode::CALL => {
                let return_address = self.registers[constants::IP_INDEX];
                self.push(return_address)?;
                self.registers[constants::IP_INDEX] = operands[0].payload;
                Ok(())
            }

            // Handled in run() so the sentinel can stop the loop.
            Opcode::RET => unreachable!(),
        }
    }

    /// Three-operand form: `dest <- op(src1, src2)`.
    fn arithmetic(
        &mut self,
        operands: &[OperandRecord],
        op: fn(Word, Word) -> Word,
    ) -> Result<(), Fault> {
        let lhs = self.value_of(operands[1])?;
        let rhs = self.value_of(operands[2])?;
        self.write_dest(operands[0], op(lhs, rhs))
    }

    /// Read-modify-write form: `dest <- op(dest, src)`.
    fn modify(
        &mut self,
        operands: &[OperandRecord],
        op: fn(Word, Word) -> Word,
    ) -> Result<(), Fault> {
        let current = self.value_of(operands[0])?;
        let source = self.value_of(operands[1])?;
        self.write_dest(operands[0], op(current, source))
    }
}
