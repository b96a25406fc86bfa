use super::constants::*;
use super::*;
use crate::operand;

use matches::assert_matches;

macro_rules! image {
    [$( $op:ident $([$( $operand:expr ),*])? );* $(;)?] => {{
        let mut code = Vec::new();
        $( write_instruction(&mut code, Opcode::$op, &[$($($operand),*)?]); )*
        code
    }};
}

const MEM_SIZE: u32 = 1024;
const STACK_SIZE: u32 = 256;

fn run_image(image: &[u8]) -> Processor {
    let mut processor = Processor::new(image, MEM_SIZE, STACK_SIZE).unwrap();
    processor.run().unwrap();
    processor
}

fn run_fault(image: &[u8]) -> Fault {
    let mut processor = Processor::new(image, MEM_SIZE, STACK_SIZE).unwrap();
    processor.run().unwrap_err()
}

#[test]
fn initial_state() {
    let processor = Processor::new(&[], MEM_SIZE, STACK_SIZE).unwrap();

    assert_eq!(processor.register(IP_INDEX), 0);
    assert_eq!(processor.register(SP_INDEX), STACK_SIZE as Word - 4);
    assert_eq!(processor.flags(), Flags::default());
    for index in 0..SP_INDEX {
        assert_eq!(processor.register(index), 0);
    }
}

#[test]
fn ret_on_sentinel_halts() {
    let processor = run_image(&image![RET]);

    // The sentinel was consumed, leaving the stack empty.
    assert_eq!(processor.register(SP_INDEX), STACK_SIZE as Word);
    assert_eq!(processor.register(IP_INDEX), 1);
}

#[test]
fn mov_immediate_to_register() {
    let processor = run_image(&image![
        MOV [operand!(reg 0), operand!(imm 7)];
        RET
    ]);

    assert_eq!(processor.register(0), 7);
}

#[test]
fn sub_three_operand() {
    let processor = run_image(&image![
        MOV [operand!(reg 0), operand!(imm 7)];
        MOV [operand!(reg 1), operand!(imm 5)];
        SUB [operand!(reg 2), operand!(reg 0), operand!(reg 1)];
        RET
    ]);

    assert_eq!(processor.register(2), 2);
}

#[test]
fn add_wraps_around() {
    let processor = run_image(&image![
        MOV [operand!(reg 0), operand!(imm Word::max_value())];
        ADD [operand!(reg 1), operand!(reg 0), operand!(imm 1)];
        RET
    ]);

    assert_eq!(processor.register(1), Word::min_value());
}

#[test]
fn mul_negative() {
    let processor = run_image(&image![
        MUL [operand!(reg 0), operand!(imm -3), operand!(imm 14)];
        RET
    ]);

    assert_eq!(processor.register(0), -42);
}

#[test]
fn div_truncates_toward_zero() {
    let processor = run_image(&image![
        DIV [operand!(reg 0), operand!(imm -7), operand!(imm 2)];
        RET
    ]);

    assert_eq!(processor.register(0), -3);
}

#[test]
fn div_by_zero_faults() {
    let fault = run_fault(&image![
        DIV [operand!(reg 0), operand!(imm 1), operand!(imm 0)];
        RET
    ]);

    assert_eq!(fault, Fault::DivisionByZero);
}

#[test]
fn div_min_by_minus_one_wraps() {
    let processor = run_image(&image![
        DIV [operand!(reg 0), operand!(imm Word::min_value()), operand!(imm -1)];
        RET
    ]);

    assert_eq!(processor.register(0), Word::min_value());
}

#[test]
fn logic_ops_read_modify_write() {
    let processor = run_image(&image![
        MOV [operand!(reg 0), operand!(imm 0b1100)];
        AND [operand!(reg 0), operand!(imm 0b1010)];
        MOV [operand!(reg 1), operand!(imm 0b1100)];
        OR  [operand!(reg 1), operand!(imm 0b1010)];
        MOV [operand!(reg 2), operand!(imm 0b1100)];
        XOR [operand!(reg 2), operand!(imm 0b1010)];
        RET
    ]);

    assert_eq!(processor.register(0), 0b1000);
    assert_eq!(processor.register(1), 0b1110);
    assert_eq!(processor.register(2), 0b0110);
}

#[test]
fn shl_shifts_left() {
    let processor = run_image(&image![
        MOV [operand!(reg 0), operand!(imm 3)];
        SHL [operand!(reg 0), operand!(imm 4)];
        RET
    ]);

    assert_eq!(processor.register(0), 48);
}

#[test]
fn shr_is_logical() {
    let processor = run_image(&image![
        MOV [operand!(reg 0), operand!(imm -1)];
        SHR [operand!(reg 0), operand!(imm 4)];
        RET
    ]);

    // Zero-fill, not sign extension.
    assert_eq!(processor.register(0), 0x0FFF_FFFF);
}

#[test]
fn cmp_sets_flags() {
    let processor = run_image(&image![
        CMP [operand!(imm -3), operand!(imm 2)];
        RET
    ]);

    assert_eq!(
        processor.flags(),
        Flags {
            zero: false,
            greater: false,
            less: true
        }
    );

    let processor = run_image(&image![
        CMP [operand!(imm 5), operand!(imm 5)];
        RET
    ]);

    assert_eq!(
        processor.flags(),
        Flags {
            zero: true,
            greater: false,
            less: false
        }
    );
}

// Byte layout of the branch tests below:
//   0: CMP  (11 bytes)
//  11: Jcc  (6 bytes)
//  17: MOV R3, 0  (11 bytes)
//  28: RET  (1 byte)
//  29: MOV R3, 1  (11 bytes)
//  40: RET
fn branch_image(jump: Opcode, lhs: Word, rhs: Word) -> Vec<u8> {
    let mut code = Vec::new();
    write_instruction(
        &mut code,
        Opcode::CMP,
        &[operand!(imm lhs), operand!(imm rhs)],
    );
    write_instruction(&mut code, jump, &[operand!(imm 29)]);
    write_instruction(&mut code, Opcode::MOV, &[operand!(reg 3), operand!(imm 0)]);
    write_instruction(&mut code, Opcode::RET, &[]);
    write_instruction(&mut code, Opcode::MOV, &[operand!(reg 3), operand!(imm 1)]);
    write_instruction(&mut code, Opcode::RET, &[]);
    code
}

fn branch_taken(jump: Opcode, lhs: Word, rhs: Word) -> bool {
    run_image(&branch_image(jump, lhs, rhs)).register(3) == 1
}

#[test]
fn conditional_jumps_follow_signed_comparison() {
    assert!(branch_taken(Opcode::JL, -3, 2));
    assert!(!branch_taken(Opcode::JL, 2, -3));
    assert!(!branch_taken(Opcode::JL, 2, 2));

    assert!(branch_taken(Opcode::JG, 2, -3));
    assert!(!branch_taken(Opcode::JG, -3, 2));

    assert!(branch_taken(Opcode::JE, 7, 7));
    assert!(!branch_taken(Opcode::JE, 7, 8));

    assert!(branch_taken(Opcode::JNE, 7, 8));
    assert!(!branch_taken(Opcode::JNE, 7, 7));

    assert!(branch_taken(Opcode::JLE, -3, 2));
    assert!(branch_taken(Opcode::JLE, 2, 2));
    assert!(!branch_taken(Opcode::JLE, 3, 2));

    assert!(branch_taken(Opcode::JGE, 2, -3));
    assert!(branch_taken(Opcode::JGE, 2, 2));
    assert!(!branch_taken(Opcode::JGE, -3, 2));
}

#[test]
fn jmp_is_unconditional() {
    // 0: JMP 17, 6: MOV R0, 1 (skipped), 17: RET
    let mut code = Vec::new();
    write_instruction(&mut code, Opcode::JMP, &[operand!(imm 17)]);
    write_instruction(&mut code, Opcode::MOV, &[operand!(reg 0), operand!(imm 1)]);
    write_instruction(&mut code, Opcode::RET, &[]);

    let processor = run_image(&code);
    assert_eq!(processor.register(0), 0);
}

#[test]
fn push_pop_round_trip() {
    let processor = run_image(&image![
        PUSH [operand!(imm 42)];
        POP [operand!(reg 0)];
        RET
    ]);

    assert_eq!(processor.register(0), 42);
    // Balanced push/pop leaves only the consumed sentinel.
    assert_eq!(processor.register(SP_INDEX), STACK_SIZE as Word);
}

#[test]
fn push_evaluates_source_operand() {
    let processor = run_image(&image![
        MOV [operand!(reg 1), operand!(imm 23)];
        PUSH [operand!(reg 1)];
        POP [operand!(reg 2)];
        RET
    ]);

    assert_eq!(processor.register(2), 23);
}

#[test]
fn call_ret_round_trip() {
    // 0: CALL 8, 6: RET, 7: RET (never reached), 8: MOV R0, 42, 19: RET
    let mut code = Vec::new();
    write_instruction(&mut code, Opcode::CALL, &[operand!(imm 8)]);
    write_instruction(&mut code, Opcode::RET, &[]);
    write_instruction(&mut code, Opcode::RET, &[]);
    write_instruction(&mut code, Opcode::MOV, &[operand!(reg 0), operand!(imm 42)]);
    write_instruction(&mut code, Opcode::RET, &[]);

    let mut processor = Processor::new(&code, MEM_SIZE, STACK_SIZE).unwrap();
    let initial_sp = processor.register(SP_INDEX);
    processor.run().unwrap();

    assert_eq!(processor.register(0), 42);
    // The callee's RET restored the pointer; the final RET consumed the
    // sentinel on top of it.
    assert_eq!(processor.register(SP_INDEX), initial_sp + 4);
}

#[test]
fn store_and_load_memory() {
    let processor = run_image(&image![
        STORE [operand!(mem 100), operand!(imm 1234)];
        LOAD [operand!(reg 0), operand!(mem 100)];
        RET
    ]);

    assert_eq!(processor.register(0), 1234);
    assert_eq!(processor.memory().read_word(100), Ok(1234));
}

#[test]
fn memory_addressing_through_register() {
    let processor = run_image(&image![
        MOV [operand!(reg 1), operand!(imm 200)];
        STORE [operand!(mem reg 1), operand!(imm -5)];
        LOAD [operand!(reg 0), operand!(mem reg 1)];
        RET
    ]);

    assert_eq!(processor.register(0), -5);
}

#[test]
fn mov_between_memory_cells() {
    let processor = run_image(&image![
        MOV [operand!(mem 64), operand!(imm 9)];
        MOV [operand!(mem 68), operand!(mem 64)];
        LOAD [operand!(reg 0), operand!(mem 68)];
        RET
    ]);

    assert_eq!(processor.register(0), 9);
}

#[test]
fn invalid_opcode_faults() {
    let fault = run_fault(&[0xEE]);

    assert_eq!(fault, Fault::InvalidOpcode(0xEE));
}

#[test]
fn invalid_operand_type_faults() {
    // MOV with a type byte outside 0..=4.
    let code = vec![enum_to_u8(Opcode::MOV), 9, 0, 0, 0, 0, 9, 0, 0, 0, 0];
    let fault = run_fault(&code);

    assert_eq!(fault, Fault::InvalidOperandType(9));
}

#[test]
fn immediate_destination_faults() {
    let fault = run_fault(&image![
        MOV [operand!(imm 1), operand!(imm 2)];
        RET
    ]);

    assert_eq!(fault, Fault::InvalidDestination(OperandType::Immediate));
}

#[test]
fn memory_out_of_range_faults() {
    let fault = run_fault(&image![
        LOAD [operand!(reg 0), operand!(mem MEM_SIZE as Word)];
        RET
    ]);

    assert_matches!(fault, Fault::MemoryOutOfRange(_));
}

#[test]
fn negative_jump_target_faults() {
    let fault = run_fault(&image![
        JMP [operand!(imm -5)];
        RET
    ]);

    assert_eq!(fault, Fault::IpOutOfRange(-5));
}

#[test]
fn running_off_the_image_faults_eventually() {
    // No RET: execution falls through into zeroed memory, which decodes as
    // MOV with two immediate operands and faults on the destination.
    let fault = run_fault(&image![
        MOV [operand!(reg 0), operand!(imm 1)]
    ]);

    assert_eq!(fault, Fault::InvalidDestination(OperandType::Immediate));
}

#[test]
fn stack_underflow_faults() {
    let fault = run_fault(&image![
        POP [operand!(reg 0)];
        POP [operand!(reg 1)];
        RET
    ]);

    assert_matches!(fault, Fault::StackOutOfRange(_));
}

#[test]
fn stack_overflow_faults() {
    // 0: PUSH 1 (6 bytes), 6: JMP 0; pushes until the stack is exhausted.
    let fault = run_fault(&image![
        PUSH [operand!(imm 1)];
        JMP [operand!(imm 0)]
    ]);

    assert_matches!(fault, Fault::StackOutOfRange(_));
}

#[test]
fn register_index_out_of_range_faults() {
    let fault = run_fault(&image![
        MOV [operand!(reg 16), operand!(imm 1)];
        RET
    ]);

    assert_eq!(fault, Fault::RegisterOutOfRange(16));
}

#[test]
fn image_too_large_is_rejected() {
    let image = vec![0u8; MEM_SIZE as usize + 1];

    assert_matches!(
        Processor::new(&image, MEM_SIZE, STACK_SIZE),
        Err(Fault::ImageTooLarge { .. })
    );
}

#[test]
fn operand_counts_match_encoding() {
    assert_eq!(Opcode::ADD.operand_count(), 3);
    assert_eq!(Opcode::MOV.operand_count(), 2);
    assert_eq!(Opcode::CALL.operand_count(), 1);
    assert_eq!(Opcode::RET.operand_count(), 0);
}

#[test]
fn opcode_from_mnemonic() {
    assert_eq!("CMP".parse(), Ok(Opcode::CMP));
    assert_eq!("RET".parse(), Ok(Opcode::RET));
    assert!("NOP".parse::<Opcode>().is_err());
}
