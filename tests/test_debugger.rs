use chip8_vm::emulator::{
    debugger::{disassemble, shared, DebugError, Debugger, SharedMachine},
    program::{decode, Opcode},
    vm::VirtualMachine,
};
use proptest::prelude::*;

fn attached() -> (SharedMachine, Debugger) {
    let vm = shared(VirtualMachine::new());
    let mut debugger = Debugger::new();
    assert!(debugger.attach(&vm));
    (vm, debugger)
}

#[test]
fn test_register_access() {
    let (vm, debugger) = attached();
    debugger.set_v_register(0x3, 0x42).unwrap();
    debugger.set_i_register(0x456).unwrap();
    debugger.set_program_counter(0x300).unwrap();
    debugger.set_stack_pointer(2).unwrap();
    debugger.set_delay_timer(9).unwrap();
    debugger.set_sound_timer(7).unwrap();

    {
        let vm = vm.lock().unwrap();
        let regs = &vm.state().regs;
        assert_eq!(regs.v[3], 0x42);
        assert_eq!(regs.i, 0x456);
        assert_eq!(regs.pc, 0x300);
        assert_eq!(regs.sp, 2);
        assert!(vm.should_play_sound());
    }

    assert_eq!(debugger.v_register(0x3), Ok(0x42));
    assert_eq!(debugger.i_register(), Ok(0x456));
    assert_eq!(debugger.program_counter(), Ok(0x300));
    assert_eq!(debugger.stack_pointer(), Ok(2));
    assert_eq!(debugger.delay_timer(), Ok(9));
    assert_eq!(debugger.sound_timer(), Ok(7));
}

#[test]
fn test_writes_are_not_validated() {
    let (vm, debugger) = attached();
    debugger.set_program_counter(0xFFFF).unwrap();
    debugger.set_stack_pointer(200).unwrap();
    assert_eq!(debugger.program_counter(), Ok(0xFFFF));
    assert_eq!(debugger.stack_pointer(), Ok(200));

    // Execution still masks what it reads.
    vm.lock().unwrap().step(&[false; 16], true);
    assert_eq!(debugger.program_counter(), Ok(0x0001));
}

#[test]
fn test_memory_stack_screen() {
    let (vm, debugger) = attached();
    debugger.write_memory(0xFFF, &[0xAA, 0xBB]).unwrap();
    let memory = debugger.memory().unwrap();
    assert_eq!(memory.len(), 4096);
    assert_eq!(memory[0xFFF], 0xAA);
    assert_eq!(memory[0x000], 0xBB);

    debugger.set_stack_slot(15, 0x2AB).unwrap();
    assert_eq!(debugger.stack().unwrap()[15], 0x2AB);

    debugger.set_screen_cell(64 * 31 + 63, 0xFF).unwrap();
    assert_eq!(debugger.screen().unwrap().len(), 2048);
    assert_ne!(vm.lock().unwrap().screen_pixel(63, 31), 0);
}

#[test]
fn test_listing() {
    let (vm, debugger) = attached();
    vm.lock()
        .unwrap()
        .load_program(&[0x00, 0xE0, 0xA2, 0xF0, 0xD0, 0x15, 0x12, 0x06])
        .unwrap();
    let listing = debugger.listing(0x200, 4).unwrap();
    let mnemonics: Vec<&str> = listing.iter().map(|line| line.mnemonic.as_str()).collect();
    assert_eq!(mnemonics, vec!["CLS", "LD I, 2F0", "DRW V0, V1, 5", "JP 206"]);
    assert_eq!(listing[3].address, 0x206);
    assert_eq!(listing[3].word, 0x1206);
    assert_eq!(debugger.instruction_at(0x202), Ok(0xA2F0));

    // Reading through the debugger does not disturb the decoder.
    assert_eq!(vm.lock().unwrap().last_decoded().opcode, Opcode::Noop);
}

#[test]
fn test_detached_access() {
    let (_vm, mut debugger) = attached();
    assert!(debugger.detach());
    assert_eq!(debugger.screen(), Err(DebugError::NotAttached));
    assert_eq!(debugger.set_delay_timer(1), Err(DebugError::NotAttached));
}

proptest! {
    #[test]
    fn test_draw_disassembly_matches_nibbles(x in 0u16..16, y in 0u16..16, n in 0u16..16) {
        let word = 0xD000 | x << 8 | y << 4 | n;
        prop_assert_eq!(disassemble(word), format!("DRW V{:X}, V{:X}, {}", x, y, n));
    }

    #[test]
    fn test_address_disassembly_is_full_width(addr in 0u16..0x1000) {
        prop_assert_eq!(disassemble(0xA000 | addr), format!("LD I, {:03X}", addr));
        prop_assert_eq!(disassemble(0xB000 | addr), format!("JP V0, {:03X}", addr));
        prop_assert_eq!(disassemble(0x1000 | addr), format!("JP {:03X}", addr));
    }

    #[test]
    fn test_byte_disassembly_is_decimal(x in 0u16..16, kk in 0u16..256) {
        let word = 0x6000 | x << 8 | kk;
        prop_assert_eq!(disassemble(word), format!("LD V{:X}, {}", x, kk));
    }

    #[test]
    fn test_listing_reflects_memory(address in 0x200u16..0xFFE, word in any::<u16>()) {
        let (_vm, debugger) = attached();
        debugger.write_memory(address, &word.to_be_bytes()).unwrap();
        let line = &debugger.listing(address, 1).unwrap()[0];
        prop_assert_eq!(line.word, word);
        prop_assert_eq!(&line.mnemonic, &disassemble(word));
    }

    #[test]
    fn test_decode_is_total(word in any::<u16>()) {
        let decoded = decode(word);
        prop_assert_eq!(Opcode::from_index(decoded.opcode.index()), Some(decoded.opcode));
        prop_assert!(decoded.operand.0 <= 0xFFF);
        prop_assert!(!disassemble(word).is_empty());
    }
}
