use super::basics::{Address, Register, STACK_DEPTH};
use super::program::{decode, Opcode};
use super::state::MachineState;
use super::vm::VirtualMachine;
use std::sync::{Arc, Mutex, Weak};
use thiserror::Error;

/// A machine shared between the emulation loop and a debugger.
pub type SharedMachine = Arc<Mutex<VirtualMachine>>;

pub fn shared(vm: VirtualMachine) -> SharedMachine {
    Arc::new(Mutex::new(vm))
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum DebugError {
    #[error("no machine is attached to the debugger")]
    NotAttached,
    #[error("the attached machine no longer exists")]
    InstanceDropped,
    #[error("the attached machine's lock is poisoned")]
    Poisoned,
}

/// One row of a disassembly view.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Line {
    pub address: u16,
    pub word: u16,
    pub mnemonic: String,
}

/// Read/write window into at most one live machine.
///
/// Every access locks the machine, so a debugger on another thread never
/// observes a half-executed instruction. Values written are not validated.
#[derive(Default)]
pub struct Debugger {
    instance: Option<Weak<Mutex<VirtualMachine>>>,
}

impl Debugger {
    pub fn new() -> Debugger {
        Debugger { instance: None }
    }

    /// Returns false if a live machine is already attached. A handle whose
    /// machine has been dropped is replaced.
    pub fn attach(&mut self, vm: &SharedMachine) -> bool {
        if self.has_instance() {
            return false;
        }
        self.instance = Some(Arc::downgrade(vm));
        true
    }

    /// Returns false if nothing was attached.
    pub fn detach(&mut self) -> bool {
        self.instance.take().is_some()
    }

    /// True while attached to a machine that is still alive.
    pub fn has_instance(&self) -> bool {
        self.instance
            .as_ref()
            .map_or(false, |weak| weak.strong_count() > 0)
    }

    pub fn with_machine<R, F>(&self, f: F) -> Result<R, DebugError>
    where
        F: FnOnce(&mut VirtualMachine) -> R,
    {
        let weak = self.instance.as_ref().ok_or(DebugError::NotAttached)?;
        let vm = weak.upgrade().ok_or(DebugError::InstanceDropped)?;
        let mut guard = vm.lock().map_err(|_| DebugError::Poisoned)?;
        Ok(f(&mut *guard))
    }

    pub fn with_state<R, F>(&self, f: F) -> Result<R, DebugError>
    where
        F: FnOnce(&mut MachineState) -> R,
    {
        self.with_machine(|vm| f(vm.state_mut()))
    }

    pub fn memory(&self) -> Result<Vec<u8>, DebugError> {
        self.with_state(|state| state.memory.to_vec())
    }

    /// Writes `bytes` starting at `address`, wrapping at the end of memory.
    pub fn write_memory(&self, address: u16, bytes: &[u8]) -> Result<(), DebugError> {
        self.with_state(|state| {
            for (offset, byte) in bytes.iter().enumerate() {
                let addr = Address(address).offset(offset as u16);
                state.memory[addr.index()] = *byte;
            }
        })
    }

    pub fn stack(&self) -> Result<[u16; STACK_DEPTH], DebugError> {
        self.with_state(|state| state.stack)
    }

    pub fn set_stack_slot(&self, slot: usize, value: u16) -> Result<(), DebugError> {
        self.with_state(|state| state.stack[slot % STACK_DEPTH] = value)
    }

    pub fn screen(&self) -> Result<Vec<u8>, DebugError> {
        self.with_state(|state| state.screen.to_vec())
    }

    pub fn set_screen_cell(&self, index: usize, value: u8) -> Result<(), DebugError> {
        self.with_state(|state| {
            let len = state.screen.len();
            state.screen[index % len] = value;
        })
    }

    pub fn v_register(&self, index: u8) -> Result<u8, DebugError> {
        self.with_state(|state| *state.register(Register(index)))
    }

    pub fn set_v_register(&self, index: u8, value: u8) -> Result<(), DebugError> {
        self.with_state(|state| *state.register(Register(index)) = value)
    }

    pub fn stack_pointer(&self) -> Result<u8, DebugError> {
        self.with_state(|state| state.regs.sp)
    }

    pub fn set_stack_pointer(&self, value: u8) -> Result<(), DebugError> {
        self.with_state(|state| state.regs.sp = value)
    }

    pub fn i_register(&self) -> Result<u16, DebugError> {
        self.with_state(|state| state.regs.i)
    }

    pub fn set_i_register(&self, value: u16) -> Result<(), DebugError> {
        self.with_state(|state| state.regs.i = value)
    }

    pub fn program_counter(&self) -> Result<u16, DebugError> {
        self.with_state(|state| state.regs.pc)
    }

    pub fn set_program_counter(&self, value: u16) -> Result<(), DebugError> {
        self.with_state(|state| state.regs.pc = value)
    }

    pub fn delay_timer(&self) -> Result<u8, DebugError> {
        self.with_state(|state| state.regs.delay_timer)
    }

    pub fn set_delay_timer(&self, value: u8) -> Result<(), DebugError> {
        self.with_state(|state| state.regs.delay_timer = value)
    }

    pub fn sound_timer(&self) -> Result<u8, DebugError> {
        self.with_state(|state| state.regs.sound_timer)
    }

    pub fn set_sound_timer(&self, value: u8) -> Result<(), DebugError> {
        self.with_state(|state| state.regs.sound_timer = value)
    }

    /// Big-endian word at `address`. Does not touch the machine's decoder.
    pub fn instruction_at(&self, address: u16) -> Result<u16, DebugError> {
        self.with_state(|state| state.word_at(Address(address)))
    }

    pub fn disassemble(&self, instruction: u16) -> String {
        disassemble(instruction)
    }

    /// Disassembles `count` consecutive instructions from `start`.
    pub fn listing(&self, start: u16, count: usize) -> Result<Vec<Line>, DebugError> {
        self.with_state(|state| {
            (0..count)
                .map(|n| {
                    let address = start.wrapping_add(2 * n as u16);
                    let word = state.word_at(Address(address));
                    Line {
                        address,
                        word,
                        mnemonic: disassemble(word),
                    }
                })
                .collect()
        })
    }
}

/// Renders an instruction word as a mnemonic. Registers and addresses are
/// hex, immediate bytes for compare/load/add and the sprite height decimal.
pub fn disassemble(instruction: u16) -> String {
    let decoded = decode(instruction);
    let op = decoded.operand;
    let (x, y, n, kk, addr) = (op.x().0, op.y().0, op.n().0, op.kk().0, op.addr().0);

    match decoded.opcode {
        Opcode::Noop => "NOP/SYS".to_string(),
        Opcode::ClearDisplay => "CLS".to_string(),
        Opcode::ReturnSubroutine => "RET".to_string(),
        Opcode::Jump => format!("JP {:03X}", addr),
        Opcode::CallSubroutine => format!("CALL {:03X}", addr),
        Opcode::SkipEqualConst => format!("SE V{:X}, {}", x, kk),
        Opcode::SkipNotEqualConst => format!("SNE V{:X}, {}", x, kk),
        Opcode::SkipEqual => format!("SE V{:X}, V{:X}", x, y),
        Opcode::SetConst => format!("LD V{:X}, {}", x, kk),
        Opcode::AddConst => format!("ADD V{:X}, {}", x, kk),
        Opcode::Set => format!("LD V{:X}, V{:X}", x, y),
        Opcode::Or => format!("OR V{:X}, V{:X}", x, y),
        Opcode::And => format!("AND V{:X}, V{:X}", x, y),
        Opcode::Xor => format!("XOR V{:X}, V{:X}", x, y),
        Opcode::Add => format!("ADD V{:X}, V{:X}", x, y),
        Opcode::Sub => format!("SUB V{:X}, V{:X}", x, y),
        Opcode::RightShift => format!("SHR V{:X}", x),
        Opcode::NegSub => format!("SUBN V{:X}, V{:X}", x, y),
        Opcode::LeftShift => format!("SHL V{:X}", x),
        Opcode::SkipNotEqual => format!("SNE V{:X}, V{:X}", x, y),
        Opcode::SetI => format!("LD I, {:03X}", addr),
        Opcode::JumpAdd => format!("JP V0, {:03X}", addr),
        Opcode::Rand => format!("RND V{:X}, {:02X}", x, kk),
        Opcode::Draw => format!("DRW V{:X}, V{:X}, {}", x, y, n),
        Opcode::SkipKey => format!("SKP V{:X}", x),
        Opcode::SkipNotKey => format!("SKNP V{:X}", x),
        Opcode::GetDelayTimer => format!("LD V{:X}, DT", x),
        Opcode::WaitKey => format!("LD V{:X}, Key", x),
        Opcode::SetDelayTimer => format!("LD DT, V{:X}", x),
        Opcode::SetSoundTimer => format!("LD ST, V{:X}", x),
        Opcode::AddToI => format!("ADD I, V{:X}", x),
        Opcode::SpriteAddr => format!("LD F, V{:X}", x),
        Opcode::Decimal => format!("LD B, V{:X}", x),
        Opcode::StoreRegisters => format!("LD [I], V{:X}", x),
        Opcode::LoadRegisters => format!("LD V{:X}, [I]", x),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_attach_detach() {
        let vm = shared(VirtualMachine::new());
        let other = shared(VirtualMachine::new());
        let mut debugger = Debugger::new();
        assert!(!debugger.has_instance());
        assert!(!debugger.detach());
        assert!(debugger.attach(&vm));
        assert!(!debugger.attach(&other));
        assert!(debugger.has_instance());
        assert!(debugger.detach());
        assert!(!debugger.has_instance());
        assert!(debugger.attach(&other));
    }

    #[test]
    fn test_not_attached() {
        let debugger = Debugger::new();
        assert_eq!(debugger.program_counter(), Err(DebugError::NotAttached));
        assert_eq!(debugger.disassemble(0x00E0), "CLS");
    }

    #[test]
    fn test_dropped_instance() {
        let mut debugger = Debugger::new();
        {
            let vm = shared(VirtualMachine::new());
            assert!(debugger.attach(&vm));
        }
        assert!(!debugger.has_instance());
        assert_eq!(debugger.memory(), Err(DebugError::InstanceDropped));
        assert!(debugger.detach());
    }

    #[test]
    fn test_attach_after_instance_dropped() {
        let mut debugger = Debugger::new();
        {
            let vm = shared(VirtualMachine::new());
            assert!(debugger.attach(&vm));
        }
        let other = shared(VirtualMachine::new());
        assert!(!debugger.has_instance());
        assert!(debugger.attach(&other));
        assert!(debugger.has_instance());
        assert_eq!(debugger.program_counter(), Ok(0x200));
        assert!(!debugger.attach(&other));
    }

    #[test]
    fn test_disassemble() {
        let cases = [
            (0x0000, "NOP/SYS"),
            (0x0123, "NOP/SYS"),
            (0x00E0, "CLS"),
            (0x00EE, "RET"),
            (0x1ABC, "JP ABC"),
            (0x2042, "CALL 042"),
            (0x3A10, "SE VA, 16"),
            (0x4BFF, "SNE VB, 255"),
            (0x5120, "SE V1, V2"),
            (0x6A3C, "LD VA, 60"),
            (0x7301, "ADD V3, 1"),
            (0x8120, "LD V1, V2"),
            (0x8121, "OR V1, V2"),
            (0x8122, "AND V1, V2"),
            (0x8123, "XOR V1, V2"),
            (0x8124, "ADD V1, V2"),
            (0x8125, "SUB V1, V2"),
            (0x8126, "SHR V1"),
            (0x8127, "SUBN V1, V2"),
            (0x812E, "SHL V1"),
            (0x9120, "SNE V1, V2"),
            (0xA2F0, "LD I, 2F0"),
            (0xB300, "JP V0, 300"),
            (0xC40F, "RND V4, 0F"),
            (0xD125, "DRW V1, V2, 5"),
            (0xE19E, "SKP V1"),
            (0xE1A1, "SKNP V1"),
            (0xF107, "LD V1, DT"),
            (0xF10A, "LD V1, Key"),
            (0xF115, "LD DT, V1"),
            (0xF118, "LD ST, V1"),
            (0xF11E, "ADD I, V1"),
            (0xF129, "LD F, V1"),
            (0xF133, "LD B, V1"),
            (0xF155, "LD [I], V1"),
            (0xF165, "LD V1, [I]"),
        ];
        for (word, expected) in cases.iter() {
            assert_eq!(disassemble(*word), *expected, "word {:04X}", word);
        }
    }
}
