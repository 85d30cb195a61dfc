use super::basics::{
    Address, Register, Value, FONT_OFFSET, FONT_SPRITES, MEMORY_SIZE, NUM_REGISTERS, ROM_START,
    SCREEN_PIXELS, STACK_DEPTH,
};

/// Register file of the machine.
///
/// `v[0xF]` is the flag register and is overwritten as a side effect of
/// arithmetic and drawing; programs should not keep values in it.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Registers {
    pub v: [u8; NUM_REGISTERS],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
}

impl Default for Registers {
    fn default() -> Self {
        Registers {
            v: [0; NUM_REGISTERS],
            i: 0,
            pc: ROM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
        }
    }
}

/// Everything an instruction may touch: registers, memory, call stack and
/// the framebuffer. Handlers receive it as one mutable parameter.
#[derive(Clone)]
pub struct MachineState {
    pub regs: Registers,
    pub memory: [u8; MEMORY_SIZE],
    pub stack: [u16; STACK_DEPTH],
    /// One byte per pixel, row-major. Non-zero means lit.
    pub screen: [u8; SCREEN_PIXELS],
}

impl MachineState {
    pub fn new() -> MachineState {
        let mut state = MachineState {
            regs: Registers::default(),
            memory: [0; MEMORY_SIZE],
            stack: [0; STACK_DEPTH],
            screen: [0; SCREEN_PIXELS],
        };
        state.install_font();
        state
    }

    fn install_font(&mut self) {
        for (mem_cell, font_byte) in self
            .memory
            .iter_mut()
            .skip(FONT_OFFSET as usize)
            .zip(FONT_SPRITES.iter())
        {
            *mem_cell = *font_byte;
        }
    }

    pub fn register(&mut self, reg: Register) -> &mut u8 {
        &mut self.regs.v[reg.index()]
    }

    pub fn set_vf(&mut self, value: u8) {
        self.regs.v[Register::VF.index()] = value;
    }

    pub fn vf(&self) -> u8 {
        self.regs.v[Register::VF.index()]
    }

    pub fn read(&self, addr: Address) -> Value {
        Value(self.memory[addr.index()])
    }

    pub fn write(&mut self, addr: Address, value: Value) {
        self.memory[addr.index()] = value.0;
    }

    /// Reads the big-endian instruction word at `addr`.
    pub fn word_at(&self, addr: Address) -> u16 {
        let high = self.read(addr).0 as u16;
        let low = self.read(addr.offset(1)).0 as u16;
        high << 8 | low
    }

    /// Advances the program counter past the next instruction.
    pub fn skip(&mut self) {
        self.regs.pc = self.regs.pc.wrapping_add(2);
    }

    /// Sets the program counter so the post-cycle increment lands on `addr`.
    pub fn jump_to(&mut self, addr: u16) {
        self.regs.pc = addr.wrapping_sub(2);
    }
}

impl Default for MachineState {
    fn default() -> Self {
        MachineState::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_state_new() {
        let state = MachineState::new();
        assert_eq!(state.regs.pc, 0x200);
        assert_eq!(state.regs.sp, 0);
        assert_eq!(state.regs.i, 0);
        assert!(state.regs.v.iter().all(|v| *v == 0));
        assert_eq!(&state.memory[..80], &FONT_SPRITES[..]);
        assert!(state.memory[80..].iter().all(|b| *b == 0));
        assert!(state.stack.iter().all(|s| *s == 0));
        assert!(state.screen.iter().all(|p| *p == 0));
    }

    #[test]
    fn test_word_at_is_big_endian_and_wraps() {
        let mut state = MachineState::new();
        state.memory[0x300] = 0xAB;
        state.memory[0x301] = 0xCD;
        assert_eq!(state.word_at(Address(0x300)), 0xABCD);
        state.memory[0xFFF] = 0x12;
        assert_eq!(state.word_at(Address(0xFFF)), 0x12F0);
    }
}
