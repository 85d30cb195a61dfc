use super::basics::{Address, Register, Value};

/// The 35 dispatch slots an instruction word can decode to. The discriminant
/// is the slot index; `Noop` doubles as the target for unknown words.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
#[repr(u8)]
pub enum Opcode {
    Noop = 0,
    ClearDisplay,
    ReturnSubroutine,
    Jump,
    CallSubroutine,
    SkipEqualConst,
    SkipNotEqualConst,
    SkipEqual,
    SetConst,
    AddConst,
    Set,
    Or,
    And,
    Xor,
    Add,
    Sub,
    RightShift,
    NegSub,
    LeftShift,
    SkipNotEqual,
    SetI,
    JumpAdd,
    Rand,
    Draw,
    SkipKey,
    SkipNotKey,
    GetDelayTimer,
    WaitKey,
    SetDelayTimer,
    SetSoundTimer,
    AddToI,
    SpriteAddr,
    Decimal,
    StoreRegisters,
    LoadRegisters,
}

impl Opcode {
    pub const COUNT: usize = 35;

    pub const ALL: [Opcode; Opcode::COUNT] = [
        Opcode::Noop,
        Opcode::ClearDisplay,
        Opcode::ReturnSubroutine,
        Opcode::Jump,
        Opcode::CallSubroutine,
        Opcode::SkipEqualConst,
        Opcode::SkipNotEqualConst,
        Opcode::SkipEqual,
        Opcode::SetConst,
        Opcode::AddConst,
        Opcode::Set,
        Opcode::Or,
        Opcode::And,
        Opcode::Xor,
        Opcode::Add,
        Opcode::Sub,
        Opcode::RightShift,
        Opcode::NegSub,
        Opcode::LeftShift,
        Opcode::SkipNotEqual,
        Opcode::SetI,
        Opcode::JumpAdd,
        Opcode::Rand,
        Opcode::Draw,
        Opcode::SkipKey,
        Opcode::SkipNotKey,
        Opcode::GetDelayTimer,
        Opcode::WaitKey,
        Opcode::SetDelayTimer,
        Opcode::SetSoundTimer,
        Opcode::AddToI,
        Opcode::SpriteAddr,
        Opcode::Decimal,
        Opcode::StoreRegisters,
        Opcode::LoadRegisters,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Opcode> {
        Opcode::ALL.get(index).copied()
    }
}

/// The low 12 bits of an instruction word, viewed per opcode as an address,
/// a register and byte, two registers, or two registers and a nibble.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct Operand(pub u16);

impl Operand {
    pub fn x(self) -> Register {
        Register((self.0 >> 8 & 0x0F) as u8)
    }

    pub fn y(self) -> Register {
        Register((self.0 >> 4 & 0x0F) as u8)
    }

    pub fn n(self) -> Value {
        Value((self.0 & 0x0F) as u8)
    }

    pub fn kk(self) -> Value {
        Value((self.0 & 0xFF) as u8)
    }

    pub fn addr(self) -> Address {
        Address(self.0 & 0x0FFF)
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Decoded {
    pub opcode: Opcode,
    pub operand: Operand,
}

impl Default for Decoded {
    fn default() -> Self {
        Decoded {
            opcode: Opcode::Noop,
            operand: Operand(0),
        }
    }
}

/// Decodes a raw big-endian instruction word. Words that match no known form
/// decode to `Noop` with a zero operand.
pub fn decode(word: u16) -> Decoded {
    let nibbles = (
        (word >> 12 & 0x0F) as u8,
        (word >> 8 & 0x0F) as u8,
        (word >> 4 & 0x0F) as u8,
        (word & 0x0F) as u8,
    );
    let opcode = match nibbles {
        (0x0, _, 0xE, 0x0) => Opcode::ClearDisplay,
        (0x0, _, 0xE, 0xE) => Opcode::ReturnSubroutine,
        (0x1, _, _, _) => Opcode::Jump,
        (0x2, _, _, _) => Opcode::CallSubroutine,
        (0x3, _, _, _) => Opcode::SkipEqualConst,
        (0x4, _, _, _) => Opcode::SkipNotEqualConst,
        (0x5, _, _, 0x0) => Opcode::SkipEqual,
        (0x6, _, _, _) => Opcode::SetConst,
        (0x7, _, _, _) => Opcode::AddConst,
        (0x8, _, _, 0x0) => Opcode::Set,
        (0x8, _, _, 0x1) => Opcode::Or,
        (0x8, _, _, 0x2) => Opcode::And,
        (0x8, _, _, 0x3) => Opcode::Xor,
        (0x8, _, _, 0x4) => Opcode::Add,
        (0x8, _, _, 0x5) => Opcode::Sub,
        (0x8, _, _, 0x6) => Opcode::RightShift,
        (0x8, _, _, 0x7) => Opcode::NegSub,
        (0x8, _, _, 0xE) => Opcode::LeftShift,
        (0x9, _, _, 0x0) => Opcode::SkipNotEqual,
        (0xA, _, _, _) => Opcode::SetI,
        (0xB, _, _, _) => Opcode::JumpAdd,
        (0xC, _, _, _) => Opcode::Rand,
        (0xD, _, _, _) => Opcode::Draw,
        (0xE, _, 0x9, 0xE) => Opcode::SkipKey,
        (0xE, _, 0xA, 0x1) => Opcode::SkipNotKey,
        (0xF, _, 0x0, 0x7) => Opcode::GetDelayTimer,
        (0xF, _, 0x0, 0xA) => Opcode::WaitKey,
        (0xF, _, 0x1, 0x5) => Opcode::SetDelayTimer,
        (0xF, _, 0x1, 0x8) => Opcode::SetSoundTimer,
        (0xF, _, 0x1, 0xE) => Opcode::AddToI,
        (0xF, _, 0x2, 0x9) => Opcode::SpriteAddr,
        (0xF, _, 0x3, 0x3) => Opcode::Decimal,
        (0xF, _, 0x5, 0x5) => Opcode::StoreRegisters,
        (0xF, _, 0x6, 0x5) => Opcode::LoadRegisters,
        _ => return Decoded::default(),
    };
    Decoded {
        opcode,
        operand: Operand(word & 0x0FFF),
    }
}
