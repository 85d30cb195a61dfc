pub const MEMORY_SIZE: usize = 4096;
pub const ROM_START: u16 = 0x200;
pub const ROM_MAX_SIZE: usize = 0xE00;
pub const SCREEN_WIDTH: u8 = 64;
pub const SCREEN_HEIGHT: u8 = 32;
pub const SCREEN_PIXELS: usize = SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize;
pub const FONT_OFFSET: u16 = 0;
pub const FONT_GLYPH_SIZE: u16 = 5;
pub const STACK_DEPTH: usize = 16;
pub const NUM_REGISTERS: usize = 16;
pub const NUM_KEYS: usize = 16;

/// Mask applied to every memory access so addresses stay inside the 4K space.
pub const ADDRESS_MASK: u16 = 0x0FFF;

/// State of the 16 keys for one cycle call, `true` meaning held down.
pub type KeyState = [bool; NUM_KEYS];

/// Hex value produced by each of the 16 linear key slots when waiting for a
/// key press. The slots follow the physical 4x4 keypad:
///
/// ```text
/// 1 2 3 C
/// 4 5 6 D
/// 7 8 9 E
/// A 0 B F
/// ```
pub const KEYPAD_LAYOUT: [u8; NUM_KEYS] = [
    0x1, 0x2, 0x3, 0xC, 0x4, 0x5, 0x6, 0xD, 0x7, 0x8, 0x9, 0xE, 0xA, 0x0, 0xB, 0xF,
];

pub const FONT_SPRITES: [u8; 16 * FONT_GLYPH_SIZE as usize] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, 0x20, 0x60, 0x20, 0x20, 0x70, 0xF0, 0x10, 0xF0, 0x80, 0xF0,
    0xF0, 0x10, 0xF0, 0x10, 0xF0, 0x90, 0x90, 0xF0, 0x10, 0x10, 0xF0, 0x80, 0xF0, 0x10, 0xF0,
    0xF0, 0x80, 0xF0, 0x90, 0xF0, 0xF0, 0x10, 0x20, 0x40, 0x40, 0xF0, 0x90, 0xF0, 0x90, 0xF0,
    0xF0, 0x90, 0xF0, 0x10, 0xF0, 0xF0, 0x90, 0xF0, 0x90, 0x90, 0xE0, 0x90, 0xE0, 0x90, 0xE0,
    0xF0, 0x80, 0x80, 0x80, 0xF0, 0xE0, 0x90, 0x90, 0x90, 0xE0, 0xF0, 0x80, 0xF0, 0x80, 0xF0,
    0xF0, 0x80, 0xF0, 0x80, 0x80,
];

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Address(pub u16);

impl Address {
    /// Index into memory, wrapped into the address space.
    pub fn index(self) -> usize {
        (self.0 & ADDRESS_MASK) as usize
    }

    pub fn offset(self, by: u16) -> Address {
        Address(self.0.wrapping_add(by))
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Register(pub u8);

impl Register {
    pub const VF: Register = Register(0xF);

    pub fn index(self) -> usize {
        (self.0 & 0x0F) as usize
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Value(pub u8);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_address_wraps() {
        assert_eq!(Address(0x0FFF).index(), 0xFFF);
        assert_eq!(Address(0x1000).index(), 0);
        assert_eq!(Address(0xFFFF).offset(2), Address(1));
    }

    #[test]
    fn test_font_fits_below_rom() {
        assert_eq!(FONT_SPRITES.len(), 80);
        assert!(FONT_OFFSET as usize + FONT_SPRITES.len() <= ROM_START as usize);
        assert_eq!(ROM_START as usize + ROM_MAX_SIZE, MEMORY_SIZE);
    }

    #[test]
    fn test_keypad_layout_is_permutation() {
        let mut seen = [false; NUM_KEYS];
        for value in KEYPAD_LAYOUT.iter() {
            seen[*value as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
