use crate::emulator::basics::{KeyState, NUM_KEYS};
use lazy_static::lazy_static;
use std::collections::HashMap;

pub const DEFAULT_RUN_SPEED_HZ: u32 = 500;
pub const DEFAULT_MAX_FRAMES: u32 = 60 * 10;

lazy_static! {
    /// Left-hand block of a QWERTY keyboard, row by row, onto slots 0x0..0xF.
    pub static ref DEFAULT_KEYMAP: HashMap<char, u8> = "1234qwerasdfzxcv"
        .chars()
        .enumerate()
        .map(|(slot, key)| (key, slot as u8))
        .collect();
}

#[derive(Clone, Debug)]
pub struct Config {
    pub run_speed_hz: u32,
    pub detect_loop: bool,
    pub stop_timers: bool,
    /// Frames the headless runner executes before giving up on a halt.
    pub max_frames: u32,
    pub keymap: HashMap<char, u8>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            run_speed_hz: DEFAULT_RUN_SPEED_HZ,
            detect_loop: true,
            stop_timers: true,
            max_frames: DEFAULT_MAX_FRAMES,
            keymap: DEFAULT_KEYMAP.clone(),
        }
    }
}

impl Config {
    /// Key array with every slot whose keyboard key appears in `held` set.
    /// Matching is case-insensitive and unmapped characters are ignored.
    pub fn key_state(&self, held: &str) -> KeyState {
        let mut keys = [false; NUM_KEYS];
        for chr in held.chars().flat_map(char::to_lowercase) {
            if let Some(slot) = self.keymap.get(&chr) {
                keys[*slot as usize % NUM_KEYS] = true;
            }
        }
        keys
    }
}
