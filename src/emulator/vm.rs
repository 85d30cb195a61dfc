use super::basics::{Address, KeyState, ROM_START, SCREEN_PIXELS, SCREEN_WIDTH};
use super::instructions;
use super::program::{decode, Decoded, Opcode};
use super::rom::{base_name, check_size, RomError, RomInfo};
use super::state::MachineState;
use log::{info, trace, warn};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

/// Rate at which the delay and sound timers count down.
pub const TIMER_HZ: u128 = 60;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Holds the logic of a virtual machine in action: the register file,
/// memory, stack and screen, the last decoded instruction, and the
/// bookkeeping that drives the timers from wall-clock time.
pub struct VirtualMachine {
    state: MachineState,
    decoded: Decoded,
    last_pc: u16,
    last_tick: Option<Instant>,
    /// Elapsed nanoseconds times `TIMER_HZ` not yet turned into a tick.
    pending_ticks: u128,
    rom: RomInfo,
}

impl VirtualMachine {
    /// Creates a new VM instance with all registers and memory set accordingly.
    pub fn new() -> VirtualMachine {
        VirtualMachine {
            state: MachineState::new(),
            decoded: Decoded::default(),
            last_pc: ROM_START,
            last_tick: None,
            pending_ticks: 0,
            rom: RomInfo::default(),
        }
    }

    /// Zeroes registers, stack and screen, reinstalls the font and forgets the
    /// loaded ROM.
    pub fn reset(&mut self) {
        *self = VirtualMachine::new();
    }

    /// Loads a ROM file to 0x200. On failure the machine is left untouched.
    pub fn load_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<(), RomError> {
        let path = path.as_ref();
        let name = base_name(path);

        let metadata = match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => {
                warn!("[EMU]: ROM {} was not found", name);
                return Err(RomError::FileNotFound(name));
            }
        };

        let size = metadata.len() as usize;
        if let Err(err) = check_size(&name, size) {
            warn!("[EMU]: {}", err);
            return Err(err);
        }

        let mut raw_rom = Vec::with_capacity(size);
        let read = File::open(path).and_then(|mut file| file.read_to_end(&mut raw_rom));
        if let Err(err) = read {
            warn!("[EMU]: ROM {} could not be loaded: {}", name, err);
            return Err(RomError::FileNotGood(name));
        }
        // The file may have changed between the size check and the read.
        check_size(&name, raw_rom.len())?;

        self.install(&raw_rom, RomInfo::from_path(path, raw_rom.len()));
        info!("[EMU]: Loaded ROM {} ({} bytes)", name, raw_rom.len());
        Ok(())
    }

    /// Loads a ROM image already in memory, with the same size limits as
    /// `load_rom`.
    pub fn load_program(&mut self, raw_rom: &[u8]) -> Result<(), RomError> {
        check_size("<memory>", raw_rom.len())?;
        let info = RomInfo {
            size: raw_rom.len(),
            ..RomInfo::default()
        };
        self.install(raw_rom, info);
        Ok(())
    }

    fn install(&mut self, raw_rom: &[u8], info: RomInfo) {
        self.reset();
        let start = ROM_START as usize;
        self.state.memory[start..start + raw_rom.len()].copy_from_slice(raw_rom);
        self.rom = info;
    }

    /// Runs `num` fetch-decode-execute steps.
    pub fn cycle(&mut self, num: u32, keys: &KeyState, freeze_timers: bool) {
        for _ in 0..num {
            self.step(keys, freeze_timers);
        }
    }

    /// Executes a single instruction. Timers are decayed by the wall-clock
    /// time since the previous step first, unless frozen.
    pub fn step(&mut self, keys: &KeyState, freeze_timers: bool) {
        let now = Instant::now();
        let elapsed = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_tick = Some(now);
        if !freeze_timers {
            self.decay_timers(elapsed);
        }

        self.last_pc = self.state.regs.pc;
        let word = self.state.word_at(Address(self.last_pc));
        self.decoded = decode(word);
        trace!(
            "{:03X}: {:04X} {:?} {:03X}",
            self.last_pc,
            word,
            self.decoded.opcode,
            self.decoded.operand.0
        );
        instructions::execute(self.decoded, &mut self.state, keys);
        self.state.skip();
    }

    /// Counts both timers down by `elapsed` at 60Hz, carrying fractions of a
    /// tick over to the next call.
    pub fn decay_timers(&mut self, elapsed: Duration) {
        self.pending_ticks += elapsed.as_nanos() * TIMER_HZ;
        let ticks = self.pending_ticks / NANOS_PER_SEC;
        self.pending_ticks %= NANOS_PER_SEC;
        let ticks = ticks.min(u8::MAX as u128) as u8;

        let regs = &mut self.state.regs;
        regs.delay_timer = regs.delay_timer.saturating_sub(ticks);
        regs.sound_timer = regs.sound_timer.saturating_sub(ticks);
    }

    /// Raw screen cell at (x, y); non-zero means lit.
    pub fn screen_pixel(&self, x: u8, y: u8) -> u8 {
        let index = x as usize + y as usize * SCREEN_WIDTH as usize;
        self.state.screen[index % SCREEN_PIXELS]
    }

    pub fn should_play_sound(&self) -> bool {
        self.state.regs.sound_timer > 0
    }

    /// True if the last instruction was a jump to its own address.
    pub fn detect_loop(&self) -> bool {
        self.decoded.opcode == Opcode::Jump && self.decoded.operand.0 == self.last_pc
    }

    pub fn rom_info(&self) -> &RomInfo {
        &self.rom
    }

    pub fn last_decoded(&self) -> Decoded {
        self.decoded
    }

    pub fn program_counter(&self) -> u16 {
        self.state.regs.pc
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }
}

impl Default for VirtualMachine {
    fn default() -> Self {
        VirtualMachine::new()
    }
}
