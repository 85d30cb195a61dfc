use chip8_vm::config::{Config, DEFAULT_MAX_FRAMES, DEFAULT_RUN_SPEED_HZ};
use chip8_vm::emulator::{
    ascii_display::draw_vm_display,
    debugger::{shared, DebugError, Debugger},
    executor::{run_vm_until, Executor},
    vm::VirtualMachine,
};
use clap::Parser;
use log::{error, info};
use std::{path::PathBuf, process};

const LISTING_BEFORE: u16 = 4;
const LISTING_LENGTH: usize = 9;

/// Runs a CHIP-8 ROM headless and prints the final screen.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(help = "Path to the ROM file to run")]
    rom: PathBuf,

    #[arg(short, long, default_value = "", help = "Keyboard keys held down for the whole run")]
    keys: String,

    #[arg(short = 's', long, default_value_t = DEFAULT_RUN_SPEED_HZ, help = "Instructions per second")]
    run_speed_hz: u32,

    #[arg(short, long, default_value_t = DEFAULT_MAX_FRAMES, help = "Frames to run before halting")]
    max_frames: u32,

    #[arg(long, help = "Keep running when the ROM jumps to itself")]
    no_detect_loop: bool,

    #[arg(long, help = "Let timers run down across pauses")]
    no_stop_timers: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            run_speed_hz: self.run_speed_hz,
            detect_loop: !self.no_detect_loop,
            stop_timers: !self.no_stop_timers,
            max_frames: self.max_frames,
            ..Config::default()
        }
    }
}

fn print_listing(debugger: &Debugger) -> Result<(), DebugError> {
    let pc = debugger.program_counter()?;
    let start = pc.saturating_sub(2 * LISTING_BEFORE);
    for line in debugger.listing(start, LISTING_LENGTH)? {
        let marker = if line.address == pc { ">" } else { " " };
        println!("{} {:03X}: {:04X}  {}", marker, line.address, line.word, line.mnemonic);
    }
    println!(
        "I={:03X} SP={} DT={} ST={}",
        debugger.i_register()?,
        debugger.stack_pointer()?,
        debugger.delay_timer()?,
        debugger.sound_timer()?
    );
    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let config = args.config();
    let keys = config.key_state(&args.keys);

    let mut vm = VirtualMachine::new();
    if let Err(err) = vm.load_rom(&args.rom) {
        error!("[APP]: {} ({:?})", err, err.status());
        process::exit(1);
    }

    let vm = shared(vm);
    let mut debugger = Debugger::new();
    debugger.attach(&vm);

    let mut executor = Executor::new(&config);
    let frames = match vm.lock() {
        Ok(mut guard) => run_vm_until(&mut executor, &mut guard, &keys, config.max_frames),
        Err(_) => {
            error!("[APP]: Machine lock poisoned");
            process::exit(1);
        }
    };
    if executor.is_running() {
        executor.stop();
    }
    info!("[APP]: {} after {} frames", executor.status(), frames);

    let printed = debugger.with_machine(|vm| draw_vm_display(vm));
    if let Err(err) = printed.and_then(|_| print_listing(&debugger)) {
        error!("[APP]: {}", err);
        process::exit(1);
    }
}
