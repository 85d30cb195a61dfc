use super::basics::KeyState;
use super::debugger::SharedMachine;
use super::vm::VirtualMachine;
use crate::config::Config;
use log::{debug, info};
use std::fmt;
use std::{
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

pub const FRAME_INTERVAL: Duration = Duration::from_micros(16667);

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum HaltReason {
    Idle,
    User,
    LoopDetected,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Status {
    Running,
    Stepped,
    Halted(HaltReason),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Running => write!(f, "Running"),
            Status::Stepped => write!(f, "Stepped"),
            Status::Halted(HaltReason::Idle) => write!(f, "Halted"),
            Status::Halted(HaltReason::User) => write!(f, "Halted (by user)"),
            Status::Halted(HaltReason::LoopDetected) => write!(f, "Halted (loop detected)"),
        }
    }
}

/// Turns frame times into instruction counts for a configured clock speed.
///
/// The fractional part of each frame's count is carried over so the long-run
/// rate matches `run_speed` exactly.
pub struct Executor {
    run_speed: u32,
    detect_loop: bool,
    stop_timers: bool,
    status: Status,
    error: f64,
    running_last: bool,
}

impl Executor {
    pub fn new(config: &Config) -> Executor {
        Executor {
            run_speed: config.run_speed_hz,
            detect_loop: config.detect_loop,
            stop_timers: config.stop_timers,
            status: Status::Halted(HaltReason::Idle),
            error: 0.0,
            running_last: false,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn start(&mut self) {
        self.status = Status::Running;
    }

    pub fn stop(&mut self) {
        self.status = Status::Halted(HaltReason::User);
    }

    /// Executes one instruction while halted.
    pub fn step(&mut self, vm: &mut VirtualMachine, keys: &KeyState) {
        if self.is_running() {
            return;
        }
        vm.cycle(1, keys, false);
        self.status = Status::Stepped;
    }

    /// Advances the machine by one frame of `delta` wall-clock time and
    /// returns the number of instructions executed.
    pub fn update(&mut self, vm: &mut VirtualMachine, delta: Duration, keys: &KeyState) -> u32 {
        if !self.is_running() {
            self.running_last = false;
            return 0;
        }

        let cycles = self.run_speed as f64 * delta.as_secs_f64();
        let mut whole = cycles.floor();
        self.error += cycles - whole;
        if self.error >= 1.0 {
            whole += 1.0;
            self.error -= self.error.floor();
        }

        if self.detect_loop && vm.detect_loop() {
            info!("[APP]: Loop detected at {:03X}, halting", vm.program_counter());
            self.status = Status::Halted(HaltReason::LoopDetected);
            self.running_last = false;
            return 0;
        }

        // Time spent halted must not count against the timers.
        let freeze_timers = self.stop_timers && !self.running_last;
        let count = whole as u32;
        vm.cycle(count, keys, freeze_timers);
        self.running_last = true;
        count
    }
}

/// Runs the executor on the calling thread, sleeping `FRAME_INTERVAL` between
/// frames so timers see real time pass. Stops once the executor halts or
/// after `max_frames` frames and returns the number of frames run.
pub fn run_vm_until(
    executor: &mut Executor,
    vm: &mut VirtualMachine,
    keys: &KeyState,
    max_frames: u32,
) -> u32 {
    executor.start();
    let mut last = Instant::now();
    let mut frames = 0;
    while executor.is_running() && frames < max_frames {
        thread::sleep(FRAME_INTERVAL);
        let now = Instant::now();
        executor.update(vm, now.duration_since(last), keys);
        last = now;
        frames += 1;
    }
    frames
}

/// Runs the executor on its own thread, one frame every `FRAME_INTERVAL`,
/// until `stopper` is set or the executor halts. The executor is handed back
/// through the join handle.
pub fn run_concurrent_vm_until(
    mut executor: Executor,
    vm: SharedMachine,
    keys: Arc<Mutex<KeyState>>,
    stopper: Arc<Mutex<bool>>,
) -> JoinHandle<Executor> {
    executor.start();
    thread::spawn(move || {
        let mut last = Instant::now();
        loop {
            match stopper.lock() {
                Ok(stop) if !*stop => {}
                _ => break,
            }
            thread::sleep(FRAME_INTERVAL);
            let now = Instant::now();
            let delta = now.duration_since(last);
            last = now;

            let keys = match keys.lock() {
                Ok(keys) => *keys,
                Err(_) => break,
            };
            match vm.lock() {
                Ok(mut guard) => {
                    executor.update(&mut guard, delta, &keys);
                }
                Err(_) => break,
            }
            if !executor.is_running() {
                break;
            }
        }
        debug!("[APP]: Executor thread finished: {}", executor.status());
        executor
    })
}
