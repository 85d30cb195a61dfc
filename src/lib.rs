pub mod config;
pub mod emulator;
