pub mod ascii_display;
pub mod basics;
pub mod debugger;
pub mod executor;
pub mod instructions;
pub mod program;
pub mod rom;
pub mod state;
pub mod vm;
