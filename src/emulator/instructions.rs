//! The 35 instruction handlers. Each one takes the decoded operand, the
//! machine state and the current key state, and mutates the state in place.
//!
//! Handlers that set an absolute program counter subtract 2 first, since the
//! cycle advances the counter by 2 after every instruction.

use super::basics::{
    Address, KeyState, Register, Value, FONT_GLYPH_SIZE, FONT_OFFSET, KEYPAD_LAYOUT,
    SCREEN_PIXELS, SCREEN_WIDTH, STACK_DEPTH,
};
use super::program::{Decoded, Opcode, Operand};
use super::state::MachineState;
use arrayvec::ArrayVec;
use rand::Rng;

type Handler = fn(Operand, &mut MachineState, &KeyState);

/// Runs the handler for an already decoded instruction.
pub fn execute(decoded: Decoded, state: &mut MachineState, keys: &KeyState) {
    handler(decoded.opcode)(decoded.operand, state, keys)
}

fn handler(opcode: Opcode) -> Handler {
    match opcode {
        Opcode::Noop => noop,
        Opcode::ClearDisplay => clear_display,
        Opcode::ReturnSubroutine => return_subroutine,
        Opcode::Jump => jump,
        Opcode::CallSubroutine => call_subroutine,
        Opcode::SkipEqualConst => skip_equal_const,
        Opcode::SkipNotEqualConst => skip_not_equal_const,
        Opcode::SkipEqual => skip_equal,
        Opcode::SetConst => set_const,
        Opcode::AddConst => add_const,
        Opcode::Set => set,
        Opcode::Or => or,
        Opcode::And => and,
        Opcode::Xor => xor,
        Opcode::Add => add,
        Opcode::Sub => sub,
        Opcode::RightShift => right_shift,
        Opcode::NegSub => neg_sub,
        Opcode::LeftShift => left_shift,
        Opcode::SkipNotEqual => skip_not_equal,
        Opcode::SetI => set_i,
        Opcode::JumpAdd => jump_add,
        Opcode::Rand => rand_and,
        Opcode::Draw => draw,
        Opcode::SkipKey => skip_key,
        Opcode::SkipNotKey => skip_not_key,
        Opcode::GetDelayTimer => get_delay_timer,
        Opcode::WaitKey => wait_key,
        Opcode::SetDelayTimer => set_delay_timer,
        Opcode::SetSoundTimer => set_sound_timer,
        Opcode::AddToI => add_to_i,
        Opcode::SpriteAddr => sprite_addr,
        Opcode::Decimal => decimal,
        Opcode::StoreRegisters => store_registers,
        Opcode::LoadRegisters => load_registers,
    }
}

/// Hex values of every held key, in keypad slot order.
pub fn pressed_keys(keys: &KeyState) -> ArrayVec<[u8; 16]> {
    keys.iter()
        .zip(KEYPAD_LAYOUT.iter())
        .filter(|(held, _)| **held)
        .map(|(_, value)| *value)
        .collect()
}

fn read_pair(op: Operand, state: &mut MachineState) -> (u8, u8) {
    let x = *state.register(op.x());
    let y = *state.register(op.y());
    (x, y)
}

// Jumps

fn noop(_: Operand, _: &mut MachineState, _: &KeyState) {}

fn return_subroutine(_: Operand, state: &mut MachineState, _: &KeyState) {
    let regs = &mut state.regs;
    regs.pc = state.stack[regs.sp as usize % STACK_DEPTH];
    // No underflow below an empty stack.
    if regs.sp > 0 {
        regs.sp -= 1;
    }
}

fn jump(op: Operand, state: &mut MachineState, _: &KeyState) {
    state.jump_to(op.addr().0);
}

/// Pushes the current PC and jumps. There is no overflow guard: past 16
/// nested calls the slot index wraps around.
fn call_subroutine(op: Operand, state: &mut MachineState, _: &KeyState) {
    state.regs.sp = state.regs.sp.wrapping_add(1);
    state.stack[state.regs.sp as usize % STACK_DEPTH] = state.regs.pc;
    state.jump_to(op.addr().0);
}

fn jump_add(op: Operand, state: &mut MachineState, _: &KeyState) {
    let v0 = *state.register(Register(0)) as u16;
    state.jump_to(op.addr().0.wrapping_add(v0));
}

// Conditionals

fn skip_equal_const(op: Operand, state: &mut MachineState, _: &KeyState) {
    if *state.register(op.x()) == op.kk().0 {
        state.skip();
    }
}

fn skip_not_equal_const(op: Operand, state: &mut MachineState, _: &KeyState) {
    if *state.register(op.x()) != op.kk().0 {
        state.skip();
    }
}

fn skip_equal(op: Operand, state: &mut MachineState, _: &KeyState) {
    let (x, y) = read_pair(op, state);
    if x == y {
        state.skip();
    }
}

fn skip_not_equal(op: Operand, state: &mut MachineState, _: &KeyState) {
    let (x, y) = read_pair(op, state);
    if x != y {
        state.skip();
    }
}

// Register arithmetic
//
// The flag is written before the result, so with Vx = VF the result wins.

fn set_const(op: Operand, state: &mut MachineState, _: &KeyState) {
    *state.register(op.x()) = op.kk().0;
}

fn add_const(op: Operand, state: &mut MachineState, _: &KeyState) {
    let vx = state.register(op.x());
    *vx = vx.wrapping_add(op.kk().0);
}

fn set(op: Operand, state: &mut MachineState, _: &KeyState) {
    let (_, y) = read_pair(op, state);
    *state.register(op.x()) = y;
}

fn or(op: Operand, state: &mut MachineState, _: &KeyState) {
    let (x, y) = read_pair(op, state);
    *state.register(op.x()) = x | y;
}

fn and(op: Operand, state: &mut MachineState, _: &KeyState) {
    let (x, y) = read_pair(op, state);
    *state.register(op.x()) = x & y;
}

fn xor(op: Operand, state: &mut MachineState, _: &KeyState) {
    let (x, y) = read_pair(op, state);
    *state.register(op.x()) = x ^ y;
}

fn add(op: Operand, state: &mut MachineState, _: &KeyState) {
    let (x, y) = read_pair(op, state);
    let (sum, carry) = x.overflowing_add(y);
    state.set_vf(carry as u8);
    *state.register(op.x()) = sum;
}

fn sub(op: Operand, state: &mut MachineState, _: &KeyState) {
    let (x, y) = read_pair(op, state);
    state.set_vf((x > y) as u8);
    *state.register(op.x()) = x.wrapping_sub(y);
}

fn right_shift(op: Operand, state: &mut MachineState, _: &KeyState) {
    let x = *state.register(op.x());
    state.set_vf(x & 0x01);
    let vx = state.register(op.x());
    *vx >>= 1;
}

/// VF is 1 unless Vy is strictly greater than Vx, the inverse of `sub`.
fn neg_sub(op: Operand, state: &mut MachineState, _: &KeyState) {
    let (x, y) = read_pair(op, state);
    state.set_vf((y <= x) as u8);
    // Operands are re-read: either one may be the flag register.
    let (x, y) = read_pair(op, state);
    *state.register(op.x()) = y.wrapping_sub(x);
}

/// VF receives the raw top bit (0x80), not a normalised 1.
fn left_shift(op: Operand, state: &mut MachineState, _: &KeyState) {
    let x = *state.register(op.x());
    state.set_vf(x & 0x80);
    let vx = state.register(op.x());
    *vx <<= 1;
}

fn rand_and(op: Operand, state: &mut MachineState, _: &KeyState) {
    let rand = rand::thread_rng().gen::<u8>();
    *state.register(op.x()) = rand & op.kk().0;
}

// Graphics

fn clear_display(_: Operand, state: &mut MachineState, _: &KeyState) {
    for pixel in state.screen.iter_mut() {
        *pixel = 0;
    }
}

/// XORs an N-byte sprite from I onto the screen at (Vx, Vy). Wrapping is
/// done over the linear pixel index, so a sprite leaving the right edge
/// continues on the next row and one leaving the bottom restarts at the top.
/// VF ends up 1 if any lit pixel was turned off.
fn draw(op: Operand, state: &mut MachineState, _: &KeyState) {
    state.set_vf(0);
    let i = Address(state.regs.i);
    for row in 0..op.n().0 as u16 {
        let sprite_line = state.read(i.offset(row)).0;
        for bit in 0..8usize {
            if sprite_line & (0x80 >> bit) == 0 {
                continue;
            }
            let x = *state.register(op.x()) as usize + bit;
            let y = *state.register(op.y()) as usize + row as usize;
            let pos = (x + y * SCREEN_WIDTH as usize) % SCREEN_PIXELS;

            let collision = state.screen[pos] & 1;
            let flag = state.vf() | collision;
            state.set_vf(flag);
            state.screen[pos] = !state.screen[pos];
        }
    }
}

fn sprite_addr(op: Operand, state: &mut MachineState, _: &KeyState) {
    let digit = *state.register(op.x()) as u16;
    state.regs.i = FONT_OFFSET + digit * FONT_GLYPH_SIZE;
}

// Key presses

fn skip_key(op: Operand, state: &mut MachineState, keys: &KeyState) {
    let key = Register(*state.register(op.x())).index();
    if keys[key] {
        state.skip();
    }
}

fn skip_not_key(op: Operand, state: &mut MachineState, keys: &KeyState) {
    let key = Register(*state.register(op.x())).index();
    if !keys[key] {
        state.skip();
    }
}

/// Stores the first held key in Vx. With nothing held the PC is wound back
/// so the instruction runs again on the next cycle.
fn wait_key(op: Operand, state: &mut MachineState, keys: &KeyState) {
    match pressed_keys(keys).first() {
        Some(value) => *state.register(op.x()) = *value,
        None => state.regs.pc = state.regs.pc.wrapping_sub(2),
    }
}

// Timers

fn get_delay_timer(op: Operand, state: &mut MachineState, _: &KeyState) {
    *state.register(op.x()) = state.regs.delay_timer;
}

fn set_delay_timer(op: Operand, state: &mut MachineState, _: &KeyState) {
    state.regs.delay_timer = *state.register(op.x());
}

fn set_sound_timer(op: Operand, state: &mut MachineState, _: &KeyState) {
    state.regs.sound_timer = *state.register(op.x());
}

// I register

fn set_i(op: Operand, state: &mut MachineState, _: &KeyState) {
    state.regs.i = op.addr().0;
}

fn add_to_i(op: Operand, state: &mut MachineState, _: &KeyState) {
    let x = *state.register(op.x()) as u16;
    state.regs.i = state.regs.i.wrapping_add(x);
}

fn decimal(op: Operand, state: &mut MachineState, _: &KeyState) {
    let value = *state.register(op.x());
    let i = Address(state.regs.i);
    state.write(i, Value(value / 100));
    state.write(i.offset(1), Value(value / 10 % 10));
    state.write(i.offset(2), Value(value % 10));
}

fn store_registers(op: Operand, state: &mut MachineState, _: &KeyState) {
    let i = Address(state.regs.i);
    for reg in 0..=op.x().0 {
        let value = Value(*state.register(Register(reg)));
        state.write(i.offset(reg as u16), value);
    }
}

fn load_registers(op: Operand, state: &mut MachineState, _: &KeyState) {
    let i = Address(state.regs.i);
    for reg in 0..=op.x().0 {
        *state.register(Register(reg)) = state.read(i.offset(reg as u16)).0;
    }
}
