//! A CHIP-8 virtual machine.
//!
//! The crate owns the machine state, instruction decoding and the frame
//! cadence. Windowing, key polling and ROM storage are left to the host,
//! which plugs in through [`Input`] and reads the screen through [`Display`].
mod cpu;
mod display;
mod emulator;
mod error;
mod instruction;
mod memory;
mod timer;

pub use cpu::{StepOutcome, CPU};
pub use display::{FramebufferDisplay, FRAME_BUFFER_PIXEL_HEIGHT, FRAME_BUFFER_PIXEL_WIDTH};
pub use emulator::{read_rom, Emulator, EmulatorConfig, EngineState};
pub use error::{Error, Result};
pub use instruction::{Instruction, Opcode};
pub use memory::{Memory, PROGRAM_BASE_ADDRESS, PROGRAM_CAPACITY};

/// Source of the bytes used by the random instruction.
pub type RandomNumberProvider = dyn FnMut() -> u8;

/// The 16 key hex keypad as seen by the machine.
pub trait Input {
    /// Is logical key `key` (0x0-0xF) held right now.
    fn is_key_down(&self, key: u8) -> bool;
    /// Any currently held key, if one is.
    fn pressed_key(&self) -> Option<u8>;
}

pub trait Display {
    fn is_dirty(&self) -> bool;
    fn clear_dirty(&mut self);
    fn is_pixel_on(&self, x: usize, y: usize) -> bool;
    fn rgba_framebuffer(&self) -> Vec<u32>;
    /// XOR `sprite` onto the screen with its top left corner at `(x, y)`,
    /// wrapping at the edges. Returns whether any lit pixel was turned off.
    fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool;
    fn cls(&mut self);
}
