use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Faults raised while loading or running a program.
///
/// Every variant other than the two load faults halts the [`Emulator`](crate::Emulator)
/// until it is reset.
#[derive(Debug, Error)]
pub enum Error {
    #[error("ROM is {size} bytes but only {capacity} bytes fit in program memory")]
    RomTooLarge { size: usize, capacity: usize },

    #[error("could not read ROM {}", path.display())]
    RomUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown opcode {opcode:#06x} at {address:#05x}")]
    UnknownOpcode { opcode: u16, address: u16 },

    #[error("memory access out of bounds at {address:#06x}")]
    AddressOutOfBounds { address: usize },

    /// Raised on fetch. After a jump past the end of memory the address is the
    /// jump target, not the address of the jump instruction.
    #[error("program counter {address:#06x} is past the end of memory")]
    ProgramCounterOutOfBounds { address: u16 },

    #[error("call stack overflow at depth {depth}")]
    StackOverflow { depth: usize },

    #[error("return with an empty call stack")]
    StackUnderflow,

    #[error("emulator is halted")]
    Halted,
}
