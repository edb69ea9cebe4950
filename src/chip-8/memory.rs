use crate::error::{Error, Result};

pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_BASE_ADDRESS: u16 = 0x200;
pub const PROGRAM_CAPACITY: usize = MEMORY_SIZE - PROGRAM_BASE_ADDRESS as usize;
pub const FONTSET_BASE_ADDRESS: u16 = 0x50;
const FONT_GLYPH_STRIDE: u16 = 5;
const FONTSET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Main memory holding 4KiB of data.
///
/// The glyph table lives at 0x50 and programs are loaded at 0x200. Every
/// access is bounds checked and reported as [`Error::AddressOutOfBounds`]
/// instead of panicking, since addresses are computed by the program.
pub struct Memory {
    memory: [u8; MEMORY_SIZE],
}

impl Memory {
    /// Construct memory holding `rom` at 0x200.
    ///
    /// Fails without touching anything if the ROM does not fit.
    pub fn with_program(rom: &[u8]) -> Result<Self> {
        if rom.len() > PROGRAM_CAPACITY {
            return Err(Error::RomTooLarge {
                size: rom.len(),
                capacity: PROGRAM_CAPACITY,
            });
        }

        let mut memory = Self::default();
        memory.write_slice(PROGRAM_BASE_ADDRESS, rom)?;

        Ok(memory)
    }

    pub fn font_address_for_character(&self, character: u8) -> u16 {
        FONTSET_BASE_ADDRESS + (character as u16 * FONT_GLYPH_STRIDE)
    }

    pub fn read(&self, address: u16) -> Result<u8> {
        self.memory
            .get(address as usize)
            .copied()
            .ok_or(Error::AddressOutOfBounds {
                address: address as usize,
            })
    }

    pub fn write_slice(&mut self, base_address: u16, slice: &[u8]) -> Result<()> {
        let range = Self::checked_range(base_address, slice.len())?;
        self.memory[range].copy_from_slice(slice);

        Ok(())
    }

    pub fn as_slice(&self, base_address: u16, length: usize) -> Result<&[u8]> {
        let range = Self::checked_range(base_address, length)?;

        Ok(&self.memory[range])
    }

    fn checked_range(base_address: u16, length: usize) -> Result<std::ops::Range<usize>> {
        let start = base_address as usize;
        let end = start + length;
        if end > MEMORY_SIZE {
            // Report the first address that falls outside memory.
            return Err(Error::AddressOutOfBounds {
                address: start.max(MEMORY_SIZE),
            });
        }

        Ok(start..end)
    }
}

impl Default for Memory {
    fn default() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[(FONTSET_BASE_ADDRESS as usize)..(FONTSET_BASE_ADDRESS as usize + FONTSET.len())]
            .copy_from_slice(&FONTSET);

        Self { memory }
    }
}

#[cfg(test)]
mod tests {
    use super::{Memory, FONTSET_BASE_ADDRESS, MEMORY_SIZE, PROGRAM_CAPACITY};
    use crate::error::Error;

    #[test]
    fn test_default() {
        let memory = Memory::default();

        assert_eq!(memory.read(FONTSET_BASE_ADDRESS).unwrap(), 0xF0);
        assert_eq!(memory.read(FONTSET_BASE_ADDRESS + 79).unwrap(), 0x80);
        assert_eq!(memory.read(0x200).unwrap(), 0x00);
    }

    #[test]
    fn test_font_address_for_character() {
        let memory = Memory::default();

        assert_eq!(
            memory.font_address_for_character(5),
            FONTSET_BASE_ADDRESS + 25
        );
    }

    #[test]
    fn test_with_program() {
        let rom = [0x00, 0xE0, 0x12, 0x00];
        let memory = Memory::with_program(&rom).unwrap();

        assert_eq!(memory.as_slice(0x200, 4).unwrap(), &rom);
    }

    #[test]
    fn test_with_program_fills_whole_region() {
        let rom = vec![0xAB; PROGRAM_CAPACITY];
        let memory = Memory::with_program(&rom).unwrap();

        assert_eq!(memory.read((MEMORY_SIZE - 1) as u16).unwrap(), 0xAB);
    }

    #[test]
    fn test_with_program_too_large() {
        let rom = vec![0; PROGRAM_CAPACITY + 1];

        match Memory::with_program(&rom) {
            Err(Error::RomTooLarge { size, capacity }) => {
                assert_eq!(size, PROGRAM_CAPACITY + 1);
                assert_eq!(capacity, 3584);
            }
            _ => panic!("Expected RomTooLarge"),
        }
    }

    #[test]
    fn test_as_slice() {
        let memory = Memory::default();

        let expected = [0x90, 0x90, 0xF0, 0x10, 0x10];

        assert_eq!(
            memory.as_slice(FONTSET_BASE_ADDRESS + 20, 5).unwrap(),
            &expected
        );
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut memory = Memory::default();

        assert!(matches!(
            memory.read(0x1000),
            Err(Error::AddressOutOfBounds { address: 0x1000 })
        ));
        assert!(matches!(
            memory.write_slice(0xFFFF, &[1]),
            Err(Error::AddressOutOfBounds { address: 0xFFFF })
        ));
        assert!(matches!(
            memory.as_slice(0xFFE, 3),
            Err(Error::AddressOutOfBounds { address: 0x1000 })
        ));
        assert!(memory.write_slice(0xFFD, &[1, 2, 3]).is_ok());
    }
}
