/// A raw 16-bit instruction word as fetched from memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Assemble an instruction word from its two big-endian bytes.
    pub fn from_bytes(high: u8, low: u8) -> Self {
        Opcode((high as u16) << 8 | low as u16)
    }

    pub fn category(self) -> u8 {
        ((self.0 & 0xF000) >> 12) as u8
    }

    /// The low 12 bits, `nnn`.
    pub fn addr(self) -> u16 {
        self.0 & 0x0FFF
    }

    /// The low 4 bits, `n`.
    pub fn nibble(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    /// Bits 8-11, the `x` register.
    pub fn x(self) -> u8 {
        ((self.0 & 0x0F00) >> 8) as u8
    }

    /// Bits 4-7, the `y` register.
    pub fn y(self) -> u8 {
        ((self.0 & 0x00F0) >> 4) as u8
    }

    /// The low 8 bits, `kk`.
    pub fn byte(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }
}

/// One of the 35 CHIP-8 operations with its operands already extracted.
///
/// Register operands are indices `0..=0xF`, addresses are 12 bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 0nnn: Call a machine code routine. Ignored.
    Sys(u16),
    /// 00E0: Clear the display.
    Cls,
    /// 00EE: Return from a subroutine.
    Ret,
    /// 1nnn: Jump to nnn.
    Jp(u16),
    /// 2nnn: Call the subroutine at nnn.
    Call(u16),
    /// 3xkk: Skip the next instruction if Vx == kk.
    SeByte(u8, u8),
    /// 4xkk: Skip the next instruction if Vx != kk.
    SneByte(u8, u8),
    /// 5xy0: Skip the next instruction if Vx == Vy.
    SeReg(u8, u8),
    /// 6xkk: Vx = kk.
    LdByte(u8, u8),
    /// 7xkk: Vx = Vx + kk, VF untouched.
    AddByte(u8, u8),
    /// 8xy0: Vx = Vy.
    LdReg(u8, u8),
    /// 8xy1: Vx = Vx | Vy.
    Or(u8, u8),
    /// 8xy2: Vx = Vx & Vy.
    And(u8, u8),
    /// 8xy3: Vx = Vx ^ Vy.
    Xor(u8, u8),
    /// 8xy4: Vx = Vx + Vy, VF = carry.
    AddReg(u8, u8),
    /// 8xy5: Vx = Vx - Vy, VF = not borrow.
    Sub(u8, u8),
    /// 8xy6: Vx = Vx >> 1, VF = shifted out bit.
    Shr(u8),
    /// 8xy7: Vx = Vy - Vx, VF = not borrow.
    Subn(u8, u8),
    /// 8xyE: Vx = Vx << 1, VF = shifted out bit.
    Shl(u8),
    /// 9xy0: Skip the next instruction if Vx != Vy.
    SneReg(u8, u8),
    /// Annn: I = nnn.
    LdI(u16),
    /// Bnnn: Jump to nnn + V0.
    JpV0(u16),
    /// Cxkk: Vx = random byte & kk.
    Rnd(u8, u8),
    /// Dxyn: Draw an n byte sprite from I at (Vx, Vy), VF = collision.
    Drw(u8, u8, u8),
    /// Ex9E: Skip the next instruction if key Vx is down.
    Skp(u8),
    /// ExA1: Skip the next instruction if key Vx is up.
    Sknp(u8),
    /// Fx07: Vx = delay timer.
    LdRegDt(u8),
    /// Fx0A: Wait for a key press and store it in Vx.
    LdKey(u8),
    /// Fx15: delay timer = Vx.
    LdDtReg(u8),
    /// Fx18: sound timer = Vx.
    LdStReg(u8),
    /// Fx1E: I = I + Vx.
    AddI(u8),
    /// Fx29: I = address of the glyph for Vx.
    LdF(u8),
    /// Fx33: Store the BCD digits of Vx at I, I+1 and I+2.
    LdB(u8),
    /// Fx55: Store V0 through Vx starting at I.
    StoreRegs(u8),
    /// Fx65: Load V0 through Vx starting at I.
    LoadRegs(u8),
}

impl Instruction {
    /// Decode an instruction word.
    ///
    /// Returns `None` when the sub-code of a 0x8, 0xE or 0xF instruction is unknown.
    /// Unknown 0x0 words decode to [`Instruction::Sys`].
    pub fn decode(opcode: Opcode) -> Option<Self> {
        let x = opcode.x();
        let y = opcode.y();

        let instruction = match opcode.category() {
            0x0 => match opcode.0 {
                0x00E0 => Instruction::Cls,
                0x00EE => Instruction::Ret,
                _ => Instruction::Sys(opcode.addr()),
            },
            0x1 => Instruction::Jp(opcode.addr()),
            0x2 => Instruction::Call(opcode.addr()),
            0x3 => Instruction::SeByte(x, opcode.byte()),
            0x4 => Instruction::SneByte(x, opcode.byte()),
            0x5 => Instruction::SeReg(x, y),
            0x6 => Instruction::LdByte(x, opcode.byte()),
            0x7 => Instruction::AddByte(x, opcode.byte()),
            0x8 => match opcode.nibble() {
                0x0 => Instruction::LdReg(x, y),
                0x1 => Instruction::Or(x, y),
                0x2 => Instruction::And(x, y),
                0x3 => Instruction::Xor(x, y),
                0x4 => Instruction::AddReg(x, y),
                0x5 => Instruction::Sub(x, y),
                0x6 => Instruction::Shr(x),
                0x7 => Instruction::Subn(x, y),
                0xE => Instruction::Shl(x),
                _ => return None,
            },
            0x9 => Instruction::SneReg(x, y),
            0xA => Instruction::LdI(opcode.addr()),
            0xB => Instruction::JpV0(opcode.addr()),
            0xC => Instruction::Rnd(x, opcode.byte()),
            0xD => Instruction::Drw(x, y, opcode.nibble()),
            0xE => match opcode.byte() {
                0x9E => Instruction::Skp(x),
                0xA1 => Instruction::Sknp(x),
                _ => return None,
            },
            0xF => match opcode.byte() {
                0x07 => Instruction::LdRegDt(x),
                0x0A => Instruction::LdKey(x),
                0x15 => Instruction::LdDtReg(x),
                0x18 => Instruction::LdStReg(x),
                0x1E => Instruction::AddI(x),
                0x29 => Instruction::LdF(x),
                0x33 => Instruction::LdB(x),
                0x55 => Instruction::StoreRegs(x),
                0x65 => Instruction::LoadRegs(x),
                _ => return None,
            },
            _ => unreachable!("category is a 4 bit value"),
        };

        Some(instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::{Instruction, Instruction::*, Opcode};

    #[test]
    fn test_operand_fields() {
        let opcode = Opcode(0xD7B4);

        assert_eq!(opcode.category(), 0xD);
        assert_eq!(opcode.x(), 0x7);
        assert_eq!(opcode.y(), 0xB);
        assert_eq!(opcode.nibble(), 0x4);
        assert_eq!(opcode.byte(), 0xB4);
        assert_eq!(opcode.addr(), 0x7B4);
    }

    #[test]
    fn test_from_bytes_is_big_endian() {
        assert_eq!(Opcode::from_bytes(0xA2, 0x50), Opcode(0xA250));
    }

    #[test]
    fn test_decode_all_operations() {
        let cases = [
            (0x0123, Sys(0x123)),
            (0x00E0, Cls),
            (0x00EE, Ret),
            (0x1234, Jp(0x234)),
            (0x2456, Call(0x456)),
            (0x342A, SeByte(0x4, 0x2A)),
            (0x4A75, SneByte(0xA, 0x75)),
            (0x5AE0, SeReg(0xA, 0xE)),
            (0x63F5, LdByte(0x3, 0xF5)),
            (0x7B12, AddByte(0xB, 0x12)),
            (0x8590, LdReg(0x5, 0x9)),
            (0x8101, Or(0x1, 0x0)),
            (0x8642, And(0x6, 0x4)),
            (0x87F3, Xor(0x7, 0xF)),
            (0x8264, AddReg(0x2, 0x6)),
            (0x8C45, Sub(0xC, 0x4)),
            (0x8126, Shr(0x1)),
            (0x86D7, Subn(0x6, 0xD)),
            (0x8E3E, Shl(0xE)),
            (0x9990, SneReg(0x9, 0x9)),
            (0xA568, LdI(0x568)),
            (0xBABC, JpV0(0xABC)),
            (0xC5AF, Rnd(0x5, 0xAF)),
            (0xD7B0, Drw(0x7, 0xB, 0x0)),
            (0xE49E, Skp(0x4)),
            (0xECA1, Sknp(0xC)),
            (0xF907, LdRegDt(0x9)),
            (0xFD0A, LdKey(0xD)),
            (0xF315, LdDtReg(0x3)),
            (0xF718, LdStReg(0x7)),
            (0xF91E, AddI(0x9)),
            (0xFF29, LdF(0xF)),
            (0xF533, LdB(0x5)),
            (0xF655, StoreRegs(0x6)),
            (0xF865, LoadRegs(0x8)),
        ];

        for &(opcode, expected) in cases.iter() {
            assert_eq!(
                Instruction::decode(Opcode(opcode)),
                Some(expected),
                "decoding {:#06x}",
                opcode
            );
        }
    }

    #[test]
    fn test_decode_unknown_sub_codes() {
        for &opcode in [0x8008, 0x800F, 0xE19F, 0xE000, 0xF030, 0xF0FF].iter() {
            assert_eq!(Instruction::decode(Opcode(opcode)), None);
        }
    }

    #[test]
    fn test_decode_ignores_low_nibble_of_register_compares() {
        assert_eq!(Instruction::decode(Opcode(0x5121)), Some(SeReg(0x1, 0x2)));
        assert_eq!(Instruction::decode(Opcode(0x912F)), Some(SneReg(0x1, 0x2)));
    }
}
