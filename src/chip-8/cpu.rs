use std::ops::{Index, IndexMut};

use log::{trace, warn};

use crate::error::{Error, Result};
use crate::instruction::{Instruction, Opcode};
use crate::memory::{Memory, MEMORY_SIZE, PROGRAM_BASE_ADDRESS};
use crate::timer::Timers;
use crate::{Display, Input, RandomNumberProvider};

const STACK_SIZE: usize = 16;
const FLAG_REGISTER: u8 = 0xF;
const KEY_COUNT: u8 = 16;

#[derive(Debug, Default)]
struct Registers([u8; 16]);

impl Registers {
    fn as_slice_through(&self, idx: u8) -> &[u8] {
        &self.0[0..=(idx as usize)]
    }

    fn copy_from_slice(&mut self, slice: &[u8]) {
        self.0[0..slice.len()].copy_from_slice(slice)
    }
}

impl Index<u8> for Registers {
    type Output = u8;

    fn index(&self, register: u8) -> &Self::Output {
        &self.0[register as usize]
    }
}

impl IndexMut<u8> for Registers {
    fn index_mut(&mut self, register: u8) -> &mut Self::Output {
        &mut self.0[register as usize]
    }
}

/// What a single [`CPU::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The instruction retired and the program counter moved on.
    Executed,
    /// A key wait found no key held. The program counter still points at the
    /// waiting instruction so it runs again on the next step.
    WaitingForKey,
}

pub struct CPU {
    // Registers
    v: Registers,
    i: u16,

    // Program Counter
    pc: u16,

    // Stack
    stack: [u16; STACK_SIZE],
    sp: usize,

    memory: Memory,
    display: Box<dyn Display>,

    timers: Timers,
    random_number_provider: Box<RandomNumberProvider>,
}

impl CPU {
    pub fn new(
        memory: Memory,
        display: Box<dyn Display>,
        random_number_provider: Box<RandomNumberProvider>,
    ) -> Self {
        Self {
            v: Registers::default(),
            i: 0,
            pc: PROGRAM_BASE_ADDRESS,

            sp: 0,
            stack: [0; STACK_SIZE],

            memory,
            display,

            timers: Timers::default(),
            random_number_provider,
        }
    }

    /// Swap in fresh memory and start over, keeping the display and random source.
    pub fn reset(mut self, memory: Memory) -> Self {
        self.display.cls();
        Self::new(memory, self.display, self.random_number_provider)
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn register(&self, register: u8) -> u8 {
        self.v[register & 0xF]
    }

    pub fn stack_depth(&self) -> usize {
        self.sp
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay.current_value()
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound.current_value()
    }

    pub fn is_sound_active(&self) -> bool {
        self.timers.sound.is_active()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn display(&self) -> &dyn Display {
        self.display.as_ref()
    }

    pub fn display_mut(&mut self) -> &mut dyn Display {
        self.display.as_mut()
    }

    /// Decrement both timers by one. Called once per frame, never per step.
    pub fn tick_timers(&mut self) {
        self.timers.tick();
    }

    /// Fetch, decode and execute one instruction.
    ///
    /// On error nothing about the machine has changed and the program counter
    /// still points at the faulting instruction.
    pub fn step(&mut self, input: &dyn Input) -> Result<StepOutcome> {
        let current_pc = self.pc;
        let opcode = self.fetch(current_pc)?;
        let instruction = Instruction::decode(opcode).ok_or(Error::UnknownOpcode {
            opcode: opcode.0,
            address: current_pc,
        })?;
        trace!("{:#05x}: {:04x} {:?}", current_pc, opcode.0, instruction);

        let next_pc = self.execute_instruction(instruction, current_pc + 2, input)?;
        self.pc = next_pc;

        match instruction {
            Instruction::LdKey(_) if next_pc == current_pc => Ok(StepOutcome::WaitingForKey),
            _ => Ok(StepOutcome::Executed),
        }
    }

    fn fetch(&self, address: u16) -> Result<Opcode> {
        if address as usize + 1 >= MEMORY_SIZE {
            return Err(Error::ProgramCounterOutOfBounds { address });
        }

        Ok(Opcode::from_bytes(
            self.memory.read(address)?,
            self.memory.read(address + 1)?,
        ))
    }

    /// Apply `instruction` and return the next program counter. `next_pc` is
    /// the address of the instruction following this one.
    fn execute_instruction(
        &mut self,
        instruction: Instruction,
        next_pc: u16,
        input: &dyn Input,
    ) -> Result<u16> {
        let skip_if = |condition: bool| if condition { next_pc + 2 } else { next_pc };

        let pc = match instruction {
            Instruction::Sys(address) => {
                warn!("Ignoring machine code call to {:#05x}", address);

                next_pc
            }

            Instruction::Cls => {
                self.display.cls();

                next_pc
            }

            Instruction::Ret => self.stack_pop()?,

            Instruction::Jp(address) => address,

            Instruction::Call(address) => {
                self.stack_push(next_pc)?;

                address
            }

            Instruction::SeByte(x, value) => skip_if(self.v[x] == value),
            Instruction::SneByte(x, value) => skip_if(self.v[x] != value),
            Instruction::SeReg(x, y) => skip_if(self.v[x] == self.v[y]),
            Instruction::SneReg(x, y) => skip_if(self.v[x] != self.v[y]),

            Instruction::LdByte(x, value) => {
                self.v[x] = value;

                next_pc
            }

            // Carry flag is not changed.
            Instruction::AddByte(x, value) => {
                self.v[x] = self.v[x].wrapping_add(value);

                next_pc
            }

            Instruction::LdReg(x, y) => {
                self.v[x] = self.v[y];

                next_pc
            }

            Instruction::Or(x, y) => {
                self.v[x] |= self.v[y];

                next_pc
            }

            Instruction::And(x, y) => {
                self.v[x] &= self.v[y];

                next_pc
            }

            Instruction::Xor(x, y) => {
                self.v[x] ^= self.v[y];

                next_pc
            }

            // The flag writes below come last so that VF as a destination ends
            // up holding the flag, and they only use the operands read up front.
            Instruction::AddReg(x, y) => {
                let (result, carry) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = result;
                self.v[FLAG_REGISTER] = carry as u8;

                next_pc
            }

            Instruction::Sub(x, y) => {
                let (lhs, rhs) = (self.v[x], self.v[y]);
                self.v[x] = lhs.wrapping_sub(rhs);
                self.v[FLAG_REGISTER] = (lhs >= rhs) as u8;

                next_pc
            }

            Instruction::Subn(x, y) => {
                let (lhs, rhs) = (self.v[y], self.v[x]);
                self.v[x] = lhs.wrapping_sub(rhs);
                self.v[FLAG_REGISTER] = (lhs >= rhs) as u8;

                next_pc
            }

            Instruction::Shr(x) => {
                let value = self.v[x];
                self.v[x] = value >> 1;
                self.v[FLAG_REGISTER] = value & 0x1;

                next_pc
            }

            Instruction::Shl(x) => {
                let value = self.v[x];
                self.v[x] = value << 1;
                self.v[FLAG_REGISTER] = (value & 0x80) >> 7;

                next_pc
            }

            Instruction::LdI(address) => {
                self.i = address;

                next_pc
            }

            Instruction::JpV0(address) => address + self.v[0] as u16,

            Instruction::Rnd(x, mask) => {
                self.v[x] = (self.random_number_provider)() & mask;

                next_pc
            }

            Instruction::Drw(x, y, height) => {
                let sprite = self.memory.as_slice(self.i, height as usize)?;
                let collided = self.display.draw_sprite(self.v[x], self.v[y], sprite);
                self.v[FLAG_REGISTER] = collided as u8;

                next_pc
            }

            Instruction::Skp(x) => skip_if(Self::is_key_down(input, self.v[x])),
            Instruction::Sknp(x) => skip_if(!Self::is_key_down(input, self.v[x])),

            Instruction::LdRegDt(x) => {
                self.v[x] = self.timers.delay.current_value();

                next_pc
            }

            // Without a key the instruction does not retire and is run again.
            Instruction::LdKey(x) => match input.pressed_key() {
                Some(key) => {
                    self.v[x] = key;

                    next_pc
                }
                None => next_pc - 2,
            },

            Instruction::LdDtReg(x) => {
                self.timers.delay.set_value(self.v[x]);

                next_pc
            }

            Instruction::LdStReg(x) => {
                self.timers.sound.set_value(self.v[x]);

                next_pc
            }

            Instruction::AddI(x) => {
                self.i = self.i.wrapping_add(self.v[x] as u16);

                next_pc
            }

            Instruction::LdF(x) => {
                self.i = self.memory.font_address_for_character(self.v[x]);

                next_pc
            }

            Instruction::LdB(x) => {
                let value = self.v[x];
                self.memory
                    .write_slice(self.i, &[value / 100, (value / 10) % 10, value % 10])?;

                next_pc
            }

            Instruction::StoreRegs(x) => {
                self.memory.write_slice(self.i, self.v.as_slice_through(x))?;

                next_pc
            }

            Instruction::LoadRegs(x) => {
                let values = self.memory.as_slice(self.i, x as usize + 1)?;
                self.v.copy_from_slice(values);

                next_pc
            }
        };

        Ok(pc)
    }

    fn is_key_down(input: &dyn Input, key: u8) -> bool {
        key < KEY_COUNT && input.is_key_down(key)
    }

    fn stack_push(&mut self, value: u16) -> Result<()> {
        if self.sp >= STACK_SIZE {
            return Err(Error::StackOverflow { depth: self.sp });
        }
        self.stack[self.sp] = value;
        self.sp += 1;

        Ok(())
    }

    fn stack_pop(&mut self) -> Result<u16> {
        if self.sp == 0 {
            return Err(Error::StackUnderflow);
        }
        self.sp -= 1;

        Ok(self.stack[self.sp])
    }
}
