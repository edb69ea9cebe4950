use std::fs;
use std::path::Path;

use log::{debug, error, info};

use crate::cpu::{StepOutcome, CPU};
use crate::error::{Error, Result};
use crate::memory::Memory;
use crate::{Display, FramebufferDisplay, Input, RandomNumberProvider};

/// Frame cadence of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// Instructions executed per frame.
    pub steps_per_frame: u32,
    /// Frames per second. Timers tick once per frame.
    pub frame_rate: u32,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            steps_per_frame: 10,
            frame_rate: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    /// Suspended on a key wait, the instruction is re-entered next frame.
    WaitingForKey,
    /// Stopped after a fault or an explicit stop. Only [`Emulator::reset`] resumes.
    Halted,
}

/// Read a ROM image from disk, reporting a missing or unreadable file as a load fault.
pub fn read_rom(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::RomUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

pub struct Emulator {
    cpu: CPU,
    config: EmulatorConfig,
    state: EngineState,
    current_rom: Vec<u8>,
    is_initial_state: bool,
}

impl Emulator {
    /// Load `rom` into a fresh machine using `rand` for the random instruction.
    pub fn new(rom: Vec<u8>, config: EmulatorConfig) -> Result<Self> {
        Self::with_random_source(rom, config, Box::new(rand::random::<u8>))
    }

    pub fn with_random_source(
        rom: Vec<u8>,
        config: EmulatorConfig,
        random_number_provider: Box<RandomNumberProvider>,
    ) -> Result<Self> {
        let memory = Memory::with_program(&rom)?;
        let cpu = CPU::new(
            memory,
            Box::new(FramebufferDisplay::default()),
            random_number_provider,
        );
        info!("Loaded {} byte ROM", rom.len());

        Ok(Self {
            cpu,
            config,
            state: EngineState::Running,
            current_rom: rom,
            is_initial_state: true,
        })
    }

    pub fn is_initial_state(&self) -> bool {
        self.is_initial_state
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    /// Reload the current ROM into a fresh machine and clear the screen.
    pub fn reset(self) -> Result<Self> {
        let memory = Memory::with_program(&self.current_rom)?;
        let cpu = self.cpu.reset(memory);
        debug!("Emulator reset");

        Ok(Self {
            cpu,
            config: self.config,
            state: EngineState::Running,
            current_rom: self.current_rom,
            is_initial_state: true,
        })
    }

    /// Halt between steps. Further frames fail with [`Error::Halted`].
    pub fn stop(&mut self) {
        debug!("Emulator stopped");
        self.state = EngineState::Halted;
    }

    /// Execute a single instruction without ticking the timers.
    pub fn step(&mut self, input: &dyn Input) -> Result<StepOutcome> {
        if self.state == EngineState::Halted {
            return Err(Error::Halted);
        }
        self.is_initial_state = false;

        let outcome = match self.cpu.step(input) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("Halting at {:#05x}: {}", self.cpu.pc(), err);
                self.state = EngineState::Halted;

                return Err(err);
            }
        };

        match (self.state, outcome) {
            (EngineState::Running, StepOutcome::WaitingForKey) => {
                debug!("Waiting for key at {:#05x}", self.cpu.pc());
                self.state = EngineState::WaitingForKey;
            }
            (EngineState::WaitingForKey, StepOutcome::Executed) => {
                debug!("Key wait satisfied");
                self.state = EngineState::Running;
            }
            _ => {}
        }

        Ok(outcome)
    }

    /// Run one frame: up to `steps_per_frame` instructions followed by one
    /// timer tick.
    ///
    /// A key wait that finds no key ends the frame's instructions early, the
    /// timers still tick so the cadence keeps going while the program waits.
    pub fn run_frame(&mut self, input: &dyn Input) -> Result<EngineState> {
        if self.state == EngineState::Halted {
            return Err(Error::Halted);
        }

        for _ in 0..self.config.steps_per_frame {
            if self.step(input)? == StepOutcome::WaitingForKey {
                break;
            }
        }
        self.cpu.tick_timers();

        Ok(self.state)
    }

    pub fn display(&self) -> &dyn Display {
        self.cpu.display()
    }

    /// Tell the display its contents reached the screen.
    pub fn mark_presented(&mut self) {
        self.cpu.display_mut().clear_dirty();
    }

    /// Whether a host should be sounding its tone this frame.
    pub fn is_sound_active(&self) -> bool {
        self.cpu.is_sound_active()
    }
}

#[cfg(test)]
mod tests {
    use super::{read_rom, Emulator, EmulatorConfig, EngineState};
    use crate::error::Error;
    use crate::{Input, StepOutcome, PROGRAM_CAPACITY};
    use std::cell::Cell;
    use std::path::Path;

    #[derive(Default)]
    struct TestInput {
        held: Cell<Option<u8>>,
    }

    impl Input for TestInput {
        fn is_key_down(&self, key: u8) -> bool {
            self.held.get() == Some(key)
        }

        fn pressed_key(&self) -> Option<u8> {
            self.held.get()
        }
    }

    fn emulator(rom: &[u8]) -> Emulator {
        Emulator::with_random_source(rom.to_vec(), EmulatorConfig::default(), Box::new(|| 0))
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = EmulatorConfig::default();

        assert_eq!(config.steps_per_frame, 10);
        assert_eq!(config.frame_rate, 60);
    }

    #[test]
    fn test_rom_too_large_is_rejected() {
        let result = Emulator::new(vec![0; PROGRAM_CAPACITY + 1], EmulatorConfig::default());

        assert!(matches!(result, Err(Error::RomTooLarge { .. })));
    }

    #[test]
    fn test_read_missing_rom() {
        let result = read_rom(Path::new("/definitely/not/a/rom.ch8"));

        assert!(matches!(result, Err(Error::RomUnreadable { .. })));
    }

    #[test]
    fn test_run_frame_executes_configured_steps() {
        // Ten increments of V0 followed by an idle loop.
        let mut rom: Vec<u8> = (0..11).flat_map(|_| vec![0x70, 0x01]).collect();
        rom.extend_from_slice(&[0x12, 0x16]);
        let mut emulator = emulator(&rom);

        emulator.run_frame(&TestInput::default()).unwrap();

        assert_eq!(emulator.cpu().register(0), 10);
        assert_eq!(emulator.cpu().pc(), 0x214);
    }

    #[test]
    fn test_timers_tick_once_per_frame() {
        // V0 = 5, DT = V0, then spin.
        let mut emulator = emulator(&[0x60, 0x05, 0xF0, 0x15, 0x12, 0x04]);
        let input = TestInput::default();

        emulator.run_frame(&input).unwrap();
        assert_eq!(emulator.cpu().delay_timer(), 4);

        for _ in 0..10 {
            emulator.run_frame(&input).unwrap();
        }
        assert_eq!(emulator.cpu().delay_timer(), 0);
    }

    #[test]
    fn test_key_wait_yields_frames() {
        // ST = 3, wait for key into V1, then spin.
        let mut emulator = emulator(&[0x60, 0x03, 0xF0, 0x18, 0xF1, 0x0A, 0x12, 0x06]);
        let input = TestInput::default();

        assert_eq!(
            emulator.run_frame(&input).unwrap(),
            EngineState::WaitingForKey
        );
        assert_eq!(emulator.cpu().pc(), 0x204);
        assert_eq!(emulator.cpu().sound_timer(), 2);
        assert!(emulator.is_sound_active());

        emulator.run_frame(&input).unwrap();
        assert_eq!(emulator.cpu().sound_timer(), 1);

        input.held.set(Some(0xC));
        assert_eq!(emulator.run_frame(&input).unwrap(), EngineState::Running);
        assert_eq!(emulator.cpu().register(1), 0xC);
        assert_eq!(emulator.cpu().pc(), 0x206);
        assert!(!emulator.is_sound_active());
    }

    #[test]
    fn test_fault_halts_engine() {
        let mut emulator = emulator(&[0x60, 0x01, 0x80, 0x0F]);
        let input = TestInput::default();

        assert!(matches!(
            emulator.run_frame(&input),
            Err(Error::UnknownOpcode {
                opcode: 0x800F,
                address: 0x202
            })
        ));
        assert_eq!(emulator.state(), EngineState::Halted);
        assert!(matches!(emulator.run_frame(&input), Err(Error::Halted)));
        assert!(matches!(emulator.step(&input), Err(Error::Halted)));
    }

    #[test]
    fn test_stop_and_reset() {
        let mut emulator = emulator(&[0xA0, 0x50, 0xD0, 0x05, 0x12, 0x04]);
        let input = TestInput::default();

        assert_eq!(emulator.step(&input).unwrap(), StepOutcome::Executed);
        assert_eq!(emulator.step(&input).unwrap(), StepOutcome::Executed);
        assert!(!emulator.is_initial_state());
        assert!(emulator.display().is_pixel_on(0, 0));

        emulator.stop();
        assert!(matches!(emulator.step(&input), Err(Error::Halted)));

        let emulator = emulator.reset().unwrap();
        assert!(emulator.is_initial_state());
        assert_eq!(emulator.state(), EngineState::Running);
        assert_eq!(emulator.cpu().pc(), 0x200);
        assert!(!emulator.display().is_pixel_on(0, 0));
    }

    #[test]
    fn test_mark_presented() {
        let mut emulator = emulator(&[0x00, 0xE0]);
        emulator.run_frame(&TestInput::default()).unwrap();
        assert!(emulator.display().is_dirty());

        emulator.mark_presented();

        assert!(!emulator.display().is_dirty());
    }
}
