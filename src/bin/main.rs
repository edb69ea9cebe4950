use chip_8::{
    read_rom, Emulator, EmulatorConfig, Input, FRAME_BUFFER_PIXEL_HEIGHT,
    FRAME_BUFFER_PIXEL_WIDTH,
};
use clap::{crate_authors, crate_version, App, Arg, ArgMatches};
use log::info;
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};

use std::path::Path;
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

const PIXEL_OFF_COLOR: u32 = 0x00_2C_50_66;
const PIXEL_ON_COLOR: u32 = 0x00_68_BB_ED;

// Logical keypad on the left of a QWERTY keyboard:
//
// | 1 | 2 | 3 | C |      | 1 | 2 | 3 | 4 |
// | 4 | 5 | 6 | D |  ->  | Q | W | E | R |
// | 7 | 8 | 9 | E |      | A | S | D | F |
// | A | 0 | B | F |      | Z | X | C | V |
const KEY_MAP: [(Key, u8); 16] = [
    (Key::Key1, 0x1),
    (Key::Key2, 0x2),
    (Key::Key3, 0x3),
    (Key::Key4, 0xc),
    (Key::Q, 0x4),
    (Key::W, 0x5),
    (Key::E, 0x6),
    (Key::R, 0xd),
    (Key::A, 0x7),
    (Key::S, 0x8),
    (Key::D, 0x9),
    (Key::F, 0xe),
    (Key::Z, 0xa),
    (Key::X, 0x0),
    (Key::C, 0xb),
    (Key::V, 0xf),
];

#[derive(Default)]
struct MiniFBInput {
    key_states: [bool; 16],
}

impl MiniFBInput {
    fn update_key_state(&mut self, window: &Window) {
        for &(key_enum, key) in KEY_MAP.iter() {
            self.key_states[key as usize] = window.is_key_down(key_enum);
        }
    }
}

impl Input for MiniFBInput {
    fn is_key_down(&self, key: u8) -> bool {
        self.key_states
            .get(key as usize)
            .copied()
            .unwrap_or(false)
    }

    fn pressed_key(&self) -> Option<u8> {
        // Scan in keyboard order so the choice is stable when several keys are held.
        KEY_MAP
            .iter()
            .map(|&(_, key)| key)
            .find(|&key| self.key_states[key as usize])
    }
}

fn parse_arg<T: FromStr>(matches: &ArgMatches, name: &str, default: T) -> Result<T, String> {
    match matches.value_of(name) {
        Some(value) => value
            .parse()
            .map_err(|_| format!("Invalid value '{}' for --{}", value, name)),
        None => Ok(default),
    }
}

fn parse_scale(scale: u32) -> Result<Scale, String> {
    match scale {
        1 => Ok(Scale::X1),
        2 => Ok(Scale::X2),
        4 => Ok(Scale::X4),
        8 => Ok(Scale::X8),
        16 => Ok(Scale::X16),
        32 => Ok(Scale::X32),
        _ => Err(format!("Unsupported scale {}, use 1, 2, 4, 8, 16 or 32", scale)),
    }
}

fn create_window(scale: Scale) -> Result<Window, Box<dyn std::error::Error>> {
    let mut opts = WindowOptions::default();

    opts.scale = scale;
    let window = Window::new(
        "CHIP-8",
        FRAME_BUFFER_PIXEL_WIDTH,
        FRAME_BUFFER_PIXEL_HEIGHT,
        opts,
    )?;

    Ok(window)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let defaults = EmulatorConfig::default();
    let matches = App::new("CHIP-8")
        .version(crate_version!())
        .author(crate_authors!())
        .about("A CHIP-8 emulator")
        .arg(
            Arg::with_name("ROM")
                .help("The CHIP-8 ROM to run")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("steps-per-frame")
                .long("steps-per-frame")
                .takes_value(true)
                .help("Instructions executed per frame [default: 10]"),
        )
        .arg(
            Arg::with_name("fps")
                .long("fps")
                .takes_value(true)
                .help("Frames per second, timers tick once per frame [default: 60]"),
        )
        .arg(
            Arg::with_name("scale")
                .long("scale")
                .takes_value(true)
                .help("Window scale factor [default: 16]"),
        )
        .get_matches();

    let config = EmulatorConfig {
        steps_per_frame: parse_arg(&matches, "steps-per-frame", defaults.steps_per_frame)?,
        frame_rate: parse_arg(&matches, "fps", defaults.frame_rate)?,
    };
    if config.frame_rate == 0 {
        return Err("--fps must be greater than zero".into());
    }
    let scale = parse_scale(parse_arg(&matches, "scale", 16)?)?;

    // `ROM` is required so clap has already rejected a missing value.
    let rom_path = matches.value_of("ROM").unwrap_or_default();
    let rom = read_rom(Path::new(rom_path))?;

    let mut window = create_window(scale)?;
    let mut input = MiniFBInput::default();
    let mut emulator = Emulator::new(rom, config)?;
    let frame_duration = Duration::from_micros(1_000_000 / config.frame_rate as u64);
    info!(
        "Running {} at {} steps per frame, {} fps",
        rom_path, config.steps_per_frame, config.frame_rate
    );

    let mut sounding = false;
    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        if window.is_key_pressed(Key::F1, KeyRepeat::No) && !emulator.is_initial_state() {
            emulator = emulator.reset()?;
            continue;
        }

        input.update_key_state(&window);
        emulator.run_frame(&input)?;

        // No audio backend; surface the tone state in the log instead.
        if emulator.is_sound_active() != sounding {
            sounding = emulator.is_sound_active();
            if sounding {
                info!("Sound timer active, no audio output available");
            }
        }

        if emulator.display().is_dirty() {
            let buffer = emulator
                .display()
                .rgba_framebuffer()
                .into_iter()
                .map(|value| {
                    if value == 0x0 {
                        PIXEL_OFF_COLOR
                    } else {
                        PIXEL_ON_COLOR
                    }
                })
                .collect::<Vec<u32>>();

            window.update_with_buffer(&buffer)?;
            emulator.mark_presented();
        } else {
            window.update();
        }

        if let Some(remaining) = frame_duration.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    Ok(())
}
