/// A countdown register that decrements once per frame and stops at zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct Timer {
    value: u8,
}

impl Timer {
    pub fn current_value(&self) -> u8 {
        self.value
    }

    pub fn set_value(&mut self, new_value: u8) {
        self.value = new_value;
    }

    pub fn tick(&mut self) {
        self.value = self.value.saturating_sub(1);
    }

    pub fn is_active(&self) -> bool {
        self.value > 0
    }
}

/// The delay and sound timers, ticked together at the frame rate.
#[derive(Debug, Default)]
pub struct Timers {
    pub delay: Timer,
    pub sound: Timer,
}

impl Timers {
    pub fn tick(&mut self) {
        self.delay.tick();
        self.sound.tick();
    }
}
