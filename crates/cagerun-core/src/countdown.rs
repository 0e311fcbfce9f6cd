use serde::{Deserialize, Serialize};

/// A timer that counts down to zero and stays there.
///
/// Every gameplay duration (slide, cooldown, slowdown, cage warning, trapped
/// sequence, ...) is one of these. A countdown is "active" while time remains.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub const fn idle() -> Self {
        Self { remaining: 0.0 }
    }

    pub fn started(duration: f32) -> Self {
        let mut c = Self::idle();
        c.start(duration);
        c
    }

    /// Restart from `duration` seconds. Non-finite or negative durations
    /// leave the countdown idle.
    pub fn start(&mut self, duration: f32) {
        self.remaining = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
    }

    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }

    /// Advance by `dt`. Returns `true` on the tick the countdown reaches zero.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining = (self.remaining - dt).max(0.0);
        self.remaining <= 0.0
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}
