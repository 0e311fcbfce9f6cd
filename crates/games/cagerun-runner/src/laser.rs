use serde::{Deserialize, Serialize};

use cagerun_core::countdown::Countdown;

/// How long a fired beam stays visible.
pub const BEAM_DURATION: f32 = 0.18;

/// A fired laser, kept only so the renderer can draw it fading out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaserBeam {
    pub start_x: f32,
    /// Where the beam stopped: the struck obstacle's left edge, or full range.
    pub end_x: f32,
    pub y: f32,
    pub fade: Countdown,
}

impl LaserBeam {
    pub fn new(origin: (f32, f32), end_x: f32) -> Self {
        Self {
            start_x: origin.0,
            end_x,
            y: origin.1,
            fade: Countdown::started(BEAM_DURATION),
        }
    }

    /// Fraction of the fade remaining, 1.0 when freshly fired.
    pub fn intensity(&self) -> f32 {
        (self.fade.remaining() / BEAM_DURATION).clamp(0.0, 1.0)
    }

    pub fn update(&mut self, dt: f32) {
        self.fade.tick(dt);
    }

    pub fn is_done(&self) -> bool {
        !self.fade.is_active()
    }
}
