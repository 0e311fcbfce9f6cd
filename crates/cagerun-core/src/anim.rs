use serde::{Deserialize, Serialize};

/// Frame index driver for a looping animation.
///
/// The simulation only tracks which frame is showing; the presentation layer
/// owns the images. `delay` is the per-frame display time in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameClock {
    pub frame: usize,
    pub frame_count: usize,
    pub delay: f32,
    timer: f32,
}

impl FrameClock {
    pub fn new(frame_count: usize, delay: f32) -> Self {
        Self {
            frame: 0,
            frame_count: frame_count.max(1),
            delay,
            timer: 0.0,
        }
    }

    /// Switch to another animation strip, starting at frame 0.
    pub fn restart(&mut self, frame_count: usize, delay: f32) {
        *self = Self::new(frame_count, delay);
    }

    /// Returns `true` when the frame index changed.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.timer += dt;
        if self.timer >= self.delay {
            self.timer = 0.0;
            self.frame = (self.frame + 1) % self.frame_count;
            return true;
        }
        false
    }
}
