use serde::{Deserialize, Serialize};

use cagerun_core::countdown::Countdown;
use cagerun_core::geom::Rect;

use crate::EntityId;
use crate::config::CageTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CageState {
    Hanging,
    Warning,
    Falling,
    Grounded,
    /// Locked around a caught entity. Does not scroll.
    Trapped,
}

impl CageState {
    /// Only a falling or landed cage can catch anything.
    pub fn is_hazardous(&self) -> bool {
        matches!(self, CageState::Falling | CageState::Grounded)
    }
}

/// Read-only snapshot handed to other entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CageView {
    pub id: EntityId,
    pub rect: Rect,
    pub state: CageState,
}

/// A cage hanging from the ceiling that drops when its target passes below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallingCage {
    pub id: EntityId,
    pub state: CageState,
    pub rect: Rect,
    /// Horizontal scroll speed (pixels per second, leftward).
    pub speed: f32,
    pub fall_velocity: f32,
    pub warning: Countdown,
    pub grounded: Countdown,
    /// Horizontal draw offset while shaking in WARNING.
    pub shake_offset: f32,
    pub scored: bool,
    pub alive: bool,
    /// Once triggered, a homing cage tracks its target instead of scrolling.
    pub homing: bool,
    ground_y: f32,
    despawn_x: f32,
    warning_elapsed: f32,
    tuning: CageTuning,
}

impl FallingCage {
    /// A hanging cage whose top edge is centered on `(x, ceiling_y)`.
    pub fn new(
        id: EntityId,
        x: f32,
        ceiling_y: f32,
        ground_y: f32,
        speed: f32,
        despawn_margin: f32,
        tuning: &CageTuning,
    ) -> Self {
        Self {
            id,
            state: CageState::Hanging,
            rect: Rect::from_midtop(x, ceiling_y, tuning.width, tuning.height),
            speed,
            fall_velocity: 0.0,
            warning: Countdown::idle(),
            grounded: Countdown::idle(),
            shake_offset: 0.0,
            scored: false,
            alive: true,
            homing: false,
            ground_y,
            despawn_x: -despawn_margin,
            warning_elapsed: 0.0,
            tuning: tuning.clone(),
        }
    }

    pub fn view(&self) -> CageView {
        CageView {
            id: self.id,
            rect: self.rect,
            state: self.state,
        }
    }

    /// HANGING → WARNING. Any other state is left alone.
    pub fn trigger_fall(&mut self) {
        if self.state == CageState::Hanging {
            self.state = CageState::Warning;
            self.warning.start(self.tuning.warning_duration);
            self.warning_elapsed = 0.0;
        }
    }

    /// Lock the cage around an entity centered at `x`.
    pub fn trap_at(&mut self, x: f32) {
        self.state = CageState::Trapped;
        self.speed = 0.0;
        self.fall_velocity = 0.0;
        self.shake_offset = 0.0;
        self.rect.x = x - self.rect.w / 2.0;
        self.rect.y = self.ground_y - self.rect.h;
    }

    /// Make this cage follow its target once it starts to drop.
    pub fn home_on_target(&mut self) {
        self.homing = true;
    }

    pub fn set_ground_y(&mut self, ground_y: f32) {
        if matches!(self.state, CageState::Grounded | CageState::Trapped) {
            self.rect.y = ground_y - self.rect.h;
        }
        self.ground_y = ground_y;
    }

    pub fn hitbox(&self) -> Rect {
        self.rect.inflate(-30.0, -20.0)
    }

    /// Scroll and advance the drop sequence. `target_x` is the x of whatever
    /// this cage is waiting for (the player, or the chaser for a finale cage).
    pub fn update(&mut self, dt: f32, target_x: Option<f32>) {
        if self.state == CageState::Trapped || !self.alive {
            return;
        }

        match target_x {
            Some(tx) if self.homing && self.state != CageState::Hanging => {
                self.rect.x = tx - self.rect.w / 2.0;
            },
            _ => self.rect.x -= self.speed * dt,
        }

        match self.state {
            CageState::Hanging => {
                if let Some(tx) = target_x {
                    let dist = self.rect.center_x() - tx;
                    if dist > 0.0 && dist < self.tuning.trigger_distance {
                        self.trigger_fall();
                    }
                }
            },
            CageState::Warning => {
                self.warning_elapsed += dt;
                // Deterministic jitter in [-5, 5) cycling every 100 ms.
                let phase = (self.warning_elapsed * 1000.0) as u32 % 100;
                self.shake_offset = (phase as f32 - 50.0) * 0.1;
                if self.warning.tick(dt) {
                    self.state = CageState::Falling;
                    self.fall_velocity = self.tuning.initial_fall_speed;
                    self.shake_offset = 0.0;
                }
            },
            CageState::Falling => {
                self.fall_velocity = (self.fall_velocity + self.tuning.fall_accel * dt)
                    .min(self.tuning.max_fall_speed);
                self.rect.y += self.fall_velocity * dt;
                if self.rect.bottom() >= self.ground_y {
                    self.rect.y = self.ground_y - self.rect.h;
                    self.fall_velocity = 0.0;
                    self.state = CageState::Grounded;
                    self.grounded.start(self.tuning.grounded_duration);
                }
            },
            CageState::Grounded => {
                if self.grounded.tick(dt) || !self.grounded.is_active() {
                    self.alive = false;
                }
            },
            CageState::Trapped => {},
        }

        if self.rect.right() < self.despawn_x {
            self.alive = false;
        }
    }
}
