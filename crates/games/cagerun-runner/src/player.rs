use serde::{Deserialize, Serialize};

use cagerun_core::anim::FrameClock;
use cagerun_core::countdown::Countdown;
use cagerun_core::events::SimEvent;
use cagerun_core::geom::Rect;

use crate::config::PlayerTuning;

const RUN_FRAMES: usize = 16;
const SLIDE_FRAMES: usize = 8;
const FRAME_DELAY: f32 = 0.05;

/// Discrete player state. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    Running,
    Jumping,
    Sliding,
    Trapped,
    Tackled,
}

/// The runner. Fixed on x; only the vertical axis is simulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub state: PlayerState,
    pub rect: Rect,
    pub vy: f32,
    pub on_ground: bool,
    pub ground_y: f32,
    /// Jumps spent since last touching the ground.
    pub jumps_used: u8,
    pub slide: Countdown,
    pub slide_boost: Countdown,
    pub slide_cooldown: Countdown,
    pub coyote: Countdown,
    pub jump_buffer: Countdown,
    pub laser_cooldown: Countdown,
    pub anim: FrameClock,
    tuning: PlayerTuning,
}

impl Player {
    pub fn new(tuning: &PlayerTuning, ground_y: f32) -> Self {
        Self {
            state: PlayerState::Running,
            rect: Rect::from_midbottom(tuning.x, ground_y, tuning.width, tuning.height),
            vy: 0.0,
            on_ground: true,
            ground_y,
            jumps_used: 0,
            slide: Countdown::idle(),
            slide_boost: Countdown::idle(),
            slide_cooldown: Countdown::idle(),
            coyote: Countdown::idle(),
            jump_buffer: Countdown::idle(),
            laser_cooldown: Countdown::idle(),
            anim: FrameClock::new(RUN_FRAMES, FRAME_DELAY),
            tuning: tuning.clone(),
        }
    }

    fn is_frozen(&self) -> bool {
        matches!(self.state, PlayerState::Trapped | PlayerState::Tackled)
    }

    /// Try to jump. Grounded (or within coyote time) gives a normal jump,
    /// airborne with a spare charge gives a double jump, otherwise the press
    /// is buffered for landing.
    pub fn jump(&mut self) -> Option<SimEvent> {
        if self.is_frozen() || self.state == PlayerState::Sliding {
            return None;
        }
        if self.on_ground || self.coyote.is_active() {
            self.launch(self.tuning.jump_force);
            self.jumps_used = 1;
            return Some(SimEvent::Jumped { double: false });
        }
        if self.tuning.double_jump && self.jumps_used < 2 {
            self.launch(self.tuning.double_jump_force);
            self.jumps_used = 2;
            return Some(SimEvent::Jumped { double: true });
        }
        self.jump_buffer.start(self.tuning.jump_buffer);
        None
    }

    fn launch(&mut self, force: f32) {
        self.vy = force;
        self.state = PlayerState::Jumping;
        self.on_ground = false;
        self.coyote.clear();
        self.jump_buffer.clear();
    }

    /// Start a slide. Returns `false` when sliding is not allowed right now.
    pub fn slide(&mut self) -> bool {
        if !self.tuning.slide_enabled
            || !self.on_ground
            || self.state != PlayerState::Running
            || self.slide_cooldown.is_active()
        {
            return false;
        }
        self.state = PlayerState::Sliding;
        self.slide.start(self.tuning.slide_duration);
        self.slide_boost.start(self.tuning.slide_duration);
        self.slide_cooldown.start(self.tuning.slide_cooldown);
        self.rect = Rect::from_midbottom(
            self.tuning.x,
            self.ground_y,
            self.tuning.slide_width,
            self.tuning.slide_height,
        );
        self.anim.restart(SLIDE_FRAMES, FRAME_DELAY);
        true
    }

    fn end_slide(&mut self) {
        if self.state == PlayerState::Sliding {
            self.state = PlayerState::Running;
            self.slide.clear();
            self.rect = self.standing_rect();
            self.anim.restart(RUN_FRAMES, FRAME_DELAY);
        }
    }

    fn standing_rect(&self) -> Rect {
        Rect::from_midbottom(
            self.rect.center_x(),
            self.ground_y,
            self.tuning.width,
            self.tuning.height,
        )
    }

    /// Consume the laser cooldown. Returns `true` if a shot may be fired.
    pub fn shoot(&mut self) -> bool {
        if !self.tuning.laser_enabled || self.is_frozen() || self.laser_cooldown.is_active() {
            return false;
        }
        self.laser_cooldown.start(self.tuning.laser_cooldown);
        true
    }

    /// Beam origin: right edge, at eye height.
    pub fn eye(&self) -> (f32, f32) {
        let y = if self.state == PlayerState::Sliding {
            self.rect.center_y() + 10.0
        } else {
            self.rect.top() + 60.0_f32.min(self.rect.h / 2.0)
        };
        (self.rect.right(), y)
    }

    /// Locked inside a cage. Ends any slide and snaps to the ground.
    pub fn trap(&mut self) {
        self.end_slide();
        self.settle();
        self.state = PlayerState::Trapped;
    }

    /// Knocked down by the chaser.
    pub fn tackle(&mut self) {
        self.end_slide();
        self.settle();
        self.state = PlayerState::Tackled;
    }

    fn settle(&mut self) {
        self.vy = 0.0;
        self.on_ground = true;
        self.jumps_used = 0;
        self.rect = self.standing_rect();
    }

    /// Move the player horizontally (used to lock onto a trapping cage).
    pub fn set_center_x(&mut self, x: f32) {
        self.rect.x = x - self.rect.w / 2.0;
    }

    /// Change the ground line. A grounded runner whose floor drops away
    /// starts falling with coyote time.
    pub fn set_ground_y(&mut self, ground_y: f32) {
        self.ground_y = ground_y;
        if !self.on_ground {
            return;
        }
        if self.rect.bottom() < ground_y && self.state == PlayerState::Running {
            self.on_ground = false;
            self.state = PlayerState::Jumping;
            self.vy = 0.0;
            self.jumps_used = 0;
            self.coyote.start(self.tuning.coyote_time);
        } else {
            self.rect.y = ground_y - self.rect.h;
        }
    }

    /// Collision rectangle. Sliding shrinks it to a thin strip near the floor.
    pub fn hitbox(&self) -> Rect {
        if self.state == PlayerState::Sliding {
            self.rect.inflate(
                -self.tuning.slide_hitbox_inset_w,
                -self.tuning.slide_hitbox_inset_h,
            )
        } else {
            self.rect
                .inflate(-self.tuning.hitbox_inset, -self.tuning.hitbox_inset)
        }
    }

    pub fn is_boost_active(&self) -> bool {
        self.slide_boost.is_active()
    }

    /// Early part of a slide in which falling cages cannot trap.
    pub fn in_immunity_window(&self) -> bool {
        if self.state != PlayerState::Sliding {
            return false;
        }
        let elapsed = self.tuning.slide_duration - self.slide.remaining();
        elapsed <= self.tuning.slide_immunity_window
    }

    /// Advance physics and timers. Returns a jump event when a buffered
    /// press fires on landing.
    pub fn update(&mut self, dt: f32) -> Option<SimEvent> {
        self.anim.tick(dt);
        self.slide_boost.tick(dt);
        self.slide_cooldown.tick(dt);
        self.laser_cooldown.tick(dt);
        self.coyote.tick(dt);
        self.jump_buffer.tick(dt);

        let mut fired = None;
        match self.state {
            PlayerState::Jumping => {
                self.vy += self.tuning.gravity * dt;
                self.rect.y += self.vy * dt;
                if self.rect.bottom() >= self.ground_y {
                    self.rect.y = self.ground_y - self.rect.h;
                    self.vy = 0.0;
                    self.on_ground = true;
                    self.jumps_used = 0;
                    self.state = PlayerState::Running;
                    if self.jump_buffer.is_active() {
                        fired = self.jump();
                    }
                }
            },
            PlayerState::Sliding => {
                if self.slide.tick(dt) {
                    self.end_slide();
                }
            },
            PlayerState::Running | PlayerState::Trapped | PlayerState::Tackled => {},
        }
        fired
    }
}
