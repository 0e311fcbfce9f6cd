use serde::{Deserialize, Serialize};

use cagerun_core::anim::FrameClock;
use cagerun_core::geom::Rect;

use crate::EntityId;
use crate::cage::{CageState, CageView};
use crate::config::ChaserTuning;

const RUN_FRAMES: usize = 16;
const JUMP_FRAMES: usize = 8;
const FRAME_DELAY: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChaserState {
    Running,
    Jumping,
    /// Riding the top of a cage.
    OnCage,
    JumpingOff,
    /// Racing at the player after too many hits.
    Catching,
    /// Caught by the finale cage.
    Trapped,
}

/// The pursuer. Follows the player at an offset, hops over hazards and rides
/// falling cages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chaser {
    pub state: ChaserState,
    /// Continuous horizontal center; `rect` is derived from it.
    pub pos_x: f32,
    pub rect: Rect,
    pub vy: f32,
    pub on_ground: bool,
    pub ground_y: f32,
    /// Ratchets up on every player hit until the attempt resets.
    pub speed: f32,
    pub target_x: f32,
    pub current_cage: Option<EntityId>,
    pub catch_target_x: f32,
    pub anim: FrameClock,
    tuning: ChaserTuning,
}

impl Chaser {
    pub fn new(tuning: &ChaserTuning, ground_y: f32) -> Self {
        Self {
            state: ChaserState::Running,
            pos_x: tuning.start_x,
            rect: Rect::from_midbottom(tuning.start_x, ground_y, tuning.width, tuning.height),
            vy: 0.0,
            on_ground: true,
            ground_y,
            speed: tuning.base_speed,
            target_x: tuning.start_x,
            current_cage: None,
            catch_target_x: 0.0,
            anim: FrameClock::new(RUN_FRAMES, FRAME_DELAY),
            tuning: tuning.clone(),
        }
    }

    /// Follow `player_x` at the configured offset.
    pub fn set_target(&mut self, player_x: f32) {
        self.target_x = player_x - self.tuning.follow_offset;
    }

    /// Rubber band: faster for good and snapped closer right now.
    pub fn on_player_hit(&mut self) {
        self.speed += self.tuning.speed_boost_on_hit;
        self.pos_x += self.tuning.approach_on_hit;
    }

    pub fn has_caught(&self, player: &Rect) -> bool {
        self.rect.overlaps(player)
    }

    /// Abandon following and run down the player at `target_x`.
    pub fn start_catching(&mut self, target_x: f32) {
        self.state = ChaserState::Catching;
        self.catch_target_x = target_x;
        self.current_cage = None;
        self.settle();
        self.anim.restart(RUN_FRAMES, FRAME_DELAY);
    }

    /// Locked in the finale cage.
    pub fn trap(&mut self) {
        self.state = ChaserState::Trapped;
        self.current_cage = None;
        self.settle();
    }

    /// Snap the chaser onto its tackled target.
    pub fn set_center_x(&mut self, x: f32) {
        self.pos_x = x;
        self.rect.x = x - self.rect.w / 2.0;
    }

    pub fn set_ground_y(&mut self, ground_y: f32) {
        self.ground_y = ground_y;
        if self.on_ground {
            self.rect.y = ground_y - self.rect.h;
        }
    }

    fn settle(&mut self) {
        self.vy = 0.0;
        self.on_ground = true;
        self.rect = Rect::from_midbottom(self.pos_x, self.ground_y, self.rect.w, self.rect.h);
    }

    fn jump(&mut self) {
        if self.on_ground {
            self.vy = self.tuning.jump_force;
            self.state = ChaserState::Jumping;
            self.on_ground = false;
            self.anim.restart(JUMP_FRAMES, FRAME_DELAY);
        }
    }

    fn jump_off(&mut self) {
        self.vy = self.tuning.jump_off_force;
        self.state = ChaserState::JumpingOff;
        self.current_cage = None;
        self.anim.restart(JUMP_FRAMES, FRAME_DELAY);
    }

    fn land(&mut self) {
        self.rect.y = self.ground_y - self.rect.h;
        self.vy = 0.0;
        self.on_ground = true;
        self.state = ChaserState::Running;
        self.anim.restart(RUN_FRAMES, FRAME_DELAY);
    }

    fn fall(&mut self, dt: f32) {
        self.vy += self.tuning.gravity * dt;
        self.rect.y += self.vy * dt;
    }

    fn cage_ahead(&self, cages: &[CageView]) -> bool {
        let cx = self.rect.center_x();
        cages.iter().any(|c| {
            let dist = c.rect.center_x() - cx;
            c.state.is_hazardous() && dist > 0.0 && dist < self.tuning.cage_detection_range
        })
    }

    fn obstacle_ahead(&self, obstacles: &[Rect]) -> bool {
        let cx = self.rect.center_x();
        obstacles.iter().any(|o| {
            let dist = o.center_x() - cx;
            dist > 0.0 && dist < self.tuning.obstacle_detection_range
        })
    }

    fn landing_cage<'a>(&self, cages: &'a [CageView]) -> Option<&'a CageView> {
        if self.vy <= 0.0 {
            return None;
        }
        let (cx, bottom) = (self.rect.center_x(), self.rect.bottom());
        cages.iter().find(|c| {
            c.state.is_hazardous()
                && c.rect.left() < cx
                && cx < c.rect.right()
                && bottom >= c.rect.top()
                && bottom <= c.rect.top() + self.tuning.cage_landing_window
        })
    }

    /// Advance one tick. `cages` and `obstacles` are snapshots of the
    /// current hazards; lane obstacle rects only.
    pub fn update(&mut self, dt: f32, cages: &[CageView], obstacles: &[Rect]) {
        self.anim.tick(dt);

        match self.state {
            ChaserState::Running => {
                if self.cage_ahead(cages) || self.obstacle_ahead(obstacles) {
                    self.jump();
                }
            },
            ChaserState::Jumping => {
                self.fall(dt);
                if let Some(cage) = self.landing_cage(cages) {
                    self.rect.y = cage.rect.top() - self.rect.h;
                    self.vy = 0.0;
                    self.state = ChaserState::OnCage;
                    self.current_cage = Some(cage.id);
                    self.anim.restart(RUN_FRAMES, FRAME_DELAY);
                } else if self.rect.bottom() >= self.ground_y {
                    self.land();
                }
            },
            ChaserState::OnCage => {
                let riding = self
                    .current_cage
                    .and_then(|id| cages.iter().find(|c| c.id == id));
                match riding {
                    Some(cage) => {
                        self.rect.y = cage.rect.top() - self.rect.h;
                        if self.rect.center_x() >= cage.rect.right() - self.tuning.jump_off_margin {
                            self.jump_off();
                        }
                    },
                    None => self.jump_off(),
                }
            },
            ChaserState::JumpingOff => {
                self.fall(dt);
                if self.rect.bottom() >= self.ground_y {
                    self.land();
                }
            },
            ChaserState::Catching => {
                let diff = self.catch_target_x - self.pos_x;
                let step = self.tuning.catching_speed * dt;
                self.pos_x += diff.clamp(-step, step);
                self.rect = Rect::from_midbottom(self.pos_x, self.ground_y, self.rect.w, self.rect.h);
                return;
            },
            ChaserState::Trapped => return,
        }

        let diff = self.target_x - self.pos_x;
        if diff > 0.0 {
            self.pos_x += (self.speed * dt).min(diff);
        } else if diff < 0.0 {
            self.pos_x -= (self.speed * 0.5 * dt).min(-diff);
        }
        let limit = self.target_x + self.tuning.follow_offset - self.tuning.follow_slack;
        self.pos_x = self.pos_x.min(limit);
        self.rect.x = self.pos_x - self.rect.w / 2.0;
    }
}
