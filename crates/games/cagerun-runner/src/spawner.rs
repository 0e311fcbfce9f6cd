use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use cagerun_core::timer::{TimerArm, TimerFired};

use crate::EntityId;
use crate::cage::FallingCage;
use crate::config::{CageTuning, LaneStyle, LevelConfig};
use crate::obstacle::{LaneProfile, Obstacle, Shape, ShapeColor};

/// Height above the ground line of each geometric obstacle tier.
const GEOMETRIC_TIERS: [f32; 4] = [0.0, 100.0, 200.0, 300.0];

/// The slice of level configuration the spawner needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRules {
    pub min_delay: f32,
    pub max_delay: f32,
    /// Minimum seconds between an obstacle spawn and a cage spawn.
    pub min_gap: f32,
    pub lane_style: LaneStyle,
    pub geometric: bool,
    pub spawn_x: f32,
    pub ground_y: f32,
    pub ceiling_y: f32,
    pub despawn_margin: f32,
    pub cage: CageTuning,
}

impl SpawnRules {
    pub fn from_config(cfg: &LevelConfig) -> Self {
        Self {
            min_delay: cfg.obstacle_min_delay,
            max_delay: cfg.obstacle_max_delay,
            min_gap: cfg.min_gap_between_types,
            lane_style: cfg.lane_style,
            geometric: cfg.geometric_obstacles,
            spawn_x: cfg.arena.width + cfg.arena.spawn_margin,
            ground_y: cfg.arena.ground_y,
            ceiling_y: cfg.arena.ceiling_height,
            despawn_margin: cfg.arena.despawn_margin,
            cage: cfg.cages.clone(),
        }
    }
}

/// Timed obstacle creation and obstacle/cage spacing.
///
/// Spawn intervals are resampled uniformly from `[min_delay, max_delay]`
/// after every fire, whether or not the fire produced an obstacle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawner {
    pub arm: TimerArm,
    generation: u64,
    pub last_obstacle_at: Option<f32>,
    pub last_cage_at: Option<f32>,
    pub last_lane: Option<LaneProfile>,
    /// Geometric levels spawn the head variant instead of plain shapes.
    pub head_mode: bool,
    rules: SpawnRules,
}

impl Spawner {
    /// A spawner with its timer disabled. Call [`Spawner::reset`] to arm it.
    pub fn new(rules: SpawnRules) -> Self {
        Self {
            arm: TimerArm::Disabled,
            generation: 0,
            last_obstacle_at: None,
            last_cage_at: None,
            last_lane: None,
            head_mode: false,
            rules,
        }
    }

    pub fn rules(&self) -> &SpawnRules {
        &self.rules
    }

    /// Sample a new delay and arm a new timer generation.
    pub fn rearm(&mut self, rng: &mut StdRng) {
        let delay = rng.random_range(self.rules.min_delay..=self.rules.max_delay);
        self.generation = self.generation.wrapping_add(1);
        self.arm = TimerArm::Armed {
            delay,
            generation: self.generation,
        };
    }

    /// Future spawns sit on the new ground line.
    pub fn set_ground_y(&mut self, ground_y: f32) {
        self.rules.ground_y = ground_y;
    }

    pub fn disable(&mut self) {
        self.arm = TimerArm::Disabled;
    }

    /// Handle a spawn timer fire at simulation time `now`.
    ///
    /// Stale fires change nothing. A current fire always rearms; it yields
    /// an obstacle unless a cage spawned within the type gap.
    pub fn handle_timer(
        &mut self,
        fired: TimerFired,
        now: f32,
        id: EntityId,
        speed: f32,
        rng: &mut StdRng,
    ) -> Option<Obstacle> {
        if !self.arm.accepts(fired) {
            tracing::debug!(
                "Ignoring stale spawn timer fire (generation {}, armed {:?})",
                fired.generation,
                self.arm.generation()
            );
            return None;
        }

        let cage_clear = self
            .last_cage_at
            .is_none_or(|t| now - t >= self.rules.min_gap);
        let spawned = if cage_clear {
            self.last_obstacle_at = Some(now);
            Some(self.build_obstacle(id, speed, rng))
        } else {
            tracing::debug!(
                "Obstacle spawn skipped: cage spawned under {}s ago",
                self.rules.min_gap
            );
            None
        };
        self.rearm(rng);
        spawned
    }

    fn build_obstacle(&mut self, id: EntityId, speed: f32, rng: &mut StdRng) -> Obstacle {
        let x = self.rules.spawn_x;
        let ground = self.rules.ground_y;
        let obstacle = if self.rules.geometric {
            let lift = GEOMETRIC_TIERS[rng.random_range(0..GEOMETRIC_TIERS.len())];
            let shape = if self.head_mode {
                Shape::Head
            } else {
                Shape::SPAWNABLE[rng.random_range(0..Shape::SPAWNABLE.len())]
            };
            let color = ShapeColor::ALL[rng.random_range(0..ShapeColor::ALL.len())];
            Obstacle::geometric(id, shape, color, x, ground - lift, speed)
        } else {
            let profile = match self.rules.lane_style {
                LaneStyle::Body => LaneProfile::Body,
                LaneStyle::Alternating => self.pick_lane(rng),
            };
            self.last_lane = Some(profile);
            Obstacle::lane(id, profile, x, ground, speed)
        };
        obstacle.with_despawn_margin(self.rules.despawn_margin)
    }

    /// Weighted against repeating the previous profile.
    fn pick_lane(&self, rng: &mut StdRng) -> LaneProfile {
        let low_weight = match self.last_lane {
            Some(LaneProfile::Low) => 0.3,
            Some(LaneProfile::High) => 0.7,
            Some(LaneProfile::Body) | None => 0.5,
        };
        if rng.random::<f32>() < low_weight {
            LaneProfile::Low
        } else {
            LaneProfile::High
        }
    }

    /// Whether a cage may spawn at `now` without crowding the last obstacle.
    pub fn can_spawn_cage(&self, now: f32) -> bool {
        self.last_obstacle_at
            .is_none_or(|t| now - t >= self.rules.min_gap)
    }

    /// Create a hanging cage centered on `x`. Callers check
    /// [`Spawner::can_spawn_cage`] first.
    pub fn spawn_cage_at(&mut self, id: EntityId, x: f32, speed: f32, now: f32) -> FallingCage {
        self.last_cage_at = Some(now);
        FallingCage::new(
            id,
            x,
            self.rules.ceiling_y,
            self.rules.ground_y,
            speed,
            self.rules.despawn_margin,
            &self.rules.cage,
        )
    }

    /// Forget all timing history and arm a fresh timer.
    pub fn reset(&mut self, rng: &mut StdRng) {
        self.last_obstacle_at = None;
        self.last_cage_at = None;
        self.last_lane = None;
        self.head_mode = false;
        self.rearm(rng);
    }
}

/// Jump-spam trigger that swaps geometric spawns to the head variant once
/// enough presses land early in the attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadModeTrigger {
    pub elapsed: f32,
    pub jumps: u32,
    pub active: bool,
}

impl HeadModeTrigger {
    pub fn tick(&mut self, dt: f32) {
        if !self.active {
            self.elapsed += dt;
        }
    }

    /// Count a jump press. Returns `true` on the press that activates head mode.
    pub fn on_jump(&mut self, needed: u32, window: f32) -> bool {
        if self.active || needed == 0 || self.elapsed >= window {
            return false;
        }
        self.jumps += 1;
        if self.jumps >= needed {
            self.active = true;
            return true;
        }
        false
    }
}
