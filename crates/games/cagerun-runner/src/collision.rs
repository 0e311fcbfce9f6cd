use cagerun_core::geom::Rect;

use crate::EntityId;
use crate::cage::FallingCage;
use crate::chaser::Chaser;
use crate::config::Forgiveness;
use crate::obstacle::{LaneProfile, Obstacle};
use crate::player::{Player, PlayerState};

/// Beam height; the beam is centered on the player's eye line.
const LASER_HEIGHT: f32 = 30.0;

/// Everything the resolver looks at for one tick. Borrowed for the call only.
#[derive(Debug, Clone, Copy)]
pub struct CollisionScene<'a> {
    pub player: &'a Player,
    pub chaser: Option<&'a Chaser>,
    pub obstacles: &'a [Obstacle],
    pub cages: &'a [FallingCage],
    /// Slowdown window active: only the chaser can still get the player.
    pub invincible: bool,
    /// The finale cage never traps the player.
    pub ignored_cage: Option<EntityId>,
}

/// What touched the player this tick. Obstacle and cage results are
/// independent; both may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionResult {
    pub hit_obstacle: Option<EntityId>,
    pub trapping_cage: Option<EntityId>,
    pub caught: bool,
}

impl CollisionResult {
    pub fn hit_cage(&self) -> bool {
        self.trapping_cage.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionResolver {
    forgiveness: Forgiveness,
}

impl CollisionResolver {
    pub fn new(forgiveness: &Forgiveness) -> Self {
        Self {
            forgiveness: forgiveness.clone(),
        }
    }

    pub fn check(&self, scene: &CollisionScene<'_>) -> CollisionResult {
        let player_box = scene.player.hitbox();
        let caught = scene
            .chaser
            .is_some_and(|chaser| chaser.has_caught(&player_box));

        if scene.invincible {
            return CollisionResult {
                caught,
                ..CollisionResult::default()
            };
        }

        let hit_obstacle = scene
            .obstacles
            .iter()
            .find(|o| o.alive && self.obstacle_hits(scene.player, &player_box, o))
            .map(|o| o.id);

        let trapping_cage = scene
            .cages
            .iter()
            .filter(|c| Some(c.id) != scene.ignored_cage)
            .find(|c| c.alive && self.cage_traps(scene.player, &player_box, c))
            .map(|c| c.id);

        CollisionResult {
            hit_obstacle,
            trapping_cage,
            caught,
        }
    }

    fn obstacle_hits(&self, player: &Player, player_box: &Rect, obstacle: &Obstacle) -> bool {
        let hitbox = obstacle.hitbox();
        if !player_box.overlaps(&hitbox) {
            return false;
        }
        let profile = obstacle.lane_profile();
        match player.state {
            PlayerState::Jumping => {
                let clear = if profile == Some(LaneProfile::Low) {
                    self.forgiveness.low_jump_clear
                } else {
                    self.forgiveness.jump_clear
                };
                player_box.bottom() >= hitbox.top() + clear
            },
            PlayerState::Sliding if profile == Some(LaneProfile::High) => {
                player_box.top() <= hitbox.bottom() - self.forgiveness.slide_clear
            },
            _ => true,
        }
    }

    fn cage_traps(&self, player: &Player, player_box: &Rect, cage: &FallingCage) -> bool {
        if !cage.state.is_hazardous() {
            return false;
        }
        let hitbox = cage.hitbox();
        if !player_box.overlaps(&hitbox) {
            return false;
        }
        if player.in_immunity_window() {
            return false;
        }
        let ducked = player.state == PlayerState::Sliding
            && player_box.top() > hitbox.bottom() - self.forgiveness.cage_slide_clear;
        !ducked
    }

    /// The shootable obstacle a beam from `origin` reaching `range` pixels
    /// would hit first.
    pub fn laser_target(
        &self,
        origin: (f32, f32),
        range: f32,
        obstacles: &[Obstacle],
    ) -> Option<EntityId> {
        let beam = laser_beam(origin, range);
        obstacles
            .iter()
            .filter(|o| o.alive && o.is_shootable() && beam.overlaps(&o.hitbox()))
            .min_by(|a, b| a.rect.left().total_cmp(&b.rect.left()))
            .map(|o| o.id)
    }
}

/// Beam rectangle starting at the eye and extending right.
pub fn laser_beam(origin: (f32, f32), range: f32) -> Rect {
    let (x, y) = origin;
    Rect::new(x, y - LASER_HEIGHT / 2.0, range, LASER_HEIGHT)
}
