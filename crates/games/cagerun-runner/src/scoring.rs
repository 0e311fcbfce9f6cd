use serde::{Deserialize, Serialize};

use cagerun_core::events::SimEvent;

use crate::cage::{CageState, FallingCage};
use crate::obstacle::Obstacle;

/// Attempt score. Distance points accrue fractionally and are paid out in
/// whole points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub points: u32,
    carry: f32,
}

impl Score {
    pub fn add(&mut self, points: u32) {
        self.points = self.points.saturating_add(points);
    }

    /// Passive score for `pixels` scrolled at `rate` points per pixel.
    pub fn accrue_distance(&mut self, pixels: f32, rate: f32) {
        let earned = pixels * rate;
        if !earned.is_finite() || earned <= 0.0 {
            return;
        }
        self.carry += earned;
        let whole = self.carry.floor();
        self.carry -= whole;
        self.add(whole as u32);
    }
}

/// Flag and pay out every live obstacle whose right edge is behind
/// `player_left`. Each obstacle pays at most once.
pub fn award_obstacle_dodges(
    obstacles: &mut [Obstacle],
    player_left: f32,
    bonus: u32,
) -> Vec<SimEvent> {
    obstacles
        .iter_mut()
        .filter(|o| o.alive && !o.scored && o.rect.right() < player_left)
        .map(|o| {
            o.scored = true;
            SimEvent::ObstacleDodged { bonus }
        })
        .collect()
}

/// Pay out every cage that has reached the ground without catching anyone.
pub fn award_cage_dodges(cages: &mut [FallingCage], bonus: u32) -> Vec<SimEvent> {
    cages
        .iter_mut()
        .filter(|c| c.alive && !c.scored && c.state == CageState::Grounded)
        .map(|c| {
            c.scored = true;
            SimEvent::CageDodged { bonus }
        })
        .collect()
}
