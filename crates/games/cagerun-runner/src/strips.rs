use std::collections::VecDeque;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::config::CageTuning;

/// Tile art variants per strip. Variant 0 is the common one.
pub const TILE_VARIANTS: u8 = 4;
/// Floor tile edge length in pixels.
pub const GROUND_TILE_SIZE: f32 = 64.0;
/// Extra columns kept past the right edge.
const BUFFER_COLUMNS: usize = 3;

/// Initial strip fill favours variant 0 three to one over each other variant.
fn weighted_variant(rng: &mut StdRng) -> u8 {
    let roll = rng.random_range(0..TILE_VARIANTS + 2);
    roll.saturating_sub(2)
}

fn columns_for(screen_w: f32, tile_size: f32) -> usize {
    (screen_w / tile_size).floor() as usize + BUFFER_COLUMNS + 2
}

/// Scrolling floor tiles. Purely visual; kept so the renderer can draw the
/// strip in lockstep with the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundStrip {
    pub tiles: VecDeque<u8>,
    /// Pixels the first tile has scrolled past the left edge.
    pub scroll_offset: f32,
    pub tile_size: f32,
}

impl GroundStrip {
    pub fn new(screen_w: f32, tile_size: f32, rng: &mut StdRng) -> Self {
        let tiles = (0..columns_for(screen_w, tile_size))
            .map(|_| weighted_variant(rng))
            .collect();
        Self {
            tiles,
            scroll_offset: 0.0,
            tile_size,
        }
    }

    pub fn update(&mut self, scroll_delta: f32, rng: &mut StdRng) {
        self.scroll_offset += scroll_delta;
        while self.scroll_offset >= self.tile_size {
            self.scroll_offset -= self.tile_size;
            self.tiles.pop_front();
            self.tiles.push_back(rng.random_range(0..TILE_VARIANTS));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeilingTile {
    pub variant: u8,
    pub has_cage: bool,
    pub cage_spawned: bool,
}

/// Scrolling ceiling that schedules cage drops.
///
/// Freshly appended tiles carry a cage marker with probability
/// `cage_chance`, never closer than `min_tiles_between` tiles to the last
/// marker. A marker requests a cage once its tile reaches the right edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CeilingStrip {
    pub tiles: VecDeque<CeilingTile>,
    pub scroll_offset: f32,
    screen_w: f32,
    tiles_since_cage: u32,
    cages_enabled: bool,
    tile_size: f32,
    cage_chance: f32,
    min_tiles_between: u32,
}

impl CeilingStrip {
    pub fn new(screen_w: f32, tuning: &CageTuning, rng: &mut StdRng) -> Self {
        let tiles = (0..columns_for(screen_w, tuning.tile_size))
            .map(|_| CeilingTile {
                variant: weighted_variant(rng),
                has_cage: false,
                cage_spawned: false,
            })
            .collect();
        Self {
            tiles,
            scroll_offset: 0.0,
            screen_w,
            tiles_since_cage: tuning.min_tiles_between,
            cages_enabled: tuning.enabled,
            tile_size: tuning.tile_size,
            cage_chance: tuning.cage_chance,
            min_tiles_between: tuning.min_tiles_between,
        }
    }

    fn append_tile(&mut self, rng: &mut StdRng) {
        let mut tile = CeilingTile {
            variant: rng.random_range(0..TILE_VARIANTS),
            has_cage: false,
            cage_spawned: false,
        };
        if self.cages_enabled
            && self.tiles_since_cage >= self.min_tiles_between
            && rng.random::<f32>() < self.cage_chance
        {
            tile.has_cage = true;
            self.tiles_since_cage = 0;
        } else {
            self.tiles_since_cage += 1;
        }
        self.tiles.push_back(tile);
    }

    /// Scroll by `scroll_delta` pixels. Returns the x centers of cages that
    /// should spawn this tick. Each marker is reported once.
    pub fn update(&mut self, scroll_delta: f32, rng: &mut StdRng) -> Vec<f32> {
        self.scroll_offset += scroll_delta;
        while self.scroll_offset >= self.tile_size {
            self.scroll_offset -= self.tile_size;
            self.tiles.pop_front();
            self.append_tile(rng);
        }

        let threshold = self.screen_w + self.tile_size;
        let mut spawn_xs = Vec::new();
        let mut x = -self.scroll_offset;
        for tile in self.tiles.iter_mut() {
            if x > threshold {
                break;
            }
            if tile.has_cage && !tile.cage_spawned && x + self.tile_size > self.screen_w {
                spawn_xs.push(x + self.tile_size / 2.0);
                tile.cage_spawned = true;
            }
            x += self.tile_size;
        }
        spawn_xs
    }
}
