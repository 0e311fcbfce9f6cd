use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Arena geometry in screen pixels (y grows downward).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    pub ground_y: f32,
    pub ceiling_height: f32,
    /// New hazards appear this far past the right edge.
    pub spawn_margin: f32,
    /// Hazards are dropped once their right edge is this far past the left edge.
    pub despawn_margin: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            ground_y: 720.0,
            ceiling_height: 60.0,
            spawn_margin: 100.0,
            despawn_margin: 50.0,
        }
    }
}

/// Player physics and ability tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Horizontal center of the player. The player never moves on x.
    pub x: f32,
    pub width: f32,
    pub height: f32,
    pub slide_width: f32,
    pub slide_height: f32,
    /// Shrink applied to both axes of the running/jumping body.
    pub hitbox_inset: f32,
    pub slide_hitbox_inset_w: f32,
    pub slide_hitbox_inset_h: f32,
    pub gravity: f32,
    pub jump_force: f32,
    pub double_jump: bool,
    pub double_jump_force: f32,
    pub slide_enabled: bool,
    pub slide_duration: f32,
    pub slide_cooldown: f32,
    /// Leading part of a slide during which falling cages cannot trap.
    pub slide_immunity_window: f32,
    pub coyote_time: f32,
    pub jump_buffer: f32,
    pub laser_enabled: bool,
    pub laser_cooldown: f32,
    pub laser_range: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            x: 320.0,
            width: 70.0,
            height: 120.0,
            slide_width: 120.0,
            slide_height: 60.0,
            hitbox_inset: 10.0,
            slide_hitbox_inset_w: 20.0,
            slide_hitbox_inset_h: 40.0,
            gravity: 1100.0,
            jump_force: -650.0,
            double_jump: false,
            double_jump_force: 0.0,
            slide_enabled: true,
            slide_duration: 0.5,
            slide_cooldown: 0.8,
            slide_immunity_window: 0.8,
            coyote_time: 0.0,
            jump_buffer: 0.0,
            laser_enabled: false,
            laser_cooldown: 0.0,
            laser_range: 0.0,
        }
    }
}

/// Pursuit AI tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaserTuning {
    pub enabled: bool,
    pub start_x: f32,
    pub width: f32,
    pub height: f32,
    pub base_speed: f32,
    pub speed_boost_on_hit: f32,
    pub approach_on_hit: f32,
    pub follow_offset: f32,
    /// How far short of the player the chaser is held while following.
    pub follow_slack: f32,
    pub gravity: f32,
    pub jump_force: f32,
    pub jump_off_force: f32,
    pub cage_detection_range: f32,
    pub obstacle_detection_range: f32,
    pub catching_speed: f32,
    /// Vertical band below a cage top in which a falling chaser lands on it.
    pub cage_landing_window: f32,
    /// Distance before a cage's right edge at which the chaser leaps off.
    pub jump_off_margin: f32,
}

impl Default for ChaserTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            start_x: -200.0,
            width: 70.0,
            height: 120.0,
            base_speed: 150.0,
            speed_boost_on_hit: 50.0,
            approach_on_hit: 80.0,
            follow_offset: 250.0,
            follow_slack: 100.0,
            gravity: 1100.0,
            jump_force: -850.0,
            jump_off_force: -300.0,
            cage_detection_range: 550.0,
            obstacle_detection_range: 300.0,
            catching_speed: 600.0,
            cage_landing_window: 30.0,
            jump_off_margin: 20.0,
        }
    }
}

/// Falling cage and ceiling strip tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CageTuning {
    /// Falling cages are scheduled by the ceiling strip.
    pub enabled: bool,
    /// The ceiling strip is simulated (for drawing) even without cages.
    pub ceiling_tiles: bool,
    pub width: f32,
    pub height: f32,
    pub fall_accel: f32,
    pub max_fall_speed: f32,
    pub initial_fall_speed: f32,
    pub warning_duration: f32,
    pub trigger_distance: f32,
    pub grounded_duration: f32,
    pub tile_size: f32,
    pub cage_chance: f32,
    pub min_tiles_between: u32,
}

impl Default for CageTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            ceiling_tiles: true,
            width: 180.0,
            height: 220.0,
            fall_accel: 2000.0,
            max_fall_speed: 1200.0,
            initial_fall_speed: 200.0,
            warning_duration: 0.6,
            trigger_distance: 200.0,
            grounded_duration: 0.8,
            tile_size: 64.0,
            cage_chance: 0.12,
            min_tiles_between: 4,
        }
    }
}

/// Pixel margins that let near-misses count as clean dodges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Forgiveness {
    /// Jumping player whose hitbox bottom is above `top + jump_clear` clears an obstacle.
    pub jump_clear: f32,
    /// Same test for LOW lane obstacles.
    pub low_jump_clear: f32,
    /// Sliding player whose hitbox top is below `bottom - slide_clear` passes under a HIGH obstacle.
    pub slide_clear: f32,
    /// Same test against a cage's hitbox bottom.
    pub cage_slide_clear: f32,
}

impl Default for Forgiveness {
    fn default() -> Self {
        Self {
            jump_clear: 15.0,
            low_jump_clear: 20.0,
            slide_clear: 15.0,
            cage_slide_clear: 15.0,
        }
    }
}

/// Which lane obstacles a non-geometric level spawns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneStyle {
    /// One ground-level body obstacle.
    #[default]
    Body,
    /// LOW and HIGH obstacles with weighted alternation.
    Alternating,
}

/// Full rule set for one level, loaded once per attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub level_id: u8,
    pub name: String,
    pub arena: ArenaConfig,
    pub player: PlayerTuning,
    pub chaser: ChaserTuning,
    pub cages: CageTuning,
    pub forgiveness: Forgiveness,
    pub scroll_speed: f32,
    pub speed_growth: f32,
    pub max_speed: f32,
    pub obstacle_min_delay: f32,
    pub obstacle_max_delay: f32,
    pub min_gap_between_types: f32,
    pub lane_style: LaneStyle,
    pub geometric_obstacles: bool,
    pub ground_tiles: bool,
    pub finale_score: u32,
    pub lane_dodge_score: u32,
    pub cage_dodge_score: u32,
    pub laser_kill_score: u32,
    pub max_hits: u32,
    pub slowdown_duration: f32,
    pub slowdown_mult: f32,
    pub trapped_duration: f32,
    pub tackle_duration: f32,
    pub finale_duration: f32,
    pub slide_boost_mult: f32,
    /// Passive points per pixel scrolled.
    pub score_rate: f32,
    pub head_mode_jumps: u32,
    pub head_mode_window: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            level_id: 1,
            name: "Level 1".to_string(),
            arena: ArenaConfig::default(),
            player: PlayerTuning::default(),
            chaser: ChaserTuning::default(),
            cages: CageTuning::default(),
            forgiveness: Forgiveness::default(),
            scroll_speed: 400.0,
            speed_growth: 0.0,
            max_speed: 400.0,
            obstacle_min_delay: 2.5,
            obstacle_max_delay: 5.0,
            min_gap_between_types: 2.0,
            lane_style: LaneStyle::Body,
            geometric_obstacles: false,
            ground_tiles: true,
            finale_score: 3000,
            lane_dodge_score: 100,
            cage_dodge_score: 150,
            laser_kill_score: 100,
            max_hits: 3,
            slowdown_duration: 0.8,
            slowdown_mult: 0.4,
            trapped_duration: 4.0,
            tackle_duration: 2.0,
            finale_duration: 1.2,
            slide_boost_mult: 2.2,
            score_rate: 0.1,
            head_mode_jumps: 5,
            head_mode_window: 10.0,
        }
    }
}

/// Rejected level configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no built-in preset for level {0}")]
    UnknownLevel(u8),
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must point upward (negative), got {value}")]
    JumpForce { field: &'static str, value: f32 },
    #[error("obstacle delay range {min}..{max} is inverted or negative")]
    DelayRange { min: f32, max: f32 },
    #[error("max_hits must be at least 1")]
    ZeroMaxHits,
    #[error("slowdown_mult must be in (0, 1], got {0}")]
    SlowdownMult(f32),
    #[error("max_speed {max} is below scroll_speed {scroll}")]
    MaxSpeed { scroll: f32, max: f32 },
    #[error("cage_chance must be in [0, 1], got {0}")]
    CageChance(f32),
    #[error("a {height}px cage hung at {ceiling} reaches past the ground line at {ground}")]
    CageBelowGround { ceiling: f32, height: f32, ground: f32 },
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Encode(#[from] toml::ser::Error),
}

fn finite(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if finite(field, value)? > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if finite(field, value)? >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn upward(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if finite(field, value)? < 0.0 {
        Ok(())
    } else {
        Err(ConfigError::JumpForce { field, value })
    }
}

impl LevelConfig {
    /// Built-in preset for one of the shipped levels.
    pub fn level(level_id: u8) -> Option<Self> {
        match level_id {
            1 => Some(Self::default()),
            2 => Some(Self::level_two()),
            3 => Some(Self::level_three()),
            _ => None,
        }
    }

    fn level_two() -> Self {
        let base = Self::default();
        Self {
            level_id: 2,
            name: "Level 2".to_string(),
            player: PlayerTuning {
                gravity: 2200.0,
                jump_force: -860.0,
                double_jump: true,
                double_jump_force: -780.0,
                slide_enabled: false,
                coyote_time: 0.09,
                jump_buffer: 0.11,
                ..base.player.clone()
            },
            cages: CageTuning {
                enabled: false,
                ceiling_tiles: false,
                ..base.cages.clone()
            },
            scroll_speed: 420.0,
            speed_growth: 6.0,
            max_speed: 900.0,
            obstacle_min_delay: 0.7,
            obstacle_max_delay: 1.7,
            finale_score: 5000,
            slowdown_duration: 1.15,
            slowdown_mult: 0.68,
            ..base
        }
    }

    fn level_three() -> Self {
        let base = Self::default();
        Self {
            level_id: 3,
            name: "Level 3".to_string(),
            player: PlayerTuning {
                gravity: 1800.0,
                jump_force: -700.0,
                coyote_time: 0.08,
                jump_buffer: 0.10,
                laser_enabled: true,
                laser_cooldown: 0.2,
                laser_range: 800.0,
                ..base.player.clone()
            },
            chaser: ChaserTuning {
                enabled: false,
                ..base.chaser.clone()
            },
            cages: CageTuning {
                enabled: false,
                ceiling_tiles: false,
                ..base.cages.clone()
            },
            scroll_speed: 600.0,
            max_speed: 600.0,
            obstacle_min_delay: 0.7,
            obstacle_max_delay: 1.7,
            geometric_obstacles: true,
            finale_score: 2000,
            lane_dodge_score: 50,
            slowdown_duration: 0.0,
            slowdown_mult: 1.0,
            ..base
        }
    }

    /// Load a level's rule set. Reads the path in `CAGERUN_LEVEL_<N>_CONFIG`
    /// or `config/level<N>.toml`; keys in the file override the built-in
    /// preset. Falls back to the preset if the file is missing or invalid.
    pub fn load(level_id: u8) -> Self {
        let preset = Self::level(level_id).unwrap_or_else(|| Self {
            level_id,
            ..Self::default()
        });
        let path = std::env::var(format!("CAGERUN_LEVEL_{level_id}_CONFIG"))
            .unwrap_or_else(|_| format!("config/level{level_id}.toml"));
        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_over(&preset, &content) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!("Failed to load {path}: {e}, using level {level_id} preset");
                    preset
                },
            },
            Err(_) => preset,
        }
    }

    /// Overlay a TOML document onto `base` and validate the result.
    pub fn from_toml_over(base: &LevelConfig, content: &str) -> Result<Self, ConfigError> {
        let overrides: toml::Table = toml::from_str(content)?;
        let mut merged = toml::Table::try_from(base)?;
        merge_tables(&mut merged, overrides);
        let cfg: LevelConfig = toml::Value::Table(merged).try_into()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the simulation cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("arena.width", self.arena.width)?;
        positive("arena.height", self.arena.height)?;
        positive("arena.ground_y", self.arena.ground_y)?;
        non_negative("arena.ceiling_height", self.arena.ceiling_height)?;
        non_negative("arena.spawn_margin", self.arena.spawn_margin)?;
        non_negative("arena.despawn_margin", self.arena.despawn_margin)?;

        let p = &self.player;
        finite("player.x", p.x)?;
        positive("player.width", p.width)?;
        positive("player.height", p.height)?;
        positive("player.slide_width", p.slide_width)?;
        positive("player.slide_height", p.slide_height)?;
        positive("player.gravity", p.gravity)?;
        upward("player.jump_force", p.jump_force)?;
        if p.double_jump {
            upward("player.double_jump_force", p.double_jump_force)?;
        }
        non_negative("player.hitbox_inset", p.hitbox_inset)?;
        non_negative("player.slide_hitbox_inset_w", p.slide_hitbox_inset_w)?;
        non_negative("player.slide_hitbox_inset_h", p.slide_hitbox_inset_h)?;
        non_negative("player.slide_duration", p.slide_duration)?;
        non_negative("player.slide_cooldown", p.slide_cooldown)?;
        non_negative("player.slide_immunity_window", p.slide_immunity_window)?;
        non_negative("player.coyote_time", p.coyote_time)?;
        non_negative("player.jump_buffer", p.jump_buffer)?;
        if p.laser_enabled {
            non_negative("player.laser_cooldown", p.laser_cooldown)?;
            positive("player.laser_range", p.laser_range)?;
        }

        let c = &self.chaser;
        if c.enabled {
            finite("chaser.start_x", c.start_x)?;
            positive("chaser.width", c.width)?;
            positive("chaser.height", c.height)?;
            non_negative("chaser.base_speed", c.base_speed)?;
            non_negative("chaser.speed_boost_on_hit", c.speed_boost_on_hit)?;
            non_negative("chaser.approach_on_hit", c.approach_on_hit)?;
            non_negative("chaser.follow_offset", c.follow_offset)?;
            non_negative("chaser.follow_slack", c.follow_slack)?;
            positive("chaser.gravity", c.gravity)?;
            upward("chaser.jump_force", c.jump_force)?;
            upward("chaser.jump_off_force", c.jump_off_force)?;
            non_negative("chaser.cage_detection_range", c.cage_detection_range)?;
            non_negative("chaser.obstacle_detection_range", c.obstacle_detection_range)?;
            positive("chaser.catching_speed", c.catching_speed)?;
            non_negative("chaser.cage_landing_window", c.cage_landing_window)?;
            non_negative("chaser.jump_off_margin", c.jump_off_margin)?;
        }

        let k = &self.cages;
        positive("cages.width", k.width)?;
        positive("cages.height", k.height)?;
        positive("cages.fall_accel", k.fall_accel)?;
        positive("cages.max_fall_speed", k.max_fall_speed)?;
        non_negative("cages.initial_fall_speed", k.initial_fall_speed)?;
        non_negative("cages.warning_duration", k.warning_duration)?;
        non_negative("cages.trigger_distance", k.trigger_distance)?;
        non_negative("cages.grounded_duration", k.grounded_duration)?;
        positive("cages.tile_size", k.tile_size)?;
        if !(0.0..=1.0).contains(&finite("cages.cage_chance", k.cage_chance)?) {
            return Err(ConfigError::CageChance(k.cage_chance));
        }
        if !self.fits_hanging_cage(self.arena.ground_y) {
            return Err(ConfigError::CageBelowGround {
                ceiling: self.arena.ceiling_height,
                height: k.height,
                ground: self.arena.ground_y,
            });
        }

        let f = &self.forgiveness;
        non_negative("forgiveness.jump_clear", f.jump_clear)?;
        non_negative("forgiveness.low_jump_clear", f.low_jump_clear)?;
        non_negative("forgiveness.slide_clear", f.slide_clear)?;
        non_negative("forgiveness.cage_slide_clear", f.cage_slide_clear)?;

        positive("scroll_speed", self.scroll_speed)?;
        non_negative("speed_growth", self.speed_growth)?;
        if finite("max_speed", self.max_speed)? < self.scroll_speed {
            return Err(ConfigError::MaxSpeed {
                scroll: self.scroll_speed,
                max: self.max_speed,
            });
        }
        let (min, max) = (
            finite("obstacle_min_delay", self.obstacle_min_delay)?,
            finite("obstacle_max_delay", self.obstacle_max_delay)?,
        );
        if min < 0.0 || max < min {
            return Err(ConfigError::DelayRange { min, max });
        }
        non_negative("min_gap_between_types", self.min_gap_between_types)?;
        if self.max_hits == 0 {
            return Err(ConfigError::ZeroMaxHits);
        }
        non_negative("slowdown_duration", self.slowdown_duration)?;
        let mult = finite("slowdown_mult", self.slowdown_mult)?;
        if mult <= 0.0 || mult > 1.0 {
            return Err(ConfigError::SlowdownMult(mult));
        }
        non_negative("trapped_duration", self.trapped_duration)?;
        non_negative("tackle_duration", self.tackle_duration)?;
        non_negative("finale_duration", self.finale_duration)?;
        positive("slide_boost_mult", self.slide_boost_mult)?;
        non_negative("score_rate", self.score_rate)?;
        non_negative("head_mode_window", self.head_mode_window)?;
        Ok(())
    }

    /// Whether a cage hanging from the ceiling stays clear of `ground_y`.
    pub fn fits_hanging_cage(&self, ground_y: f32) -> bool {
        self.arena.ceiling_height + self.cages.height <= ground_y
    }

    /// Whether this attempt runs with a chaser.
    pub fn has_chaser(&self, disable_chaser: bool) -> bool {
        self.chaser.enabled && !disable_chaser
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            },
            (_, value) => {
                base.insert(key, value);
            },
        }
    }
}
