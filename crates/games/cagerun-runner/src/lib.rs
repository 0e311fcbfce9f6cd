pub mod cage;
pub mod chaser;
pub mod collision;
pub mod config;
pub mod laser;
pub mod obstacle;
pub mod player;
pub mod scoring;
pub mod spawner;
pub mod strips;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use cagerun_core::countdown::Countdown;
use cagerun_core::events::{Outcome, SimEvent};
use cagerun_core::game_trait::{GameMetadata, RunnerGame};
use cagerun_core::geom::Rect;
use cagerun_core::input::{GameAction, InputEvent};
use cagerun_core::progress::SimFlags;
use cagerun_core::runner_game_boilerplate;
use cagerun_core::timer::{TimerArm, TimerFired};

use cage::{CageView, FallingCage};
use chaser::Chaser;
use collision::{CollisionResolver, CollisionScene};
use config::{ConfigError, LevelConfig};
use laser::LaserBeam;
use obstacle::Obstacle;
use player::Player;
use scoring::{Score, award_cage_dodges, award_obstacle_dodges};
use spawner::{HeadModeTrigger, SpawnRules, Spawner};
use strips::{CeilingStrip, GROUND_TILE_SIZE, GroundStrip};

/// Identifier for obstacles and cages, unique within an attempt.
pub type EntityId = u32;

/// Phase of one level attempt. Exactly one holds at a time; `update`
/// dispatches on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttemptPhase {
    Playing,
    /// Score target reached. Spawning has stopped and the next cage is
    /// earmarked for the chaser.
    FinaleArmed,
    /// Too many hits; the chaser is running the player down.
    ChaserCatching,
    PlayerTackled { timer: Countdown },
    PlayerTrapped { cage: EntityId, timer: Countdown },
    ChaserTrapped { cage: EntityId, timer: Countdown },
    LevelComplete,
    GameOver,
}

impl AttemptPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptPhase::LevelComplete | AttemptPhase::GameOver)
    }

    /// Normal scrolling play, finale armed or not.
    pub fn is_scrolling(&self) -> bool {
        matches!(self, AttemptPhase::Playing | AttemptPhase::FinaleArmed)
    }
}

/// Serializable attempt state. Everything the renderer draws is in here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub phase: AttemptPhase,
    /// Simulated seconds since the attempt started.
    pub clock: f32,
    pub score: Score,
    pub hits: u32,
    /// Background offset, wrapped at the arena width.
    pub scroll_x: f32,
    pub scroll_speed: f32,
    /// Post-hit slowdown. Also suppresses obstacle and cage damage.
    pub slowdown: Countdown,
    pub player: Player,
    pub chaser: Option<Chaser>,
    pub obstacles: Vec<Obstacle>,
    pub cages: Vec<FallingCage>,
    /// The cage that targets the chaser during the finale.
    pub finale_cage: Option<EntityId>,
    pub ground: Option<GroundStrip>,
    pub ceiling: Option<CeilingStrip>,
    pub spawner: Spawner,
    pub head_mode: HeadModeTrigger,
    pub beams: Vec<LaserBeam>,
    next_id: EntityId,
}

impl RunState {
    /// A fresh attempt. `spawner` carries its timer generation over so a
    /// fire from the previous attempt cannot match the new arm.
    fn new(cfg: &LevelConfig, flags: &SimFlags, mut spawner: Spawner, rng: &mut StdRng) -> Self {
        let ground_y = cfg.arena.ground_y;
        spawner.reset(rng);
        Self {
            phase: AttemptPhase::Playing,
            clock: 0.0,
            score: Score::default(),
            hits: 0,
            scroll_x: 0.0,
            scroll_speed: cfg.scroll_speed,
            slowdown: Countdown::idle(),
            player: Player::new(&cfg.player, ground_y),
            chaser: cfg
                .has_chaser(flags.disable_chaser)
                .then(|| Chaser::new(&cfg.chaser, ground_y)),
            obstacles: Vec::new(),
            cages: Vec::new(),
            finale_cage: None,
            ground: cfg
                .ground_tiles
                .then(|| GroundStrip::new(cfg.arena.width, GROUND_TILE_SIZE, rng)),
            ceiling: cfg
                .cages
                .ceiling_tiles
                .then(|| CeilingStrip::new(cfg.arena.width, &cfg.cages, rng)),
            spawner,
            head_mode: HeadModeTrigger::default(),
            beams: Vec::new(),
            next_id: 0,
        }
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn finish(&mut self, completed: bool, level_id: u8, events: &mut Vec<SimEvent>) {
        if self.phase.is_terminal() {
            return;
        }
        self.spawner.disable();
        let score = self.score.points;
        if completed {
            self.phase = AttemptPhase::LevelComplete;
            tracing::info!("Level {level_id} complete, score {score}");
            events.push(SimEvent::LevelComplete { score });
        } else {
            self.phase = AttemptPhase::GameOver;
            tracing::info!("Level {level_id} game over, score {score}, hits {}", self.hits);
            events.push(SimEvent::GameOver { score });
        }
    }

    fn tick_play(
        &mut self,
        cfg: &LevelConfig,
        resolver: &CollisionResolver,
        rng: &mut StdRng,
        dt: f32,
        events: &mut Vec<SimEvent>,
    ) {
        if cfg.speed_growth > 0.0 {
            self.scroll_speed = (self.scroll_speed + cfg.speed_growth * dt).min(cfg.max_speed);
        }
        let boost = if self.player.is_boost_active() {
            cfg.slide_boost_mult
        } else {
            1.0
        };
        let slow = if self.slowdown.is_active() {
            cfg.slowdown_mult
        } else {
            1.0
        };
        let scroll_delta = self.scroll_speed * dt * boost * slow;
        self.scroll_x = (self.scroll_x + scroll_delta) % cfg.arena.width;

        if let Some(ground) = self.ground.as_mut() {
            ground.update(scroll_delta, rng);
        }
        let cage_xs = match self.ceiling.as_mut() {
            Some(ceiling) => ceiling.update(scroll_delta, rng),
            None => Vec::new(),
        };
        for x in cage_xs {
            if self.finale_cage.is_some() {
                break;
            }
            self.try_spawn_cage(x);
        }

        if !cfg.geometric_obstacles {
            self.score
                .accrue_distance(self.scroll_speed * dt * slow, cfg.score_rate);
        }
        self.slowdown.tick(dt);
        self.head_mode.tick(dt);

        events.extend(self.player.update(dt));
        for beam in self.beams.iter_mut() {
            beam.update(dt);
        }
        self.beams.retain(|b| !b.is_done());

        if let Some(chaser) = self.chaser.as_mut() {
            chaser.set_target(self.player.rect.center_x());
            let cages: Vec<CageView> = self
                .cages
                .iter()
                .filter(|c| c.alive && Some(c.id) != self.finale_cage)
                .map(FallingCage::view)
                .collect();
            let lanes: Vec<Rect> = self
                .obstacles
                .iter()
                .filter(|o| o.alive && o.lane_profile().is_some())
                .map(|o| o.rect)
                .collect();
            chaser.update(dt, &cages, &lanes);
        }

        for obstacle in self.obstacles.iter_mut() {
            obstacle.update(dt);
        }

        let player_x = self.player.rect.center_x();
        let chaser_x = self.chaser.as_ref().map(|c| c.rect.center_x());
        for cage in self.cages.iter_mut() {
            let target = if Some(cage.id) == self.finale_cage {
                chaser_x
            } else {
                Some(player_x)
            };
            cage.update(dt, target);
        }

        self.resolve_collisions(cfg, resolver, events);

        if !self.phase.is_terminal() {
            let player_left = self.player.rect.left();
            let lane_bonus = cfg.lane_dodge_score;
            let dodges = award_obstacle_dodges(&mut self.obstacles, player_left, lane_bonus)
                .into_iter()
                .chain(award_cage_dodges(&mut self.cages, cfg.cage_dodge_score));
            for ev in dodges {
                self.score.add(ev.bonus());
                events.push(ev);
            }
            self.check_finale(cfg, events);
        }

        self.obstacles.retain(|o| o.alive);
        self.cages.retain(|c| c.alive);
        if let Some(id) = self.finale_cage
            && !self.cages.iter().any(|c| c.id == id)
        {
            // Missed the chaser; the next cage gets another try.
            self.finale_cage = None;
        }
    }

    fn try_spawn_cage(&mut self, x: f32) {
        // Obstacle spawning is off once the finale is armed, so the finale
        // cage ignores the type gap.
        let finale = self.phase == AttemptPhase::FinaleArmed;
        if !finale && !self.spawner.can_spawn_cage(self.clock) {
            return;
        }
        let id = self.alloc_id();
        let mut cage = self
            .spawner
            .spawn_cage_at(id, x, self.scroll_speed, self.clock);
        if finale {
            cage.home_on_target();
            self.finale_cage = Some(id);
        }
        self.cages.push(cage);
    }

    fn resolve_collisions(
        &mut self,
        cfg: &LevelConfig,
        resolver: &CollisionResolver,
        events: &mut Vec<SimEvent>,
    ) {
        let result = resolver.check(&CollisionScene {
            player: &self.player,
            chaser: self.chaser.as_ref(),
            obstacles: &self.obstacles,
            cages: &self.cages,
            invincible: self.slowdown.is_active(),
            ignored_cage: self.finale_cage,
        });

        if let Some(id) = result.hit_obstacle {
            self.take_hit(cfg, id, events);
        }
        if let Some(id) = result.trapping_cage
            && !self.phase.is_terminal()
        {
            self.trap_player(cfg, id, events);
        }
        if result.caught {
            tracing::debug!("Chaser caught the player");
            events.push(SimEvent::PlayerCaught);
            self.finish(false, cfg.level_id, events);
        }
    }

    fn take_hit(&mut self, cfg: &LevelConfig, id: EntityId, events: &mut Vec<SimEvent>) {
        if let Some(obstacle) = self.obstacles.iter_mut().find(|o| o.id == id) {
            obstacle.alive = false;
        }
        self.hits = self.hits.saturating_add(1);
        self.slowdown.start(cfg.slowdown_duration);
        if let Some(chaser) = self.chaser.as_mut() {
            chaser.on_player_hit();
        }
        tracing::debug!("Player hit obstacle {id} ({}/{})", self.hits, cfg.max_hits);
        events.push(SimEvent::HitTaken { hits: self.hits });

        if self.hits < cfg.max_hits {
            return;
        }
        if self.chaser.is_none() {
            self.finish(false, cfg.level_id, events);
        } else if self.phase == AttemptPhase::Playing {
            let target = self.player.rect.center_x();
            if let Some(chaser) = self.chaser.as_mut() {
                chaser.start_catching(target);
            }
            self.phase = AttemptPhase::ChaserCatching;
            self.spawner.disable();
            tracing::debug!("Chaser catching from x={target}");
            events.push(SimEvent::ChaserCatching);
        }
    }

    fn trap_player(&mut self, cfg: &LevelConfig, id: EntityId, events: &mut Vec<SimEvent>) {
        let x = self.player.rect.center_x();
        let Some(cage) = self.cages.iter_mut().find(|c| c.id == id) else {
            return;
        };
        cage.trap_at(x);
        self.player.trap();
        self.phase = AttemptPhase::PlayerTrapped {
            cage: id,
            timer: Countdown::started(cfg.trapped_duration),
        };
        self.spawner.disable();
        tracing::debug!("Cage {id} trapped the player");
        events.push(SimEvent::PlayerTrapped);
    }

    fn check_finale(&mut self, cfg: &LevelConfig, events: &mut Vec<SimEvent>) {
        if !self.phase.is_scrolling() {
            return;
        }
        let reached = self.score.points >= cfg.finale_score;
        if self.chaser.is_none() {
            if reached {
                self.finish(true, cfg.level_id, events);
            }
            return;
        }

        if reached && self.phase == AttemptPhase::Playing {
            self.phase = AttemptPhase::FinaleArmed;
            self.spawner.disable();
            tracing::info!("Finale armed at score {}", self.score.points);
            events.push(SimEvent::FinaleArmed);
        }

        if self.phase != AttemptPhase::FinaleArmed {
            return;
        }
        // Without ceiling scheduling the finale cage drops in from the right,
        // and again whenever the previous one scrolled away.
        if self.finale_cage.is_none() && !(cfg.cages.enabled && self.ceiling.is_some()) {
            self.try_spawn_cage(cfg.arena.width + cfg.arena.spawn_margin);
        }
        let (Some(id), Some(chaser)) = (self.finale_cage, self.chaser.as_mut()) else {
            return;
        };
        let Some(cage) = self.cages.iter_mut().find(|c| c.id == id && c.alive) else {
            return;
        };
        if cage.state.is_hazardous() && cage.rect.bottom() >= chaser.rect.top() {
            chaser.trap();
            cage.trap_at(chaser.rect.center_x());
            self.phase = AttemptPhase::ChaserTrapped {
                cage: id,
                timer: Countdown::started(cfg.finale_duration),
            };
            tracing::info!("Finale cage {id} trapped the chaser");
            events.push(SimEvent::ChaserTrapped);
        }
    }

    fn tick_catching(&mut self, cfg: &LevelConfig, dt: f32, events: &mut Vec<SimEvent>) {
        events.extend(self.player.update(dt));
        let Some(chaser) = self.chaser.as_mut() else {
            self.finish(false, cfg.level_id, events);
            return;
        };
        chaser.update(dt, &[], &[]);
        if chaser.has_caught(&self.player.hitbox()) {
            self.player.tackle();
            self.phase = AttemptPhase::PlayerTackled {
                timer: Countdown::started(cfg.tackle_duration),
            };
            tracing::debug!("Chaser tackled the player");
            events.push(SimEvent::PlayerTackled);
        }
    }

    fn tick_tackled(&mut self, cfg: &LevelConfig, dt: f32, events: &mut Vec<SimEvent>) {
        let AttemptPhase::PlayerTackled { timer } = &mut self.phase else {
            return;
        };
        let expired = timer.tick(dt) || !timer.is_active();
        let x = self.player.rect.center_x();
        if let Some(chaser) = self.chaser.as_mut() {
            chaser.set_center_x(x);
        }
        if expired {
            self.finish(false, cfg.level_id, events);
        }
    }

    fn tick_player_trapped(&mut self, cfg: &LevelConfig, dt: f32, events: &mut Vec<SimEvent>) {
        events.extend(self.player.update(dt));
        let AttemptPhase::PlayerTrapped { cage: cage_id, timer } = &mut self.phase else {
            return;
        };
        let expired = timer.tick(dt) || !timer.is_active();
        if let Some(cage) = self.cages.iter().find(|c| c.id == *cage_id) {
            self.player.set_center_x(cage.rect.center_x());
        }
        if expired {
            self.finish(false, cfg.level_id, events);
        }
    }

    fn tick_chaser_trapped(&mut self, cfg: &LevelConfig, dt: f32, events: &mut Vec<SimEvent>) {
        events.extend(self.player.update(dt));
        for beam in self.beams.iter_mut() {
            beam.update(dt);
        }
        self.beams.retain(|b| !b.is_done());
        let AttemptPhase::ChaserTrapped { timer, .. } = &mut self.phase else {
            return;
        };
        if timer.tick(dt) || !timer.is_active() {
            self.finish(true, cfg.level_id, events);
        }
    }

    fn fire_laser(&mut self, cfg: &LevelConfig, resolver: &CollisionResolver, events: &mut Vec<SimEvent>) {
        if !self.player.shoot() {
            return;
        }
        events.push(SimEvent::Shot);
        let origin = self.player.eye();
        let range = cfg.player.laser_range;
        let mut end_x = origin.0 + range;
        if let Some(id) = resolver.laser_target(origin, range, &self.obstacles)
            && let Some(obstacle) = self.obstacles.iter_mut().find(|o| o.id == id)
        {
            end_x = obstacle.rect.left();
            if obstacle.take_damage(1) {
                self.score.add(cfg.laser_kill_score);
                events.push(SimEvent::ObstacleDestroyed {
                    bonus: cfg.laser_kill_score,
                });
            }
        }
        self.beams.push(LaserBeam::new(origin, end_x));
    }
}

/// One attempt at a level: the simulation a host drives frame by frame.
pub struct LevelRun {
    config: LevelConfig,
    flags: SimFlags,
    resolver: CollisionResolver,
    rng: StdRng,
    state: RunState,
    paused: bool,
}

impl LevelRun {
    /// Start an attempt with default flags and an OS-seeded rng.
    pub fn new(config: LevelConfig) -> Result<Self, ConfigError> {
        Self::build(config, SimFlags::default(), StdRng::from_os_rng())
    }

    /// Start an attempt with explicit flags and a fixed seed.
    pub fn with_options(config: LevelConfig, flags: SimFlags, seed: u64) -> Result<Self, ConfigError> {
        Self::build(config, flags, StdRng::seed_from_u64(seed))
    }

    fn build(config: LevelConfig, flags: SimFlags, mut rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let spawner = Spawner::new(SpawnRules::from_config(&config));
        let state = RunState::new(&config, &flags, spawner, &mut rng);
        tracing::info!(
            "Level {} attempt started (chaser: {})",
            config.level_id,
            state.chaser.is_some()
        );
        Ok(Self {
            resolver: CollisionResolver::new(&config.forgiveness),
            config,
            flags,
            rng,
            state,
            paused: false,
        })
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn flags(&self) -> &SimFlags {
        &self.flags
    }

    /// Move the ground line, e.g. after the window is resized. Live
    /// obstacles keep their position; new spawns use the new line.
    pub fn set_ground_y(&mut self, ground_y: f32) {
        if !ground_y.is_finite() || !self.config.fits_hanging_cage(ground_y) {
            tracing::debug!("Ignoring ground line {ground_y}");
            return;
        }
        self.config.arena.ground_y = ground_y;
        let state = &mut self.state;
        state.player.set_ground_y(ground_y);
        if let Some(chaser) = state.chaser.as_mut() {
            chaser.set_ground_y(ground_y);
        }
        for cage in state.cages.iter_mut() {
            cage.set_ground_y(ground_y);
        }
        state.spawner.set_ground_y(ground_y);
    }

    fn describe(&self) -> String {
        let mut parts = vec!["Dodge the obstacles"];
        if self.config.cages.enabled {
            parts.push("duck the falling cages");
        }
        if self.state.chaser.is_some() {
            parts.push("outrun the chaser");
        }
        if self.config.player.laser_enabled {
            parts.push("blast shapes with your laser");
        }
        format!("{}.", parts.join(", "))
    }
}

impl RunnerGame for LevelRun {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            level_id: self.config.level_id,
            name: self.config.name.clone(),
            description: self.describe(),
            has_chaser: self.state.chaser.is_some(),
            finale_score: self.config.finale_score,
        }
    }

    fn handle_input(&mut self, input: InputEvent) -> Vec<SimEvent> {
        if !input.pressed {
            return Vec::new();
        }
        if self.state.phase.is_terminal() {
            return match input.action {
                GameAction::Restart => self.reset(),
                _ => Vec::new(),
            };
        }
        if self.paused {
            return Vec::new();
        }

        let mut events = Vec::new();
        let state = &mut self.state;
        match input.action {
            GameAction::Jump => {
                events.extend(state.player.jump());
                if state
                    .head_mode
                    .on_jump(self.config.head_mode_jumps, self.config.head_mode_window)
                {
                    state.spawner.head_mode = true;
                    tracing::debug!("Head mode unlocked");
                }
            },
            GameAction::Slide => {
                if state.player.slide() {
                    events.push(SimEvent::Slid);
                }
            },
            GameAction::Shoot => state.fire_laser(&self.config, &self.resolver, &mut events),
            GameAction::Restart => {},
        }
        events
    }

    fn handle_timer(&mut self, fired: TimerFired) -> Vec<SimEvent> {
        let state = &mut self.state;
        if self.paused || !state.phase.is_scrolling() {
            tracing::debug!(
                "Ignoring spawn timer fire (generation {}) while paused or outside play",
                fired.generation
            );
            return Vec::new();
        }
        let id = state.next_id;
        if let Some(obstacle) =
            state
                .spawner
                .handle_timer(fired, state.clock, id, state.scroll_speed, &mut self.rng)
        {
            state.alloc_id();
            state.obstacles.push(obstacle);
        }
        Vec::new()
    }

    fn update(&mut self, dt: f32) -> Vec<SimEvent> {
        if self.paused || self.state.phase.is_terminal() || !dt.is_finite() || dt <= 0.0 {
            return Vec::new();
        }

        let mut events = Vec::new();
        let cfg = &self.config;
        let state = &mut self.state;
        state.clock += dt;
        match state.phase {
            AttemptPhase::ChaserTrapped { .. } => state.tick_chaser_trapped(cfg, dt, &mut events),
            AttemptPhase::PlayerTrapped { .. } => state.tick_player_trapped(cfg, dt, &mut events),
            AttemptPhase::PlayerTackled { .. } => state.tick_tackled(cfg, dt, &mut events),
            AttemptPhase::ChaserCatching => state.tick_catching(cfg, dt, &mut events),
            AttemptPhase::Playing | AttemptPhase::FinaleArmed => {
                state.tick_play(cfg, &self.resolver, &mut self.rng, dt, &mut events)
            },
            AttemptPhase::LevelComplete | AttemptPhase::GameOver => {},
        }
        events
    }

    fn reset(&mut self) -> Vec<SimEvent> {
        let spawner = self.state.spawner.clone();
        self.state = RunState::new(&self.config, &self.flags, spawner, &mut self.rng);
        self.paused = false;
        tracing::info!("Level {} attempt restarted", self.config.level_id);
        vec![SimEvent::Restarted]
    }

    fn spawn_timer(&self) -> TimerArm {
        self.state.spawner.arm
    }

    runner_game_boilerplate!(state_type: RunState);

    fn outcome(&self) -> Option<Outcome> {
        let score = self.state.score.points;
        match self.state.phase {
            AttemptPhase::LevelComplete => Some(Outcome::Completed { score }),
            AttemptPhase::GameOver => Some(Outcome::GameOver { score }),
            _ => None,
        }
    }

    fn score(&self) -> u32 {
        self.state.score.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cage::CageState;
    use cagerun_core::test_helpers::{run_ticks, run_ticks_with_timer};
    use cagerun_core::timer::ExternalTimer;
    use chaser::ChaserState;
    use obstacle::{LaneProfile, ObstacleKind, Shape, ShapeColor};
    use player::PlayerState;

    const DT: f32 = 1.0 / 60.0;
    const GROUND: f32 = 720.0;

    fn level(id: u8) -> LevelRun {
        LevelRun::with_options(LevelConfig::level(id).unwrap(), SimFlags::default(), 42).unwrap()
    }

    fn custom(cfg: LevelConfig) -> LevelRun {
        LevelRun::with_options(cfg, SimFlags::default(), 42).unwrap()
    }

    fn press(game: &mut LevelRun, action: GameAction) -> Vec<SimEvent> {
        game.handle_input(InputEvent::press(action))
    }

    fn body_at(id: EntityId, x: f32) -> Obstacle {
        Obstacle::lane(id, LaneProfile::Body, x, GROUND, 400.0)
    }

    fn falling_cage_over(game: &LevelRun, id: EntityId, x: f32) -> FallingCage {
        let mut cage = FallingCage::new(id, x, 60.0, GROUND, 400.0, 50.0, &game.config.cages);
        cage.state = CageState::Falling;
        cage.fall_velocity = 200.0;
        cage.rect = Rect::from_midbottom(x, GROUND - 20.0, 180.0, 220.0);
        cage
    }

    fn current_fire(game: &LevelRun) -> TimerFired {
        TimerFired {
            generation: game.spawn_timer().generation().unwrap(),
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = LevelConfig {
            max_hits: 0,
            ..LevelConfig::default()
        };
        assert!(matches!(LevelRun::new(cfg), Err(ConfigError::ZeroMaxHits)));
    }

    #[test]
    fn fresh_attempt_matches_level_layout() {
        let l1 = level(1);
        assert_eq!(l1.state.phase, AttemptPhase::Playing);
        assert!(l1.state.chaser.is_some());
        assert!(l1.state.ceiling.is_some());
        assert!(l1.state.ground.is_some());
        assert!(l1.spawn_timer().is_armed());

        let l2 = level(2);
        assert!(l2.state.chaser.is_some());
        assert!(l2.state.ceiling.is_none());

        let l3 = level(3);
        assert!(l3.state.chaser.is_none());
        assert!(!l3.metadata().has_chaser);
    }

    #[test]
    fn disable_chaser_flag_removes_chaser() {
        let flags = SimFlags {
            disable_chaser: true,
            ..SimFlags::default()
        };
        let game = LevelRun::with_options(LevelConfig::level(1).unwrap(), flags, 1).unwrap();
        assert!(game.state.chaser.is_none());
        assert!(!game.metadata().has_chaser);
    }

    #[test]
    fn metadata_describes_level() {
        let meta = level(1).metadata();
        assert_eq!(meta.level_id, 1);
        assert_eq!(meta.finale_score, 3000);
        assert!(meta.description.contains("cages"));
        assert!(meta.description.contains("chaser"));
        assert!(level(3).metadata().description.contains("laser"));
    }

    #[test]
    fn jump_lands_back_running() {
        let mut game = level(1);
        assert_eq!(
            press(&mut game, GameAction::Jump),
            vec![SimEvent::Jumped { double: false }]
        );
        assert_eq!(game.state.player.vy, -650.0);
        let mut ticks = 0;
        while game.state.player.state == PlayerState::Jumping {
            game.update(DT);
            assert!(game.state.player.rect.bottom() <= GROUND);
            ticks += 1;
            assert!(ticks < 300);
        }
        assert_eq!(game.state.player.state, PlayerState::Running);
        assert_eq!(game.state.player.vy, 0.0);
        assert_eq!(game.state.player.rect.bottom(), GROUND);
    }

    #[test]
    fn timer_fire_spawns_obstacle_at_right_edge() {
        let mut game = level(1);
        let fire = current_fire(&game);
        assert!(game.handle_timer(fire).is_empty());
        assert_eq!(game.state.obstacles.len(), 1);
        let o = &game.state.obstacles[0];
        assert_eq!(o.rect.center_x(), 1380.0);
        assert_eq!(o.speed, 400.0);
        assert_ne!(game.spawn_timer().generation(), Some(fire.generation));

        // Replaying the same fire is stale now.
        game.handle_timer(fire);
        assert_eq!(game.state.obstacles.len(), 1);
    }

    #[test]
    fn hit_counts_slows_and_boosts_chaser() {
        let mut game = level(1);
        let speed = game.state.chaser.as_ref().unwrap().speed;
        game.state.obstacles.push(body_at(900, 320.0));
        let events = game.update(DT);
        assert!(events.contains(&SimEvent::HitTaken { hits: 1 }));
        assert_eq!(game.state.hits, 1);
        assert!(game.state.slowdown.is_active());
        assert!(game.state.obstacles.is_empty(), "hit obstacle is destroyed");
        assert_eq!(game.state.chaser.as_ref().unwrap().speed, speed + 50.0);
    }

    #[test]
    fn slowdown_suppresses_damage_and_scroll() {
        let mut game = level(1);
        game.state.obstacles.push(body_at(900, 320.0));
        game.update(DT);
        let before = game.state.scroll_x;
        game.state.obstacles.push(body_at(901, 320.0));
        let events = game.update(DT);
        assert!(!events.iter().any(|e| matches!(e, SimEvent::HitTaken { .. })));
        assert_eq!(game.state.hits, 1);
        let delta = game.state.scroll_x - before;
        assert!((delta - 400.0 * DT * 0.4).abs() < 1e-3, "scrolled {delta}");
    }

    #[test]
    fn max_hits_switches_chaser_to_catching() {
        let mut game = level(1);
        game.state.hits = 2;
        game.state.obstacles.push(body_at(900, 320.0));
        let stale = current_fire(&game);

        let events = game.update(DT);
        assert!(events.contains(&SimEvent::HitTaken { hits: 3 }));
        assert!(events.contains(&SimEvent::ChaserCatching));
        assert_eq!(game.state.phase, AttemptPhase::ChaserCatching);
        assert_eq!(
            game.state.chaser.as_ref().unwrap().state,
            ChaserState::Catching
        );
        assert_eq!(game.spawn_timer(), TimerArm::Disabled);

        assert!(game.handle_timer(stale).is_empty());
        assert!(game.state.obstacles.is_empty());

        let events = run_ticks(&mut game, 600, DT);
        assert!(game.state.obstacles.is_empty(), "no spawns after catching");
        assert!(events.contains(&SimEvent::PlayerTackled));
        assert_eq!(
            events.iter().filter(|e| e.is_terminal()).count(),
            1
        );
        assert!(matches!(game.outcome(), Some(Outcome::GameOver { .. })));
        assert_eq!(game.state.player.state, PlayerState::Tackled);
    }

    #[test]
    fn max_hits_without_chaser_ends_attempt() {
        let mut game = level(3);
        game.state.hits = 2;
        game.state.obstacles.push(Obstacle::geometric(
            900,
            Shape::Square,
            ShapeColor::Cyan,
            320.0,
            GROUND,
            600.0,
        ));
        let events = game.update(DT);
        assert!(events.contains(&SimEvent::HitTaken { hits: 3 }));
        assert!(events.contains(&SimEvent::GameOver { score: 0 }));
        assert_eq!(game.outcome(), Some(Outcome::GameOver { score: 0 }));
        assert!(!game.spawn_timer().is_armed());
    }

    #[test]
    fn obstacle_and_cage_hits_in_one_tick_both_apply() {
        let mut game = level(1);
        game.state.obstacles.push(body_at(900, 320.0));
        let cage = falling_cage_over(&game, 901, 320.0);
        game.state.cages.push(cage);

        let events = game.update(DT);
        assert_eq!(game.state.hits, 1);
        assert!(events.contains(&SimEvent::HitTaken { hits: 1 }));
        assert!(events.contains(&SimEvent::PlayerTrapped));
        assert!(matches!(
            game.state.phase,
            AttemptPhase::PlayerTrapped { cage: 901, .. }
        ));
        assert_eq!(game.state.player.state, PlayerState::Trapped);
        assert_eq!(game.state.cages[0].state, CageState::Trapped);
        assert!(!game.spawn_timer().is_armed());
    }

    #[test]
    fn trapped_player_is_game_over_after_duration() {
        let mut game = level(1);
        let cage = falling_cage_over(&game, 7, 320.0);
        game.state.cages.push(cage);
        game.update(DT);
        assert!(matches!(game.state.phase, AttemptPhase::PlayerTrapped { .. }));

        let events = run_ticks(&mut game, 230, DT);
        assert!(!events.iter().any(SimEvent::is_terminal), "still inside 4 s");
        let events = run_ticks(&mut game, 20, DT);
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert!(matches!(game.outcome(), Some(Outcome::GameOver { .. })));
        let cage_x = game.state.cages[0].rect.center_x();
        assert_eq!(game.state.player.rect.center_x(), cage_x);
    }

    #[test]
    fn sliding_player_ducks_a_fresh_cage() {
        let mut game = level(1);
        assert_eq!(press(&mut game, GameAction::Slide), vec![SimEvent::Slid]);
        let cage = falling_cage_over(&game, 3, 320.0);
        game.state.cages.push(cage);
        game.update(DT);
        assert_eq!(game.state.phase, AttemptPhase::Playing);
        assert_eq!(game.state.player.state, PlayerState::Sliding);
    }

    #[test]
    fn chaser_overlap_during_play_is_game_over() {
        let mut cfg = LevelConfig::level(1).unwrap();
        cfg.chaser.start_x = 320.0;
        cfg.chaser.follow_offset = 0.0;
        cfg.chaser.follow_slack = 0.0;
        let mut game = custom(cfg);
        let events = game.update(DT);
        assert!(events.contains(&SimEvent::PlayerCaught));
        assert!(matches!(game.outcome(), Some(Outcome::GameOver { .. })));
    }

    #[test]
    fn dodged_obstacle_pays_once() {
        let mut game = level(1);
        game.state.obstacles.push(body_at(900, 200.0));
        let first = game.update(DT);
        assert_eq!(
            first
                .iter()
                .filter(|e| matches!(e, SimEvent::ObstacleDodged { .. }))
                .count(),
            1
        );
        assert!(game.score() >= 100);
        for _ in 0..30 {
            let events = game.update(DT);
            assert!(!events.iter().any(|e| matches!(e, SimEvent::ObstacleDodged { .. })));
        }
    }

    #[test]
    fn passive_score_only_on_lane_levels() {
        let mut lane = level(1);
        run_ticks(&mut lane, 60, DT);
        assert!((39..=40).contains(&lane.score()), "got {}", lane.score());

        let mut geometric = level(3);
        run_ticks(&mut geometric, 60, DT);
        assert_eq!(geometric.score(), 0);
    }

    #[test]
    fn slide_boost_speeds_up_scroll() {
        let mut plain = level(1);
        let mut boosted = level(1);
        press(&mut boosted, GameAction::Slide);
        plain.update(DT);
        boosted.update(DT);
        let ratio = boosted.state.scroll_x / plain.state.scroll_x;
        assert!((ratio - 2.2).abs() < 1e-3, "ratio {ratio}");
        assert_eq!(plain.score(), boosted.score(), "boost earns no extra score");
    }

    #[test]
    fn scroll_speed_grows_to_cap() {
        let mut game = level(2);
        game.state.scroll_speed = 899.0;
        run_ticks(&mut game, 60, DT);
        assert_eq!(game.state.scroll_speed, 900.0);
    }

    #[test]
    fn finale_cage_traps_chaser_and_completes_level() {
        for id in [1, 2] {
            let mut game = level(id);
            game.state.score.add(game.config.finale_score);
            let events = game.update(DT);
            assert!(events.contains(&SimEvent::FinaleArmed), "level {id}");
            assert_eq!(game.state.phase, AttemptPhase::FinaleArmed);
            assert!(!game.spawn_timer().is_armed());

            let events = run_ticks(&mut game, 3000, DT);
            assert!(events.contains(&SimEvent::ChaserTrapped), "level {id}");
            let score = game.score();
            assert_eq!(events.last(), Some(&SimEvent::LevelComplete { score }));
            assert_eq!(game.outcome(), Some(Outcome::Completed { score }));
            assert_eq!(
                game.state.chaser.as_ref().unwrap().state,
                ChaserState::Trapped
            );
            assert_eq!(game.state.player.state, PlayerState::Running);
        }
    }

    #[test]
    fn finale_cage_spawns_right_after_an_obstacle() {
        let mut game = level(2);
        let fire = current_fire(&game);
        game.handle_timer(fire);
        assert_eq!(game.state.obstacles.len(), 1);
        run_ticks(&mut game, 30, DT);
        game.state.score.add(game.config.finale_score);

        let events = game.update(DT);
        assert!(events.contains(&SimEvent::FinaleArmed));
        assert!(game.state.finale_cage.is_some(), "type gap does not hold back the finale");

        let mut timer = ExternalTimer::new();
        let events = run_ticks_with_timer(&mut game, &mut timer, 60 * 60, DT);
        assert!(events.contains(&SimEvent::ChaserTrapped));
        assert!(matches!(game.outcome(), Some(Outcome::Completed { .. })));
    }

    #[test]
    fn lost_finale_cage_is_replaced() {
        let mut game = level(2);
        game.state.score.add(5000);
        game.update(DT);
        let first = game.state.finale_cage.unwrap();

        for cage in game.state.cages.iter_mut() {
            cage.alive = false;
        }
        game.update(DT);
        assert_eq!(game.state.finale_cage, None);
        game.update(DT);
        let second = game.state.finale_cage.unwrap();
        assert_ne!(first, second);
        assert_eq!(game.state.cages.len(), 1);
        assert!(game.state.cages[0].homing);
    }

    #[test]
    fn finale_cage_is_harmless_to_player() {
        let mut game = level(2);
        game.state.score.add(5000);
        game.update(DT);
        let id = game.state.finale_cage.unwrap();
        let cage = game.state.cages.iter_mut().find(|c| c.id == id).unwrap();
        cage.state = CageState::Grounded;
        cage.grounded.start(0.8);
        cage.rect = Rect::from_midbottom(320.0, GROUND, 180.0, 220.0);
        let events = game.update(DT);
        assert!(!events.contains(&SimEvent::PlayerTrapped));
        assert_ne!(game.state.player.state, PlayerState::Trapped);
    }

    #[test]
    fn hits_after_finale_armed_do_not_start_catching() {
        let mut game = level(2);
        game.state.score.add(5000);
        game.update(DT);
        game.state.hits = 2;
        game.state.obstacles.push(body_at(900, 320.0));
        let events = game.update(DT);
        assert!(events.contains(&SimEvent::HitTaken { hits: 3 }));
        assert!(!events.contains(&SimEvent::ChaserCatching));
        assert_eq!(game.state.phase, AttemptPhase::FinaleArmed);
    }

    #[test]
    fn chaserless_level_completes_on_score() {
        let mut game = level(3);
        game.state.score.add(2000);
        let events = game.update(DT);
        assert_eq!(events, vec![SimEvent::LevelComplete { score: 2000 }]);
        assert_eq!(game.outcome(), Some(Outcome::Completed { score: 2000 }));
    }

    #[test]
    fn completed_level_unlocks_the_next() {
        let mut progress = cagerun_core::progress::Progress::default();
        let flags = SimFlags::default();
        let mut game = level(3);
        game.state.score.add(2000);
        game.update(DT);
        if let Some(Outcome::Completed { .. }) = game.outcome() {
            progress.mark_completed(game.metadata().level_id);
        }
        assert!(progress.is_completed(3));
        assert!(progress.is_unlocked(4, &flags));
        assert!(!progress.is_unlocked(2, &flags));
    }

    #[test]
    fn restart_only_when_finished() {
        let mut game = level(1);
        assert!(press(&mut game, GameAction::Restart).is_empty());
        game.state.hits = 2;
        game.state.obstacles.push(body_at(900, 320.0));
        game.state.chaser = None;
        game.update(DT);
        assert!(game.is_finished());
        assert_eq!(press(&mut game, GameAction::Restart), vec![SimEvent::Restarted]);
        assert_eq!(game.state.hits, 0);
        assert!(game.state.chaser.is_some());
    }

    #[test]
    fn reset_invalidates_previous_timer_generation() {
        let mut game = level(1);
        let old = current_fire(&game);
        game.reset();
        assert_ne!(current_fire(&game), old);
        game.handle_timer(old);
        assert!(game.state.obstacles.is_empty());
    }

    #[test]
    fn release_events_are_ignored() {
        let mut game = level(1);
        assert!(game.handle_input(InputEvent::release(GameAction::Jump)).is_empty());
        assert_eq!(game.state.player.state, PlayerState::Running);
    }

    #[test]
    fn paused_game_ignores_gameplay_input() {
        let mut game = level(1);
        game.pause();
        assert!(press(&mut game, GameAction::Jump).is_empty());
        game.resume();
        assert!(!press(&mut game, GameAction::Jump).is_empty());
    }

    #[test]
    fn paused_game_ignores_timer_fires() {
        let mut game = level(1);
        let fire = current_fire(&game);
        game.pause();
        assert!(game.handle_timer(fire).is_empty());
        assert!(game.state.obstacles.is_empty());
        assert_eq!(game.spawn_timer().generation(), Some(fire.generation));

        game.resume();
        game.handle_timer(fire);
        assert_eq!(game.state.obstacles.len(), 1);
    }

    #[test]
    fn encoded_input_is_applied() {
        let mut game = level(1);
        let bytes = InputEvent::press(GameAction::Jump).encode();
        assert_eq!(
            game.apply_input(&bytes),
            vec![SimEvent::Jumped { double: false }]
        );
        assert!(game.apply_input(&[0xff, 0x01]).is_empty());
    }

    #[test]
    fn laser_destroys_geometric_obstacle() {
        let mut game = level(3);
        game.state.obstacles.push(Obstacle::geometric(
            50,
            Shape::Square,
            ShapeColor::Magenta,
            600.0,
            GROUND,
            600.0,
        ));
        let events = press(&mut game, GameAction::Shoot);
        assert_eq!(
            events,
            vec![SimEvent::Shot, SimEvent::ObstacleDestroyed { bonus: 100 }]
        );
        assert_eq!(game.score(), 100);
        assert_eq!(game.state.beams.len(), 1);
        assert_eq!(game.state.beams[0].end_x, 530.0);
        assert!(!game.state.obstacles[0].alive);

        assert!(press(&mut game, GameAction::Shoot).is_empty(), "cooling down");
        game.update(DT);
        assert!(game.state.obstacles.is_empty());
    }

    #[test]
    fn laser_passes_lane_obstacles() {
        let mut game = level(3);
        game.state.obstacles.push(body_at(51, 600.0));
        let events = press(&mut game, GameAction::Shoot);
        assert_eq!(events, vec![SimEvent::Shot]);
        assert_eq!(game.state.beams[0].end_x, game.state.beams[0].start_x + 800.0);
        assert!(game.state.obstacles[0].alive);
    }

    #[test]
    fn laser_needs_enabled_level() {
        let mut game = level(1);
        assert!(press(&mut game, GameAction::Shoot).is_empty());
        assert!(game.state.beams.is_empty());
    }

    #[test]
    fn jump_spam_unlocks_head_obstacles() {
        let mut game = level(3);
        for _ in 0..5 {
            press(&mut game, GameAction::Jump);
            game.update(DT);
        }
        assert!(game.state.spawner.head_mode);
        let fire = current_fire(&game);
        game.handle_timer(fire);
        let ObstacleKind::Geometric(geo) = game.state.obstacles[0].kind else {
            panic!("level 3 spawns geometric obstacles");
        };
        assert_eq!(geo.shape, Shape::Head);
    }

    #[test]
    fn ground_line_moves_with_resize() {
        let mut game = level(1);
        game.set_ground_y(600.0);
        assert_eq!(game.state.player.rect.bottom(), 600.0);
        assert_eq!(game.state.chaser.as_ref().unwrap().rect.bottom(), 600.0);
        let fire = current_fire(&game);
        game.handle_timer(fire);
        assert_eq!(game.state.obstacles[0].rect.bottom(), 600.0);

        game.set_ground_y(f32::NAN);
        assert_eq!(game.config.arena.ground_y, 600.0);

        // Hanging cages would poke through a line this high.
        game.set_ground_y(200.0);
        assert_eq!(game.config.arena.ground_y, 600.0);
        assert_eq!(game.state.player.rect.bottom(), 600.0);
    }

    // ================================================================
    // RunnerGame contract tests
    // ================================================================

    #[test]
    fn contract_reset_starts_clean() {
        for id in 1..=3 {
            cagerun_core::test_helpers::contract_reset_starts_clean(&mut level(id));
        }
    }

    #[test]
    fn contract_update_advances_state() {
        for id in 1..=3 {
            cagerun_core::test_helpers::contract_update_advances_state(&mut level(id));
        }
    }

    #[test]
    fn contract_input_changes_state() {
        cagerun_core::test_helpers::contract_input_changes_state(&mut level(1), GameAction::Jump);
        cagerun_core::test_helpers::contract_input_changes_state(&mut level(1), GameAction::Slide);
        cagerun_core::test_helpers::contract_input_changes_state(&mut level(3), GameAction::Shoot);
    }

    #[test]
    fn contract_state_roundtrip_preserves() {
        let mut game = level(1);
        let fire = current_fire(&game);
        game.handle_timer(fire);
        run_ticks(&mut game, 90, DT);
        cagerun_core::test_helpers::contract_state_roundtrip_preserves(&mut game);
    }

    #[test]
    fn snapshot_decodes_to_live_state() {
        let mut game = level(1);
        let fire = current_fire(&game);
        game.handle_timer(fire);
        run_ticks(&mut game, 30, DT);

        let decoded: RunState = rmp_serde::from_slice(&game.serialize_state()).unwrap();
        assert_eq!(&decoded, game.state());

        // Debug dumps go through JSON.
        let json = serde_json::to_string(game.state()).unwrap();
        let back: RunState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.phase, game.state.phase);
        assert_eq!(back.obstacles.len(), 1);
    }

    #[test]
    fn contract_malformed_state_ignored() {
        cagerun_core::test_helpers::contract_malformed_state_ignored(&mut level(2));
        let mut game = level(1);
        let bytes = game.serialize_state();
        game.apply_state(&bytes[..bytes.len() / 2]);
        assert_eq!(game.serialize_state(), bytes);
    }

    #[test]
    fn contract_pause_stops_updates() {
        cagerun_core::test_helpers::contract_pause_stops_updates(&mut level(1));
    }

    #[test]
    fn contract_stale_timer_ignored() {
        cagerun_core::test_helpers::contract_stale_timer_ignored(&mut level(1));
    }

    #[test]
    fn contract_attempt_eventually_ends() {
        for id in 1..=3 {
            let mut game = level(id);
            cagerun_core::test_helpers::contract_attempt_eventually_ends(&mut game, 60 * 180);
            cagerun_core::test_helpers::contract_finished_attempt_is_inert(&mut game);
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn action() -> impl Strategy<Value = Option<GameAction>> {
            prop_oneof![
                6 => Just(None),
                2 => Just(Some(GameAction::Jump)),
                2 => Just(Some(GameAction::Slide)),
                1 => Just(Some(GameAction::Shoot)),
                1 => Just(Some(GameAction::Restart)),
            ]
        }

        /// Drive a level like a host: timer, optional input, update.
        fn drive(
            game: &mut LevelRun,
            timer: &mut ExternalTimer,
            action: Option<GameAction>,
            dt: f32,
        ) -> Vec<SimEvent> {
            let mut events = Vec::new();
            timer.sync(&game.spawn_timer());
            if let Some(fired) = timer.tick(dt) {
                events.extend(game.handle_timer(fired));
            }
            if let Some(action) = action {
                events.extend(game.handle_input(InputEvent::press(action)));
            }
            events.extend(game.update(dt));
            events
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(24))]

            #[test]
            fn entity_states_agree_with_phase(
                level_id in 1u8..=3,
                seed in any::<u64>(),
                actions in proptest::collection::vec(action(), 200..1200),
            ) {
                let mut game = LevelRun::with_options(
                    LevelConfig::level(level_id).unwrap(),
                    SimFlags::default(),
                    seed,
                ).unwrap();
                let mut timer = ExternalTimer::new();
                for a in actions {
                    drive(&mut game, &mut timer, a, DT);
                    let st = &game.state;
                    if st.player.state == PlayerState::Trapped {
                        prop_assert!(
                            matches!(
                                st.phase,
                                AttemptPhase::PlayerTrapped { .. } | AttemptPhase::GameOver
                            ),
                            "player trapped during {:?}",
                            st.phase
                        );
                    }
                    if let Some(chaser) = &st.chaser {
                        if chaser.state == ChaserState::Trapped {
                            prop_assert!(
                                matches!(
                                    st.phase,
                                    AttemptPhase::ChaserTrapped { .. } | AttemptPhase::LevelComplete
                                ),
                                "chaser trapped during {:?}",
                                st.phase
                            );
                        }
                        if st.phase == AttemptPhase::ChaserCatching {
                            prop_assert_eq!(chaser.state, ChaserState::Catching);
                        }
                    }
                    if st.phase == AttemptPhase::Playing {
                        prop_assert!(st.player.state != PlayerState::Tackled);
                        prop_assert!(st.player.state != PlayerState::Trapped);
                    }
                }
            }

            #[test]
            fn nothing_sinks_below_ground(
                level_id in 1u8..=2,
                seed in any::<u64>(),
                actions in proptest::collection::vec(action(), 200..1200),
            ) {
                let mut game = LevelRun::with_options(
                    LevelConfig::level(level_id).unwrap(),
                    SimFlags::default(),
                    seed,
                ).unwrap();
                let mut timer = ExternalTimer::new();
                for a in actions {
                    drive(&mut game, &mut timer, a, DT);
                    let st = &game.state;
                    prop_assert!(st.player.rect.bottom() <= GROUND);
                    if let Some(chaser) = &st.chaser {
                        prop_assert!(chaser.rect.bottom() <= GROUND);
                    }
                    for cage in &st.cages {
                        prop_assert!(cage.rect.bottom() <= GROUND);
                    }
                }
            }

            #[test]
            fn hits_only_grow_until_restart(
                seed in any::<u64>(),
                actions in proptest::collection::vec(action(), 200..1500),
            ) {
                let mut game = LevelRun::with_options(
                    LevelConfig::level(2).unwrap(),
                    SimFlags::default(),
                    seed,
                ).unwrap();
                let mut timer = ExternalTimer::new();
                let mut last = 0;
                for a in actions {
                    let events = drive(&mut game, &mut timer, a, DT);
                    if events.contains(&SimEvent::Restarted) {
                        prop_assert!(game.state.hits <= 1);
                    } else {
                        prop_assert!(game.state.hits >= last);
                    }
                    last = game.state.hits;
                }
            }

            #[test]
            fn geometric_score_is_sum_of_bonuses(
                seed in any::<u64>(),
                actions in proptest::collection::vec(action(), 200..1500),
            ) {
                let mut game = LevelRun::with_options(
                    LevelConfig::level(3).unwrap(),
                    SimFlags::default(),
                    seed,
                ).unwrap();
                let mut timer = ExternalTimer::new();
                let mut expected = 0u32;
                let mut dodges = 0u32;
                for a in actions {
                    let events = drive(&mut game, &mut timer, a, DT);
                    if events.contains(&SimEvent::Restarted) {
                        expected = 0;
                        dodges = 0;
                    }
                    for ev in &events {
                        expected += ev.bonus();
                        if matches!(ev, SimEvent::ObstacleDodged { .. }) {
                            dodges += 1;
                        }
                    }
                    prop_assert_eq!(game.score(), expected);
                    prop_assert!(dodges <= game.state.next_id);
                }
            }

            #[test]
            fn cages_and_obstacles_never_spawn_together(
                seed in any::<u64>(),
                ticks in 600usize..3000,
            ) {
                let mut game = LevelRun::with_options(
                    LevelConfig::level(1).unwrap(),
                    SimFlags::default(),
                    seed,
                ).unwrap();
                let mut timer = ExternalTimer::new();
                let (mut obstacle_times, mut cage_times) = (Vec::new(), Vec::new());
                for _ in 0..ticks {
                    let before = (game.state.spawner.last_obstacle_at, game.state.spawner.last_cage_at);
                    drive(&mut game, &mut timer, Some(GameAction::Jump), DT);
                    if game.is_finished() {
                        break;
                    }
                    let spawner = &game.state.spawner;
                    if spawner.last_obstacle_at != before.0 {
                        obstacle_times.extend(spawner.last_obstacle_at);
                    }
                    if spawner.last_cage_at != before.1 {
                        cage_times.extend(spawner.last_cage_at);
                    }
                }
                for o in &obstacle_times {
                    for c in &cage_times {
                        prop_assert!((o - c).abs() >= 2.0 - 1e-4, "obstacle {o} cage {c}");
                    }
                }
            }
        }
    }
}
